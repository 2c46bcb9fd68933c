use std::collections::HashMap;

use serde::Deserialize;

/// The four workers C6/C7 special-case by name. Policy data, not
/// string literals scattered through the algorithm — a deployment can
/// repoint them without touching engine code.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpecialWorkerNames {
    pub monday_carryover_night_a: String,
    pub monday_carryover_night_b: String,
    pub monday_carryover_fallback: String,
    pub first_friday_lead: String,
}

impl Default for SpecialWorkerNames {
    fn default() -> Self {
        Self {
            monday_carryover_night_a: "Roberto Velasco".to_string(),
            monday_carryover_night_b: "Edu Marin".to_string(),
            monday_carryover_fallback: "María Coma".to_string(),
            first_friday_lead: "Violeta Fariña".to_string(),
        }
    }
}

/// Coefficients of the versatility-weighted `UCI_G_lab` scorer.
/// Reproduced from the source as empirically-tuned policy parameters,
/// not re-derived.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct VersatilityCoefficients {
    pub uci_only_usage_weight: f64,
    pub uci_only_recent_count_weight: f64,
    pub uci_only_recent_hours_weight: f64,
    pub uci_only_period_shifts_weight: f64,
    pub versatile_usage_weight: f64,
    pub versatile_recent_count_weight: f64,
    pub versatile_recent_hours_weight: f64,
    pub versatile_period_shifts_weight: f64,
}

impl Default for VersatilityCoefficients {
    fn default() -> Self {
        Self {
            uci_only_usage_weight: 0.3,
            uci_only_recent_count_weight: 0.3,
            uci_only_recent_hours_weight: 0.2,
            uci_only_period_shifts_weight: 0.5,
            versatile_usage_weight: 0.5,
            versatile_recent_count_weight: 0.3,
            versatile_recent_hours_weight: 0.2,
            versatile_period_shifts_weight: 0.2,
        }
    }
}

fn default_priority_order() -> HashMap<String, i32> {
    [
        ("HEMS_tarde", 1),
        ("Coordis_diurno", 2),
        ("Coordis_nocturno", 3),
        ("HEMS_festivo", 4),
        ("Coordis_festivo_dia", 5),
        ("Coordis_festivo_noche", 6),
        ("UCI_G_lab", 7),
        ("UCI_G_festivo", 8),
        ("Urg_G_noche_l", 9),
        ("Urg_G_tarde-noche_l", 10),
        ("Urg_G_festivo_mañana", 11),
        ("Urg_G_festivo_noche", 12),
        ("Urg_G_refuerzo_fyf", 13),
    ]
    .into_iter()
    .map(|(name, prio)| (name.to_string(), prio))
    .collect()
}

/// Default priority for a section absent from `priority_order`.
pub const DEFAULT_SECTION_PRIORITY: i32 = 99;

/// Engine-wide operational knobs, loaded by the `config` crate from a
/// TOML file overlaid with `SCHEDULING_`-prefixed environment
/// variables, in the idiom of the teacher's `CircuitBreakerConfig`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    #[serde(default = "default_priority_order")]
    pub priority_order: HashMap<String, i32>,
    pub special_workers: SpecialWorkerNames,
    pub versatility_coefficients: VersatilityCoefficients,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            priority_order: default_priority_order(),
            special_workers: SpecialWorkerNames::default(),
            versatility_coefficients: VersatilityCoefficients::default(),
        }
    }
}

impl SchedulingConfig {
    /// Loads `SCHEDULING_CONFIG_PATH` (default `scheduling.toml`)
    /// layered under `SCHEDULING_`-prefixed environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::var("SCHEDULING_CONFIG_PATH")
            .unwrap_or_else(|_| "scheduling.toml".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name(&path).required(false))
            .add_source(config::Environment::with_prefix("SCHEDULING").separator("__"));

        builder.build()?.try_deserialize()
    }

    pub fn priority_of(&self, section_name: &str) -> i32 {
        self.priority_order
            .get(section_name)
            .copied()
            .unwrap_or(DEFAULT_SECTION_PRIORITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_priority_matches_built_in_table() {
        let config = SchedulingConfig::default();
        assert_eq!(config.priority_of("HEMS_tarde"), 1);
        assert_eq!(config.priority_of("Urg_G_refuerzo_fyf"), 13);
    }

    #[test]
    fn unknown_section_defaults_to_99() {
        let config = SchedulingConfig::default();
        assert_eq!(config.priority_of("Unknown_section"), DEFAULT_SECTION_PRIORITY);
    }

    #[test]
    fn special_worker_defaults_match_source() {
        let names = SpecialWorkerNames::default();
        assert_eq!(names.monday_carryover_fallback, "María Coma");
        assert_eq!(names.first_friday_lead, "Violeta Fariña");
    }
}
