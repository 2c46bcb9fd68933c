use shared::types::{Scenario, ScenarioStatus};
use uuid::Uuid;

/// Wrapper for a scenario in `Draft` status. Consuming `publish` into
/// `PublishedScenario`. There is no way back to `DraftScenario`.
pub struct DraftScenario {
    inner: Scenario,
}

/// Wrapper for a scenario in `Published` status. Consuming `archive`
/// into `ArchivedScenario`.
pub struct PublishedScenario {
    inner: Scenario,
}

/// Terminal state: no further transitions exist.
pub struct ArchivedScenario {
    inner: Scenario,
}

impl DraftScenario {
    pub fn from_scenario(scenario: Scenario) -> Option<Self> {
        if scenario.status == ScenarioStatus::Draft {
            Some(Self { inner: scenario })
        } else {
            None
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn inner(&self) -> &Scenario {
        &self.inner
    }

    pub fn publish(mut self) -> (PublishedScenario, Uuid, ScenarioStatus) {
        let id = self.inner.id;
        self.inner.status = ScenarioStatus::Published;
        (PublishedScenario { inner: self.inner }, id, ScenarioStatus::Published)
    }
}

impl PublishedScenario {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn inner(&self) -> &Scenario {
        &self.inner
    }

    pub fn archive(mut self) -> (ArchivedScenario, Uuid, ScenarioStatus) {
        let id = self.inner.id;
        self.inner.status = ScenarioStatus::Archived;
        (ArchivedScenario { inner: self.inner }, id, ScenarioStatus::Archived)
    }
}

impl ArchivedScenario {
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn into_inner(self) -> Scenario {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_scenario(status: ScenarioStatus) -> Scenario {
        Scenario {
            id: Uuid::new_v4(),
            name: "January 2026".to_string(),
            created_by: "scheduler-bot".to_string(),
            created_at: Utc::now(),
            year: 2026,
            status,
            description: String::new(),
            settings_blob: sqlx::types::Json(serde_json::json!({})),
        }
    }

    #[test]
    fn draft_from_draft_scenario_succeeds() {
        let scenario = make_scenario(ScenarioStatus::Draft);
        assert!(DraftScenario::from_scenario(scenario).is_some());
    }

    #[test]
    fn draft_from_non_draft_scenario_returns_none() {
        for status in [ScenarioStatus::Published, ScenarioStatus::Archived] {
            let scenario = make_scenario(status);
            assert!(DraftScenario::from_scenario(scenario).is_none());
        }
    }

    #[test]
    fn draft_to_published_transition() {
        let scenario = make_scenario(ScenarioStatus::Draft);
        let scenario_id = scenario.id;
        let draft = DraftScenario::from_scenario(scenario).unwrap();

        let (published, id, status) = draft.publish();
        assert_eq!(id, scenario_id);
        assert_eq!(status, ScenarioStatus::Published);
        assert_eq!(published.id(), scenario_id);
    }

    #[test]
    fn published_to_archived_transition() {
        let scenario = make_scenario(ScenarioStatus::Draft);
        let scenario_id = scenario.id;
        let draft = DraftScenario::from_scenario(scenario).unwrap();
        let (published, _, _) = draft.publish();

        let (archived, id, status) = published.archive();
        assert_eq!(id, scenario_id);
        assert_eq!(status, ScenarioStatus::Archived);

        let inner = archived.into_inner();
        assert_eq!(inner.status, ScenarioStatus::Archived);
    }
}
