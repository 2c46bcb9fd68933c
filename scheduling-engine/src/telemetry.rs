use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// Initializes tracing, driven by environment variables:
/// - `RUST_LOG` for log filtering
/// - `LOG_FORMAT=json` for JSON output, plain text otherwise
///
/// This crate has no HTTP hop between services (there is only one
/// process), so unlike the teacher's `init_telemetry` there is no
/// OpenTelemetry OTLP exporter or trace-context propagation here — no
/// guard needs to be held, and there is nothing to shut down on drop.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();

    let registry = Registry::default().with(env_filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json().flatten_event(true);
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer();
        registry.with(fmt_layer).init();
    }
}
