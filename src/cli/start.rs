use crate::cli::{actions::Action, commands, dispatch::handler};
use anyhow::Result;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime::Tokio, trace, Resource};
use std::time::Duration;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

const OTLP_EXPORT_TIMEOUT: Duration = Duration::from_secs(3);

/// Parse the command line, bring up telemetry, and return the action to run.
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    let verbosity = matches.get_one::<u8>("verbosity").map_or(0, |&v| v);
    init_telemetry(verbosity_to_level(verbosity))?;

    handler(&matches)
}

/// Map the counted/named verbosity from `-v`/`KUNCI_LOG_LEVEL` onto a level.
fn verbosity_to_level(verbosity: u8) -> tracing::Level {
    match verbosity {
        0 => tracing::Level::ERROR,
        1 => tracing::Level::WARN,
        2 => tracing::Level::INFO,
        3 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

fn telemetry_resource() -> Resource {
    Resource::new(vec![
        KeyValue::new("service.name", env!("CARGO_PKG_NAME")),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        KeyValue::new("service.namespace", "auth"),
    ])
}

/// Install the global subscriber: fmt output, OTLP spans, and an env
/// filter seeded from the CLI verbosity (overridable via `RUST_LOG`).
fn init_telemetry(level: tracing::Level) -> Result<()> {
    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_timeout(OTLP_EXPORT_TIMEOUT);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(trace::config().with_resource(telemetry_resource()))
        .install_batch(Tokio)?;

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    let fmt_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false);

    let subscriber = Registry::default()
        .with(fmt_layer)
        .with(OpenTelemetryLayer::new(tracer))
        .with(env_filter);

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
