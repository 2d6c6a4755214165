//! Tracing setup for the shardq binaries
use opentelemetry::sdk::propagation::TraceContextPropagator;
use opentelemetry::sdk::trace::BatchConfig;
use opentelemetry::sdk::{trace, Resource};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use tracing::level_filters::LevelFilter;
use tracing_bunyan_formatter::JsonStorageLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

const SERVICE_NAME: &str = "shardq";

/// Ships spans to an OTLP collector (eg: jaeger) listening on `exporter_endpoint`
pub fn initialize_jaeger_subscriber(exporter_endpoint: &str) -> anyhow::Result<()> {
    let exporter = opentelemetry_otlp::new_exporter()
        .http()
        .with_endpoint(exporter_endpoint);

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(
            trace::config().with_resource(Resource::new(vec![KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                SERVICE_NAME.to_string(),
            )])),
        )
        .with_batch_config(BatchConfig::default().with_max_queue_size(1024 * 1024))
        .install_batch(opentelemetry::runtime::Tokio)?;

    let subscriber = Registry::default();
    let tracing_layer = tracing_opentelemetry::layer().with_tracer(tracer);
    global::set_text_map_propagator(TraceContextPropagator::new());

    subscriber
        .with(LevelFilter::INFO)
        .with(tracing_layer)
        .with(JsonStorageLayer)
        .try_init()?;

    Ok(())
}

/// Plain log lines on stdout. Verbosity is controlled by `RUST_LOG` (defaults to `info`).
pub fn initialize_fmt_subscriber() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}
