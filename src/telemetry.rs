use log::info;
use once_cell::sync::Lazy;
use opentelemetry::{KeyValue, global, metrics::Counter};
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider};

/// Counts listing rows returned without one of their display fields.
static ENRICHMENT_DEGRADED: Lazy<Counter<u64>> = Lazy::new(|| {
    global::meter("movie-review")
        .u64_counter("review_enrichment_degraded")
        .with_description("Review rows returned without a resolvable username or movie title.")
        .build()
});

/// Records a failed enrichment of `field` (`username` or `movie_title`).
pub fn record_degraded_enrichment(field: &'static str) {
    ENRICHMENT_DEGRADED.add(1, &[KeyValue::new("field", field)]);
}

/// Installs an OTLP/HTTP metrics exporter as global meter provider.
///
/// The exporter endpoint is taken from the standard `OTEL_EXPORTER_OTLP_*` environment variables.
pub fn init_otlp_metrics() -> anyhow::Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .build()?;
    let provider = SdkMeterProvider::builder()
        .with_periodic_exporter(exporter)
        .with_resource(Resource::builder().with_service_name("review").build())
        .build();
    global::set_meter_provider(provider.clone());
    info!("OTLP metrics exporter installed.");
    Ok(provider)
}
