use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus exporter serving scrapes on `listen` and register
/// all sync metrics. Without an address no recorder is installed and the
/// metric macros stay no-ops.
pub fn init_metrics(listen: Option<SocketAddr>) -> anyhow::Result<()> {
    let Some(addr) = listen else {
        tracing::debug!("METRICS_ADDR unset, metrics exporter disabled");
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("listings_observed_total").absolute(0);
    counter!("rows_dirty_total").absolute(0);
    counter!("rows_appended_total").absolute(0);
    counter!("rows_removed_total").absolute(0);
    counter!("write_groups_total").absolute(0);
    counter!("parse_recoveries_total").absolute(0);
    counter!("sync_runs_total").absolute(0);
    counter!("sync_failures_total").absolute(0);

    // Histogram is lazily created on first record; force creation.
    histogram!("sync_duration_seconds").record(0.0);

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
