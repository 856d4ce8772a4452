use pricebot::collector::WardrobeClient;
use pricebot::config::AppConfig;
use pricebot::services::{run_sync_loop, run_sync_once};
use pricebot::table::SheetsClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    pricebot::metrics::init_metrics(config.metrics_addr)?;

    let http = reqwest::Client::new();
    let source = WardrobeClient::from_profile_url(
        http.clone(),
        &config.profile_url,
        config.listing_base_url.as_deref(),
    )?;
    let store = SheetsClient::new(
        http,
        config.sheet_id.clone(),
        config.sheet_name.clone(),
        config.sheet_gid,
        config.access_token.clone(),
    );

    let settings = config.sync_settings();
    tracing::info!(
        profile = %source.profile_id(),
        sheet = %config.sheet_name,
        default_percent = %settings.default_price_change_percent,
        dry_run = settings.dry_run,
        "Price tracker starting"
    );

    match config.sync_interval {
        Some(every) => {
            tokio::select! {
                _ = run_sync_loop(&source, &store, &settings, every) => {}
                _ = tokio::signal::ctrl_c() => tracing::info!("Shutdown requested"),
            }
        }
        None => {
            run_sync_once(&source, &store, &settings).await?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
