use rust_decimal::Decimal;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

const DEFAULT_SHEET_NAME: &str = "Sheet1";

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Listing source
    pub profile_url: String,
    pub listing_base_url: Option<String>,

    // Google Sheets
    pub sheet_id: String,
    pub access_token: String,
    pub sheet_name: String,
    pub sheet_gid: i64,

    // Sync
    pub default_price_change_percent: Decimal,
    pub write_group_delay: Duration,
    pub sync_interval: Option<Duration>,
    pub dry_run: bool,

    pub metrics_addr: Option<SocketAddr>,
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            profile_url: required("PROFILE_URL")?,
            listing_base_url: optional("LISTING_BASE_URL"),

            sheet_id: required("GOOGLE_SHEET_ID")?,
            access_token: required("GOOGLE_ACCESS_TOKEN")?,
            sheet_name: env::var("SHEET_NAME").unwrap_or_else(|_| DEFAULT_SHEET_NAME.into()),
            sheet_gid: env::var("SHEET_GID")
                .unwrap_or_else(|_| "0".into())
                .parse()
                .unwrap_or(0),

            default_price_change_percent: env::var("DEFAULT_PRICE_CHANGE_PERCENT")
                .unwrap_or_else(|_| "-2".into())
                .parse()
                .unwrap_or(Decimal::from(-2)),
            write_group_delay: Duration::from_millis(
                env::var("WRITE_GROUP_DELAY_MS")
                    .unwrap_or_else(|_| "1100".into())
                    .parse()
                    .unwrap_or(1100),
            ),
            sync_interval: optional("SYNC_INTERVAL_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            dry_run: env::var("DRY_RUN")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .unwrap_or(false),

            metrics_addr: optional("METRICS_ADDR").and_then(|v| v.parse().ok()),
            log_json: env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")),
        })
    }

    /// Settings the sync runner needs, without credentials.
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            default_price_change_percent: self.default_price_change_percent,
            write_group_delay: self.write_group_delay,
            dry_run: self.dry_run,
        }
    }
}

/// Per-run knobs handed to the sync runner.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub default_price_change_percent: Decimal,
    pub write_group_delay: Duration,
    pub dry_run: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            default_price_change_percent: Decimal::from(-2),
            write_group_delay: Duration::from_millis(1100),
            dry_run: false,
        }
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    optional(key).ok_or_else(|| anyhow::anyhow!("{key} must be set"))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
