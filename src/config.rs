use std::path::PathBuf;
use std::time::Duration;

pub const STATS_URL: &str = "https://api2.hiveos.farm/api/v2/hive/stats";

/// Canonical names dropped during aggregation.
pub const DEFAULT_DENYLIST: &[&str] = &["SMH \u{6c38}\u{5dde}"];

/// A new cycle runs once the latest cleaned snapshot is older than this.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(24 * 60 * 60);

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// rwxr-xr-x, applied to the data directory before each write on Unix.
pub const DATA_DIR_MODE: u32 = 0o755;

/// rw-r--r--, applied to each snapshot file on Unix.
pub const SNAPSHOT_FILE_MODE: u32 = 0o644;

pub const RAW_PREFIX: &str = "raw_data";
pub const CLEANED_PREFIX: &str = "cleaned_data";

/// Export artifact directory names, in the order they are written.
pub const SNAPSHOT_EXPORT: &str = "snapshot_output";
pub const DIFFERENCES_EXPORT: &str = "differences_output";
pub const DAILY_PIVOT_EXPORT: &str = "pivot_daily_output";
pub const MONTHLY_PIVOT_EXPORT: &str = "pivot_monthly_output";

pub fn default_denylist() -> Vec<String> {
    DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect()
}

pub fn default_data_dir() -> PathBuf {
    if let Some(data) = dirs::data_dir() {
        data.join("hivestats")
    } else {
        PathBuf::from("data")
    }
}
