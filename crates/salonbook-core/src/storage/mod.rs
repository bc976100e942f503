mod config;
pub mod database;

pub use config::{BackendConfig, BookingConfig, Config, GatewayConfig, SyncConfig};
pub use database::{Database, PassRecord, DEFAULT_SYNC_INTERVAL_MINUTES};

use std::path::PathBuf;

/// Returns `~/.config/salonbook[-dev]/` based on SALONBOOK_ENV.
///
/// Set SALONBOOK_ENV=dev to use a development data directory.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("SALONBOOK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("salonbook-dev")
    } else {
        base_dir.join("salonbook")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
