//! Shared plumbing for CLI commands.

use std::sync::{Arc, Mutex};

use salonbook_core::platform::HttpSmsGateway;
use salonbook_core::{Config, Database, HttpBookingApi};

pub type CliError = Box<dyn std::error::Error>;

pub fn load_config() -> Config {
    Config::load_or_default()
}

/// Backend client from the configured base URL and API key.
pub fn api(config: &Config) -> Result<HttpBookingApi, CliError> {
    let key = if config.backend.api_key.is_empty() {
        None
    } else {
        Some(config.backend.api_key.clone())
    };
    Ok(HttpBookingApi::new(&config.backend.base_url, key)?)
}

/// SMS gateway channel from config. Unconfigured URLs produce per-item
/// permission failures rather than an upfront error.
pub fn gateway(config: &Config) -> HttpSmsGateway {
    let key = if config.gateway.api_key.is_empty() {
        None
    } else {
        Some(config.gateway.api_key.clone())
    };
    HttpSmsGateway::new(config.gateway.url.clone(), key)
}

pub fn open_db() -> Result<Arc<Mutex<Database>>, CliError> {
    Ok(Arc::new(Mutex::new(Database::open()?)))
}
