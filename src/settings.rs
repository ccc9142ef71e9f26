//! Engine settings. Read from an optional `bakery.toml` next to the binary and
//! from `BAKERY_*` environment variables, e.g. `BAKERY_SUBMIT_LOCK=true`.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Refuse a second submit while one is still waiting on the remote API.
    pub submit_lock: bool,
    /// Drop and re-key row errors when a line item is removed.
    pub rekey_errors_on_remove: bool,
    /// Rows per page in collection listings.
    pub page_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            submit_lock: false,
            rekey_errors_on_remove: false,
            page_size: 5,
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_file("bakery")
    }

    pub fn from_file(name: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name(name).required(false))
            .add_source(Environment::with_prefix("BAKERY"))
            .build()?;

        settings.try_deserialize()
    }
}
