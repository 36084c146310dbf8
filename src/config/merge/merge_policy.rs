//! Merge rules: defaults, override order.

use crate::datasource::moderation::DEFAULT_BANNED_TERMS;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with built-in defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let banned_terms: Vec<String> = DEFAULT_BANNED_TERMS.iter().map(|t| t.to_string()).collect();
    Config::builder()
        .set_default("storage.backend", "sled")?
        .set_default("moderation.banned_terms", banned_terms)?
        .set_default("logging.level", "info")
}
