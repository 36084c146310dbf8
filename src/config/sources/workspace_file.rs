//! Workspace layers: `config/config.toml`, then `config/$FIELDPIPE_ENV.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use std::path::{Path, PathBuf};

/// Selects the environment overlay; `development` when unset.
pub const ENV_NAME_VAR: &str = "FIELDPIPE_ENV";

fn layer_paths(workspace_root: &Path) -> [PathBuf; 2] {
    let dir = workspace_root.join("config");
    let env_name = std::env::var(ENV_NAME_VAR).unwrap_or_else(|_| "development".to_string());
    [dir.join("config.toml"), dir.join(format!("{}.toml", env_name))]
}

/// Layer whichever workspace files exist, base first.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(layer_paths(workspace_root)
        .into_iter()
        .filter(|path| path.exists())
        .fold(builder, |builder, path| {
            builder.add_source(File::from(path).required(false))
        }))
}
