//! Configuration System
//!
//! Layered configuration, lowest to highest precedence: built-in defaults,
//! `~/.config/fieldpipe/config.toml`, `<workspace>/config/config.toml`,
//! `<workspace>/config/$FIELDPIPE_ENV.toml`, an explicit `--config` file,
//! then `FIELDPIPE__*` environment variables (`FIELDPIPE__STORAGE__BACKEND=memory`).

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use config::{ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod merge {
    pub mod merge_policy;
}
mod sources {
    pub mod global_file;
    pub mod workspace_file;
}

pub use sources::global_file::global_config_path;
pub use sources::workspace_file::ENV_NAME_VAR;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldpipeConfig {
    /// Backing table storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Content moderation function
    #[serde(default)]
    pub moderation: ModerationConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Tables live for the lifetime of the process.
    Memory,
    /// Tables persist in a sled database.
    #[default]
    Sled,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Database directory for the sled backend. Relative paths are taken
    /// from the workspace root; unset means the per-user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Where the sled database lives for `workspace_root`.
    pub fn resolved_path(&self, workspace_root: &Path) -> PathBuf {
        match &self.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => workspace_root.join(path),
            None => default_store_path(workspace_root),
        }
    }
}

/// `$XDG_DATA_HOME/fieldpipe/store` (or the platform equivalent); falls back
/// to `<workspace>/.fieldpipe/store` when no home directory is known.
pub fn default_store_path(workspace_root: &Path) -> PathBuf {
    directories::ProjectDirs::from("", "", "fieldpipe")
        .map(|dirs| dirs.data_dir().join("store"))
        .unwrap_or_else(|| workspace_root.join(".fieldpipe").join("store"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Content containing any of these is flagged.
    #[serde(default = "default_banned_terms")]
    pub banned_terms: Vec<String>,
}

fn default_banned_terms() -> Vec<String> {
    crate::datasource::moderation::DEFAULT_BANNED_TERMS
        .iter()
        .map(|t| t.to_string())
        .collect()
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            banned_terms: default_banned_terms(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Storage(String),
    Moderation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Storage(msg) => write!(f, "Storage: {}", msg),
            ValidationError::Moderation(msg) => write!(f, "Moderation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl FieldpipeConfig {
    /// Validate the entire configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(path) = &self.storage.path {
            if path.as_os_str().is_empty() {
                errors.push(ValidationError::Storage(
                    "Store path cannot be empty".to_string(),
                ));
            }
        }

        for (index, term) in self.moderation.banned_terms.iter().enumerate() {
            if term.trim().is_empty() {
                errors.push(ValidationError::Moderation(format!(
                    "banned_terms[{}] is blank",
                    index
                )));
            }
        }

        errors.extend(
            crate::logging::validate(&self.logging)
                .into_iter()
                .map(ValidationError::Logging),
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error.
    pub fn validated(self) -> Result<Self, ApiError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            ApiError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApiError> {
        toml::to_string_pretty(self)
            .map_err(|e| ApiError::ConfigError(format!("Failed to render config: {}", e)))
    }
}

/// Assembles the configuration layers for one workspace.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    workspace_root: PathBuf,
    global_file: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            workspace_root: workspace_root.into(),
            global_file: global_config_path(),
            explicit_file: None,
        }
    }

    /// Skip the per-user file; tests use this to stay hermetic.
    pub fn without_global_file(mut self) -> Self {
        self.global_file = None;
        self
    }

    /// Layer `path` above the workspace files. It must exist.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.explicit_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<FieldpipeConfig, ConfigError> {
        let mut builder = merge::merge_policy::builder_with_defaults()?;
        builder = sources::global_file::add_to_builder(builder, self.global_file.as_deref())?;
        builder = sources::workspace_file::add_to_builder(builder, &self.workspace_root)?;
        if let Some(path) = &self.explicit_file {
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix("FIELDPIPE")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("moderation.banned_terms"),
        );
        builder.build()?.try_deserialize()
    }

    /// Load a single TOML file over the built-in defaults.
    pub fn load_from_file(path: &Path) -> Result<FieldpipeConfig, ConfigError> {
        merge::merge_policy::builder_with_defaults()?
            .add_source(File::from(path).required(true))
            .build()?
            .try_deserialize()
    }
}
