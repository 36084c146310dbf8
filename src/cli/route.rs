//! CLI route: single route table and run context.

use crate::blog::{self, BlogTables};
use crate::cli::parse::Commands;
use crate::cli::presentation::{format_fields_json, format_fields_text, format_response};
use crate::config::{ConfigLoader, FieldpipeConfig, StorageBackend};
use crate::datasource::BannedTermsModerator;
use crate::dispatch::{FieldInvocation, Resolver};
use crate::error::{ApiError, StorageError};
use crate::store::SledStore;
use crate::template::{Template, TemplateHelpers};
use crate::value::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Runtime context for CLI execution: workspace and effective configuration.
/// Storage is opened only by the commands that need it.
pub struct RunContext {
    workspace_root: PathBuf,
    config: FieldpipeConfig,
}

impl RunContext {
    /// Load and validate configuration for `workspace_root`.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let mut loader = ConfigLoader::new(&workspace_root);
        if let Some(path) = config_path {
            loader = loader.with_file(path);
        }
        let config = loader.load()?.validated()?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: FieldpipeConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &FieldpipeConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Invoke {
                type_name,
                field_name,
                args,
                source,
            } => {
                let arguments = match args {
                    Some(text) => parse_arguments(text)?,
                    None => Map::new(),
                };
                let source = source.as_deref().map(parse_json).transpose()?;
                let mut invocation = FieldInvocation::new(type_name, field_name, arguments);
                if let Some(source) = source {
                    invocation = invocation.with_source(source);
                }
                self.handle_invoke(invocation)
            }
            Commands::Fields { format } => {
                let (resolver, _) = self.open_resolver(StorageBackend::Memory)?;
                match format.as_str() {
                    "json" => format_fields_json(resolver.table()),
                    "text" => Ok(format_fields_text(resolver.table())),
                    other => Err(ApiError::InvalidInput(format!(
                        "Unknown format '{}' (expected text or json)",
                        other
                    ))),
                }
            }
            Commands::CheckTemplate { file, kind } => {
                let text = std::fs::read_to_string(file).map_err(|e| {
                    ApiError::InvalidInput(format!(
                        "Cannot read template {}: {}",
                        file.display(),
                        e
                    ))
                })?;
                Template::parse((*kind).into(), &text)?;
                Ok(format!("{}: ok", file.display()))
            }
            Commands::Config => self.config.to_toml(),
        }
    }

    fn handle_invoke(&self, invocation: FieldInvocation) -> Result<String, ApiError> {
        let (resolver, store) = self.open_resolver(self.config.storage.backend)?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(ApiError::Io)?;

        info!(
            type_name = %invocation.type_name,
            field_name = %invocation.field_name,
            "Invoking field"
        );
        let response = runtime.block_on(resolver.invoke(invocation));
        if let Some(store) = store {
            store.flush()?;
        }
        format_response(&response)
    }

    fn open_resolver(
        &self,
        backend: StorageBackend,
    ) -> Result<(Resolver, Option<SledStore>), ApiError> {
        let (tables, store) = match backend {
            StorageBackend::Memory => (BlogTables::in_memory(), None),
            StorageBackend::Sled => {
                let path = self.config.storage.resolved_path(&self.workspace_root);
                std::fs::create_dir_all(&path).map_err(StorageError::IoError)?;
                debug!(store_path = %path.display(), "Opening sled store");
                let store = SledStore::open(&path)?;
                (BlogTables::sled(&store)?, Some(store))
            }
        };
        let moderator = Arc::new(BannedTermsModerator::new(
            self.config.moderation.banned_terms.iter().cloned(),
        ));
        let resolver = blog::resolver(&tables, moderator, TemplateHelpers::system())?;
        Ok((resolver, store))
    }
}

fn parse_json(text: &str) -> Result<Value, ApiError> {
    serde_json::from_str::<serde_json::Value>(text)
        .map(Value::from)
        .map_err(|e| ApiError::InvalidInput(format!("Invalid JSON: {}", e)))
}

fn parse_arguments(text: &str) -> Result<Map, ApiError> {
    match parse_json(text)? {
        Value::Map(map) => Ok(map),
        other => Err(ApiError::InvalidInput(format!(
            "--args must be a JSON object, got {}",
            other.kind_name()
        ))),
    }
}
