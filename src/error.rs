//! Error types for the field resolution pipeline engine.

use thiserror::Error;

/// Malformed template source or a template misused at evaluation time.
///
/// These are programming defects in a binding, never business outcomes, and
/// are surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("Template syntax error at {line}:{column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Unknown path root '{0}' (expected args, source, stash or result)")]
    UnknownRoot(String),

    #[error("Unknown helper '{0}'")]
    UnknownHelper(String),

    #[error("Helper '{helper}' takes {expected} argument(s), got {actual}")]
    Arity {
        helper: String,
        expected: usize,
        actual: usize,
    },

    #[error("{0} is not allowed in a request template")]
    NotAllowed(String),

    #[error("Unresolvable path '{path}': segment '{segment}' applied to {kind}")]
    UnresolvablePath {
        path: String,
        segment: String,
        kind: &'static str,
    },

    #[error("Type mismatch in {context}: expected {expected}, got {actual}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        actual: &'static str,
    },
}

/// Whether retrying the whole pipeline might succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Throttling, engine I/O hiccups.
    Transient,
    /// Malformed key, bad request shape, corrupt stored data.
    Terminal,
}

/// Adapter-level fault while talking to a backend.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Data source '{data_source}' failed ({kind:?}): {message}")]
pub struct DataSourceError {
    pub data_source: String,
    pub kind: FaultKind,
    pub message: String,
}

impl DataSourceError {
    pub fn transient(data_source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            kind: FaultKind::Transient,
            message: message.into(),
        }
    }

    pub fn terminal(data_source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data_source: data_source.into(),
            kind: FaultKind::Terminal,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FaultKind::Transient
    }
}

/// Dispatch table construction and lookup errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("No resolver bound for {type_name}.{field_name}")]
    Unbound {
        type_name: String,
        field_name: String,
    },

    #[error("{type_name}.{field_name} is not a field of the schema")]
    NotInSchema {
        type_name: String,
        field_name: String,
    },

    #[error("{type_name}.{field_name} is already bound")]
    DuplicateBinding {
        type_name: String,
        field_name: String,
    },

    #[error("Step '{step}' references unknown data source '{data_source}'")]
    UnknownDataSource { step: String, data_source: String },

    #[error("Data source '{0}' is registered twice")]
    DuplicateDataSource(String),
}

/// Backing table errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage engine error: {0}")]
    Engine(#[from] sled::Error),

    #[error("Corrupt stored item: {0}")]
    Corrupt(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    /// Classify a table fault for the adapter that hit it.
    pub fn into_data_source_error(self, data_source: &str) -> DataSourceError {
        match self {
            StorageError::Engine(_) | StorageError::IoError(_) => {
                DataSourceError::transient(data_source, self.to_string())
            }
            StorageError::Corrupt(_) | StorageError::InvalidKey(_) => {
                DataSourceError::terminal(data_source, self.to_string())
            }
        }
    }
}

/// Terminal error of one field invocation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    /// Raised explicitly by a response template; displays the authored message.
    #[error("{message}")]
    Validation { message: String },

    #[error(transparent)]
    DataSource(#[from] DataSourceError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invocation cancelled after {calls_issued} backend call(s) were issued; their effects are not undone")]
    Cancelled { calls_issued: usize },
}

impl ResolveError {
    pub fn validation(message: impl Into<String>) -> Self {
        ResolveError::Validation {
            message: message.into(),
        }
    }
}

/// Errors of the ambient surface: configuration, logging, storage bootstrap, CLI input.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Process-level I/O outside the backing tables (e.g. starting the async runtime).
    #[error("I/O error: {0}")]
    Io(#[source] std::io::Error),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
