//! fieldpipe: Field Resolution Pipelines
//!
//! Resolves individual fields of a query/mutation API by running a bound
//! pipeline of mapping-template steps against key-value tables, paginated
//! indexes and remote functions, threading a per-invocation stash between
//! steps and aborting on the first error.

pub mod blog;
pub mod cli;
pub mod config;
pub mod context;
pub mod datasource;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod store;
pub mod template;
pub mod value;

pub use context::{RequestContext, Stash};
pub use dispatch::{FieldInvocation, FieldResponse, Resolver};
pub use error::{ApiError, DataSourceError, DispatchError, ResolveError, TemplateError};
pub use pipeline::{CancellationToken, Pipeline, PipelineExecutor, Step};
pub use value::Value;
