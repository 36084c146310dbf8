//! Resolver dispatch
//!
//! Maps `(type, field)` to a bound pipeline. The table is assembled once from
//! a fixed list of bindings, checked against the schema's legal field set and
//! the registered data sources, and is read-only afterwards.

use crate::context::RequestContext;
use crate::datasource::DataSourceRegistry;
use crate::error::{DispatchError, ResolveError};
use crate::pipeline::{CancellationToken, Pipeline, PipelineExecutor};
use crate::value::{Map, Value};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// A `(typeName, fieldName)` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldRef {
    pub type_name: String,
    pub field_name: String,
}

impl FieldRef {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
        }
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.type_name, self.field_name)
    }
}

/// Legal field set supplied by the API schema.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    fields: BTreeSet<FieldRef>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, type_name: &str, field_name: &str) -> Self {
        self.fields.insert(FieldRef::new(type_name, field_name));
        self
    }

    pub fn contains(&self, type_name: &str, field_name: &str) -> bool {
        self.fields.contains(&FieldRef::new(type_name, field_name))
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.fields.iter()
    }
}

pub struct DispatchTableBuilder<'a> {
    catalog: SchemaCatalog,
    data_sources: &'a DataSourceRegistry,
    bindings: BTreeMap<FieldRef, Arc<Pipeline>>,
}

impl<'a> DispatchTableBuilder<'a> {
    pub fn new(catalog: SchemaCatalog, data_sources: &'a DataSourceRegistry) -> Self {
        Self {
            catalog,
            data_sources,
            bindings: BTreeMap::new(),
        }
    }

    pub fn bind(
        &mut self,
        type_name: &str,
        field_name: &str,
        pipeline: Pipeline,
    ) -> Result<&mut Self, DispatchError> {
        let field = FieldRef::new(type_name, field_name);
        if !self.catalog.contains(type_name, field_name) {
            return Err(DispatchError::NotInSchema {
                type_name: field.type_name,
                field_name: field.field_name,
            });
        }
        if self.bindings.contains_key(&field) {
            return Err(DispatchError::DuplicateBinding {
                type_name: field.type_name,
                field_name: field.field_name,
            });
        }
        if let Some(step) = pipeline
            .steps()
            .iter()
            .find(|step| !self.data_sources.contains(&step.data_source))
        {
            return Err(DispatchError::UnknownDataSource {
                step: step.id.clone(),
                data_source: step.data_source.clone(),
            });
        }
        self.bindings.insert(field, Arc::new(pipeline));
        Ok(self)
    }

    pub fn build(self) -> DispatchTable {
        DispatchTable {
            catalog: self.catalog,
            bindings: self.bindings,
        }
    }
}

/// Immutable `(type, field)` → pipeline mapping.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    catalog: SchemaCatalog,
    bindings: BTreeMap<FieldRef, Arc<Pipeline>>,
}

impl DispatchTable {
    pub fn get(&self, type_name: &str, field_name: &str) -> Result<&Arc<Pipeline>, DispatchError> {
        let field = FieldRef::new(type_name, field_name);
        match self.bindings.get(&field) {
            Some(pipeline) => Ok(pipeline),
            None if self.catalog.contains(type_name, field_name) => Err(DispatchError::Unbound {
                type_name: field.type_name,
                field_name: field.field_name,
            }),
            None => Err(DispatchError::NotInSchema {
                type_name: field.type_name,
                field_name: field.field_name,
            }),
        }
    }

    /// Bound fields in `(type, field)` order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldRef, &Pipeline)> {
        self.bindings.iter().map(|(field, pipeline)| (field, pipeline.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Inbound field invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInvocation {
    pub type_name: String,
    pub field_name: String,
    #[serde(default)]
    pub arguments: Map,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

impl FieldInvocation {
    pub fn new(type_name: impl Into<String>, field_name: impl Into<String>, arguments: Map) -> Self {
        Self {
            type_name: type_name.into(),
            field_name: field_name.into(),
            arguments,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Value) -> Self {
        self.source = Some(source);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub message: String,
}

/// Exactly one of a value or an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldResponse {
    Value { value: Value },
    Error { error: FieldError },
}

impl From<Result<Value, ResolveError>> for FieldResponse {
    fn from(outcome: Result<Value, ResolveError>) -> Self {
        match outcome {
            Ok(value) => FieldResponse::Value { value },
            Err(err) => FieldResponse::Error {
                error: FieldError {
                    message: err.to_string(),
                },
            },
        }
    }
}

/// Entry point for field invocations.
#[derive(Debug, Clone)]
pub struct Resolver {
    table: Arc<DispatchTable>,
    executor: PipelineExecutor,
}

impl Resolver {
    pub fn new(table: Arc<DispatchTable>, executor: PipelineExecutor) -> Self {
        Self { table, executor }
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    pub async fn resolve(
        &self,
        type_name: &str,
        field_name: &str,
        arguments: Map,
        source: Option<Value>,
    ) -> Result<Value, ResolveError> {
        self.resolve_with_cancellation(
            type_name,
            field_name,
            arguments,
            source,
            &CancellationToken::new(),
        )
        .await
    }

    pub async fn resolve_with_cancellation(
        &self,
        type_name: &str,
        field_name: &str,
        arguments: Map,
        source: Option<Value>,
        cancellation: &CancellationToken,
    ) -> Result<Value, ResolveError> {
        let pipeline = self.table.get(type_name, field_name)?;
        debug!(type_name, field_name, pipeline = %pipeline.name(), "Resolving field");
        let mut ctx = RequestContext::new(arguments, source);
        self.executor.execute(pipeline, &mut ctx, cancellation).await
    }

    pub async fn invoke(&self, invocation: FieldInvocation) -> FieldResponse {
        self.resolve(
            &invocation.type_name,
            &invocation.field_name,
            invocation.arguments,
            invocation.source,
        )
        .await
        .into()
    }

    /// Resolve sibling fields concurrently, each with its own context.
    /// Responses come back in invocation order.
    pub async fn invoke_all(&self, invocations: Vec<FieldInvocation>) -> Vec<FieldResponse> {
        join_all(invocations.into_iter().map(|invocation| self.invoke(invocation))).await
    }
}
