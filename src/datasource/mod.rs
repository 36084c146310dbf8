//! Data source adapters
//!
//! A uniform `call(request) -> result` over three backend kinds. The request
//! is whatever the step's request template produced; the adapter decodes it
//! into a typed operation, performs it, and hands back a plain value for the
//! response template.

pub mod function;
pub mod moderation;
pub mod request;

pub use function::{FnFunction, InvokeError, RemoteFunction};
pub use moderation::{BannedTermsModerator, ContentModerator, ModerationFunction};
pub use request::{KeyValueOperation, QueryOperation, DEFAULT_QUERY_LIMIT};

use crate::error::{DataSourceError, DispatchError};
use crate::store::attribute::item_to_value;
use crate::store::{
    decode_continuation_token, encode_continuation_token, AttributeValue, Table,
};
use crate::value::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSourceKind {
    KeyValueStore,
    QueryableIndex,
    RemoteFunction,
}

impl fmt::Display for DataSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataSourceKind::KeyValueStore => "key-value",
            DataSourceKind::QueryableIndex => "index",
            DataSourceKind::RemoteFunction => "function",
        };
        f.write_str(name)
    }
}

enum Backend {
    KeyValueStore(Arc<dyn Table>),
    QueryableIndex(Arc<dyn Table>),
    RemoteFunction(Arc<dyn RemoteFunction>),
}

/// One named backend resource.
pub struct DataSourceAdapter {
    name: String,
    backend: Backend,
}

impl fmt::Debug for DataSourceAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceAdapter")
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

impl DataSourceAdapter {
    pub fn key_value(name: impl Into<String>, table: Arc<dyn Table>) -> Self {
        Self {
            name: name.into(),
            backend: Backend::KeyValueStore(table),
        }
    }

    pub fn queryable_index(name: impl Into<String>, table: Arc<dyn Table>) -> Self {
        Self {
            name: name.into(),
            backend: Backend::QueryableIndex(table),
        }
    }

    pub fn remote_function(name: impl Into<String>, function: Arc<dyn RemoteFunction>) -> Self {
        Self {
            name: name.into(),
            backend: Backend::RemoteFunction(function),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> DataSourceKind {
        match self.backend {
            Backend::KeyValueStore(_) => DataSourceKind::KeyValueStore,
            Backend::QueryableIndex(_) => DataSourceKind::QueryableIndex,
            Backend::RemoteFunction(_) => DataSourceKind::RemoteFunction,
        }
    }

    /// Perform the operation described by `request`.
    ///
    /// A missing item on get is `Ok(Value::Null)`, not an error.
    pub async fn call(&self, request: &Value) -> Result<Value, DataSourceError> {
        debug!(data_source = %self.name, kind = %self.kind(), "Calling data source");
        match &self.backend {
            Backend::KeyValueStore(table) => self.key_value_call(table.as_ref(), request),
            Backend::QueryableIndex(table) => self.query_call(table.as_ref(), request),
            Backend::RemoteFunction(function) => {
                let payload = request::decode_invoke(request).map_err(|m| self.terminal(m))?;
                function
                    .invoke(payload)
                    .await
                    .map_err(|e| DataSourceError {
                        data_source: self.name.clone(),
                        kind: e.kind,
                        message: e.message,
                    })
            }
        }
    }

    /// Whether `request` changes backend state when it succeeds. Function
    /// invocations count as writes; an undecodable request writes nothing.
    pub fn is_write(&self, request: &Value) -> bool {
        match &self.backend {
            Backend::KeyValueStore(_) => KeyValueOperation::decode(request)
                .map(|op| op.is_write())
                .unwrap_or(false),
            Backend::QueryableIndex(_) => false,
            Backend::RemoteFunction(_) => true,
        }
    }

    fn terminal(&self, message: impl Into<String>) -> DataSourceError {
        DataSourceError::terminal(self.name.clone(), message)
    }

    fn key_value_call(&self, table: &dyn Table, request: &Value) -> Result<Value, DataSourceError> {
        let schema = table.schema();
        match KeyValueOperation::decode(request).map_err(|m| self.terminal(m))? {
            KeyValueOperation::Get { key } => {
                let key = schema
                    .key_of(&key, true)
                    .map_err(|e| e.into_data_source_error(&self.name))?;
                let item = table
                    .get(&key)
                    .map_err(|e| e.into_data_source_error(&self.name))?;
                Ok(item.as_ref().map(item_to_value).unwrap_or(Value::Null))
            }
            KeyValueOperation::Put { key, attributes } => {
                schema
                    .key_of(&key, false)
                    .map_err(|e| e.into_data_source_error(&self.name))?;
                let mut item = attributes;
                item.extend(key);
                let written = table
                    .put(item)
                    .map_err(|e| e.into_data_source_error(&self.name))?;
                Ok(item_to_value(&written))
            }
        }
    }

    fn query_call(&self, table: &dyn Table, request: &Value) -> Result<Value, DataSourceError> {
        let schema = table.schema();
        let op = QueryOperation::decode(request).map_err(|m| self.terminal(m))?;
        if op.partition_attribute != schema.partition_key {
            return Err(self.terminal(format!(
                "table '{}' is partitioned by '{}', not '{}'",
                schema.name, schema.partition_key, op.partition_attribute
            )));
        }
        let partition = match &op.partition_value {
            AttributeValue::S(s) => s.clone(),
            other => {
                return Err(self.terminal(format!(
                    "partition value must be a string, got {:?}",
                    other
                )))
            }
        };
        let after = op
            .continuation_token
            .as_deref()
            .map(decode_continuation_token)
            .transpose()
            .map_err(|e| e.into_data_source_error(&self.name))?;

        let page = table
            .query(&partition, op.limit, after.as_deref())
            .map_err(|e| e.into_data_source_error(&self.name))?;

        let mut out = Map::new();
        out.insert(
            "items".to_string(),
            Value::List(page.items.iter().map(item_to_value).collect()),
        );
        out.insert(
            "nextContinuationToken".to_string(),
            page.last_sort_key
                .as_deref()
                .map(|sort| Value::String(encode_continuation_token(sort)))
                .unwrap_or(Value::Null),
        );
        Ok(Value::Map(out))
    }
}

/// Data sources by name; fixed once the dispatch table is built.
#[derive(Debug, Default)]
pub struct DataSourceRegistry {
    adapters: HashMap<String, Arc<DataSourceAdapter>>,
}

impl DataSourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: DataSourceAdapter) -> Result<(), DispatchError> {
        if self.adapters.contains_key(adapter.name()) {
            return Err(DispatchError::DuplicateDataSource(adapter.name().to_string()));
        }
        self.adapters
            .insert(adapter.name().to_string(), Arc::new(adapter));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DataSourceAdapter>> {
        self.adapters.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
