//! Per-invocation request context
//!
//! One `RequestContext` is created for each field invocation and dropped when
//! the invocation completes. Arguments and source are fixed at construction;
//! the stash and the current result are the only mutable parts.

use crate::value::{Map, Value};

/// Mutable scratch map threaded across the steps of one pipeline run.
///
/// Keys may be overwritten by any later template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stash {
    entries: Map,
}

impl Stash {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Store a value, returning the one it replaced.
    pub fn put(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn entries(&self) -> &Map {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    arguments: Map,
    source: Option<Value>,
    stash: Stash,
    result: Value,
}

impl RequestContext {
    pub fn new(arguments: Map, source: Option<Value>) -> Self {
        Self {
            arguments,
            source,
            stash: Stash::new(),
            result: Value::Null,
        }
    }

    /// Caller-supplied arguments; read-only for the whole invocation.
    pub fn arguments(&self) -> &Map {
        &self.arguments
    }

    /// Parent object of the field, if the field is nested.
    pub fn source(&self) -> Option<&Value> {
        self.source.as_ref()
    }

    pub fn stash(&self) -> &Stash {
        &self.stash
    }

    pub fn stash_mut(&mut self) -> &mut Stash {
        &mut self.stash
    }

    /// Latest result: the raw backend result while a response template runs,
    /// that template's output afterwards.
    pub fn result(&self) -> &Value {
        &self.result
    }

    pub(crate) fn set_result(&mut self, result: Value) {
        self.result = result;
    }
}
