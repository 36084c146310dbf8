//! Backing tables
//!
//! Keyed item storage behind the key-value and queryable-index data sources.
//! A table has a string partition key and an optional string sort key; a
//! query returns one partition in ascending sort-key order.

pub mod attribute;
pub mod memory;
pub mod persistence;

pub use attribute::AttributeValue;
pub use memory::MemoryTable;
pub use persistence::{SledStore, SledTable};

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A stored item: attribute name to typed value.
pub type Item = BTreeMap<String, AttributeValue>;

/// Table layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: String,
    pub sort_key: Option<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, partition_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: partition_key.into(),
            sort_key: None,
        }
    }

    pub fn with_sort_key(mut self, sort_key: impl Into<String>) -> Self {
        self.sort_key = Some(sort_key.into());
        self
    }

    /// Extract the primary key of an item (or of a key-only map).
    ///
    /// Key attributes must be strings; a key map carrying attributes outside
    /// the schema is rejected when `exact` is set.
    pub fn key_of(&self, item: &Item, exact: bool) -> Result<PrimaryKey, StorageError> {
        let partition = self.string_attribute(item, &self.partition_key)?;
        let sort = match &self.sort_key {
            Some(name) => Some(self.string_attribute(item, name)?),
            None => None,
        };
        if exact {
            let expected = 1 + usize::from(self.sort_key.is_some());
            if item.len() != expected {
                return Err(StorageError::InvalidKey(format!(
                    "key for table '{}' must contain exactly {:?}{}",
                    self.name,
                    self.partition_key,
                    self.sort_key
                        .as_ref()
                        .map(|s| format!(" and {:?}", s))
                        .unwrap_or_default()
                )));
            }
        }
        Ok(PrimaryKey { partition, sort })
    }

    fn string_attribute(&self, item: &Item, name: &str) -> Result<String, StorageError> {
        match item.get(name) {
            Some(AttributeValue::S(s)) if !s.is_empty() => Ok(s.clone()),
            Some(AttributeValue::S(_)) => Err(StorageError::InvalidKey(format!(
                "key attribute '{}' of table '{}' is empty",
                name, self.name
            ))),
            Some(_) => Err(StorageError::InvalidKey(format!(
                "key attribute '{}' of table '{}' must be a string",
                name, self.name
            ))),
            None => Err(StorageError::InvalidKey(format!(
                "missing key attribute '{}' for table '{}'",
                name, self.name
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PrimaryKey {
    pub partition: String,
    pub sort: Option<String>,
}

/// One page of a partition query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Sort key of the last returned item, present only if more items follow.
    pub last_sort_key: Option<String>,
}

/// Keyed item storage.
///
/// `put` is an unconditional full overwrite; concurrent writers to the same
/// key race and the last one wins.
pub trait Table: Send + Sync {
    fn schema(&self) -> &TableSchema;

    fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StorageError>;

    /// Store `item` and return it as written.
    fn put(&self, item: Item) -> Result<Item, StorageError>;

    /// Up to `limit` items of `partition` whose sort key is strictly greater
    /// than `after`.
    fn query(
        &self,
        partition: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<QueryPage, StorageError>;
}

/// Opaque resumption cursor handed to callers.
pub fn encode_continuation_token(last_sort_key: &str) -> String {
    hex::encode(last_sort_key.as_bytes())
}

pub fn decode_continuation_token(token: &str) -> Result<String, StorageError> {
    let bytes = hex::decode(token)
        .map_err(|_| StorageError::InvalidKey(format!("malformed continuation token '{}'", token)))?;
    String::from_utf8(bytes)
        .map_err(|_| StorageError::InvalidKey(format!("malformed continuation token '{}'", token)))
}
