//! Persistence layer for backing tables

use crate::error::StorageError;
use crate::store::{Item, PrimaryKey, QueryPage, Table, TableSchema};
use bincode;
use sled;
use std::ops::Bound;
use std::path::Path;

/// One sled database holding any number of tables.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Table backed by its own sled tree, named after the schema.
    pub fn table(&self, schema: TableSchema) -> Result<SledTable, StorageError> {
        let tree = self.db.open_tree(schema.name.as_bytes())?;
        Ok(SledTable { schema, tree })
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

/// Sled-based implementation of Table
///
/// Keys are `len(partition) as u32 BE || partition || sort`, so a partition
/// is a contiguous key range ordered by sort key bytes.
pub struct SledTable {
    schema: TableSchema,
    tree: sled::Tree,
}

impl SledTable {
    fn partition_prefix(partition: &str) -> Vec<u8> {
        let mut prefix = Vec::with_capacity(4 + partition.len());
        prefix.extend_from_slice(&(partition.len() as u32).to_be_bytes());
        prefix.extend_from_slice(partition.as_bytes());
        prefix
    }

    fn encode_key(key: &PrimaryKey) -> Vec<u8> {
        let mut bytes = Self::partition_prefix(&key.partition);
        if let Some(sort) = &key.sort {
            bytes.extend_from_slice(sort.as_bytes());
        }
        bytes
    }

    fn decode_item(bytes: &[u8]) -> Result<Item, StorageError> {
        bincode::deserialize(bytes)
            .map_err(|e| StorageError::Corrupt(format!("Failed to deserialize item: {}", e)))
    }

    fn sort_key_of(&self, key_bytes: &[u8], prefix_len: usize) -> Result<String, StorageError> {
        String::from_utf8(key_bytes[prefix_len..].to_vec())
            .map_err(|_| StorageError::Corrupt(format!("non UTF-8 sort key in '{}'", self.schema.name)))
    }
}

impl Table for SledTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StorageError> {
        match self.tree.get(Self::encode_key(key))? {
            Some(value) => Ok(Some(Self::decode_item(&value)?)),
            None => Ok(None),
        }
    }

    fn put(&self, item: Item) -> Result<Item, StorageError> {
        let key = self.schema.key_of(&item, false)?;
        let value = bincode::serialize(&item)
            .map_err(|e| StorageError::Corrupt(format!("Failed to serialize item: {}", e)))?;
        self.tree.insert(Self::encode_key(&key), value)?;
        Ok(item)
    }

    fn query(
        &self,
        partition: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<QueryPage, StorageError> {
        let prefix = Self::partition_prefix(partition);
        let rows = match after {
            Some(sort) => {
                let mut start = prefix.clone();
                start.extend_from_slice(sort.as_bytes());
                self.tree
                    .range::<Vec<u8>, _>((Bound::Excluded(start), Bound::Unbounded))
            }
            None => self.tree.scan_prefix(&prefix),
        };

        let mut items = Vec::new();
        let mut last_key: Option<Vec<u8>> = None;
        let mut has_more = false;
        for row in rows {
            let (key, value) = row?;
            if !key.starts_with(&prefix) {
                break;
            }
            if items.len() == limit {
                has_more = true;
                break;
            }
            items.push(Self::decode_item(&value)?);
            last_key = Some(key.to_vec());
        }

        let last_sort_key = match (has_more, last_key) {
            (true, Some(key)) => Some(self.sort_key_of(&key, prefix.len())?),
            _ => None,
        };
        Ok(QueryPage {
            items,
            last_sort_key,
        })
    }
}
