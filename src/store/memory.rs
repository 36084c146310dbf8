//! In-memory table

use crate::error::StorageError;
use crate::store::{Item, PrimaryKey, QueryPage, Table, TableSchema};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Table held in process memory. Items are grouped by partition and ordered
/// by sort key (the empty string for tables without one).
pub struct MemoryTable {
    schema: TableSchema,
    partitions: RwLock<BTreeMap<String, BTreeMap<String, Item>>>,
}

impl MemoryTable {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            partitions: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.partitions.read().values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Table for MemoryTable {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StorageError> {
        let sort = key.sort.clone().unwrap_or_default();
        Ok(self
            .partitions
            .read()
            .get(&key.partition)
            .and_then(|partition| partition.get(&sort))
            .cloned())
    }

    fn put(&self, item: Item) -> Result<Item, StorageError> {
        let key = self.schema.key_of(&item, false)?;
        self.partitions
            .write()
            .entry(key.partition)
            .or_default()
            .insert(key.sort.unwrap_or_default(), item.clone());
        Ok(item)
    }

    fn query(
        &self,
        partition: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<QueryPage, StorageError> {
        let partitions = self.partitions.read();
        let Some(rows) = partitions.get(partition) else {
            return Ok(QueryPage {
                items: Vec::new(),
                last_sort_key: None,
            });
        };

        let lower = match after {
            Some(sort) => Bound::Excluded(sort.to_string()),
            None => Bound::Unbounded,
        };
        let mut range = rows.range((lower, Bound::Unbounded));
        let mut items = Vec::new();
        let mut last_sort_key = None;
        for (sort, item) in range.by_ref().take(limit) {
            items.push(item.clone());
            last_sort_key = Some(sort.clone());
        }
        let has_more = range.next().is_some();

        Ok(QueryPage {
            items,
            last_sort_key: if has_more { last_sort_key } else { None },
        })
    }
}
