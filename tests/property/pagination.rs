//! Paging over a queryable index visits every item exactly once

use fieldpipe::datasource::DataSourceAdapter;
use fieldpipe::store::{MemoryTable, Table, TableSchema};
use fieldpipe::value::Value;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

fn sort_key(n: usize) -> String {
    format!("k{:04}", n)
}

fn query(partition: &str, limit: usize, token: &serde_json::Value) -> Value {
    Value::from(json!({
        "operation": "Query",
        "query": {
            "expression": "p = :p",
            "expressionValues": { ":p": { "S": partition } }
        },
        "limit": limit,
        "continuationToken": token,
    }))
}

/// Write `count` items to partition "a" (reverse order) and a decoy to "b",
/// then page through "a".
fn collect_pages(count: usize, limit: usize) -> (Vec<String>, usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    runtime.block_on(async {
        let table: Arc<dyn Table> =
            Arc::new(MemoryTable::new(TableSchema::new("Items", "p").with_sort_key("s")));
        let writer = DataSourceAdapter::key_value("Items", table.clone());
        let index = DataSourceAdapter::queryable_index("ItemsIndex", table);

        for (partition, n) in (0..count).rev().map(|n| ("a", n)).chain([("b", 0)]) {
            writer
                .call(&Value::from(json!({
                    "operation": "PutItem",
                    "key": { "p": { "S": partition }, "s": { "S": sort_key(n) } }
                })))
                .await
                .unwrap();
        }

        let mut seen = Vec::new();
        let mut pages = 0;
        let mut token = serde_json::Value::Null;
        loop {
            let page = serde_json::Value::from(index.call(&query("a", limit, &token)).await.unwrap());
            pages += 1;
            let items = page["items"].as_array().unwrap();
            assert!(items.len() <= limit);
            for item in items {
                assert_eq!(item["p"], "a");
                seen.push(item["s"].as_str().unwrap().to_string());
            }
            token = page["nextContinuationToken"].clone();
            if token.is_null() {
                break;
            }
            assert!(!items.is_empty(), "a token was issued for an empty page");
        }
        (seen, pages)
    })
}

#[test]
fn test_pages_cover_partition_without_duplicates_or_gaps() {
    let mut runner = proptest::test_runner::TestRunner::new(ProptestConfig::with_cases(64));

    runner
        .run(&(0usize..40, 1usize..10), |(count, limit)| {
            let (seen, pages) = collect_pages(count, limit);

            let expected: Vec<String> = (0..count).map(sort_key).collect();
            prop_assert_eq!(seen, expected);

            prop_assert_eq!(pages, count.div_ceil(limit).max(1));

            Ok(())
        })
        .unwrap();
}
