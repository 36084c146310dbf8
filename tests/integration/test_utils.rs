//! Shared fixtures: a blog resolver over counting tables and a counting
//! moderator, with predictable identifiers and timestamps.

use chrono::{Duration, TimeZone, Utc};
use fieldpipe::blog::{self, comment_schema, BlogTables};
use fieldpipe::datasource::{BannedTermsModerator, ContentModerator};
use fieldpipe::error::StorageError;
use fieldpipe::store::{Item, MemoryTable, PrimaryKey, QueryPage, Table, TableSchema};
use fieldpipe::template::{ManualClock, SequenceIdGenerator, TemplateHelpers};
use fieldpipe::value::{Map, Value};
use fieldpipe::Resolver;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Table wrapper that counts each operation.
pub struct CountingTable<T: Table> {
    inner: T,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub queries: AtomicUsize,
}

impl<T: Table> CountingTable<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

impl<T: Table> Table for CountingTable<T> {
    fn schema(&self) -> &TableSchema {
        self.inner.schema()
    }

    fn get(&self, key: &PrimaryKey) -> Result<Option<Item>, StorageError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn put(&self, item: Item) -> Result<Item, StorageError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(item)
    }

    fn query(
        &self,
        partition: &str,
        limit: usize,
        after: Option<&str>,
    ) -> Result<QueryPage, StorageError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(partition, limit, after)
    }
}

/// Moderator that counts invocations.
#[derive(Default)]
pub struct CountingModerator {
    inner: BannedTermsModerator,
    calls: AtomicUsize,
}

impl CountingModerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ContentModerator for CountingModerator {
    fn is_flagged(&self, content: &str) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.is_flagged(content)
    }
}

pub struct BlogFixture {
    pub resolver: Resolver,
    pub articles: Arc<CountingTable<MemoryTable>>,
    pub comments: Arc<CountingTable<MemoryTable>>,
    pub moderator: Arc<CountingModerator>,
    pub ids: Arc<SequenceIdGenerator>,
    pub clock: Arc<ManualClock>,
}

/// In-memory blog API; ids are `id-1, id-2, ...`, timestamps start at
/// 2024-05-01T10:00:00.000Z and advance one millisecond per call.
pub fn blog_fixture() -> BlogFixture {
    let articles = Arc::new(CountingTable::new(MemoryTable::new(blog::article_schema())));
    let comments = Arc::new(CountingTable::new(MemoryTable::new(comment_schema())));
    let moderator = Arc::new(CountingModerator::default());
    let ids = Arc::new(SequenceIdGenerator::new("id"));
    let clock = Arc::new(ManualClock::stepping(
        Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
        Duration::milliseconds(1),
    ));
    let tables = BlogTables {
        articles: articles.clone(),
        comments: comments.clone(),
    };
    let resolver = blog::resolver(
        &tables,
        moderator.clone(),
        TemplateHelpers::new(ids.clone(), clock.clone()),
    )
    .unwrap();
    BlogFixture {
        resolver,
        articles,
        comments,
        moderator,
        ids,
        clock,
    }
}

/// Build an argument map from a JSON object literal.
pub fn args(json: serde_json::Value) -> Map {
    match Value::from(json) {
        Value::Map(map) => map,
        other => panic!("arguments must be an object, got {}", other),
    }
}

pub fn json(value: &Value) -> serde_json::Value {
    serde_json::Value::from(value.clone())
}

impl BlogFixture {
    pub async fn create_article(&self, title: &str) -> serde_json::Value {
        let value = self
            .resolver
            .resolve(
                "Mutation",
                "createArticle",
                args(serde_json::json!({"title": title, "content": "body"})),
                None,
            )
            .await
            .unwrap();
        json(&value)
    }

    pub async fn create_comment(&self, article_id: &str, content: &str) -> Result<Value, fieldpipe::ResolveError> {
        self.resolver
            .resolve(
                "Mutation",
                "createComment",
                args(serde_json::json!({"articleId": article_id, "content": content})),
                None,
            )
            .await
    }

    pub async fn comments_page(
        &self,
        article_id: &str,
        page_args: serde_json::Value,
    ) -> Result<Value, fieldpipe::ResolveError> {
        self.resolver
            .resolve(
                "Article",
                "comments",
                args(page_args),
                Some(Value::from(serde_json::json!({"id": article_id}))),
            )
            .await
    }
}
