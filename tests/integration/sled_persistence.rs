//! Blog API over sled-backed tables

use super::test_utils::{args, json};
use chrono::{Duration, TimeZone, Utc};
use fieldpipe::blog::{self, BlogTables};
use fieldpipe::datasource::BannedTermsModerator;
use fieldpipe::store::SledStore;
use fieldpipe::template::{ManualClock, SequenceIdGenerator, TemplateHelpers};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn resolver(store: &SledStore, id_prefix: &str) -> fieldpipe::Resolver {
    let tables = BlogTables::sled(store).unwrap();
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
    let helpers = TemplateHelpers::new(
        Arc::new(SequenceIdGenerator::new(id_prefix)),
        Arc::new(ManualClock::stepping(start, Duration::milliseconds(1))),
    );
    blog::resolver(&tables, Arc::new(BannedTermsModerator::default()), helpers).unwrap()
}

#[tokio::test]
async fn test_articles_and_comments_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();

    let article_id = {
        let store = SledStore::open(temp_dir.path()).unwrap();
        let resolver = resolver(&store, "first");
        let article = resolver
            .resolve(
                "Mutation",
                "createArticle",
                args(json!({"title": "Persisted", "content": "C"})),
                None,
            )
            .await
            .unwrap();
        let article_id = json(&article)["id"].as_str().unwrap().to_string();
        resolver
            .resolve(
                "Mutation",
                "createComment",
                args(json!({"articleId": article_id, "content": "kept"})),
                None,
            )
            .await
            .unwrap();
        store.flush().unwrap();
        article_id
    };

    let store = SledStore::open(temp_dir.path()).unwrap();
    let resolver = resolver(&store, "second");
    let article = resolver
        .resolve("Query", "article", args(json!({"id": article_id})), None)
        .await
        .unwrap();
    assert_eq!(json(&article)["title"], "Persisted");

    let page = resolver
        .resolve(
            "Article",
            "comments",
            args(json!({})),
            Some(article),
        )
        .await
        .unwrap();
    let page = json(&page);
    assert_eq!(page["nodes"].as_array().unwrap().len(), 1);
    assert_eq!(page["nodes"][0]["content"], "kept");
}

#[tokio::test]
async fn test_sled_pagination_tokens_resume_across_pages() {
    let temp_dir = TempDir::new().unwrap();
    let store = SledStore::open(temp_dir.path()).unwrap();
    let resolver = resolver(&store, "id");
    let article = resolver
        .resolve(
            "Mutation",
            "createArticle",
            args(json!({"title": "T", "content": "C"})),
            None,
        )
        .await
        .unwrap();
    let article_id = json(&article)["id"].as_str().unwrap().to_string();
    for n in 0..5 {
        resolver
            .resolve(
                "Mutation",
                "createComment",
                args(json!({"articleId": article_id, "content": format!("c{}", n)})),
                None,
            )
            .await
            .unwrap();
    }

    let mut seen = Vec::new();
    let mut token = serde_json::Value::Null;
    loop {
        let page = resolver
            .resolve(
                "Article",
                "comments",
                args(json!({"limit": 2, "continuationToken": token})),
                Some(article.clone()),
            )
            .await
            .unwrap();
        let page = json(&page);
        for node in page["nodes"].as_array().unwrap() {
            seen.push(node["content"].as_str().unwrap().to_string());
        }
        token = page["nextContinuationToken"].clone();
        if token.is_null() {
            break;
        }
    }
    assert_eq!(seen, vec!["c0", "c1", "c2", "c3", "c4"]);
}
