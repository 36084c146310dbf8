//! Paginated comment queries

use super::test_utils::{blog_fixture, json};
use fieldpipe::error::{DataSourceError, FaultKind};
use fieldpipe::ResolveError;
use serde_json::json;

#[tokio::test]
async fn test_limit_one_over_three_comments() {
    let fixture = blog_fixture();
    let article = fixture.create_article("T").await;
    let article_id = article["id"].as_str().unwrap();
    for content in ["first", "second", "third"] {
        fixture.create_comment(article_id, content).await.unwrap();
    }

    let first = json(&fixture.comments_page(article_id, json!({"limit": 1})).await.unwrap());
    let nodes = first["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0]["content"], "first");
    let token = first["nextContinuationToken"].as_str().unwrap().to_string();

    let rest = json(
        &fixture
            .comments_page(article_id, json!({"continuationToken": token}))
            .await
            .unwrap(),
    );
    let contents: Vec<&str> = rest["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["second", "third"]);
    assert!(rest["nextContinuationToken"].is_null());
}

#[tokio::test]
async fn test_default_limit_is_twenty() {
    let fixture = blog_fixture();
    let article = fixture.create_article("T").await;
    let article_id = article["id"].as_str().unwrap();
    for n in 0..25 {
        fixture
            .create_comment(article_id, &format!("comment {}", n))
            .await
            .unwrap();
    }

    let page = json(&fixture.comments_page(article_id, json!({})).await.unwrap());
    assert_eq!(page["nodes"].as_array().unwrap().len(), 20);
    assert!(page["nextContinuationToken"].is_string());
}

#[tokio::test]
async fn test_blank_token_starts_from_the_beginning() {
    let fixture = blog_fixture();
    let article = fixture.create_article("T").await;
    let article_id = article["id"].as_str().unwrap();
    fixture.create_comment(article_id, "only").await.unwrap();

    let page = json(
        &fixture
            .comments_page(article_id, json!({"continuationToken": "  "}))
            .await
            .unwrap(),
    );
    assert_eq!(page["nodes"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_comments_of_other_articles_are_not_returned() {
    let fixture = blog_fixture();
    let first = fixture.create_article("A").await;
    let second = fixture.create_article("B").await;
    fixture
        .create_comment(first["id"].as_str().unwrap(), "on A")
        .await
        .unwrap();

    let page = json(
        &fixture
            .comments_page(second["id"].as_str().unwrap(), json!({}))
            .await
            .unwrap(),
    );
    assert_eq!(page, json!({"nodes": [], "nextContinuationToken": null}));
}

#[tokio::test]
async fn test_bad_limit_and_token_are_terminal_faults() {
    let fixture = blog_fixture();
    for page_args in [json!({"limit": 0}), json!({"continuationToken": "zz"})] {
        let err = fixture.comments_page("a1", page_args).await.unwrap_err();
        match err {
            ResolveError::DataSource(DataSourceError { kind, data_source, .. }) => {
                assert_eq!(kind, FaultKind::Terminal);
                assert_eq!(data_source, "CommentIndex");
            }
            other => panic!("expected a data source fault, got {:?}", other),
        }
    }
}
