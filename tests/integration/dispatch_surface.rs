//! Field invocation surface: wire shapes, unbound fields, sibling concurrency

use super::test_utils::blog_fixture;
use fieldpipe::{FieldInvocation, FieldResponse};
use serde_json::json;
use std::collections::HashSet;

#[tokio::test]
async fn test_invocation_round_trips_through_wire_shapes() {
    let fixture = blog_fixture();
    let invocation: FieldInvocation = serde_json::from_value(json!({
        "typeName": "Mutation",
        "fieldName": "createArticle",
        "arguments": {"title": "T", "content": "C"}
    }))
    .unwrap();

    let response = fixture.resolver.invoke(invocation).await;
    let wire = serde_json::to_value(&response).unwrap();
    assert_eq!(wire["value"]["title"], "T");
    assert!(wire.get("error").is_none());
}

#[tokio::test]
async fn test_unbound_field_yields_error_not_null() {
    let fixture = blog_fixture();
    let response = fixture
        .resolver
        .invoke(FieldInvocation::new("Query", "articles", Default::default()))
        .await;
    match response {
        FieldResponse::Error { error } => {
            assert_eq!(error.message, "Query.articles is not a field of the schema")
        }
        FieldResponse::Value { value } => panic!("expected an error, got {}", value),
    }
}

#[tokio::test]
async fn test_sibling_invocations_run_with_independent_contexts() {
    let fixture = blog_fixture();
    let invocations: Vec<FieldInvocation> = (0..8)
        .map(|n| {
            serde_json::from_value(json!({
                "typeName": "Mutation",
                "fieldName": "createArticle",
                "arguments": {"title": format!("t{}", n), "content": "c"}
            }))
            .unwrap()
        })
        .collect();

    let responses = fixture.resolver.invoke_all(invocations).await;
    assert_eq!(responses.len(), 8);

    let mut ids = HashSet::new();
    for (n, response) in responses.iter().enumerate() {
        let wire = serde_json::to_value(response).unwrap();
        assert_eq!(wire["value"]["title"], format!("t{}", n));
        ids.insert(wire["value"]["id"].as_str().unwrap().to_string());
    }
    assert_eq!(ids.len(), 8);
    assert_eq!(fixture.articles.puts(), 8);
}

#[tokio::test]
async fn test_failed_sibling_does_not_affect_others() {
    let fixture = blog_fixture();
    let responses = fixture
        .resolver
        .invoke_all(vec![
            serde_json::from_value(json!({
                "typeName": "Mutation",
                "fieldName": "createComment",
                "arguments": {"articleId": "missing", "content": "x"}
            }))
            .unwrap(),
            serde_json::from_value(json!({
                "typeName": "Mutation",
                "fieldName": "createArticle",
                "arguments": {"title": "T", "content": "C"}
            }))
            .unwrap(),
        ])
        .await;

    assert_eq!(
        serde_json::to_value(&responses[0]).unwrap(),
        json!({"error": {"message": "Article ID is not valid!"}})
    );
    assert!(matches!(responses[1], FieldResponse::Value { .. }));
}
