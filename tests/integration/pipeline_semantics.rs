//! Pipeline composition semantics over real tables

use super::test_utils::{args, json, CountingTable};
use fieldpipe::datasource::{DataSourceAdapter, DataSourceRegistry};
use fieldpipe::store::{MemoryTable, PrimaryKey, Table, TableSchema};
use fieldpipe::template::TemplateHelpers;
use fieldpipe::{CancellationToken, Pipeline, PipelineExecutor, RequestContext, ResolveError, Step};
use serde_json::json;
use std::sync::Arc;

const PUT_NOTE: &str = r#"
{
  "operation": "PutItem",
  "key": { "id": toEncoded(args.id) },
  "attributeValues": { "body": toEncoded(args.body), "tags": toEncoded(args.tags) }
}
"#;

const GET_NOTE: &str = r#"
{ "operation": "GetItem", "key": { "id": toEncoded(args.id) } }
"#;

fn notes() -> (Arc<MemoryTable>, PipelineExecutor) {
    let table = Arc::new(MemoryTable::new(TableSchema::new("Note", "id")));
    let mut registry = DataSourceRegistry::new();
    registry
        .register(DataSourceAdapter::key_value("Notes", table.clone()))
        .unwrap();
    (
        table,
        PipelineExecutor::new(Arc::new(registry), TemplateHelpers::system()),
    )
}

fn note_args() -> fieldpipe::value::Map {
    args(json!({"id": "n1", "body": "hello", "tags": ["a", "b"]}))
}

#[tokio::test]
async fn test_unit_step_equals_single_step_pipeline() {
    let (_, executor) = notes();
    let put = Step::parse("put", "Notes", PUT_NOTE, "result").unwrap();

    // Bare resolver: request template, backend call, response template.
    let mut bare_ctx = RequestContext::new(note_args(), None);
    let request = put
        .request
        .evaluate_request(&mut bare_ctx, executor.helpers())
        .unwrap();
    let raw = executor
        .data_sources()
        .get("Notes")
        .unwrap()
        .call(&request)
        .await
        .unwrap();
    let bare = put
        .response
        .evaluate_response(&mut bare_ctx, raw, executor.helpers())
        .unwrap();

    let pipeline = Pipeline::new("wrapped", vec![put])
        .with_before("{}")
        .unwrap()
        .with_after("result")
        .unwrap();
    let mut ctx = RequestContext::new(note_args(), None);
    let wrapped = executor
        .execute(&pipeline, &mut ctx, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(wrapped, bare);
    assert_eq!(
        json(&wrapped),
        json!({"id": "n1", "body": "hello", "tags": ["a", "b"]})
    );
}

#[tokio::test]
async fn test_get_after_put_reads_the_write() {
    let (_, executor) = notes();
    let pipeline = Pipeline::new(
        "putThenGet",
        vec![
            Step::parse("put", "Notes", PUT_NOTE, "set stash.written = result\nresult").unwrap(),
            Step::parse("get", "Notes", GET_NOTE, "result").unwrap(),
        ],
    )
    .with_after(r#"{ "written": stash.written, "read": result }"#)
    .unwrap();

    let mut ctx = RequestContext::new(note_args(), None);
    let out = json(
        &executor
            .execute(&pipeline, &mut ctx, &CancellationToken::new())
            .await
            .unwrap(),
    );
    assert_eq!(out["read"], out["written"]);
    assert_eq!(out["read"]["tags"], json!(["a", "b"]));
}

#[tokio::test]
async fn test_later_failure_leaves_earlier_write_in_place() {
    let (table, executor) = notes();
    let pipeline = Pipeline::new(
        "putThenReject",
        vec![
            Step::parse("put", "Notes", PUT_NOTE, "result").unwrap(),
            Step::parse(
                "reject",
                "Notes",
                GET_NOTE,
                r#"if isNull(result) { {} } else { raiseError("already exists") }"#,
            )
            .unwrap(),
        ],
    );

    let mut ctx = RequestContext::new(note_args(), None);
    let err = executor
        .execute(&pipeline, &mut ctx, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::validation("already exists"));

    let key = PrimaryKey {
        partition: "n1".to_string(),
        sort: None,
    };
    assert!(table.get(&key).unwrap().is_some());
}

#[tokio::test]
async fn test_outer_templates_shape_the_final_value_from_the_stash() {
    let (_, executor) = notes();
    let pipeline = Pipeline::new(
        "shaped",
        vec![Step::parse("put", "Notes", PUT_NOTE, "result").unwrap()],
    )
    .with_before("set stash.requestedBy = defaultIfBlank(args.user, \"anonymous\")\n{}")
    .unwrap()
    .with_after(r#"{ "note": result.id, "by": stash.requestedBy }"#)
    .unwrap();

    let mut ctx = RequestContext::new(note_args(), None);
    let out = executor
        .execute(&pipeline, &mut ctx, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(json(&out), json!({"note": "n1", "by": "anonymous"}));
}

#[tokio::test]
async fn test_after_template_raise_fails_after_every_step_ran() {
    let table = Arc::new(CountingTable::new(MemoryTable::new(TableSchema::new(
        "Note", "id",
    ))));
    let mut registry = DataSourceRegistry::new();
    registry
        .register(DataSourceAdapter::key_value("Notes", table.clone()))
        .unwrap();
    let executor = PipelineExecutor::new(Arc::new(registry), TemplateHelpers::system());

    let pipeline = Pipeline::unit(Step::parse("get", "Notes", GET_NOTE, "result").unwrap())
        .with_after("if isNull(result) { raiseError(\"x\") }\nresult")
        .unwrap();

    let mut ctx = RequestContext::new(args(json!({"id": "absent"})), None);
    let err = executor
        .execute(&pipeline, &mut ctx, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::validation("x"));
    assert_eq!(err.to_string(), "x");
    assert_eq!(table.gets(), 1);
    assert_eq!(table.puts(), 0);
}
