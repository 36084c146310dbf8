//! Article/comment API bindings
//!
//! The fixed declarative binding table: two tables, four data sources and
//! four resolved fields.
//!
//! | Field                    | Pipeline                                         |
//! |--------------------------|--------------------------------------------------|
//! | `Mutation.createArticle` | put article with fresh `id` and `createdAt`      |
//! | `Query.article`          | get article by `id`                              |
//! | `Article.comments`       | paginated query of the article's comments        |
//! | `Mutation.createComment` | verify article → moderate content → put comment  |

use crate::datasource::{ContentModerator, DataSourceAdapter, DataSourceRegistry, ModerationFunction};
use crate::dispatch::{DispatchTable, DispatchTableBuilder, Resolver, SchemaCatalog};
use crate::error::{ApiError, StorageError};
use crate::pipeline::{Pipeline, PipelineExecutor, Step};
use crate::store::{MemoryTable, SledStore, Table, TableSchema};
use crate::template::TemplateHelpers;
use std::sync::Arc;

pub const ARTICLE_DATA_SOURCE: &str = "ArticleDataSource";
pub const COMMENT_DATA_SOURCE: &str = "CommentDataSource";
pub const COMMENT_INDEX: &str = "CommentIndex";
pub const MODERATION_FUNCTION: &str = "ModerationFunction";

pub const ARTICLE_NOT_FOUND: &str = "Article ID is not valid!";
pub const CONTENT_FLAGGED: &str = "Content includes bad emojis :(";

pub fn article_schema() -> TableSchema {
    TableSchema::new("Article", "id")
}

pub fn comment_schema() -> TableSchema {
    TableSchema::new("Comment", "articleId").with_sort_key("createdAt")
}

pub fn schema_catalog() -> SchemaCatalog {
    SchemaCatalog::new()
        .with_field("Mutation", "createArticle")
        .with_field("Mutation", "createComment")
        .with_field("Query", "article")
        .with_field("Article", "comments")
}

const CREATE_ARTICLE_REQUEST: &str = r#"
{
  "version": "2017-02-28",
  "operation": "PutItem",
  "key": {
    "id": toEncoded(freshId()),
    "createdAt": toEncoded(nowTimestamp())
  },
  "attributeValues": toEncodedMap(args)
}
"#;

const GET_ARTICLE_REQUEST: &str = r#"
{
  "version": "2017-02-28",
  "operation": "GetItem",
  "key": { "id": toEncoded(args.id) }
}
"#;

const QUERY_COMMENTS_REQUEST: &str = r#"
{
  "version": "2017-02-28",
  "operation": "Query",
  "query": {
    "expression": "articleId = :articleId",
    "expressionValues": { ":articleId": toEncoded(source.id) }
  },
  "limit": defaultIfNull(args.limit, 20),
  "continuationToken": defaultIfBlank(args.continuationToken, null)
}
"#;

const QUERY_COMMENTS_RESPONSE: &str = r#"
{
  "nodes": result.items,
  "nextContinuationToken": defaultIfBlank(result.nextContinuationToken, null)
}
"#;

const CREATE_COMMENT_BEFORE: &str = r#"
set stash.articleId = args.articleId
set stash.content = args.content
{}
"#;

const VERIFY_ARTICLE_REQUEST: &str = r#"
{
  "operation": "GetItem",
  "key": { "id": toEncoded(stash.articleId) }
}
"#;

const VERIFY_ARTICLE_RESPONSE: &str = r#"
if isNull(result) {
  raiseError("Article ID is not valid!")
}
{}
"#;

const MODERATE_CONTENT_REQUEST: &str = r#"
{
  "operation": "Invoke",
  "payload": { "content": stash.content }
}
"#;

const MODERATE_CONTENT_RESPONSE: &str = r#"
if result.flagged {
  raiseError("Content includes bad emojis :(")
}
{}
"#;

const STORE_COMMENT_REQUEST: &str = r#"
{
  "version": "2017-02-28",
  "operation": "PutItem",
  "key": {
    "articleId": toEncoded(stash.articleId),
    "createdAt": toEncoded(nowTimestamp())
  },
  "attributeValues": {
    "id": toEncoded(freshId()),
    "content": toEncoded(stash.content)
  }
}
"#;

/// Backing tables of the API.
#[derive(Clone)]
pub struct BlogTables {
    pub articles: Arc<dyn Table>,
    pub comments: Arc<dyn Table>,
}

impl BlogTables {
    pub fn in_memory() -> Self {
        Self {
            articles: Arc::new(MemoryTable::new(article_schema())),
            comments: Arc::new(MemoryTable::new(comment_schema())),
        }
    }

    pub fn sled(store: &SledStore) -> Result<Self, StorageError> {
        Ok(Self {
            articles: Arc::new(store.table(article_schema())?),
            comments: Arc::new(store.table(comment_schema())?),
        })
    }
}

pub fn data_sources(
    tables: &BlogTables,
    moderator: Arc<dyn ContentModerator>,
) -> Result<DataSourceRegistry, ApiError> {
    let mut registry = DataSourceRegistry::new();
    registry.register(DataSourceAdapter::key_value(
        ARTICLE_DATA_SOURCE,
        tables.articles.clone(),
    ))?;
    registry.register(DataSourceAdapter::key_value(
        COMMENT_DATA_SOURCE,
        tables.comments.clone(),
    ))?;
    registry.register(DataSourceAdapter::queryable_index(
        COMMENT_INDEX,
        tables.comments.clone(),
    ))?;
    registry.register(DataSourceAdapter::remote_function(
        MODERATION_FUNCTION,
        Arc::new(ModerationFunction::new(MODERATION_FUNCTION, moderator)),
    ))?;
    Ok(registry)
}

pub fn create_article_pipeline() -> Result<Pipeline, ApiError> {
    Ok(Pipeline::unit(Step::parse(
        "storeArticle",
        ARTICLE_DATA_SOURCE,
        CREATE_ARTICLE_REQUEST,
        "result",
    )?))
}

pub fn article_pipeline() -> Result<Pipeline, ApiError> {
    Ok(Pipeline::unit(Step::parse(
        "getArticle",
        ARTICLE_DATA_SOURCE,
        GET_ARTICLE_REQUEST,
        "result",
    )?))
}

pub fn comments_pipeline() -> Result<Pipeline, ApiError> {
    Ok(Pipeline::unit(Step::parse(
        "queryComments",
        COMMENT_INDEX,
        QUERY_COMMENTS_REQUEST,
        QUERY_COMMENTS_RESPONSE,
    )?))
}

pub fn create_comment_pipeline() -> Result<Pipeline, ApiError> {
    let steps = vec![
        Step::parse(
            "verifyArticleId",
            ARTICLE_DATA_SOURCE,
            VERIFY_ARTICLE_REQUEST,
            VERIFY_ARTICLE_RESPONSE,
        )?,
        Step::parse(
            "moderateContent",
            MODERATION_FUNCTION,
            MODERATE_CONTENT_REQUEST,
            MODERATE_CONTENT_RESPONSE,
        )?,
        Step::parse(
            "storeComment",
            COMMENT_DATA_SOURCE,
            STORE_COMMENT_REQUEST,
            "result",
        )?,
    ];
    Ok(Pipeline::new("createComment", steps).with_before(CREATE_COMMENT_BEFORE)?)
}

pub fn dispatch_table(data_sources: &DataSourceRegistry) -> Result<DispatchTable, ApiError> {
    let mut builder = DispatchTableBuilder::new(schema_catalog(), data_sources);
    builder
        .bind("Mutation", "createArticle", create_article_pipeline()?)?
        .bind("Query", "article", article_pipeline()?)?
        .bind("Article", "comments", comments_pipeline()?)?
        .bind("Mutation", "createComment", create_comment_pipeline()?)?;
    Ok(builder.build())
}

/// Fully wired resolver over `tables`.
pub fn resolver(
    tables: &BlogTables,
    moderator: Arc<dyn ContentModerator>,
    helpers: TemplateHelpers,
) -> Result<Resolver, ApiError> {
    let registry = data_sources(tables, moderator)?;
    let table = dispatch_table(&registry)?;
    Ok(Resolver::new(
        Arc::new(table),
        PipelineExecutor::new(Arc::new(registry), helpers),
    ))
}
