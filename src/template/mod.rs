//! Mapping templates
//!
//! A template turns the request context into a backend request, or a backend
//! result into the step's output (or an abort). Source text is parsed once,
//! when bindings are loaded, into a small expression tree that is interpreted
//! per invocation.
//!
//! ```text
//! set stash.articleId = args.articleId
//! {
//!   "operation": "GetItem",
//!   "key": { "id": toEncoded(stash.articleId) }
//! }
//! ```
//!
//! Response templates may additionally read `result`, branch with
//! `if <cond> { ... } else { ... }` and abort with `raiseError("message")`.

pub mod ast;
mod eval;
pub mod helpers;
mod lexer;
mod parser;

pub use helpers::{
    Clock, IdGenerator, ManualClock, SequenceIdGenerator, SystemClock, TemplateHelpers,
    UuidGenerator,
};

use crate::context::RequestContext;
use crate::error::{ResolveError, TemplateError};
use crate::template::ast::{Expr, Item, PathRef, Root};
use crate::value::Value;
use eval::Evaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Context to backend request; may assign stash entries.
    Request,
    /// Backend result to value; may also read `result`, branch and raise.
    Response,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    kind: TemplateKind,
    items: Vec<Item>,
}

impl Template {
    pub fn parse(kind: TemplateKind, text: &str) -> Result<Self, TemplateError> {
        Ok(Self {
            kind,
            items: parser::parse(text, kind)?,
        })
    }

    /// Request template that does nothing and yields null.
    pub fn empty_request() -> Self {
        Self {
            kind: TemplateKind::Request,
            items: Vec::new(),
        }
    }

    /// Response template yielding `result` unchanged.
    pub fn passthrough() -> Self {
        Self {
            kind: TemplateKind::Response,
            items: vec![Item::Expr(Expr::Path(PathRef {
                root: Root::Result,
                segments: Vec::new(),
            }))],
        }
    }

    pub fn kind(&self) -> TemplateKind {
        self.kind
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Evaluate against the context, producing the backend request.
    pub fn evaluate_request(
        &self,
        ctx: &mut RequestContext,
        helpers: &TemplateHelpers,
    ) -> Result<Value, ResolveError> {
        Evaluator::new(ctx, helpers).run(&self.items)
    }

    /// Evaluate against `backend_result`. On success the context's result
    /// becomes the template output.
    pub fn evaluate_response(
        &self,
        ctx: &mut RequestContext,
        backend_result: Value,
        helpers: &TemplateHelpers,
    ) -> Result<Value, ResolveError> {
        ctx.set_result(backend_result);
        let output = Evaluator::new(ctx, helpers).run(&self.items)?;
        ctx.set_result(output.clone());
        Ok(output)
    }
}
