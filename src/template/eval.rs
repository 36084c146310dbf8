//! Template interpreter
//!
//! Walks a parsed template against a request context. The only effects are
//! stash assignments (applied to the context immediately) and the
//! generator/clock calls behind `freshId()` and `nowTimestamp()`.

use crate::context::RequestContext;
use crate::error::{ResolveError, TemplateError};
use crate::store::AttributeValue;
use crate::template::ast::{Block, Expr, Helper, Item, PathRef, Root};
use crate::template::helpers::TemplateHelpers;
use crate::value::{Map, Value};

static NULL: Value = Value::Null;

pub(crate) struct Evaluator<'a> {
    ctx: &'a mut RequestContext,
    helpers: &'a TemplateHelpers,
}

impl<'a> Evaluator<'a> {
    pub(crate) fn new(ctx: &'a mut RequestContext, helpers: &'a TemplateHelpers) -> Self {
        Self { ctx, helpers }
    }

    /// Run items in order; the value is that of the final expression item, or
    /// null when the run ends with an assignment or is empty.
    pub(crate) fn run(&mut self, items: &[Item]) -> Result<Value, ResolveError> {
        let mut output = Value::Null;
        for item in items {
            output = match item {
                Item::SetStash { key, value } => {
                    let value = self.expr(value)?;
                    self.ctx.stash_mut().put(key.clone(), value);
                    Value::Null
                }
                Item::Expr(expr) => self.expr(expr)?,
            };
        }
        Ok(output)
    }

    fn block(&mut self, block: &Block) -> Result<Value, ResolveError> {
        self.run(&block.items)
    }

    fn expr(&mut self, expr: &Expr) -> Result<Value, ResolveError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Path(path) => Ok(resolve_path(self.ctx, path)?),
            Expr::Call { helper, args } => self.call(*helper, args),
            Expr::Conditional(cond) => {
                let taken = self.expr(&cond.condition)?.truthy("if condition")?;
                match (taken, &cond.else_branch) {
                    (true, _) => self.block(&cond.then_branch),
                    (false, Some(otherwise)) => self.block(otherwise),
                    (false, None) => Ok(Value::Null),
                }
            }
            Expr::Object(fields) => {
                let mut map = Map::new();
                for (key, value) in fields {
                    let value = self.expr(value)?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Map(map))
            }
            Expr::List(items) => items
                .iter()
                .map(|item| self.expr(item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
        }
    }

    fn call(&mut self, helper: Helper, args: &[Expr]) -> Result<Value, ResolveError> {
        match helper {
            Helper::FreshId => Ok(Value::String(self.helpers.fresh_id())),
            Helper::NowTimestamp => Ok(Value::String(self.helpers.now_timestamp())),
            Helper::ToEncoded => {
                let value = self.expr(&args[0])?;
                Ok(AttributeValue::from_value(&value).to_wire())
            }
            Helper::ToEncodedMap => {
                let value = self.expr(&args[0])?;
                let map = value.expect_map("toEncodedMap")?;
                Ok(Value::Map(
                    map.iter()
                        .map(|(k, v)| (k.clone(), AttributeValue::from_value(v).to_wire()))
                        .collect(),
                ))
            }
            // The fallback is evaluated only when it is used, so a
            // `freshId()` default is not consumed needlessly.
            Helper::DefaultIfNull => {
                let value = self.expr(&args[0])?;
                if value.is_null() {
                    self.expr(&args[1])
                } else {
                    Ok(value)
                }
            }
            Helper::DefaultIfBlank => {
                let value = self.expr(&args[0])?;
                if value.is_blank("defaultIfBlank")? {
                    self.expr(&args[1])
                } else {
                    Ok(value)
                }
            }
            Helper::IsNull => Ok(Value::Bool(self.expr(&args[0])?.is_null())),
            Helper::RaiseError => {
                let message = self.expr(&args[0])?;
                let message = message.expect_str("raiseError")?;
                Err(ResolveError::validation(message))
            }
        }
    }
}

/// Look up a path. Missing keys and traversal through null yield null;
/// traversal into any other non-map value is an error.
fn resolve_path(ctx: &RequestContext, path: &PathRef) -> Result<Value, TemplateError> {
    let (start, rest): (&Value, &[String]) = match path.root {
        Root::Args | Root::Stash => {
            let map = match path.root {
                Root::Args => ctx.arguments(),
                _ => ctx.stash().entries(),
            };
            match path.segments.split_first() {
                None => return Ok(Value::Map(map.clone())),
                Some((first, rest)) => (map.get(first).unwrap_or(&NULL), rest),
            }
        }
        Root::Source => (ctx.source().unwrap_or(&NULL), &path.segments[..]),
        Root::Result => (ctx.result(), &path.segments[..]),
    };

    let mut current = start;
    for segment in rest {
        current = match current {
            Value::Map(map) => map.get(segment).unwrap_or(&NULL),
            Value::Null => &NULL,
            other => {
                return Err(TemplateError::UnresolvablePath {
                    path: path.to_string(),
                    segment: segment.clone(),
                    kind: other.kind_name(),
                })
            }
        };
    }
    Ok(current.clone())
}
