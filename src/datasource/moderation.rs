//! Content moderation function
//!
//! Contract: payload `{"content": string}` → `{"flagged": bool}`. The matching
//! rule is pluggable through [`ContentModerator`].

use crate::datasource::function::{InvokeError, RemoteFunction};
use crate::value::{Map, Value};
use async_trait::async_trait;
use std::sync::Arc;

pub trait ContentModerator: Send + Sync {
    fn is_flagged(&self, content: &str) -> bool;
}

/// Terms flagged when no list is configured.
pub const DEFAULT_BANNED_TERMS: &[&str] = &["🖕", "💩"];

/// Flags content containing any of a fixed set of terms.
#[derive(Debug, Clone)]
pub struct BannedTermsModerator {
    terms: Vec<String>,
}

impl BannedTermsModerator {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.is_empty())
                .collect(),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Default for BannedTermsModerator {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_TERMS.iter().copied())
    }
}

impl ContentModerator for BannedTermsModerator {
    fn is_flagged(&self, content: &str) -> bool {
        self.terms.iter().any(|term| content.contains(term.as_str()))
    }
}

/// Exposes a [`ContentModerator`] as a remote function.
pub struct ModerationFunction {
    name: String,
    moderator: Arc<dyn ContentModerator>,
}

impl ModerationFunction {
    pub fn new(name: impl Into<String>, moderator: Arc<dyn ContentModerator>) -> Self {
        Self {
            name: name.into(),
            moderator,
        }
    }
}

#[async_trait]
impl RemoteFunction for ModerationFunction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, payload: Value) -> Result<Value, InvokeError> {
        let content = payload
            .get("content")
            .and_then(Value::as_str)
            .ok_or_else(|| InvokeError::terminal("payload must carry a string 'content'"))?;
        let mut out = Map::new();
        out.insert(
            "flagged".to_string(),
            Value::Bool(self.moderator.is_flagged(content)),
        );
        Ok(Value::Map(out))
    }
}
