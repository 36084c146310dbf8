//! Remote function abstraction
//!
//! Backends reached by `Invoke(payload) -> result`. The result is opaque to
//! the adapter; the step's response template interprets it.

use crate::error::FaultKind;
use crate::value::Value;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a remote function.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct InvokeError {
    pub kind: FaultKind,
    pub message: String,
}

impl InvokeError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Transient,
            message: message.into(),
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        Self {
            kind: FaultKind::Terminal,
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait RemoteFunction: Send + Sync {
    /// Function name, for logs
    fn name(&self) -> &str;

    async fn invoke(&self, payload: Value) -> Result<Value, InvokeError>;
}

type BoxedCall =
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<Value, InvokeError>> + Send>> + Send + Sync;

/// Remote function backed by an async closure.
pub struct FnFunction {
    name: String,
    call: Arc<BoxedCall>,
}

impl FnFunction {
    pub fn new<F, Fut>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, InvokeError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            call: Arc::new(move |payload| Box::pin(f(payload))),
        }
    }
}

#[async_trait]
impl RemoteFunction for FnFunction {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, payload: Value) -> Result<Value, InvokeError> {
        (self.call)(payload).await
    }
}
