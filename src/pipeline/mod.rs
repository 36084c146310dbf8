//! Resolution pipelines
//!
//! A pipeline is an ordered list of steps sharing one request context. Each
//! step renders a backend request, calls one data source and shapes the
//! result; an optional outer request template runs first and an outer
//! response template runs last.

mod executor;

pub use executor::PipelineExecutor;
/// Caller-side cancellation, checked before each backend call.
pub use tokio_util::sync::CancellationToken;

use crate::error::TemplateError;
use crate::template::{Template, TemplateKind};

/// One backend call with its request and response templates.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: String,
    pub data_source: String,
    pub request: Template,
    pub response: Template,
}

impl Step {
    pub fn new(
        id: impl Into<String>,
        data_source: impl Into<String>,
        request: Template,
        response: Template,
    ) -> Self {
        Self {
            id: id.into(),
            data_source: data_source.into(),
            request,
            response,
        }
    }

    /// Parse both templates from source text.
    pub fn parse(
        id: impl Into<String>,
        data_source: impl Into<String>,
        request: &str,
        response: &str,
    ) -> Result<Self, TemplateError> {
        Ok(Self::new(
            id,
            data_source,
            Template::parse(TemplateKind::Request, request)?,
            Template::parse(TemplateKind::Response, response)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    name: String,
    before: Template,
    steps: Vec<Step>,
    after: Template,
}

impl Pipeline {
    /// Pipeline with identity outer templates.
    pub fn new(name: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            name: name.into(),
            before: Template::empty_request(),
            steps,
            after: Template::passthrough(),
        }
    }

    /// The single-step resolver.
    pub fn unit(step: Step) -> Self {
        Self::new(step.id.clone(), vec![step])
    }

    /// Set the outer request template, run before the first step.
    pub fn with_before(mut self, text: &str) -> Result<Self, TemplateError> {
        self.before = Template::parse(TemplateKind::Request, text)?;
        Ok(self)
    }

    /// Set the outer response template, run after the last step.
    pub fn with_after(mut self, text: &str) -> Result<Self, TemplateError> {
        self.after = Template::parse(TemplateKind::Response, text)?;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn before(&self) -> &Template {
        &self.before
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn after(&self) -> &Template {
        &self.after
    }
}
