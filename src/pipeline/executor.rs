//! Pipeline executor: runs a pipeline's steps in order against one context.
//! Aborts on the first error; never undoes a step that already reached its backend.

use crate::context::RequestContext;
use crate::datasource::DataSourceRegistry;
use crate::error::{DispatchError, ResolveError};
use crate::pipeline::{CancellationToken, Pipeline, Step};
use crate::template::TemplateHelpers;
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct PipelineExecutor {
    data_sources: Arc<DataSourceRegistry>,
    helpers: TemplateHelpers,
}

impl PipelineExecutor {
    pub fn new(data_sources: Arc<DataSourceRegistry>, helpers: TemplateHelpers) -> Self {
        Self {
            data_sources,
            helpers,
        }
    }

    pub fn data_sources(&self) -> &DataSourceRegistry {
        &self.data_sources
    }

    pub fn helpers(&self) -> &TemplateHelpers {
        &self.helpers
    }

    /// Run `pipeline` to completion or to its first error.
    ///
    /// Steps run strictly in order; the only suspension points are backend
    /// calls. Cancellation is honoured before a call is issued, never while
    /// one is in flight.
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        ctx: &mut RequestContext,
        cancellation: &CancellationToken,
    ) -> Result<Value, ResolveError> {
        debug!(pipeline = %pipeline.name(), steps = pipeline.steps().len(), "Pipeline started");

        let mut progress = Progress::default();
        let outcome = self.run(pipeline, ctx, cancellation, &mut progress).await;

        match &outcome {
            Ok(_) => debug!(
                pipeline = %pipeline.name(),
                calls_issued = progress.calls_issued,
                "Pipeline completed"
            ),
            Err(err) if progress.committed_steps > 0 => warn!(
                pipeline = %pipeline.name(),
                step = progress.current.as_deref().unwrap_or("<finalize>"),
                calls_issued = progress.calls_issued,
                committed_steps = progress.committed_steps,
                error = %err,
                "Pipeline aborted after earlier steps committed; their effects remain"
            ),
            Err(err) => warn!(
                pipeline = %pipeline.name(),
                step = progress.current.as_deref().unwrap_or("<prepare>"),
                calls_issued = progress.calls_issued,
                error = %err,
                "Pipeline aborted"
            ),
        }
        outcome
    }

    async fn run(
        &self,
        pipeline: &Pipeline,
        ctx: &mut RequestContext,
        cancellation: &CancellationToken,
        progress: &mut Progress,
    ) -> Result<Value, ResolveError> {
        let prepared = pipeline.before().evaluate_request(ctx, &self.helpers)?;
        ctx.set_result(prepared);

        for step in pipeline.steps() {
            progress.current = Some(step.id.clone());
            self.run_step(pipeline, step, ctx, cancellation, progress)
                .await?;
        }

        progress.current = None;
        let last = ctx.result().clone();
        pipeline.after().evaluate_response(ctx, last, &self.helpers)
    }

    async fn run_step(
        &self,
        pipeline: &Pipeline,
        step: &Step,
        ctx: &mut RequestContext,
        cancellation: &CancellationToken,
        progress: &mut Progress,
    ) -> Result<(), ResolveError> {
        let adapter = self.data_sources.get(&step.data_source).ok_or_else(|| {
            DispatchError::UnknownDataSource {
                step: step.id.clone(),
                data_source: step.data_source.clone(),
            }
        })?;

        let request = step.request.evaluate_request(ctx, &self.helpers)?;

        if cancellation.is_cancelled() {
            return Err(ResolveError::Cancelled {
                calls_issued: progress.calls_issued,
            });
        }

        debug!(
            pipeline = %pipeline.name(),
            step = %step.id,
            data_source = %step.data_source,
            "Step calling data source"
        );
        let writes = adapter.is_write(&request);
        progress.calls_issued += 1;
        let result = adapter.call(&request).await?;
        if writes {
            progress.committed_steps += 1;
        }

        step.response
            .evaluate_response(ctx, result, &self.helpers)?;
        debug!(pipeline = %pipeline.name(), step = %step.id, "Step finished");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct Progress {
    current: Option<String>,
    calls_issued: usize,
    committed_steps: usize,
}
