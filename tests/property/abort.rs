//! A raising step ends the pipeline: no later step issues a call

use fieldpipe::datasource::{DataSourceAdapter, DataSourceRegistry, FnFunction};
use fieldpipe::template::TemplateHelpers;
use fieldpipe::value::{Map, Value};
use fieldpipe::{CancellationToken, Pipeline, PipelineExecutor, RequestContext, ResolveError, Step};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const REQUEST: &str = r#"{ "operation": "Invoke", "payload": { "seen": stash } }"#;

fn run(steps: usize, raising: usize) -> (Result<Value, ResolveError>, Vec<usize>) {
    let counters: Vec<Arc<AtomicUsize>> =
        (0..steps).map(|_| Arc::new(AtomicUsize::new(0))).collect();
    let mut registry = DataSourceRegistry::new();
    for (index, counter) in counters.iter().enumerate() {
        let name = format!("Source{}", index);
        let counter = counter.clone();
        let function = FnFunction::new(&name, move |payload| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok(payload) }
        });
        registry
            .register(DataSourceAdapter::remote_function(name, Arc::new(function)))
            .unwrap();
    }

    let pipeline = Pipeline::new(
        "abort",
        (0..steps)
            .map(|index| {
                let response = if index == raising {
                    format!("raiseError(\"step {} refused\")", index)
                } else {
                    format!("set stash.step{} = true\nresult", index)
                };
                Step::parse(
                    format!("step{}", index),
                    format!("Source{}", index),
                    REQUEST,
                    &response,
                )
                .unwrap()
            })
            .collect(),
    );

    let executor = PipelineExecutor::new(Arc::new(registry), TemplateHelpers::system());
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let outcome = runtime.block_on(async {
        let mut ctx = RequestContext::new(Map::new(), None);
        executor
            .execute(&pipeline, &mut ctx, &CancellationToken::new())
            .await
    });
    let calls = counters.iter().map(|c| c.load(Ordering::SeqCst)).collect();
    (outcome, calls)
}

#[test]
fn test_steps_after_a_raise_never_run() {
    let mut runner = proptest::test_runner::TestRunner::default();

    let cases = (1usize..8).prop_flat_map(|steps| (Just(steps), 0..steps));
    runner
        .run(&cases, |(steps, raising)| {
            let (outcome, calls) = run(steps, raising);

            prop_assert_eq!(
                outcome,
                Err(ResolveError::validation(format!("step {} refused", raising)))
            );
            for (index, count) in calls.iter().enumerate() {
                let expected = usize::from(index <= raising);
                prop_assert_eq!(*count, expected, "step {} call count", index);
            }

            Ok(())
        })
        .unwrap();
}
