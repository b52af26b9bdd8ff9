use rayon::prelude::*;
use tracing::warn;

use crate::error::Result;

/// What a stage does when one of its items fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure, drop the item and keep the rest
    Isolate,
    /// Abort the stage with the first error
    FailFast,
}

/// Run `task` over every item in parallel and wait for all of them.
///
/// Results come back in input order whatever order the tasks finish in.
pub fn run_stage<T, R, F>(
    stage: &str,
    items: Vec<T>,
    policy: FailurePolicy,
    task: F,
) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R> + Sync + Send,
{
    match policy {
        FailurePolicy::FailFast => items.into_par_iter().map(task).collect(),
        FailurePolicy::Isolate => {
            let outcomes: Vec<Result<R>> = items.into_par_iter().map(task).collect();
            Ok(outcomes
                .into_iter()
                .filter_map(|outcome| match outcome {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!(stage = stage, error = %err, "item failed, dropping it");
                        None
                    }
                })
                .collect())
        }
    }
}
