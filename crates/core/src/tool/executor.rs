use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::Instrument;

use super::registry::Registry;
use super::{CallError, CallOutcome, CallResult, FunctionCall, ToolObject};

/// Executes a batch of function calls concurrently.
///
/// Every call is spawned as its own task, so a slow or blocking call
/// never holds back its siblings. The returned vector has one result per
/// input call, in input order, each tagged with its originating call id.
/// Failures are isolated per call. An unknown function, rejected or
/// unparseable arguments, an error returned by the tool and a panicking
/// tool all become failed results instead of aborting the batch.
///
/// An empty batch returns immediately without spawning anything.
pub async fn execute_calls(
    calls: Vec<FunctionCall>,
    registry: &Registry,
) -> Vec<CallResult> {
    if calls.is_empty() {
        return vec![];
    }

    let count = calls.len();
    let start = Instant::now();

    let pending: Vec<_> = calls
        .into_iter()
        .map(|call| dispatch(call, registry))
        .collect();
    let results = join_all(pending).await;

    if count > 1 {
        info!("⚙️ Executed {count} functions in {:.2?}", start.elapsed());
    }
    results
}

/// Validates the call and spawns it, returning a future that resolves
/// to its result.
fn dispatch(
    call: FunctionCall,
    registry: &Registry,
) -> impl Future<Output = CallResult> + Send + 'static {
    let FunctionCall {
        call_id,
        name,
        arguments,
        arguments_error,
    } = call;
    info!("🔦 Requesting function: {name} ({call_id})");
    trace!("arguments of {call_id}: {arguments:?}");

    let start = Instant::now();
    let task = validate(&name, &arguments, arguments_error, registry).map(|tool| {
        let span = debug_span!("tool call", name = %name, id = %call_id);
        tokio::spawn(async move { tool.execute(arguments).await }.instrument(span))
    });

    async move {
        let outcome = match task {
            Err(err) => {
                warn!("{}", err.message());
                CallOutcome::Failed(err)
            }
            Ok(handle) => match handle.await {
                Ok(Ok(payload)) => {
                    let result = CallResult::completed(call_id, name, payload);
                    info!(
                        "🔧 Function {} completed in {:.2?}",
                        result.function_name,
                        start.elapsed()
                    );
                    return result;
                }
                Ok(Err(err)) => {
                    error!("❌ Error executing function {name}: {err}");
                    CallOutcome::Failed(CallError::execution_error(&name, err))
                }
                Err(join_err) => {
                    error!("❌ Function {name} did not finish: {join_err}");
                    CallOutcome::Failed(CallError::execution_error(
                        &name, join_err,
                    ))
                }
            },
        };
        CallResult {
            call_id,
            function_name: name,
            outcome,
        }
    }
}

fn validate(
    name: &str,
    arguments: &Map<String, Value>,
    arguments_error: Option<String>,
    registry: &Registry,
) -> Result<Arc<dyn ToolObject>, CallError> {
    let Some(entry) = registry.get(name) else {
        return Err(CallError::unknown_function(name));
    };
    if let Some(reason) = arguments_error {
        let cause = format!("malformed arguments: {reason}");
        return Err(CallError::execution_error(name, cause));
    }
    let mut rejected: Vec<String> = arguments
        .keys()
        .filter(|key| !entry.accepted.contains(key.as_str()))
        .cloned()
        .collect();
    rejected.sort_unstable();
    if !rejected.is_empty() {
        return Err(CallError::invalid_arguments(name, rejected));
    }
    Ok(Arc::clone(&entry.tool))
}
