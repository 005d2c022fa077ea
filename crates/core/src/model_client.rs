use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use fanout_agent_model::{
    ModelProvider, ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::Instant;
use tracing::Instrument;

type SendRequestResult = Result<ModelResponse, Box<dyn ModelProviderError>>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type HandlerFn = Arc<dyn Fn(&ModelRequest) -> BoxedSendRequestFuture + Send + Sync>;

const DEFAULT_INITIAL_RETRY_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_RETRY_TIME: Duration = Duration::from_secs(60);

/// A wrapper around a model provider that erases its type and retries
/// requests failing with transient errors.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    model_id: Arc<str>,
    initial_retry_interval: Duration,
    max_retry_time: Duration,
}

impl ModelClient {
    #[inline]
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        let model_id = Arc::from(provider.model_id());
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let handler_fn: HandlerFn =
            Arc::new(move |req: &ModelRequest| -> BoxedSendRequestFuture {
                let fut = provider.send_request(req);
                Box::pin(async move {
                    fut.await.map_err(|err| {
                        Box::new(err) as Box<dyn ModelProviderError>
                    })
                })
            });
        Self {
            handler_fn,
            model_id,
            initial_retry_interval: DEFAULT_INITIAL_RETRY_INTERVAL,
            max_retry_time: DEFAULT_MAX_RETRY_TIME,
        }
    }

    #[inline]
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Sets the delay before the first retry. Later retries back off
    /// exponentially.
    #[inline]
    pub fn set_initial_retry_interval(&mut self, interval: Duration) {
        self.initial_retry_interval = interval;
    }

    /// Sets the time after which a transient error is given up on.
    #[inline]
    pub fn set_max_retry_time(&mut self, max_retry_time: Duration) {
        self.max_retry_time = max_retry_time;
    }

    /// Sends a request and returns the response.
    ///
    /// Transient errors (see [`fanout_agent_model::ErrorKind::is_transient`])
    /// are retried with exponential backoff, other errors are returned
    /// immediately.
    pub async fn send_request(&self, req: &ModelRequest) -> SendRequestResult {
        let backoff = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_retry_interval)
            .with_max_elapsed_time(Some(self.max_retry_time))
            .build();
        let start = Instant::now();

        let resp = backoff::future::retry(backoff, || {
            let fut = (self.handler_fn)(req);
            async move {
                fut.await.map_err(|err| {
                    if err.kind().is_transient() {
                        warn!("transient model error, will retry: {err}");
                        backoff::Error::transient(err)
                    } else {
                        error!("🔴 Error during model invocation: {err}");
                        backoff::Error::permanent(err)
                    }
                })
            }
        })
        .instrument(trace_span!("model client req"))
        .await?;

        info!("🔄 Model response received in {:.2?}", start.elapsed());
        debug!("🔄 Model finish reason: {:?}", resp.finish_reason);
        if let Some(content) = &resp.content {
            info!("🔄 Model response: {content}");
        }
        for call in &resp.tool_calls {
            info!("🔄 Tool call function name: {}", call.name);
            debug!("🔄 Tool call function arguments: {:?}", call.arguments);
        }
        Ok(resp)
    }
}
