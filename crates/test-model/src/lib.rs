//! A local fake model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fanout_agent_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Default)]
struct Recorder {
    requests: Vec<ModelRequest>,
    attempts: HashMap<usize, u64>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to setup the script, which is how the
/// model should respond to a request. The response is selected by the
/// number of assistant messages already in the request, so the first
/// request gets the first preset, the request after one assistant turn
/// gets the second, and so on. If there are no enough presets in the
/// script, an error will be returned.
///
/// Clones share the recorded requests, so a test can hand one clone to
/// the agent and inspect the other.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    script: Vec<PresetResponse>,
    delay: Option<Duration>,
    recorder: Arc<Mutex<Recorder>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.script.push(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns all requests received so far, including failed attempts.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.recorder
            .lock()
            .map(|recorder| recorder.requests.clone())
            .unwrap_or_default()
    }

    fn respond(&self, req: &ModelRequest) -> Result<ModelResponse, Error> {
        let step_idx = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::Assistant(_)))
            .count();

        let attempt = {
            let mut recorder = match self.recorder.lock() {
                Ok(recorder) => recorder,
                Err(poisoned) => poisoned.into_inner(),
            };
            recorder.requests.push(req.clone());
            let attempt = recorder.attempts.entry(step_idx).or_default();
            *attempt += 1;
            *attempt
        };

        let Some(preset) = self.script.get(step_idx) else {
            return Err(Error {
                message: "no enough steps",
                kind: ErrorKind::Other,
            });
        };

        match preset.failures {
            Some(0) => {
                return Err(Error {
                    message: "preset to always fail",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            Some(failures) if attempt <= failures => {
                return Err(Error {
                    message: "preset to fail",
                    kind: ErrorKind::RateLimitExceeded,
                });
            }
            _ => {}
        }

        let mut content = String::new();
        let mut tool_calls = vec![];
        for event in &preset.events {
            match event {
                PresetEvent::MessageDelta(delta) => content.push_str(delta),
                PresetEvent::ToolCall(req) => tool_calls.push(req.clone()),
            }
        }
        let finish_reason = if tool_calls.is_empty() {
            ModelFinishReason::Stop
        } else {
            ModelFinishReason::ToolCalls
        };

        Ok(ModelResponse {
            content: (!content.is_empty()).then_some(content),
            tool_calls,
            finish_reason: Some(finish_reason),
            usage: preset.usage,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;

    fn model_id(&self) -> &str {
        "test-model"
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<ModelResponse, Self::Error>> + Send + 'static
    {
        let result = self.respond(req);
        let delay = self.delay.unwrap_or(Duration::from_millis(1));
        async move {
            sleep(delay).await;
            result
        }
    }
}
