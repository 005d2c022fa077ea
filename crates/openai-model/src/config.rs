use std::fmt;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4.1";
/// Endpoint used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Where and how [`OpenAIProvider`](crate::OpenAIProvider) talks to the API.
///
/// Unset options fall back to [`DEFAULT_MODEL`] and [`DEFAULT_BASE_URL`].
#[derive(Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAIConfig {
    /// Creates a configuration for the default endpoint and model.
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            base_url: DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// Uses `model` instead of the default one.
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Sends requests to another compatible endpoint, e.g. a local server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_owned();
        self
    }

    /// The model requests are made for.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    #[inline]
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    pub(crate) fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the key.
        f.debug_struct("OpenAIConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
