use std::path::Path;
use std::time::Duration;

use fanout_agent_core::tool::{Error as ToolError, Tool};
use reqwest::Client;
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::fs;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize, JsonSchema)]
pub struct DownloadParameters {
    #[schemars(description = "URL to download content from.")]
    url: String,
    #[schemars(description = "Path where the file should be saved.")]
    file_path: String,
}

/// The payload returned by [`DownloadTool`].
#[derive(Debug, Serialize)]
pub struct DownloadOutput {
    success: bool,
    message: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    final_url: Option<String>,
    filepath: String,
}

impl DownloadOutput {
    fn failure(input: DownloadParameters, message: String) -> Self {
        Self {
            success: false,
            message,
            url: input.url,
            final_url: None,
            filepath: input.file_path,
        }
    }
}

/// A tool that downloads a URL into a local file.
///
/// Redirects are followed and missing parent directories are created.
/// Every failure is reported in the payload with `success: false`.
pub struct DownloadTool {
    client: Client,
    parameter_schema: Value,
}

impl DownloadTool {
    /// Creates a new download tool.
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!("failed to build http client, using defaults: {err}");
                Client::new()
            });
        DownloadTool {
            client,
            parameter_schema: schema_for!(DownloadParameters).to_value(),
        }
    }
}

impl Default for DownloadTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for DownloadTool {
    type Input = DownloadParameters;
    type Output = DownloadOutput;

    fn name(&self) -> &str {
        "download_url_to_file"
    }

    fn description(&self) -> &str {
        "Download content from a URL and save it to a file"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: DownloadParameters,
    ) -> impl Future<Output = Result<DownloadOutput, ToolError>> + Send + 'static
    {
        let client = self.client.clone();
        async move { Ok(download(&client, input).await) }
    }
}

async fn download(client: &Client, input: DownloadParameters) -> DownloadOutput {
    if let Some(parent) = Path::new(&input.file_path).parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(err) = fs::create_dir_all(parent).await {
                let message = format!("Error downloading/saving file: {err}");
                return DownloadOutput::failure(input, message);
            }
        }
    }

    let response = match client.get(&input.url).send().await {
        Ok(response) => response,
        Err(err) => {
            let message = format!("Error requesting URL: {err}");
            return DownloadOutput::failure(input, message);
        }
    };
    let final_url = response.url().to_string();
    debug!("downloading {} from {final_url}", input.url);

    let status = response.status();
    if !status.is_success() {
        let message = format!(
            "HTTP error: {} - {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        return DownloadOutput {
            final_url: Some(final_url),
            ..DownloadOutput::failure(input, message)
        };
    }

    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            let message = format!("Error requesting URL: {err}");
            return DownloadOutput::failure(input, message);
        }
    };
    if let Err(err) = fs::write(&input.file_path, &body).await {
        let message = format!("Error downloading/saving file: {err}");
        return DownloadOutput::failure(input, message);
    }

    DownloadOutput {
        success: true,
        message: "File downloaded and saved successfully".to_owned(),
        url: input.url,
        final_url: Some(final_url),
        filepath: input.file_path,
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn params(url: String, file_path: &Path) -> DownloadParameters {
        DownloadParameters {
            url,
            file_path: file_path.to_string_lossy().into_owned(),
        }
    }

    #[tokio::test]
    async fn test_download() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/data.csv", server.uri())),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data.csv"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("nested/dir/data.csv");
        let url = format!("{}/old", server.uri());

        let output = DownloadTool::new()
            .execute(params(url.clone(), &file_path))
            .await
            .unwrap();
        assert!(output.success, "{}", output.message);
        assert_eq!(output.url, url);
        assert_eq!(
            output.final_url,
            Some(format!("{}/data.csv", server.uri()))
        );
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "a,b\n1,2\n");
    }

    #[tokio::test]
    async fn test_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("missing.txt");
        let output = DownloadTool::new()
            .execute(params(format!("{}/missing", server.uri()), &file_path))
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.message, "HTTP error: 404 - Not Found");
        assert!(output.final_url.is_some());
        assert!(!file_path.exists());
    }

    #[tokio::test]
    async fn test_request_error() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("out.txt");
        let output = DownloadTool::new()
            .execute(params("not a url".to_owned(), &file_path))
            .await
            .unwrap();

        assert!(!output.success);
        assert!(output.message.starts_with("Error requesting URL"));
        let payload = serde_json::to_value(&output).unwrap();
        assert!(payload.get("final_url").is_none());
    }
}
