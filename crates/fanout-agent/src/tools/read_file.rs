use std::io::ErrorKind as IoErrorKind;

use fanout_agent_core::tool::{Error as ToolError, Tool};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::spawn_blocking;

#[derive(Deserialize, JsonSchema)]
pub struct ReadFileParameters {
    #[schemars(description = "Path to the file to read.")]
    file_path: String,
}

/// The payload returned by [`ReadFileTool`].
#[derive(Debug, Serialize)]
pub struct ReadFileOutput {
    success: bool,
    message: String,
    filepath: String,
    content: String,
}

/// A tool for reading a whole UTF-8 text file.
///
/// A missing file is reported with `success: false` in the payload, so the
/// model can recover from a wrong path. Other I/O errors fail the call.
pub struct ReadFileTool {
    parameter_schema: Value,
}

impl ReadFileTool {
    /// Creates a new read file tool.
    #[inline]
    pub fn new() -> Self {
        ReadFileTool {
            parameter_schema: schema_for!(ReadFileParameters).to_value(),
        }
    }
}

impl Default for ReadFileTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for ReadFileTool {
    type Input = ReadFileParameters;
    type Output = ReadFileOutput;

    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read a file from the sandbox"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: ReadFileParameters,
    ) -> impl Future<Output = Result<ReadFileOutput, ToolError>> + Send + 'static
    {
        async move {
            let path = input.file_path.clone();
            let read = spawn_blocking(move || std::fs::read_to_string(path))
                .await
                .map_err(|_| {
                    ToolError::execution_error()
                        .with_reason("Error reading file: task aborted")
                })?;

            match read {
                Ok(content) => Ok(ReadFileOutput {
                    success: true,
                    message: "File read successfully".to_owned(),
                    filepath: input.file_path,
                    content,
                }),
                Err(err) if err.kind() == IoErrorKind::NotFound => {
                    Ok(ReadFileOutput {
                        success: false,
                        message: format!("File not found: {}", input.file_path),
                        filepath: input.file_path,
                        content: String::new(),
                    })
                }
                Err(err) => Err(ToolError::execution_error()
                    .with_reason(format!("Error reading file: {err}"))),
            }
        }
    }
}
