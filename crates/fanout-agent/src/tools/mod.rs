//! A set of built-in tools that models can use.

mod download;
mod read_file;

use fanout_agent_core::tool::{Registry, RegistryError};

pub use download::{DownloadOutput, DownloadTool};
pub use read_file::{ReadFileOutput, ReadFileTool};

/// Builds a registry with all built-in tools.
pub fn builtin_registry() -> Result<Registry, RegistryError> {
    Registry::builder()
        .with_tool(ReadFileTool::new())
        .with_tool(DownloadTool::new())
        .build()
}

#[cfg(test)]
mod tests {
    use fanout_agent_core::tool::{FunctionCall, execute_calls};
    use serde_json::{Map, json};

    use super::*;

    #[test]
    fn test_builtin_registry() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.accepted_parameters("download_url_to_file").unwrap(),
            ["file_path", "url"]
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_reported_as_failure() {
        let registry = builtin_registry().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("nope.txt");

        let mut arguments = Map::new();
        arguments.insert(
            "file_path".to_owned(),
            json!(file_path.to_string_lossy()),
        );
        let results = execute_calls(
            vec![FunctionCall {
                call_id: "call_1".to_owned(),
                name: "read_file".to_owned(),
                arguments,
                arguments_error: None,
            }],
            &registry,
        )
        .await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].is_success());
        assert!(results[0].error().is_none());
        assert_eq!(results[0].payload()["content"], "");
    }
}
