use std::collections::{HashMap, HashSet};
use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use fanout_agent_model::ModelTool;
use serde_json::Value;

use super::{AnyTool, Tool, ToolObject};

/// Error returned when a [`Registry`] can't be built from the registered
/// tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// A tool has an empty name.
    EmptyName,
    /// Two tools share the same name.
    DuplicateName(String),
    /// A tool's parameter schema doesn't describe an object with named
    /// properties.
    MalformedSchema {
        /// Name of the offending tool.
        name: String,
        /// What is wrong with the schema.
        reason: String,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::EmptyName => write!(f, "tool name must not be empty"),
            RegistryError::DuplicateName(name) => {
                write!(f, "tool `{name}` is registered more than once")
            }
            RegistryError::MalformedSchema { name, reason } => {
                write!(f, "malformed parameter schema for `{name}`: {reason}")
            }
        }
    }
}

impl StdError for RegistryError {}

pub(crate) struct Entry {
    pub(crate) tool: Arc<dyn ToolObject>,
    pub(crate) accepted: HashSet<String>,
}

/// A read-only mapping from tool names to tools.
///
/// Cloning is cheap, clones share the same tools.
#[derive(Clone, Default)]
pub struct Registry {
    tools: Arc<HashMap<String, Entry>>,
}

impl Registry {
    /// Creates an empty builder.
    #[inline]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Returns the tool definitions to send to the model, sorted by name.
    pub fn definitions(&self) -> Vec<ModelTool> {
        let mut definitions: Vec<_> = self
            .tools
            .values()
            .map(|entry| ModelTool {
                name: entry.tool.name().to_owned(),
                description: entry.tool.description().to_owned(),
                parameters: entry.tool.parameter_schema().clone(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Returns `true` if a tool with the given name is registered.
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns the argument names the named tool accepts, sorted.
    pub fn accepted_parameters(&self, name: &str) -> Option<Vec<&str>> {
        let entry = self.tools.get(name)?;
        let mut names: Vec<_> = entry.accepted.iter().map(String::as_str).collect();
        names.sort_unstable();
        Some(names)
    }

    /// Returns the number of registered tools.
    #[inline]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns `true` if no tools are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    #[inline]
    pub(crate) fn get(&self, name: &str) -> Option<&Entry> {
        self.tools.get(name)
    }
}

/// [`Registry`] builder.
#[derive(Default)]
pub struct RegistryBuilder {
    tools: Vec<Arc<dyn ToolObject>>,
}

impl RegistryBuilder {
    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.add_tool(tool);
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        self.tools.push(Arc::new(AnyTool(tool)));
    }

    /// Builds the registry, validating every tool's name and schema.
    pub fn build(self) -> Result<Registry, RegistryError> {
        let mut tools = HashMap::with_capacity(self.tools.len());
        for tool in self.tools {
            let name = tool.name().to_owned();
            if name.is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if tools.contains_key(&name) {
                return Err(RegistryError::DuplicateName(name));
            }
            let accepted = match accepted_parameters(tool.parameter_schema()) {
                Ok(accepted) => accepted,
                Err(reason) => {
                    return Err(RegistryError::MalformedSchema { name, reason });
                }
            };
            trace!("registered tool `{name}` accepting {accepted:?}");
            tools.insert(name, Entry { tool, accepted });
        }
        Ok(Registry {
            tools: Arc::new(tools),
        })
    }
}

fn accepted_parameters(schema: &Value) -> Result<HashSet<String>, String> {
    let Value::Object(schema) = schema else {
        return Err("schema must be a JSON object".to_owned());
    };
    match schema.get("type") {
        None => {}
        Some(Value::String(ty)) if ty == "object" => {}
        Some(other) => {
            return Err(format!("expected type \"object\", found {other}"));
        }
    }
    match schema.get("properties") {
        None => Ok(HashSet::new()),
        Some(Value::Object(properties)) => Ok(properties.keys().cloned().collect()),
        Some(_) => Err("`properties` must be an object".to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Map, json};

    use super::*;
    use crate::tool::{Error, FnTool};

    fn echo_tool(
        name: &str,
        schema: Value,
    ) -> impl Tool<Input = Map<String, Value>, Output = Value> {
        FnTool::new(name, "Echoes the arguments", schema, |args| async move {
            Ok::<_, Error>(Value::Object(args))
        })
    }

    #[test]
    fn test_build() {
        let registry = Registry::builder()
            .with_tool(echo_tool(
                "b",
                json!({
                    "type": "object",
                    "properties": { "x": {}, "y": {} }
                }),
            ))
            .with_tool(echo_tool("a", json!({ "type": "object" })))
            .build()
            .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
        assert_eq!(registry.accepted_parameters("b").unwrap(), ["x", "y"]);
        assert!(registry.accepted_parameters("a").unwrap().is_empty());

        let names: Vec<_> = registry
            .definitions()
            .into_iter()
            .map(|def| def.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_duplicate_name() {
        let err = Registry::builder()
            .with_tool(echo_tool("f", json!({})))
            .with_tool(echo_tool("f", json!({})))
            .build()
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::DuplicateName("f".to_owned()));
    }

    #[test]
    fn test_empty_name() {
        let err = Registry::builder()
            .with_tool(echo_tool("", json!({})))
            .build()
            .err()
            .unwrap();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn test_malformed_schema() {
        for schema in [
            json!("object"),
            json!({ "type": "string" }),
            json!({ "type": "object", "properties": ["x"] }),
        ] {
            let err = Registry::builder()
                .with_tool(echo_tool("f", schema))
                .build()
                .err()
                .unwrap();
            assert!(matches!(err, RegistryError::MalformedSchema { .. }));
        }
    }
}
