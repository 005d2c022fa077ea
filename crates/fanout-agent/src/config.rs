//! Configuration read from the environment.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::{env, fs};

use serde::Deserialize;

/// Errors found while loading the configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A required variable is not set.
    Missing(&'static str),
    /// A variable is set to a value that can't be used.
    Invalid {
        /// Name of the variable.
        name: &'static str,
        /// What is wrong with the value.
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(name) => {
                write!(f, "{name} environment variable is not set")
            }
            ConfigError::Invalid { name, reason } => {
                write!(f, "invalid {name}: {reason}")
            }
        }
    }
}

impl StdError for ConfigError {}

/// Instructions given to the agent as its system prompt.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Instructions {
    /// Who the agent is.
    pub role: String,
    /// What the agent is trying to achieve.
    pub goal: String,
    /// Any other guidance.
    #[serde(default)]
    pub general: String,
}

impl Instructions {
    /// Renders the instructions as a system prompt.
    pub fn to_system_prompt(&self) -> String {
        let mut prompt = format!("Role: {}\nGoal: {}", self.role, self.goal);
        if !self.general.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.general);
        }
        prompt
    }
}

/// The agent configuration.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// API key for the OpenAI compatible endpoint.
    pub api_key: String,
    /// Overrides the endpoint base URL.
    pub base_url: Option<String>,
    /// Overrides the model.
    pub model: Option<String>,
    /// Agent instructions, if a file was configured.
    pub instructions: Option<Instructions>,
    /// Overrides the maximum number of model rounds per task.
    pub max_steps: Option<usize>,
}

impl Config {
    /// Loads the configuration from the process environment.
    ///
    /// | Variable             | Meaning                                   |
    /// |----------------------|-------------------------------------------|
    /// | `OPENAI_API_KEY`     | required                                  |
    /// | `OPENAI_BASE_URL`    | endpoint base URL                         |
    /// | `OPENAI_MODEL`       | model name                                |
    /// | `AGENT_INSTRUCTIONS` | path to a `{role, goal, general}` JSON    |
    /// | `AGENT_MAX_STEPS`    | maximum model rounds per task             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Loads the configuration from a variable lookup function.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| var(name).filter(|value| !value.is_empty());

        let api_key = var("OPENAI_API_KEY")
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))?;

        let instructions = match var("AGENT_INSTRUCTIONS") {
            Some(path) => Some(load_instructions(&path)?),
            None => None,
        };

        let max_steps = match var("AGENT_MAX_STEPS") {
            Some(value) => match value.parse::<usize>() {
                Ok(steps) if steps > 0 => Some(steps),
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        name: "AGENT_MAX_STEPS",
                        reason: "must be at least 1".to_owned(),
                    });
                }
                Err(err) => {
                    return Err(ConfigError::Invalid {
                        name: "AGENT_MAX_STEPS",
                        reason: err.to_string(),
                    });
                }
            },
            None => None,
        };

        Ok(Config {
            api_key,
            base_url: var("OPENAI_BASE_URL"),
            model: var("OPENAI_MODEL"),
            instructions,
            max_steps,
        })
    }
}

fn load_instructions(path: &str) -> Result<Instructions, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        name: "AGENT_INSTRUCTIONS",
        reason: format!("{path}: {reason}"),
    };
    let text = fs::read_to_string(path).map_err(|err| invalid(err.to_string()))?;
    serde_json::from_str(&text).map_err(|err| invalid(err.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_minimal() {
        let config = load(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert_eq!(config.api_key, "sk-test");
        assert!(config.base_url.is_none());
        assert!(config.model.is_none());
        assert!(config.instructions.is_none());
        assert!(config.max_steps.is_none());
    }

    #[test]
    fn test_missing_api_key() {
        let err = load(&[("OPENAI_API_KEY", "")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENAI_API_KEY")));
        assert_eq!(
            err.to_string(),
            "OPENAI_API_KEY environment variable is not set"
        );
    }

    #[test]
    fn test_max_steps() {
        let config = load(&[("OPENAI_API_KEY", "k"), ("AGENT_MAX_STEPS", "8")])
            .unwrap();
        assert_eq!(config.max_steps, Some(8));

        for bad in ["0", "many"] {
            let err = load(&[("OPENAI_API_KEY", "k"), ("AGENT_MAX_STEPS", bad)])
                .unwrap_err();
            assert!(matches!(
                err,
                ConfigError::Invalid {
                    name: "AGENT_MAX_STEPS",
                    ..
                }
            ));
        }
    }

    #[test]
    fn test_instructions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_instructions.json");
        fs::write(
            &path,
            r#"{"role": "A file clerk", "goal": "Keep files tidy", "general": "Be brief."}"#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let config =
            load(&[("OPENAI_API_KEY", "k"), ("AGENT_INSTRUCTIONS", path.as_str())])
                .unwrap();
        let instructions = config.instructions.unwrap();
        assert_eq!(
            instructions.to_system_prompt(),
            "Role: A file clerk\nGoal: Keep files tidy\n\nBe brief."
        );
    }

    #[test]
    fn test_bad_instructions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent_instructions.json");
        fs::write(&path, r#"{"role": "A file clerk"}"#).unwrap();
        let path = path.to_string_lossy().into_owned();

        let err = load(&[("OPENAI_API_KEY", "k"), ("AGENT_INSTRUCTIONS", path.as_str())])
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid AGENT_INSTRUCTIONS"));
    }
}
