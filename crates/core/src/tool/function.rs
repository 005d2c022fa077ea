use serde_json::{Map, Value};

use super::{Error, Tool};

/// A tool backed by a closure over raw JSON arguments.
///
/// Useful for functions whose parameters are only known at runtime. The
/// closure receives the arguments as passed by the model, after the
/// registry has checked them against `parameter_schema`.
pub struct FnTool<F> {
    name: String,
    description: String,
    parameter_schema: Value,
    f: F,
}

impl<F, Fut> FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Error>> + Send + 'static,
{
    /// Creates a tool from a name, a description, a JSON schema for the
    /// parameters and the function to run.
    #[inline]
    pub fn new<S1, S2>(
        name: S1,
        description: S2,
        parameter_schema: Value,
        f: F,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
            f,
        }
    }
}

impl<F, Fut> Tool for FnTool<F>
where
    F: Fn(Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, Error>> + Send + 'static,
{
    type Input = Map<String, Value>;
    type Output = Value;

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, Error>> + Send + 'static {
        (self.f)(input)
    }
}
