//! Plugin contract
//!
//! A plugin is a named group of functions an LLM can call. Each function is
//! described by a [`FunctionSpec`] and invoked with JSON arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Description of one callable function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSpec {
    pub name: String,
    pub description: String,
    /// JSON schema of the arguments object, `None` for zero-argument functions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A named group of callable functions
pub trait Plugin: Send {
    /// Plugin name, used as the prefix of qualified function names
    fn name(&self) -> &str;

    /// Functions this plugin exposes
    fn functions(&self) -> Vec<FunctionSpec>;

    /// Invoke `function` with JSON `args`
    fn invoke(&mut self, function: &str, args: Value) -> Result<Value, PluginError>;
}

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    #[error("invalid arguments for {function}: {message}")]
    InvalidArguments { function: String, message: String },
}

impl PluginError {
    pub fn invalid_arguments(function: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.to_string(),
        }
    }
}
