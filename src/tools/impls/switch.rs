//! On/off actions exposed to the chat model
//!
//! These only acknowledge the request; no device is touched.

use serde_json::{json, Value};

use crate::tools::plugin::{FunctionSpec, Plugin, PluginError};

const TURN_ON: &str = "turn_on";
const TURN_OFF: &str = "turn_off";

/// Default plugin name
pub const SWITCH_PLUGIN_NAME: &str = "Lights";

pub struct SwitchPlugin {
    name: String,
}

impl SwitchPlugin {
    pub fn new() -> Self {
        Self {
            name: SWITCH_PLUGIN_NAME.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn turn_on(&self) -> &'static str {
        "Lights turned on."
    }

    pub fn turn_off(&self) -> &'static str {
        "Lights turned off."
    }
}

impl Default for SwitchPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SwitchPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn functions(&self) -> Vec<FunctionSpec> {
        vec![
            FunctionSpec::new(TURN_ON, "Turns the lights on."),
            FunctionSpec::new(TURN_OFF, "Turns the lights off."),
        ]
    }

    // Arguments are ignored; both actions take none.
    fn invoke(&mut self, function: &str, _args: Value) -> Result<Value, PluginError> {
        match function {
            TURN_ON => Ok(json!(self.turn_on())),
            TURN_OFF => Ok(json!(self.turn_off())),
            other => Err(PluginError::UnknownFunction(other.to_string())),
        }
    }
}
