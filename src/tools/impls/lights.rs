//! Light registry plugin
//!
//! Exposes `get_lights` and `change_state` over any [`LightStore`].

use serde_json::{json, Value};

use crate::lights::{LightRegistry, LightStore, LightUpdate, MAX_BRIGHTNESS};
use crate::tools::plugin::{FunctionSpec, Plugin, PluginError};
use crate::tools::schema::{
    boolean_prop, bounded_integer_prop, integer_prop, object_schema, string_prop,
};

const GET_LIGHTS: &str = "get_lights";
const CHANGE_STATE: &str = "change_state";

/// Default plugin name
pub const LIGHTS_PLUGIN_NAME: &str = "LightsPlugin";

/// Plugin giving an agent read and write access to lights
pub struct LightsPlugin<S = LightRegistry> {
    name: String,
    store: S,
}

impl<S: LightStore> LightsPlugin<S> {
    pub fn new(store: S) -> Self {
        Self {
            name: LIGHTS_PLUGIN_NAME.to_string(),
            store,
        }
    }

    /// Register under a different plugin name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn get_lights(&self) -> Value {
        json!(self.store.list_lights())
    }

    fn change_state(&mut self, args: Value) -> Result<Value, PluginError> {
        let update: LightUpdate = serde_json::from_value(args)
            .map_err(|e| PluginError::invalid_arguments(CHANGE_STATE, e))?;
        update
            .validate()
            .map_err(|e| PluginError::invalid_arguments(CHANGE_STATE, e))?;

        let id = update.id;
        match self.store.apply_update(update) {
            Some(record) => Ok(json!(record)),
            None => {
                tracing::debug!("change_state: light {} not found", id);
                Ok(Value::Null)
            }
        }
    }
}

impl<S: LightStore + Send> Plugin for LightsPlugin<S> {
    fn name(&self) -> &str {
        &self.name
    }

    fn functions(&self) -> Vec<FunctionSpec> {
        vec![
            FunctionSpec::new(
                GET_LIGHTS,
                "Gets a list of lights and their current state.",
            ),
            FunctionSpec::new(
                CHANGE_STATE,
                "Changes the state of the light. Returns the updated light, \
                 or null if the light does not exist.",
            )
            .with_parameters(
                object_schema()
                    .property("id", integer_prop("Id of the light to change"), true)
                    .property("is_on", boolean_prop("Whether the light is on"), false)
                    .property(
                        "brightness",
                        bounded_integer_prop("Brightness level", 0, MAX_BRIGHTNESS.into()),
                        false,
                    )
                    .property(
                        "hex",
                        string_prop("Color as six hex digits, e.g. FF0000"),
                        false,
                    )
                    .build(),
            ),
        ]
    }

    fn invoke(&mut self, function: &str, args: Value) -> Result<Value, PluginError> {
        match function {
            GET_LIGHTS => Ok(self.get_lights()),
            CHANGE_STATE => self.change_state(args),
            other => Err(PluginError::UnknownFunction(other.to_string())),
        }
    }
}

impl Default for LightsPlugin<LightRegistry> {
    fn default() -> Self {
        Self::new(LightRegistry::demo())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::LightRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_get_lights_returns_all_in_order() {
        let mut plugin = LightsPlugin::new(LightRegistry::demo());
        let lights = plugin.invoke("get_lights", json!({})).unwrap();

        assert_eq!(lights.as_array().map(|a| a.len()), Some(3));
        assert_eq!(lights[0]["name"], "Table Lamp");
        assert_eq!(lights[1]["brightness"], 50);
        assert_eq!(lights[2]["hex"], "0000FF");
    }

    #[test]
    fn test_change_state_returns_updated_record() {
        let mut plugin = LightsPlugin::new(LightRegistry::new(vec![LightRecord::new(1, "Table Lamp")
            .with_on(false)
            .with_brightness(100)
            .with_hex("FF0000")]));

        let result = plugin
            .invoke("change_state", json!({"id": 1, "is_on": true}))
            .unwrap();

        assert_eq!(
            result,
            json!({
                "id": 1,
                "name": "Table Lamp",
                "is_on": true,
                "brightness": 100,
                "hex": "FF0000"
            })
        );
    }

    #[test]
    fn test_change_state_unknown_id_returns_null() {
        let mut plugin = LightsPlugin::new(LightRegistry::demo());
        let before = plugin.store().list_lights().to_vec();

        let result = plugin
            .invoke("change_state", json!({"id": 99, "is_on": true}))
            .unwrap();

        assert_eq!(result, Value::Null);
        assert_eq!(plugin.store().list_lights(), before.as_slice());
    }

    #[test]
    fn test_change_state_rejects_bad_args() {
        let mut plugin = LightsPlugin::new(LightRegistry::demo());

        let missing_id = plugin.invoke("change_state", json!({"is_on": true}));
        assert!(matches!(missing_id, Err(PluginError::InvalidArguments { .. })));

        let too_bright = plugin.invoke("change_state", json!({"id": 1, "brightness": 150}));
        assert!(matches!(too_bright, Err(PluginError::InvalidArguments { .. })));

        let bad_hex = plugin.invoke("change_state", json!({"id": 1, "hex": "red"}));
        assert!(matches!(bad_hex, Err(PluginError::InvalidArguments { .. })));

        // Rejected updates must not leak into the store
        assert_eq!(plugin.store().get(1).and_then(|l| l.brightness), Some(100));
    }

    #[test]
    fn test_function_specs() {
        let plugin = LightsPlugin::new(LightRegistry::demo()).with_name("Home");
        assert_eq!(plugin.name(), "Home");

        let specs = plugin.functions();
        assert_eq!(specs[0].name, "get_lights");
        assert!(specs[0].parameters.is_none());
        assert_eq!(specs[1].name, "change_state");
        assert_eq!(
            specs[1].parameters.as_ref().unwrap()["required"],
            json!(["id"])
        );
    }
}
