//! Plugin registry and function dispatch
//!
//! The [`Kernel`] owns a set of plugins and routes qualified function names
//! (`"<Plugin>-<function>"`) to them.

mod impls;
mod plugin;
pub mod schema;

use serde_json::Value;
use thiserror::Error;

pub use impls::{LightsPlugin, SwitchPlugin, LIGHTS_PLUGIN_NAME, SWITCH_PLUGIN_NAME};
pub use plugin::{FunctionSpec, Plugin, PluginError};

/// Separator between plugin and function in a qualified name
pub const NAME_SEPARATOR: char = '-';

/// Build the qualified name of a plugin function
pub fn qualified_name(plugin: &str, function: &str) -> String {
    format!("{}{}{}", plugin, NAME_SEPARATOR, function)
}

#[derive(Debug, Error)]
pub enum KernelError {
    #[error("plugin already registered: {0}")]
    DuplicatePlugin(String),

    #[error("invalid plugin name {0:?} (must be non-empty and contain no '-')")]
    InvalidPluginName(String),

    #[error("plugin not found: {0}")]
    PluginNotFound(String),

    #[error("invalid function name {0:?} (expected \"<plugin>-<function>\")")]
    InvalidFunctionName(String),

    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Registry of plugins available to an agent
#[derive(Default)]
pub struct Kernel {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. Plugin names must be unique and free of
    /// [`NAME_SEPARATOR`].
    pub fn add_plugin(&mut self, plugin: Box<dyn Plugin>) -> Result<(), KernelError> {
        if plugin.name().is_empty() || plugin.name().contains(NAME_SEPARATOR) {
            return Err(KernelError::InvalidPluginName(plugin.name().to_string()));
        }
        if self.plugins.iter().any(|p| p.name() == plugin.name()) {
            return Err(KernelError::DuplicatePlugin(plugin.name().to_string()));
        }
        tracing::debug!(
            "Registered plugin {} ({} functions)",
            plugin.name(),
            plugin.functions().len()
        );
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn plugin_names(&self) -> impl Iterator<Item = &str> {
        self.plugins.iter().map(|p| p.name())
    }

    /// All functions across plugins, with qualified names, in registration order
    pub fn function_specs(&self) -> Vec<FunctionSpec> {
        self.plugins
            .iter()
            .flat_map(|plugin| {
                plugin.functions().into_iter().map(move |spec| FunctionSpec {
                    name: qualified_name(plugin.name(), &spec.name),
                    ..spec
                })
            })
            .collect()
    }

    /// Invoke a function by qualified name
    pub fn invoke(&mut self, name: &str, args: Value) -> Result<Value, KernelError> {
        let (plugin_name, function) = name
            .split_once(NAME_SEPARATOR)
            .filter(|(p, f)| !p.is_empty() && !f.is_empty())
            .ok_or_else(|| KernelError::InvalidFunctionName(name.to_string()))?;

        let plugin = self
            .plugins
            .iter_mut()
            .find(|p| p.name() == plugin_name)
            .ok_or_else(|| KernelError::PluginNotFound(plugin_name.to_string()))?;

        tracing::debug!("Invoking {} args={}", name, args);
        Ok(plugin.invoke(function, args)?)
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
