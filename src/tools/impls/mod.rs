mod lights;
mod switch;

pub use lights::{LightsPlugin, LIGHTS_PLUGIN_NAME};
pub use switch::{SwitchPlugin, SWITCH_PLUGIN_NAME};
