//! In-memory light registry
//!
//! Mock smart lights held in process memory. Records are addressed by `id`
//! and mutated in place; nothing is persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Highest accepted brightness value
pub const MAX_BRIGHTNESS: u8 = 100;

/// Addressable state of a single light
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightRecord {
    pub id: u32,
    pub name: String,
    pub is_on: Option<bool>,
    pub brightness: Option<u8>,
    /// Color as six hex digits, without a leading `#`
    pub hex: Option<String>,
}

impl LightRecord {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            is_on: None,
            brightness: None,
            hex: None,
        }
    }

    pub fn with_on(mut self, is_on: bool) -> Self {
        self.is_on = Some(is_on);
        self
    }

    pub fn with_brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn with_hex(mut self, hex: impl Into<String>) -> Self {
        self.hex = Some(hex.into());
        self
    }
}

/// Partial update targeting one light.
///
/// Fields left as `None` keep the stored value. `name` cannot be changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightUpdate {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brightness: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,
}

impl LightUpdate {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn is_on(mut self, is_on: bool) -> Self {
        self.is_on = Some(is_on);
        self
    }

    pub fn brightness(mut self, brightness: u8) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn hex(mut self, hex: impl Into<String>) -> Self {
        self.hex = Some(hex.into());
        self
    }

    /// Check value ranges for fields coming from an untrusted caller
    pub fn validate(&self) -> Result<(), LightUpdateError> {
        if let Some(brightness) = self.brightness {
            if brightness > MAX_BRIGHTNESS {
                return Err(LightUpdateError::BrightnessOutOfRange(brightness));
            }
        }
        if let Some(hex) = &self.hex {
            if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(LightUpdateError::InvalidHex(hex.clone()));
            }
        }
        Ok(())
    }

    fn apply_to(self, record: &mut LightRecord) {
        if let Some(is_on) = self.is_on {
            record.is_on = Some(is_on);
        }
        if let Some(brightness) = self.brightness {
            record.brightness = Some(brightness);
        }
        if let Some(hex) = self.hex {
            record.hex = Some(hex);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LightUpdateError {
    #[error("brightness must be between 0 and 100, got {0}")]
    BrightnessOutOfRange(u8),
    #[error("hex color must be six hex digits, got {0:?}")]
    InvalidHex(String),
}

/// Read and update access to a set of lights.
///
/// Plugins talk to lights through this trait so the backing store can be
/// swapped without touching the agent-facing functions.
pub trait LightStore {
    /// All lights in registration order
    fn list_lights(&self) -> &[LightRecord];

    /// Apply a partial update to the light with `update.id`.
    ///
    /// Returns the updated record, or `None` if no light has that id, in which
    /// case nothing is modified.
    fn apply_update(&mut self, update: LightUpdate) -> Option<LightRecord>;
}

/// Ordered in-memory light registry
#[derive(Debug, Clone, Default)]
pub struct LightRegistry {
    lights: Vec<LightRecord>,
}

impl LightRegistry {
    pub fn new(lights: Vec<LightRecord>) -> Self {
        Self { lights }
    }

    /// Registry seeded with the three demo lights
    pub fn demo() -> Self {
        Self::new(demo_lights())
    }

    pub fn get(&self, id: u32) -> Option<&LightRecord> {
        self.lights.iter().find(|light| light.id == id)
    }

    pub fn len(&self) -> usize {
        self.lights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }
}

impl LightStore for LightRegistry {
    fn list_lights(&self) -> &[LightRecord] {
        &self.lights
    }

    fn apply_update(&mut self, update: LightUpdate) -> Option<LightRecord> {
        let light = self.lights.iter_mut().find(|light| light.id == update.id)?;
        update.apply_to(light);
        tracing::debug!("Updated light {}: {:?}", light.id, light);
        Some(light.clone())
    }
}

/// The lights every demo starts with
pub fn demo_lights() -> Vec<LightRecord> {
    vec![
        LightRecord::new(1, "Table Lamp")
            .with_on(false)
            .with_brightness(100)
            .with_hex("FF0000"),
        LightRecord::new(2, "Porch light")
            .with_on(false)
            .with_brightness(50)
            .with_hex("00FF00"),
        LightRecord::new(3, "Chandelier")
            .with_on(true)
            .with_brightness(75)
            .with_hex("0000FF"),
    ]
}
