//! Light Component
//!
//! Type, colors, intensity, spot/point parameters and shadow configuration.
//! Serializes with enumerated string type tags (`kTypeDirectional`,
//! `kTypePoint`, `kTypeSpot`, `kTypeDisabled`) and defaulted absent fields.
//!
//! The shadow renderer binds a depth texture and light view/projection onto
//! the light each frame; those bindings are runtime-only (never serialized)
//! and are cleared when the light is enqueued for the next frame.

use std::rc::Rc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::gpu::TextureHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LightType {
    #[serde(rename = "kTypeDirectional")]
    #[default]
    Directional,
    #[serde(rename = "kTypePoint")]
    Point,
    #[serde(rename = "kTypeSpot")]
    Spot,
    #[serde(rename = "kTypeDisabled")]
    Disabled,
}

fn default_color() -> Vec3 {
    Vec3::ONE
}

fn default_intensity() -> f32 {
    1.0
}

fn default_spot_cutoff() -> f32 {
    45f32.to_radians()
}

fn default_spot_exponent() -> f32 {
    1.0
}

fn default_cutoff_distance() -> f32 {
    100.0
}

fn default_shadow_bias() -> f32 {
    0.005
}

fn default_shadow_strength() -> f32 {
    0.8
}

fn default_shadow_render_distance() -> f32 {
    20.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Light {
    #[serde(rename = "type", default)]
    pub kind: LightType,

    #[serde(default = "default_color")]
    pub ambient: Vec3,
    #[serde(default = "default_color")]
    pub diffuse: Vec3,
    #[serde(default = "default_color")]
    pub specular: Vec3,
    #[serde(default = "default_intensity")]
    pub intensity: f32,

    /// Spot cone half-angle in radians.
    #[serde(default = "default_spot_cutoff")]
    pub spot_cutoff: f32,
    #[serde(default = "default_spot_exponent")]
    pub spot_exponent: f32,
    /// Range beyond which point/spot contribution is cut.
    #[serde(default = "default_cutoff_distance")]
    pub cutoff_distance: f32,

    // === Shadow configuration ===
    #[serde(default)]
    pub cast_shadows: bool,
    #[serde(default = "default_shadow_bias")]
    pub shadow_bias: f32,
    /// Occlusion darkening factor in [0, 1].
    #[serde(default = "default_shadow_strength")]
    pub shadow_strength: f32,
    /// Distance from the camera focus point to the shadow render origin.
    #[serde(default = "default_shadow_render_distance")]
    pub shadow_render_distance: f32,

    // === Per-frame shadow bindings (set by the shadow renderer) ===
    #[serde(skip)]
    pub shadow_map: Option<Rc<dyn TextureHandle>>,
    #[serde(skip)]
    pub shadow_view: Option<Mat4>,
    #[serde(skip)]
    pub shadow_projection: Option<Mat4>,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            kind: LightType::Directional,
            ambient: default_color(),
            diffuse: default_color(),
            specular: default_color(),
            intensity: default_intensity(),
            spot_cutoff: default_spot_cutoff(),
            spot_exponent: default_spot_exponent(),
            cutoff_distance: default_cutoff_distance(),
            cast_shadows: false,
            shadow_bias: default_shadow_bias(),
            shadow_strength: default_shadow_strength(),
            shadow_render_distance: default_shadow_render_distance(),
            shadow_map: None,
            shadow_view: None,
            shadow_projection: None,
        }
    }
}

impl Light {
    #[must_use]
    pub fn new_directional(color: Vec3, intensity: f32) -> Self {
        Self {
            kind: LightType::Directional,
            diffuse: color,
            specular: color,
            intensity,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn new_point(color: Vec3, intensity: f32, cutoff_distance: f32) -> Self {
        Self {
            kind: LightType::Point,
            diffuse: color,
            specular: color,
            intensity,
            cutoff_distance,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn new_spot(color: Vec3, intensity: f32, cutoff: f32, exponent: f32) -> Self {
        Self {
            kind: LightType::Spot,
            diffuse: color,
            specular: color,
            intensity,
            spot_cutoff: cutoff,
            spot_exponent: exponent,
            ..Default::default()
        }
    }

    #[inline]
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.kind != LightType::Disabled
    }

    /// Drops the shadow bindings of the previous frame.
    pub fn clear_shadow_binding(&mut self) {
        self.shadow_map = None;
        self.shadow_view = None;
        self.shadow_projection = None;
    }

    /// True once the shadow renderer has bound this frame's depth data.
    #[must_use]
    pub fn has_shadow_binding(&self) -> bool {
        self.shadow_map.is_some() && self.shadow_view.is_some()
    }
}
