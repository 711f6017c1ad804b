//! Environment
//!
//! IBL configuration of a scene: the bake source (equirectangular sky image
//! or flat color), the three derived cubemaps produced by the baker, and the
//! `updated` flag. The environment must be (re)baked before being sampled
//! whenever its source changes; the owning scene pass checks the flag once
//! per frame.

use std::rc::Rc;

use glam::Vec3;

use crate::gpu::TextureHandle;
use crate::resources::material::TextureRef;

/// What the raw environment cubemap is baked from.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvSource {
    FlatColor(Vec3),
    Equirect(TextureRef),
}

impl Default for EnvSource {
    fn default() -> Self {
        EnvSource::FlatColor(Vec3::splat(0.05))
    }
}

#[derive(Debug)]
pub struct Environment {
    pub source: EnvSource,
    pub intensity: f32,
    pub ambient_color: Vec3,

    /// Set by the baker after all faces of all three maps were rendered;
    /// cleared whenever the source changes.
    pub updated: bool,

    /// Raw baked environment cubemap.
    pub environment_map: Option<Rc<dyn TextureHandle>>,
    /// GGX-prefiltered specular cubemap.
    pub specular_map: Option<Rc<dyn TextureHandle>>,
    /// Cosine-convolved diffuse irradiance cubemap.
    pub irradiance_map: Option<Rc<dyn TextureHandle>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            source: EnvSource::default(),
            intensity: 1.0,
            ambient_color: Vec3::ZERO,
            updated: false,
            environment_map: None,
            specular_map: None,
            irradiance_map: None,
        }
    }

    /// Swaps the bake source and invalidates the baked maps.
    pub fn set_source(&mut self, source: EnvSource) {
        if self.source != source {
            self.source = source;
            self.updated = false;
        }
    }

    /// True when the baked maps are stale relative to the source.
    #[must_use]
    pub fn needs_bake(&self) -> bool {
        !self.updated
    }

    /// True once all three cubemaps exist and are current.
    #[must_use]
    pub fn ready(&self) -> bool {
        self.updated
            && self.environment_map.is_some()
            && self.specular_map.is_some()
            && self.irradiance_map.is_some()
    }
}
