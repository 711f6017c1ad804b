//! Renderer Settings
//!
//! Configuration consumed at load time and per frame. Changing sizes after
//! `load()` requires reloading the affected stage.

/// Tone-mapping and output adjustment parameters applied after shading:
/// Reinhard, gamma encode, then brightness/contrast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneMapping {
    pub exposure: f32,
    pub gamma: f32,
    pub brightness: f32,
    pub contrast: f32,
}

impl Default for ToneMapping {
    fn default() -> Self {
        Self {
            exposure: 1.0,
            gamma: 2.2,
            brightness: 0.0,
            contrast: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    /// Shadow depth map resolution (square).
    pub shadow_map_size: u32,
    /// Raw environment cubemap face size.
    pub environment_map_size: u32,
    /// Prefiltered specular cubemap face size.
    pub specular_map_size: u32,
    /// Diffuse irradiance cubemap face size.
    pub irradiance_map_size: u32,
    /// Upper bound of the per-light-count program variant cache.
    pub max_lights: usize,
    pub tone_mapping: ToneMapping,
    /// Maximum pointer travel (px) for a press/release pair to count as a
    /// pick rather than a camera drag.
    pub pick_click_tolerance: f32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadow_map_size: 1024,
            environment_map_size: 512,
            specular_map_size: 128,
            irradiance_map_size: 32,
            max_lights: 8,
            tone_mapping: ToneMapping::default(),
            pick_click_tolerance: 2.0,
        }
    }
}
