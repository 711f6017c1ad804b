//! PBR Shading Orchestration
//!
//! CPU side of the forward PBR pass: packs the per-frame lights and
//! tone-mapping parameters into one POD uniform block, and maintains the
//! per-light-count program variant cache. Shader variants are compiled with
//! the light slot count baked in as a define, so a scene with N lights uses
//! the N-slot variant; the cache is bounded by `RendererSettings::max_lights`.

use std::rc::Rc;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rustc_hash::FxHashMap;

use crate::errors::{LumenError, Result};
use crate::gpu::{ProgramDescriptor, ProgramHandle, RenderDevice};
use crate::render::queue::FrameLight;
use crate::render::settings::ToneMapping;
use crate::scene::{LightType, Scene};

/// One light as the shader sees it. `position.w` carries the type tag
/// (0 directional, 1 point, 2 spot).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 4],
    /// World-space direction the light shines in; w unused.
    pub direction: [f32; 4],
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// cos(spot_cutoff), spot_exponent, cutoff_distance, intensity.
    pub params: [f32; 4],
}

/// Fixed-size header preceding the light array in the uniform block.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightingHeader {
    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub exposure: f32,
    pub gamma: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub light_count: u32,
    pub _pad: [u32; 3],
}

/// Packed lighting/tone-mapping uniform block for one frame.
pub struct LightingBlock {
    bytes: Vec<u8>,
    light_count: u32,
}

impl LightingBlock {
    /// Packs the frame's enabled lights and tone parameters. Disabled lights
    /// are dropped, not zero-filled.
    #[must_use]
    pub fn pack(
        scene: &Scene,
        frame_lights: &[FrameLight],
        tone: &ToneMapping,
        ambient_intensity: f32,
    ) -> Self {
        let mut lights = Vec::with_capacity(frame_lights.len());
        for frame in frame_lights {
            let Some(light) = scene.lights.get(frame.light) else {
                continue;
            };
            if !light.enabled() {
                continue;
            }

            let tag = match light.kind {
                LightType::Directional => 0.0,
                LightType::Point => 1.0,
                LightType::Spot => 2.0,
                LightType::Disabled => continue,
            };
            let position: Vec3 = frame.world.translation.into();
            let direction = frame
                .world
                .transform_vector3(-Vec3::Z)
                .normalize_or(-Vec3::Z);

            lights.push(GpuLight {
                position: [position.x, position.y, position.z, tag],
                direction: [direction.x, direction.y, direction.z, 0.0],
                ambient: light.ambient.extend(1.0).to_array(),
                diffuse: light.diffuse.extend(1.0).to_array(),
                specular: light.specular.extend(1.0).to_array(),
                params: [
                    light.spot_cutoff.cos(),
                    light.spot_exponent,
                    light.cutoff_distance,
                    light.intensity,
                ],
            });
        }

        let header = LightingHeader {
            ambient_color: scene.environment.ambient_color.to_array(),
            ambient_intensity,
            exposure: tone.exposure,
            gamma: tone.gamma,
            brightness: tone.brightness,
            contrast: tone.contrast,
            light_count: lights.len() as u32,
            _pad: [0; 3],
        };

        let mut bytes = Vec::with_capacity(
            size_of::<LightingHeader>() + lights.len() * size_of::<GpuLight>(),
        );
        bytes.extend_from_slice(bytemuck::bytes_of(&header));
        bytes.extend_from_slice(bytemuck::cast_slice(&lights));

        Self {
            bytes,
            light_count: header.light_count,
        }
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn light_count(&self) -> u32 {
        self.light_count
    }
}

/// Per-light-count PBR program variant cache.
pub struct PbrPrograms {
    variants: FxHashMap<u32, Rc<dyn ProgramHandle>>,
    max_lights: usize,
}

impl PbrPrograms {
    #[must_use]
    pub fn new(max_lights: usize) -> Self {
        Self {
            variants: FxHashMap::default(),
            max_lights,
        }
    }

    /// Program variant compiled for exactly `light_count` slots, creating it
    /// on first use.
    pub fn program_for(
        &mut self,
        device: &mut dyn RenderDevice,
        light_count: u32,
    ) -> Result<Rc<dyn ProgramHandle>> {
        if light_count as usize > self.max_lights {
            return Err(LumenError::TooManyLights {
                requested: light_count as usize,
                max: self.max_lights,
            });
        }
        if let Some(program) = self.variants.get(&light_count) {
            return Ok(Rc::clone(program));
        }

        let program = device.create_program(
            ProgramDescriptor::new("PbrForward")
                .with_define("LIGHT_COUNT", light_count.to_string())
                .with_light_slots(light_count),
        )?;
        self.variants.insert(light_count, Rc::clone(&program));
        Ok(program)
    }

    #[must_use]
    pub fn variant_count(&self) -> usize {
        self.variants.len()
    }
}
