//! Environment / IBL Baker
//!
//! Produces the three cubemaps the shading stage samples for image-based
//! lighting: the raw environment (a sky sphere sampling an equirectangular
//! image or flat color), a GGX-prefiltered specular map and a
//! cosine-convolved diffuse irradiance map. Each map is rendered face by
//! face through the shared per-face view matrices.
//!
//! Baking is pull-based: `update_maps` runs when the owning frame loop sees
//! `Environment::needs_bake`, and any source change clears the flag again.

use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::errors::{LumenError, Result};
use crate::gpu::{
    DrawCall, PassDescriptor, PipelineDescriptor, PipelineHandle, ProgramDescriptor,
    ProgramHandle, RenderDevice, RenderTargetDescriptor, RenderTargetHandle, TextureHandle,
};
use crate::render::settings::RendererSettings;
use crate::resources::primitives;
use crate::resources::PolyList;
use crate::scene::{EnvSource, Environment};

/// GGX importance samples per texel of the specular prefilter.
const SPECULAR_SAMPLE_COUNT: u32 = 1024;
/// Fixed roughness the single specular mip is prefiltered at.
const SPECULAR_ROUGHNESS: f32 = 0.4;
/// Angular step (radians) of the irradiance hemisphere integration.
const IRRADIANCE_SAMPLE_DELTA: f32 = 0.025;
/// Side length of the square split-sum BRDF lookup texture.
const BRDF_LUT_SIZE: u32 = 512;

/// View matrices for the six cube faces (+X, -X, +Y, -Y, +Z, -Z), all
/// looking out from the origin.
#[must_use]
pub fn cube_face_views() -> [Mat4; 6] {
    [
        Mat4::look_to_rh(Vec3::ZERO, Vec3::X, Vec3::NEG_Y),
        Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_X, Vec3::NEG_Y),
        Mat4::look_to_rh(Vec3::ZERO, Vec3::Y, Vec3::Z),
        Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Y, Vec3::NEG_Z),
        Mat4::look_to_rh(Vec3::ZERO, Vec3::Z, Vec3::NEG_Y),
        Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::NEG_Y),
    ]
}

/// 90-degree projection shared by all cube-face passes.
#[must_use]
pub fn cube_face_projection() -> Mat4 {
    Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 10.0)
}

/// Bakes the environment, specular and irradiance cubemaps.
#[derive(Default)]
pub struct EnvironmentBaker {
    environment_target: Option<Rc<dyn RenderTargetHandle>>,
    specular_target: Option<Rc<dyn RenderTargetHandle>>,
    irradiance_target: Option<Rc<dyn RenderTargetHandle>>,

    sky_program: Option<Rc<dyn ProgramHandle>>,
    specular_program: Option<Rc<dyn ProgramHandle>>,
    irradiance_program: Option<Rc<dyn ProgramHandle>>,
    bake_pipeline: Option<Rc<dyn PipelineHandle>>,

    /// Inward-facing sphere sampling the equirectangular source.
    sky_sphere: Option<PolyList>,
    /// Inward-facing cube sampling an already baked cubemap.
    sky_cube: Option<PolyList>,

    source_texture: Option<Rc<dyn TextureHandle>>,

    brdf_program: Option<Rc<dyn ProgramHandle>>,
    brdf_target: Option<Rc<dyn RenderTargetHandle>>,
    brdf_quad: Option<PolyList>,
    brdf_baked: bool,
}

impl EnvironmentBaker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the three cube targets, compiles the bake programs and
    /// builds the sampling geometry.
    pub fn load(&mut self, device: &mut dyn RenderDevice, settings: &RendererSettings) -> Result<()> {
        let cube_target = |label: &'static str, size: u32| RenderTargetDescriptor {
            label: label.into(),
            width: size,
            height: size,
            format: wgpu::TextureFormat::Rgba16Float,
            depth: false,
            cube: true,
        };
        self.environment_target = Some(
            device.create_render_target(cube_target("EnvironmentMap", settings.environment_map_size))?,
        );
        self.specular_target =
            Some(device.create_render_target(cube_target("SpecularMap", settings.specular_map_size))?);
        self.irradiance_target = Some(
            device.create_render_target(cube_target("IrradianceMap", settings.irradiance_map_size))?,
        );

        self.sky_program = Some(device.create_program(ProgramDescriptor::new("SkyBake"))?);
        self.specular_program = Some(
            device.create_program(
                ProgramDescriptor::new("SpecularConvolve")
                    .with_define("SAMPLE_COUNT", SPECULAR_SAMPLE_COUNT.to_string())
                    .with_define("ROUGHNESS", SPECULAR_ROUGHNESS.to_string()),
            )?,
        );
        self.irradiance_program = Some(
            device.create_program(
                ProgramDescriptor::new("IrradianceConvolve")
                    .with_define("SAMPLE_DELTA", IRRADIANCE_SAMPLE_DELTA.to_string()),
            )?,
        );

        // Faces are seen from inside; no depth attachment on the targets.
        self.bake_pipeline = Some(device.create_pipeline(PipelineDescriptor {
            label: "EnvironmentBake".into(),
            cull_mode: None,
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
            ..Default::default()
        }));

        let mut sphere = primitives::uv_sphere(1.0, 32, 16);
        sphere.cull_mode = None;
        self.sky_sphere = Some(sphere);
        let mut cube = primitives::cube(2.0);
        cube.cull_mode = None;
        self.sky_cube = Some(cube);

        // Split-sum BRDF lookup: scene-independent, baked once.
        self.brdf_program = Some(device.create_program(
            ProgramDescriptor::new("BrdfIntegrate")
                .with_define("SAMPLE_COUNT", SPECULAR_SAMPLE_COUNT.to_string()),
        )?);
        self.brdf_target = Some(device.create_render_target(RenderTargetDescriptor {
            label: "BrdfLut".into(),
            width: BRDF_LUT_SIZE,
            height: BRDF_LUT_SIZE,
            format: wgpu::TextureFormat::Rg16Float,
            depth: false,
            cube: false,
        })?);
        let mut quad = primitives::quad(2.0, 2.0);
        quad.cull_mode = None;
        self.brdf_quad = Some(quad);

        Ok(())
    }

    /// The split-sum BRDF integration texture, once baked.
    #[must_use]
    pub fn brdf_lut(&self) -> Option<Rc<dyn TextureHandle>> {
        if !self.brdf_baked {
            return None;
        }
        self.brdf_target.as_ref().and_then(|t| t.color_texture())
    }

    /// Swaps only the source texture and marks the baked maps stale.
    pub fn reload_image(
        &mut self,
        device: &mut dyn RenderDevice,
        environment: &mut Environment,
        name: &str,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<()> {
        self.source_texture = Some(device.create_texture(
            name,
            width,
            height,
            wgpu::TextureFormat::Rgba8UnormSrgb,
            Some(pixels),
        )?);
        environment.updated = false;
        Ok(())
    }

    /// Renders all six faces of all three cubemaps and publishes them onto
    /// the environment. Sets `Environment::updated`; callers re-invoke after
    /// any source change.
    pub fn update_maps(
        &mut self,
        device: &mut dyn RenderDevice,
        environment: &mut Environment,
    ) -> Result<()> {
        let environment_target = self
            .environment_target
            .clone()
            .ok_or(LumenError::NotLoaded("environment baker"))?;
        let specular_target = self
            .specular_target
            .clone()
            .ok_or(LumenError::NotLoaded("environment baker"))?;
        let irradiance_target = self
            .irradiance_target
            .clone()
            .ok_or(LumenError::NotLoaded("environment baker"))?;

        if let EnvSource::FlatColor(color) = environment.source {
            self.upload_flat_source(device, color)?;
        }
        let source = self
            .source_texture
            .clone()
            .ok_or(LumenError::NotLoaded("environment source image"))?;

        // Pass 1: raw environment from the equirect/flat source.
        self.bake_target(device, &environment_target, Bake::Sky, &source)?;
        let environment_map = environment_target
            .color_texture()
            .ok_or_else(|| LumenError::DeviceError("cube target has no color texture".into()))?;

        // Passes 2 and 3: convolutions sampling the baked cubemap.
        self.bake_target(device, &specular_target, Bake::Specular, &environment_map)?;
        self.bake_target(device, &irradiance_target, Bake::Irradiance, &environment_map)?;

        if !self.brdf_baked {
            self.bake_brdf_lut(device)?;
        }

        environment.environment_map = Some(environment_map);
        environment.specular_map = specular_target.color_texture();
        environment.irradiance_map = irradiance_target.color_texture();
        environment.updated = true;
        Ok(())
    }

    fn bake_brdf_lut(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        let program = self
            .brdf_program
            .as_ref()
            .ok_or(LumenError::NotLoaded("environment baker"))?;
        let target = self
            .brdf_target
            .as_ref()
            .ok_or(LumenError::NotLoaded("environment baker"))?;
        let quad = self
            .brdf_quad
            .as_ref()
            .ok_or(LumenError::NotLoaded("environment baker"))?;
        let pipeline = self
            .bake_pipeline
            .as_ref()
            .ok_or(LumenError::NotLoaded("environment baker"))?;
        if !program.is_ready() {
            return Err(LumenError::ResourceNotReady(program.name().to_string()));
        }

        device.begin_pass(&PassDescriptor {
            label: "BrdfIntegrate",
            target: Some(target),
            cube_face: None,
            clear_color: Some(glam::Vec4::ZERO),
            clear_depth: None,
        })?;
        device.draw(&DrawCall {
            program,
            pipeline,
            geometry: quad,
            material: None,
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            lighting: None,
            shadow: None,
            ambient: None,
            source_texture: None,
            pick_id: None,
        })?;
        device.end_pass();
        self.brdf_baked = true;
        Ok(())
    }

    fn upload_flat_source(&mut self, device: &mut dyn RenderDevice, color: Vec3) -> Result<()> {
        let pixel = [
            (color.x.clamp(0.0, 1.0) * 255.0) as u8,
            (color.y.clamp(0.0, 1.0) * 255.0) as u8,
            (color.z.clamp(0.0, 1.0) * 255.0) as u8,
            255,
        ];
        self.source_texture = Some(device.create_texture(
            "FlatEnvironment",
            1,
            1,
            wgpu::TextureFormat::Rgba8Unorm,
            Some(&pixel),
        )?);
        Ok(())
    }

    fn bake_target(
        &self,
        device: &mut dyn RenderDevice,
        target: &Rc<dyn RenderTargetHandle>,
        bake: Bake,
        source: &Rc<dyn TextureHandle>,
    ) -> Result<()> {
        let (program, geometry) = match bake {
            Bake::Sky => (self.sky_program.as_ref(), self.sky_sphere.as_ref()),
            Bake::Specular => (self.specular_program.as_ref(), self.sky_cube.as_ref()),
            Bake::Irradiance => (self.irradiance_program.as_ref(), self.sky_cube.as_ref()),
        };
        let program = program.ok_or(LumenError::NotLoaded("environment baker"))?;
        let geometry = geometry.ok_or(LumenError::NotLoaded("environment baker"))?;
        let pipeline = self
            .bake_pipeline
            .as_ref()
            .ok_or(LumenError::NotLoaded("environment baker"))?;

        if !program.is_ready() {
            return Err(LumenError::ResourceNotReady(program.name().to_string()));
        }

        let projection = cube_face_projection();
        for (face, view) in cube_face_views().iter().enumerate() {
            device.begin_pass(&PassDescriptor {
                label: "EnvironmentBakeFace",
                target: Some(target),
                cube_face: Some(face as u32),
                clear_color: Some(glam::Vec4::ZERO),
                clear_depth: None,
            })?;
            device.draw(&DrawCall {
                program,
                pipeline,
                geometry,
                material: None,
                model: Mat4::IDENTITY,
                view: *view,
                projection,
                lighting: None,
                shadow: None,
                ambient: None,
                source_texture: Some(source),
                pick_id: None,
            })?;
            device.end_pass();
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Bake {
    Sky,
    Specular,
    Irradiance,
}
