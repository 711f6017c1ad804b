//! GPU Binding Abstraction
//!
//! The orchestration core never talks to a concrete graphics API. Every GPU
//! interaction goes through the object-safe traits in this module: a
//! [`RenderDevice`] acts as factory for pipelines, programs, textures and
//! render targets, and as the single sequential command stream that draw
//! calls are issued into.
//!
//! Descriptor structs reuse `wgpu`'s state vocabulary (`Face`, `BlendState`,
//! `CompareFunction`, `PrimitiveTopology`, `TextureFormat`) as plain data;
//! no device or surface is ever created here.
//!
//! All handles are single-owner `Rc`s bound to the device that created them.
//! The execution model is strictly single-threaded per frame.

use std::borrow::Cow;
use std::fmt::Debug;
use std::rc::Rc;

use glam::{Mat4, Vec4};

use crate::errors::Result;
use crate::resources::geometry::PolyList;
use crate::resources::material::Material;

// ============================================================================
// Descriptors
// ============================================================================

/// Fixed-function state for one pipeline variant.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDescriptor {
    pub label: Cow<'static, str>,
    pub topology: wgpu::PrimitiveTopology,
    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,
    pub blend: Option<wgpu::BlendState>,
    pub depth_write: bool,
    pub depth_compare: wgpu::CompareFunction,
}

impl Default for PipelineDescriptor {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("Pipeline"),
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
            blend: None,
            depth_write: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
        }
    }
}

/// Shader program request. Compilation and linking happen inside the binding
/// layer, possibly asynchronously; [`ProgramHandle::is_ready`] reports
/// completion.
#[derive(Debug, Clone, Default)]
pub struct ProgramDescriptor {
    pub name: Cow<'static, str>,
    /// Preprocessor-style defines baked into the variant.
    pub defines: Vec<(Cow<'static, str>, String)>,
    /// Number of light slots compiled into the program (0 for non-lit).
    pub light_slots: u32,
}

impl ProgramDescriptor {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_define(mut self, key: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        self.defines.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_light_slots(mut self, slots: u32) -> Self {
        self.light_slots = slots;
        self
    }
}

/// Offscreen render target request. `cube` targets carry six layers and are
/// rendered one face at a time through [`PassDescriptor::cube_face`].
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    pub label: Cow<'static, str>,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
    pub depth: bool,
    pub cube: bool,
}

impl Default for RenderTargetDescriptor {
    fn default() -> Self {
        Self {
            label: Cow::Borrowed("RenderTarget"),
            width: 1,
            height: 1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            depth: true,
            cube: false,
        }
    }
}

/// One render pass. `target: None` addresses the canvas backbuffer.
#[derive(Clone)]
pub struct PassDescriptor<'a> {
    pub label: &'a str,
    pub target: Option<&'a Rc<dyn RenderTargetHandle>>,
    /// Cube face index (0..6) when the target is a cube target.
    pub cube_face: Option<u32>,
    pub clear_color: Option<Vec4>,
    pub clear_depth: Option<f32>,
}

impl<'a> PassDescriptor<'a> {
    #[must_use]
    pub fn backbuffer(label: &'a str, clear_color: Option<Vec4>) -> Self {
        Self {
            label,
            target: None,
            cube_face: None,
            clear_color,
            clear_depth: Some(1.0),
        }
    }

    #[must_use]
    pub fn offscreen(label: &'a str, target: &'a Rc<dyn RenderTargetHandle>) -> Self {
        Self {
            label,
            target: Some(target),
            cube_face: None,
            clear_color: Some(Vec4::ZERO),
            clear_depth: Some(1.0),
        }
    }
}

// ============================================================================
// Per-draw bindings
// ============================================================================

/// Shadow data bound for the single designated shadow-casting light.
#[derive(Clone)]
pub struct ShadowBinding<'a> {
    pub map: &'a Rc<dyn TextureHandle>,
    /// Light-space projection × view.
    pub matrix: Mat4,
    pub bias: f32,
    pub strength: f32,
}

/// Ambient / image-based-lighting textures for the shading stage.
#[derive(Clone, Default)]
pub struct AmbientBinding<'a> {
    pub irradiance: Option<&'a Rc<dyn TextureHandle>>,
    pub specular: Option<&'a Rc<dyn TextureHandle>>,
    pub environment: Option<&'a Rc<dyn TextureHandle>>,
    pub brdf_lut: Option<&'a Rc<dyn TextureHandle>>,
    pub intensity: f32,
}

/// A single draw issued into the device command stream.
///
/// This is the data contract between the queue/passes and the binding layer:
/// geometry and material stay CPU-side references, `lighting` is an already
/// packed uniform block, and the optional bindings cover the shadow, ambient
/// and picking sub-passes.
pub struct DrawCall<'a> {
    pub program: &'a Rc<dyn ProgramHandle>,
    pub pipeline: &'a Rc<dyn PipelineHandle>,
    pub geometry: &'a PolyList,
    pub material: Option<&'a Material>,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    /// Packed lighting/tone-mapping uniform block (bytemuck bytes).
    pub lighting: Option<&'a [u8]>,
    pub shadow: Option<ShadowBinding<'a>>,
    pub ambient: Option<AmbientBinding<'a>>,
    /// Bake source texture (equirectangular sky) for environment passes.
    pub source_texture: Option<&'a Rc<dyn TextureHandle>>,
    /// Color-coded object id for the picking pass.
    pub pick_id: Option<u32>,
}

// ============================================================================
// Handles
// ============================================================================

/// A texture owned by the binding layer.
pub trait TextureHandle: Debug {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn format(&self) -> wgpu::TextureFormat;
}

/// An immutable pipeline state object.
pub trait PipelineHandle: Debug {
    fn descriptor(&self) -> &PipelineDescriptor;
}

/// A linked shader program. Linking may complete asynchronously; callers must
/// check [`is_ready`](Self::is_ready) before drawing, since drawing through
/// an unready program is a guard error in the device.
pub trait ProgramHandle: Debug {
    fn name(&self) -> &str;
    fn is_ready(&self) -> bool;
    fn light_slots(&self) -> u32;
}

/// An offscreen render target with an optional depth attachment.
pub trait RenderTargetHandle: Debug {
    fn descriptor(&self) -> &RenderTargetDescriptor;
    fn color_texture(&self) -> Option<Rc<dyn TextureHandle>>;
    fn depth_texture(&self) -> Option<Rc<dyn TextureHandle>>;
}

// ============================================================================
// Device
// ============================================================================

/// Factory and command stream of the GPU binding layer.
///
/// Drawing is strictly sequential: `begin_pass` / `draw`* / `end_pass`, one
/// pass at a time, one command stream per device. Sub-pass ordering (shadow
/// and environment bakes before the main pass) is the caller's
/// responsibility.
pub trait RenderDevice {
    fn create_pipeline(&mut self, desc: PipelineDescriptor) -> Rc<dyn PipelineHandle>;

    fn create_program(&mut self, desc: ProgramDescriptor) -> Result<Rc<dyn ProgramHandle>>;

    fn create_render_target(
        &mut self,
        desc: RenderTargetDescriptor,
    ) -> Result<Rc<dyn RenderTargetHandle>>;

    /// Uploads a texture from raw RGBA8 pixels (or allocates uninitialized
    /// storage when `pixels` is `None`).
    fn create_texture(
        &mut self,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        pixels: Option<&[u8]>,
    ) -> Result<Rc<dyn TextureHandle>>;

    fn begin_pass(&mut self, desc: &PassDescriptor<'_>) -> Result<()>;

    /// Issues one draw. Errors with [`LumenError::ResourceNotReady`] when the
    /// program has not finished linking.
    ///
    /// [`LumenError::ResourceNotReady`]: crate::errors::LumenError::ResourceNotReady
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    fn end_pass(&mut self);

    /// Reads back a single pixel from an offscreen color target.
    fn read_pixel(
        &mut self,
        target: &Rc<dyn RenderTargetHandle>,
        x: u32,
        y: u32,
    ) -> Result<[u8; 4]>;

    /// Current backbuffer size in physical pixels.
    fn surface_size(&self) -> (u32, u32);
}
