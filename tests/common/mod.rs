//! Shared test fixtures: an in-memory `RenderDevice` that records every
//! pass and draw, plus scene-building helpers.

#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use glam::Mat4;

use lumen::errors::{LumenError, Result};
use lumen::gpu::{
    DrawCall, PassDescriptor, PipelineDescriptor, PipelineHandle, ProgramDescriptor,
    ProgramHandle, RenderDevice, RenderTargetDescriptor, RenderTargetHandle, TextureHandle,
};
use lumen::resources::{Material, PolyList};
use lumen::scene::{Mesh, Scene};

#[derive(Debug)]
pub struct MockTexture {
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl TextureHandle for MockTexture {
    fn width(&self) -> u32 {
        self.width
    }
    fn height(&self) -> u32 {
        self.height
    }
    fn format(&self) -> wgpu::TextureFormat {
        self.format
    }
}

#[derive(Debug)]
pub struct MockPipeline {
    pub desc: PipelineDescriptor,
}

impl PipelineHandle for MockPipeline {
    fn descriptor(&self) -> &PipelineDescriptor {
        &self.desc
    }
}

#[derive(Debug)]
pub struct MockProgram {
    pub name: String,
    pub ready: bool,
    pub light_slots: u32,
}

impl ProgramHandle for MockProgram {
    fn name(&self) -> &str {
        &self.name
    }
    fn is_ready(&self) -> bool {
        self.ready
    }
    fn light_slots(&self) -> u32 {
        self.light_slots
    }
}

#[derive(Debug)]
pub struct MockTarget {
    pub desc: RenderTargetDescriptor,
    pub color: Option<Rc<MockTexture>>,
    pub depth: Option<Rc<MockTexture>>,
}

impl RenderTargetHandle for MockTarget {
    fn descriptor(&self) -> &RenderTargetDescriptor {
        &self.desc
    }
    fn color_texture(&self) -> Option<Rc<dyn TextureHandle>> {
        self.color.clone().map(|t| t as Rc<dyn TextureHandle>)
    }
    fn depth_texture(&self) -> Option<Rc<dyn TextureHandle>> {
        self.depth.clone().map(|t| t as Rc<dyn TextureHandle>)
    }
}

/// One recorded draw call.
#[derive(Debug, Clone)]
pub struct DrawRecord {
    pub pass: String,
    pub program: String,
    pub pipeline: String,
    pub cull: Option<wgpu::Face>,
    pub blend: Option<wgpu::BlendState>,
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub pick_id: Option<u32>,
    pub had_lighting: bool,
    pub had_shadow: bool,
    pub had_source_texture: bool,
}

/// In-memory device: records the command stream, answers pixel readbacks
/// from a scripted queue.
pub struct MockDevice {
    pub surface: (u32, u32),
    pub passes: Vec<String>,
    pub draws: Vec<DrawRecord>,
    pub scripted_pixels: VecDeque<[u8; 4]>,
    /// Program names that report `is_ready() == false`.
    pub unready_programs: HashSet<String>,
    current_pass: Option<String>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self {
            surface: (640, 480),
            passes: Vec::new(),
            draws: Vec::new(),
            scripted_pixels: VecDeque::new(),
            unready_programs: HashSet::new(),
            current_pass: None,
        }
    }

    pub fn script_pixel(&mut self, pixel: [u8; 4]) {
        self.scripted_pixels.push_back(pixel);
    }

    pub fn draws_in_pass(&self, pass: &str) -> Vec<&DrawRecord> {
        self.draws.iter().filter(|d| d.pass == pass).collect()
    }
}

impl RenderDevice for MockDevice {
    fn create_pipeline(&mut self, desc: PipelineDescriptor) -> Rc<dyn PipelineHandle> {
        Rc::new(MockPipeline { desc })
    }

    fn create_program(&mut self, desc: ProgramDescriptor) -> Result<Rc<dyn ProgramHandle>> {
        let name = desc.name.to_string();
        let ready = !self.unready_programs.contains(&name);
        Ok(Rc::new(MockProgram {
            name,
            ready,
            light_slots: desc.light_slots,
        }))
    }

    fn create_render_target(
        &mut self,
        desc: RenderTargetDescriptor,
    ) -> Result<Rc<dyn RenderTargetHandle>> {
        let color = Some(Rc::new(MockTexture {
            width: desc.width,
            height: desc.height,
            format: desc.format,
        }));
        let depth = desc.depth.then(|| {
            Rc::new(MockTexture {
                width: desc.width,
                height: desc.height,
                format: wgpu::TextureFormat::Depth32Float,
            })
        });
        Ok(Rc::new(MockTarget { desc, color, depth }))
    }

    fn create_texture(
        &mut self,
        _label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        _pixels: Option<&[u8]>,
    ) -> Result<Rc<dyn TextureHandle>> {
        Ok(Rc::new(MockTexture {
            width,
            height,
            format,
        }))
    }

    fn begin_pass(&mut self, desc: &PassDescriptor<'_>) -> Result<()> {
        self.current_pass = Some(desc.label.to_string());
        self.passes.push(desc.label.to_string());
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        if !call.program.is_ready() {
            return Err(LumenError::ResourceNotReady(call.program.name().to_string()));
        }
        let desc = call.pipeline.descriptor();
        self.draws.push(DrawRecord {
            pass: self.current_pass.clone().unwrap_or_default(),
            program: call.program.name().to_string(),
            pipeline: desc.label.to_string(),
            cull: desc.cull_mode,
            blend: desc.blend,
            model: call.model,
            view: call.view,
            projection: call.projection,
            pick_id: call.pick_id,
            had_lighting: call.lighting.is_some(),
            had_shadow: call.shadow.is_some(),
            had_source_texture: call.source_texture.is_some(),
        });
        Ok(())
    }

    fn end_pass(&mut self) {
        self.current_pass = None;
    }

    fn read_pixel(
        &mut self,
        target: &Rc<dyn RenderTargetHandle>,
        x: u32,
        y: u32,
    ) -> Result<[u8; 4]> {
        let desc = target.descriptor();
        if x >= desc.width || y >= desc.height {
            return Err(LumenError::ReadbackOutOfBounds {
                x,
                y,
                width: desc.width,
                height: desc.height,
            });
        }
        Ok(self.scripted_pixels.pop_front().unwrap_or([0, 0, 0, 0]))
    }

    fn surface_size(&self) -> (u32, u32) {
        self.surface
    }
}

// ============================================================================
// Scene helpers
// ============================================================================

/// Unit cube mesh (24 vertices / 36 indices) with the given material,
/// added as a root node. Returns the node key.
pub fn add_cube(scene: &mut Scene, material: Material) -> lumen::scene::NodeKey {
    let geometry = lumen::resources::primitives::cube(1.0);
    add_mesh(scene, geometry, material)
}

pub fn add_mesh(
    scene: &mut Scene,
    geometry: PolyList,
    material: Material,
) -> lumen::scene::NodeKey {
    let geometry = scene.add_geometry(geometry);
    let material = scene.add_material(material);
    scene.add_mesh(Mesh::new("TestMesh", geometry, material))
}
