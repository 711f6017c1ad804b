//! Selection / Picking
//!
//! Color-id picking: every selectable mesh gets a unique id, the selection
//! bucket is rendered into an offscreen id buffer, and a one-pixel readback
//! at the cursor resolves the pick through a reverse lookup. Id 0 is the
//! background; a background pick clears the current selection.
//!
//! Non-selectable geometry is still drawn into the id buffer (with the
//! background id) so it occludes selectables behind it.
//!
//! Click-vs-drag: a pick fires only when the release position is within the
//! configured tolerance of the press position; larger gestures are camera
//! manipulation and are ignored here.

use std::rc::Rc;

use glam::{Affine3A, Mat4, Vec4};
use rustc_hash::FxHashMap;

use crate::errors::{LumenError, Result};
use crate::gpu::{
    DrawCall, PassDescriptor, PipelineDescriptor, PipelineHandle, ProgramDescriptor,
    ProgramHandle, RenderDevice, RenderTargetDescriptor, RenderTargetHandle,
};
use crate::render::queue::{DrawPass, RenderQueue};
use crate::render::settings::RendererSettings;
use crate::resources::layers::RenderLayers;
use crate::resources::{primitives, PolyList};
use crate::scene::{traverse, MeshKey, NodeKey, Scene, SceneVisitor};

/// Packs an object id into an RGBA8 pixel (little-endian RGB, opaque alpha).
#[must_use]
pub fn encode_id(id: u32) -> [u8; 4] {
    [
        (id & 0xff) as u8,
        ((id >> 8) & 0xff) as u8,
        ((id >> 16) & 0xff) as u8,
        0xff,
    ]
}

/// Inverse of [`encode_id`]. A fully transparent pixel (cleared target) also
/// decodes to the background id 0.
#[must_use]
pub fn decode_id(pixel: [u8; 4]) -> u32 {
    u32::from(pixel[0]) | (u32::from(pixel[1]) << 8) | (u32::from(pixel[2]) << 16)
}

/// One picked drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub node: NodeKey,
    pub mesh: MeshKey,
}

pub type SelectionCallback = Box<dyn Fn(&[Selection])>;

/// Assigns sequential ids (starting at 1) to every visible selectable mesh.
#[derive(Default)]
struct IdAssigner {
    next: u32,
    ids: FxHashMap<MeshKey, u32>,
    reverse: FxHashMap<u32, Selection>,
}

impl SceneVisitor for IdAssigner {
    fn visit_mesh(&mut self, scene: &Scene, node: NodeKey, mesh: MeshKey, _world: &Affine3A) {
        let Some(mesh_data) = scene.meshes.get(mesh) else {
            return;
        };
        if !mesh_data.selectable {
            return;
        }
        self.next += 1;
        self.ids.insert(mesh, self.next);
        self.reverse.insert(self.next, Selection { node, mesh });
    }
}

/// Offscreen id-buffer picking and the edge-highlight overlay.
#[derive(Default)]
pub struct Picker {
    id_program: Option<Rc<dyn ProgramHandle>>,
    highlight_program: Option<Rc<dyn ProgramHandle>>,
    highlight_pipeline: Option<Rc<dyn PipelineHandle>>,
    target: Option<Rc<dyn RenderTargetHandle>>,
    overlay_quad: Option<PolyList>,

    target_size: (u32, u32),

    selection: Vec<Selection>,
    callbacks: Vec<SelectionCallback>,
    press: Option<(f32, f32)>,
    click_tolerance: f32,
}

impl Picker {
    #[must_use]
    pub fn new() -> Self {
        Self {
            click_tolerance: 2.0,
            ..Self::default()
        }
    }

    /// Creates the id and outline programs and the offscreen id target sized
    /// to the current surface.
    pub fn load(&mut self, device: &mut dyn RenderDevice, settings: &RendererSettings) -> Result<()> {
        self.click_tolerance = settings.pick_click_tolerance;

        self.id_program = Some(device.create_program(ProgramDescriptor::new("PickId"))?);
        // Discrete Laplacian over the id buffer detects silhouette edges.
        self.highlight_program =
            Some(device.create_program(ProgramDescriptor::new("SelectionOutline"))?);
        self.highlight_pipeline = Some(device.create_pipeline(PipelineDescriptor {
            label: "SelectionOutline".into(),
            cull_mode: None,
            blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            depth_write: false,
            depth_compare: wgpu::CompareFunction::Always,
            ..Default::default()
        }));

        self.ensure_target(device)?;

        let mut quad = primitives::quad(2.0, 2.0);
        quad.cull_mode = None;
        self.overlay_quad = Some(quad);
        Ok(())
    }

    /// (Re)creates the id target whenever the surface size changed, so picks
    /// stay valid across backbuffer resizes.
    fn ensure_target(&mut self, device: &mut dyn RenderDevice) -> Result<()> {
        let (width, height) = device.surface_size();
        let size = (width.max(1), height.max(1));
        if self.target.is_some() && self.target_size == size {
            return Ok(());
        }
        self.target = Some(device.create_render_target(RenderTargetDescriptor {
            label: "PickBuffer".into(),
            width: size.0,
            height: size.1,
            format: wgpu::TextureFormat::Rgba8Unorm,
            depth: true,
            cube: false,
        })?);
        self.target_size = size;
        Ok(())
    }

    /// Registers a selection-changed callback.
    pub fn on_selection_changed(&mut self, callback: SelectionCallback) {
        self.callbacks.push(callback);
    }

    #[must_use]
    pub fn selection(&self) -> &[Selection] {
        &self.selection
    }

    /// Records the press position of a potential pick gesture.
    pub fn press(&mut self, x: f32, y: f32) {
        self.press = Some((x, y));
    }

    /// Completes a pick gesture. Runs the pick only when the pointer stayed
    /// within the click tolerance; larger moves are dropped.
    pub fn release(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &Scene,
        queue: &RenderQueue,
        view: Mat4,
        projection: Mat4,
        x: f32,
        y: f32,
    ) -> Result<()> {
        let Some((px, py)) = self.press.take() else {
            return Ok(());
        };
        let moved = ((x - px).powi(2) + (y - py).powi(2)).sqrt();
        if moved > self.click_tolerance {
            return Ok(());
        }
        self.pick(device, scene, queue, view, projection, x as u32, y as u32)?;
        Ok(())
    }

    /// Renders the id buffer, reads back the pixel under (`x`, `y`) and
    /// updates the selection. Returns the new selection.
    pub fn pick(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &Scene,
        queue: &RenderQueue,
        view: Mat4,
        projection: Mat4,
        x: u32,
        y: u32,
    ) -> Result<&[Selection]> {
        let id_program = self
            .id_program
            .clone()
            .ok_or(LumenError::NotLoaded("picker"))?;
        self.ensure_target(device)?;
        let target = self.target.clone().ok_or(LumenError::NotLoaded("picker"))?;

        let mut assigner = IdAssigner::default();
        traverse(scene, &mut assigner);

        device.begin_pass(&PassDescriptor {
            label: "PickPass",
            target: Some(&target),
            cube_face: None,
            clear_color: Some(Vec4::ZERO),
            clear_depth: Some(1.0),
        })?;
        queue.draw(
            device,
            scene,
            RenderLayers::SELECTION,
            &DrawPass {
                view,
                projection,
                override_program: Some(&id_program),
                pick_ids: Some(&assigner.ids),
                force_draw: true,
                ..Default::default()
            },
        )?;
        device.end_pass();

        let pixel = device.read_pixel(&target, x, y)?;
        let id = decode_id(pixel);

        let new_selection = match assigner.reverse.get(&id) {
            Some(&sel) => vec![sel],
            None => Vec::new(),
        };
        if new_selection != self.selection {
            self.selection = new_selection;
            for callback in &self.callbacks {
                callback(&self.selection);
            }
        }
        Ok(&self.selection)
    }

    /// Draws the silhouette outline of the current selection over the frame
    /// by convolving the last id buffer full-screen.
    pub fn draw_highlight(&self, device: &mut dyn RenderDevice) -> Result<()> {
        if self.selection.is_empty() {
            return Ok(());
        }
        let program = self
            .highlight_program
            .as_ref()
            .ok_or(LumenError::NotLoaded("picker"))?;
        let pipeline = self
            .highlight_pipeline
            .as_ref()
            .ok_or(LumenError::NotLoaded("picker"))?;
        let target = self.target.as_ref().ok_or(LumenError::NotLoaded("picker"))?;
        let quad = self
            .overlay_quad
            .as_ref()
            .ok_or(LumenError::NotLoaded("picker"))?;
        let Some(id_buffer) = target.color_texture() else {
            return Ok(());
        };
        if !program.is_ready() {
            return Ok(());
        }

        // Composites over the finished frame; no clear.
        device.begin_pass(&PassDescriptor {
            label: "SelectionOutline",
            target: None,
            cube_face: None,
            clear_color: None,
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
            source_texture: Some(&id_buffer),
            pick_id: None,
        })?;
        device.end_pass();
        Ok(())
    }
}
