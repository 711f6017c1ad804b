//! Render Orchestration
//!
//! The per-frame driver: `frame()` rebuilds the queue from scene traversal
//! and runs the producer sub-passes (shadow map, environment bake), `draw()`
//! renders the opaque and transparent layers into the backbuffer and
//! composites the selection outline. Sub-passes complete fully within the
//! frame before their output is sampled.
//!
//! Missing camera or shadow caster downgrades the affected stage to a silent
//! skip; the frame still renders without it.

pub mod ibl;
pub mod pbr;
pub mod picking;
pub mod queue;
pub mod settings;
pub mod shadow;

pub use ibl::EnvironmentBaker;
pub use pbr::{LightingBlock, PbrPrograms};
pub use picking::{Picker, Selection, SelectionCallback};
pub use queue::{DrawPass, FrameLight, QueueOptions, RenderQueue};
pub use settings::{RendererSettings, ToneMapping};
pub use shadow::ShadowRenderer;

use glam::{Affine3A, Mat4};

use crate::errors::{LumenError, Result};
use crate::gpu::{AmbientBinding, PassDescriptor, RenderDevice};
use crate::resources::layers::RenderLayers;
use crate::scene::{traverse, Camera, LightKey, MeshKey, NodeKey, Scene, SceneVisitor};

/// Pushes drawables and lights into the render queue during traversal.
struct QueueVisitor<'a> {
    queue: &'a mut RenderQueue,
    lights: Vec<(LightKey, Affine3A)>,
}

impl SceneVisitor for QueueVisitor<'_> {
    fn visit_mesh(&mut self, scene: &Scene, node: NodeKey, mesh: MeshKey, world: &Affine3A) {
        self.queue.add_poly_list(scene, node, mesh, *world);
    }

    fn visit_light(&mut self, _scene: &Scene, _node: NodeKey, light: LightKey, world: &Affine3A) {
        self.lights.push((light, *world));
    }
}

/// Owns the GPU device and all render stages of one context.
pub struct Renderer {
    device: Box<dyn RenderDevice>,
    settings: RendererSettings,

    queue: RenderQueue,
    shadow: ShadowRenderer,
    baker: EnvironmentBaker,
    picker: Picker,
    programs: PbrPrograms,

    loaded: bool,
}

impl Renderer {
    #[must_use]
    pub fn new(device: Box<dyn RenderDevice>, settings: RendererSettings) -> Self {
        let programs = PbrPrograms::new(settings.max_lights);
        Self {
            device,
            settings,
            queue: RenderQueue::new(),
            shadow: ShadowRenderer::new(),
            baker: EnvironmentBaker::new(),
            picker: Picker::new(),
            programs,
            loaded: false,
        }
    }

    /// Allocates every GPU object the stages need and enables the three
    /// default layers. Idempotent.
    pub fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        let device = self.device.as_mut();
        self.shadow.load(device, &self.settings)?;
        self.baker.load(device, &self.settings)?;
        self.picker.load(device, &self.settings)?;

        let base_program = self.programs.program_for(device, 0)?;
        let opts = QueueOptions::default();
        self.queue
            .enable_queue(device, RenderLayers::OPAQUE, base_program.clone(), &opts);
        self.queue
            .enable_queue(device, RenderLayers::TRANSPARENT, base_program.clone(), &opts);
        self.queue
            .enable_queue(device, RenderLayers::SELECTION, base_program, &opts);

        self.loaded = true;
        Ok(())
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    #[must_use]
    pub fn queue(&self) -> &RenderQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut RenderQueue {
        &mut self.queue
    }

    pub fn picker_mut(&mut self) -> &mut Picker {
        &mut self.picker
    }

    /// Builds the frame: world matrices, queue rebuild, shadow map and
    /// environment bake. `_delta` is reserved for animation hooks.
    pub fn frame(&mut self, scene: &mut Scene, _delta: f32) -> Result<()> {
        if !self.loaded {
            self.load()?;
        }

        scene.update_matrix_world();
        self.queue.new_frame();

        let mut visitor = QueueVisitor {
            queue: &mut self.queue,
            lights: Vec::new(),
        };
        traverse(scene, &mut visitor);
        let lights = visitor.lights;
        for (key, world) in lights {
            if let Some(light) = scene.lights.get_mut(key) {
                self.queue.add_light(light, key, world);
            }
        }

        if scene.environment.needs_bake() {
            if let Err(err) = self.baker.update_maps(self.device.as_mut(), &mut scene.environment) {
                log::warn!("environment bake skipped: {err}");
            }
        }

        match self.shadow.update(self.device.as_mut(), scene, &self.queue) {
            Ok(()) => {}
            Err(LumenError::MissingCamera | LumenError::MissingShadowLight) => {
                // Frame renders unshadowed.
                log::debug!("shadow pass skipped");
            }
            Err(err) => return Err(err),
        }

        Ok(())
    }

    /// Renders the built frame into the backbuffer: opaque, then
    /// transparent, then the selection outline overlay.
    pub fn draw(&mut self, scene: &mut Scene) -> Result<()> {
        let Some((camera_node, camera_key)) = scene.main_camera() else {
            log::debug!("draw skipped: no active camera");
            return Ok(());
        };

        let (width, height) = self.device.surface_size();
        if let Some(camera) = scene.cameras.get_mut(camera_key) {
            camera.set_aspect(width.max(1) as f32 / height.max(1) as f32);
        }
        let camera_world = *scene
            .nodes
            .get(camera_node)
            .ok_or(LumenError::MissingCamera)?
            .transform
            .world_matrix();
        let view = Camera::view_matrix(&camera_world);
        let projection = scene
            .cameras
            .get(camera_key)
            .ok_or(LumenError::MissingCamera)?
            .projection_matrix();

        let lighting = LightingBlock::pack(
            scene,
            self.queue.lights(),
            &self.settings.tone_mapping,
            scene.environment.intensity,
        );
        let program = self
            .programs
            .program_for(self.device.as_mut(), lighting.light_count())?;

        let shadow = scene
            .shadow_caster()
            .and_then(|(_, key)| scene.lights.get(key))
            .and_then(shadow::shadow_binding);

        let brdf_lut = self.baker.brdf_lut();
        let ambient = AmbientBinding {
            irradiance: scene.environment.irradiance_map.as_ref(),
            specular: scene.environment.specular_map.as_ref(),
            environment: scene.environment.environment_map.as_ref(),
            brdf_lut: brdf_lut.as_ref(),
            intensity: scene.environment.intensity,
        };

        let pass = DrawPass {
            view,
            projection,
            override_program: Some(&program),
            lighting: Some(lighting.bytes()),
            shadow,
            ambient: Some(ambient),
            ..Default::default()
        };

        self.device
            .begin_pass(&PassDescriptor::backbuffer("MainPass", scene.background))?;
        self.queue
            .draw(self.device.as_mut(), scene, RenderLayers::OPAQUE, &pass)?;
        self.queue
            .draw(self.device.as_mut(), scene, RenderLayers::TRANSPARENT, &pass)?;
        self.device.end_pass();

        self.picker.draw_highlight(self.device.as_mut())?;
        Ok(())
    }

    /// Resolves a pick at backbuffer coordinates and returns the selection.
    pub fn pick(&mut self, scene: &Scene, x: u32, y: u32) -> Result<Vec<Selection>> {
        let (view, projection) = self.camera_matrices(scene)?;
        let selection = self
            .picker
            .pick(self.device.as_mut(), scene, &self.queue, view, projection, x, y)?;
        Ok(selection.to_vec())
    }

    /// Pointer-press half of the click-vs-drag pick gesture.
    pub fn pointer_press(&mut self, x: f32, y: f32) {
        self.picker.press(x, y);
    }

    /// Pointer-release half of the pick gesture; picks only on a click.
    pub fn pointer_release(&mut self, scene: &Scene, x: f32, y: f32) -> Result<()> {
        let (view, projection) = self.camera_matrices(scene)?;
        self.picker
            .release(self.device.as_mut(), scene, &self.queue, view, projection, x, y)
    }

    fn camera_matrices(&self, scene: &Scene) -> Result<(Mat4, Mat4)> {
        let (camera_node, camera_key) = scene.main_camera().ok_or(LumenError::MissingCamera)?;
        let world = scene
            .nodes
            .get(camera_node)
            .ok_or(LumenError::MissingCamera)?
            .transform
            .world_matrix();
        let camera = scene
            .cameras
            .get(camera_key)
            .ok_or(LumenError::MissingCamera)?;
        Ok((Camera::view_matrix(world), camera.projection_matrix()))
    }
}
