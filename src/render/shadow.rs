//! Shadow Renderer
//!
//! Single-light shadow mapping. Each frame the opaque bucket is re-rendered
//! with a depth-only program into an offscreen depth target, from the point
//! of view of the designated shadow-casting light. The shadow region tracks
//! the active camera's focus point rather than the world origin, so coverage
//! follows the viewer through large scenes.
//!
//! The resulting depth texture and light view/projection are bound onto the
//! light itself; the shading stage reads them back through
//! [`shadow_binding`].

use std::rc::Rc;

use glam::{Affine3A, Mat4, Vec3};

use crate::errors::{LumenError, Result};
use crate::gpu::{
    PassDescriptor, ProgramDescriptor, ProgramHandle, RenderDevice, RenderTargetDescriptor,
    RenderTargetHandle, ShadowBinding,
};
use crate::render::queue::{DrawPass, RenderQueue};
use crate::render::settings::RendererSettings;
use crate::resources::layers::RenderLayers;
use crate::scene::{Camera, Light, Scene};

/// Places the shadow render origin for `light` relative to the camera focus
/// point: `focus + light_back * shadow_render_distance`, rotation unchanged.
/// `light_back` is the light's world +Z axis, so the origin sits behind the
/// focus point along the light direction and is invariant to camera roll.
#[must_use]
pub fn light_transform(camera_world: &Affine3A, camera: &Camera, light_world: &Affine3A, light: &Light) -> Affine3A {
    let camera_position: Vec3 = camera_world.translation.into();
    let camera_forward = camera_world
        .transform_vector3(-Vec3::Z)
        .normalize_or(-Vec3::Z);
    let focus_point = camera_position + camera_forward * camera.focus_distance;

    let light_back = light_world.transform_vector3(Vec3::Z).normalize_or(Vec3::Z);

    let mut placed = *light_world;
    placed.translation = (focus_point + light_back * light.shadow_render_distance).into();
    placed
}

/// Orthographic shadow projection sized from the camera focus distance.
#[must_use]
pub fn shadow_projection(camera: &Camera, light: &Light) -> Mat4 {
    let extent = camera.focus_distance;
    Mat4::orthographic_rh(
        -extent,
        extent,
        -extent,
        extent,
        0.1,
        light.shadow_render_distance * 2.0,
    )
}

/// Shadow data of `light` as a per-draw binding, if the shadow pass ran this
/// frame.
#[must_use]
pub fn shadow_binding(light: &Light) -> Option<ShadowBinding<'_>> {
    let map = light.shadow_map.as_ref()?;
    let view = light.shadow_view?;
    let projection = light.shadow_projection?;
    Some(ShadowBinding {
        map,
        matrix: projection * view,
        bias: light.shadow_bias,
        strength: light.shadow_strength,
    })
}

/// Depth-only shadow map pass over the opaque bucket.
#[derive(Default)]
pub struct ShadowRenderer {
    program: Option<Rc<dyn ProgramHandle>>,
    target: Option<Rc<dyn RenderTargetHandle>>,
}

impl ShadowRenderer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the depth-only override program and the depth render target.
    pub fn load(&mut self, device: &mut dyn RenderDevice, settings: &RendererSettings) -> Result<()> {
        self.program = Some(device.create_program(ProgramDescriptor::new("ShadowDepth"))?);
        self.target = Some(device.create_render_target(RenderTargetDescriptor {
            label: "ShadowMap".into(),
            width: settings.shadow_map_size,
            height: settings.shadow_map_size,
            format: wgpu::TextureFormat::Depth32Float,
            depth: true,
            cube: false,
        })?);
        Ok(())
    }

    /// Renders the shadow map for the scene's designated shadow caster and
    /// binds the result onto the light.
    ///
    /// Errors with [`LumenError::MissingCamera`] or
    /// [`LumenError::MissingShadowLight`] when the scene lacks the required
    /// nodes; the frame loop treats both as a silent skip.
    pub fn update(
        &mut self,
        device: &mut dyn RenderDevice,
        scene: &mut Scene,
        queue: &RenderQueue,
    ) -> Result<()> {
        let program = self
            .program
            .as_ref()
            .ok_or(LumenError::NotLoaded("shadow renderer"))?;
        let target = self
            .target
            .as_ref()
            .ok_or(LumenError::NotLoaded("shadow renderer"))?;

        let (camera_node, camera_key) = scene.main_camera().ok_or(LumenError::MissingCamera)?;
        let (light_node, light_key) = scene
            .shadow_caster()
            .ok_or(LumenError::MissingShadowLight)?;

        let camera_world = *scene
            .nodes
            .get(camera_node)
            .ok_or(LumenError::MissingCamera)?
            .transform
            .world_matrix();
        let camera = scene
            .cameras
            .get(camera_key)
            .ok_or(LumenError::MissingCamera)?
            .clone();
        let light_world = *scene
            .nodes
            .get(light_node)
            .ok_or(LumenError::MissingShadowLight)?
            .transform
            .world_matrix();
        let light = scene
            .lights
            .get(light_key)
            .ok_or(LumenError::MissingShadowLight)?
            .clone();

        let placed = light_transform(&camera_world, &camera, &light_world, &light);
        let view = Mat4::from(placed.inverse());
        let projection = shadow_projection(&camera, &light);

        device.begin_pass(&PassDescriptor {
            label: "ShadowPass",
            target: Some(target),
            cube_face: None,
            clear_color: None,
            clear_depth: Some(1.0),
        })?;
        queue.draw(
            device,
            scene,
            RenderLayers::OPAQUE,
            &DrawPass {
                view,
                projection,
                override_program: Some(program),
                shadow_casters_only: true,
                ..Default::default()
            },
        )?;
        device.end_pass();

        let map = target
            .depth_texture()
            .ok_or_else(|| LumenError::DeviceError("shadow target has no depth texture".into()))?;
        if let Some(light) = scene.lights.get_mut(light_key) {
            light.shadow_map = Some(map);
            light.shadow_view = Some(view);
            light.shadow_projection = Some(projection);
        }

        Ok(())
    }
}
