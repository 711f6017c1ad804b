//! Render Queue
//!
//! Per-layer buckets of draw items, rebuilt from scene traversal every
//! frame. Each enabled layer owns two pipeline variants (back-face culled
//! and unculled) created once at `enable_queue`; entries are ephemeral
//! {node, mesh, model} tuples resolved against the scene at draw time.
//!
//! `draw` iterates strictly in insertion order. No depth or distance sort is
//! performed, so order within a layer equals traversal order. Drawing the
//! opaque layer before the transparent one is the caller's convention, not
//! enforced here.

use std::rc::Rc;

use glam::{Affine3A, Mat4};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::errors::Result;
use crate::gpu::{
    AmbientBinding, DrawCall, PipelineDescriptor, PipelineHandle, ProgramHandle, RenderDevice,
    ShadowBinding,
};
use crate::resources::layers::{resolve_render_layers, RenderLayers};
use crate::scene::{Light, LightKey, MeshKey, NodeKey, Scene};

/// One scheduled draw, valid for the current frame only.
#[derive(Debug, Clone, Copy)]
pub struct QueueEntry {
    pub node: NodeKey,
    pub mesh: MeshKey,
    pub model: Affine3A,
}

/// A light collected during traversal, with its world transform.
#[derive(Debug, Clone, Copy)]
pub struct FrameLight {
    pub light: LightKey,
    pub world: Affine3A,
}

/// Pipeline-state options for `enable_queue`.
#[derive(Debug, Clone, Default)]
pub struct QueueOptions {
    /// Explicit blend state; the transparent default layer always overrides
    /// this with source-over blending.
    pub blend: Option<wgpu::BlendState>,
    pub depth_write: Option<bool>,
}

/// Per-draw parameters shared by a whole `draw` invocation.
pub struct DrawPass<'a> {
    pub view: Mat4,
    pub projection: Mat4,
    /// Replaces every entry's program (depth-only shadow pass, ID pass).
    pub override_program: Option<&'a Rc<dyn ProgramHandle>>,
    /// Packed lighting/tone-mapping uniform block.
    pub lighting: Option<&'a [u8]>,
    pub shadow: Option<ShadowBinding<'a>>,
    pub ambient: Option<AmbientBinding<'a>>,
    /// Restricts the pass to shadow-casting entries.
    pub shadow_casters_only: bool,
    /// Color ids for the picking pass; entries absent from the map are
    /// skipped unless `force_draw` is set.
    pub pick_ids: Option<&'a FxHashMap<MeshKey, u32>>,
    pub force_draw: bool,
}

impl Default for DrawPass<'_> {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            override_program: None,
            lighting: None,
            shadow: None,
            ambient: None,
            shadow_casters_only: false,
            pick_ids: None,
            force_draw: false,
        }
    }
}

struct LayerQueue {
    layer: RenderLayers,
    enabled: bool,
    program: Rc<dyn ProgramHandle>,
    pipeline_cull: Rc<dyn PipelineHandle>,
    pipeline_no_cull: Rc<dyn PipelineHandle>,
    entries: Vec<QueueEntry>,
}

/// Per-layer draw scheduling for one renderer.
#[derive(Default)]
pub struct RenderQueue {
    queues: Vec<LayerQueue>,
    lights: SmallVec<[FrameLight; 8]>,
}

impl RenderQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the two pipeline variants for `layer` and starts collecting
    /// entries for it. The transparent default layer forces source-over
    /// blending regardless of `opts`.
    pub fn enable_queue(
        &mut self,
        device: &mut dyn RenderDevice,
        layer: RenderLayers,
        program: Rc<dyn ProgramHandle>,
        opts: &QueueOptions,
    ) {
        if let Some(existing) = self.queues.iter_mut().find(|q| q.layer == layer) {
            existing.enabled = true;
            return;
        }

        let transparent = layer.contains(RenderLayers::TRANSPARENT);
        let blend = if transparent {
            Some(wgpu::BlendState::ALPHA_BLENDING)
        } else {
            opts.blend
        };
        let depth_write = opts.depth_write.unwrap_or(!transparent);

        let base = PipelineDescriptor {
            blend,
            depth_write,
            ..Default::default()
        };
        let pipeline_cull = device.create_pipeline(PipelineDescriptor {
            label: format!("Layer{:#x}Cull", layer.bits()).into(),
            cull_mode: Some(wgpu::Face::Back),
            ..base.clone()
        });
        let pipeline_no_cull = device.create_pipeline(PipelineDescriptor {
            label: format!("Layer{:#x}NoCull", layer.bits()).into(),
            cull_mode: None,
            ..base
        });

        self.queues.push(LayerQueue {
            layer,
            enabled: true,
            program,
            pipeline_cull,
            pipeline_no_cull,
            entries: Vec::new(),
        });
    }

    /// Disables a layer: its `draw` becomes a no-op until re-enabled.
    pub fn disable_queue(&mut self, layer: RenderLayers) {
        if let Some(q) = self.queues.iter_mut().find(|q| q.layer == layer) {
            q.enabled = false;
        }
    }

    #[must_use]
    pub fn is_enabled(&self, layer: RenderLayers) -> bool {
        self.queues.iter().any(|q| q.layer == layer && q.enabled)
    }

    /// Clears every bucket and the light list. Must be called exactly once
    /// before traversal each frame.
    pub fn new_frame(&mut self) {
        for q in &mut self.queues {
            q.entries.clear();
        }
        self.lights.clear();
    }

    /// Resolves the effective layer mask of a mesh and appends an entry to
    /// every enabled bucket the mask overlaps. One object may land in
    /// multiple buckets.
    pub fn add_poly_list(&mut self, scene: &Scene, node: NodeKey, mesh: MeshKey, model: Affine3A) {
        let Some(mesh_data) = scene.meshes.get(mesh) else {
            return;
        };
        let Some(geometry) = scene.geometries.get(mesh_data.geometry) else {
            return;
        };
        let Some(material) = scene.materials.get(mesh_data.material) else {
            return;
        };
        if !geometry.visible {
            return;
        }

        let mask = resolve_render_layers(geometry.layer_field, material.transparent);
        let entry = QueueEntry { node, mesh, model };
        for q in &mut self.queues {
            if q.layer.intersects(mask) {
                q.entries.push(entry);
            }
        }
    }

    /// Clears the light's stale shadow binding and appends it to the
    /// per-frame light list.
    pub fn add_light(&mut self, light: &mut Light, key: LightKey, world: Affine3A) {
        light.clear_shadow_binding();
        self.lights.push(FrameLight { light: key, world });
    }

    #[must_use]
    pub fn lights(&self) -> &[FrameLight] {
        &self.lights
    }

    /// Number of entries currently scheduled for `layer`.
    #[must_use]
    pub fn entry_count(&self, layer: RenderLayers) -> usize {
        self.queues
            .iter()
            .find(|q| q.layer == layer)
            .map_or(0, |q| q.entries.len())
    }

    /// Entries of a layer in insertion order (for auxiliary passes).
    #[must_use]
    pub fn entries(&self, layer: RenderLayers) -> &[QueueEntry] {
        match self.queues.iter().find(|q| q.layer == layer) {
            Some(q) => q.entries.as_slice(),
            None => &[],
        }
    }

    /// Draws every entry of `layer` in insertion order. Entries whose
    /// program has not finished loading are skipped, not waited on.
    pub fn draw(
        &self,
        device: &mut dyn RenderDevice,
        scene: &Scene,
        layer: RenderLayers,
        pass: &DrawPass<'_>,
    ) -> Result<()> {
        let Some(q) = self.queues.iter().find(|q| q.layer == layer) else {
            return Ok(());
        };
        if !q.enabled {
            return Ok(());
        }

        for entry in &q.entries {
            let Some(mesh) = scene.meshes.get(entry.mesh) else {
                continue;
            };
            let Some(geometry) = scene.geometries.get(mesh.geometry) else {
                continue;
            };
            let Some(material) = scene.materials.get(mesh.material) else {
                continue;
            };

            if pass.shadow_casters_only
                && !(material.cast_shadows && geometry.visible_in_shadows)
            {
                continue;
            }

            let pick_id = match pass.pick_ids {
                Some(ids) => match ids.get(&entry.mesh) {
                    Some(&id) => Some(id),
                    None if pass.force_draw => None,
                    None => continue,
                },
                None => None,
            };

            let program = pass.override_program.unwrap_or(&q.program);
            if !program.is_ready() {
                // Partially-loaded nodes are skipped, never blocked on.
                continue;
            }

            let pipeline = if material.double_sided() || geometry.cull_mode.is_none() {
                &q.pipeline_no_cull
            } else {
                &q.pipeline_cull
            };

            device.draw(&DrawCall {
                program,
                pipeline,
                geometry,
                material: Some(material),
                model: Mat4::from(entry.model),
                view: pass.view,
                projection: pass.projection,
                lighting: pass.lighting,
                shadow: pass.shadow.clone(),
                ambient: pass.ambient.clone(),
                source_texture: None,
                pick_id,
            })?;
        }

        Ok(())
    }
}
