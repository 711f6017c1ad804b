//! PolyList Geometry
//!
//! Flat numeric buffers (position, normal, up to 3 UV sets, color, index)
//! plus the derived tangent cache, the draw mode, the 32-bit render-layer
//! field and the visibility/culling state of one drawable batch.
//!
//! The tangent buffer is lazily (re)computed on first access after
//! invalidation. Validity is checked only by comparing lengths against the
//! current vertex and UV buffers. There is no dependency tracking, so stale
//! data is caught, never prevented.

use std::cell::{Cell, Ref, RefCell};

use glam::Vec3;
use uuid::Uuid;

use crate::errors::{LumenError, Result};
use crate::resources::layers::AUTO_LAYERS;
use crate::resources::tangent::{self, TangentStats};

/// Number of supported UV channels.
pub const MAX_UV_SETS: usize = 3;

/// Axis-aligned bounding box of a poly list.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

/// A drawable batch of flat vertex data.
#[derive(Debug)]
pub struct PolyList {
    pub uuid: Uuid,

    positions: Vec<f32>,
    normals: Vec<f32>,
    uv_sets: [Vec<f32>; MAX_UV_SETS],
    colors: Vec<f32>,
    indices: Vec<u32>,

    /// Lazily computed tangents; length-validated against `positions` and
    /// the first UV set.
    tangents: RefCell<Vec<f32>>,
    /// Length of `uv_sets[0]` at the last tangent generation.
    tangent_uv_len: Cell<usize>,
    /// One warning per geometry for degenerate UVs / topology fallback.
    tangent_warned: Cell<bool>,
    last_tangent_stats: Cell<TangentStats>,

    pub topology: wgpu::PrimitiveTopology,

    /// 32-bit render-layer field; 0 (AUTO) defers to material transparency.
    pub layer_field: u32,
    pub visible: bool,
    /// Whether this geometry is rendered into shadow maps.
    pub visible_in_shadows: bool,

    pub cull_mode: Option<wgpu::Face>,
    pub front_face: wgpu::FrontFace,

    bounding_box: RefCell<Option<BoundingBox>>,
}

impl Default for PolyList {
    fn default() -> Self {
        Self::new()
    }
}

impl PolyList {
    #[must_use]
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            positions: Vec::new(),
            normals: Vec::new(),
            uv_sets: [Vec::new(), Vec::new(), Vec::new()],
            colors: Vec::new(),
            indices: Vec::new(),
            tangents: RefCell::new(Vec::new()),
            tangent_uv_len: Cell::new(0),
            tangent_warned: Cell::new(false),
            last_tangent_stats: Cell::new(TangentStats::default()),
            topology: wgpu::PrimitiveTopology::TriangleList,
            layer_field: AUTO_LAYERS,
            visible: true,
            visible_in_shadows: true,
            cull_mode: Some(wgpu::Face::Back),
            front_face: wgpu::FrontFace::Ccw,
            bounding_box: RefCell::new(None),
        }
    }

    // ========================================================================
    // Buffer setters
    // ========================================================================

    pub fn set_positions(&mut self, positions: Vec<f32>) {
        self.positions = positions;
        *self.bounding_box.borrow_mut() = None;
    }

    /// Fails fast when the normal count does not match the vertex count.
    pub fn set_normals(&mut self, normals: Vec<f32>) -> Result<()> {
        if normals.len() != self.positions.len() {
            return Err(LumenError::AttributeCountMismatch {
                attribute: "normal",
                expected: self.positions.len(),
                actual: normals.len(),
            });
        }
        self.normals = normals;
        Ok(())
    }

    /// Fails fast when the UV count does not match the vertex count.
    pub fn set_uvs(&mut self, channel: usize, uvs: Vec<f32>) -> Result<()> {
        let expected = self.vertex_count() * 2;
        if uvs.len() != expected {
            return Err(LumenError::AttributeCountMismatch {
                attribute: "uv",
                expected,
                actual: uvs.len(),
            });
        }
        self.uv_sets[channel.min(MAX_UV_SETS - 1)] = uvs;
        Ok(())
    }

    pub fn set_colors(&mut self, colors: Vec<f32>) {
        self.colors = colors;
    }

    pub fn set_indices(&mut self, indices: Vec<u32>) {
        self.indices = indices;
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    #[must_use]
    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    #[must_use]
    pub fn uvs(&self, channel: usize) -> &[f32] {
        &self.uv_sets[channel.min(MAX_UV_SETS - 1)]
    }

    #[must_use]
    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    #[must_use]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[must_use]
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Stats from the most recent tangent generation run.
    #[must_use]
    pub fn tangent_stats(&self) -> TangentStats {
        self.last_tangent_stats.get()
    }

    // ========================================================================
    // Tangent cache
    // ========================================================================

    /// Returns the per-vertex tangent buffer, recomputing it when the cached
    /// length no longer matches the vertex buffer or the first UV set has
    /// changed length since generation (a geometry gaining UVs invalidates
    /// its up-vector fallback).
    ///
    /// Invariant on return: `tangents.len() == positions.len()`.
    pub fn tangents(&self) -> Ref<'_, [f32]> {
        if !self.tangent_cache_valid() {
            self.rebuild_tangents();
        }
        Ref::map(self.tangents.borrow(), Vec::as_slice)
    }

    fn tangent_cache_valid(&self) -> bool {
        let cached = self.tangents.borrow();
        !self.positions.is_empty()
            && cached.len() == self.positions.len()
            && self.tangent_uv_len.get() == self.uv_sets[0].len()
    }

    fn rebuild_tangents(&self) {
        let vertex_count = self.vertex_count();
        let uvs = &self.uv_sets[0];

        let generated = if self.topology != wgpu::PrimitiveTopology::TriangleList {
            if !self.tangent_warned.replace(true) {
                log::warn!(
                    "poly list {}: draw mode {:?} has no tangent derivation, using up vector",
                    self.uuid,
                    self.topology
                );
            }
            self.last_tangent_stats.set(TangentStats::default());
            tangent::constant_up_tangents(vertex_count)
        } else if uvs.is_empty() || self.indices.is_empty() {
            if !self.tangent_warned.replace(true) {
                log::warn!(
                    "poly list {}: missing UVs or indices, using up-vector tangents",
                    self.uuid
                );
            }
            self.last_tangent_stats.set(TangentStats::default());
            tangent::constant_up_tangents(vertex_count)
        } else {
            let (tangents, stats) =
                tangent::generate_triangle_tangents(&self.positions, uvs, &self.indices);
            if stats.had_degenerate_uvs() && !self.tangent_warned.replace(true) {
                log::warn!(
                    "poly list {}: {} degenerate UV triangle(s), {} repaired by perturbation",
                    self.uuid,
                    stats.degenerate,
                    stats.repaired
                );
            }
            self.last_tangent_stats.set(stats);
            tangents
        };

        self.tangent_uv_len.set(self.uv_sets[0].len());
        *self.tangents.borrow_mut() = generated;
    }

    // ========================================================================
    // Bounds
    // ========================================================================

    /// Cached axis-aligned bounds of the position buffer.
    #[must_use]
    pub fn bounding_box(&self) -> BoundingBox {
        if let Some(cached) = *self.bounding_box.borrow() {
            return cached;
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for chunk in self.positions.chunks_exact(3) {
            let p = Vec3::new(chunk[0], chunk[1], chunk[2]);
            min = min.min(p);
            max = max.max(p);
        }
        let bbox = if self.positions.is_empty() {
            BoundingBox::default()
        } else {
            BoundingBox { min, max }
        };
        *self.bounding_box.borrow_mut() = Some(bbox);
        bbox
    }
}
