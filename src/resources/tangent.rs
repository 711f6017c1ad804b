//! Tangent Generation
//!
//! Derives per-vertex tangent vectors from triangle-indexed position and
//! first-channel UV data, feeding normal-mapped shading. Tangents are
//! accumulated additively across shared vertices and normalized once at the
//! end, which smooths the basis over seams.
//!
//! Degenerate UV triangles (zero-area in UV space) never fail the whole
//! geometry: the offending UV is perturbed by fixed scale factors and the
//! triangle is retried up to twice before falling back to the up vector.
//! Callers receive a [`TangentStats`] so they can log one warning per
//! affected geometry instead of one per triangle.

use glam::{Vec2, Vec3};

/// Fallback tangent for vertices no valid triangle touches.
const UP: Vec3 = Vec3::Y;

/// Fixed UV perturbation scale applied per retry of a degenerate triangle.
const UV_PERTURB_SCALE: Vec2 = Vec2::new(0.1, 0.05);

/// Maximum perturb-and-retry attempts per triangle.
const MAX_RETRIES: u32 = 2;

/// Bookkeeping from one generation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TangentStats {
    /// Triangles whose UV determinant was non-finite at least once.
    pub degenerate: u32,
    /// Degenerate triangles repaired by UV perturbation.
    pub repaired: u32,
}

impl TangentStats {
    /// True when any triangle needed repair or gave up.
    #[must_use]
    pub fn had_degenerate_uvs(&self) -> bool {
        self.degenerate > 0
    }
}

#[inline]
fn read_vec3(buffer: &[f32], index: usize) -> Vec3 {
    Vec3::new(buffer[index * 3], buffer[index * 3 + 1], buffer[index * 3 + 2])
}

#[inline]
fn read_vec2(buffer: &[f32], index: usize) -> Vec2 {
    Vec2::new(buffer[index * 2], buffer[index * 2 + 1])
}

/// Tangent of a single triangle from its corner positions and UVs.
///
/// Returns `None` when the UV determinant stays non-finite after the allowed
/// retries; `attempts_used` reports how many perturbations were needed.
fn triangle_tangent(p: [Vec3; 3], uv: [Vec2; 3]) -> (Option<Vec3>, u32) {
    let e1 = p[1] - p[0];
    let e2 = p[2] - p[0];

    let mut uv1 = uv[1];
    let uv0 = uv[0];
    let uv2 = uv[2];

    for attempt in 0..=MAX_RETRIES {
        let du1 = uv1.x - uv0.x;
        let dv1 = uv1.y - uv0.y;
        let du2 = uv2.x - uv0.x;
        let dv2 = uv2.y - uv0.y;

        let det = du1 * dv2 - du2 * dv1;
        let r = 1.0 / det;

        if r.is_finite() {
            let tangent = (e1 * dv2 - e2 * dv1) * r;
            return (Some(tangent.normalize_or(UP)), attempt);
        }

        // Degenerate UV area: nudge one corner and retry.
        uv1 += UV_PERTURB_SCALE * (attempt + 1) as f32;
    }

    (None, MAX_RETRIES)
}

/// Generates one tangent per vertex from triangle-indexed data.
///
/// `positions` holds 3 floats per vertex, `uvs` 2 floats per vertex,
/// `indices` a multiple of 3. Trailing non-triangle indices are ignored.
/// The returned buffer has exactly `positions.len()` floats; every tangent is
/// finite and unit length.
#[must_use]
pub fn generate_triangle_tangents(
    positions: &[f32],
    uvs: &[f32],
    indices: &[u32],
) -> (Vec<f32>, TangentStats) {
    let vertex_count = positions.len() / 3;
    let uv_count = uvs.len() / 2;
    let mut accumulated = vec![Vec3::ZERO; vertex_count];
    let mut stats = TangentStats::default();

    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
            continue;
        }
        if i0 >= uv_count || i1 >= uv_count || i2 >= uv_count {
            continue;
        }

        let p = [
            read_vec3(positions, i0),
            read_vec3(positions, i1),
            read_vec3(positions, i2),
        ];
        let uv = [read_vec2(uvs, i0), read_vec2(uvs, i1), read_vec2(uvs, i2)];

        let (tangent, attempts) = triangle_tangent(p, uv);
        if attempts > 0 {
            stats.degenerate += 1;
            if tangent.is_some() {
                stats.repaired += 1;
            }
        }

        let tangent = tangent.unwrap_or(UP);
        accumulated[i0] += tangent;
        accumulated[i1] += tangent;
        accumulated[i2] += tangent;
    }

    // Final normalization is a deliberate policy: accumulation smooths shared
    // vertices, normalization restores the unit-length contract expected by
    // the shading stage.
    let mut out = Vec::with_capacity(positions.len());
    for tangent in accumulated {
        let n = tangent.normalize_or(UP);
        out.extend_from_slice(&n.to_array());
    }

    (out, stats)
}

/// Constant up tangent per vertex, used for non-triangle draw modes.
#[must_use]
pub fn constant_up_tangents(vertex_count: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(vertex_count * 3);
    for _ in 0..vertex_count {
        out.extend_from_slice(&UP.to_array());
    }
    out
}
