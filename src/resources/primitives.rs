//! Geometry Primitives
//!
//! Procedural poly lists used by the environment baker (sky sphere, sky
//! cube) and handy as fixtures elsewhere. All primitives carry positions,
//! normals and one UV channel; the cube uses 4 unique vertices per face.

use std::f32::consts::PI;

use glam::Vec3;

use crate::resources::geometry::PolyList;

/// Axis-aligned cube centered at the origin: 24 vertices, 36 indices.
#[must_use]
pub fn cube(size: f32) -> PolyList {
    let h = size * 0.5;
    // (normal, tangent, bitangent) per face.
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut positions = Vec::with_capacity(24 * 3);
    let mut normals = Vec::with_capacity(24 * 3);
    let mut uvs = Vec::with_capacity(24 * 2);
    let mut indices = Vec::with_capacity(36);

    for (normal, tangent, bitangent) in faces {
        let base = (positions.len() / 3) as u32;
        for (s, t) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let p = normal * h + tangent * (s * h) + bitangent * (t * h);
            positions.extend_from_slice(&[p.x, p.y, p.z]);
            normals.extend_from_slice(&[normal.x, normal.y, normal.z]);
            uvs.extend_from_slice(&[(s + 1.0) * 0.5, (t + 1.0) * 0.5]);
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    build(positions, normals, uvs, indices)
}

/// Flat quad in the XY plane facing +Z: 4 vertices, 6 indices.
#[must_use]
pub fn quad(width: f32, height: f32) -> PolyList {
    let hw = width * 0.5;
    let hh = height * 0.5;
    let positions = vec![
        -hw, -hh, 0.0, //
        hw, -hh, 0.0, //
        hw, hh, 0.0, //
        -hw, hh, 0.0,
    ];
    let normals = vec![
        0.0, 0.0, 1.0, //
        0.0, 0.0, 1.0, //
        0.0, 0.0, 1.0, //
        0.0, 0.0, 1.0,
    ];
    let uvs = vec![0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0];
    let indices = vec![0, 1, 2, 0, 2, 3];
    build(positions, normals, uvs, indices)
}

/// UV sphere centered at the origin. `segments` is the longitude count,
/// `rings` the latitude count; both are clamped to a sane minimum.
#[must_use]
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> PolyList {
    let segments = segments.max(3);
    let rings = rings.max(2);

    let mut positions = Vec::new();
    let mut normals = Vec::new();
    let mut uvs = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * PI;
        for seg in 0..=segments {
            let u = seg as f32 / segments as f32;
            let theta = u * 2.0 * PI;

            let n = Vec3::new(
                phi.sin() * theta.cos(),
                phi.cos(),
                phi.sin() * theta.sin(),
            );
            let p = n * radius;
            positions.extend_from_slice(&[p.x, p.y, p.z]);
            normals.extend_from_slice(&[n.x, n.y, n.z]);
            uvs.extend_from_slice(&[u, v]);
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    build(positions, normals, uvs, indices)
}

fn build(positions: Vec<f32>, normals: Vec<f32>, uvs: Vec<f32>, indices: Vec<u32>) -> PolyList {
    let mut poly = PolyList::new();
    poly.set_positions(positions);
    // Counts are correct by construction.
    let _ = poly.set_normals(normals);
    let _ = poly.set_uvs(0, uvs);
    poly.set_indices(indices);
    poly
}
