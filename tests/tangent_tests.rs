//! Tangent Generation Tests
//!
//! Tests for:
//! - Buffer length and unit-length contracts
//! - Degenerate-UV repair (never fatal)
//! - Non-triangle topology fallback
//! - Lazy recompute on geometry change

mod common;

use glam::Vec3;

use lumen::resources::primitives;
use lumen::resources::tangent::generate_triangle_tangents;
use lumen::resources::PolyList;

const EPSILON: f32 = 1e-4;

fn tangent_at(tangents: &[f32], vertex: usize) -> Vec3 {
    Vec3::new(
        tangents[vertex * 3],
        tangents[vertex * 3 + 1],
        tangents[vertex * 3 + 2],
    )
}

// ============================================================================
// generate_triangle_tangents
// ============================================================================

#[test]
fn tangent_buffer_matches_vertex_buffer() {
    let cube = primitives::cube(1.0);
    let (tangents, stats) =
        generate_triangle_tangents(cube.positions(), cube.uvs(0), cube.indices());

    assert_eq!(tangents.len(), cube.positions().len());
    assert!(!stats.had_degenerate_uvs());
}

#[test]
fn tangents_are_unit_length() {
    let sphere = primitives::uv_sphere(1.0, 12, 6);
    let (tangents, _) =
        generate_triangle_tangents(sphere.positions(), sphere.uvs(0), sphere.indices());

    for v in 0..sphere.vertex_count() {
        let t = tangent_at(&tangents, v);
        assert!(
            (t.length() - 1.0).abs() < EPSILON,
            "vertex {v}: |t| = {}",
            t.length()
        );
    }
}

#[test]
fn quad_tangent_follows_u_axis() {
    let quad = primitives::quad(2.0, 2.0);
    let (tangents, _) =
        generate_triangle_tangents(quad.positions(), quad.uvs(0), quad.indices());

    // UV u runs along +X on the quad.
    for v in 0..4 {
        let t = tangent_at(&tangents, v);
        assert!((t - Vec3::X).length() < EPSILON, "vertex {v}: {t:?}");
    }
}

#[test]
fn degenerate_uvs_do_not_panic_and_stay_unit() {
    // Two triangles sharing all three UVs at the same point.
    let positions = vec![
        0.0, 0.0, 0.0, //
        1.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, //
        1.0, 1.0, 0.0,
    ];
    let uvs = vec![0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3];
    let indices = vec![0, 1, 2, 1, 3, 2];

    let (tangents, stats) = generate_triangle_tangents(&positions, &uvs, &indices);

    assert!(stats.had_degenerate_uvs());
    assert_eq!(stats.degenerate, 2);
    for v in 0..4 {
        let t = tangent_at(&tangents, v);
        assert!(t.is_finite(), "vertex {v} not finite: {t:?}");
        assert!((t.length() - 1.0).abs() < EPSILON, "vertex {v}: {t:?}");
    }
}

#[test]
fn out_of_range_indices_are_skipped() {
    let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let uvs = vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0];
    // Second triangle references a vertex that does not exist.
    let indices = vec![0, 1, 2, 0, 1, 9];

    let (tangents, _) = generate_triangle_tangents(&positions, &uvs, &indices);
    assert_eq!(tangents.len(), positions.len());
}

// ============================================================================
// PolyList lazy tangents
// ============================================================================

#[test]
fn poly_list_caches_and_recomputes_tangents() {
    let mut poly = primitives::quad(1.0, 1.0);
    assert_eq!(poly.tangents().len(), poly.positions().len());

    // Growing the vertex buffer invalidates the cache by length check.
    let mut grown = primitives::quad(1.0, 1.0);
    let sphere = primitives::uv_sphere(1.0, 8, 4);
    grown.set_positions(sphere.positions().to_vec());
    let _ = grown.set_uvs(0, sphere.uvs(0).to_vec());
    grown.set_indices(sphere.indices().to_vec());
    assert_eq!(grown.tangents().len(), grown.positions().len());

    poly.set_indices(vec![0, 1, 2, 0, 2, 3]);
    assert_eq!(poly.tangents().len(), poly.positions().len());
}

#[test]
fn adding_uvs_recomputes_cached_tangents() {
    let quad = primitives::quad(2.0, 2.0);
    let mut poly = PolyList::new();
    poly.set_positions(quad.positions().to_vec());
    poly.set_indices(quad.indices().to_vec());

    // No UVs yet: the cache fills with the up-vector fallback.
    assert!((tangent_at(&poly.tangents(), 0) - Vec3::Y).length() < EPSILON);

    // Same vertex count, UV set added afterwards: the cache is stale and
    // must recompute from the UVs.
    poly.set_uvs(0, quad.uvs(0).to_vec()).unwrap();
    assert!((tangent_at(&poly.tangents(), 0) - Vec3::X).length() < EPSILON);
}

#[test]
fn non_triangle_topology_falls_back_to_up() {
    let mut poly = PolyList::new();
    poly.set_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
    poly.set_indices(vec![0, 1]);
    poly.topology = wgpu::PrimitiveTopology::LineList;

    let tangents = poly.tangents();
    assert_eq!(tangents.len(), poly.positions().len());
    for v in 0..2 {
        assert!((tangent_at(&tangents, v) - Vec3::Y).length() < EPSILON);
    }
}

#[test]
fn missing_uvs_fall_back_to_up() {
    let mut poly = PolyList::new();
    poly.set_positions(vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
    poly.set_indices(vec![0, 1, 2]);

    let tangents = poly.tangents();
    assert_eq!(tangents.len(), 9);
    assert!((tangent_at(&tangents, 0) - Vec3::Y).length() < EPSILON);
}
