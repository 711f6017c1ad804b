//! Shadow Renderer Tests
//!
//! Tests for:
//! - Light placement relative to the camera focus point
//! - Camera-roll invariance of the placement
//! - The depth-only pass over the opaque bucket
//! - Missing camera / missing caster error reporting

mod common;

use glam::{Affine3A, Quat, Vec3};

use common::{add_cube, MockDevice};
use lumen::errors::LumenError;
use lumen::gpu::{ProgramDescriptor, RenderDevice};
use lumen::render::shadow::{light_transform, shadow_projection, ShadowRenderer};
use lumen::render::{QueueOptions, RenderQueue, RendererSettings};
use lumen::resources::{Material, RenderLayers};
use lumen::scene::{Camera, Light, Scene};

const EPSILON: f32 = 1e-4;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

// ============================================================================
// light_transform
// ============================================================================

#[test]
fn light_placed_behind_focus_along_light_axis() {
    // Camera at origin looking down -Z with focus distance 10.
    let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let camera_world = Affine3A::IDENTITY;

    // Light with identity rotation shines down -Z; its back axis is +Z.
    let mut light = Light::new_directional(Vec3::ONE, 1.0);
    light.cast_shadows = true;
    light.shadow_render_distance = 20.0;
    let light_world = Affine3A::IDENTITY;

    let placed = light_transform(&camera_world, &camera, &light_world, &light);
    let focus = Vec3::new(0.0, 0.0, -camera.focus_distance);
    let expected = focus + Vec3::Z * light.shadow_render_distance;

    assert!(
        approx_vec(placed.translation.into(), expected),
        "got {:?}, expected {expected:?}",
        placed.translation
    );
    // Rotation is unchanged.
    assert!(approx_vec(placed.transform_vector3(Vec3::Z), Vec3::Z));
}

#[test]
fn light_placement_invariant_to_camera_roll() {
    let camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    let light = Light::new_directional(Vec3::ONE, 1.0);

    let light_world =
        Affine3A::from_quat(Quat::from_rotation_x(-45f32.to_radians()));

    let plain = Affine3A::from_translation(Vec3::new(1.0, 2.0, 3.0));
    // Same position and view direction, rolled 90 degrees about the view axis.
    let rolled = plain * Affine3A::from_quat(Quat::from_rotation_z(90f32.to_radians()));

    let a = light_transform(&plain, &camera, &light_world, &light);
    let b = light_transform(&rolled, &camera, &light_world, &light);

    assert!(
        approx_vec(a.translation.into(), b.translation.into()),
        "roll changed placement: {:?} vs {:?}",
        a.translation,
        b.translation
    );
}

#[test]
fn projection_sized_from_focus_distance() {
    let mut camera = Camera::new_perspective(60.0, 1.0, 0.1, 100.0);
    camera.focus_distance = 25.0;
    let light = Light::new_directional(Vec3::ONE, 1.0);

    let projection = shadow_projection(&camera, &light);
    // Orthographic RH: m00 = 1 / half_width.
    assert!(
        (projection.x_axis.x - 1.0 / 25.0).abs() < EPSILON,
        "m00 = {}",
        projection.x_axis.x
    );
}

// ============================================================================
// update
// ============================================================================

fn shadow_scene() -> Scene {
    let mut scene = Scene::new();
    scene.add_camera(Camera::new_perspective(60.0, 1.0, 0.1, 100.0));
    let mut light = Light::new_directional(Vec3::ONE, 1.0);
    light.cast_shadows = true;
    scene.add_light(light);
    add_cube(&mut scene, Material::default());
    scene
}

fn opaque_queue(device: &mut MockDevice, scene: &Scene) -> RenderQueue {
    let program = device
        .create_program(ProgramDescriptor::new("PbrForward"))
        .unwrap();
    let mut queue = RenderQueue::new();
    queue.enable_queue(device, RenderLayers::OPAQUE, program, &QueueOptions::default());
    queue.new_frame();
    for (node_key, node) in &scene.nodes {
        if let Some(mesh) = node.mesh {
            queue.add_poly_list(scene, node_key, mesh, Affine3A::IDENTITY);
        }
    }
    queue
}

#[test]
fn update_binds_depth_map_onto_light() {
    let mut device = MockDevice::new();
    let mut scene = shadow_scene();
    scene.update_matrix_world();
    let queue = opaque_queue(&mut device, &scene);

    let mut shadow = ShadowRenderer::new();
    shadow.load(&mut device, &RendererSettings::default()).unwrap();
    shadow.update(&mut device, &mut scene, &queue).unwrap();

    let (_, light_key) = scene.shadow_caster().unwrap();
    let light = &scene.lights[light_key];
    assert!(light.has_shadow_binding());
    assert!(light.shadow_projection.is_some());

    // One depth-only draw of the cube in the shadow pass.
    let shadow_draws = device.draws_in_pass("ShadowPass");
    assert_eq!(shadow_draws.len(), 1);
    assert_eq!(shadow_draws[0].program, "ShadowDepth");
}

#[test]
fn update_without_camera_errors() {
    let mut device = MockDevice::new();
    let mut scene = Scene::new();
    let mut light = Light::new_directional(Vec3::ONE, 1.0);
    light.cast_shadows = true;
    scene.add_light(light);

    let queue = opaque_queue(&mut device, &scene);
    let mut shadow = ShadowRenderer::new();
    shadow.load(&mut device, &RendererSettings::default()).unwrap();

    assert!(matches!(
        shadow.update(&mut device, &mut scene, &queue),
        Err(LumenError::MissingCamera)
    ));
}

#[test]
fn update_without_caster_errors() {
    let mut device = MockDevice::new();
    let mut scene = Scene::new();
    scene.add_camera(Camera::new_perspective(60.0, 1.0, 0.1, 100.0));
    // A light that does not cast shadows is not a caster.
    scene.add_light(Light::new_directional(Vec3::ONE, 1.0));

    let queue = opaque_queue(&mut device, &scene);
    let mut shadow = ShadowRenderer::new();
    shadow.load(&mut device, &RendererSettings::default()).unwrap();

    assert!(matches!(
        shadow.update(&mut device, &mut scene, &queue),
        Err(LumenError::MissingShadowLight)
    ));
}

#[test]
fn update_before_load_errors() {
    let mut device = MockDevice::new();
    let mut scene = shadow_scene();
    let queue = opaque_queue(&mut device, &scene);

    let mut shadow = ShadowRenderer::new();
    assert!(matches!(
        shadow.update(&mut device, &mut scene, &queue),
        Err(LumenError::NotLoaded(_))
    ));
}

#[test]
fn non_casting_material_absent_from_shadow_pass() {
    let mut device = MockDevice::new();
    let mut scene = Scene::new();
    scene.add_camera(Camera::new_perspective(60.0, 1.0, 0.1, 100.0));
    let mut light = Light::new_directional(Vec3::ONE, 1.0);
    light.cast_shadows = true;
    scene.add_light(light);
    let material = Material {
        cast_shadows: false,
        ..Material::default()
    };
    add_cube(&mut scene, material);
    scene.update_matrix_world();

    let queue = opaque_queue(&mut device, &scene);
    let mut shadow = ShadowRenderer::new();
    shadow.load(&mut device, &RendererSettings::default()).unwrap();
    shadow.update(&mut device, &mut scene, &queue).unwrap();

    assert!(device.draws_in_pass("ShadowPass").is_empty());
}

#[test]
fn shadow_pass_uses_light_view_matrix() {
    let mut device = MockDevice::new();
    let mut scene = shadow_scene();
    scene.update_matrix_world();
    let queue = opaque_queue(&mut device, &scene);

    let mut shadow = ShadowRenderer::new();
    shadow.load(&mut device, &RendererSettings::default()).unwrap();
    shadow.update(&mut device, &mut scene, &queue).unwrap();

    let (_, light_key) = scene.shadow_caster().unwrap();
    let bound_view = scene.lights[light_key].shadow_view.unwrap();
    let draws = device.draws_in_pass("ShadowPass");
    assert_eq!(draws[0].view, bound_view);
}
