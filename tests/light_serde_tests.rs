//! Light Serialization Tests
//!
//! Tests for:
//! - Enumerated string type tags (kTypeDirectional / kTypePoint / ...)
//! - Round-trip fidelity of colors and shadow parameters
//! - Defaulted values for absent fields

use glam::Vec3;

use lumen::scene::{Light, LightType};

const EPSILON: f32 = 1e-6;

fn approx_vec(a: Vec3, b: Vec3) -> bool {
    (a - b).length() < EPSILON
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn type_serializes_as_string_tag() {
    let light = Light::new_spot(Vec3::ONE, 2.0, 30f32.to_radians(), 4.0);
    let json = serde_json::to_string(&light).unwrap();
    assert!(json.contains("\"kTypeSpot\""), "json: {json}");

    let directional = Light::new_directional(Vec3::ONE, 1.0);
    let json = serde_json::to_string(&directional).unwrap();
    assert!(json.contains("\"kTypeDirectional\""), "json: {json}");
}

#[test]
fn disabled_tag_round_trips() {
    let light = Light {
        kind: LightType::Disabled,
        ..Light::default()
    };
    let json = serde_json::to_string(&light).unwrap();
    let back: Light = serde_json::from_str(&json).unwrap();
    assert_eq!(back.kind, LightType::Disabled);
    assert!(!back.enabled());
}

// ============================================================================
// Round trip
// ============================================================================

#[test]
fn round_trip_preserves_all_parameters() {
    let mut light = Light::new_spot(Vec3::new(0.9, 0.7, 0.5), 3.5, 25f32.to_radians(), 8.0);
    light.ambient = Vec3::new(0.1, 0.2, 0.3);
    light.specular = Vec3::new(0.4, 0.5, 0.6);
    light.cutoff_distance = 42.0;
    light.cast_shadows = true;
    light.shadow_bias = 0.002;
    light.shadow_strength = 0.65;
    light.shadow_render_distance = 33.0;

    let json = serde_json::to_string(&light).unwrap();
    let back: Light = serde_json::from_str(&json).unwrap();

    assert_eq!(back.kind, LightType::Spot);
    assert!(approx_vec(back.ambient, light.ambient));
    assert!(approx_vec(back.diffuse, light.diffuse));
    assert!(approx_vec(back.specular, light.specular));
    assert!((back.intensity - 3.5).abs() < EPSILON);
    assert!((back.spot_cutoff - 25f32.to_radians()).abs() < EPSILON);
    assert!((back.spot_exponent - 8.0).abs() < EPSILON);
    assert!((back.cutoff_distance - 42.0).abs() < EPSILON);
    assert!(back.cast_shadows);
    assert!((back.shadow_bias - 0.002).abs() < EPSILON);
    assert!((back.shadow_strength - 0.65).abs() < EPSILON);
    assert!((back.shadow_render_distance - 33.0).abs() < EPSILON);
}

#[test]
fn shadow_bindings_are_never_serialized() {
    let light = Light::new_directional(Vec3::ONE, 1.0);
    let json = serde_json::to_string(&light).unwrap();
    assert!(!json.contains("shadow_map"), "json: {json}");
    assert!(!json.contains("shadow_view"), "json: {json}");
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn absent_fields_take_defaults() {
    let back: Light = serde_json::from_str("{\"type\":\"kTypePoint\"}").unwrap();
    assert_eq!(back.kind, LightType::Point);
    assert!(approx_vec(back.diffuse, Vec3::ONE));
    assert!((back.intensity - 1.0).abs() < EPSILON);
    assert!((back.cutoff_distance - 100.0).abs() < EPSILON);
    assert!(!back.cast_shadows);
    assert!((back.shadow_strength - 0.8).abs() < EPSILON);
    assert!(back.shadow_map.is_none());
}

#[test]
fn empty_document_is_a_default_directional() {
    let back: Light = serde_json::from_str("{}").unwrap();
    assert_eq!(back.kind, LightType::Directional);
    assert!(back.enabled());
}
