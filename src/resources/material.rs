//! PBR Material
//!
//! Parameter set of the physically-based shading model. Every parameter slot
//! is either a constant or a texture reference; the transparency flag decides
//! the AUTO default render layer. Serializes to a JSON-like document with
//! enumerated string tags and defaulted absent fields.

use std::borrow::Cow;

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LumenError, Result};

/// Reference to a texture asset by identifier (URL or logical name). The
/// binding layer resolves it; the core only carries it around.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef(pub String);

impl TextureRef {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Which faces get culled when this material draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Side {
    #[default]
    #[serde(rename = "kSideFront")]
    Front,
    #[serde(rename = "kSideBack")]
    Back,
    #[serde(rename = "kSideDouble")]
    Double,
}

/// One material parameter: a constant scalar, a constant color, or a texture
/// reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum MaterialSlot {
    #[serde(rename = "kSlotScalar")]
    Scalar(f32),
    #[serde(rename = "kSlotColor")]
    Color(Vec4),
    #[serde(rename = "kSlotTexture")]
    Texture(TextureRef),
}

impl MaterialSlot {
    fn kind(&self) -> &'static str {
        match self {
            MaterialSlot::Scalar(_) => "scalar",
            MaterialSlot::Color(_) => "color",
            MaterialSlot::Texture(_) => "texture",
        }
    }
}

/// Identifies a parameter slot and its expected constant kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    Albedo,
    Metalness,
    Roughness,
    Normal,
    Emission,
    Occlusion,
    Height,
}

impl SlotId {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SlotId::Albedo => "albedo",
            SlotId::Metalness => "metalness",
            SlotId::Roughness => "roughness",
            SlotId::Normal => "normal",
            SlotId::Emission => "emission",
            SlotId::Occlusion => "occlusion",
            SlotId::Height => "height",
        }
    }

    /// The constant kind a slot accepts (besides textures).
    fn constant_kind(self) -> &'static str {
        match self {
            SlotId::Albedo | SlotId::Emission => "color",
            _ => "scalar",
        }
    }
}

fn default_albedo() -> MaterialSlot {
    MaterialSlot::Color(Vec4::ONE)
}

fn default_scalar_zero() -> MaterialSlot {
    MaterialSlot::Scalar(0.0)
}

fn default_roughness() -> MaterialSlot {
    MaterialSlot::Scalar(0.5)
}

fn default_occlusion() -> MaterialSlot {
    MaterialSlot::Scalar(1.0)
}

fn default_emission() -> MaterialSlot {
    MaterialSlot::Color(Vec4::new(0.0, 0.0, 0.0, 1.0))
}

fn default_fresnel() -> Vec3 {
    Vec3::ONE
}

fn default_true() -> bool {
    true
}

/// PBR material parameter set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    #[serde(skip, default = "Uuid::new_v4")]
    pub uuid: Uuid,

    #[serde(default)]
    pub name: Cow<'static, str>,

    #[serde(default = "default_albedo")]
    pub albedo: MaterialSlot,
    #[serde(default = "default_scalar_zero")]
    pub metalness: MaterialSlot,
    #[serde(default = "default_roughness")]
    pub roughness: MaterialSlot,
    #[serde(default = "default_scalar_zero")]
    pub normal: MaterialSlot,
    #[serde(default = "default_emission")]
    pub emission: MaterialSlot,
    #[serde(default = "default_occlusion")]
    pub occlusion: MaterialSlot,
    #[serde(default = "default_scalar_zero")]
    pub height: MaterialSlot,

    #[serde(default = "default_fresnel")]
    pub fresnel: Vec3,
    #[serde(default)]
    pub alpha_cutoff: f32,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default = "default_true")]
    pub cast_shadows: bool,
    #[serde(default)]
    pub side: Side,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: Cow::Borrowed("Material"),
            albedo: default_albedo(),
            metalness: default_scalar_zero(),
            roughness: default_roughness(),
            normal: default_scalar_zero(),
            emission: default_emission(),
            occlusion: default_occlusion(),
            height: default_scalar_zero(),
            fresnel: default_fresnel(),
            alpha_cutoff: 0.0,
            transparent: false,
            cast_shadows: true,
            side: Side::Front,
        }
    }
}

impl Material {
    #[must_use]
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    fn slot(&self, id: SlotId) -> &MaterialSlot {
        match id {
            SlotId::Albedo => &self.albedo,
            SlotId::Metalness => &self.metalness,
            SlotId::Roughness => &self.roughness,
            SlotId::Normal => &self.normal,
            SlotId::Emission => &self.emission,
            SlotId::Occlusion => &self.occlusion,
            SlotId::Height => &self.height,
        }
    }

    fn slot_mut(&mut self, id: SlotId) -> &mut MaterialSlot {
        match id {
            SlotId::Albedo => &mut self.albedo,
            SlotId::Metalness => &mut self.metalness,
            SlotId::Roughness => &mut self.roughness,
            SlotId::Normal => &mut self.normal,
            SlotId::Emission => &mut self.emission,
            SlotId::Occlusion => &mut self.occlusion,
            SlotId::Height => &mut self.height,
        }
    }

    // ========================================================================
    // Typed slot access (fail-fast on kind mismatch)
    // ========================================================================

    /// Assigns a constant scalar. Errors when the slot stores colors.
    pub fn set_scalar(&mut self, id: SlotId, value: f32) -> Result<()> {
        if id.constant_kind() != "scalar" {
            return Err(LumenError::MaterialSlotType {
                slot: id.name(),
                expected: id.constant_kind(),
                found: "scalar",
            });
        }
        *self.slot_mut(id) = MaterialSlot::Scalar(value);
        Ok(())
    }

    /// Assigns a constant color. Errors when the slot stores scalars.
    pub fn set_color(&mut self, id: SlotId, value: Vec4) -> Result<()> {
        if id.constant_kind() != "color" {
            return Err(LumenError::MaterialSlotType {
                slot: id.name(),
                expected: id.constant_kind(),
                found: "color",
            });
        }
        *self.slot_mut(id) = MaterialSlot::Color(value);
        Ok(())
    }

    /// Assigns a texture reference; valid for every slot.
    pub fn set_texture(&mut self, id: SlotId, texture: TextureRef) {
        *self.slot_mut(id) = MaterialSlot::Texture(texture);
    }

    /// Reads a constant scalar. Errors when the slot holds anything else.
    pub fn scalar(&self, id: SlotId) -> Result<f32> {
        match self.slot(id) {
            MaterialSlot::Scalar(v) => Ok(*v),
            other => Err(LumenError::MaterialSlotType {
                slot: id.name(),
                expected: "scalar",
                found: other.kind(),
            }),
        }
    }

    /// Reads a constant color. Errors when the slot holds anything else.
    pub fn color(&self, id: SlotId) -> Result<Vec4> {
        match self.slot(id) {
            MaterialSlot::Color(v) => Ok(*v),
            other => Err(LumenError::MaterialSlotType {
                slot: id.name(),
                expected: "color",
                found: other.kind(),
            }),
        }
    }

    /// Texture reference of a slot, when one is bound.
    #[must_use]
    pub fn texture(&self, id: SlotId) -> Option<&TextureRef> {
        match self.slot(id) {
            MaterialSlot::Texture(t) => Some(t),
            _ => None,
        }
    }

    /// True when any slot references a texture (the material-rendering
    /// collaborator then prepares the packed-channel texture).
    #[must_use]
    pub fn uses_textures(&self) -> bool {
        [
            SlotId::Albedo,
            SlotId::Metalness,
            SlotId::Roughness,
            SlotId::Normal,
            SlotId::Emission,
            SlotId::Occlusion,
            SlotId::Height,
        ]
        .iter()
        .any(|&id| self.texture(id).is_some())
    }

    #[must_use]
    pub fn double_sided(&self) -> bool {
        self.side == Side::Double
    }
}
