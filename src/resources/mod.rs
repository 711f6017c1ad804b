//! CPU-side render resources: geometry buffers, tangent generation, PBR
//! materials and the render-layer mask.

pub mod geometry;
pub mod layers;
pub mod material;
pub mod primitives;
pub mod tangent;

pub use geometry::{BoundingBox, PolyList, MAX_UV_SETS};
pub use layers::{resolve_render_layers, RenderLayers, AUTO_LAYERS};
pub use material::{Material, MaterialSlot, Side, SlotId, TextureRef};
pub use tangent::TangentStats;
