//! # Lumen
//!
//! Render-orchestration core of a real-time 3D engine: it decides what gets
//! drawn, in what order, with what GPU state, and how shadow and
//! image-based-lighting data is produced before per-pixel shading runs.
//!
//! The crate is written against the abstract GPU binding layer in [`gpu`],
//! never a concrete graphics API. A host supplies a [`gpu::RenderDevice`]
//! implementation plus windowing and asset loading; this core supplies:
//!
//! - [`resources`]: poly lists with lazy tangent generation, PBR materials,
//!   the 32-bit render-layer mask
//! - [`scene`]: slotmap-pooled scene graph with visitor traversal and an
//!   explicit matrix stack
//! - [`render`]: per-layer draw queue, shadow renderer, environment/IBL
//!   baker, PBR light packing and color-id picking, driven by
//!   [`render::Renderer`]
//!
//! Execution is strictly single-threaded per frame: one device, one command
//! stream, producer sub-passes (shadow map, cube bakes) completing before
//! the main pass samples them.
//!
//! ```no_run
//! use lumen::render::{Renderer, RendererSettings};
//! use lumen::scene::{Camera, Light, Scene};
//! use glam::Vec3;
//!
//! # fn host_device() -> Box<dyn lumen::gpu::RenderDevice> { unimplemented!() }
//! # fn main() -> lumen::Result<()> {
//! let mut scene = Scene::new();
//! scene.add_camera(Camera::new_perspective(60.0, 16.0 / 9.0, 0.1, 500.0));
//! scene.add_light(Light::new_directional(Vec3::ONE, 3.0));
//!
//! let mut renderer = Renderer::new(host_device(), RendererSettings::default());
//! renderer.load()?;
//! renderer.frame(&mut scene, 0.016)?;
//! renderer.draw(&mut scene)?;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod gpu;
pub mod render;
pub mod resources;
pub mod scene;

pub use errors::{LumenError, Result};
pub use render::Renderer;
pub use resources::{Material, PolyList, RenderLayers};
pub use scene::Scene;
