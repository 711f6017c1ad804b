//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`LumenError`] covers the failure modes of the
//! render-orchestration core:
//! - Programming errors that fail fast (mismatched attribute counts,
//!   wrong-kind material slot writes, missing camera or shadow caster on an
//!   explicit shadow update)
//! - Guard errors for resources used before their load completed
//! - GPU-abstraction factory failures
//!
//! Matrix-stack underflow is deliberately *not* represented here: an
//! unbalanced pop is a fatal bug in the traversal and panics instead.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, LumenError>`.

use thiserror::Error;

/// The main error type for the Lumen render core.
#[derive(Error, Debug)]
pub enum LumenError {
    // ========================================================================
    // Geometry & Material Errors (fail-fast)
    // ========================================================================
    /// An attribute buffer does not match the vertex count of its poly list.
    #[error("attribute `{attribute}` has {actual} elements, expected {expected}")]
    AttributeCountMismatch {
        /// Name of the offending attribute
        attribute: &'static str,
        /// Element count implied by the position buffer
        expected: usize,
        /// Element count actually supplied
        actual: usize,
    },

    /// A value of the wrong kind was assigned to or read from a material slot.
    #[error("material slot `{slot}` expects a {expected} value, got {found}")]
    MaterialSlotType {
        /// Slot name
        slot: &'static str,
        /// Kind the slot stores
        expected: &'static str,
        /// Kind that was supplied or found
        found: &'static str,
    },

    // ========================================================================
    // Render Scheduling Errors
    // ========================================================================
    /// A shadow update was requested but the scene has no active camera.
    #[error("shadow update requested without an active camera")]
    MissingCamera,

    /// A shadow update was requested but no light casts shadows.
    #[error("shadow update requested without a shadow-casting light")]
    MissingShadowLight,

    /// More simultaneous lights than the program variant cache supports.
    #[error("light count {requested} exceeds the supported maximum of {max}")]
    TooManyLights {
        /// Number of lights submitted this frame
        requested: usize,
        /// Upper bound of the per-light-count program cache
        max: usize,
    },

    // ========================================================================
    // Resource Lifecycle Errors
    // ========================================================================
    /// A draw or setup call reached a resource whose load has not completed.
    #[error("`{0}` called before resource load completed")]
    ResourceNotReady(String),

    /// A render stage ran before its `load()` allocated GPU objects.
    #[error("{0} used before load()")]
    NotLoaded(&'static str),

    // ========================================================================
    // GPU Abstraction Errors
    // ========================================================================
    /// The render device failed to create a requested object.
    #[error("render device error: {0}")]
    DeviceError(String),

    /// Pixel readback outside the bounds of the target.
    #[error("readback at ({x}, {y}) outside target of size {width}x{height}")]
    ReadbackOutOfBounds {
        /// Requested x coordinate
        x: u32,
        /// Requested y coordinate
        y: u32,
        /// Target width
        width: u32,
        /// Target height
        height: u32,
    },

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, LumenError>`.
pub type Result<T> = std::result::Result<T, LumenError>;
