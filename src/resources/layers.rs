//! Render Layers
//!
//! A 32-bit mask groups drawables for selective drawing. Bit 0 is the default
//! opaque layer, bit 15 the default transparent layer, bit 31 the default
//! selection layer; bits 1–30 are user-defined. A layer field of `0` (AUTO)
//! defers to the material's transparency flag.

use bitflags::bitflags;

bitflags! {
    /// 32-bit render-layer mask.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct RenderLayers: u32 {
        const OPAQUE      = 1 << 0;
        const TRANSPARENT = 1 << 15;
        const SELECTION   = 1 << 31;
        // Bits 1-30 are user-defined and preserved verbatim.
        const _ = !0;
    }
}

/// Layer field value that defers to material transparency.
pub const AUTO_LAYERS: u32 = 0;

impl RenderLayers {
    /// Returns true if any bit of `other` is present in `self`.
    #[inline]
    #[must_use]
    pub fn overlaps(self, other: RenderLayers) -> bool {
        self.intersects(other)
    }
}

/// Resolves the effective layer mask of a drawable.
///
/// `AUTO` (0) picks the transparent or opaque default from the material's
/// transparency flag; explicit masks are kept verbatim. The selection default
/// bit is always OR'd in so every drawable can participate in picking.
///
/// Pure data logic, independent of any object graph.
#[must_use]
pub fn resolve_render_layers(layer_field: u32, is_transparent: bool) -> RenderLayers {
    let base = if layer_field == AUTO_LAYERS {
        if is_transparent {
            RenderLayers::TRANSPARENT
        } else {
            RenderLayers::OPAQUE
        }
    } else {
        RenderLayers::from_bits_retain(layer_field)
    };

    base | RenderLayers::SELECTION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_opaque() {
        let layers = resolve_render_layers(AUTO_LAYERS, false);
        assert!(layers.contains(RenderLayers::OPAQUE));
        assert!(layers.contains(RenderLayers::SELECTION));
        assert!(!layers.contains(RenderLayers::TRANSPARENT));
    }

    #[test]
    fn auto_transparent() {
        let layers = resolve_render_layers(AUTO_LAYERS, true);
        assert!(layers.contains(RenderLayers::TRANSPARENT));
        assert!(layers.contains(RenderLayers::SELECTION));
        assert!(!layers.contains(RenderLayers::OPAQUE));
    }

    #[test]
    fn explicit_mask_preserved() {
        let custom = 1 << 7;
        let layers = resolve_render_layers(custom, true);
        assert!(layers.contains(RenderLayers::from_bits_retain(custom)));
        assert!(layers.contains(RenderLayers::SELECTION));
        // Explicit masks ignore the transparency flag.
        assert!(!layers.contains(RenderLayers::TRANSPARENT));
    }
}
