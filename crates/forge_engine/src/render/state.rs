//! Pipeline state descriptors and resource handles
//!
//! Handles are opaque device-assigned ids; the core orders and diffs them
//! but never dereferences them.

use serde::{Deserialize, Serialize};

/// Opaque handle to a device-registered material (shader + pipeline layout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

/// Opaque handle to a device-registered texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Opaque handle to a device-registered mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Opaque handle to an offscreen render target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

/// Linear rgba color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red channel, 0.0..=1.0
    pub r: f32,
    /// Green channel, 0.0..=1.0
    pub g: f32,
    /// Blue channel, 0.0..=1.0
    pub b: f32,
    /// Alpha channel, 0.0..=1.0
    pub a: f32,
}

impl Color {
    /// Opaque black
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);

    /// Opaque color from rgb channels
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// Blend equation selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlendMode {
    /// No blending; source overwrites destination
    #[default]
    Opaque,
    /// Standard premultiplied alpha blending
    Alpha,
    /// Source added onto destination
    Additive,
    /// Source multiplied with destination
    Multiply,
}

/// Depth buffer interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DepthMode {
    /// Test against and write to the depth buffer
    #[default]
    ReadWrite,
    /// Test but never write; used for transparents drawn back to front
    ReadOnly,
    /// Ignore the depth buffer entirely
    Disabled,
}

/// Complete pipeline state a draw call runs under
///
/// Equality on this struct drives the queue's state diffing: consecutive
/// draws with equal fields emit no state commands between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RenderStates {
    /// Blend equation
    pub blend: BlendMode,
    /// Depth behaviour
    pub depth: DepthMode,
    /// Material to bind, if the call needs one
    pub material: Option<MaterialId>,
    /// Texture to bind, if the material samples one
    pub texture: Option<TextureId>,
}

impl RenderStates {
    /// States for an opaque pass with the given material
    #[must_use]
    pub fn opaque(material: MaterialId) -> Self {
        Self {
            material: Some(material),
            ..Self::default()
        }
    }

    /// States for an alpha-blended pass with depth writes disabled
    #[must_use]
    pub fn transparent(material: MaterialId) -> Self {
        Self {
            blend: BlendMode::Alpha,
            depth: DepthMode::ReadOnly,
            material: Some(material),
            texture: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_states_are_opaque_read_write() {
        let states = RenderStates::default();
        assert_eq!(states.blend, BlendMode::Opaque);
        assert_eq!(states.depth, DepthMode::ReadWrite);
        assert!(states.material.is_none());
    }

    #[test]
    fn test_transparent_preset_disables_depth_writes() {
        let states = RenderStates::transparent(MaterialId(7));
        assert_eq!(states.depth, DepthMode::ReadOnly);
        assert_eq!(states.blend, BlendMode::Alpha);
    }
}
