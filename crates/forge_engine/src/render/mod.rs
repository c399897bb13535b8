//! Rendering: draw-call sequencing, pipeline state, cameras, and the
//! device abstraction
//!
//! The core never talks to a GPU api directly. Components emit [`DrawCall`]s
//! into a priority-ordered queue through a [`RenderPass`]; flushing the queue
//! diffs pipeline state and forwards the minimal command stream to a
//! [`RenderDevice`] implementation supplied by the embedding application.

mod camera;
mod device;
mod draw;
mod state;

pub use camera::{Camera, ComponentFilter, EntityFilter, Projection, RenderPass, Viewport};
pub use device::{DeviceOp, RecordingDevice, RenderDevice};
pub use draw::{DrawCall, DrawContext, DrawQueue};
pub use state::{
    BlendMode, Color, DepthMode, MaterialId, MeshId, RenderStates, TargetId, TextureId,
};

use crate::scene::EntityKey;

/// Errors surfaced from the render phase
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A draw call referenced a material the device does not know
    #[error("material {0:?} is not registered with the device")]
    MissingMaterial(MaterialId),

    /// A camera's render target could not be acquired
    #[error("render target {0:?} is unavailable")]
    TargetUnavailable(TargetId),

    /// A camera sources its view from an entity that left the scene
    #[error("camera view entity {0:?} is not in the scene")]
    ViewEntityMissing(EntityKey),
}
