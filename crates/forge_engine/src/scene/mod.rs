//! Scene management system
//!
//! The ownership and deferred-mutation core of the engine. A [`Scene`] owns
//! an arena of entities, a deferred membership list, a bitmask tag index, and
//! a background-task list, and imposes a strict per-frame phase schedule on
//! all of them:
//!
//! ```text
//! begin_frame   commit deferred adds/removes, advance the clock
//! update        awake hooks, entity/component updates, background tasks
//! render        camera passes feeding the draw-call queue
//! end_frame     one-shot end-of-frame callbacks
//! ```
//!
//! Mutation requests issued at any point inside a frame are safe: list
//! membership only changes at the commit step, so iteration over the
//! committed set never observes a resize.

pub mod component;
pub mod deferred;
pub mod entity;
pub mod tags;
pub mod task;

mod director;
#[allow(clippy::module_inception)]
mod scene;

pub use component::{Component, ComponentData, ComponentSlot};
pub use deferred::{CommitBatch, DeferredList};
pub use director::Director;
pub use entity::{Entity, EntityKey, LifeState};
pub use scene::{NextFrameHandle, ObjectTracker, Scene};
pub use tags::{TagIndex, TagMask};
pub use task::{Task, TaskKey, TaskStatus};

use thiserror::Error;

/// Errors surfaced by scene queries and mutations
#[derive(Debug, Error)]
pub enum SceneError {
    /// A tag bit index past the end of the bitmask was requested
    #[error("tag bit {0} is out of range for the {width}-bit tag mask", width = TagMask::WIDTH)]
    TagOutOfRange(u8),

    /// The entity key does not refer to a live entity in this scene
    #[error("entity {0:?} is not a member of this scene")]
    UnknownEntity(EntityKey),
}
