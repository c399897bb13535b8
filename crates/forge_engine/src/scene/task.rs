//! Background tasks
//!
//! Lightweight cooperative routines resumed once per frame from the update
//! phase. A task is an explicit resumable state machine: each step runs to a
//! suspension point and reports whether it wants to be resumed again. Tasks
//! are never re-entered while running (the slot is vacated for the duration
//! of a step) and never run during the render phase.

use slotmap::new_key_type;

use super::entity::EntityKey;
use super::scene::Scene;

new_key_type! {
    /// Handle to a scheduled background task
    pub struct TaskKey;
}

/// Outcome of one task step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Resume the task again next frame
    Running,
    /// The task is done; it is removed at the next commit
    Finished,
}

/// A resumable background routine
///
/// Scheduling is single-threaded and cooperative: `step` runs on the frame
/// thread, at most once per frame, and may freely mutate the scene.
pub trait Task: 'static {
    /// Run one step of the task
    fn step(&mut self, scene: &mut Scene, delta_time: f32) -> TaskStatus;
}

impl<F> Task for F
where
    F: FnMut(&mut Scene, f32) -> TaskStatus + 'static,
{
    fn step(&mut self, scene: &mut Scene, delta_time: f32) -> TaskStatus {
        self(scene, delta_time)
    }
}

/// Task that waits a number of seconds, then runs a one-shot action
///
/// A small ready-made state machine for the common "do this later" case.
pub struct Delay<A: FnOnce(&mut Scene) + 'static> {
    remaining: f32,
    action: Option<A>,
}

impl<A: FnOnce(&mut Scene) + 'static> Delay<A> {
    /// Run `action` once `seconds` of scene time have elapsed
    pub fn new(seconds: f32, action: A) -> Self {
        Self {
            remaining: seconds,
            action: Some(action),
        }
    }
}

impl<A: FnOnce(&mut Scene) + 'static> Task for Delay<A> {
    fn step(&mut self, scene: &mut Scene, delta_time: f32) -> TaskStatus {
        self.remaining -= delta_time;
        if self.remaining > 0.0 {
            return TaskStatus::Running;
        }
        if let Some(action) = self.action.take() {
            action(scene);
        }
        TaskStatus::Finished
    }
}

/// Task that despawns an entity after a number of seconds
///
/// Convenience wrapper over [`Delay`] for the lifetime-limited entity case.
pub fn despawn_after(key: EntityKey, seconds: f32) -> impl Task {
    Delay::new(seconds, move |scene: &mut Scene| {
        scene.remove(key);
    })
}
