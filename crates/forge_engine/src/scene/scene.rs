//! Scene: entity ownership and frame orchestration
//!
//! The scene owns the entity arena, the deferred membership roster, the tag
//! index, the background-task list, and the cameras, and steps them through
//! the fixed frame schedule. All mutation of attached entities flows through
//! scene setters so the tag index stays synchronous with tag mask changes.

use crossbeam::channel::{unbounded, Receiver, Sender};
use slotmap::SlotMap;

use crate::core::config::EngineConfig;
use crate::foundation::math::Vec3;
use crate::foundation::time::FrameClock;
use crate::render::{Camera, DrawContext, RenderDevice};

use super::component::{Component, ComponentData, ComponentSlot};
use super::deferred::DeferredList;
use super::entity::{Entity, EntityKey, LifeState, LifeStateField};
use super::tags::{TagIndex, TagMask};
use super::task::{Task, TaskKey, TaskStatus};
use super::SceneError;

/// Action marshaled onto the frame thread, run at the start of a frame
type NextFrameAction = Box<dyn FnOnce(&mut Scene) + Send>;

/// One-shot callback run at the end of the current frame
type FrameEndAction = Box<dyn FnOnce(&mut Scene)>;

/// Cloneable, thread-safe handle for queueing work onto the frame thread
///
/// This is the core's single concurrency boundary: collaborators running on
/// other threads (asset hot-reload, file watchers) must marshal any
/// scene- or GPU-state-affecting work through it rather than touching the
/// scene directly. Queued actions run at the start of the next `begin_frame`,
/// before the commit step.
#[derive(Clone)]
pub struct NextFrameHandle {
    sender: Sender<NextFrameAction>,
}

impl NextFrameHandle {
    /// Queue an action to run on the frame thread at the start of the next
    /// frame
    pub fn run_on_next_frame(&self, action: impl FnOnce(&mut Scene) + Send + 'static) {
        if self.sender.send(Box::new(action)).is_err() {
            log::warn!("scene dropped; next-frame action discarded");
        }
    }
}

impl std::fmt::Debug for NextFrameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NextFrameHandle").finish_non_exhaustive()
    }
}

/// External object tracker notified from entity lifecycle commits
///
/// The implementation (typically a type-indexed registry) lives outside the
/// core; the scene only delivers the notifications.
pub trait ObjectTracker {
    /// An entity joined the committed set
    fn entity_added(&mut self, scene: &Scene, key: EntityKey);
    /// An entity's removal was committed
    fn entity_removed(&mut self, scene: &Scene, key: EntityKey);
}

/// Top-level container orchestrating one frame's worth of entity update and
/// camera-driven rendering
pub struct Scene {
    arena: SlotMap<EntityKey, Entity>,
    roster: DeferredList<EntityKey>,
    tags: TagIndex,

    tasks: SlotMap<TaskKey, Option<Box<dyn Task>>>,
    task_roster: DeferredList<TaskKey>,

    cameras: Vec<Camera>,

    /// Entities committed this frame whose awake hook has not run yet
    awake_set: Vec<EntityKey>,
    end_of_frame: Vec<FrameEndAction>,
    next_frame_tx: Sender<NextFrameAction>,
    next_frame_rx: Receiver<NextFrameAction>,

    clock: FrameClock,
    tracker: Option<Box<dyn ObjectTracker>>,

    /// Guards against re-entrant commits from lifecycle hooks
    in_commit: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create an empty scene with a wall-clock frame clock
    pub fn new() -> Self {
        let (next_frame_tx, next_frame_rx) = unbounded();
        Self {
            arena: SlotMap::with_key(),
            roster: DeferredList::new(),
            tags: TagIndex::new(),
            tasks: SlotMap::with_key(),
            task_roster: DeferredList::new(),
            cameras: Vec::new(),
            awake_set: Vec::new(),
            end_of_frame: Vec::new(),
            next_frame_tx,
            next_frame_rx,
            clock: FrameClock::new(),
            tracker: None,
            in_commit: false,
        }
    }

    /// Create a scene configured from an [`EngineConfig`]
    pub fn with_config(config: &EngineConfig) -> Self {
        let mut scene = Self::new();
        if let Some(delta) = config.frame.fixed_delta {
            scene.clock = FrameClock::fixed(delta);
        }
        scene
    }

    // ---------------------------------------------------------------------
    // Membership
    // ---------------------------------------------------------------------

    /// Hand an entity to this scene
    ///
    /// The entity's components receive their `attached` hook immediately, so
    /// entities added in the same frame can resolve references to each other
    /// before any of them update. Actual list membership is deferred to the
    /// next `begin_frame` commit.
    pub fn add(&mut self, mut entity: Entity) -> EntityKey {
        entity.state = LifeStateField(LifeState::Pending);
        let key = self.arena.insert(entity);
        self.roster.request_add(key);
        self.for_each_slot(key, |slot, scene, k| slot.behavior.attached(scene, k));
        log::debug!("entity {key:?} pending addition");
        key
    }

    /// Create a default entity carrying a default-constructed component and
    /// add it
    pub fn spawn<C: Component + Default>(&mut self, position: Vec3) -> EntityKey {
        self.add(Entity::new().at(position).with(C::default()))
    }

    /// Request removal of a committed entity
    ///
    /// Effective only for committed entities not already pending removal.
    /// Remaining update/render callbacks for the entity are cancelled for the
    /// rest of the frame; effects it already applied stay applied. The entity
    /// and its components are destroyed at the next commit.
    pub fn remove(&mut self, key: EntityKey) -> bool {
        if !self.roster.request_remove(key) {
            return false;
        }
        if let Some(entity) = self.arena.get_mut(key) {
            entity.state = LifeStateField(LifeState::PendingRemoval);
        }
        log::debug!("entity {key:?} pending removal");
        true
    }

    /// Attach a behaviour component to an entity already handed to the scene
    pub fn attach(&mut self, key: EntityKey, component: impl Component) -> Result<(), SceneError> {
        self.attach_with(key, ComponentData::default(), component)
    }

    /// Attach a behaviour component with explicit slot data
    ///
    /// Hooks catch up with the owning entity's state: `attached` always
    /// fires, and `entity_added` fires too when the entity is already
    /// committed.
    pub fn attach_with(
        &mut self,
        key: EntityKey,
        data: ComponentData,
        component: impl Component,
    ) -> Result<(), SceneError> {
        let state = self
            .arena
            .get(key)
            .ok_or(SceneError::UnknownEntity(key))?
            .state
            .0;

        let mut slot = ComponentSlot::with_data(data, component);
        slot.behavior.attached(self, key);
        if matches!(state, LifeState::Awake | LifeState::Active) {
            slot.behavior.entity_added(self, key);
        }

        self.arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?
            .components
            .push(slot);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Entity access and mutation
    // ---------------------------------------------------------------------

    /// Read access to an entity
    pub fn entity(&self, key: EntityKey) -> Option<&Entity> {
        self.arena.get(key)
    }

    /// True when the entity is a committed member of this scene
    pub fn contains(&self, key: EntityKey) -> bool {
        self.roster.contains(key)
    }

    /// Committed entities in commit order
    pub fn committed(&self) -> &[EntityKey] {
        self.roster.committed()
    }

    /// Number of committed entities
    pub fn entity_count(&self) -> usize {
        self.roster.len()
    }

    /// Set an entity's world position
    pub fn set_position(&mut self, key: EntityKey, position: Vec3) -> Result<(), SceneError> {
        self.arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?
            .set_position_raw(position);
        Ok(())
    }

    /// Move an entity by a delta
    pub fn translate(&mut self, key: EntityKey, delta: Vec3) -> Result<(), SceneError> {
        let entity = self
            .arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?;
        entity.set_position_raw(entity.position() + delta);
        Ok(())
    }

    /// Enable or disable update participation
    pub fn set_active(&mut self, key: EntityKey, active: bool) -> Result<(), SceneError> {
        self.arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?
            .set_active_raw(active);
        Ok(())
    }

    /// Enable or disable render participation
    pub fn set_visible(&mut self, key: EntityKey, visible: bool) -> Result<(), SceneError> {
        self.arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?
            .set_visible_raw(visible);
        Ok(())
    }

    /// Replace an entity's tag mask
    ///
    /// For committed entities the tag index is updated synchronously, so a
    /// tag query later in the same frame observes the change; for entities
    /// still pending, membership is established at the commit step.
    pub fn set_tags(&mut self, key: EntityKey, tags: TagMask) -> Result<(), SceneError> {
        let entity = self
            .arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?;
        let old = entity.tags();
        if old == tags {
            return Ok(());
        }
        entity.set_tags_raw(tags);
        if Self::is_committed_state(entity.state.0) {
            self.tags.update(key, old, tags);
        }
        Ok(())
    }

    /// Set the depth-sort key; marks the entity's tag lists dirty
    pub fn set_update_order(&mut self, key: EntityKey, order: i32) -> Result<(), SceneError> {
        let entity = self
            .arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?;
        entity.set_update_order_raw(order);
        if Self::is_committed_state(entity.state.0) {
            let mask = entity.tags();
            self.tags.mark_dirty(mask);
        }
        Ok(())
    }

    /// Set the draw sequencing key
    pub fn set_render_order(&mut self, key: EntityKey, order: i32) -> Result<(), SceneError> {
        self.arena
            .get_mut(key)
            .ok_or(SceneError::UnknownEntity(key))?
            .set_render_order_raw(order);
        Ok(())
    }

    /// First component of concrete type `C` on the entity
    pub fn component<C: Component>(&self, key: EntityKey) -> Option<&C> {
        self.arena
            .get(key)?
            .components
            .iter()
            .find_map(ComponentSlot::downcast_ref)
    }

    /// Mutable access to the first component of concrete type `C`
    pub fn component_mut<C: Component>(&mut self, key: EntityKey) -> Option<&mut C> {
        self.arena
            .get_mut(key)?
            .components
            .iter_mut()
            .find_map(ComponentSlot::downcast_mut)
    }

    // ---------------------------------------------------------------------
    // Tag queries
    // ---------------------------------------------------------------------

    /// Committed entities carrying the given tag bit, unsorted
    pub fn tagged(&mut self, bit: u8) -> Result<&[EntityKey], SceneError> {
        self.tags.members(bit)
    }

    /// Committed entities carrying the given tag bit, depth-sorted by
    /// update-order (lazily, only when the list is dirty)
    pub fn tagged_sorted(&mut self, bit: u8) -> Result<&[EntityKey], SceneError> {
        let arena = &self.arena;
        self.tags
            .sorted(bit, |key| arena.get(key).map_or(0, Entity::update_order))
    }

    // ---------------------------------------------------------------------
    // Background tasks and deferred callbacks
    // ---------------------------------------------------------------------

    /// Schedule a background task, resumed once per frame from the update
    /// phase starting next frame
    pub fn schedule(&mut self, task: impl Task) -> TaskKey {
        let key = self.tasks.insert(Some(Box::new(task)));
        self.task_roster.request_add(key);
        key
    }

    /// Request cancellation of a running task
    pub fn cancel_task(&mut self, key: TaskKey) -> bool {
        self.task_roster.request_remove(key)
    }

    /// Number of committed background tasks
    pub fn task_count(&self) -> usize {
        self.task_roster.len()
    }

    /// Register a one-shot callback to run after this frame's render phase
    pub fn run_at_frame_end(&mut self, action: impl FnOnce(&mut Scene) + 'static) {
        self.end_of_frame.push(Box::new(action));
    }

    /// Handle for marshaling work from other threads onto the frame thread
    pub fn next_frame_handle(&self) -> NextFrameHandle {
        NextFrameHandle {
            sender: self.next_frame_tx.clone(),
        }
    }

    /// Install the external object tracker notified from lifecycle commits
    pub fn set_tracker(&mut self, tracker: Box<dyn ObjectTracker>) {
        self.tracker = Some(tracker);
    }

    /// The scene's frame clock
    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    // ---------------------------------------------------------------------
    // Cameras
    // ---------------------------------------------------------------------

    /// Add a camera; returns its index
    pub fn add_camera(&mut self, camera: Camera) -> usize {
        self.cameras.push(camera);
        self.cameras.len() - 1
    }

    /// The scene's cameras
    pub fn cameras(&self) -> &[Camera] {
        &self.cameras
    }

    /// Mutable access to a camera by index
    pub fn camera_mut(&mut self, index: usize) -> Option<&mut Camera> {
        self.cameras.get_mut(index)
    }

    // ---------------------------------------------------------------------
    // Frame phases
    // ---------------------------------------------------------------------

    /// Begin a frame: run marshaled actions, commit the deferred lists, and
    /// advance the clock
    ///
    /// Must be called exactly once per frame, before the committed set is
    /// iterated for update or render. Re-entrant calls (from a lifecycle
    /// hook) are a programming error and abort loudly.
    pub fn begin_frame(&mut self) {
        assert!(
            !self.in_commit,
            "begin_frame re-entered from a lifecycle hook"
        );

        // Cross-thread work runs first so it observes last frame's state and
        // its mutations participate in this frame's commit.
        let marshaled: Vec<NextFrameAction> = self.next_frame_rx.try_iter().collect();
        for action in marshaled {
            action(self);
        }

        self.in_commit = true;
        let batch = self.roster.commit();
        for key in batch.removed {
            self.finish_removal(key);
        }
        for key in batch.added {
            self.finish_addition(key);
        }
        let tasks = self.task_roster.commit();
        for key in tasks.removed {
            self.tasks.remove(key);
        }
        self.in_commit = false;

        self.clock.tick();
    }

    /// Update phase: awake hooks, entity/component updates in commit order,
    /// then background tasks
    pub fn update(&mut self) {
        let delta_time = self.clock.delta();

        // One-time awake hooks. Everything committed this frame is already
        // attached, so same-frame additions observe each other here before
        // any ordinary update runs.
        let awake = std::mem::take(&mut self.awake_set);
        for key in awake {
            let Some(state) = self.arena.get(key).map(|e| e.state.0) else {
                continue;
            };
            if state != LifeState::Awake {
                continue;
            }
            self.for_each_slot(key, |slot, scene, k| slot.behavior.awake(scene, k));
            if let Some(entity) = self.arena.get_mut(key) {
                if entity.state.0 == LifeState::Awake {
                    entity.state = LifeStateField(LifeState::Active);
                }
            }
        }

        // Commit order, deliberately not depth order.
        let committed: Vec<EntityKey> = self.roster.committed().to_vec();
        for key in committed {
            let Some(entity) = self.arena.get(key) else {
                continue;
            };
            if entity.state.0 != LifeState::Active || !entity.is_active() {
                continue;
            }
            self.for_each_slot(key, |slot, scene, k| {
                if slot.data.active {
                    slot.behavior.update(scene, k, delta_time);
                }
            });
        }

        // Background tasks: resumed at most once per frame, never re-entered
        // (the slot is vacated while the task steps).
        let task_keys: Vec<TaskKey> = self.task_roster.committed().to_vec();
        for key in task_keys {
            if self.task_roster.is_pending_removal(key) {
                continue;
            }
            let Some(slot) = self.tasks.get_mut(key) else {
                continue;
            };
            let Some(mut task) = slot.take() else {
                continue;
            };
            let status = task.step(self, delta_time);
            if let Some(slot) = self.tasks.get_mut(key) {
                *slot = Some(task);
            }
            if status == TaskStatus::Finished {
                self.task_roster.request_remove(key);
            }
        }
    }

    /// Render phase: cameras run their passes in render order
    ///
    /// A failed camera pass is logged and skipped; the frame continues.
    pub fn render(&mut self, draw: &mut DrawContext, device: &mut dyn RenderDevice) {
        let mut cameras = std::mem::take(&mut self.cameras);
        cameras.sort_by_key(Camera::order);
        for camera in &mut cameras {
            if let Err(err) = camera.render(self, draw, device) {
                log::error!("camera pass failed and was skipped: {err}");
            }
        }
        self.cameras = cameras;
    }

    /// End-of-frame phase: run and clear the one-shot callbacks
    pub fn end_frame(&mut self) {
        let callbacks = std::mem::take(&mut self.end_of_frame);
        for callback in callbacks {
            callback(self);
        }
    }

    /// Run one full frame: begin, update, render, end
    pub fn step(&mut self, draw: &mut DrawContext, device: &mut dyn RenderDevice) {
        self.begin_frame();
        self.update();
        self.render(draw, device);
        self.end_frame();
    }

    /// Called when this scene becomes the active scene
    pub fn begin(&mut self) {
        log::info!(
            "scene begins ({} entities pending)",
            self.arena.len()
        );
    }

    /// Called when this scene stops being the active scene
    ///
    /// Fires the `scene_ended` hook on every component.
    pub fn end(&mut self) {
        let keys: Vec<EntityKey> = self.arena.keys().collect();
        for key in keys {
            self.for_each_slot(key, |slot, scene, k| slot.behavior.scene_ended(scene, k));
        }
        log::info!("scene ended ({} entities)", self.arena.len());
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    const fn is_committed_state(state: LifeState) -> bool {
        matches!(
            state,
            LifeState::Awake | LifeState::Active | LifeState::PendingRemoval
        )
    }

    /// Run a closure over each component slot of an entity
    ///
    /// The component list is detached from the arena for the duration, so
    /// hooks may freely mutate the scene; components attached during the
    /// walk are merged back afterwards.
    fn for_each_slot<F>(&mut self, key: EntityKey, mut f: F)
    where
        F: FnMut(&mut ComponentSlot, &mut Self, EntityKey),
    {
        let Some(entity) = self.arena.get_mut(key) else {
            return;
        };
        let mut slots = std::mem::take(&mut entity.components);
        for slot in &mut slots {
            f(slot, self, key);
        }
        if let Some(entity) = self.arena.get_mut(key) {
            let attached_during = std::mem::replace(&mut entity.components, slots);
            entity.components.extend(attached_during);
        }
    }

    fn finish_addition(&mut self, key: EntityKey) {
        let Some(entity) = self.arena.get_mut(key) else {
            return;
        };
        entity.state = LifeStateField(LifeState::Awake);
        let mask = entity.tags();
        self.tags.insert(key, mask);
        self.awake_set.push(key);
        self.for_each_slot(key, |slot, scene, k| slot.behavior.entity_added(scene, k));
        self.notify_tracker(|tracker, scene| tracker.entity_added(scene, key));
        log::trace!("entity {key:?} committed");
    }

    fn finish_removal(&mut self, key: EntityKey) {
        self.for_each_slot(key, |slot, scene, k| slot.behavior.entity_removed(scene, k));
        let Some(entity) = self.arena.get_mut(key) else {
            return;
        };
        entity.state = LifeStateField(LifeState::Detached);
        let mask = entity.tags();
        self.tags.remove(key, mask);
        self.notify_tracker(|tracker, scene| tracker.entity_removed(scene, key));
        self.arena.remove(key);
        log::trace!("entity {key:?} detached");
    }

    fn notify_tracker(&mut self, f: impl FnOnce(&mut dyn ObjectTracker, &Self)) {
        if let Some(mut tracker) = self.tracker.take() {
            f(tracker.as_mut(), self);
            self.tracker = Some(tracker);
        }
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.roster.len())
            .field("tasks", &self.task_roster.len())
            .field("cameras", &self.cameras.len())
            .field("frame", &self.clock.frame())
            .finish_non_exhaustive()
    }
}
