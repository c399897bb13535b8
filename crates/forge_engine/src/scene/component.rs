//! Component trait and slot data
//!
//! Behaviour is attached to entities as boxed trait objects with lifecycle
//! hooks, dispatched dynamically. Each slot additionally carries the
//! per-component flags the engine itself consults (active, visible, tag
//! mask, render-order override), so behaviours stay free of bookkeeping.

use std::any::Any;

use crate::render::RenderPass;

use super::entity::EntityKey;
use super::scene::Scene;
use super::tags::TagMask;

/// Engine-managed data carried by every component slot
#[derive(Debug, Clone)]
pub struct ComponentData {
    /// Whether the component receives update hooks
    pub active: bool,
    /// Whether the component receives render hooks
    pub visible: bool,
    /// Component tag mask, consulted by camera component filters
    pub tags: TagMask,
    /// Draw sequencing override; falls back to the owning entity's
    /// render-order when unset
    pub render_order: Option<i32>,
}

impl Default for ComponentData {
    fn default() -> Self {
        Self {
            active: true,
            visible: true,
            tags: TagMask::empty(),
            render_order: None,
        }
    }
}

/// Behaviour hooks fired over an entity's lifetime
///
/// All hooks default to no-ops; implementations override the ones they care
/// about. Update-phase hooks receive the owning scene mutably (the owning
/// entity's component list is temporarily detached while its hooks run, so
/// re-entrant component iteration cannot occur). Render hooks are read-only
/// over the scene and enqueue work through the [`RenderPass`].
///
/// Hook order over a lifetime:
/// 1. [`attached`](Self::attached) - immediately on `Scene::add`, before the
///    entity is committed, so same-frame additions can resolve references to
///    each other
/// 2. [`entity_added`](Self::entity_added) - at the commit step
/// 3. [`awake`](Self::awake) - once, at the start of the first update cycle
///    after commit
/// 4. [`update`](Self::update) / [`render`](Self::render) - every frame while
///    active/visible
/// 5. [`entity_removed`](Self::entity_removed) - at the removal commit
/// 6. [`scene_ended`](Self::scene_ended) - when the owning scene ends
#[allow(unused_variables)]
pub trait Component: Any {
    /// The owning entity has been handed to a scene (not yet committed)
    fn attached(&mut self, scene: &mut Scene, entity: EntityKey) {}

    /// The owning entity joined the scene's committed set
    fn entity_added(&mut self, scene: &mut Scene, entity: EntityKey) {}

    /// One-time hook at the start of the first update cycle after commit
    ///
    /// Everything committed in the same frame is already attached and
    /// observable here, before any of it runs an ordinary update.
    fn awake(&mut self, scene: &mut Scene, entity: EntityKey) {}

    /// Per-frame update while the entity and component are active
    fn update(&mut self, scene: &mut Scene, entity: EntityKey, delta_time: f32) {}

    /// Per-frame render while the entity and component are visible
    fn render(&self, scene: &Scene, entity: EntityKey, pass: &mut RenderPass<'_>) {}

    /// The owning entity's removal was committed
    fn entity_removed(&mut self, scene: &mut Scene, entity: EntityKey) {}

    /// The owning scene is ending
    fn scene_ended(&mut self, scene: &mut Scene, entity: EntityKey) {}
}

/// A behaviour with its engine-managed slot data
pub struct ComponentSlot {
    /// Flags and overrides consulted by the engine
    pub data: ComponentData,
    /// The behaviour itself
    pub(crate) behavior: Box<dyn Component>,
}

impl ComponentSlot {
    /// Wrap a behaviour with default slot data
    pub fn new(component: impl Component) -> Self {
        Self::with_data(ComponentData::default(), component)
    }

    /// Wrap a behaviour with explicit slot data
    pub fn with_data(data: ComponentData, component: impl Component) -> Self {
        Self {
            data,
            behavior: Box::new(component),
        }
    }

    /// Downcast the behaviour to a concrete type
    pub fn downcast_ref<C: Component>(&self) -> Option<&C> {
        let any: &dyn Any = self.behavior.as_ref();
        any.downcast_ref::<C>()
    }

    /// Mutably downcast the behaviour to a concrete type
    pub fn downcast_mut<C: Component>(&mut self) -> Option<&mut C> {
        let any: &mut dyn Any = self.behavior.as_mut();
        any.downcast_mut::<C>()
    }
}

impl std::fmt::Debug for ComponentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSlot")
            .field("data", &self.data)
            .finish_non_exhaustive()
    }
}
