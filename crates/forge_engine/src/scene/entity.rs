//! Entity data and lifecycle state
//!
//! An [`Entity`] is a positioned, taggable object owning an ordered list of
//! component slots. Entities are owned by the scene arena; the scene-assigned
//! [`EntityKey`] is their identity, and membership in more than one scene is
//! impossible by construction.

use slotmap::new_key_type;

use crate::foundation::math::Vec3;

use super::component::{Component, ComponentData, ComponentSlot};
use super::tags::TagMask;

new_key_type! {
    /// Scene-assigned identity token for an entity
    pub struct EntityKey;
}

/// Lifecycle state of an entity within a scene
///
/// Transitions are strictly forward:
/// Unattached -> Pending -> Awake -> Active -> PendingRemoval -> Detached.
/// `Detached` is terminal; removal commit destroys the entity together with
/// its components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifeState {
    /// Constructed but not yet added to a scene
    Unattached,
    /// Added to a scene; attach hooks fired, list membership deferred
    Pending,
    /// Committed this frame; awake hooks not run yet
    Awake,
    /// Ordinary update/render participation
    Active,
    /// Removal requested; remaining callbacks for the frame are cancelled
    PendingRemoval,
    /// Removed from the scene (terminal)
    Detached,
}

/// A positioned object participating in a scene's update/render cycle
pub struct Entity {
    position: Vec3,
    active: bool,
    visible: bool,
    tags: TagMask,
    render_order: i32,
    update_order: i32,
    pub(crate) state: LifeStateField,
    pub(crate) components: Vec<ComponentSlot>,
}

/// Wrapper giving `LifeState` an `Unattached` default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LifeStateField(pub(crate) LifeState);

impl Default for LifeStateField {
    fn default() -> Self {
        Self(LifeState::Unattached)
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::new()
    }
}

impl Entity {
    /// Create an unattached entity with default attributes
    ///
    /// Entities start active and visible, at the origin, with no tags and
    /// both orders at zero.
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 0.0),
            active: true,
            visible: true,
            tags: TagMask::empty(),
            render_order: 0,
            update_order: 0,
            state: LifeStateField::default(),
            components: Vec::new(),
        }
    }

    /// Set the position (builder style)
    #[must_use]
    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    /// Set the tag mask (builder style)
    #[must_use]
    pub fn tagged(mut self, tags: TagMask) -> Self {
        self.tags = tags;
        self
    }

    /// Set the update-order (builder style)
    #[must_use]
    pub fn update_order_at(mut self, order: i32) -> Self {
        self.update_order = order;
        self
    }

    /// Set the render-order (builder style)
    #[must_use]
    pub fn render_order_at(mut self, order: i32) -> Self {
        self.render_order = order;
        self
    }

    /// Attach a behaviour component (builder style)
    ///
    /// Lifecycle hooks fire once the entity is added to a scene.
    #[must_use]
    pub fn with(mut self, component: impl Component) -> Self {
        self.components.push(ComponentSlot::new(component));
        self
    }

    /// Attach a behaviour component with explicit slot data (builder style)
    #[must_use]
    pub fn with_slot(mut self, data: ComponentData, component: impl Component) -> Self {
        self.components
            .push(ComponentSlot::with_data(data, component));
        self
    }

    /// Position in world space
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Whether the entity participates in the update phase
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the entity participates in the render phase
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Current tag mask
    pub fn tags(&self) -> TagMask {
        self.tags
    }

    /// Draw sequencing key, independent of update order
    pub fn render_order(&self) -> i32 {
        self.render_order
    }

    /// Depth-sort key used by the tag index
    pub fn update_order(&self) -> i32 {
        self.update_order
    }

    /// Lifecycle state within the owning scene
    pub fn state(&self) -> LifeState {
        self.state.0
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Slot data for the component at `index`
    pub fn component_data(&self, index: usize) -> Option<&ComponentData> {
        self.components.get(index).map(|slot| &slot.data)
    }

    // Direct field writes for unattached entities and scene-internal setters.
    // Attached entities must mutate through `Scene` so the tag index stays
    // consistent.

    pub(crate) fn set_position_raw(&mut self, position: Vec3) {
        self.position = position;
    }

    pub(crate) fn set_active_raw(&mut self, active: bool) {
        self.active = active;
    }

    pub(crate) fn set_visible_raw(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub(crate) fn set_tags_raw(&mut self, tags: TagMask) {
        self.tags = tags;
    }

    pub(crate) fn set_update_order_raw(&mut self, order: i32) {
        self.update_order = order;
    }

    pub(crate) fn set_render_order_raw(&mut self, order: i32) {
        self.render_order = order;
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("position", &self.position)
            .field("active", &self.active)
            .field("visible", &self.visible)
            .field("tags", &self.tags)
            .field("render_order", &self.render_order)
            .field("update_order", &self.update_order)
            .field("state", &self.state.0)
            .field("components", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_defaults() {
        let entity = Entity::new();
        assert!(entity.is_active());
        assert!(entity.is_visible());
        assert_eq!(entity.state(), LifeState::Unattached);
        assert_eq!(entity.tags(), TagMask::empty());
        assert_eq!(entity.component_count(), 0);
    }

    #[test]
    fn test_builder_chain() {
        let entity = Entity::new()
            .at(Vec3::new(1.0, 0.0, 0.0))
            .tagged(TagMask::bit(3).unwrap())
            .update_order_at(5)
            .render_order_at(-2);

        assert_eq!(entity.position().x, 1.0);
        assert_eq!(entity.update_order(), 5);
        assert_eq!(entity.render_order(), -2);
        assert!(entity.tags().contains(TagMask::bit(3).unwrap()));
    }
}
