//! Cameras and per-camera render passes
//!
//! A camera owns a point of view (projection + view), a target selection,
//! and the filters deciding which entities and components participate in its
//! pass. Rendering a camera walks the visible entities in render order and
//! hands each participating component a [`RenderPass`] to emit draw calls
//! through.

use crate::foundation::math::{
    deg_to_rad, look_at, orthographic, perspective, view_to_clip, Mat4, Vec3,
};
use crate::scene::{ComponentData, Entity, EntityKey, LifeState, Scene, TagMask};

use super::draw::{DrawCall, DrawContext};
use super::device::RenderDevice;
use super::state::{Color, TargetId};
use super::RenderError;

/// Projection shape; aspect ratio comes from the viewport at render time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Perspective frustum
    Perspective {
        /// Vertical field of view in degrees
        fov_y: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Orthographic box
    Orthographic {
        /// Vertical extent in world units
        height: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

/// Where the camera's aspect ratio comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewport {
    /// Track the device surface; resizing invalidates the cached projection
    Surface,
    /// Fixed logical size, independent of the surface
    Fixed {
        /// Logical width in pixels
        width: u32,
        /// Logical height in pixels
        height: u32,
    },
}

/// Entity participation filter for a camera pass
pub enum EntityFilter {
    /// Every visible entity participates
    All,
    /// Only entities carrying the tag bit
    Tagged(u8),
    /// Only entities not carrying the tag bit
    NotTagged(u8),
    /// Arbitrary predicate over the entity
    Custom(Box<dyn Fn(&Entity) -> bool>),
}

impl EntityFilter {
    fn admits(&self, entity: &Entity) -> bool {
        match self {
            Self::All => true,
            Self::Tagged(bit) => TagMask::bit(*bit).is_ok_and(|m| entity.tags().contains(m)),
            Self::NotTagged(bit) => !TagMask::bit(*bit).is_ok_and(|m| entity.tags().contains(m)),
            Self::Custom(predicate) => predicate(entity),
        }
    }
}

impl std::fmt::Debug for EntityFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Tagged(bit) => write!(f, "Tagged({bit})"),
            Self::NotTagged(bit) => write!(f, "NotTagged({bit})"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Component participation filter, applied per slot after the entity filter
pub enum ComponentFilter {
    /// Every visible component participates
    All,
    /// Only component slots carrying the tag bit
    Tagged(u8),
    /// Only component slots not carrying the tag bit
    NotTagged(u8),
    /// Arbitrary predicate over the slot data
    Custom(Box<dyn Fn(&ComponentData) -> bool>),
}

impl ComponentFilter {
    fn admits(&self, data: &ComponentData) -> bool {
        match self {
            Self::All => true,
            Self::Tagged(bit) => TagMask::bit(*bit).is_ok_and(|m| data.tags.contains(m)),
            Self::NotTagged(bit) => !TagMask::bit(*bit).is_ok_and(|m| data.tags.contains(m)),
            Self::Custom(predicate) => predicate(data),
        }
    }
}

impl std::fmt::Debug for ComponentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Tagged(bit) => write!(f, "Tagged({bit})"),
            Self::NotTagged(bit) => write!(f, "NotTagged({bit})"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Where the camera's view matrix comes from
#[derive(Debug, Clone, Copy)]
enum ViewSource {
    /// Classic eye/target/up
    LookAt { eye: Vec3, target: Vec3, up: Vec3 },
    /// Follow an entity's position, looking down -Z
    Entity(EntityKey),
    /// Explicit view matrix
    Matrix(Mat4),
}

#[derive(Debug, Clone, Copy)]
struct CachedProjection {
    aspect: f32,
    matrix: Mat4,
}

/// A camera: point of view, target selection, and participation filters
#[derive(Debug)]
pub struct Camera {
    order: i32,
    projection: Projection,
    viewport: Viewport,
    view: ViewSource,
    targets: Vec<TargetId>,
    clear_color: Option<Color>,
    entity_filter: EntityFilter,
    component_filter: ComponentFilter,
    cached: Option<CachedProjection>,
    /// Cached view for the static sources; `Entity` recomputes every pass
    cached_view: Option<Mat4>,
}

impl Camera {
    /// Perspective camera looking at the origin from `(0, 0, 10)`
    #[must_use]
    pub fn perspective(fov_degrees: f32, near: f32, far: f32) -> Self {
        Self::with_projection(Projection::Perspective {
            fov_y: fov_degrees,
            near,
            far,
        })
    }

    /// Orthographic camera of the given vertical extent
    #[must_use]
    pub fn orthographic(height: f32, near: f32, far: f32) -> Self {
        Self::with_projection(Projection::Orthographic { height, near, far })
    }

    fn with_projection(projection: Projection) -> Self {
        Self {
            order: 0,
            projection,
            viewport: Viewport::Surface,
            view: ViewSource::LookAt {
                eye: Vec3::new(0.0, 0.0, 10.0),
                target: Vec3::new(0.0, 0.0, 0.0),
                up: Vec3::new(0.0, 1.0, 0.0),
            },
            targets: Vec::new(),
            clear_color: Some(Color::BLACK),
            entity_filter: EntityFilter::All,
            component_filter: ComponentFilter::All,
            cached: None,
            cached_view: None,
        }
    }

    /// Set the pass order; lower orders render first
    #[must_use]
    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Render into offscreen targets instead of the surface
    #[must_use]
    pub fn with_targets(mut self, targets: Vec<TargetId>) -> Self {
        self.targets = targets;
        self
    }

    /// Set the clear color, or `None` to render over existing contents
    #[must_use]
    pub fn with_clear(mut self, clear: Option<Color>) -> Self {
        self.clear_color = clear;
        self
    }

    /// View the scene from `eye` towards `target`
    #[must_use]
    pub fn looking_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.set_look_at(eye, target, up);
        self
    }

    /// Derive the view from an entity's position each frame
    #[must_use]
    pub fn following(mut self, entity: EntityKey) -> Self {
        self.view = ViewSource::Entity(entity);
        self.cached_view = None;
        self
    }

    /// Use an explicit view matrix
    #[must_use]
    pub fn with_view(mut self, view: Mat4) -> Self {
        self.view = ViewSource::Matrix(view);
        self.cached_view = None;
        self
    }

    /// Move the viewpoint; invalidates the cached view matrix
    pub fn set_look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        self.view = ViewSource::LookAt { eye, target, up };
        self.cached_view = None;
    }

    /// Restrict which entities this camera draws
    #[must_use]
    pub fn filter_entities(mut self, filter: EntityFilter) -> Self {
        self.entity_filter = filter;
        self
    }

    /// Restrict which component slots this camera draws
    #[must_use]
    pub fn filter_components(mut self, filter: ComponentFilter) -> Self {
        self.component_filter = filter;
        self
    }

    /// Override the aspect source
    #[must_use]
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Pass order
    pub fn order(&self) -> i32 {
        self.order
    }

    /// Redirect the pass into different targets; empty means the surface
    pub fn set_render_targets(&mut self, targets: Vec<TargetId>) {
        self.targets = targets;
    }

    /// Replace the projection; invalidates the cached matrix
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.cached = None;
    }

    /// Projection matrix for the given aspect, rebuilt only when the
    /// projection or aspect changed since the last call
    pub fn projection_matrix(&mut self, aspect: f32) -> Mat4 {
        if let Some(cached) = self.cached {
            if (cached.aspect - aspect).abs() < f32::EPSILON {
                return cached.matrix;
            }
        }
        let matrix = match self.projection {
            Projection::Perspective { fov_y, near, far } => {
                perspective(deg_to_rad(fov_y), aspect, near, far)
            }
            Projection::Orthographic { height, near, far } => {
                orthographic(height, aspect, near, far)
            }
        };
        self.cached = Some(CachedProjection { aspect, matrix });
        matrix
    }

    /// View matrix, rebuilt only when the view source changed since the
    /// last pass; the `Entity` source recomputes whenever the followed
    /// position moves
    fn view_matrix(&mut self, scene: &Scene) -> Result<Mat4, RenderError> {
        match self.view {
            ViewSource::LookAt { eye, target, up } => {
                Ok(*self
                    .cached_view
                    .get_or_insert_with(|| look_at(eye, target, up)))
            }
            ViewSource::Matrix(view) => Ok(view),
            ViewSource::Entity(key) => {
                let entity = scene
                    .entity(key)
                    .ok_or(RenderError::ViewEntityMissing(key))?;
                let eye = entity.position();
                let target = eye + Vec3::new(0.0, 0.0, -1.0);
                Ok(look_at(eye, target, Vec3::new(0.0, 1.0, 0.0)))
            }
        }
    }

    fn aspect(&self, device: &dyn RenderDevice) -> f32 {
        let (width, height) = match self.viewport {
            Viewport::Surface => device.surface_size(),
            Viewport::Fixed { width, height } => (width, height),
        };
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    /// Run this camera's pass
    ///
    /// Visible committed entities are walked in render order (ties keep
    /// commit order); each participating component enqueues draw calls, and
    /// the queue flushes into the device before the method returns.
    pub fn render(
        &mut self,
        scene: &Scene,
        draw: &mut DrawContext,
        device: &mut dyn RenderDevice,
    ) -> Result<(), RenderError> {
        let aspect = self.aspect(device);
        let projection = self.projection_matrix(aspect);
        let view = self.view_matrix(scene)?;
        let view_projection = projection * view_to_clip() * view;

        device.begin_targets(&self.targets)?;
        if let Some(color) = self.clear_color {
            device.clear(color);
        }

        // Stable sort keeps commit order among equal render orders.
        let mut participants: Vec<(i32, EntityKey)> = scene
            .committed()
            .iter()
            .filter_map(|&key| {
                let entity = scene.entity(key)?;
                let drawable = entity.is_visible()
                    && matches!(entity.state(), LifeState::Awake | LifeState::Active)
                    && self.entity_filter.admits(entity);
                drawable.then(|| (entity.render_order(), key))
            })
            .collect();
        participants.sort_by_key(|&(order, _)| order);

        for (entity_order, key) in participants {
            let Some(entity) = scene.entity(key) else {
                continue;
            };
            for slot in &entity.components {
                if !slot.data.visible || !self.component_filter.admits(&slot.data) {
                    continue;
                }
                let order = slot.data.render_order.unwrap_or(entity_order);
                let mut pass = RenderPass {
                    draw,
                    view,
                    projection,
                    view_projection,
                    order,
                };
                slot.behavior.render(scene, key, &mut pass);
            }
        }

        draw.flush(device);
        Ok(())
    }
}

/// Per-component draw submission surface for one camera pass
pub struct RenderPass<'a> {
    draw: &'a mut DrawContext,
    /// View matrix of the owning camera
    pub view: Mat4,
    /// Projection matrix of the owning camera
    pub projection: Mat4,
    /// Premultiplied view-projection, including the view-to-clip bridge;
    /// multiplying by a model matrix yields clip-space coordinates directly
    pub view_projection: Mat4,
    /// Effective render order of the component being drawn
    pub order: i32,
}

impl RenderPass<'_> {
    /// Queue a draw call under the component's render order
    pub fn enqueue(&mut self, call: DrawCall) {
        self.draw.enqueue(self.order, call);
    }

    /// Queue a draw call under an explicit render order
    pub fn enqueue_at(&mut self, order: i32, call: DrawCall) {
        self.draw.enqueue(order, call);
    }

    /// Push a transform layer for nested submissions
    pub fn push_layer(&mut self, transform: Mat4) {
        self.draw.push_layer(transform);
    }

    /// Pop the top transform layer
    pub fn pop_layer(&mut self) {
        self.draw.pop_layer();
    }
}

impl std::fmt::Debug for RenderPass<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPass")
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::device::{DeviceOp, RecordingDevice};
    use crate::render::state::MeshId;
    use crate::scene::{Component, Entity};

    /// Draws its entity's mesh id when asked
    struct MeshSprite {
        mesh: MeshId,
    }

    impl Component for MeshSprite {
        fn render(&self, _scene: &Scene, _entity: EntityKey, pass: &mut RenderPass<'_>) {
            pass.enqueue(DrawCall::new(self.mesh, Mat4::identity()));
        }
    }

    fn drawn(device: &RecordingDevice) -> Vec<MeshId> {
        device
            .ops()
            .iter()
            .filter_map(|op| match op {
                DeviceOp::Draw(mesh) => Some(*mesh),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_projection_matrix_is_cached_per_aspect() {
        let mut camera = Camera::perspective(60.0, 0.1, 100.0);
        let first = camera.projection_matrix(16.0 / 9.0);
        let second = camera.projection_matrix(16.0 / 9.0);
        assert_eq!(first, second);
        let resized = camera.projection_matrix(4.0 / 3.0);
        assert_ne!(first, resized);
    }

    #[test]
    fn test_set_projection_invalidates_cache() {
        let mut camera = Camera::perspective(60.0, 0.1, 100.0);
        let before = camera.projection_matrix(1.0);
        camera.set_projection(Projection::Perspective {
            fov_y: 90.0,
            near: 0.1,
            far: 100.0,
        });
        let after = camera.projection_matrix(1.0);
        assert_ne!(before, after);
    }

    #[test]
    fn test_pass_draws_visible_entities_in_render_order() {
        let mut scene = Scene::new();
        scene.add(
            Entity::new()
                .render_order_at(5)
                .with(MeshSprite { mesh: MeshId(5) }),
        );
        scene.add(
            Entity::new()
                .render_order_at(1)
                .with(MeshSprite { mesh: MeshId(1) }),
        );
        let hidden = scene.add(Entity::new().with(MeshSprite { mesh: MeshId(9) }));
        scene.begin_frame();
        scene.set_visible(hidden, false).unwrap();

        let mut camera = Camera::perspective(60.0, 0.1, 100.0);
        let mut draw = DrawContext::new();
        let mut device = RecordingDevice::new(64, 64);
        camera.render(&scene, &mut draw, &mut device).unwrap();

        assert_eq!(drawn(&device), vec![MeshId(1), MeshId(5)]);
    }

    #[test]
    fn test_entity_filter_restricts_participation() {
        let mut scene = Scene::new();
        let bit = TagMask::bit(3).unwrap();
        scene.add(Entity::new().tagged(bit).with(MeshSprite { mesh: MeshId(1) }));
        scene.add(Entity::new().with(MeshSprite { mesh: MeshId(2) }));
        scene.begin_frame();

        let mut draw = DrawContext::new();
        let mut device = RecordingDevice::new(64, 64);
        let mut camera =
            Camera::perspective(60.0, 0.1, 100.0).filter_entities(EntityFilter::Tagged(3));
        camera.render(&scene, &mut draw, &mut device).unwrap();
        assert_eq!(drawn(&device), vec![MeshId(1)]);

        device.reset();
        let mut camera =
            Camera::perspective(60.0, 0.1, 100.0).filter_entities(EntityFilter::NotTagged(3));
        camera.render(&scene, &mut draw, &mut device).unwrap();
        assert_eq!(drawn(&device), vec![MeshId(2)]);
    }

    #[test]
    fn test_pass_view_projection_lands_visible_points_in_clip_volume() {
        use std::cell::RefCell;
        use std::rc::Rc;

        /// Captures the pass matrices instead of drawing
        struct MatrixCapture {
            captured: Rc<RefCell<Option<Mat4>>>,
        }
        impl Component for MatrixCapture {
            fn render(&self, _scene: &Scene, _entity: EntityKey, pass: &mut RenderPass<'_>) {
                *self.captured.borrow_mut() = Some(pass.view_projection);
            }
        }

        let captured: Rc<RefCell<Option<Mat4>>> = Rc::default();
        let mut scene = Scene::new();
        scene.add(Entity::new().with(MatrixCapture {
            captured: Rc::clone(&captured),
        }));
        scene.begin_frame();

        // Default camera: eye (0, 0, 10) looking at the origin.
        let mut camera = Camera::perspective(60.0, 0.1, 100.0);
        let mut draw = DrawContext::new();
        let mut device = RecordingDevice::new(64, 64);
        camera.render(&scene, &mut draw, &mut device).unwrap();

        let view_projection = captured.borrow().expect("render hook ran");
        let clip = view_projection * crate::foundation::math::Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!(
            clip.w > 0.0,
            "origin is in front of the camera, got w={}",
            clip.w
        );
        let depth = clip.z / clip.w;
        assert!((0.0..=1.0).contains(&depth), "depth out of range: {depth}");
    }

    #[test]
    fn test_view_matrix_is_cached_until_the_viewpoint_moves() {
        let mut scene = Scene::new();
        scene.begin_frame();

        let mut camera = Camera::perspective(60.0, 0.1, 100.0);
        assert!(camera.cached_view.is_none());

        let first = camera.view_matrix(&scene).unwrap();
        assert!(camera.cached_view.is_some(), "static view is cached");
        assert_eq!(camera.view_matrix(&scene).unwrap(), first);

        camera.set_look_at(
            Vec3::new(5.0, 0.0, 10.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert!(camera.cached_view.is_none(), "moving invalidates the cache");
        assert_ne!(camera.view_matrix(&scene).unwrap(), first);
    }

    #[test]
    fn test_missing_view_entity_fails_the_pass() {
        let mut scene = Scene::new();
        let key = scene.add(Entity::new());
        scene.begin_frame();
        scene.remove(key);
        scene.begin_frame();

        let mut camera = Camera::perspective(60.0, 0.1, 100.0).following(key);
        let mut draw = DrawContext::new();
        let mut device = RecordingDevice::new(64, 64);
        assert!(matches!(
            camera.render(&scene, &mut draw, &mut device),
            Err(RenderError::ViewEntityMissing(_))
        ));
    }

    #[test]
    fn test_offscreen_camera_begins_its_targets() {
        let mut scene = Scene::new();
        scene.begin_frame();

        let mut camera = Camera::orthographic(10.0, 0.1, 100.0)
            .with_targets(vec![TargetId(7)])
            .with_clear(None);
        let mut draw = DrawContext::new();
        let mut device = RecordingDevice::new(64, 64);
        camera.render(&scene, &mut draw, &mut device).unwrap();

        assert_eq!(device.ops(), &[DeviceOp::BeginTargets(vec![TargetId(7)])]);
    }
}
