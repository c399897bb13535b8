//! Scene stack direction: owns the active scene and its draw context

use crate::render::{DrawContext, RenderDevice};

use super::scene::Scene;

/// Owns the active scene and steps it through whole frames
///
/// Scene transitions are deferred: replacing the scene mid-frame takes
/// effect only after the current frame finishes, so every entity of the
/// outgoing scene observes a complete final frame.
#[derive(Debug, Default)]
pub struct Director {
    current: Option<Scene>,
    pending: Option<Scene>,
    draw: DrawContext,
}

impl Director {
    /// Create a director with no scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a scene
    ///
    /// With no active scene the new one becomes current immediately; with an
    /// active scene the handoff waits for the end of the current frame.
    /// A second call before the handoff replaces the still-pending scene.
    pub fn set_scene(&mut self, scene: Scene) {
        if self.current.is_some() {
            log::info!("scene transition queued");
            self.pending = Some(scene);
        } else {
            let mut scene = scene;
            scene.begin();
            self.current = Some(scene);
        }
    }

    /// The active scene
    pub fn scene(&self) -> Option<&Scene> {
        self.current.as_ref()
    }

    /// Mutable access to the active scene
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.current.as_mut()
    }

    /// Run one full frame on the active scene, then apply any queued scene
    /// transition
    pub fn frame(&mut self, device: &mut dyn RenderDevice) {
        if let Some(scene) = self.current.as_mut() {
            scene.step(&mut self.draw, device);
        }
        if let Some(mut incoming) = self.pending.take() {
            if let Some(mut outgoing) = self.current.take() {
                outgoing.end();
            }
            incoming.begin();
            self.current = Some(incoming);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingDevice;
    use crate::scene::Entity;

    #[test]
    fn test_first_scene_becomes_current_immediately() {
        let mut director = Director::new();
        assert!(director.scene().is_none());
        director.set_scene(Scene::new());
        assert!(director.scene().is_some());
    }

    #[test]
    fn test_transition_is_deferred_until_frame_end() {
        let mut device = RecordingDevice::new(640, 480);
        let mut director = Director::new();

        let mut first = Scene::new();
        first.add(Entity::new());
        director.set_scene(first);
        director.frame(&mut device);
        assert_eq!(director.scene().unwrap().entity_count(), 1);

        // Queue a replacement: the old scene still finishes this frame.
        director.set_scene(Scene::new());
        assert_eq!(director.scene().unwrap().entity_count(), 1);

        director.frame(&mut device);
        assert_eq!(director.scene().unwrap().entity_count(), 0);
    }
}
