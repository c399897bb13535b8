//! Headless demo: a ring of orbiting bodies around a star
//!
//! Drives the engine core for a few seconds of simulated time against the
//! recording device and reports what the frame pipeline actually submitted.
//! Useful as a smoke test of the whole frame schedule without a GPU.

use forge_engine::prelude::*;
use forge_engine::render::EntityFilter;
use forge_engine::scene::task::despawn_after;

/// Tag bit carried by every orbiting body
const BODY_TAG: u8 = 0;

/// Spins an entity around the origin at a fixed angular speed
struct Orbit {
    radius: f32,
    speed: f32,
    angle: f32,
    mesh: MeshId,
    material: MaterialId,
}

impl Component for Orbit {
    fn update(&mut self, scene: &mut Scene, entity: EntityKey, delta_time: f32) {
        self.angle += self.speed * delta_time;
        let position = Vec3::new(
            self.radius * self.angle.cos(),
            0.0,
            self.radius * self.angle.sin(),
        );
        if let Err(err) = scene.set_position(entity, position) {
            log::warn!("orbit update lost its entity: {err}");
        }
    }

    fn render(&self, scene: &Scene, entity: EntityKey, pass: &mut RenderPass<'_>) {
        let Some(entity) = scene.entity(entity) else {
            return;
        };
        let transform = Transform::from_position(entity.position()).to_matrix();
        pass.enqueue(
            DrawCall::new(self.mesh, transform).with_states(RenderStates::opaque(self.material)),
        );
    }
}

/// Stationary body at the origin
struct Star {
    mesh: MeshId,
    material: MaterialId,
}

impl Component for Star {
    fn render(&self, _scene: &Scene, _entity: EntityKey, pass: &mut RenderPass<'_>) {
        pass.enqueue(
            DrawCall::new(self.mesh, Mat4::identity())
                .with_states(RenderStates::opaque(self.material)),
        );
    }
}

fn build_scene(config: &EngineConfig) -> Scene {
    let mut scene = Scene::with_config(config);
    let body_tag = TagMask::bit(BODY_TAG).expect("tag bit in range");

    scene.add(
        Entity::new().render_order_at(-1).with(Star {
            mesh: MeshId(0),
            material: MaterialId(0),
        }),
    );

    for i in 0..6 {
        let radius = 2.0 + i as f32;
        scene.add(
            Entity::new()
                .tagged(body_tag)
                .render_order_at(i)
                .with(Orbit {
                    radius,
                    speed: 1.0 / radius,
                    angle: i as f32,
                    mesh: MeshId(1),
                    material: MaterialId(1),
                }),
        );
    }

    // One body burns out after two seconds of scene time.
    let doomed = scene.add(Entity::new().tagged(body_tag).with(Orbit {
        radius: 9.0,
        speed: 0.4,
        angle: 0.0,
        mesh: MeshId(2),
        material: MaterialId(1),
    }));
    scene.schedule(despawn_after(doomed, 2.0));

    scene.add_camera(
        Camera::perspective(60.0, 0.1, 100.0)
            .looking_at(
                Vec3::new(0.0, 12.0, 12.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            )
            .filter_entities(EntityFilter::All),
    );

    scene
}

fn main() {
    env_logger::init();

    let mut config = EngineConfig::load("orbit.toml").unwrap_or_else(|err| {
        log::info!("no usable config ({err}); using defaults");
        EngineConfig::default()
    });
    // Headless run: always step simulated time, never the wall clock.
    config.frame.fixed_delta.get_or_insert(1.0 / 60.0);

    let mut device = RecordingDevice::new(config.window.width, config.window.height);
    let mut director = Director::new();
    director.set_scene(build_scene(&config));

    // Four seconds of simulated time at the fixed step.
    let frames = 240;
    let mut total_draws = 0usize;
    for _ in 0..frames {
        device.reset();
        director.frame(&mut device);
        total_draws += device.draw_count();
    }

    let scene = director.scene().expect("active scene");
    log::info!(
        "ran {frames} frames: {} entities alive, {} draws submitted, {} state changes last frame",
        scene.entity_count(),
        total_draws,
        device.state_change_count(),
    );
    println!(
        "{frames} frames, {} entities alive, {total_draws} draw calls",
        scene.entity_count()
    );
}
