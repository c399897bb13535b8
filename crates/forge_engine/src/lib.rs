//! # Forge Engine
//!
//! The runtime core of a real-time interactive engine: an entity/component
//! scene graph coupled to a deferred, priority-ordered rendering pipeline.
//!
//! ## Features
//!
//! - **Deferred mutation**: entities, components, and background tasks can be
//!   added or removed mid-frame without corrupting in-progress iteration
//! - **Tag index**: bitmask-keyed group queries with lazy depth sorting
//! - **Frame orchestration**: a strict begin/update/render/end phase schedule
//! - **Draw-call queue**: priority-ordered flush with GPU state diffing
//! - **Cameras**: projection caching, tag filtering, multi-target passes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use forge_engine::prelude::*;
//!
//! let mut director = Director::new();
//! let mut scene = Scene::new();
//! scene.add_camera(Camera::perspective(60.0, 0.1, 100.0));
//! director.set_scene(scene);
//!
//! let mut device = RecordingDevice::new(1280, 720);
//! loop {
//!     director.frame(&mut device);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod core;
pub mod scene;
pub mod render;
pub mod assets;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        foundation::{
            math::{Mat4, Transform, Vec3},
            time::FrameClock,
        },
        core::config::{EngineConfig, ConfigError},
        scene::{
            Component, ComponentData, Director, Entity, EntityKey, NextFrameHandle, Scene,
            SceneError, TagMask, Task, TaskStatus,
        },
        render::{
            BlendMode, Camera, Color, DepthMode, DrawCall, DrawContext, MaterialId, MeshId,
            RecordingDevice, RenderDevice, RenderError, RenderPass, RenderStates, TextureId,
        },
    };
}
