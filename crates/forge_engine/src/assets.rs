//! Content boundary: how external asset systems feed the core
//!
//! The core never loads files itself. An application supplies a
//! [`ContentProvider`] that reads asset bytes synchronously, and hot-reload
//! watchers running on other threads marshal their [`AssetEvent`]s onto the
//! frame thread through a
//! [`NextFrameHandle`](crate::scene::NextFrameHandle) - GPU state must
//! never be touched from the watcher's thread.

use std::path::{Path, PathBuf};

/// Errors an asset provider can surface
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The path does not exist in the provider's catalog
    #[error("unknown asset {0:?}")]
    Unknown(PathBuf),

    /// The asset exists but could not be read
    ///
    /// Transient open failures are retried a bounded number of times by the
    /// provider before this surfaces; the caller never retries.
    #[error("asset {path:?} failed to load: {reason}")]
    Load {
        /// Asset path
        path: PathBuf,
        /// Provider-specific failure description
        reason: String,
    },
}

/// Synchronous content source
///
/// Implementations own storage, caching, and retry policy; the core only
/// consumes the bytes they return.
pub trait ContentProvider {
    /// Read the content at `path` in full
    fn content(&mut self, path: &Path) -> Result<Vec<u8>, ContentError>;
}

/// Notification emitted by asset watchers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// A source file changed on disk
    Changed(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use std::sync::mpsc;

    #[test]
    fn test_watcher_marshals_reload_onto_frame_thread() {
        let mut scene = Scene::new();
        let handle = scene.next_frame_handle();
        let (tx, rx) = mpsc::channel();

        // A watcher thread notices a change and queues the reload work; it
        // never touches the scene directly.
        std::thread::spawn(move || {
            let event = AssetEvent::Changed(PathBuf::from("textures/hull.png"));
            handle.run_on_next_frame(move |_scene| {
                tx.send(event).unwrap();
            });
        })
        .join()
        .unwrap();

        scene.begin_frame();
        assert_eq!(
            rx.try_recv().unwrap(),
            AssetEvent::Changed(PathBuf::from("textures/hull.png"))
        );
    }
}
