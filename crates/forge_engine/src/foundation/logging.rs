//! Logging initialization
//!
//! The library itself only emits through the `log` facade; applications
//! pick the backend. [`init`] installs `env_logger` for hosts that do not
//! carry their own, with verbosity controlled through `RUST_LOG` (e.g.
//! `RUST_LOG=forge_engine=trace` to watch commits and queue flushes).

pub use log::{debug, error, info, trace, warn};

/// Install the default `env_logger` backend
///
/// Call once at startup, before the first frame. Hosts with their own `log`
/// backend skip this and the library's output flows there instead.
pub fn init() {
    env_logger::init();
}
