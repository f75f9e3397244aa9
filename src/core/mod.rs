//!
//! `core` contains the primitives the rest of the crate is built from: the
//! per-device in-flight counter, the worker-pool fallback for synchronous
//! backends, and the call-stub/dispatch plumbing that ties them together.
use nix::errno::Errno;
use snafu::Snafu;

pub use dispatch::{dispatch, DispatchOutcome};
pub use stub::{AsyncOp, PendingCommand, Stub, SubmitOutcome};
pub use tracker::AioTracker;
pub use work_queue::{WorkEntry, WorkerPool};

pub mod dispatch;
pub mod stub;
pub mod tracker;
pub mod work_queue;

/// Errors raised by the setup/configuration surface of the dispatch core.
///
/// Errors that occur while a command is in flight are never represented
/// here: they are mapped to a [`crate::status::Status`] and travel with the
/// command itself, not as a Rust `Result`.
#[derive(Debug, Snafu, Clone)]
#[snafu(visibility(pub(crate)), context(suffix(false)))]
pub enum CoreError {
    #[snafu(display("device {} not found", name))]
    DeviceNotFound { name: String },
    #[snafu(display("failed to open device {}: {}", name, source))]
    OpenDevice { name: String, source: Errno },
    #[snafu(display("invalid work-queue depth {}: must be > 0", depth))]
    InvalidQueueDepth { depth: usize },
    #[snafu(display("failed to parse configuration: {}", source))]
    ConfigParse { source: serde_yaml::Error },
}
