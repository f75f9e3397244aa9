//! The device-facing collaborator interfaces (§6): `Backend`, the
//! storage adapter the core drives, and `Transport`, the kernel-facing
//! side that delivered the command in the first place. `Device` ties a
//! backend, a transport, and the per-device core state together.

use std::sync::Arc;

use nix::errno::Errno;
use uuid::Uuid;

use crate::command::Command;
use crate::core::stub::Continuation;
use crate::core::{AioTracker, AsyncOp, SubmitOutcome, WorkerPool};
use crate::iovec::IoVector;
use crate::status::Status;

/// A pluggable storage adapter. Every method below except `submit` is
/// blocking and is only ever invoked from a worker-pool thread; `submit`
/// must not block and is only invoked when [`Backend::aio_supported`]
/// returns `true`.
pub trait Backend: Send + Sync {
    fn aio_supported(&self) -> bool {
        false
    }

    fn open(&self) -> Result<(), Errno>;

    fn close(&self);

    fn read(&self, iov: &mut IoVector, offset: u64) -> Result<usize, Errno>;

    fn write(&self, iov: &mut IoVector, offset: u64) -> Result<usize, Errno>;

    fn flush(&self) -> Result<(), Errno>;

    /// Whether the router should attempt a [`Backend::handle_cmd`]
    /// passthrough before falling back to the per-opcode machines. Rust
    /// has no way to ask "did this trait method get overridden", so this
    /// flag stands in for the original "does this backend export a
    /// handler" check.
    fn supports_passthrough(&self) -> bool {
        false
    }

    /// Vendor passthrough. `None` (or `Status::NotHandled`) means this
    /// backend declines the command and the router should fall back to
    /// its per-opcode machine.
    fn handle_cmd(&self, _cmd: &mut Command) -> Option<Status> {
        None
    }

    /// Native-async submission entry point. Only meaningful when
    /// `aio_supported()` is `true`. On [`SubmitOutcome::Started`] the
    /// backend has taken ownership of `cmd` and `continuation` (typically
    /// by stashing them in a [`crate::core::PendingCommand`]) and will
    /// invoke the continuation later from its own reaping thread. On
    /// [`SubmitOutcome::Failed`] the backend declined or failed
    /// synchronously and hands the command straight back, continuation
    /// un-called.
    fn submit(&self, _op: AsyncOp, cmd: Command, _continuation: Continuation) -> SubmitOutcome {
        SubmitOutcome::Failed(cmd, Status::NotHandled)
    }

    fn lock(&self) -> Result<(), Errno> {
        Ok(())
    }
}

/// The kernel-facing side of the core. Every accepted command reaches
/// exactly one [`Transport::command_complete`] call.
pub trait Transport: Send + Sync {
    fn command_complete(&self, cmd: Command, status: Status);
    fn processing_complete(&self);
    fn notify_lock_lost(&self) {}
    fn notify_conn_lost(&self) {}
}

/// One logical unit: a backend, a transport, and the core's per-device
/// bookkeeping (tracker, worker pool).
pub struct Device {
    pub uuid: Uuid,
    pub name: String,
    pub block_size: u32,
    pub backend: Arc<dyn Backend>,
    pub transport: Arc<dyn Transport>,
    pub tracker: AioTracker,
    pub worker_pool: WorkerPool,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        block_size: u32,
        backend: Arc<dyn Backend>,
        transport: Arc<dyn Transport>,
        worker_count: usize,
        queue_depth: usize,
    ) -> Self {
        let worker_pool = WorkerPool::new(backend.clone(), worker_count, queue_depth);
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            block_size,
            backend,
            transport,
            tracker: AioTracker::new(),
            worker_pool,
        }
    }

    /// The unified finisher (§4.5): decrements the tracker and, when
    /// `complete` is set, performs the one true transport completion and
    /// the idle-edge nudge.
    pub fn finish(&self, mut cmd: Command, status: Status, complete: bool) {
        let went_idle = self.tracker.finish();
        if complete {
            if let Status::CheckCondition(sense) = &status {
                sense.write_into(&mut cmd.sense);
            }
            self.transport.command_complete(cmd, status);
        }
        if went_idle {
            self.transport.processing_complete();
        }
    }
}
