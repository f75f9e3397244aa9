//! The dispatcher (C4): routes a call stub either to the backend's native
//! async path or to the worker-pool fallback.

use crate::command::Command;
use crate::core::stub::{Stub, SubmitOutcome};
use crate::device::Device;
use crate::status::Status;

/// What happened when a stub was handed to the dispatcher.
pub enum DispatchOutcome {
    /// Do nothing further; the stub's continuation is the completion
    /// path and will fire either from the worker pool or from the
    /// backend's own reaping thread.
    Async,
    /// No completion will arrive for this attempt. The immediate caller
    /// owns finalizing the command synchronously with this status.
    Failed(Command, Status),
}

pub fn dispatch(dev: &Device, stub: Stub) -> DispatchOutcome {
    let Stub {
        op,
        cmd,
        continuation,
    } = stub;

    if dev.backend.aio_supported() {
        match dev.backend.submit(op, cmd, continuation) {
            SubmitOutcome::Started => DispatchOutcome::Async,
            SubmitOutcome::Failed(cmd, status) => DispatchOutcome::Failed(cmd, status),
        }
    } else {
        match dev.worker_pool.enqueue(op, cmd, continuation) {
            Ok(()) => DispatchOutcome::Async,
            Err(cmd) => {
                warn!(device = %dev.name, "work queue full, rejecting command");
                DispatchOutcome::Failed(cmd, Status::TaskSetFull)
            }
        }
    }
}
