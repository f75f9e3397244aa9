//! The command router (C5): maps a CDB to one of the operation machines
//! and owns the exactly-once completion guarantee for every accepted
//! command.
//!
//! Every state machine funnels its terminal status through
//! [`Device::finish`]; the router itself never calls the transport
//! directly except for the two edges that are genuinely its own
//! business: the synchronous unknown-opcode decline, and the
//! asynchronous equivalent reached after a passthrough decline.

use std::sync::Arc;

use crate::command::Command;
use crate::core::{dispatch, AsyncOp, DispatchOutcome, Stub};
use crate::device::Device;
use crate::ops::{caw, start_flush, start_read, start_write, write_verify};
use crate::scsi::{self, OpKind};
use crate::status::{illegal_request, Status};

/// What happened to a command handed to [`route`].
pub enum RouteOutcome {
    /// The command is being handled; the transport will see exactly one
    /// `command_complete` call, synchronously or later.
    Pending,
    /// No opcode family claims this command and no passthrough backend
    /// is configured to try. The command is hand back, untouched,
    /// for the transport's own default reply — the core never calls
    /// `command_complete` on this path.
    NotHandled(Command),
}

pub fn route(dev: Arc<Device>, cmd: Command) -> RouteOutcome {
    if dev.backend.supports_passthrough() {
        dev.tracker.start();
        dispatch_passthrough(dev, cmd)
    } else {
        route_known_opcode(dev, cmd)
    }
}

fn classify(cmd: &Command) -> OpKind {
    match cmd.cdb.first() {
        Some(opcode) => scsi::classify(*opcode),
        None => OpKind::Unknown,
    }
}

fn route_known_opcode(dev: Arc<Device>, cmd: Command) -> RouteOutcome {
    match classify(&cmd) {
        OpKind::Unknown => RouteOutcome::NotHandled(cmd),
        kind => {
            dev.tracker.start();
            dispatch_known(kind, dev, cmd);
            RouteOutcome::Pending
        }
    }
}

fn dispatch_known(kind: OpKind, dev: Arc<Device>, cmd: Command) {
    match kind {
        OpKind::Read => start_read(dev, cmd),
        OpKind::Write => start_write(dev, cmd),
        OpKind::Flush => start_flush(dev, cmd),
        OpKind::CompareAndWrite => caw::start(dev, cmd),
        OpKind::WriteVerify => write_verify::start(dev, cmd),
        OpKind::Unknown => unreachable!("route_known_opcode filters Unknown"),
    }
}

fn dispatch_passthrough(dev: Arc<Device>, cmd: Command) -> RouteOutcome {
    let dev_for_completion = dev.clone();
    let stub = Stub::new(
        AsyncOp::HandleCmd,
        cmd,
        Box::new(move |cmd, status| on_passthrough_complete(dev_for_completion, cmd, status)),
    );
    match dispatch(&dev, stub) {
        DispatchOutcome::Async => RouteOutcome::Pending,
        DispatchOutcome::Failed(cmd, status) => {
            dev.finish(cmd, status, true);
            RouteOutcome::Pending
        }
    }
}

fn on_passthrough_complete(dev: Arc<Device>, cmd: Command, status: Status) {
    if !matches!(status, Status::NotHandled) {
        dev.finish(cmd, status, true);
        return;
    }
    match classify(&cmd) {
        OpKind::Unknown => {
            // There is no synchronous caller left to hand this command
            // back to for a default reply — the passthrough attempt
            // already took it off the transport's stack. The router
            // supplies the same disposition a transport's own default
            // would: an illegal-request check condition.
            dev.finish(cmd, illegal_request(), true);
        }
        kind => dispatch_known(kind, dev, cmd),
    }
}
