//! Compare-and-write (C7): read the on-disk first half, compare it
//! against the caller-supplied expected half, and write the remainder
//! only if they match.
//!
//! The sidecar read command carries the original command and the pieces
//! of state its continuation needs (`CawCarry`) through the command's
//! opaque state slot — the read command is what actually crosses into
//! the worker pool or a backend's native-async path, so anything the
//! *next* stage needs has to travel attached to it, not just captured by
//! a closure around a value that might never run.

use std::sync::Arc;

use crate::command::Command;
use crate::core::{dispatch, AsyncOp, DispatchOutcome, Stub};
use crate::device::Device;
use crate::iovec::IoVector;
use crate::scsi;
use crate::status::{illegal_request, miscompare, Status};

struct CawCarry {
    orig_cmd: Command,
    offset: u64,
    half: usize,
}

pub fn start(dev: Arc<Device>, orig_cmd: Command) {
    let extent = match scsi::decode_extent(&orig_cmd.cdb) {
        Some(e) => e,
        None => {
            dev.finish(orig_cmd, illegal_request(), true);
            return;
        }
    };
    let offset = extent.lba * dev.block_size as u64;
    let half = orig_cmd.iovec.total_len() / 2;

    let mut read_cmd = Command::new(orig_cmd.cdb.clone(), IoVector::with_capacity(half));
    read_cmd.set_state(CawCarry {
        orig_cmd,
        offset,
        half,
    });

    let dev_for_read = dev.clone();
    let stub = Stub::new(
        AsyncOp::Read { offset },
        read_cmd,
        Box::new(move |read_cmd, status| on_read_complete(dev_for_read, read_cmd, status)),
    );
    match dispatch(&dev, stub) {
        DispatchOutcome::Async => {}
        DispatchOutcome::Failed(mut read_cmd, status) => {
            let carry: CawCarry = read_cmd.take_state().expect("caw state missing");
            dev.finish(carry.orig_cmd, status, true);
        }
    }
}

fn on_read_complete(dev: Arc<Device>, mut read_cmd: Command, status: Status) {
    let CawCarry {
        orig_cmd,
        offset,
        half,
    } = read_cmd.take_state().expect("caw state missing");

    if !matches!(status, Status::Good) {
        dev.finish(orig_cmd, status, true);
        return;
    }

    match orig_cmd.iovec.mismatch(&read_cmd.iovec, half) {
        Some(mismatch_offset) => {
            dev.finish(orig_cmd, miscompare(mismatch_offset), true);
        }
        None => {
            // Snapshot the write offset to a local before the read
            // command (and its buffer) are dropped, then dispatch the
            // write. Freeing it after taking the snapshot, never before.
            let write_offset = offset;
            drop(read_cmd);
            let mut orig_cmd = orig_cmd;
            orig_cmd.iovec.advance(half);
            start_write(dev, orig_cmd, write_offset);
        }
    }
}

fn start_write(dev: Arc<Device>, orig_cmd: Command, offset: u64) {
    let dev_for_write = dev.clone();
    let stub = Stub::new(
        AsyncOp::Write { offset },
        orig_cmd,
        Box::new(move |cmd, status| dev_for_write.finish(cmd, status, true)),
    );
    match dispatch(&dev, stub) {
        DispatchOutcome::Async => {}
        DispatchOutcome::Failed(cmd, status) => dev.finish(cmd, status, true),
    }
}
