//! Write-verify (C8): write the incoming buffer, read it back, compare,
//! and loop over the residual until the whole transfer is verified.
//!
//! A transfer larger than `MAX_BATCH_BYTES` is written and verified in
//! bounded batches rather than as one all-or-nothing operation — the
//! same reason `core/wiper.rs` chunks a bdev wipe into `max_io_size`
//! pieces instead of issuing a single unbounded I/O. `requested` is the
//! size of the batch currently in flight; once a batch verifies, the
//! original command's iovec cursor advances past it and
//! `orig_cmd.iovec.remaining()` is the single source of truth for how
//! much is left — there is no separate counter to keep in lockstep.

use std::sync::Arc;

use crate::command::Command;
use crate::core::{dispatch, AsyncOp, DispatchOutcome, Stub};
use crate::device::Device;
use crate::iovec::IoVector;
use crate::scsi;
use crate::status::{illegal_request, miscompare_during_verify, Status};

/// Upper bound on a single write-then-verify batch. Transfers larger
/// than this loop over successive batches instead of writing (and
/// reading back) the whole thing in one shot.
const MAX_BATCH_BYTES: usize = 4096;

struct WriteCarry {
    orig_cmd: Command,
    offset: u64,
    requested: usize,
}

struct VerifyCarry {
    orig_cmd: Command,
    offset: u64,
    requested: usize,
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
    dispatch_write(dev, orig_cmd, offset);
}

fn dispatch_write(dev: Arc<Device>, orig_cmd: Command, offset: u64) {
    let requested = orig_cmd.iovec.remaining().min(MAX_BATCH_BYTES);
    let batch = orig_cmd.iovec.peek(requested).to_vec();

    let mut write_cmd = Command::new(orig_cmd.cdb.clone(), IoVector::new(batch));
    write_cmd.set_state(WriteCarry {
        orig_cmd,
        offset,
        requested,
    });

    let dev_for_write = dev.clone();
    let stub = Stub::new(
        AsyncOp::Write { offset },
        write_cmd,
        Box::new(move |write_cmd, status| on_write_complete(dev_for_write, write_cmd, status)),
    );
    match dispatch(&dev, stub) {
        DispatchOutcome::Async => {}
        DispatchOutcome::Failed(mut write_cmd, status) => {
            let carry: WriteCarry = write_cmd.take_state().expect("write-verify state missing");
            dev.finish(carry.orig_cmd, status, true);
        }
    }
}

fn on_write_complete(dev: Arc<Device>, mut write_cmd: Command, status: Status) {
    let WriteCarry {
        orig_cmd,
        offset,
        requested,
    } = write_cmd.take_state().expect("write-verify state missing");
    drop(write_cmd);

    if !matches!(status, Status::Good) {
        dev.finish(orig_cmd, status, true);
        return;
    }

    let mut read_cmd = Command::new(orig_cmd.cdb.clone(), IoVector::with_capacity(requested));
    read_cmd.set_state(VerifyCarry {
        orig_cmd,
        offset,
        requested,
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
            let carry: VerifyCarry = read_cmd.take_state().expect("verify state missing");
            dev.finish(carry.orig_cmd, status, true);
        }
    }
}

fn on_read_complete(dev: Arc<Device>, mut read_cmd: Command, status: Status) {
    let VerifyCarry {
        mut orig_cmd,
        offset,
        requested,
    } = read_cmd.take_state().expect("verify state missing");

    if !matches!(status, Status::Good) {
        dev.finish(orig_cmd, status, true);
        return;
    }

    match orig_cmd.iovec.mismatch(&read_cmd.iovec, requested) {
        Some(mismatch_offset) => {
            dev.finish(orig_cmd, miscompare_during_verify(mismatch_offset), true);
        }
        None => {
            drop(read_cmd);
            orig_cmd.iovec.advance(requested);
            if orig_cmd.iovec.remaining() == 0 {
                dev.finish(orig_cmd, Status::Good, true);
            } else {
                let next_offset = offset + requested as u64;
                dispatch_write(dev, orig_cmd, next_offset);
            }
        }
    }
}
