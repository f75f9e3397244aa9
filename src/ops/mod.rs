//! Single-shot command machines (C6): READ, WRITE, FLUSH. Each brackets
//! one stub dispatch with the unified finisher; the multi-stage machines
//! live in their own submodules.

pub mod caw;
pub mod write_verify;

use std::sync::Arc;

use crate::command::Command;
use crate::core::{dispatch, AsyncOp, DispatchOutcome, Stub};
use crate::device::Device;
use crate::scsi;
use crate::status::illegal_request;

/// Decodes the byte offset a READ/WRITE CDB addresses. A CDB whose
/// opcode the core recognizes but whose length doesn't match that
/// opcode (truncated, not just unknown) is this core's own decode
/// failure, not something to paper over with a made-up LBA.
fn extent_offset(dev: &Device, cmd: &Command) -> Option<u64> {
    scsi::decode_extent(&cmd.cdb).map(|e| e.lba * dev.block_size as u64)
}

fn dispatch_single_shot(dev: Arc<Device>, cmd: Command, op: AsyncOp) {
    let dev_for_finish = dev.clone();
    let stub = Stub::new(
        op,
        cmd,
        Box::new(move |cmd, status| dev_for_finish.finish(cmd, status, true)),
    );
    match dispatch(&dev, stub) {
        DispatchOutcome::Async => {}
        DispatchOutcome::Failed(cmd, status) => dev.finish(cmd, status, true),
    }
}

pub fn start_read(dev: Arc<Device>, cmd: Command) {
    match extent_offset(&dev, &cmd) {
        Some(offset) => dispatch_single_shot(dev, cmd, AsyncOp::Read { offset }),
        None => dev.finish(cmd, illegal_request(), true),
    }
}

pub fn start_write(dev: Arc<Device>, cmd: Command) {
    match extent_offset(&dev, &cmd) {
        Some(offset) => dispatch_single_shot(dev, cmd, AsyncOp::Write { offset }),
        None => dev.finish(cmd, illegal_request(), true),
    }
}

pub fn start_flush(dev: Arc<Device>, cmd: Command) {
    dispatch_single_shot(dev, cmd, AsyncOp::Flush);
}
