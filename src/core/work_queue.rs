//! The worker-pool fallback (C2) for backends without native async
//! support: a FIFO queue, a condition variable, and one or more OS
//! threads executing the backend's blocking methods.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::JoinHandle;

use nix::errno::Errno;
use parking_lot::{Condvar, Mutex};

use crate::command::Command;
use crate::core::stub::{AsyncOp, Continuation};
use crate::device::Backend;
use crate::status::{generic_io_error, io_error, Status};

/// A queued deferred invocation of a call stub.
pub struct WorkEntry {
    op: AsyncOp,
    cmd: Command,
    continuation: Continuation,
}

struct Inner {
    queue: VecDeque<WorkEntry>,
    shutdown: bool,
}

/// Executes queued work entries against a backend on a fixed-size pool of
/// worker threads. The FIFO order is preserved per device; no ordering is
/// promised across devices or across more than one worker thread.
pub struct WorkerPool {
    inner: Arc<Mutex<Inner>>,
    cond: Arc<Condvar>,
    depth_ceiling: usize,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(backend: Arc<dyn Backend>, worker_count: usize, depth_ceiling: usize) -> Self {
        let inner = Arc::new(Mutex::new(Inner {
            queue: VecDeque::new(),
            shutdown: false,
        }));
        let cond = Arc::new(Condvar::new());
        let worker_count = worker_count.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let inner = inner.clone();
            let cond = cond.clone();
            let backend = backend.clone();
            workers.push(
                std::thread::Builder::new()
                    .name(format!("dispatch-worker-{id}"))
                    .spawn(move || worker_loop(inner, cond, backend))
                    .expect("failed to spawn dispatch worker thread"),
            );
        }
        Self {
            inner,
            cond,
            depth_ceiling: depth_ceiling.max(1),
            workers,
        }
    }

    /// Enqueues a stub for deferred execution. Returns the command back
    /// to the caller, continuation un-fired, if the configured depth
    /// ceiling is already reached — this is how the core simulates
    /// resource exhaustion in a setting where the allocator itself can't
    /// be made to fail in a catchable way.
    pub fn enqueue(
        &self,
        op: AsyncOp,
        cmd: Command,
        continuation: Continuation,
    ) -> Result<(), Command> {
        let mut guard = self.inner.lock();
        if guard.queue.len() >= self.depth_ceiling {
            return Err(cmd);
        }
        guard.queue.push_back(WorkEntry {
            op,
            cmd,
            continuation,
        });
        drop(guard);
        self.cond.notify_one();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.inner.lock().shutdown = true;
        self.cond.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(inner: Arc<Mutex<Inner>>, cond: Arc<Condvar>, backend: Arc<dyn Backend>) {
    loop {
        let entry = {
            let mut guard = inner.lock();
            loop {
                if let Some(entry) = guard.queue.pop_front() {
                    break Some(entry);
                }
                if guard.shutdown {
                    break None;
                }
                cond.wait(&mut guard);
            }
        };
        match entry {
            Some(entry) => execute(backend.as_ref(), entry),
            None => return,
        }
    }
}

fn execute(backend: &dyn Backend, entry: WorkEntry) {
    let WorkEntry {
        op,
        mut cmd,
        continuation,
    } = entry;
    let status = match op {
        AsyncOp::Read { offset } => {
            let requested = cmd.iovec.remaining();
            match backend.read(&mut cmd.iovec, offset) {
                Ok(n) if n == requested => Status::Good,
                Ok(_) => io_error(true, Errno::EIO),
                Err(errno) => io_error(true, errno),
            }
        }
        AsyncOp::Write { offset } => {
            let requested = cmd.iovec.remaining();
            match backend.write(&mut cmd.iovec, offset) {
                Ok(n) if n == requested => Status::Good,
                Ok(_) => io_error(false, Errno::EIO),
                Err(errno) => io_error(false, errno),
            }
        }
        AsyncOp::Flush => match backend.flush() {
            Ok(()) => Status::Good,
            Err(errno) => generic_io_error(errno),
        },
        AsyncOp::HandleCmd => backend.handle_cmd(&mut cmd).unwrap_or(Status::NotHandled),
    };
    continuation(cmd, status);
}
