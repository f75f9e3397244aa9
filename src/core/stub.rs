//! The call-stub abstraction (C3): a uniform, typed descriptor of one
//! backend operation plus the continuation that finalizes it.
//!
//! This replaces a function-pointer union keyed on an opcode with a closed
//! Rust enum. The dispatcher (`dispatch`) and the worker pool both consume
//! [`Stub`] values without caring which concrete operation is inside.

use crate::command::Command;
use crate::status::Status;

/// One of the four backend operations the core ever issues.
pub enum AsyncOp {
    Read { offset: u64 },
    Write { offset: u64 },
    Flush,
    HandleCmd,
}

/// A continuation invoked with the final status once a dispatched
/// operation settles, synchronously on the worker pool or asynchronously
/// from a backend's own completion thread.
pub type Continuation = Box<dyn FnOnce(Command, Status) + Send + 'static>;

/// A call stub: the operation to perform plus what to do with the result.
///
/// Stubs are ephemeral — built on the dispatching stage's stack, consumed
/// by exactly one of the dispatcher's two arms (native-async submission or
/// worker-pool enqueue).
pub struct Stub {
    pub op: AsyncOp,
    pub cmd: Command,
    pub continuation: Continuation,
}

impl Stub {
    pub fn new(op: AsyncOp, cmd: Command, continuation: Continuation) -> Self {
        Self {
            op,
            cmd,
            continuation,
        }
    }
}

/// A command handed off to a backend that supports native asynchronous
/// submission. The backend owns this value until it calls [`PendingCommand::complete`],
/// typically from its own reaping thread, never from the caller's stack.
pub struct PendingCommand {
    cmd: Option<Command>,
    continuation: Option<Continuation>,
}

impl PendingCommand {
    pub fn new(cmd: Command, continuation: Continuation) -> Self {
        Self {
            cmd: Some(cmd),
            continuation: Some(continuation),
        }
    }

    /// Finalizes the command with the given status. Consumes the pending
    /// command: a backend may call this at most once, which the `Option`
    /// takes are there to make a double-call a visible bug rather than a
    /// silent double-completion.
    pub fn complete(mut self, status: Status) {
        let cmd = self.cmd.take().expect("PendingCommand completed twice");
        let continuation = self
            .continuation
            .take()
            .expect("PendingCommand completed twice");
        continuation(cmd, status);
    }
}

impl Drop for PendingCommand {
    fn drop(&mut self) {
        if self.cmd.is_some() {
            error!("PendingCommand dropped without being completed");
        }
    }
}

/// What a backend's native-async `submit` decided, synchronously, on the
/// caller's stack.
pub enum SubmitOutcome {
    /// The backend took ownership of the command and will invoke the
    /// continuation later, from its own completion thread.
    Started,
    /// The backend declined or failed before starting the operation;
    /// the command and its continuation (un-called) are handed back.
    Failed(Command, Status),
}
