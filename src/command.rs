//! The per-command value (§3: Command): CDB bytes, scatter/gather buffer,
//! sense buffer, and an opaque state slot multi-stage operations use to
//! thread their intermediate state across stub dispatches.

use std::any::Any;

use crate::iovec::IoVector;

/// A single SCSI command as it crosses the boundary from transport to
/// core. Created by the transport for incoming commands; created by the
/// core itself for the sidecar read commands CAW and write-verify use
/// internally (those are never handed to the transport's completion).
pub struct Command {
    pub cdb: Vec<u8>,
    pub iovec: IoVector,
    pub sense: [u8; 18],
    state: Option<Box<dyn Any + Send>>,
}

impl Command {
    pub fn new(cdb: Vec<u8>, iovec: IoVector) -> Self {
        Self {
            cdb,
            iovec,
            sense: [0u8; 18],
            state: None,
        }
    }

    /// A command with no backing transfer buffer, used for sidecar reads
    /// that allocate their iovec only once the transfer length is known.
    pub fn empty(cdb: Vec<u8>) -> Self {
        Self::new(cdb, IoVector::new(Vec::new()))
    }

    pub fn set_state<T: Any + Send>(&mut self, state: T) {
        self.state = Some(Box::new(state));
    }

    pub fn take_state<T: Any + Send>(&mut self) -> Option<T> {
        self.state
            .take()
            .and_then(|s| s.downcast::<T>().ok())
            .map(|s| *s)
    }

    pub fn state_mut<T: Any + Send>(&mut self) -> Option<&mut T> {
        self.state.as_mut().and_then(|s| s.downcast_mut::<T>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_slot_round_trips() {
        let mut cmd = Command::new(vec![0x28], IoVector::new(vec![0u8; 512]));
        assert!(cmd.take_state::<u32>().is_none());
        cmd.set_state(42u32);
        assert_eq!(cmd.state_mut::<u32>(), Some(&mut 42u32));
        assert_eq!(cmd.take_state::<u32>(), Some(42u32));
        assert!(cmd.take_state::<u32>().is_none());
    }
}
