//! SCSI status and sense vocabulary (C9): the closed set of outcomes a
//! dispatched command can settle with, plus the errno-to-sense mapping
//! table used by the worker pool and the async completion paths.

use nix::errno::Errno;

/// Additional sense code / additional sense code qualifier pairs, named
/// for the condition they represent rather than spelled out as raw bytes
/// at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asc {
    ReadError,
    WriteError,
    Miscompare,
    MiscompareDuringVerify,
    LogicalUnitNotReadyStateTransition,
    InvalidCommandOperationCode,
}

impl Asc {
    /// `(ASC, ASCQ)` pair as they would be written into byte 12/13 of a
    /// fixed-format sense buffer.
    pub fn code(self) -> (u8, u8) {
        match self {
            Asc::ReadError => (0x11, 0x00),
            Asc::WriteError => (0x0C, 0x00),
            Asc::Miscompare => (0x1D, 0x00),
            Asc::MiscompareDuringVerify => (0x1D, 0x01),
            Asc::LogicalUnitNotReadyStateTransition => (0x04, 0x01),
            Asc::InvalidCommandOperationCode => (0x20, 0x00),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenseKey {
    MediumError,
    Miscompare,
    NotReady,
    IllegalRequest,
}

/// Sense data attached to a non-`Good` status: enough to build a fixed
/// sense buffer, plus the byte offset of a miscompare when relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sense {
    pub key: SenseKey,
    pub asc: Asc,
    /// Byte offset of the first mismatching byte, meaningful only for
    /// `Miscompare`/`MiscompareDuringVerify`.
    pub info: Option<u64>,
}

impl Sense {
    pub fn new(key: SenseKey, asc: Asc) -> Self {
        Self {
            key,
            asc,
            info: None,
        }
    }

    pub fn with_info(mut self, offset: u64) -> Self {
        self.info = Some(offset);
        self
    }

    /// Writes this sense data into a fixed-format sense buffer in the
    /// conventional layout: byte 0 response code, byte 2 sense key, bytes
    /// 12/13 ASC/ASCQ, bytes 3..7 information field when present.
    pub fn write_into(&self, buf: &mut [u8]) {
        if buf.len() < 18 {
            return;
        }
        buf.fill(0);
        buf[0] = 0x70; // fixed format, current errors
        buf[2] = match self.key {
            SenseKey::MediumError => 0x03,
            SenseKey::Miscompare => 0x0E,
            SenseKey::NotReady => 0x02,
            SenseKey::IllegalRequest => 0x05,
        };
        buf[7] = 10; // additional sense length
        let (asc, ascq) = self.asc.code();
        buf[12] = asc;
        buf[13] = ascq;
        if let Some(info) = self.info {
            buf[3..7].copy_from_slice(&(info as u32).to_be_bytes());
            buf[0] |= 0x80; // information field valid
        }
    }
}

/// The closed set of outcomes a command can settle with. `AsyncHandled`
/// and `NotHandled` are internal sentinels never written to the wire as a
/// SCSI status byte; the transport interprets them before that point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Good,
    Busy,
    TaskSetFull,
    CheckCondition(Sense),
    NotReady,
    /// Completion will arrive later, out-of-band, via a backend's own
    /// reaping thread calling `PendingCommand::complete`.
    AsyncHandled,
    /// This path declines to handle the command; try the next one, or
    /// fall back to the transport's default reply if there is none.
    NotHandled,
}

impl Status {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::AsyncHandled | Status::NotHandled)
    }
}

/// Maps a backend error return during a READ/WRITE to the ASC appropriate
/// for that opcode. FLUSH and HANDLE_CMD failures do not have a dedicated
/// ASC and fall back to a generic medium error via [`generic_io_error`].
pub fn io_error(op_is_read: bool, _errno: Errno) -> Status {
    let asc = if op_is_read {
        Asc::ReadError
    } else {
        Asc::WriteError
    };
    Status::CheckCondition(Sense::new(SenseKey::MediumError, asc))
}

pub fn generic_io_error(_errno: Errno) -> Status {
    Status::CheckCondition(Sense::new(SenseKey::MediumError, Asc::ReadError))
}

pub fn miscompare(offset: u64) -> Status {
    Status::CheckCondition(Sense::new(SenseKey::Miscompare, Asc::Miscompare).with_info(offset))
}

pub fn miscompare_during_verify(offset: u64) -> Status {
    Status::CheckCondition(
        Sense::new(SenseKey::Miscompare, Asc::MiscompareDuringVerify).with_info(offset),
    )
}

/// A check condition for a CDB the core could not make sense of: an
/// unsupported opcode, or one too short for the opcode it names.
pub fn illegal_request() -> Status {
    Status::CheckCondition(Sense::new(SenseKey::IllegalRequest, Asc::InvalidCommandOperationCode))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sense_buffer_carries_miscompare_offset() {
        let status = miscompare(37);
        let Status::CheckCondition(sense) = status else {
            panic!("expected CheckCondition");
        };
        let mut buf = [0u8; 18];
        sense.write_into(&mut buf);
        assert_eq!(buf[2], 0x0E);
        assert_eq!(buf[12], 0x1D);
        assert_eq!(u32::from_be_bytes(buf[3..7].try_into().unwrap()), 37);
    }

    #[test]
    fn read_vs_write_error_pick_different_asc() {
        let read = io_error(true, Errno::EIO);
        let write = io_error(false, Errno::EIO);
        assert_ne!(read, write);
    }

    #[test]
    fn sentinels_are_not_terminal() {
        assert!(!Status::AsyncHandled.is_terminal());
        assert!(!Status::NotHandled.is_terminal());
        assert!(Status::Good.is_terminal());
    }
}
