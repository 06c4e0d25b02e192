//! Length-prefixed record framing over the byte ring.
//!
//! A record is `(u32 little-endian length, payload)` written as two
//! back-to-back ring writes and read back symmetrically. The producer side
//! uses [`Eviction::Records`] so that a capped ring makes room by dropping
//! whole old records; combined with the size check in [`write_record`] the
//! ring never holds a torn frame.
//!
//! The flusher can decode either destructively ([`read_record`]) or via the
//! tentative cursor ([`peek_record`]), deciding afterwards whether to
//! [`commit_peek`](RingBuffer::commit_peek) or
//! [`revert_peek`](RingBuffer::revert_peek).
//!
//! Mixing framed and unframed writes in one ring breaks the eviction
//! contract; a ring used with this module should only ever see records.

use std::fmt;

use crate::ring::{Eviction, RingBuffer, RingError};

/// Size of the length prefix in bytes.
pub const PREFIX_LEN: usize = 4;

/// Errors from encoding or decoding a framed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FrameError {
    /// No record available: the ring (or the unpeeked region) is empty.
    Empty,
    /// The ring ended mid-frame. Cannot happen when every write went
    /// through [`write_record`].
    Truncated { expected: usize, got: usize },
    /// The payload cannot be framed: longer than `u32::MAX`, or larger than
    /// a capped ring can ever hold in one piece.
    PayloadTooLarge { len: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no record buffered"),
            Self::Truncated { expected, got } => {
                write!(f, "torn record: expected {expected} bytes, got {got}")
            }
            Self::PayloadTooLarge { len } => {
                write!(f, "payload of {len} bytes cannot be framed")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Appends one record: a 4-byte little-endian length, then the payload.
///
/// Both writes use record-framed eviction, so a capped ring drops the
/// oldest whole records to make room. A payload that could never fit whole
/// (capped ring, `payload + prefix > capacity`) is rejected up front rather
/// than corrupting the frame stream; while the ring can still grow, any
/// size up to `u32::MAX` is accepted.
pub fn write_record(ring: &mut RingBuffer, payload: &[u8]) -> Result<(), FrameError> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge { len: payload.len() });
    }
    let total = PREFIX_LEN.saturating_add(payload.len());
    if ring.capacity() >= ring.max_capacity() && total > ring.capacity() {
        return Err(FrameError::PayloadTooLarge { len: payload.len() });
    }
    let prefix = (payload.len() as u32).to_le_bytes();
    ring.write_evicting(&prefix, Eviction::Records);
    ring.write_evicting(payload, Eviction::Records);
    Ok(())
}

/// Reads and consumes the oldest record.
pub fn read_record(ring: &mut RingBuffer) -> Result<Vec<u8>, FrameError> {
    decode(ring, false)
}

/// Decodes the next unpeeked record via the tentative cursor.
///
/// The committed cursor does not move; the caller commits or reverts the
/// peek once it has decided what to do with the record.
pub fn peek_record(ring: &mut RingBuffer) -> Result<Vec<u8>, FrameError> {
    decode(ring, true)
}

fn decode(ring: &mut RingBuffer, tentative: bool) -> Result<Vec<u8>, FrameError> {
    let mut prefix = [0u8; PREFIX_LEN];
    let n = take(ring, &mut prefix, tentative)?;
    if n == 0 {
        return Err(FrameError::Empty);
    }
    if n < PREFIX_LEN {
        return Err(FrameError::Truncated {
            expected: PREFIX_LEN,
            got: n,
        });
    }

    let len = u32::from_le_bytes(prefix) as usize;
    let mut payload = vec![0u8; len];
    if len > 0 {
        // A missing or short payload after a decoded prefix is a torn
        // frame, not an empty ring.
        let n = take(ring, &mut payload, tentative).unwrap_or(0);
        if n < len {
            return Err(FrameError::Truncated {
                expected: len,
                got: n,
            });
        }
    }
    Ok(payload)
}

fn take(ring: &mut RingBuffer, out: &mut [u8], tentative: bool) -> Result<usize, FrameError> {
    let result = if tentative {
        ring.peek(out)
    } else {
        ring.read(out)
    };
    match result {
        Ok(n) => Ok(n),
        Err(RingError::Empty) => Err(FrameError::Empty),
    }
}
