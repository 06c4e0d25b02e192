//! Deferred logging over a bounded, auto-growing byte ring buffer.
//!
//! Records below a trigger severity are serialised to JSON and parked in a
//! circular byte buffer instead of being emitted; the first record at or
//! above the trigger drains the buffer in FIFO order and switches the logger
//! to direct emission. The interesting engineering lives in the buffer:
//!
//! - Byte-accurate FIFO semantics across wrap-around, with at most two
//!   segment copies per operation.
//! - A tentative read cursor that can peek ahead of the committed cursor and
//!   be committed or reverted, so a flusher can decode a length prefix and
//!   its payload before deciding to consume them.
//! - Geometric growth (x2 below a threshold, x1.25 above) up to a hard
//!   maximum; once capped, overflow evicts the oldest content in whole
//!   length-prefixed records, never a fragment.
//!
//! High-level flow (one record):
//! 1) Façade builds a [`logger::LogRecord`] and runs its hooks.
//! 2) Below the trigger: JSON-serialise, append as `(u32 LE length, payload)`
//!    via [`frame::write_record`] (growth/eviction happens here).
//! 3) At/above the trigger: drain the ring record-by-record to the sink,
//!    emit the triggering record, switch to direct mode.
//!
//! The ring is a single-owner, sequential structure with no internal
//! synchronisation; the process-wide façade accessor wraps it in a `Mutex`.

pub mod frame;
pub mod logger;
pub mod ring;
#[cfg(test)]
pub mod test_utils;
pub mod units;

pub use frame::{peek_record, read_record, write_record, FrameError};
pub use logger::{DeferredLogger, LogError, LogRecord, LoggerOptions, Mode, Resources, Severity};
pub use ring::{Eviction, RingBuffer, RingError};
pub use units::{parse_size, BufferSizes, SizeParseError};
