//! Codecs and finite-state machines, free of any I/O.
//!
//! This module is intended for applications that manage the serial link
//! themselves. See [`crate::avec`] for implementations driving these states
//! over a byte stream.
//!
//! # Architecture
//!
//! The device speaks two framings on the same link:
//!
//! - Live mode, where 5-byte frames arrive unannounced. Frame boundaries are
//! recovered from the most significant bit of each byte, which is set only on
//! the first byte of a frame. See [`sync::FrameSynchronizer`].
//!
//! - Bulk mode, entered by request, where the device answers with a preamble,
//! a length header and a payload of 3-byte records. Each step is represented
//! by a zero-size or small non-copy state token. Once enough bytes are ready,
//! transition to another state by calling the token's `advance` method. This
//! returns a successor state token, along with any extracted data. See
//! [`transfer`].
//!
//! Only the initial states can be constructed. Some areas of the protocol are
//! not represented here and must be carefully written by the driver:
//!
//! - Reading bytes with the correct timeout, and treating a timeout as the end
//! of the stream (live mode) or a failure (bulk mode).
//!
//! - Writing the termination command and closing the link after a bulk
//! transfer, whether or not it succeeded.

use thiserror::Error;

pub mod live;
pub mod recorded;
pub mod sync;
pub mod transfer;

pub use live::LiveSample;
pub use recorded::RecordedSample;

/// An error decoding a fixed-size record.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FormatError {
    /// A live frame without the sync bit on its first byte only.
    #[error("Invalid sync bits in live frame ({0:02X?}).")]
    Live([u8; 5]),
    /// A recorded frame without its `0xF0`, set, clear sync pattern.
    #[error("Invalid sync bits in recorded frame ({0:02X?}).")]
    Recorded([u8; 3]),
}
