//! States negotiating and reading a bulk transfer of the recorded session.
//!
//! A transfer proceeds as follows:
//!
//! 1. [`Probe`]: confirm the device is streaming, by reading a few of the
//! status bytes it sends while idle.
//! 2. [`Request`]: discard buffered input, then write [`DOWNLOAD_REQUEST`].
//! 3. [`Preamble`]: wait for [`PREAMBLE`].
//! 4. [`LengthHeader`]: decode the payload length.
//! 5. [`Payload`]: decode one [`RecordedSample`] per 3-byte record.
//!
//! Whatever the outcome, the driver must then write [`TERMINATE`] and close
//! the link.
//!
//! A timeout while waiting for a byte is passed to `advance` as `None` where
//! the protocol tolerates it, and is otherwise fatal to the transfer.

use chrono::{NaiveDateTime, TimeDelta};
use either::Either::{self, Left, Right};
use tartan_bitfield::bitfield;
use thiserror::Error;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use super::{FormatError, RecordedSample};

/// Command asking the device to dump its recorded session.
pub const DOWNLOAD_REQUEST: [u8; 2] = [0xF5, 0xF5];
/// Command returning the device to live mode.
pub const TERMINATE: [u8; 3] = [0xF6, 0xF6, 0xF6];
/// Response announcing the start of a transfer.
pub const PREAMBLE: [u8; 3] = [0xF2, 0x80, 0x00];

/// Number of idle status bytes required before requesting a transfer.
pub const PROBE_LEN: u8 = 10;
/// Number of attempts to receive the preamble.
pub const PREAMBLE_ATTEMPTS: u8 = 3;

/// Length of a recorded frame.
pub const RECORD_LEN: u32 = 3;

/// Entrypoint to the finite-state machine.
pub type Handshake = Probe;

/// An error negotiating a transfer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeError {
    /// The device sent nothing while idle.
    #[error("No data stream from device.")]
    NoDeviceStream,
    /// The device did not answer the download request.
    #[error("No preamble in device response after {0} attempts.")]
    Preamble(u8),
}

/// An error decoding the payload length.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum HeaderError {
    /// Incorrect sync bits.
    #[error("Invalid sync bits in length header ({0:02X?}).")]
    SyncBits([u8; 3]),
    /// A length not divisible into records.
    #[error("Length ({0}) not divisible by 3.")]
    Length(u32),
    /// A session whose last sample would be stamped past the latest
    /// representable time.
    #[error("Session of {0} records overflows its start time.")]
    StartTime(u32),
}

/// State token to confirm the device is streaming.
#[derive(Debug)]
pub struct Probe {
    remaining: u8,
}

impl Probe {
    pub const fn new() -> Self {
        Self {
            remaining: PROBE_LEN,
        }
    }

    /// Transition to another state by receiving an idle status byte, or a
    /// timeout.
    ///
    /// Returns a successor state token.
    pub fn advance(self, r: Option<u8>) -> Result<Either<Probe, Request>, HandshakeError> {
        if r.is_none() {
            Err(HandshakeError::NoDeviceStream)?;
        }

        let remaining = self.remaining - 1;

        Ok(if remaining != 0 {
            Left(Probe { remaining })
        } else {
            Right(Request(()))
        })
    }
}

impl Default for Probe {
    fn default() -> Self {
        Self::new()
    }
}

/// State token to request a transfer.
#[derive(Debug)]
pub struct Request(());

impl Request {
    /// Bytes to write, after discarding buffered input.
    pub fn command(&self) -> [u8; 2] {
        DOWNLOAD_REQUEST
    }

    /// Transition to another state once the command is written and flushed.
    pub fn advance(self) -> Preamble {
        Preamble {
            attempt: 0,
            matched: 0,
        }
    }
}

/// State token to wait for the preamble.
///
/// Each attempt expects the whole preamble. A timeout or an unexpected byte
/// fails the attempt, and the next attempt starts over with the next byte.
#[derive(Debug)]
pub struct Preamble {
    attempt: u8,
    matched: usize,
}

impl Preamble {
    /// Number of failed attempts so far.
    pub fn attempt(&self) -> u8 {
        self.attempt
    }

    /// Transition to another state by receiving a byte, or a timeout.
    ///
    /// Returns a successor state token.
    pub fn advance(self, r: Option<u8>) -> Result<Either<Preamble, LengthHeader>, HandshakeError> {
        if r == Some(PREAMBLE[self.matched]) {
            let matched = self.matched + 1;

            return Ok(if matched == PREAMBLE.len() {
                Right(LengthHeader(()))
            } else {
                Left(Preamble { matched, ..self })
            });
        }

        let attempt = self.attempt + 1;

        if attempt == PREAMBLE_ATTEMPTS {
            Err(HandshakeError::Preamble(attempt))?;
        }

        Ok(Left(Preamble {
            attempt,
            matched: 0,
        }))
    }
}

// Each length byte carries seven bits, most significant byte first.
bitfield! {
    struct Septet(u8) {
        [0..7] value: u8,
        [7] sync,
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable)]
struct LengthBytes {
    high: u8,
    middle: u8,
    low: u8,
}

/// State token to decode the payload length.
#[derive(Debug)]
pub struct LengthHeader(pub(super) ());

impl LengthHeader {
    /// Transition to another state by decoding the length header.
    ///
    /// Returns the payload state, anchored to `start`, the time of the first
    /// recorded sample.
    pub fn advance(self, r: [u8; 3], start: NaiveDateTime) -> Result<Payload, HeaderError> {
        let LengthBytes { high, middle, low } = zerocopy::transmute!(r);

        let (high, middle, low) = (Septet(high), Septet(middle), Septet(low));

        if !high.sync() || !middle.sync() || low.sync() {
            Err(HeaderError::SyncBits(r))?;
        }

        // The header stores the length minus one.
        let length = ((u32::from(high.value()) << 14)
            | (u32::from(middle.value()) << 7)
            | u32::from(low.value()))
            + 1;

        if length % RECORD_LEN != 0 {
            Err(HeaderError::Length(length))?;
        }

        let records = length / RECORD_LEN;

        let last = TimeDelta::seconds(i64::from(records - 1));
        if start.checked_add_signed(last).is_none() {
            Err(HeaderError::StartTime(records))?;
        }

        Ok(Payload {
            start,
            index: 0,
            records,
        })
    }
}

/// State token to decode a recorded frame.
#[derive(Debug)]
pub struct Payload {
    start: NaiveDateTime,
    index: u32,
    records: u32,
}

impl Payload {
    /// Total number of records in the transfer.
    pub fn records(&self) -> u32 {
        self.records
    }

    /// Transition to another state by decoding a recorded frame.
    ///
    /// Returns the sample, stamped one second after its predecessor, and a
    /// successor state token unless this was the last record.
    pub fn advance(self, r: [u8; 3]) -> (Result<RecordedSample, FormatError>, Option<Payload>) {
        // In range: the last stamp was checked against the start time.
        let time = self.start + TimeDelta::seconds(i64::from(self.index));
        let sample = RecordedSample::decode(time, r);

        let index = self.index + 1;
        let successor = (index != self.records).then_some(Payload { index, ..self });

        (sample, successor)
    }
}
