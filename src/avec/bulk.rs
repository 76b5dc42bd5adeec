//! Recorded session download.
//!
//! _Requires Cargo feature `std`._

use std::io;

use chrono::NaiveDateTime;
use either::Either::{Left, Right};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::sans::{
    FormatError, RecordedSample,
    transfer::{Handshake, HandshakeError, HeaderError, Payload, TERMINATE},
};

use super::stream::{ByteStream, Connection, Mode};

/// Errors occurring while downloading a recorded session.
///
/// Every error ends the session. The device is sent the termination command
/// and the stream closed before the error is returned.
#[derive(Debug, Error)]
pub enum Error {
    /// The device sent nothing before the download request.
    #[error("No data stream from device.")]
    NoDeviceStream,
    /// The device did not answer the download request.
    #[error("No preamble in device response.")]
    Preamble,
    /// Incorrect length header.
    #[error("Corrupted length in header: {0}")]
    CorruptHeader(#[from] HeaderError),
    /// The device stopped sending mid-transfer.
    #[error("Timeout during download ({0}).")]
    Timeout(Stage),
    /// A record with incorrect sync bits.
    #[error("Corrupted record: {0}")]
    Format(#[from] FormatError),
    /// An error from the underlying stream.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<HandshakeError> for Error {
    fn from(err: HandshakeError) -> Self {
        match err {
            HandshakeError::NoDeviceStream => Self::NoDeviceStream,
            HandshakeError::Preamble(_) => Self::Preamble,
        }
    }
}

/// Part of the transfer in which a timeout occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Header,
    Payload,
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Stage::Header => "length header",
            Stage::Payload => "payload",
        })
    }
}

/// Observable state of a [`RecordedSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Probing,
    AwaitingPreamble,
    ReadingLength,
    StreamingPayload,
    /// An error ended the transfer; draining follows.
    Failed,
    Draining,
    Closed,
}

/// Iterator over the samples of the device's recorded session.
///
/// The handshake runs on the first call to `next`, which therefore blocks
/// until the device starts sending its payload. Samples are then yielded as
/// they are received, the first stamped with the supplied start time and each
/// later one a second after its predecessor.
///
/// The session ends after the last sample, or after yielding an error. In
/// either case, and if the iterator is dropped early, the device is sent the
/// termination command and the stream is closed.
#[derive(Debug)]
pub struct RecordedSession<'a, S: ByteStream + ?Sized> {
    connection: Connection<'a, S>,
    start: NaiveDateTime,
    state: State,
    payload: Option<Payload>,
    records: Option<u32>,
    failed: bool,
}

impl<'a, S: ByteStream + ?Sized> RecordedSession<'a, S> {
    /// Begin a download on a stream. The first sample is stamped with `start`.
    pub fn new(stream: &'a mut S, start: NaiveDateTime) -> Self {
        Self {
            connection: Connection::new(stream, Mode::Bulk),
            start,
            state: State::Idle,
            payload: None,
            records: None,
            failed: false,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Number of records announced by the device, once the header is read.
    pub fn expected_records(&self) -> Option<u32> {
        self.records
    }

    /// Whether the session ended with an error.
    pub fn failed(&self) -> bool {
        self.failed
    }

    fn transition(&mut self, state: State) {
        debug!(from = ?self.state, to = ?state, "bulk transfer");
        self.state = state;
    }

    /// Negotiate the transfer, leaving the payload state ready.
    fn handshake(&mut self) -> Result<(), Error> {
        self.transition(State::Probing);
        self.connection.open()?;

        let stream = self.connection.stream();

        let mut probe = Handshake::new();
        let request = loop {
            probe = match probe.advance(stream.read_byte()?)? {
                Left(state) => state,
                Right(state) => break state,
            };
        };

        stream.flush_input()?;
        stream.write_bytes(&request.command())?;
        stream.flush_output()?;

        self.transition(State::AwaitingPreamble);

        let stream = self.connection.stream();

        let mut preamble = request.advance();
        let header = loop {
            let attempt = preamble.attempt();
            preamble = match preamble.advance(stream.read_byte()?)? {
                Left(state) => {
                    if state.attempt() != attempt {
                        debug!(attempt = state.attempt(), "preamble mismatch");
                    }
                    state
                }
                Right(state) => break state,
            };
        };

        self.transition(State::ReadingLength);

        let r = self
            .connection
            .take()?
            .ok_or(Error::Timeout(Stage::Header))?;
        let payload = header.advance(r, self.start)?;

        let records = payload.records();
        let (h, m, s) = (records / 3600, records / 60 % 60, records % 60);
        info!("Number of measurements: {records} ({h}h{m}m{s}s)");

        self.records = Some(records);
        self.payload = Some(payload);
        self.transition(State::StreamingPayload);

        Ok(())
    }

    /// Receive and decode the next record, or `None` after the last.
    fn receive(&mut self) -> Result<Option<RecordedSample>, Error> {
        let Some(payload) = self.payload.take() else {
            return Ok(None);
        };

        let r = self
            .connection
            .take()?
            .ok_or(Error::Timeout(Stage::Payload))?;

        let (sample, successor) = payload.advance(r);
        self.payload = successor;

        Ok(Some(sample?))
    }

    /// Reset the device and close the stream. Failures are logged, not
    /// returned, so they never hide the outcome of the transfer.
    fn drain(&mut self) {
        if matches!(self.state, State::Draining | State::Closed) {
            return;
        }

        self.payload = None;
        self.transition(State::Draining);

        let stream = self.connection.stream();
        if let Err(err) = stream
            .write_bytes(&TERMINATE)
            .and_then(|()| stream.flush_output())
        {
            warn!(%err, "failed to send termination command");
        }

        if let Err(err) = self.connection.close() {
            warn!(%err, "failed to close stream");
        }

        self.transition(State::Closed);
    }

    fn fail(&mut self, err: Error) -> Error {
        debug!(state = ?self.state, %err, "bulk transfer failed");
        self.failed = true;
        self.transition(State::Failed);
        self.drain();
        err
    }
}

impl<S: ByteStream + ?Sized> Iterator for RecordedSession<'_, S> {
    type Item = Result<RecordedSample, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.state {
            State::Failed | State::Draining | State::Closed => return None,
            State::Idle => {
                if let Err(err) = self.handshake() {
                    return Some(Err(self.fail(err)));
                }
            }
            _ => {}
        }

        match self.receive() {
            Ok(Some(sample)) => {
                // Release the device as soon as the last record is in.
                if self.payload.is_none() {
                    self.drain();
                }
                Some(Ok(sample))
            }
            Ok(None) => {
                self.drain();
                None
            }
            Err(err) => Some(Err(self.fail(err))),
        }
    }
}

impl<S: ByteStream + ?Sized> Drop for RecordedSession<'_, S> {
    fn drop(&mut self) {
        // Only a session that was started needs resetting.
        if self.state != State::Idle {
            self.drain();
        }
    }
}
