//! Live sample decoder.
//!
//! _Requires Cargo feature `std`._

use core::mem;

use chrono::Utc;
use tracing::{debug, trace};

use crate::sans::{LiveSample, sync::FrameSynchronizer};

use super::stream::{ByteStream, Connection, Mode};

/// Iterator over live samples, stamped with the time of decoding.
///
/// The stream is opened on the first call to `next`. The iterator ends on the
/// first read timeout or I/O error, usually because the device was switched
/// off or unplugged. The stream is closed when the iterator ends or is
/// dropped.
#[derive(Debug)]
pub struct LiveSamples<'a, S: ByteStream + ?Sized> {
    connection: Connection<'a, S>,
    phase: Phase,
}

#[derive(Debug)]
enum Phase {
    Pending,
    Streaming(FrameSynchronizer),
    Finished,
}

impl<'a, S: ByteStream + ?Sized> LiveSamples<'a, S> {
    /// Begin a live session on a stream.
    pub fn new(stream: &'a mut S) -> Self {
        Self {
            connection: Connection::new(stream, Mode::Live),
            phase: Phase::Pending,
        }
    }

    /// Whether the stream has ended.
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished)
    }

    /// End the session, returning the last frame if it was complete.
    fn finish(&mut self) -> Option<LiveSample> {
        let phase = mem::replace(&mut self.phase, Phase::Finished);

        if let Err(err) = self.connection.close() {
            debug!(%err, "failed to close stream");
        }

        match phase {
            Phase::Streaming(synchronizer) => synchronizer.finish().and_then(decode),
            _ => None,
        }
    }
}

impl<S: ByteStream + ?Sized> Iterator for LiveSamples<'_, S> {
    type Item = LiveSample;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.phase {
                Phase::Finished => return None,
                Phase::Pending => {
                    if let Err(err) = self.connection.open() {
                        debug!(%err, "failed to open stream");
                        return self.finish();
                    }
                    self.phase = Phase::Streaming(FrameSynchronizer::new());
                }
                Phase::Streaming(synchronizer) => match self.connection.stream().read_byte() {
                    Ok(Some(b)) => {
                        if let Some(sample) = synchronizer.push(b).and_then(decode) {
                            return Some(sample);
                        }
                    }
                    Ok(None) => {
                        debug!("live stream timed out");
                        return self.finish();
                    }
                    // Any failure of the link ends the stream.
                    Err(err) => {
                        debug!(%err, "live stream failed");
                        return self.finish();
                    }
                },
            }
        }
    }
}

fn decode(frame: [u8; 5]) -> Option<LiveSample> {
    match LiveSample::decode(Utc::now().naive_utc(), frame) {
        Ok(sample) => Some(sample),
        Err(err) => {
            trace!(%err, "discarded live frame");
            None
        }
    }
}
