//! Convenience interfaces for reading from a device.
//!
//! An [`Oximeter`] owns a [`ByteStream`] to the device and starts one session
//! at a time: either a [`LiveSamples`] iterator, or a [`RecordedSession`]
//! downloading the session stored on the device. Both borrow the oximeter
//! mutably, so sessions cannot overlap.
//!
//! _Requires Cargo feature `std`._
//!
//! ```
//! let mut oximeter = Oximeter::open("/dev/ttyUSB0");
//!
//! for sample in oximeter.live().take(60) {
//!     println!("{sample}");
//! }
//!
//! let start = NaiveDate::from_ymd_opt(2015, 3, 1)
//!     .and_then(|d| d.and_hms_opt(22, 30, 0))
//!     .unwrap();
//!
//! for sample in oximeter.recorded(start) {
//!     println!("{}", sample?);
//! }
//! ```

use chrono::NaiveDateTime;

pub mod bulk;
pub mod live;
#[cfg(feature = "serial")]
pub mod port;
pub mod stream;

pub use bulk::RecordedSession;
pub use live::LiveSamples;
pub use stream::{ByteStream, Connection, Mode};

/// A pulse oximeter attached through a byte stream.
#[derive(Debug)]
pub struct Oximeter<S: ByteStream> {
    stream: S,
}

impl<S: ByteStream> Oximeter<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// Start streaming live samples.
    ///
    /// See [`LiveSamples`].
    pub fn live(&mut self) -> LiveSamples<'_, S> {
        LiveSamples::new(&mut self.stream)
    }

    /// Start downloading the recorded session, whose first sample was taken
    /// at `start`.
    ///
    /// See [`RecordedSession`].
    pub fn recorded(&mut self, start: NaiveDateTime) -> RecordedSession<'_, S> {
        RecordedSession::new(&mut self.stream, start)
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(feature = "serial")]
impl Oximeter<port::SerialStream> {
    /// Attach to the device's serial port at `path`.
    ///
    /// _Requires Cargo feature `serial`._
    pub fn open(path: &str) -> Self {
        Self::new(port::SerialStream::new(path))
    }
}
