//! Recorded samples, dumped by the device in a bulk transfer.

use core::fmt;

use chrono::NaiveDateTime;
use tartan_bitfield::bitfield;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use super::FormatError;

bitfield! {
    struct Marker(u8) {
        [0] pulse_rate_high,
        [1..8] pattern: u8,
    }
}

bitfield! {
    struct Septet(u8) {
        [0..7] value: u8,
        [7] sync,
    }
}

/// Value of the upper seven bits of the first byte of every record.
const MARKER_PATTERN: u8 = 0xF0 >> 1;

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable)]
struct RecordedFrame {
    marker: u8,
    pulse_rate_low: u8,
    spo2: u8,
}

/// A sample from a recorded session, one per second.
///
/// Timestamps are not stored on the device. They are derived from the session
/// start time supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct RecordedSample {
    pub time: NaiveDateTime,
    /// Pulse rate in beats per minute (8 bits).
    pub pulse_rate: u8,
    /// Blood oxygen saturation in percent (7 bits).
    #[cfg_attr(feature = "serde", serde(rename = "SpO2"))]
    pub spo2: u8,
}

impl RecordedSample {
    /// Decode a recorded frame, stamping it with `time`.
    pub fn decode(time: NaiveDateTime, r: [u8; 3]) -> Result<Self, FormatError> {
        let RecordedFrame {
            marker,
            pulse_rate_low,
            spo2,
        } = zerocopy::transmute!(r);

        let marker = Marker(marker);
        let pulse_rate_low = Septet(pulse_rate_low);
        let spo2 = Septet(spo2);

        if marker.pattern() != MARKER_PATTERN || !pulse_rate_low.sync() || spo2.sync() {
            Err(FormatError::Recorded(r))?;
        }

        let pulse_rate = (u8::from(marker.pulse_rate_high()) << 7) | pulse_rate_low.value();

        Ok(Self {
            time,
            pulse_rate,
            spo2: spo2.value(),
        })
    }

    /// Encode this sample as a recorded frame.
    pub fn encode(&self) -> [u8; 3] {
        let mut marker = Marker(0);
        marker.set_pattern(MARKER_PATTERN);
        marker.set_pulse_rate_high(self.pulse_rate & 0x80 != 0);

        let mut pulse_rate_low = Septet(0);
        pulse_rate_low.set_value(self.pulse_rate & 0x7F);
        pulse_rate_low.set_sync(true);

        let mut spo2 = Septet(0);
        spo2.set_value(self.spo2 & 0x7F);

        let frame = RecordedFrame {
            marker: marker.0,
            pulse_rate_low: pulse_rate_low.0,
            spo2: spo2.0,
        };

        zerocopy::transmute!(frame)
    }
}

impl fmt::Display for RecordedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time = {}, Pulse Rate = {} bpm, SpO2 = {}%",
            self.time, self.pulse_rate, self.spo2
        )
    }
}
