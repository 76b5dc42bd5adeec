//! Live samples, streamed continuously by the device.

use core::fmt;

use chrono::NaiveDateTime;
use tartan_bitfield::bitfield;
use zerocopy::{FromBytes, Immutable, IntoBytes};

use super::FormatError;

// First byte: signal quality and alarms.
bitfield! {
    struct Status(u8) {
        [0..4] signal_strength: u8,
        [4] finger_out,
        [5] dropping_spo2,
        [6] beep,
        [7] sync,
    }
}

// Third byte: bar graph, probe state and the high bit of the pulse rate.
bitfield! {
    struct Indicators(u8) {
        [0..4] bar_graph: u8,
        [4] probe_error,
        [5] searching,
        [6] pulse_rate_high,
        [7] sync,
    }
}

// Any other byte, carrying a plain 7-bit value.
bitfield! {
    struct Septet(u8) {
        [0..7] value: u8,
        [7] sync,
    }
}

#[repr(C)]
#[derive(Debug, FromBytes, IntoBytes, Immutable)]
struct LiveFrame {
    status: u8,
    pulse_waveform: u8,
    indicators: u8,
    pulse_rate_low: u8,
    spo2: u8,
}

/// A live sample.
///
/// Fields wider than their bit range on the wire are masked when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct LiveSample {
    /// Time of decoding.
    pub time: NaiveDateTime,
    /// Pulse rate in beats per minute (8 bits).
    pub pulse_rate: u8,
    /// Blood oxygen saturation in percent (7 bits).
    #[cfg_attr(feature = "serde", serde(rename = "SpO2"))]
    pub spo2: u8,
    /// Plethysmogram sample (7 bits).
    pub pulse_waveform: u8,
    /// Pulse intensity bar graph level (4 bits).
    pub bar_graph: u8,
    /// Signal strength (4 bits).
    pub signal_strength: u8,
    pub beep: bool,
    pub finger_out: bool,
    pub searching: bool,
    #[cfg_attr(feature = "serde", serde(rename = "DroppingSpO2"))]
    pub dropping_spo2: bool,
    pub probe_error: bool,
}

impl LiveSample {
    /// Decode a live frame, stamping it with `time`.
    ///
    /// Fails if the sync bit is not set on the first byte, and clear on the
    /// remaining four.
    pub fn decode(time: NaiveDateTime, r: [u8; 5]) -> Result<Self, FormatError> {
        let LiveFrame {
            status,
            pulse_waveform,
            indicators,
            pulse_rate_low,
            spo2,
        } = zerocopy::transmute!(r);

        let status = Status(status);
        let pulse_waveform = Septet(pulse_waveform);
        let indicators = Indicators(indicators);
        let pulse_rate_low = Septet(pulse_rate_low);
        let spo2 = Septet(spo2);

        if !status.sync()
            || pulse_waveform.sync()
            || indicators.sync()
            || pulse_rate_low.sync()
            || spo2.sync()
        {
            Err(FormatError::Live(r))?;
        }

        let pulse_rate = (u8::from(indicators.pulse_rate_high()) << 7) | pulse_rate_low.value();

        Ok(Self {
            time,
            pulse_rate,
            spo2: spo2.value(),
            pulse_waveform: pulse_waveform.value(),
            bar_graph: indicators.bar_graph(),
            signal_strength: status.signal_strength(),
            beep: status.beep(),
            finger_out: status.finger_out(),
            searching: indicators.searching(),
            dropping_spo2: status.dropping_spo2(),
            probe_error: indicators.probe_error(),
        })
    }

    /// Encode this sample as a live frame.
    pub fn encode(&self) -> [u8; 5] {
        let mut status = Status(0);
        status.set_signal_strength(self.signal_strength & 0x0F);
        status.set_finger_out(self.finger_out);
        status.set_dropping_spo2(self.dropping_spo2);
        status.set_beep(self.beep);
        status.set_sync(true);

        let mut indicators = Indicators(0);
        indicators.set_bar_graph(self.bar_graph & 0x0F);
        indicators.set_probe_error(self.probe_error);
        indicators.set_searching(self.searching);
        indicators.set_pulse_rate_high(self.pulse_rate & 0x80 != 0);

        let frame = LiveFrame {
            status: status.0,
            pulse_waveform: septet(self.pulse_waveform),
            indicators: indicators.0,
            pulse_rate_low: septet(self.pulse_rate),
            spo2: septet(self.spo2),
        };

        zerocopy::transmute!(frame)
    }
}

/// Pack the low 7 bits of a value, leaving the sync bit clear.
fn septet(value: u8) -> u8 {
    let mut septet = Septet(0);
    septet.set_value(value & 0x7F);
    septet.0
}

impl fmt::Display for LiveSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Time = {}, Signal Strength = {}, Finger Out = {}, Dropping SpO2 = {}, \
             Beep = {}, Pulse waveform = {}, Bar Graph = {}, Probe Error = {}, \
             Searching = {}, Pulse Rate = {} bpm, SpO2 = {}%",
            self.time,
            self.signal_strength,
            self.finger_out,
            self.dropping_spo2,
            self.beep,
            self.pulse_waveform,
            self.bar_graph,
            self.probe_error,
            self.searching,
            self.pulse_rate,
            self.spo2,
        )
    }
}
