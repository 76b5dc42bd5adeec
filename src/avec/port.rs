//! Serial port stream implementation.
//!
//! _Requires Cargo feature `serial`._

use std::{
    borrow::ToOwned,
    boxed::Box,
    io::{self, Read, Write},
    string::String,
    time::Duration,
};

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};

use super::stream::{ByteStream, Mode};

/// Link settings. These are fixed by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Time to wait for a single byte.
    pub timeout: Duration,
}

impl PortSettings {
    pub const LIVE: Self = Self {
        baud_rate: 19200,
        data_bits: DataBits::Eight,
        parity: Parity::Odd,
        stop_bits: StopBits::One,
        flow_control: FlowControl::None,
        timeout: Duration::from_secs(1),
    };

    pub const BULK: Self = Self {
        flow_control: FlowControl::Software,
        timeout: Duration::from_secs(5),
        ..Self::LIVE
    };

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Live => Self::LIVE,
            Mode::Bulk => Self::BULK,
        }
    }
}

/// A [`ByteStream`] over a serial port, such as the virtual port of the
/// device's USB adapter.
pub struct SerialStream {
    path: String,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialStream {
    /// Prepare a stream for the port at `path`. The port is opened lazily.
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_owned(),
            port: None,
        }
    }

    fn port(&mut self) -> io::Result<&mut Box<dyn SerialPort>> {
        self.port
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "serial port is closed"))
    }
}

impl ByteStream for SerialStream {
    fn open(&mut self, mode: Mode) -> io::Result<()> {
        let settings = PortSettings::for_mode(mode);

        if let Some(port) = &mut self.port {
            port.set_flow_control(settings.flow_control)?;
            port.set_timeout(settings.timeout)?;
            return Ok(());
        }

        let port = serialport::new(&self.path, settings.baud_rate)
            .data_bits(settings.data_bits)
            .parity(settings.parity)
            .stop_bits(settings.stop_bits)
            .flow_control(settings.flow_control)
            .timeout(settings.timeout)
            .open()?;

        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        // Dropping the handle releases the port.
        self.port = None;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0; 1];
        match self.port()?.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.port()?.write_all(bytes)
    }

    fn flush_input(&mut self) -> io::Result<()> {
        self.port()?.clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn flush_output(&mut self) -> io::Result<()> {
        self.port()?.flush()
    }
}

impl core::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialStream")
            .field("path", &self.path)
            .field("open", &self.is_open())
            .finish()
    }
}
