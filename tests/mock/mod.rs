#![allow(dead_code)]

use std::{collections::VecDeque, io};

use cms50::avec::{ByteStream, Mode};
use tracing_subscriber::EnvFilter;

/// One scripted response to `read_byte`.
#[derive(Debug, Clone, Copy)]
pub enum Read {
    Byte(u8),
    Timeout,
    Fail,
}

/// Everything done to the stream other than reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(Mode),
    Close,
    Write(Vec<u8>),
    FlushInput,
    FlushOutput,
}

/// An in-memory stream replaying a script of reads, and recording every other
/// call. Reads beyond the script time out.
#[derive(Debug, Default)]
pub struct MockStream {
    pub reads: VecDeque<Read>,
    pub events: Vec<Event>,
    pub open: bool,
    pub refuse_open: bool,
}

impl MockStream {
    pub fn new(bytes: &[u8]) -> Self {
        init_tracing();

        Self {
            reads: bytes.iter().copied().map(Read::Byte).collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, bytes: &[u8]) -> &mut Self {
        self.reads.extend(bytes.iter().copied().map(Read::Byte));
        self
    }

    pub fn push_timeout(&mut self) -> &mut Self {
        self.reads.push_back(Read::Timeout);
        self
    }

    pub fn push_failure(&mut self) -> &mut Self {
        self.reads.push_back(Read::Fail);
        self
    }

    /// Bytes left unread in the script.
    pub fn unread(&self) -> usize {
        self.reads
            .iter()
            .filter(|r| matches!(r, Read::Byte(_)))
            .count()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(bytes) => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events.iter().filter(|e| *e == event).count()
    }

    fn check_open(&self) -> io::Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::NotConnected, "mock stream is closed"))
        }
    }
}

impl ByteStream for MockStream {
    fn open(&mut self, mode: Mode) -> io::Result<()> {
        if self.refuse_open {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such port"));
        }
        self.open = true;
        self.events.push(Event::Open(mode));
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.open = false;
        self.events.push(Event::Close);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.check_open()?;
        match self.reads.pop_front() {
            Some(Read::Byte(b)) => Ok(Some(b)),
            Some(Read::Timeout) | None => Ok(None),
            Some(Read::Fail) => Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged")),
        }
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.check_open()?;
        self.events.push(Event::Write(bytes.to_vec()));
        Ok(())
    }

    fn flush_input(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.events.push(Event::FlushInput);
        Ok(())
    }

    fn flush_output(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.events.push(Event::FlushOutput);
        Ok(())
    }
}

/// Route session logs to the test harness, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Idle status bytes sent by the device before a download request.
pub const IDLE: [u8; 10] = [0x80, 0x01, 0x00, 0x40, 0x5F, 0x80, 0x01, 0x00, 0x40, 0x5F];

/// Length header announcing `length` payload bytes.
pub fn length_header(length: u32) -> [u8; 3] {
    let n = length - 1;
    [
        0x80 | ((n >> 14) & 0x7F) as u8,
        0x80 | ((n >> 7) & 0x7F) as u8,
        (n & 0x7F) as u8,
    ]
}

/// A device answering a download request with `payload`.
pub fn device(payload: &[u8]) -> MockStream {
    let mut stream = MockStream::new(&IDLE);
    stream
        .push(&[0xF2, 0x80, 0x00])
        .push(&length_header(payload.len() as u32))
        .push(payload);
    stream
}
