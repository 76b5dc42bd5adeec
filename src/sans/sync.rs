//! Recovery of live frame boundaries from an unframed byte stream.

/// Length of a live frame.
pub const FRAME_LEN: usize = 5;

const SYNC: u8 = 0x80;

/// Splits a live byte stream into candidate 5-byte frames.
///
/// Only the first byte of a live frame has its most significant bit set. Each
/// such byte closes the frame in progress and opens a new one. A frame is only
/// emitted if it was opened by a sync byte and filled completely, so joining a
/// stream mid-frame discards the first fragment instead of misreading it.
/// Bytes beyond the fifth are dropped until the next sync byte.
#[derive(Debug, Clone, Default)]
pub struct FrameSynchronizer {
    buffer: [u8; FRAME_LEN],
    filled: usize,
}

impl FrameSynchronizer {
    pub const fn new() -> Self {
        Self {
            buffer: [0; FRAME_LEN],
            filled: 0,
        }
    }

    /// Accept the next byte of the stream.
    ///
    /// Returns the previous frame if this byte is a sync byte and that frame
    /// was complete.
    pub fn push(&mut self, b: u8) -> Option<[u8; FRAME_LEN]> {
        let mut completed = None;

        if b & SYNC != 0 {
            completed = self.complete();
            self.buffer = [0; FRAME_LEN];
            self.filled = 0;
        }

        if self.filled < FRAME_LEN {
            self.buffer[self.filled] = b;
            self.filled += 1;
        }

        completed
    }

    /// End the stream.
    ///
    /// Returns the pending frame if it is complete. A partial frame is
    /// discarded.
    pub fn finish(self) -> Option<[u8; FRAME_LEN]> {
        self.complete()
    }

    fn complete(&self) -> Option<[u8; FRAME_LEN]> {
        (self.filled == FRAME_LEN && self.buffer[0] & SYNC != 0).then_some(self.buffer)
    }
}
