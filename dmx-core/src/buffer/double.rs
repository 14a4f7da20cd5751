//! Double buffer manager
//!
//! Exactly one buffer is writable at any instant. The other holds the last
//! completed packet and stays untouched until the next [`DoubleBuffer::complete`].
//!
//! The same pair serves transmit: frames are staged into the readable
//! buffer and [`DoubleBuffer::promote_staged`] makes it the one shifted out.
//! Staging never touches the buffer being shifted out.

use crate::config::MAX_PACKET_SIZE;
use crate::error::ConfigError;

/// Two fixed-size slot buffers with a flipping active index
#[derive(Clone)]
pub struct DoubleBuffer {
    buffers: [[u8; MAX_PACKET_SIZE]; 2],
    /// Index of the buffer being filled or shifted out
    active: usize,
    /// Usable slots per buffer, fixed at construction
    capacity: usize,
    /// Next slot in the active buffer; never exceeds `capacity`
    cursor: usize,
    /// Valid slots in the active buffer when transmitting
    active_len: usize,
    /// Valid slots in the readable buffer
    readable_len: usize,
}

impl DoubleBuffer {
    /// Create a buffer pair holding `capacity` slots each
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 || capacity > MAX_PACKET_SIZE {
            return Err(ConfigError::BufferCapacity);
        }
        Ok(Self {
            buffers: [[0; MAX_PACKET_SIZE]; 2],
            active: 0,
            capacity,
            cursor: 0,
            active_len: 0,
            readable_len: 0,
        })
    }

    /// Usable slots per buffer
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Index of the buffer currently being written (0 or 1)
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Offset of the next slot in the active buffer
    pub fn slot_index(&self) -> usize {
        self.cursor
    }

    /// Check if the active buffer has no room left
    pub fn is_full(&self) -> bool {
        self.cursor >= self.capacity
    }

    /// Rewind the active buffer for a new packet
    pub fn restart(&mut self) {
        self.cursor = 0;
    }

    /// Store a slot at the cursor
    ///
    /// Returns `false`, storing nothing, once capacity is reached.
    pub fn write_slot(&mut self, byte: u8) -> bool {
        if self.is_full() {
            return false;
        }
        self.buffers[self.active][self.cursor] = byte;
        self.cursor += 1;
        true
    }

    /// Finish the packet in the active buffer and flip roles
    ///
    /// Returns the number of slots now readable.
    pub fn complete(&mut self) -> usize {
        self.readable_len = self.cursor;
        self.active ^= 1;
        self.cursor = 0;
        self.active_len = 0;
        self.readable_len
    }

    /// Slots of the last completed packet
    pub fn readable(&self) -> &[u8] {
        &self.buffers[self.active ^ 1][..self.readable_len]
    }

    /// Copy the last completed packet into `dest`
    ///
    /// Returns the number of bytes copied.
    pub fn copy_readable(&self, dest: &mut [u8]) -> usize {
        let src = self.readable();
        let len = src.len().min(dest.len());
        dest[..len].copy_from_slice(&src[..len]);
        len
    }

    /// Copy a frame into the readable buffer for a later transmit
    ///
    /// Returns the number of slots staged, clipped to capacity.
    pub fn stage(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.capacity);
        self.buffers[self.active ^ 1][..len].copy_from_slice(&data[..len]);
        self.readable_len = len;
        len
    }

    /// Slots currently staged for transmit
    pub fn staged_len(&self) -> usize {
        self.readable_len
    }

    /// Make the staged frame the active one, sending at most `len` slots
    ///
    /// The frame stays staged as well, so sending again without staging
    /// repeats it. Returns the number of slots that will be shifted out.
    pub fn promote_staged(&mut self, len: usize) -> usize {
        let staged = self.readable_len;
        let len = len.min(staged);
        self.active ^= 1;
        self.active_len = len;
        self.cursor = 0;

        let (first, second) = self.buffers.split_at_mut(1);
        let (active, readable) = if self.active == 0 {
            (&first[0], &mut second[0])
        } else {
            (&second[0], &mut first[0])
        };
        readable[..staged].copy_from_slice(&active[..staged]);
        len
    }

    /// Next slot to transmit, without consuming it
    pub fn peek_slot(&self) -> Option<u8> {
        if self.cursor >= self.active_len {
            return None;
        }
        Some(self.buffers[self.active][self.cursor])
    }

    /// Take the next slot to transmit from the active buffer
    pub fn read_slot(&mut self) -> Option<u8> {
        let byte = self.peek_slot()?;
        self.cursor += 1;
        Some(byte)
    }

    /// Slots of the active frame not yet shifted out
    pub fn remaining(&self) -> usize {
        self.active_len.saturating_sub(self.cursor)
    }
}
