//! An ordered chain of [`ByteBuffer`]s forming one logical stream.
//!
//! The chain is an arena: buffers are stored in a `Vec` and never discarded
//! during a parse, with a `head` index marking the current buffer.  `head ==
//! buffers.len()` means the chain has been advanced past the tail and has no
//! current buffer (a later `rewind` returns to the last buffer, and a later
//! `append` becomes the current buffer immediately).
//!
//! `available_bytes`/`available_buffers` always equal the byte sum/count of
//! the buffers from `head` to the tail.  `copy()` snapshots the cursor and
//! counters while sharing the underlying buffer storage, giving a second
//! reader an independent traversal over the same bytes.

use log::debug;

use crate::buffer::ByteBuffer;

#[derive(Debug, Clone, Default)]
pub struct BufferChain {
    buffers: Vec<ByteBuffer>,
    head: usize,
    available_bytes: usize,
    available_buffers: usize,
}

impl BufferChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buffers(buffers: Vec<ByteBuffer>) -> Self {
        let mut chain = Self::new();
        for buffer in buffers {
            chain.append(buffer);
        }
        chain
    }

    /// The current buffer, if the chain has not been advanced past the tail.
    pub fn first(&self) -> Option<&ByteBuffer> {
        self.buffers.get(self.head)
    }

    pub fn last(&self) -> Option<&ByteBuffer> {
        self.buffers.last()
    }

    /// Every buffer ever appended, current and traversed alike.
    pub fn total_buffers(&self) -> usize {
        self.buffers.len()
    }

    /// Bytes in the current buffer and everything after it.
    pub fn available_bytes(&self) -> usize {
        self.available_bytes
    }

    pub fn available_buffers(&self) -> usize {
        self.available_buffers
    }

    /// Iterate from the current buffer to the tail.
    pub fn iter(&self) -> impl Iterator<Item = &ByteBuffer> {
        self.buffers[self.head.min(self.buffers.len())..].iter()
    }

    /// Link `buffer` at the tail.  O(1).  Returns the new total buffer count.
    pub fn append(&mut self, buffer: ByteBuffer) -> usize {
        self.available_bytes += buffer.len();
        self.available_buffers += 1;
        self.buffers.push(buffer);
        debug!("append: {} buffers", self.buffers.len());
        self.buffers.len()
    }

    /// Leave the current buffer and move to the next one.
    ///
    /// The counters drop by the departed buffer's size either way; when
    /// there is no next buffer the chain is left without a current buffer
    /// and `false` is returned.
    pub fn advance(&mut self) -> bool {
        if let Some(buffer) = self.buffers.get(self.head) {
            self.available_bytes -= buffer.len();
            self.available_buffers -= 1;
        }
        if self.head + 1 < self.buffers.len() {
            self.head += 1;
            true
        } else {
            self.head = self.buffers.len();
            debug!("advance: nothing to advance to");
            false
        }
    }

    /// True if a rewind would move to a previous buffer.
    pub fn can_rewind(&self) -> bool {
        self.head > 0
    }

    /// Move back to the previous buffer, or to the tail when the chain has
    /// been advanced past it.  Returns `false` at the first buffer (or when
    /// the chain is empty).
    pub fn rewind(&mut self) -> bool {
        if self.head == 0 {
            return false;
        }
        self.head -= 1;
        let buffer = &self.buffers[self.head];
        self.available_bytes += buffer.len();
        self.available_buffers += 1;
        true
    }

    /// Rewind all the way back to the first buffer.
    pub fn reset(&mut self) {
        debug!("reset");
        while self.rewind() {}
    }

    /// True if a current buffer exists and has a successor.
    pub fn more_available(&self) -> bool {
        self.head + 1 < self.buffers.len()
    }

    /// An independent traversal cursor over the same underlying buffers.
    pub fn copy(&self) -> Self {
        self.clone()
    }
}
