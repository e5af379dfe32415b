// Licensed under the Apache-2.0 license

//! Fixed-capacity circular byte queue shared between mainline and interrupt.
//!
//! `head` is the next slot to write, `tail` the next slot to read. When both
//! are equal the buffer is either empty or full; the tag of the last
//! operation decides which ("record last operation"). There is no count
//! field, and apart from the tag no field is written by both sides:
//!
//! | field          | producer | consumer |
//! |----------------|----------|----------|
//! | `storage[head]`| write    | -        |
//! | `head`         | write    | read     |
//! | `tail`         | read     | write    |
//! | `last_write`   | write    | write    |
//!
//! Each side stores its tag before it advances its own index, so the other
//! side can only ever observe the tag of an operation whose data movement is
//! already done.
//!
//! Exactly one producer and one consumer may use an instance, and one of
//! them must run to completion with respect to the other (an interrupt
//! handler and the code it preempts). Two threads on separate cores do not
//! meet that: a consumer stalled between its tag store and its `tail` store
//! would let a producer wrap onto an unread slot.
//!
//! The observers load the tag on both sides of the two indices and retry if
//! it moved, so a push or pop landing between the loads is seen either
//! wholly or not at all.
//!
//! Neither side blocks here; callers spin on [`RingBuffer::is_full`] and
//! [`RingBuffer::is_empty`].

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};

/// Last operation applied to a [`RingBuffer`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LastOperation {
    Read,
    Write,
}

#[derive(Copy, Clone, Debug)]
struct Cursors {
    head: usize,
    tail: usize,
    last_write: bool,
}

impl Cursors {
    fn is_empty(self) -> bool {
        self.head == self.tail && !self.last_write
    }

    fn is_full(self) -> bool {
        self.head == self.tail && self.last_write
    }

    fn len<const N: usize>(self) -> usize {
        if self.head != self.tail {
            (self.head + N - self.tail) % N
        } else if self.last_write {
            N
        } else {
            0
        }
    }
}

pub struct RingBuffer<const N: usize> {
    storage: [AtomicU8; N],
    head: AtomicUsize,
    tail: AtomicUsize,
    /// `true` if the last operation was a write.
    last_write: AtomicBool,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// An empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        const { assert!(N > 0, "ring buffer capacity must be non-zero") };
        Self {
            storage: [const { AtomicU8::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            last_write: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors().is_empty()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.cursors().is_full()
    }

    /// Number of bytes queued.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors().len::<N>()
    }

    #[must_use]
    pub fn last_operation(&self) -> LastOperation {
        if self.last_write.load(Ordering::Acquire) {
            LastOperation::Write
        } else {
            LastOperation::Read
        }
    }

    /// Producer cursor.
    #[must_use]
    pub fn head(&self) -> usize {
        self.head.load(Ordering::Acquire)
    }

    /// Consumer cursor.
    #[must_use]
    pub fn tail(&self) -> usize {
        self.tail.load(Ordering::Acquire)
    }

    /// Append `byte`. Producer side only; the caller guarantees the buffer
    /// is not full.
    pub fn push_back(&self, byte: u8) {
        let head = self.head.load(Ordering::Relaxed);
        if let Some(slot) = self.storage.get(head) {
            slot.store(byte, Ordering::Relaxed);
        }
        self.last_write.store(true, Ordering::Release);
        self.head.store((head + 1) % N, Ordering::Release);
    }

    /// Remove and return the oldest byte. Consumer side only; the caller
    /// guarantees the buffer is not empty.
    pub fn pop_front(&self) -> u8 {
        let tail = self.tail.load(Ordering::Relaxed);
        let byte = self.byte_at(tail);
        self.last_write.store(false, Ordering::Release);
        self.tail.store((tail + 1) % N, Ordering::Release);
        byte
    }

    /// Oldest byte, left in place. Consumer side only.
    #[must_use]
    pub fn peek_front(&self) -> u8 {
        self.byte_at(self.tail.load(Ordering::Acquire))
    }

    fn cursors(&self) -> Cursors {
        self.cursors_with(|| {})
    }

    /// Consistent view of both indices and the tag. `preempt` runs at every
    /// point where the other side may complete operations between two loads.
    ///
    /// The tag is loaded before and after the indices. While one side reads,
    /// only the other side can change the tag, and only in one direction
    /// (a reading consumer can only see it become Write, a reading producer
    /// only Read). Equal tag loads therefore mean no other-side operation
    /// moved the index the tag describes; unequal loads are retried, and the
    /// retry sees the settled tag.
    fn cursors_with(&self, mut preempt: impl FnMut()) -> Cursors {
        loop {
            let before = self.last_write.load(Ordering::Acquire);
            preempt();
            let head = self.head.load(Ordering::Acquire);
            preempt();
            let tail = self.tail.load(Ordering::Acquire);
            preempt();
            let last_write = self.last_write.load(Ordering::Acquire);
            if before == last_write {
                return Cursors {
                    head,
                    tail,
                    last_write,
                };
            }
        }
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.storage
            .get(index)
            .map_or(0, |slot| slot.load(Ordering::Acquire))
    }
}
