//! Bounded single-producer/single-consumer byte queue.
//!
//! One side of each queue runs in interrupt context (the UART receive
//! handler) and the other in the main loop, so the queue is lock-free:
//! the producer alone advances the write cursor, the consumer alone
//! advances the read cursor, and each publishes its cursor with release
//! ordering after touching the slot it owns.
//!
//! Cursors run freely and wrap at `usize::MAX`; the occupied count is
//! their wrapping difference. `N` must be a power of two so slot indices
//! stay continuous across the wrap, and all `N` slots are usable.
//!
//! # Example
//!
//! ```
//! use usb2serial_core::ByteQueue;
//!
//! let mut queue = ByteQueue::<4>::new();
//! let (mut producer, mut consumer) = queue.split();
//!
//! producer.insert(b'a').unwrap();
//! producer.insert(b'b').unwrap();
//! assert_eq!(consumer.peek(), Some(b'a'));
//! assert_eq!(consumer.remove(), Some(b'a'));
//! assert_eq!(consumer.count(), 1);
//! ```

use core::cell::UnsafeCell;
use portable_atomic::{AtomicUsize, Ordering};

/// Fixed-capacity FIFO of bytes, split into a [`Producer`] and a [`Consumer`].
pub struct ByteQueue<const N: usize> {
    buffer: UnsafeCell<[u8; N]>,
    /// Read cursor, advanced only by the consumer.
    head: AtomicUsize,
    /// Write cursor, advanced only by the producer.
    tail: AtomicUsize,
}

// SAFETY: the buffer is only reached through the split handles. The
// producer writes slots outside the readable window and the consumer
// reads slots inside it; the window moves only via atomic cursor stores.
unsafe impl<const N: usize> Sync for ByteQueue<N> {}

impl<const N: usize> ByteQueue<N> {
    const CAPACITY_IS_POWER_OF_TWO: () =
        assert!(N > 0 && N.is_power_of_two(), "queue capacity must be a power of two");
    const MASK: usize = N - 1;

    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_IS_POWER_OF_TWO;
        Self {
            buffer: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Maximum number of bytes the queue holds.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Split into the producer and consumer halves.
    ///
    /// The exclusive borrow guarantees at most one of each exists.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        let queue: &Self = self;
        (Producer { queue }, Consumer { queue })
    }

    #[inline]
    fn slot(&self, cursor: usize) -> *mut u8 {
        // SAFETY: the masked index is always below N.
        unsafe { self.buffer.get().cast::<u8>().add(cursor & Self::MASK) }
    }
}

impl<const N: usize> Default for ByteQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserting half of a [`ByteQueue`].
pub struct Producer<'q, const N: usize> {
    queue: &'q ByteQueue<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Append a byte. Hands the byte back if the queue is full.
    pub fn insert(&mut self, byte: u8) -> Result<(), u8> {
        let tail = self.queue.tail.load(Ordering::Relaxed);
        let head = self.queue.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= N {
            return Err(byte);
        }
        // SAFETY: slot `tail` is outside the consumer's window until the
        // store below publishes it.
        unsafe { self.queue.slot(tail).write(byte) };
        self.queue.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// Number of bytes currently queued.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        let tail = self.queue.tail.load(Ordering::Relaxed);
        let head = self.queue.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count() >= N
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Removing half of a [`ByteQueue`].
pub struct Consumer<'q, const N: usize> {
    queue: &'q ByteQueue<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Return the oldest byte without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        let head = self.queue.head.load(Ordering::Relaxed);
        let tail = self.queue.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }
        // SAFETY: slot `head` is inside the window published by the producer.
        Some(unsafe { self.queue.slot(head).read() })
    }

    /// Remove and return the oldest byte.
    pub fn remove(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        let head = self.queue.head.load(Ordering::Relaxed);
        self.queue.head.store(head.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// Discard everything currently queued.
    ///
    /// Bytes the producer inserts concurrently may or may not survive.
    pub fn clear(&mut self) {
        let tail = self.queue.tail.load(Ordering::Acquire);
        self.queue.head.store(tail, Ordering::Release);
    }

    /// Number of bytes currently queued.
    #[inline]
    #[must_use]
    pub fn count(&self) -> usize {
        let head = self.queue.head.load(Ordering::Relaxed);
        let tail = self.queue.tail.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.count() >= N
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::collections::VecDeque;
    use std::thread;
    use std::vec::Vec;

    /// Small deterministic generator so failures reproduce.
    struct Lcg(u32);

    impl Lcg {
        fn next(&mut self) -> u32 {
            self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            self.0 >> 16
        }
    }

    #[test]
    fn test_new_queue_is_empty() {
        let mut queue = ByteQueue::<8>::new();
        assert_eq!(queue.capacity(), 8);
        let (producer, consumer) = queue.split();
        assert!(producer.is_empty());
        assert!(consumer.is_empty());
        assert_eq!(consumer.peek(), None);
    }

    #[test]
    fn test_fifo_order() {
        let mut queue = ByteQueue::<8>::new();
        let (mut producer, mut consumer) = queue.split();
        for b in 1..=5 {
            producer.insert(b).unwrap();
        }
        for b in 1..=5 {
            assert_eq!(consumer.remove(), Some(b));
        }
        assert_eq!(consumer.remove(), None);
    }

    #[test]
    fn test_full_queue_rejects_insert() {
        let mut queue = ByteQueue::<4>::new();
        let (mut producer, mut consumer) = queue.split();
        for b in 0..4 {
            producer.insert(b).unwrap();
        }
        assert!(producer.is_full());
        assert!(consumer.is_full());
        assert_eq!(producer.insert(0xAA), Err(0xAA));
        assert_eq!(consumer.count(), 4);

        // Contents unchanged by the rejected insert
        assert_eq!(consumer.remove(), Some(0));
        producer.insert(9).unwrap();
        assert_eq!(consumer.remove(), Some(1));
        assert_eq!(consumer.remove(), Some(2));
        assert_eq!(consumer.remove(), Some(3));
        assert_eq!(consumer.remove(), Some(9));
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = ByteQueue::<4>::new();
        let (mut producer, mut consumer) = queue.split();
        producer.insert(7).unwrap();
        assert_eq!(consumer.peek(), Some(7));
        assert_eq!(consumer.peek(), Some(7));
        assert_eq!(consumer.count(), 1);
        assert_eq!(consumer.remove(), Some(7));
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut queue = ByteQueue::<4>::new();
        let (mut producer, mut consumer) = queue.split();
        producer.insert(1).unwrap();
        producer.insert(2).unwrap();
        consumer.clear();
        assert!(consumer.is_empty());
        assert!(producer.is_empty());
        producer.insert(3).unwrap();
        assert_eq!(consumer.remove(), Some(3));
    }

    #[test]
    fn test_matches_reference_model() {
        let mut queue = ByteQueue::<16>::new();
        let (mut producer, mut consumer) = queue.split();
        let mut model: VecDeque<u8> = VecDeque::new();
        let mut rng = Lcg(0x5EED);

        // Enough operations to wrap the slot index many times
        for step in 0..20_000u32 {
            if rng.next() % 3 == 0 {
                assert_eq!(consumer.remove(), model.pop_front(), "step {step}");
            } else {
                let byte = (rng.next() & 0xFF) as u8;
                let accepted = producer.insert(byte).is_ok();
                assert_eq!(accepted, model.len() < 16, "step {step}");
                if accepted {
                    model.push_back(byte);
                }
            }
            assert_eq!(consumer.count(), model.len());
            assert_eq!(producer.count(), model.len());
            assert_eq!(consumer.peek(), model.front().copied());
        }
    }

    #[test]
    fn test_cursor_wraparound() {
        let mut queue = ByteQueue::<4>::new();
        queue.head.store(usize::MAX - 1, Ordering::Relaxed);
        queue.tail.store(usize::MAX - 1, Ordering::Relaxed);
        let (mut producer, mut consumer) = queue.split();

        for b in 0..4 {
            producer.insert(b).unwrap();
        }
        assert!(producer.is_full());
        assert_eq!(producer.insert(4), Err(4));
        for b in 0..4 {
            assert_eq!(consumer.remove(), Some(b));
        }
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_concurrent_producer_consumer() {
        const TOTAL: usize = 100_000;
        let queue: &'static mut ByteQueue<64> = std::boxed::Box::leak(std::boxed::Box::new(ByteQueue::new()));
        let (mut producer, mut consumer) = queue.split();

        let writer = thread::spawn(move || {
            let mut sent = 0usize;
            while sent < TOTAL {
                if producer.insert((sent % 251) as u8).is_ok() {
                    sent += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::with_capacity(TOTAL);
        while received.len() < TOTAL {
            match consumer.remove() {
                Some(b) => received.push(b),
                None => thread::yield_now(),
            }
        }
        writer.join().unwrap();

        // No loss, no duplication, no reordering
        for (i, b) in received.iter().enumerate() {
            assert_eq!(*b, (i % 251) as u8);
        }
    }
}
