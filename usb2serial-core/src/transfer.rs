//! Bulk transfer framing: packets in, whole requests out, and back.
//!
//! A transfer ends with a short packet (shorter than the endpoint size,
//! possibly zero-length). A response whose length is a non-zero multiple
//! of the endpoint size is therefore followed by a zero-length packet.

/// Error type for request assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AssembleError {
    /// Request longer than the buffer; the rest of the transfer is dropped.
    Overflow,
}

/// Collects OUT packets into one request.
pub struct TransferAssembler<const N: usize> {
    buf: [u8; N],
    len: usize,
    complete: bool,
    discarding: bool,
}

impl<const N: usize> TransferAssembler<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            complete: false,
            discarding: false,
        }
    }

    /// Feed one packet.
    ///
    /// Returns `Ok(true)` once a short packet completes a non-empty request;
    /// read it with [`request`](Self::request) and call
    /// [`reset`](Self::reset) before feeding more. After an overflow the
    /// remainder of that transfer is swallowed.
    pub fn push(&mut self, packet: &[u8], max_packet_size: usize) -> Result<bool, AssembleError> {
        let short = packet.len() < max_packet_size;

        if self.discarding {
            if short {
                self.discarding = false;
                self.len = 0;
            }
            return Ok(false);
        }

        let end = self.len + packet.len();
        if end > N {
            self.len = 0;
            self.discarding = !short;
            return Err(AssembleError::Overflow);
        }
        self.buf[self.len..end].copy_from_slice(packet);
        self.len = end;

        if short {
            if self.len == 0 {
                return Ok(false);
            }
            self.complete = true;
            return Ok(true);
        }
        Ok(false)
    }

    /// The completed request, if any.
    #[must_use]
    pub fn request(&self) -> Option<&[u8]> {
        self.complete.then(|| &self.buf[..self.len])
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.complete = false;
        self.discarding = false;
    }
}

impl<const N: usize> Default for TransferAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds one response and hands it out packet by packet.
pub struct TransferSplitter<const N: usize> {
    buf: [u8; N],
    len: usize,
    sent: usize,
    zlp_pending: bool,
}

impl<const N: usize> TransferSplitter<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buf: [0; N],
            len: 0,
            sent: 0,
            zlp_pending: false,
        }
    }

    /// Load a new response through `fill`, which writes into the buffer
    /// and returns the length used (clamped to the buffer size).
    pub fn fill(&mut self, fill: impl FnOnce(&mut [u8]) -> usize) {
        self.len = fill(&mut self.buf).min(N);
        self.sent = 0;
        self.zlp_pending = false;
    }

    /// Whether packets remain to be sent.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.sent < self.len || self.zlp_pending
    }

    /// The next packet to send, if any.
    #[must_use]
    pub fn next_packet(&self, max_packet_size: usize) -> Option<&[u8]> {
        if self.sent < self.len {
            let end = self.len.min(self.sent + max_packet_size);
            Some(&self.buf[self.sent..end])
        } else if self.zlp_pending {
            Some(&[])
        } else {
            None
        }
    }

    /// Record that a packet of `sent` bytes went out.
    pub fn advance(&mut self, sent: usize, max_packet_size: usize) {
        if sent == 0 {
            self.zlp_pending = false;
            return;
        }
        self.sent = (self.sent + sent).min(self.len);
        if self.sent == self.len && sent == max_packet_size {
            self.zlp_pending = true;
        }
    }
}

impl<const N: usize> Default for TransferSplitter<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec;
    use std::vec::Vec;

    fn drain<const N: usize>(splitter: &mut TransferSplitter<N>, max: usize) -> Vec<usize> {
        let mut sizes = Vec::new();
        while let Some(packet) = splitter.next_packet(max) {
            let n = packet.len();
            sizes.push(n);
            splitter.advance(n, max);
        }
        sizes
    }

    #[test]
    fn test_single_short_packet_request() {
        let mut assembler = TransferAssembler::<512>::new();
        assert_eq!(assembler.push(&[0x01, 0x02], 64), Ok(true));
        assert_eq!(assembler.request(), Some(&[0x01, 0x02][..]));
    }

    #[test]
    fn test_multi_packet_request() {
        let mut assembler = TransferAssembler::<512>::new();
        let full = [0xAB; 64];
        assert_eq!(assembler.push(&full, 64), Ok(false));
        assert_eq!(assembler.request(), None);
        assert_eq!(assembler.push(&full, 64), Ok(false));
        assert_eq!(assembler.push(&[0xCD; 10], 64), Ok(true));
        assert_eq!(assembler.request().map(<[u8]>::len), Some(138));

        assembler.reset();
        assert_eq!(assembler.request(), None);
    }

    #[test]
    fn test_zero_length_packet_terminates() {
        let mut assembler = TransferAssembler::<512>::new();
        assert_eq!(assembler.push(&[1; 64], 64), Ok(false));
        assert_eq!(assembler.push(&[], 64), Ok(true));
        assert_eq!(assembler.request().map(<[u8]>::len), Some(64));
    }

    #[test]
    fn test_lone_zero_length_packet_ignored() {
        let mut assembler = TransferAssembler::<512>::new();
        assert_eq!(assembler.push(&[], 64), Ok(false));
        assert_eq!(assembler.request(), None);
    }

    #[test]
    fn test_overflow_discards_rest_of_transfer() {
        let mut assembler = TransferAssembler::<128>::new();
        let full = [0u8; 64];
        assert_eq!(assembler.push(&full, 64), Ok(false));
        assert_eq!(assembler.push(&full, 64), Ok(false));
        assert_eq!(assembler.push(&full, 64), Err(AssembleError::Overflow));
        // Tail of the oversized transfer is swallowed
        assert_eq!(assembler.push(&full, 64), Ok(false));
        assert_eq!(assembler.push(&[1, 2], 64), Ok(false));
        assert_eq!(assembler.request(), None);

        // Next transfer is received normally
        assert_eq!(assembler.push(&[3], 64), Ok(true));
        assert_eq!(assembler.request(), Some(&[3][..]));
    }

    #[test]
    fn test_response_packet_sizes() {
        let mut splitter = TransferSplitter::<512>::new();

        splitter.fill(|buf| {
            buf[..2].copy_from_slice(&[0x01, 0x00]);
            2
        });
        assert_eq!(drain(&mut splitter, 64), vec![2]);

        splitter.fill(|_| 130);
        assert_eq!(drain(&mut splitter, 64), vec![64, 64, 2]);
        assert!(!splitter.is_pending());
    }

    #[test]
    fn test_response_multiple_of_packet_size_ends_with_zlp() {
        let mut splitter = TransferSplitter::<512>::new();
        splitter.fill(|_| 128);
        assert_eq!(drain(&mut splitter, 64), vec![64, 64, 0]);
    }

    #[test]
    fn test_empty_response_sends_nothing() {
        let mut splitter = TransferSplitter::<512>::new();
        splitter.fill(|_| 0);
        assert!(!splitter.is_pending());
        assert_eq!(splitter.next_packet(64), None);
    }

    #[test]
    fn test_fill_length_clamped() {
        let mut splitter = TransferSplitter::<16>::new();
        splitter.fill(|_| 1000);
        assert_eq!(drain(&mut splitter, 64), vec![16]);
    }
}
