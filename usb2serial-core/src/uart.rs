//! UART-side traits and the receive interrupt helper.

use crate::line::FrameControl;
use crate::queue::Producer;

/// Configuration access to the UART, used by
/// [`SerialLineController`](crate::SerialLineController).
pub trait UartConfig {
    /// Force the TX line to its idle (mark) level, or release it back to
    /// the UART.
    fn hold_tx_idle(&mut self, hold: bool);

    /// Turn off the transmitter, the receiver and the receive interrupt.
    fn disable(&mut self);

    /// Program the baud rate divisor.
    fn set_baud_rate(&mut self, baud_rate: u32);

    /// Program parity, stop bits and character size.
    fn set_frame(&mut self, frame: FrameControl);

    /// Turn on the transmitter, the receiver and the receive interrupt.
    fn enable(&mut self);
}

/// Byte-at-a-time transmit access to the UART.
pub trait UartTransmit {
    /// Whether the UART can accept another byte right now.
    fn is_send_ready(&mut self) -> bool;

    /// Hand one byte to the UART. Only called after
    /// [`is_send_ready`](Self::is_send_ready) returned `true`.
    fn send_byte(&mut self, byte: u8);
}

/// Receive interrupt body: queue a byte for the host.
///
/// The byte is dropped when the USB link is not configured or the queue is
/// full. Returns whether it was queued.
pub fn accept_rx_byte<const N: usize>(producer: &mut Producer<'_, N>, byte: u8, link_up: bool) -> bool {
    link_up && producer.insert(byte).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::ByteQueue;

    #[test]
    fn test_rx_byte_dropped_when_link_down() {
        let mut queue = ByteQueue::<4>::new();
        let (mut producer, consumer) = queue.split();
        assert!(!accept_rx_byte(&mut producer, 0x55, false));
        assert!(consumer.is_empty());
    }

    #[test]
    fn test_rx_byte_dropped_when_full() {
        let mut queue = ByteQueue::<2>::new();
        let (mut producer, mut consumer) = queue.split();
        assert!(accept_rx_byte(&mut producer, 1, true));
        assert!(accept_rx_byte(&mut producer, 2, true));
        assert!(!accept_rx_byte(&mut producer, 3, true));
        assert_eq!(consumer.remove(), Some(1));
        assert_eq!(consumer.remove(), Some(2));
        assert_eq!(consumer.remove(), None);
    }
}
