//! USB-side traits: the virtual serial channel and the raw bulk link.

use crate::control::ControlEvent;

/// Error type for USB link operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Endpoint busy with a previous transfer.
    Busy,
    /// USB/communication I/O error.
    Io,
}

/// Byte-oriented CDC-ACM channel, polled from the main loop.
///
/// None of the methods may block. Bytes accepted by
/// [`send_byte`](Self::send_byte) are staged and go out as one IN packet
/// on the next [`housekeeping`](Self::housekeeping) call.
pub trait SerialChannel {
    /// Size of the data IN endpoint.
    fn max_packet_size(&self) -> usize;

    /// Take one received byte, if any.
    fn read_byte(&mut self) -> Option<u8>;

    /// Whether the IN endpoint can take a new packet.
    fn is_in_ready(&mut self) -> bool;

    /// Stage one byte for the host.
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError>;

    /// Next pending control event, if any.
    fn poll_event(&mut self) -> Option<ControlEvent>;

    /// Flush staged IN data and service the class.
    fn housekeeping(&mut self);

    /// Drop staged IN data and the unread rest of the current OUT packet.
    /// Called when the host configures the device.
    fn reset(&mut self) {}
}

/// Packet-oriented bulk endpoint pair.
pub trait BulkLink {
    /// Size of the bulk endpoints.
    fn max_packet_size(&self) -> usize;

    /// Take one received OUT packet into `buf`, if one is waiting.
    /// Returns its length; 0 is a zero-length packet.
    fn read_packet(&mut self, buf: &mut [u8]) -> Option<usize>;

    /// Queue one IN packet. Fails with [`LinkError::Busy`] while the
    /// previous packet is still in flight, in which case nothing is sent.
    fn write_packet(&mut self, data: &[u8]) -> Result<(), LinkError>;
}
