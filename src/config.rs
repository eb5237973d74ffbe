//! Board configuration: pins, buffer sizes and defaults.

use usb2serial_core::{LineEncoding, StrapPolarity};
use usb2serial_descriptors::ProgrammerEndpoints;

// ============================================================================
// Pins (Raspberry Pi Pico)
// ============================================================================

/// UART0 TX. Also used as the GPIO number for holding TX idle during
/// reconfiguration.
pub const UART_TX_GPIO: usize = 0;

// UART0 RX is GPIO 1, the mode strap GPIO 2, the target reset GPIO 3, the
// RX/TX activity LEDs GPIO 14/15 and the status LED GPIO 25. Peripherals
// are claimed by type in `main`, so only the TX number is needed here.

// ============================================================================
// Mode selection
// ============================================================================

/// Strap level that selects bridge mode.
pub const STRAP_POLARITY: StrapPolarity = if cfg!(feature = "strap-low-selects-bridge") {
    StrapPolarity::LowSelectsBridge
} else {
    StrapPolarity::HighSelectsBridge
};

// ============================================================================
// Bridge mode
// ============================================================================

/// Capacity of each bridge queue (power of two).
pub const UART_QUEUE_SIZE: usize = 128;

/// CDC data endpoint size.
pub const CDC_PACKET_SIZE: u16 = usb2serial_descriptors::bridge::DATA_PACKET_SIZE;

/// Encoding programmed before the host sends SET_LINE_CODING.
pub const DEFAULT_LINE_ENCODING: LineEncoding = LineEncoding::DEFAULT;

// ============================================================================
// Programmer mode
// ============================================================================

/// Bulk endpoint size.
pub const PROGRAMMER_PACKET_SIZE: u16 = usb2serial_descriptors::programmer::DATA_PACKET_SIZE;

/// Bulk endpoint addresses.
pub const PROGRAMMER_ENDPOINTS: ProgrammerEndpoints = if cfg!(feature = "libusb-compat") {
    ProgrammerEndpoints::LIBUSB_COMPAT
} else {
    ProgrammerEndpoints::DEFAULT
};

// ============================================================================
// USB
// ============================================================================

/// Control endpoint size.
pub const CONTROL_PACKET_SIZE: usize = 64;

/// Buffer size for embassy-usb descriptor assembly.
pub const DESCRIPTOR_BUFFER_SIZE: usize = 256;

/// Longest USB string (in characters) taken over from the descriptor tables.
pub const MAX_STRING_LEN: usize = 32;
