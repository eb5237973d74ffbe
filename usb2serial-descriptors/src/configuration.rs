//! Configuration descriptor block assembly.
//!
//! A configuration block is the configuration descriptor followed by its
//! interface, class-specific and endpoint descriptors. The builder runs in
//! const context so the block size is checked at compile time and the
//! `wTotalLength`/`bNumInterfaces` fields are always patched to match the
//! bytes that follow.

use crate::types::DescriptorType;

/// Configuration attribute bit: reserved, must be set.
pub const ATTRIBUTE_RESERVED: u8 = 0x80;
/// Configuration attribute bit: device is self-powered.
pub const ATTRIBUTE_SELF_POWERED: u8 = 0x40;
/// Configuration attribute bit: device supports remote wakeup.
pub const ATTRIBUTE_REMOTE_WAKEUP: u8 = 0x20;

/// Endpoint transfer type: bulk.
pub const ENDPOINT_BULK: u8 = 0x02;
/// Endpoint transfer type: interrupt.
pub const ENDPOINT_INTERRUPT: u8 = 0x03;

/// Direction bit of an endpoint address (set for IN).
pub const ENDPOINT_DIR_IN: u8 = 0x80;

const CONFIGURATION_HEADER_SIZE: usize = 9;
const INTERFACE_SIZE: usize = 9;
const ENDPOINT_SIZE: usize = 7;

/// Builds a configuration block of exactly `N` bytes.
///
/// ```
/// use usb2serial_descriptors::configuration::{ConfigurationBuilder, ATTRIBUTE_RESERVED, ENDPOINT_BULK};
///
/// const BLOCK: [u8; 25] = ConfigurationBuilder::new(1, ATTRIBUTE_RESERVED, 100)
///     .interface(0, 1, 0xFF, 0, 0)
///     .endpoint(0x81, ENDPOINT_BULK, 64, 0)
///     .finish();
///
/// assert_eq!(u16::from_le_bytes([BLOCK[2], BLOCK[3]]), 25);
/// assert_eq!(BLOCK[4], 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationBuilder<const N: usize> {
    buf: [u8; N],
    len: usize,
    interfaces: u8,
}

impl<const N: usize> ConfigurationBuilder<N> {
    /// Start a block with the configuration descriptor header.
    ///
    /// `max_power_ma` is rounded down to the 2 mA units of `bMaxPower`.
    #[must_use]
    pub const fn new(configuration_value: u8, attributes: u8, max_power_ma: u16) -> Self {
        assert!(N >= CONFIGURATION_HEADER_SIZE, "configuration block too small");
        assert!(max_power_ma <= 500, "bMaxPower above 500 mA");

        let mut buf = [0u8; N];
        buf[0] = CONFIGURATION_HEADER_SIZE as u8;
        buf[1] = DescriptorType::Configuration as u8;
        // buf[2..4] wTotalLength and buf[4] bNumInterfaces are patched by finish()
        buf[5] = configuration_value;
        buf[6] = 0; // iConfiguration
        buf[7] = attributes | ATTRIBUTE_RESERVED;
        buf[8] = (max_power_ma / 2) as u8;

        Self {
            buf,
            len: CONFIGURATION_HEADER_SIZE,
            interfaces: 0,
        }
    }

    const fn push(mut self, bytes: &[u8]) -> Self {
        assert!(self.len + bytes.len() <= N, "configuration block overflow");
        let mut i = 0;
        while i < bytes.len() {
            self.buf[self.len + i] = bytes[i];
            i += 1;
        }
        self.len += bytes.len();
        self
    }

    /// Append an interface descriptor (alternate setting 0, no string).
    #[must_use]
    pub const fn interface(
        mut self,
        number: u8,
        num_endpoints: u8,
        class: u8,
        sub_class: u8,
        protocol: u8,
    ) -> Self {
        self.interfaces += 1;
        self.push(&[
            INTERFACE_SIZE as u8,
            DescriptorType::Interface as u8,
            number,
            0,
            num_endpoints,
            class,
            sub_class,
            protocol,
            0,
        ])
    }

    /// Append a class-specific interface descriptor with the given body
    /// (subtype byte first).
    #[must_use]
    pub const fn class_interface(self, body: &[u8]) -> Self {
        assert!(body.len() + 2 <= 0xFF, "class descriptor too long");
        self.push(&[body.len() as u8 + 2, DescriptorType::ClassInterface as u8])
            .push(body)
    }

    /// Append an endpoint descriptor.
    #[must_use]
    pub const fn endpoint(
        self,
        address: u8,
        transfer_type: u8,
        max_packet_size: u16,
        interval: u8,
    ) -> Self {
        self.push(&[
            ENDPOINT_SIZE as u8,
            DescriptorType::Endpoint as u8,
            address,
            transfer_type,
            (max_packet_size & 0xFF) as u8,
            (max_packet_size >> 8) as u8,
            interval,
        ])
    }

    /// Patch the header and return the finished block.
    ///
    /// Fails const evaluation unless exactly `N` bytes were appended.
    #[must_use]
    pub const fn finish(mut self) -> [u8; N] {
        assert!(self.len == N, "configuration block size mismatch");
        assert!(N <= u16::MAX as usize, "configuration block too large");
        self.buf[2] = (N & 0xFF) as u8;
        self.buf[3] = (N >> 8) as u8;
        self.buf[4] = self.interfaces;
        self.buf
    }
}

/// Total length field of a configuration block.
#[must_use]
pub fn total_length(block: &[u8]) -> Option<u16> {
    match block {
        [_, ty, lo, hi, ..] if *ty == DescriptorType::Configuration as u8 => {
            Some(u16::from_le_bytes([*lo, *hi]))
        }
        _ => None,
    }
}

/// Whether the configuration block declares the device self-powered.
#[must_use]
pub fn is_self_powered(block: &[u8]) -> bool {
    block.get(7).is_some_and(|a| a & ATTRIBUTE_SELF_POWERED != 0)
}

/// Maximum bus power draw declared by a configuration block, in mA.
#[must_use]
pub fn max_power_ma(block: &[u8]) -> u16 {
    block.get(8).map_or(0, |p| u16::from(*p) * 2)
}
