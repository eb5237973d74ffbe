//! Standard device descriptor.

use crate::types::DescriptorType;

/// Fields of the 18-byte USB device descriptor.
///
/// BCD fields (`usb_version`, `release`) are stored as raw BCD, e.g.
/// `0x0110` for USB 1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceDescriptor {
    pub usb_version: u16,
    pub class: u8,
    pub sub_class: u8,
    pub protocol: u8,
    pub max_packet_size_0: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub release: u16,
    pub manufacturer_index: u8,
    pub product_index: u8,
    /// 0 means "no serial number string".
    pub serial_index: u8,
    pub num_configurations: u8,
}

impl DeviceDescriptor {
    pub const SIZE: usize = 18;

    /// Encode to wire format.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; Self::SIZE] {
        [
            Self::SIZE as u8,
            DescriptorType::Device as u8,
            (self.usb_version & 0xFF) as u8,
            (self.usb_version >> 8) as u8,
            self.class,
            self.sub_class,
            self.protocol,
            self.max_packet_size_0,
            (self.vendor_id & 0xFF) as u8,
            (self.vendor_id >> 8) as u8,
            (self.product_id & 0xFF) as u8,
            (self.product_id >> 8) as u8,
            (self.release & 0xFF) as u8,
            (self.release >> 8) as u8,
            self.manufacturer_index,
            self.product_index,
            self.serial_index,
            self.num_configurations,
        ]
    }

    /// Decode from wire format.
    #[must_use]
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != Self::SIZE
            || usize::from(bytes[0]) != Self::SIZE
            || bytes[1] != DescriptorType::Device as u8
        {
            return None;
        }
        let word = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        Some(Self {
            usb_version: word(2),
            class: bytes[4],
            sub_class: bytes[5],
            protocol: bytes[6],
            max_packet_size_0: bytes[7],
            vendor_id: word(8),
            product_id: word(10),
            release: word(12),
            manufacturer_index: bytes[14],
            product_index: bytes[15],
            serial_index: bytes[16],
            num_configurations: bytes[17],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: DeviceDescriptor = DeviceDescriptor {
        usb_version: 0x0200,
        class: 0xFF,
        sub_class: 0x01,
        protocol: 0x02,
        max_packet_size_0: 64,
        vendor_id: 0x1234,
        product_id: 0xABCD,
        release: 0x0102,
        manufacturer_index: 1,
        product_index: 2,
        serial_index: 0,
        num_configurations: 1,
    };

    #[test]
    fn test_device_descriptor_layout() {
        let bytes = SAMPLE.to_bytes();
        assert_eq!(bytes[0], 18);
        assert_eq!(bytes[1], 0x01);
        assert_eq!(&bytes[2..4], &[0x00, 0x02]);
        assert_eq!(&bytes[8..12], &[0x34, 0x12, 0xCD, 0xAB]);
        assert_eq!(bytes[16], 0);
    }

    #[test]
    fn test_device_descriptor_parse() {
        assert_eq!(DeviceDescriptor::parse(&SAMPLE.to_bytes()), Some(SAMPLE));
        assert_eq!(DeviceDescriptor::parse(&[18, 1, 0]), None);

        let mut wrong_type = SAMPLE.to_bytes();
        wrong_type[1] = 0x02;
        assert_eq!(DeviceDescriptor::parse(&wrong_type), None);
    }
}
