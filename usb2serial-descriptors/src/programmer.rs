//! AVRISP mkII compatible descriptor set used in programmer mode.
//!
//! One vendor-class interface with a bulk IN/OUT endpoint pair. Host
//! tooling matches on the exact vendor/product IDs and serial number
//! format of the genuine programmer, so these tables are byte-exact.

use crate::configuration::{
    ConfigurationBuilder, ATTRIBUTE_SELF_POWERED, ENDPOINT_BULK, ENDPOINT_DIR_IN,
};
use crate::device::DeviceDescriptor;
use crate::string::{string_descriptor, LANGUAGE_TABLE};
use crate::types::{Descriptor, DescriptorType};
use crate::{DescriptorCatalog, MANUFACTURER_NAME};

/// Vendor ID of the programmer personality (Atmel).
pub const VENDOR_ID: u16 = 0x03EB;
/// Product ID of the programmer personality (AVRISP mkII).
pub const PRODUCT_ID: u16 = 0x2104;
/// Product name of the programmer personality.
pub const PRODUCT_NAME: &str = "AVRISP mkII";

/// Size of the control endpoint.
pub const CONTROL_PACKET_SIZE: u8 = 64;
/// Size of the bulk data endpoints.
pub const DATA_PACKET_SIZE: u16 = 64;

const CLASS_VENDOR: u8 = 0xFF;

/// Serial number template.
///
/// The trailing NUL is part of the string as reported by genuine
/// programmers and is reproduced as-is.
pub const SERIAL_TEMPLATE: &str = "000200012345\0";

/// Size of the serial number string descriptor.
pub const SERIAL_DESCRIPTOR_SIZE: usize = 2 + 2 * SERIAL_TEMPLATE.len();

/// UTF-16 position of the endpoint digit within the serial number.
pub const SERIAL_ENDPOINT_DIGIT: usize = 6;

/// Bulk endpoint addresses used in programmer mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgrammerEndpoints {
    /// Device-to-host endpoint address (direction bit set).
    pub data_in: u8,
    /// Host-to-device endpoint address.
    pub data_out: u8,
}

impl ProgrammerEndpoints {
    /// IN 2 / OUT 2, as used by the genuine programmer.
    pub const DEFAULT: Self = Self {
        data_in: ENDPOINT_DIR_IN | 2,
        data_out: 2,
    };

    /// IN 3 / OUT 2, for host stacks that cannot share an endpoint number
    /// between directions.
    pub const LIBUSB_COMPAT: Self = Self {
        data_in: ENDPOINT_DIR_IN | 3,
        data_out: 2,
    };

    /// Endpoint number of the IN endpoint (address without direction bit).
    #[inline]
    #[must_use]
    pub const fn data_in_number(self) -> u8 {
        self.data_in & 0x0F
    }

    #[inline]
    #[must_use]
    pub const fn data_out_number(self) -> u8 {
        self.data_out & 0x0F
    }
}

impl Default for ProgrammerEndpoints {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Device descriptor fields of the programmer personality.
pub const DEVICE: DeviceDescriptor = DeviceDescriptor {
    usb_version: 0x0110,
    class: CLASS_VENDOR,
    sub_class: 0x00,
    protocol: 0x00,
    max_packet_size_0: CONTROL_PACKET_SIZE,
    vendor_id: VENDOR_ID,
    product_id: PRODUCT_ID,
    release: 0x0109,
    manufacturer_index: crate::STRING_INDEX_MANUFACTURER,
    product_index: crate::STRING_INDEX_PRODUCT,
    serial_index: crate::STRING_INDEX_SERIAL,
    num_configurations: 1,
};

static DEVICE_BYTES: [u8; DeviceDescriptor::SIZE] = DEVICE.to_bytes();
static MANUFACTURER: [u8; 18] = string_descriptor(MANUFACTURER_NAME);
static PRODUCT: [u8; 24] = string_descriptor(PRODUCT_NAME);
const SERIAL: [u8; SERIAL_DESCRIPTOR_SIZE] = string_descriptor(SERIAL_TEMPLATE);

/// Size of the programmer configuration block.
pub const CONFIGURATION_SIZE: usize = 32;

/// Build the programmer configuration block for the given endpoints.
#[must_use]
pub const fn configuration(endpoints: ProgrammerEndpoints) -> [u8; CONFIGURATION_SIZE] {
    ConfigurationBuilder::new(1, ATTRIBUTE_SELF_POWERED, 100)
        .interface(0, 2, CLASS_VENDOR, 0, 0)
        .endpoint(endpoints.data_in, ENDPOINT_BULK, DATA_PACKET_SIZE, 0x0A)
        .endpoint(endpoints.data_out, ENDPOINT_BULK, DATA_PACKET_SIZE, 0x0A)
        .finish()
}

/// Write the endpoint digit into a serial number descriptor.
pub fn stamp_serial(serial: &mut [u8; SERIAL_DESCRIPTOR_SIZE], data_in: u8) {
    let offset = 2 + 2 * SERIAL_ENDPOINT_DIGIT;
    let [lo, hi] = u16::from(b'0' + (data_in & 0x0F)).to_le_bytes();
    serial[offset] = lo;
    serial[offset + 1] = hi;
}

/// Descriptor lookup for programmer mode.
///
/// Holds the configuration block and the serial number in RAM. The serial
/// number gets its endpoint digit rewritten on every read, before the
/// descriptor is handed out.
#[derive(Debug, Clone)]
pub struct ProgrammerCatalog {
    endpoints: ProgrammerEndpoints,
    configuration: [u8; CONFIGURATION_SIZE],
    serial: [u8; SERIAL_DESCRIPTOR_SIZE],
}

impl ProgrammerCatalog {
    #[must_use]
    pub const fn new(endpoints: ProgrammerEndpoints) -> Self {
        Self {
            endpoints,
            configuration: configuration(endpoints),
            serial: SERIAL,
        }
    }

    #[inline]
    #[must_use]
    pub const fn endpoints(&self) -> ProgrammerEndpoints {
        self.endpoints
    }
}

impl Default for ProgrammerCatalog {
    fn default() -> Self {
        Self::new(ProgrammerEndpoints::DEFAULT)
    }
}

impl DescriptorCatalog for ProgrammerCatalog {
    fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>> {
        match kind {
            DescriptorType::Device => Some(Descriptor::flash(&DEVICE_BYTES)),
            DescriptorType::Configuration => Some(Descriptor::ram(&self.configuration)),
            DescriptorType::String => match index {
                crate::STRING_INDEX_LANGUAGE => Some(Descriptor::flash(&LANGUAGE_TABLE)),
                crate::STRING_INDEX_MANUFACTURER => Some(Descriptor::flash(&MANUFACTURER)),
                crate::STRING_INDEX_PRODUCT => Some(Descriptor::flash(&PRODUCT)),
                crate::STRING_INDEX_SERIAL => {
                    stamp_serial(&mut self.serial, self.endpoints.data_in);
                    Some(Descriptor::ram(&self.serial))
                }
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::total_length;
    use crate::MemorySpace;

    fn serial_of(endpoints: ProgrammerEndpoints) -> [u8; SERIAL_DESCRIPTOR_SIZE] {
        let mut catalog = ProgrammerCatalog::new(endpoints);
        let mut out = [0u8; SERIAL_DESCRIPTOR_SIZE];
        out.copy_from_slice(catalog.describe(DescriptorType::String, 3).unwrap().as_bytes());
        out
    }

    #[test]
    fn test_device_descriptor() {
        let mut catalog = ProgrammerCatalog::default();
        let desc = catalog.describe(DescriptorType::Device, 0).unwrap();
        assert_eq!(desc.space(), MemorySpace::Flash);
        assert_eq!(
            desc.as_bytes(),
            &[18, 1, 0x10, 0x01, 0xFF, 0, 0, 64, 0xEB, 0x03, 0x04, 0x21, 0x09, 0x01, 1, 2, 3, 1]
        );
    }

    #[test]
    fn test_configuration_block() {
        let mut catalog = ProgrammerCatalog::default();
        let desc = catalog.describe(DescriptorType::Configuration, 0).unwrap();
        let bytes = desc.as_bytes();

        assert_eq!(desc.space(), MemorySpace::Ram);
        assert_eq!(total_length(bytes), Some(32));
        assert_eq!(&bytes[..9], &[9, 2, 32, 0, 1, 1, 0, 0xC0, 50]);
        assert_eq!(&bytes[9..18], &[9, 4, 0, 0, 2, 0xFF, 0, 0, 0]);
        assert_eq!(&bytes[18..25], &[7, 5, 0x82, 0x02, 64, 0, 0x0A]);
        assert_eq!(&bytes[25..32], &[7, 5, 0x02, 0x02, 64, 0, 0x0A]);
    }

    #[test]
    fn test_libusb_compat_endpoint() {
        let block = configuration(ProgrammerEndpoints::LIBUSB_COMPAT);
        assert_eq!(block[20], 0x83);
        assert_eq!(block[27], 0x02);
    }

    #[test]
    fn test_serial_keeps_embedded_nul() {
        let serial = serial_of(ProgrammerEndpoints::DEFAULT);
        assert_eq!(serial.len(), 28);
        assert_eq!(serial[0], 28);
        assert_eq!(serial[1], 0x03);
        // Last code unit is the embedded NUL
        assert_eq!(&serial[26..], &[0, 0]);
        // Endpoint digit reflects IN endpoint 2
        assert_eq!(serial[14], b'2');
    }

    #[test]
    fn test_serial_differs_only_in_endpoint_digit() {
        let a = serial_of(ProgrammerEndpoints::DEFAULT);
        let b = serial_of(ProgrammerEndpoints::LIBUSB_COMPAT);

        assert_eq!(a.len(), b.len());
        let differing: usize = a.iter().zip(b.iter()).filter(|(x, y)| x != y).count();
        assert_eq!(differing, 1);
        assert_eq!(a[14], b'2');
        assert_eq!(b[14], b'3');
    }

    #[test]
    fn test_serial_read_is_idempotent() {
        let mut catalog = ProgrammerCatalog::default();
        let mut first = [0u8; SERIAL_DESCRIPTOR_SIZE];
        first.copy_from_slice(catalog.describe(DescriptorType::String, 3).unwrap().as_bytes());
        let second = catalog.describe(DescriptorType::String, 3).unwrap();
        assert_eq!(second.space(), MemorySpace::Ram);
        assert_eq!(second.as_bytes(), &first[..]);
    }

    #[test]
    fn test_strings() {
        let mut catalog = ProgrammerCatalog::default();
        assert_eq!(catalog.describe(DescriptorType::String, 0).unwrap().len(), 4);
        assert_eq!(catalog.describe(DescriptorType::String, 1).unwrap().len(), 18);
        assert_eq!(catalog.describe(DescriptorType::String, 2).unwrap().len(), 24);
        assert!(catalog.describe(DescriptorType::String, 4).is_none());
        assert!(catalog.get_descriptor(0x0304, 0x0409).is_none());
    }
}
