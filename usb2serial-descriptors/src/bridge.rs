//! CDC-ACM descriptor set used in bridge mode.
//!
//! Two interfaces: a communications interface with one interrupt
//! notification endpoint, and a data interface with a bulk OUT/IN pair.
//! No serial number string is offered.

use crate::configuration::{
    ConfigurationBuilder, ATTRIBUTE_SELF_POWERED, ENDPOINT_BULK, ENDPOINT_DIR_IN,
    ENDPOINT_INTERRUPT,
};
use crate::device::DeviceDescriptor;
use crate::string::{string_descriptor, LANGUAGE_TABLE};
use crate::types::{Descriptor, DescriptorType};
use crate::{DescriptorCatalog, MANUFACTURER_NAME};

/// Vendor ID of the bridge personality.
pub const VENDOR_ID: u16 = 0x16D0;
/// Product ID of the bridge personality.
pub const PRODUCT_ID: u16 = 0x0BA4;
/// Product name of the bridge personality.
pub const PRODUCT_NAME: &str = "eHaJo USB2Serial";

/// Size of the control endpoint.
pub const CONTROL_PACKET_SIZE: u8 = 64;
/// Size of the CDC notification endpoint.
pub const NOTIFICATION_PACKET_SIZE: u16 = 8;
/// Size of the CDC data endpoints.
pub const DATA_PACKET_SIZE: u16 = 64;

/// Address of the CDC notification endpoint (IN 2).
pub const NOTIFICATION_ENDPOINT: u8 = ENDPOINT_DIR_IN | 2;
/// Address of the CDC host-to-device data endpoint (OUT 4).
pub const DATA_OUT_ENDPOINT: u8 = 4;
/// Address of the CDC device-to-host data endpoint (IN 3).
pub const DATA_IN_ENDPOINT: u8 = ENDPOINT_DIR_IN | 3;

const CLASS_CDC: u8 = 0x02;
const CLASS_CDC_DATA: u8 = 0x0A;
const SUBCLASS_ACM: u8 = 0x02;
const PROTOCOL_AT_COMMANDS: u8 = 0x01;

const CDC_SUBTYPE_HEADER: u8 = 0x00;
const CDC_SUBTYPE_ACM: u8 = 0x02;
const CDC_SUBTYPE_UNION: u8 = 0x06;

/// ACM capabilities: line coding/serial state and send-break requests.
const ACM_CAPABILITIES: u8 = 0x06;

/// Device descriptor fields of the bridge personality.
pub const DEVICE: DeviceDescriptor = DeviceDescriptor {
    usb_version: 0x0110,
    class: CLASS_CDC,
    sub_class: 0x00,
    protocol: 0x00,
    max_packet_size_0: CONTROL_PACKET_SIZE,
    vendor_id: VENDOR_ID,
    product_id: PRODUCT_ID,
    release: 0x0109,
    manufacturer_index: crate::STRING_INDEX_MANUFACTURER,
    product_index: crate::STRING_INDEX_PRODUCT,
    serial_index: 0,
    num_configurations: 1,
};

static DEVICE_BYTES: [u8; DeviceDescriptor::SIZE] = DEVICE.to_bytes();
static MANUFACTURER: [u8; 18] = string_descriptor(MANUFACTURER_NAME);
static PRODUCT: [u8; 34] = string_descriptor(PRODUCT_NAME);

/// Size of the bridge configuration block.
pub const CONFIGURATION_SIZE: usize = 62;

/// The bridge configuration block.
pub const CONFIGURATION: [u8; CONFIGURATION_SIZE] =
    ConfigurationBuilder::new(1, ATTRIBUTE_SELF_POWERED, 100)
        // Communications interface
        .interface(0, 1, CLASS_CDC, SUBCLASS_ACM, PROTOCOL_AT_COMMANDS)
        .class_interface(&[CDC_SUBTYPE_HEADER, 0x10, 0x01])
        .class_interface(&[CDC_SUBTYPE_ACM, ACM_CAPABILITIES])
        .class_interface(&[CDC_SUBTYPE_UNION, 0, 1])
        .endpoint(NOTIFICATION_ENDPOINT, ENDPOINT_INTERRUPT, NOTIFICATION_PACKET_SIZE, 0xFF)
        // Data interface
        .interface(1, 2, CLASS_CDC_DATA, 0, 0)
        .endpoint(DATA_OUT_ENDPOINT, ENDPOINT_BULK, DATA_PACKET_SIZE, 0x05)
        .endpoint(DATA_IN_ENDPOINT, ENDPOINT_BULK, DATA_PACKET_SIZE, 0x05)
        .finish();

/// Descriptor lookup for bridge mode.
///
/// The configuration block is copied into RAM at construction; its
/// content never changes afterwards.
#[derive(Debug, Clone)]
pub struct BridgeCatalog {
    configuration: [u8; CONFIGURATION_SIZE],
}

impl BridgeCatalog {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configuration: CONFIGURATION,
        }
    }
}

impl Default for BridgeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorCatalog for BridgeCatalog {
    fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>> {
        match kind {
            DescriptorType::Device => Some(Descriptor::flash(&DEVICE_BYTES)),
            DescriptorType::Configuration => Some(Descriptor::ram(&self.configuration)),
            DescriptorType::String => match index {
                crate::STRING_INDEX_LANGUAGE => Some(Descriptor::flash(&LANGUAGE_TABLE)),
                crate::STRING_INDEX_MANUFACTURER => Some(Descriptor::flash(&MANUFACTURER)),
                crate::STRING_INDEX_PRODUCT => Some(Descriptor::flash(&PRODUCT)),
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

    #[test]
    fn test_device_descriptor() {
        let mut catalog = BridgeCatalog::new();
        let desc = catalog.describe(DescriptorType::Device, 0).unwrap();
        assert_eq!(desc.space(), MemorySpace::Flash);
        assert_eq!(
            desc.as_bytes(),
            &[18, 1, 0x10, 0x01, 0x02, 0, 0, 64, 0xD0, 0x16, 0xA4, 0x0B, 0x09, 0x01, 1, 2, 0, 1]
        );
    }

    #[test]
    fn test_configuration_block() {
        let mut catalog = BridgeCatalog::new();
        let desc = catalog.describe(DescriptorType::Configuration, 0).unwrap();
        let bytes = desc.as_bytes();

        assert_eq!(desc.space(), MemorySpace::Ram);
        assert_eq!(total_length(bytes), Some(bytes.len() as u16));
        assert_eq!(&bytes[..9], &[9, 2, 62, 0, 2, 1, 0, 0xC0, 50]);
        // Communications interface and functional descriptors
        assert_eq!(&bytes[9..18], &[9, 4, 0, 0, 1, 0x02, 0x02, 0x01, 0]);
        assert_eq!(&bytes[18..23], &[5, 0x24, 0x00, 0x10, 0x01]);
        assert_eq!(&bytes[23..27], &[4, 0x24, 0x02, 0x06]);
        assert_eq!(&bytes[27..32], &[5, 0x24, 0x06, 0, 1]);
        assert_eq!(&bytes[32..39], &[7, 5, 0x82, 0x03, 8, 0, 0xFF]);
        // Data interface
        assert_eq!(&bytes[39..48], &[9, 4, 1, 0, 2, 0x0A, 0, 0, 0]);
        assert_eq!(&bytes[48..55], &[7, 5, 0x04, 0x02, 64, 0, 5]);
        assert_eq!(&bytes[55..62], &[7, 5, 0x83, 0x02, 64, 0, 5]);
    }

    #[test]
    fn test_strings() {
        let mut catalog = BridgeCatalog::new();

        let lang = catalog.describe(DescriptorType::String, 0).unwrap();
        assert_eq!(lang.as_bytes(), &[4, 3, 0x09, 0x04]);

        let manufacturer = catalog.describe(DescriptorType::String, 1).unwrap();
        assert_eq!(manufacturer.len(), 18);
        assert_eq!(&manufacturer.as_bytes()[..6], &[18, 3, b'e', 0, b'H', 0]);

        let product = catalog.describe(DescriptorType::String, 2).unwrap();
        assert_eq!(product.len(), 34);
        assert_eq!(product.as_bytes()[0], 34);
    }

    #[test]
    fn test_unknown_lookups() {
        let mut catalog = BridgeCatalog::new();
        // No serial number in bridge mode
        assert!(catalog.describe(DescriptorType::String, 3).is_none());
        assert!(catalog.describe(DescriptorType::String, 0xEE).is_none());
        assert!(catalog.describe(DescriptorType::DeviceQualifier, 0).is_none());
        assert!(catalog.get_descriptor(0x0F00, 0).is_none());
        assert!(catalog.get_descriptor(0x0000, 0).is_none());
    }

    #[test]
    fn test_raw_request_ignores_language() {
        let mut catalog = BridgeCatalog::new();
        let mut a = [0u8; 34];
        a.copy_from_slice(catalog.get_descriptor(0x0302, 0x0409).unwrap().as_bytes());
        let b = catalog.get_descriptor(0x0302, 0x0000).unwrap();
        assert_eq!(b.as_bytes(), &a[..]);
    }
}
