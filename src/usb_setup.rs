//! embassy-usb device setup from the personality's descriptor tables.
//!
//! embassy-usb assembles its own configuration descriptor from the
//! classes registered on the builder, so the tables are consulted here
//! for what the builder takes as configuration: device identity, strings
//! and power attributes.

use embassy_usb::{Config, Handler};
use portable_atomic::Ordering;
use usb2serial_descriptors::configuration::{is_self_powered, max_power_ma};
use usb2serial_descriptors::{
    decode_ascii, DescriptorCatalog, DescriptorType, DeviceDescriptor,
};

use crate::config::{CONTROL_PACKET_SIZE, MAX_STRING_LEN};
use crate::uart::USB_CONFIGURED;

/// Backing storage for the strings handed to embassy-usb.
pub struct UsbStrings {
    manufacturer: [u8; MAX_STRING_LEN],
    product: [u8; MAX_STRING_LEN],
    serial: [u8; MAX_STRING_LEN],
}

impl UsbStrings {
    pub const fn new() -> Self {
        Self {
            manufacturer: [0; MAX_STRING_LEN],
            product: [0; MAX_STRING_LEN],
            serial: [0; MAX_STRING_LEN],
        }
    }
}

impl Default for UsbStrings {
    fn default() -> Self {
        Self::new()
    }
}

fn string<C: DescriptorCatalog>(
    catalog: &mut C,
    index: u8,
    out: &'static mut [u8; MAX_STRING_LEN],
) -> Option<&'static str> {
    if index == 0 {
        return None;
    }
    let descriptor = catalog.describe(DescriptorType::String, index)?;
    let text = decode_ascii(descriptor.as_bytes(), out);
    if text.is_none() {
        defmt::warn!("usb: string {} not representable", index);
    }
    text
}

/// Build the embassy-usb device configuration for a personality.
pub fn device_config<C: DescriptorCatalog>(
    catalog: &mut C,
    strings: &'static mut UsbStrings,
) -> Config<'static> {
    let device = catalog
        .describe(DescriptorType::Device, 0)
        .and_then(|d| DeviceDescriptor::parse(d.as_bytes()));
    let Some(device) = device else {
        defmt::panic!("usb: personality has no device descriptor");
    };

    let mut config = Config::new(device.vendor_id, device.product_id);
    config.device_class = device.class;
    config.device_sub_class = device.sub_class;
    config.device_protocol = device.protocol;
    config.device_release = device.release;
    config.max_packet_size_0 = device.max_packet_size_0.min(CONTROL_PACKET_SIZE as u8);
    // Neither personality uses the IAD composite class triple
    config.composite_with_iads = false;

    if let Some(block) = catalog.describe(DescriptorType::Configuration, 0) {
        let block = block.as_bytes();
        config.self_powered = is_self_powered(block);
        config.max_power = max_power_ma(block);
    }

    let UsbStrings {
        manufacturer,
        product,
        serial,
    } = strings;
    config.manufacturer = string(catalog, device.manufacturer_index, manufacturer);
    config.product = string(catalog, device.product_index, product);
    // Index 0 (bridge mode) means no serial number
    config.serial_number = string(catalog, device.serial_index, serial);

    defmt::info!(
        "usb: {=u16:04x}:{=u16:04x} class {=u8:#x}",
        device.vendor_id,
        device.product_id,
        device.class
    );
    config
}

/// Publishes the configured state to [`USB_CONFIGURED`].
pub struct UsbStateHandler;

impl Handler for UsbStateHandler {
    fn reset(&mut self) {
        USB_CONFIGURED.store(false, Ordering::Relaxed);
    }

    fn configured(&mut self, configured: bool) {
        USB_CONFIGURED.store(configured, Ordering::Relaxed);
    }
}
