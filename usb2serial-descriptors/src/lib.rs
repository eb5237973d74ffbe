//! USB descriptor tables for the two personalities of the adapter.
//!
//! The adapter enumerates either as a CDC-ACM virtual serial port
//! ("bridge" mode) or as an Atmel AVRISP mkII compatible vendor-class
//! programmer ("programmer" mode). This crate holds the byte-exact
//! descriptor sets for both and answers GET_DESCRIPTOR lookups.
//!
//! # Overview
//!
//! - [`types`]: Descriptor type codes, memory-space tags and the [`Descriptor`] view
//! - [`device`]: The 18-byte device descriptor ([`DeviceDescriptor`])
//! - [`configuration`]: Compile-time configuration block assembly ([`ConfigurationBuilder`])
//! - [`string`]: UTF-16LE string descriptor helpers
//! - [`bridge`]: CDC-ACM descriptor set ([`BridgeCatalog`])
//! - [`programmer`]: AVRISP mkII descriptor set ([`ProgrammerCatalog`])
//!
//! # Example
//!
//! ```rust
//! use usb2serial_descriptors::{BridgeCatalog, DescriptorCatalog, DescriptorType};
//!
//! let mut catalog = BridgeCatalog::new();
//! let device = catalog.describe(DescriptorType::Device, 0).unwrap();
//! assert_eq!(device.len(), 18);
//!
//! // wValue = (type << 8) | index, wIndex (language) is ignored
//! let product = catalog.get_descriptor(0x0302, 0x0409).unwrap();
//! assert_eq!(product.as_bytes()[0] as usize, product.len());
//!
//! assert!(catalog.describe(DescriptorType::String, 7).is_none());
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod bridge;
pub mod configuration;
pub mod device;
pub mod programmer;
pub mod string;
pub mod types;

pub use bridge::BridgeCatalog;
pub use configuration::ConfigurationBuilder;
pub use device::DeviceDescriptor;
pub use programmer::{ProgrammerCatalog, ProgrammerEndpoints};
pub use string::{decode_ascii, string_descriptor, LANGUAGE_ID_ENGLISH_US, LANGUAGE_TABLE};
pub use types::{Descriptor, DescriptorType, MemorySpace};

/// String descriptor index of the language table.
pub const STRING_INDEX_LANGUAGE: u8 = 0;
/// String descriptor index of the manufacturer name.
pub const STRING_INDEX_MANUFACTURER: u8 = 1;
/// String descriptor index of the product name.
pub const STRING_INDEX_PRODUCT: u8 = 2;
/// String descriptor index of the serial number (programmer mode only).
pub const STRING_INDEX_SERIAL: u8 = 3;

/// Manufacturer name reported in both modes.
pub const MANUFACTURER_NAME: &str = "eHaJo.de";

/// Answers GET_DESCRIPTOR lookups for one operating mode.
///
/// Lookups take `&mut self` because some descriptors are refreshed on
/// every read (see [`ProgrammerCatalog`]).
pub trait DescriptorCatalog {
    /// Return the descriptor of `kind` at `index`, or `None` if the mode
    /// does not provide it.
    ///
    /// Device and configuration lookups ignore `index`, as there is
    /// exactly one of each.
    fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>>;

    /// Resolve a raw GET_DESCRIPTOR request.
    ///
    /// The high byte of `value` carries the descriptor type and the low
    /// byte the index. The language ID in `_language` is not examined.
    fn get_descriptor(&mut self, value: u16, _language: u16) -> Option<Descriptor<'_>> {
        let kind = DescriptorType::from_u8((value >> 8) as u8)?;
        self.describe(kind, (value & 0xFF) as u8)
    }
}
