//! Descriptor type codes and the borrowed [`Descriptor`] view.

/// Standard and class-specific descriptor type codes used by the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DescriptorType {
    Device = 0x01,
    Configuration = 0x02,
    String = 0x03,
    Interface = 0x04,
    Endpoint = 0x05,
    DeviceQualifier = 0x06,
    OtherSpeedConfiguration = 0x07,
    InterfacePower = 0x08,
    /// Class-specific interface descriptor (CDC functional descriptors).
    ClassInterface = 0x24,
}

impl DescriptorType {
    /// Decode the type byte of a GET_DESCRIPTOR request.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::Device),
            0x02 => Some(Self::Configuration),
            0x03 => Some(Self::String),
            0x04 => Some(Self::Interface),
            0x05 => Some(Self::Endpoint),
            0x06 => Some(Self::DeviceQualifier),
            0x07 => Some(Self::OtherSpeedConfiguration),
            0x08 => Some(Self::InterfacePower),
            0x24 => Some(Self::ClassInterface),
            _ => None,
        }
    }
}

/// Where the bytes of a descriptor live.
///
/// Device and string descriptors are immutable program constants.
/// Configuration blocks and the programmer serial number are held in RAM.
/// The USB stack must read each descriptor from the space it is tagged
/// with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemorySpace {
    Flash,
    Ram,
}

/// A resolved descriptor: its bytes and the memory space they live in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor<'a> {
    data: &'a [u8],
    space: MemorySpace,
}

impl<'a> Descriptor<'a> {
    #[inline]
    #[must_use]
    pub const fn new(data: &'a [u8], space: MemorySpace) -> Self {
        Self { data, space }
    }

    /// Descriptor from program constants.
    #[inline]
    #[must_use]
    pub const fn flash(data: &'a [u8]) -> Self {
        Self::new(data, MemorySpace::Flash)
    }

    /// Descriptor from a RAM-resident table.
    #[inline]
    #[must_use]
    pub const fn ram(data: &'a [u8]) -> Self {
        Self::new(data, MemorySpace::Ram)
    }

    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Length in bytes. Always equal to the descriptor's own declared
    /// length (`bLength`, or `wTotalLength` for configuration blocks).
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub const fn space(&self) -> MemorySpace {
        self.space
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_type_decoding() {
        assert_eq!(DescriptorType::from_u8(1), Some(DescriptorType::Device));
        assert_eq!(DescriptorType::from_u8(2), Some(DescriptorType::Configuration));
        assert_eq!(DescriptorType::from_u8(3), Some(DescriptorType::String));
        assert_eq!(DescriptorType::from_u8(0x24), Some(DescriptorType::ClassInterface));
        assert_eq!(DescriptorType::from_u8(0x00), None);
        assert_eq!(DescriptorType::from_u8(0x21), None);
    }

    #[test]
    fn test_descriptor_view() {
        let bytes = [4u8, 3, 0x09, 0x04];
        let desc = Descriptor::flash(&bytes);
        assert_eq!(desc.len(), 4);
        assert!(!desc.is_empty());
        assert_eq!(desc.space(), MemorySpace::Flash);
        assert_eq!(Descriptor::ram(&bytes).space(), MemorySpace::Ram);
    }
}
