//! The active personality, chosen once at boot.

use usb2serial_descriptors::{Descriptor, DescriptorType};

use crate::mode::OperatingMode;

/// Uniform interface of a personality's runtime.
pub trait ModeRunner {
    /// One non-blocking pass of the main loop.
    fn tick(&mut self);

    /// Descriptor lookup for this personality.
    fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>>;

    /// USB configuration state changed.
    fn set_configured(&mut self, configured: bool);
}

/// The running personality.
///
/// Built once from the boot-time [`OperatingMode`]; every later call
/// dispatches on the variant instead of re-checking the mode.
pub enum Session<B, P> {
    Bridge(B),
    Programmer(P),
}

impl<B: ModeRunner, P: ModeRunner> Session<B, P> {
    #[must_use]
    pub fn mode(&self) -> OperatingMode {
        match self {
            Self::Bridge(_) => OperatingMode::Bridge,
            Self::Programmer(_) => OperatingMode::Programmer,
        }
    }

    pub fn tick(&mut self) {
        match self {
            Self::Bridge(bridge) => bridge.tick(),
            Self::Programmer(programmer) => programmer.tick(),
        }
    }

    pub fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>> {
        match self {
            Self::Bridge(bridge) => bridge.describe(kind, index),
            Self::Programmer(programmer) => programmer.describe(kind, index),
        }
    }

    /// Resolve a raw GET_DESCRIPTOR request (`wValue`, `wIndex`).
    pub fn get_descriptor(&mut self, value: u16, _language: u16) -> Option<Descriptor<'_>> {
        let kind = DescriptorType::from_u8((value >> 8) as u8)?;
        self.describe(kind, (value & 0xFF) as u8)
    }

    pub fn set_configured(&mut self, configured: bool) {
        match self {
            Self::Bridge(bridge) => bridge.set_configured(configured),
            Self::Programmer(programmer) => programmer.set_configured(configured),
        }
    }
}
