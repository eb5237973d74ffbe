//! Boot-time operating mode selection from a strap pin.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use portable_atomic::{AtomicU8, Ordering};

/// Which USB personality the adapter presents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// CDC-ACM virtual serial port bridged to the UART.
    Bridge,
    /// AVRISP mkII compatible bulk-endpoint programmer.
    Programmer,
}

/// Strap level that selects bridge mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StrapPolarity {
    /// Strap left open (pulled up) selects the bridge.
    #[default]
    HighSelectsBridge,
    /// Strap pulled low selects the bridge.
    LowSelectsBridge,
}

impl StrapPolarity {
    #[inline]
    #[must_use]
    pub const fn mode_for(self, level_high: bool) -> OperatingMode {
        match (self, level_high) {
            (Self::HighSelectsBridge, true) | (Self::LowSelectsBridge, false) => OperatingMode::Bridge,
            _ => OperatingMode::Programmer,
        }
    }
}

/// Time allowed for the pull-up to charge the strap line before sampling.
pub const STRAP_SETTLE_NS: u32 = 1_000;

/// Sample the strap pin once and map the level to a mode.
///
/// The pin must already be configured as an input with its pull-up
/// enabled. A read error counts as the pulled-up level.
pub fn sample_strap<P, D>(pin: &mut P, delay: &mut D, polarity: StrapPolarity) -> OperatingMode
where
    P: InputPin,
    D: DelayNs,
{
    delay.delay_ns(STRAP_SETTLE_NS);
    let high = pin.is_high().unwrap_or_else(|_| {
        warn!("strap pin read failed, assuming pull-up level");
        true
    });
    let mode = polarity.mode_for(high);
    debug!("strap level high={}, mode={}", high, mode);
    mode
}

const UNSET: u8 = 0;
const BRIDGE: u8 = 1;
const PROGRAMMER: u8 = 2;

/// Holds the mode decided at boot.
///
/// The strap is sampled on the first [`select`](Self::select) only; later
/// calls return the stored decision without touching the pin, so the mode
/// cannot change for the rest of the power cycle.
pub struct ModeLatch {
    state: AtomicU8,
}

impl ModeLatch {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(UNSET),
        }
    }

    /// Decide the mode, sampling the strap if no decision exists yet.
    pub fn select<P, D>(&self, pin: &mut P, delay: &mut D, polarity: StrapPolarity) -> OperatingMode
    where
        P: InputPin,
        D: DelayNs,
    {
        if let Some(mode) = self.get() {
            return mode;
        }
        let mode = sample_strap(pin, delay, polarity);
        self.state.store(
            match mode {
                OperatingMode::Bridge => BRIDGE,
                OperatingMode::Programmer => PROGRAMMER,
            },
            Ordering::Release,
        );
        info!("operating mode: {}", mode);
        mode
    }

    /// The stored decision, if the strap has been sampled.
    #[must_use]
    pub fn get(&self) -> Option<OperatingMode> {
        match self.state.load(Ordering::Acquire) {
            BRIDGE => Some(OperatingMode::Bridge),
            PROGRAMMER => Some(OperatingMode::Programmer),
            _ => None,
        }
    }
}

impl Default for ModeLatch {
    fn default() -> Self {
        Self::new()
    }
}
