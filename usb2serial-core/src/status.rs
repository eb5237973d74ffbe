//! Activity indication (LEDs) and the idle timer that turns it off.

/// Sink for activity indication. All methods default to doing nothing so
/// boards can wire up only the indicators they have.
pub trait ActivityIndicator {
    /// Host-to-UART traffic seen.
    fn set_rx(&mut self, _on: bool) {}

    /// UART-to-host traffic pending.
    fn set_tx(&mut self, _on: bool) {}

    /// Programmer command in progress.
    fn set_busy(&mut self, _on: bool) {}

    /// USB configuration state.
    fn set_link(&mut self, _up: bool) {}
}

/// Indicator that shows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndicator;

impl ActivityIndicator for NoIndicator {}

impl<T: ActivityIndicator + ?Sized> ActivityIndicator for &mut T {
    fn set_rx(&mut self, on: bool) {
        (**self).set_rx(on);
    }

    fn set_tx(&mut self, on: bool) {
        (**self).set_tx(on);
    }

    fn set_busy(&mut self, on: bool) {
        (**self).set_busy(on);
    }

    fn set_link(&mut self, up: bool) {
        (**self).set_link(up);
    }
}

/// Main loop iterations without traffic before activity indication is
/// switched off.
pub const IDLE_TICKS: u16 = 1000;

/// Counts loop iterations since the last traffic.
#[derive(Debug, Clone, Copy)]
pub struct IdleTimer {
    ticks: u16,
    period: u16,
}

impl IdleTimer {
    #[must_use]
    pub const fn new(period: u16) -> Self {
        Self { ticks: 0, period }
    }

    /// Traffic seen: restart the count.
    #[inline]
    pub fn reset(&mut self) {
        self.ticks = 0;
    }

    /// Count one iteration. Returns `true` exactly once per idle period,
    /// when the count reaches the period.
    pub fn tick(&mut self) -> bool {
        if self.ticks < self.period {
            self.ticks += 1;
            self.ticks == self.period
        } else {
            false
        }
    }
}

impl Default for IdleTimer {
    fn default() -> Self {
        Self::new(IDLE_TICKS)
    }
}
