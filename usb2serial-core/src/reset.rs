//! Target reset line driven from the host's DTR control line.

use embedded_hal::digital::OutputPin;

/// Drives the target's reset input from DTR.
///
/// Opening the port asserts DTR, which pulls the line low; closing it
/// releases the line high. Serial terminals and bootloader uploaders use
/// this to reset the attached board.
pub struct ResetLine<P> {
    pin: P,
}

impl<P: OutputPin> ResetLine<P> {
    /// Take the pin and drive it high (target running).
    pub fn new(mut pin: P) -> Self {
        if pin.set_high().is_err() {
            warn!("reset line: failed to drive high");
        }
        Self { pin }
    }

    /// Follow a new DTR state.
    pub fn apply_dtr(&mut self, dtr: bool) {
        let result = if dtr { self.pin.set_low() } else { self.pin.set_high() };
        if result.is_err() {
            warn!("reset line: pin write failed (dtr={})", dtr);
        }
    }

    pub fn into_inner(self) -> P {
        self.pin
    }
}
