//! Board LEDs as an activity indicator.

use embassy_rp::gpio::Output;
use usb2serial_core::ActivityIndicator;

/// RX/TX traffic LEDs plus the status LED.
///
/// The status LED shows the USB link state and, in programmer mode, is
/// inverted while a command is being processed.
pub struct Leds<'d> {
    rx: Output<'d>,
    tx: Output<'d>,
    status: Output<'d>,
    link: bool,
}

impl<'d> Leds<'d> {
    pub fn new(rx: Output<'d>, tx: Output<'d>, status: Output<'d>) -> Self {
        Self {
            rx,
            tx,
            status,
            link: false,
        }
    }
}

fn drive(pin: &mut Output<'_>, on: bool) {
    if on {
        pin.set_high();
    } else {
        pin.set_low();
    }
}

impl ActivityIndicator for Leds<'_> {
    fn set_rx(&mut self, on: bool) {
        drive(&mut self.rx, on);
    }

    fn set_tx(&mut self, on: bool) {
        drive(&mut self.tx, on);
    }

    fn set_busy(&mut self, on: bool) {
        // Busy inverts the link state, so it shows while configured
        drive(&mut self.status, on != self.link);
    }

    fn set_link(&mut self, up: bool) {
        self.link = up;
        drive(&mut self.status, up);
    }
}
