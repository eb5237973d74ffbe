//! USB-to-serial adapter firmware for RP2040.
//!
//! At power-up a strap pin selects one of two USB personalities, fixed
//! until the next reset:
//!
//! - **Bridge**: a CDC-ACM virtual serial port whose data is forwarded to
//!   and from UART0. Line coding requests reprogram the UART, DTR drives
//!   the target reset line.
//! - **Programmer**: an AVRISP mkII compatible vendor-class device with a
//!   bulk endpoint pair. Requests are handed to a
//!   [`CommandProcessor`](usb2serial_core::CommandProcessor).
//!
//! # Hardware Configuration
//!
//! | Function     | GPIO | Description |
//! |--------------|------|-------------|
//! | UART0 TX     | 0    | Serial transmit to target |
//! | UART0 RX     | 1    | Serial receive from target |
//! | Mode strap   | 2    | Pulled up; level selects the personality |
//! | Target reset | 3    | Driven low while DTR is asserted |
//! | RX LED       | 14   | Host-to-target traffic |
//! | TX LED       | 15   | Target-to-host traffic |
//! | Status LED   | 25   | USB configured / programmer busy |
//!
//! # Architecture
//!
//! Two Embassy tasks:
//!
//! - **USB Task**: Runs the embassy-usb device stack (enumeration, control requests)
//! - **Session Task**: Polls the active personality ([`AppSession`]) and yields
//!
//! In bridge mode the UART0 receive interrupt feeds the UART-to-host queue
//! directly (see [`uart`]).
//!
//! # Modules
//!
//! - [`config`]: Pins, buffer sizes, defaults
//! - [`uart`]: PL011 register access and the receive interrupt ([`Pl011`](uart::Pl011))
//! - [`usb_cdc`]: CDC-ACM serial channel ([`CdcSerial`](usb_cdc::CdcSerial))
//! - [`usb_programmer`]: Programmer bulk endpoints ([`BulkPort`](usb_programmer::BulkPort))
//! - [`usb_setup`]: embassy-usb configuration from the descriptor tables
//! - [`leds`]: Activity LEDs ([`Leds`](leds::Leds))
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent reset)
//! - **`strap-low-selects-bridge`**: Strap pulled low selects bridge mode instead of programmer mode
//! - **`libusb-compat`**: Programmer IN endpoint 3 instead of 2

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features");

pub mod config;
pub mod leds;
pub mod uart;
pub mod usb_cdc;
pub mod usb_programmer;
pub mod usb_setup;

pub use usb2serial_descriptors as descriptors;

use embassy_rp::gpio::Output;
use embassy_rp::peripherals::USB;
use usb2serial_core::{BridgeEngine, ProgrammerDispatch, Session, UnknownCommandResponder};

use crate::config::UART_QUEUE_SIZE;
use crate::leds::Leds;
use crate::uart::Pl011;
use crate::usb_cdc::CdcSerial;
use crate::usb_programmer::BulkPort;

/// The RP2040 USB driver.
pub type UsbDriver<'d> = embassy_rp::usb::Driver<'d, USB>;

/// Bridge personality as wired on this board.
pub type BridgeMode = BridgeEngine<
    'static,
    CdcSerial<'static>,
    Pl011<'static>,
    Output<'static>,
    Leds<'static>,
    UART_QUEUE_SIZE,
>;

/// Programmer personality as wired on this board.
pub type ProgrammerMode = ProgrammerDispatch<BulkPort<'static>, UnknownCommandResponder, Leds<'static>>;

/// Whichever personality the strap selected.
pub type AppSession = Session<BridgeMode, ProgrammerMode>;
