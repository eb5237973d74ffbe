//! Serial line encoding and its application to the UART.
//!
//! A host-requested [`LineEncoding`] is turned into a frame-control word
//! and a baud divisor, then written to the UART while its receiver and
//! receive interrupt are off, so the interrupt handler never observes a
//! half-configured peripheral.

use core::ops::{BitOr, BitOrAssign};

use crate::uart::UartConfig;

/// Parity setting requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

/// Stop bit setting requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    #[default]
    One,
    OnePointFive,
    Two,
}

/// Serial framing parameters (CDC `SET_LINE_CODING` payload).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineEncoding {
    pub baud_rate: u32,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub data_bits: u8,
}

impl LineEncoding {
    /// 9600 baud, 8 data bits, no parity, one stop bit.
    pub const DEFAULT: Self = Self::new(9600, Parity::None, StopBits::One, 8);

    #[must_use]
    pub const fn new(baud_rate: u32, parity: Parity, stop_bits: StopBits, data_bits: u8) -> Self {
        Self {
            baud_rate,
            parity,
            stop_bits,
            data_bits,
        }
    }
}

impl Default for LineEncoding {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// UART frame-control word.
///
/// Field layout follows the classic AVR `UCSRnC` register: parity mode in
/// bits 5:4, stop bit select in bit 3, character size in bits 2:1. Ports
/// for other UARTs translate it with the accessor methods.
///
/// ```
/// use usb2serial_core::{FrameControl, LineEncoding, Parity, StopBits};
///
/// let frame = FrameControl::from_encoding(&LineEncoding::new(9600, Parity::Odd, StopBits::Two, 7));
/// assert!(frame.contains(FrameControl::PARITY_ENABLE | FrameControl::PARITY_ODD));
/// assert!(frame.two_stop_bits());
/// assert_eq!(frame.data_bits(), 7);
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameControl(pub u8);

impl FrameControl {
    pub const PARITY_ENABLE: Self = Self(1 << 5);
    pub const PARITY_ODD: Self = Self(1 << 4);
    pub const TWO_STOP: Self = Self(1 << 3);
    pub const SIZE_HIGH: Self = Self(1 << 2);
    pub const SIZE_LOW: Self = Self(1 << 1);

    /// 5 data bits, no parity, one stop bit.
    pub const NONE: Self = Self(0);

    /// Derive the frame word from a line encoding.
    ///
    /// Unrecognised settings (mark/space parity, 1.5 stop bits, data widths
    /// other than 6, 7 or 8) contribute no bits, so they fall back to no
    /// parity, one stop bit and 5 data bits respectively.
    #[must_use]
    pub const fn from_encoding(encoding: &LineEncoding) -> Self {
        let mut bits = 0;
        bits |= match encoding.parity {
            Parity::Odd => Self::PARITY_ENABLE.0 | Self::PARITY_ODD.0,
            Parity::Even => Self::PARITY_ENABLE.0,
            Parity::None | Parity::Mark | Parity::Space => 0,
        };
        if matches!(encoding.stop_bits, StopBits::Two) {
            bits |= Self::TWO_STOP.0;
        }
        bits |= match encoding.data_bits {
            6 => Self::SIZE_LOW.0,
            7 => Self::SIZE_HIGH.0,
            8 => Self::SIZE_HIGH.0 | Self::SIZE_LOW.0,
            _ => 0,
        };
        Self(bits)
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn parity_enabled(self) -> bool {
        self.contains(Self::PARITY_ENABLE)
    }

    /// Odd parity; only meaningful when parity is enabled.
    #[inline]
    #[must_use]
    pub const fn odd_parity(self) -> bool {
        self.contains(Self::PARITY_ODD)
    }

    #[inline]
    #[must_use]
    pub const fn two_stop_bits(self) -> bool {
        self.contains(Self::TWO_STOP)
    }

    /// Character size code, 0 (5 bits) through 3 (8 bits).
    #[inline]
    #[must_use]
    pub const fn size_code(self) -> u8 {
        (self.0 & (Self::SIZE_HIGH.0 | Self::SIZE_LOW.0)) >> 1
    }

    #[inline]
    #[must_use]
    pub const fn data_bits(self) -> u8 {
        5 + self.size_code()
    }
}

impl BitOr for FrameControl {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FrameControl {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// PL011-style fractional baud rate divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudDivisor {
    /// Integer part, 1..=65535.
    pub integer: u16,
    /// Fractional part in 1/64 steps, 0..=63.
    pub fraction: u8,
}

impl BaudDivisor {
    /// Compute the divisor for `baud_rate` from a `clock_hz` reference.
    ///
    /// Out-of-range results are clamped to the slowest or fastest rate the
    /// divider supports. A baud rate of 0 yields the slowest rate.
    #[must_use]
    pub const fn pl011(clock_hz: u32, baud_rate: u32) -> Self {
        if baud_rate == 0 {
            return Self { integer: u16::MAX, fraction: 0 };
        }
        // Divisor in 1/128 steps, rounded to 1/64 below
        let div = (8 * clock_hz as u64) / baud_rate as u64;
        let mut integer = div >> 7;
        let mut fraction = ((div & 0x7F) + 1) / 2;
        if fraction == 64 {
            integer += 1;
            fraction = 0;
        }

        if integer == 0 {
            Self { integer: 1, fraction: 0 }
        } else if integer >= u16::MAX as u64 {
            Self { integer: u16::MAX, fraction: 0 }
        } else {
            Self {
                integer: integer as u16,
                fraction: fraction as u8,
            }
        }
    }

    /// The baud rate this divisor actually produces.
    #[must_use]
    pub const fn actual_baud(self, clock_hz: u32) -> u32 {
        let div64 = self.integer as u64 * 64 + self.fraction as u64;
        ((clock_hz as u64 * 4) / div64) as u32
    }
}

/// Owns the UART configuration path and the current line encoding.
pub struct SerialLineController<U> {
    uart: U,
    current: LineEncoding,
}

impl<U: UartConfig> SerialLineController<U> {
    /// Take ownership of the UART and program `initial` into it.
    pub fn new(uart: U, initial: LineEncoding) -> Self {
        let mut this = Self {
            uart,
            current: initial,
        };
        this.apply(initial);
        this
    }

    /// Reprogram the UART for `encoding`.
    ///
    /// Order: hold TX at the idle level, disable the transmitter, receiver
    /// and receive interrupt, program divisor and frame word, re-enable, then
    /// release TX. The receive interrupt stays masked for the whole window.
    pub fn apply(&mut self, encoding: LineEncoding) {
        let frame = FrameControl::from_encoding(&encoding);
        debug!(
            "line encoding: {} baud, frame {=u8:#x}",
            encoding.baud_rate,
            frame.raw()
        );

        self.uart.hold_tx_idle(true);
        self.uart.disable();
        self.uart.set_baud_rate(encoding.baud_rate);
        self.uart.set_frame(frame);
        self.uart.enable();
        self.uart.hold_tx_idle(false);

        self.current = encoding;
    }

    /// The encoding most recently applied.
    #[inline]
    #[must_use]
    pub fn current(&self) -> LineEncoding {
        self.current
    }

    pub fn uart(&self) -> &U {
        &self.uart
    }

    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }

    pub fn into_inner(self) -> U {
        self.uart
    }
}
