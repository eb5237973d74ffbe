//! PL011 UART access for the bridge.
//!
//! embassy-rp brings the UART up (clocks, pin muxing, reset); after that
//! this module drives the registers directly so the line can be
//! reconfigured while the receive interrupt is masked, and so the receive
//! interrupt can feed the lock-free queue without a driver in between.

use core::cell::RefCell;

use embassy_rp::interrupt;
use embassy_rp::pac;
use embassy_rp::uart::{Blocking, Uart};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use portable_atomic::{AtomicBool, Ordering};
use usb2serial_core::{accept_rx_byte, BaudDivisor, FrameControl, Producer, UartConfig, UartTransmit};

use crate::config::UART_QUEUE_SIZE;

/// Set while the host has the device configured. Read by the receive
/// interrupt to decide whether incoming bytes are kept.
pub static USB_CONFIGURED: AtomicBool = AtomicBool::new(false);

/// Producer end of the UART-to-host queue, owned by the receive interrupt.
static RX_PRODUCER: Mutex<CriticalSectionRawMutex, RefCell<Option<Producer<'static, UART_QUEUE_SIZE>>>> =
    Mutex::new(RefCell::new(None));

/// Hand the UART-to-host producer to the receive interrupt.
pub fn install_rx_producer(producer: Producer<'static, UART_QUEUE_SIZE>) {
    RX_PRODUCER.lock(|cell| {
        cell.replace(Some(producer));
    });
}

/// Unmask the UART0 interrupt in the NVIC.
pub fn enable_rx_interrupt() {
    use embassy_rp::interrupt::InterruptExt;

    embassy_rp::interrupt::UART0_IRQ.unpend();
    // SAFETY: the handler below only touches RX_PRODUCER (behind a
    // critical-section mutex) and UART0 receive registers.
    unsafe { embassy_rp::interrupt::UART0_IRQ.enable() };
}

#[interrupt]
fn UART0_IRQ() {
    let regs = pac::UART0;
    let link_up = USB_CONFIGURED.load(Ordering::Relaxed);

    RX_PRODUCER.lock(|cell| {
        let mut producer = cell.borrow_mut();
        // Drain the FIFO; each byte is dropped if the link is down or the queue full
        while !regs.uartfr().read().rxfe() {
            let byte = regs.uartdr().read().data();
            if let Some(producer) = producer.as_mut() {
                accept_rx_byte(producer, byte, link_up);
            }
        }
    });

    regs.uarticr().write(|w| {
        w.set_rxic(true);
        w.set_rtic(true);
    });
}

/// Register-level PL011 handle implementing the core UART traits.
pub struct Pl011<'d> {
    _uart: Uart<'d, Blocking>,
    regs: pac::uart::Uart,
    tx_gpio: usize,
    clock_hz: u32,
}

impl<'d> Pl011<'d> {
    /// Wrap an initialised UART0.
    ///
    /// `tx_gpio` is the GPIO number of the TX pin, `clock_hz` the UART
    /// reference clock (`clk_peri`).
    pub fn new(uart: Uart<'d, Blocking>, tx_gpio: usize, clock_hz: u32) -> Self {
        Self {
            _uart: uart,
            regs: pac::UART0,
            tx_gpio,
            clock_hz,
        }
    }
}

impl UartConfig for Pl011<'_> {
    fn hold_tx_idle(&mut self, hold: bool) {
        let over = if hold {
            pac::io::vals::Outover::HIGH
        } else {
            pac::io::vals::Outover::NORMAL
        };
        pac::IO_BANK0
            .gpio(self.tx_gpio)
            .ctrl()
            .modify(|w| w.set_outover(over));
    }

    fn disable(&mut self) {
        self.regs.uartimsc().write(|w| {
            w.set_rxim(false);
            w.set_rtim(false);
        });
        self.regs.uartcr().write(|w| {
            w.set_uarten(false);
            w.set_txe(false);
            w.set_rxe(false);
        });
    }

    fn set_baud_rate(&mut self, baud_rate: u32) {
        let divisor = BaudDivisor::pl011(self.clock_hz, baud_rate);
        self.regs
            .uartibrd()
            .write_value(pac::uart::regs::Uartibrd(u32::from(divisor.integer)));
        self.regs
            .uartfbrd()
            .write_value(pac::uart::regs::Uartfbrd(u32::from(divisor.fraction)));
    }

    fn set_frame(&mut self, frame: FrameControl) {
        // Writing LCR_H also latches the divisor registers
        self.regs.uartlcr_h().write(|w| {
            w.set_wlen(frame.size_code());
            w.set_pen(frame.parity_enabled());
            w.set_eps(frame.parity_enabled() && !frame.odd_parity());
            w.set_stp2(frame.two_stop_bits());
            w.set_fen(true);
        });
    }

    fn enable(&mut self) {
        // Drop anything received under the old framing
        while !self.regs.uartfr().read().rxfe() {
            let _ = self.regs.uartdr().read();
        }
        self.regs.uarticr().write(|w| {
            w.set_rxic(true);
            w.set_rtic(true);
            w.set_feic(true);
            w.set_peic(true);
            w.set_beic(true);
            w.set_oeic(true);
        });
        self.regs.uartcr().write(|w| {
            w.set_uarten(true);
            w.set_txe(true);
            w.set_rxe(true);
        });
        self.regs.uartimsc().write(|w| {
            w.set_rxim(true);
            w.set_rtim(true);
        });
    }
}

impl UartTransmit for Pl011<'_> {
    fn is_send_ready(&mut self) -> bool {
        !self.regs.uartfr().read().txff()
    }

    fn send_byte(&mut self, byte: u8) {
        self.regs.uartdr().write(|w| w.set_data(byte));
    }
}
