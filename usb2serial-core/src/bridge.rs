//! Bridge engine: moves bytes between the USB serial channel and the UART.
//!
//! Each [`tick`](BridgeEngine::tick) performs one non-blocking pass:
//!
//! 1. Apply pending control events (line encoding, DTR).
//! 2. Host to UART: if the queue has room, read one byte from USB.
//! 3. UART to host: if bytes are queued and the IN endpoint is free, send
//!    up to one packet less one byte, removing each byte only after the
//!    channel accepted it.
//! 4. Hand one queued byte to the UART if it can take it.
//! 5. USB housekeeping, then the idle timer for the activity indicators.
//!
//! The UART-to-host queue is filled by the receive interrupt through
//! [`accept_rx_byte`](crate::accept_rx_byte).

use usb2serial_descriptors::{BridgeCatalog, Descriptor, DescriptorCatalog, DescriptorType};

use crate::control::ControlEvent;
use crate::line::SerialLineController;
use crate::link::SerialChannel;
use crate::queue::{Consumer, Producer};
use crate::reset::ResetLine;
use crate::session::ModeRunner;
use crate::status::{ActivityIndicator, IdleTimer};
use crate::uart::{UartConfig, UartTransmit};
use embedded_hal::digital::OutputPin;

/// The queue ends the bridge engine owns.
pub struct BridgeQueues<'q, const N: usize> {
    /// Host-to-UART queue, both ends (filled and drained by the main loop).
    pub to_uart: (Producer<'q, N>, Consumer<'q, N>),
    /// UART-to-host queue, consumer end (the producer lives in the ISR).
    pub to_host: Consumer<'q, N>,
}

/// Byte-streaming engine for bridge mode.
pub struct BridgeEngine<'q, S, U, R, I, const N: usize> {
    serial: S,
    line: SerialLineController<U>,
    reset: ResetLine<R>,
    indicator: I,
    to_uart_in: Producer<'q, N>,
    to_uart_out: Consumer<'q, N>,
    to_host: Consumer<'q, N>,
    idle: IdleTimer,
    catalog: BridgeCatalog,
}

impl<'q, S, U, R, I, const N: usize> BridgeEngine<'q, S, U, R, I, N>
where
    S: SerialChannel,
    U: UartConfig + UartTransmit,
    R: OutputPin,
    I: ActivityIndicator,
{
    pub fn new(
        serial: S,
        line: SerialLineController<U>,
        reset: ResetLine<R>,
        indicator: I,
        queues: BridgeQueues<'q, N>,
    ) -> Self {
        let BridgeQueues {
            to_uart: (to_uart_in, to_uart_out),
            to_host,
        } = queues;
        Self {
            serial,
            line,
            reset,
            indicator,
            to_uart_in,
            to_uart_out,
            to_host,
            idle: IdleTimer::default(),
            catalog: BridgeCatalog::new(),
        }
    }

    /// Run one pass of the bridge loop.
    pub fn tick(&mut self) {
        while let Some(event) = self.serial.poll_event() {
            self.handle_event(event);
        }

        self.receive_from_host();
        self.send_to_host();
        self.send_to_uart();
        self.serial.housekeeping();

        if self.idle.tick() {
            self.indicator.set_rx(false);
            self.indicator.set_tx(false);
        }
    }

    /// Apply one control event.
    pub fn handle_event(&mut self, event: ControlEvent) {
        match event {
            ControlEvent::LineEncodingChanged(encoding) => self.line.apply(encoding),
            ControlEvent::ControlLineStateChanged { dtr } => {
                debug!("dtr={}", dtr);
                self.reset.apply_dtr(dtr);
            }
        }
    }

    /// USB configuration changed.
    ///
    /// Both queues and the channel's buffers are emptied when the host
    /// configures the device, so no stale bytes from a previous session
    /// reach either side.
    pub fn set_configured(&mut self, configured: bool) {
        if configured {
            self.to_uart_out.clear();
            self.to_host.clear();
            self.serial.reset();
        }
        self.indicator.set_link(configured);
        info!("usb configured={}", configured);
    }

    /// Step 2: at most one byte from the host per pass.
    fn receive_from_host(&mut self) {
        if self.to_uart_in.is_full() {
            return;
        }
        if let Some(byte) = self.serial.read_byte() {
            self.indicator.set_rx(true);
            self.idle.reset();
            if self.to_uart_in.insert(byte).is_err() {
                warn!("host-to-uart queue full, byte dropped");
            }
        }
    }

    /// Step 3. Returns the number of bytes handed to the channel.
    fn send_to_host(&mut self) -> usize {
        let pending = self.to_host.count();
        if pending == 0 {
            return 0;
        }
        self.indicator.set_tx(true);
        self.idle.reset();

        if !self.serial.is_in_ready() {
            return 0;
        }

        // One byte short of a full packet, so no zero-length packet is needed
        let budget = pending.min(self.serial.max_packet_size().saturating_sub(1));
        let mut sent = 0;
        while sent < budget {
            let Some(byte) = self.to_host.peek() else {
                break;
            };
            if let Err(e) = self.serial.send_byte(byte) {
                trace!("send to host stopped: {}", e);
                break;
            }
            self.to_host.remove();
            sent += 1;
        }
        sent
    }

    /// Step 4: at most one byte to the UART per pass.
    fn send_to_uart(&mut self) {
        if self.to_uart_out.is_empty() {
            return;
        }
        let uart = self.line.uart_mut();
        if !uart.is_send_ready() {
            return;
        }
        if let Some(byte) = self.to_uart_out.remove() {
            uart.send_byte(byte);
        }
    }

    pub fn serial(&self) -> &S {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut S {
        &mut self.serial
    }

    pub fn line(&self) -> &SerialLineController<U> {
        &self.line
    }

    pub fn line_mut(&mut self) -> &mut SerialLineController<U> {
        &mut self.line
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Bytes waiting for the UART.
    pub fn pending_to_uart(&self) -> usize {
        self.to_uart_out.count()
    }

    /// Bytes waiting for the host.
    pub fn pending_to_host(&self) -> usize {
        self.to_host.count()
    }

    pub fn into_parts(self) -> (S, SerialLineController<U>, ResetLine<R>, I) {
        (self.serial, self.line, self.reset, self.indicator)
    }
}

impl<S, U, R, I, const N: usize> ModeRunner for BridgeEngine<'_, S, U, R, I, N>
where
    S: SerialChannel,
    U: UartConfig + UartTransmit,
    R: OutputPin,
    I: ActivityIndicator,
{
    fn tick(&mut self) {
        BridgeEngine::tick(self);
    }

    fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>> {
        self.catalog.describe(kind, index)
    }

    fn set_configured(&mut self, configured: bool) {
        BridgeEngine::set_configured(self, configured);
    }
}
