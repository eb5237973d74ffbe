//! CDC-ACM serial channel on top of embassy-usb.
//!
//! The bridge loop is poll-driven, so every endpoint operation here is
//! polled exactly once and never awaited: a read that has no packet yet
//! yields nothing, a write that finds the IN buffer busy is retried on the
//! next pass.

use core::task::Poll;

use embassy_futures::poll_once;
use embassy_usb::class::cdc_acm::{
    CdcAcmClass, ControlChanged, LineCoding, ParityType, Receiver, Sender, StopBits as CdcStopBits,
};
use heapless::{Deque, Vec};
use usb2serial_core::{
    ControlEvent, ControlTracker, LineEncoding, LinkError, Parity, SerialChannel, StopBits,
};

use crate::config::CDC_PACKET_SIZE;
use crate::UsbDriver;

const PACKET_SIZE: usize = CDC_PACKET_SIZE as usize;

/// Bridge-mode USB serial channel.
pub struct CdcSerial<'d> {
    sender: Sender<'d, UsbDriver<'d>>,
    receiver: Receiver<'d, UsbDriver<'d>>,
    control: ControlChanged<'d>,
    tracker: ControlTracker,
    events: Deque<ControlEvent, 2>,
    rx: [u8; PACKET_SIZE],
    rx_len: usize,
    rx_pos: usize,
    tx: Vec<u8, PACKET_SIZE>,
}

impl<'d> CdcSerial<'d> {
    /// `initial` must match what the UART was programmed with, so the
    /// first SET_LINE_CODING is only reported if it differs.
    pub fn new(class: CdcAcmClass<'d, UsbDriver<'d>>, initial: LineEncoding) -> Self {
        let (sender, receiver, control) = class.split_with_control();
        Self {
            sender,
            receiver,
            control,
            tracker: ControlTracker::new(initial),
            events: Deque::new(),
            rx: [0; PACKET_SIZE],
            rx_len: 0,
            rx_pos: 0,
            tx: Vec::new(),
        }
    }

    fn poll_control(&mut self) {
        if poll_once(self.control.control_changed()).is_pending() {
            return;
        }
        let encoding = line_encoding(&self.sender.line_coding());
        let dtr = self.sender.dtr();
        for event in self.tracker.observe(encoding, dtr) {
            if self.events.push_back(event).is_err() {
                defmt::warn!("cdc: control event dropped: {}", event);
            }
        }
    }

    fn flush(&mut self) {
        if self.tx.is_empty() {
            return;
        }
        match poll_once(self.sender.write_packet(&self.tx)) {
            Poll::Ready(Ok(())) => self.tx.clear(),
            Poll::Ready(Err(e)) => {
                // Endpoint disabled: the host went away, the data has nowhere to go
                defmt::debug!("cdc: IN packet dropped: {}", e);
                self.tx.clear();
            }
            Poll::Pending => {}
        }
    }
}

impl SerialChannel for CdcSerial<'_> {
    fn max_packet_size(&self) -> usize {
        PACKET_SIZE
    }

    fn read_byte(&mut self) -> Option<u8> {
        if self.rx_pos >= self.rx_len {
            match poll_once(self.receiver.read_packet(&mut self.rx)) {
                Poll::Ready(Ok(n)) => {
                    self.rx_len = n;
                    self.rx_pos = 0;
                }
                Poll::Ready(Err(_)) | Poll::Pending => return None,
            }
            if self.rx_len == 0 {
                return None;
            }
        }
        let byte = self.rx[self.rx_pos];
        self.rx_pos += 1;
        Some(byte)
    }

    fn is_in_ready(&mut self) -> bool {
        self.tx.is_empty()
    }

    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.tx.push(byte).map_err(|_| LinkError::Busy)
    }

    fn poll_event(&mut self) -> Option<ControlEvent> {
        if self.events.is_empty() {
            self.poll_control();
        }
        self.events.pop_front()
    }

    fn housekeeping(&mut self) {
        self.flush();
    }

    fn reset(&mut self) {
        self.tx.clear();
        self.rx_len = 0;
        self.rx_pos = 0;
    }
}

/// Translate the CDC class's line coding into the core type.
pub fn line_encoding(coding: &LineCoding) -> LineEncoding {
    LineEncoding {
        baud_rate: coding.data_rate(),
        parity: match coding.parity_type() {
            ParityType::None => Parity::None,
            ParityType::Odd => Parity::Odd,
            ParityType::Even => Parity::Even,
            ParityType::Mark => Parity::Mark,
            ParityType::Space => Parity::Space,
        },
        stop_bits: match coding.stop_bits() {
            CdcStopBits::One => StopBits::One,
            CdcStopBits::OnePointFive => StopBits::OnePointFive,
            CdcStopBits::Two => StopBits::Two,
        },
        data_bits: coding.data_bits(),
    }
}
