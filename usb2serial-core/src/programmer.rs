//! Programmer dispatch: bulk packets to and from a command processor.
//!
//! OUT packets are assembled into one request, handed to the
//! [`CommandProcessor`] synchronously, and its response goes back over
//! the IN endpoint. No new request is read while a response is still
//! being sent.

use usb2serial_descriptors::{Descriptor, DescriptorCatalog, DescriptorType, ProgrammerCatalog};

use crate::link::BulkLink;
use crate::session::ModeRunner;
use crate::status::ActivityIndicator;
use crate::transfer::{TransferAssembler, TransferSplitter};

/// Largest request or response handled.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Largest bulk packet handled.
pub const MAX_PACKET_SIZE: usize = 64;

/// Status byte for an unrecognised command.
pub const STATUS_CMD_UNKNOWN: u8 = 0xC9;

/// Interprets programmer commands.
///
/// This is the seam to the device-programming protocol engine, which lives
/// outside this crate.
pub trait CommandProcessor {
    /// Called once before the first command.
    fn init(&mut self) {}

    /// Process one request and write the response into `response`.
    /// Returns the response length; 0 sends nothing back.
    fn process_command(&mut self, request: &[u8], response: &mut [u8]) -> usize;
}

/// Placeholder processor that answers every command with
/// `[command, STATUS_CMD_UNKNOWN]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownCommandResponder;

impl CommandProcessor for UnknownCommandResponder {
    fn process_command(&mut self, request: &[u8], response: &mut [u8]) -> usize {
        match (request.first(), response) {
            (Some(&command), [id, status, ..]) => {
                *id = command;
                *status = STATUS_CMD_UNKNOWN;
                2
            }
            _ => 0,
        }
    }
}

/// Runs the programmer personality.
pub struct ProgrammerDispatch<L, C, I> {
    link: L,
    processor: C,
    indicator: I,
    catalog: ProgrammerCatalog,
    request: TransferAssembler<MAX_MESSAGE_SIZE>,
    response: TransferSplitter<MAX_MESSAGE_SIZE>,
    configured: bool,
}

impl<L, C, I> ProgrammerDispatch<L, C, I>
where
    L: BulkLink,
    C: CommandProcessor,
    I: ActivityIndicator,
{
    /// Build the dispatcher and initialise the command processor.
    pub fn new(link: L, mut processor: C, indicator: I, catalog: ProgrammerCatalog) -> Self {
        processor.init();
        Self {
            link,
            processor,
            indicator,
            catalog,
            request: TransferAssembler::new(),
            response: TransferSplitter::new(),
            configured: false,
        }
    }

    /// Run one pass. Does nothing until the device is configured.
    pub fn tick(&mut self) {
        if !self.configured {
            return;
        }

        self.flush_response();
        if self.response.is_pending() {
            return;
        }

        let max = self.packet_size();
        let mut packet = [0u8; MAX_PACKET_SIZE];
        let Some(len) = self.link.read_packet(&mut packet[..max]) else {
            return;
        };

        match self.request.push(&packet[..len], max) {
            Ok(true) => {
                self.dispatch();
                self.flush_response();
            }
            Ok(false) => {}
            Err(e) => warn!("programmer request dropped: {}", e),
        }
    }

    fn packet_size(&self) -> usize {
        self.link.max_packet_size().clamp(1, MAX_PACKET_SIZE)
    }

    fn dispatch(&mut self) {
        let Some(request) = self.request.request() else {
            return;
        };
        trace!("programmer command {=u8:#x}, {} bytes", request[0], request.len());

        self.indicator.set_busy(true);
        let processor = &mut self.processor;
        self.response
            .fill(|buf| processor.process_command(request, buf));
        self.indicator.set_busy(false);
        // Busy and link may share an output
        self.indicator.set_link(self.configured);

        self.request.reset();
    }

    /// Send as many pending response packets as the link accepts.
    fn flush_response(&mut self) {
        let max = self.packet_size();
        while let Some(packet) = self.response.next_packet(max) {
            let len = packet.len();
            if self.link.write_packet(packet).is_err() {
                break;
            }
            self.response.advance(len, max);
        }
    }

    /// USB configuration changed. A partial request or response from the
    /// previous configuration is dropped.
    pub fn set_configured(&mut self, configured: bool) {
        if configured != self.configured {
            self.request.reset();
            self.response.fill(|_| 0);
        }
        self.configured = configured;
        self.indicator.set_link(configured);
        info!("usb configured={}", configured);
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    pub fn processor(&self) -> &C {
        &self.processor
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }
}

impl<L, C, I> ModeRunner for ProgrammerDispatch<L, C, I>
where
    L: BulkLink,
    C: CommandProcessor,
    I: ActivityIndicator,
{
    fn tick(&mut self) {
        ProgrammerDispatch::tick(self);
    }

    fn describe(&mut self, kind: DescriptorType, index: u8) -> Option<Descriptor<'_>> {
        self.catalog.describe(kind, index)
    }

    fn set_configured(&mut self, configured: bool) {
        ProgrammerDispatch::set_configured(self, configured);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::link::LinkError;
    use std::collections::VecDeque;
    use std::vec;
    use std::vec::Vec;
    use usb2serial_descriptors::ProgrammerEndpoints;

    struct FakeBulk {
        out: VecDeque<Vec<u8>>,
        sent: Vec<Vec<u8>>,
        /// Number of IN packets the host accepts before going busy.
        in_credit: usize,
    }

    impl FakeBulk {
        fn new() -> Self {
            Self {
                out: VecDeque::new(),
                sent: Vec::new(),
                in_credit: usize::MAX,
            }
        }
    }

    impl BulkLink for FakeBulk {
        fn max_packet_size(&self) -> usize {
            64
        }

        fn read_packet(&mut self, buf: &mut [u8]) -> Option<usize> {
            let packet = self.out.pop_front()?;
            buf[..packet.len()].copy_from_slice(&packet);
            Some(packet.len())
        }

        fn write_packet(&mut self, data: &[u8]) -> Result<(), LinkError> {
            if self.in_credit == 0 {
                return Err(LinkError::Busy);
            }
            self.in_credit -= 1;
            self.sent.push(data.to_vec());
            Ok(())
        }
    }

    /// Records requests, answers with `response_len` bytes of the command.
    struct RecordingProcessor {
        initialised: bool,
        requests: Vec<Vec<u8>>,
        response_len: usize,
    }

    impl RecordingProcessor {
        fn new(response_len: usize) -> Self {
            Self {
                initialised: false,
                requests: Vec::new(),
                response_len,
            }
        }
    }

    impl CommandProcessor for RecordingProcessor {
        fn init(&mut self) {
            self.initialised = true;
        }

        fn process_command(&mut self, request: &[u8], response: &mut [u8]) -> usize {
            self.requests.push(request.to_vec());
            response[..self.response_len].fill(request[0]);
            self.response_len
        }
    }

    #[derive(Default)]
    struct BusyLog {
        busy: Vec<bool>,
        link: bool,
    }

    impl ActivityIndicator for BusyLog {
        fn set_busy(&mut self, on: bool) {
            self.busy.push(on);
        }

        fn set_link(&mut self, up: bool) {
            self.link = up;
        }
    }

    fn dispatch<C: CommandProcessor>(processor: C) -> ProgrammerDispatch<FakeBulk, C, BusyLog> {
        ProgrammerDispatch::new(
            FakeBulk::new(),
            processor,
            BusyLog::default(),
            ProgrammerCatalog::new(ProgrammerEndpoints::DEFAULT),
        )
    }

    /// Busy and link on one output, as on boards with a single status LED.
    #[derive(Default)]
    struct SharedStatusLed {
        lit: bool,
    }

    impl ActivityIndicator for SharedStatusLed {
        fn set_busy(&mut self, on: bool) {
            self.lit = on;
        }

        fn set_link(&mut self, up: bool) {
            self.lit = up;
        }
    }

    #[test]
    fn test_status_led_shows_link_after_command() {
        let mut programmer = ProgrammerDispatch::new(
            FakeBulk::new(),
            RecordingProcessor::new(2),
            SharedStatusLed::default(),
            ProgrammerCatalog::new(ProgrammerEndpoints::DEFAULT),
        );
        programmer.set_configured(true);
        programmer.link_mut().out.push_back(vec![0x01]);

        programmer.tick();

        assert_eq!(programmer.processor().requests.len(), 1);
        assert!(programmer.indicator().lit, "link indicator lost after command");

        programmer.set_configured(false);
        assert!(!programmer.indicator().lit);
    }

    #[test]
    fn test_processor_initialised_on_construction() {
        let programmer = dispatch(RecordingProcessor::new(2));
        assert!(programmer.processor().initialised);
    }

    #[test]
    fn test_idle_until_configured() {
        let mut programmer = dispatch(RecordingProcessor::new(2));
        programmer.link_mut().out.push_back(vec![0x01]);
        programmer.tick();
        assert!(programmer.processor().requests.is_empty());
        assert_eq!(programmer.link().out.len(), 1);

        programmer.set_configured(true);
        assert!(programmer.indicator().link);
        programmer.tick();
        assert_eq!(programmer.processor().requests, vec![vec![0x01]]);
    }

    #[test]
    fn test_unknown_command_response() {
        let mut programmer = dispatch(UnknownCommandResponder);
        programmer.set_configured(true);
        programmer.link_mut().out.push_back(vec![0x42, 0x00, 0x01]);
        programmer.tick();

        assert_eq!(programmer.link().sent, vec![vec![0x42, STATUS_CMD_UNKNOWN]]);
        assert_eq!(programmer.indicator().busy, vec![true, false]);
    }

    #[test]
    fn test_multi_packet_request_dispatched_once() {
        let mut programmer = dispatch(RecordingProcessor::new(2));
        programmer.set_configured(true);
        programmer.link_mut().out.extend([vec![0x13; 64], vec![0x13; 64], vec![0x13; 5]]);
        for _ in 0..3 {
            programmer.tick();
        }
        assert_eq!(programmer.processor().requests.len(), 1);
        assert_eq!(programmer.processor().requests[0].len(), 133);
    }

    #[test]
    fn test_long_response_split_with_zlp() {
        let mut programmer = dispatch(RecordingProcessor::new(128));
        programmer.set_configured(true);
        programmer.link_mut().out.push_back(vec![0x14]);
        programmer.tick();

        let sizes: Vec<usize> = programmer.link().sent.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![64, 64, 0]);
    }

    #[test]
    fn test_no_new_request_while_response_pending() {
        let mut programmer = dispatch(RecordingProcessor::new(100));
        programmer.set_configured(true);
        programmer.link_mut().in_credit = 1;
        programmer.link_mut().out.extend([vec![0x01], vec![0x02]]);

        programmer.tick();
        programmer.tick();
        // Second response packet still blocked: second request not read
        assert_eq!(programmer.processor().requests.len(), 1);
        assert_eq!(programmer.link().out.len(), 1);

        programmer.link_mut().in_credit = usize::MAX;
        programmer.tick();
        programmer.tick();
        assert_eq!(programmer.processor().requests.len(), 2);
        let sizes: Vec<usize> = programmer.link().sent.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![64, 36, 64, 36]);
    }

    #[test]
    fn test_oversized_request_dropped() {
        let mut programmer = dispatch(RecordingProcessor::new(2));
        programmer.set_configured(true);
        for _ in 0..(MAX_MESSAGE_SIZE / 64 + 1) {
            programmer.link_mut().out.push_back(vec![0xEE; 64]);
        }
        programmer.link_mut().out.push_back(vec![0xEE; 3]);
        programmer.link_mut().out.push_back(vec![0x07]);
        for _ in 0..16 {
            programmer.tick();
        }
        assert_eq!(programmer.processor().requests, vec![vec![0x07]]);
    }

    #[test]
    fn test_describe_patches_serial() {
        let mut programmer = dispatch(UnknownCommandResponder);
        let serial = ModeRunner::describe(&mut programmer, DescriptorType::String, 3).unwrap();
        assert_eq!(serial.len(), 28);
        assert_eq!(serial.as_bytes()[14], b'2');
    }

    #[test]
    fn test_unknown_responder_needs_room() {
        let mut responder = UnknownCommandResponder;
        let mut small = [0u8; 1];
        assert_eq!(responder.process_command(&[0x10], &mut small), 0);
        let mut buf = [0u8; 4];
        assert_eq!(responder.process_command(&[], &mut buf), 0);
    }
}
