//! Vendor-class bulk endpoint pair for programmer mode.

use core::task::Poll;

use embassy_futures::poll_once;
use embassy_usb::driver::{Direction, Driver, EndpointAddress, EndpointError, EndpointIn, EndpointOut};
use embassy_usb::Builder;
use usb2serial_core::{BulkLink, LinkError};
use usb2serial_descriptors::ProgrammerEndpoints;

use crate::config::PROGRAMMER_PACKET_SIZE;
use crate::UsbDriver;

const CLASS_VENDOR: u8 = 0xFF;

type In<'d> = <UsbDriver<'d> as Driver<'d>>::EndpointIn;
type Out<'d> = <UsbDriver<'d> as Driver<'d>>::EndpointOut;

/// Programmer bulk IN/OUT pair.
pub struct BulkPort<'d> {
    ep_in: In<'d>,
    ep_out: Out<'d>,
}

impl<'d> BulkPort<'d> {
    pub fn new(ep_in: In<'d>, ep_out: Out<'d>) -> Self {
        Self { ep_in, ep_out }
    }
}

impl BulkLink for BulkPort<'_> {
    fn max_packet_size(&self) -> usize {
        usize::from(PROGRAMMER_PACKET_SIZE)
    }

    fn read_packet(&mut self, buf: &mut [u8]) -> Option<usize> {
        match poll_once(self.ep_out.read(buf)) {
            Poll::Ready(Ok(n)) => Some(n),
            Poll::Ready(Err(EndpointError::BufferOverflow)) => {
                defmt::warn!("programmer: OUT packet larger than buffer");
                None
            }
            Poll::Ready(Err(_)) | Poll::Pending => None,
        }
    }

    fn write_packet(&mut self, packet: &[u8]) -> Result<(), LinkError> {
        match poll_once(self.ep_in.write(packet)) {
            Poll::Ready(Ok(())) => Ok(()),
            Poll::Ready(Err(_)) => Err(LinkError::Io),
            Poll::Pending => Err(LinkError::Busy),
        }
    }
}

/// Add the programmer interface to the USB builder.
///
/// The endpoint addresses are fixed, since host tools expect them.
pub fn configure_programmer<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    endpoints: ProgrammerEndpoints,
) -> BulkPort<'d> {
    let mut function = builder.function(CLASS_VENDOR, 0, 0);
    let mut interface = function.interface();
    let mut alt = interface.alt_setting(CLASS_VENDOR, 0, 0, None);

    let ep_in = alt.endpoint_bulk_in(
        Some(EndpointAddress::from_parts(
            usize::from(endpoints.data_in_number()),
            Direction::In,
        )),
        PROGRAMMER_PACKET_SIZE,
    );
    let ep_out = alt.endpoint_bulk_out(
        Some(EndpointAddress::from_parts(
            usize::from(endpoints.data_out_number()),
            Direction::Out,
        )),
        PROGRAMMER_PACKET_SIZE,
    );

    BulkPort::new(ep_in, ep_out)
}
