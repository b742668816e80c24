//! The seam between the command channel and the controller

use crate::error::HciError;
use crate::hci::packet::HciEvent;
use std::time::Duration;

/// A byte transport to a Bluetooth controller.
///
/// `send_packet` takes a complete HCI packet including the packet type
/// byte. `read_event` returns the next HCI event, or a timeout error when
/// nothing arrives within `timeout` (`None` waits forever).
pub trait HciTransport {
    fn send_packet(&self, packet: &[u8]) -> Result<(), HciError>;

    fn read_event(&self, timeout: Option<Duration>) -> Result<HciEvent, HciError>;
}

impl<T: HciTransport + ?Sized> HciTransport for Box<T> {
    fn send_packet(&self, packet: &[u8]) -> Result<(), HciError> {
        (**self).send_packet(packet)
    }

    fn read_event(&self, timeout: Option<Duration>) -> Result<HciEvent, HciError> {
        (**self).read_event(timeout)
    }
}
