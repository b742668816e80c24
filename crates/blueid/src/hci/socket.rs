//! HCI Socket implementation for Bluetooth communication
//!
//! This module provides a wrapper around the Linux `AF_BLUETOOTH` HCI socket,
//! allowing for communication with Bluetooth controllers.

use crate::error::HciError;
use crate::hci::constants::{HCI_EVENT_PKT, HCI_MAX_EVENT_SIZE};
use crate::hci::packet::HciEvent;
use crate::hci::transport::HciTransport;
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_HCI: i32 = 1;
const SOL_HCI: i32 = 0;
const HCI_FILTER: i32 = 2;

/// Which HCI socket channel to bind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HciChannel {
    /// Shared with the kernel stack; the device must be up
    #[default]
    Raw,
    /// Exclusive access; the device must be down and not managed by bluetoothd
    User,
}

impl HciChannel {
    fn value(self) -> u16 {
        match self {
            HciChannel::Raw => 0,
            HciChannel::User => 1,
        }
    }
}

/// Represents an HCI socket
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
    channel: HciChannel,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

// Userspace view of the kernel's HCI socket filter
#[repr(C)]
struct HciFilter {
    type_mask: u32,
    event_mask: [u32; 2],
    opcode: u16,
}

impl HciSocket {
    /// Gets the raw file descriptor for the socket
    pub fn as_raw_fd(&self) -> RawFd {
        self.fd
    }

    pub fn channel(&self) -> HciChannel {
        self.channel
    }

    /// Opens a raw HCI socket on `dev_id` (0 for the first device)
    pub fn open(dev_id: u16) -> Result<Self, HciError> {
        Self::open_channel(dev_id, HciChannel::Raw)
    }

    /// Opens an HCI socket bound to the given channel
    pub fn open_channel(dev_id: u16, channel: HciChannel) -> Result<Self, HciError> {
        let fd = unsafe {
            libc::socket(
                AF_BLUETOOTH,
                libc::SOCK_RAW | libc::SOCK_CLOEXEC,
                BTPROTO_HCI,
            )
        };

        if fd < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }

        // Owned from here on so every error path closes the descriptor
        let socket = HciSocket { fd, channel };

        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: channel.value(),
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(HciError::BindError(std::io::Error::last_os_error()));
        }

        // Raw sockets only see what the filter lets through; the user
        // channel delivers everything and rejects filters.
        if channel == HciChannel::Raw {
            socket.set_event_filter()?;
        }

        debug!(dev_id, ?channel, "opened HCI socket");
        Ok(socket)
    }

    fn set_event_filter(&self) -> Result<(), HciError> {
        let filter = HciFilter {
            type_mask: 1 << HCI_EVENT_PKT,
            event_mask: [u32::MAX, u32::MAX],
            opcode: 0,
        };

        let result = unsafe {
            libc::setsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                &filter as *const _ as *const libc::c_void,
                std::mem::size_of::<HciFilter>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }

        Ok(())
    }

    /// Waits until the socket is readable or the timeout expires
    fn wait_readable(&self, timeout: Duration) -> Result<(), HciError> {
        let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
        unsafe {
            libc::FD_ZERO(&mut read_fds);
            libc::FD_SET(self.fd, &mut read_fds);
        }

        let mut timeout_val = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        let result = unsafe {
            libc::select(
                self.fd + 1,
                &mut read_fds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut timeout_val,
            )
        };

        if result < 0 {
            return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
        }

        if result == 0 {
            return Err(HciError::ReceiveError(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "Timed out waiting for HCI event",
            )));
        }

        Ok(())
    }

    /// Reads one packet and parses it if it is an event.
    ///
    /// Returns `Ok(None)` for packets of other types and for events too
    /// short for their length byte, which are logged and dropped.
    fn read_packet(&self) -> Result<Option<HciEvent>, HciError> {
        let mut buffer = [0u8; HCI_MAX_EVENT_SIZE];

        let bytes_read = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            )
        };

        if bytes_read < 0 {
            return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
        }

        let bytes_read = bytes_read as usize;
        if bytes_read == 0 || buffer[0] != HCI_EVENT_PKT {
            return Ok(None);
        }

        let event = HciEvent::parse(&buffer[1..bytes_read]);
        if event.is_none() {
            warn!(packet = %hex::encode(&buffer[..bytes_read]), "dropping malformed event");
        }
        Ok(event)
    }

    /// Read an HCI event from the socket
    pub fn read_event(&self) -> Result<HciEvent, HciError> {
        loop {
            if let Some(event) = self.read_packet()? {
                return Ok(event);
            }
        }
    }

    /// Read an HCI event from the socket with a timeout
    pub fn read_event_timeout(&self, timeout: Option<Duration>) -> Result<HciEvent, HciError> {
        let Some(timeout) = timeout else {
            return self.read_event();
        };

        let deadline = Instant::now() + timeout;
        loop {
            self.wait_readable(deadline.saturating_duration_since(Instant::now()))?;
            if let Some(event) = self.read_packet()? {
                return Ok(event);
            }
        }
    }

    /// Writes a complete packet to the controller
    pub fn write_packet(&self, packet: &[u8]) -> Result<(), HciError> {
        match unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        } {
            -1 => Err(HciError::SendError(std::io::Error::last_os_error())),
            _ => Ok(()),
        }
    }
}

impl HciTransport for HciSocket {
    fn send_packet(&self, packet: &[u8]) -> Result<(), HciError> {
        self.write_packet(packet)
    }

    fn read_event(&self, timeout: Option<Duration>) -> Result<HciEvent, HciError> {
        self.read_event_timeout(timeout)
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
