//! Bluetooth HCI (Host Controller Interface) implementation
//!
//! This module provides command framing, event parsing, the synchronous
//! command channel and the Linux socket transport.

pub mod buffer;
pub mod channel;
pub mod constants;
pub mod packet;
pub mod socket;
pub mod transport;


pub use buffer::{BufferPool, PooledBuffer};
pub use channel::{CommandBuffer, CommandChannel, DEFAULT_COMMAND_TIMEOUT};
pub use packet::{
    CommandComplete, CommandStatus, DisconnectionComplete, HciCommand, HciEvent,
    LeConnectionComplete,
};
pub use socket::{HciChannel, HciSocket};
pub use transport::HciTransport;
