//! Synchronous command channel
//!
//! `CommandChannel` is the only way commands reach the controller. It owns
//! the transport behind a mutex, so at most one command is outstanding at a
//! time: `send_sync`/`issue` queue behind an outstanding command while
//! `try_send_sync`/`try_issue` refuse with `HciError::CommandPending`.
//!
//! After sending, the issuer reads events until the Command Complete (or a
//! failing Command Status) carrying the same opcode arrives. Because only one
//! command is ever in flight, the opcode is enough to correlate the reply.
//! Events that are not completions are handed to the `EventRouter` so
//! connection notifications are never lost while a command is waiting.
//!
//! Between commands, `process_events_with` lets the owner react to a routed
//! connection event with a follow-up command. Subscribers never issue
//! commands themselves.

use crate::connection::{ConnectionEvent, ConnectionEventSink, EventRouter};
use crate::error::HciError;
use crate::hci::buffer::{BufferPool, PooledBuffer};
use crate::hci::constants::*;
use crate::hci::packet::{CommandComplete, CommandStatus, HciCommand};
use crate::hci::transport::HciTransport;
use std::sync::{Arc, Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Default time to wait for a command to complete
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// A command being assembled in a pooled buffer
#[derive(Debug)]
pub struct CommandBuffer {
    opcode: u16,
    buf: PooledBuffer,
}

impl CommandBuffer {
    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    /// Number of parameter bytes added so far
    pub fn param_len(&self) -> usize {
        self.buf.len() - (1 + HCI_COMMAND_HDR_LEN)
    }

    /// Appends parameter bytes
    pub fn add(&mut self, data: &[u8]) -> Result<(), HciError> {
        let len = self.param_len() + data.len();
        if len > HCI_MAX_PARAM_LEN {
            return Err(HciError::InvalidParamLength(len));
        }
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Fixes up the length byte and returns the finished packet
    fn finish(&mut self) -> &[u8] {
        let len = self.param_len() as u8;
        self.buf[1 + HCI_COMMAND_HDR_LEN - 1] = len;
        &self.buf
    }
}

/// Serializes commands to a controller and correlates their completions
pub struct CommandChannel<T> {
    transport: Mutex<T>,
    pool: BufferPool,
    router: Arc<EventRouter>,
    command_timeout: Duration,
}

impl<T: HciTransport> CommandChannel<T> {
    pub fn new(transport: T) -> Self {
        Self::with_pool(transport, BufferPool::default())
    }

    pub fn with_pool(transport: T, pool: BufferPool) -> Self {
        Self {
            transport: Mutex::new(transport),
            pool,
            router: Arc::new(EventRouter::new()),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn command_timeout(&self) -> Duration {
        self.command_timeout
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Registers a subscriber for connection events
    pub fn subscribe(&self, sink: Arc<dyn ConnectionEventSink>) {
        self.router.subscribe(sink);
    }

    /// True while a command is outstanding or events are being pumped
    pub fn is_busy(&self) -> bool {
        matches!(self.transport.try_lock(), Err(TryLockError::WouldBlock))
    }

    /// Allocates a buffer for a command with `param_len` bytes of parameters.
    ///
    /// Fails with `HciError::NoBuffers` when the pool is exhausted; nothing
    /// is sent in that case.
    pub fn create_command(&self, opcode: u16, param_len: usize) -> Result<CommandBuffer, HciError> {
        if param_len > HCI_MAX_PARAM_LEN {
            return Err(HciError::InvalidParamLength(param_len));
        }

        let mut buf = self
            .pool
            .try_alloc(1 + HCI_COMMAND_HDR_LEN + param_len)
            .ok_or(HciError::NoBuffers)?;

        buf.push(HCI_COMMAND_PKT);
        buf.extend_from_slice(&opcode.to_le_bytes());
        buf.push(0);

        Ok(CommandBuffer { opcode, buf })
    }

    /// Sends `command` and blocks until its completion arrives.
    ///
    /// Waits for any outstanding command to finish first. The command
    /// buffer is released before this returns, on every path.
    pub fn send_sync(&self, command: CommandBuffer) -> Result<CommandComplete, HciError> {
        let transport = self.lock_transport();
        self.exchange(&transport, command)
    }

    /// Like `send_sync`, but refuses instead of queueing when another
    /// command is outstanding
    pub fn try_send_sync(&self, command: CommandBuffer) -> Result<CommandComplete, HciError> {
        let transport = match self.transport.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(HciError::CommandPending),
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
        };
        self.exchange(&transport, command)
    }

    /// Encodes and sends a typed command, blocking until it completes
    pub fn issue(&self, command: &HciCommand) -> Result<CommandComplete, HciError> {
        let buf = self.encode(command)?;
        self.send_sync(buf)
    }

    /// Encodes and sends a typed command unless another one is outstanding
    pub fn try_issue(&self, command: &HciCommand) -> Result<CommandComplete, HciError> {
        let buf = self.encode(command)?;
        self.try_send_sync(buf)
    }

    /// Reads events until `timeout` elapses, routing them to subscribers.
    ///
    /// Returns the number of events read. `None` runs until the transport
    /// fails.
    pub fn process_events(&self, timeout: Option<Duration>) -> Result<usize, HciError> {
        self.process_events_with(timeout, |_| None)
    }

    /// Like `process_events`, but after each routed connection event
    /// `follow_up` may return a command to issue.
    ///
    /// The command goes out on the transport already held by the pump, so
    /// nothing can slip in between the event and the command. A follow-up
    /// that is refused or times out is logged and pumping continues; a
    /// transport failure ends it.
    pub fn process_events_with<F>(
        &self,
        timeout: Option<Duration>,
        mut follow_up: F,
    ) -> Result<usize, HciError>
    where
        F: FnMut(&ConnectionEvent) -> Option<HciCommand>,
    {
        let transport = self.lock_transport();
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut count = 0;

        loop {
            let remaining = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        break;
                    }
                    Some(remaining)
                }
                None => None,
            };

            let event = match transport.read_event(remaining) {
                Ok(event) => event,
                Err(e) if e.is_timeout() => break,
                Err(e) => return Err(e),
            };

            count += 1;
            if CommandComplete::parse(&event).is_some() || CommandStatus::parse(&event).is_some() {
                trace!(event_code = event.event_code, "completion with no command outstanding");
                continue;
            }

            let Some(routed) = self.router.dispatch(&event) else {
                continue;
            };
            if let Some(command) = follow_up(&routed) {
                self.issue_follow_up(&transport, &command)?;
            }
        }

        Ok(count)
    }

    fn issue_follow_up(&self, transport: &T, command: &HciCommand) -> Result<(), HciError> {
        let opcode = command.opcode();
        let result = self
            .encode(command)
            .and_then(|buf| self.exchange(transport, buf));

        match result {
            Ok(complete) if complete.is_success() => Ok(()),
            Ok(complete) => {
                warn!("command 0x{:04x} failed (status 0x{:02x})", opcode, complete.status);
                Ok(())
            }
            Err(e @ (HciError::SendError(_) | HciError::ReceiveError(_))) if !e.is_timeout() => Err(e),
            Err(e) => {
                warn!("command 0x{:04x} not completed: {}", opcode, e);
                Ok(())
            }
        }
    }

    fn lock_transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn encode(&self, command: &HciCommand) -> Result<CommandBuffer, HciError> {
        let params = command.parameters();
        let mut buf = self.create_command(command.opcode(), params.len())?;
        buf.add(&params)?;
        Ok(buf)
    }

    fn exchange(&self, transport: &T, mut command: CommandBuffer) -> Result<CommandComplete, HciError> {
        let opcode = command.opcode();
        let packet = command.finish();
        trace!(packet = %hex::encode(packet), "sending command 0x{:04x}", opcode);
        transport.send_packet(packet)?;

        // `command` stays alive until this returns so its buffer is held
        // for exactly as long as the request is outstanding
        let deadline = Instant::now() + self.command_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(HciError::Timeout(opcode));
            }

            let event = match transport.read_event(Some(remaining)) {
                Ok(event) => event,
                Err(e) if e.is_timeout() => return Err(HciError::Timeout(opcode)),
                Err(e) => return Err(e),
            };

            if let Some(complete) = CommandComplete::parse(&event) {
                if complete.opcode == opcode {
                    debug!(status = complete.status, "command 0x{:04x} complete", opcode);
                    return Ok(complete);
                }
                if complete.opcode != 0 {
                    warn!(
                        "ignoring completion for 0x{:04x} while waiting for 0x{:04x}",
                        complete.opcode, opcode
                    );
                }
                continue;
            }

            if let Some(status) = CommandStatus::parse(&event) {
                if status.opcode == opcode && status.status != HCI_SUCCESS {
                    debug!(status = status.status, "command 0x{:04x} rejected", opcode);
                    return Ok(CommandComplete {
                        num_hci_command_packets: status.num_hci_command_packets,
                        opcode,
                        status: status.status,
                        return_parameters: vec![status.status],
                    });
                }
                continue;
            }

            self.router.dispatch(&event);
        }
    }
}

impl<T> std::fmt::Debug for CommandChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandChannel")
            .field("pool", &self.pool)
            .field("router", &self.router)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}
