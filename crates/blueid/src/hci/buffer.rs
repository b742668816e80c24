//! Fixed-capacity pool of command buffers
//!
//! A command can only be built while a buffer is free, and the buffer goes
//! back to the pool when the `PooledBuffer` is dropped, whichever way the
//! command finished.

use crate::hci::constants::{HCI_COMMAND_HDR_LEN, HCI_MAX_PARAM_LEN};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};

/// Number of command buffers in the default pool
pub const DEFAULT_COMMAND_BUFFERS: usize = 2;

/// Size of one command buffer: packet type, header and maximum parameters
pub const COMMAND_BUFFER_SIZE: usize = 1 + HCI_COMMAND_HDR_LEN + HCI_MAX_PARAM_LEN;

#[derive(Debug)]
struct PoolInner {
    free: Mutex<Vec<Vec<u8>>>,
    capacity: usize,
    buffer_size: usize,
}

impl PoolInner {
    fn free_list(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.free.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A shared pool of reusable byte buffers
#[derive(Debug, Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl BufferPool {
    /// Creates a pool of `count` buffers, each able to hold `buffer_size` bytes
    pub fn new(count: usize, buffer_size: usize) -> Self {
        let free = (0..count).map(|_| Vec::with_capacity(buffer_size)).collect();
        Self {
            inner: Arc::new(PoolInner {
                free: Mutex::new(free),
                capacity: count,
                buffer_size,
            }),
        }
    }

    /// Takes a buffer that can hold at least `len` bytes.
    ///
    /// Returns `None` when every buffer is in use or `len` exceeds the
    /// buffer size.
    pub fn try_alloc(&self, len: usize) -> Option<PooledBuffer> {
        if len > self.inner.buffer_size {
            return None;
        }

        let buf = self.inner.free_list().pop()?;
        Some(PooledBuffer {
            buf,
            pool: Arc::clone(&self.inner),
        })
    }

    /// Number of buffers currently free
    pub fn available(&self) -> usize {
        self.inner.free_list().len()
    }

    /// Total number of buffers owned by the pool
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    pub fn buffer_size(&self) -> usize {
        self.inner.buffer_size
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_BUFFERS, COMMAND_BUFFER_SIZE)
    }
}

/// A buffer on loan from a `BufferPool`
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<PoolInner>,
}

impl Deref for PooledBuffer {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        &self.buf
    }
}

impl DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        &mut self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let mut buf = std::mem::take(&mut self.buf);
        buf.clear();
        self.pool.free_list().push(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffers_return_on_drop() {
        let pool = BufferPool::new(2, 16);
        assert_eq!(pool.available(), 2);

        let a = pool.try_alloc(6).unwrap();
        let b = pool.try_alloc(6).unwrap();
        assert_eq!(pool.available(), 0);
        assert!(pool.try_alloc(6).is_none());

        drop(a);
        assert_eq!(pool.available(), 1);
        drop(b);
        assert_eq!(pool.available(), 2);
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_returned_buffers_are_cleared() {
        let pool = BufferPool::new(1, 16);
        {
            let mut buf = pool.try_alloc(4).unwrap();
            buf.extend_from_slice(&[1, 2, 3, 4]);
        }
        let buf = pool.try_alloc(4).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_oversized_request_is_refused() {
        let pool = BufferPool::new(1, 8);
        assert!(pool.try_alloc(9).is_none());
        assert_eq!(pool.available(), 1);
    }

    #[test]
    fn test_empty_pool() {
        let pool = BufferPool::new(0, COMMAND_BUFFER_SIZE);
        assert!(pool.try_alloc(6).is_none());
    }
}
