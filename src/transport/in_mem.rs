// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A scripted, in-memory [`Transport`].

use arrayvec::ArrayVec;

use crate::transport::Error;
use crate::transport::Timeout;
use crate::transport::Transport;
use crate::Result;

/// The largest number of responses that can be queued at once.
pub const MAX_QUEUED: usize = 8;

/// The largest command an [`InMemTransport`] records.
pub const MAX_COMMAND: usize = 4096;

/// A simple in-memory [`Transport`], which replays canned responses.
///
/// Each transmitted command is recorded; each receive hands out the next
/// queued response. A number of non-blocking receives can be made to
/// report [`Error::TryAgain`] first, to exercise polling callers.
pub struct InMemTransport<'buf> {
    responses: ArrayVec<&'buf [u8], MAX_QUEUED>,
    would_block: usize,
    tx: ArrayVec<u8, MAX_COMMAND>,
    transmissions: usize,
    cancelled: bool,
}

impl<'buf> Default for InMemTransport<'buf> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'buf> InMemTransport<'buf> {
    /// Creates a new `InMemTransport` with nothing queued.
    pub fn new() -> Self {
        Self {
            responses: ArrayVec::new(),
            would_block: 0,
            tx: ArrayVec::new(),
            transmissions: 0,
            cancelled: false,
        }
    }

    /// Queues a response, to be returned after all previously queued ones.
    ///
    /// Returns `false` if the queue is full.
    pub fn respond(&mut self, message: &'buf [u8]) -> bool {
        self.responses.try_push(message).is_ok()
    }

    /// Makes the next `n` non-blocking receives report
    /// [`Error::TryAgain`].
    pub fn would_block(&mut self, n: usize) {
        self.would_block = n;
    }

    /// Returns the last command transmitted.
    pub fn last_command(&self) -> &[u8] {
        &self.tx
    }

    /// Returns the number of commands transmitted so far.
    pub fn transmissions(&self) -> usize {
        self.transmissions
    }

    /// Returns whether [`Transport::cancel()`] has been called.
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Transport for InMemTransport<'_> {
    fn transmit(&mut self, command: &[u8]) -> Result<(), Error> {
        self.tx.clear();
        self.tx
            .try_extend_from_slice(command)
            .map_err(|_| fail!(Error::BufferTooSmall))?;
        self.transmissions += 1;
        Ok(())
    }

    fn receive(
        &mut self,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> Result<usize, Error> {
        if timeout != Timeout::Forever && self.would_block > 0 {
            self.would_block -= 1;
            return Err(soft_fail!(Error::TryAgain));
        }

        check!(!self.responses.is_empty(), Error::Disconnected);
        let message = self.responses[0];
        let out = buf
            .get_mut(..message.len())
            .ok_or_else(|| fail!(Error::BufferTooSmall))?;
        out.copy_from_slice(message);
        self.responses.remove(0);
        Ok(message.len())
    }

    fn cancel(&mut self) -> Result<(), Error> {
        self.cancelled = true;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn replay() {
        let mut t = InMemTransport::new();
        assert!(t.respond(b"first"));
        assert!(t.respond(b"second"));

        t.transmit(b"cmd").unwrap();
        assert_eq!(t.last_command(), b"cmd");

        let mut buf = [0; 16];
        let len = t.receive(&mut buf, Timeout::Forever).unwrap();
        assert_eq!(&buf[..len], b"first");

        t.would_block(2);
        for _ in 0..2 {
            let err = t.receive(&mut buf, Timeout::NON_BLOCKING).unwrap_err();
            assert_eq!(err.into_inner(), Error::TryAgain);
        }
        let len = t.receive(&mut buf, Timeout::NON_BLOCKING).unwrap();
        assert_eq!(&buf[..len], b"second");

        let err = t.receive(&mut buf, Timeout::Forever).unwrap_err();
        assert_eq!(err.into_inner(), Error::Disconnected);
        assert_eq!(t.transmissions(), 1);
    }

    #[test]
    fn small_buffer() {
        let mut t = InMemTransport::new();
        t.respond(b"too long");
        let mut buf = [0; 4];
        let err = t.receive(&mut buf, Timeout::Forever).unwrap_err();
        assert_eq!(err.into_inner(), Error::BufferTooSmall);
    }
}
