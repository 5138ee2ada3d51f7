// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Transport interfaces.
//!
//! This module provides an abstract byte channel to a TPM. The term
//! "transport" is used very loosely: anything that can carry one complete
//! command buffer to the device and carry one complete response buffer back
//! qualifies, be it a character device, a socket to a simulator, or a
//! hypervisor mailbox.
//!
//! Transports never interpret the bytes they carry. Framing beyond "one
//! buffer per transmission" is their own business.

use crate::io;

pub mod in_mem;

pub use in_mem::InMemTransport;

/// A transport error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Indicates that a response is not available yet. Only returned from a
    /// non-blocking [`Transport::receive()`]; the caller should poll again.
    TryAgain,
    /// Indicates an underlying I/O error.
    Io(io::Error),
    /// Indicates that the transport does not support an operation, such as
    /// cancellation.
    NotImplemented,
    /// Indicates that the receive buffer was too small for the response.
    BufferTooSmall,
    /// Indicates that the other end of the channel is gone.
    Disconnected,
    /// Indicates an unspecified, internal error.
    Unspecified,
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

debug_from!(Error => io::Error);

/// How long [`Transport::receive()`] may wait for a response.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Timeout {
    /// Block until a response arrives.
    Forever,
    /// Wait at most this many milliseconds; zero polls without waiting.
    Millis(u32),
}

impl Timeout {
    /// A timeout that polls without blocking.
    pub const NON_BLOCKING: Self = Self::Millis(0);
}

impl Default for Timeout {
    fn default() -> Self {
        Self::Forever
    }
}

/// A duplex byte channel to a TPM.
///
/// A transport carries exactly one command at a time: every call to
/// [`Transport::transmit()`] is followed by calls to
/// [`Transport::receive()`] until one of them produces the response.
pub trait Transport {
    /// Sends a complete command buffer to the device.
    fn transmit(&mut self, command: &[u8]) -> Result<(), Error>;

    /// Receives the response to the last transmitted command into `buf`,
    /// returning its length.
    ///
    /// If no response arrives within `timeout`, returns
    /// [`Error::TryAgain`]; the response must then still be deliverable by a
    /// later call.
    fn receive(
        &mut self,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> Result<usize, Error>;

    /// Asks the device to abandon the command in flight.
    ///
    /// Cancellation is best-effort: a response must still be received
    /// afterwards. Transports that cannot cancel need not implement this.
    fn cancel(&mut self) -> Result<(), Error> {
        Err(fail!(Error::NotImplemented))
    }
}
impl dyn Transport {} // Ensure object-safety.
