// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The session and command-authorization engine.
//!
//! An execution [`Context`] owns a [`Transport`] to the TPM, a
//! [`Suite`], and a table of locally cached resources addressed by
//! opaque [`Handle`]s. Every command goes through the same two-phase cycle:
//! an `_async` call resolves handles, authorizes the command with up to
//! three sessions and transmits it; a `_finish` call receives the response,
//! verifies the TPM's authorizations, decrypts the first response
//! parameter if requested, and unmarshals the result. Blocking variants
//! simply loop on `_finish` until it stops reporting [`Error::TryAgain`].
//!
//! # Sessions
//!
//! Each command carries up to three session slots. A slot is either
//! [`Handle::NONE`], [`Handle::PASSWORD`] (a plaintext password
//! authorization), or the handle of a session started with
//! [`Context::start_auth_session()`]. Slots line up with the command's
//! authorization handles: slot `i` authorizes the `i`-th handle that
//! requires authorization, and any further slots are used only for
//! parameter encryption.
//!
//! At most one session per command may set [`SessionAttr::Encrypt`], and at
//! most one may set [`SessionAttr::Decrypt`].
//!
//! [`Transport`]: crate::transport::Transport
//! [`SessionAttr::Encrypt`]: crate::tpm::SessionAttr::Encrypt

use crate::crypto::cipher;
use crate::crypto::csrng;
use crate::crypto::ecdh;
use crate::crypto::hash;
use crate::crypto::oaep;
use crate::io;
use crate::tpm::wire;
use crate::tpm::ResponseCode;
use crate::transport;

#[cfg(doc)]
use crate::crypto::Suite;

mod auth;
pub mod command;
pub mod commands;
mod context;
pub mod options;
pub mod resource;
pub mod session;
mod tr;

#[cfg(all(test, feature = "ring", feature = "std"))]
mod sim;

pub use command::Command;
pub use context::Context;
pub use context::State;
pub use options::Options;
pub use resource::Handle;

/// An error produced by an [`Error`]-returning operation of a [`Context`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A required argument was missing.
    BadReference,
    /// A function was called in a state that does not permit it, such as
    /// calling a `_finish` function with no command in flight.
    BadSequence,
    /// An argument was structurally invalid.
    BadValue,
    /// An argument was too large.
    BadSize,
    /// A handle does not name any resource.
    UnknownHandle,
    /// A fixed-capacity table or buffer is full.
    Memory,
    /// The TPM's response authorization did not verify.
    ResponseAuthFailed,
    /// More than one session requested response encryption.
    MultipleEncryptSessions,
    /// More than one session requested command decryption.
    MultipleDecryptSessions,
    /// A session requested decryption, but the command's first parameter is
    /// not a sized buffer.
    NoDecryptParam,
    /// A session requested encryption, but the response's first parameter
    /// is not a sized buffer.
    NoEncryptParam,
    /// The response was structurally invalid.
    MalformedResponse,
    /// The response was too short to contain a header.
    InsufficientResponse,
    /// The response is not ready yet, or the command is being resubmitted;
    /// call the `_finish` function again.
    TryAgain,
    /// An internal failure, or an unsupported key type for salting.
    GeneralFailure,
    /// The requested algorithm is not supported.
    NotImplemented,
    /// The TPM answered with a non-success response code.
    Device(ResponseCode),
    /// The transport failed.
    Transport(transport::Error),
    /// Marshaling or unmarshaling failed.
    Wire(wire::Error),
    /// A cryptographic primitive failed.
    Crypto(CryptoError),
}

/// A failure in one of the [`Suite`]'s primitives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum CryptoError {
    Hash(hash::Error),
    Csrng(csrng::Error),
    Cipher(cipher::Error),
    Oaep(oaep::Error),
    Ecdh(ecdh::Error),
}

impl From<transport::Error> for Error {
    fn from(e: transport::Error) -> Self {
        match e {
            transport::Error::TryAgain => Self::TryAgain,
            e => Self::Transport(e),
        }
    }
}

impl From<wire::Error> for Error {
    fn from(e: wire::Error) -> Self {
        Self::Wire(e)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Wire(wire::Error::Io(e))
    }
}

impl From<hash::Error> for Error {
    fn from(e: hash::Error) -> Self {
        match e {
            hash::Error::Unsupported => Self::NotImplemented,
            e => Self::Crypto(CryptoError::Hash(e)),
        }
    }
}

impl From<csrng::Error> for Error {
    fn from(e: csrng::Error) -> Self {
        Self::Crypto(CryptoError::Csrng(e))
    }
}

impl From<cipher::Error> for Error {
    fn from(e: cipher::Error) -> Self {
        match e {
            cipher::Error::Unsupported => Self::NotImplemented,
            e => Self::Crypto(CryptoError::Cipher(e)),
        }
    }
}

impl From<oaep::Error> for Error {
    fn from(e: oaep::Error) -> Self {
        match e {
            oaep::Error::Unsupported => Self::NotImplemented,
            e => Self::Crypto(CryptoError::Oaep(e)),
        }
    }
}

impl From<ecdh::Error> for Error {
    fn from(e: ecdh::Error) -> Self {
        match e {
            ecdh::Error::Unsupported => Self::NotImplemented,
            e => Self::Crypto(CryptoError::Ecdh(e)),
        }
    }
}

debug_from!(Error => transport::Error, wire::Error, io::Error);
debug_from!(Error => hash::Error, csrng::Error, cipher::Error);
debug_from!(Error => oaep::Error, ecdh::Error);

impl crate::Error<Error> {
    /// Returns whether this error is [`Error::TryAgain`], the only
    /// condition that callers are expected to retry.
    pub fn is_try_again(&self) -> bool {
        matches!(self.as_ref(), Error::TryAgain)
    }

    /// Returns the TPM's response code, if this is a device error.
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self.as_ref() {
            Error::Device(rc) => Some(*rc),
            _ => None,
        }
    }
}
