// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! `warden` is a client-side engine for authorizing and protecting commands
//! sent to a TPM 2.0 device.
//!
//! The heart of the crate is the [`esys`] module: an execution
//! [`Context`](esys::Context) that drives each device command through an
//! asynchronous submit/finish state machine, attaches HMAC or password
//! authorizations for up to three sessions, encrypts and decrypts the first
//! parameter of commands and responses, and verifies the device's response
//! authorizations.
//!
//! `warden` does not talk to hardware directly. The byte channel to the
//! device is abstracted by the [`transport`] module, and every cryptographic
//! primitive is provided through the object-safe traits in [`crypto`], so
//! that integrations can plug in whatever backend suits them. Software
//! implementations based on [`ring`] and the RustCrypto crates are available
//! under the `ring` feature.
//!
//! The TPM data structures the engine needs, together with their wire codec,
//! live in [`tpm`].
//!
//! [`ring`]: https://docs.rs/ring

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

#[cfg(feature = "log")]
extern crate log as __raw_log;

#[macro_use]
mod debug;
pub use debug::Error;

/// A [`core::result::Result`] whose error is a wrapped [`Error`].
pub type Result<T, E> = core::result::Result<T, Error<E>>;

#[macro_use]
pub mod tpm;

pub mod crypto;
pub mod esys;
pub mod io;
pub mod transport;
