// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The subset of the TPM 2.0 data model used by the session engine.
//!
//! Every type in this module knows how to marshal itself into, and unmarshal
//! itself out of, the TPM wire format through the [`wire::ToWire`] and
//! [`wire::FromWire`] traits. All integers are big-endian, and variable-length
//! data is carried in `TPM2B` buffers: a 16-bit length followed by that many
//! bytes. Buffers have a fixed capacity, so that none of these types allocate.

#[macro_use]
pub mod wire;

pub mod alg;
pub mod attrs;
pub mod auth;
pub mod buf;
pub mod handle;
pub mod public;
pub mod rc;

pub use alg::AlgId;
pub use alg::EccCurve;
pub use alg::SessionType;
pub use alg::StructureTag;
pub use attrs::SessionAttr;
pub use attrs::SessionAttrs;
pub use auth::AuthCommand;
pub use auth::AuthResponse;
pub use buf::Auth;
pub use buf::Digest;
pub use buf::EccParameter;
pub use buf::EncryptedSecret;
pub use buf::MaxNvBuffer;
pub use buf::Name;
pub use buf::Nonce;
pub use buf::PublicKeyRsa;
pub use buf::Tpm2b;
pub use handle::TpmHandle;
pub use rc::CommandCode;
pub use rc::ResponseCode;
