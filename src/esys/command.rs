// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Command descriptors, and the command and response buffer layouts.
//!
//! A command on the wire is
//!
//! ```text
//! tag ‖ commandSize ‖ commandCode ‖ handles ‖ [authSize ‖ auths] ‖ params
//! ```
//!
//! with the authorization area present exactly when the tag is
//! `TPM_ST_SESSIONS`. A response is
//!
//! ```text
//! tag ‖ responseSize ‖ responseCode ‖ handles ‖ [paramSize] ‖ params ‖ [auths]
//! ```
//!
//! The parameter areas, without the handles or authorizations, are what
//! cpHash and rpHash are computed over.

use core::ops::Range;

use arrayvec::ArrayVec;

use crate::esys::options::MAX_COMMAND_SIZE;
use crate::esys::Error;
use crate::esys::Handle;
use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::AuthCommand;
use crate::tpm::AuthResponse;
use crate::tpm::CommandCode;
use crate::tpm::ResponseCode;
use crate::tpm::StructureTag;
use crate::tpm::TpmHandle;
use crate::Result;

/// The size of a command or response header.
pub const HEADER_LEN: usize = 10;

/// The largest number of handles in a command or response.
pub const MAX_HANDLES: usize = 3;

/// The largest number of sessions a command may carry.
pub const MAX_SESSIONS: usize = 3;

/// A TPM command, as far as the execution engine is concerned.
///
/// Implementations describe a command's handle and parameter areas, and
/// how to parse its response; everything else (authorizations, parameter
/// encryption, resubmission) is handled generically.
pub trait Command {
    /// The command code.
    const CODE: CommandCode;

    /// How many of the leading [`Command::handles()`] require
    /// authorization.
    const AUTH_HANDLES: usize = 0;

    /// How many handles the response carries.
    const RESPONSE_HANDLES: usize = 0;

    /// Whether the command's first parameter is a sized buffer, which a
    /// session may ask to have encrypted.
    const DECRYPT: bool = false;

    /// Whether the response's first parameter is a sized buffer, which a
    /// session may ask the TPM to encrypt.
    const ENCRYPT: bool = false;

    /// Whether the command may carry sessions at all.
    const SESSIONS: bool = true;

    /// The parsed response.
    type Response;

    /// Returns the entities in the command's handle area.
    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        ArrayVec::new()
    }

    /// Marshals the command's parameter area.
    fn write_params<W: Write>(&self, w: W) -> Result<(), wire::Error>;

    /// Parses the response's handle and parameter areas.
    fn read_response<R: Read>(
        handles: &[TpmHandle],
        params: &mut R,
    ) -> Result<Self::Response, wire::Error>;
}

/// Assembles a complete command buffer into `out`.
pub fn write_command(
    out: &mut ArrayVec<u8, MAX_COMMAND_SIZE>,
    code: CommandCode,
    handles: &[TpmHandle],
    auths: &[AuthCommand],
    params: &[u8],
) -> Result<(), Error> {
    out.clear();
    let tag = if auths.is_empty() {
        StructureTag::NoSessions
    } else {
        StructureTag::Sessions
    };
    tag.to_wire(&mut *out)?;
    wire::write_int(0u32, &mut *out)?;
    code.to_wire(&mut *out)?;
    for handle in handles {
        handle.to_wire(&mut *out)?;
    }
    if !auths.is_empty() {
        let mut auth_size = 0;
        for auth in auths {
            auth_size += wire::wire_len(auth)?;
        }
        wire::write_int(auth_size as u32, &mut *out)?;
        for auth in auths {
            auth.to_wire(&mut *out)?;
        }
    }
    out.write_bytes(params)?;

    let size = (out.len() as u32).to_be_bytes();
    out[2..6].copy_from_slice(&size);
    Ok(())
}

/// Reads the response code out of a response header.
pub fn response_code(buf: &[u8]) -> Result<ResponseCode, Error> {
    check!(buf.len() >= HEADER_LEN, Error::InsufficientResponse);
    let mut r = &buf[6..HEADER_LEN];
    Ok(ResponseCode::from_wire(&mut r)?)
}

/// A parsed successful response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    /// The handle area.
    pub handles: ArrayVec<TpmHandle, MAX_HANDLES>,
    /// Where the parameter area (the rpBuffer) lies in the response.
    pub params: Range<usize>,
    /// The authorization area.
    pub auths: ArrayVec<AuthResponse, MAX_SESSIONS>,
}

fn malformed<E>(_: crate::Error<E>) -> crate::Error<Error> {
    fail!(Error::MalformedResponse)
}

/// Parses a response carrying `handle_count` handles.
///
/// Responses with a non-success code are reported as [`Error::Device`].
pub fn parse_response(
    buf: &[u8],
    handle_count: usize,
) -> Result<Response, Error> {
    let rc = response_code(buf)?;
    if !rc.is_success() {
        return Err(fail!(Error::Device(rc)));
    }

    let mut r = buf;
    let tag = StructureTag::from_wire(&mut r).map_err(malformed)?;
    let size = wire::read_int::<u32, _>(&mut r).map_err(malformed)?;
    check!(size as usize == buf.len(), Error::MalformedResponse);
    let _ = ResponseCode::from_wire(&mut r).map_err(malformed)?;

    let mut handles = ArrayVec::new();
    for _ in 0..handle_count.min(MAX_HANDLES) {
        handles.push(TpmHandle::from_wire(&mut r).map_err(malformed)?);
    }

    let mut auths = ArrayVec::new();
    let params = match tag {
        StructureTag::NoSessions => {
            let start = buf.len() - r.len();
            start..buf.len()
        }
        StructureTag::Sessions => {
            let param_size =
                wire::read_int::<u32, _>(&mut r).map_err(malformed)? as usize;
            check!(param_size <= r.len(), Error::MalformedResponse);
            let start = buf.len() - r.len();
            r = &r[param_size..];

            while !r.is_empty() {
                let auth = AuthResponse::from_wire(&mut r).map_err(malformed)?;
                auths.try_push(auth).map_err(|_| {
                    fail!(Error::MalformedResponse, "too many response auths")
                })?;
            }
            start..start + param_size
        }
        StructureTag::RspCommand => {
            return Err(fail!(
                Error::MalformedResponse,
                "successful response with a TPM 1.2 tag",
            ))
        }
    };

    Ok(Response {
        handles,
        params,
        auths,
    })
}

/// Returns the contents of the sized buffer at the start of a parameter
/// area, if its declared size fits in it.
pub fn first_sized_param(params: &mut [u8]) -> Option<&mut [u8]> {
    if params.len() < 2 {
        return None;
    }
    let size = usize::from(u16::from_be_bytes([params[0], params[1]]));
    params.get_mut(2..2 + size)
}
