// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Authorization area entries.

use crate::io::Read;
use crate::io::Write;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::Auth;
use crate::tpm::Nonce;
use crate::tpm::SessionAttrs;
use crate::tpm::TpmHandle;
use crate::Result;

/// One entry in a command's authorization area (`TPMS_AUTH_COMMAND`).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthCommand {
    /// The session this authorization belongs to, or
    /// [`TpmHandle::RS_PW`] for a password authorization.
    pub session_handle: TpmHandle,
    /// The caller's nonce for this command.
    pub nonce: Nonce,
    /// The session's attributes for this command.
    pub attributes: SessionAttrs,
    /// The authorization HMAC, or the plaintext password.
    pub hmac: Auth,
}

impl FromWire for AuthCommand {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self {
            session_handle: TpmHandle::from_wire(r)?,
            nonce: Nonce::from_wire(r)?,
            attributes: SessionAttrs::from_wire(r)?,
            hmac: Auth::from_wire(r)?,
        })
    }
}

impl ToWire for AuthCommand {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.session_handle.to_wire(&mut w)?;
        self.nonce.to_wire(&mut w)?;
        self.attributes.to_wire(&mut w)?;
        self.hmac.to_wire(&mut w)
    }
}

/// One entry in a response's authorization area (`TPMS_AUTH_RESPONSE`).
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct AuthResponse {
    /// The TPM's fresh nonce.
    pub nonce: Nonce,
    /// The session's attributes after the command.
    pub attributes: SessionAttrs,
    /// The response HMAC; empty for password authorizations.
    pub hmac: Auth,
}

impl FromWire for AuthResponse {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        Ok(Self {
            nonce: Nonce::from_wire(r)?,
            attributes: SessionAttrs::from_wire(r)?,
            hmac: Auth::from_wire(r)?,
        })
    }
}

impl ToWire for AuthResponse {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.nonce.to_wire(&mut w)?;
        self.attributes.to_wire(&mut w)?;
        self.hmac.to_wire(&mut w)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tpm::SessionAttr;

    #[test]
    fn password_entry() {
        let auth = AuthCommand {
            session_handle: TpmHandle::RS_PW,
            nonce: Nonce::new(),
            attributes: SessionAttr::ContinueSession.into(),
            hmac: Auth::from_slice(b"pw").unwrap(),
        };

        let mut buf = [0; 11];
        auth.to_wire(&mut buf[..]).unwrap();
        assert_eq!(wire::wire_len(&auth).unwrap(), buf.len());
        assert_eq!(
            &buf,
            &[0x40, 0x00, 0x00, 0x09, 0x00, 0x00, 0x01, 0x00, 0x02, b'p', b'w']
        );
        assert_eq!(AuthCommand::from_wire(&mut &buf[..]).unwrap(), auth);
    }
}
