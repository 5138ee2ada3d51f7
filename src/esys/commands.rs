// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Built-in [`Command`]s.
//!
//! These are the commands the engine itself needs: starting, flushing and
//! steering sessions, and reading public areas to set up resources. The
//! NV and random-number commands round them out into something useful for
//! exercising sessions end to end.

use arrayvec::ArrayVec;

use crate::esys::command::Command;
use crate::esys::command::MAX_HANDLES;
use crate::esys::Handle;
use crate::io::Read;
use crate::io::Write;
use crate::tpm::public::NvPublic;
use crate::tpm::public::Public;
use crate::tpm::public::SymDef;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::AlgId;
use crate::tpm::CommandCode;
use crate::tpm::Digest;
use crate::tpm::EncryptedSecret;
use crate::tpm::MaxNvBuffer;
use crate::tpm::Name;
use crate::tpm::Nonce;
use crate::tpm::SessionType;
use crate::tpm::TpmHandle;
use crate::Result;

fn handles(list: &[Handle]) -> ArrayVec<Handle, MAX_HANDLES> {
    list.iter().copied().take(MAX_HANDLES).collect()
}

/// `TPM2_GetRandom`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GetRandom {
    /// The number of bytes to return.
    pub bytes_requested: u16,
}

impl Command for GetRandom {
    const CODE: CommandCode = CommandCode::GET_RANDOM;
    const ENCRYPT: bool = true;
    type Response = Digest;

    fn write_params<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.bytes_requested, &mut w)
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        r: &mut R,
    ) -> Result<Digest, wire::Error> {
        Digest::from_wire(r)
    }
}

/// `TPM2_ReadPublic`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReadPublic {
    /// The object to read.
    pub object: Handle,
}

/// The response to [`ReadPublic`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadPublicResponse {
    /// The object's public area.
    pub out_public: Public,
    /// The object's name, as computed by the TPM.
    pub name: Name,
    /// The object's qualified name.
    pub qualified_name: Name,
}

impl Command for ReadPublic {
    const CODE: CommandCode = CommandCode::READ_PUBLIC;
    const ENCRYPT: bool = true;
    type Response = ReadPublicResponse;

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.object])
    }

    fn write_params<W: Write>(&self, _: W) -> Result<(), wire::Error> {
        Ok(())
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        r: &mut R,
    ) -> Result<ReadPublicResponse, wire::Error> {
        Ok(ReadPublicResponse {
            out_public: wire::read_sized(r)?,
            name: Name::from_wire(r)?,
            qualified_name: Name::from_wire(r)?,
        })
    }
}

/// `TPM2_NV_ReadPublic`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NvReadPublic {
    /// The NV index to read.
    pub nv_index: Handle,
}

/// The response to [`NvReadPublic`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NvReadPublicResponse {
    /// The index's public area.
    pub nv_public: NvPublic,
    /// The index's name, as computed by the TPM.
    pub nv_name: Name,
}

impl Command for NvReadPublic {
    const CODE: CommandCode = CommandCode::NV_READ_PUBLIC;
    const ENCRYPT: bool = true;
    type Response = NvReadPublicResponse;

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.nv_index])
    }

    fn write_params<W: Write>(&self, _: W) -> Result<(), wire::Error> {
        Ok(())
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        r: &mut R,
    ) -> Result<NvReadPublicResponse, wire::Error> {
        Ok(NvReadPublicResponse {
            nv_public: wire::read_sized(r)?,
            nv_name: Name::from_wire(r)?,
        })
    }
}

/// `TPM2_NV_Read`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NvRead {
    /// The entity authorizing the read: the index itself, or a hierarchy.
    pub auth_handle: Handle,
    /// The NV index to read.
    pub nv_index: Handle,
    /// The number of bytes to read.
    pub size: u16,
    /// The offset to start reading at.
    pub offset: u16,
}

impl Command for NvRead {
    const CODE: CommandCode = CommandCode::NV_READ;
    const AUTH_HANDLES: usize = 1;
    const ENCRYPT: bool = true;
    type Response = MaxNvBuffer;

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.auth_handle, self.nv_index])
    }

    fn write_params<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        wire::write_int(self.size, &mut w)?;
        wire::write_int(self.offset, &mut w)
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        r: &mut R,
    ) -> Result<MaxNvBuffer, wire::Error> {
        MaxNvBuffer::from_wire(r)
    }
}

/// `TPM2_NV_Write`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NvWrite {
    /// The entity authorizing the write: the index itself, or a hierarchy.
    pub auth_handle: Handle,
    /// The NV index to write.
    pub nv_index: Handle,
    /// The data to write.
    pub data: MaxNvBuffer,
    /// The offset to start writing at.
    pub offset: u16,
}

impl Command for NvWrite {
    const CODE: CommandCode = CommandCode::NV_WRITE;
    const AUTH_HANDLES: usize = 1;
    const DECRYPT: bool = true;
    type Response = ();

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.auth_handle, self.nv_index])
    }

    fn write_params<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.data.to_wire(&mut w)?;
        wire::write_int(self.offset, &mut w)
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        _: &mut R,
    ) -> Result<(), wire::Error> {
        Ok(())
    }
}

/// `TPM2_StartAuthSession`.
///
/// Callers should use [`Context::start_auth_session()`], which fills in
/// the nonce and salt.
///
/// [`Context::start_auth_session()`]: crate::esys::Context::start_auth_session
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartAuthSession {
    /// The key the salt is encrypted to, or [`Handle::NONE`].
    pub tpm_key: Handle,
    /// The entity the session is bound to, or [`Handle::NONE`].
    pub bind: Handle,
    /// The caller's initial nonce.
    pub nonce_caller: Nonce,
    /// The encrypted salt; empty for unsalted sessions.
    pub encrypted_salt: EncryptedSecret,
    /// The kind of session.
    pub session_type: SessionType,
    /// The parameter encryption algorithm.
    pub symmetric: SymDef,
    /// The session's hash.
    pub auth_hash: AlgId,
}

/// The response to [`StartAuthSession`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartAuthSessionResponse {
    /// The TPM's handle for the new session.
    pub session_handle: TpmHandle,
    /// The TPM's initial nonce.
    pub nonce_tpm: Nonce,
}

impl Command for StartAuthSession {
    const CODE: CommandCode = CommandCode::START_AUTH_SESSION;
    const RESPONSE_HANDLES: usize = 1;
    const DECRYPT: bool = true;
    const ENCRYPT: bool = true;
    type Response = StartAuthSessionResponse;

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.tpm_key, self.bind])
    }

    fn write_params<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.nonce_caller.to_wire(&mut w)?;
        self.encrypted_salt.to_wire(&mut w)?;
        self.session_type.to_wire(&mut w)?;
        self.symmetric.to_wire(&mut w)?;
        self.auth_hash.to_wire(&mut w)
    }

    fn read_response<R: Read>(
        handles: &[TpmHandle],
        r: &mut R,
    ) -> Result<StartAuthSessionResponse, wire::Error> {
        let session_handle = handles.first().copied().ok_or_else(|| {
            fail!(wire::Error::OutOfRange, "missing session handle")
        })?;
        Ok(StartAuthSessionResponse {
            session_handle,
            nonce_tpm: Nonce::from_wire(r)?,
        })
    }
}

/// `TPM2_FlushContext`.
///
/// The flushed handle travels in the parameter area, so it is given as a
/// TPM handle; [`Context::flush_context()`] resolves it.
///
/// [`Context::flush_context()`]: crate::esys::Context::flush_context
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlushContext {
    /// The TPM handle of the session or transient object to flush.
    pub flush_handle: TpmHandle,
}

impl Command for FlushContext {
    const CODE: CommandCode = CommandCode::FLUSH_CONTEXT;
    const SESSIONS: bool = false;
    type Response = ();

    fn write_params<W: Write>(&self, w: W) -> Result<(), wire::Error> {
        self.flush_handle.to_wire(w)
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        _: &mut R,
    ) -> Result<(), wire::Error> {
        Ok(())
    }
}

/// `TPM2_PolicyPassword`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PolicyPassword {
    /// The policy session.
    pub policy_session: Handle,
}

impl Command for PolicyPassword {
    const CODE: CommandCode = CommandCode::POLICY_PASSWORD;
    type Response = ();

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.policy_session])
    }

    fn write_params<W: Write>(&self, _: W) -> Result<(), wire::Error> {
        Ok(())
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        _: &mut R,
    ) -> Result<(), wire::Error> {
        Ok(())
    }
}

/// `TPM2_PolicyAuthValue`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PolicyAuthValue {
    /// The policy session.
    pub policy_session: Handle,
}

impl Command for PolicyAuthValue {
    const CODE: CommandCode = CommandCode::POLICY_AUTH_VALUE;
    type Response = ();

    fn handles(&self) -> ArrayVec<Handle, MAX_HANDLES> {
        handles(&[self.policy_session])
    }

    fn write_params<W: Write>(&self, _: W) -> Result<(), wire::Error> {
        Ok(())
    }

    fn read_response<R: Read>(
        _: &[TpmHandle],
        _: &mut R,
    ) -> Result<(), wire::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn start_auth_session_params() {
        let cmd = StartAuthSession {
            tpm_key: Handle::NONE,
            bind: Handle::NONE,
            nonce_caller: Nonce::from_slice(&[0xab; 4]).unwrap(),
            encrypted_salt: EncryptedSecret::new(),
            session_type: SessionType::Hmac,
            symmetric: SymDef::AES_128_CFB,
            auth_hash: AlgId::Sha256,
        };
        let mut buf = ArrayVec::<u8, 64>::new();
        cmd.write_params(&mut buf).unwrap();

        #[rustfmt::skip]
        let expected = [
            0x00, 0x04, 0xab, 0xab, 0xab, 0xab,
            0x00, 0x00,
            0x00,
            0x00, 0x06, 0x00, 0x80, 0x00, 0x43,
            0x00, 0x0b,
        ];
        assert_eq!(&buf[..], &expected[..]);
        assert_eq!(&cmd.handles()[..], &[Handle::NONE, Handle::NONE]);

        let rsp = [0x00, 0x02, 0x12, 0x34];
        let parsed = StartAuthSession::read_response(
            &[TpmHandle(0x0200_0000)],
            &mut &rsp[..],
        )
        .unwrap();
        assert_eq!(parsed.session_handle, TpmHandle(0x0200_0000));
        assert_eq!(parsed.nonce_tpm.as_slice(), &[0x12, 0x34]);

        assert!(StartAuthSession::read_response(&[], &mut &rsp[..]).is_err());
    }

    #[test]
    fn nv_write_params() {
        let cmd = NvWrite {
            auth_handle: Handle::RH_OWNER,
            nv_index: Handle::MIN_OBJECT,
            data: MaxNvBuffer::from_slice(b"hi").unwrap(),
            offset: 3,
        };
        let mut buf = ArrayVec::<u8, 16>::new();
        cmd.write_params(&mut buf).unwrap();
        assert_eq!(&buf[..], &[0x00, 0x02, b'h', b'i', 0x00, 0x03]);
    }
}
