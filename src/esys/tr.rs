// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Resource ("TR") operations on a [`Context`].

use crate::crypto;
use crate::esys::command::MAX_SESSIONS;
use crate::esys::commands;
use crate::esys::context::Followup;
use crate::esys::resource::Kind;
use crate::esys::resource::Node;
use crate::esys::session;
use crate::esys::Context;
use crate::esys::Error;
use crate::esys::Handle;
use crate::io::Write;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::Auth;
use crate::tpm::CommandCode;
use crate::tpm::Name;
use crate::tpm::Nonce;
use crate::tpm::SessionAttrs;
use crate::tpm::TpmHandle;
use crate::transport::Transport;
use crate::Result;

impl<T: Transport, C: crypto::Suite> Context<T, C> {
    /// Sets the auth value used when `handle` is authorized, or clears it if
    /// `auth` is `None`.
    pub fn tr_set_auth(
        &mut self,
        handle: Handle,
        auth: Option<&[u8]>,
    ) -> Result<(), Error> {
        let auth = match auth {
            Some(auth) => Auth::from_slice(auth).ok_or_else(|| {
                fail!(Error::BadSize, "auth value too long: {}", auth.len())
            })?,
            None => Auth::new(),
        };
        trace!(
            "auth for {:?} set to {}",
            handle,
            crate::debug::Redacted(auth.as_slice())
        );
        self.table.get(handle)?.auth = auth;
        Ok(())
    }

    /// Returns the name of `handle`.
    ///
    /// Objects and NV indices are named after their public area; everything
    /// else after its TPM handle.
    pub fn tr_get_name(&mut self, handle: Handle) -> Result<Name, Error> {
        let node = self.table.get(handle)?;
        match &node.kind {
            Kind::Object(public) => {
                session::object_name(self.crypto.hash(), public)
            }
            Kind::Nv(public) => session::nv_name(self.crypto.hash(), public),
            _ => Ok(node.name.clone()),
        }
    }

    /// Forgets about `handle`, without telling the TPM.
    pub fn tr_close(&mut self, handle: Handle) -> Result<(), Error> {
        self.table.close(handle)?;
        Ok(())
    }

    /// Writes out the metadata of `handle`, so that it can be restored with
    /// [`Context::tr_deserialize()`], possibly in another context.
    ///
    /// The auth value is not included.
    pub fn tr_serialize<W: Write>(
        &mut self,
        handle: Handle,
        w: W,
    ) -> Result<(), Error> {
        self.table.get(handle)?.to_wire(w)?;
        Ok(())
    }

    /// Restores metadata written by [`Context::tr_serialize()`] under a new
    /// handle.
    pub fn tr_deserialize(
        &mut self,
        mut bytes: &[u8],
    ) -> Result<Handle, Error> {
        let node = Node::from_wire(&mut bytes)?;
        check!(bytes.is_empty(), Error::BadValue);
        self.table.create(node)
    }

    /// Returns the attributes a session sends with its next command.
    pub fn trsess_get_attributes(
        &mut self,
        session: Handle,
    ) -> Result<SessionAttrs, Error> {
        Ok(self.table.session(session)?.attributes)
    }

    /// Updates the attributes in `mask` to their values in `flags`.
    pub fn trsess_set_attributes(
        &mut self,
        session: Handle,
        flags: SessionAttrs,
        mask: SessionAttrs,
    ) -> Result<(), Error> {
        let session = self.table.session(session)?;
        session.attributes = (session.attributes & !mask) | (flags & mask);
        Ok(())
    }

    /// Returns the last nonce the TPM returned for a session.
    pub fn trsess_get_nonce_tpm(
        &mut self,
        session: Handle,
    ) -> Result<Nonce, Error> {
        Ok(self.table.session(session)?.nonce_tpm.clone())
    }

    /// Starts creating a handle for an entity already present on the TPM,
    /// by reading its public area.
    pub fn tr_from_tpm_public_async(
        &mut self,
        tpm_handle: TpmHandle,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<(), Error> {
        self.check_submittable()?;

        let mut node = Node::new(tpm_handle);
        node.name = session::handle_name(tpm_handle);
        let handle = self.table.create(node)?;
        let followup = Followup::Created(handle);
        if tpm_handle.is_nv_index() {
            self.submit(
                &commands::NvReadPublic { nv_index: handle },
                sessions,
                followup,
            )
        } else {
            self.submit(
                &commands::ReadPublic { object: handle },
                sessions,
                followup,
            )
        }
    }

    /// Completes [`Context::tr_from_tpm_public_async()`].
    ///
    /// The name the TPM reports must match the one computed from the public
    /// area it returned; if it does not, the response is
    /// [`Error::MalformedResponse`] and no handle is created.
    pub fn tr_from_tpm_public_finish(&mut self) -> Result<Handle, Error> {
        let (name, kind, followup) = match self.pending_code() {
            Some(CommandCode::NV_READ_PUBLIC) => {
                let (rsp, followup) =
                    self.finish::<commands::NvReadPublic>()?;
                let ours =
                    session::nv_name(self.crypto.hash(), &rsp.nv_public);
                let name = ours.map(|n| (n, rsp.nv_name));
                (name, Kind::Nv(rsp.nv_public), followup)
            }
            _ => {
                let (rsp, followup) = self.finish::<commands::ReadPublic>()?;
                let ours =
                    session::object_name(self.crypto.hash(), &rsp.out_public);
                let name = ours.map(|n| (n, rsp.name));
                (name, Kind::Object(rsp.out_public), followup)
            }
        };

        let handle = match followup {
            Followup::Created(handle) => handle,
            _ => return Err(fail!(Error::GeneralFailure)),
        };
        let name = match name {
            Ok((ours, theirs)) if ours == theirs => ours,
            Ok(_) => {
                self.fail_followup(followup);
                return Err(fail!(
                    Error::MalformedResponse,
                    "name mismatch for {:?}",
                    handle
                ));
            }
            Err(e) => {
                self.fail_followup(followup);
                return Err(e);
            }
        };

        let node = self.table.get(handle)?;
        node.name = name;
        node.kind = kind;
        Ok(handle)
    }

    /// Creates a handle for an entity already present on the TPM.
    pub fn tr_from_tpm_public(
        &mut self,
        tpm_handle: TpmHandle,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<Handle, Error> {
        self.tr_from_tpm_public_async(tpm_handle, sessions)?;
        self.block_on(Self::tr_from_tpm_public_finish)
    }
}
