// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The authorization assembler.
//!
//! [`Authorizations`] is the per-command view of up to three session slots:
//! it snapshots the sessions out of the resource table, builds the outgoing
//! authorization area, and checks the incoming one. The updated session
//! state is only written back to the table once a response has verified.

use arrayvec::ArrayVec;

use crate::crypto;
use crate::crypto::cipher;
use crate::crypto::hash;
use crate::esys::command;
use crate::esys::command::MAX_SESSIONS;
use crate::esys::resource::Table;
use crate::esys::session;
use crate::esys::session::Entity;
use crate::esys::session::HashTable;
use crate::esys::session::HmacInput;
use crate::esys::session::PolicyKind;
use crate::esys::session::Session;
use crate::esys::Error;
use crate::esys::Handle;
use crate::tpm::AuthCommand;
use crate::tpm::AuthResponse;
use crate::tpm::CommandCode;
use crate::tpm::Name;
use crate::tpm::Nonce;
use crate::tpm::SessionAttr;
use crate::tpm::SessionType;
use crate::tpm::TpmHandle;
use crate::Result;

#[derive(Clone, Debug)]
enum Slot {
    Password,
    Session {
        handle: Handle,
        tpm_handle: TpmHandle,
        session: Session,
    },
}

#[derive(Clone, Debug)]
struct Entry {
    slot: Slot,
    /// The entity this slot authorizes, if any.
    entity: Option<Entity>,
}

/// Sends the plaintext auth value instead of an HMAC.
fn sends_password(session: &Session) -> bool {
    session.session_type == SessionType::Policy
        && session.policy == PolicyKind::Password
}

/// The authorization slots of one command.
#[derive(Clone, Debug, Default)]
pub struct Authorizations {
    entries: ArrayVec<Entry, MAX_SESSIONS>,
    decrypt: Option<usize>,
    encrypt: Option<usize>,
    cp: HashTable,
}

impl Authorizations {
    /// Resolves the session slots of a command.
    ///
    /// `entities` lists the command's authorization handles in order; slot
    /// `i` authorizes `entities[i]`, and slots past the end of it authorize
    /// nothing. Active slots must come first, and there must be at least
    /// `required` of them.
    pub fn resolve(
        table: &mut Table,
        sessions: [Handle; MAX_SESSIONS],
        entities: &[Entity],
        required: usize,
    ) -> Result<Self, Error> {
        let active =
            sessions.iter().take_while(|&&h| h != Handle::NONE).count();
        check!(
            sessions[active..].iter().all(|&h| h == Handle::NONE),
            Error::BadValue
        );
        check!(active >= required, Error::BadValue);

        let mut auths = Self::default();
        for (i, &handle) in sessions[..active].iter().enumerate() {
            let slot = if handle == Handle::PASSWORD {
                Slot::Password
            } else {
                let node = table.get(handle)?;
                let tpm_handle = node.tpm_handle;
                let session = node.as_session().cloned().ok_or_else(|| {
                    fail!(Error::UnknownHandle, "not a session: {:?}", handle)
                })?;
                Slot::Session {
                    handle,
                    tpm_handle,
                    session,
                }
            };
            auths.entries.push(Entry {
                slot,
                entity: entities.get(i).cloned(),
            });
        }
        Ok(auths)
    }

    /// Returns the number of active slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no slot is active.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the cpHashes computed by the last [`Authorizations::build()`].
    pub fn cp_hashes(&self) -> &HashTable {
        &self.cp
    }

    /// Returns the session slots and their current state.
    pub fn sessions(&self) -> impl Iterator<Item = (Handle, &Session)> {
        self.entries.iter().filter_map(|e| match &e.slot {
            Slot::Session {
                handle, session, ..
            } => Some((*handle, session)),
            Slot::Password => None,
        })
    }

    fn algos(&self) -> ArrayVec<hash::Algo, MAX_SESSIONS> {
        self.sessions().map(|(_, s)| s.auth_hash).collect()
    }

    /// Returns the TPM nonce of the session at `index`, if it is folded into
    /// the first slot's HMAC.
    fn folded_nonce(&self, index: Option<usize>) -> &[u8] {
        match index.filter(|&i| i > 0).map(|i| &self.entries[i].slot) {
            Some(Slot::Session { session, .. }) => session.nonce_tpm.as_slice(),
            _ => &[],
        }
    }

    /// Builds the authorization area for a command.
    ///
    /// Generates fresh caller nonces, picks the encrypt and decrypt
    /// sessions, encrypts the first parameter in `params` if asked to, and
    /// computes one authorization per active slot. `names` are the names of
    /// the command's handles; `decrypt_ok` and `encrypt_ok` say whether the
    /// command and its response start with a sized parameter.
    pub fn build(
        &mut self,
        suite: &mut dyn crypto::Suite,
        code: CommandCode,
        names: &[&Name],
        params: &mut [u8],
        decrypt_ok: bool,
        encrypt_ok: bool,
    ) -> Result<ArrayVec<AuthCommand, MAX_SESSIONS>, Error> {
        for entry in &mut self.entries {
            if let Slot::Session { session, .. } = &mut entry.slot {
                session.roll_nonce_caller(suite.csrng())?;
            }
        }

        self.decrypt = None;
        self.encrypt = None;
        for (i, entry) in self.entries.iter().enumerate() {
            let attrs = match &entry.slot {
                Slot::Session { session, .. } => session.attributes,
                Slot::Password => continue,
            };
            if attrs.contains(SessionAttr::Decrypt) {
                check!(self.decrypt.is_none(), Error::MultipleDecryptSessions);
                self.decrypt = Some(i);
            }
            if attrs.contains(SessionAttr::Encrypt) {
                check!(self.encrypt.is_none(), Error::MultipleEncryptSessions);
                self.encrypt = Some(i);
            }
        }
        check!(self.decrypt.is_none() || decrypt_ok, Error::NoDecryptParam);
        check!(self.encrypt.is_none() || encrypt_ok, Error::NoEncryptParam);

        if let Some(i) = self.decrypt {
            let entry = &self.entries[i];
            if let Slot::Session { session, .. } = &entry.slot {
                let value = session.value(entry.entity.as_ref());
                let param = command::first_sized_param(params)
                    .ok_or_else(|| fail!(Error::NoDecryptParam))?;
                session::crypt_param(
                    suite,
                    session,
                    &value,
                    cipher::Direction::Encrypt,
                    param,
                )?;
            }
        }

        self.cp = HashTable::command(
            suite.hash(),
            self.algos(),
            code,
            names,
            params,
        )?;

        // The encrypt nonce is only folded in separately from the decrypt
        // nonce when the two come from different sessions.
        let encrypt = match self.encrypt {
            e if e == self.decrypt => None,
            e => e,
        };

        let mut auths = ArrayVec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let auth_value = entry
                .entity
                .as_ref()
                .map(|e| e.auth.clone())
                .unwrap_or_default();
            let auth = match &entry.slot {
                Slot::Password => AuthCommand {
                    session_handle: TpmHandle::RS_PW,
                    nonce: Nonce::new(),
                    attributes: SessionAttr::ContinueSession.into(),
                    hmac: auth_value,
                },
                Slot::Session {
                    tpm_handle,
                    session,
                    ..
                } if sends_password(session) => AuthCommand {
                    session_handle: *tpm_handle,
                    nonce: session.nonce_caller.clone(),
                    attributes: session.attributes,
                    hmac: auth_value,
                },
                Slot::Session {
                    tpm_handle,
                    session,
                    ..
                } => {
                    let (nonce_decrypt, nonce_encrypt) = if i == 0 {
                        (
                            self.folded_nonce(self.decrypt),
                            self.folded_nonce(encrypt),
                        )
                    } else {
                        (&[][..], &[][..])
                    };
                    let p_hash = self
                        .cp
                        .get(session.auth_hash)
                        .ok_or_else(|| fail!(Error::GeneralFailure))?;
                    let value = session.value(entry.entity.as_ref());
                    let hmac = HmacInput {
                        p_hash: p_hash.as_slice(),
                        nonce_newer: session.nonce_caller.as_slice(),
                        nonce_older: session.nonce_tpm.as_slice(),
                        nonce_decrypt,
                        nonce_encrypt,
                        attributes: session.attributes,
                    }
                    .sign(suite.hash(), session.auth_hash, value.hmac_key())?;
                    AuthCommand {
                        session_handle: *tpm_handle,
                        nonce: session.nonce_caller.clone(),
                        attributes: session.attributes,
                        hmac,
                    }
                }
            };
            auths.push(auth);
        }
        Ok(auths)
    }

    /// Verifies the authorization area of a successful response, and
    /// decrypts the first parameter in `rp` if a session asked for it.
    ///
    /// On success, every session has taken on the TPM's new nonce.
    pub fn verify(
        &mut self,
        suite: &mut dyn crypto::Suite,
        code: CommandCode,
        rp: &mut [u8],
        auths: &[AuthResponse],
    ) -> Result<(), Error> {
        if self.entries.is_empty() {
            return Ok(());
        }
        check!(auths.len() == self.entries.len(), Error::ResponseAuthFailed);

        let rp_hashes =
            HashTable::response(suite.hash(), self.algos(), code, rp)?;
        for (entry, auth) in self.entries.iter_mut().zip(auths) {
            let (handle, session) = match &mut entry.slot {
                Slot::Session {
                    handle, session, ..
                } => (*handle, session),
                Slot::Password => continue,
            };

            if sends_password(session) {
                check!(auth.hmac.is_empty(), Error::ResponseAuthFailed);
            } else {
                let p_hash = rp_hashes
                    .get(session.auth_hash)
                    .ok_or_else(|| fail!(Error::GeneralFailure))?;
                let value = session.value(entry.entity.as_ref());
                HmacInput {
                    p_hash: p_hash.as_slice(),
                    nonce_newer: auth.nonce.as_slice(),
                    nonce_older: session.nonce_caller.as_slice(),
                    nonce_decrypt: &[],
                    nonce_encrypt: &[],
                    attributes: auth.attributes,
                }
                .verify(
                    suite.hash(),
                    session.auth_hash,
                    value.hmac_key(),
                    auth.hmac.as_slice(),
                )?;
            }
            // Only the nonce is taken from the response. Unlike the TSS
            // ESAPI, the attributes it echoes are deliberately not copied
            // back, so the caller's own settings stay in force.
            session.nonce_tpm = auth.nonce.clone();
            trace!(
                "nonceTPM for {:?} is now {}",
                handle,
                crate::debug::Hex(session.nonce_tpm.as_slice())
            );
        }

        if let Some(i) = self.encrypt {
            let entry = &self.entries[i];
            if let Slot::Session { session, .. } = &entry.slot {
                let value = session.value(entry.entity.as_ref());
                let param = command::first_sized_param(rp).ok_or_else(|| {
                    fail!(Error::MalformedResponse, "bad encrypted parameter")
                })?;
                session::crypt_param(
                    suite,
                    session,
                    &value,
                    cipher::Direction::Decrypt,
                    param,
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "ring", feature = "std"))]
mod test {
    use super::*;
    use crate::crypto::ring;
    use crate::esys::resource::Node;
    use crate::tpm::public::SymDef;
    use crate::tpm::Auth;
    use crate::tpm::Digest;
    use crate::tpm::SessionAttrs;
    use pretty_assertions::assert_eq;

    fn add_session(
        table: &mut Table,
        tpm_handle: u32,
        auth_hash: hash::Algo,
        attributes: SessionAttrs,
    ) -> Handle {
        let session = Session {
            session_type: SessionType::Hmac,
            auth_hash,
            symmetric: SymDef::AES_128_CFB,
            nonce_caller: Nonce::from_slice(&[0x11; 32]).unwrap(),
            nonce_tpm: Nonce::from_slice(&[tpm_handle as u8; 32]).unwrap(),
            session_key: Digest::from_slice(&[0x42; 32]).unwrap(),
            bound_entity: Name::new(),
            attributes,
            policy: PolicyKind::Hmac,
        };
        table
            .create(Node::session(TpmHandle(tpm_handle), session))
            .unwrap()
    }

    fn owner() -> Entity {
        Entity {
            name: session::handle_name(TpmHandle::RH_OWNER),
            auth: Auth::from_slice(b"owner").unwrap(),
        }
    }

    #[test]
    fn slot_feasibility() {
        let mut table = Table::new();
        let s = add_session(
            &mut table,
            0x0200_0000,
            hash::Algo::Sha256,
            session::initial_attributes(),
        );

        let err = Authorizations::resolve(
            &mut table,
            [Handle::NONE, s, Handle::NONE],
            &[],
            0,
        )
        .unwrap_err();
        assert_eq!(err.into_inner(), Error::BadValue);

        let err = Authorizations::resolve(
            &mut table,
            [Handle::NONE; 3],
            &[owner()],
            1,
        )
        .unwrap_err();
        assert_eq!(err.into_inner(), Error::BadValue);

        let err = Authorizations::resolve(
            &mut table,
            [Handle::RH_OWNER, Handle::NONE, Handle::NONE],
            &[],
            0,
        )
        .unwrap_err();
        assert_eq!(err.into_inner(), Error::UnknownHandle);

        let auths = Authorizations::resolve(
            &mut table,
            [Handle::PASSWORD, s, Handle::NONE],
            &[owner()],
            1,
        )
        .unwrap();
        assert_eq!(auths.len(), 2);
        assert_eq!(auths.sessions().count(), 1);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn no_sessions() {
        let mut suite = ring::Suite::new();
        let mut table = Table::new();
        let mut auths =
            Authorizations::resolve(&mut table, [Handle::NONE; 3], &[], 0)
                .unwrap();
        let list = auths
            .build(
                &mut suite,
                CommandCode::GET_RANDOM,
                &[],
                &mut [0x00, 0x10],
                false,
                true,
            )
            .unwrap();
        assert!(list.is_empty());
        assert!(auths.cp_hashes().is_empty());

        // Nothing to check, not even the count.
        auths
            .verify(&mut suite, CommandCode::GET_RANDOM, &mut [], &[])
            .unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn password_slot() {
        let mut suite = ring::Suite::new();
        let mut table = Table::new();
        let mut auths = Authorizations::resolve(
            &mut table,
            [Handle::PASSWORD, Handle::NONE, Handle::NONE],
            &[owner()],
            1,
        )
        .unwrap();
        let list = auths
            .build(
                &mut suite,
                CommandCode::NV_READ,
                &[],
                &mut [0, 0, 0, 0],
                false,
                true,
            )
            .unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].session_handle, TpmHandle::RS_PW);
        assert!(list[0].nonce.is_empty());
        assert_eq!(list[0].hmac.as_slice(), b"owner");
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn shared_cp_hash() {
        let mut suite = ring::Suite::new();
        let mut table = Table::new();
        let a = add_session(
            &mut table,
            0x0200_0000,
            hash::Algo::Sha256,
            session::initial_attributes(),
        );
        let b = add_session(
            &mut table,
            0x0200_0001,
            hash::Algo::Sha256,
            session::initial_attributes(),
        );

        let mut auths = Authorizations::resolve(
            &mut table,
            [a, b, Handle::NONE],
            &[owner()],
            1,
        )
        .unwrap();
        let name = owner().name;
        let list = auths
            .build(
                &mut suite,
                CommandCode::GET_RANDOM,
                &[&name],
                &mut [0x00, 0x10],
                false,
                true,
            )
            .unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(auths.cp_hashes().len(), 1);

        // Fresh caller nonces, one digest long.
        for (_, session) in auths.sessions() {
            assert_eq!(session.nonce_caller.len(), 32);
            assert_ne!(session.nonce_caller.as_slice(), &[0x11; 32][..]);
        }
        let (_, first) = auths.sessions().next().unwrap();
        assert_eq!(list[0].nonce, first.nonce_caller);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn exclusive_encryption() {
        let mut suite = ring::Suite::new();
        let mut table = Table::new();
        let attrs = SessionAttr::ContinueSession | SessionAttr::Encrypt;
        let a = add_session(&mut table, 0x0200_0000, hash::Algo::Sha256, attrs);
        let b = add_session(&mut table, 0x0200_0001, hash::Algo::Sha1, attrs);

        let mut auths =
            Authorizations::resolve(&mut table, [a, b, Handle::NONE], &[], 0)
                .unwrap();
        let err = auths
            .build(
                &mut suite,
                CommandCode::GET_RANDOM,
                &[],
                &mut [0x00, 0x10],
                false,
                true,
            )
            .unwrap_err();
        assert_eq!(err.into_inner(), Error::MultipleEncryptSessions);

        let attrs = SessionAttr::ContinueSession | SessionAttr::Decrypt;
        let c = add_session(&mut table, 0x0200_0002, hash::Algo::Sha256, attrs);
        let d = add_session(&mut table, 0x0200_0003, hash::Algo::Sha256, attrs);
        let mut auths =
            Authorizations::resolve(&mut table, [c, d, Handle::NONE], &[], 0)
                .unwrap();
        let err = auths
            .build(
                &mut suite,
                CommandCode::NV_WRITE,
                &[],
                &mut [0x00, 0x01, 0xaa, 0x00, 0x00],
                true,
                false,
            )
            .unwrap_err();
        assert_eq!(err.into_inner(), Error::MultipleDecryptSessions);

        // Decryption requested for a command without a sized parameter.
        let sessions = [c, Handle::NONE, Handle::NONE];
        let mut auths =
            Authorizations::resolve(&mut table, sessions, &[], 0).unwrap();
        let err = auths
            .build(
                &mut suite,
                CommandCode::GET_RANDOM,
                &[],
                &mut [0x00, 0x10],
                false,
                true,
            )
            .unwrap_err();
        assert_eq!(err.into_inner(), Error::NoDecryptParam);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn first_slot_folds_decrypt_nonce() {
        let mut suite = ring::Suite::new();
        let mut table = Table::new();
        let a = add_session(
            &mut table,
            0x0200_0000,
            hash::Algo::Sha256,
            session::initial_attributes(),
        );
        let b = add_session(
            &mut table,
            0x0200_0001,
            hash::Algo::Sha256,
            SessionAttr::ContinueSession | SessionAttr::Decrypt,
        );

        let mut auths =
            Authorizations::resolve(&mut table, [a, b, Handle::NONE], &[], 0)
                .unwrap();
        let mut params = [0x00, 0x02, 0xaa, 0xbb];
        let list = auths
            .build(
                &mut suite,
                CommandCode::NV_WRITE,
                &[],
                &mut params,
                true,
                false,
            )
            .unwrap();
        assert_ne!(&params[2..], &[0xaa, 0xbb]);

        let sessions: Vec<_> =
            auths.sessions().map(|(_, s)| s.clone()).collect();
        let p_hash = auths.cp_hashes().get(hash::Algo::Sha256).unwrap();
        let folded = HmacInput {
            p_hash: p_hash.as_slice(),
            nonce_newer: sessions[0].nonce_caller.as_slice(),
            nonce_older: sessions[0].nonce_tpm.as_slice(),
            nonce_decrypt: sessions[1].nonce_tpm.as_slice(),
            nonce_encrypt: &[],
            attributes: sessions[0].attributes,
        }
        .sign(suite.hash(), hash::Algo::Sha256, &[0x42; 32])
        .unwrap();
        assert_eq!(list[0].hmac, folded);

        let unfolded = HmacInput {
            p_hash: p_hash.as_slice(),
            nonce_newer: sessions[1].nonce_caller.as_slice(),
            nonce_older: sessions[1].nonce_tpm.as_slice(),
            nonce_decrypt: &[],
            nonce_encrypt: &[],
            attributes: sessions[1].attributes,
        }
        .sign(suite.hash(), hash::Algo::Sha256, &[0x42; 32])
        .unwrap();
        assert_eq!(list[1].hmac, unfolded);
    }

    #[test]
    #[cfg_attr(miri, ignore)]
    fn response_count_mismatch() {
        let mut suite = ring::Suite::new();
        let mut table = Table::new();
        let a = add_session(
            &mut table,
            0x0200_0000,
            hash::Algo::Sha256,
            session::initial_attributes(),
        );
        let sessions = [a, Handle::NONE, Handle::NONE];
        let mut auths =
            Authorizations::resolve(&mut table, sessions, &[], 0).unwrap();
        auths
            .build(
                &mut suite,
                CommandCode::GET_RANDOM,
                &[],
                &mut [0x00, 0x10],
                false,
                true,
            )
            .unwrap();
        let err = auths
            .verify(&mut suite, CommandCode::GET_RANDOM, &mut [0, 0], &[])
            .unwrap_err();
        assert_eq!(err.into_inner(), Error::ResponseAuthFailed);
    }
}
