// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The command execution state machine.

use arrayvec::ArrayVec;

use crate::crypto;
use crate::crypto::csrng::CsrngExt as _;
use crate::crypto::hash;
use crate::esys::auth::Authorizations;
use crate::esys::command;
use crate::esys::command::Command;
use crate::esys::command::MAX_HANDLES;
use crate::esys::command::MAX_SESSIONS;
use crate::esys::commands;
use crate::esys::options::MAX_COMMAND_SIZE;
use crate::esys::resource::Kind;
use crate::esys::resource::Node;
use crate::esys::resource::Table;
use crate::esys::session;
use crate::esys::session::Entity;
use crate::esys::session::PolicyKind;
use crate::esys::session::Salt;
use crate::esys::session::Session;
use crate::esys::Error;
use crate::esys::Handle;
use crate::esys::Options;
use crate::tpm::public::SymDef;
use crate::tpm::AlgId;
use crate::tpm::CommandCode;
use crate::tpm::Digest;
use crate::tpm::EncryptedSecret;
use crate::tpm::Name;
use crate::tpm::Nonce;
use crate::tpm::SessionType;
use crate::tpm::TpmHandle;
use crate::transport;
use crate::transport::Timeout;
use crate::transport::Transport;
use crate::Result;

/// The state of a [`Context`]'s command cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum State {
    /// No command is in flight.
    Idle,
    /// A command has been transmitted; its response has not been received.
    Sent,
    /// The TPM asked for the command in flight to be submitted again; the
    /// next `_finish` call does so.
    Resubmission,
    /// The last command failed in a way that left no command in flight.
    /// Only a new `_async` call is permitted.
    InternalError,
}

/// Work to do once a command completes.
#[derive(Clone, Debug)]
pub(super) enum Followup {
    None,
    /// A node created for the command, to close if it fails.
    Created(Handle),
    /// The inputs of a new session, to derive its key from.
    Session(SessionSetup),
    /// A policy session whose sub-kind changes.
    Policy(Handle, PolicyKind),
    /// A node to close.
    Flush(Handle),
}

#[derive(Clone, Debug)]
pub(super) struct SessionSetup {
    salt: Option<Digest>,
    bind: Option<Entity>,
    session_type: SessionType,
    symmetric: SymDef,
    auth_hash: hash::Algo,
    nonce_caller: Nonce,
}

/// Everything needed to (re)build a command in flight.
struct Pending {
    code: CommandCode,
    handles: ArrayVec<Handle, MAX_HANDLES>,
    auth_handles: usize,
    sessions: [Handle; MAX_SESSIONS],
    decrypt: bool,
    encrypt: bool,
    /// The parameter area, in the clear.
    params: ArrayVec<u8, MAX_COMMAND_SIZE>,
    auths: Authorizations,
    followup: Followup,
}

/// An execution context: a connection to a TPM plus the resources known
/// through it.
///
/// A context runs one command at a time. Each command is started with an
/// `_async` function and completed with the matching `_finish` function;
/// calling them out of order is [`Error::BadSequence`]. The functions with
/// neither suffix do both, blocking until the response arrives.
pub struct Context<T, C> {
    transport: T,
    pub(super) crypto: C,
    options: Options,
    pub(super) table: Table,
    state: State,
    submissions: u32,
    timeout: Timeout,
    pending: Option<Pending>,
    cmd: ArrayVec<u8, MAX_COMMAND_SIZE>,
    rsp: [u8; MAX_COMMAND_SIZE],
}

impl<T: Transport, C: crypto::Suite> Context<T, C> {
    /// Creates a new context over `transport`.
    pub fn new(transport: T, crypto: C, options: Options) -> Self {
        Self {
            transport,
            crypto,
            timeout: options.timeout,
            options,
            table: Table::new(),
            state: State::Idle,
            submissions: 0,
            pending: None,
            cmd: ArrayVec::new(),
            rsp: [0; MAX_COMMAND_SIZE],
        }
    }

    /// Tears down every resource and returns the transport and crypto
    /// suite.
    ///
    /// Nothing is flushed on the TPM.
    pub fn finalize(mut self) -> (T, C) {
        self.table.teardown();
        (self.transport, self.crypto)
    }

    /// Returns the current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns how many times the last command has been submitted.
    pub fn submissions(&self) -> u32 {
        self.submissions
    }

    /// Returns the timeout `_finish` functions wait for.
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Sets the timeout `_finish` functions wait for.
    ///
    /// With a timeout other than [`Timeout::Forever`], a `_finish` function
    /// may report [`Error::TryAgain`] and must then be called again.
    pub fn set_timeout(&mut self, timeout: Timeout) {
        self.timeout = timeout;
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the transport, mutably.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Returns the crypto suite.
    pub fn crypto(&mut self) -> &mut C {
        &mut self.crypto
    }

    /// Asks the transport to cancel the command in flight.
    ///
    /// The command must still be completed with its `_finish` function.
    pub fn cancel(&mut self) -> Result<(), Error> {
        check!(self.state == State::Sent, Error::BadSequence);
        self.transport.cancel()?;
        Ok(())
    }

    pub(super) fn check_submittable(&self) -> Result<(), Error> {
        check!(self.state != State::Sent, Error::BadSequence);
        Ok(())
    }

    fn take_pending(&mut self) -> Result<Pending, Error> {
        self.pending
            .take()
            .ok_or_else(|| fail!(Error::GeneralFailure, "no pending command"))
    }

    /// Ends the command in flight unsuccessfully.
    fn abort(&mut self, pending: Pending, state: State) {
        self.state = state;
        if let Followup::Created(handle) = pending.followup {
            trace!("rolling back {:?}", handle);
            let _ = self.table.close(handle);
        }
    }

    /// Resolves handles and sessions, authorizes the command, and sends it.
    fn transmit(&mut self, pending: &mut Pending) -> Result<(), Error> {
        let mut tpm_handles = ArrayVec::<TpmHandle, MAX_HANDLES>::new();
        let mut names = ArrayVec::<Name, MAX_HANDLES>::new();
        let mut entities = ArrayVec::<Entity, MAX_HANDLES>::new();
        for (i, &handle) in pending.handles.iter().enumerate() {
            let node = if i < pending.auth_handles {
                Some(self.table.get(handle)?)
            } else {
                self.table.lookup(handle)?
            };
            let (tpm_handle, name) = match node {
                Some(node) => {
                    if i < pending.auth_handles {
                        entities.push(Entity {
                            name: node.name.clone(),
                            auth: node.auth.clone(),
                        });
                    }
                    (node.tpm_handle, node.name.clone())
                }
                None => (
                    TpmHandle::RH_NULL,
                    session::handle_name(TpmHandle::RH_NULL),
                ),
            };
            tpm_handles.push(tpm_handle);
            names.push(name);
        }

        let mut auths = Authorizations::resolve(
            &mut self.table,
            pending.sessions,
            &entities,
            pending.auth_handles,
        )?;
        let mut params = pending.params.clone();
        let name_refs = names.iter().collect::<ArrayVec<&Name, MAX_HANDLES>>();
        let list = auths.build(
            &mut self.crypto,
            pending.code,
            &name_refs,
            &mut params,
            pending.decrypt,
            pending.encrypt,
        )?;

        command::write_command(
            &mut self.cmd,
            pending.code,
            &tpm_handles,
            &list,
            &params,
        )?;
        check!(
            self.cmd.len() <= self.options.max_command_size,
            Error::BadSize
        );

        trace!(
            "sending {:?}: {} bytes, {} sessions",
            pending.code,
            self.cmd.len(),
            list.len()
        );
        self.transport.transmit(&self.cmd)?;
        pending.auths = auths;
        Ok(())
    }

    fn prepare<Cmd: Command>(
        &mut self,
        cmd: &Cmd,
        pending: &mut Pending,
    ) -> Result<(), Error> {
        if !Cmd::SESSIONS {
            check!(
                pending.sessions.iter().all(|&h| h == Handle::NONE),
                Error::BadValue
            );
        }
        cmd.write_params(&mut pending.params)?;
        self.transmit(pending)
    }

    /// Starts a command, leaving it in flight.
    pub(super) fn submit<Cmd: Command>(
        &mut self,
        cmd: &Cmd,
        sessions: [Handle; MAX_SESSIONS],
        followup: Followup,
    ) -> Result<(), Error> {
        self.check_submittable()?;
        // Resubmissions are sent by `finish`, so a command still awaiting
        // one is being abandoned.
        if let Some(stale) = self.pending.take() {
            info!("abandoning {:?} before resubmission", stale.code);
            self.abort(stale, State::Idle);
        }
        self.submissions = 1;

        let mut pending = Pending {
            code: Cmd::CODE,
            handles: cmd.handles(),
            auth_handles: Cmd::AUTH_HANDLES,
            sessions,
            decrypt: Cmd::DECRYPT,
            encrypt: Cmd::ENCRYPT,
            params: ArrayVec::new(),
            auths: Authorizations::default(),
            followup,
        };
        match self.prepare(cmd, &mut pending) {
            Ok(()) => {
                self.pending = Some(pending);
                self.state = State::Sent;
                Ok(())
            }
            Err(e) => {
                self.abort(pending, State::InternalError);
                Err(e)
            }
        }
    }

    /// Parses and verifies a successful response in `buf`.
    fn complete<Cmd: Command>(
        crypto: &mut C,
        buf: &mut [u8],
        pending: &mut Pending,
    ) -> Result<Cmd::Response, Error> {
        let parsed = command::parse_response(buf, Cmd::RESPONSE_HANDLES)?;
        pending.auths.verify(
            crypto,
            Cmd::CODE,
            &mut buf[parsed.params.clone()],
            &parsed.auths,
        )?;

        let mut r = &buf[parsed.params];
        let rsp = Cmd::read_response(&parsed.handles, &mut r).map_err(|_| {
            fail!(
                Error::MalformedResponse,
                "could not parse {:?} response",
                Cmd::CODE
            )
        })?;
        check!(r.is_empty(), Error::MalformedResponse);
        Ok(rsp)
    }

    /// Completes the command in flight, returning its response and the
    /// work left to do for it.
    pub(super) fn finish<Cmd: Command>(
        &mut self,
    ) -> Result<(Cmd::Response, Followup), Error> {
        match (self.state, &self.pending) {
            (State::Sent | State::Resubmission, Some(p))
                if p.code == Cmd::CODE => {}
            _ => {
                return Err(fail!(
                    Error::BadSequence,
                    "no {:?} in flight (state: {:?})",
                    Cmd::CODE,
                    self.state
                ))
            }
        }

        if self.state == State::Resubmission {
            let mut pending = self.take_pending()?;
            self.submissions += 1;
            info!(
                "resubmitting {:?}, attempt {}",
                pending.code, self.submissions
            );
            if let Err(e) = self.transmit(&mut pending) {
                self.abort(pending, State::InternalError);
                return Err(e);
            }
            self.pending = Some(pending);
            self.state = State::Sent;
        }

        let len = match self.transport.receive(&mut self.rsp, self.timeout) {
            Ok(len) => len,
            Err(e) if *e.as_ref() == transport::Error::TryAgain => {
                return Err(soft_fail!(Error::TryAgain))
            }
            Err(e) => {
                let pending = self.take_pending()?;
                self.abort(pending, State::InternalError);
                return Err(e.into());
            }
        };
        let mut pending = self.take_pending()?;

        let rc = match command::response_code(&self.rsp[..len]) {
            Ok(rc) => rc,
            Err(e) => {
                self.abort(pending, State::InternalError);
                return Err(e);
            }
        };
        if rc.is_transient() {
            if self.submissions >= self.options.max_submissions {
                warn!(
                    "{:?} still {} after {} submissions",
                    pending.code, rc, self.submissions
                );
                self.abort(pending, State::Idle);
                return Err(fail!(Error::Device(rc)));
            }
            info!("{:?} returned {}", pending.code, rc);
            self.pending = Some(pending);
            self.state = State::Resubmission;
            return Err(soft_fail!(Error::TryAgain));
        }

        let result = Self::complete::<Cmd>(
            &mut self.crypto,
            &mut self.rsp[..len],
            &mut pending,
        );
        match result {
            Ok(rsp) => {
                self.state = State::Idle;
                for (handle, session) in pending.auths.sessions() {
                    *self.table.session(handle)? = session.clone();
                }
                Ok((rsp, pending.followup))
            }
            Err(e) => {
                let state = match e.as_ref() {
                    Error::Device(_) => State::Idle,
                    _ => State::InternalError,
                };
                self.abort(pending, state);
                Err(e)
            }
        }
    }

    /// Calls `finish` until it stops asking to be called again, waiting
    /// for responses as long as it takes.
    pub(super) fn block_on<R>(
        &mut self,
        mut finish: impl FnMut(&mut Self) -> Result<R, Error>,
    ) -> Result<R, Error> {
        let timeout = self.timeout;
        self.timeout = Timeout::Forever;
        let result = loop {
            match finish(self) {
                Err(e) if e.is_try_again() => continue,
                result => break result,
            }
        };
        self.timeout = timeout;
        result
    }

    /// Starts an arbitrary command, authorized by `sessions`.
    ///
    /// Commands that create or change resources have dedicated functions,
    /// such as [`Context::start_auth_session_async()`], which should be used
    /// instead so the resource table stays in sync.
    pub fn execute_async<Cmd: Command>(
        &mut self,
        cmd: &Cmd,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<(), Error> {
        self.submit(cmd, sessions, Followup::None)
    }

    /// Completes a command started with [`Context::execute_async()`].
    pub fn execute_finish<Cmd: Command>(
        &mut self,
    ) -> Result<Cmd::Response, Error> {
        self.finish::<Cmd>().map(|(rsp, _)| rsp)
    }

    /// Runs an arbitrary command to completion.
    pub fn execute<Cmd: Command>(
        &mut self,
        cmd: &Cmd,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<Cmd::Response, Error> {
        self.execute_async(cmd, sessions)?;
        self.block_on(Self::execute_finish::<Cmd>)
    }

    /// Starts a new session.
    ///
    /// If `tpm_key` is not [`Handle::NONE`], the session is salted with a
    /// secret encrypted to that key, whose public area must be known. If
    /// `bind` is not [`Handle::NONE`], the session is bound to that entity,
    /// whose auth value must already be set.
    pub fn start_auth_session_async(
        &mut self,
        tpm_key: Handle,
        bind: Handle,
        sessions: [Handle; MAX_SESSIONS],
        session_type: SessionType,
        symmetric: SymDef,
        auth_hash: hash::Algo,
    ) -> Result<(), Error> {
        self.check_submittable()?;

        let salt = match self.table.lookup(tpm_key)? {
            None => None,
            Some(Node {
                kind: Kind::Object(public),
                ..
            }) => Some(Salt::new(&mut self.crypto, public)?),
            Some(_) => {
                return Err(fail!(
                    Error::BadValue,
                    "salt key {:?} has no public area",
                    tpm_key
                ))
            }
        };
        let bind_entity = self.table.lookup(bind)?.map(|node| Entity {
            name: node.name.clone(),
            auth: node.auth.clone(),
        });

        let nonce_caller =
            self.crypto.csrng().random_digest(auth_hash.bytes())?;

        let (salt, encrypted_salt) = match salt {
            Some(salt) => (Some(salt.salt), salt.encrypted),
            None => (None, EncryptedSecret::new()),
        };
        let cmd = commands::StartAuthSession {
            tpm_key,
            bind,
            nonce_caller: nonce_caller.clone(),
            encrypted_salt,
            session_type,
            symmetric,
            auth_hash: AlgId::from(auth_hash),
        };
        let setup = SessionSetup {
            salt,
            bind: bind_entity,
            session_type,
            symmetric,
            auth_hash,
            nonce_caller,
        };
        self.submit(&cmd, sessions, Followup::Session(setup))
    }

    /// Completes [`Context::start_auth_session_async()`], returning the
    /// handle of the new session.
    pub fn start_auth_session_finish(&mut self) -> Result<Handle, Error> {
        let (rsp, followup) = self.finish::<commands::StartAuthSession>()?;
        let setup = match followup {
            Followup::Session(setup) => setup,
            _ => return Err(fail!(Error::GeneralFailure)),
        };

        let session_key = session::session_key(
            self.crypto.hash(),
            setup.auth_hash,
            setup.bind.as_ref().map(|e| &e.auth),
            setup.salt.as_ref(),
            &rsp.nonce_tpm,
            &setup.nonce_caller,
        )?;
        let bound_entity = setup
            .bind
            .as_ref()
            .map(|e| session::bound_entity(&e.name, &e.auth))
            .unwrap_or_default();

        let session = Session {
            session_type: setup.session_type,
            auth_hash: setup.auth_hash,
            symmetric: setup.symmetric,
            nonce_caller: setup.nonce_caller,
            nonce_tpm: rsp.nonce_tpm,
            session_key,
            bound_entity,
            attributes: session::initial_attributes(),
            policy: PolicyKind::Hmac,
        };
        info!(
            "started {:?} session {:?} (salted: {}, bound: {}, key: {})",
            session.session_type,
            rsp.session_handle,
            setup.salt.is_some(),
            !session.bound_entity.is_empty(),
            crate::debug::Redacted(session.session_key.as_slice()),
        );
        self.table.create(Node::session(rsp.session_handle, session))
    }

    /// Starts a new session and waits for it.
    ///
    /// See [`Context::start_auth_session_async()`].
    pub fn start_auth_session(
        &mut self,
        tpm_key: Handle,
        bind: Handle,
        sessions: [Handle; MAX_SESSIONS],
        session_type: SessionType,
        symmetric: SymDef,
        auth_hash: hash::Algo,
    ) -> Result<Handle, Error> {
        self.start_auth_session_async(
            tpm_key,
            bind,
            sessions,
            session_type,
            symmetric,
            auth_hash,
        )?;
        self.block_on(Self::start_auth_session_finish)
    }

    /// Starts flushing a session or transient object from the TPM.
    pub fn flush_context_async(&mut self, handle: Handle) -> Result<(), Error> {
        self.check_submittable()?;
        let flush_handle = self.table.get(handle)?.tpm_handle;
        self.submit(
            &commands::FlushContext { flush_handle },
            [Handle::NONE; MAX_SESSIONS],
            Followup::Flush(handle),
        )
    }

    /// Completes [`Context::flush_context_async()`], closing the flushed
    /// handle.
    pub fn flush_context_finish(&mut self) -> Result<(), Error> {
        let ((), followup) = self.finish::<commands::FlushContext>()?;
        if let Followup::Flush(handle) = followup {
            self.table.close(handle)?;
        }
        Ok(())
    }

    /// Flushes a session or transient object from the TPM, and closes its
    /// handle.
    pub fn flush_context(&mut self, handle: Handle) -> Result<(), Error> {
        self.flush_context_async(handle)?;
        self.block_on(Self::flush_context_finish)
    }

    /// Starts `TPM2_PolicyPassword` on `policy_session`.
    pub fn policy_password_async(
        &mut self,
        policy_session: Handle,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<(), Error> {
        self.submit(
            &commands::PolicyPassword { policy_session },
            sessions,
            Followup::Policy(policy_session, PolicyKind::Password),
        )
    }

    /// Completes [`Context::policy_password_async()`]. From now on, the
    /// policy session authorizes with the plaintext auth value.
    pub fn policy_password_finish(&mut self) -> Result<(), Error> {
        let ((), followup) = self.finish::<commands::PolicyPassword>()?;
        self.apply_policy(followup)
    }

    /// Runs `TPM2_PolicyPassword` on `policy_session`.
    pub fn policy_password(
        &mut self,
        policy_session: Handle,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<(), Error> {
        self.policy_password_async(policy_session, sessions)?;
        self.block_on(Self::policy_password_finish)
    }

    /// Starts `TPM2_PolicyAuthValue` on `policy_session`.
    pub fn policy_auth_value_async(
        &mut self,
        policy_session: Handle,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<(), Error> {
        self.submit(
            &commands::PolicyAuthValue { policy_session },
            sessions,
            Followup::Policy(policy_session, PolicyKind::AuthValue),
        )
    }

    /// Completes [`Context::policy_auth_value_async()`]. From now on, the
    /// policy session's HMACs include the auth value, even if it is bound.
    pub fn policy_auth_value_finish(&mut self) -> Result<(), Error> {
        let ((), followup) = self.finish::<commands::PolicyAuthValue>()?;
        self.apply_policy(followup)
    }

    /// Runs `TPM2_PolicyAuthValue` on `policy_session`.
    pub fn policy_auth_value(
        &mut self,
        policy_session: Handle,
        sessions: [Handle; MAX_SESSIONS],
    ) -> Result<(), Error> {
        self.policy_auth_value_async(policy_session, sessions)?;
        self.block_on(Self::policy_auth_value_finish)
    }

    fn apply_policy(&mut self, followup: Followup) -> Result<(), Error> {
        if let Followup::Policy(handle, kind) = followup {
            self.table.session(handle)?.policy = kind;
        }
        Ok(())
    }

    /// Abandons the command in flight after a failure detected past its
    /// response, such as a name mismatch.
    pub(super) fn fail_followup(&mut self, followup: Followup) {
        self.state = State::InternalError;
        if let Followup::Created(handle) = followup {
            let _ = self.table.close(handle);
        }
    }

    pub(super) fn pending_code(&self) -> Option<CommandCode> {
        self.pending.as_ref().map(|p| p.code)
    }
}
