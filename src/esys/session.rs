// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! Session state and the cryptography built on it.
//!
//! Everything in this module is a pure function of session state and
//! command or response bytes; the only side effects are calls into a
//! [`crypto::Suite`].
//!
//! # Session values
//!
//! A session authorizing an entity with auth value `A` uses
//! `sessionValue := sessionKey ‖ A` as its key material. Parameter
//! encryption always keys off of the whole value, but HMACs only use the
//! first `hmac_len` bytes of it: if the session is *bound* to the entity it
//! is authorizing, `A` is left out, unless `PolicyAuthValue` was executed
//! on the session.
//!
//! # Authorization HMACs
//!
//! For both commands and responses, a session's HMAC is
//!
//! ```text
//! HMAC(sessionValue[..hmac_len],
//!      pHash ‖ nonceNewer ‖ nonceOlder ‖ nonceDecrypt ‖ nonceEncrypt ‖ attrs)
//! ```
//!
//! where `pHash` is the session's entry in the [`HashTable`]. For commands,
//! the newer nonce is the caller's; for responses, the TPM's. The decrypt
//! and encrypt nonces are only present in the first session's command HMAC,
//! and only when another session does parameter encryption.

use arrayvec::ArrayVec;

use crate::crypto;
use crate::crypto::cipher;
use crate::crypto::csrng::CsrngExt as _;
use crate::crypto::hash;
use crate::crypto::hash::EngineExt as _;
use crate::crypto::kdf;
use crate::crypto::oaep;
use crate::esys::Error;
use crate::io::Read;
use crate::io::Write;
use crate::tpm::buf::MAX_DIGEST_SIZE;
use crate::tpm::buf::NAME_SIZE;
use crate::tpm::public::EccPoint;
use crate::tpm::public::NvPublic;
use crate::tpm::public::Parameters;
use crate::tpm::public::Public;
use crate::tpm::public::SymDef;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::AlgId;
use crate::tpm::Auth;
use crate::tpm::CommandCode;
use crate::tpm::Digest;
use crate::tpm::EccParameter;
use crate::tpm::EncryptedSecret;
use crate::tpm::Name;
use crate::tpm::Nonce;
use crate::tpm::SessionAttr;
use crate::tpm::SessionAttrs;
use crate::tpm::SessionType;
use crate::tpm::TpmHandle;
use crate::Result;

/// KDFa label for session keys.
pub const LABEL_ATH: &[u8] = b"ATH";
/// KDFa label for AES-CFB parameter encryption.
pub const LABEL_CFB: &[u8] = b"CFB";
/// KDFa label for XOR parameter obfuscation.
pub const LABEL_XOR: &[u8] = b"XOR";
/// KDF label for salts.
pub const LABEL_SECRET: &[u8] = b"SECRET";

/// The OAEP label for RSA-encrypted salts, which includes its terminating
/// zero.
const OAEP_LABEL_SECRET: &[u8] = b"SECRET\0";

/// The RSA exponent a public area with an exponent of zero stands for.
const DEFAULT_RSA_EXPONENT: u32 = 65537;

wire_enum! {
    /// What a policy session's command HMACs are keyed with, as set by the
    /// last policy assertion executed on it.
    pub enum PolicyKind: u8 {
        /// Regular HMAC rules apply.
        Hmac = 0x00,
        /// `PolicyPassword`: the plaintext auth value is sent instead of an
        /// HMAC.
        Password = 0x01,
        /// `PolicyAuthValue`: the auth value is always part of the HMAC key,
        /// even for bound sessions.
        AuthValue = 0x02,
    }
}

/// The client-side state of an HMAC, policy or trial session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// The kind of session.
    pub session_type: SessionType,
    /// The hash used for every HMAC and KDF of this session.
    pub auth_hash: hash::Algo,
    /// The parameter encryption algorithm.
    pub symmetric: SymDef,
    /// The last nonce generated by the caller.
    pub nonce_caller: Nonce,
    /// The last nonce returned by the TPM.
    pub nonce_tpm: Nonce,
    /// The key established when the session was started.
    pub session_key: Digest,
    /// The [`bound_entity()`] of the bind object; empty for unbound
    /// sessions.
    pub bound_entity: Name,
    /// The attributes sent with the next command.
    pub attributes: SessionAttrs,
    /// The policy sub-kind; always [`PolicyKind::Hmac`] for HMAC sessions.
    pub policy: PolicyKind,
}

impl Session {
    /// Returns whether this session is bound to the entity with the given
    /// name and auth value.
    pub fn is_bound_to(&self, name: &Name, auth: &Auth) -> bool {
        !self.bound_entity.is_empty()
            && self.bound_entity == bound_entity(name, auth)
    }

    /// Computes the session value for authorizing `object`, or for a slot
    /// with no entity to authorize if `object` is `None`.
    pub fn value(&self, object: Option<&Entity>) -> SessionValue {
        let mut value = SessionValue {
            bytes: ArrayVec::new(),
            hmac_len: self.session_key.len(),
        };
        value.bytes.extend(self.session_key.as_slice().iter().copied());

        let object = match object {
            Some(object) => object,
            None => return value,
        };
        if !matches!(self.session_type, SessionType::Hmac | SessionType::Policy)
        {
            return value;
        }

        value.bytes.extend(object.auth.as_slice().iter().copied());
        let bound = self.is_bound_to(&object.name, &object.auth);
        if !bound || self.policy == PolicyKind::AuthValue {
            value.hmac_len = value.bytes.len();
        }
        value
    }

    /// Replaces the caller nonce with fresh random bytes, as many as the
    /// session hash's digest.
    pub fn roll_nonce_caller(
        &mut self,
        csrng: &mut dyn crypto::csrng::Csrng,
    ) -> Result<(), Error> {
        self.nonce_caller = csrng.random_digest(self.auth_hash.bytes())?;
        Ok(())
    }
}

impl FromWire for Session {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let session_type = SessionType::from_wire(r)?;
        let auth_hash = AlgId::from_wire(r)?;
        let auth_hash = auth_hash.hash().ok_or_else(|| {
            fail!(wire::Error::OutOfRange, "not a hash: {}", auth_hash)
        })?;
        Ok(Self {
            session_type,
            auth_hash,
            symmetric: SymDef::from_wire(r)?,
            nonce_caller: Nonce::from_wire(r)?,
            nonce_tpm: Nonce::from_wire(r)?,
            session_key: Digest::from_wire(r)?,
            bound_entity: Name::from_wire(r)?,
            attributes: SessionAttrs::from_wire(r)?,
            policy: PolicyKind::from_wire(r)?,
        })
    }
}

impl ToWire for Session {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.session_type.to_wire(&mut w)?;
        AlgId::from(self.auth_hash).to_wire(&mut w)?;
        self.symmetric.to_wire(&mut w)?;
        self.nonce_caller.to_wire(&mut w)?;
        self.nonce_tpm.to_wire(&mut w)?;
        self.session_key.to_wire(&mut w)?;
        self.bound_entity.to_wire(&mut w)?;
        self.attributes.to_wire(&mut w)?;
        self.policy.to_wire(&mut w)
    }
}

/// An entity being authorized: its name and auth value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Entity {
    /// The entity's name.
    pub name: Name,
    /// The entity's auth value.
    pub auth: Auth,
}

/// Key material for one session in one authorization slot.
///
/// See [`Session::value()`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionValue {
    bytes: ArrayVec<u8, { 2 * MAX_DIGEST_SIZE }>,
    hmac_len: usize,
}

impl SessionValue {
    /// Returns the whole value, used to derive parameter encryption keys.
    pub fn full(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the prefix of the value used as an HMAC key.
    pub fn hmac_key(&self) -> &[u8] {
        &self.bytes[..self.hmac_len]
    }

    /// Returns the length of [`SessionValue::hmac_key()`].
    pub fn hmac_len(&self) -> usize {
        self.hmac_len
    }
}

/// Computes the fingerprint a session bound to an entity remembers it by.
///
/// The name is zero-padded to the size of the largest name, and the auth
/// value is XORed into its trailing bytes.
pub fn bound_entity(name: &Name, auth: &Auth) -> Name {
    let mut bytes = [0; NAME_SIZE];
    bytes[..name.len()].copy_from_slice(name.as_slice());
    for (b, a) in bytes.iter_mut().rev().zip(auth.as_slice().iter().rev()) {
        *b ^= a;
    }
    Name::from_slice(&bytes).unwrap_or_default()
}

/// Computes the name of a well-known entity, or one whose public area is
/// unknown: its handle, marshaled.
pub fn handle_name(handle: TpmHandle) -> Name {
    Name::from_slice(&handle.0.to_be_bytes()).unwrap_or_default()
}

/// Computes the name of an object from its public area.
pub fn object_name(
    engine: &mut dyn hash::Engine,
    public: &Public,
) -> Result<Name, Error> {
    name_of(engine, public.name_alg, public)
}

/// Computes the name of an NV index from its public area.
pub fn nv_name(
    engine: &mut dyn hash::Engine,
    public: &NvPublic,
) -> Result<Name, Error> {
    name_of(engine, public.name_alg, public)
}

fn name_of<T: ToWire>(
    engine: &mut dyn hash::Engine,
    name_alg: AlgId,
    public: &T,
) -> Result<Name, Error> {
    if name_alg == AlgId::Null {
        return Ok(Name::new());
    }
    let algo = name_alg.hash().ok_or_else(|| {
        fail!(Error::NotImplemented, "unsupported name hash: {}", name_alg)
    })?;

    let mut marshaled = ArrayVec::<u8, { wire::SIZED_SCRATCH }>::new();
    public.to_wire(&mut marshaled)?;

    let mut name = Name::zeroed(2 + algo.bytes())
        .ok_or_else(|| fail!(Error::GeneralFailure))?;
    let (tag, digest) = name.as_mut_slice().split_at_mut(2);
    name_alg.to_wire(tag)?;
    engine.hash_parts(algo, &[&marshaled], digest)?;
    Ok(name)
}

/// The largest number of distinct hashes in play in one command.
pub const MAX_HASHES: usize = 3;

/// Parameter hashes for one command or response, one per distinct session
/// hash algorithm.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HashTable {
    entries: ArrayVec<(hash::Algo, Digest), MAX_HASHES>,
}

impl HashTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the digest computed with `algo`, if any.
    pub fn get(&self, algo: hash::Algo) -> Option<&Digest> {
        self.entries
            .iter()
            .find(|(a, _)| *a == algo)
            .map(|(_, digest)| digest)
    }

    /// Returns the number of distinct hashes in this table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether this table is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hashes the concatenation of `parts` with `algo`, unless a digest for
    /// `algo` is already present.
    fn insert(
        &mut self,
        engine: &mut dyn hash::Engine,
        algo: hash::Algo,
        parts: &[&[u8]],
    ) -> Result<(), Error> {
        if self.get(algo).is_some() {
            return Ok(());
        }
        let mut digest = Digest::zeroed(algo.bytes())
            .ok_or_else(|| fail!(Error::GeneralFailure))?;
        engine.hash_parts(algo, parts, digest.as_mut_slice())?;
        self.entries
            .try_push((algo, digest))
            .map_err(|_| fail!(Error::Memory))?;
        Ok(())
    }

    /// Computes `cpHash := H(commandCode ‖ names ‖ cpBuffer)` for every
    /// algorithm in `algos`.
    pub fn command(
        engine: &mut dyn hash::Engine,
        algos: impl IntoIterator<Item = hash::Algo>,
        code: CommandCode,
        names: &[&Name],
        cp_buffer: &[u8],
    ) -> Result<Self, Error> {
        let code = code.0.to_be_bytes();
        let mut parts = ArrayVec::<&[u8], 5>::new();
        parts.push(&code);
        for name in names.iter().take(3) {
            parts.push(name.as_slice());
        }
        parts.push(cp_buffer);

        let mut table = Self::new();
        for algo in algos {
            table.insert(engine, algo, &parts)?;
        }
        Ok(table)
    }

    /// Computes `rpHash := H(responseCode ‖ commandCode ‖ rpBuffer)` for
    /// every algorithm in `algos`. Only successful responses carry
    /// authorizations, so the response code is always zero.
    pub fn response(
        engine: &mut dyn hash::Engine,
        algos: impl IntoIterator<Item = hash::Algo>,
        code: CommandCode,
        rp_buffer: &[u8],
    ) -> Result<Self, Error> {
        let rc = 0u32.to_be_bytes();
        let code = code.0.to_be_bytes();
        let mut table = Self::new();
        for algo in algos {
            table.insert(engine, algo, &[&rc, &code, rp_buffer])?;
        }
        Ok(table)
    }
}

/// The message an authorization HMAC is computed over.
#[derive(Copy, Clone, Debug)]
pub struct HmacInput<'a> {
    /// The cpHash or rpHash.
    pub p_hash: &'a [u8],
    /// The caller's nonce for commands, the TPM's for responses.
    pub nonce_newer: &'a [u8],
    /// The TPM's nonce for commands, the caller's for responses.
    pub nonce_older: &'a [u8],
    /// The TPM nonce of the decrypt session, if it is folded in.
    pub nonce_decrypt: &'a [u8],
    /// The TPM nonce of the encrypt session, if it is folded in.
    pub nonce_encrypt: &'a [u8],
    /// The session attributes sent along with the HMAC.
    pub attributes: SessionAttrs,
}

impl HmacInput<'_> {
    fn start<'e>(
        &self,
        engine: &'e mut dyn hash::Engine,
        algo: hash::Algo,
        key: &[u8],
    ) -> Result<hash::Hasher<&'e mut dyn hash::Engine>, hash::Error> {
        let mut h = engine.new_hmac(algo, key)?;
        h.write_parts(&[
            self.p_hash,
            self.nonce_newer,
            self.nonce_older,
            self.nonce_decrypt,
            self.nonce_encrypt,
            &[self.attributes.bits()],
        ])?;
        Ok(h)
    }

    /// Computes the HMAC of this input.
    pub fn sign(
        &self,
        engine: &mut dyn hash::Engine,
        algo: hash::Algo,
        key: &[u8],
    ) -> Result<Auth, Error> {
        let mut hmac = Auth::zeroed(algo.bytes())
            .ok_or_else(|| fail!(Error::GeneralFailure))?;
        self.start(engine, algo, key)?.finish(hmac.as_mut_slice())?;
        Ok(hmac)
    }

    /// Checks that `expected` is the HMAC of this input.
    pub fn verify(
        &self,
        engine: &mut dyn hash::Engine,
        algo: hash::Algo,
        key: &[u8],
        expected: &[u8],
    ) -> Result<(), Error> {
        check!(expected.len() == algo.bytes(), Error::ResponseAuthFailed);
        self.start(engine, algo, key)?
            .expect(expected)
            .map_err(|_| fail!(Error::ResponseAuthFailed))?;
        Ok(())
    }
}

/// Encrypts (for commands) or decrypts (for responses) the contents of a
/// first parameter in place, with the session's symmetric algorithm.
///
/// Command parameters are encrypted with the nonces in
/// `(nonceCaller, nonceTPM)` order, and response parameters decrypted with
/// them in `(nonceTPM, nonceCaller)` order.
pub fn crypt_param(
    suite: &mut dyn crypto::Suite,
    session: &Session,
    value: &SessionValue,
    dir: cipher::Direction,
    param: &mut [u8],
) -> Result<(), Error> {
    if param.is_empty() {
        return Ok(());
    }
    let (u, v) = match dir {
        cipher::Direction::Encrypt => {
            (&session.nonce_caller, &session.nonce_tpm)
        }
        cipher::Direction::Decrypt => {
            (&session.nonce_tpm, &session.nonce_caller)
        }
    };

    match session.symmetric {
        SymDef::Block {
            algorithm: AlgId::Aes,
            key_bits,
            mode: AlgId::Cfb,
        } => {
            let algo = cipher::Algo::Aes;
            let key_bits = usize::from(key_bits);
            check!(algo.is_key_size(key_bits), Error::BadValue);

            let key_len = key_bits / 8;
            let mut key_iv = [0; 32 + 16];
            let key_iv = &mut key_iv[..key_len + algo.block_bytes()];
            kdf::kdfa(
                suite.hash(),
                session.auth_hash,
                value.full(),
                LABEL_CFB,
                u.as_slice(),
                v.as_slice(),
                key_iv,
            )?;
            let (key, iv) = key_iv.split_at(key_len);
            suite.cipher().cfb(algo, key, iv, dir, param)?;
        }
        SymDef::Xor { .. } => {
            kdf::kdfa_xor(
                suite.hash(),
                session.auth_hash,
                value.full(),
                LABEL_XOR,
                u.as_slice(),
                v.as_slice(),
                param,
            )?;
        }
        sym => {
            return Err(fail!(
                Error::BadValue,
                "unsupported parameter encryption: {:?}",
                sym,
            ))
        }
    }
    Ok(())
}

/// A salt for a new session, in the clear and encrypted to the TPM.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Salt {
    /// The salt itself.
    pub salt: Digest,
    /// The salt as sent to the TPM.
    pub encrypted: EncryptedSecret,
}

impl Salt {
    /// Generates a salt for a session salted with the key `tpm_key`.
    ///
    /// For RSA keys, a random salt the size of the key's name hash is
    /// encrypted with RSA-OAEP, regardless of the key's own scheme. For ECC
    /// keys, an ephemeral ECDH exchange is run against the key, and the salt
    /// is derived from the shared secret with KDFe; the ephemeral public
    /// point is what gets sent.
    pub fn new(
        suite: &mut dyn crypto::Suite,
        tpm_key: &Public,
    ) -> Result<Self, Error> {
        let algo = tpm_key.name_alg.hash().ok_or_else(|| {
            fail!(
                Error::NotImplemented,
                "unsupported name hash for salting: {}",
                tpm_key.name_alg,
            )
        })?;

        match &tpm_key.parameters {
            Parameters::Rsa {
                exponent, modulus, ..
            } => {
                let salt = suite.csrng().random_digest(algo.bytes())?;
                let exponent = match *exponent {
                    0 => DEFAULT_RSA_EXPONENT,
                    e => e,
                };
                let key = oaep::PublicKey {
                    modulus: modulus.as_slice(),
                    exponent,
                };

                let mut out = [0; EncryptedSecret::CAPACITY];
                let len = suite.oaep().encrypt(
                    key,
                    algo,
                    OAEP_LABEL_SECRET,
                    salt.as_slice(),
                    &mut out,
                )?;
                let encrypted = EncryptedSecret::from_slice(&out[..len])
                    .ok_or_else(|| fail!(Error::GeneralFailure))?;
                Ok(Self { salt, encrypted })
            }
            Parameters::Ecc { curve, point, .. } => {
                let ecdh_curve = curve.ecdh().ok_or_else(|| {
                    fail!(Error::NotImplemented, "unsupported curve: {}", curve)
                })?;
                let n = ecdh_curve.coord_bytes();
                let mut ours = EccPoint {
                    x: EccParameter::zeroed(n)
                        .ok_or_else(|| fail!(Error::GeneralFailure))?,
                    y: EccParameter::zeroed(n)
                        .ok_or_else(|| fail!(Error::GeneralFailure))?,
                };
                let mut z = [0; EccParameter::CAPACITY];
                let z = &mut z[..n];
                suite.ecdh().ephemeral_agree(
                    ecdh_curve,
                    point.x.as_slice(),
                    point.y.as_slice(),
                    ours.x.as_mut_slice(),
                    ours.y.as_mut_slice(),
                    z,
                )?;

                let mut salt = Digest::zeroed(algo.bytes())
                    .ok_or_else(|| fail!(Error::GeneralFailure))?;
                kdf::kdfe(
                    suite.hash(),
                    algo,
                    z,
                    LABEL_SECRET,
                    ours.x.as_slice(),
                    point.x.as_slice(),
                    salt.as_mut_slice(),
                )?;

                let mut marshaled =
                    ArrayVec::<u8, { EncryptedSecret::CAPACITY }>::new();
                ours.to_wire(&mut marshaled)?;
                let encrypted = EncryptedSecret::from_slice(&marshaled)
                    .ok_or_else(|| fail!(Error::GeneralFailure))?;
                Ok(Self { salt, encrypted })
            }
            params => Err(fail!(
                Error::GeneralFailure,
                "cannot salt with a {} key",
                params.algorithm(),
            )),
        }
    }
}

/// Derives the key of a new session.
///
/// `sessionKey := KDFa(authHash, bindAuth ‖ salt, "ATH", nonceTPM,
/// nonceCaller)`, as long as the session is salted or bound; otherwise the
/// session key is empty.
pub fn session_key(
    engine: &mut dyn hash::Engine,
    auth_hash: hash::Algo,
    bind_auth: Option<&Auth>,
    salt: Option<&Digest>,
    nonce_tpm: &Nonce,
    nonce_caller: &Nonce,
) -> Result<Digest, Error> {
    if bind_auth.is_none() && salt.is_none() {
        return Ok(Digest::new());
    }

    let mut secret = ArrayVec::<u8, { 2 * MAX_DIGEST_SIZE }>::new();
    for part in bind_auth.into_iter().chain(salt) {
        secret
            .try_extend_from_slice(part.as_slice())
            .map_err(|_| fail!(Error::GeneralFailure))?;
    }

    let mut key = Digest::zeroed(auth_hash.bytes())
        .ok_or_else(|| fail!(Error::GeneralFailure))?;
    kdf::kdfa(
        engine,
        auth_hash,
        &secret,
        LABEL_ATH,
        nonce_tpm.as_slice(),
        nonce_caller.as_slice(),
        key.as_mut_slice(),
    )?;
    Ok(key)
}

/// Returns the attributes a new session starts out with.
pub fn initial_attributes() -> SessionAttrs {
    SessionAttr::ContinueSession.into()
}
