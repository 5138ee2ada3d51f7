// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! A software TPM, just capable enough to exercise a [`Context`].
//!
//! [`Sim`] speaks the real command and response formats, and plays the
//! TPM's half of every session on its own: it checks command HMACs and
//! passwords, decrypts and encrypts parameters, rolls nonces, and signs its
//! responses. Its crypto comes straight from `ring` and the RustCrypto
//! crates rather than from [`crypto`](crate::crypto).
//!
//! [`Context`]: crate::esys::Context

use ::cipher::AsyncStreamCipher as _;
use ::cipher::KeyIvInit as _;
use aes::Aes128;
use arrayvec::ArrayVec;
use cfb_mode::Decryptor;
use cfb_mode::Encryptor;
use ring::agreement;
use ring::digest;
use ring::hmac;
use ring::rand::SecureRandom as _;
use ring::rand::SystemRandom;
use rsa::BigUint;
use rsa::Oaep;
use rsa::RsaPrivateKey;
use sha2::Sha256;
use testutil::data::keys;

use crate::esys::options::MAX_COMMAND_SIZE;
use crate::esys::session::PolicyKind;
use crate::io::Write as _;
use crate::tpm::public::AsymScheme;
use crate::tpm::public::EccPoint;
use crate::tpm::public::KdfScheme;
use crate::tpm::public::NvPublic;
use crate::tpm::public::Parameters;
use crate::tpm::public::Public;
use crate::tpm::public::SymDef;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::AlgId;
use crate::tpm::Auth;
use crate::tpm::AuthCommand;
use crate::tpm::AuthResponse;
use crate::tpm::CommandCode;
use crate::tpm::Digest;
use crate::tpm::EccCurve;
use crate::tpm::EccParameter;
use crate::tpm::EncryptedSecret;
use crate::tpm::MaxNvBuffer;
use crate::tpm::Name;
use crate::tpm::Nonce;
use crate::tpm::PublicKeyRsa;
use crate::tpm::ResponseCode;
use crate::tpm::SessionAttr;
use crate::tpm::SessionAttrs;
use crate::tpm::SessionType;
use crate::tpm::StructureTag;
use crate::tpm::TpmHandle;
use crate::transport;
use crate::transport::Timeout;
use crate::transport::Transport;

/// A persistent RSA-2048 storage key, usable for salting.
pub const RSA_KEY: TpmHandle = TpmHandle(0x8100_0001);
/// A persistent P-256 key, usable for salting once.
pub const ECC_KEY: TpmHandle = TpmHandle(0x8100_0002);
/// An NV index authorized by [`NV_AUTH`].
pub const NV_INDEX: TpmHandle = TpmHandle(0x0150_0016);

/// The auth value of [`NV_INDEX`].
pub const NV_AUTH: &[u8] = b"nv password";
/// The auth value of the owner hierarchy.
pub const OWNER_AUTH: &[u8] = b"owner password";
/// The initial contents of [`NV_INDEX`].
pub const NV_DATA: &[u8] = b"sealed data that nobody can see!";

/// `TPM_RC_AUTH_FAIL`, for the first session.
pub const RC_AUTH_FAIL: ResponseCode = ResponseCode(0x98e);

const RC_HASH: ResponseCode = ResponseCode(0x083);
const RC_VALUE: ResponseCode = ResponseCode(0x084);
const RC_SYMMETRIC: ResponseCode = ResponseCode(0x096);
const RC_AUTH_TYPE: ResponseCode = ResponseCode(0x124);
const RC_AUTH_MISSING: ResponseCode = ResponseCode(0x125);
const RC_COMMAND_CODE: ResponseCode = ResponseCode(0x143);
const RC_NV_RANGE: ResponseCode = ResponseCode(0x146);
const RC_HANDLE: ResponseCode = ResponseCode(0x18b);
const RC_SIZE: ResponseCode = ResponseCode(0x1d5);

const NV_SIZE: usize = 64;
const NO_AUTH: &[u8] = &[];

type Outcome<T> = core::result::Result<T, ResponseCode>;

fn malformed<E>(_: crate::Error<E>) -> ResponseCode {
    RC_SIZE
}

fn header_only(rc: ResponseCode) -> Vec<u8> {
    let mut out = vec![0x80, 0x01, 0x00, 0x00, 0x00, 0x0a];
    out.extend_from_slice(&rc.0.to_be_bytes());
    out
}

fn marshal<T: ToWire>(val: &T) -> Outcome<Vec<u8>> {
    let mut out = ArrayVec::<u8, { wire::SIZED_SCRATCH }>::new();
    val.to_wire(&mut out).map_err(malformed)?;
    Ok(out.to_vec())
}

fn put_sized(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// A session hash, with the KDFs built on it.
#[derive(Copy, Clone)]
struct Hash {
    hmac: hmac::Algorithm,
    len: usize,
}

impl Hash {
    fn of(alg: AlgId) -> Outcome<Self> {
        let (hmac, len) = match alg {
            AlgId::Sha1 => (hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, 20),
            AlgId::Sha256 => (hmac::HMAC_SHA256, 32),
            AlgId::Sha384 => (hmac::HMAC_SHA384, 48),
            AlgId::Sha512 => (hmac::HMAC_SHA512, 64),
            _ => return Err(RC_HASH),
        };
        Ok(Self { hmac, len })
    }

    fn digest(self, parts: &[&[u8]]) -> Vec<u8> {
        let mut ctx = digest::Context::new(self.hmac.digest_algorithm());
        for part in parts {
            ctx.update(part);
        }
        ctx.finish().as_ref().to_vec()
    }

    fn mac(self, key: &[u8], parts: &[&[u8]]) -> Vec<u8> {
        let key = hmac::Key::new(self.hmac, key);
        let mut ctx = hmac::Context::with_key(&key);
        for part in parts {
            ctx.update(part);
        }
        ctx.sign().as_ref().to_vec()
    }

    fn kdfa(
        self,
        key: &[u8],
        label: &[u8],
        u: &[u8],
        v: &[u8],
        len: usize,
    ) -> Vec<u8> {
        let bits = (len as u32 * 8).to_be_bytes();
        let mut out = Vec::new();
        let mut i = 1u32;
        while out.len() < len {
            let counter = i.to_be_bytes();
            let block = self.mac(
                key,
                &[&counter[..], label, &[0][..], u, v, &bits[..]],
            );
            out.extend_from_slice(&block);
            i += 1;
        }
        out.truncate(len);
        out
    }

    fn kdfe(
        self,
        z: &[u8],
        label: &[u8],
        u: &[u8],
        v: &[u8],
        len: usize,
    ) -> Vec<u8> {
        let mut out = Vec::new();
        let mut i = 1u32;
        while out.len() < len {
            let counter = i.to_be_bytes();
            let block =
                self.digest(&[&counter[..], z, label, &[0][..], u, v]);
            out.extend_from_slice(&block);
            i += 1;
        }
        out.truncate(len);
        out
    }
}

/// Something a command can be authorized for.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Entity {
    name: Vec<u8>,
    auth: &'static [u8],
}

struct SimSession {
    handle: TpmHandle,
    session_type: SessionType,
    hash: AlgId,
    symmetric: SymDef,
    nonce_tpm: Vec<u8>,
    session_key: Vec<u8>,
    bind: Option<Entity>,
    policy: PolicyKind,
}

impl SimSession {
    fn sends_password(&self) -> bool {
        self.session_type == SessionType::Policy
            && self.policy == PolicyKind::Password
    }

    /// The HMAC key, or with `for_hmac` unset, the parameter encryption
    /// key, for authorizing `entity`.
    fn key(&self, entity: Option<&Entity>, for_hmac: bool) -> Vec<u8> {
        let mut key = self.session_key.clone();
        if let Some(entity) = entity {
            let bound = self.bind.as_ref() == Some(entity);
            let include = !for_hmac
                || !bound
                || self.policy == PolicyKind::AuthValue;
            if self.session_type != SessionType::Trial && include {
                key.extend_from_slice(entity.auth);
            }
        }
        key
    }

    /// Encrypts or decrypts `data` with this session's symmetric
    /// algorithm.
    fn crypt(
        &self,
        key: &[u8],
        u: &[u8],
        v: &[u8],
        decrypt: bool,
        data: &mut [u8],
    ) -> Outcome<()> {
        let hash = Hash::of(self.hash)?;
        match self.symmetric {
            SymDef::Block {
                algorithm: AlgId::Aes,
                key_bits: 128,
                mode: AlgId::Cfb,
            } => {
                let key_iv = hash.kdfa(key, b"CFB", u, v, 16 + 16);
                let (key, iv) = key_iv.split_at(16);
                let result = if decrypt {
                    Decryptor::<Aes128>::new_from_slices(key, iv)
                        .map(|c| c.decrypt(data))
                } else {
                    Encryptor::<Aes128>::new_from_slices(key, iv)
                        .map(|c| c.encrypt(data))
                };
                result.map_err(|_| RC_SYMMETRIC)
            }
            SymDef::Xor { .. } => {
                let mask = hash.kdfa(key, b"XOR", u, v, data.len());
                for (b, m) in data.iter_mut().zip(mask) {
                    *b ^= m;
                }
                Ok(())
            }
            _ => Err(RC_SYMMETRIC),
        }
    }
}

/// One session slot of the command being executed.
struct Slot {
    session: Option<TpmHandle>,
    nonce_caller: Vec<u8>,
    attributes: SessionAttrs,
    entity: Option<Entity>,
}

struct Reply {
    handles: Vec<TpmHandle>,
    params: Vec<u8>,
}

impl Reply {
    fn params(params: Vec<u8>) -> Self {
        Self {
            handles: Vec::new(),
            params,
        }
    }
}

/// A simulated TPM, used as a [`Transport`].
pub struct Sim {
    rng: SystemRandom,
    rsa: RsaPrivateKey,
    rsa_public: Public,
    rsa_name: Name,
    ecc: Option<agreement::EphemeralPrivateKey>,
    ecc_public: Public,
    ecc_name: Name,
    nv_public: NvPublic,
    nv_name: Name,
    nv_data: Vec<u8>,
    sessions: Vec<SimSession>,
    next_session: u32,

    always: Option<ResponseCode>,
    fail_next: (ResponseCode, usize),
    would_block: usize,
    corrupt_hmac: bool,
    corrupt_name: bool,

    command: Vec<u8>,
    response: Option<Vec<u8>>,
    last_response: Vec<u8>,
    last_nonce_tpm: Nonce,
    transmissions: usize,
}

fn name_of<T: ToWire>(name_alg: AlgId, public: &T) -> Name {
    let hash = Hash::of(name_alg).unwrap();
    let mut name = marshal(&name_alg).unwrap();
    name.extend(hash.digest(&[&marshal(public).unwrap()]));
    Name::from_slice(&name).unwrap()
}

impl Sim {
    /// Creates a fresh simulator.
    pub fn new() -> Self {
        let rng = SystemRandom::new();
        let rsa = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(keys::RSA2048_MODULUS),
            BigUint::from(65537u32),
            BigUint::from_bytes_be(keys::RSA2048_PRIVATE_EXPONENT),
            vec![
                BigUint::from_bytes_be(keys::RSA2048_PRIME1),
                BigUint::from_bytes_be(keys::RSA2048_PRIME2),
            ],
        )
        .unwrap();
        let rsa_public = Public {
            name_alg: AlgId::Sha256,
            object_attributes: 0x0003_0072,
            auth_policy: Digest::new(),
            parameters: Parameters::Rsa {
                symmetric: SymDef::AES_128_CFB,
                scheme: AsymScheme::NULL,
                key_bits: 2048,
                exponent: 0,
                modulus: PublicKeyRsa::from_slice(keys::RSA2048_MODULUS)
                    .unwrap(),
            },
        };

        let ecc = agreement::EphemeralPrivateKey::generate(
            &agreement::ECDH_P256,
            &rng,
        )
        .unwrap();
        let point = ecc.compute_public_key().unwrap();
        let point = point.as_ref();
        let ecc_public = Public {
            name_alg: AlgId::Sha256,
            object_attributes: 0x0003_0072,
            auth_policy: Digest::new(),
            parameters: Parameters::Ecc {
                symmetric: SymDef::AES_128_CFB,
                scheme: AsymScheme::NULL,
                curve: EccCurve::NistP256,
                kdf: KdfScheme::NULL,
                point: EccPoint {
                    x: EccParameter::from_slice(&point[1..33]).unwrap(),
                    y: EccParameter::from_slice(&point[33..]).unwrap(),
                },
            },
        };

        let nv_public = NvPublic {
            nv_index: NV_INDEX,
            name_alg: AlgId::Sha256,
            attributes: 0x0004_0004,
            auth_policy: Digest::new(),
            data_size: NV_SIZE as u16,
        };
        let mut nv_data = NV_DATA.to_vec();
        nv_data.resize(NV_SIZE, 0);

        Self {
            rng,
            rsa,
            rsa_name: name_of(rsa_public.name_alg, &rsa_public),
            rsa_public,
            ecc: Some(ecc),
            ecc_name: name_of(ecc_public.name_alg, &ecc_public),
            ecc_public,
            nv_name: name_of(nv_public.name_alg, &nv_public),
            nv_public,
            nv_data,
            sessions: Vec::new(),
            next_session: 0,
            always: None,
            fail_next: (ResponseCode::SUCCESS, 0),
            would_block: 0,
            corrupt_hmac: false,
            corrupt_name: false,
            command: Vec::new(),
            response: None,
            last_response: Vec::new(),
            last_nonce_tpm: Nonce::new(),
            transmissions: 0,
        }
    }

    /// Answers every command with `rc`.
    pub fn always_return(&mut self, rc: ResponseCode) {
        self.always = Some(rc);
    }

    /// Answers the next `n` commands with `rc`, without executing them.
    pub fn return_next(&mut self, rc: ResponseCode, n: usize) {
        self.fail_next = (rc, n);
    }

    /// Makes the next `n` receives with a timeout time out.
    pub fn would_block(&mut self, n: usize) {
        self.would_block = n;
    }

    /// Garbles the HMAC of the first session in the next response that
    /// uses one.
    ///
    /// An empty HMAC, as a password policy session returns, gets a stray
    /// byte instead.
    pub fn corrupt_next_hmac(&mut self) {
        self.corrupt_hmac = true;
    }

    /// Garbles the name in the next public area read.
    pub fn corrupt_next_name(&mut self) {
        self.corrupt_name = true;
    }

    /// Returns the last command received.
    pub fn last_command(&self) -> &[u8] {
        &self.command
    }

    /// Returns the last response delivered.
    pub fn last_response(&self) -> &[u8] {
        &self.last_response
    }

    /// Returns the TPM nonce of the last new session, or of the first
    /// session of the last response.
    pub fn last_nonce_tpm(&self) -> &Nonce {
        &self.last_nonce_tpm
    }

    /// Returns the name of [`NV_INDEX`].
    pub fn nv_name(&self) -> &Name {
        &self.nv_name
    }

    /// Returns the contents of [`NV_INDEX`].
    pub fn nv_data(&self) -> &[u8] {
        &self.nv_data
    }

    /// Returns the number of sessions the simulator holds.
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }

    /// Returns the number of commands transmitted so far.
    pub fn transmissions(&self) -> usize {
        self.transmissions
    }

    fn random(&self, len: usize) -> Vec<u8> {
        let mut bytes = vec![0; len];
        self.rng.fill(&mut bytes).unwrap();
        bytes
    }

    fn entity(&self, handle: TpmHandle) -> Option<Entity> {
        let (name, auth) = match handle {
            TpmHandle::RH_OWNER => {
                (handle.0.to_be_bytes().to_vec(), OWNER_AUTH)
            }
            NV_INDEX => (self.nv_name.as_slice().to_vec(), NV_AUTH),
            RSA_KEY => (self.rsa_name.as_slice().to_vec(), NO_AUTH),
            ECC_KEY => (self.ecc_name.as_slice().to_vec(), NO_AUTH),
            _ => return None,
        };
        Some(Entity { name, auth })
    }

    fn name(&self, handle: TpmHandle) -> Vec<u8> {
        match self.entity(handle) {
            Some(entity) => entity.name,
            None => handle.0.to_be_bytes().to_vec(),
        }
    }

    fn session(&self, handle: TpmHandle) -> Outcome<&SimSession> {
        self.sessions
            .iter()
            .find(|s| s.handle == handle)
            .ok_or(RC_HANDLE)
    }

    fn session_mut(&mut self, handle: TpmHandle) -> Outcome<&mut SimSession> {
        self.sessions
            .iter_mut()
            .find(|s| s.handle == handle)
            .ok_or(RC_HANDLE)
    }

    fn execute(&mut self, command: &[u8]) -> Vec<u8> {
        match self.process(command) {
            Ok(rsp) => rsp,
            Err(rc) => header_only(rc),
        }
    }

    fn process(&mut self, command: &[u8]) -> Outcome<Vec<u8>> {
        let mut r = command;
        let tag = StructureTag::from_wire(&mut r).map_err(malformed)?;
        let size = wire::read_int::<u32, _>(&mut r).map_err(malformed)?;
        if size as usize != command.len() {
            return Err(RC_SIZE);
        }
        let code = CommandCode::from_wire(&mut r).map_err(malformed)?;

        let (handle_count, auth_count) = match code {
            CommandCode::GET_RANDOM | CommandCode::FLUSH_CONTEXT => (0, 0),
            CommandCode::READ_PUBLIC
            | CommandCode::NV_READ_PUBLIC
            | CommandCode::POLICY_PASSWORD
            | CommandCode::POLICY_AUTH_VALUE => (1, 0),
            CommandCode::START_AUTH_SESSION => (2, 0),
            CommandCode::NV_READ | CommandCode::NV_WRITE => (2, 1),
            _ => return Err(RC_COMMAND_CODE),
        };
        let mut handles = Vec::new();
        for _ in 0..handle_count {
            handles.push(TpmHandle::from_wire(&mut r).map_err(malformed)?);
        }

        let mut auths = Vec::new();
        if tag == StructureTag::Sessions {
            let auth_size =
                wire::read_int::<u32, _>(&mut r).map_err(malformed)? as usize;
            if auth_size > r.len() {
                return Err(RC_SIZE);
            }
            let (mut area, rest) = r.split_at(auth_size);
            while !area.is_empty() {
                let auth =
                    AuthCommand::from_wire(&mut area).map_err(malformed)?;
                auths.push(auth);
            }
            r = rest;
        }
        if auths.len() < auth_count || auths.len() > 3 {
            return Err(RC_AUTH_MISSING);
        }

        let mut params = r.to_vec();
        let slots = self.authorize(
            code,
            &handles[..auth_count],
            &handles,
            &auths,
            &mut params,
        )?;
        let reply = self.dispatch(code, &handles, &params)?;
        self.respond(code, reply, slots)
    }

    /// Checks every authorization of a command, and decrypts its first
    /// parameter if a session asks for it.
    fn authorize(
        &mut self,
        code: CommandCode,
        auth_handles: &[TpmHandle],
        handles: &[TpmHandle],
        auths: &[AuthCommand],
        params: &mut [u8],
    ) -> Outcome<Vec<Slot>> {
        let mut slots = Vec::new();
        for (i, auth) in auths.iter().enumerate() {
            let entity = match auth_handles.get(i) {
                Some(&h) => Some(self.entity(h).ok_or(RC_HANDLE)?),
                None => None,
            };
            let session = if auth.session_handle == TpmHandle::RS_PW {
                None
            } else {
                Some(self.session(auth.session_handle)?.handle)
            };
            slots.push(Slot {
                session,
                nonce_caller: auth.nonce.as_slice().to_vec(),
                attributes: auth.attributes,
                entity,
            });
        }

        let with_attr = |attr: SessionAttr| {
            slots.iter().position(|s| {
                s.session.is_some() && s.attributes.contains(attr)
            })
        };
        let decrypt = with_attr(SessionAttr::Decrypt);
        let encrypt =
            with_attr(SessionAttr::Encrypt).filter(|&e| Some(e) != decrypt);
        let folded = |index: Option<usize>| -> Outcome<Vec<u8>> {
            match index.filter(|&i| i > 0).and_then(|i| slots[i].session) {
                Some(h) => Ok(self.session(h)?.nonce_tpm.clone()),
                None => Ok(Vec::new()),
            }
        };
        let nonce_decrypt = folded(decrypt)?;
        let nonce_encrypt = folded(encrypt)?;

        let names: Vec<Vec<u8>> =
            handles.iter().map(|&h| self.name(h)).collect();
        for (i, (slot, auth)) in slots.iter().zip(auths).enumerate() {
            let session = match slot.session {
                Some(h) => self.session(h)?,
                None => {
                    let entity = slot.entity.as_ref().ok_or(RC_AUTH_MISSING)?;
                    if auth.hmac.as_slice() != entity.auth {
                        return Err(RC_AUTH_FAIL);
                    }
                    continue;
                }
            };
            if session.sends_password() {
                let entity = slot.entity.as_ref().ok_or(RC_AUTH_MISSING)?;
                if auth.hmac.as_slice() != entity.auth {
                    return Err(RC_AUTH_FAIL);
                }
                continue;
            }

            let hash = Hash::of(session.hash)?;
            let code_bytes = code.0.to_be_bytes();
            let mut parts: Vec<&[u8]> = vec![&code_bytes[..]];
            parts.extend(names.iter().map(Vec::as_slice));
            parts.push(&*params);
            let cp_hash = hash.digest(&parts);

            let (nd, ne): (&[u8], &[u8]) = if i == 0 {
                (&nonce_decrypt, &nonce_encrypt)
            } else {
                (&[], &[])
            };
            let key = session.key(slot.entity.as_ref(), true);
            let attrs = [slot.attributes.bits()];
            let expected = hash.mac(
                &key,
                &[
                    &cp_hash[..],
                    &slot.nonce_caller[..],
                    &session.nonce_tpm[..],
                    nd,
                    ne,
                    &attrs[..],
                ],
            );
            if expected != auth.hmac.as_slice() {
                return Err(RC_AUTH_FAIL);
            }
        }

        if let Some(i) = decrypt {
            let slot = &slots[i];
            let session = self.session(slot.session.ok_or(RC_VALUE)?)?;
            let key = session.key(slot.entity.as_ref(), false);
            let param = first_sized_mut(params)?;
            session.crypt(
                &key,
                &slot.nonce_caller,
                &session.nonce_tpm,
                true,
                param,
            )?;
        }
        Ok(slots)
    }

    fn dispatch(
        &mut self,
        code: CommandCode,
        handles: &[TpmHandle],
        params: &[u8],
    ) -> Outcome<Reply> {
        let mut r = params;
        match code {
            CommandCode::GET_RANDOM => {
                let n = wire::read_int::<u16, _>(&mut r).map_err(malformed)?;
                let mut out = Vec::new();
                put_sized(&mut out, &self.random(usize::from(n).min(64)));
                Ok(Reply::params(out))
            }
            CommandCode::READ_PUBLIC => {
                let corrupt = core::mem::take(&mut self.corrupt_name);
                let (public, name) = match handles[0] {
                    RSA_KEY => (&self.rsa_public, &self.rsa_name),
                    ECC_KEY => (&self.ecc_public, &self.ecc_name),
                    _ => return Err(RC_HANDLE),
                };
                let mut name = name.as_slice().to_vec();
                let qualified_name = name.clone();
                if corrupt {
                    *name.last_mut().ok_or(RC_VALUE)? ^= 1;
                }
                let mut out = Vec::new();
                put_sized(&mut out, &marshal(public)?);
                put_sized(&mut out, &name);
                put_sized(&mut out, &qualified_name);
                Ok(Reply::params(out))
            }
            CommandCode::NV_READ_PUBLIC => {
                if handles[0] != NV_INDEX {
                    return Err(RC_HANDLE);
                }
                let mut name = self.nv_name.as_slice().to_vec();
                if core::mem::take(&mut self.corrupt_name) {
                    *name.last_mut().ok_or(RC_VALUE)? ^= 1;
                }
                let mut out = Vec::new();
                put_sized(&mut out, &marshal(&self.nv_public)?);
                put_sized(&mut out, &name);
                Ok(Reply::params(out))
            }
            CommandCode::NV_READ => {
                if handles[1] != NV_INDEX {
                    return Err(RC_HANDLE);
                }
                let size = wire::read_int::<u16, _>(&mut r).map_err(malformed)?;
                let offset =
                    wire::read_int::<u16, _>(&mut r).map_err(malformed)?;
                let start = usize::from(offset);
                let end = start + usize::from(size);
                let data = self.nv_data.get(start..end).ok_or(RC_NV_RANGE)?;
                let mut out = Vec::new();
                put_sized(&mut out, data);
                Ok(Reply::params(out))
            }
            CommandCode::NV_WRITE => {
                if handles[1] != NV_INDEX {
                    return Err(RC_HANDLE);
                }
                let data = MaxNvBuffer::from_wire(&mut r).map_err(malformed)?;
                let offset =
                    wire::read_int::<u16, _>(&mut r).map_err(malformed)?;
                let offset = usize::from(offset);
                self.nv_data
                    .get_mut(offset..offset + data.len())
                    .ok_or(RC_NV_RANGE)?
                    .copy_from_slice(data.as_slice());
                Ok(Reply::params(Vec::new()))
            }
            CommandCode::START_AUTH_SESSION => {
                self.start_auth_session(handles[0], handles[1], &mut r)
            }
            CommandCode::FLUSH_CONTEXT => {
                let handle = TpmHandle::from_wire(&mut r).map_err(malformed)?;
                self.session(handle)?;
                self.sessions.retain(|s| s.handle != handle);
                Ok(Reply::params(Vec::new()))
            }
            CommandCode::POLICY_PASSWORD | CommandCode::POLICY_AUTH_VALUE => {
                let session = self.session_mut(handles[0])?;
                if session.session_type == SessionType::Hmac {
                    return Err(RC_AUTH_TYPE);
                }
                session.policy = match code {
                    CommandCode::POLICY_PASSWORD => PolicyKind::Password,
                    _ => PolicyKind::AuthValue,
                };
                Ok(Reply::params(Vec::new()))
            }
            _ => Err(RC_COMMAND_CODE),
        }
    }

    fn start_auth_session(
        &mut self,
        tpm_key: TpmHandle,
        bind: TpmHandle,
        r: &mut &[u8],
    ) -> Outcome<Reply> {
        let nonce_caller = Nonce::from_wire(r).map_err(malformed)?;
        let encrypted_salt = EncryptedSecret::from_wire(r).map_err(malformed)?;
        let session_type = SessionType::from_wire(r).map_err(malformed)?;
        let symmetric = SymDef::from_wire(r).map_err(malformed)?;
        let auth_hash = AlgId::from_wire(r).map_err(malformed)?;
        let hash = Hash::of(auth_hash)?;

        let salt = match tpm_key {
            TpmHandle::RH_NULL => Vec::new(),
            RSA_KEY => self
                .rsa
                .decrypt(
                    Oaep::new_with_label::<Sha256, _>("SECRET\0"),
                    encrypted_salt.as_slice(),
                )
                .map_err(|_| RC_VALUE)?,
            ECC_KEY => {
                let point = EccPoint::from_wire(&mut encrypted_salt.as_slice())
                    .map_err(malformed)?;
                let private = self.ecc.take().ok_or(RC_HANDLE)?;
                let mut peer = vec![0x04];
                peer.extend_from_slice(point.x.as_slice());
                peer.extend_from_slice(point.y.as_slice());
                let peer = agreement::UnparsedPublicKey::new(
                    &agreement::ECDH_P256,
                    peer,
                );
                let z = agreement::agree_ephemeral(private, &peer, (), |z| {
                    Ok(z.to_vec())
                })
                .map_err(|_| RC_VALUE)?;

                let ours = match &self.ecc_public.parameters {
                    Parameters::Ecc { point, .. } => point.x.as_slice(),
                    _ => return Err(RC_VALUE),
                };
                Hash::of(self.ecc_public.name_alg)?.kdfe(
                    &z,
                    b"SECRET",
                    point.x.as_slice(),
                    ours,
                    32,
                )
            }
            _ => return Err(RC_HANDLE),
        };
        let bind = match bind {
            TpmHandle::RH_NULL => None,
            h => Some(self.entity(h).ok_or(RC_HANDLE)?),
        };

        let nonce_tpm = self.random(hash.len);
        let session_key = if bind.is_none() && salt.is_empty() {
            Vec::new()
        } else {
            let mut secret =
                bind.as_ref().map_or(Vec::new(), |e| e.auth.to_vec());
            secret.extend_from_slice(&salt);
            hash.kdfa(
                &secret,
                b"ATH",
                &nonce_tpm,
                nonce_caller.as_slice(),
                hash.len,
            )
        };

        let kind = match session_type {
            SessionType::Hmac => 0x0200_0000,
            _ => 0x0300_0000,
        };
        let handle = TpmHandle(kind | self.next_session);
        self.next_session += 1;

        let mut out = Vec::new();
        put_sized(&mut out, &nonce_tpm);
        self.last_nonce_tpm = Nonce::from_slice(&nonce_tpm).ok_or(RC_SIZE)?;
        self.sessions.push(SimSession {
            handle,
            session_type,
            hash: auth_hash,
            symmetric,
            nonce_tpm,
            session_key,
            bind,
            policy: PolicyKind::Hmac,
        });
        Ok(Reply {
            handles: vec![handle],
            params: out,
        })
    }

    /// Rolls nonces, encrypts the first response parameter if asked to,
    /// signs the response, and assembles it.
    fn respond(
        &mut self,
        code: CommandCode,
        reply: Reply,
        slots: Vec<Slot>,
    ) -> Outcome<Vec<u8>> {
        let mut params = reply.params;
        let mut auths = Vec::new();

        for slot in &slots {
            if let Some(h) = slot.session {
                let len = Hash::of(self.session(h)?.hash)?.len;
                let nonce = self.random(len);
                self.session_mut(h)?.nonce_tpm = nonce;
            }
        }

        let encrypt = slots.iter().find(|s| {
            s.session.is_some() && s.attributes.contains(SessionAttr::Encrypt)
        });
        if let Some(slot) = encrypt {
            let session = self.session(slot.session.ok_or(RC_VALUE)?)?;
            let key = session.key(slot.entity.as_ref(), false);
            let param = first_sized_mut(&mut params)?;
            session.crypt(
                &key,
                &session.nonce_tpm,
                &slot.nonce_caller,
                false,
                param,
            )?;
        }

        for slot in &slots {
            let session = match slot.session {
                Some(h) => self.session(h)?,
                None => {
                    auths.push(AuthResponse {
                        nonce: Nonce::new(),
                        attributes: slot.attributes,
                        hmac: Auth::new(),
                    });
                    continue;
                }
            };
            let mut hmac = Auth::new();
            if !session.sends_password() {
                let hash = Hash::of(session.hash)?;
                let rc = 0u32.to_be_bytes();
                let code_bytes = code.0.to_be_bytes();
                let rp_hash =
                    hash.digest(&[&rc[..], &code_bytes[..], &params[..]]);
                let key = session.key(slot.entity.as_ref(), true);
                let attrs = [slot.attributes.bits()];
                let mac = hash.mac(
                    &key,
                    &[
                        &rp_hash[..],
                        &session.nonce_tpm[..],
                        &slot.nonce_caller[..],
                        &attrs[..],
                    ],
                );
                hmac = Auth::from_slice(&mac).ok_or(RC_SIZE)?;
            }
            auths.push(AuthResponse {
                nonce: Nonce::from_slice(&session.nonce_tpm).ok_or(RC_SIZE)?,
                attributes: slot.attributes,
                hmac,
            });
        }
        if self.corrupt_hmac {
            let target = slots
                .iter()
                .zip(auths.iter_mut())
                .find(|(s, _)| s.session.is_some());
            if let Some((_, auth)) = target {
                if auth.hmac.is_empty() {
                    auth.hmac = Auth::from_slice(&[0xff]).ok_or(RC_SIZE)?;
                } else {
                    auth.hmac.as_mut_slice()[0] ^= 0xff;
                }
                self.corrupt_hmac = false;
            }
        }
        let first = slots.iter().zip(&auths).find(|(s, _)| s.session.is_some());
        if let Some((_, auth)) = first {
            self.last_nonce_tpm = auth.nonce.clone();
        }

        for slot in &slots {
            if let Some(h) = slot.session {
                if !slot.attributes.contains(SessionAttr::ContinueSession) {
                    self.sessions.retain(|s| s.handle != h);
                }
            }
        }

        let mut out = ArrayVec::<u8, MAX_COMMAND_SIZE>::new();
        let tag = if slots.is_empty() {
            StructureTag::NoSessions
        } else {
            StructureTag::Sessions
        };
        tag.to_wire(&mut out).map_err(malformed)?;
        wire::write_int(0u32, &mut out).map_err(malformed)?;
        ResponseCode::SUCCESS.to_wire(&mut out).map_err(malformed)?;
        for handle in &reply.handles {
            handle.to_wire(&mut out).map_err(malformed)?;
        }
        if !slots.is_empty() {
            wire::write_int(params.len() as u32, &mut out).map_err(malformed)?;
        }
        out.write_bytes(&params).map_err(malformed)?;
        for auth in &auths {
            auth.to_wire(&mut out).map_err(malformed)?;
        }
        let size = (out.len() as u32).to_be_bytes();
        out[2..6].copy_from_slice(&size);
        Ok(out.to_vec())
    }
}

fn first_sized_mut(params: &mut [u8]) -> Outcome<&mut [u8]> {
    if params.len() < 2 {
        return Err(RC_SIZE);
    }
    let size = usize::from(u16::from_be_bytes([params[0], params[1]]));
    params.get_mut(2..2 + size).ok_or(RC_SIZE)
}

impl Transport for Sim {
    fn transmit(
        &mut self,
        command: &[u8],
    ) -> crate::Result<(), transport::Error> {
        self.transmissions += 1;
        self.command = command.to_vec();
        let response = match (self.always, self.fail_next) {
            (Some(rc), _) => header_only(rc),
            (None, (rc, n)) if n > 0 => {
                self.fail_next.1 -= 1;
                header_only(rc)
            }
            _ => self.execute(command),
        };
        self.response = Some(response);
        Ok(())
    }

    fn receive(
        &mut self,
        buf: &mut [u8],
        timeout: Timeout,
    ) -> crate::Result<usize, transport::Error> {
        if timeout != Timeout::Forever && self.would_block > 0 {
            self.would_block -= 1;
            return Err(soft_fail!(transport::Error::TryAgain));
        }
        let response = self
            .response
            .take()
            .ok_or_else(|| fail!(transport::Error::Disconnected))?;
        buf.get_mut(..response.len())
            .ok_or_else(|| fail!(transport::Error::BufferTooSmall))?
            .copy_from_slice(&response);
        let len = response.len();
        self.last_response = response;
        Ok(len)
    }
}
