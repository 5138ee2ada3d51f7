// Copyright lowRISC contributors.
// Licensed under the Apache License, Version 2.0, see LICENSE for details.
// SPDX-License-Identifier: Apache-2.0

//! The resource table.
//!
//! Callers never see TPM handles directly. Instead, every entity a
//! [`Context`] knows about (objects, NV indices, sessions, hierarchies and
//! PCRs) is addressed through an opaque [`Handle`], which indexes a fixed
//! table of [`Node`]s holding the entity's TPM handle, name, auth value,
//! and public area or session state.
//!
//! Handles below [`Handle::MIN_OBJECT`] are reserved for well-known
//! entities; their nodes are created on first use, without talking to the
//! TPM. Handles above it carry a generation count, so a handle that was
//! closed does not alias whatever node reuses its slot.
//!
//! [`Context`]: crate::esys::Context

use core::fmt;

use arrayvec::ArrayVec;

use crate::esys::session;
use crate::esys::session::Session;
use crate::esys::Error;
use crate::io::Read;
use crate::io::Write;
use crate::tpm::public::NvPublic;
use crate::tpm::public::Public;
use crate::tpm::wire;
use crate::tpm::wire::FromWire;
use crate::tpm::wire::ToWire;
use crate::tpm::Auth;
use crate::tpm::Name;
use crate::tpm::TpmHandle;
use crate::Result;

/// The number of nodes a table can hold.
pub const MAX_NODES: usize = 32;

/// An opaque reference to a node in a [`Context`]'s resource table.
///
/// [`Context`]: crate::esys::Context
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Handle(u32);

impl Handle {
    /// No entity: an empty session slot, or an absent optional argument.
    pub const NONE: Self = Self(0xfff);
    /// A plaintext password authorization, in a session slot.
    pub const PASSWORD: Self = Self(0x0ff);

    /// The owner hierarchy.
    pub const RH_OWNER: Self = Self(0x101);
    /// The null hierarchy.
    pub const RH_NULL: Self = Self(0x107);
    /// The lockout hierarchy.
    pub const RH_LOCKOUT: Self = Self(0x10a);
    /// The endorsement hierarchy.
    pub const RH_ENDORSEMENT: Self = Self(0x10b);
    /// The platform hierarchy.
    pub const RH_PLATFORM: Self = Self(0x10c);
    /// The platform NV enable.
    pub const RH_PLATFORM_NV: Self = Self(0x10d);

    /// The first handle that is not reserved for well-known entities.
    pub const MIN_OBJECT: Self = Self(0x1000);

    const PCR_COUNT: u32 = 32;
    const INDEX_MASK: u32 = 0xfff;
    const GENERATION_SHIFT: u32 = 16;

    /// Returns the handle of PCR `n`, if there is such a PCR.
    pub fn pcr(n: u32) -> Option<Self> {
        if n < Self::PCR_COUNT {
            Some(Self(n))
        } else {
            None
        }
    }

    /// Reconstructs a handle from its raw value, as returned by
    /// [`Handle::to_raw()`].
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns this handle's raw value.
    pub fn to_raw(self) -> u32 {
        self.0
    }

    /// Returns the TPM handle of the well-known entity this handle stands
    /// for, if it is one.
    pub fn well_known(self) -> Option<TpmHandle> {
        match self {
            Self(n) if n < Self::PCR_COUNT => Some(TpmHandle(n)),
            Self::RH_OWNER => Some(TpmHandle::RH_OWNER),
            Self::RH_NULL => Some(TpmHandle::RH_NULL),
            Self::RH_LOCKOUT => Some(TpmHandle::RH_LOCKOUT),
            Self::RH_ENDORSEMENT => Some(TpmHandle::RH_ENDORSEMENT),
            Self::RH_PLATFORM => Some(TpmHandle::RH_PLATFORM),
            Self::RH_PLATFORM_NV => Some(TpmHandle::RH_PLATFORM_NV),
            _ => None,
        }
    }

    fn for_slot(index: usize, generation: u16) -> Self {
        Self(
            Self::MIN_OBJECT.0
                + index as u32
                + (u32::from(generation) << Self::GENERATION_SHIFT),
        )
    }

    fn slot(self) -> Option<usize> {
        if self < Self::MIN_OBJECT {
            return None;
        }
        let index = (self.0 & Self::INDEX_MASK) as usize;
        Some(index)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Handle({:#x})", self.0)
    }
}

/// What a [`Node`] describes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Kind {
    /// A node whose public area has not been read yet.
    Uninit,
    /// A well-known entity, named by its handle.
    Plain,
    /// A loaded or persistent object.
    Object(Public),
    /// An NV index.
    Nv(NvPublic),
    /// An HMAC, policy or trial session.
    Session(Session),
}

impl Kind {
    fn tag(&self) -> u8 {
        match self {
            Self::Uninit => 0,
            Self::Plain => 1,
            Self::Object(_) => 2,
            Self::Nv(_) => 3,
            Self::Session(_) => 4,
        }
    }
}

/// The locally cached metadata of one entity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// The TPM's handle for the entity.
    pub tpm_handle: TpmHandle,
    /// The entity's name.
    pub name: Name,
    /// The entity's auth value. Empty unless set by the caller.
    pub auth: Auth,
    /// The kind-specific payload.
    pub kind: Kind,
}

impl Node {
    /// Creates an uninitialized node for `tpm_handle`.
    pub fn new(tpm_handle: TpmHandle) -> Self {
        Self {
            tpm_handle,
            name: Name::new(),
            auth: Auth::new(),
            kind: Kind::Uninit,
        }
    }

    /// Creates a node for a well-known entity.
    pub fn well_known(tpm_handle: TpmHandle) -> Self {
        Self {
            tpm_handle,
            name: session::handle_name(tpm_handle),
            auth: Auth::new(),
            kind: Kind::Plain,
        }
    }

    /// Creates a node for a session.
    pub fn session(tpm_handle: TpmHandle, session: Session) -> Self {
        Self {
            tpm_handle,
            name: session::handle_name(tpm_handle),
            auth: Auth::new(),
            kind: Kind::Session(session),
        }
    }

    /// Returns this node's session state, if it is a session.
    pub fn as_session(&self) -> Option<&Session> {
        match &self.kind {
            Kind::Session(s) => Some(s),
            _ => None,
        }
    }

    /// Returns this node's session state mutably, if it is a session.
    pub fn as_session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.kind {
            Kind::Session(s) => Some(s),
            _ => None,
        }
    }
}

/// Nodes serialize as `tpmHandle ‖ name ‖ kind ‖ payload`. The auth value
/// is not part of it, and must be set again after deserializing.
impl ToWire for Node {
    fn to_wire<W: Write>(&self, mut w: W) -> Result<(), wire::Error> {
        self.tpm_handle.to_wire(&mut w)?;
        self.name.to_wire(&mut w)?;
        wire::write_int(self.kind.tag(), &mut w)?;
        match &self.kind {
            Kind::Uninit | Kind::Plain => Ok(()),
            Kind::Object(public) => wire::write_sized(public, &mut w),
            Kind::Nv(public) => wire::write_sized(public, &mut w),
            Kind::Session(session) => session.to_wire(&mut w),
        }
    }
}

impl FromWire for Node {
    fn from_wire<R: Read>(r: &mut R) -> Result<Self, wire::Error> {
        let tpm_handle = TpmHandle::from_wire(r)?;
        let name = Name::from_wire(r)?;
        let kind = match wire::read_int::<u8, _>(r)? {
            0 => Kind::Uninit,
            1 => Kind::Plain,
            2 => Kind::Object(wire::read_sized(r)?),
            3 => Kind::Nv(wire::read_sized(r)?),
            4 => Kind::Session(Session::from_wire(r)?),
            tag => {
                return Err(fail!(
                    wire::Error::OutOfRange,
                    "unknown resource kind: {}",
                    tag,
                ))
            }
        };
        Ok(Self {
            tpm_handle,
            name,
            auth: Auth::new(),
            kind,
        })
    }
}

struct Slot {
    generation: u16,
    entry: Option<(Handle, Node)>,
}

/// A fixed-capacity table of [`Node`]s.
pub struct Table {
    slots: ArrayVec<Slot, MAX_NODES>,
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            slots: ArrayVec::new(),
        }
    }

    /// Returns the number of live nodes.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// Returns whether the table holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn free_slot(&mut self) -> Result<usize, Error> {
        if let Some(i) = self.slots.iter().position(|s| s.entry.is_none()) {
            return Ok(i);
        }
        self.slots
            .try_push(Slot {
                generation: 0,
                entry: None,
            })
            .map_err(|_| {
                fail!(Error::Memory, "resource table full ({})", MAX_NODES)
            })?;
        Ok(self.slots.len() - 1)
    }

    /// Adds `node` to the table under a fresh handle.
    pub fn create(&mut self, node: Node) -> Result<Handle, Error> {
        let index = self.free_slot()?;
        let slot = &mut self.slots[index];
        let handle = Handle::for_slot(index, slot.generation);
        trace!("created {:?} for {:?}", handle, node.tpm_handle);
        slot.entry = Some((handle, node));
        Ok(handle)
    }

    fn position(&self, handle: Handle) -> Option<usize> {
        match handle.slot() {
            Some(i) => self
                .slots
                .get(i)
                .filter(|s| matches!(&s.entry, Some((h, _)) if *h == handle))
                .map(|_| i),
            None => self.slots.iter().position(
                |s| matches!(&s.entry, Some((h, _)) if *h == handle),
            ),
        }
    }

    fn node_at(&mut self, index: usize) -> Result<&mut Node, Error> {
        match &mut self.slots[index].entry {
            Some((_, node)) => Ok(node),
            None => Err(fail!(Error::GeneralFailure)),
        }
    }

    /// Looks up the node for `handle`.
    ///
    /// [`Handle::NONE`] yields `None`. Well-known handles are materialized
    /// on first use; other reserved values are `BadValue`, and unknown
    /// object handles are `UnknownHandle`.
    pub fn lookup(
        &mut self,
        handle: Handle,
    ) -> Result<Option<&mut Node>, Error> {
        if handle == Handle::NONE {
            return Ok(None);
        }
        if let Some(i) = self.position(handle) {
            return self.node_at(i).map(Some);
        }
        if handle >= Handle::MIN_OBJECT {
            return Err(fail!(
                Error::UnknownHandle,
                "unknown handle: {:?}",
                handle,
            ));
        }

        let tpm_handle = handle.well_known().ok_or_else(|| {
            fail!(Error::BadValue, "not a well-known handle: {:?}", handle)
        })?;
        let index = self.free_slot()?;
        self.slots[index].entry = Some((handle, Node::well_known(tpm_handle)));
        self.node_at(index).map(Some)
    }

    /// Looks up the node for `handle`, which must not be [`Handle::NONE`].
    pub fn get(&mut self, handle: Handle) -> Result<&mut Node, Error> {
        match self.lookup(handle)? {
            Some(node) => Ok(node),
            None => Err(fail!(Error::BadReference, "required handle is NONE")),
        }
    }

    /// Looks up the session state for `handle`.
    pub fn session(&mut self, handle: Handle) -> Result<&mut Session, Error> {
        self.get(handle)?.as_session_mut().ok_or_else(|| {
            fail!(Error::UnknownHandle, "not a session: {:?}", handle)
        })
    }

    /// Removes the node for `handle` from the table, returning it.
    pub fn close(&mut self, handle: Handle) -> Result<Node, Error> {
        let index = self.position(handle).ok_or_else(|| {
            fail!(Error::UnknownHandle, "cannot close {:?}", handle)
        })?;
        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        match slot.entry.take() {
            Some((_, node)) => Ok(node),
            None => Err(fail!(Error::GeneralFailure)),
        }
    }

    /// Removes every node.
    pub fn teardown(&mut self) {
        for slot in &mut self.slots {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
    }
}
