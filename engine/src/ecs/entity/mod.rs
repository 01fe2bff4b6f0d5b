//! Entity identity for the ECS.
//!
//! An [`Entity`] is a generational handle into the world's entity arena. It carries no data of
//! its own; the world keeps a [`Record`] per entity listing which component kinds are attached
//! (and where), in attachment order, so destroying the entity can cascade to every component.
//!
//! # Generation Tracking
//!
//! When an entity is removed its slot is freed and the slot's generation bumped. Every copy of
//! the old `Entity` now mismatches the slot and is rejected by the world:
//!
//! ```rust,ignore
//! let entity = world.new_entity()?.id(); // Entity { index: 0, generation: 0 }
//! world.remove_entity(entity);
//! let reused = world.new_entity()?.id(); // Entity { index: 0, generation: 1 }
//! assert!(!world.is_alive(entity));
//! ```

use std::fmt;

use crate::ecs::{
    arena::{Generation, Handle},
    component,
};

/// An entity in the ECS. Valid while the world's entity slot at `index` is occupied with the same
/// generation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(Handle<Record>);

impl Entity {
    /// Construct an entity from raw parts. Mostly useful for tests and for restoring ids that were
    /// handed to a collaborator as plain integers; the world validates it like any other.
    #[inline]
    pub const fn from_raw(index: u32, generation: u32) -> Self {
        Self(Handle::new(index, Generation::new(generation)))
    }

    #[inline]
    pub(crate) const fn from_handle(handle: Handle<Record>) -> Self {
        Self(handle)
    }

    #[inline]
    pub(crate) const fn handle(&self) -> Handle<Record> {
        self.0
    }

    /// Get the slot index of this entity.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.0.index()
    }

    /// Get the generation of this entity.
    #[inline]
    pub const fn generation(&self) -> Generation {
        self.0.generation()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("index", &self.index())
            .field("generation", &self.generation().get())
            .finish()
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation().get())
    }
}

/// Where one component of an entity lives: its kind and its type-erased handle in that kind's
/// store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Attachment {
    pub kind: component::Id,
    pub handle: Handle<()>,
}

/// Per-entity bookkeeping held in the world's entity arena.
#[derive(Debug, Default)]
pub struct Record {
    /// Attached components in attachment order.
    attachments: Vec<Attachment>,
}

impl Record {
    #[inline]
    pub(crate) fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Find the handle of the component of `kind`, if one is attached.
    #[inline]
    pub(crate) fn find(&self, kind: component::Id) -> Option<Handle<()>> {
        self.attachments
            .iter()
            .find(|a| a.kind == kind)
            .map(|a| a.handle)
    }

    #[inline]
    pub(crate) fn attach(&mut self, kind: component::Id, handle: Handle<()>) {
        self.attachments.push(Attachment { kind, handle });
    }

    /// Forget the component of `kind`, keeping the order of the rest.
    pub(crate) fn detach(&mut self, kind: component::Id) -> Option<Handle<()>> {
        let position = self.attachments.iter().position(|a| a.kind == kind)?;
        Some(self.attachments.remove(position).handle)
    }
}
