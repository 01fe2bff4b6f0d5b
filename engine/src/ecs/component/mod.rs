//! Component management for the ECS.
//!
//! Components are plain values attached to entities. A component type opts into the lifecycle by
//! implementing [`Component`]; every callback has a no-op default, so `#[derive(Component)]` is
//! enough for pure data.
//!
//! ## Architecture
//!
//! - [`Component`]: the lifecycle trait (`begin`, `update`, `destroyed`)
//! - [`Id`]: the per-world identifier of a component kind, assigned in first-registration order
//! - [`Registry`]: maps Rust types to kind ids
//! - `Store`: one generational arena of values per kind, plus lifecycle dispatch. The world keeps
//!   stores behind the object-safe `AnyStore` trait so kinds can be added at runtime without a
//!   common base type.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized ──add / begin──► Began ──update*──► ... ──destroyed──► Destroyed (slot freed)
//! ```
//!
//! `begin` runs exactly once when the component is attached; if it fails the attachment is rolled
//! back and `destroyed` never runs. `destroyed` runs exactly once for every component that began,
//! whether it is removed explicitly, through its entity, or when the world is torn down.
//!
//! ## Usage
//!
//! ```ignore
//! use flappy_engine::ecs::{Component, CallbackResult, UpdateContext};
//!
//! struct Gravity { velocity: f64 }
//!
//! impl Component for Gravity {
//!     fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
//!         self.velocity += 9.81 * ctx.delta_time;
//!         Ok(())
//!     }
//! }
//! ```

mod registry;
mod store;

pub use registry::Registry;
pub(crate) use store::{AnyStore, Store};

use crate::ecs::{
    arena,
    context::{Context, UpdateContext},
};

/// The result of a lifecycle callback. Any error type can be returned; it becomes the source of
/// the [`Error`](crate::ecs::Error) reported to the caller.
pub type CallbackResult = Result<(), Box<dyn std::error::Error>>;

/// A checked reference to a component of type `T` inside its kind's store.
pub type Handle<T> = arena::Handle<T>;

/// A component kind identifier, unique within one world.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Construct a new component Id from a raw u32 value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the index of this component if it were to live in indexable storage (e.g. Vec)
    #[inline]
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl From<u32> for Id {
    #[inline]
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<usize> for Id {
    #[inline]
    fn from(value: usize) -> Self {
        Self::new(value as u32)
    }
}

/// A value that can be attached to an entity, with optional lifecycle callbacks.
///
/// Callbacks receive the owning world by shared reference. Other components (of this or any
/// entity) can be read or written through [`World::get`](crate::ecs::World::get) and
/// [`World::get_mut`](crate::ecs::World::get_mut); structural changes go through
/// [`World::commands`](crate::ecs::World::commands) and are applied once the current operation
/// completes. The component whose callback is running is not reachable through the world.
pub trait Component: 'static + Sized {
    /// Called once, right after the component is attached. An error rolls the attachment back.
    fn begin(&mut self, _ctx: &Context<'_>) -> CallbackResult {
        Ok(())
    }

    /// Called once per [`World::step`](crate::ecs::World::step) while the component is attached.
    /// An error stops the remaining updates of this kind for the current step.
    fn update(&mut self, _ctx: &UpdateContext<'_>) -> CallbackResult {
        Ok(())
    }

    /// Called once, right before the component is removed.
    fn destroyed(&mut self, _ctx: &Context<'_>) {}
}
