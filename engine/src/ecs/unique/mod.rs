//! Unique (singleton) types for the ECS.
//!
//! This module provides the [`Unique`] trait for values that exist once per world rather than
//! once per entity: the score, the "running" flag, or opaque handles the host's renderer gave
//! out. Uniques are how the host threads its engine context through to component callbacks
//! without the ECS ever calling rendering or platform code itself.
//!
//! # Unique vs Component
//!
//! | Aspect | Unique | Component |
//! |--------|--------|-----------|
//! | Cardinality | One per type per world | One per entity per type |
//! | Access | Direct by type | Through an entity or a handle |
//! | Lifecycle | None | `begin` / `update` / `destroyed` |
//!
//! # Example
//!
//! ```rust,ignore
//! use flappy_macros::Unique;
//!
//! #[derive(Unique)]
//! struct Score(u32);
//!
//! world.insert_unique(Score(0));
//!
//! // Inside any callback:
//! if let Some(mut score) = ctx.world.unique_mut::<Score>() {
//!     score.0 += 1;
//! }
//! ```

use std::{
    any::{Any, TypeId},
    cell::{Ref, RefCell, RefMut},
    collections::HashMap,
};

/// A trait for singleton types in the ECS.
///
/// Use `#[derive(Unique)]` to implement it.
pub trait Unique: 'static {}

/// The uniques owned by one world.
#[derive(Default)]
pub(crate) struct Uniques {
    values: HashMap<TypeId, RefCell<Box<dyn Any>>>,
}

impl Uniques {
    /// Insert a value, returning the previous one of the same type.
    pub fn insert<U: Unique>(&mut self, value: U) -> Option<U> {
        let previous = self
            .values
            .insert(TypeId::of::<U>(), RefCell::new(Box::new(value)))?;
        previous.into_inner().downcast::<U>().ok().map(|boxed| *boxed)
    }

    /// Remove a value.
    pub fn remove<U: Unique>(&mut self) -> Option<U> {
        let cell = self.values.remove(&TypeId::of::<U>())?;
        cell.into_inner().downcast::<U>().ok().map(|boxed| *boxed)
    }

    /// Borrow a value, unless it is currently borrowed mutably.
    pub fn get<U: Unique>(&self) -> Option<Ref<'_, U>> {
        let borrowed = self.values.get(&TypeId::of::<U>())?.try_borrow().ok()?;
        Ref::filter_map(borrowed, |value| value.downcast_ref::<U>()).ok()
    }

    /// Borrow a value mutably, unless it is currently borrowed.
    pub fn get_mut<U: Unique>(&self) -> Option<RefMut<'_, U>> {
        let borrowed = self
            .values
            .get(&TypeId::of::<U>())?
            .try_borrow_mut()
            .ok()?;
        RefMut::filter_map(borrowed, |value| value.downcast_mut::<U>()).ok()
    }

    pub fn contains<U: Unique>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<U>())
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
