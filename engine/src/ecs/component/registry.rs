use std::{
    any::{TypeId, type_name},
    collections::HashMap,
};

use crate::ecs::component::{Component, Id};

/// The component kinds known to one world.
///
/// Ids are handed out densely in first-registration order, which is also the order in which the
/// world updates kinds. The registry is owned by its world; there is no process-wide table.
#[derive(Debug, Default)]
pub struct Registry {
    /// Map from the Rust type to its kind id.
    type_map: HashMap<TypeId, Id>,

    /// Type names indexed by kind id, for diagnostics.
    names: Vec<&'static str>,
}

impl Registry {
    /// Create a new, empty component registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register component type `C` and get its id. Registering an already known type returns
    /// the existing id.
    pub fn register<C: Component>(&mut self) -> Id {
        let next = Id::from(self.names.len());
        let names = &mut self.names;
        *self.type_map.entry(TypeId::of::<C>()).or_insert_with(|| {
            names.push(type_name::<C>());
            next
        })
    }

    /// Get the id for component type `C`, if registered.
    #[inline]
    pub fn get<C: Component>(&self) -> Option<Id> {
        self.type_map.get(&TypeId::of::<C>()).copied()
    }

    /// Get the type name registered under `id`.
    #[inline]
    pub fn name(&self, id: Id) -> Option<&'static str> {
        self.names.get(id.index()).copied()
    }

    /// Type names of all registered kinds, in registration order.
    #[inline]
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    /// Number of registered kinds.
    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
