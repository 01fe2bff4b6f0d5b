use crate::ecs::arena::Arena;

/// Sizing and limits for a [`World`](super::World).
///
/// Capacities pre-size the arenas so early frames do not reallocate; limits bound how far they
/// may grow before insertion fails with [`Error::ArenaExhausted`](crate::ecs::Error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Entity slots reserved up front.
    pub entity_capacity: usize,

    /// Component slots reserved up front in each component store.
    pub component_capacity: usize,

    /// Maximum number of entity slots.
    pub max_entities: usize,

    /// Maximum number of component slots per component kind.
    pub max_components: usize,
}

impl Config {
    /// Reserve room for `capacity` entities.
    pub const fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Reserve room for `capacity` components of each kind.
    pub const fn with_component_capacity(mut self, capacity: usize) -> Self {
        self.component_capacity = capacity;
        self
    }

    /// Cap the number of entity slots.
    pub const fn with_max_entities(mut self, limit: usize) -> Self {
        self.max_entities = limit;
        self
    }

    /// Cap the number of component slots per kind.
    pub const fn with_max_components(mut self, limit: usize) -> Self {
        self.max_components = limit;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entity_capacity: 64,
            component_capacity: 16,
            max_entities: Arena::<()>::MAX_SLOTS,
            max_components: Arena::<()>::MAX_SLOTS,
        }
    }
}
