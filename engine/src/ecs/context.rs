//! Lifecycle contexts handed to component callbacks.
//!
//! These are plain records: the owning world, the owning entity and, for updates, the frame's
//! delta time. They carry no behavior beyond convenience accessors.

use crate::ecs::{command::Commands, entity::Entity, world::World};

/// Context for `begin` and `destroyed`.
#[derive(Clone, Copy)]
pub struct Context<'w> {
    /// The world that owns the component.
    pub world: &'w World,

    /// The entity the component is attached to.
    pub entity: Entity,
}

impl<'w> Context<'w> {
    /// Queue structural changes to be applied once the current operation completes.
    #[inline]
    pub fn commands(&self) -> Commands<'w> {
        self.world.commands()
    }
}

/// Context for `update`.
#[derive(Clone, Copy)]
pub struct UpdateContext<'w> {
    /// The world that owns the component.
    pub world: &'w World,

    /// The entity the component is attached to.
    pub entity: Entity,

    /// Seconds since the previous step.
    pub delta_time: f64,
}

impl<'w> UpdateContext<'w> {
    /// Queue structural changes to be applied at the end of the current step.
    #[inline]
    pub fn commands(&self) -> Commands<'w> {
        self.world.commands()
    }
}
