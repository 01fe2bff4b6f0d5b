use crate::ecs::entity::Entity;

/// Errors reported by the ECS.
///
/// Handle checks never fail a caller on their own; lookups return `None` and only the
/// `Result`-returning variants (e.g. [`World::lookup`](crate::ecs::World::lookup)) surface
/// `InvalidHandle`, `TypeNotRegistered` and `NotAttached`. Everything else propagates to the
/// immediate caller, which decides whether to log, retry or abort.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A stale or foreign handle: the slot is free or has been reused since.
    #[error("invalid or stale handle {index}v{generation}")]
    InvalidHandle { index: u32, generation: u32 },

    /// The component type has never been registered with this world.
    #[error("component type `{type_name}` is not registered")]
    TypeNotRegistered { type_name: &'static str },

    /// The entity is alive but has no component of this type.
    #[error("entity {entity} has no `{type_name}` component")]
    NotAttached {
        entity: Entity,
        type_name: &'static str,
    },

    /// The entity already has a component of this type.
    #[error("entity {entity} already has a `{type_name}` component")]
    AlreadyAttached {
        entity: Entity,
        type_name: &'static str,
    },

    /// `begin` returned an error; the component was not attached.
    #[error("`{type_name}` failed to begin on entity {entity}")]
    ComponentBeginFailed {
        entity: Entity,
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    /// `update` returned an error; remaining updates of this kind were skipped for the step.
    #[error("`{type_name}` failed to update on entity {entity}")]
    ComponentUpdateFailed {
        entity: Entity,
        type_name: &'static str,
        #[source]
        source: Box<dyn std::error::Error>,
    },

    /// An arena cannot allocate another slot.
    #[error("arena exhausted: cannot grow past {limit} slots")]
    ArenaExhausted { limit: usize },
}

impl Error {
    pub(crate) fn invalid_entity(entity: Entity) -> Self {
        Error::InvalidHandle {
            index: entity.index(),
            generation: entity.generation().get(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn messages() {
        // Given
        let entity = Entity::from_raw(3, 1);

        // Then
        assert_eq!(
            Error::invalid_entity(entity).to_string(),
            "invalid or stale handle 3v1"
        );
        assert_eq!(
            Error::ArenaExhausted { limit: 8 }.to_string(),
            "arena exhausted: cannot grow past 8 slots"
        );
        assert_eq!(
            Error::NotAttached {
                entity,
                type_name: "Bird"
            }
            .to_string(),
            "entity 3v1 has no `Bird` component"
        );
    }

    #[test]
    fn callback_error_is_the_source() {
        // Given
        let error = Error::ComponentUpdateFailed {
            entity: Entity::from_raw(0, 0),
            type_name: "Pipe",
            source: "out of bounds".into(),
        };

        // Then
        assert_eq!(
            error.source().map(|s| s.to_string()),
            Some(String::from("out of bounds"))
        );
    }
}
