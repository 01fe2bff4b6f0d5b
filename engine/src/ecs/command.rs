//! Deferred command buffer for structural world changes.
//!
//! Component callbacks only see `&World`, so they cannot create entities or attach and remove
//! components directly. Instead they push commands through [`Commands`]; the world drains the
//! buffer once the current operation completes: at the end of [`World::step`], or right after a
//! top-level structural call such as [`World::add_component`]. No store is ever mutated while it
//! is being iterated.
//!
//! # Lifecycle
//!
//! ```text
//! ┌──────────────────────────── World::step ────────────────────────────┐
//! │  A::update ──push──┐                                                │
//! │  B::update ──push──┼──► CommandBuffer ──flush (FIFO)──► World       │
//! │  C::update ──push──┘                       ▲                        │
//! │                                  (after every kind ran)             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands pushed while a flush is running (e.g. from a `begin` triggered by the flush) are
//! appended to the same buffer and applied in the same flush.
//!
//! # Example
//!
//! ```rust,ignore
//! impl Component for PipeSpawner {
//!     fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
//!         self.timer -= ctx.delta_time;
//!         if self.timer <= 0.0 {
//!             ctx.commands().spawn().with(Pipe::new(self.next_gap()));
//!             self.timer = self.interval;
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use crossbeam::queue::SegQueue;
use log::trace;

use crate::ecs::{Error, component::Component, entity::Entity, world::World};

/// A type-erased component waiting to be attached.
pub(crate) type Attach = Box<dyn FnOnce(&mut World, Entity) -> Result<(), Error>>;

fn attach<T: Component>(value: T) -> Attach {
    Box::new(move |world: &mut World, entity: Entity| {
        world.attach(entity, value).map(|_| ())
    })
}

/// A deferred structural change.
pub(crate) enum Command {
    /// Create an entity and attach the components in order.
    Spawn { components: Vec<Attach> },

    /// Attach a component to an existing entity.
    AddComponent { entity: Entity, component: Attach },

    /// Detach a component by type. Missing components are ignored.
    RemoveComponent {
        entity: Entity,
        remove: fn(&mut World, Entity) -> bool,
    },

    /// Destroy an entity and all of its components. Stale entities are ignored.
    RemoveEntity { entity: Entity },
}

impl Command {
    /// Apply this command to the world.
    pub fn apply(self, world: &mut World) -> Result<(), Error> {
        match self {
            Command::Spawn { components } => {
                let entity = world.alloc_entity()?;
                for component in components {
                    if let Err(err) = component(world, entity) {
                        // Nobody holds the id, so a half-built entity would never be removed.
                        world.destroy_entity(entity);
                        return Err(err);
                    }
                }
                Ok(())
            }
            Command::AddComponent { entity, component } => component(world, entity),
            Command::RemoveComponent { entity, remove } => {
                remove(world, entity);
                Ok(())
            }
            Command::RemoveEntity { entity } => {
                world.destroy_entity(entity);
                Ok(())
            }
        }
    }
}

/// FIFO buffer of deferred commands, pushable through a shared reference.
///
/// Uses `crossbeam::queue::SegQueue`, so pushes never need `&mut` and never block. The world is
/// single threaded; the queue is what lets callbacks holding `&World` enqueue work.
#[derive(Default)]
pub(crate) struct CommandBuffer {
    commands: SegQueue<Command>,
}

impl CommandBuffer {
    /// Create a new empty command buffer.
    pub fn new() -> Self {
        Self {
            commands: SegQueue::new(),
        }
    }

    /// Push a command to the back of the buffer.
    #[inline]
    pub fn push(&self, command: Command) {
        self.commands.push(command);
    }

    /// Pop the oldest command.
    #[inline]
    pub fn pop(&self) -> Option<Command> {
        self.commands.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Discard every command pushed after the first `len`.
    pub fn truncate(&self, len: usize) {
        if self.commands.len() <= len {
            return;
        }
        let kept: Vec<_> = self.drain().into_iter().take(len).collect();
        for command in kept {
            self.commands.push(command);
        }
    }

    /// Drain all commands from the buffer, oldest first.
    pub fn drain(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Some(cmd) = self.commands.pop() {
            commands.push(cmd);
        }
        commands
    }
}

/// Queues structural changes against a world. Obtained from [`World::commands`] or from a
/// lifecycle context.
#[derive(Clone, Copy)]
pub struct Commands<'w> {
    buffer: &'w CommandBuffer,
}

impl<'w> Commands<'w> {
    pub(crate) fn new(buffer: &'w CommandBuffer) -> Self {
        Self { buffer }
    }

    /// Queue a new entity. Components are chained with [`Spawn::with`]; the command is queued
    /// when the returned builder is dropped.
    pub fn spawn(&self) -> Spawn<'w> {
        Spawn {
            buffer: self.buffer,
            components: Vec::new(),
        }
    }

    /// Queue attaching `value` to `entity`.
    pub fn add_component<T: Component>(&self, entity: Entity, value: T) {
        trace!("queue add {} to {}", std::any::type_name::<T>(), entity);
        self.buffer.push(Command::AddComponent {
            entity,
            component: attach(value),
        });
    }

    /// Queue detaching the `T` component of `entity`.
    pub fn remove_component<T: Component>(&self, entity: Entity) {
        self.buffer.push(Command::RemoveComponent {
            entity,
            remove: World::detach::<T>,
        });
    }

    /// Queue destroying `entity`.
    pub fn remove_entity(&self, entity: Entity) {
        self.buffer.push(Command::RemoveEntity { entity });
    }

    /// Number of commands waiting to be applied.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Builder for a deferred entity. Queued on drop.
pub struct Spawn<'w> {
    buffer: &'w CommandBuffer,
    components: Vec<Attach>,
}

impl Spawn<'_> {
    /// Attach `value` to the new entity, after any previously chained components.
    pub fn with<T: Component>(mut self, value: T) -> Self {
        self.components.push(attach(value));
        self
    }
}

impl Drop for Spawn<'_> {
    fn drop(&mut self) {
        let components = std::mem::take(&mut self.components);
        self.buffer.push(Command::Spawn { components });
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use flappy_macros::Component;

    use super::*;
    use crate::ecs::{CallbackResult, Context, UpdateContext, world};

    #[derive(Component)]
    struct Position {
        x: i32,
    }

    #[derive(Component)]
    struct Velocity;

    #[test]
    fn commands_wait_for_flush() {
        // Given
        let mut world = World::new(world::Id::new(0));
        let target = world.new_entity().unwrap().id();

        // When
        let commands = world.commands();
        commands.spawn().with(Position { x: 1 }).with(Velocity);
        commands.add_component(target, Position { x: 2 });

        // Then - nothing applied yet
        assert_eq!(world.commands().pending(), 2);
        assert_eq!(world.entity_count(), 1);
        assert!(world.get::<Position>(target).is_none());

        // When
        world.flush().unwrap();

        // Then
        assert_eq!(world.commands().pending(), 0);
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.get::<Position>(target).map(|p| p.x), Some(2));
        assert_eq!(world.component_count::<Velocity>(), 1);
    }

    #[test]
    fn commands_apply_in_fifo_order() {
        // Given
        let mut world = World::new(world::Id::new(0));
        let entity = world.new_entity().unwrap().id();

        // When - add then remove in one flush
        world.commands().add_component(entity, Velocity);
        world.commands().remove_component::<Velocity>(entity);
        world.flush().unwrap();

        // Then
        assert!(world.get_component::<Velocity>(entity).is_none());

        // When - remove then add in one flush
        world.commands().remove_component::<Velocity>(entity);
        world.commands().add_component(entity, Velocity);
        world.flush().unwrap();

        // Then
        assert!(world.get_component::<Velocity>(entity).is_some());
    }

    #[test]
    fn stale_targets_are_reported_or_ignored() {
        // Given
        let mut world = World::new(world::Id::new(0));
        let entity = world.new_entity().unwrap().id();
        world.remove_entity(entity);

        // When
        world.commands().remove_entity(entity);
        world.commands().remove_component::<Position>(entity);
        let removes = world.flush();
        world.commands().add_component(entity, Position { x: 0 });
        let add = world.flush();

        // Then
        assert!(removes.is_ok());
        assert!(matches!(add, Err(Error::InvalidHandle { .. })));
    }

    /// Counts its updates and its destruction.
    struct Ticker {
        updates: Rc<Cell<u32>>,
        destroyed: Rc<Cell<u32>>,
    }

    impl Component for Ticker {
        fn update(&mut self, _ctx: &UpdateContext<'_>) -> CallbackResult {
            self.updates.set(self.updates.get() + 1);
            Ok(())
        }

        fn destroyed(&mut self, _ctx: &Context<'_>) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    /// Never starts.
    struct Broken;

    impl Component for Broken {
        fn begin(&mut self, _ctx: &Context<'_>) -> CallbackResult {
            Err("broken".into())
        }
    }

    #[test]
    fn failed_spawn_leaves_no_entity_behind() {
        // Given
        let mut world = World::new(world::Id::new(0));
        let updates = Rc::new(Cell::new(0));
        let destroyed = Rc::new(Cell::new(0));
        world
            .commands()
            .spawn()
            .with(Ticker {
                updates: updates.clone(),
                destroyed: destroyed.clone(),
            })
            .with(Broken);

        // When
        let result = world.flush();
        world.step(0.1).unwrap();

        // Then - the component that had begun is destroyed with its entity
        assert!(matches!(result, Err(Error::ComponentBeginFailed { .. })));
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.component_count::<Ticker>(), 0);
        assert_eq!(destroyed.get(), 1);
        assert_eq!(updates.get(), 0);
    }

    #[test]
    fn truncate_keeps_the_oldest_commands() {
        // Given
        let buffer = CommandBuffer::new();
        for index in 0..3 {
            buffer.push(Command::RemoveEntity {
                entity: Entity::from_raw(index, 0),
            });
        }

        // When
        buffer.truncate(1);

        // Then
        let kept = buffer.drain();
        assert_eq!(kept.len(), 1);
        assert!(matches!(
            kept[0],
            Command::RemoveEntity { entity } if entity == Entity::from_raw(0, 0)
        ));
    }

    #[test]
    fn drain_empties_the_buffer() {
        // Given
        let buffer = CommandBuffer::new();
        buffer.push(Command::RemoveEntity {
            entity: Entity::from_raw(0, 0),
        });
        buffer.push(Command::RemoveEntity {
            entity: Entity::from_raw(1, 0),
        });

        // When
        let drained = buffer.drain();

        // Then
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
        assert!(matches!(
            drained[0],
            Command::RemoveEntity { entity } if entity == Entity::from_raw(0, 0)
        ));
    }
}
