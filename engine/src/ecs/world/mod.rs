//! The World is the central container for all entities and components in the ECS.
//!
//! A `World` owns an entity arena plus one component store per registered component kind, and
//! drives the component lifecycle: `begin` when a component is attached, `update` once per
//! [`World::step`], `destroyed` when it is removed, its entity is removed, or the world is torn
//! down.
//!
//! # Architecture
//!
//! The World coordinates several subsystems:
//! - **Entity Arena**: generational slots holding each entity's attachment record
//! - **Component Registry**: kind ids in first-registration order (which is also update order)
//! - **Component Stores**: one generational arena per kind, behind a type-erased capability trait
//! - **Command Buffer**: structural changes requested from callbacks, applied after the current
//!   operation completes
//! - **Uniques**: one value per type, the host's channel for engine context
//!
//! # Ordering
//!
//! [`World::step`] updates kind by kind in the order kinds were first registered, and within a
//! kind in ascending slot order. Gameplay relies on this: whatever writes the bird's position
//! must be registered before whatever reads it for collisions.
//!
//! # Threading
//!
//! A World is single threaded and `!Send`. Callers that share world state with other threads
//! (a render thread reading positions, say) must copy it out between steps.
//!
//! # Example
//!
//! ```ignore
//! use flappy_engine::ecs::world::{self, World};
//!
//! let mut world = World::new(world::Id::new(1));
//!
//! let bird = world
//!     .new_entity()?
//!     .with(Position { x: 0.0, y: 0.0 })?
//!     .with(Gravity::default())?
//!     .id();
//!
//! world.step(1.0 / 60.0)?;
//!
//! if let Some(position) = world.get::<Position>(bird) {
//!     println!("bird at {}", position.y);
//! }
//!
//! world.remove_entity(bird);
//! world.deinit();
//! ```

mod config;

use std::{
    any::type_name,
    cell::{Ref, RefMut},
    marker::PhantomData,
};

use fixedbitset::FixedBitSet;
use log::{debug, error, trace, warn};

use crate::ecs::{
    Error,
    arena::{Arena, Handle},
    command::{CommandBuffer, Commands},
    component::{self, AnyStore, Component, Store},
    entity::{Entity, Record},
    unique::{Unique, Uniques},
};

pub use config::Config;

/// A world identifier, used to tell worlds apart in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(u32);

impl Id {
    /// Create a new world identifier.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Id(id)
    }

    /// Get the raw identifier value.
    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }
}

/// The World is the central container for all entities, components and uniques.
pub struct World {
    /// The world's unique identifier.
    id: Id,

    /// Sizing and limits.
    config: Config,

    /// Entity slots and their attachment records.
    entities: Arena<Record>,

    /// Entities whose destruction is in progress, by slot index.
    destroying: FixedBitSet,

    /// Known component kinds.
    registry: component::Registry,

    /// One store per kind, indexed by kind id.
    stores: Vec<Box<dyn AnyStore>>,

    /// Singleton values.
    uniques: Uniques,

    /// Structural changes waiting to be applied.
    commands: CommandBuffer,

    /// Set once every component has been destroyed.
    torn_down: bool,

    /// Marker to make World !Send. World must stay on the thread that created it.
    _not_send: PhantomData<*mut ()>,
}

impl World {
    /// Create a new world with the default [`Config`].
    pub fn new(id: Id) -> Self {
        Self::with_config(id, Config::default())
    }

    /// Create a new world with the given sizing and limits.
    pub fn with_config(id: Id, config: Config) -> Self {
        Self {
            id,
            config,
            entities: Arena::with_capacity_and_limit(config.entity_capacity, config.max_entities),
            destroying: FixedBitSet::with_capacity(config.entity_capacity),
            registry: component::Registry::new(),
            stores: Vec::new(),
            uniques: Uniques::default(),
            commands: CommandBuffer::new(),
            torn_down: false,
            _not_send: PhantomData,
        }
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create a new entity. Components chained onto the returned builder are attached before any
    /// step can observe the entity.
    pub fn new_entity(&mut self) -> Result<EntityBuilder<'_>, Error> {
        let entity = self.alloc_entity()?;
        Ok(EntityBuilder {
            world: self,
            entity,
        })
    }

    pub(crate) fn alloc_entity(&mut self) -> Result<Entity, Error> {
        let entity = Entity::from_handle(self.entities.insert(Record::default())?);
        trace!("world {}: new entity {}", self.id.0, entity);
        Ok(entity)
    }

    /// Returns true if `entity` refers to a live entity that is not being destroyed.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.contains(entity.handle())
            && !self.destroying.contains(entity.index() as usize)
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Destroy `entity`: every attached component gets `destroyed` in attachment order and is
    /// freed, then the entity slot is freed. Returns false if the entity was not alive.
    pub fn remove_entity(&mut self, entity: Entity) -> bool {
        let removed = self.destroy_entity(entity);
        self.flush_logged();
        removed
    }

    pub(crate) fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }

        // Tombstone first so nothing triggered by the cascade can reach the entity again.
        let index = entity.index() as usize;
        self.destroying.grow(index + 1);
        self.destroying.insert(index);

        let attachments = self
            .entities
            .get(entity.handle())
            .map(|record| record.attachments().to_vec())
            .unwrap_or_default();
        for attachment in attachments {
            self.destroy_attachment(attachment.kind, attachment.handle);
            if let Some(record) = self.entities.get_mut(entity.handle()) {
                record.detach(attachment.kind);
            }
        }

        self.entities.remove(entity.handle());
        self.destroying.set(index, false);
        trace!("world {}: removed entity {}", self.id.0, entity);
        true
    }

    /// Register component kind `T` without attaching anything. Kinds are updated in the order
    /// they were first registered, so registering up front pins the update order.
    pub fn register<T: Component>(&mut self) -> component::Id {
        let id = self.registry.register::<T>();
        if id.index() == self.stores.len() {
            self.stores.push(Box::new(Store::<T>::new(
                self.config.component_capacity,
                self.config.max_components,
            )));
            debug!(
                "world {}: registered component kind {} as {:?}",
                self.id.0,
                type_name::<T>(),
                id
            );
        }
        id
    }

    /// Type names of the registered kinds, in update order.
    #[inline]
    pub fn kinds(&self) -> &[&'static str] {
        self.registry.names()
    }

    /// Attach `value` to `entity` and run its `begin`.
    ///
    /// Fails with `InvalidHandle` if the entity is not alive, `AlreadyAttached` if it already has
    /// a `T`, and `ComponentBeginFailed` if `begin` returns an error, in which case the component
    /// is dropped without `destroyed`.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<component::Handle<T>, Error> {
        let result = self.attach(entity, value);
        self.flush_logged();
        result
    }

    pub(crate) fn attach<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<component::Handle<T>, Error> {
        let kind = self.register::<T>();
        if !self.is_alive(entity) {
            return Err(Error::invalid_entity(entity));
        }
        if self
            .entities
            .get(entity.handle())
            .is_some_and(|record| record.find(kind).is_some())
        {
            return Err(Error::AlreadyAttached {
                entity,
                type_name: type_name::<T>(),
            });
        }

        let store = self.store_mut::<T>().ok_or(Error::TypeNotRegistered {
            type_name: type_name::<T>(),
        })?;
        let handle = store.insert(entity, value)?;
        if let Some(record) = self.entities.get_mut(entity.handle()) {
            record.attach(kind, handle.cast());
        }

        let queued = self.commands.len();
        let begun = {
            let world: &World = self;
            world
                .store::<T>()
                .map_or(Ok(()), |store| store.begin(world, handle))
        };
        if let Err(err) = begun {
            self.commands.truncate(queued);
            if let Some(record) = self.entities.get_mut(entity.handle()) {
                record.detach(kind);
            }
            if let Some(store) = self.store_mut::<T>() {
                store.rollback(handle);
            }
            debug!("world {}: rolled back {}: {}", self.id.0, type_name::<T>(), err);
            return Err(err);
        }

        trace!(
            "world {}: attached {} to {}",
            self.id.0,
            type_name::<T>(),
            entity
        );
        Ok(handle)
    }

    /// Detach and destroy the `T` component of `entity`. Returns false if there was none.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> bool {
        let removed = self.detach::<T>(entity);
        self.flush_logged();
        removed
    }

    pub(crate) fn detach<T: Component>(&mut self, entity: Entity) -> bool {
        let Some(kind) = self.registry.get::<T>() else {
            return false;
        };
        if !self.is_alive(entity) {
            return false;
        }
        let Some(handle) = self.record(entity).and_then(|record| record.find(kind)) else {
            return false;
        };

        self.destroy_attachment(kind, handle);
        if let Some(record) = self.entities.get_mut(entity.handle()) {
            record.detach(kind);
        }
        true
    }

    /// Run `destroyed` for one component, then free it.
    fn destroy_attachment(&mut self, kind: component::Id, handle: Handle<()>) {
        trace!(
            "world {}: destroying {}",
            self.id.0,
            self.registry.name(kind).unwrap_or("?")
        );
        if let Some(store) = self.stores.get(kind.index()) {
            store.destroy(self, handle);
        }
        if let Some(store) = self.stores.get_mut(kind.index()) {
            store.release(handle);
        }
    }

    /// Find the `T` component of `entity`, explaining why when there is none.
    pub fn lookup<T: Component>(&self, entity: Entity) -> Result<component::Handle<T>, Error> {
        let record = self.record(entity).ok_or(Error::invalid_entity(entity))?;
        let kind = self.registry.get::<T>().ok_or(Error::TypeNotRegistered {
            type_name: type_name::<T>(),
        })?;
        record
            .find(kind)
            .map(|handle| handle.cast())
            .ok_or(Error::NotAttached {
                entity,
                type_name: type_name::<T>(),
            })
    }

    /// Get the handle of the `T` component of `entity`. `None` if the entity is gone or has no
    /// `T`. While an entity is being removed, its components that have not been destroyed yet
    /// can still be found.
    #[inline]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<component::Handle<T>> {
        self.lookup(entity).ok()
    }

    /// Borrow a component by handle. `None` for stale handles and for a component whose own
    /// callback is running.
    #[inline]
    pub fn component<T: Component>(&self, handle: component::Handle<T>) -> Option<Ref<'_, T>> {
        self.store::<T>()?.get(handle)
    }

    /// Borrow a component mutably by handle.
    #[inline]
    pub fn component_mut<T: Component>(
        &self,
        handle: component::Handle<T>,
    ) -> Option<RefMut<'_, T>> {
        self.store::<T>()?.get_mut(handle)
    }

    /// Borrow the `T` component of `entity`.
    #[inline]
    pub fn get<T: Component>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        self.component(self.get_component(entity)?)
    }

    /// Borrow the `T` component of `entity` mutably.
    #[inline]
    pub fn get_mut<T: Component>(&self, entity: Entity) -> Option<RefMut<'_, T>> {
        self.component_mut(self.get_component(entity)?)
    }

    /// Iterate every reachable `T` component with its entity, in ascending slot order.
    pub fn iter<T: Component>(&self) -> impl Iterator<Item = (Entity, Ref<'_, T>)> + '_ {
        self.store::<T>().into_iter().flat_map(|store| store.iter())
    }

    /// Number of live `T` components.
    pub fn component_count<T: Component>(&self) -> usize {
        self.store::<T>().map_or(0, |store| AnyStore::len(store))
    }

    /// Insert a unique value, returning the previous one of the same type.
    pub fn insert_unique<U: Unique>(&mut self, value: U) -> Option<U> {
        self.uniques.insert(value)
    }

    /// Remove a unique value.
    pub fn remove_unique<U: Unique>(&mut self) -> Option<U> {
        self.uniques.remove()
    }

    /// Returns true if a unique value of type `U` is present.
    #[inline]
    pub fn has_unique<U: Unique>(&self) -> bool {
        self.uniques.contains::<U>()
    }

    /// Borrow a unique value.
    #[inline]
    pub fn unique<U: Unique>(&self) -> Option<Ref<'_, U>> {
        self.uniques.get()
    }

    /// Borrow a unique value mutably.
    #[inline]
    pub fn unique_mut<U: Unique>(&self) -> Option<RefMut<'_, U>> {
        self.uniques.get_mut()
    }

    /// Queue structural changes. Usable through `&World`, e.g. from inside a callback.
    #[inline]
    pub fn commands(&self) -> Commands<'_> {
        Commands::new(&self.commands)
    }

    /// Advance one frame: update every kind in registration order, then apply the commands the
    /// updates queued.
    ///
    /// A failing update skips the remaining updates of its own kind only. The first error of the
    /// step is returned; any further ones are logged.
    pub fn step(&mut self, delta_time: f64) -> Result<(), Error> {
        let mut first = None;
        {
            let world: &World = self;
            for store in &world.stores {
                trace!("world {}: updating {}", world.id.0, store.type_name());
                if let Err(err) = store.update_all(world, delta_time) {
                    keep_first(&mut first, err);
                }
            }
        }
        if let Err(err) = self.flush() {
            keep_first(&mut first, err);
        }
        first.map_or(Ok(()), Err)
    }

    /// Apply all queued commands, oldest first, including any queued while applying. Returns
    /// the first failure; the rest are logged.
    pub fn flush(&mut self) -> Result<(), Error> {
        let mut first = None;
        let mut applied = 0usize;
        while let Some(command) = self.commands.pop() {
            applied += 1;
            if let Err(err) = command.apply(self) {
                keep_first(&mut first, err);
            }
        }
        if applied > 0 {
            debug!("world {}: applied {} deferred commands", self.id.0, applied);
        }
        first.map_or(Ok(()), Err)
    }

    fn flush_logged(&mut self) {
        if let Err(err) = self.flush() {
            warn!("world {}: deferred command failed: {}", self.id.0, err);
        }
    }

    /// Tear the world down: every component gets `destroyed`, kind by kind in reverse
    /// registration order, then all entities are freed. Dropping a world does the same.
    pub fn deinit(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        for index in (0..self.stores.len()).rev() {
            if let Some(store) = self.stores.get(index) {
                store.destroy_all(self);
            }
            if let Some(store) = self.stores.get_mut(index) {
                store.clear();
            }
        }
        self.entities.clear();
        self.destroying.clear();
        self.uniques.clear();

        if !self.commands.is_empty() {
            let dropped = self.commands.drain().len();
            warn!(
                "world {}: dropped {} commands queued during teardown",
                self.id.0, dropped
            );
        }
        debug!("world {}: torn down", self.id.0);
    }

    /// The record of an entity, including one whose removal is in progress. Components not yet
    /// destroyed stay reachable from the `destroyed` callbacks of their siblings.
    #[inline]
    fn record(&self, entity: Entity) -> Option<&Record> {
        self.entities.get(entity.handle())
    }

    fn store<T: Component>(&self) -> Option<&Store<T>> {
        let id = self.registry.get::<T>()?;
        self.stores.get(id.index())?.as_any().downcast_ref()
    }

    fn store_mut<T: Component>(&mut self) -> Option<&mut Store<T>> {
        let id = self.registry.get::<T>()?;
        self.stores.get_mut(id.index())?.as_any_mut().downcast_mut()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Keep the first error, log any later ones.
fn keep_first(first: &mut Option<Error>, err: Error) {
    if first.is_none() {
        *first = Some(err);
    } else {
        error!("{}", err);
    }
}

/// A freshly created entity, with the world still at hand for chaining components.
pub struct EntityBuilder<'w> {
    world: &'w mut World,
    entity: Entity,
}

impl EntityBuilder<'_> {
    /// The entity being built.
    #[inline]
    pub fn id(&self) -> Entity {
        self.entity
    }

    /// Attach `value` to the entity. See [`World::add_component`].
    pub fn with<T: Component>(self, value: T) -> Result<Self, Error> {
        self.world.add_component(self.entity, value)?;
        Ok(self)
    }

    /// Finish building and return the entity.
    #[inline]
    pub fn finish(self) -> Entity {
        self.entity
    }
}
