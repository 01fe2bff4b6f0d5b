//! Per-kind component storage and lifecycle dispatch.

use std::{
    any::{Any, type_name},
    cell::{Ref, RefCell, RefMut},
};

use log::trace;

use crate::ecs::{
    Error,
    arena::{Arena, Handle},
    component::Component,
    context::{Context, UpdateContext},
    entity::Entity,
    world::World,
};

/// One stored component: the owning entity and the value. The value sits in a `RefCell` so
/// callbacks holding `&World` can reach sibling components while their own is borrowed.
pub(crate) struct Entry<T> {
    entity: Entity,
    value: RefCell<T>,
}

/// The storage for every live component of kind `T`.
pub(crate) struct Store<T: Component> {
    arena: Arena<Entry<T>>,
}

impl<T: Component> Store<T> {
    pub fn new(capacity: usize, limit: usize) -> Self {
        Self {
            arena: Arena::with_capacity_and_limit(capacity, limit),
        }
    }

    /// Store a value for `entity` without running any callback.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<Handle<T>, Error> {
        let handle = self.arena.insert(Entry {
            entity,
            value: RefCell::new(value),
        })?;
        Ok(handle.cast())
    }

    /// Run `begin` for a freshly inserted component.
    pub fn begin(&self, world: &World, handle: Handle<T>) -> Result<(), Error> {
        let Some(entry) = self.arena.get(handle.cast()) else {
            return Err(invalid(handle));
        };
        let mut value = entry.value.try_borrow_mut().map_err(|_| invalid(handle))?;
        let ctx = Context {
            world,
            entity: entry.entity,
        };
        value
            .begin(&ctx)
            .map_err(|source| Error::ComponentBeginFailed {
                entity: entry.entity,
                type_name: type_name::<T>(),
                source,
            })
    }

    /// Drop a component without running `destroyed`. Used to roll back a failed `begin`.
    pub fn rollback(&mut self, handle: Handle<T>) {
        self.arena.remove(handle.cast());
    }

    #[inline]
    pub fn cell(&self, handle: Handle<T>) -> Option<&RefCell<T>> {
        self.arena.get(handle.cast()).map(|entry| &entry.value)
    }

    /// Borrow a component, unless it is currently borrowed mutably (e.g. its own callback is
    /// running).
    #[inline]
    pub fn get(&self, handle: Handle<T>) -> Option<Ref<'_, T>> {
        self.cell(handle)?.try_borrow().ok()
    }

    /// Borrow a component mutably, unless it is currently borrowed.
    #[inline]
    pub fn get_mut(&self, handle: Handle<T>) -> Option<RefMut<'_, T>> {
        self.cell(handle)?.try_borrow_mut().ok()
    }

    /// Live components and their entities, in ascending slot order. Components that are mutably
    /// borrowed at the time they are reached are skipped.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, Ref<'_, T>)> + '_ {
        self.arena
            .iter()
            .filter_map(|(_, entry)| Some((entry.entity, entry.value.try_borrow().ok()?)))
    }
}

/// The capabilities the world needs from a store without knowing its component type.
pub(crate) trait AnyStore {
    /// The component type name, for diagnostics.
    fn type_name(&self) -> &'static str;

    /// Number of live components.
    fn len(&self) -> usize;

    /// Update every live component in ascending slot order, stopping at the first failure.
    fn update_all(&self, world: &World, delta_time: f64) -> Result<(), Error>;

    /// Run `destroyed` for one component. Returns false if the handle is not live.
    fn destroy(&self, world: &World, handle: Handle<()>) -> bool;

    /// Free one component's slot. Returns false if the handle is not live.
    fn release(&mut self, handle: Handle<()>) -> bool;

    /// Run `destroyed` for every live component.
    fn destroy_all(&self, world: &World);

    /// Free every slot.
    fn clear(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> AnyStore for Store<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn len(&self) -> usize {
        self.arena.len()
    }

    fn update_all(&self, world: &World, delta_time: f64) -> Result<(), Error> {
        for (handle, entry) in self.arena.iter() {
            // A live borrow here would mean a callback of this kind is still running, which the
            // sequential step order rules out.
            let Ok(mut value) = entry.value.try_borrow_mut() else {
                trace!("skipping update of borrowed {} {:?}", type_name::<T>(), handle);
                continue;
            };
            let ctx = UpdateContext {
                world,
                entity: entry.entity,
                delta_time,
            };
            value
                .update(&ctx)
                .map_err(|source| Error::ComponentUpdateFailed {
                    entity: entry.entity,
                    type_name: type_name::<T>(),
                    source,
                })?;
        }
        Ok(())
    }

    fn destroy(&self, world: &World, handle: Handle<()>) -> bool {
        let Some(entry) = self.arena.get(handle.cast()) else {
            return false;
        };
        let Ok(mut value) = entry.value.try_borrow_mut() else {
            return false;
        };
        let ctx = Context {
            world,
            entity: entry.entity,
        };
        value.destroyed(&ctx);
        true
    }

    fn release(&mut self, handle: Handle<()>) -> bool {
        self.arena.remove(handle.cast()).is_some()
    }

    fn destroy_all(&self, world: &World) {
        for (_, entry) in self.arena.iter() {
            if let Ok(mut value) = entry.value.try_borrow_mut() {
                let ctx = Context {
                    world,
                    entity: entry.entity,
                };
                value.destroyed(&ctx);
            }
        }
    }

    fn clear(&mut self) {
        self.arena.clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn invalid<T>(handle: Handle<T>) -> Error {
    Error::InvalidHandle {
        index: handle.index(),
        generation: handle.generation().get(),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::ecs::{CallbackResult, world};

    #[derive(Default)]
    struct Counter {
        updates: Rc<Cell<u32>>,
        destroyed: Rc<Cell<u32>>,
        fail_at: Option<u32>,
        seen: Rc<RefCell<Vec<u32>>>,
        tag: u32,
    }

    impl Component for Counter {
        fn update(&mut self, _ctx: &UpdateContext<'_>) -> CallbackResult {
            self.updates.set(self.updates.get() + 1);
            self.seen.borrow_mut().push(self.tag);
            if self.fail_at == Some(self.tag) {
                return Err("tag failure".into());
            }
            Ok(())
        }

        fn destroyed(&mut self, _ctx: &Context<'_>) {
            self.destroyed.set(self.destroyed.get() + 1);
        }
    }

    fn world() -> World {
        World::new(world::Id::new(0))
    }

    #[test]
    fn update_all_visits_in_slot_order() {
        // Given
        let world = world();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = Store::<Counter>::new(0, usize::MAX);
        let handles: Vec<_> = (0..4)
            .map(|tag| {
                store
                    .insert(
                        Entity::from_raw(tag, 0),
                        Counter {
                            tag,
                            seen: seen.clone(),
                            ..Default::default()
                        },
                    )
                    .unwrap()
            })
            .collect();
        store.rollback(handles[1]);

        // When
        store.update_all(&world, 0.5).unwrap();

        // Then
        assert_eq!(*seen.borrow(), vec![0, 2, 3]);
    }

    #[test]
    fn update_all_stops_at_first_failure() {
        // Given
        let world = world();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut store = Store::<Counter>::new(0, usize::MAX);
        for tag in 0..4 {
            store
                .insert(
                    Entity::from_raw(tag, 0),
                    Counter {
                        tag,
                        fail_at: Some(1),
                        seen: seen.clone(),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        // When
        let result = store.update_all(&world, 0.5);

        // Then
        assert!(matches!(
            result,
            Err(Error::ComponentUpdateFailed { entity, .. }) if entity == Entity::from_raw(1, 0)
        ));
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn destroy_then_release() {
        // Given
        let world = world();
        let destroyed = Rc::new(Cell::new(0));
        let mut store = Store::<Counter>::new(0, usize::MAX);
        let handle = store
            .insert(
                Entity::from_raw(0, 0),
                Counter {
                    destroyed: destroyed.clone(),
                    ..Default::default()
                },
            )
            .unwrap();

        // When
        let fired = store.destroy(&world, handle.cast());
        let released = store.release(handle.cast());

        // Then
        assert!(fired && released);
        assert_eq!(destroyed.get(), 1);
        assert!(store.get(handle).is_none());
        assert!(!store.destroy(&world, handle.cast()));
        assert!(!store.release(handle.cast()));
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn destroy_all_then_clear() {
        // Given
        let world = world();
        let destroyed = Rc::new(Cell::new(0));
        let mut store = Store::<Counter>::new(0, usize::MAX);
        for tag in 0..3 {
            store
                .insert(
                    Entity::from_raw(tag, 0),
                    Counter {
                        destroyed: destroyed.clone(),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        // When
        store.destroy_all(&world);
        store.clear();

        // Then
        assert_eq!(destroyed.get(), 3);
        assert_eq!(AnyStore::len(&store), 0);
    }

    #[test]
    fn borrowed_component_is_unreachable() {
        // Given
        let mut store = Store::<Counter>::new(0, usize::MAX);
        let handle = store
            .insert(Entity::from_raw(0, 0), Counter::default())
            .unwrap();

        // When
        let held = store.get_mut(handle);

        // Then
        assert!(held.is_some());
        assert!(store.get(handle).is_none());
        assert!(store.get_mut(handle).is_none());
        assert_eq!(store.iter().count(), 0);
    }
}
