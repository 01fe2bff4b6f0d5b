//! Generational slot storage.
//!
//! An [`Arena`] hands out [`Handle`]s made of a slot index and the generation of that slot at the
//! time of insertion. Removing a value frees the slot, bumps its generation and pushes the index
//! onto an intrusive free list, so the next insert reuses it under a new generation. Any handle
//! still carrying the old generation is from then on rejected by every lookup.
//!
//! ```rust,ignore
//! let mut arena = Arena::new();
//! let a = arena.insert("a")?;           // index 0, generation 0
//! arena.remove(a);
//! let b = arena.insert("b")?;           // index 0, generation 1
//! assert!(arena.get(a).is_none());      // stale
//! assert_eq!(arena.get(b), Some(&"b"));
//! ```
//!
//! # Generation wraparound
//!
//! Generations are `u32` and wrap on overflow. After 2^32 reuses of a single slot a stale handle
//! can alias a live value again. This is accepted: it takes billions of frees of the same index.
//! Running out of *indices* is a different matter and reported as [`Error::ArenaExhausted`].

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    marker::PhantomData,
};

use crate::ecs::Error;

/// Smallest number of slots reserved when an empty arena first grows.
const MIN_CAPACITY: usize = 4;

/// The generation of a slot. Incremented every time the slot is freed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u32);

impl Generation {
    /// The generation of a slot that has never been freed.
    pub const FIRST: Self = Self(0);

    /// Construct a generation from its raw value.
    #[inline]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw generation value.
    #[inline]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Get the next generation from the current. Wraps at `u32::MAX`.
    #[inline]
    pub const fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// A checked reference to a value of type `T` living in an [`Arena`].
///
/// Handles are plain `{index, generation}` pairs; they never borrow the arena and stay valid
/// across growth of the backing storage.
pub struct Handle<T> {
    index: u32,
    generation: Generation,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    #[inline]
    pub(crate) const fn new(index: u32, generation: Generation) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Get the slot index of this handle.
    #[inline]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Get the generation this handle was issued with.
    #[inline]
    pub const fn generation(&self) -> Generation {
        self.generation
    }

    /// Reinterpret the handle for another value type. Used where a store keeps its values wrapped
    /// or where handles are kept type-erased.
    #[inline]
    pub(crate) const fn cast<U>(self) -> Handle<U> {
        Handle::new(self.index, self.generation)
    }
}

// Manual impls: deriving would put bounds on `T`.
impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

/// Ordered by index first, then generation.
impl<T> PartialOrd for Handle<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Handle<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index
            .cmp(&other.index)
            .then(self.generation.cmp(&other.generation))
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("index", &self.index)
            .field("generation", &self.generation.0)
            .finish()
    }
}

enum Slot<T> {
    Occupied { generation: Generation, value: T },
    Free { generation: Generation, next_free: Option<u32> },
}

impl<T> Slot<T> {
    #[inline]
    fn value(&self, generation: Generation) -> Option<&T> {
        match self {
            Slot::Occupied { generation: g, value } if *g == generation => Some(value),
            _ => None,
        }
    }

    #[inline]
    fn value_mut(&mut self, generation: Generation) -> Option<&mut T> {
        match self {
            Slot::Occupied { generation: g, value } if *g == generation => Some(value),
            _ => None,
        }
    }
}

/// Slot storage with O(1) insert, remove and lookup, and stale handle detection.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,

    /// Head of the intrusive free list threaded through `Slot::Free::next_free`.
    free_head: Option<u32>,

    /// Number of occupied slots.
    len: usize,

    /// Maximum number of slots this arena may ever hold.
    limit: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    /// The largest slot count an arena can address with `u32` indices.
    pub const MAX_SLOTS: usize = u32::MAX as usize;

    /// Construct a new, empty arena.
    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            limit: Self::MAX_SLOTS,
        }
    }

    /// Construct a new arena with room for `capacity` values before it has to grow.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut arena = Self::new();
        arena.slots.reserve_exact(capacity.min(Self::MAX_SLOTS));
        arena
    }

    /// Construct a new arena that refuses to grow past `limit` slots.
    pub fn with_limit(limit: usize) -> Self {
        Self::with_capacity_and_limit(0, limit)
    }

    /// Construct a new arena pre-sized for `capacity` values that refuses to grow past `limit`
    /// slots.
    pub fn with_capacity_and_limit(capacity: usize, limit: usize) -> Self {
        let limit = limit.min(Self::MAX_SLOTS);
        let mut arena = Self::new();
        arena.limit = limit;
        arena.slots.reserve_exact(capacity.min(limit));
        arena
    }

    /// Number of live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of slots the backing storage can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Insert a value, reusing the most recently freed slot if there is one.
    ///
    /// Fails with [`Error::ArenaExhausted`] when every slot is occupied and the arena already holds
    /// `limit` slots.
    pub fn insert(&mut self, value: T) -> Result<Handle<T>, Error> {
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            let (generation, next_free) = match *slot {
                Slot::Free {
                    generation,
                    next_free,
                } => (generation, next_free),
                Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
            };

            *slot = Slot::Occupied { generation, value };
            self.free_head = next_free;
            self.len += 1;
            return Ok(Handle::new(index, generation));
        }

        let index = self.slots.len();
        if index >= self.limit {
            return Err(Error::ArenaExhausted { limit: self.limit });
        }

        // Double the backing storage, but never past the limit.
        if index == self.slots.capacity() {
            let additional = self.slots.capacity().max(MIN_CAPACITY);
            self.slots.reserve_exact(additional.min(self.limit - index));
        }

        self.slots.push(Slot::Occupied {
            generation: Generation::FIRST,
            value,
        });
        self.len += 1;
        Ok(Handle::new(index as u32, Generation::FIRST))
    }

    /// Get the value for a handle, if the handle is still valid.
    #[inline]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slots
            .get(handle.index as usize)?
            .value(handle.generation)
    }

    /// Get the value for a handle mutably, if the handle is still valid.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index as usize)?
            .value_mut(handle.generation)
    }

    /// Returns true if `handle` refers to a live value.
    #[inline]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.get(handle).is_some()
    }

    /// Remove the value for a handle and return it.
    ///
    /// The slot's generation is bumped and the slot becomes the next one reused. Removing with a
    /// stale or foreign handle does nothing and returns `None`.
    pub fn remove(&mut self, handle: Handle<T>) -> Option<T> {
        let index = handle.index as usize;
        if !self.contains(handle) {
            return None;
        }

        let freed = Slot::Free {
            generation: handle.generation.next(),
            next_free: self.free_head,
        };
        match std::mem::replace(&mut self.slots[index], freed) {
            Slot::Occupied { value, .. } => {
                self.free_head = Some(handle.index);
                self.len -= 1;
                Some(value)
            }
            Slot::Free { .. } => unreachable!("validated slot is free"),
        }
    }

    /// Free every occupied slot. Generations are bumped exactly as by [`Arena::remove`], so no
    /// handle issued before the clear becomes valid again.
    pub fn clear(&mut self) {
        for index in 0..self.slots.len() {
            let generation = match &self.slots[index] {
                Slot::Occupied { generation, .. } => *generation,
                Slot::Free { .. } => continue,
            };
            self.remove(Handle::<T>::new(index as u32, generation));
        }
    }

    /// Iterate live values in ascending index order.
    ///
    /// The iterator borrows the arena, so nothing can be inserted or removed while it is alive.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => {
                    Some((Handle::new(index as u32, *generation), value))
                }
                Slot::Free { .. } => None,
            })
    }

    /// Iterate live values mutably in ascending index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| match slot {
                Slot::Occupied { generation, value } => {
                    Some((Handle::new(index as u32, *generation), value))
                }
                Slot::Free { .. } => None,
            })
    }
}

impl<T: fmt::Debug> fmt::Debug for Arena<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
