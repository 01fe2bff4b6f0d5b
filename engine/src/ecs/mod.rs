pub mod arena;
pub mod command;
pub mod component;
pub mod context;
pub mod entity;
pub mod unique;
pub mod world;

mod error;

pub use arena::{Arena, Generation, Handle};
pub use command::{Commands, Spawn};
pub use component::{CallbackResult, Component};
pub use context::{Context, UpdateContext};
pub use entity::Entity;
pub use error::Error;
pub use unique::Unique;
pub use world::{Config, EntityBuilder, Id as WorldId, World};

pub use flappy_macros::{Component, Unique};

/// A checked reference to a component of type `T`.
pub type ComponentHandle<T> = component::Handle<T>;
