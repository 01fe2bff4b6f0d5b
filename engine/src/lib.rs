//! The entity/component runtime behind the game.
//!
//! [`ecs::World`] owns entities and one generational [`ecs::Arena`] of components per component
//! kind, and drives each component through `begin`, per-frame `update` and `destroyed`. Rendering,
//! windowing and input live in the host; the runtime only ever sees the opaque values the host
//! stores as [`ecs::Unique`]s.

// Lets `::flappy_engine::...` paths emitted by the derive macros resolve inside this crate.
extern crate self as flappy_engine;

pub mod ecs;
