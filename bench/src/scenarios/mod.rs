//! Gameplay-shaped benchmark scenarios.
//!
//! These scenarios run the world the way a game would: a fixed step, components that read and
//! write each other, and entities that expire and are replaced every frame.
//!
//! # Scenarios
//!
//! - **Particles**: high entity count, short lifetimes, constant slot reuse

pub mod particles;

pub use particles::{ParticleConfig, ParticleScenario};

/// Common trait for benchmark scenarios.
pub trait Scenario {
    /// Human-readable name of the scenario.
    fn name(&self) -> &'static str;

    /// Brief description of what this scenario tests.
    fn description(&self) -> &'static str;

    /// Number of entities in this scenario.
    fn entity_count(&self) -> usize;

    /// Set up the scenario (spawn entities, initialize state).
    fn setup(&mut self);

    /// Run one "frame" of the scenario.
    fn update(&mut self);

    /// Clean up the scenario.
    fn teardown(&mut self);
}
