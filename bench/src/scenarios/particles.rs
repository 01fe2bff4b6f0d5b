//! Particle system benchmark scenario.
//!
//! Simulates a high-volume particle system with:
//! - 10,000 particles
//! - Components: Position, Velocity, Sprite, Mover, Gravity, Lifetime
//! - Lifetimes expire during `step` and remove their entity through deferred commands
//! - The host tops the population back up after every frame
//!
//! This scenario tests:
//! - Per-kind update throughput over dense stores
//! - Sibling lookups from inside callbacks
//! - Slot reuse under constant spawn/despawn churn

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use flappy_engine::ecs::{Error, World, WorldId};

use crate::components::{Gravity, Lifetime, Mover, Position, Sprite, Stats, Velocity};
use crate::scenarios::Scenario;

/// Configuration for the particle benchmark.
pub struct ParticleConfig {
    /// Number of particles kept alive.
    pub particle_count: usize,
    /// Simulated delta time per frame.
    pub delta_time: f64,
    /// Random seed for reproducibility.
    pub seed: u64,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            particle_count: 10_000,
            delta_time: 1.0 / 60.0,
            seed: 12345,
        }
    }
}

/// Seeded source of new particles.
struct ParticleFactory(ChaCha8Rng);

impl ParticleFactory {
    fn spawn(&mut self, world: &mut World) -> Result<(), Error> {
        let rng = &mut self.0;
        world
            .new_entity()?
            .with(Position {
                x: rng.gen_range(-100.0..100.0),
                y: rng.gen_range(-100.0..100.0),
            })?
            .with(Velocity {
                x: rng.gen_range(-10.0..10.0),
                y: rng.gen_range(0.0..20.0),
            })?
            .with(Sprite(rng.gen_range(0..4)))?
            .with(Mover)?
            .with(Gravity(9.8))?
            .with(Lifetime {
                remaining: rng.gen_range(0.5..3.0),
            })?;
        Ok(())
    }
}

/// Particle benchmark scenario.
pub struct ParticleScenario {
    config: ParticleConfig,
    world: Option<World>,
    factory: ParticleFactory,
}

impl ParticleScenario {
    pub fn with_config(config: ParticleConfig) -> Self {
        let factory = ParticleFactory(ChaCha8Rng::seed_from_u64(config.seed));
        Self {
            config,
            world: None,
            factory,
        }
    }

    /// The world, once `setup` has run.
    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    /// Particles that have expired since `setup`.
    pub fn expired(&self) -> u64 {
        self.world
            .as_ref()
            .and_then(|world| world.unique::<Stats>().map(|stats| stats.expired))
            .unwrap_or(0)
    }

    fn refill(&mut self) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        while world.entity_count() < self.config.particle_count {
            if let Err(error) = self.factory.spawn(world) {
                log::error!("particle spawn failed: {error}");
                return;
            }
        }
    }
}

impl Default for ParticleScenario {
    fn default() -> Self {
        Self::with_config(ParticleConfig::default())
    }
}

impl Scenario for ParticleScenario {
    fn name(&self) -> &'static str {
        "particles"
    }

    fn description(&self) -> &'static str {
        "Short-lived particles with per-frame despawn and refill"
    }

    fn entity_count(&self) -> usize {
        self.config.particle_count
    }

    fn setup(&mut self) {
        let mut world = World::new(WorldId::new(0));
        world.insert_unique(Stats::default());

        // Velocity changes before positions integrate it; lifetimes run last.
        world.register::<Gravity>();
        world.register::<Mover>();
        world.register::<Lifetime>();

        self.world = Some(world);
        self.refill();
    }

    fn update(&mut self) {
        if let Some(world) = self.world.as_mut() {
            if let Err(error) = world.step(self.config.delta_time) {
                log::error!("particle frame failed: {error}");
            }
        }
        self.refill();
    }

    fn teardown(&mut self) {
        if let Some(world) = self.world.take() {
            world.deinit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_is_maintained_across_frames() {
        // Given
        let mut scenario = ParticleScenario::with_config(ParticleConfig {
            particle_count: 200,
            ..Default::default()
        });
        scenario.setup();

        // When
        for _ in 0..240 {
            scenario.update();
        }

        // Then
        let world = scenario.world().unwrap();
        assert_eq!(world.entity_count(), 200);
        assert_eq!(world.component_count::<Lifetime>(), 200);
        assert!(scenario.expired() > 0);
        scenario.teardown();
        assert!(scenario.world().is_none());
    }

    #[test]
    fn same_seed_produces_same_run() {
        // Given
        let config = || ParticleConfig {
            particle_count: 100,
            seed: 7,
            ..Default::default()
        };
        let mut a = ParticleScenario::with_config(config());
        let mut b = ParticleScenario::with_config(config());
        a.setup();
        b.setup();

        // When
        for _ in 0..120 {
            a.update();
            b.update();
        }

        // Then
        assert_eq!(a.expired(), b.expired());
    }
}
