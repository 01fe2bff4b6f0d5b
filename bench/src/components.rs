//! Common component types used across benchmarks.
//!
//! Data-only components derive `Component` and keep the no-op lifecycle; the behavior
//! components implement `update` by hand so stepping does representative work.

use flappy_engine::ecs::{CallbackResult, Component, Context, UpdateContext};
use flappy_macros::Unique;

/// 2D position component (16 bytes).
#[derive(flappy_macros::Component, Clone, Copy, Debug, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// 2D velocity component (16 bytes).
#[derive(flappy_macros::Component, Clone, Copy, Debug, Default)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

/// Opaque renderer handle, as the host would attach it.
#[derive(flappy_macros::Component, Clone, Copy, Debug, Default)]
pub struct Sprite(pub u32);

/// Moves its entity's `Position` by its `Velocity`.
#[derive(Default)]
pub struct Mover;

impl Component for Mover {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        let Some(velocity) = ctx.world.get::<Velocity>(ctx.entity).map(|v| *v) else {
            return Ok(());
        };
        if let Some(mut position) = ctx.world.get_mut::<Position>(ctx.entity) {
            position.x += velocity.x * ctx.delta_time;
            position.y += velocity.y * ctx.delta_time;
        }
        Ok(())
    }
}

/// Pulls its entity's `Velocity` down.
pub struct Gravity(pub f64);

impl Component for Gravity {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        if let Some(mut velocity) = ctx.world.get_mut::<Velocity>(ctx.entity) {
            velocity.y -= self.0 * ctx.delta_time;
        }
        Ok(())
    }
}

/// Counts down and removes its entity when it expires.
pub struct Lifetime {
    pub remaining: f64,
}

impl Component for Lifetime {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        self.remaining -= ctx.delta_time;
        if self.remaining <= 0.0 {
            ctx.commands().remove_entity(ctx.entity);
        }
        Ok(())
    }

    fn destroyed(&mut self, ctx: &Context<'_>) {
        if let Some(mut stats) = ctx.world.unique_mut::<Stats>() {
            stats.expired += 1;
        }
    }
}

/// Unique counters shared with callbacks.
#[derive(Unique, Default, Debug)]
pub struct Stats {
    pub expired: u64,
}

/// Minimal component with no behavior, for measuring bookkeeping cost alone.
#[derive(flappy_macros::Component, Default)]
pub struct Marker;
