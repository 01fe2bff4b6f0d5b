//! A headless run of the game's object model: a bird falling under gravity, pipes scrolling in
//! from the right, a score and a shared "running" flag. Nothing is drawn; the bird's state is
//! logged instead.
//!
//! ```bash
//! RUST_LOG=debug cargo run -p flappy_engine --example flappy
//! ```

use flappy_engine::ecs::{
    CallbackResult, Component, Context, Entity, Unique, UpdateContext, World, WorldId,
};

const GRAVITY: f64 = -900.0;
const FLAP_VELOCITY: f64 = 300.0;
const PIPE_SPEED: f64 = -120.0;
const PIPE_INTERVAL: f64 = 1.6;
const PIPE_GAP: f64 = 140.0;
const SCREEN_HEIGHT: f64 = 480.0;
const BIRD_X: f64 = 80.0;

#[derive(Component, Debug, Clone, Copy)]
struct Position {
    x: f64,
    y: f64,
}

/// Opaque texture id handed out by the renderer. The runtime only stores it.
#[derive(Component)]
#[allow(dead_code)]
struct Sprite(u32);

#[derive(Unique, Default)]
struct Score(u32);

/// Application-level flag shared by every gameplay object.
#[derive(Unique)]
struct Running(bool);

/// Scripted input: flap at these times.
#[derive(Unique)]
struct Flaps {
    at: Vec<f64>,
    clock: f64,
}

/// Falls under gravity and flaps when the script says so.
#[derive(Default)]
struct Bird {
    velocity: f64,
}

impl Component for Bird {
    fn begin(&mut self, ctx: &Context<'_>) -> CallbackResult {
        log::info!("bird {} ready", ctx.entity);
        Ok(())
    }

    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        if !ctx.world.unique::<Running>().is_some_and(|r| r.0) {
            return Ok(());
        }

        if let Some(mut flaps) = ctx.world.unique_mut::<Flaps>() {
            flaps.clock += ctx.delta_time;
            let clock = flaps.clock;
            if flaps.at.first().is_some_and(|t| *t <= clock) {
                flaps.at.remove(0);
                self.velocity = FLAP_VELOCITY;
            }
        }

        self.velocity += GRAVITY * ctx.delta_time;
        let mut position = ctx.world.get_mut::<Position>(ctx.entity).ok_or("bird has no position")?;
        position.y += self.velocity * ctx.delta_time;
        if position.y <= 0.0 || position.y >= SCREEN_HEIGHT {
            log::info!("bird left the screen at y={:.1}", position.y);
            drop(position);
            stop(ctx.world);
        }
        Ok(())
    }

    fn destroyed(&mut self, ctx: &Context<'_>) {
        log::info!("bird {} destroyed", ctx.entity);
    }
}

/// A pipe pair scrolling left. Scores once when it passes the bird.
struct Pipe {
    gap_center: f64,
    scored: bool,
}

impl Component for Pipe {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        if !ctx.world.unique::<Running>().is_some_and(|r| r.0) {
            return Ok(());
        }

        let mut position = ctx.world.get_mut::<Position>(ctx.entity).ok_or("pipe has no position")?;
        position.x += PIPE_SPEED * ctx.delta_time;
        let x = position.x;
        drop(position);

        if x < -50.0 {
            ctx.commands().remove_entity(ctx.entity);
        } else if !self.scored && x < BIRD_X {
            self.scored = true;
            if let Some(mut score) = ctx.world.unique_mut::<Score>() {
                score.0 += 1;
                log::info!("score: {}", score.0);
            }
        }
        Ok(())
    }
}

/// Checks the bird against every pipe. Registered after `Bird` and `Pipe` so it sees this
/// frame's positions.
struct Collision {
    bird: Entity,
}

impl Component for Collision {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        let Some(bird) = ctx.world.get::<Position>(self.bird).map(|p| *p) else {
            return Ok(());
        };
        let hit = ctx.world.iter::<Pipe>().any(|(pipe, state)| {
            ctx.world.get::<Position>(pipe).is_some_and(|p| {
                (p.x - bird.x).abs() < 26.0 && (bird.y - state.gap_center).abs() > PIPE_GAP / 2.0
            })
        });
        if hit {
            log::info!("bird hit a pipe at ({:.1}, {:.1})", bird.x, bird.y);
            stop(ctx.world);
        }
        Ok(())
    }
}

/// Spawns a pipe every `PIPE_INTERVAL` seconds.
struct PipeSpawner {
    timer: f64,
    gaps: std::iter::Cycle<std::array::IntoIter<f64, 4>>,
}

impl Component for PipeSpawner {
    fn update(&mut self, ctx: &UpdateContext<'_>) -> CallbackResult {
        self.timer -= ctx.delta_time;
        if self.timer <= 0.0 {
            self.timer += PIPE_INTERVAL;
            let gap_center = self.gaps.next().unwrap_or(SCREEN_HEIGHT / 2.0);
            ctx.commands()
                .spawn()
                .with(Position { x: 400.0, y: 0.0 })
                .with(Pipe {
                    gap_center,
                    scored: false,
                })
                .with(Sprite(2));
        }
        Ok(())
    }
}

fn stop(world: &World) {
    if let Some(mut running) = world.unique_mut::<Running>() {
        running.0 = false;
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut world = World::new(WorldId::new(0));
    world.insert_unique(Score::default());
    world.insert_unique(Running(true));
    world.insert_unique(Flaps {
        at: (0..40).map(|i| 0.2 + i as f64 * 0.45).collect(),
        clock: 0.0,
    });

    // Update order: movement first, then collision checks.
    world.register::<Bird>();
    world.register::<Pipe>();
    world.register::<PipeSpawner>();
    world.register::<Collision>();

    let bird = world
        .new_entity()?
        .with(Position {
            x: BIRD_X,
            y: SCREEN_HEIGHT / 2.0,
        })?
        .with(Sprite(1))?
        .with(Bird::default())?
        .id();
    world
        .new_entity()?
        .with(PipeSpawner {
            timer: 0.5,
            gaps: [240.0, 200.0, 300.0, 260.0].into_iter().cycle(),
        })?
        .with(Collision { bird })?;

    let dt = 1.0 / 60.0;
    let mut frames = 0;
    while world.unique::<Running>().is_some_and(|r| r.0) && frames < 60 * 20 {
        world.step(dt)?;
        frames += 1;
        if frames % 60 == 0 {
            if let Some(position) = world.get::<Position>(bird) {
                log::debug!(
                    "t={:.1}s bird y={:.1} pipes={}",
                    frames as f64 * dt,
                    position.y,
                    world.component_count::<Pipe>()
                );
            }
        }
    }

    let score = world.unique::<Score>().map_or(0, |s| s.0);
    println!("game over after {frames} frames, score {score}");

    world.remove_entity(bird);
    world.deinit();
    Ok(())
}
