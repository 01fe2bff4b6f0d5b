//! ECS microbenchmarks using Criterion.
//!
//! These benchmarks measure individual operations in isolation:
//! - Arena insert/remove churn and handle lookups
//! - Entity creation and removal
//! - Component lookup by entity
//! - Stepping a single component kind

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use flappy_bench::components::*;
use flappy_engine::ecs::{Arena, Entity, World, WorldId};

// =============================================================================
// Arena Benchmarks
// =============================================================================

fn bench_arena(c: &mut Criterion) {
    let mut group = c.benchmark_group("arena");

    for count in [1_000, 10_000, 100_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("insert", count), &count, |b, &n| {
            b.iter(|| {
                let mut arena = Arena::new();
                for i in 0..n {
                    black_box(arena.insert(i).ok());
                }
            });
        });

        // Remove every other slot, then refill through the free list
        group.bench_with_input(BenchmarkId::new("churn", count), &count, |b, &n| {
            let mut arena = Arena::with_capacity(n);
            let mut handles: Vec<_> = (0..n).filter_map(|i| arena.insert(i).ok()).collect();
            b.iter(|| {
                for handle in handles.iter_mut().step_by(2) {
                    let value = arena.remove(*handle).unwrap_or_default();
                    if let Ok(fresh) = arena.insert(value) {
                        *handle = fresh;
                    }
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("get", count), &count, |b, &n| {
            let mut arena = Arena::with_capacity(n);
            let handles: Vec<_> = (0..n).filter_map(|i| arena.insert(i).ok()).collect();
            b.iter(|| {
                let mut sum = 0usize;
                for handle in &handles {
                    sum += arena.get(*handle).copied().unwrap_or(0);
                }
                black_box(sum)
            });
        });
    }

    group.finish();
}

// =============================================================================
// Entity Benchmarks
// =============================================================================

fn populate(world: &mut World, n: usize) -> Vec<Entity> {
    (0..n)
        .filter_map(|i| {
            let builder = world.new_entity().ok()?;
            let builder = builder
                .with(Position {
                    x: i as f64,
                    y: 0.0,
                })
                .ok()?;
            Some(builder.with(Velocity { x: 1.0, y: 0.0 }).ok()?.id())
        })
        .collect()
}

fn bench_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity");

    for count in [100, 1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("new_bare", count), &count, |b, &n| {
            b.iter(|| {
                let mut world = World::new(WorldId::new(0));
                for _ in 0..n {
                    black_box(world.new_entity().map(|builder| builder.finish()).ok());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("new_two_components", count), &count, |b, &n| {
            b.iter(|| {
                let mut world = World::new(WorldId::new(0));
                black_box(populate(&mut world, n));
            });
        });

        group.bench_with_input(BenchmarkId::new("remove", count), &count, |b, &n| {
            b.iter_batched(
                || {
                    let mut world = World::new(WorldId::new(0));
                    let entities = populate(&mut world, n);
                    (world, entities)
                },
                |(mut world, entities)| {
                    for entity in entities {
                        world.remove_entity(entity);
                    }
                    world
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// Lookup Benchmarks
// =============================================================================

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("get_by_entity", count), &count, |b, &n| {
            let mut world = World::new(WorldId::new(0));
            let entities = populate(&mut world, n);
            b.iter(|| {
                let mut sum = 0.0;
                for entity in &entities {
                    if let Some(position) = world.get::<Position>(*entity) {
                        sum += position.x;
                    }
                }
                black_box(sum)
            });
        });

        group.bench_with_input(BenchmarkId::new("iter_store", count), &count, |b, &n| {
            let mut world = World::new(WorldId::new(0));
            populate(&mut world, n);
            b.iter(|| black_box(world.iter::<Position>().map(|(_, p)| p.x).sum::<f64>()));
        });
    }

    group.finish();
}

// =============================================================================
// Step Benchmarks
// =============================================================================

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");

    for count in [1_000, 10_000] {
        group.throughput(Throughput::Elements(count as u64));

        // Callback dispatch with no work
        group.bench_with_input(BenchmarkId::new("noop", count), &count, |b, &n| {
            let mut world = World::new(WorldId::new(0));
            for _ in 0..n {
                if let Ok(builder) = world.new_entity() {
                    let _ = builder.with(Marker);
                }
            }
            b.iter(|| world.step(1.0 / 60.0));
        });

        // Each update reads one sibling and writes another
        group.bench_with_input(BenchmarkId::new("mover", count), &count, |b, &n| {
            let mut world = World::new(WorldId::new(0));
            for entity in populate(&mut world, n) {
                let _ = world.add_component(entity, Mover);
            }
            b.iter(|| world.step(1.0 / 60.0));
        });
    }

    group.finish();
}

criterion_group!(
    micro_benches,
    bench_arena,
    bench_entities,
    bench_lookup,
    bench_step
);
criterion_main!(micro_benches);
