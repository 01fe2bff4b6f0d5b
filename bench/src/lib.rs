//! Benchmark utilities for the flappy engine.
//!
//! This crate provides benchmarking infrastructure for the ECS runtime:
//!
//! - **Microbenchmarks**: arena churn, entity creation/removal, component lookups, stepping
//! - **Scenario benchmarks**: gameplay-shaped workloads with per-frame spawning and despawning
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p flappy_bench
//!
//! # Run specific benchmark group
//! cargo bench -p flappy_bench -- arena
//! ```
//!
//! # Benchmark Results
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.

pub mod components;
pub mod scenarios;
