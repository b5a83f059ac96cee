//! Synergy search - composable strategies over the read-only catalog
//!
//! Two strategies share the `synergy-core` model and evaluator:
//!
//! - [`exhaustive`]: canonical enumeration of every k-subset, batched over a
//!   rayon pool with a fan-in channel into a single sink writer. No pruning;
//!   throughput covers the full `C(n, k)` space.
//! - [`goal`]: backtracking from a required-synergy map, always branching on
//!   the most constrained open requirement, with branch-and-bound pruning
//!   ([`prune`]) and exact undo on every exit.
//!
//! Both honor a shared [`CancelToken`] and emit progress through `tracing`
//! as a side channel that never affects results.

#![warn(clippy::all)]

pub mod cancel;
pub mod exhaustive;
pub mod goal;
pub mod prune;

pub use cancel::CancelToken;
pub use exhaustive::{
    combination_count, validate_team_size, Combinations, ExhaustiveConfig, SearchSummary,
};
pub use goal::{derive_requirements, solve, solve_emblem_combinations, GoalConfig, Requirements};
