//! Synergy core - catalog model, validity evaluator, and result sink
//!
//! Read-only data structures and pure evaluation for team-composition
//! search:
//!
//! - [`Catalog`]: interned champions, traits, breakpoint tables, and the
//!   trait -> carriers index, immutable after construction and safe to share
//!   across workers
//! - validity evaluation under the at-least-lowest-breakpoint policy
//!   ([`Catalog::evaluate`])
//! - [`CompositionSink`]: streaming JSONL output with bounded memory
//!
//! Search strategies live in the `synergy-search` crate; this crate has no
//! opinion on how candidate teams are enumerated.

#![warn(clippy::all)]

pub mod catalog;
pub mod error;
pub mod evaluate;
pub mod sink;

pub use catalog::{Catalog, ChampionFile, ChampionId, ChampionRecord, ThresholdRecord, TraitId};
pub use error::{Result, SynergyError};
pub use evaluate::TraitCounts;
pub use sink::{CompositionRecord, CompositionSink, RecordWriter};
