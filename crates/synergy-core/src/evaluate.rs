//! Full-activation validity evaluation.
//!
//! A team is valid when no synergy it touches is "wasted": every trait with
//! a nonzero count is either unique (activates on presence), backed by a
//! forced emblem contribution, absent from the threshold table, or at or
//! above its lowest activation breakpoint.
//!
//! Two policies exist for the last clause ("exact breakpoint member" versus
//! "at least the lowest breakpoint"); this module implements the looser
//! at-least-lowest rule uniformly, so both search strategies agree on what
//! valid means. The evaluator is a pure function of the team, the catalog,
//! and an optional extra forced-contribution map; workers run it
//! unsynchronized.

use crate::catalog::{Catalog, ChampionId, TraitId};
use crate::sink::CompositionRecord;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Per-trait counts for a candidate team, forced contributions included.
pub type TraitCounts = FxHashMap<TraitId, u32>;

impl Catalog {
    /// Count trait contributions of `team` members, catalog-level forced
    /// emblem contributions, and any extra forced contributions supplied by
    /// the caller.
    pub fn trait_counts_with(&self, team: &[ChampionId], extra: &TraitCounts) -> TraitCounts {
        let mut counts = TraitCounts::default();
        for &champ in team {
            for &t in self.champion_traits(champ) {
                *counts.entry(t).or_insert(0) += 1;
            }
        }
        for t in (0..self.trait_count() as u32).map(TraitId) {
            let forced = self.forced(t);
            if forced > 0 {
                *counts.entry(t).or_insert(0) += forced;
            }
        }
        for (&t, &count) in extra {
            if count > 0 {
                *counts.entry(t).or_insert(0) += count;
            }
        }
        counts
    }

    /// Member plus catalog-forced contributions only.
    pub fn trait_counts(&self, team: &[ChampionId]) -> TraitCounts {
        self.trait_counts_with(team, &TraitCounts::default())
    }

    /// Whether a nonzero trait count leaves no waste under the
    /// at-least-lowest-breakpoint policy. Traits in `extra` count as forced.
    #[inline]
    pub fn is_acceptable_with(&self, t: TraitId, count: u32, extra: &TraitCounts) -> bool {
        debug_assert!(count > 0);
        if self.is_unique(t) || self.forced(t) > 0 || extra.contains_key(&t) {
            return true;
        }
        match self.lowest_breakpoint(t) {
            // Traits missing from the threshold table never constrain validity.
            None => true,
            Some(min) => count >= min,
        }
    }

    /// Evaluate a completed team with extra forced contributions: returns
    /// its trait count map when every touched trait is fully utilized,
    /// `None` otherwise.
    pub fn evaluate_with(&self, team: &[ChampionId], extra: &TraitCounts) -> Option<TraitCounts> {
        let counts = self.trait_counts_with(team, extra);
        for (&t, &count) in &counts {
            if count > 0 && !self.is_acceptable_with(t, count, extra) {
                return None;
            }
        }
        Some(counts)
    }

    /// Evaluate a completed team against catalog-level emblems only.
    pub fn evaluate(&self, team: &[ChampionId]) -> Option<TraitCounts> {
        self.evaluate_with(team, &TraitCounts::default())
    }

    /// Highest breakpoint at or below `count`, i.e. the activated tier.
    pub fn activated_tier(&self, t: TraitId, count: u32) -> Option<u32> {
        self.breakpoints(t)
            .iter()
            .take_while(|&&bp| bp <= count)
            .last()
            .copied()
    }

    /// Render a valid team and its counts as an output record: sorted
    /// champion names plus the activated tier of every activated trait.
    pub fn composition_record(&self, team: &[ChampionId], counts: &TraitCounts) -> CompositionRecord {
        let mut champions: Vec<String> = team
            .iter()
            .map(|&c| self.champion_name(c).to_string())
            .collect();
        champions.sort_unstable();

        let mut synergies = BTreeMap::new();
        for (&t, &count) in counts {
            if let Some(tier) = self.activated_tier(t, count) {
                synergies.insert(self.trait_name(t).to_string(), tier);
            }
        }
        CompositionRecord {
            champions,
            synergies,
        }
    }
}
