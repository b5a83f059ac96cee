//! Goal-directed backtracking from a required-synergy map.
//!
//! Instead of sweeping the whole catalog, this strategy starts from a map
//! of `trait -> required count` (target synergies minus forced emblem
//! contributions) and grows a team by always attacking the most constrained
//! open requirement: the one with the fewest available carriers per
//! remaining needed count. Each branch choice is undone exactly on exit, so
//! the team, availability set, and requirement map are restored before the
//! next sibling is tried.
//!
//! A branch succeeds when the requirement map is empty, the team size falls
//! inside the configured window, and the completed team passes the validity
//! evaluator; it fails when the team would exceed the window, a requirement
//! has no available carriers left, or the deficit bound exceeds the
//! remaining slot budget. An unsatisfiable requirement is not an error,
//! just an empty contribution.
//!
//! Multiple independent runs from different forced-contribution combinations
//! form an embarrassingly parallel outer loop ([`solve_emblem_combinations`]).

use crate::cancel::CancelToken;
use crate::exhaustive::Combinations;
use crate::prune;
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use synergy_core::{Catalog, ChampionId, TraitCounts, TraitId};
use tracing::{debug, info};

/// Team-size window for goal-directed solutions.
#[derive(Debug, Clone, Copy)]
pub struct GoalConfig {
    /// Smallest acceptable team, inclusive.
    pub min_size: usize,
    /// Largest acceptable team, inclusive.
    pub max_size: usize,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            min_size: 7,
            max_size: 9,
        }
    }
}

/// Requirement map: trait -> remaining required count.
pub type Requirements = FxHashMap<TraitId, u32>;

/// Derive the initial requirement map from the catalog's target synergies,
/// subtracting forced emblem contributions and dropping anything already
/// satisfied.
pub fn derive_requirements(catalog: &Catalog) -> Requirements {
    let mut requirements = catalog.target_requirements();
    requirements.retain(|&t, need| {
        let forced = catalog.forced(t);
        if forced >= *need {
            false
        } else {
            *need -= forced;
            true
        }
    });
    requirements
}

/// Subtract an ad-hoc contribution set (an emblem combination under trial)
/// from a requirement map.
fn apply_contributions(mut requirements: Requirements, contributions: &TraitCounts) -> Requirements {
    for (&t, &count) in contributions {
        if let Some(need) = requirements.get_mut(&t) {
            if *need <= count {
                requirements.remove(&t);
            } else {
                *need -= count;
            }
        }
    }
    requirements
}

struct GoalSearch<'a> {
    catalog: &'a Catalog,
    config: GoalConfig,
    cancel: &'a CancelToken,
    requirements: Requirements,
    /// Ad-hoc forced contributions for this run (emblem combination).
    contributions: TraitCounts,
    team: Vec<ChampionId>,
    available: Vec<bool>,
    /// Member-only trait counts, maintained incrementally for pruning.
    counts: TraitCounts,
    solutions: FxHashSet<Vec<ChampionId>>,
}

impl<'a> GoalSearch<'a> {
    fn new(
        catalog: &'a Catalog,
        config: GoalConfig,
        requirements: Requirements,
        contributions: TraitCounts,
        cancel: &'a CancelToken,
    ) -> Self {
        GoalSearch {
            catalog,
            config,
            cancel,
            requirements,
            contributions,
            team: Vec::new(),
            available: vec![true; catalog.len()],
            counts: TraitCounts::default(),
            solutions: FxHashSet::default(),
        }
    }

    /// Most constrained open requirement: fewest available carriers per
    /// remaining needed count, ties broken by trait id for determinism.
    fn select_requirement(&self) -> Option<(TraitId, usize)> {
        let mut best: Option<(TraitId, usize, f64)> = None;
        for (&t, &need) in &self.requirements {
            let carriers = self
                .catalog
                .carriers(t)
                .iter()
                .filter(|c| self.available[c.index()])
                .count();
            let tightness = carriers as f64 / need as f64;
            let better = match best {
                None => true,
                Some((bt, _, bs)) => tightness < bs || (tightness == bs && t < bt),
            };
            if better {
                best = Some((t, carriers, tightness));
            }
        }
        best.map(|(t, carriers, _)| (t, carriers))
    }

    /// Add a champion: push onto the team, retire it from the availability
    /// set, bump counts, and decrement every requirement it satisfies.
    /// Returns the requirement entries to restore on undo.
    fn choose(&mut self, champ: ChampionId) -> Vec<(TraitId, u32)> {
        self.team.push(champ);
        self.available[champ.index()] = false;
        let mut touched = Vec::new();
        for &t in self.catalog.champion_traits(champ) {
            *self.counts.entry(t).or_insert(0) += 1;
            if let Some(&need) = self.requirements.get(&t) {
                touched.push((t, need));
                if need <= 1 {
                    self.requirements.remove(&t);
                } else {
                    self.requirements.insert(t, need - 1);
                }
            }
        }
        touched
    }

    /// Exact inverse of [`choose`]: the team, availability set, counts, and
    /// requirement map are restored to their pre-choice state.
    fn undo(&mut self, champ: ChampionId, touched: Vec<(TraitId, u32)>) {
        for (t, prior) in touched {
            self.requirements.insert(t, prior);
        }
        for &t in self.catalog.champion_traits(champ) {
            if let Some(count) = self.counts.get_mut(&t) {
                *count -= 1;
                if *count == 0 {
                    self.counts.remove(&t);
                }
            }
        }
        self.available[champ.index()] = true;
        let popped = self.team.pop();
        debug_assert_eq!(popped, Some(champ));
    }

    fn search(&mut self) {
        if self.cancel.is_cancelled() {
            return;
        }

        if self.requirements.is_empty() {
            if self.team.len() >= self.config.min_size
                && self.team.len() <= self.config.max_size
                && self
                    .catalog
                    .evaluate_with(&self.team, &self.contributions)
                    .is_some()
            {
                let mut solution = self.team.clone();
                solution.sort_unstable();
                if self.solutions.insert(solution) {
                    debug!(size = self.team.len(), "goal solution found");
                }
            }
            return;
        }

        if self.team.len() >= self.config.max_size {
            return;
        }
        let remaining_slots = self.config.max_size - self.team.len();
        if prune::should_prune(self.catalog, &self.counts, &self.contributions, remaining_slots) {
            return;
        }

        let Some((req_trait, carriers)) = self.select_requirement() else {
            return;
        };
        if carriers == 0 {
            // Unsatisfiable requirement: dead branch, not an error.
            return;
        }

        let candidates: Vec<ChampionId> = self
            .catalog
            .carriers(req_trait)
            .iter()
            .copied()
            .filter(|c| self.available[c.index()])
            .collect();
        for champ in candidates {
            let touched = self.choose(champ);
            self.search();
            self.undo(champ, touched);
        }
    }
}

/// Run one goal-directed search with ad-hoc forced contributions. Returns
/// the deduplicated solution set as canonically sorted teams, themselves
/// sorted for deterministic output.
pub fn solve_with(
    catalog: &Catalog,
    config: &GoalConfig,
    requirements: Requirements,
    contributions: TraitCounts,
    cancel: &CancelToken,
) -> Vec<Vec<ChampionId>> {
    let mut search = GoalSearch::new(catalog, *config, requirements, contributions, cancel);
    search.search();
    let mut solutions: Vec<Vec<ChampionId>> = search.solutions.into_iter().collect();
    solutions.sort_unstable();
    solutions
}

/// Run one goal-directed search against catalog-level emblems only.
pub fn solve(
    catalog: &Catalog,
    config: &GoalConfig,
    requirements: Requirements,
    cancel: &CancelToken,
) -> Vec<Vec<ChampionId>> {
    solve_with(catalog, config, requirements, TraitCounts::default(), cancel)
}

/// Outer embarrassingly parallel loop: one independent backtracking run per
/// `combo_size`-combination of the emblem pool, each subtracting its
/// combination from the base requirements. Solutions are merged and
/// deduplicated across runs; each team carries the contribution map it was
/// validated under (the first combination to produce it, in combination
/// order), so callers can render the counts that made it valid.
pub fn solve_emblem_combinations(
    catalog: &Catalog,
    config: &GoalConfig,
    base_requirements: &Requirements,
    emblem_pool: &[TraitId],
    combo_size: usize,
    cancel: &CancelToken,
) -> Vec<(Vec<ChampionId>, TraitCounts)> {
    let combos: Vec<Vec<TraitId>> = Combinations::new(emblem_pool.len(), combo_size)
        .map(|picks| picks.into_iter().map(|i| emblem_pool[i.index()]).collect())
        .collect();
    info!(
        combos = combos.len(),
        pool = emblem_pool.len(),
        combo_size,
        "goal search over emblem combinations"
    );

    let per_combo: Vec<(TraitCounts, Vec<Vec<ChampionId>>)> = combos
        .par_iter()
        .map(|combo| {
            let mut contributions = TraitCounts::default();
            for &t in combo {
                *contributions.entry(t).or_insert(0) += 1;
            }
            let requirements = apply_contributions(base_requirements.clone(), &contributions);
            if requirements.is_empty() {
                // The emblems alone satisfy every target; there is no team
                // to search for under this combination.
                return (contributions, Vec::new());
            }
            let teams = solve_with(catalog, config, requirements, contributions.clone(), cancel);
            (contributions, teams)
        })
        .collect();

    let mut seen: FxHashSet<Vec<ChampionId>> = FxHashSet::default();
    let mut solutions: Vec<(Vec<ChampionId>, TraitCounts)> = Vec::new();
    for (contributions, teams) in per_combo {
        for team in teams {
            if seen.insert(team.clone()) {
                solutions.push((team, contributions.clone()));
            }
        }
    }
    solutions.sort_unstable_by(|(a, _), (b, _)| a.cmp(b));
    solutions
}
