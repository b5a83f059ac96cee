//! Property-based tests for the composition search engine
//!
//! These tests verify the search invariants across randomized catalogs:
//! exact team size, full-activation validity of everything produced,
//! set-level agreement between serial and parallel runs, rejection of
//! under-filled counts, and soundness of the branch-and-bound prune.

use proptest::prelude::*;
use rustc_hash::FxHashSet;
use synergy_core::{Catalog, ChampionId, ChampionRecord, CompositionRecord, ThresholdRecord, TraitCounts};
use synergy_search::{
    exhaustive, goal, prune, CancelToken, Combinations, ExhaustiveConfig, GoalConfig,
};

// ============================================================================
// Random catalog generation
// ============================================================================

const TRAIT_POOL: [&str; 5] = ["t0", "t1", "t2", "t3", "t4"];

/// Raw material for a small random catalog: per-champion trait picks and a
/// lowest breakpoint per trait (1 makes the trait unique).
#[derive(Debug, Clone)]
struct CatalogSpec {
    champion_traits: Vec<Vec<usize>>,
    lowest_breakpoints: Vec<u32>,
    second_breakpoints: Vec<bool>,
}

fn arb_catalog_spec(max_champions: usize) -> impl Strategy<Value = CatalogSpec> {
    let champions = prop::collection::vec(
        prop::collection::btree_set(0..TRAIT_POOL.len(), 1..=3),
        2..=max_champions,
    );
    let lowest = prop::collection::vec(1u32..=4, TRAIT_POOL.len());
    let second = prop::collection::vec(any::<bool>(), TRAIT_POOL.len());
    (champions, lowest, second).prop_map(|(champs, lowest_breakpoints, second_breakpoints)| {
        CatalogSpec {
            champion_traits: champs.into_iter().map(|s| s.into_iter().collect()).collect(),
            lowest_breakpoints,
            second_breakpoints,
        }
    })
}

fn build_catalog(spec: &CatalogSpec, targets: &[usize]) -> Catalog {
    let champions = spec
        .champion_traits
        .iter()
        .enumerate()
        .map(|(i, traits)| ChampionRecord {
            name: format!("c{i:02}"),
            traits: traits.iter().map(|&t| TRAIT_POOL[t].to_string()).collect(),
        })
        .collect();
    let mut thresholds = Vec::new();
    for (t, &lowest) in spec.lowest_breakpoints.iter().enumerate() {
        thresholds.push(ThresholdRecord {
            synergy_name: TRAIT_POOL[t].to_string(),
            count: lowest as i64,
            target_synergy: targets.contains(&t),
        });
        if spec.second_breakpoints[t] {
            thresholds.push(ThresholdRecord {
                synergy_name: TRAIT_POOL[t].to_string(),
                count: (lowest + 2) as i64,
                target_synergy: false,
            });
        }
    }
    Catalog::build(champions, thresholds, &[]).expect("generated catalog is well formed")
}

fn canonical_keys(records: &[CompositionRecord]) -> Vec<Vec<String>> {
    let mut keys: Vec<Vec<String>> = records.iter().map(|r| r.champions.clone()).collect();
    keys.sort();
    keys
}

fn ids_by_name(catalog: &Catalog, names: &[String]) -> Vec<ChampionId> {
    names
        .iter()
        .map(|n| catalog.champion_id(n).expect("name came from the catalog"))
        .collect()
}

// ============================================================================
// Exhaustive strategy properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Every produced composition has exactly `team_size` members, passes
    /// re-evaluation, and appears once.
    #[test]
    fn prop_exhaustive_output_is_valid_and_unique(
        spec in arb_catalog_spec(7),
        team_size in 1usize..=3,
    ) {
        prop_assume!(team_size <= spec.champion_traits.len());
        let catalog = build_catalog(&spec, &[]);
        let config = ExhaustiveConfig {
            team_size,
            batch_size: 3,
            ..ExhaustiveConfig::default()
        };

        let mut out: Vec<CompositionRecord> = Vec::new();
        let summary =
            exhaustive::run_serial(&catalog, &config, &CancelToken::new(), &mut out).unwrap();
        prop_assert_eq!(
            summary.examined,
            exhaustive::combination_count(catalog.len(), team_size)
        );

        let mut seen = FxHashSet::default();
        for record in &out {
            prop_assert_eq!(record.champions.len(), team_size);
            let team = ids_by_name(&catalog, &record.champions);
            prop_assert!(catalog.evaluate(&team).is_some());
            prop_assert!(seen.insert(record.champions.clone()), "duplicate composition");
        }
    }

    /// The parallel runner produces exactly the serial result set.
    #[test]
    fn prop_parallel_matches_serial(
        spec in arb_catalog_spec(7),
        team_size in 1usize..=3,
    ) {
        prop_assume!(team_size <= spec.champion_traits.len());
        let catalog = build_catalog(&spec, &[]);
        let config = ExhaustiveConfig {
            team_size,
            batch_size: 2,
            threads: Some(2),
            ..ExhaustiveConfig::default()
        };

        let mut serial: Vec<CompositionRecord> = Vec::new();
        exhaustive::run_serial(&catalog, &config, &CancelToken::new(), &mut serial).unwrap();
        let mut parallel: Vec<CompositionRecord> = Vec::new();
        exhaustive::run_parallel(&catalog, &config, &CancelToken::new(), &mut parallel).unwrap();

        prop_assert_eq!(canonical_keys(&serial), canonical_keys(&parallel));
    }

    /// A count strictly between zero and the lowest breakpoint of a
    /// non-unique, non-forced trait is always rejected.
    #[test]
    fn prop_under_filled_count_is_rejected(
        spec in arb_catalog_spec(6),
        trait_idx in 0usize..TRAIT_POOL.len(),
    ) {
        let catalog = build_catalog(&spec, &[]);
        let t = catalog.trait_id(TRAIT_POOL[trait_idx]).expect("trait in pool");
        let lowest = catalog.lowest_breakpoint(t).expect("trait has breakpoints");
        prop_assume!(lowest > 1);
        let no_extra = TraitCounts::default();
        for count in 1..lowest {
            prop_assert!(!catalog.is_acceptable_with(t, count, &no_extra));
        }
        prop_assert!(catalog.is_acceptable_with(t, lowest, &no_extra));
    }
}

// ============================================================================
// Pruning soundness
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// If the heuristic predicts infeasibility for a partial team, no
    /// completion within the remaining slot budget is valid: re-check the
    /// whole subtree exhaustively.
    #[test]
    fn prop_prune_never_cuts_a_feasible_branch(
        spec in arb_catalog_spec(7),
        partial_picks in prop::collection::btree_set(0usize..7, 1..=3),
        remaining_slots in 0usize..=2,
    ) {
        let catalog = build_catalog(&spec, &[]);
        let partial: Vec<ChampionId> = partial_picks
            .into_iter()
            .filter(|&i| i < catalog.len())
            .map(|i| ChampionId(i as u32))
            .collect();
        prop_assume!(!partial.is_empty());

        let counts = catalog.trait_counts(&partial);
        let no_extra = TraitCounts::default();
        prop_assume!(prune::should_prune(&catalog, &counts, &no_extra, remaining_slots));

        let rest: Vec<ChampionId> = catalog
            .champion_ids()
            .filter(|c| !partial.contains(c))
            .collect();
        for size in 0..=remaining_slots.min(rest.len()) {
            for picks in Combinations::new(rest.len(), size) {
                let mut team = partial.clone();
                team.extend(picks.into_iter().map(|i| rest[i.index()]));
                prop_assert!(
                    catalog.evaluate(&team).is_none(),
                    "pruned branch had a valid completion"
                );
            }
        }
    }
}

// ============================================================================
// Goal-directed strategy properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every goal solution meets the size window, every target requirement,
    /// and full-activation validity.
    #[test]
    fn prop_goal_solutions_meet_requirements(
        spec in arb_catalog_spec(7),
        targets in prop::collection::btree_set(0usize..TRAIT_POOL.len(), 1..=2),
    ) {
        let targets: Vec<usize> = targets.into_iter().collect();
        let catalog = build_catalog(&spec, &targets);
        let requirements = goal::derive_requirements(&catalog);
        let config = GoalConfig { min_size: 1, max_size: 4 };

        let solutions = goal::solve(&catalog, &config, requirements.clone(), &CancelToken::new());
        for team in &solutions {
            prop_assert!(team.len() >= config.min_size && team.len() <= config.max_size);
            let counts = catalog.evaluate(team);
            prop_assert!(counts.is_some());
            let counts = counts.unwrap();
            for (&t, &need) in &requirements {
                prop_assert!(counts.get(&t).copied().unwrap_or(0) >= need);
            }
        }

        // Solutions are canonical and unique.
        let mut deduped = solutions.clone();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), solutions.len());
    }
}
