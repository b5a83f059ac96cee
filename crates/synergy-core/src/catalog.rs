//! Immutable champion/trait catalog shared by all search workers.
//!
//! The catalog interns champion and trait names to dense `u32` ids at build
//! time, so the hot evaluation path works on integer ids instead of strings.
//! After [`Catalog::build`] returns, the structure is never mutated; workers
//! share it behind a plain reference or an `Arc` without locking.
//!
//! # Inputs
//!
//! Two record streams, produced by out-of-scope collaborators:
//!
//! - champion records `{name, traits}` (either a bare JSON array or wrapped
//!   in a `{"champions_and_traits": [...]}` object)
//! - threshold records `{synergy_name, count, targetSynergy}`; multiple
//!   records per synergy form its ascending breakpoint sequence
//!
//! A third input, the forced-contribution ("emblem") list, layers extra
//! per-trait counts on top of any team without consuming a team slot.

use crate::error::{Result, SynergyError};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Dense id of a champion in the catalog.
///
/// Ids are assigned in sorted-name order, so iterating `0..catalog.len()`
/// enumerates champions in a canonical, deterministic order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChampionId(pub u32);

impl ChampionId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense id of a trait (synergy label).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TraitId(pub u32);

impl TraitId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One champion record from the catalog file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionRecord {
    pub name: String,
    pub traits: Vec<String>,
}

/// One row of the synergy threshold table.
///
/// Multiple rows may share a `synergy_name` with different `count` values;
/// together they form that synergy's breakpoint sequence. Rows flagged
/// `targetSynergy` seed the goal-directed requirement map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdRecord {
    pub synergy_name: String,
    pub count: i64,
    #[serde(rename = "targetSynergy", default)]
    pub target_synergy: bool,
}

/// Champion input file, in either of the two shapes the collaborators emit.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ChampionFile {
    /// Bare array of champion records
    List(Vec<ChampionRecord>),
    /// Records wrapped in a `champions_and_traits` object
    Wrapped {
        champions_and_traits: Vec<ChampionRecord>,
    },
}

impl ChampionFile {
    /// Unwrap into the flat record list.
    pub fn into_records(self) -> Vec<ChampionRecord> {
        match self {
            ChampionFile::List(records) => records,
            ChampionFile::Wrapped {
                champions_and_traits,
            } => champions_and_traits,
        }
    }
}

/// Read-only catalog: champions, traits, breakpoints, and derived indexes.
#[derive(Debug)]
pub struct Catalog {
    /// Champion names, indexed by `ChampionId` (sorted ascending)
    champion_names: Vec<String>,
    /// Trait ids carried by each champion, indexed by `ChampionId`
    champion_traits: Vec<Vec<TraitId>>,
    /// Trait names, indexed by `TraitId`
    trait_names: Vec<String>,
    /// Name -> trait id lookup
    trait_ids: FxHashMap<String, TraitId>,
    /// Ascending, deduplicated breakpoints per trait; empty means the trait
    /// is absent from the threshold table and never constrains validity
    breakpoints: Vec<Vec<u32>>,
    /// Traits whose breakpoint sequence is exactly `[1]`
    unique: Vec<bool>,
    /// Forced contribution per trait (emblems), independent of team slots
    forced: Vec<u32>,
    /// Trait -> champions carrying it, each list in ascending id order
    carriers: Vec<Vec<ChampionId>>,
    /// Highest `targetSynergy` count per flagged trait
    targets: Vec<(TraitId, u32)>,
}

impl Catalog {
    /// Build the catalog from input records and a forced-contribution list.
    ///
    /// Fails with [`SynergyError::MalformedCatalog`] if a champion has no
    /// traits or a name appears twice, and [`SynergyError::MalformedThresholds`]
    /// if a breakpoint is non-positive. Emblems naming traits unknown to both
    /// inputs are interned as new traits; their forced count still exempts
    /// them from the wasted-trait check.
    pub fn build(
        champions: Vec<ChampionRecord>,
        thresholds: Vec<ThresholdRecord>,
        emblems: &[String],
    ) -> Result<Self> {
        if champions.is_empty() {
            return Err(SynergyError::malformed_catalog("no champions in catalog"));
        }

        // Sorted-name order gives champions a canonical enumeration order.
        let mut champions = champions;
        champions.sort_by(|a, b| a.name.cmp(&b.name));
        for pair in champions.windows(2) {
            if pair[0].name == pair[1].name {
                return Err(SynergyError::malformed_catalog(format!(
                    "duplicate champion name: {}",
                    pair[0].name
                )));
            }
        }

        let mut trait_names: Vec<String> = Vec::new();
        let mut trait_ids: FxHashMap<String, TraitId> = FxHashMap::default();
        let mut intern = |name: &str, trait_names: &mut Vec<String>| -> TraitId {
            if let Some(&id) = trait_ids.get(name) {
                return id;
            }
            let id = TraitId(trait_names.len() as u32);
            trait_names.push(name.to_string());
            trait_ids.insert(name.to_string(), id);
            id
        };

        let mut champion_names = Vec::with_capacity(champions.len());
        let mut champion_traits = Vec::with_capacity(champions.len());
        for record in &champions {
            if record.traits.is_empty() {
                return Err(SynergyError::malformed_catalog(format!(
                    "champion {} has no traits",
                    record.name
                )));
            }
            let ids: Vec<TraitId> = record
                .traits
                .iter()
                .map(|t| intern(t, &mut trait_names))
                .collect();
            champion_names.push(record.name.clone());
            champion_traits.push(ids);
        }

        let mut breakpoint_sets: FxHashMap<TraitId, Vec<u32>> = FxHashMap::default();
        let mut target_counts: FxHashMap<TraitId, u32> = FxHashMap::default();
        for record in &thresholds {
            if record.count <= 0 {
                return Err(SynergyError::malformed_thresholds(format!(
                    "synergy {} has non-positive breakpoint {}",
                    record.synergy_name, record.count
                )));
            }
            let id = intern(&record.synergy_name, &mut trait_names);
            let count = record.count as u32;
            breakpoint_sets.entry(id).or_default().push(count);
            if record.target_synergy {
                let entry = target_counts.entry(id).or_insert(count);
                *entry = (*entry).max(count);
            }
        }

        let mut forced_counts: FxHashMap<TraitId, u32> = FxHashMap::default();
        for emblem in emblems {
            let id = intern(emblem, &mut trait_names);
            *forced_counts.entry(id).or_insert(0) += 1;
        }

        let trait_count = trait_names.len();
        let mut breakpoints = vec![Vec::new(); trait_count];
        for (id, mut counts) in breakpoint_sets {
            counts.sort_unstable();
            counts.dedup();
            breakpoints[id.index()] = counts;
        }
        let unique: Vec<bool> = breakpoints.iter().map(|bps| bps.as_slice() == [1]).collect();

        let mut forced = vec![0u32; trait_count];
        for (id, count) in forced_counts {
            forced[id.index()] = count;
        }

        let mut carriers = vec![Vec::new(); trait_count];
        for (champ_idx, traits) in champion_traits.iter().enumerate() {
            for &t in traits {
                carriers[t.index()].push(ChampionId(champ_idx as u32));
            }
        }

        let mut targets: Vec<(TraitId, u32)> = target_counts.into_iter().collect();
        targets.sort_unstable_by_key(|&(t, _)| t);

        Ok(Catalog {
            champion_names,
            champion_traits,
            trait_names,
            trait_ids,
            breakpoints,
            unique,
            forced,
            carriers,
            targets,
        })
    }

    /// Number of champions in the catalog.
    #[inline]
    pub fn len(&self) -> usize {
        self.champion_names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.champion_names.is_empty()
    }

    /// Number of distinct traits seen across all inputs.
    #[inline]
    pub fn trait_count(&self) -> usize {
        self.trait_names.len()
    }

    #[inline]
    pub fn champion_name(&self, id: ChampionId) -> &str {
        &self.champion_names[id.index()]
    }

    /// Champion id for a name, if present.
    pub fn champion_id(&self, name: &str) -> Option<ChampionId> {
        self.champion_names
            .binary_search_by(|n| n.as_str().cmp(name))
            .ok()
            .map(|idx| ChampionId(idx as u32))
    }

    /// All champion ids in canonical order.
    pub fn champion_ids(&self) -> impl Iterator<Item = ChampionId> + '_ {
        (0..self.champion_names.len() as u32).map(ChampionId)
    }

    #[inline]
    pub fn trait_name(&self, id: TraitId) -> &str {
        &self.trait_names[id.index()]
    }

    pub fn trait_id(&self, name: &str) -> Option<TraitId> {
        self.trait_ids.get(name).copied()
    }

    /// Trait ids carried by a champion.
    #[inline]
    pub fn champion_traits(&self, id: ChampionId) -> &[TraitId] {
        &self.champion_traits[id.index()]
    }

    /// Ascending breakpoint sequence for a trait; empty when the trait is
    /// absent from the threshold table.
    #[inline]
    pub fn breakpoints(&self, id: TraitId) -> &[u32] {
        &self.breakpoints[id.index()]
    }

    /// Lowest activation breakpoint for a trait, if it has any.
    #[inline]
    pub fn lowest_breakpoint(&self, id: TraitId) -> Option<u32> {
        self.breakpoints[id.index()].first().copied()
    }

    /// Whether presence alone activates this trait (breakpoints == `[1]`).
    #[inline]
    pub fn is_unique(&self, id: TraitId) -> bool {
        self.unique[id.index()]
    }

    /// Forced (emblem) contribution for a trait.
    #[inline]
    pub fn forced(&self, id: TraitId) -> u32 {
        self.forced[id.index()]
    }

    /// Champions carrying a trait, in ascending id order.
    #[inline]
    pub fn carriers(&self, id: TraitId) -> &[ChampionId] {
        &self.carriers[id.index()]
    }

    /// Per-trait required counts derived from `targetSynergy` rows: the
    /// highest flagged count per trait, before forced contributions are
    /// subtracted.
    pub fn target_requirements(&self) -> FxHashMap<TraitId, u32> {
        self.targets.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn champ(name: &str, traits: &[&str]) -> ChampionRecord {
        ChampionRecord {
            name: name.to_string(),
            traits: traits.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn threshold(name: &str, count: i64, target: bool) -> ThresholdRecord {
        ThresholdRecord {
            synergy_name: name.to_string(),
            count,
            target_synergy: target,
        }
    }

    #[test]
    fn build_interns_and_indexes() {
        let catalog = Catalog::build(
            vec![champ("B", &["x"]), champ("A", &["x", "y"])],
            vec![
                threshold("x", 2, false),
                threshold("x", 4, false),
                threshold("y", 2, false),
            ],
            &[],
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        // Canonical order is sorted by name.
        assert_eq!(catalog.champion_name(ChampionId(0)), "A");
        assert_eq!(catalog.champion_name(ChampionId(1)), "B");
        assert_eq!(catalog.champion_id("B"), Some(ChampionId(1)));
        assert_eq!(catalog.champion_id("Z"), None);

        let x = catalog.trait_id("x").unwrap();
        let y = catalog.trait_id("y").unwrap();
        assert_eq!(catalog.breakpoints(x), &[2, 4]);
        assert_eq!(catalog.lowest_breakpoint(y), Some(2));
        assert_eq!(catalog.carriers(x).len(), 2);
        assert_eq!(catalog.carriers(y), &[ChampionId(0)]);
    }

    #[test]
    fn duplicate_breakpoints_are_deduplicated() {
        let catalog = Catalog::build(
            vec![champ("A", &["x"])],
            vec![
                threshold("x", 2, false),
                threshold("x", 2, true),
                threshold("x", 4, false),
            ],
            &[],
        )
        .unwrap();
        let x = catalog.trait_id("x").unwrap();
        assert_eq!(catalog.breakpoints(x), &[2, 4]);
    }

    #[test]
    fn unique_trait_detection() {
        let catalog = Catalog::build(
            vec![champ("A", &["solo", "x"])],
            vec![threshold("solo", 1, false), threshold("x", 2, false)],
            &[],
        )
        .unwrap();
        assert!(catalog.is_unique(catalog.trait_id("solo").unwrap()));
        assert!(!catalog.is_unique(catalog.trait_id("x").unwrap()));
    }

    #[test]
    fn target_requirements_take_maximum_count() {
        let catalog = Catalog::build(
            vec![champ("A", &["x"])],
            vec![
                threshold("x", 2, true),
                threshold("x", 6, true),
                threshold("x", 4, false),
            ],
            &[],
        )
        .unwrap();
        let x = catalog.trait_id("x").unwrap();
        assert_eq!(catalog.target_requirements().get(&x), Some(&6));
    }

    #[test]
    fn emblems_accumulate_and_intern_new_traits() {
        let catalog = Catalog::build(
            vec![champ("A", &["x"])],
            vec![threshold("x", 2, false)],
            &["x".to_string(), "x".to_string(), "ghost".to_string()],
        )
        .unwrap();
        assert_eq!(catalog.forced(catalog.trait_id("x").unwrap()), 2);
        let ghost = catalog.trait_id("ghost").unwrap();
        assert_eq!(catalog.forced(ghost), 1);
        assert!(catalog.breakpoints(ghost).is_empty());
    }

    #[test]
    fn rejects_champion_without_traits() {
        let err = Catalog::build(vec![champ("A", &[])], vec![], &[]).unwrap_err();
        assert!(matches!(err, SynergyError::MalformedCatalog(_)));
    }

    #[test]
    fn rejects_duplicate_champion() {
        let err = Catalog::build(
            vec![champ("A", &["x"]), champ("A", &["y"])],
            vec![],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SynergyError::MalformedCatalog(_)));
    }

    #[test]
    fn rejects_non_positive_breakpoint() {
        let err = Catalog::build(
            vec![champ("A", &["x"])],
            vec![threshold("x", 0, false)],
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, SynergyError::MalformedThresholds(_)));
    }

    #[test]
    fn champion_file_accepts_both_shapes() {
        let bare: ChampionFile =
            serde_json::from_str(r#"[{"name":"A","traits":["x"]}]"#).unwrap();
        assert_eq!(bare.into_records().len(), 1);

        let wrapped: ChampionFile = serde_json::from_str(
            r#"{"champions_and_traits":[{"name":"A","traits":["x"]},{"name":"B","traits":["y"]}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.into_records().len(), 2);
    }
}
