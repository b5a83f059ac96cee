//! Branch-and-bound pruning for partial teams.
//!
//! Every additional pick raises a given trait's count by at most one, so a
//! touched, non-unique, non-forced trait sitting `d` below its lowest
//! breakpoint needs at least `d` more members. The maximum such deficit over
//! the traits a partial team touches is therefore a sound lower bound on the
//! picks still required; if it exceeds the remaining slot budget the branch
//! cannot be completed and is cut.
//!
//! The bound is cheap (one pass over the traits the partial team touches)
//! and intentionally loose: it ignores that distinct deficits compete for
//! the same slots. False negatives (failing to prune) only cost time; a
//! false positive would silently lose solutions, so the bound never exceeds
//! the true number of picks a completion needs.

use synergy_core::{Catalog, TraitCounts};

/// Lower bound on the additional picks needed to repair every under-filled
/// trait in `counts`. Traits in `extra` count as forced and are exempt.
pub fn deficit_lower_bound(catalog: &Catalog, counts: &TraitCounts, extra: &TraitCounts) -> usize {
    let mut bound = 0u32;
    for (&t, &count) in counts {
        if count == 0
            || catalog.is_unique(t)
            || catalog.forced(t) > 0
            || extra.contains_key(&t)
        {
            continue;
        }
        if let Some(min) = catalog.lowest_breakpoint(t) {
            if count < min {
                bound = bound.max(min - count);
            }
        }
    }
    bound as usize
}

/// Whether a partial team with `remaining_slots` picks left can be abandoned.
#[inline]
pub fn should_prune(
    catalog: &Catalog,
    counts: &TraitCounts,
    extra: &TraitCounts,
    remaining_slots: usize,
) -> bool {
    deficit_lower_bound(catalog, counts, extra) > remaining_slots
}
