//! Criterion benchmarks for composition search
//!
//! Measures the two hot paths in isolation:
//! 1. Single-team validity evaluation (the per-candidate cost)
//! 2. Serial exhaustive enumeration over a synthetic catalog

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use synergy_core::{Catalog, ChampionId, ChampionRecord, CompositionRecord, ThresholdRecord};
use synergy_search::{exhaustive, CancelToken, ExhaustiveConfig};

/// Synthetic catalog: `n` champions, each carrying 3 of 12 traits in a
/// rotating pattern, with breakpoints of 2/4 per trait.
fn synthetic_catalog(n: usize) -> Catalog {
    const TRAITS: usize = 12;
    let champions = (0..n)
        .map(|i| ChampionRecord {
            name: format!("champ{i:02}"),
            traits: (0..3).map(|j| format!("trait{:02}", (i + j * 5) % TRAITS)).collect(),
        })
        .collect();
    let mut thresholds = Vec::new();
    for t in 0..TRAITS {
        for count in [2i64, 4] {
            thresholds.push(ThresholdRecord {
                synergy_name: format!("trait{t:02}"),
                count,
                target_synergy: false,
            });
        }
    }
    Catalog::build(champions, thresholds, &[]).expect("synthetic catalog is well formed")
}

fn bench_evaluate(c: &mut Criterion) {
    let catalog = synthetic_catalog(40);
    let team: Vec<ChampionId> = (0..8).map(ChampionId).collect();

    c.bench_function("evaluate_team_of_8", |b| {
        b.iter(|| black_box(catalog.evaluate(black_box(&team))))
    });
}

fn bench_exhaustive_serial(c: &mut Criterion) {
    let mut group = c.benchmark_group("exhaustive_serial");
    for (n, k) in [(20usize, 4usize), (24, 4), (20, 5)] {
        let catalog = synthetic_catalog(n);
        let config = ExhaustiveConfig {
            team_size: k,
            ..ExhaustiveConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("n{n}_k{k}")),
            &catalog,
            |b, catalog| {
                b.iter(|| {
                    let mut out: Vec<CompositionRecord> = Vec::new();
                    exhaustive::run_serial(catalog, &config, &CancelToken::new(), &mut out)
                        .expect("serial run succeeds");
                    black_box(out)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_evaluate, bench_exhaustive_serial);
criterion_main!(benches);
