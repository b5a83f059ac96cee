//! Exhaustive k-subset enumeration with parallel work distribution.
//!
//! Enumerates every k-combination of the catalog in canonical lexicographic
//! id order and evaluates each subset independently. The space is
//! embarrassingly parallel: combinations are cut into fixed-size batches,
//! batches are distributed over a rayon pool, and each worker sends only its
//! successes over a bounded channel into the single writer owning the sink.
//! Result arrival order is unordered by design; the output is a *set* of
//! records, identical across serial and parallel runs.
//!
//! Workers never touch the sink. The one mutable shared resource is the
//! fan-in channel, so no lock sits on the evaluation path.

use crate::cancel::CancelToken;
use std::sync::atomic::{AtomicU64, Ordering};
use synergy_core::{Catalog, ChampionId, RecordWriter, Result, SynergyError};
use tracing::{debug, info};

/// Bounded fan-in capacity between workers and the writer. Keeps peak
/// memory at a few batches' worth of records when the writer falls behind.
const CHANNEL_CAPACITY: usize = 4096;

/// Cancellation/progress check interval for the serial runner.
const SERIAL_CHECK_INTERVAL: u64 = 8192;

/// Configuration for an exhaustive run.
#[derive(Debug, Clone)]
pub struct ExhaustiveConfig {
    /// Exact team size k.
    pub team_size: usize,

    /// Combinations per work batch. Larger batches reduce coordination
    /// overhead, smaller batches improve load balance and cancellation
    /// latency.
    pub batch_size: usize,

    /// Worker threads. `None` uses one per logical CPU.
    pub threads: Option<usize>,

    /// Minimum number of combinations before the parallel runner is used.
    /// Below this, serial execution avoids pool and channel overhead.
    pub min_combinations_for_parallel: u64,

    /// Emit a progress log every this many processed combinations.
    pub progress_interval: u64,
}

impl Default for ExhaustiveConfig {
    fn default() -> Self {
        Self {
            team_size: 8,
            batch_size: 10_000,
            threads: None,
            min_combinations_for_parallel: 50_000,
            progress_interval: 100_000_000,
        }
    }
}

/// Outcome of a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchSummary {
    /// Combinations examined (equals the full space unless cancelled).
    pub examined: u64,
    /// Valid compositions written to the sink.
    pub found: u64,
    /// Whether the run was cancelled before exhausting the space.
    pub cancelled: bool,
}

/// Check that a requested team size fits the catalog.
pub fn validate_team_size(catalog: &Catalog, team_size: usize) -> Result<()> {
    if team_size == 0 || team_size > catalog.len() {
        return Err(SynergyError::InvalidTeamSize {
            size: team_size,
            catalog_size: catalog.len(),
        });
    }
    Ok(())
}

/// Number of k-combinations of an n-element set, saturating at `u64::MAX`.
pub fn combination_count(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        result = result * (n - i) as u128 / (i + 1) as u128;
        if result > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    result as u64
}

/// Lexicographic k-combination enumerator over catalog ids.
///
/// Yields index tuples in strictly increasing order with no cross-subset
/// state, so any contiguous run of the stream forms an independent batch.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<u32>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Combinations {
            n,
            k,
            indices: Vec::new(),
            started: false,
            done: k > n,
        }
    }

    fn current(&self) -> Vec<ChampionId> {
        self.indices.iter().map(|&i| ChampionId(i)).collect()
    }
}

impl Iterator for Combinations {
    type Item = Vec<ChampionId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            self.indices = (0..self.k as u32).collect();
            return Some(self.current());
        }
        // Advance the rightmost index that still has headroom, then reset
        // everything to its right.
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if (self.indices[i] as usize) < self.n - self.k + i {
                self.indices[i] += 1;
                for j in i + 1..self.k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return Some(self.current());
            }
        }
    }
}

/// Groups a combination stream into batches of at most `batch_size`.
///
/// Ends the stream once the token is cancelled: `par_bridge` pulls batches
/// from this iterator for as long as it yields, so stopping here is what
/// stops enumeration of the remaining space, not the per-batch worker check.
struct Batches<'a> {
    inner: Combinations,
    batch_size: usize,
    cancel: &'a CancelToken,
}

impl Iterator for Batches<'_> {
    type Item = Vec<Vec<ChampionId>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let mut batch = Vec::with_capacity(self.batch_size);
        for team in self.inner.by_ref().take(self.batch_size) {
            batch.push(team);
        }
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

/// Run the exhaustive strategy, choosing serial or parallel execution based
/// on the size of the space.
pub fn run<W: RecordWriter>(
    catalog: &Catalog,
    config: &ExhaustiveConfig,
    cancel: &CancelToken,
    out: &mut W,
) -> Result<SearchSummary> {
    validate_team_size(catalog, config.team_size)?;
    let total = combination_count(catalog.len(), config.team_size);
    if total < config.min_combinations_for_parallel {
        debug!(
            total,
            threshold = config.min_combinations_for_parallel,
            "running serial (space below parallel threshold)"
        );
        run_serial(catalog, config, cancel, out)
    } else {
        run_parallel(catalog, config, cancel, out)
    }
}

/// Single-threaded exhaustive run.
pub fn run_serial<W: RecordWriter>(
    catalog: &Catalog,
    config: &ExhaustiveConfig,
    cancel: &CancelToken,
    out: &mut W,
) -> Result<SearchSummary> {
    validate_team_size(catalog, config.team_size)?;
    let total = combination_count(catalog.len(), config.team_size);
    let mut examined = 0u64;
    let mut found = 0u64;

    for team in Combinations::new(catalog.len(), config.team_size) {
        if examined % SERIAL_CHECK_INTERVAL == 0 && cancel.is_cancelled() {
            break;
        }
        if let Some(counts) = catalog.evaluate(&team) {
            out.write_record(catalog.composition_record(&team, &counts))?;
            found += 1;
        }
        examined += 1;
        if examined % config.progress_interval == 0 {
            info!(
                examined,
                total,
                found,
                "exhaustive progress: {:.2}%",
                examined as f64 / total as f64 * 100.0
            );
        }
    }

    Ok(SearchSummary {
        examined,
        found,
        cancelled: cancel.is_cancelled(),
    })
}

/// Parallel exhaustive run: batched enumeration over a rayon pool, fan-in
/// channel, single writer on the calling thread.
pub fn run_parallel<W: RecordWriter>(
    catalog: &Catalog,
    config: &ExhaustiveConfig,
    cancel: &CancelToken,
    out: &mut W,
) -> Result<SearchSummary> {
    use rayon::iter::{ParallelBridge, ParallelIterator};

    validate_team_size(catalog, config.team_size)?;
    let threads = config.threads.unwrap_or_else(num_cpus::get).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| SynergyError::Io(std::io::Error::other(e)))?;

    let total = combination_count(catalog.len(), config.team_size);
    info!(
        champions = catalog.len(),
        team_size = config.team_size,
        total,
        threads,
        batch_size = config.batch_size,
        "starting parallel exhaustive search"
    );

    let (tx, rx) = crossbeam_channel::bounded(CHANNEL_CAPACITY);
    let examined = AtomicU64::new(0);
    let progress_interval = config.progress_interval.max(1);
    let batches = Batches {
        inner: Combinations::new(catalog.len(), config.team_size),
        batch_size: config.batch_size.max(1),
        cancel,
    };

    let mut found = 0u64;
    let mut write_err: Option<SynergyError> = None;

    std::thread::scope(|scope| {
        let producer = scope.spawn(|| {
            pool.install(|| {
                batches.par_bridge().for_each_with(tx, |tx, batch| {
                    if cancel.is_cancelled() {
                        return;
                    }
                    for team in &batch {
                        if let Some(counts) = catalog.evaluate(team) {
                            // A send error means the writer is gone; stop
                            // producing, the run is over.
                            if tx.send(catalog.composition_record(team, &counts)).is_err() {
                                return;
                            }
                        }
                    }
                    let done = examined.fetch_add(batch.len() as u64, Ordering::Relaxed)
                        + batch.len() as u64;
                    if done / progress_interval != (done - batch.len() as u64) / progress_interval {
                        info!(
                            examined = done,
                            total,
                            "exhaustive progress: {:.2}%",
                            done as f64 / total as f64 * 100.0
                        );
                    }
                });
            });
        });

        // Single writer: drains the unordered result stream as it arrives.
        for record in &rx {
            match out.write_record(record) {
                Ok(()) => found += 1,
                Err(e) => {
                    // Persisting failed: stop the workers and abandon the
                    // run without touching already-written records.
                    write_err = Some(e);
                    cancel.cancel();
                    break;
                }
            }
        }
        // Unblock any worker parked on the bounded channel.
        for _ in &rx {}

        if producer.join().is_err() {
            write_err.get_or_insert_with(|| {
                SynergyError::Io(std::io::Error::other("search worker panicked"))
            });
        }
    });

    if let Some(e) = write_err {
        return Err(e);
    }

    let summary = SearchSummary {
        examined: examined.load(Ordering::Relaxed),
        found,
        cancelled: cancel.is_cancelled(),
    };
    info!(
        examined = summary.examined,
        found = summary.found,
        cancelled = summary.cancelled,
        "exhaustive search finished"
    );
    Ok(summary)
}
