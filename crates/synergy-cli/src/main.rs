//! Synergy CLI
//!
//! Command-line interface for the team-composition search engine.
//!
//! # Commands
//!
//! - `synergy search [TEAM_SIZE]` - Exhaustive scan for fully-activated teams
//! - `synergy goal` - Goal-directed search from target synergies
//! - `synergy filter` - Keep previously found compositions that hit a target tier

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::Instant;
use synergy_core::{
    Catalog, ChampionFile, ChampionId, CompositionRecord, CompositionSink, RecordWriter,
    SynergyError, ThresholdRecord, TraitCounts,
};
use synergy_search::{exhaustive, goal, CancelToken, ExhaustiveConfig, GoalConfig};
use tracing::warn;

#[derive(Parser)]
#[command(name = "synergy")]
#[command(about = "Constraint-satisfying team composition search")]
#[command(version)]
struct Cli {
    /// Show debug-level logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enumerate every k-subset of the catalog and keep the fully-activated ones
    Search {
        /// Team size k
        #[arg(default_value = "8")]
        team_size: usize,
        /// Champion catalog JSON
        #[arg(short, long, default_value = "tft_champion_traits.json")]
        champions: PathBuf,
        /// Synergy threshold table JSON
        #[arg(short, long, default_value = "synergy_counts.json")]
        synergies: PathBuf,
        /// Forced synergy contribution (repeatable); never counts against k
        #[arg(short, long)]
        emblem: Vec<String>,
        /// Output JSONL path (default: team_compositions_size_<k>.jsonl)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Combinations per worker batch
        #[arg(long, default_value = "10000")]
        batch_size: usize,
        /// Worker threads (default: all logical CPUs)
        #[arg(long)]
        threads: Option<usize>,
        /// Force single-threaded execution
        #[arg(long)]
        serial: bool,
    },
    /// Backtrack from targetSynergy requirements toward a team-size window
    Goal {
        /// Champion catalog JSON
        #[arg(short, long, default_value = "tft_champion_traits.json")]
        champions: PathBuf,
        /// Synergy threshold table JSON
        #[arg(short, long, default_value = "synergy_counts.json")]
        synergies: PathBuf,
        /// Forced synergy contribution (repeatable)
        #[arg(short, long)]
        emblem: Vec<String>,
        /// Smallest acceptable team, inclusive
        #[arg(long, default_value = "7")]
        min_size: usize,
        /// Largest acceptable team, inclusive
        #[arg(long, default_value = "9")]
        max_size: usize,
        /// Run one independent search per combination of this many pool
        /// emblems (0 = single run)
        #[arg(long, default_value = "0")]
        combo_size: usize,
        /// Emblem pool for combinations (default: all target synergies)
        #[arg(long)]
        combo_pool: Vec<String>,
        /// Output JSONL path
        #[arg(short, long, default_value = "goal_compositions.jsonl")]
        output: PathBuf,
    },
    /// Filter a composition stream down to records hitting a flagged target tier
    Filter {
        /// Input JSONL produced by `search`
        #[arg(short, long)]
        input: PathBuf,
        /// Synergy threshold table JSON
        #[arg(short, long, default_value = "synergy_counts.json")]
        synergies: PathBuf,
        /// Output JSONL path
        #[arg(short, long, default_value = "filtered_compositions.jsonl")]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Search {
            team_size,
            champions,
            synergies,
            emblem,
            output,
            batch_size,
            threads,
            serial,
        } => run_search(
            team_size, &champions, &synergies, &emblem, output, batch_size, threads, serial,
        ),
        Commands::Goal {
            champions,
            synergies,
            emblem,
            min_size,
            max_size,
            combo_size,
            combo_pool,
            output,
        } => run_goal(
            &champions, &synergies, &emblem, min_size, max_size, combo_size, &combo_pool, &output,
        ),
        Commands::Filter {
            input,
            synergies,
            output,
        } => run_filter(&input, &synergies, &output),
    }
}

/// Open a required input file, reporting a missing path as such before any
/// search starts.
fn open_input(path: &Path) -> Result<File, SynergyError> {
    if !path.exists() {
        return Err(SynergyError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    Ok(File::open(path)?)
}

fn load_catalog(
    champions: &Path,
    synergies: &Path,
    emblems: &[String],
) -> anyhow::Result<Catalog> {
    let champion_file: ChampionFile = serde_json::from_reader(BufReader::new(
        open_input(champions)?,
    ))
    .with_context(|| format!("parsing {}", champions.display()))?;
    let thresholds: Vec<ThresholdRecord> = serde_json::from_reader(BufReader::new(
        open_input(synergies)?,
    ))
    .with_context(|| format!("parsing {}", synergies.display()))?;
    Ok(Catalog::build(
        champion_file.into_records(),
        thresholds,
        emblems,
    )?)
}

/// Wire SIGINT to the shared cancellation token.
fn install_interrupt_handler(cancel: &CancelToken) -> anyhow::Result<()> {
    let token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\ninterrupt received, finishing in-flight batches...");
        token.cancel();
    })
    .context("installing interrupt handler")?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_search(
    team_size: usize,
    champions: &Path,
    synergies: &Path,
    emblems: &[String],
    output: Option<PathBuf>,
    batch_size: usize,
    threads: Option<usize>,
    serial: bool,
) -> anyhow::Result<()> {
    let catalog = load_catalog(champions, synergies, emblems)?;
    exhaustive::validate_team_size(&catalog, team_size)?;

    let output =
        output.unwrap_or_else(|| PathBuf::from(format!("team_compositions_size_{team_size}.jsonl")));
    let total = exhaustive::combination_count(catalog.len(), team_size);
    println!(
        "{} champions, team size {}: {} combinations -> {}",
        catalog.len(),
        team_size,
        total,
        output.display()
    );

    let config = ExhaustiveConfig {
        team_size,
        batch_size,
        threads,
        ..ExhaustiveConfig::default()
    };
    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel)?;

    let start = Instant::now();
    let mut sink = CompositionSink::create(&output)?;
    let summary = if serial {
        exhaustive::run_serial(&catalog, &config, &cancel, &mut sink)?
    } else {
        exhaustive::run(&catalog, &config, &cancel, &mut sink)?
    };
    let written = sink.finish()?;
    let elapsed = start.elapsed();

    if summary.cancelled {
        println!(
            "interrupted after {:.2}s: {} of {} combinations examined, {} compositions persisted to {}",
            elapsed.as_secs_f64(),
            summary.examined,
            total,
            written,
            output.display()
        );
    } else {
        println!(
            "done in {:.2}s: {} combinations examined, {} fully-activated compositions saved to {}",
            elapsed.as_secs_f64(),
            summary.examined,
            written,
            output.display()
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_goal(
    champions: &Path,
    synergies: &Path,
    emblems: &[String],
    min_size: usize,
    max_size: usize,
    combo_size: usize,
    combo_pool: &[String],
    output: &Path,
) -> anyhow::Result<()> {
    if min_size > max_size {
        bail!("min-size {min_size} exceeds max-size {max_size}");
    }
    let catalog = load_catalog(champions, synergies, emblems)?;
    let requirements = goal::derive_requirements(&catalog);
    if requirements.is_empty() && combo_size == 0 {
        println!("no open target synergies: nothing to search for");
        return Ok(());
    }

    let config = GoalConfig { min_size, max_size };
    let cancel = CancelToken::new();
    install_interrupt_handler(&cancel)?;

    let start = Instant::now();
    let solutions: Vec<(Vec<ChampionId>, TraitCounts)> = if combo_size > 0 {
        let pool = if combo_pool.is_empty() {
            let mut pool: Vec<_> = requirements.keys().copied().collect();
            pool.sort_unstable();
            pool
        } else {
            combo_pool
                .iter()
                .map(|name| {
                    catalog
                        .trait_id(name)
                        .ok_or_else(|| anyhow::anyhow!("unknown synergy in combo pool: {name}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?
        };
        goal::solve_emblem_combinations(&catalog, &config, &requirements, &pool, combo_size, &cancel)
    } else {
        goal::solve(&catalog, &config, requirements, &cancel)
            .into_iter()
            .map(|team| (team, TraitCounts::default()))
            .collect()
    };

    let mut sink = CompositionSink::create(output)?;
    for (team, contributions) in &solutions {
        // Render with the contributions the team was validated under, so
        // emblem-activated tiers appear in the record.
        let counts = catalog.trait_counts_with(team, contributions);
        sink.write_record(catalog.composition_record(team, &counts))?;
    }
    let written = sink.finish()?;
    let elapsed = start.elapsed();

    if cancel.is_cancelled() {
        println!(
            "interrupted after {:.2}s: {} compositions persisted to {}",
            elapsed.as_secs_f64(),
            written,
            output.display()
        );
    } else {
        println!(
            "done in {:.2}s: {} unique compositions (sizes {}..={}) saved to {}",
            elapsed.as_secs_f64(),
            written,
            min_size,
            max_size,
            output.display()
        );
    }
    Ok(())
}

fn run_filter(input: &Path, synergies: &Path, output: &Path) -> anyhow::Result<()> {
    let thresholds: Vec<ThresholdRecord> = serde_json::from_reader(BufReader::new(
        open_input(synergies)?,
    ))
    .with_context(|| format!("parsing {}", synergies.display()))?;
    let targets: std::collections::HashSet<(String, u32)> = thresholds
        .into_iter()
        .filter(|record| record.target_synergy && record.count > 0)
        .map(|record| (record.synergy_name, record.count as u32))
        .collect();
    if targets.is_empty() {
        bail!("no targetSynergy rows in {}", synergies.display());
    }

    let reader = BufReader::new(open_input(input)?);
    let mut sink = CompositionSink::create(output)?;
    let mut scanned = 0u64;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        scanned += 1;
        let record: CompositionRecord = match serde_json::from_str(&line) {
            Ok(record) => record,
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "skipping malformed record");
                continue;
            }
        };
        let hit = record
            .synergies
            .iter()
            .any(|(name, &tier)| targets.contains(&(name.clone(), tier)));
        if hit {
            sink.write_record(record)?;
        }
    }
    let written = sink.finish()?;
    println!(
        "{} records scanned, {} matching a target tier saved to {}",
        scanned,
        written,
        output.display()
    );
    Ok(())
}
