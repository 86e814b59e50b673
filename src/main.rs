use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn, LevelFilter};
use pretty_print_nalgebra::*;

use pbibrepair::initial_design::{self, RandomType};
use pbibrepair::{Design, ForbiddenPair, RepairTaskBuilder};

#[derive(Parser, Debug)]
#[command(
    name = "pbibrepair",
    about = "Repair incomplete block designs so prohibited treatment pairs never share a block"
)]
struct Args {
    /// Number of treatments (N)
    #[arg(short = 'n', long)]
    treatments: usize,

    /// Number of blocks (B)
    #[arg(short = 'b', long)]
    blocks: usize,

    /// Treatments per block (k), must be smaller than N
    #[arg(short = 'k', long)]
    block_size: usize,

    /// Forbidden pair as "i,j" with 1-based ids; repeatable
    #[arg(short = 'f', long = "forbid")]
    forbidden: Vec<ForbiddenPair>,

    /// Initial designs to draw before keeping the least-variance one
    #[arg(short = 'r', long, default_value_t = 10)]
    repeats: usize,

    /// Stop repairing after this many milliseconds, reporting the rest unresolved
    #[arg(long)]
    time_budget_ms: Option<u64>,

    /// Write the final design table here instead of stdout
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Log per-swap detail
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    configure_logging(args.verbose);

    for pair in &args.forbidden {
        pair.check_in_range(args.treatments)
            .context("checking forbidden pairs against the treatment count")?;
    }

    let initial = draw_initial_design(&args)?;
    info!(
        "initial design: {} blocks of {} from {} treatments, {} forbidden pairs, pairwise variance {:.6}",
        args.blocks,
        args.block_size,
        args.treatments,
        args.forbidden.len(),
        initial.coincidence().pairwise_variance()
    );

    let started = Instant::now();
    let mut builder = RepairTaskBuilder::default();
    builder
        .design(initial)
        .forbidden_pairs(args.forbidden.clone());
    if let Some(ms) = args.time_budget_ms {
        builder.time_budget(Some(Duration::from_millis(ms)));
    }
    let outcome = builder.build()?.run();
    let elapsed = started.elapsed();

    let coincidence = outcome.design.coincidence();
    info!(
        "repair took {elapsed:?}: {} swaps applied, {} occurrences unresolved",
        outcome.swaps_applied.len(),
        outcome.unresolved.len()
    );
    println!(
        "coincidence matrix: {}",
        pretty_print!(&coincidence.coincidence)
    );
    println!(
        "pairwise variance: {:.6} (lambda {:.4}, r {:.4})",
        coincidence.pairwise_variance(),
        coincidence.lambda(),
        coincidence.r()
    );
    println!("design: {}", pretty_print!(&outcome.design.as_sorted()));

    let report = pbibrepair::validate(&outcome.design, &args.forbidden);
    if report.satisfied {
        println!("all forbidden pairs satisfied");
    } else {
        warn!("forbidden pairs remain after repair");
        for pair in &report.violated_pairs {
            println!("unresolved: {pair}");
        }
    }

    let table = outcome.design.to_table_string();
    match &args.output {
        Some(path) => fs::write(path, &table)
            .with_context(|| format!("writing design table to {}", path.display()))?,
        None => print!("{table}"),
    }
    Ok(())
}

/// Draws `repeats` prohibition-aware initial designs and keeps the one with
/// the least pairwise variance, standing in for the external optimizer.
fn draw_initial_design(args: &Args) -> Result<Design> {
    let mut best: Option<Design> = None;
    for _ in 0..args.repeats.max(1) {
        let candidate = initial_design::generate(
            args.treatments,
            args.blocks,
            args.block_size,
            &args.forbidden,
            RandomType::Uniform,
        )
        .context("generating an initial design")?;
        let better = match &best {
            None => true,
            Some(current) => {
                candidate.coincidence().pairwise_variance()
                    < current.coincidence().pairwise_variance()
            }
        };
        if better {
            best = Some(candidate);
        }
    }
    best.context("no initial design drawn")
}

fn configure_logging(verbose: bool) {
    env_logger::Builder::new()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .filter_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .target(env_logger::Target::Stdout)
        .init();
}
