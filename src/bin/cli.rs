//! Binary entry point for the `ordtrees` workload CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use ordtrees::{
    config::Config,
    logging::init_logging,
    workload::{self, RunReport, Severity, StressReport},
    Experiment, TreeKind, WorkloadOptions,
};

const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Parser, Debug)]
#[command(
    name = "ordtrees",
    version,
    about = "Benchmark and stress the B-tree, red-black and splay ordered sets",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for reports"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        value_name = "FILTER",
        help = "Log filter (default warn; RUST_LOG takes precedence)"
    )]
    log_level: Option<String>,

    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "ORDTREES_CONFIG",
        help = "Configuration file (default <config_dir>/ordtrees/config.toml)"
    )]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Time an experiment for every tree and size")]
    Bench(BenchCmd),

    #[command(about = "Replay seeded workloads, checking every step against a reference set")]
    Stress(StressCmd),
}

#[derive(Args, Debug)]
struct BenchCmd {
    #[arg(long, help = "insert or insert-delete-insert")]
    experiment: Option<Experiment>,

    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        value_name = "TREE",
        help = "Trees to run: splay, red-black, 2-3-4, btree:<d>"
    )]
    trees: Vec<TreeKind>,

    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        value_name = "N",
        help = "Permutation sizes; each size n runs the keys -n..n"
    )]
    sizes: Vec<usize>,

    #[arg(long, help = "Permutation seed")]
    seed: Option<u64>,

    #[arg(long, value_name = "F", help = "Share of keys deleted again")]
    delete_fraction: Option<f64>,
}

#[derive(Args, Debug)]
struct StressCmd {
    #[arg(
        long,
        value_delimiter = ',',
        num_args = 1..,
        value_name = "TREE",
        help = "Trees to run: splay, red-black, 2-3-4, btree:<d>"
    )]
    trees: Vec<TreeKind>,

    #[arg(long, default_value_t = 1000, help = "Permutation size n (keys -n..n)")]
    size: usize,

    #[arg(long, default_value_t = 3, help = "Seeded rounds per tree")]
    rounds: u64,

    #[arg(long, help = "Seed of the first round")]
    seed: Option<u64>,

    #[arg(long, value_name = "F", help = "Share of keys deleted again")]
    delete_fraction: Option<f64>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.clone())?;

    let level = cli
        .log_level
        .as_deref()
        .or(config.log_level.as_deref())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level)?;
    if let Some(path) = config.path() {
        tracing::debug!(path = %path.display(), "configuration resolved");
    }

    let mut options = WorkloadOptions::default();
    config.apply(&mut options);

    match cli.command {
        Command::Bench(cmd) => {
            apply_bench_flags(&cmd, &mut options);
            let reports = run_bench(cli.format, &options)?;
            emit(&cli.format, &reports, |_| print_bench_text(&reports))?;
        }
        Command::Stress(cmd) => {
            let reports = run_stress(&cmd, &options)?;
            emit(&cli.format, &reports, |_| print_stress_text(&reports))?;
            if reports.iter().any(|report| !report.success) {
                std::process::exit(2);
            }
        }
    }
    Ok(())
}

fn apply_bench_flags(cmd: &BenchCmd, options: &mut WorkloadOptions) {
    if let Some(experiment) = cmd.experiment {
        options.experiment = experiment;
    }
    if !cmd.trees.is_empty() {
        options.trees = cmd.trees.clone();
    }
    if !cmd.sizes.is_empty() {
        options.sizes = cmd.sizes.clone();
    }
    if let Some(seed) = cmd.seed {
        options.seed = seed;
    }
    if let Some(fraction) = cmd.delete_fraction {
        options.delete_fraction = fraction;
    }
}

fn run_bench(
    format: OutputFormat,
    options: &WorkloadOptions,
) -> Result<Vec<RunReport>, Box<dyn Error>> {
    let total = (options.trees.len() * options.sizes.len()) as u64;
    let progress = if format == OutputFormat::Text {
        let pb = ProgressBar::new(total);
        pb.set_style(ProgressStyle::with_template("{prefix} [{bar:30}] {pos}/{len} {msg}")?);
        pb.set_prefix(options.experiment.to_string());
        Some(pb)
    } else {
        None
    };

    let reports = workload::bench(options, |report| {
        if let Some(pb) = &progress {
            pb.set_message(format!("{} with {} elements", report.tree, report.elements));
            pb.inc(1);
        }
    })?;

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    Ok(reports)
}

fn run_stress(
    cmd: &StressCmd,
    options: &WorkloadOptions,
) -> Result<Vec<StressReport>, Box<dyn Error>> {
    let trees = if cmd.trees.is_empty() {
        options.trees.clone()
    } else {
        cmd.trees.clone()
    };
    let seed = cmd.seed.unwrap_or(options.seed);
    let fraction = cmd.delete_fraction.unwrap_or(options.delete_fraction);

    let mut reports = Vec::new();
    for round in 0..cmd.rounds {
        let keys = workload::permutations(&[cmd.size], seed.wrapping_add(round)).remove(0);
        for &kind in &trees {
            reports.push(workload::verify(
                kind,
                Experiment::InsertDeleteInsert,
                &keys,
                fraction,
            )?);
        }
    }
    Ok(reports)
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_bench_text(reports: &[RunReport]) {
    println!(
        "{:<12} {:<22} {:>10} {:>12} {:>10}",
        "tree", "experiment", "elements", "seconds", "remaining"
    );
    for report in reports {
        println!(
            "{:<12} {:<22} {:>10} {:>12.6} {:>10}",
            report.tree.to_string(),
            report.experiment.to_string(),
            report.elements,
            report.elapsed_secs,
            report.final_len
        );
    }
}

fn print_stress_text(reports: &[StressReport]) {
    for report in reports {
        let status = if report.success { "ok" } else { "FAILED" };
        println!(
            "{:<12} {:<6} inserts={} deletes={} checks={} remaining={}",
            report.tree.to_string(),
            status,
            report.counts.inserts,
            report.counts.deletes,
            report.counts.checks,
            report.counts.final_len
        );
        for finding in report
            .findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
        {
            match finding.op {
                Some(op) => println!("  - after {op}: {}", finding.message),
                None => println!("  - {}", finding.message),
            }
        }
    }
}
