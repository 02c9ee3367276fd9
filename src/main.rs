//! mapper-tune: bootstrap stability search over Mapper cover parameters
//!
//! `grid` scores every (resolution, gain) pair with the NetSimile distance
//! between Mapper graphs of bootstrap resamples; `stats` summarises the node
//! features of one graph.

use clap::{Args, Parser, Subcommand};
use colored::*;
use log::{error, info, warn};
use std::path::PathBuf;

use mapper_tune::report::{write_grid_csv, write_json, write_stats_csv};
use mapper_tune::{
    Aggregation, CoverTuning, Dataset, GraphProperties, ProjectorKind, TuningConfig,
};

/// Stability-based tuning of Mapper cover parameters
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bootstrap grid search over resolution x gain
    Grid(GridArgs),
    /// Node-feature statistics of a single Mapper graph
    Stats(StatsArgs),
}

#[derive(Args, Debug)]
struct GridArgs {
    /// Input CSV with a header row and numeric columns only
    #[arg(long)]
    input: PathBuf,

    /// JSON file with tuning settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolutions (cubes per lens dimension), comma separated
    #[arg(long, value_delimiter = ',')]
    res: Vec<usize>,

    /// Gains (overlap fraction between neighbouring cubes), comma separated
    #[arg(long, value_delimiter = ',')]
    gain: Vec<f64>,

    /// Number of bootstrap samples per cell
    #[arg(long)]
    n_bootstrap: Option<usize>,

    /// Seed for the bootstrap draws and the lens
    #[arg(long)]
    seed: Option<u64>,

    /// Share of rows in every bootstrap sample
    #[arg(long)]
    sample_ratio: Option<f64>,

    /// Lens projection
    #[arg(long, value_enum)]
    projector: Option<ProjectorKind>,

    /// Average over every pair of graphs instead of the first pair only
    #[arg(long, default_value_t = false)]
    all_pairs: bool,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    no_progress: bool,

    /// Output CSV for the score matrix
    #[arg(long, default_value = "grid_search.csv")]
    output: PathBuf,

    /// Optional JSON copy of the result
    #[arg(long)]
    json: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StatsArgs {
    /// Input CSV with a header row and numeric columns only
    #[arg(long)]
    input: PathBuf,

    /// Resolution (cubes per lens dimension)
    #[arg(long)]
    res: usize,

    /// Gain (overlap fraction between neighbouring cubes)
    #[arg(long)]
    gain: f64,

    /// Seed for the lens
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Lens projection
    #[arg(long, value_enum, default_value_t = ProjectorKind::Pca)]
    projector: ProjectorKind,

    /// Output CSV for the statistics table
    #[arg(long, default_value = "graph_properties.csv")]
    output: PathBuf,

    /// Optional JSON copy of the table
    #[arg(long)]
    json: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if std::env::args().len() <= 1 {
        display_banner();
        std::process::exit(0);
    }

    let cli = Cli::parse();
    let start_time = std::time::Instant::now();

    let outcome = match cli.command {
        Commands::Grid(args) => run_grid(args),
        Commands::Stats(args) => run_stats(args),
    };

    match outcome {
        Ok(()) => {
            info!(
                "Finished in {:.2} seconds",
                start_time.elapsed().as_secs_f64()
            );
        }
        Err(e) => {
            error!("mapper-tune failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn display_banner() {
    println!(
        "{}",
        "mapper-tune: stability-based tuning of Mapper cover parameters"
            .bright_green()
            .bold()
    );
    println!();
    println!("{}", "USAGE:".underline().cyan());
    println!(
        "    {} grid --input data.csv --res 5,10 --gain 0.2,0.3 --n-bootstrap 10",
        "mapper-tune".green()
    );
    println!(
        "    {} stats --input data.csv --res 10 --gain 0.3",
        "mapper-tune".green()
    );
    println!();
    println!("For full documentation, run:");
    println!("    mapper-tune --help");
    println!();
}

fn merge_config(args: &GridArgs) -> Result<TuningConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading tuning settings from {}", path.display());
            TuningConfig::from_json_file(path)?
        }
        None => TuningConfig::default(),
    };

    if !args.res.is_empty() {
        config.res_range = args.res.clone();
    }
    if !args.gain.is_empty() {
        config.gain_range = args.gain.clone();
    }
    if let Some(n) = args.n_bootstrap {
        config.n_bootstrap = n;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(ratio) = args.sample_ratio {
        config.sample_ratio = ratio;
    }
    if let Some(projector) = args.projector {
        config.projector = projector;
    }
    if args.all_pairs {
        config.aggregation = Aggregation::AllPairs;
    }
    if args.no_progress {
        config.show_progress = false;
    }

    config.validate()?;
    Ok(config)
}

fn run_grid(args: GridArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = merge_config(&args)?;

    if config.res_range.is_empty() || config.gain_range.is_empty() {
        warn!("Empty resolution or gain range, the result matrix will be empty");
    }
    if config.aggregation == Aggregation::FirstPair {
        info!(
            "Scoring each cell from the first pair of bootstrap graphs \
             (use --all-pairs to average every pair)"
        );
    }

    let data = Dataset::from_csv(&args.input)?;
    let tuning = CoverTuning::from_config(data, &config)?;
    let result = tuning.grid_search()?;

    if let Some((res, gain, score)) = result.best() {
        println!(
            "{} resolution {} / gain {} (score {:.4})",
            "Most stable cover:".bright_green().bold(),
            res,
            gain,
            score
        );
    }

    info!("Writing score matrix to {}", args.output.display());
    write_grid_csv(&result, &args.output)?;

    if let Some(path) = &args.json {
        info!("Writing JSON result to {}", path.display());
        write_json(&result, path)?;
    }

    Ok(())
}

fn run_stats(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data = Dataset::from_csv(&args.input)?;
    let properties =
        GraphProperties::new(data, args.projector.build(), args.res, args.gain, args.seed);

    let table = properties.graph_properties_stats()?;
    println!("{}", "Graph properties".bright_green().bold());
    print!("{}", table);

    info!("Writing statistics table to {}", args.output.display());
    write_stats_csv(&table, &args.output)?;

    if let Some(path) = &args.json {
        info!("Writing JSON table to {}", path.display());
        write_json(&table, path)?;
    }

    Ok(())
}
