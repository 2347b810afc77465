//! TSP Genetic Solver - Command Line Interface
//!
//! Evolves tours for a set of cities with a genetic algorithm.

use clap::{Args, Parser, Subcommand};
use tsp_genetic::benchmark::{Benchmark, BenchmarkConfig};
use tsp_genetic::cities::{Cities, CityModel};
use tsp_genetic::solver::{GeneticSolver, SolverConfig};

use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "tsp-genetic")]
#[command(version = "1.0")]
#[command(about = "A genetic algorithm heuristic for the Traveling Salesperson Problem")]
struct Cli {
    /// Verbose output (debug logging unless RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evolve a tour for a set of cities
    Solve {
        /// City file: `x y` per line or TSPLIB
        #[arg(short, long)]
        cities: PathBuf,

        #[command(flatten)]
        solver: SolverArgs,

        /// Write the best tour as tab-separated coordinates in visiting order
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the full solution as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Write per-generation statistics as CSV
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Run the solver several times with consecutive seeds
    Benchmark {
        #[arg(short, long)]
        cities: PathBuf,

        /// Number of runs
        #[arg(short, long, default_value = "5")]
        runs: usize,

        #[command(flatten)]
        solver: SolverArgs,

        /// Output CSV file with one row per run
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print statistics about a set of cities
    Analyze {
        #[arg(short, long)]
        cities: PathBuf,
    },
}

#[derive(Args)]
struct SolverArgs {
    /// Number of tours in the population
    #[arg(short, long, default_value = "100")]
    population_size: usize,

    /// Probability that a selected parent is mutated
    #[arg(short, long, default_value = "0.05")]
    mutation_rate: f64,

    /// Maximum number of generations
    #[arg(short, long, default_value = "500")]
    generations: usize,

    /// Stop after this many generations without improvement (0 disables)
    #[arg(long, default_value = "0")]
    max_no_improve: usize,

    /// Time limit in seconds
    #[arg(short, long, default_value = "60")]
    time_limit: f64,

    /// Random seed (entropy when omitted; first seed of a benchmark, default 42)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Log population statistics every N generations
    #[arg(long, default_value = "50")]
    log_interval: usize,
}

impl SolverArgs {
    fn to_config(&self) -> SolverConfig {
        SolverConfig {
            population_size: self.population_size,
            mutation_rate: self.mutation_rate,
            max_generations: self.generations,
            max_no_improve: self.max_no_improve,
            time_limit: self.time_limit,
            seed: self.seed,
            log_interval: self.log_interval,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Solve {
            cities,
            solver,
            output,
            json,
            history,
        } => solve(&cities, solver.to_config(), output, json, history),

        Commands::Benchmark {
            cities,
            runs,
            solver,
            output,
        } => run_benchmark(&cities, runs, solver.to_config(), output),

        Commands::Analyze { cities } => analyze(&cities),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve(
    path: &Path,
    config: SolverConfig,
    output: Option<PathBuf>,
    json: Option<PathBuf>,
    history: Option<PathBuf>,
) -> tsp_genetic::Result<()> {
    println!("Loading cities from {:?}...", path);
    let cities = Cities::from_file(path)?;
    println!("Loaded {} ({} cities)", cities.name, cities.size());

    let solution = GeneticSolver::new(&cities, config).run()?;

    println!("\n========== Results ==========");
    print!("{}", solution);

    if let Some(out_path) = output {
        solution.export_tour_tsv(&cities, &out_path)?;
        println!("\nTour saved to {:?}", out_path);
    }

    if let Some(json_path) = json {
        solution.save_json(&json_path)?;
        println!("Solution saved to {:?}", json_path);
    }

    if let Some(history_path) = history {
        solution.export_history_csv(&history_path)?;
        println!("History saved to {:?}", history_path);
    }

    Ok(())
}

fn run_benchmark(
    path: &Path,
    runs: usize,
    solver: SolverConfig,
    output: Option<PathBuf>,
) -> tsp_genetic::Result<()> {
    let cities = Cities::from_file(path)?;
    println!("Benchmarking {} ({} cities), {} runs...", cities.name, cities.size(), runs);

    let defaults = BenchmarkConfig::default();
    let config = BenchmarkConfig {
        num_runs: runs,
        base_seed: solver.seed.unwrap_or(defaults.base_seed),
        solver,
    };

    let mut benchmark = Benchmark::new(config);
    benchmark.run(&cities)?;

    println!("\n{}", benchmark.generate_report());

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("Results exported to {:?}", out_path);
    }

    Ok(())
}

fn analyze(path: &Path) -> tsp_genetic::Result<()> {
    let cities = Cities::from_file(path)?;

    println!("========== City Analysis ==========\n");
    println!("{}", cities.statistics());

    Ok(())
}
