//! Repeated independent runs of the solver.
//!
//! A genetic algorithm gives a different answer per seed, so judging a
//! parameter set takes several runs. [`Benchmark`] runs the solver once per
//! seed, collects one [`RunResult`] per run and summarises them.

use crate::cities::CityModel;
use crate::error::{Error, Result};
use crate::solver::{GeneticSolver, SolverConfig};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Result of one solver run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Run index
    pub run: usize,
    /// Seed used for this run
    pub seed: u64,
    /// Best tour distance
    pub distance: f64,
    /// Best tour fitness
    pub fitness: f64,
    /// Generations executed
    pub generations: usize,
    /// Generation in which the best tour was found
    pub best_generation: usize,
    /// Computation time in seconds
    pub time: f64,
}

/// Aggregated statistics over all runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStatistics {
    pub num_runs: usize,
    pub best_distance: f64,
    pub worst_distance: f64,
    pub avg_distance: f64,
    pub std_distance: f64,
    pub avg_generations: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Number of runs
    pub num_runs: usize,
    /// Seed of the first run; run `i` uses `base_seed + i`
    pub base_seed: u64,
    /// Solver parameters shared by all runs (its seed is overridden)
    pub solver: SolverConfig,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            base_seed: 42,
            solver: SolverConfig::default(),
        }
    }
}

/// Benchmark runner
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    /// Run the solver `num_runs` times on `cities`, one seed after another.
    /// Results of a previous call are discarded.
    pub fn run<C: CityModel>(&mut self, cities: &C) -> Result<()> {
        self.results.clear();
        if self.config.num_runs == 0 {
            return Err(Error::InvalidConfig("benchmark needs at least one run".to_string()));
        }
        self.config.solver.validate()?;

        for run in 0..self.config.num_runs {
            let seed = self.config.base_seed.wrapping_add(run as u64);
            let config = SolverConfig {
                seed: Some(seed),
                ..self.config.solver.clone()
            };

            log::info!("Benchmark run {}/{} (seed {})", run + 1, self.config.num_runs, seed);
            let solution = GeneticSolver::new(cities, config).run()?;

            self.results.push(RunResult {
                run,
                seed,
                distance: solution.distance,
                fitness: solution.fitness,
                generations: solution.generations,
                best_generation: solution.best_generation,
                time: solution.computation_time,
            });
        }

        Ok(())
    }

    /// Summarise the collected runs; `None` before any run has completed.
    pub fn compute_statistics(&self) -> Option<BenchmarkStatistics> {
        if self.results.is_empty() {
            return None;
        }

        let n = self.results.len() as f64;
        let distances: Vec<f64> = self.results.iter().map(|r| r.distance).collect();

        let avg_distance = distances.iter().sum::<f64>() / n;
        let variance = distances
            .iter()
            .map(|d| (d - avg_distance).powi(2))
            .sum::<f64>()
            / n;
        let best_distance = distances.iter().copied().min_by_key(|&d| OrderedFloat(d))?;
        let worst_distance = distances.iter().copied().max_by_key(|&d| OrderedFloat(d))?;
        let total_time: f64 = self.results.iter().map(|r| r.time).sum();

        Some(BenchmarkStatistics {
            num_runs: self.results.len(),
            best_distance,
            worst_distance,
            avg_distance,
            std_distance: variance.sqrt(),
            avg_generations: self.results.iter().map(|r| r.generations as f64).sum::<f64>() / n,
            avg_time: total_time / n,
            total_time,
        })
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       TSP Genetic Algorithm Report\n");
        report.push_str("========================================\n\n");

        let solver = &self.config.solver;
        report.push_str(&format!(
            "Population: {}  Mutation rate: {}  Max generations: {}\n\n",
            solver.population_size, solver.mutation_rate, solver.max_generations
        ));

        report.push_str(&format!(
            "{:<6} {:>8} {:>12} {:>12} {:>10}\n",
            "Run", "Seed", "Distance", "Generations", "Time"
        ));
        report.push_str("-".repeat(52).as_str());
        report.push('\n');
        for result in &self.results {
            report.push_str(&format!(
                "{:<6} {:>8} {:>12.2} {:>12} {:>10.4}\n",
                result.run, result.seed, result.distance, result.generations, result.time
            ));
        }

        match self.compute_statistics() {
            Some(stats) => {
                report.push('\n');
                report.push_str(&format!("Best distance:  {:.2}\n", stats.best_distance));
                report.push_str(&format!("Worst distance: {:.2}\n", stats.worst_distance));
                report.push_str(&format!(
                    "Avg distance:   {:.2} (std {:.2})\n",
                    stats.avg_distance, stats.std_distance
                ));
                report.push_str(&format!("Avg time:       {:.4}s\n", stats.avg_time));
            }
            None => report.push_str("\nNo runs completed.\n"),
        }

        report
    }
}
