//! Driver loop for the genetic algorithm.
//!
//! [`GeneticSolver`] evolves a [`Deme`] until a generation limit, a
//! stagnation limit or a time limit is reached, and reports the best tour it
//! has seen along the way.

use crate::cities::CityModel;
use crate::error::{Error, Result};
use crate::genetic::{Deme, DemeConfig};
use crate::solution::TourSolution;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Solver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Population size
    pub population_size: usize,
    /// Probability that a selected parent is mutated
    pub mutation_rate: f64,
    /// Number of generations
    pub max_generations: usize,
    /// Maximum generations without a new best tour (0 disables the check)
    pub max_no_improve: usize,
    /// Time limit in seconds
    pub time_limit: f64,
    /// Random seed
    pub seed: Option<u64>,
    /// Log population statistics every this many generations (0 disables)
    pub log_interval: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            population_size: 100,
            mutation_rate: 0.05,
            max_generations: 500,
            max_no_improve: 0,
            time_limit: 60.0,
            seed: None,
            log_interval: 50,
        }
    }
}

impl SolverConfig {
    pub fn deme_config(&self) -> DemeConfig {
        DemeConfig {
            population_size: self.population_size,
            mutation_rate: self.mutation_rate,
            seed: self.seed,
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.deme_config().validate()?;
        if self.time_limit.is_nan() || self.time_limit <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "time limit must be positive, got {}",
                self.time_limit
            )));
        }
        Ok(())
    }
}

/// Population statistics after one generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    pub best_distance: f64,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub worst_fitness: f64,
    pub total_fitness: f64,
}

impl GenerationStats {
    pub fn capture<C: CityModel>(deme: &Deme<'_, C>) -> Self {
        let best = deme.get_best();
        let total_fitness = deme.total_fitness();
        let worst_fitness = deme
            .population()
            .iter()
            .map(|c| OrderedFloat(c.fitness()))
            .min()
            .map_or(best.fitness(), |f| f.0);

        GenerationStats {
            generation: deme.generation(),
            best_distance: best.distance(),
            best_fitness: best.fitness(),
            mean_fitness: total_fitness / deme.len() as f64,
            worst_fitness,
            total_fitness,
        }
    }
}

/// Genetic algorithm driver over a borrowed city model
pub struct GeneticSolver<'a, C: CityModel> {
    cities: &'a C,
    config: SolverConfig,
}

impl<'a, C: CityModel> GeneticSolver<'a, C> {
    pub fn new(cities: &'a C, config: SolverConfig) -> Self {
        GeneticSolver { cities, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the genetic algorithm
    pub fn run(&self) -> Result<TourSolution> {
        self.config.validate()?;
        let start = Instant::now();

        let mut deme = Deme::new(self.cities, &self.config.deme_config())?;
        log::info!(
            "Starting GA: {} cities, population {}, mutation rate {}",
            self.cities.size(),
            deme.len(),
            deme.mutation_rate()
        );

        let initial = GenerationStats::capture(&deme);
        let mut best_tour = deme.get_best().order().to_vec();
        let mut best_fitness = initial.best_fitness;
        let mut best_distance = initial.best_distance;
        let mut best_generation = 0;
        let mut no_improve_count = 0;
        let mut history = vec![initial];

        while deme.generation() < self.config.max_generations
            && (self.config.max_no_improve == 0 || no_improve_count < self.config.max_no_improve)
            && start.elapsed().as_secs_f64() < self.config.time_limit
        {
            deme.advance_generation();
            let stats = GenerationStats::capture(&deme);

            if stats.best_fitness > best_fitness {
                best_tour = deme.get_best().order().to_vec();
                best_fitness = stats.best_fitness;
                best_distance = stats.best_distance;
                best_generation = stats.generation;
                no_improve_count = 0;
                log::info!(
                    "Gen {}  New best distance {:.3}",
                    stats.generation,
                    best_distance
                );
            } else {
                no_improve_count += 1;
            }

            if self.config.log_interval > 0 && stats.generation % self.config.log_interval == 0 {
                log::debug!(
                    "Gen {}  Best {:.3}  Mean fitness {:.2}  Worst fitness {:.2}  Elapsed {:.2}s",
                    stats.generation,
                    stats.best_distance,
                    stats.mean_fitness,
                    stats.worst_fitness,
                    start.elapsed().as_secs_f64()
                );
            }

            history.push(stats);
        }

        let computation_time = start.elapsed().as_secs_f64();
        log::info!(
            "GA finished after {} generations in {:.2}s, best distance {:.3}",
            deme.generation(),
            computation_time,
            best_distance
        );

        Ok(TourSolution {
            tour: best_tour,
            distance: best_distance,
            fitness: best_fitness,
            generations: deme.generation(),
            best_generation,
            computation_time,
            history,
        })
    }
}
