//! Population of tours evolved by fitness-proportionate selection.
//!
//! Each generation is built into a fresh vector by pairing parents chosen
//! with roulette-wheel selection, optionally mutating them, and recombining
//! each pair into two children. The new vector then replaces the old
//! population as a whole; nothing is carried over.

use super::chromosome::{Chromosome, DISTANCE_WEIGHT, FITNESS_CEILING};
use crate::cities::CityModel;
use crate::error::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Deme configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemeConfig {
    /// Number of chromosomes, constant across generations
    pub population_size: usize,
    /// Probability that a selected parent is mutated before recombination
    pub mutation_rate: f64,
    /// Random seed; `None` seeds from system entropy
    pub seed: Option<u64>,
}

impl Default for DemeConfig {
    fn default() -> Self {
        DemeConfig {
            population_size: 100,
            mutation_rate: 0.05,
            seed: None,
        }
    }
}

impl DemeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size == 0 {
            return Err(Error::ZeroPopulation);
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(Error::MutationRateOutOfRange(self.mutation_rate));
        }
        Ok(())
    }

    fn create_rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}

/// A population of tours over one city model
pub struct Deme<'a, C: CityModel> {
    population: Vec<Chromosome<'a, C>>,
    mutation_rate: f64,
    rng: ChaCha8Rng,
    generation: usize,
}

impl<'a, C: CityModel> Deme<'a, C> {
    /// Create a deme of random tours, seeded from `config.seed`.
    pub fn new(cities: &'a C, config: &DemeConfig) -> Result<Self> {
        let rng = config.create_rng();
        Self::with_rng(cities, config, rng)
    }

    /// Create a deme of random tours drawing from the given generator.
    pub fn with_rng(cities: &'a C, config: &DemeConfig, mut rng: ChaCha8Rng) -> Result<Self> {
        config.validate()?;
        if cities.size() == 0 {
            return Err(Error::EmptyCities);
        }
        if config.population_size % 2 == 1 {
            log::warn!(
                "odd population size {}: the last pairing of each generation keeps one child",
                config.population_size
            );
        }

        let population = (0..config.population_size)
            .map(|_| Chromosome::random(cities, &mut rng))
            .collect();

        let deme = Deme {
            population,
            mutation_rate: config.mutation_rate,
            rng,
            generation: 0,
        };
        deme.warn_if_degenerate();
        Ok(deme)
    }

    /// Create a deme from existing chromosomes.
    ///
    /// `config.population_size` is ignored; the size is `population.len()`.
    pub fn from_population(population: Vec<Chromosome<'a, C>>, config: &DemeConfig) -> Result<Self> {
        if population.is_empty() {
            return Err(Error::ZeroPopulation);
        }
        let config = DemeConfig {
            population_size: population.len(),
            ..config.clone()
        };
        config.validate()?;
        let tour_len = population[0].len();
        if tour_len == 0 {
            return Err(Error::EmptyCities);
        }
        if population.iter().any(|c| c.len() != tour_len) {
            return Err(Error::InvalidTour(
                "population mixes tours of different lengths".to_string(),
            ));
        }

        let deme = Deme {
            population,
            mutation_rate: config.mutation_rate,
            rng: config.create_rng(),
            generation: 0,
        };
        deme.warn_if_degenerate();
        Ok(deme)
    }

    fn warn_if_degenerate(&self) {
        if self.has_degenerate_fitness() {
            log::warn!(
                "initial total fitness {:.2} is not positive (tours longer than {} score below zero), selection will be uniform",
                self.total_fitness(),
                FITNESS_CEILING / DISTANCE_WEIGHT
            );
        }
    }

    /// Replace the population with a new generation of the same size.
    ///
    /// Each round selects two parents (possibly the same chromosome), mutates
    /// each with probability `mutation_rate` in place, then recombines the pair
    /// into two children. Mutation comes first, so a chromosome selected for
    /// both slots can be mutated twice before it is recombined with itself.
    pub fn advance_generation(&mut self) {
        let target = self.population.len();
        let mut next = Vec::with_capacity(target);

        while next.len() < target {
            let first = self.select_parent_index();
            let second = self.select_parent_index();

            if self.rng.gen::<f64>() < self.mutation_rate {
                self.population[first].mutate(&mut self.rng);
            }
            if self.rng.gen::<f64>() < self.mutation_rate {
                self.population[second].mutate(&mut self.rng);
            }

            let (child1, child2) =
                self.population[first].recombine(&self.population[second], &mut self.rng);
            next.push(child1);
            if next.len() < target {
                next.push(child2);
            }
        }

        self.population = next;
        self.generation += 1;
    }

    /// Pick a chromosome with probability proportional to its fitness.
    pub fn select_parent(&mut self) -> &Chromosome<'a, C> {
        let index = self.select_parent_index();
        &self.population[index]
    }

    /// Roulette-wheel selection. Falls back to a uniform pick when the total
    /// fitness is not positive, and to the last chromosome when rounding
    /// leaves the running sum short of the threshold.
    fn select_parent_index(&mut self) -> usize {
        let n = self.population.len();
        let total = self.total_fitness();

        if self.has_degenerate_fitness() {
            log::trace!("total fitness {} is degenerate, selecting uniformly", total);
            return self.rng.gen_range(0..n);
        }

        let threshold = self.rng.gen_range(0.0..total);
        let mut running = 0.0;
        for (i, chromosome) in self.population.iter().enumerate() {
            running += chromosome.fitness();
            if running > threshold {
                return i;
            }
        }

        n - 1
    }

    /// Fittest chromosome; ties go to the earliest one.
    pub fn get_best(&self) -> &Chromosome<'a, C> {
        let mut best = &self.population[0];
        for chromosome in &self.population[1..] {
            if chromosome.fitness() > best.fitness() {
                best = chromosome;
            }
        }
        best
    }

    pub fn total_fitness(&self) -> f64 {
        self.population.iter().map(|c| c.fitness()).sum()
    }

    /// Whether roulette selection is impossible: the total fitness is not
    /// positive or not finite.
    pub fn has_degenerate_fitness(&self) -> bool {
        let total = self.total_fitness();
        total <= 0.0 || !total.is_finite()
    }

    pub fn population(&self) -> &[Chromosome<'a, C>] {
        &self.population
    }

    pub fn len(&self) -> usize {
        self.population.len()
    }

    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    pub fn mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    /// Number of completed generation steps
    pub fn generation(&self) -> usize {
        self.generation
    }
}
