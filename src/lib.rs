//! TSP Genetic Solver Library
//!
//! A genetic algorithm heuristic for the Traveling Salesperson Problem. A
//! population of tours ([`Deme`]) is evolved with fitness-proportionate
//! selection, swap mutation and ordered crossover. Shorter tours score a
//! higher fitness; optimality is not guaranteed.
//!
//! # Example
//!
//! ```no_run
//! use tsp_genetic::cities::Cities;
//! use tsp_genetic::solver::{GeneticSolver, SolverConfig};
//!
//! let cities = Cities::from_file("cities.tsv").unwrap();
//! let config = SolverConfig {
//!     population_size: 100,
//!     mutation_rate: 0.05,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let solution = GeneticSolver::new(&cities, config).run().unwrap();
//! println!("Best distance: {:.2}", solution.distance);
//! ```

pub mod benchmark;
pub mod cities;
pub mod error;
pub mod genetic;
pub mod solution;
pub mod solver;

pub use cities::{Cities, CityModel};
pub use error::{Error, Result};
pub use genetic::{Chromosome, Deme, DemeConfig};
pub use solution::TourSolution;
pub use solver::{GeneticSolver, SolverConfig};
