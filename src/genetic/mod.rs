//! Genetic algorithm core: tour chromosomes and the deme that evolves them.

pub mod chromosome;
pub mod deme;

pub use chromosome::{fitness_from_distance, Chromosome, DISTANCE_WEIGHT, FITNESS_CEILING};
pub use deme::{Deme, DemeConfig};
