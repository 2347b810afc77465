//! Result of a solver run and its exports.

use crate::cities::Cities;
use crate::error::Result;
use crate::solver::GenerationStats;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Best tour found by a run, with per-generation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourSolution {
    /// City indices in visiting order
    pub tour: Vec<usize>,
    /// Closed tour length
    pub distance: f64,
    /// Fitness of the tour
    pub fitness: f64,
    /// Number of generations executed
    pub generations: usize,
    /// Generation in which the tour was first seen
    pub best_generation: usize,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Statistics for generation 0 and every generation after it
    pub history: Vec<GenerationStats>,
}

impl TourSolution {
    /// Write the solution as pretty-printed JSON
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Export the per-generation history to CSV
    pub fn export_history_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stats in &self.history {
            writer.serialize(stats)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export the coordinates of the tour's cities in visiting order, one
    /// tab-separated `x y` pair per line. The output can be loaded back with
    /// [`Cities::from_file`].
    pub fn export_tour_tsv<P: AsRef<Path>>(&self, cities: &Cities, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_writer(file);

        for city in &cities.reorder(&self.tour).cities {
            writer.serialize(city)?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for TourSolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution (GeneticAlgorithm)")?;
        writeln!(f, "  Distance: {:.2}", self.distance)?;
        writeln!(f, "  Fitness: {:.2}", self.fitness)?;
        writeln!(f, "  Generations: {} (best found in {})", self.generations, self.best_generation)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}
