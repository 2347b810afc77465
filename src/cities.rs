//! City coordinates and tour distances.
//!
//! The genetic core only talks to the [`CityModel`] trait: it needs the number
//! of cities, a source of random tours and the length of a closed tour.
//! [`Cities`] is the Euclidean implementation used by the command line. It is
//! loaded either from a plain coordinate list (one `x y` pair per line) or from
//! a TSPLIB file with a `NODE_COORD_SECTION`.

use crate::error::{Error, Result};
use ordered_float::OrderedFloat;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Read-only view of a set of cities, as consumed by chromosomes.
pub trait CityModel {
    /// Number of cities.
    fn size(&self) -> usize;

    /// Uniformly random tour over `0..size()`.
    fn random_permutation<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.size()).collect();
        order.shuffle(rng);
        order
    }

    /// Length of the closed tour visiting cities in `order` and returning to the start.
    fn tour_distance(&self, order: &[usize]) -> f64;
}

/// A city in the plane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub x: f64,
    pub y: f64,
}

impl City {
    pub fn new(x: f64, y: f64) -> Self {
        City { x, y }
    }

    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Euclidean city set with a precomputed distance matrix
#[derive(Debug, Clone)]
pub struct Cities {
    /// Name of the city set (file stem or TSPLIB `NAME`)
    pub name: String,
    /// City coordinates, indexed by city id
    pub cities: Vec<City>,
    distance_matrix: Vec<Vec<f64>>,
}

impl Cities {
    pub fn from_coords(name: impl Into<String>, cities: Vec<City>) -> Self {
        let distance_matrix = Self::compute_distance_matrix(&cities);
        Cities {
            name: name.into(),
            cities,
            distance_matrix,
        }
    }

    /// Load cities from a file. See [`Cities::parse`] for the accepted formats.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self::parse(&name, BufReader::new(file))
    }

    /// Parse cities from a reader.
    ///
    /// Two layouts are accepted:
    /// - a plain list with one `x y` pair per line (tabs or spaces), where
    ///   blank lines and lines starting with `#` are ignored;
    /// - TSPLIB, recognised by its `NODE_COORD_SECTION`, with `id x y` rows.
    ///   Only the `NAME` header is used, other sections are skipped.
    pub fn parse<R: BufRead>(name: &str, reader: R) -> Result<Self> {
        let mut name = name.to_string();
        let mut dimension: Option<usize> = None;
        let mut tsplib = false;
        let mut in_coords = false;
        let mut cities = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if line == "EOF" {
                break;
            }

            if line.starts_with("NODE_COORD_SECTION") {
                tsplib = true;
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                tsplib = true;
                in_coords = false;
                continue;
            }
            if let Some((key, value)) = header_entry(line) {
                tsplib = true;
                match key {
                    "NAME" => name = value.to_string(),
                    "DIMENSION" => {
                        dimension = Some(value.parse().map_err(|_| Error::Parse {
                            line: line_no,
                            message: format!("invalid dimension '{}'", value),
                        })?);
                    }
                    _ => {}
                }
                continue;
            }

            if tsplib && !in_coords {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let coords = if tsplib {
                if parts.len() < 3 {
                    return Err(Error::Parse {
                        line: line_no,
                        message: "expected 'id x y'".to_string(),
                    });
                }
                &parts[1..3]
            } else {
                if parts.len() != 2 {
                    return Err(Error::Parse {
                        line: line_no,
                        message: format!("expected 'x y', found {} fields", parts.len()),
                    });
                }
                &parts[..]
            };

            let x = parse_coordinate(coords[0], line_no)?;
            let y = parse_coordinate(coords[1], line_no)?;
            cities.push(City::new(x, y));
        }

        if cities.is_empty() {
            return Err(Error::EmptyCities);
        }
        if let Some(expected) = dimension {
            if expected != cities.len() {
                log::warn!(
                    "{}: DIMENSION says {} cities but {} were read",
                    name,
                    expected,
                    cities.len()
                );
            }
        }

        Ok(Self::from_coords(name, cities))
    }

    fn compute_distance_matrix(cities: &[City]) -> Vec<Vec<f64>> {
        let n = cities.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in (i + 1)..n {
                let d = cities[i].distance_to(&cities[j]);
                matrix[i][j] = d;
                matrix[j][i] = d;
            }
        }

        matrix
    }

    /// Distance between two cities
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.distance_matrix[i][j]
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Cities listed in the order of `order`, e.g. to export the best tour.
    pub fn reorder(&self, order: &[usize]) -> Cities {
        let cities = order.iter().map(|&i| self.cities[i]).collect();
        Cities::from_coords(self.name.clone(), cities)
    }

    pub fn statistics(&self) -> CityStatistics {
        let n = self.cities.len();

        let mut distances: Vec<f64> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for i in 0..n {
            for j in (i + 1)..n {
                distances.push(self.distance(i, j));
            }
        }
        let avg_distance = if distances.is_empty() {
            0.0
        } else {
            distances.iter().sum::<f64>() / distances.len() as f64
        };
        let max_distance = distances
            .iter()
            .copied()
            .max_by_key(|&d| OrderedFloat(d))
            .unwrap_or(0.0);

        let xs = self.cities.iter().map(|c| OrderedFloat(c.x));
        let ys = self.cities.iter().map(|c| OrderedFloat(c.y));

        CityStatistics {
            name: self.name.clone(),
            count: n,
            min_x: xs.clone().min().map_or(0.0, |v| v.0),
            max_x: xs.max().map_or(0.0, |v| v.0),
            min_y: ys.clone().min().map_or(0.0, |v| v.0),
            max_y: ys.max().map_or(0.0, |v| v.0),
            avg_distance,
            max_distance,
        }
    }
}

impl CityModel for Cities {
    fn size(&self) -> usize {
        self.cities.len()
    }

    fn tour_distance(&self, order: &[usize]) -> f64 {
        if order.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for pair in order.windows(2) {
            length += self.distance(pair[0], pair[1]);
        }
        length += self.distance(order[order.len() - 1], order[0]);

        length
    }
}

/// `KEY : value` header line of a TSPLIB file
fn header_entry(line: &str) -> Option<(&str, &str)> {
    if !line.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

fn parse_coordinate(raw: &str, line: usize) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::Parse {
            line,
            message: format!("invalid coordinate '{}'", raw),
        }),
    }
}

/// Summary of a city set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityStatistics {
    pub name: String,
    pub count: usize,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub avg_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for CityStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cities: {}", self.name)?;
        writeln!(f, "  Count: {}", self.count)?;
        writeln!(f, "  X range: [{:.2}, {:.2}]", self.min_x, self.max_x)?;
        writeln!(f, "  Y range: [{:.2}, {:.2}]", self.min_y, self.max_y)?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::io::Cursor;

    fn unit_square() -> Cities {
        Cities::from_coords(
            "square",
            vec![
                City::new(0.0, 0.0),
                City::new(1.0, 0.0),
                City::new(1.0, 1.0),
                City::new(0.0, 1.0),
            ],
        )
    }

    #[test]
    fn test_distance_calculation() {
        let cities = Cities::from_coords("pair", vec![City::new(0.0, 0.0), City::new(3.0, 4.0)]);

        assert!((cities.distance(0, 1) - 5.0).abs() < 1e-10);
        assert!((cities.distance(1, 0) - 5.0).abs() < 1e-10);
        assert_eq!(cities.distance(0, 0), 0.0);
    }

    #[test]
    fn test_tour_distance_is_cyclic() {
        let cities = unit_square();

        assert!((cities.tour_distance(&[0, 1, 2, 3]) - 4.0).abs() < 1e-10);
        let crossing = 2.0 + 2.0 * 2f64.sqrt();
        assert!((cities.tour_distance(&[0, 2, 1, 3]) - crossing).abs() < 1e-10);
        assert_eq!(cities.tour_distance(&[2]), 0.0);
    }

    #[test]
    fn test_random_permutation_is_valid() {
        let cities = unit_square();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..20 {
            let mut order = cities.random_permutation(&mut rng);
            order.sort_unstable();
            assert_eq!(order, vec![0, 1, 2, 3]);
        }
    }

    #[test]
    fn test_parse_plain_coordinates() {
        let input = "# five cities\n0\t0\n3 4\n\n10.5  -2\n";
        let cities = Cities::parse("plain", Cursor::new(input)).unwrap();

        assert_eq!(cities.name, "plain");
        assert_eq!(cities.size(), 3);
        assert_eq!(cities.cities[2], City::new(10.5, -2.0));
        assert!((cities.distance(0, 1) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_tsplib() {
        let input = "NAME : tiny\n\
                     TYPE : TSP\n\
                     DIMENSION : 3\n\
                     EDGE_WEIGHT_TYPE : EUC_2D\n\
                     NODE_COORD_SECTION\n\
                     1 0 0\n\
                     2 0 3\n\
                     3 4 0\n\
                     EOF\n";
        let cities = Cities::parse("file", Cursor::new(input)).unwrap();

        assert_eq!(cities.name, "tiny");
        assert_eq!(cities.size(), 3);
        assert!((cities.tour_distance(&[0, 1, 2]) - 12.0).abs() < 1e-10);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let input = "0 0\n1 1\nfoo 2\n";
        match Cities::parse("bad", Cursor::new(input)) {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected parse error, got {:?}", other),
        }

        let input = "0 0 0\n";
        assert!(matches!(
            Cities::parse("bad", Cursor::new(input)),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(
            Cities::parse("empty", Cursor::new("# nothing\n")),
            Err(Error::EmptyCities)
        ));
    }

    #[test]
    fn test_from_file() {
        let path = std::env::temp_dir().join("tsp_genetic_cities_from_file.tsv");
        std::fs::write(&path, "0\t0\n0\t1\n1\t1\n").unwrap();

        let cities = Cities::from_file(&path).unwrap();
        assert_eq!(cities.name, "tsp_genetic_cities_from_file");
        assert_eq!(cities.size(), 3);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_reorder() {
        let cities = unit_square();
        let ordered = cities.reorder(&[2, 0, 3, 1]);

        assert_eq!(ordered.cities[0], City::new(1.0, 1.0));
        assert_eq!(ordered.cities[1], City::new(0.0, 0.0));
        assert_eq!(ordered.cities[3], City::new(1.0, 0.0));
        let expected = cities.tour_distance(&[2, 0, 3, 1]);
        assert!((ordered.tour_distance(&[0, 1, 2, 3]) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_statistics() {
        let stats = unit_square().statistics();

        assert_eq!(stats.count, 4);
        assert_eq!(stats.max_x, 1.0);
        assert_eq!(stats.min_y, 0.0);
        assert!((stats.max_distance - 2f64.sqrt()).abs() < 1e-10);
        let avg = (4.0 + 2.0 * 2f64.sqrt()) / 6.0;
        assert!((stats.avg_distance - avg).abs() < 1e-10);
    }
}
