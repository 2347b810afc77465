//! Tour chromosome with swap mutation and ordered crossover.
//!
//! A [`Chromosome`] is a permutation of city indices plus a cached fitness.
//! Every operation that changes the permutation recomputes the fitness before
//! returning, and checks that the permutation is still valid. A failed check
//! means an operator is broken, so it panics rather than returning an error.

use crate::cities::CityModel;
use crate::error::{Error, Result};
use rand::Rng;
use std::fmt;

/// Score of a zero-length tour.
pub const FITNESS_CEILING: f64 = 6000.0;

/// Fitness lost per unit of tour distance.
pub const DISTANCE_WEIGHT: f64 = 4.0;

/// Fitness of a tour of the given length. Higher is better; very long tours
/// score below zero.
#[inline]
pub fn fitness_from_distance(distance: f64) -> f64 {
    FITNESS_CEILING - DISTANCE_WEIGHT * distance
}

/// A candidate tour over a shared city model
pub struct Chromosome<'a, C: CityModel> {
    cities: &'a C,
    order: Vec<usize>,
    fitness: f64,
}

impl<'a, C: CityModel> Chromosome<'a, C> {
    /// Create a chromosome from a uniformly random tour.
    pub fn random<R: Rng + ?Sized>(cities: &'a C, rng: &mut R) -> Self {
        let order = cities.random_permutation(rng);
        Self::with_order(cities, order)
    }

    /// Create a chromosome from a caller-supplied tour.
    ///
    /// Returns [`Error::InvalidTour`] unless `order` is a permutation of
    /// `0..cities.size()`.
    pub fn from_order(cities: &'a C, order: Vec<usize>) -> Result<Self> {
        if order.len() != cities.size() {
            return Err(Error::InvalidTour(format!(
                "tour has {} entries but there are {} cities",
                order.len(),
                cities.size()
            )));
        }
        if !is_permutation(&order) {
            return Err(Error::InvalidTour(format!(
                "{:?} is not a permutation of 0..{}",
                order,
                cities.size()
            )));
        }

        Ok(Self::with_order(cities, order))
    }

    fn with_order(cities: &'a C, order: Vec<usize>) -> Self {
        let fitness = fitness_from_distance(cities.tour_distance(&order));
        let chromosome = Chromosome {
            cities,
            order,
            fitness,
        };
        chromosome.assert_valid();
        chromosome
    }

    /// The tour, as city indices in visiting order
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Cached fitness of the current tour
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Length of the current tour
    pub fn distance(&self) -> f64 {
        self.cities.tour_distance(&self.order)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Whether the tour visits every city exactly once.
    pub fn is_valid(&self) -> bool {
        self.order.len() == self.cities.size() && is_permutation(&self.order)
    }

    fn assert_valid(&self) {
        assert!(
            self.is_valid(),
            "chromosome is not a permutation of 0..{}: {:?}",
            self.cities.size(),
            self.order
        );
    }

    fn refresh_fitness(&mut self) {
        self.fitness = fitness_from_distance(self.cities.tour_distance(&self.order));
    }

    /// Swap the cities at two distinct random positions.
    ///
    /// Tours with fewer than two cities are left unchanged.
    pub fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.order.len();
        if n < 2 {
            return;
        }

        let i = rng.gen_range(0..n);
        let mut j = rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }
        self.order.swap(i, j);

        self.refresh_fitness();
        self.assert_valid();
    }

    /// Ordered crossover (OX) with `other`, producing two fresh offspring.
    ///
    /// The window covers half of the tour at a random offset. The first child
    /// keeps `self`'s cities inside the window and takes the rest in `other`'s
    /// order; the second child swaps the roles.
    pub fn recombine<R: Rng + ?Sized>(&self, other: &Self, rng: &mut R) -> (Self, Self) {
        self.assert_valid();
        other.assert_valid();
        assert_eq!(
            self.len(),
            other.len(),
            "cannot recombine tours of different lengths"
        );

        let (begin, end) = crossover_window(self.len(), rng);

        (
            Self::crossover_child(self, other, begin, end),
            Self::crossover_child(other, self, begin, end),
        )
    }

    /// Build one OX child for the window `[begin, end)`.
    ///
    /// The child equals `p1` inside the window. Every other position is
    /// filled left to right with the cities of `p2` that are not in `p1`'s
    /// window, keeping their relative order in `p2`.
    ///
    /// # Panics
    /// Panics if the window is out of bounds or either parent is invalid.
    pub fn crossover_child(p1: &Self, p2: &Self, begin: usize, end: usize) -> Self {
        let n = p1.order.len();
        assert!(
            begin <= end && end <= n,
            "crossover window [{}, {}) out of bounds for length {}",
            begin,
            end,
            n
        );
        p1.assert_valid();
        p2.assert_valid();

        let mut in_window = vec![false; n];
        for &city in &p1.order[begin..end] {
            in_window[city] = true;
        }

        let donated: Vec<usize> = p2
            .order
            .iter()
            .copied()
            .filter(|&city| !in_window[city])
            .collect();
        assert_eq!(donated.len(), n - (end - begin));

        let mut child = p1.clone();
        for (slot, city) in (0..begin).chain(end..n).zip(donated) {
            child.order[slot] = city;
        }

        child.refresh_fitness();
        child.assert_valid();
        child
    }
}

impl<C: CityModel> Clone for Chromosome<'_, C> {
    fn clone(&self) -> Self {
        Chromosome {
            cities: self.cities,
            order: self.order.clone(),
            fitness: self.fitness,
        }
    }
}

impl<C: CityModel> fmt::Debug for Chromosome<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chromosome")
            .field("order", &self.order)
            .field("fitness", &self.fitness)
            .finish()
    }
}

/// Window of `⌊len/2⌋` positions starting uniformly in `[0, len - ⌊len/2⌋]`.
fn crossover_window<R: Rng + ?Sized>(len: usize, rng: &mut R) -> (usize, usize) {
    let half = len / 2;
    let begin = rng.gen_range(0..=len - half);
    (begin, begin + half)
}

/// Sorting `order` must yield exactly `0..order.len()`.
fn is_permutation(order: &[usize]) -> bool {
    let mut sorted = order.to_vec();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, &city)| i == city)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cities::{Cities, City};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_cities() -> Cities {
        Cities::from_coords(
            "test",
            vec![
                City::new(0.0, 0.0),
                City::new(10.0, 0.0),
                City::new(20.0, 5.0),
                City::new(10.0, 10.0),
                City::new(0.0, 10.0),
            ],
        )
    }

    fn ring(n: usize) -> Cities {
        let cities = (0..n)
            .map(|i| {
                let angle = i as f64 / n as f64 * std::f64::consts::TAU;
                City::new(50.0 * angle.cos(), 50.0 * angle.sin())
            })
            .collect();
        Cities::from_coords("ring", cities)
    }

    fn sorted(order: &[usize]) -> Vec<usize> {
        let mut v = order.to_vec();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_random_chromosome_is_valid() {
        let cities = create_test_cities();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        for _ in 0..50 {
            let c = Chromosome::random(&cities, &mut rng);
            assert!(c.is_valid());
            assert_eq!(c.len(), 5);
            assert_eq!(c.fitness(), fitness_from_distance(cities.tour_distance(c.order())));
        }
    }

    #[test]
    fn test_fitness_formula() {
        let cities = create_test_cities();
        let c = Chromosome::from_order(&cities, vec![0, 1, 2, 3, 4]).unwrap();

        let distance = cities.tour_distance(&[0, 1, 2, 3, 4]);
        assert!((c.distance() - distance).abs() < 1e-10);
        assert!((c.fitness() - (6000.0 - 4.0 * distance)).abs() < 1e-10);
    }

    #[test]
    fn test_negative_fitness_is_not_clamped() {
        assert_eq!(fitness_from_distance(2000.0), -2000.0);
    }

    #[test]
    fn test_from_order_rejects_invalid_tours() {
        let cities = create_test_cities();

        assert!(matches!(
            Chromosome::from_order(&cities, vec![0, 1, 2, 3]),
            Err(Error::InvalidTour(_))
        ));
        assert!(matches!(
            Chromosome::from_order(&cities, vec![0, 1, 2, 3, 3]),
            Err(Error::InvalidTour(_))
        ));
        assert!(matches!(
            Chromosome::from_order(&cities, vec![0, 1, 2, 3, 5]),
            Err(Error::InvalidTour(_))
        ));
    }

    #[test]
    fn test_clone_is_independent() {
        let cities = create_test_cities();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let original = Chromosome::from_order(&cities, vec![0, 1, 2, 3, 4]).unwrap();

        let mut copy = original.clone();
        assert_eq!(copy.order(), original.order());
        assert_eq!(copy.fitness(), original.fitness());

        copy.mutate(&mut rng);
        assert_eq!(original.order(), &[0, 1, 2, 3, 4]);
        assert_ne!(copy.order(), original.order());
    }

    #[test]
    fn test_mutate_swaps_exactly_two_positions() {
        let cities = create_test_cities();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..100 {
            let mut c = Chromosome::from_order(&cities, vec![0, 1, 2, 3, 4]).unwrap();
            c.mutate(&mut rng);

            let changed = c
                .order()
                .iter()
                .enumerate()
                .filter(|&(i, &city)| i != city)
                .count();
            assert_eq!(changed, 2, "one swap of distinct positions: {:?}", c.order());
        }
    }

    #[test]
    fn test_mutate_refreshes_fitness() {
        let cities = create_test_cities();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut c = Chromosome::random(&cities, &mut rng);

        for _ in 0..100 {
            c.mutate(&mut rng);
            assert!(c.is_valid());
            let expected = fitness_from_distance(cities.tour_distance(c.order()));
            assert!((c.fitness() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_mutate_single_city_is_noop() {
        let cities = Cities::from_coords("one", vec![City::new(1.0, 1.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut c = Chromosome::random(&cities, &mut rng);

        c.mutate(&mut rng);
        assert_eq!(c.order(), &[0]);
        assert_eq!(c.fitness(), FITNESS_CEILING);
    }

    #[test]
    fn test_crossover_child_copies_window() {
        let cities = create_test_cities();
        let p1 = Chromosome::from_order(&cities, vec![0, 1, 2, 3, 4]).unwrap();
        let p2 = Chromosome::from_order(&cities, vec![4, 3, 2, 1, 0]).unwrap();

        let child = Chromosome::crossover_child(&p1, &p2, 1, 3);
        assert_eq!(child.order()[1], 1);
        assert_eq!(child.order()[2], 2);
        // 4, 3, 0 are p2's remaining cities in p2's order
        assert_eq!(child.order(), &[4, 1, 2, 3, 0]);
        assert_eq!(child.fitness(), fitness_from_distance(cities.tour_distance(child.order())));

        let other = Chromosome::crossover_child(&p2, &p1, 1, 3);
        assert_eq!(other.order(), &[0, 3, 2, 1, 4]);
    }

    #[test]
    fn test_crossover_child_edge_windows() {
        let cities = create_test_cities();
        let p1 = Chromosome::from_order(&cities, vec![2, 0, 4, 1, 3]).unwrap();
        let p2 = Chromosome::from_order(&cities, vec![1, 3, 0, 2, 4]).unwrap();

        let empty = Chromosome::crossover_child(&p1, &p2, 2, 2);
        assert_eq!(empty.order(), p2.order());

        let full = Chromosome::crossover_child(&p1, &p2, 0, 5);
        assert_eq!(full.order(), p1.order());
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_crossover_child_rejects_bad_window() {
        let cities = create_test_cities();
        let p = Chromosome::from_order(&cities, vec![0, 1, 2, 3, 4]).unwrap();
        Chromosome::crossover_child(&p, &p, 3, 6);
    }

    #[test]
    fn test_recombine_keeps_half_of_each_parent() {
        let cities = ring(10);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let p1 = Chromosome::random(&cities, &mut rng);
        let p2 = Chromosome::random(&cities, &mut rng);

        for _ in 0..50 {
            let (c1, c2) = p1.recombine(&p2, &mut rng);
            assert!(c1.is_valid());
            assert!(c2.is_valid());

            // Both children share the same window of five positions.
            let from_p1 = (0..10).filter(|&i| c1.order()[i] == p1.order()[i]).count();
            let from_p2 = (0..10).filter(|&i| c2.order()[i] == p2.order()[i]).count();
            assert!(from_p1 >= 5);
            assert!(from_p2 >= 5);
        }
    }

    #[test]
    fn test_recombine_identical_parents() {
        let cities = create_test_cities();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let p = Chromosome::random(&cities, &mut rng);

        let (c1, c2) = p.recombine(&p, &mut rng);
        assert_eq!(c1.order(), p.order());
        assert_eq!(c2.order(), p.order());
    }

    #[test]
    fn test_recombine_tiny_tours() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for n in 1..4 {
            let cities = ring(n);
            let p1 = Chromosome::random(&cities, &mut rng);
            let p2 = Chromosome::random(&cities, &mut rng);
            let (c1, c2) = p1.recombine(&p2, &mut rng);
            assert_eq!(sorted(c1.order()), (0..n).collect::<Vec<_>>());
            assert_eq!(sorted(c2.order()), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_crossover_window_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        for len in 0..12 {
            for _ in 0..100 {
                let (begin, end) = crossover_window(len, &mut rng);
                assert_eq!(end - begin, len / 2);
                assert!(end <= len);
            }
        }
    }

    proptest! {
        #[test]
        fn prop_mutation_preserves_permutation(n in 1usize..40, seed in any::<u64>(), rounds in 1usize..20) {
            let cities = ring(n);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut c = Chromosome::random(&cities, &mut rng);

            for _ in 0..rounds {
                c.mutate(&mut rng);
            }

            prop_assert_eq!(sorted(c.order()), (0..n).collect::<Vec<_>>());
            let expected = fitness_from_distance(cities.tour_distance(c.order()));
            prop_assert!((c.fitness() - expected).abs() < 1e-9);
        }

        #[test]
        fn prop_crossover_preserves_permutation(n in 1usize..40, seed in any::<u64>(), a in any::<usize>(), b in any::<usize>()) {
            let cities = ring(n);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let p1 = Chromosome::random(&cities, &mut rng);
            let p2 = Chromosome::random(&cities, &mut rng);

            let (begin, end) = {
                let (x, y) = (a % (n + 1), b % (n + 1));
                (x.min(y), x.max(y))
            };
            let child = Chromosome::crossover_child(&p1, &p2, begin, end);

            prop_assert_eq!(sorted(child.order()), (0..n).collect::<Vec<_>>());
            prop_assert_eq!(&child.order()[begin..end], &p1.order()[begin..end]);
        }
    }
}
