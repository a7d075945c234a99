//! Fruit placement
//!
//! Candidate answers are shuffled and dropped into the unit square one by
//! one. Each fruit is resampled until it keeps its distance from the fruits
//! already placed, but only a bounded number of times: a crowded layout is
//! preferred over no layout at all.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{constants::layout as limits, problem::Answer, random::RandomSource};

/// A candidate answer placed on the playing field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fruit {
    /// Horizontal position in `[0, 1]`
    pub x: f64,
    /// Vertical position in `[0, 1]`
    pub y: f64,
    /// Whether the fruit is displayed as cut
    pub sliced: bool,
    /// The candidate answer carried by the fruit
    pub value: Answer,
}

impl Fruit {
    fn distance_to(&self, (x, y): (f64, f64)) -> f64 {
        (self.x - x).hypot(self.y - y)
    }
}

/// Placement parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    /// Minimum distance kept between fruits when possible
    pub min_distance: f64,
    /// Samples drawn per fruit before an overlapping one is accepted
    pub max_attempts: usize,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            min_distance: limits::MIN_DISTANCE,
            max_attempts: limits::MAX_ATTEMPTS,
        }
    }
}

impl Layout {
    /// Shuffles `values` and places one unsliced fruit per value
    ///
    /// Never fails: when every attempt for a fruit overlaps, the last
    /// sample is used.
    pub fn arrange<R: RandomSource>(&self, mut values: Vec<Answer>, rng: &mut R) -> Vec<Fruit> {
        rng.shuffle(&mut values);

        let mut fruits: Vec<Fruit> = Vec::with_capacity(values.len());

        for value in values {
            let (x, y) = self.place(&fruits, rng);
            fruits.push(Fruit {
                x,
                y,
                sliced: false,
                value,
            });
        }

        fruits
    }

    fn place<R: RandomSource>(&self, placed: &[Fruit], rng: &mut R) -> (f64, f64) {
        let overlaps = |point: (f64, f64)| {
            placed
                .iter()
                .any(|fruit| fruit.distance_to(point) < self.min_distance)
        };

        let mut point = sample(rng);
        let mut attempts = 1;
        while attempts < self.max_attempts && overlaps(point) {
            point = sample(rng);
            attempts += 1;
        }
        point
    }
}

fn sample<R: RandomSource>(rng: &mut R) -> (f64, f64) {
    let range = limits::MIN_COORDINATE..limits::MAX_COORDINATE;
    (rng.real(range.clone()), rng.real(range))
}

/// Smallest pairwise distance between fruits, `None` with fewer than two
pub fn closest_pair_distance(fruits: &[Fruit]) -> Option<f64> {
    fruits
        .iter()
        .tuple_combinations()
        .map(|(a, b)| a.distance_to((b.x, b.y)))
        .min_by(f64::total_cmp)
}
