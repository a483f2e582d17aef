use rayon::prelude::*;
use tracing::warn;

use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::motion::{Motion, Position};
use crate::terrain::{Environment, Terrain};

/// Histogram filter over the agent's cell. Operators return a fresh belief.
#[derive(Clone, Debug, PartialEq)]
pub struct Belief {
    pub grid: Grid<f64>,
}

impl Belief {
    /// Uniform prior, `1 / (w * h)` per cell.
    pub fn uniform(w: usize, h: usize) -> Self {
        Self {
            grid: Grid::filled(w, h, 1.0 / (w * h) as f64),
        }
    }

    pub fn from_grid(grid: Grid<f64>) -> Self {
        Self { grid }
    }

    #[inline]
    pub fn at(&self, x: i64, y: i64) -> f64 {
        self.grid.get(x, y)
    }

    /// Mix "moved as commanded" with "stayed put":
    /// `p'(x, y) = c * p(x - dx, y - dy) + (1 - c) * p(x, y)`.
    /// Mass is conserved for any certainty in `[0, 1]`.
    pub fn motion_update(&self, motion: Motion, certainty: f64) -> Belief {
        let prior = &self.grid;
        let w = prior.w;
        let (dx, dy) = motion.wrapped(w, prior.h);
        let mut moved = Grid::<f64>::new(w, prior.h);

        moved.data.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
            let y = y as i64;
            for (x, cell) in row.iter_mut().enumerate() {
                let x = x as i64;
                let success = certainty * prior.get(x - dx, y - dy);
                let failure = (1.0 - certainty) * prior.get(x, y);
                *cell = success + failure;
            }
        });

        Belief { grid: moved }
    }

    /// Bayes likelihood: scale each cell by `accuracy` where the terrain
    /// matches `measurement`, by `1 - accuracy` elsewhere. Not normalized.
    /// The environment must have the belief's dimensions.
    pub fn sensor_update(
        &self,
        measurement: Terrain,
        environment: &Environment,
        accuracy: f64,
    ) -> Result<Belief> {
        let labels = &environment.labels;
        if (labels.w, labels.h) != (self.grid.w, self.grid.h) {
            return Err(Error::ShapeMismatch {
                width: self.grid.w,
                height: self.grid.h,
                len: labels.data.len(),
            });
        }

        let mut data = self.grid.data.clone();
        data.par_iter_mut()
            .zip(labels.data.par_iter())
            .for_each(|(p, &label)| {
                let multiplier = if label == measurement {
                    accuracy
                } else {
                    1.0 - accuracy
                };
                *p *= multiplier;
            });

        Ok(Belief {
            grid: Grid::from_vec(self.grid.w, self.grid.h, data)?,
        })
    }

    pub fn normalize(&self, total: f64) -> Result<Belief> {
        match self.grid.normalize(total) {
            Ok(grid) => Ok(Belief { grid }),
            Err(e) => {
                warn!(error = %e, "belief collapsed");
                Err(e)
            }
        }
    }

    /// Most probable cell and its probability. Ties go to the first cell in
    /// row-major order.
    pub fn most_likely(&self) -> (Position, f64) {
        let (x, y, p) = self
            .grid
            .cells()
            .fold((0, 0, f64::NEG_INFINITY), |best, (x, y, p)| {
                if p > best.2 { (x, y, p) } else { best }
            });
        (Position::new(x, y), p)
    }

    /// Probability mass on cells labelled `terrain`.
    pub fn mass_on(&self, terrain: Terrain, environment: &Environment) -> f64 {
        self.grid
            .data
            .iter()
            .zip(&environment.labels.data)
            .filter(|&(_, &l)| l == terrain)
            .map(|(p, _)| p)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;
    use crate::terrain::generate;

    fn env_2x2() -> Environment {
        let labels = Grid::from_vec(
            2,
            2,
            vec![Terrain::Sand, Terrain::Grass, Terrain::Sand, Terrain::Grass],
        )
        .unwrap();
        Environment::from_labels(labels)
    }

    #[test]
    fn certain_motion_translates() {
        let mut grid = Grid::filled(4, 4, 1.0 / 16.0);
        grid.set(3, 1, 0.25).set(0, 2, 0.0);
        let prior = Belief::from_grid(grid);
        let moved = prior.motion_update(Motion::new(1, 0), 1.0);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(moved.at(x, y), prior.at(x - 1, y));
            }
        }
        assert_eq!(moved.at(0, 1), 0.25);
        assert_eq!(moved.at(1, 2), 0.0);
    }

    #[test]
    fn uniform_prior_is_motion_invariant() {
        let prior = Belief::uniform(4, 4);
        let moved = prior.motion_update(Motion::new(1, 0), 1.0);
        assert_eq!(moved, prior);
    }

    #[test]
    fn extreme_motion_matches_reduced_motion() {
        let mut grid = Grid::<f64>::new(4, 4);
        grid.set(1, 2, 0.7).set(3, 0, 0.3);
        let prior = Belief::from_grid(grid);
        // i64::MIN wraps to 0 and i64::MAX to 3 (i.e. -1) on a 4x4 torus.
        let extreme = prior.motion_update(Motion::new(i64::MIN, i64::MAX), 1.0);
        assert_eq!(extreme, prior.motion_update(Motion::new(0, -1), 1.0));
        assert_eq!(extreme.at(1, 1), 0.7);

        let odd = Belief::uniform(5, 3).motion_update(Motion::new(i64::MAX, i64::MIN), 0.5);
        assert!((odd.grid.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mismatched_environment_is_rejected() {
        let env = env_2x2();
        let err = Belief::uniform(4, 4)
            .sensor_update(Terrain::Sand, &env, 0.9)
            .unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                width: 4,
                height: 4,
                len: 4
            }
        );
    }

    #[test]
    fn failed_motion_keeps_belief() {
        let mut grid = Grid::<f64>::new(3, 3);
        grid.set(1, 1, 1.0);
        let prior = Belief::from_grid(grid);
        assert_eq!(prior.motion_update(Motion::new(0, 1), 0.0), prior);
    }

    #[test]
    fn partial_motion_splits_mass() {
        let mut grid = Grid::<f64>::new(3, 3);
        grid.set(1, 1, 1.0);
        let moved = Belief::from_grid(grid).motion_update(Motion::new(0, -1), 0.9);
        assert!((moved.at(1, 0) - 0.9).abs() < 1e-12);
        assert!((moved.at(1, 1) - 0.1).abs() < 1e-12);
        assert!((moved.grid.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn exact_sensor_scenario() {
        let env = env_2x2();
        let prior = Belief::from_grid(Grid::from_vec(2, 2, vec![0.5, 0.5, 0.0, 0.0]).unwrap());
        let sensed = prior.sensor_update(Terrain::Sand, &env, 1.0).unwrap();
        assert_eq!(sensed.grid.data, vec![0.5, 0.0, 0.0, 0.0]);
        let post = sensed.normalize(1.0).unwrap();
        assert_eq!(post.grid.data, vec![1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn half_accuracy_is_uninformative() {
        let env = generate(None, 4, 4, 6, &mut Rng::new(2));
        let prior = Belief::uniform(4, 4);
        let post = prior
            .sensor_update(Terrain::Grass, &env, 0.5)
            .unwrap()
            .normalize(1.0)
            .unwrap();
        for (a, b) in prior.grid.data.iter().zip(&post.grid.data) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn matching_cells_gain_share() {
        let env = generate(None, 8, 8, 20, &mut Rng::new(4));
        let prior = Belief::uniform(8, 8);
        let before = prior.mass_on(Terrain::Sand, &env);
        let post = prior
            .sensor_update(Terrain::Sand, &env, 0.8)
            .unwrap()
            .normalize(1.0)
            .unwrap();
        assert!(post.mass_on(Terrain::Sand, &env) > before);
        assert!(post.mass_on(Terrain::Grass, &env) < 1.0 - before);
    }

    #[test]
    fn zero_mass_normalize_fails() {
        let env = env_2x2();
        let prior = Belief::from_grid(Grid::from_vec(2, 2, vec![0.0, 1.0, 0.0, 0.0]).unwrap());
        let sensed = prior.sensor_update(Terrain::Sand, &env, 1.0).unwrap();
        assert!(sensed.normalize(1.0).is_err());
        assert!(Belief::from_grid(Grid::<f64>::new(4, 4)).normalize(1.0).is_err());
    }

    #[test]
    fn most_likely_picks_peak() {
        let mut grid = Grid::filled(4, 4, 0.01);
        grid.set(2, 3, 0.5);
        let (pos, p) = Belief::from_grid(grid).most_likely();
        assert_eq!(pos, Position::new(2, 3));
        assert_eq!(p, 0.5);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn motion_conserves_mass(
                data in prop::collection::vec(0.0_f64..1.0, 25),
                dx in -6_i64..6,
                dy in -6_i64..6,
                certainty in 0.0_f64..=1.0,
            ) {
                let prior = Belief::from_grid(Grid::from_vec(5, 5, data).unwrap());
                let moved = prior.motion_update(Motion::new(dx, dy), certainty);
                prop_assert!((moved.grid.sum() - prior.grid.sum()).abs() < 1e-9);
                prop_assert!(moved.grid.data.iter().all(|&p| p >= 0.0));
            }
        }
    }
}
