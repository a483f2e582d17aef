pub mod belief;
pub mod config;
pub mod error;
pub mod grid;
pub mod motion;
pub mod render;
pub mod rng;
pub mod stepper;
pub mod terrain;

use tracing::debug;

use belief::Belief;
use config::Params;
use motion::{Motion, Position};
use rng::RandomSource;
use terrain::{Environment, Terrain};

pub use error::{Error, Result};

/// Everything a driver holds between events. Each event produces a fresh
/// state; nothing is mutated in place.
#[derive(Clone, Debug)]
pub struct Simulation {
    pub environment: Environment,
    pub belief: Belief,
    pub position: Position,
    pub last_measurement: Option<Terrain>,
    pub last_correct: bool,
    pub steps: u64,
}

impl Simulation {
    /// Fresh environment lineage, uniform prior, random true position.
    pub fn new<R: RandomSource>(params: &Params, rng: &mut R) -> Result<Self> {
        params.validate()?;
        let (w, h) = (params.width, params.height);
        let environment = terrain::generate(None, w, h, params.density, rng);
        let position = Position::new(rng.range_usize(w), rng.range_usize(h));
        Ok(Self {
            environment,
            belief: Belief::uniform(w, h),
            position,
            last_measurement: None,
            last_correct: true,
            steps: 0,
        })
    }

    /// One event: move the true agent, sense, then
    /// motion update -> sensor update -> normalize.
    pub fn step<R: RandomSource>(
        &self,
        motion: Motion,
        params: &Params,
        rng: &mut R,
    ) -> Result<Simulation> {
        params.validate()?;
        let outcome = stepper::step(
            self.position,
            &self.environment,
            motion,
            params.movement_certainty,
            params.sensor_accuracy,
            rng,
        );

        let belief = self
            .belief
            .motion_update(motion, params.movement_certainty)
            .sensor_update(outcome.measurement, &self.environment, params.sensor_accuracy)?
            .normalize(1.0)?;

        let steps = self.steps + 1;
        let (estimate, p) = belief.most_likely();
        debug!(steps, ?estimate, p, truth = ?outcome.position, "belief updated");

        Ok(Simulation {
            environment: self.environment.clone(),
            belief,
            position: outcome.position,
            last_measurement: Some(outcome.measurement),
            last_correct: outcome.correct,
            steps,
        })
    }

    /// Relabel the environment at `params.density`, keeping its ranking.
    /// Belief and true position carry over; dimensions must not change.
    pub fn reconfigure(&self, params: &Params) -> Result<Simulation> {
        params.validate()?;
        let labels = &self.environment.labels;
        if (params.width, params.height) != (labels.w, labels.h) {
            return Err(Error::InvalidConfig(format!(
                "cannot resize {}x{} simulation to {}x{}",
                labels.w, labels.h, params.width, params.height
            )));
        }
        Ok(Simulation {
            environment: self.environment.with_density(params.density),
            ..self.clone()
        })
    }
}
