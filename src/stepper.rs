use serde::Serialize;
use tracing::debug;

use crate::motion::{Motion, Position};
use crate::rng::RandomSource;
use crate::terrain::{Environment, Terrain};

/// Result of advancing the true agent by one commanded move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    pub position: Position,
    pub measurement: Terrain,
    pub correct: bool,
}

/// Move the true agent and sample a noisy reading of its new cell.
///
/// Two independent draws: the move succeeds when the first is below
/// `movement_certainty`, the reading is truthful when the second is below
/// `sensor_accuracy`.
pub fn step<R: RandomSource>(
    position: Position,
    environment: &Environment,
    motion: Motion,
    movement_certainty: f64,
    sensor_accuracy: f64,
    rng: &mut R,
) -> StepOutcome {
    let labels = &environment.labels;
    let position = if rng.next_f64() < movement_certainty {
        position.moved(motion, labels.w, labels.h)
    } else {
        position
    };

    let truth = environment.label(position.x as i64, position.y as i64);
    let correct = rng.next_f64() < sensor_accuracy;
    let measurement = if correct { truth } else { truth.other(rng) };

    debug!(?position, ?measurement, correct, "stepped");
    StepOutcome {
        position,
        measurement,
        correct,
    }
}
