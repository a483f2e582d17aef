use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest grid accepted, 256x256 cells. Rendering alone costs
/// 1600 bytes per cell.
pub const MAX_POSITIONS: usize = 256 * 256;

/// All tunable parameters, exposed as sliders in the frontend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // Grid
    pub width: usize,
    pub height: usize,

    /// Number of lowest-ranked cells labelled sand, `0..=width*height`.
    pub density: usize,

    // Noise, shared by the simulated agent and the filter's models
    pub movement_certainty: f64,
    pub sensor_accuracy: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            density: 92,
            movement_certainty: 0.9,
            sensor_accuracy: 0.9,
        }
    }
}

impl Params {
    pub fn position_count(&self) -> usize {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        match self.width.checked_mul(self.height) {
            Some(n) if n <= MAX_POSITIONS => {}
            _ => {
                return Err(Error::InvalidConfig(format!(
                    "grid {}x{} exceeds {} cells",
                    self.width, self.height, MAX_POSITIONS
                )));
            }
        }
        if self.density > self.position_count() {
            return Err(Error::InvalidConfig(format!(
                "density {} exceeds {} cells",
                self.density,
                self.position_count()
            )));
        }
        for (name, p) in [
            ("movement_certainty", self.movement_certainty),
            ("sensor_accuracy", self.sensor_accuracy),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!(
                    "{name} must be within [0, 1], got {p}"
                )));
            }
        }
        Ok(())
    }
}
