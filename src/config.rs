#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::GRAVITATIONAL_CONSTANT;

/// Tunables shared by everything living in a [`Space`][crate::Space].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    /// The gravitational constant, in m^3 kg^-1 s^-2.
    pub gravitational_constant: f64,

    /// The length of one [`tick`][crate::Simulation::tick], in seconds.
    pub time_step: f64,

    /// Orbits with a semi-major axis (or semi-latus rectum) smaller than
    /// this, in meters, are treated as degenerate.
    pub degenerate_semi_major_axis: f64,

    /// How far from the destination's primary a vehicle leaves
    /// hyperspace, in meters.
    pub hyperspace_exit_distance: f64,

    /// How fast a vehicle is moving when it leaves hyperspace, in meters
    /// per second.
    pub hyperspace_exit_speed: f64,
}

impl SimConfig {
    /// Returns the same config with a different time step.
    #[must_use]
    pub fn with_time_step(mut self, time_step: f64) -> Self {
        self.time_step = time_step;
        self
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            gravitational_constant: GRAVITATIONAL_CONSTANT,
            time_step: 1.0 / 60.0,
            degenerate_semi_major_axis: 1e-6,
            hyperspace_exit_distance: 1.0e11,
            hyperspace_exit_speed: 1.0e4,
        }
    }
}
