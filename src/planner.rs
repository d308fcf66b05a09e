use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{FrameError, OrbitalState, Space, Vehicle};

/// The outcome of interpreting a velocity offset against the current orbit.
///
/// `time == 0.0` together with a zero `velocity` is the "no maneuver
/// planned" sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManeuverPlan {
    /// When the vehicle reaches the planned burn point, in seconds of
    /// simulation time.
    pub time: f64,

    /// The delta-v the burn actually needs, in meters per second.
    pub velocity: DVec3,

    /// The offset the user asked for, unchanged.
    pub offset: DVec3,
}

impl ManeuverPlan {
    /// The "no maneuver planned" sentinel.
    pub const NONE: ManeuverPlan = ManeuverPlan {
        time: 0.0,
        velocity: DVec3::ZERO,
        offset: DVec3::ZERO,
    };

    /// Whether this is the "no maneuver planned" sentinel.
    pub fn is_none(&self) -> bool {
        self.time == 0.0 && self.velocity == DVec3::ZERO
    }
}

/// Holds the transfer the user is sketching.
///
/// The target state is the position and velocity the vehicle should have
/// right after the burn, in the inertial frame the vehicle is orbiting in.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManeuverPlanner {
    position: DVec3,
    velocity: DVec3,
    offset: DVec3,
    start_time: f64,
}

impl ManeuverPlanner {
    /// Creates a planner with nothing planned.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the post-burn position and velocity.
    pub fn set_target(&mut self, position: DVec3, velocity: DVec3) {
        self.position = position;
        self.velocity = velocity;
    }

    /// Sets the velocity offset the user asked for.
    pub fn set_offset_velocity(&mut self, offset: DVec3) {
        self.offset = offset;
    }

    /// Sets when the burn should start, in seconds of simulation time.
    pub fn set_start_time(&mut self, start_time: f64) {
        self.start_time = start_time;
    }

    /// The planned post-burn position.
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// The planned post-burn velocity.
    pub fn velocity(&self) -> DVec3 {
        self.velocity
    }

    /// The velocity offset the user asked for.
    pub fn offset_velocity(&self) -> DVec3 {
        self.offset
    }

    /// When the burn should start.
    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    /// Forgets the burn time.
    pub fn reset_start_time(&mut self) {
        self.start_time = 0.0;
    }

    /// Forgets the planned delta-v.
    pub fn reset_dv(&mut self) {
        self.offset = DVec3::ZERO;
        self.position = DVec3::ZERO;
        self.velocity = DVec3::ZERO;
    }

    /// The time to show for the planned maneuver; zero when nothing is
    /// planned.
    pub fn maneuver_time(&self) -> f64 {
        if self.offset == DVec3::ZERO {
            0.0
        } else {
            self.start_time
        }
    }

    /// The delta-v to show for the planned maneuver; zero when nothing is
    /// planned or the vehicle's orbit is degenerate.
    pub fn maneuver_velocity(&self, vehicle: &Vehicle, space: &Space) -> Result<DVec3, FrameError> {
        self.plan_offset_maneuver(vehicle, space, space.time())
            .map(|plan| plan.velocity)
    }

    /// Interprets the stored offset against the vehicle's current orbit.
    ///
    /// The orbit is computed in the nearest inertial frame around the body
    /// anchoring it, from the vehicle's state at `now`. The plan's `time`
    /// is the earliest moment the vehicle passes the planned burn point,
    /// and its `velocity` is what must be added to the orbital velocity
    /// there to reach the planned post-burn velocity.
    ///
    /// Degenerate situations yield [`ManeuverPlan::NONE`]: a zero offset,
    /// a detached vehicle, a frame with no gravitating body, a degenerate
    /// orbit, or a burn point the trajectory never reaches.
    ///
    /// # Errors
    /// Only structural frame graph errors are returned; they mean the graph
    /// is corrupted. Lookups that simply no longer resolve count as
    /// "nothing to plan".
    pub fn plan_offset_maneuver(
        &self,
        vehicle: &Vehicle,
        space: &Space,
        now: f64,
    ) -> Result<ManeuverPlan, FrameError> {
        if self.offset == DVec3::ZERO {
            return Ok(ManeuverPlan::NONE);
        }

        let none = ManeuverPlan {
            offset: self.offset,
            ..ManeuverPlan::NONE
        };

        let Some(frame) = vehicle.frame() else {
            return Ok(none);
        };

        let unavailable = |err: FrameError| -> Result<ManeuverPlan, FrameError> {
            if err.is_structural() {
                Err(err)
            } else {
                log::debug!("maneuver planning skipped: {err}");
                Ok(none)
            }
        };

        let inertial = match space.resolve_to_non_rotating_ancestor(frame) {
            Ok(inertial) => inertial,
            Err(err) => return unavailable(err),
        };
        let mass = match space.gravitating_body_mass(inertial) {
            Ok(mass) => mass,
            Err(err) => return unavailable(err),
        };
        let transformed =
            space.transform_state_at(now, vehicle.position, vehicle.velocity, frame, inertial);
        let (position, velocity) = match transformed {
            Ok(state) => state,
            Err(err) => return unavailable(err),
        };

        let config = space.config();
        let orbit = match OrbitalState::from_state_vectors(
            position,
            velocity,
            mass,
            now,
            config.gravitational_constant,
        ) {
            Ok(orbit) => orbit,
            Err(err) => {
                log::debug!("maneuver planning skipped: {err}");
                return Ok(none);
            }
        };

        if orbit.is_degenerate(config.degenerate_semi_major_axis) {
            log::debug!("maneuver planning skipped: degenerate orbit {orbit:?}");
            return Ok(none);
        }

        let Some(time) = orbit.time_of_flight_to_position(self.position, now) else {
            log::debug!("maneuver planning skipped: burn point is never reached");
            return Ok(none);
        };

        let delta_v = self.velocity - orbit.velocity_at_time(time);

        Ok(ManeuverPlan {
            time,
            velocity: delta_v,
            offset: self.offset,
        })
    }
}
