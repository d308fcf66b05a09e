use core::fmt;

use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    hyperjump::JumpContext, Body, BodyId, FrameError, Hyperdrive, HyperjumpError, HyperjumpRequest,
    HyperjumpState, HyperjumpStatus, ManeuverPlan, ManeuverPlanner, SimConfig, Space,
    TransitionEvent, Vehicle,
};

/// The address of a star system in the galaxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SystemPath {
    /// Sector coordinates.
    pub sector_x: i32,
    /// Sector coordinates.
    pub sector_y: i32,
    /// Sector coordinates.
    pub sector_z: i32,
    /// Which system within the sector.
    pub system_index: u32,
}

impl SystemPath {
    /// Creates a path to system `system_index` of sector `(x, y, z)`.
    pub const fn new(sector_x: i32, sector_y: i32, sector_z: i32, system_index: u32) -> Self {
        Self {
            sector_x,
            sector_y,
            sector_z,
            system_index,
        }
    }

    /// Whether both paths name the same star system.
    pub fn is_same_system(&self, other: &SystemPath) -> bool {
        self == other
    }
}

impl fmt::Display for SystemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{}):{}",
            self.sector_x, self.sector_y, self.sector_z, self.system_index
        )
    }
}

/// Builds star systems on demand.
///
/// The simulation only asks for a system when a vehicle drops out of
/// hyperspace there. Generating or deserializing it is up to the
/// implementor.
pub trait SystemLoader {
    /// Builds the space of the system at `path`, with its clock at `time`.
    ///
    /// Returns `None` if the system can't be loaded right now.
    fn load_system(&mut self, path: SystemPath, time: f64, config: SimConfig) -> Option<Space>;

    /// Where the system sits in the galaxy, in any consistent unit.
    ///
    /// Used to bring arriving vehicles in from the direction they came
    /// from. Without it they arrive along +X.
    fn system_position(&self, path: SystemPath) -> Option<DVec3> {
        let _ = path;
        None
    }
}

/// The simulation core: one space, one player vehicle, its planner and its
/// hyperdrive.
pub struct Simulation {
    space: Space,
    vehicle: Vehicle,
    planner: ManeuverPlanner,
    drive: Hyperdrive,
    loader: Box<dyn SystemLoader>,
}

impl Simulation {
    /// Creates a simulation around an already loaded space.
    ///
    /// The vehicle should be attached to a frame of `space`.
    pub fn new(space: Space, vehicle: Vehicle, loader: Box<dyn SystemLoader>) -> Self {
        log::info!("starting simulation in {space}");
        let drive = Hyperdrive::new(vehicle.id);
        Self {
            space,
            vehicle,
            planner: ManeuverPlanner::new(),
            drive,
            loader,
        }
    }

    /// The current space.
    pub fn space(&self) -> &Space {
        &self.space
    }

    /// The current space, mutably.
    pub fn space_mut(&mut self) -> &mut Space {
        &mut self.space
    }

    /// The player's vehicle.
    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    /// The player's vehicle, mutably.
    pub fn vehicle_mut(&mut self) -> &mut Vehicle {
        &mut self.vehicle
    }

    /// The maneuver planner.
    pub fn planner(&self) -> &ManeuverPlanner {
        &self.planner
    }

    /// The maneuver planner, mutably.
    pub fn planner_mut(&mut self) -> &mut ManeuverPlanner {
        &mut self.planner
    }

    /// The vehicle's hyperdrive.
    pub fn hyperdrive(&self) -> &Hyperdrive {
        &self.drive
    }

    /// Shorthand for the hyperdrive's state.
    pub fn hyperjump_state(&self) -> HyperjumpState {
        self.drive.state()
    }

    /// The simulation time, in seconds.
    pub fn time(&self) -> f64 {
        self.space.time()
    }

    /// Asks the vehicle's hyperdrive to start a jump.
    ///
    /// See [`Hyperdrive::initiate`].
    pub fn initiate_jump(
        &mut self,
        request: HyperjumpRequest,
    ) -> Result<HyperjumpStatus, HyperjumpError> {
        let now = self.space.time();
        self.drive
            .initiate(request, &mut self.vehicle, &self.space, now)
    }

    /// Cancels a jump during warmup.
    ///
    /// See [`Hyperdrive::abort`].
    pub fn abort_jump(&mut self) -> Result<(), HyperjumpError> {
        self.drive.abort(self.space.time())
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// The hyperdrive steps first, against the frame tree as it was at the
    /// start of the step. The clock moves last, even if the step failed.
    ///
    /// # Errors
    /// [`HyperjumpError::DestinationUnavailable`] if a vehicle arrives at a
    /// system that can't be loaded. The arrival is retried next step.
    pub fn advance(&mut self, dt: f64) -> Result<(), HyperjumpError> {
        let mut ctx = JumpContext {
            now: self.space.time(),
            vehicle: &mut self.vehicle,
            space: &mut self.space,
            planner: &mut self.planner,
            loader: self.loader.as_mut(),
        };
        let result = self.drive.advance(dt, &mut ctx);

        self.space.tick(dt);
        result
    }

    /// Advances the simulation by the configured time step.
    pub fn tick(&mut self) -> Result<(), HyperjumpError> {
        let dt = self.space.config().time_step;
        self.advance(dt)
    }

    /// Takes all queued transition events, oldest first.
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        self.drive.drain_events()
    }

    /// The time of the planned maneuver; zero when nothing is planned.
    pub fn maneuver_time(&self) -> f64 {
        self.planner.maneuver_time()
    }

    /// The delta-v of the planned maneuver; zero when nothing is planned,
    /// in hyperspace, or on a degenerate orbit.
    pub fn maneuver_velocity(&self) -> Result<DVec3, FrameError> {
        if !self.vehicle.is_attached() {
            return Ok(DVec3::ZERO);
        }
        self.planner.maneuver_velocity(&self.vehicle, &self.space)
    }

    /// Interprets the planner's offset against the vehicle's current orbit.
    pub fn plan_maneuver(&self) -> Result<ManeuverPlan, FrameError> {
        self.planner
            .plan_offset_maneuver(&self.vehicle, &self.space, self.space.time())
    }

    /// Removes a body and everything that goes with it.
    ///
    /// If the vehicle was inside a frame that goes away, it is moved up to
    /// the nearest surviving ancestor first, keeping its actual motion.
    /// Targets pointing at removed bodies are forgotten.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Vec<(BodyId, Body)>, FrameError> {
        if let Some(frame) = self.vehicle.frame() {
            let doomed = self.space.frames_owned_by(id);
            let path = self.space.path_to_root(frame)?;

            let refuge = path
                .iter()
                .rposition(|frame_id| doomed.contains(frame_id) && *frame_id != self.space.root())
                .and_then(|index| path.get(index + 1))
                .copied();
            if let Some(refuge) = refuge {
                log::info!("{} leaves {frame} for {refuge}", self.vehicle.id);
                self.vehicle.switch_to_frame(&self.space, refuge)?;
            }
        }

        let removed = self.space.remove_body(id);
        for (removed_id, body) in &removed {
            self.vehicle
                .notify_removed(*removed_id, body.kind, &self.space);
        }

        Ok(removed)
    }
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("space", &self.space)
            .field("vehicle", &self.vehicle)
            .field("planner", &self.planner)
            .field("drive", &self.drive)
            .finish_non_exhaustive()
    }
}
