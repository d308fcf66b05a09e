use core::fmt;

use glam::{DQuat, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Body, BodyId, BodyKind, FrameId, Space};

/// Identifies the vehicle a hyperjump or transition event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vehicle#{}", self.0)
    }
}

/// Who is flying the vehicle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlightControl {
    /// Direct stick-and-throttle control.
    #[default]
    Manual,
    /// Hold a set speed relative to the set-speed target.
    FixSpeed,
    /// Let the autopilot fly.
    Autopilot,
}

/// Directional thrust demand, each component in `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThrusterState {
    /// Linear thrust along the vehicle's axes.
    pub linear: DVec3,
    /// Angular thrust about the vehicle's axes.
    pub angular: DVec3,
}

impl ThrusterState {
    /// Whether no thruster is firing.
    pub fn is_neutral(&self) -> bool {
        self.linear == DVec3::ZERO && self.angular == DVec3::ZERO
    }

    /// Sets the linear demand, clamping each component into `[-1, 1]`.
    pub fn set_linear(&mut self, linear: DVec3) {
        self.linear = linear.clamp(DVec3::NEG_ONE, DVec3::ONE);
    }

    /// Sets the angular demand, clamping each component into `[-1, 1]`.
    pub fn set_angular(&mut self, angular: DVec3) {
        self.angular = angular.clamp(DVec3::NEG_ONE, DVec3::ONE);
    }
}

/// Weak references to bodies the vehicle is interested in.
///
/// These are only ids; they are resolved through the body registry on
/// every use and never keep a body alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Targets {
    /// Where the vehicle is navigating to.
    pub navigation: Option<BodyId>,
    /// What the vehicle is shooting at.
    pub combat: Option<BodyId>,
    /// What the set speed is measured against.
    pub set_speed: Option<BodyId>,
}

impl Targets {
    /// Forgets all targets.
    pub fn clear(&mut self) {
        *self = Targets::default();
    }

    /// Whether no target is set.
    pub fn is_empty(&self) -> bool {
        *self == Targets::default()
    }
}

/// The player's ship, as far as frames, targets and controls go.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vehicle {
    /// This vehicle's id.
    pub id: VehicleId,

    /// The frame the vehicle is in; `None` while detached for a hyperjump.
    frame: Option<FrameId>,

    /// Position within the frame, in meters.
    pub position: DVec3,

    /// Velocity within the frame, in meters per second.
    pub velocity: DVec3,

    /// Orientation within the frame.
    pub orientation: DQuat,

    /// The vehicle's mass, in kilograms.
    pub mass: f64,

    /// Hyperdrive fuel on board, in tonnes.
    pub fuel: f64,

    /// Target references.
    pub targets: Targets,

    /// Speed to hold in [`FlightControl::FixSpeed`], in meters per second.
    pub set_speed: f64,

    /// Who is flying.
    pub control: FlightControl,

    /// Current thruster demand.
    pub thrusters: ThrusterState,
}

impl Vehicle {
    /// Creates a vehicle at rest at the origin of `frame`.
    pub fn new(id: VehicleId, frame: FrameId, mass: f64) -> Self {
        Self {
            id,
            frame: Some(frame),
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
            mass,
            fuel: 0.0,
            targets: Targets::default(),
            set_speed: 0.0,
            control: FlightControl::Manual,
            thrusters: ThrusterState::default(),
        }
    }

    /// Returns the same vehicle, placed at `position` with `velocity`.
    #[must_use]
    pub fn with_state(mut self, position: DVec3, velocity: DVec3) -> Self {
        self.position = position;
        self.velocity = velocity;
        self
    }

    /// Returns the same vehicle with `fuel` tonnes of fuel.
    #[must_use]
    pub fn with_fuel(mut self, fuel: f64) -> Self {
        self.fuel = fuel;
        self
    }

    /// The frame the vehicle is in, or `None` while it is detached.
    pub fn frame(&self) -> Option<FrameId> {
        self.frame
    }

    /// Whether the vehicle currently takes part in local-space physics.
    pub fn is_attached(&self) -> bool {
        self.frame.is_some()
    }

    /// Puts the vehicle into `frame`, keeping the pose as given.
    pub fn attach(&mut self, frame: FrameId, position: DVec3, velocity: DVec3) {
        self.frame = Some(frame);
        self.position = position;
        self.velocity = velocity;
    }

    /// Takes the vehicle out of local space, parking it at rest.
    pub fn detach(&mut self) {
        self.frame = None;
        self.position = DVec3::ZERO;
        self.velocity = DVec3::ZERO;
        self.orientation = DQuat::IDENTITY;
    }

    /// Moves the vehicle into another frame of the same space, keeping its
    /// actual position and velocity.
    pub fn switch_to_frame(
        &mut self,
        space: &Space,
        frame: FrameId,
    ) -> Result<(), crate::FrameError> {
        if let Some(current) = self.frame {
            let (position, velocity) =
                space.transform_state(self.position, self.velocity, current, frame)?;
            self.attach(frame, position, velocity);
        } else {
            self.attach(frame, DVec3::ZERO, DVec3::ZERO);
        }
        Ok(())
    }

    /// Sets the combat target, and optionally makes it the set-speed
    /// target too.
    pub fn set_combat_target(&mut self, target: Option<BodyId>, set_speed_to: bool) {
        self.targets.combat = target;
        if set_speed_to {
            self.targets.set_speed = target;
        }
    }

    /// Sets the navigation target.
    pub fn set_nav_target(&mut self, target: Option<BodyId>) {
        self.targets.navigation = target;
    }

    /// Sets the set-speed target.
    pub fn set_set_speed_target(&mut self, target: Option<BodyId>) {
        self.targets.set_speed = target;
    }

    /// Nudges the set speed by `delta` meters per second.
    pub fn change_set_speed(&mut self, delta: f64) {
        self.set_speed += delta;
    }

    /// Hands the controls back to the pilot with all thrusters idle.
    pub fn reset_controls(&mut self) {
        self.control = FlightControl::Manual;
        self.thrusters = ThrusterState::default();
    }

    /// Resolves the navigation target, forgetting it if it's gone.
    pub fn nav_target<'a>(&mut self, space: &'a Space) -> Option<&'a Body> {
        resolve(&mut self.targets.navigation, space, "navigation")
    }

    /// Resolves the combat target, forgetting it if it's gone.
    pub fn combat_target<'a>(&mut self, space: &'a Space) -> Option<&'a Body> {
        resolve(&mut self.targets.combat, space, "combat")
    }

    /// Resolves the set-speed target, forgetting it if it's gone.
    pub fn set_speed_target<'a>(&mut self, space: &'a Space) -> Option<&'a Body> {
        resolve(&mut self.targets.set_speed, space, "set-speed")
    }

    /// Forgets every target reference to a body that just left `space`.
    ///
    /// If the vehicle loses its combat target to a ship jumping away and
    /// isn't navigating anywhere, the ship's departure cloud becomes the
    /// navigation target, so the player can follow it.
    pub fn notify_removed(&mut self, removed: BodyId, kind: BodyKind, space: &Space) {
        if self.targets.navigation == Some(removed) {
            self.targets.navigation = None;
        }

        if self.targets.combat == Some(removed) {
            self.targets.combat = None;

            if self.targets.navigation.is_none() && kind.is_ship() {
                self.targets.navigation = space.find_cloud_for_ship(removed);
            }
        }

        if self.targets.set_speed == Some(removed) {
            self.targets.set_speed = None;
        }
    }
}

fn resolve<'a>(slot: &mut Option<BodyId>, space: &'a Space, which: &str) -> Option<&'a Body> {
    let id = (*slot)?;
    match space.body(id) {
        Some(body) => Some(body),
        None => {
            log::warn!("{which} target {id} no longer resolves; clearing it");
            *slot = None;
            None
        }
    }
}
