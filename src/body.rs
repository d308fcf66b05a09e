use core::fmt;

use glam::{DQuat, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{FrameId, SystemPath};

/// The radius given to hyperspace clouds, in meters.
pub const HYPERSPACE_CLOUD_RADIUS: f64 = 100.0;

/// A stable identifier of a body within a [`Space`][crate::Space].
///
/// Identifiers are never reused while the space is alive, so a stale id
/// simply fails to resolve instead of aliasing a newer body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyId(pub u64);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "body#{}", self.0)
    }
}

/// The closed set of body kinds the simulation knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyKind {
    /// A star; usually the primary of a system.
    Star,
    /// A planet, moon, or other terrain body.
    Planet,
    /// An orbital or surface station.
    SpaceStation,
    /// A non-player ship.
    Ship,
    /// The player's ship.
    Player,
    /// Jettisoned cargo.
    CargoBody,
    /// A guided missile.
    Missile,
    /// The wake a ship leaves when it enters or leaves hyperspace.
    ///
    /// Holds the ship that is on its way, if any. The ship id refers to the
    /// space the cloud was opened in.
    HyperspaceCloud {
        /// The ship travelling through this cloud.
        ship: Option<BodyId>,
        /// Where the ship is bound. Arrival clouds point back to where it
        /// came from.
        destination: Option<SystemPath>,
        /// Whether the cloud is an exit rather than an entry.
        arrival: bool,
    },
}

impl BodyKind {
    /// Whether this body moves under its own physics rather than on rails.
    pub fn is_dynamic(self) -> bool {
        matches!(
            self,
            BodyKind::Ship | BodyKind::Player | BodyKind::CargoBody | BodyKind::Missile
        )
    }

    /// Whether this body is backed by generated star-system data.
    pub fn has_system_body(self) -> bool {
        matches!(
            self,
            BodyKind::Star | BodyKind::Planet | BodyKind::SpaceStation
        )
    }

    /// Whether this body is a ship (the player's ship counts).
    pub fn is_ship(self) -> bool {
        matches!(self, BodyKind::Ship | BodyKind::Player)
    }

    /// Whether this body can own a frame of reference.
    pub fn is_gravitating(self) -> bool {
        matches!(self, BodyKind::Star | BodyKind::Planet)
    }

    /// Subtype test: a player is a ship, every ship is dynamic, and so on.
    ///
    /// ```
    /// use keplerian_transit::BodyKind;
    ///
    /// assert!(BodyKind::Player.is_a(BodyKind::Ship));
    /// assert!(!BodyKind::Ship.is_a(BodyKind::Player));
    /// ```
    pub fn is_a(self, other: BodyKind) -> bool {
        match (self, other) {
            (BodyKind::Player, BodyKind::Ship) => true,
            (BodyKind::HyperspaceCloud { .. }, BodyKind::HyperspaceCloud { .. }) => true,
            (a, b) => a == b,
        }
    }
}

/// A struct representing a body in a star system.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Body {
    /// The name of the body.
    pub name: String,

    /// What kind of body this is.
    pub kind: BodyKind,

    /// The mass of the body, in kilograms.
    pub mass: f64,

    /// The radius of the body, in meters.
    pub radius: f64,

    /// The frame this body's pose is expressed in.
    pub frame: FrameId,

    /// Position within [`frame`][Self::frame], in meters.
    pub position: DVec3,

    /// Velocity within [`frame`][Self::frame], in meters per second.
    pub velocity: DVec3,

    /// Orientation within [`frame`][Self::frame].
    pub orientation: DQuat,
}

impl Body {
    /// Creates a new body at rest at the origin of `frame`.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the body.
    /// * `kind` - What kind of body it is.
    /// * `mass` - The mass of the body, in kilograms.
    /// * `radius` - The radius of the body, in meters.
    /// * `frame` - The frame the body lives in.
    pub fn new(
        name: impl Into<String>,
        kind: BodyKind,
        mass: f64,
        radius: f64,
        frame: FrameId,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            mass,
            radius,
            frame,
            position: DVec3::ZERO,
            velocity: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }

    /// Creates a massless hyperspace cloud at the origin of `frame`.
    pub fn hyperspace_cloud(
        frame: FrameId,
        ship: Option<BodyId>,
        destination: Option<SystemPath>,
        arrival: bool,
    ) -> Self {
        let kind = BodyKind::HyperspaceCloud {
            ship,
            destination,
            arrival,
        };
        Self::new("Hyperspace cloud", kind, 0.0, HYPERSPACE_CLOUD_RADIUS, frame)
    }

    /// Returns the same body, placed at `position` with `velocity`.
    #[must_use]
    pub fn with_state(mut self, position: DVec3, velocity: DVec3) -> Self {
        self.position = position;
        self.velocity = velocity;
        self
    }

    /// The ship inside this body, if it is a hyperspace cloud carrying one.
    pub fn cloud_ship(&self) -> Option<BodyId> {
        match self.kind {
            BodyKind::HyperspaceCloud { ship, .. } => ship,
            _ => None,
        }
    }

    /// Whether this is a hyperspace cloud ships leave the system through.
    pub fn is_departure_cloud(&self) -> bool {
        matches!(self.kind, BodyKind::HyperspaceCloud { arrival: false, .. })
    }

    /// Where the ship in this hyperspace cloud is bound, if known.
    pub fn cloud_destination(&self) -> Option<SystemPath> {
        match self.kind {
            BodyKind::HyperspaceCloud { destination, .. } => destination,
            _ => None,
        }
    }
}
