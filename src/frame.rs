use core::{f64::consts::TAU, fmt};

use glam::{DQuat, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BodyId, OrbitalState};

/// A stable identifier of a frame within a [`Space`][crate::Space].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameId(pub u64);

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// How a frame moves relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrameKind {
    /// A non-rotating frame centered on a gravitating body.
    ///
    /// Non-root inertial frames follow their owner's orbit around the
    /// parent frame's origin.
    Inertial {
        /// The owner's orbit in the parent frame; `None` for the root.
        orbit: Option<OrbitalState>,
    },

    /// A frame that shares its parent's origin and turns with the owner's
    /// surface.
    Rotating {
        /// Unit rotation axis, in parent coordinates.
        axis: DVec3,
        /// Time for one full turn, in seconds.
        period: f64,
    },
}

/// A node of the frame tree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReferenceFrame {
    /// This frame's id.
    pub id: FrameId,

    /// The body this frame is attached to, if any.
    ///
    /// The root frame of hyperspace has no owner.
    pub owner: Option<BodyId>,

    /// The enclosing frame; `None` for the root.
    pub parent: Option<FrameId>,

    /// How the frame moves relative to its parent.
    pub kind: FrameKind,

    /// Frames directly nested in this one.
    pub children: Vec<FrameId>,
}

impl ReferenceFrame {
    /// Whether this frame turns with its owner's surface.
    pub fn is_rotating(&self) -> bool {
        matches!(self.kind, FrameKind::Rotating { .. })
    }

    /// Whether this frame is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The orientation of this frame in its parent at time `t`.
    ///
    /// The angle is reduced modulo one period before building the
    /// rotation, so far-future times don't accumulate drift.
    pub fn orientation_at(&self, t: f64) -> DQuat {
        match self.kind {
            FrameKind::Inertial { .. } => DQuat::IDENTITY,
            FrameKind::Rotating { axis, period } => {
                let phase = (t / period).rem_euclid(1.0);
                DQuat::from_axis_angle(axis, phase * TAU)
            }
        }
    }

    /// The angular velocity of this frame relative to its parent, in
    /// radians per second.
    pub fn angular_velocity(&self) -> DVec3 {
        match self.kind {
            FrameKind::Inertial { .. } => DVec3::ZERO,
            FrameKind::Rotating { axis, period } => axis * (TAU / period),
        }
    }

    /// The position and velocity of this frame's origin in its parent at
    /// time `t`.
    pub fn origin_at(&self, t: f64) -> (DVec3, DVec3) {
        match self.kind {
            FrameKind::Inertial { orbit: Some(orbit) } => {
                let sv = orbit.state_vectors_at_time(t);
                (sv.position, sv.velocity)
            }
            _ => (DVec3::ZERO, DVec3::ZERO),
        }
    }

    /// Maps a position and velocity in this frame into the parent frame.
    pub fn to_parent(&self, t: f64, position: DVec3, velocity: DVec3) -> (DVec3, DVec3) {
        let rotation = self.orientation_at(t);
        let (origin, origin_velocity) = self.origin_at(t);

        let rotated = rotation * position;
        let parent_position = origin + rotated;
        let parent_velocity =
            origin_velocity + rotation * velocity + self.angular_velocity().cross(rotated);

        (parent_position, parent_velocity)
    }

    /// Maps a position and velocity in the parent frame into this frame.
    ///
    /// The exact inverse of [`to_parent`][Self::to_parent].
    pub fn from_parent(&self, t: f64, position: DVec3, velocity: DVec3) -> (DVec3, DVec3) {
        let rotation = self.orientation_at(t);
        let (origin, origin_velocity) = self.origin_at(t);

        let relative = position - origin;
        let relative_velocity =
            velocity - origin_velocity - self.angular_velocity().cross(relative);
        let inverse = rotation.inverse();

        (inverse * relative, inverse * relative_velocity)
    }
}
