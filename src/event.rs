#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::VehicleId;

/// What happened to a hyperjump.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TransitionKind {
    /// The drive started warming up.
    WarmupStarted,
    /// Warmup finished; the vehicle left normal space.
    Committed,
    /// The jump was cancelled during warmup.
    Aborted,
    /// The vehicle dropped out of hyperspace at its destination.
    Arrived,
}

/// A notification for presentation collaborators (audio, log, UI).
///
/// The core never plays a sound or draws anything itself; it only queues
/// these for the caller to drain.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TransitionEvent {
    /// What happened.
    pub kind: TransitionKind,
    /// Which vehicle it happened to.
    pub vehicle: VehicleId,
    /// Simulation time of the transition, in seconds.
    pub timestamp: f64,
}
