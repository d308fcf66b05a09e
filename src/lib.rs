//! # Frame-relative Keplerian Orbits and Hyperjumps
//! This library crate contains the orbital bookkeeping of a space-flight
//! simulation: where a vehicle is, which body it is falling around, what
//! orbit that implies, and how it leaves one star system for another.
//!
//! Positions and velocities only make sense relative to a reference frame.
//! Frames form a tree: the root frame of a star system sits at the primary
//! star, every gravitating body owns an inertial (non-rotating) frame that
//! follows the body along its orbit, and bodies with a surface may also own
//! a rotating frame that turns with that surface. An orbit is always
//! computed in the nearest inertial frame, around the body owning it.
//!
//! ## Getting started
//! This crate provides these main structs:
//! - [`OrbitalState`]: An analytic two-body orbit around a parent mass.
//!   It supports circular, elliptic, parabolic and hyperbolic trajectories.
//! - [`Space`]: The frame graph and body registry of the currently loaded
//!   star system (or of hyperspace).
//! - [`Vehicle`]: The player-controlled ship: its frame membership, pose,
//!   controls, and its weak references to target bodies.
//! - [`ManeuverPlanner`]: Interprets a desired velocity offset against
//!   the vehicle's current orbit.
//! - [`Hyperdrive`]: The hyperjump state machine.
//! - [`Simulation`]: Owns all of the above and advances them in lockstep.
//!
//! ## Example
//!
//! ```rust
//! use glam::DVec3;
//!
//! use keplerian_transit::{OrbitalState, AU, SOLAR_MASS};
//!
//! # fn main() {
//! let orbit = OrbitalState::new(SOLAR_MASS, AU, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
//! let position = orbit.position_at_time(0.0);
//! assert!((position - DVec3::new(AU, 0.0, 0.0)).length() < 1e-3);
//! # }
//! ```

#![warn(missing_docs)]

mod body;
pub mod body_presets;
mod config;
mod event;
mod frame;
pub mod hyperjump;
mod orbit;
mod planner;
mod simulation;
mod solvers;
mod space;
mod vehicle;

pub use body::{Body, BodyId, BodyKind, HYPERSPACE_CLOUD_RADIUS};
pub use config::SimConfig;
pub use event::{TransitionEvent, TransitionKind};
pub use frame::{FrameId, FrameKind, ReferenceFrame};
pub use hyperjump::{
    EligibilityCheck, Hyperdrive, HyperjumpError, HyperjumpRequest, HyperjumpSession,
    HyperjumpState, HyperjumpStatus, JumpRejection, RejectionCode,
};
pub use orbit::{ConicKind, OrbitError, OrbitalState};
pub use planner::{ManeuverPlan, ManeuverPlanner};
pub use simulation::{Simulation, SystemLoader, SystemPath};
pub use space::{FrameError, Space};
pub use vehicle::{FlightControl, Targets, ThrusterState, Vehicle, VehicleId};

use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The default gravitational constant, in m^3 kg^-1 s^-2.
pub const GRAVITATIONAL_CONSTANT: f64 = 6.67430e-11;

/// One astronomical unit, in meters.
pub const AU: f64 = 1.495_978_707e11;

/// The mass of the Sun, in kilograms.
pub const SOLAR_MASS: f64 = 1.988_47e30;

/// The length of a day, in seconds.
pub const DAY: f64 = 86_400.0;

/// The maximum number of iterations for the numerical approach algorithms.
///
/// This is used to prevent infinite loops in case the method fails to converge.
const NUMERIC_MAX_ITERS: u32 = 50;

/// The relative step size below which Newton-Raphson iteration stops.
const NUMERIC_TOLERANCE: f64 = 1e-12;

/// How close the eccentricity has to be to exactly 1 for the orbit to be
/// treated as a parabola.
///
/// Elliptic and hyperbolic anomalies lose all their precision near e = 1,
/// so those orbits use Barker's equation instead.
const PARABOLIC_TOLERANCE: f64 = 1e-9;

/// Eccentricity below which an orbit counts as circular.
///
/// The periapsis direction of a circular orbit is undefined; it gets pinned
/// to the ascending node instead.
const CIRCULAR_TOLERANCE: f64 = 1e-11;

/// A struct representing a position and velocity at a point in the orbit.
///
/// The position vector is in meters, while the velocity vector is in
/// meters per second. Both are relative to whichever frame they were
/// sampled in.
///
/// State vectors can be used to form an orbit, see
/// [`to_orbit`][Self::to_orbit] for more information.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StateVectors {
    /// The 3D position at a point in the orbit, in meters.
    pub position: DVec3,
    /// The 3D velocity at a point in the orbit, in meters per second.
    pub velocity: DVec3,
}

impl StateVectors {
    /// Create a new [`OrbitalState`] from the state vectors, the mass of the
    /// parent body and the time the vectors were sampled at.
    ///
    /// This is the osculating orbit: the trajectory the body would follow if
    /// nothing but the parent body ever pulled on it.
    ///
    /// # Errors
    /// See [`OrbitalState::from_state_vectors`].
    pub fn to_orbit(
        self,
        parent_mass: f64,
        epoch: f64,
        g: f64,
    ) -> Result<OrbitalState, OrbitError> {
        OrbitalState::from_state_vectors(self.position, self.velocity, parent_mass, epoch, g)
    }
}

#[cfg(test)]
mod tests;

/// Below this magnitude, `x - sin(x)` and `sinh(x) - x` are summed as
/// series instead of subtracting two nearly equal numbers.
const SMALL_ANGLE: f64 = 1.0;

/// Sums the tail `x^3/3! + s*x^5/5! + x^7/7! + ...` of the (hyperbolic)
/// sine series, where `s` is `-1` for sine and `1` for hyperbolic sine.
fn odd_series_tail(x: f64, sign: f64) -> f64 {
    let x_sq = x * x;
    let mut term = x * x_sq / 6.0;
    let mut sum = term;
    let mut n = 3.0;

    // |x| < 1, so this takes at most a dozen terms
    while term.abs() > f64::EPSILON * sum.abs() {
        term *= sign * x_sq / ((n + 1.0) * (n + 2.0));
        n += 2.0;
        sum += term;
    }

    sum
}

/// `x - sin(x)`, accurate for small `x` too.
#[inline]
fn x_minus_sin(x: f64) -> f64 {
    if x.abs() < SMALL_ANGLE {
        odd_series_tail(x, -1.0)
    } else {
        x - x.sin()
    }
}

/// `sinh(x) - x`, accurate for small `x` too.
#[inline]
fn sinh_minus_x(x: f64) -> f64 {
    if x.abs() < SMALL_ANGLE {
        odd_series_tail(x, 1.0)
    } else {
        x.sinh() - x
    }
}

/// The elliptic mean anomaly `E - e sin E`, written as
/// `(1 - e) sin E + (E - sin E)`.
///
/// Near e = 1 and E = 0 the two halves of the textbook form cancel almost
/// completely; this form keeps full relative precision there.
#[inline]
fn elliptic_mean_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    (1.0 - eccentricity) * eccentric_anomaly.sin() + x_minus_sin(eccentric_anomaly)
}

/// The hyperbolic mean anomaly `e sinh H - H`, written as
/// `(e - 1) sinh H + (sinh H - H)`.
#[inline]
fn hyperbolic_mean_anomaly(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    let tail = sinh_minus_x(eccentric_anomaly);
    (eccentricity - 1.0) * (eccentric_anomaly + tail) + tail
}

#[inline]
fn keplers_equation(mean_anomaly: f64, eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    elliptic_mean_anomaly(eccentric_anomaly, eccentricity) - mean_anomaly
}
#[inline]
fn keplers_equation_derivative(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    // 1 - e cos E
    let sin_half = (eccentric_anomaly * 0.5).sin();
    (1.0 - eccentricity) * eccentric_anomaly.cos() + 2.0 * sin_half * sin_half
}

#[inline]
fn hyperbolic_keplers_equation(
    mean_anomaly: f64,
    eccentric_anomaly: f64,
    eccentricity: f64,
) -> f64 {
    hyperbolic_mean_anomaly(eccentric_anomaly, eccentricity) - mean_anomaly
}
#[inline]
fn hyperbolic_keplers_equation_derivative(eccentric_anomaly: f64, eccentricity: f64) -> f64 {
    // e cosh H - 1
    let (sinh_half, _) = sinhcosh(eccentric_anomaly * 0.5);
    let (_, cosh) = sinhcosh(eccentric_anomaly);
    (eccentricity - 1.0) * cosh + 2.0 * sinh_half * sinh_half
}

/// Get the hyperbolic sine and cosine of a number.
///
/// Usually faster than calling `x.sinh()` and `x.cosh()` separately.
///
/// Returns a tuple which contains:
/// - 0: The hyperbolic sine of the number.
/// - 1: The hyperbolic cosine of the number.
pub fn sinhcosh(x: f64) -> (f64, f64) {
    if x.abs() < SMALL_ANGLE {
        // (e^x - e^-x) / 2 cancels for small x
        let sinh = x + sinh_minus_x(x);
        return (sinh, (1.0 + sinh * sinh).sqrt());
    }

    let e_x = x.exp();
    let e_neg_x = (-x).exp();

    ((e_x - e_neg_x) * 0.5, (e_x + e_neg_x) * 0.5)
}

/// Solve a cubic equation to get its real root.
///
/// The cubic equation is in the form of:
/// ax^3 + bx^2 + cx + d
///
/// The cubic equation is assumed to be monotone.
/// If it isn't monotone (i.e., the discriminant
/// is negative), it returns NaN.
fn solve_monotone_cubic(a: f64, b: f64, c: f64, d: f64) -> f64 {
    // Normalize coefficients so that a = 1
    let b = b / a;
    let c = c / a;
    let d = d / a;

    // Depress the cubic equation
    // t^3 + pt + q = 0
    // ...where, since a = 1:
    // p = (3c - b^2) / 3
    // q = (2b^3 - 9bc + 27d) / 27
    let b_sq = b * b;

    let p = (3.0 * c - b_sq) / 3.0;
    let q = (2.0 * b_sq * b - 9.0 * b * c + 27.0 * d) / 27.0;

    let q_div_two = q / 2.0;
    let p_div_three = p / 3.0;
    let p_div_three_cubed = p_div_three * p_div_three * p_div_three;
    let discriminant = q_div_two * q_div_two + p_div_three_cubed;

    if discriminant < 0.0 {
        // Function is not monotone
        return f64::NAN;
    }

    let t = {
        let sqrt_discriminant = discriminant.sqrt();
        let neg_q_div_two = -q_div_two;
        let u = (neg_q_div_two + sqrt_discriminant).cbrt();
        let v = (neg_q_div_two - sqrt_discriminant).cbrt();
        u + v
    };

    // x_i = t_i - b / 3a
    t - b / 3.0
}
