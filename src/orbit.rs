use core::f64::consts::TAU;

use glam::{DVec2, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    elliptic_mean_anomaly, hyperbolic_mean_anomaly, solvers, StateVectors, CIRCULAR_TOLERANCE,
    GRAVITATIONAL_CONSTANT, PARABOLIC_TOLERANCE,
};

/// An error describing why state vectors could not be turned into an orbit.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum OrbitError {
    /// The parent mass was zero, negative, or not a number.
    #[error("parent mass must be positive, got {0}")]
    NonPositiveMass(f64),

    /// The position coincides with the center of the parent body.
    #[error("position is at the center of the parent body")]
    PositionAtCenter,

    /// The state vectors contained infinities or NaNs.
    #[error("state vectors are not finite")]
    NonFiniteState,
}

/// The kind of conic section an orbit traces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConicKind {
    /// 0 <= e < 1, closed and periodic.
    Elliptic,
    /// |e - 1| below the parabolic tolerance.
    Parabolic,
    /// e > 1, an escape trajectory.
    Hyperbolic,
}

/// An analytic two-body orbit around a single parent mass.
///
/// The orbit is immutable once constructed. Build a fresh one whenever a
/// body's state vectors change.
///
/// # Example
/// ```
/// use keplerian_transit::{OrbitalState, AU, DAY, SOLAR_MASS};
///
/// let earth_like = OrbitalState::new(SOLAR_MASS, AU, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
/// let days = earth_like.period() / DAY;
///
/// assert!((days - 365.25).abs() < 0.5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrbitalState {
    /// The mass of the parent body, in kilograms.
    pub parent_mass: f64,

    /// The gravitational constant this orbit was built with.
    pub g: f64,

    /// The semi-major axis of the orbit, in meters.
    ///
    /// Negative for hyperbolic trajectories, infinite for parabolic ones.
    pub semi_major_axis: f64,

    /// The eccentricity of the orbit.
    /// e < 1: ellipse
    /// e = 1: parabola
    /// e > 1: hyperbola
    pub eccentricity: f64,

    /// The inclination of the orbit, in radians.
    pub inclination: f64,

    /// The argument of periapsis of the orbit, in radians.
    pub arg_pe: f64,

    /// The longitude of ascending node of the orbit, in radians.
    pub long_asc_node: f64,

    /// The mean anomaly at [`epoch`][Self::epoch], in radians.
    ///
    /// For parabolic orbits this is Barker's `D + D^3 / 3`.
    pub mean_anomaly_at_epoch: f64,

    /// The time the mean anomaly at epoch refers to, in seconds.
    pub epoch: f64,

    /// The semi-latus rectum, in meters.
    ///
    /// Kept alongside the semi-major axis because it stays finite for
    /// parabolic trajectories, where the semi-major axis does not.
    semi_latus_rectum: f64,
}

impl OrbitalState {
    /// Creates a new orbit from its elements.
    ///
    /// Uses the default [gravitational constant][GRAVITATIONAL_CONSTANT].
    /// The semi-major axis must be negative for hyperbolic orbits.
    /// Parabolic orbits can't be described by a semi-major axis; use
    /// [`from_state_vectors`][Self::from_state_vectors] for those.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        parent_mass: f64,
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: f64,
        arg_pe: f64,
        long_asc_node: f64,
        mean_anomaly_at_epoch: f64,
        epoch: f64,
    ) -> Self {
        Self {
            parent_mass,
            g: GRAVITATIONAL_CONSTANT,
            semi_major_axis,
            eccentricity,
            inclination,
            arg_pe,
            long_asc_node,
            mean_anomaly_at_epoch,
            epoch,
            semi_latus_rectum: semi_major_axis * (1.0 - eccentricity * eccentricity),
        }
    }

    /// Returns the same orbit, but with a different gravitational constant.
    #[must_use]
    pub fn with_gravitational_constant(mut self, g: f64) -> Self {
        self.g = g;
        self
    }

    /// Builds the osculating orbit from a position and velocity relative to
    /// the parent body.
    ///
    /// Circular orbits get their periapsis pinned to the ascending node, and
    /// equatorial orbits get their ascending node pinned to +X, so the
    /// result is always finite.
    ///
    /// # Errors
    /// - [`OrbitError::NonPositiveMass`] if `parent_mass <= 0`.
    /// - [`OrbitError::PositionAtCenter`] if the position is at the origin.
    /// - [`OrbitError::NonFiniteState`] if any input is not finite.
    pub fn from_state_vectors(
        position: DVec3,
        velocity: DVec3,
        parent_mass: f64,
        epoch: f64,
        g: f64,
    ) -> Result<Self, OrbitError> {
        // `!(x > 0)` also catches NaN
        if !(parent_mass > 0.0) {
            return Err(OrbitError::NonPositiveMass(parent_mass));
        }
        if !position.is_finite() || !velocity.is_finite() || !epoch.is_finite() {
            return Err(OrbitError::NonFiniteState);
        }

        let altitude = position.length();
        if altitude < f64::EPSILON {
            return Err(OrbitError::PositionAtCenter);
        }

        // Reference:
        // https://orbital-mechanics.space/classical-orbital-elements/orbital-elements-and-the-state-vector.html
        let mu = g * parent_mass;
        let mu_recip = mu.recip();

        let angular_momentum_vector = position.cross(velocity);
        let angular_momentum_sq = angular_momentum_vector.length_squared();

        // A purely radial trajectory has no orbital plane of its own;
        // any plane containing the position will do.
        let plane_normal = if angular_momentum_sq > 0.0 {
            angular_momentum_vector.normalize()
        } else {
            (position / altitude).any_orthonormal_vector()
        };

        let inclination = plane_normal.z.clamp(-1.0, 1.0).acos();

        // Ascending node: cross product between (0, 0, 1) and the normal
        let node = DVec3::new(-plane_normal.y, plane_normal.x, 0.0);
        let (node_dir, long_asc_node) = if node.length() < 1e-12 {
            (DVec3::X, 0.0)
        } else {
            let node_dir = node.normalize();
            (node_dir, node_dir.y.atan2(node_dir.x).rem_euclid(TAU))
        };

        let eccentricity_vector =
            velocity.cross(angular_momentum_vector) * mu_recip - position / altitude;
        let eccentricity = eccentricity_vector.length();

        let signed_angle = |from: DVec3, to: DVec3| -> f64 {
            plane_normal.dot(from.cross(to)).atan2(from.dot(to))
        };

        let (arg_pe, true_anomaly) = if eccentricity < CIRCULAR_TOLERANCE {
            (0.0, signed_angle(node_dir, position))
        } else {
            (
                signed_angle(node_dir, eccentricity_vector).rem_euclid(TAU),
                signed_angle(eccentricity_vector, position),
            )
        };

        let semi_latus_rectum = angular_momentum_sq * mu_recip;
        let semi_major_axis = if semi_latus_rectum > 0.0 {
            if (eccentricity - 1.0).abs() < PARABOLIC_TOLERANCE {
                f64::INFINITY
            } else {
                // a = p / (1 - e^2); -mu / 2E would cancel out near e = 1
                semi_latus_rectum / ((1.0 - eccentricity) * (1.0 + eccentricity))
            }
        } else {
            // Radial trajectories have no semi-latus rectum to go by
            let specific_energy = 0.5 * velocity.length_squared() - mu / altitude;
            -mu / (2.0 * specific_energy)
        };

        let mut orbit = Self {
            parent_mass,
            g,
            semi_major_axis,
            eccentricity,
            inclination,
            arg_pe,
            long_asc_node,
            mean_anomaly_at_epoch: 0.0,
            epoch,
            semi_latus_rectum,
        };
        orbit.mean_anomaly_at_epoch = orbit.mean_anomaly_at_true_anomaly(true_anomaly);

        Ok(orbit)
    }

    /// The gravitational parameter `mu = G * M` of the parent body.
    #[doc(alias = "mu")]
    pub fn gravitational_parameter(&self) -> f64 {
        self.g * self.parent_mass
    }

    /// Which kind of conic section this orbit is.
    pub fn conic_kind(&self) -> ConicKind {
        if (self.eccentricity - 1.0).abs() < PARABOLIC_TOLERANCE
            || self.semi_major_axis.is_infinite()
        {
            ConicKind::Parabolic
        } else if self.eccentricity < 1.0 {
            ConicKind::Elliptic
        } else {
            ConicKind::Hyperbolic
        }
    }

    /// The semi-latus rectum of the orbit, in meters.
    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_latus_rectum
    }

    /// The closest distance to the parent body, in meters.
    pub fn periapsis(&self) -> f64 {
        self.semi_latus_rectum / (1.0 + self.eccentricity)
    }

    /// The furthest distance from the parent body, in meters.
    ///
    /// Infinite for open trajectories.
    pub fn apoapsis(&self) -> f64 {
        match self.conic_kind() {
            ConicKind::Elliptic => self.semi_major_axis * (1.0 + self.eccentricity),
            ConicKind::Parabolic | ConicKind::Hyperbolic => f64::INFINITY,
        }
    }

    /// The rate the mean anomaly advances at, in radians per second.
    pub fn mean_motion(&self) -> f64 {
        let mu = self.gravitational_parameter();
        match self.conic_kind() {
            ConicKind::Parabolic => 2.0 * (mu / self.semi_latus_rectum.powi(3)).sqrt(),
            _ => (mu / self.semi_major_axis.abs().powi(3)).sqrt(),
        }
    }

    /// Gets the time it takes to complete one revolution of the orbit.
    ///
    /// Returns infinity for open (parabolic and hyperbolic) trajectories.
    pub fn period(&self) -> f64 {
        match self.conic_kind() {
            // T = 2pi * sqrt(a^3 / GM)
            ConicKind::Elliptic => TAU / self.mean_motion(),
            ConicKind::Parabolic | ConicKind::Hyperbolic => f64::INFINITY,
        }
    }

    /// Whether this orbit is too small to carry any meaning.
    ///
    /// A vehicle sitting still near the center of gravity produces a
    /// near-zero semi-major axis; one falling straight down has no
    /// semi-latus rectum. `NaN` elements count as degenerate too.
    pub fn is_degenerate(&self, min_semi_major_axis: f64) -> bool {
        !(self.semi_major_axis.abs() >= min_semi_major_axis
            && self.semi_latus_rectum >= min_semi_major_axis)
    }

    /// Gets the mean anomaly at a given time, in radians.
    pub fn mean_anomaly_at_time(&self, t: f64) -> f64 {
        self.mean_anomaly_at_epoch + (t - self.epoch) * self.mean_motion()
    }

    /// Gets the true anomaly at a given mean anomaly.
    ///
    /// Elliptic and hyperbolic orbits solve Kepler's equation iteratively;
    /// parabolic orbits use Barker's closed form.
    pub fn true_anomaly_at_mean_anomaly(&self, mean_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        match self.conic_kind() {
            ConicKind::Elliptic => {
                let ecc_anom = solvers::eccentric_anomaly_elliptic(e, mean_anomaly);
                let (sin_half, cos_half) = (ecc_anom * 0.5).sin_cos();
                // v = 2 atan2(sqrt(1 + e) sin(E/2), sqrt(1 - e) cos(E/2)),
                // shifted back onto the same revolution as E
                let v = 2.0 * ((1.0 + e).sqrt() * sin_half).atan2((1.0 - e).sqrt() * cos_half);
                v + TAU * ((ecc_anom - v) / TAU).round()
            }
            ConicKind::Hyperbolic => {
                let ecc_anom = solvers::eccentric_anomaly_hyperbolic(e, mean_anomaly);
                // tan(v/2) = sqrt((e+1)/(e-1)) * tanh(H/2)
                2.0 * (((e + 1.0) / (e - 1.0)).sqrt() * (ecc_anom * 0.5).tanh()).atan()
            }
            ConicKind::Parabolic => 2.0 * solvers::parabolic_anomaly(mean_anomaly).atan(),
        }
    }

    /// Gets the mean anomaly at a given true anomaly.
    ///
    /// For elliptic orbits the result lies on the same revolution as the
    /// input angle. For open orbits, angles beyond the asymptotes are
    /// unreachable and produce `NaN`.
    pub fn mean_anomaly_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        let e = self.eccentricity;
        match self.conic_kind() {
            ConicKind::Elliptic => {
                let (sin_half, cos_half) = (true_anomaly * 0.5).sin_cos();
                let ecc_anom =
                    2.0 * ((1.0 - e).sqrt() * sin_half).atan2((1.0 + e).sqrt() * cos_half);
                let ecc_anom = ecc_anom + TAU * ((true_anomaly - ecc_anom) / TAU).round();
                elliptic_mean_anomaly(ecc_anom, e)
            }
            ConicKind::Hyperbolic => {
                let x = ((e - 1.0) / (e + 1.0)).sqrt() * (true_anomaly * 0.5).tan();
                if x.abs() >= 1.0 {
                    return f64::NAN;
                }
                let ecc_anom = 2.0 * x.atanh();
                hyperbolic_mean_anomaly(ecc_anom, e)
            }
            ConicKind::Parabolic => {
                let d = (true_anomaly * 0.5).tan();
                d + d * d * d / 3.0
            }
        }
    }

    /// Gets the true anomaly at a given time, in radians.
    pub fn true_anomaly_at_time(&self, t: f64) -> f64 {
        self.true_anomaly_at_mean_anomaly(self.mean_anomaly_at_time(t))
    }

    /// Gets the distance from the parent body at a given true anomaly.
    pub fn altitude_at_true_anomaly(&self, true_anomaly: f64) -> f64 {
        self.semi_latus_rectum / (1.0 + self.eccentricity * true_anomaly.cos())
    }

    /// The unit vectors of the perifocal (PQW) coordinate system.
    ///
    /// P points to periapsis, Q is 90 degrees ahead of it in the direction
    /// of motion, and W is normal to the orbital plane.
    pub fn perifocal_basis(&self) -> (DVec3, DVec3, DVec3) {
        let (sin_inc, cos_inc) = self.inclination.sin_cos();
        let (sin_arg_pe, cos_arg_pe) = self.arg_pe.sin_cos();
        let (sin_lan, cos_lan) = self.long_asc_node.sin_cos();

        // https://downloads.rene-schwarz.com/download/M001-Keplerian_Orbit_Elements_to_Cartesian_State_Vectors.pdf
        let p = DVec3::new(
            cos_arg_pe * cos_lan - sin_arg_pe * cos_inc * sin_lan,
            cos_arg_pe * sin_lan + sin_arg_pe * cos_inc * cos_lan,
            sin_arg_pe * sin_inc,
        );
        let q = DVec3::new(
            -(sin_arg_pe * cos_lan + cos_arg_pe * cos_inc * sin_lan),
            cos_arg_pe * cos_inc * cos_lan - sin_arg_pe * sin_lan,
            cos_arg_pe * sin_inc,
        );
        let w = DVec3::new(sin_lan * sin_inc, -cos_lan * sin_inc, cos_inc);

        (p, q, w)
    }

    /// Tilts a vector in the orbital plane into 3D, using the orbital parameters.
    pub fn transform_pqw_vector(&self, vector: DVec2) -> DVec3 {
        let (p, q, _) = self.perifocal_basis();
        p * vector.x + q * vector.y
    }

    /// Gets the position and velocity at a given true anomaly.
    pub fn state_vectors_at_true_anomaly(&self, true_anomaly: f64) -> StateVectors {
        let (sin_v, cos_v) = true_anomaly.sin_cos();
        let altitude = self.altitude_at_true_anomaly(true_anomaly);
        let speed_factor = (self.gravitational_parameter() / self.semi_latus_rectum).sqrt();

        let pqw_position = DVec2::new(cos_v, sin_v) * altitude;
        let pqw_velocity = DVec2::new(-sin_v, self.eccentricity + cos_v) * speed_factor;

        StateVectors {
            position: self.transform_pqw_vector(pqw_position),
            velocity: self.transform_pqw_vector(pqw_velocity),
        }
    }

    /// Gets the position and velocity at a given time.
    pub fn state_vectors_at_time(&self, t: f64) -> StateVectors {
        self.state_vectors_at_true_anomaly(self.true_anomaly_at_time(t))
    }

    /// Gets the position relative to the parent body at a given time, in meters.
    ///
    /// # Example
    /// ```
    /// use glam::DVec3;
    /// use keplerian_transit::OrbitalState;
    ///
    /// let orbit = OrbitalState::new(1.0e24, 1.0e7, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
    /// let pos = orbit.position_at_time(0.0);
    ///
    /// assert!((pos - DVec3::new(1.0e7, 0.0, 0.0)).length() < 1e-6);
    /// ```
    pub fn position_at_time(&self, t: f64) -> DVec3 {
        self.state_vectors_at_time(t).position
    }

    /// Gets the velocity relative to the parent body at a given time, in
    /// meters per second.
    pub fn velocity_at_time(&self, t: f64) -> DVec3 {
        self.state_vectors_at_time(t).velocity
    }

    /// Gets the true anomaly of the orbit point in the direction of a position.
    ///
    /// The position is projected onto the orbital plane first, so positions
    /// slightly off the trajectory still resolve to the closest direction.
    pub fn true_anomaly_at_position(&self, position: DVec3) -> f64 {
        let (p, q, _) = self.perifocal_basis();
        position.dot(q).atan2(position.dot(p))
    }

    /// Gets the earliest time, no earlier than `reference_time`, at which the
    /// orbiting body passes the direction of `target_position`.
    ///
    /// Closed orbits pass every direction once per revolution, so the result
    /// is always within one period of the reference time. Open orbits only
    /// pass each direction once: if that already happened, or if the
    /// direction lies outside the asymptotes, `None` is returned.
    pub fn time_of_flight_to_position(
        &self,
        target_position: DVec3,
        reference_time: f64,
    ) -> Option<f64> {
        let true_anomaly = self.true_anomaly_at_position(target_position);
        let target_mean_anomaly = self.mean_anomaly_at_true_anomaly(true_anomaly);
        if !target_mean_anomaly.is_finite() {
            return None;
        }

        let reference_mean_anomaly = self.mean_anomaly_at_time(reference_time);
        let mean_motion = self.mean_motion();

        let delta = match self.conic_kind() {
            ConicKind::Elliptic => (target_mean_anomaly - reference_mean_anomaly).rem_euclid(TAU),
            ConicKind::Parabolic | ConicKind::Hyperbolic => {
                let delta = target_mean_anomaly - reference_mean_anomaly;
                if delta < 0.0 {
                    return None;
                }
                delta
            }
        };

        Some(reference_time + delta / mean_motion)
    }
}

impl Default for OrbitalState {
    /// A circular, equatorial orbit with a radius of 1 meter around a
    /// parent whose gravitational parameter is 1.
    fn default() -> Self {
        Self::new(GRAVITATIONAL_CONSTANT.recip(), 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0)
    }
}
