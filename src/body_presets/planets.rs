//! This module contains presets for planets and moons.

use glam::DVec3;

use crate::{Body, BodyKind, FrameId, OrbitalState, AU};

/// The length of a sidereal day on Earth, in seconds.
pub const EARTH_SIDEREAL_DAY: f64 = 86_164.0905;

/// Returns the Earth, sitting in `frame`.
pub fn earth(frame: FrameId) -> Body {
    Body::new("Earth", BodyKind::Planet, 5.972e24, 6.371e6, frame)
}

/// The Earth's orbit around a star of `sun_mass` kilograms.
pub fn earth_orbit(sun_mass: f64, g: f64) -> OrbitalState {
    OrbitalState::new(
        sun_mass,
        AU,
        0.0167086,
        0.0,
        1.796_767_421_2,
        -0.196_535_243,
        6.259_047_404_3,
        0.0,
    )
    .with_gravitational_constant(g)
}

/// The Earth's rotation axis and sidereal day, as expected by
/// [`Space::add_gravitating_body`][crate::Space::add_gravitating_body].
pub fn earth_rotation() -> (DVec3, f64) {
    let obliquity = 23.4392811_f64.to_radians();
    let (sin, cos) = obliquity.sin_cos();
    (DVec3::new(0.0, -sin, cos), EARTH_SIDEREAL_DAY)
}

/// Returns the Moon, sitting in `frame`.
pub fn the_moon(frame: FrameId) -> Body {
    Body::new("The Moon", BodyKind::Planet, 7.342e22, 1.7374e6, frame)
}

/// The Moon's orbit around a planet of `earth_mass` kilograms.
pub fn moon_orbit(earth_mass: f64, g: f64) -> OrbitalState {
    OrbitalState::new(
        earth_mass,
        3.844e8,
        0.0549,
        5.145_f64.to_radians(),
        0.0,
        0.0,
        0.0,
        0.0,
    )
    .with_gravitational_constant(g)
}
