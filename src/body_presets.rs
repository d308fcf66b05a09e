//! Preset celestial bodies, and a small ready-made star system built from
//! them.
//!
//! Every preset is a plain [`Body`][crate::Body] plus, where it orbits
//! something, the [`OrbitalState`][crate::OrbitalState] to hand to
//! [`Space::add_gravitating_body`][crate::Space::add_gravitating_body].

pub mod planets;
pub mod stars;

use crate::{FrameError, SimConfig, Space, SystemPath};

/// Builds the Sun, the Earth and the Moon into a fresh space.
///
/// The Sun owns the root frame. The Earth orbits it with a rotating
/// surface frame of its own, and the Moon orbits the Earth.
pub fn sol(system: SystemPath, time: f64, config: SimConfig) -> Result<Space, FrameError> {
    let mut space = Space::new(Some(system), time, config);
    let root = space.root();

    let sun = stars::the_sun(root);
    let sun_mass = sun.mass;
    space.add_primary(sun)?;

    let earth = planets::earth(root);
    let earth_mass = earth.mass;
    let (_, earth_frame) = space.add_gravitating_body(
        earth,
        root,
        planets::earth_orbit(sun_mass, config.gravitational_constant),
        Some(planets::earth_rotation()),
    )?;

    space.add_gravitating_body(
        planets::the_moon(earth_frame),
        earth_frame,
        planets::moon_orbit(earth_mass, config.gravitational_constant),
        None,
    )?;

    Ok(space)
}
