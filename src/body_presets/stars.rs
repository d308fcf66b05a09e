//! This module contains presets for stars.
//!
//! "A star is a luminous spheroid of plasma held together by self-gravity."  
//!
//! \- [Wikipedia](https://en.wikipedia.org/wiki/Star)

use crate::{Body, BodyKind, FrameId, SOLAR_MASS};

/// Returns the Sun, sitting in `frame`.
///
/// Meant to be the primary of its system, so it comes without an orbit.
pub fn the_sun(frame: FrameId) -> Body {
    Body::new("The Sun", BodyKind::Star, SOLAR_MASS, 6.9634e8, frame)
}

/// Returns a red dwarf of about a tenth of a solar mass, sitting in `frame`.
pub fn red_dwarf(name: impl Into<String>, frame: FrameId) -> Body {
    Body::new(name, BodyKind::Star, 0.12 * SOLAR_MASS, 1.1e8, frame)
}
