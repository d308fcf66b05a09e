use core::f64::consts::TAU;

use crate::OrbitalState;

fn random_angle() -> f64 {
    rand::random_range(-TAU..TAU)
}

fn random_inclination() -> f64 {
    if rand::random_bool(0.5) {
        random_angle()
    } else {
        0.0
    }
}

fn random_mass() -> f64 {
    10f64.powf(rand::random_range(20.0..30.0))
}

pub(super) fn random_circular() -> OrbitalState {
    OrbitalState::new(
        random_mass(),
        10f64.powf(rand::random_range(6.0..11.0)),
        0.0,
        random_inclination(),
        random_angle(),
        random_angle(),
        random_angle(),
        rand::random_range(-1e6..1e6),
    )
}

pub(super) fn random_elliptic() -> OrbitalState {
    OrbitalState::new(
        random_mass(),
        10f64.powf(rand::random_range(6.0..11.0)),
        rand::random_range(0.01..0.99),
        random_inclination(),
        random_angle(),
        random_angle(),
        random_angle(),
        rand::random_range(-1e6..1e6),
    )
}

pub(super) fn random_hyperbolic() -> OrbitalState {
    OrbitalState::new(
        random_mass(),
        -(10f64.powf(rand::random_range(6.0..11.0))),
        rand::random_range(1.01..5.0),
        random_inclination(),
        random_angle(),
        random_angle(),
        rand::random_range(-3.0..3.0),
        rand::random_range(-1e6..1e6),
    )
}

pub(super) fn random_nonparabolic() -> OrbitalState {
    match rand::random_range(0..3) {
        0 => random_circular(),
        1 => random_elliptic(),
        _ => random_hyperbolic(),
    }
}

pub(super) fn random_nonparabolic_iter(amount: usize) -> impl Iterator<Item = OrbitalState> {
    (0..amount).map(|_| random_nonparabolic())
}
