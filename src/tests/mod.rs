#![cfg(test)]

use std::{cell::Cell, rc::Rc};

use glam::DVec3;

use crate::{
    body_presets, FrameId, SimConfig, Simulation, Space, SystemLoader, SystemPath, Vehicle,
    VehicleId, AU,
};

mod frames;
mod seeders;
mod vehicle;

const SOURCE: SystemPath = SystemPath::new(0, 0, 0, 0);
const DESTINATION: SystemPath = SystemPath::new(1, 0, -2, 3);

/// Serves the preset solar system for any path, unless switched off.
struct PresetLoader {
    available: Rc<Cell<bool>>,
    positions: Vec<(SystemPath, DVec3)>,
}

impl PresetLoader {
    fn new() -> Self {
        Self {
            available: Rc::new(Cell::new(true)),
            positions: Vec::new(),
        }
    }

    fn with_position(mut self, path: SystemPath, position: DVec3) -> Self {
        self.positions.push((path, position));
        self
    }
}

impl SystemLoader for PresetLoader {
    fn load_system(&mut self, path: SystemPath, time: f64, config: SimConfig) -> Option<Space> {
        if !self.available.get() {
            return None;
        }
        body_presets::sol(path, time, config).ok()
    }

    fn system_position(&self, path: SystemPath) -> Option<DVec3> {
        self.positions
            .iter()
            .find(|(candidate, _)| *candidate == path)
            .map(|(_, position)| *position)
    }
}

fn sol() -> Space {
    body_presets::sol(SOURCE, 0.0, SimConfig::default()).expect("preset system should build")
}

/// The Earth's inertial frame and its rotating surface frame.
fn earth_frames(space: &Space) -> (FrameId, FrameId) {
    let earth = space.body_id_with_name("Earth").expect("Earth exists");
    let frames = space.frames_owned_by(earth);
    assert_eq!(frames.len(), 2, "Earth should own two frames");
    (frames[0], frames[1])
}

fn moon_frame(space: &Space) -> FrameId {
    let moon = space.body_id_with_name("The Moon").expect("the Moon exists");
    space.frames_owned_by(moon)[0]
}

/// A simulation with the vehicle coasting at 2 AU from the Sun.
fn simulation_with(loader: PresetLoader) -> Simulation {
    let space = sol();
    let vehicle = Vehicle::new(VehicleId(1), space.root(), 5.0e4)
        .with_state(DVec3::new(2.0 * AU, 0.0, 0.0), DVec3::new(0.0, 2.0e4, 0.0))
        .with_fuel(10.0);
    Simulation::new(space, vehicle, Box::new(loader))
}

fn simulation() -> Simulation {
    simulation_with(PresetLoader::new())
}

#[test]
fn sinhcosh_matches_std() {
    for x in [-20.0, -1.5, -0.1, 0.0, 0.3, 2.0, 15.0] {
        let (sinh, cosh) = crate::sinhcosh(x);
        assertions::assert_almost_eq_rel(sinh, f64::sinh(x), &format!("sinh({x})"));
        assertions::assert_almost_eq_rel(cosh, f64::cosh(x), &format!("cosh({x})"));
    }
}

#[test]
fn small_angle_series_keep_precision() {
    for x in [1e-8_f64, -1e-4, 0.01, 0.5] {
        let x_sq = x * x;
        let x_cubed = x * x_sq;
        let leading = x_cubed / 6.0;
        let next = x_cubed * x_sq / 120.0;

        // Two terms of the series are plenty for |x| <= 0.01
        if x.abs() <= 0.01 {
            let x_minus_sin = crate::x_minus_sin(x) / (leading - next);
            let sinh_minus_x = crate::sinh_minus_x(x) / (leading + next);
            assertions::assert_almost_eq(x_minus_sin, 1.0, "x - sin x");
            assertions::assert_almost_eq(sinh_minus_x, 1.0, "sinh x - x");
        }

        // Both sides of the series cutoff agree
        let (sinh, _) = crate::sinhcosh(x);
        assertions::assert_almost_eq_rel(sinh, f64::sinh(x), &format!("sinh({x})"));
    }

    for x in [0.999_999_9, 1.000_000_1] {
        assertions::assert_almost_eq(crate::x_minus_sin(x), x - x.sin(), "x - sin x near 1");
        assertions::assert_almost_eq(crate::sinh_minus_x(x), x.sinh() - x, "sinh x - x near 1");
    }

    // (e^x - e^-x) / 2 would be off in the eighth digit here
    let (sinh, cosh) = crate::sinhcosh(1e-10);
    assert!((sinh / 1e-10 - 1.0).abs() < 1e-15, "sinh(1e-10) = {sinh}");
    assert_eq!(cosh, 1.0);
}

#[test]
fn system_path_display() {
    assert_eq!(DESTINATION.to_string(), "(1,0,-2):3");
    assert!(SOURCE.is_same_system(&SystemPath::new(0, 0, 0, 0)));
    assert!(!SOURCE.is_same_system(&DESTINATION));
}
