use glam::DVec3;

use super::{assertions::*, earth_frames, moon_frame, simulation, sol};
use crate::{Body, BodyKind, Vehicle, VehicleId};

#[test]
fn stale_targets_are_forgotten() {
    let mut space = sol();
    let root = space.root();
    let cargo = space
        .add_body(Body::new("Crate", BodyKind::CargoBody, 100.0, 1.0, root))
        .expect("root exists");

    let mut vehicle = Vehicle::new(VehicleId(1), root, 1.0e4);
    vehicle.set_nav_target(Some(cargo));
    vehicle.set_combat_target(Some(cargo), true);
    assert_eq!(vehicle.nav_target(&space).map(|body| body.name.as_str()), Some("Crate"));

    space.remove_body(cargo);

    assert!(vehicle.nav_target(&space).is_none());
    assert!(vehicle.combat_target(&space).is_none());
    assert!(vehicle.set_speed_target(&space).is_none());
    assert!(vehicle.targets.is_empty());
}

#[test]
fn departing_ship_leaves_its_cloud_as_target() {
    let mut sim = simulation();
    let root = sim.space().root();
    let ship = sim
        .space_mut()
        .add_body(Body::new("Trader", BodyKind::Ship, 2.0e5, 40.0, root))
        .expect("root exists");
    let cloud = sim
        .space_mut()
        .add_body(Body::hyperspace_cloud(root, Some(ship), None, false))
        .expect("root exists");

    sim.vehicle_mut().set_combat_target(Some(ship), true);
    let removed = sim.remove_body(ship).expect("graph is sound");
    assert_eq!(removed.len(), 1);

    let targets = sim.vehicle().targets;
    assert_eq!(targets.combat, None);
    assert_eq!(targets.set_speed, None);
    assert_eq!(targets.navigation, Some(cloud));
}

#[test]
fn cloud_fallback_keeps_existing_navigation() {
    let mut sim = simulation();
    let root = sim.space().root();
    let station = sim
        .space_mut()
        .add_body(Body::new("Station", BodyKind::SpaceStation, 1.0e6, 300.0, root))
        .expect("root exists");
    let ship = sim
        .space_mut()
        .add_body(Body::new("Pirate", BodyKind::Ship, 2.0e5, 40.0, root))
        .expect("root exists");
    sim.space_mut()
        .add_body(Body::hyperspace_cloud(root, Some(ship), None, false))
        .expect("root exists");

    sim.vehicle_mut().set_nav_target(Some(station));
    sim.vehicle_mut().set_combat_target(Some(ship), false);
    sim.remove_body(ship).expect("graph is sound");

    assert_eq!(sim.vehicle().targets.navigation, Some(station));
    assert_eq!(sim.vehicle().targets.combat, None);
}

#[test]
fn arrival_clouds_are_not_followed() {
    let mut sim = simulation();
    let root = sim.space().root();
    let ship = sim
        .space_mut()
        .add_body(Body::new("Courier", BodyKind::Ship, 2.0e5, 40.0, root))
        .expect("root exists");
    sim.space_mut()
        .add_body(Body::hyperspace_cloud(root, Some(ship), None, true))
        .expect("root exists");

    sim.vehicle_mut().set_combat_target(Some(ship), false);
    sim.remove_body(ship).expect("graph is sound");

    assert_eq!(sim.vehicle().targets.navigation, None);
    assert_eq!(sim.space().find_cloud_for_ship(ship), None);
}

#[test]
fn vehicle_survives_removal_of_its_frame() {
    let mut sim = simulation();
    let moon_frame = moon_frame(sim.space());
    let (earth_inertial, _) = earth_frames(sim.space());
    let root = sim.space().root();

    let position = DVec3::new(2.0e6, 0.0, 0.0);
    let velocity = DVec3::new(0.0, 1.6e3, 0.0);
    sim.vehicle_mut().attach(moon_frame, position, velocity);
    let (before, _) = sim
        .space()
        .transform_state(position, velocity, moon_frame, root)
        .expect("frames are connected");

    let moon = sim.space().body_id_with_name("The Moon").expect("the Moon exists");
    sim.remove_body(moon).expect("graph is sound");

    assert_eq!(sim.vehicle().frame(), Some(earth_inertial));
    let after = sim
        .space()
        .transform_position_to_frame(sim.vehicle().position, earth_inertial, root)
        .expect("frames are connected");
    assert_almost_eq_vec3_rel(after, before, "vehicle position in the root frame");
}

#[test]
fn switching_frames_keeps_motion() {
    let space = sol();
    let (earth_inertial, earth_rotating) = earth_frames(&space);

    let mut vehicle = Vehicle::new(VehicleId(4), earth_inertial, 1.0e4)
        .with_state(DVec3::new(7.0e6, 0.0, 0.0), DVec3::new(0.0, 7.5e3, 0.0));
    vehicle
        .switch_to_frame(&space, earth_rotating)
        .expect("frames are connected");
    assert_eq!(vehicle.frame(), Some(earth_rotating));

    let (position, velocity) = space
        .transform_state(vehicle.position, vehicle.velocity, earth_rotating, earth_inertial)
        .expect("frames are connected");
    assert_almost_eq_vec3_rel(position, DVec3::new(7.0e6, 0.0, 0.0), "position");
    assert_almost_eq_vec3_rel(velocity, DVec3::new(0.0, 7.5e3, 0.0), "velocity");
}

#[test]
fn thrusters_are_clamped() {
    let mut vehicle = Vehicle::new(VehicleId(5), crate::FrameId(0), 1.0e4);
    vehicle.thrusters.set_linear(DVec3::new(2.0, -0.5, -7.0));
    vehicle.thrusters.set_angular(DVec3::new(0.0, 0.25, 1.5));

    assert_eq!(vehicle.thrusters.linear, DVec3::new(1.0, -0.5, -1.0));
    assert_eq!(vehicle.thrusters.angular, DVec3::new(0.0, 0.25, 1.0));

    vehicle.change_set_speed(120.0);
    vehicle.change_set_speed(-20.0);
    assert_eq!(vehicle.set_speed, 100.0);

    vehicle.reset_controls();
    assert!(vehicle.thrusters.is_neutral());
}

#[test]
fn body_kind_queries() {
    assert!(BodyKind::Player.is_ship());
    assert!(BodyKind::Player.is_a(BodyKind::Ship));
    assert!(!BodyKind::Ship.is_a(BodyKind::Player));
    assert!(BodyKind::Missile.is_dynamic());
    assert!(!BodyKind::Planet.is_dynamic());
    assert!(BodyKind::SpaceStation.has_system_body());
    assert!(BodyKind::Star.is_gravitating());
    assert!(!BodyKind::SpaceStation.is_gravitating());
    let exit = BodyKind::HyperspaceCloud {
        ship: None,
        destination: None,
        arrival: true,
    };
    let departure = BodyKind::HyperspaceCloud {
        ship: Some(crate::BodyId(3)),
        destination: None,
        arrival: false,
    };
    assert!(exit.is_a(departure));
}
