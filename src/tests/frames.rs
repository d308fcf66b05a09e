use core::f64::consts::TAU;

use glam::{DQuat, DVec3};

use super::{assertions::*, earth_frames, moon_frame, sol};
use crate::{
    body_presets::stars, Body, BodyId, BodyKind, FrameError, FrameId, FrameKind, OrbitalState,
    ReferenceFrame, SimConfig, Space, AU, DAY,
};

fn random_vec3(scale: f64) -> DVec3 {
    DVec3::new(
        rand::random_range(-scale..scale),
        rand::random_range(-scale..scale),
        rand::random_range(-scale..scale),
    )
}

#[test]
fn preset_system_layout() {
    let space = sol();
    let root = space.root();
    let (earth_inertial, earth_rotating) = earth_frames(&space);
    let moon = moon_frame(&space);

    let sun = space.body_id_with_name("The Sun").expect("the Sun exists");
    assert_eq!(space.frame(root).and_then(|frame| frame.owner), Some(sun));

    assert_eq!(space.frame(earth_inertial).and_then(|f| f.parent), Some(root));
    assert_eq!(space.frame(earth_rotating).and_then(|f| f.parent), Some(earth_inertial));
    assert_eq!(space.frame(moon).and_then(|f| f.parent), Some(earth_inertial));
    assert!(space
        .frame(earth_inertial)
        .is_some_and(|frame| frame.children.contains(&earth_rotating)));

    assert_eq!(
        space.path_to_root(earth_rotating),
        Ok(vec![earth_rotating, earth_inertial, root])
    );
}

#[test]
fn non_rotating_ancestor() {
    let space = sol();
    let (earth_inertial, earth_rotating) = earth_frames(&space);

    assert_eq!(
        space.resolve_to_non_rotating_ancestor(earth_rotating),
        Ok(earth_inertial)
    );
    assert_eq!(
        space.resolve_to_non_rotating_ancestor(earth_inertial),
        Ok(earth_inertial)
    );

    let earth = space.body_id_with_name("Earth");
    assert_eq!(space.gravitating_body(earth_rotating).ok(), earth);
    assert_eq!(space.gravitating_body_mass(earth_rotating), Ok(5.972e24));
}

#[test]
fn transforms_round_trip() {
    let space = sol();
    let (_, earth_rotating) = earth_frames(&space);
    let moon = moon_frame(&space);
    let frames = [space.root(), earth_rotating, moon];

    for _ in 0..256 {
        let t = rand::random_range(0.0..1e8);
        let position = random_vec3(1e9);
        let velocity = random_vec3(1e4);

        for from in frames {
            for to in frames {
                let (p, v) = space
                    .transform_state_at(t, position, velocity, from, to)
                    .expect("frames are connected");
                let (p, v) = space
                    .transform_state_at(t, p, v, to, from)
                    .expect("frames are connected");

                let route = format!("{from} -> {to} -> {from}");
                assert_almost_eq_vec3_rel(p, position, &format!("position {route}"));
                assert_almost_eq_vec3_rel(v, velocity, &format!("velocity {route}"));
            }
        }
    }
}

#[test]
fn rotating_surface_velocity() {
    let radius = 6.0e6;
    let period = DAY;

    let mut space = Space::new(None, 0.0, SimConfig::default());
    let root = space.root();
    let planet = space
        .add_primary(Body::new("Spinner", BodyKind::Planet, 6.0e24, radius, root))
        .expect("root is unowned");
    let surface = space
        .add_rotating_frame(planet, root, DVec3::Z, period)
        .expect("valid rotation");

    // Standing still on the surface still means moving in the inertial frame
    let (position, velocity) = space
        .transform_state(DVec3::new(radius, 0.0, 0.0), DVec3::ZERO, surface, root)
        .expect("frames are connected");

    assert_almost_eq_vec3_rel(position, DVec3::new(radius, 0.0, 0.0), "surface point at t = 0");
    assert_almost_eq_rel(velocity.length(), TAU * radius / period, "surface speed");
    assert_almost_eq(velocity.normalize().dot(DVec3::Y), 1.0, "surface velocity direction");

    // A quarter day later the same surface point has turned by 90 degrees
    let (later, _) = space
        .transform_state_at(period / 4.0, DVec3::new(radius, 0.0, 0.0), DVec3::ZERO, surface, root)
        .expect("frames are connected");
    assert_almost_eq_vec3_rel(
        later,
        DVec3::new(0.0, radius, 0.0),
        "surface point a quarter day later",
    );
}

#[test]
fn rotation_phase_wraps() {
    let frame = ReferenceFrame {
        id: FrameId(1),
        owner: Some(BodyId(0)),
        parent: Some(FrameId(0)),
        kind: FrameKind::Rotating {
            axis: DVec3::Z,
            period: DAY,
        },
        children: Vec::new(),
    };

    let t = 0.3 * DAY;
    let now = frame.orientation_at(t);
    let far_future = frame.orientation_at(t + 1.0e6 * DAY);

    assert!(
        now.angle_between(far_future) < 1e-6,
        "{now:?} vs {far_future:?}"
    );
    assert!(frame
        .orientation_at(DAY)
        .abs_diff_eq(DQuat::IDENTITY, 1e-9));
}

#[test]
fn sibling_frames_skip_the_root() {
    let mut space = sol();
    let root = space.root();
    let sun_mass = space
        .body_id_with_name("The Sun")
        .and_then(|sun| space.body(sun))
        .map(|sun| sun.mass)
        .expect("the Sun exists");
    let (earth_inertial, _) = earth_frames(&space);

    let mars_orbit = OrbitalState::new(sun_mass, 1.524 * AU, 0.0934, 0.0323, 5.0, 0.865, 0.34, 0.0);
    let (_, mars_frame) = space
        .add_gravitating_body(
            Body::new("Mars", BodyKind::Planet, 6.417e23, 3.3895e6, root),
            root,
            mars_orbit,
            None,
        )
        .expect("root exists");

    let t = space.time();
    let earth_origin = space.frame(earth_inertial).map(|f| f.origin_at(t)).expect("frame exists");
    let mars_origin = space.frame(mars_frame).map(|f| f.origin_at(t)).expect("frame exists");

    let position = DVec3::new(1.0e7, -2.0e6, 3.0e5);
    let expected = position + earth_origin.0 - mars_origin.0;
    let actual = space
        .transform_position_to_frame(position, earth_inertial, mars_frame)
        .expect("frames are connected");

    assert_almost_eq_vec3_rel(actual, expected, "earth to mars");
}

#[test]
fn removing_a_body_cascades() {
    let mut space = sol();
    let root = space.root();
    let (earth_inertial, earth_rotating) = earth_frames(&space);
    let moon = moon_frame(&space);
    let earth = space.body_id_with_name("Earth").expect("Earth exists");

    let station = space
        .add_body(Body::new("Orbital", BodyKind::SpaceStation, 4.2e5, 50.0, earth_rotating))
        .expect("frame exists");

    let removed = space.remove_body(earth);
    let mut names: Vec<&str> = removed.iter().map(|(_, body)| body.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["Earth", "Orbital", "The Moon"]);

    for frame in [earth_inertial, earth_rotating, moon] {
        assert!(space.frame(frame).is_none(), "{frame} should be gone");
    }
    assert!(space.body(station).is_none());
    assert!(space.frame(root).is_some_and(|f| f.children.is_empty()));
    assert_eq!(space.bodies().count(), 1);

    // Removing it again is a no-op
    assert!(space.remove_body(earth).is_empty());
}

#[test]
fn removing_the_primary_keeps_the_root() {
    let mut space = sol();
    let root = space.root();
    let sun = space.body_id_with_name("The Sun").expect("the Sun exists");

    let removed = space.remove_body(sun);
    assert_eq!(removed.len(), 1);
    assert!(space.frame(root).is_some_and(|frame| frame.owner.is_none()));
    assert_eq!(space.gravitating_body(root), Err(FrameError::NoGravitatingBody(root)));

    // The root is free for a new primary
    assert!(space.add_primary(stars::red_dwarf("Barnard's Star", root)).is_ok());
}

#[test]
fn unload_leaves_an_empty_root() {
    let mut space = sol();
    let total = space.bodies().count();

    let removed = space.unload();
    assert_eq!(removed.len(), total);
    assert_eq!(space.frames().count(), 1);
    assert_eq!(space.bodies().count(), 0);
}

#[test]
fn invalid_rotation_is_rejected() {
    let mut space = sol();
    let earth = space.body_id_with_name("Earth").expect("Earth exists");
    let (earth_inertial, _) = earth_frames(&space);

    assert_eq!(
        space.add_rotating_frame(earth, earth_inertial, DVec3::ZERO, DAY),
        Err(FrameError::InvalidRotation(earth))
    );
    assert_eq!(
        space.add_rotating_frame(earth, earth_inertial, DVec3::Z, 0.0),
        Err(FrameError::InvalidRotation(earth))
    );
    assert_eq!(
        space.add_rotating_frame(earth, FrameId(999), DVec3::Z, DAY),
        Err(FrameError::FrameNotFound(FrameId(999)))
    );
}

#[test]
fn add_body_hands_back_orphans() {
    let mut space = sol();
    let orphan = Body::new("Lost", BodyKind::CargoBody, 10.0, 1.0, FrameId(999));

    let (err, body) = space.add_body(orphan).expect_err("frame doesn't exist");
    assert_eq!(err, FrameError::FrameNotFound(FrameId(999)));
    assert_eq!(body.name, "Lost");
}

fn frame(id: u64, parent: Option<u64>, kind: FrameKind, children: &[u64]) -> ReferenceFrame {
    ReferenceFrame {
        id: FrameId(id),
        owner: None,
        parent: parent.map(FrameId),
        kind,
        children: children.iter().copied().map(FrameId).collect(),
    }
}

const SPIN: FrameKind = FrameKind::Rotating {
    axis: DVec3::Z,
    period: 100.0,
};

const STILL: FrameKind = FrameKind::Inertial { orbit: None };

#[test]
fn corrupted_graphs_are_reported() {
    let config = SimConfig::default();

    // Nothing but rotating frames all the way up
    let spinning = Space::from_parts(
        None,
        0.0,
        config,
        vec![frame(0, None, SPIN, &[1]), frame(1, Some(0), SPIN, &[])],
        Vec::new(),
    )
    .expect("links are consistent");
    let err = spinning
        .resolve_to_non_rotating_ancestor(FrameId(1))
        .expect_err("no inertial frame");
    assert_eq!(err, FrameError::NoInertialAncestor(FrameId(1)));
    assert!(err.is_structural());

    // Two frames pointing at each other
    let cyclic = Space::from_parts(
        None,
        0.0,
        config,
        vec![
            frame(0, None, STILL, &[]),
            frame(1, Some(2), STILL, &[2]),
            frame(2, Some(1), STILL, &[1]),
        ],
        Vec::new(),
    )
    .expect("links are consistent");
    let err = cyclic.path_to_root(FrameId(1)).expect_err("cycle");
    assert_eq!(err, FrameError::CyclicFrames(FrameId(1)));
    assert!(err.is_structural());
    assert_eq!(
        cyclic.transform_position_to_frame(DVec3::X, FrameId(1), FrameId(0)),
        Err(FrameError::CyclicFrames(FrameId(1)))
    );

    // Two roots
    assert_eq!(
        Space::from_parts(
            None,
            0.0,
            config,
            vec![frame(0, None, STILL, &[]), frame(1, None, STILL, &[])],
            Vec::new(),
        ),
        Err(FrameError::RootCount(2))
    );

    // A dangling parent link
    assert_eq!(
        Space::from_parts(
            None,
            0.0,
            config,
            vec![frame(0, None, STILL, &[]), frame(1, Some(7), STILL, &[])],
            Vec::new(),
        ),
        Err(FrameError::FrameNotFound(FrameId(7)))
    );
}

#[test]
fn hyperspace_has_no_gravity() {
    let space = Space::hyperspace(10.0, SimConfig::default());

    assert!(space.is_hyperspace());
    assert_eq!(space.system(), None);
    assert_eq!(
        space.gravitating_body(space.root()),
        Err(FrameError::NoGravitatingBody(space.root()))
    );
    assert_eq!(space.to_string(), "Hyperspace, t=10");
}
