use core::fmt;
use std::collections::HashMap;

use glam::DVec3;

use crate::{
    Body, BodyId, FrameId, FrameKind, OrbitalState, ReferenceFrame, SimConfig, SystemPath,
};

/// An error describing why a frame graph query or mutation failed.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FrameError {
    /// There is no frame with this id.
    #[error("{0} does not exist")]
    FrameNotFound(FrameId),

    /// There is no body with this id.
    #[error("{0} does not exist")]
    BodyNotFound(BodyId),

    /// Walking up from this frame reached the root without meeting an
    /// inertial frame.
    #[error("{0} has no inertial ancestor")]
    NoInertialAncestor(FrameId),

    /// This inertial frame isn't anchored at any body.
    #[error("{0} is not anchored at a gravitating body")]
    NoGravitatingBody(FrameId),

    /// Walking up from this frame never reached a root.
    #[error("parent links starting at {0} form a cycle")]
    CyclicFrames(FrameId),

    /// The two frames belong to different trees.
    #[error("{0} and {1} have no common ancestor")]
    DisjointFrames(FrameId, FrameId),

    /// The frame graph has no root, or more than one.
    #[error("expected exactly one root frame, found {0}")]
    RootCount(usize),

    /// A rotating frame needs a finite, non-zero period and a non-zero axis.
    #[error("invalid rotation for a frame owned by {0}")]
    InvalidRotation(BodyId),

    /// The frame already has an owner.
    #[error("{0} is already owned by a body")]
    AlreadyOwned(FrameId),
}

impl FrameError {
    /// Whether this error means the frame graph itself is corrupted, as
    /// opposed to a lookup that no longer resolves.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            FrameError::NoInertialAncestor(_)
                | FrameError::CyclicFrames(_)
                | FrameError::DisjointFrames(..)
                | FrameError::RootCount(_)
        )
    }
}

/// The frame graph and body registry of one star system, or of hyperspace.
///
/// Frames and bodies live in arenas addressed by [`FrameId`] and [`BodyId`];
/// they refer to each other only through those ids.
///
/// # Tick consistency
/// Every transform reads the frame tree at [`time`][Self::time], which
/// only moves at the very end of [`tick`][Self::tick]. Everything queried
/// during a tick therefore sees the same start-of-tick state.
#[derive(Clone, Debug, PartialEq)]
pub struct Space {
    /// The star system this space holds, or `None` for hyperspace.
    system: Option<SystemPath>,

    frames: HashMap<FrameId, ReferenceFrame>,
    bodies: HashMap<BodyId, Body>,
    root: FrameId,

    next_frame_id: u64,
    next_body_id: u64,

    /// The simulation time, in seconds.
    time: f64,

    config: SimConfig,
}

impl Space {
    /// Creates a space holding nothing but an unowned inertial root frame.
    pub fn new(system: Option<SystemPath>, time: f64, config: SimConfig) -> Space {
        let root = FrameId(0);
        let mut frames = HashMap::new();
        frames.insert(
            root,
            ReferenceFrame {
                id: root,
                owner: None,
                parent: None,
                kind: FrameKind::Inertial { orbit: None },
                children: Vec::new(),
            },
        );

        Space {
            system,
            frames,
            bodies: HashMap::new(),
            root,
            next_frame_id: 1,
            next_body_id: 0,
            time,
            config,
        }
    }

    /// Creates the empty space a vehicle sits in while in transit.
    pub fn hyperspace(time: f64, config: SimConfig) -> Space {
        Space::new(None, time, config)
    }

    /// Rebuilds a space from previously saved frames and bodies.
    ///
    /// Parent links are checked here; frame kinds are not, so a corrupted
    /// graph still loads and is reported by the queries that trip over it.
    ///
    /// # Errors
    /// [`FrameError::RootCount`] if there isn't exactly one root, and
    /// [`FrameError::FrameNotFound`] for dangling parent, child, or body
    /// frame links.
    pub fn from_parts(
        system: Option<SystemPath>,
        time: f64,
        config: SimConfig,
        frames: Vec<ReferenceFrame>,
        bodies: Vec<(BodyId, Body)>,
    ) -> Result<Space, FrameError> {
        let frames: HashMap<FrameId, ReferenceFrame> =
            frames.into_iter().map(|frame| (frame.id, frame)).collect();
        let bodies: HashMap<BodyId, Body> = bodies.into_iter().collect();

        let roots: Vec<FrameId> = frames
            .values()
            .filter(|frame| frame.is_root())
            .map(|frame| frame.id)
            .collect();
        let root = match roots.as_slice() {
            [root] => *root,
            _ => return Err(FrameError::RootCount(roots.len())),
        };

        for frame in frames.values() {
            let links = frame.parent.iter().chain(frame.children.iter());
            for &linked in links {
                if !frames.contains_key(&linked) {
                    return Err(FrameError::FrameNotFound(linked));
                }
            }
        }
        for body in bodies.values() {
            if !frames.contains_key(&body.frame) {
                return Err(FrameError::FrameNotFound(body.frame));
            }
        }

        let next_frame_id = frames.keys().map(|id| id.0 + 1).max().unwrap_or(0);
        let next_body_id = bodies.keys().map(|id| id.0 + 1).max().unwrap_or(0);

        Ok(Space {
            system,
            frames,
            bodies,
            root,
            next_frame_id,
            next_body_id,
            time,
            config,
        })
    }

    /// The star system this space holds, or `None` for hyperspace.
    pub fn system(&self) -> Option<SystemPath> {
        self.system
    }

    /// Whether this is the empty space between star systems.
    pub fn is_hyperspace(&self) -> bool {
        self.system.is_none()
    }

    /// The root frame of this space.
    pub fn root(&self) -> FrameId {
        self.root
    }

    /// The simulation time the frame tree is currently evaluated at.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// The configuration this space was created with.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Advances the frame tree by `dt` seconds.
    pub fn tick(&mut self, dt: f64) {
        self.time += dt;
    }

    /// Gets a frame by id.
    pub fn frame(&self, id: FrameId) -> Option<&ReferenceFrame> {
        self.frames.get(&id)
    }

    /// Iterates over all frames, in no particular order.
    pub fn frames(&self) -> impl Iterator<Item = &ReferenceFrame> {
        self.frames.values()
    }

    /// Gets a body by id.
    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(&id)
    }

    /// Gets a mutable reference to a body.
    pub fn body_mut(&mut self, id: BodyId) -> Option<&mut Body> {
        self.bodies.get_mut(&id)
    }

    /// Iterates over all bodies and their ids, in no particular order.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.bodies.iter().map(|(&id, body)| (id, body))
    }

    /// Gets the id of a body with a given name.
    pub fn body_id_with_name(&self, name: &str) -> Option<BodyId> {
        self.bodies
            .iter()
            .find(|(_, body)| body.name == name)
            .map(|(id, _)| *id)
    }

    /// Finds the departure cloud a ship left this space through.
    ///
    /// Arrival clouds are skipped: their ship ids belong to another space.
    pub fn find_cloud_for_ship(&self, ship: BodyId) -> Option<BodyId> {
        self.bodies
            .iter()
            .find(|(_, body)| body.is_departure_cloud() && body.cloud_ship() == Some(ship))
            .map(|(id, _)| *id)
    }

    /// Makes `body` the primary of this space, owning the root frame.
    ///
    /// # Errors
    /// [`FrameError::AlreadyOwned`] if the root already has an owner.
    pub fn add_primary(&mut self, mut body: Body) -> Result<BodyId, FrameError> {
        let root = self.root;
        if self.frames.get(&root).and_then(|frame| frame.owner).is_some() {
            return Err(FrameError::AlreadyOwned(root));
        }

        body.frame = root;
        body.position = DVec3::ZERO;
        body.velocity = DVec3::ZERO;
        let id = self.insert_body(body);

        if let Some(frame) = self.frames.get_mut(&root) {
            frame.owner = Some(id);
        }

        Ok(id)
    }

    /// Adds a body to the space.
    ///
    /// `body.frame` must already exist.
    ///
    /// Returns: The id of the newly-added body, or the body itself if its
    /// frame could not be found.
    pub fn add_body(&mut self, body: Body) -> Result<BodyId, (FrameError, Body)> {
        if !self.frames.contains_key(&body.frame) {
            return Err((FrameError::FrameNotFound(body.frame), body));
        }

        Ok(self.insert_body(body))
    }

    fn insert_body(&mut self, body: Body) -> BodyId {
        let id = BodyId(self.next_body_id);
        self.next_body_id = self.next_body_id.wrapping_add(1);

        log::debug!("adding {id} ({}) to {}", body.name, body.frame);
        self.bodies.insert(id, body);
        id
    }

    fn insert_frame(
        &mut self,
        owner: BodyId,
        parent: FrameId,
        kind: FrameKind,
    ) -> Result<FrameId, FrameError> {
        if !self.bodies.contains_key(&owner) {
            return Err(FrameError::BodyNotFound(owner));
        }
        let id = FrameId(self.next_frame_id);
        let parent_frame = self
            .frames
            .get_mut(&parent)
            .ok_or(FrameError::FrameNotFound(parent))?;
        parent_frame.children.push(id);
        self.next_frame_id = self.next_frame_id.wrapping_add(1);

        self.frames.insert(
            id,
            ReferenceFrame {
                id,
                owner: Some(owner),
                parent: Some(parent),
                kind,
                children: Vec::new(),
            },
        );

        Ok(id)
    }

    /// Adds an inertial frame anchored at `owner`, following `orbit`
    /// around the origin of `parent`.
    pub fn add_inertial_frame(
        &mut self,
        owner: BodyId,
        parent: FrameId,
        orbit: Option<OrbitalState>,
    ) -> Result<FrameId, FrameError> {
        self.insert_frame(owner, parent, FrameKind::Inertial { orbit })
    }

    /// Adds a frame that turns with `owner`'s surface once every `period`
    /// seconds about `axis` (in `parent` coordinates).
    pub fn add_rotating_frame(
        &mut self,
        owner: BodyId,
        parent: FrameId,
        axis: DVec3,
        period: f64,
    ) -> Result<FrameId, FrameError> {
        let axis = axis.try_normalize().ok_or(FrameError::InvalidRotation(owner))?;
        if !period.is_finite() || period == 0.0 {
            return Err(FrameError::InvalidRotation(owner));
        }
        self.insert_frame(owner, parent, FrameKind::Rotating { axis, period })
    }

    /// Adds a gravitating body on `orbit` around the origin of `parent`,
    /// together with the inertial frame it anchors and, if `rotation` is
    /// given as `(axis, period)`, a rotating frame for its surface.
    ///
    /// The body sits at the origin of its own inertial frame.
    ///
    /// Returns: The body id and the id of its inertial frame.
    pub fn add_gravitating_body(
        &mut self,
        body: Body,
        parent: FrameId,
        orbit: OrbitalState,
        rotation: Option<(DVec3, f64)>,
    ) -> Result<(BodyId, FrameId), FrameError> {
        if !self.frames.contains_key(&parent) {
            return Err(FrameError::FrameNotFound(parent));
        }

        let id = self.insert_body(Body { frame: parent, ..body });
        let inertial = self.add_inertial_frame(id, parent, Some(orbit))?;
        if let Some((axis, period)) = rotation {
            if let Err(err) = self.add_rotating_frame(id, inertial, axis, period) {
                self.remove_body(id);
                return Err(err);
            }
        }

        if let Some(body) = self.bodies.get_mut(&id) {
            body.frame = inertial;
            body.position = DVec3::ZERO;
            body.velocity = DVec3::ZERO;
        }

        Ok((id, inertial))
    }

    /// The frames owned by a body, shallowest first.
    pub fn frames_owned_by(&self, body: BodyId) -> Vec<FrameId> {
        let mut owned: Vec<FrameId> = self
            .frames
            .values()
            .filter(|frame| frame.owner == Some(body))
            .map(|frame| frame.id)
            .collect();
        owned.sort_by_key(|&id| self.depth(id));
        owned
    }

    fn depth(&self, frame: FrameId) -> usize {
        self.path_to_root(frame).map(|path| path.len()).unwrap_or(usize::MAX)
    }

    /// Removes a body from the space.
    ///
    /// Frames the body owns go with it, and so does everything inside those
    /// frames. The root frame always survives, but loses its owner.
    ///
    /// Returns: The ids and contents of all bodies that were removed,
    /// including the one specified. An empty Vec is returned if the body
    /// was not found.
    pub fn remove_body(&mut self, id: BodyId) -> Vec<(BodyId, Body)> {
        let body = match self.bodies.remove(&id) {
            Some(body) => body,
            None => return Vec::new(),
        };
        log::debug!("removing {id} ({})", body.name);

        let mut removed = vec![(id, body)];

        for frame in self.frames_owned_by(id) {
            if frame == self.root {
                if let Some(root) = self.frames.get_mut(&frame) {
                    root.owner = None;
                }
                continue;
            }
            removed.append(&mut self.remove_frame(frame));
        }

        removed
    }

    /// Removes a frame, its descendants, and every body inside any of them.
    fn remove_frame(&mut self, id: FrameId) -> Vec<(BodyId, Body)> {
        let frame = match self.frames.remove(&id) {
            Some(frame) => frame,
            None => return Vec::new(),
        };

        if let Some(parent) = frame.parent.and_then(|parent| self.frames.get_mut(&parent)) {
            parent.children.retain(|&child| child != id);
        }

        let mut removed = Vec::new();
        for child in frame.children {
            removed.append(&mut self.remove_frame(child));
        }

        let inside: Vec<BodyId> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.frame == id)
            .map(|(&body_id, _)| body_id)
            .collect();
        for body_id in inside {
            removed.append(&mut self.remove_body(body_id));
        }

        removed
    }

    /// Tears the whole system down, leaving only an unowned root frame.
    ///
    /// Returns: Every body that was in the space.
    pub fn unload(&mut self) -> Vec<(BodyId, Body)> {
        log::info!(
            "unloading {} ({} frames, {} bodies)",
            self.system.map_or_else(|| "hyperspace".to_string(), |s| s.to_string()),
            self.frames.len(),
            self.bodies.len()
        );

        let root = self.root;
        self.frames.retain(|&id, _| id == root);
        if let Some(root) = self.frames.get_mut(&root) {
            root.owner = None;
            root.children.clear();
        }

        self.bodies.drain().collect()
    }

    /// The frames from `frame` up to and including the root.
    ///
    /// # Errors
    /// [`FrameError::FrameNotFound`] for a dangling link,
    /// [`FrameError::CyclicFrames`] if the walk never ends.
    pub fn path_to_root(&self, frame: FrameId) -> Result<Vec<FrameId>, FrameError> {
        let mut path = Vec::new();
        let mut current = Some(frame);

        while let Some(id) = current {
            if path.len() > self.frames.len() {
                return Err(FrameError::CyclicFrames(frame));
            }
            let node = self.frames.get(&id).ok_or(FrameError::FrameNotFound(id))?;
            path.push(id);
            current = node.parent;
        }

        Ok(path)
    }

    /// Walks up from `frame` to the nearest frame that doesn't rotate.
    ///
    /// Returns `frame` itself if it is inertial.
    ///
    /// # Errors
    /// [`FrameError::NoInertialAncestor`] if the root is reached without
    /// finding one. That can only happen in a corrupted graph.
    #[doc(alias = "get_non_rot_frame")]
    pub fn resolve_to_non_rotating_ancestor(&self, frame: FrameId) -> Result<FrameId, FrameError> {
        for id in self.path_to_root(frame)? {
            let node = self.frames.get(&id).ok_or(FrameError::FrameNotFound(id))?;
            if !node.is_rotating() {
                return Ok(id);
            }
        }

        log::error!("{frame} has no inertial ancestor; the frame graph is corrupted");
        Err(FrameError::NoInertialAncestor(frame))
    }

    /// The body anchoring the nearest inertial frame at or above `frame`.
    pub fn gravitating_body(&self, frame: FrameId) -> Result<BodyId, FrameError> {
        let inertial = self.resolve_to_non_rotating_ancestor(frame)?;
        let owner = self
            .frames
            .get(&inertial)
            .and_then(|node| node.owner)
            .ok_or(FrameError::NoGravitatingBody(inertial))?;

        if self.bodies.contains_key(&owner) {
            Ok(owner)
        } else {
            Err(FrameError::BodyNotFound(owner))
        }
    }

    /// The mass of the body anchoring the nearest inertial frame at or
    /// above `frame`, in kilograms.
    pub fn gravitating_body_mass(&self, frame: FrameId) -> Result<f64, FrameError> {
        let owner = self.gravitating_body(frame)?;
        self.bodies
            .get(&owner)
            .map(|body| body.mass)
            .ok_or(FrameError::BodyNotFound(owner))
    }

    /// Maps a position and velocity from one frame into another at time `t`.
    ///
    /// The path goes up from `from` to the closest common ancestor and then
    /// back down to `to`, so sibling frames never round-trip through the
    /// root and lose precision.
    pub fn transform_state_at(
        &self,
        t: f64,
        position: DVec3,
        velocity: DVec3,
        from: FrameId,
        to: FrameId,
    ) -> Result<(DVec3, DVec3), FrameError> {
        let up = self.path_to_root(from)?;
        let down = self.path_to_root(to)?;

        let common = up
            .iter()
            .copied()
            .find(|id| down.contains(id))
            .ok_or(FrameError::DisjointFrames(from, to))?;

        let (mut position, mut velocity) = (position, velocity);

        for id in up.iter().take_while(|&&id| id != common) {
            let frame = self.frames.get(id).ok_or(FrameError::FrameNotFound(*id))?;
            (position, velocity) = frame.to_parent(t, position, velocity);
        }

        let descent: Vec<FrameId> = down.iter().copied().take_while(|&id| id != common).collect();
        for id in descent.iter().rev() {
            let frame = self.frames.get(id).ok_or(FrameError::FrameNotFound(*id))?;
            (position, velocity) = frame.from_parent(t, position, velocity);
        }

        Ok((position, velocity))
    }

    /// Maps a position and velocity from one frame into another, at the
    /// current time.
    pub fn transform_state(
        &self,
        position: DVec3,
        velocity: DVec3,
        from: FrameId,
        to: FrameId,
    ) -> Result<(DVec3, DVec3), FrameError> {
        self.transform_state_at(self.time, position, velocity, from, to)
    }

    /// Maps a position from one frame into another, at the current time.
    pub fn transform_position_to_frame(
        &self,
        position: DVec3,
        from: FrameId,
        to: FrameId,
    ) -> Result<DVec3, FrameError> {
        self.transform_state(position, DVec3::ZERO, from, to)
            .map(|(position, _)| position)
    }

    /// Maps a velocity from one frame into another, at the current time.
    ///
    /// Rotating frames drag whatever is inside them along, so the velocity
    /// depends on where it was measured.
    pub fn transform_velocity_to_frame(
        &self,
        position: DVec3,
        velocity: DVec3,
        from: FrameId,
        to: FrameId,
    ) -> Result<DVec3, FrameError> {
        self.transform_state(position, velocity, from, to)
            .map(|(_, velocity)| velocity)
    }

    /// The position of a body in another frame.
    pub fn position_rel_to(&self, body: BodyId, frame: FrameId) -> Result<DVec3, FrameError> {
        let node = self.bodies.get(&body).ok_or(FrameError::BodyNotFound(body))?;
        self.transform_position_to_frame(node.position, node.frame, frame)
    }

    /// The velocity of a body in another frame.
    pub fn velocity_rel_to(&self, body: BodyId, frame: FrameId) -> Result<DVec3, FrameError> {
        let node = self.bodies.get(&body).ok_or(FrameError::BodyNotFound(body))?;
        self.transform_velocity_to_frame(node.position, node.velocity, node.frame, frame)
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.system {
            Some(system) => write!(
                f,
                "{system} with {} frames and {} bodies, t={}",
                self.frames.len(),
                self.bodies.len(),
                self.time
            ),
            None => write!(f, "Hyperspace, t={}", self.time),
        }
    }
}
