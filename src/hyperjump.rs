//! The hyperjump state machine.
//!
//! A jump runs through these states:
//!
//! ```text
//! Idle -> Warmup -> Committed -> Transit -> Arriving -> Idle
//!           \
//!            -> Aborted -> Idle
//! ```
//!
//! Only warmup can be aborted. Once committed, the vehicle has left its
//! star system and the jump runs to completion.
//!
//! All timing is driven by [`Hyperdrive::advance`] and accumulates
//! simulation time, so a single long step can't skip a transition.

use core::fmt;

use glam::{DQuat, DVec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    Body, BodyKind, ManeuverPlanner, Space, SystemLoader, SystemPath, TransitionEvent,
    TransitionKind, Vehicle, VehicleId,
};

/// Shapes the arrival-probability curve; larger values front-load it.
const ARRIVAL_PROBABILITY_FUDGE: f64 = 4.0;

/// Where a vehicle is in the jump sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum HyperjumpState {
    /// No jump in progress.
    #[default]
    Idle,
    /// The drive is spinning up; the jump can still be aborted.
    Warmup,
    /// The vehicle has just left normal space.
    Committed,
    /// The vehicle is in hyperspace.
    Transit,
    /// The vehicle is dropping out at the destination.
    Arriving,
    /// The jump was cancelled; the drive is returning to idle.
    Aborted,
}

impl fmt::Display for HyperjumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HyperjumpState::Idle => "idle",
            HyperjumpState::Warmup => "warmup",
            HyperjumpState::Committed => "committed",
            HyperjumpState::Transit => "transit",
            HyperjumpState::Arriving => "arriving",
            HyperjumpState::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Machine-readable reason a jump was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RejectionCode {
    /// Not enough fuel on board.
    OutOfFuel,
    /// Too deep in a gravity well to open a jump.
    TooCloseToMass,
    /// Refused by a caller-supplied rule.
    Policy,
}

/// Why an eligibility check refused a jump.
///
/// This is an expected outcome, not an error: the caller shows the reason
/// and decides whether to try again.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct JumpRejection {
    /// What kind of refusal this is.
    pub code: RejectionCode,
    reason: String,
}

impl JumpRejection {
    /// Creates a rejection with a human-readable reason.
    pub fn new(code: RejectionCode, reason: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// The human-readable reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl fmt::Display for JumpRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// A predicate a vehicle must pass before its drive may warm up.
pub type EligibilityCheck = Box<dyn Fn(&Vehicle, &Space) -> Result<(), JumpRejection>>;

/// Refuses the jump when the vehicle carries less than `required` tonnes
/// of fuel.
pub fn fuel_check(required: f64) -> EligibilityCheck {
    Box::new(move |vehicle, _| {
        if vehicle.fuel < required {
            Err(JumpRejection::new(
                RejectionCode::OutOfFuel,
                format!(
                    "Not enough fuel: {required:.1} t needed, {:.1} t on board",
                    vehicle.fuel
                ),
            ))
        } else {
            Ok(())
        }
    })
}

/// Refuses the jump while the vehicle is within `radius_multiple` radii of
/// any star or planet.
pub fn clear_of_mass_check(radius_multiple: f64) -> EligibilityCheck {
    Box::new(move |vehicle, space| {
        let Some(frame) = vehicle.frame() else {
            return Ok(());
        };

        for (_, body) in space.bodies().filter(|(_, body)| body.kind.is_gravitating()) {
            let transformed =
                space.transform_position_to_frame(vehicle.position, frame, body.frame);
            let Ok(position) = transformed else {
                continue;
            };
            if (position - body.position).length() < body.radius * radius_multiple {
                return Err(JumpRejection::new(
                    RejectionCode::TooCloseToMass,
                    format!("Too close to {}", body.name),
                ));
            }
        }

        Ok(())
    })
}

/// Everything needed to start a jump.
pub struct HyperjumpRequest {
    /// Where to go.
    pub destination: SystemPath,
    /// How long the drive warms up, in seconds.
    pub warmup_duration: f64,
    /// How long the vehicle spends in hyperspace, in seconds.
    pub transit_duration: f64,
    /// Checks run in order before warmup starts; the first failure wins.
    pub checks: Vec<EligibilityCheck>,
}

impl HyperjumpRequest {
    /// Creates a request without any eligibility checks.
    pub fn new(destination: SystemPath, warmup_duration: f64, transit_duration: f64) -> Self {
        Self {
            destination,
            warmup_duration,
            transit_duration,
            checks: Vec::new(),
        }
    }

    /// Appends an eligibility check.
    #[must_use]
    pub fn with_check(mut self, check: EligibilityCheck) -> Self {
        self.checks.push(check);
        self
    }
}

impl fmt::Debug for HyperjumpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HyperjumpRequest")
            .field("destination", &self.destination)
            .field("warmup_duration", &self.warmup_duration)
            .field("transit_duration", &self.transit_duration)
            .field("checks", &self.checks.len())
            .finish()
    }
}

/// How a call to [`Hyperdrive::initiate`] went.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HyperjumpStatus {
    /// Warmup started.
    Ok,
    /// An eligibility check refused the jump; nothing changed.
    Rejected(JumpRejection),
}

/// A caller broke the state machine's contract.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum HyperjumpError {
    /// `initiate` was called while a jump was already running.
    #[error("a hyperjump is already in progress ({0})")]
    AlreadyInProgress(HyperjumpState),

    /// `abort` was called outside of warmup.
    #[error("a hyperjump can only be aborted during warmup, not while {0}")]
    NotInWarmup(HyperjumpState),

    /// A warmup or transit duration was negative or not finite.
    #[error("invalid hyperjump duration {0}")]
    InvalidDuration(f64),

    /// The destination system could not be loaded on arrival.
    #[error("destination system {0} is unavailable")]
    DestinationUnavailable(SystemPath),
}

/// The bookkeeping of one jump, from initiation to arrival or abort.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HyperjumpSession {
    /// The system the jump started in; set on commit.
    pub source: Option<SystemPath>,
    /// Where the jump goes.
    pub destination: SystemPath,
    /// Current state.
    pub state: HyperjumpState,
    /// Total warmup time, in seconds.
    pub warmup_duration: f64,
    /// Total time in hyperspace, in seconds.
    pub transit_duration: f64,
    /// Warmup time accumulated so far.
    pub warmup_elapsed: f64,
    /// Time spent in hyperspace so far.
    pub transit_elapsed: f64,
    /// When the jump was initiated.
    pub started_at: f64,
}

impl HyperjumpSession {
    /// Warmup time left, in seconds.
    pub fn warmup_remaining(&self) -> f64 {
        (self.warmup_duration - self.warmup_elapsed).max(0.0)
    }

    /// The fraction of the transit completed, in `[0, 1]`.
    pub fn transit_progress(&self) -> f64 {
        if self.transit_duration <= 0.0 {
            return 1.0;
        }
        (self.transit_elapsed / self.transit_duration).clamp(0.0, 1.0)
    }

    /// How likely the vehicle is to have arrived already, as shown on the
    /// hyperspace display.
    ///
    /// Rises steeply at first and reaches exactly 1 at the end of transit.
    pub fn arrival_probability(&self) -> f64 {
        let progress = self.transit_progress();
        let scale = 1.0 / (1.0 - (-ARRIVAL_PROBABILITY_FUDGE).exp());
        scale * (1.0 - (-ARRIVAL_PROBABILITY_FUDGE * progress).exp())
    }
}

/// What the drive needs to touch while it advances.
pub struct JumpContext<'a> {
    /// The jumping vehicle.
    pub vehicle: &'a mut Vehicle,
    /// The space the vehicle is in; replaced on commit and on arrival.
    pub space: &'a mut Space,
    /// The planner, reset when the vehicle leaves its system.
    pub planner: &'a mut ManeuverPlanner,
    /// Loads the destination system.
    pub loader: &'a mut dyn SystemLoader,
    /// Simulation time at the start of this step.
    pub now: f64,
}

/// The hyperjump state machine of one vehicle.
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperdrive {
    vehicle: VehicleId,
    session: Option<HyperjumpSession>,
    events: Vec<TransitionEvent>,
    /// Departure clouds bound for our destination, turned into arrival
    /// clouds and waiting to be placed there.
    clouds: Vec<Body>,
}

impl Hyperdrive {
    /// Creates an idle drive for `vehicle`.
    pub fn new(vehicle: VehicleId) -> Self {
        Self {
            vehicle,
            session: None,
            events: Vec::new(),
            clouds: Vec::new(),
        }
    }

    /// The current state.
    pub fn state(&self) -> HyperjumpState {
        self.session
            .map_or(HyperjumpState::Idle, |session| session.state)
    }

    /// The running jump, if any.
    pub fn session(&self) -> Option<&HyperjumpSession> {
        self.session.as_ref()
    }

    /// The hyperspace clouds travelling along with the vehicle.
    ///
    /// Filled on commit and emptied on arrival.
    pub fn carried_clouds(&self) -> &[Body] {
        &self.clouds
    }

    /// Takes all queued transition events, oldest first.
    pub fn drain_events(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, kind: TransitionKind, timestamp: f64) {
        self.events.push(TransitionEvent {
            kind,
            vehicle: self.vehicle,
            timestamp,
        });
    }

    /// Starts warming up for a jump.
    ///
    /// The eligibility checks run in order; the first refusal is returned
    /// as [`HyperjumpStatus::Rejected`] and leaves everything untouched.
    /// On success, the vehicle's targets are cleared and its controls
    /// reset, since no local-space reference survives a jump.
    ///
    /// # Errors
    /// [`HyperjumpError::AlreadyInProgress`] unless idle, and
    /// [`HyperjumpError::InvalidDuration`] for negative or non-finite
    /// durations.
    pub fn initiate(
        &mut self,
        request: HyperjumpRequest,
        vehicle: &mut Vehicle,
        space: &Space,
        now: f64,
    ) -> Result<HyperjumpStatus, HyperjumpError> {
        if let Some(session) = &self.session {
            return Err(HyperjumpError::AlreadyInProgress(session.state));
        }
        for duration in [request.warmup_duration, request.transit_duration] {
            if !(duration >= 0.0 && duration.is_finite()) {
                return Err(HyperjumpError::InvalidDuration(duration));
            }
        }

        for check in &request.checks {
            if let Err(rejection) = check(vehicle, space) {
                log::info!(
                    "{} hyperjump to {} refused: {rejection}",
                    self.vehicle,
                    request.destination
                );
                return Ok(HyperjumpStatus::Rejected(rejection));
            }
        }

        vehicle.targets.clear();
        vehicle.reset_controls();

        self.session = Some(HyperjumpSession {
            source: None,
            destination: request.destination,
            state: HyperjumpState::Warmup,
            warmup_duration: request.warmup_duration,
            transit_duration: request.transit_duration,
            warmup_elapsed: 0.0,
            transit_elapsed: 0.0,
            started_at: now,
        });
        log::info!(
            "{} warming up for {} ({}s warmup, {}s transit)",
            self.vehicle,
            request.destination,
            request.warmup_duration,
            request.transit_duration
        );
        self.emit(TransitionKind::WarmupStarted, now);

        Ok(HyperjumpStatus::Ok)
    }

    /// Cancels a jump that is still warming up.
    ///
    /// The vehicle never left its frame, so nothing else changes.
    ///
    /// # Errors
    /// [`HyperjumpError::NotInWarmup`] in any other state.
    pub fn abort(&mut self, now: f64) -> Result<(), HyperjumpError> {
        let state = self.state();
        if state != HyperjumpState::Warmup {
            return Err(HyperjumpError::NotInWarmup(state));
        }

        if let Some(session) = self.session.as_mut() {
            session.state = HyperjumpState::Aborted;
        }
        log::info!("{} hyperjump aborted", self.vehicle);
        self.emit(TransitionKind::Aborted, now);
        self.session = None;

        Ok(())
    }

    /// Advances the running jump by `dt` seconds.
    ///
    /// Warmup time past the threshold carries into transit. After a commit
    /// the state reads [`HyperjumpState::Committed`] until the next step.
    ///
    /// # Errors
    /// [`HyperjumpError::DestinationUnavailable`] if the destination can't
    /// be loaded on arrival. The session stays in
    /// [`HyperjumpState::Arriving`] and the next step tries again.
    pub fn advance(&mut self, dt: f64, ctx: &mut JumpContext<'_>) -> Result<(), HyperjumpError> {
        let Some(mut session) = self.session else {
            return Ok(());
        };
        let step_end = ctx.now + dt;

        match session.state {
            HyperjumpState::Warmup => {
                session.warmup_elapsed += dt;
                if session.warmup_elapsed >= session.warmup_duration {
                    let overshoot = session.warmup_elapsed - session.warmup_duration;
                    session.warmup_elapsed = session.warmup_duration;
                    session.transit_elapsed = overshoot;
                    session.source = ctx.space.system();
                    session.state = HyperjumpState::Committed;
                    self.session = Some(session);
                    self.commit(ctx, step_end - overshoot);
                    return Ok(());
                }
            }
            HyperjumpState::Committed | HyperjumpState::Transit => {
                session.state = HyperjumpState::Transit;
                session.transit_elapsed += dt;
                if session.transit_elapsed >= session.transit_duration {
                    let overshoot = session.transit_elapsed - session.transit_duration;
                    session.state = HyperjumpState::Arriving;
                    self.session = Some(session);
                    return self.arrive(ctx, step_end - overshoot);
                }
            }
            HyperjumpState::Arriving => {
                return self.arrive(ctx, step_end);
            }
            HyperjumpState::Idle | HyperjumpState::Aborted => {
                self.session = None;
                return Ok(());
            }
        }

        self.session = Some(session);
        Ok(())
    }

    fn commit(&mut self, ctx: &mut JumpContext<'_>, timestamp: f64) {
        if let Some(session) = self.session {
            self.carry_clouds(ctx, session);
        }

        ctx.vehicle.detach();
        ctx.planner.reset_start_time();
        ctx.planner.reset_dv();

        let config = *ctx.space.config();
        ctx.space.unload();
        *ctx.space = Space::hyperspace(ctx.now, config);

        log::info!("{} entered hyperspace", self.vehicle);
        self.emit(TransitionKind::Committed, timestamp);
    }

    /// Takes the departure clouds of ships bound where we are going out of
    /// the space, turned around to arrive there with us.
    fn carry_clouds(&mut self, ctx: &mut JumpContext<'_>, session: HyperjumpSession) {
        let bound_with_us: Vec<_> = ctx
            .space
            .bodies()
            .filter(|(_, body)| body.is_departure_cloud() && body.cloud_ship().is_some())
            .filter(|(_, body)| {
                body.cloud_destination()
                    .is_some_and(|dest| dest.is_same_system(&session.destination))
            })
            .map(|(id, _)| id)
            .collect();

        for id in bound_with_us {
            for (removed, mut body) in ctx.space.remove_body(id) {
                ctx.vehicle.notify_removed(removed, body.kind, ctx.space);

                if let BodyKind::HyperspaceCloud { ship, .. } = body.kind {
                    body.kind = BodyKind::HyperspaceCloud {
                        ship,
                        destination: session.source,
                        arrival: true,
                    };
                    self.clouds.push(body);
                }
            }
        }

        log::info!("{} hyperspace clouds brought over", self.clouds.len());
    }

    fn arrive(&mut self, ctx: &mut JumpContext<'_>, timestamp: f64) -> Result<(), HyperjumpError> {
        let Some(session) = self.session else {
            return Ok(());
        };
        let config = *ctx.space.config();

        let Some(space) = ctx.loader.load_system(session.destination, ctx.now, config) else {
            log::error!("cannot load hyperjump destination {}", session.destination);
            return Err(HyperjumpError::DestinationUnavailable(session.destination));
        };

        // Come out on the side facing the system we left, heading inwards.
        let outward = session
            .source
            .and_then(|source| {
                let from = ctx.loader.system_position(source)?;
                let to = ctx.loader.system_position(session.destination)?;
                (from - to).try_normalize()
            })
            .unwrap_or(DVec3::X);
        let position = outward * config.hyperspace_exit_distance;
        let velocity = -outward * config.hyperspace_exit_speed;

        *ctx.space = space;
        let root = ctx.space.root();
        ctx.vehicle.attach(root, position, velocity);
        ctx.vehicle.orientation = DQuat::from_rotation_arc(DVec3::NEG_Z, -outward);
        ctx.vehicle.targets.clear();
        ctx.vehicle.reset_controls();

        let exit = Body::hyperspace_cloud(root, None, session.source, true);
        let carried = std::mem::take(&mut self.clouds);
        for mut cloud in std::iter::once(exit).chain(carried) {
            cloud.frame = root;
            cloud.position = position;
            cloud.velocity = DVec3::ZERO;
            if let Err((err, cloud)) = ctx.space.add_body(cloud) {
                log::warn!("cannot place {} at {}: {err}", cloud.name, session.destination);
            }
        }

        self.session = None;
        log::info!("{} arrived at {}", self.vehicle, session.destination);
        self.emit(TransitionKind::Arrived, timestamp);

        Ok(())
    }
}
