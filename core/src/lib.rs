#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Skyraid encounter engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots such as [`EnemyView`], and respond exclusively with new command
//! batches.
//!
//! Designer-authored assets ([`CurveDefinition`], [`FormationDefinition`],
//! [`RouteDefinition`]) are immutable after load and shared behind [`Arc`].

use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod assets;
pub mod projection;
pub mod timer;

pub use assets::{
    ActionPayload, ActionTag, BreakBehavior, CircleArc, ControlPoint, CoordinateSpace,
    CurveDefinition, CurveKind, EnemyTemplate, FormationDefinition, FormationLayout, NodeSpace,
    RouteAction, RouteDefinition, RouteEnd, RouteNode, Side, SineAxis, SineWave,
};
pub use glam::Vec2;
pub use projection::{project, Projector, Viewport};

/// Depth hint used when projecting normalized coordinates onto the gameplay plane.
pub const GAMEPLAY_DEPTH: f32 = 0.0;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests creation of a new enemy from a template.
    SpawnEnemy {
        /// Template describing the enemy to create.
        template: TemplateId,
        /// World position the enemy appears at.
        position: Vec2,
        /// Damage model attached to the enemy.
        vitality: Vitality,
        /// Motion strategy that drives the enemy after creation.
        motion: MotionPlan,
        /// Population handle of the phase that requested the spawn, if tracked.
        tracking: Option<PopulationToken>,
    },
    /// Writes a new position for an active enemy.
    MoveEnemy {
        /// Enemy being moved.
        enemy: EnemyId,
        /// Destination position in world units.
        position: Vec2,
    },
    /// Deactivates an enemy.
    DespawnEnemy {
        /// Enemy being removed.
        enemy: EnemyId,
        /// Reason the enemy leaves play.
        cause: DespawnCause,
    },
    /// Delivers damage to an enemy through its damage sink.
    DamageEnemy {
        /// Enemy receiving the damage.
        enemy: EnemyId,
        /// Amount of health to remove.
        amount: u32,
    },
    /// Replaces the motion strategy of an active enemy.
    SetLocomotion {
        /// Enemy whose motion changes.
        enemy: EnemyId,
        /// Strategy that takes over.
        motion: MotionPlan,
    },
    /// Suspends or resumes route traversal without resetting its progress.
    SetRoutePaused {
        /// Enemy whose route is affected.
        enemy: EnemyId,
        /// Whether traversal is suspended.
        paused: bool,
    },
    /// Broadcasts that an enemy reached a tagged route node.
    AnnounceRouteNode {
        /// Enemy that reached the node.
        enemy: EnemyId,
        /// Index of the node within its route.
        index: usize,
        /// Action tag carried by the node.
        action: RouteAction,
    },
    /// Creates a projectile or area hazard.
    SpawnHazard {
        /// Kind of hazard created.
        kind: HazardKind,
        /// Position the hazard starts from.
        origin: Vec2,
        /// Constant velocity in world units per second.
        velocity: Vec2,
        /// Damage dealt on contact.
        damage: u32,
        /// Seconds the hazard stays alive.
        lifetime: f32,
    },
    /// Removes every active hazard.
    ClearHazards,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy was created.
    EnemySpawned {
        /// Identifier assigned to the new enemy.
        enemy: EnemyId,
        /// Template the enemy was created from.
        template: TemplateId,
        /// Position the enemy occupies after spawning.
        position: Vec2,
        /// Motion strategy requested for the enemy.
        motion: MotionPlan,
        /// Population handle attached to the enemy.
        tracking: Option<PopulationToken>,
    },
    /// Reports the remaining health of an enemy after a hit.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Health remaining after the hit.
        health: u32,
        /// Maximum health of the enemy.
        max_health: u32,
    },
    /// Forwards damage addressed to an enemy whose health is owned by a system.
    BossStruck {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage delivered by the hit.
        amount: u32,
    },
    /// Terminal notification emitted exactly once per enemy lifecycle.
    EnemyGone {
        /// Enemy that left play.
        enemy: EnemyId,
        /// Template the enemy was created from.
        template: TemplateId,
        /// Population handle the enemy carried.
        tracking: Option<PopulationToken>,
        /// Reason the enemy left play.
        cause: DespawnCause,
    },
    /// Announces that an enemy switched motion strategy.
    LocomotionChanged {
        /// Enemy whose motion changed.
        enemy: EnemyId,
        /// Strategy now in control.
        motion: MotionPlan,
    },
    /// Announces that route traversal was suspended or resumed.
    RoutePauseChanged {
        /// Enemy whose route is affected.
        enemy: EnemyId,
        /// Whether traversal is suspended.
        paused: bool,
    },
    /// Announces that an enemy reached a tagged route node.
    RouteNodeReached {
        /// Enemy that reached the node.
        enemy: EnemyId,
        /// Index of the node within its route.
        index: usize,
        /// Action tag carried by the node.
        action: RouteAction,
    },
    /// Confirms that a hazard was created.
    HazardSpawned {
        /// Identifier assigned to the hazard.
        hazard: HazardId,
        /// Kind of hazard created.
        kind: HazardKind,
    },
    /// Reports that every hazard was removed.
    HazardsCleared {
        /// Number of hazards that were active.
        count: usize,
    },
}

/// Motion strategy attached to an enemy. Exactly one is active at a time.
#[derive(Clone, Debug, PartialEq)]
pub enum MotionPlan {
    /// Default movement: straight downward drift until the enemy leaves the arena.
    Drift,
    /// Stays where it is until another strategy is assigned.
    Hold,
    /// Follows a parametric curve, optionally as a formation member.
    Curve {
        /// Curve traversed by the enemy.
        curve: Arc<CurveDefinition>,
        /// Formation membership applied on top of the curve.
        formation: Option<FormationSlot>,
    },
    /// Flies in along a curve, then holds its final position or starts a route.
    FlyIn {
        /// Curve used for the entry flight.
        curve: Arc<CurveDefinition>,
        /// Route assigned once the flight completes.
        then: Option<Arc<RouteDefinition>>,
    },
    /// Traverses an authored route.
    Route(Arc<RouteDefinition>),
}

/// Membership of an enemy within a formation.
#[derive(Clone, Debug, PartialEq)]
pub struct FormationSlot {
    /// Formation the enemy belongs to.
    pub formation: Arc<FormationDefinition>,
    /// Zero-based member index within the formation.
    pub index: usize,
}

/// Damage model attached to an enemy at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vitality {
    /// The world tracks health and destroys the enemy when it reaches zero.
    Health(u32),
    /// Damage is forwarded as [`Event::BossStruck`] to the system that owns the health.
    Delegated,
}

/// Reasons an enemy leaves play.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DespawnCause {
    /// Health reached zero.
    Destroyed,
    /// A non-looping curve reached its end.
    PathComplete,
    /// A route ended with the despawn end behaviour.
    RouteComplete,
    /// Default drift carried the enemy past the bottom of the arena.
    LeftArena,
    /// Removed by the host.
    Removed,
}

/// Kinds of hazards produced by boss attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardKind {
    /// Radial sound-wave projectile.
    SoundWave,
    /// Bass-drop shockwave.
    Shockwave,
    /// Ejected cassette projectile.
    Cassette,
    /// Speaker punch aimed at a screen edge.
    Punch,
    /// Projectile released by the volume-max burst.
    VolumeBurst,
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a hazard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HazardId(u32);

impl HazardId {
    /// Creates a new hazard identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an enemy template supplied by the host's entity factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(u32);

impl TemplateId {
    /// Creates a new template identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Handle identifying the phase whose live population an enemy counts towards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopulationToken(u64);

impl PopulationToken {
    /// Creates a new population token with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the token.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Per-entity population handle guaranteeing a single "gone" notification.
///
/// Several lifecycle signals may end an enemy (an explicit despawn, lethal
/// damage, leaving the arena). Only the first call to
/// [`PopulationTracker::notify_gone`] reports success, so the live counter is
/// decremented exactly once per lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PopulationTracker {
    token: Option<PopulationToken>,
    notified: bool,
}

impl PopulationTracker {
    /// Creates a tracker bound to the provided phase token.
    #[must_use]
    pub const fn new(token: Option<PopulationToken>) -> Self {
        Self {
            token,
            notified: false,
        }
    }

    /// Token of the phase the tracker reports to.
    #[must_use]
    pub const fn token(&self) -> Option<PopulationToken> {
        self.token
    }

    /// Reports whether the terminal notification already fired.
    #[must_use]
    pub const fn is_notified(&self) -> bool {
        self.notified
    }

    /// Marks the tracker as notified, returning `true` only the first time.
    #[must_use]
    pub fn notify_gone(&mut self) -> bool {
        if self.notified {
            return false;
        }
        self.notified = true;
        true
    }
}

/// Health of an enemy whose damage is tracked by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Health {
    /// Remaining health.
    pub current: u32,
    /// Health the enemy spawned with.
    pub max: u32,
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Template the enemy was created from.
    pub template: TemplateId,
    /// Current world position.
    pub position: Vec2,
    /// Health tracked by the world, `None` when delegated to a system.
    pub health: Option<Health>,
}

/// Read-only snapshot describing all active enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single enemy.
    #[must_use]
    pub fn get(&self, enemy: EnemyId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&enemy, |snapshot| snapshot.id)
            .ok()
            .and_then(|index| self.snapshots.get(index))
    }

    /// Current position of an enemy, if it is active.
    #[must_use]
    pub fn position(&self, enemy: EnemyId) -> Option<Vec2> {
        self.get(enemy).map(|snapshot| snapshot.position)
    }

    /// Number of active enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Configuration problems detected when assets are loaded or assigned.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A Bezier curve does not have its exact number of control points.
    #[error("{kind:?} curve needs exactly {expected} control points, found {found}")]
    BezierPointCount {
        /// Curve family being validated.
        kind: CurveKind,
        /// Number of points the family requires.
        expected: usize,
        /// Number of points authored.
        found: usize,
    },
    /// A curve has fewer control points than its family needs.
    #[error("{kind:?} curve needs at least {minimum} control points, found {found}")]
    TooFewPoints {
        /// Curve family being validated.
        kind: CurveKind,
        /// Minimum number of points required.
        minimum: usize,
        /// Number of points authored.
        found: usize,
    },
    /// A traversal duration is zero, negative or not finite.
    #[error("traversal duration must be positive, found {0}")]
    NonPositiveDuration(f32),
    /// A route has fewer than two nodes and would never be active.
    #[error("route needs at least two nodes, found {0}")]
    RouteTooShort(usize),
    /// A formation declares zero members.
    #[error("formation must have at least one member")]
    EmptyFormation,
    /// A grid layout declares zero columns.
    #[error("grid layouts need at least one column")]
    ZeroColumns,
    /// A phase or boss references a template the catalog does not contain.
    #[error("unknown enemy template {0:?}")]
    UnknownTemplate(TemplateId),
    /// Boss thresholds are not ordered below the maximum health.
    #[error("boss thresholds must satisfy phase3 <= phase2 <= max health (phase2 {phase2}, phase3 {phase3}, max {max})")]
    BossThresholds {
        /// Health at which phase two starts.
        phase2: u32,
        /// Health at which phase three starts.
        phase3: u32,
        /// Maximum boss health.
        max: u32,
    },
    /// Wraps another error with the location of the offending asset.
    #[error("{context}: {source}")]
    InContext {
        /// Human readable location of the asset, e.g. `wave 0 phase 2`.
        context: String,
        /// Underlying configuration problem.
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    /// Attaches a location description to the error.
    #[must_use]
    pub fn within(self, context: impl Into<String>) -> Self {
        Self::InContext {
            context: context.into(),
            source: Box::new(self),
        }
    }
}
