#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic motion system that drives every active enemy.
//!
//! Each enemy owns exactly one locomotion strategy at a time: default drift,
//! holding still, following a curve, flying in along a curve, or traversing a
//! route. The system reacts to world events and answers with movement,
//! despawn and route-announcement commands.
//!
//! Enemies whose health is delegated to a system never leave play through
//! motion: where a route or curve would drift or despawn them, they hold.

use std::{collections::BTreeMap, sync::Arc};

use skyraid_core::{
    Command, DespawnCause, EnemyId, EnemyView, Event, MotionPlan, Projector, RouteDefinition,
    RouteEnd, Vec2, Viewport, GAMEPLAY_DEPTH,
};
use tracing::warn;

mod follower;
mod route;

pub use follower::{MotionController, MotionStep};
pub use route::{RouteController, RouteSignal, RouteStatus};

const DEFAULT_DRIFT_SPEED: f32 = 2.5;
const DEFAULT_CULL_MARGIN: f32 = 2.0;

/// Configuration parameters required to construct the motion system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    viewport: Viewport,
    drift_speed: f32,
    cull_margin: f32,
    depth: f32,
}

impl Config {
    /// Creates a configuration with default drift speed and cull margin.
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            drift_speed: DEFAULT_DRIFT_SPEED,
            cull_margin: DEFAULT_CULL_MARGIN,
            depth: GAMEPLAY_DEPTH,
        }
    }

    /// Overrides the downward drift speed in world units per second.
    #[must_use]
    pub const fn with_drift_speed(mut self, drift_speed: f32) -> Self {
        self.drift_speed = drift_speed;
        self
    }

    /// Overrides how far below the viewport drifting enemies are culled.
    #[must_use]
    pub const fn with_cull_margin(mut self, cull_margin: f32) -> Self {
        self.cull_margin = cull_margin;
        self
    }
}

/// Coarse description of the strategy driving an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocomotionKind {
    /// Straight downward drift.
    Drift,
    /// Stationary.
    Hold,
    /// Following a curve.
    Curve,
    /// Flying in along a curve.
    FlyIn,
    /// Traversing a route.
    Route,
}

#[derive(Clone, Debug)]
enum Locomotion {
    Drift,
    Hold,
    Curve(MotionController),
    FlyIn {
        controller: MotionController,
        then: Option<Arc<RouteDefinition>>,
    },
    Route(RouteController),
}

impl Locomotion {
    fn kind(&self) -> LocomotionKind {
        match self {
            Self::Drift => LocomotionKind::Drift,
            Self::Hold => LocomotionKind::Hold,
            Self::Curve(_) => LocomotionKind::Curve,
            Self::FlyIn { .. } => LocomotionKind::FlyIn,
            Self::Route(_) => LocomotionKind::Route,
        }
    }
}

/// Pure system that advances enemy motion and emits movement commands.
#[derive(Debug)]
pub struct Motion {
    config: Config,
    enemies: BTreeMap<EnemyId, Locomotion>,
}

impl Motion {
    /// Creates a new motion system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            enemies: BTreeMap::new(),
        }
    }

    /// Strategy currently driving an enemy.
    #[must_use]
    pub fn locomotion(&self, enemy: EnemyId) -> Option<LocomotionKind> {
        self.enemies.get(&enemy).map(Locomotion::kind)
    }

    /// Route state of an enemy driven by a route.
    #[must_use]
    pub fn route_status(&self, enemy: EnemyId) -> Option<RouteStatus> {
        match self.enemies.get(&enemy) {
            Some(Locomotion::Route(controller)) => Some(controller.status()),
            _ => None,
        }
    }

    /// Consumes world events and the enemy view to emit motion commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        enemies: &EnemyView,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            match event {
                Event::EnemySpawned {
                    enemy,
                    position,
                    motion,
                    ..
                } => {
                    let delegated = is_delegated(enemies, *enemy);
                    self.install(*enemy, *position, delegated, motion.clone(), projector, out);
                }
                Event::LocomotionChanged { enemy, motion } => {
                    if let Some(position) = enemies.position(*enemy) {
                        let delegated = is_delegated(enemies, *enemy);
                        self.install(*enemy, position, delegated, motion.clone(), projector, out);
                    }
                }
                Event::RoutePauseChanged { enemy, paused } => {
                    if let Some(Locomotion::Route(controller)) = self.enemies.get_mut(enemy) {
                        controller.set_paused(*paused);
                    }
                }
                Event::EnemyGone { enemy, .. } => {
                    let _ = self.enemies.remove(enemy);
                }
                Event::TimeAdvanced { dt } => {
                    self.advance(dt.as_secs_f32(), enemies, projector, out);
                }
                _ => {}
            }
        }
    }

    fn install(
        &mut self,
        enemy: EnemyId,
        position: Vec2,
        delegated: bool,
        plan: MotionPlan,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) {
        let locomotion = match plan {
            MotionPlan::Drift => Locomotion::Drift,
            MotionPlan::Hold => Locomotion::Hold,
            MotionPlan::Curve { curve, formation } => {
                match MotionController::new(curve, formation) {
                    Ok(controller) => Locomotion::Curve(controller),
                    Err(error) => {
                        warn!(enemy = enemy.get(), %error, "curve rejected, motion disabled");
                        Locomotion::Hold
                    }
                }
            }
            MotionPlan::FlyIn { curve, then } => match MotionController::new(curve, None) {
                Ok(controller) => Locomotion::FlyIn { controller, then },
                Err(error) => {
                    warn!(enemy = enemy.get(), %error, "fly-in curve rejected, holding position");
                    Locomotion::Hold
                }
            },
            MotionPlan::Route(route) => {
                self.start_route(enemy, route, position, delegated, projector, out)
            }
        };
        let _ = self.enemies.insert(enemy, locomotion);
    }

    fn start_route(
        &self,
        enemy: EnemyId,
        route: Arc<RouteDefinition>,
        position: Vec2,
        delegated: bool,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) -> Locomotion {
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        match controller.assign(route, position, projector, self.config.depth, &mut signals) {
            Ok(snapped) => {
                if snapped != position {
                    out.push(Command::MoveEnemy {
                        enemy,
                        position: snapped,
                    });
                }
                let follow_up = announce(enemy, delegated, &signals, out);
                follow_up.unwrap_or(Locomotion::Route(controller))
            }
            Err(error) => {
                warn!(enemy = enemy.get(), %error, "route rejected, holding position");
                Locomotion::Hold
            }
        }
    }

    fn advance(
        &mut self,
        dt: f32,
        enemies: &EnemyView,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) {
        let depth = self.config.depth;
        let mut replacements = Vec::new();
        let mut routes_to_start = Vec::new();

        for (&enemy, locomotion) in self.enemies.iter_mut() {
            let Some(snapshot) = enemies.get(enemy) else {
                continue;
            };
            let position = snapshot.position;
            let delegated = snapshot.health.is_none();

            match locomotion {
                Locomotion::Drift => {
                    let next = position - Vec2::new(0.0, self.config.drift_speed * dt);
                    if next.y < self.config.viewport.bottom() - self.config.cull_margin {
                        out.push(Command::DespawnEnemy {
                            enemy,
                            cause: DespawnCause::LeftArena,
                        });
                    } else {
                        out.push(Command::MoveEnemy {
                            enemy,
                            position: next,
                        });
                    }
                }
                Locomotion::Hold => {}
                Locomotion::Curve(controller) => match controller.advance(dt, projector, depth) {
                    MotionStep::Moved(next) => out.push(Command::MoveEnemy {
                        enemy,
                        position: next,
                    }),
                    MotionStep::Finished if delegated => {
                        replacements.push((enemy, Locomotion::Hold));
                    }
                    MotionStep::Finished => out.push(Command::DespawnEnemy {
                        enemy,
                        cause: DespawnCause::PathComplete,
                    }),
                    MotionStep::Idle => {}
                },
                Locomotion::FlyIn { controller, then } => {
                    match controller.advance(dt, projector, depth) {
                        MotionStep::Moved(next) => out.push(Command::MoveEnemy {
                            enemy,
                            position: next,
                        }),
                        MotionStep::Finished => {
                            let landing = skyraid_system_paths::curve::evaluate(
                                controller.curve(),
                                1.0,
                                projector,
                                depth,
                            );
                            out.push(Command::MoveEnemy {
                                enemy,
                                position: landing,
                            });
                            match then.take() {
                                Some(route) => {
                                    routes_to_start.push((enemy, route, landing, delegated));
                                }
                                None => replacements.push((enemy, Locomotion::Hold)),
                            }
                        }
                        MotionStep::Idle => {}
                    }
                }
                Locomotion::Route(controller) => {
                    let mut signals = Vec::new();
                    let next = controller.advance(position, dt, projector, depth, &mut signals);
                    if next != position {
                        out.push(Command::MoveEnemy {
                            enemy,
                            position: next,
                        });
                    }
                    if let Some(follow_up) = announce(enemy, delegated, &signals, out) {
                        replacements.push((enemy, follow_up));
                    }
                }
            }
        }

        for (enemy, route, landing, delegated) in routes_to_start {
            let locomotion = self.start_route(enemy, route, landing, delegated, projector, out);
            replacements.push((enemy, locomotion));
        }
        for (enemy, locomotion) in replacements {
            let _ = self.enemies.insert(enemy, locomotion);
        }
    }
}

fn is_delegated(enemies: &EnemyView, enemy: EnemyId) -> bool {
    enemies
        .get(enemy)
        .is_some_and(|snapshot| snapshot.health.is_none())
}

/// Emits commands for route signals, returning the strategy that replaces a finished route.
fn announce(
    enemy: EnemyId,
    delegated: bool,
    signals: &[RouteSignal],
    out: &mut Vec<Command>,
) -> Option<Locomotion> {
    let mut follow_up = None;
    for signal in signals {
        match *signal {
            RouteSignal::NodeReached { index, action } => out.push(Command::AnnounceRouteNode {
                enemy,
                index,
                action,
            }),
            RouteSignal::Finished(end) => {
                follow_up = Some(match end {
                    _ if delegated => Locomotion::Hold,
                    RouteEnd::ResumeDefaultMovement => Locomotion::Drift,
                    RouteEnd::StopHere => Locomotion::Hold,
                    RouteEnd::Despawn => {
                        out.push(Command::DespawnEnemy {
                            enemy,
                            cause: DespawnCause::RouteComplete,
                        });
                        Locomotion::Hold
                    }
                });
            }
        }
    }
    follow_up
}
