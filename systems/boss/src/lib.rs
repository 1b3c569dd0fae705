#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Boss system translating phase machine intents into world commands.
//!
//! Every spawned enemy built from the boss template gets its own
//! [`BossPhaseMachine`]. Hits forwarded by the world, route tags and time
//! advance the machines; the resulting attacks become hazards fired from the
//! boss's current position.

use std::{collections::BTreeMap, f32::consts::TAU, sync::Arc};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skyraid_core::{
    project, Command, DespawnCause, EnemyId, EnemyView, Event, HazardKind, MotionPlan,
    Projector, Side, Vec2, Vitality, GAMEPLAY_DEPTH,
};

mod config;
mod machine;

pub use config::{
    AttackCadence, BossAttacks, BossConfig, BossRoutes, Projectile, Punch, RadialVolley,
    Reaction, ReactionEntry, ReactionTable, RewindSettings,
};
pub use machine::{
    Attack, BossAction, BossPhase, BossPhaseMachine, BossState, PeriodicAttack,
};

const PUNCH_EDGE_OVERSHOOT: f32 = 0.05;
const PUNCH_HEIGHT: f32 = 0.5;

/// Configuration parameters required to construct the boss system.
#[derive(Clone, Debug)]
pub struct Config {
    boss: Arc<BossConfig>,
    rng_seed: u64,
}

impl Config {
    /// Creates a configuration for the provided boss and random seed.
    #[must_use]
    pub fn new(boss: BossConfig, rng_seed: u64) -> Self {
        Self {
            boss: Arc::new(boss),
            rng_seed,
        }
    }
}

/// Pure system that drives every boss instance.
#[derive(Debug)]
pub struct Boss {
    config: Arc<BossConfig>,
    rng: ChaCha8Rng,
    bosses: BTreeMap<EnemyId, BossPhaseMachine>,
}

impl Boss {
    /// Creates a boss system without active bosses.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config: config.boss,
            bosses: BTreeMap::new(),
        }
    }

    /// Tuning shared by every boss instance.
    #[must_use]
    pub fn config(&self) -> &BossConfig {
        &self.config
    }

    /// Requests a boss spawn at the configured entry point.
    pub fn summon(&self, projector: Option<&dyn Projector>, out: &mut Vec<Command>) {
        out.push(Command::SpawnEnemy {
            template: self.config.template,
            position: project(projector, self.config.entry_point, GAMEPLAY_DEPTH),
            vitality: Vitality::Delegated,
            motion: MotionPlan::Hold,
            tracking: None,
        });
    }

    /// State of the boss with the provided identifier.
    #[must_use]
    pub fn state(&self, enemy: EnemyId) -> Option<BossState> {
        self.bosses.get(&enemy).map(BossPhaseMachine::state)
    }

    /// State of every active boss, ordered by identifier.
    #[must_use]
    pub fn states(&self) -> Vec<(EnemyId, BossState)> {
        self.bosses
            .iter()
            .map(|(enemy, machine)| (*enemy, machine.state()))
            .collect()
    }

    /// Consumes world events and emits boss commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        view: &EnemyView,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) {
        for event in events {
            let mut actions = Vec::new();
            match event {
                Event::EnemySpawned {
                    enemy, template, ..
                } if *template == self.config.template => {
                    let seed = self.rng.gen();
                    let machine =
                        BossPhaseMachine::new(Arc::clone(&self.config), seed, &mut actions);
                    let _ = self.bosses.insert(*enemy, machine);
                    self.translate(*enemy, actions, view, projector, out);
                }
                Event::BossStruck { enemy, amount } => {
                    if let Some(machine) = self.bosses.get_mut(enemy) {
                        machine.take_hit(*amount, &mut actions);
                        self.translate(*enemy, actions, view, projector, out);
                    }
                }
                Event::RouteNodeReached { enemy, action, .. } => {
                    if let Some(machine) = self.bosses.get_mut(enemy) {
                        machine.on_route_action(*action, &mut actions);
                        self.translate(*enemy, actions, view, projector, out);
                    }
                }
                Event::EnemyGone { enemy, .. } => {
                    let _ = self.bosses.remove(enemy);
                }
                Event::TimeAdvanced { dt } => {
                    let dt = dt.as_secs_f32();
                    let enemies: Vec<EnemyId> = self.bosses.keys().copied().collect();
                    for enemy in enemies {
                        let mut actions = Vec::new();
                        if let Some(machine) = self.bosses.get_mut(&enemy) {
                            machine.update(dt, &mut actions);
                        }
                        self.translate(enemy, actions, view, projector, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn translate(
        &self,
        enemy: EnemyId,
        actions: Vec<BossAction>,
        view: &EnemyView,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) {
        for action in actions {
            match action {
                BossAction::FollowRoute(route) => out.push(Command::SetLocomotion {
                    enemy,
                    motion: MotionPlan::Route(route),
                }),
                BossAction::HoldPosition => out.push(Command::SetLocomotion {
                    enemy,
                    motion: MotionPlan::Hold,
                }),
                BossAction::PauseRoute(paused) => {
                    out.push(Command::SetRoutePaused { enemy, paused })
                }
                BossAction::ClearHazards => out.push(Command::ClearHazards),
                BossAction::Relocate(normalized) => out.push(Command::MoveEnemy {
                    enemy,
                    position: project(projector, normalized, GAMEPLAY_DEPTH),
                }),
                BossAction::Defeated => out.push(Command::DespawnEnemy {
                    enemy,
                    cause: DespawnCause::Destroyed,
                }),
                BossAction::Attack(attack) => {
                    if let Some(origin) = view.position(enemy) {
                        self.fire(attack, origin, projector, out);
                    }
                }
            }
        }
    }

    fn fire(
        &self,
        attack: Attack,
        origin: Vec2,
        projector: Option<&dyn Projector>,
        out: &mut Vec<Command>,
    ) {
        let attacks = &self.config.attacks;
        match attack {
            Attack::SoundWave => {
                if let Some(volley) = attacks.sound_wave {
                    radial(HazardKind::SoundWave, &volley, origin, out);
                }
            }
            Attack::VolumeBurst => {
                if let Some(volley) = attacks.volume_burst {
                    radial(HazardKind::VolumeBurst, &volley, origin, out);
                }
            }
            Attack::BassDrop => {
                if let Some(shockwave) = attacks.bass_drop {
                    straight_down(HazardKind::Shockwave, &shockwave, origin, out);
                }
            }
            Attack::Cassette => {
                if let Some(cassette) = attacks.cassette {
                    straight_down(HazardKind::Cassette, &cassette, origin, out);
                }
            }
            Attack::SpeakerPunch(side) => {
                if let Some(punch) = attacks.punch {
                    let edge = match side {
                        Side::Left => -PUNCH_EDGE_OVERSHOOT,
                        Side::Right => 1.0 + PUNCH_EDGE_OVERSHOOT,
                    };
                    let target = project(projector, Vec2::new(edge, PUNCH_HEIGHT), GAMEPLAY_DEPTH);
                    let reach_time = punch.reach_time.max(0.01);
                    out.push(Command::SpawnHazard {
                        kind: HazardKind::Punch,
                        origin,
                        velocity: (target - origin) / reach_time,
                        damage: punch.damage,
                        lifetime: reach_time,
                    });
                }
            }
        }
    }
}

fn radial(kind: HazardKind, volley: &RadialVolley, origin: Vec2, out: &mut Vec<Command>) {
    let count = volley.count.max(1);
    for index in 0..count {
        let angle = TAU * index as f32 / count as f32;
        out.push(Command::SpawnHazard {
            kind,
            origin,
            velocity: Vec2::from_angle(angle) * volley.speed,
            damage: volley.damage,
            lifetime: volley.lifetime,
        });
    }
}

fn straight_down(kind: HazardKind, projectile: &Projectile, origin: Vec2, out: &mut Vec<Command>) {
    out.push(Command::SpawnHazard {
        kind,
        origin,
        velocity: Vec2::new(0.0, -projectile.speed),
        damage: projectile.damage,
        lifetime: projectile.lifetime,
    });
}
