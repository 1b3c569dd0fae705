#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Skyraid encounters.
//!
//! The world owns every enemy and hazard. It never decides behaviour on its
//! own: systems describe mutations as [`Command`] values and the world answers
//! with [`Event`] values.

use skyraid_core::{
    Command, DespawnCause, EnemyId, Event, HazardId, HazardKind, Health, PopulationToken,
    PopulationTracker, TemplateId, Vec2, Vitality,
};

/// Represents the authoritative Skyraid world state.
#[derive(Debug, Default)]
pub struct World {
    enemies: Vec<Enemy>,
    hazards: Vec<Hazard>,
    next_enemy_id: u32,
    next_hazard_id: u32,
    tick_index: u64,
    spawned_total: u64,
    gone_total: u64,
}

impl World {
    /// Creates an empty world ready for simulation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn enemy_mut(&mut self, enemy: EnemyId) -> Option<&mut Enemy> {
        self.enemies
            .iter_mut()
            .find(|candidate| candidate.id == enemy)
    }

    fn active_enemy(&self, enemy: EnemyId) -> Option<&Enemy> {
        self.enemies
            .iter()
            .find(|candidate| candidate.id == enemy && candidate.active)
    }

    /// Deactivates an enemy and reports it gone if this is the first terminal signal.
    fn deactivate(&mut self, enemy: EnemyId, cause: DespawnCause, out_events: &mut Vec<Event>) {
        let Some(entry) = self.enemy_mut(enemy) else {
            return;
        };
        entry.active = false;
        if !entry.tracker.notify_gone() {
            return;
        }

        let template = entry.template;
        let tracking = entry.tracker.token();
        self.gone_total = self.gone_total.saturating_add(1);
        out_events.push(Event::EnemyGone {
            enemy,
            template,
            tracking,
            cause,
        });
    }

    fn advance_hazards(&mut self, seconds: f32) {
        for hazard in &mut self.hazards {
            hazard.position += hazard.velocity * seconds;
            hazard.remaining -= seconds;
        }
        self.hazards.retain(|hazard| hazard.remaining > 0.0);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            world.tick_index = world.tick_index.saturating_add(1);
            world.enemies.retain(|enemy| enemy.active);
            world.advance_hazards(dt.as_secs_f32());
            out_events.push(Event::TimeAdvanced { dt });
        }
        Command::SpawnEnemy {
            template,
            position,
            vitality,
            motion,
            tracking,
        } => {
            let enemy = EnemyId::new(world.next_enemy_id);
            world.next_enemy_id = world.next_enemy_id.wrapping_add(1);
            world.spawned_total = world.spawned_total.saturating_add(1);
            world
                .enemies
                .push(Enemy::spawn(enemy, template, position, vitality, tracking));
            out_events.push(Event::EnemySpawned {
                enemy,
                template,
                position,
                motion,
                tracking,
            });
        }
        Command::MoveEnemy { enemy, position } => {
            if let Some(entry) = world.enemy_mut(enemy).filter(|entry| entry.active) {
                entry.position = position;
            }
        }
        Command::DespawnEnemy { enemy, cause } => {
            world.deactivate(enemy, cause, out_events);
        }
        Command::DamageEnemy { enemy, amount } => {
            let Some(entry) = world.enemy_mut(enemy).filter(|entry| entry.active) else {
                return;
            };
            match &mut entry.health {
                Some(health) => {
                    health.current = health.current.saturating_sub(amount);
                    let remaining = health.current;
                    out_events.push(Event::EnemyDamaged {
                        enemy,
                        health: remaining,
                        max_health: health.max,
                    });
                    if remaining == 0 {
                        world.deactivate(enemy, DespawnCause::Destroyed, out_events);
                    }
                }
                None => out_events.push(Event::BossStruck { enemy, amount }),
            }
        }
        Command::SetLocomotion { enemy, motion } => {
            if world.active_enemy(enemy).is_some() {
                out_events.push(Event::LocomotionChanged { enemy, motion });
            }
        }
        Command::SetRoutePaused { enemy, paused } => {
            if world.active_enemy(enemy).is_some() {
                out_events.push(Event::RoutePauseChanged { enemy, paused });
            }
        }
        Command::AnnounceRouteNode {
            enemy,
            index,
            action,
        } => {
            if world.active_enemy(enemy).is_some() {
                out_events.push(Event::RouteNodeReached {
                    enemy,
                    index,
                    action,
                });
            }
        }
        Command::SpawnHazard {
            kind,
            origin,
            velocity,
            damage,
            lifetime,
        } => {
            let hazard = HazardId::new(world.next_hazard_id);
            world.next_hazard_id = world.next_hazard_id.wrapping_add(1);
            world.hazards.push(Hazard {
                id: hazard,
                kind,
                position: origin,
                velocity,
                damage,
                remaining: lifetime,
            });
            out_events.push(Event::HazardSpawned { hazard, kind });
        }
        Command::ClearHazards => {
            let count = world.hazards.len();
            world.hazards.clear();
            out_events.push(Event::HazardsCleared { count });
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::World;
    use skyraid_core::{EnemyId, EnemySnapshot, EnemyView, HazardId, HazardKind, Vec2};

    /// Captures a read-only view of every active enemy.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .filter(|enemy| enemy.active)
                .map(super::Enemy::snapshot)
                .collect(),
        )
    }

    /// Snapshot of a single active enemy.
    #[must_use]
    pub fn enemy(world: &World, enemy: EnemyId) -> Option<EnemySnapshot> {
        world.active_enemy(enemy).map(super::Enemy::snapshot)
    }

    /// Number of enemies currently in play.
    #[must_use]
    pub fn active_enemy_count(world: &World) -> usize {
        world.enemies.iter().filter(|enemy| enemy.active).count()
    }

    /// Captures every live hazard in creation order.
    #[must_use]
    pub fn hazards(world: &World) -> Vec<HazardSnapshot> {
        world
            .hazards
            .iter()
            .map(|hazard| HazardSnapshot {
                id: hazard.id,
                kind: hazard.kind,
                position: hazard.position,
                damage: hazard.damage,
                remaining: hazard.remaining,
            })
            .collect()
    }

    /// Number of hazards currently alive.
    #[must_use]
    pub fn hazard_count(world: &World) -> usize {
        world.hazards.len()
    }

    /// Number of ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Lifetime spawn and removal totals.
    #[must_use]
    pub fn population_totals(world: &World) -> PopulationTotals {
        PopulationTotals {
            spawned: world.spawned_total,
            gone: world.gone_total,
        }
    }

    /// Immutable representation of a single hazard.
    #[derive(Clone, Debug, PartialEq)]
    pub struct HazardSnapshot {
        /// Unique identifier assigned to the hazard.
        pub id: HazardId,
        /// Attack that produced the hazard.
        pub kind: HazardKind,
        /// Current world position.
        pub position: Vec2,
        /// Damage dealt on contact.
        pub damage: u32,
        /// Seconds left before the hazard expires.
        pub remaining: f32,
    }

    /// Counts of enemies that entered and left play over the world's lifetime.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct PopulationTotals {
        /// Enemies spawned.
        pub spawned: u64,
        /// Enemies that left play.
        pub gone: u64,
    }
}

#[derive(Clone, Debug)]
struct Enemy {
    id: EnemyId,
    template: TemplateId,
    position: Vec2,
    health: Option<Health>,
    tracker: PopulationTracker,
    active: bool,
}

impl Enemy {
    fn spawn(
        id: EnemyId,
        template: TemplateId,
        position: Vec2,
        vitality: Vitality,
        tracking: Option<PopulationToken>,
    ) -> Self {
        let health = match vitality {
            Vitality::Health(max) => Some(Health { current: max, max }),
            Vitality::Delegated => None,
        };
        Self {
            id,
            template,
            position,
            health,
            tracker: PopulationTracker::new(tracking),
            active: true,
        }
    }

    fn snapshot(&self) -> skyraid_core::EnemySnapshot {
        skyraid_core::EnemySnapshot {
            id: self.id,
            template: self.template,
            position: self.position,
            health: self.health,
        }
    }
}

#[derive(Clone, Debug)]
struct Hazard {
    id: HazardId,
    kind: HazardKind,
    position: Vec2,
    velocity: Vec2,
    damage: u32,
    remaining: f32,
}
