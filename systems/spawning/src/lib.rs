#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic population spawner responsible for emitting enemy spawn commands.
//!
//! The spawner knows where and how enemies enter the arena: a single enemy at
//! a random x above the top edge, a grid formation whose members fly in along
//! arcs from alternating sides, or a path formation whose members share a
//! curve. Staggered members are queued and released as time advances.

use std::{collections::VecDeque, sync::Arc};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use skyraid_core::{
    Command, CurveDefinition, CurveKind, FormationDefinition, FormationLayout, FormationSlot,
    MotionPlan, PopulationToken, RouteDefinition, TemplateId, Vec2, Viewport, Vitality,
    GAMEPLAY_DEPTH,
};
use skyraid_system_paths::{curve, formation};
use tracing::warn;

const MIN_SPAWN_HALF_RANGE: f32 = 0.1;
const FILE_DROP_PER_MEMBER: f32 = 0.15;

/// Timing and arc shape used by grid formation fly-ins.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormationTiming {
    /// Seconds each member needs to reach its slot.
    pub fly_in_duration: f32,
    /// Horizontal pull of the arc control point towards the screen centre.
    pub arc_side_offset: f32,
    /// Downward pull of the arc control point.
    pub arc_down_amount: f32,
    /// Delay between consecutive members.
    pub spawn_stagger: f32,
    /// Extra delay after the last member of a row.
    pub row_stagger_bonus: f32,
}

impl Default for FormationTiming {
    fn default() -> Self {
        Self {
            fly_in_duration: 1.2,
            arc_side_offset: 2.0,
            arc_down_amount: 4.0,
            spawn_stagger: 0.12,
            row_stagger_bonus: 0.25,
        }
    }
}

/// Configuration parameters required to construct the spawner.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    viewport: Viewport,
    rng_seed: u64,
    side_margin: f32,
    top_extra: f32,
    enemy_half_width: f32,
    column_spacing: f32,
    row_spacing: f32,
    formation_top_margin: f32,
    entry_outside_x: f32,
    entry_y_extra: f32,
}

impl Config {
    /// Creates a configuration for the provided viewport and random seed.
    #[must_use]
    pub const fn new(viewport: Viewport, rng_seed: u64) -> Self {
        Self {
            viewport,
            rng_seed,
            side_margin: 0.25,
            top_extra: 1.5,
            enemy_half_width: 0.5,
            column_spacing: 1.6,
            row_spacing: 1.2,
            formation_top_margin: 0.75,
            entry_outside_x: 1.2,
            entry_y_extra: 0.5,
        }
    }

    /// Overrides the distance between grid formation columns and rows.
    #[must_use]
    pub const fn with_grid_spacing(mut self, column_spacing: f32, row_spacing: f32) -> Self {
        self.column_spacing = column_spacing;
        self.row_spacing = row_spacing;
        self
    }
}

/// Everything a spawn needs besides its position and motion.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnRequest {
    /// Template handed to the entity factory.
    pub template: TemplateId,
    /// Damage model of the spawned enemies.
    pub vitality: Vitality,
    /// Population handle of the requesting phase.
    pub tracking: Option<PopulationToken>,
    /// Route assigned to every enemy of the request, if any.
    pub route: Option<Arc<RouteDefinition>>,
}

#[derive(Clone, Debug)]
struct StagedSpawn {
    wait: f32,
    command: Command,
}

/// Emits spawn commands, queueing staggered formation members.
#[derive(Debug)]
pub struct PopulationSpawner {
    config: Config,
    rng: ChaCha8Rng,
    staged: VecDeque<StagedSpawn>,
    waited: f32,
}

impl PopulationSpawner {
    /// Creates a spawner using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            config,
            staged: VecDeque::new(),
            waited: 0.0,
        }
    }

    /// Viewport spawn positions are computed against.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    /// Spawns one enemy at a random x above the top of the screen.
    ///
    /// The enemy follows the request's route, or drifts down without one.
    pub fn spawn_single_top(&mut self, request: &SpawnRequest, out: &mut Vec<Command>) {
        let viewport = self.config.viewport;
        let half_range = (viewport.half_width()
            - self.config.side_margin
            - self.config.enemy_half_width)
            .max(MIN_SPAWN_HALF_RANGE);
        let x = viewport.center.x + self.rng.gen_range(-half_range..half_range);
        let position = Vec2::new(x, viewport.top() + self.config.top_extra);

        let motion = match &request.route {
            Some(route) => MotionPlan::Route(Arc::clone(route)),
            None => MotionPlan::Drift,
        };
        out.push(spawn_command(request, position, motion));
    }

    /// Queues a grid formation of `count` members and releases the first one.
    ///
    /// Rows hold `columns` members and the last row holds the remainder.
    /// Returns how many members were spawned immediately.
    pub fn stage_grid_formation(
        &mut self,
        request: &SpawnRequest,
        count: u32,
        columns: u32,
        timing: &FormationTiming,
        out: &mut Vec<Command>,
    ) -> usize {
        let columns = columns.max(1);
        let viewport = self.config.viewport;
        let layout = FormationLayout::Grid {
            columns,
            column_spacing: self.config.column_spacing,
            row_spacing: self.config.row_spacing,
        };
        let centring = Vec2::new((columns - 1) as f32 * self.config.column_spacing * 0.5, 0.0);
        let anchor = Vec2::new(
            viewport.center.x,
            viewport.top() - self.config.formation_top_margin,
        );
        let entry_x = viewport.half_width() + self.config.entry_outside_x;

        let mut wait = 0.0;
        for index in 0..count as usize {
            let slot = anchor + formation::layout_offset(&layout, count as usize, index) - centring;
            let from_left = index % 2 == 0;
            let side = if from_left { -1.0 } else { 1.0 };
            let start = Vec2::new(
                viewport.center.x + side * entry_x,
                viewport.top() + self.config.entry_y_extra - index as f32 * FILE_DROP_PER_MEMBER,
            );
            let control = start + Vec2::new(-side * timing.arc_side_offset, -timing.arc_down_amount);
            let fly_in = Arc::new(CurveDefinition::through(
                CurveKind::QuadraticBezier,
                [start, control, slot],
                timing.fly_in_duration,
            ));

            let motion = MotionPlan::FlyIn {
                curve: fly_in,
                then: request.route.clone(),
            };
            self.staged.push_back(StagedSpawn {
                wait,
                command: spawn_command(request, start, motion),
            });

            let last_in_row = index % columns as usize == columns as usize - 1;
            wait = timing.spawn_stagger.max(0.0)
                + if last_in_row {
                    timing.row_stagger_bonus.max(0.0)
                } else {
                    0.0
                };
        }

        self.release(0.0, out)
    }

    /// Queues every member of a path formation and releases the first one.
    ///
    /// Members follow `path` with their formation offsets, `stagger` seconds
    /// apart. Returns how many members were spawned immediately, or zero when
    /// the formation or the path is invalid.
    pub fn stage_path_formation(
        &mut self,
        request: &SpawnRequest,
        definition: &Arc<FormationDefinition>,
        path: &Arc<CurveDefinition>,
        stagger: f32,
        out: &mut Vec<Command>,
    ) -> usize {
        if let Err(error) = definition.validate().and_then(|()| path.validate()) {
            warn!(%error, "path formation skipped");
            return 0;
        }

        let start = curve::evaluate(path, 0.0, Some(&self.config.viewport), GAMEPLAY_DEPTH);
        for index in 0..definition.members as usize {
            let position = start + formation::offset(definition, index);
            let motion = MotionPlan::Curve {
                curve: Arc::clone(path),
                formation: Some(FormationSlot {
                    formation: Arc::clone(definition),
                    index,
                }),
            };
            self.staged.push_back(StagedSpawn {
                wait: if index == 0 { 0.0 } else { stagger.max(0.0) },
                command: spawn_command(request, position, motion),
            });
        }

        self.release(0.0, out)
    }

    /// Releases staged members whose delay elapsed. Returns how many spawned.
    pub fn advance(&mut self, dt: f32, out: &mut Vec<Command>) -> usize {
        self.release(dt, out)
    }

    /// Drops every staged member that has not spawned yet, returning how many were dropped.
    pub fn cancel_staged(&mut self) -> usize {
        let dropped = self.staged.len();
        self.staged.clear();
        self.waited = 0.0;
        dropped
    }

    /// Number of staged members waiting for release.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    fn release(&mut self, dt: f32, out: &mut Vec<Command>) -> usize {
        if self.staged.is_empty() {
            self.waited = 0.0;
            return 0;
        }

        self.waited += dt;
        let mut released = 0;
        while let Some(next) = self.staged.front() {
            if next.wait > self.waited {
                break;
            }
            self.waited -= next.wait;
            if let Some(staged) = self.staged.pop_front() {
                out.push(staged.command);
                released += 1;
            }
        }
        if self.staged.is_empty() {
            self.waited = 0.0;
        }
        released
    }
}

fn spawn_command(request: &SpawnRequest, position: Vec2, motion: MotionPlan) -> Command {
    Command::SpawnEnemy {
        template: request.template,
        position,
        vitality: request.vitality,
        motion,
        tracking: request.tracking,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> SpawnRequest {
        SpawnRequest {
            template: TemplateId::new(3),
            vitality: Vitality::Health(3),
            tracking: Some(PopulationToken::new(1)),
            route: None,
        }
    }

    fn spawner() -> PopulationSpawner {
        PopulationSpawner::new(Config::new(Viewport::default(), 7))
    }

    #[test]
    fn single_top_spawns_above_screen_within_margins() {
        let mut spawner = spawner();
        let viewport = spawner.viewport();
        let mut out = Vec::new();
        for _ in 0..50 {
            spawner.spawn_single_top(&request(), &mut out);
        }

        let limit = viewport.half_width() - 0.75;
        for command in &out {
            match command {
                Command::SpawnEnemy {
                    position, motion, ..
                } => {
                    assert!(position.x.abs() <= limit);
                    assert_eq!(position.y, viewport.top() + 1.5);
                    assert_eq!(*motion, MotionPlan::Drift);
                }
                other => panic!("unexpected command {other:?}"),
            }
        }
    }

    #[test]
    fn grid_members_are_released_with_row_pauses() {
        let mut spawner = spawner();
        let timing = FormationTiming {
            spawn_stagger: 0.5,
            row_stagger_bonus: 0.25,
            ..FormationTiming::default()
        };
        let mut out = Vec::new();

        assert_eq!(spawner.stage_grid_formation(&request(), 3, 2, &timing, &mut out), 1);
        assert_eq!(spawner.pending(), 2);
        assert_eq!(spawner.advance(0.5, &mut out), 1);
        assert_eq!(spawner.advance(0.5, &mut out), 0);
        assert_eq!(spawner.advance(0.25, &mut out), 1);
        assert_eq!(spawner.pending(), 0);
    }

    #[test]
    fn cancelled_members_never_spawn() {
        let mut spawner = spawner();
        let mut out = Vec::new();
        let _ = spawner.stage_grid_formation(&request(), 4, 2, &FormationTiming::default(), &mut out);
        assert_eq!(spawner.cancel_staged(), 3);
        assert_eq!(spawner.advance(10.0, &mut out), 0);
        assert_eq!(out.len(), 1);
    }
}
