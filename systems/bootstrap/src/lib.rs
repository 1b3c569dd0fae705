#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bootstrap system that wires the world and every encounter system together.
//!
//! [`Encounter`] is the single tick driver: each step applies a tick to the
//! world and then lets motion, boss and wave systems react in that order,
//! applying each system's commands before the next system runs so position
//! writes are visible immediately. Rounds repeat until no new events remain.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use skyraid_core::{Command, ConfigError, EnemyId, EnemyTemplate, Event, TemplateId, Viewport};
use skyraid_system_boss::{Boss, BossConfig, BossPhase};
use skyraid_system_motion::Motion;
use skyraid_system_waves::{StageKind, WavePlan, WaveScheduler};
use skyraid_world::{apply, query, World};
use tracing::{info, warn};

const MAX_DISPATCH_ROUNDS: usize = 64;
const BOSS_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Default movement tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionSettings {
    /// Downward drift speed in world units per second.
    pub drift_speed: f32,
    /// Distance below the viewport at which drifting enemies are culled.
    pub cull_margin: f32,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            drift_speed: 2.5,
            cull_margin: 2.0,
        }
    }
}

/// Spacing of grid formation slots.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpacing {
    /// Horizontal distance between columns.
    pub column_spacing: f32,
    /// Vertical distance between rows.
    pub row_spacing: f32,
}

impl Default for GridSpacing {
    fn default() -> Self {
        Self {
            column_spacing: 1.6,
            row_spacing: 1.2,
        }
    }
}

/// Everything required to run an encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterConfig {
    /// Visible part of the gameplay plane.
    #[serde(default)]
    pub viewport: Viewport,
    /// Seed of every random stream in the encounter.
    #[serde(default)]
    pub seed: u64,
    /// Enemy templates known to the entity factory.
    pub templates: Vec<EnemyTemplate>,
    /// Waves to run.
    pub plan: WavePlan,
    /// Boss summoned once the wave plan finishes.
    #[serde(default)]
    pub boss: Option<BossConfig>,
    /// Default movement tuning.
    #[serde(default)]
    pub motion: MotionSettings,
    /// Grid formation spacing.
    #[serde(default)]
    pub grid: GridSpacing,
}

impl EncounterConfig {
    /// Creates a configuration with default viewport, tuning and no boss.
    #[must_use]
    pub fn new(templates: Vec<EnemyTemplate>, plan: WavePlan) -> Self {
        Self {
            viewport: Viewport::default(),
            seed: 0,
            templates,
            plan,
            boss: None,
            motion: MotionSettings::default(),
            grid: GridSpacing::default(),
        }
    }

    /// Reports every load time diagnostic of the encounter.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = self.plan.validate(&self.templates);
        if let Some(boss) = &self.boss {
            if !self.templates.iter().any(|template| template.id == boss.template) {
                errors.push(ConfigError::UnknownTemplate(boss.template).within("boss"));
            }
            errors.extend(boss.validate());
        }
        errors
    }
}

/// Snapshot of an encounter's progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncounterSummary {
    /// Ticks processed.
    pub ticks: u64,
    /// Wave being executed.
    pub wave_index: u32,
    /// Phase within the wave.
    pub phase_index: usize,
    /// Scheduler stage.
    pub stage: StageKind,
    /// Enemies spawned so far.
    pub spawned: u64,
    /// Enemies that left play so far.
    pub gone: u64,
    /// Enemies currently in play.
    pub active_enemies: usize,
    /// Hazards currently alive.
    pub hazards: usize,
    /// Phase of the living boss, if any.
    pub boss_phase: Option<BossPhase>,
    /// Whether a summoned boss has left play.
    pub boss_defeated: bool,
}

impl fmt::Display for EncounterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks: {}", self.ticks)?;
        writeln!(
            f,
            "wave: {} phase: {} ({:?})",
            self.wave_index, self.phase_index, self.stage
        )?;
        writeln!(
            f,
            "enemies: {} spawned, {} gone, {} active",
            self.spawned, self.gone, self.active_enemies
        )?;
        writeln!(f, "hazards: {}", self.hazards)?;
        match (self.boss_phase, self.boss_defeated) {
            (Some(phase), _) => write!(f, "boss: {phase:?}"),
            (None, true) => write!(f, "boss: defeated"),
            (None, false) => write!(f, "boss: absent"),
        }
    }
}

/// Authoritative world plus every system, advanced one tick at a time.
#[derive(Debug)]
pub struct Encounter {
    world: World,
    viewport: Viewport,
    motion: Motion,
    waves: WaveScheduler,
    boss: Option<Boss>,
    boss_template: Option<TemplateId>,
    boss_summoned: bool,
    boss_defeated: bool,
}

impl Encounter {
    /// Creates an encounter. Configuration problems should be reported with
    /// [`EncounterConfig::validate`] beforehand; invalid content degrades at runtime.
    #[must_use]
    pub fn new(config: EncounterConfig) -> Self {
        let viewport = config.viewport;
        let motion = skyraid_system_motion::Config::new(viewport)
            .with_drift_speed(config.motion.drift_speed)
            .with_cull_margin(config.motion.cull_margin);
        let spawner = skyraid_system_spawning::Config::new(viewport, config.seed)
            .with_grid_spacing(config.grid.column_spacing, config.grid.row_spacing);
        let boss_template = config.boss.as_ref().map(|boss| boss.template);
        let boss = config
            .boss
            .map(|boss| Boss::new(skyraid_system_boss::Config::new(boss, config.seed ^ BOSS_STREAM)));

        Self {
            world: World::new(),
            viewport,
            motion: Motion::new(motion),
            waves: WaveScheduler::new(skyraid_system_waves::Config::new(
                config.plan,
                config.templates,
                spawner,
            )),
            boss,
            boss_template,
            boss_summoned: false,
            boss_defeated: false,
        }
    }

    /// Advances the encounter by one tick.
    pub fn step(&mut self, dt: Duration) {
        self.submit(Command::Tick { dt });

        if self.waves.is_finished() && !self.boss_summoned {
            if let Some(boss) = &self.boss {
                let mut commands = Vec::new();
                boss.summon(Some(&self.viewport), &mut commands);
                self.boss_summoned = true;
                info!(tick = query::tick_index(&self.world), "boss summoned");
                for command in commands {
                    self.submit(command);
                }
            }
        }
    }

    /// Damages an enemy as if a player projectile hit it.
    pub fn damage(&mut self, enemy: EnemyId, amount: u32) {
        self.submit(Command::DamageEnemy { enemy, amount });
    }

    /// Damages the longest-lived active enemy, returning its identifier.
    pub fn damage_oldest(&mut self, amount: u32) -> Option<EnemyId> {
        let enemy = query::enemy_view(&self.world).iter().next()?.id;
        self.damage(enemy, amount);
        Some(enemy)
    }

    /// Authoritative world state.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Wave scheduler driving the encounter.
    #[must_use]
    pub fn waves(&self) -> &WaveScheduler {
        &self.waves
    }

    /// Boss system, if the encounter has a boss.
    #[must_use]
    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    /// Reports whether the waves ran out and any boss has left play.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.waves.is_finished() && (self.boss.is_none() || self.boss_defeated)
    }

    /// Progress snapshot.
    #[must_use]
    pub fn summary(&self) -> EncounterSummary {
        let status = self.waves.status();
        let totals = query::population_totals(&self.world);
        EncounterSummary {
            ticks: query::tick_index(&self.world),
            wave_index: status.wave_index,
            phase_index: status.phase_index,
            stage: status.stage,
            spawned: totals.spawned,
            gone: totals.gone,
            active_enemies: query::active_enemy_count(&self.world),
            hazards: query::hazard_count(&self.world),
            boss_phase: self
                .boss
                .as_ref()
                .and_then(|boss| boss.states().first().map(|(_, state)| state.phase)),
            boss_defeated: self.boss_defeated,
        }
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        self.dispatch(events);
    }

    fn dispatch(&mut self, mut events: Vec<Event>) {
        let mut rounds = 0;
        while !events.is_empty() {
            rounds += 1;
            if rounds > MAX_DISPATCH_ROUNDS {
                warn!(pending = events.len(), "dispatch did not settle, dropping events");
                return;
            }
            self.observe(&events);

            let mut next = Vec::new();
            let mut commands = Vec::new();

            let view = query::enemy_view(&self.world);
            self.motion
                .handle(&events, &view, Some(&self.viewport), &mut commands);
            self.flush(&mut commands, &mut next);

            if let Some(boss) = self.boss.as_mut() {
                let view = query::enemy_view(&self.world);
                boss.handle(&events, &view, Some(&self.viewport), &mut commands);
                for command in commands.drain(..) {
                    apply(&mut self.world, command, &mut next);
                }
            }

            self.waves.handle(&events, &mut commands);
            self.flush(&mut commands, &mut next);

            events = next;
        }
    }

    fn flush(&mut self, commands: &mut Vec<Command>, events: &mut Vec<Event>) {
        for command in commands.drain(..) {
            apply(&mut self.world, command, events);
        }
    }

    fn observe(&mut self, events: &[Event]) {
        let Some(boss_template) = self.boss_template else {
            return;
        };
        for event in events {
            if let Event::EnemyGone { template, .. } = event {
                if *template == boss_template {
                    self.boss_defeated = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyraid_system_waves::{Phase, SpawnStyle, Wave};

    fn grunt() -> EnemyTemplate {
        EnemyTemplate {
            id: TemplateId::new(1),
            max_health: 1,
            boss: false,
        }
    }

    #[test]
    fn boss_template_must_exist() {
        let mut config = EncounterConfig::new(vec![grunt()], WavePlan::new(Vec::new()));
        config.boss = Some(BossConfig::new(TemplateId::new(7)));
        let errors = config.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "boss: unknown enemy template TemplateId(7)"
        );
    }

    #[test]
    fn empty_plan_summons_boss_on_first_step() {
        let boss_template = EnemyTemplate {
            id: TemplateId::new(7),
            max_health: 500,
            boss: true,
        };
        let mut config = EncounterConfig::new(vec![boss_template], WavePlan::new(Vec::new()));
        config.boss = Some(BossConfig::new(TemplateId::new(7)));
        let mut encounter = Encounter::new(config);

        encounter.step(Duration::from_millis(16));

        let summary = encounter.summary();
        assert_eq!(summary.spawned, 1);
        assert_eq!(summary.boss_phase, Some(BossPhase::Phase1));
        assert!(!encounter.is_complete());

        let boss = encounter.damage_oldest(500);
        assert!(boss.is_some());
        assert!(encounter.is_complete());
        assert!(encounter.summary().boss_defeated);
    }

    #[test]
    fn attrition_clears_single_phase() {
        let phase = Phase {
            start_delay: 0.0,
            ..Phase::new(SpawnStyle::SingleRandomTop, TemplateId::new(1), 2)
        };
        let wave = Wave {
            start_delay: 0.0,
            ..Wave::new(vec![phase])
        };
        let mut encounter = Encounter::new(EncounterConfig::new(
            vec![grunt()],
            WavePlan::new(vec![wave]),
        ));

        for _ in 0..10 {
            encounter.step(Duration::from_millis(100));
            let _ = encounter.damage_oldest(1);
        }
        for _ in 0..20 {
            encounter.step(Duration::from_millis(100));
        }

        let summary = encounter.summary();
        assert_eq!(summary.spawned, 2);
        assert_eq!(summary.gone, 2);
        assert!(encounter.is_complete());
    }
}
