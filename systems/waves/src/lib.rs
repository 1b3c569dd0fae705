#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduler driving phases of enemy spawns.
//!
//! The scheduler walks a [`WavePlan`] one tick at a time: wave start delay,
//! then for every phase a start delay, spawning and an optional wait until the
//! phase's live population reaches zero, then the delay between waves.
//! Entering a delay ends the current tick, so a zero delay waits exactly one
//! tick. Spawn and clear waits are bounded by timeouts that force progress.

use skyraid_core::{
    timer::Countdown, Command, EnemyTemplate, Event, PopulationToken, Vitality,
};
use skyraid_system_spawning::{PopulationSpawner, SpawnRequest};
use tracing::{debug, info, warn};

mod plan;

pub use plan::{DifficultyScaling, Phase, SpawnStyle, Wave, WavePlan};

/// Configuration parameters required to construct the wave scheduler.
#[derive(Clone, Debug)]
pub struct Config {
    plan: WavePlan,
    templates: Vec<EnemyTemplate>,
    spawner: skyraid_system_spawning::Config,
}

impl Config {
    /// Creates a configuration from a plan, the template catalog and spawner settings.
    #[must_use]
    pub fn new(
        plan: WavePlan,
        templates: Vec<EnemyTemplate>,
        spawner: skyraid_system_spawning::Config,
    ) -> Self {
        Self {
            plan,
            templates,
            spawner,
        }
    }
}

/// Live population counters of the phase currently executing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseCounters {
    token: PopulationToken,
    alive: u32,
    spawned: u32,
    target: u32,
    spawning_complete: bool,
}

impl PhaseCounters {
    fn start(token: PopulationToken, target: u32) -> Self {
        Self {
            token,
            alive: 0,
            spawned: 0,
            target,
            spawning_complete: false,
        }
    }

    /// Token attached to every enemy spawned by the phase.
    #[must_use]
    pub const fn token(&self) -> PopulationToken {
        self.token
    }

    /// Enemies of the phase still in play.
    #[must_use]
    pub const fn alive(&self) -> u32 {
        self.alive
    }

    /// Enemies spawned so far by the phase.
    #[must_use]
    pub const fn spawned(&self) -> u32 {
        self.spawned
    }

    /// Enemies the phase intends to spawn.
    #[must_use]
    pub const fn target(&self) -> u32 {
        self.target
    }

    /// Reports whether the phase finished spawning.
    #[must_use]
    pub const fn spawning_complete(&self) -> bool {
        self.spawning_complete
    }

    /// Clear-gating predicate: spawning finished and nobody is left alive.
    #[must_use]
    pub const fn is_clear(&self) -> bool {
        self.spawning_complete && self.alive == 0
    }

    fn record_spawns(&mut self, count: usize) {
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        self.alive = self.alive.saturating_add(count);
        self.spawned = self.spawned.saturating_add(count);
    }
}

/// Coarse stage of the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    /// Waiting before the first phase of a wave.
    WaveStartDelay,
    /// Waiting before a phase starts spawning.
    PhaseStartDelay,
    /// Spawning the phase's enemies.
    Spawning,
    /// Waiting until the phase's enemies are gone.
    WaitForClear,
    /// Waiting between two waves.
    InterWaveDelay,
    /// The plan ran out.
    Finished,
}

/// Snapshot of the scheduler's progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerStatus {
    /// Index of the wave being executed, growing past the plan when looping.
    pub wave_index: u32,
    /// Index of the phase within the wave.
    pub phase_index: usize,
    /// Current stage.
    pub stage: StageKind,
    /// Counters of the current phase, if a phase has started.
    pub counters: Option<PhaseCounters>,
}

#[derive(Clone, Debug)]
enum Stage {
    WaveStartDelay(Countdown),
    PhaseStartDelay(Countdown),
    Spawning(Spawning),
    WaitForClear(Countdown),
    InterWaveDelay(Countdown),
    Finished,
}

#[derive(Clone, Debug)]
enum Spawning {
    Single {
        request: SpawnRequest,
        remaining: u32,
        until_next: f32,
        interval: f32,
    },
    Staged {
        timeout: Countdown,
    },
}

/// Pure system that schedules waves and phases and emits spawn commands.
#[derive(Debug)]
pub struct WaveScheduler {
    plan: WavePlan,
    templates: Vec<EnemyTemplate>,
    spawner: PopulationSpawner,
    stage: Stage,
    wave_index: u32,
    phase_index: usize,
    counters: Option<PhaseCounters>,
    next_token: u64,
}

impl WaveScheduler {
    /// Creates a scheduler waiting for the start delay of the first wave.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let stage = match config.plan.wave(0) {
            Some(wave) => {
                info!(wave = 0, name = %wave.name, phases = wave.phases.len(), "wave starting");
                Stage::WaveStartDelay(Countdown::new(wave.start_delay))
            }
            None => Stage::Finished,
        };
        Self {
            plan: config.plan,
            templates: config.templates,
            spawner: PopulationSpawner::new(config.spawner),
            stage,
            wave_index: 0,
            phase_index: 0,
            counters: None,
            next_token: 0,
        }
    }

    /// Current progress of the scheduler.
    #[must_use]
    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            wave_index: self.wave_index,
            phase_index: self.phase_index,
            stage: match self.stage {
                Stage::WaveStartDelay(_) => StageKind::WaveStartDelay,
                Stage::PhaseStartDelay(_) => StageKind::PhaseStartDelay,
                Stage::Spawning(_) => StageKind::Spawning,
                Stage::WaitForClear(_) => StageKind::WaitForClear,
                Stage::InterWaveDelay(_) => StageKind::InterWaveDelay,
                Stage::Finished => StageKind::Finished,
            },
            counters: self.counters,
        }
    }

    /// Reports whether the plan ran out.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished)
    }

    /// Consumes world events and emits spawn commands.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::EnemyGone {
                    tracking: Some(token),
                    ..
                } => self.notify_gone(*token),
                Event::TimeAdvanced { dt } => self.run(dt.as_secs_f32(), out),
                _ => {}
            }
        }
    }

    fn notify_gone(&mut self, token: PopulationToken) {
        if let Some(counters) = self.counters.as_mut().filter(|counters| counters.token == token) {
            counters.alive = counters.alive.saturating_sub(1);
        }
    }

    fn run(&mut self, dt: f32, out: &mut Vec<Command>) {
        let mut dt = dt;
        while self.step(dt, out) {
            dt = 0.0;
        }
    }

    /// Advances the current stage. Returns `true` when the next stage should run in the same tick.
    fn step(&mut self, dt: f32, out: &mut Vec<Command>) -> bool {
        match &mut self.stage {
            Stage::WaveStartDelay(delay) => {
                if delay.tick(dt) {
                    self.phase_index = 0;
                    self.enter_phase_or_interval();
                }
                false
            }
            Stage::PhaseStartDelay(delay) => {
                if !delay.tick(dt) {
                    return false;
                }
                self.begin_phase(out);
                true
            }
            Stage::Spawning(_) => {
                if self.continue_spawning(dt, out) {
                    self.finish_spawning()
                } else {
                    false
                }
            }
            Stage::WaitForClear(timeout) => {
                let clear = self.counters.map_or(true, |counters| counters.is_clear());
                if clear {
                    debug!(wave = self.wave_index, phase = self.phase_index, "phase cleared");
                } else if timeout.tick(dt) {
                    warn!(
                        wave = self.wave_index,
                        phase = self.phase_index,
                        alive = self.counters.map_or(0, |counters| counters.alive),
                        "clear timeout elapsed, forcing next phase"
                    );
                    if let Some(counters) = self.counters.as_mut() {
                        counters.alive = 0;
                    }
                } else {
                    return false;
                }
                self.end_phase();
                false
            }
            Stage::InterWaveDelay(delay) => {
                if delay.tick(dt) {
                    self.next_wave();
                }
                false
            }
            Stage::Finished => false,
        }
    }

    fn enter_phase_or_interval(&mut self) {
        let start_delay = self
            .plan
            .wave(self.wave_index)
            .and_then(|wave| wave.phases.get(self.phase_index))
            .map(|phase| phase.start_delay);
        self.stage = match start_delay {
            Some(delay) => Stage::PhaseStartDelay(Countdown::new(delay)),
            None => {
                info!(wave = self.wave_index, "wave finished");
                Stage::InterWaveDelay(Countdown::new(self.plan.effective_between_waves_delay()))
            }
        };
    }

    fn begin_phase(&mut self, out: &mut Vec<Command>) {
        let Some(phase) = self
            .plan
            .wave(self.wave_index)
            .and_then(|wave| wave.phases.get(self.phase_index))
            .cloned()
        else {
            self.enter_phase_or_interval();
            return;
        };

        let token = PopulationToken::new(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        let scaling = self.plan.scaling;
        let target = match &phase.style {
            SpawnStyle::PathFormation { formation, .. } => formation.members,
            _ => scaling.scaled_count(phase.count, self.wave_index),
        };
        let interval = scaling.scaled_interval(phase.spawn_interval, self.wave_index);
        self.counters = Some(PhaseCounters::start(token, target));
        let _ = self.spawner.cancel_staged();

        debug!(
            wave = self.wave_index,
            phase = self.phase_index,
            name = %phase.name,
            target,
            interval,
            wait_for_clear = phase.wait_for_clear,
            "phase starting"
        );

        let Some(vitality) = self.vitality(&phase) else {
            warn!(
                wave = self.wave_index,
                phase = self.phase_index,
                template = phase.template.get(),
                "unknown enemy template, phase skipped"
            );
            self.counters = Some(PhaseCounters::start(token, 0));
            self.stage = Stage::Spawning(Spawning::Staged {
                timeout: Countdown::new(phase.effective_spawn_timeout()),
            });
            return;
        };

        let request = SpawnRequest {
            template: phase.template,
            vitality,
            tracking: Some(token),
            route: phase.route.clone(),
        };
        let spawning = match &phase.style {
            SpawnStyle::SingleRandomTop => Spawning::Single {
                request,
                remaining: target,
                until_next: 0.0,
                interval,
            },
            SpawnStyle::FormationGrid { columns, timing } => {
                let timing = timing.unwrap_or(self.plan.formation_timing);
                let released =
                    self.spawner
                        .stage_grid_formation(&request, target, *columns, &timing, out);
                self.record_spawns(released);
                Spawning::Staged {
                    timeout: Countdown::new(phase.effective_spawn_timeout()),
                }
            }
            SpawnStyle::PathFormation { formation, path } => {
                let released =
                    self.spawner
                        .stage_path_formation(&request, formation, path, interval, out);
                if released == 0 && self.spawner.pending() == 0 {
                    self.counters = Some(PhaseCounters::start(token, 0));
                }
                self.record_spawns(released);
                Spawning::Staged {
                    timeout: Countdown::new(phase.effective_spawn_timeout()),
                }
            }
        };
        self.stage = Stage::Spawning(spawning);
    }

    /// Spawns whatever is due. Returns `true` once the phase finished spawning.
    fn continue_spawning(&mut self, dt: f32, out: &mut Vec<Command>) -> bool {
        let target_reached = |counters: Option<PhaseCounters>| {
            counters.map_or(true, |counters| counters.spawned >= counters.target)
        };

        let Stage::Spawning(spawning) = &mut self.stage else {
            return true;
        };
        match spawning {
            Spawning::Single {
                request,
                remaining,
                until_next,
                interval,
            } => {
                let mut spawned = 0;
                if *interval <= 0.0 {
                    if *remaining > 0 {
                        self.spawner.spawn_single_top(request, out);
                        *remaining -= 1;
                        spawned += 1;
                    }
                } else {
                    *until_next -= dt;
                    while *until_next <= 0.0 && *remaining > 0 {
                        self.spawner.spawn_single_top(request, out);
                        *remaining -= 1;
                        *until_next += *interval;
                        spawned += 1;
                    }
                }
                let done = *remaining == 0;
                self.record_spawns(spawned);
                done
            }
            Spawning::Staged { timeout } => {
                let expired = timeout.tick(dt);
                let released = self.spawner.advance(dt, out);
                self.record_spawns(released);
                if target_reached(self.counters) {
                    return true;
                }
                if expired {
                    let dropped = self.spawner.cancel_staged();
                    warn!(
                        wave = self.wave_index,
                        phase = self.phase_index,
                        dropped,
                        "spawn timeout elapsed, forcing spawning complete"
                    );
                    return true;
                }
                false
            }
        }
    }

    /// Marks spawning complete and moves on. Returns `true` when the next stage runs this tick.
    fn finish_spawning(&mut self) -> bool {
        if let Some(counters) = self.counters.as_mut() {
            counters.spawning_complete = true;
        }
        let phase = self
            .plan
            .wave(self.wave_index)
            .and_then(|wave| wave.phases.get(self.phase_index));
        match phase {
            Some(phase) if phase.wait_for_clear => {
                self.stage = Stage::WaitForClear(Countdown::new(phase.effective_clear_timeout()));
                true
            }
            _ => {
                self.end_phase();
                false
            }
        }
    }

    fn end_phase(&mut self) {
        self.phase_index += 1;
        self.enter_phase_or_interval();
    }

    fn next_wave(&mut self) {
        let last_index = self.plan.waves.len().saturating_sub(1);
        if !self.plan.loop_forever && self.wave_index as usize >= last_index {
            info!(waves = self.plan.waves.len(), "wave plan complete");
            self.stage = Stage::Finished;
            return;
        }

        self.wave_index = self.wave_index.saturating_add(1);
        self.phase_index = 0;
        self.stage = match self.plan.wave(self.wave_index) {
            Some(wave) => {
                info!(
                    wave = self.wave_index,
                    name = %wave.name,
                    phases = wave.phases.len(),
                    "wave starting"
                );
                Stage::WaveStartDelay(Countdown::new(wave.start_delay))
            }
            None => Stage::Finished,
        };
    }

    fn vitality(&self, phase: &Phase) -> Option<Vitality> {
        self.templates
            .iter()
            .find(|template| template.id == phase.template)
            .map(EnemyTemplate::vitality)
    }

    fn record_spawns(&mut self, count: usize) {
        if let Some(counters) = self.counters.as_mut() {
            counters.record_spawns(count);
        }
    }
}
