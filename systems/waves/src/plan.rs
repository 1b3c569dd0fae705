//! Designer-authored wave plans and difficulty scaling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skyraid_core::{
    ConfigError, CurveDefinition, EnemyTemplate, FormationDefinition, RouteDefinition, TemplateId,
};
use skyraid_system_spawning::FormationTiming;

const MIN_TIMEOUT: f32 = 0.1;
const MIN_BETWEEN_WAVES: f32 = 0.1;
const MIN_INTERVAL_FACTOR: f32 = 0.1;

/// How a phase brings its enemies into the arena.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpawnStyle {
    /// One enemy at a time at a random x above the screen.
    SingleRandomTop,
    /// A centred grid whose members fly in from alternating sides.
    FormationGrid {
        /// Members per row.
        #[serde(default = "default_columns")]
        columns: u32,
        /// Replaces the plan's default fly-in timing for this phase.
        #[serde(default)]
        timing: Option<FormationTiming>,
    },
    /// Every member of a formation follows a shared curve.
    PathFormation {
        /// Formation defining member count, layout and break behaviour.
        formation: Arc<FormationDefinition>,
        /// Curve followed by the formation.
        path: Arc<CurveDefinition>,
    },
}

fn default_columns() -> u32 {
    5
}

/// One spawning sub-plan within a wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    /// Name used in diagnostics.
    #[serde(default = "default_phase_name")]
    pub name: String,
    /// How enemies enter the arena.
    pub style: SpawnStyle,
    /// Template handed to the entity factory.
    pub template: TemplateId,
    /// Base number of enemies before difficulty scaling.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Seconds to wait before the phase starts spawning.
    #[serde(default = "default_start_delay")]
    pub start_delay: f32,
    /// Base seconds between spawns before difficulty scaling.
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval: f32,
    /// Whether the next phase waits until every enemy of this one is gone.
    #[serde(default = "default_true")]
    pub wait_for_clear: bool,
    /// Route assigned to every enemy of the phase.
    #[serde(default)]
    pub route: Option<Arc<RouteDefinition>>,
    /// Upper bound on the time a staged formation may take to spawn.
    #[serde(default = "default_spawn_timeout")]
    pub spawn_timeout: f32,
    /// Upper bound on the time spent waiting for the phase to clear.
    #[serde(default = "default_clear_timeout")]
    pub clear_timeout: f32,
}

fn default_phase_name() -> String {
    "phase".to_owned()
}

fn default_count() -> u32 {
    10
}

fn default_start_delay() -> f32 {
    1.0
}

fn default_spawn_interval() -> f32 {
    0.25
}

fn default_true() -> bool {
    true
}

fn default_spawn_timeout() -> f32 {
    10.0
}

fn default_clear_timeout() -> f32 {
    120.0
}

impl Phase {
    /// Creates a phase with default timing for the provided style and template.
    #[must_use]
    pub fn new(style: SpawnStyle, template: TemplateId, count: u32) -> Self {
        Self {
            name: default_phase_name(),
            style,
            template,
            count,
            start_delay: default_start_delay(),
            spawn_interval: default_spawn_interval(),
            wait_for_clear: true,
            route: None,
            spawn_timeout: default_spawn_timeout(),
            clear_timeout: default_clear_timeout(),
        }
    }

    /// Spawn timeout with its lower bound applied.
    #[must_use]
    pub fn effective_spawn_timeout(&self) -> f32 {
        self.spawn_timeout.max(MIN_TIMEOUT)
    }

    /// Clear timeout with its lower bound applied.
    #[must_use]
    pub fn effective_clear_timeout(&self) -> f32 {
        self.clear_timeout.max(MIN_TIMEOUT)
    }

    fn validate(&self, templates: &[EnemyTemplate]) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if !templates.iter().any(|template| template.id == self.template) {
            errors.push(ConfigError::UnknownTemplate(self.template));
        }
        if let Some(route) = &self.route {
            if let Err(error) = route.validate() {
                errors.push(error.within("route"));
            }
        }
        match &self.style {
            SpawnStyle::SingleRandomTop => {}
            SpawnStyle::FormationGrid { columns, .. } => {
                if *columns == 0 {
                    errors.push(ConfigError::ZeroColumns);
                }
            }
            SpawnStyle::PathFormation { formation, path } => {
                if let Err(error) = formation.validate() {
                    errors.push(error.within("formation"));
                }
                if let Err(error) = path.validate() {
                    errors.push(error.within("path"));
                }
            }
        }
        errors
    }
}

/// Ordered phases forming the top-level scheduling unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    /// Name used in diagnostics.
    #[serde(default = "default_wave_name")]
    pub name: String,
    /// Seconds to wait before the first phase.
    #[serde(default = "default_start_delay")]
    pub start_delay: f32,
    /// Phases executed strictly in order.
    #[serde(default)]
    pub phases: Vec<Phase>,
}

fn default_wave_name() -> String {
    "wave".to_owned()
}

impl Wave {
    /// Creates a wave with default timing.
    #[must_use]
    pub fn new(phases: Vec<Phase>) -> Self {
        Self {
            name: default_wave_name(),
            start_delay: default_start_delay(),
            phases,
        }
    }
}

/// Per-wave difficulty growth.
///
/// Scaling is linear in the wave index and recomputed for every wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DifficultyScaling {
    /// Fractional count increase per wave.
    pub count_growth_per_wave: f32,
    /// Fractional interval reduction per wave.
    pub interval_reduction_per_wave: f32,
    /// Lower bound on any scaled spawn interval.
    pub min_spawn_interval: f32,
}

impl Default for DifficultyScaling {
    fn default() -> Self {
        Self {
            count_growth_per_wave: 0.15,
            interval_reduction_per_wave: 0.08,
            min_spawn_interval: 0.06,
        }
    }
}

impl DifficultyScaling {
    /// `round(base * (1 + growth * wave))`, never below one.
    #[must_use]
    pub fn scaled_count(&self, base: u32, wave_index: u32) -> u32 {
        let multiplier = 1.0 + self.count_growth_per_wave * wave_index as f32;
        let scaled = (base as f32 * multiplier).round();
        if scaled.is_finite() && scaled >= 1.0 {
            scaled as u32
        } else {
            1
        }
    }

    /// `max(min, base * max(0.1, 1 - reduction * wave))`.
    #[must_use]
    pub fn scaled_interval(&self, base: f32, wave_index: u32) -> f32 {
        let multiplier =
            (1.0 - self.interval_reduction_per_wave * wave_index as f32).max(MIN_INTERVAL_FACTOR);
        (base * multiplier).max(self.min_spawn_interval)
    }
}

/// Ordered waves plus the rules connecting them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WavePlan {
    /// Waves executed strictly in order.
    #[serde(default)]
    pub waves: Vec<Wave>,
    /// Keep replaying the last wave with growing difficulty once the plan runs out.
    #[serde(default)]
    pub loop_forever: bool,
    /// Seconds between the end of one wave and the start of the next.
    #[serde(default = "default_start_delay")]
    pub between_waves_delay: f32,
    /// Difficulty growth per wave.
    #[serde(default)]
    pub scaling: DifficultyScaling,
    /// Fly-in timing used by grid phases without an override.
    #[serde(default)]
    pub formation_timing: FormationTiming,
}

impl WavePlan {
    /// Creates a non-looping plan with default delays and scaling.
    #[must_use]
    pub fn new(waves: Vec<Wave>) -> Self {
        Self {
            waves,
            loop_forever: false,
            between_waves_delay: default_start_delay(),
            scaling: DifficultyScaling::default(),
            formation_timing: FormationTiming::default(),
        }
    }

    /// Wave executed at `wave_index`, repeating the last wave past the end.
    #[must_use]
    pub fn wave(&self, wave_index: u32) -> Option<&Wave> {
        let last = self.waves.len().checked_sub(1)?;
        self.waves.get((wave_index as usize).min(last))
    }

    /// Delay between waves with its lower bound applied.
    #[must_use]
    pub fn effective_between_waves_delay(&self) -> f32 {
        self.between_waves_delay.max(MIN_BETWEEN_WAVES)
    }

    /// Reports every configuration problem in the plan.
    #[must_use]
    pub fn validate(&self, templates: &[EnemyTemplate]) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (wave_index, wave) in self.waves.iter().enumerate() {
            for (phase_index, phase) in wave.phases.iter().enumerate() {
                errors.extend(
                    phase
                        .validate(templates)
                        .into_iter()
                        .map(|error| error.within(format!("wave {wave_index} phase {phase_index}"))),
                );
            }
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_scaling_grows_linearly() {
        let scaling = DifficultyScaling::default();
        assert_eq!(scaling.scaled_count(10, 0), 10);
        assert_eq!(scaling.scaled_count(10, 2), 13);
        assert_eq!(scaling.scaled_count(0, 5), 1);
    }

    #[test]
    fn interval_scaling_respects_floor() {
        let scaling = DifficultyScaling::default();
        assert!((scaling.scaled_interval(0.25, 2) - 0.21).abs() < 1e-6);
        assert!((scaling.scaled_interval(0.25, 50) - 0.06).abs() < 1e-6);
        assert!((scaling.scaled_interval(1.0, 50) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn waves_past_the_end_repeat_the_last() {
        let plan = WavePlan::new(vec![
            Wave::new(Vec::new()),
            Wave {
                name: "last".to_owned(),
                ..Wave::new(Vec::new())
            },
        ]);
        assert_eq!(plan.wave(7).map(|wave| wave.name.as_str()), Some("last"));
        assert!(WavePlan::new(Vec::new()).wave(0).is_none());
    }

    #[test]
    fn validation_names_the_offending_phase() {
        let plan = WavePlan::new(vec![Wave::new(vec![Phase::new(
            SpawnStyle::FormationGrid {
                columns: 0,
                timing: None,
            },
            TemplateId::new(4),
            5,
        )])]);
        let templates = [EnemyTemplate {
            id: TemplateId::new(1),
            max_health: 3,
            boss: false,
        }];

        let errors = plan.validate(&templates);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[1].to_string(),
            "wave 0 phase 0: grid layouts need at least one column"
        );
    }
}
