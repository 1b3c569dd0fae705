//! Designer-facing boss tuning.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use skyraid_core::{ActionTag, ConfigError, RouteDefinition, TemplateId, Vec2};

/// Complete description of a boss encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossConfig {
    /// Template whose spawns are driven by the phase machine.
    pub template: TemplateId,
    /// Health the boss starts with.
    #[serde(default = "default_max_health")]
    pub max_health: u32,
    /// Health at or below which phase two starts.
    #[serde(default = "default_phase2_threshold")]
    pub phase2_threshold: u32,
    /// Health at or below which phase three starts.
    #[serde(default = "default_phase3_threshold")]
    pub phase3_threshold: u32,
    /// One-shot rewind sequence.
    #[serde(default)]
    pub rewind: RewindSettings,
    /// Routes followed in phases one and two.
    #[serde(default)]
    pub routes: BossRoutes,
    /// Attack shapes. Missing attacks are skipped when their timer fires.
    #[serde(default = "BossAttacks::all")]
    pub attacks: BossAttacks,
    /// Repeat intervals of the periodic attacks.
    #[serde(default)]
    pub cadence: AttackCadence,
    /// Normalized screen positions the phase three teleport picks from.
    #[serde(default = "default_teleport_positions")]
    pub teleport_positions: Vec<Vec2>,
    /// Normalized screen position the boss is summoned at.
    #[serde(default = "default_entry_point")]
    pub entry_point: Vec2,
    /// Reactions to route node action tags.
    #[serde(default)]
    pub reactions: ReactionTable,
}

fn default_max_health() -> u32 {
    500
}

fn default_phase2_threshold() -> u32 {
    300
}

fn default_phase3_threshold() -> u32 {
    150
}

fn default_entry_point() -> Vec2 {
    Vec2::new(0.5, 0.85)
}

fn default_teleport_positions() -> Vec<Vec2> {
    vec![
        Vec2::new(0.15, 0.90),
        Vec2::new(0.85, 0.90),
        Vec2::new(0.50, 0.82),
        Vec2::new(0.15, 0.62),
        Vec2::new(0.85, 0.62),
        Vec2::new(0.50, 0.45),
        Vec2::new(0.33, 0.70),
        Vec2::new(0.67, 0.70),
    ]
}

impl BossConfig {
    /// Creates a boss with default health, thresholds, attacks and no routes.
    #[must_use]
    pub fn new(template: TemplateId) -> Self {
        Self {
            template,
            max_health: default_max_health(),
            phase2_threshold: default_phase2_threshold(),
            phase3_threshold: default_phase3_threshold(),
            rewind: RewindSettings::default(),
            routes: BossRoutes::default(),
            attacks: BossAttacks::all(),
            cadence: AttackCadence::default(),
            teleport_positions: default_teleport_positions(),
            entry_point: default_entry_point(),
            reactions: ReactionTable::default(),
        }
    }

    /// Reports every configuration problem of the boss.
    #[must_use]
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.max_health == 0
            || self.phase2_threshold > self.max_health
            || self.phase3_threshold > self.phase2_threshold
        {
            errors.push(ConfigError::BossThresholds {
                phase2: self.phase2_threshold,
                phase3: self.phase3_threshold,
                max: self.max_health,
            });
        }
        let routes = [
            ("phase1 route", &self.routes.phase1),
            ("phase2 entry route", &self.routes.phase2_entry),
            ("phase2 loop route", &self.routes.phase2_loop),
        ];
        for (name, route) in routes {
            if let Some(Err(error)) = route.as_ref().map(|route| route.validate()) {
                errors.push(error.within(name));
            }
        }
        errors.into_iter().map(|error| error.within("boss")).collect()
    }
}

/// Heal-and-shield sequence triggered once at low health.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewindSettings {
    /// Health at or below which the rewind triggers.
    pub threshold: u32,
    /// Health restored, capped at the maximum.
    pub heal: u32,
    /// Seconds of invulnerability granted.
    pub invulnerable_for: f32,
}

impl Default for RewindSettings {
    fn default() -> Self {
        Self {
            threshold: 100,
            heal: 50,
            invulnerable_for: 2.0,
        }
    }
}

/// Routes assigned on phase entry.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BossRoutes {
    /// Followed for the whole first phase.
    #[serde(default)]
    pub phase1: Option<Arc<RouteDefinition>>,
    /// Followed when phase two starts.
    #[serde(default)]
    pub phase2_entry: Option<Arc<RouteDefinition>>,
    /// Replaces the entry route when a roar is reached in phase two.
    #[serde(default)]
    pub phase2_loop: Option<Arc<RouteDefinition>>,
}

/// Radial ring of projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RadialVolley {
    /// Projectiles evenly spread over a full turn.
    pub count: u32,
    /// Projectile speed in world units per second.
    pub speed: f32,
    /// Damage per projectile.
    pub damage: u32,
    /// Seconds each projectile lives.
    #[serde(default = "default_projectile_lifetime")]
    pub lifetime: f32,
}

fn default_projectile_lifetime() -> f32 {
    6.0
}

/// Straight projectile fired downward.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Projectile {
    /// Speed in world units per second.
    pub speed: f32,
    /// Damage on contact.
    pub damage: u32,
    /// Seconds the projectile lives.
    pub lifetime: f32,
}

impl Default for Projectile {
    fn default() -> Self {
        Self {
            speed: 4.0,
            damage: 20,
            lifetime: default_projectile_lifetime(),
        }
    }
}

/// Punch thrown from the boss towards a screen edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Punch {
    /// Damage on contact.
    pub damage: u32,
    /// Seconds the fist needs to reach the edge.
    pub reach_time: f32,
}

impl Default for Punch {
    fn default() -> Self {
        Self {
            damage: 15,
            reach_time: 0.53,
        }
    }
}

/// Every attack the boss can perform. `None` disables an attack.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BossAttacks {
    /// Radial sound wave.
    #[serde(default)]
    pub sound_wave: Option<RadialVolley>,
    /// Shockwave rolling down from the boss.
    #[serde(default)]
    pub bass_drop: Option<Projectile>,
    /// Cassette ejected towards the bottom of the screen.
    #[serde(default)]
    pub cassette: Option<Projectile>,
    /// Speaker punch towards a screen edge.
    #[serde(default)]
    pub punch: Option<Punch>,
    /// Dense burst released after the volume charge.
    #[serde(default)]
    pub volume_burst: Option<RadialVolley>,
}

impl BossAttacks {
    /// Every attack enabled with its default shape.
    #[must_use]
    pub fn all() -> Self {
        Self {
            sound_wave: Some(RadialVolley {
                count: 8,
                speed: 3.0,
                damage: 10,
                lifetime: default_projectile_lifetime(),
            }),
            bass_drop: Some(Projectile {
                speed: 6.0,
                damage: 25,
                lifetime: 4.5,
            }),
            cassette: Some(Projectile::default()),
            punch: Some(Punch::default()),
            volume_burst: Some(RadialVolley {
                count: 24,
                speed: 4.0,
                damage: 15,
                lifetime: default_projectile_lifetime(),
            }),
        }
    }
}

/// Intervals, in seconds, of the periodic attacks per phase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackCadence {
    /// Sound wave interval in phase two.
    pub phase2_sound_wave: f32,
    /// Sound wave interval in phase three.
    pub phase3_sound_wave: f32,
    /// Bass drop interval in phase two.
    pub phase2_bass_drop: f32,
    /// Bass drop interval in phase three.
    pub phase3_bass_drop: f32,
    /// Cassette interval in phase three.
    pub cassette: f32,
    /// Punch interval in phase three.
    pub punch: f32,
    /// Volume charge interval in phase three.
    pub volume: f32,
    /// Seconds the volume charge lasts before the burst.
    pub volume_charge: f32,
    /// Full teleport cycle in phase three.
    pub teleport: f32,
    /// Seconds each teleport fade lasts.
    pub teleport_fade: f32,
    /// Lower bound of the random start delay of every periodic attack.
    pub jitter_min: f32,
    /// Upper bound (exclusive) of the random start delay.
    pub jitter_max: f32,
}

impl Default for AttackCadence {
    fn default() -> Self {
        Self {
            phase2_sound_wave: 2.0,
            phase3_sound_wave: 1.0,
            phase2_bass_drop: 8.0,
            phase3_bass_drop: 5.0,
            cassette: 10.0,
            punch: 1.2,
            volume: 15.0,
            volume_charge: 2.0,
            teleport: 3.0,
            teleport_fade: 0.25,
            jitter_min: 0.15,
            jitter_max: 0.55,
        }
    }
}

/// Boss behaviour triggered by a route node action tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    /// Fire the sound wave.
    SoundWave,
    /// Leave the phase two entry route for the loop route.
    SwitchToLoopRoute,
    /// Punch towards the side named by the payload, alternating without one.
    SpeakerPunch,
}

/// One row of the reaction table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionEntry {
    /// Tag carried by the route node.
    pub tag: ActionTag,
    /// Behaviour triggered by the tag.
    pub reaction: Reaction,
}

/// Lookup from route action tags to boss reactions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionTable {
    entries: Vec<ReactionEntry>,
}

impl ReactionTable {
    /// Creates a table from explicit entries. Earlier entries win.
    #[must_use]
    pub fn new(entries: Vec<ReactionEntry>) -> Self {
        Self { entries }
    }

    /// Reaction bound to `tag`, if any.
    #[must_use]
    pub fn lookup(&self, tag: ActionTag) -> Option<Reaction> {
        self.entries
            .iter()
            .find(|entry| entry.tag == tag)
            .map(|entry| entry.reaction)
    }
}

impl Default for ReactionTable {
    fn default() -> Self {
        Self::new(vec![
            ReactionEntry {
                tag: ActionTag::Volley,
                reaction: Reaction::SoundWave,
            },
            ReactionEntry {
                tag: ActionTag::Roar,
                reaction: Reaction::SwitchToLoopRoute,
            },
            ReactionEntry {
                tag: ActionTag::Punch,
                reaction: Reaction::SpeakerPunch,
            },
        ])
    }
}
