//! Health-driven boss phase machine.
//!
//! The machine owns the boss's health and every timer the boss runs. It never
//! touches the world directly; each operation appends [`BossAction`] values
//! that the [`crate::Boss`] system translates into world commands.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use skyraid_core::{
    timer::{Countdown, Repeater},
    ActionPayload, RouteAction, RouteDefinition, Side, Vec2,
};
use tracing::{debug, info};

use crate::config::{BossConfig, Reaction};

/// Health-gated phases of the boss. Phases only ever move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum BossPhase {
    /// Follows the first route and only attacks on route tags.
    Phase1,
    /// Entry then loop route with periodic sound waves and bass drops.
    Phase2,
    /// Stationary with every periodic attack and the teleport loop.
    Phase3,
}

/// Attack performed at the boss's current position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attack {
    /// Radial sound wave.
    SoundWave,
    /// Shockwave rolling downward.
    BassDrop,
    /// Cassette fired downward.
    Cassette,
    /// Punch towards a screen edge.
    SpeakerPunch(Side),
    /// Dense radial burst ending a volume charge.
    VolumeBurst,
}

/// Intent produced by the machine for the world.
#[derive(Clone, Debug, PartialEq)]
pub enum BossAction {
    /// Start following the route from its first node.
    FollowRoute(Arc<RouteDefinition>),
    /// Drop route control and stay in place.
    HoldPosition,
    /// Suspend or resume route traversal.
    PauseRoute(bool),
    /// Perform an attack.
    Attack(Attack),
    /// Remove every active hazard.
    ClearHazards,
    /// Move instantly to a normalized screen position.
    Relocate(Vec2),
    /// Health reached zero; the boss leaves play.
    Defeated,
}

/// Periodic attack driven by a repeating timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeriodicAttack {
    /// Sound wave.
    SoundWave,
    /// Bass drop.
    BassDrop,
    /// Cassette eject.
    Cassette,
    /// Alternating speaker punch.
    SpeakerPunch,
    /// Volume charge followed by a burst.
    VolumeCharge,
}

/// Observable state of a boss.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossState {
    /// Current phase.
    pub phase: BossPhase,
    /// Current health.
    pub health: u32,
    /// Health the boss started with.
    pub max_health: u32,
    /// Whether hits are currently ignored.
    pub invulnerable: bool,
    /// Whether the rewind sequence already ran.
    pub rewind_used: bool,
    /// Whether the boss was defeated.
    pub defeated: bool,
}

#[derive(Clone, Copy, Debug)]
struct PeriodicTimer {
    attack: PeriodicAttack,
    repeater: Repeater,
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Rewind {
    Ready,
    Active(Countdown),
    Spent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TeleportStage {
    FadingOut,
    FadingIn,
    Holding,
}

#[derive(Clone, Copy, Debug)]
struct TeleportLoop {
    stage: TeleportStage,
    timer: Countdown,
}

/// Phase machine of a single boss instance.
#[derive(Debug)]
pub struct BossPhaseMachine {
    config: Arc<BossConfig>,
    rng: ChaCha8Rng,
    health: u32,
    phase: BossPhase,
    defeated: bool,
    rewind: Rewind,
    charge: Option<Countdown>,
    teleport: Option<TeleportLoop>,
    periodic: Vec<PeriodicTimer>,
    punch_alternate: bool,
}

impl BossPhaseMachine {
    /// Creates a machine at full health and enters the first phase.
    pub fn new(config: Arc<BossConfig>, seed: u64, out: &mut Vec<BossAction>) -> Self {
        let mut machine = Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            health: config.max_health,
            phase: BossPhase::Phase1,
            defeated: false,
            rewind: Rewind::Ready,
            charge: None,
            teleport: None,
            periodic: Vec::new(),
            punch_alternate: false,
            config,
        };
        if let Some(route) = &machine.config.routes.phase1 {
            out.push(BossAction::FollowRoute(Arc::clone(route)));
        }
        machine
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> BossPhase {
        self.phase
    }

    /// Current health.
    #[must_use]
    pub fn health(&self) -> u32 {
        self.health
    }

    /// Hits are ignored while any invulnerability source is active.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        matches!(self.rewind, Rewind::Active(_)) || self.charge.is_some()
    }

    /// Periodic attacks currently scheduled, in scheduling order.
    #[must_use]
    pub fn active_timers(&self) -> Vec<PeriodicAttack> {
        self.periodic.iter().map(|timer| timer.attack).collect()
    }

    /// Snapshot of the boss's state.
    #[must_use]
    pub fn state(&self) -> BossState {
        BossState {
            phase: self.phase,
            health: self.health,
            max_health: self.config.max_health,
            invulnerable: self.is_invulnerable(),
            rewind_used: self.rewind != Rewind::Ready,
            defeated: self.defeated,
        }
    }

    /// Applies a hit unless the boss is invulnerable or already defeated.
    pub fn take_hit(&mut self, amount: u32, out: &mut Vec<BossAction>) {
        if self.defeated || self.is_invulnerable() {
            return;
        }
        self.health = self.health.saturating_sub(amount);
        if self.health == 0 {
            self.die(out);
        }
    }

    /// Reacts to an action tag reached on the boss's route.
    pub fn on_route_action(&mut self, action: RouteAction, out: &mut Vec<BossAction>) {
        if self.defeated {
            return;
        }
        match self.config.reactions.lookup(action.tag) {
            Some(Reaction::SoundWave) => self.attack(Attack::SoundWave, out),
            Some(Reaction::SwitchToLoopRoute) => {
                if self.phase == BossPhase::Phase2 {
                    if let Some(route) = &self.config.routes.phase2_loop {
                        out.push(BossAction::FollowRoute(Arc::clone(route)));
                    }
                }
            }
            Some(Reaction::SpeakerPunch) => {
                let side = match action.payload {
                    ActionPayload::Side(side) => side,
                    ActionPayload::None => self.alternating_side(),
                };
                self.punch(side, out);
            }
            None => {}
        }
    }

    /// Advances the machine by `dt` seconds.
    ///
    /// The rewind check runs before the phase check, then sequences and
    /// periodic timers advance.
    pub fn update(&mut self, dt: f32, out: &mut Vec<BossAction>) {
        if self.defeated {
            return;
        }

        if self.rewind == Rewind::Ready && self.health <= self.config.rewind.threshold {
            self.start_rewind(out);
        }

        if self.phase != BossPhase::Phase3 && self.health <= self.config.phase3_threshold {
            self.enter(BossPhase::Phase3, out);
        } else if self.phase == BossPhase::Phase1 && self.health <= self.config.phase2_threshold {
            self.enter(BossPhase::Phase2, out);
        }

        if let Rewind::Active(timer) = &mut self.rewind {
            if timer.tick(dt) {
                self.rewind = Rewind::Spent;
            }
        }

        if let Some(charge) = &mut self.charge {
            if charge.tick(dt) {
                self.charge = None;
                self.attack(Attack::VolumeBurst, out);
                out.push(BossAction::PauseRoute(false));
            }
        }

        self.advance_teleport(dt, out);

        let mut fired = Vec::new();
        for timer in &mut self.periodic {
            for _ in 0..timer.repeater.tick(dt) {
                fired.push(timer.attack);
            }
        }
        for attack in fired {
            self.fire_periodic(attack, out);
        }
    }

    fn enter(&mut self, next: BossPhase, out: &mut Vec<BossAction>) {
        if self.phase == next {
            return;
        }
        self.phase = next;
        self.cancel_phase_timers();
        debug!(phase = ?next, health = self.health, "boss phase entered");

        let cadence = self.config.cadence;
        match next {
            BossPhase::Phase1 => {
                if let Some(route) = &self.config.routes.phase1 {
                    out.push(BossAction::FollowRoute(Arc::clone(route)));
                }
            }
            BossPhase::Phase2 => {
                if let Some(route) = &self.config.routes.phase2_entry {
                    out.push(BossAction::FollowRoute(Arc::clone(route)));
                }
                self.schedule(PeriodicAttack::SoundWave, cadence.phase2_sound_wave);
                self.schedule(PeriodicAttack::BassDrop, cadence.phase2_bass_drop);
            }
            BossPhase::Phase3 => {
                out.push(BossAction::HoldPosition);
                self.schedule(PeriodicAttack::SoundWave, cadence.phase3_sound_wave);
                self.schedule(PeriodicAttack::BassDrop, cadence.phase3_bass_drop);
                self.schedule(PeriodicAttack::Cassette, cadence.cassette);
                self.schedule(PeriodicAttack::VolumeCharge, cadence.volume);
                self.schedule(PeriodicAttack::SpeakerPunch, cadence.punch);
                self.teleport = Some(TeleportLoop {
                    stage: TeleportStage::FadingOut,
                    timer: Countdown::new(cadence.teleport_fade),
                });
            }
        }
    }

    fn cancel_phase_timers(&mut self) {
        self.periodic.clear();
        self.teleport = None;
    }

    fn schedule(&mut self, attack: PeriodicAttack, interval: f32) {
        let cadence = self.config.cadence;
        let jitter = if cadence.jitter_max > cadence.jitter_min {
            self.rng.gen_range(cadence.jitter_min..cadence.jitter_max)
        } else {
            cadence.jitter_min
        };
        self.periodic.push(PeriodicTimer {
            attack,
            repeater: Repeater::new(jitter, interval),
        });
    }

    fn fire_periodic(&mut self, attack: PeriodicAttack, out: &mut Vec<BossAction>) {
        match attack {
            PeriodicAttack::SoundWave => self.attack(Attack::SoundWave, out),
            PeriodicAttack::BassDrop => self.attack(Attack::BassDrop, out),
            PeriodicAttack::Cassette => self.attack(Attack::Cassette, out),
            PeriodicAttack::SpeakerPunch => {
                let side = self.alternating_side();
                self.punch(side, out);
            }
            PeriodicAttack::VolumeCharge => {
                if self.config.attacks.volume_burst.is_none() || self.charge.is_some() {
                    return;
                }
                self.charge = Some(Countdown::new(self.config.cadence.volume_charge));
                out.push(BossAction::PauseRoute(true));
            }
        }
    }

    fn alternating_side(&self) -> Side {
        if self.punch_alternate {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn punch(&mut self, side: Side, out: &mut Vec<BossAction>) {
        self.punch_alternate = !self.punch_alternate;
        self.attack(Attack::SpeakerPunch(side), out);
    }

    fn attack(&self, attack: Attack, out: &mut Vec<BossAction>) {
        let attacks = &self.config.attacks;
        let available = match attack {
            Attack::SoundWave => attacks.sound_wave.is_some(),
            Attack::BassDrop => attacks.bass_drop.is_some(),
            Attack::Cassette => attacks.cassette.is_some(),
            Attack::SpeakerPunch(_) => attacks.punch.is_some(),
            Attack::VolumeBurst => attacks.volume_burst.is_some(),
        };
        if available {
            out.push(BossAction::Attack(attack));
        }
    }

    fn advance_teleport(&mut self, dt: f32, out: &mut Vec<BossAction>) {
        let cadence = self.config.cadence;
        let Some(teleport) = &mut self.teleport else {
            return;
        };
        if !teleport.timer.tick(dt) {
            return;
        }
        match teleport.stage {
            TeleportStage::FadingOut => {
                teleport.stage = TeleportStage::FadingIn;
                teleport.timer = Countdown::new(cadence.teleport_fade);
                let positions = &self.config.teleport_positions;
                if !positions.is_empty() {
                    let target = positions[self.rng.gen_range(0..positions.len())];
                    out.push(BossAction::Relocate(target));
                }
            }
            TeleportStage::FadingIn => {
                teleport.stage = TeleportStage::Holding;
                teleport.timer =
                    Countdown::new((cadence.teleport - 2.0 * cadence.teleport_fade).max(0.0));
            }
            TeleportStage::Holding => {
                teleport.stage = TeleportStage::FadingOut;
                teleport.timer = Countdown::new(cadence.teleport_fade);
            }
        }
    }

    fn start_rewind(&mut self, out: &mut Vec<BossAction>) {
        let rewind = self.config.rewind;
        self.rewind = Rewind::Active(Countdown::new(rewind.invulnerable_for));
        self.health = self
            .health
            .saturating_add(rewind.heal)
            .min(self.config.max_health);
        out.push(BossAction::ClearHazards);
        debug!(health = self.health, "boss rewind");
    }

    fn die(&mut self, out: &mut Vec<BossAction>) {
        self.defeated = true;
        self.cancel_phase_timers();
        self.charge = None;
        if let Rewind::Active(_) = self.rewind {
            self.rewind = Rewind::Spent;
        }
        info!(phase = ?self.phase, "boss defeated");
        out.push(BossAction::Defeated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyraid_core::{ActionTag, NodeSpace, RouteNode, TemplateId};

    fn machine(config: BossConfig) -> (BossPhaseMachine, Vec<BossAction>) {
        let mut out = Vec::new();
        let machine = BossPhaseMachine::new(Arc::new(config), 5, &mut out);
        (machine, out)
    }

    fn config() -> BossConfig {
        BossConfig::new(TemplateId::new(50))
    }

    fn route() -> Arc<RouteDefinition> {
        Arc::new(RouteDefinition::new(
            NodeSpace::Absolute,
            vec![
                RouteNode::at(Vec2::ZERO, 1.0),
                RouteNode::at(Vec2::ONE, 1.0),
            ],
        ))
    }

    #[test]
    fn first_phase_follows_its_route_without_timers() {
        let mut config = config();
        config.routes.phase1 = Some(route());
        let (machine, out) = machine(config);
        assert_eq!(out, vec![BossAction::FollowRoute(route())]);
        assert_eq!(machine.phase(), BossPhase::Phase1);
        assert!(machine.active_timers().is_empty());
    }

    #[test]
    fn thresholds_advance_phases_and_swap_timers() {
        let (mut machine, mut out) = machine(config());
        machine.take_hit(200, &mut out);
        machine.update(0.01, &mut out);
        assert_eq!(machine.phase(), BossPhase::Phase2);
        assert_eq!(
            machine.active_timers(),
            vec![PeriodicAttack::SoundWave, PeriodicAttack::BassDrop]
        );

        machine.take_hit(150, &mut out);
        machine.update(0.01, &mut out);
        assert_eq!(machine.phase(), BossPhase::Phase3);
        assert_eq!(machine.active_timers().len(), 5);
        assert!(out.contains(&BossAction::HoldPosition));
    }

    #[test]
    fn large_hit_skips_straight_to_phase_three() {
        let (mut machine, mut out) = machine(config());
        machine.take_hit(380, &mut out);
        machine.update(0.01, &mut out);
        assert_eq!(machine.phase(), BossPhase::Phase3);
    }

    #[test]
    fn phases_never_move_backwards() {
        let (mut machine, mut out) = machine(config());
        machine.take_hit(410, &mut out);
        machine.update(0.01, &mut out);
        assert_eq!(machine.phase(), BossPhase::Phase3);
        assert_eq!(machine.health(), 140);

        for _ in 0..400 {
            machine.update(0.05, &mut out);
        }
        assert_eq!(machine.phase(), BossPhase::Phase3);
    }

    #[test]
    fn rewind_heals_once_and_shields() {
        let (mut machine, mut out) = machine(config());
        machine.take_hit(420, &mut out);
        out.clear();
        machine.update(0.01, &mut out);

        assert_eq!(machine.health(), 130);
        assert!(machine.is_invulnerable());
        assert!(out.contains(&BossAction::ClearHazards));

        machine.take_hit(100, &mut out);
        assert_eq!(machine.health(), 130);

        for _ in 0..40 {
            machine.update(0.05, &mut out);
        }
        let state = machine.state();
        assert!(state.rewind_used);

        let mut cleared = Vec::new();
        machine.take_hit(60, &mut cleared);
        machine.update(0.0, &mut cleared);
        assert!(!cleared.contains(&BossAction::ClearHazards));
    }

    #[test]
    fn periodic_attacks_wait_for_jitter() {
        let (mut machine, mut out) = machine(config());
        machine.take_hit(250, &mut out);
        out.clear();
        machine.update(0.1, &mut out);
        assert!(!out.iter().any(|action| matches!(action, BossAction::Attack(_))));

        machine.update(0.5, &mut out);
        assert!(out.contains(&BossAction::Attack(Attack::SoundWave)));
        assert!(out.contains(&BossAction::Attack(Attack::BassDrop)));
    }

    #[test]
    fn volume_charge_shields_then_bursts() {
        let mut config = config();
        config.cadence.volume = 1.0;
        let (mut machine, mut out) = machine(config);
        machine.take_hit(360, &mut out);
        machine.update(0.0, &mut out);
        out.clear();

        machine.update(0.6, &mut out);
        assert!(machine.is_invulnerable());
        assert!(out.contains(&BossAction::PauseRoute(true)));

        out.clear();
        machine.update(2.0, &mut out);
        assert!(out.contains(&BossAction::Attack(Attack::VolumeBurst)));
        assert!(out.contains(&BossAction::PauseRoute(false)));
    }

    #[test]
    fn missing_attacks_are_skipped() {
        let mut config = config();
        config.attacks = crate::BossAttacks::default();
        let (mut machine, mut out) = machine(config);
        machine.on_route_action(RouteAction::plain(ActionTag::Volley), &mut out);
        machine.take_hit(360, &mut out);
        for _ in 0..100 {
            machine.update(0.1, &mut out);
        }
        assert!(!out.iter().any(|action| matches!(action, BossAction::Attack(_))));
        assert!(!machine.is_invulnerable());
    }

    #[test]
    fn route_tags_trigger_reactions() {
        let mut config = config();
        config.routes.phase2_loop = Some(route());
        let (mut machine, mut out) = machine(config);

        machine.on_route_action(RouteAction::plain(ActionTag::Roar), &mut out);
        assert!(out.is_empty());

        machine.take_hit(250, &mut out);
        machine.update(0.0, &mut out);
        out.clear();
        machine.on_route_action(RouteAction::plain(ActionTag::Roar), &mut out);
        assert_eq!(out, vec![BossAction::FollowRoute(route())]);

        out.clear();
        machine.on_route_action(
            RouteAction {
                tag: ActionTag::Punch,
                payload: ActionPayload::Side(Side::Left),
            },
            &mut out,
        );
        machine.on_route_action(RouteAction::plain(ActionTag::Punch), &mut out);
        assert_eq!(
            out,
            vec![
                BossAction::Attack(Attack::SpeakerPunch(Side::Left)),
                BossAction::Attack(Attack::SpeakerPunch(Side::Left)),
            ]
        );
    }

    #[test]
    fn defeat_stops_everything() {
        let (mut machine, mut out) = machine(config());
        machine.take_hit(360, &mut out);
        machine.update(0.0, &mut out);
        out.clear();

        machine.take_hit(500, &mut out);
        assert_eq!(out, vec![BossAction::Defeated]);
        assert!(machine.active_timers().is_empty());

        out.clear();
        for _ in 0..100 {
            machine.update(0.1, &mut out);
        }
        machine.take_hit(10, &mut out);
        assert!(out.is_empty());
        assert!(machine.state().defeated);
    }
}
