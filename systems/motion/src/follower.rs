//! Curve following with formation offsets and break transitions.

use std::sync::Arc;

use skyraid_core::{
    BreakBehavior, ConfigError, CurveDefinition, FormationSlot, Projector, Vec2,
};
use skyraid_system_paths::{curve, formation};

const MIN_DURATION: f32 = 0.01;

/// Outcome of advancing a [`MotionController`] by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MotionStep {
    /// The entity should be written at the provided position.
    Moved(Vec2),
    /// A non-looping curve reached its end. Reported exactly once.
    Finished,
    /// Nothing left to do.
    Idle,
}

/// Per-entity state following a curve, optionally as a formation member.
#[derive(Clone, Debug)]
pub struct MotionController {
    curve: Arc<CurveDefinition>,
    slot: Option<FormationSlot>,
    offset: Vec2,
    progress: f32,
    alive_time: f32,
    speed_multiplier: f32,
    broken: bool,
    finished: bool,
}

impl MotionController {
    /// Creates a controller after validating the curve and the formation.
    pub fn new(
        curve: Arc<CurveDefinition>,
        slot: Option<FormationSlot>,
    ) -> Result<Self, ConfigError> {
        curve.validate()?;
        if let Some(slot) = &slot {
            slot.formation.validate()?;
        }

        let offset = slot
            .as_ref()
            .map_or(Vec2::ZERO, |slot| formation::offset(&slot.formation, slot.index));
        Ok(Self {
            curve,
            slot,
            offset,
            progress: 0.0,
            alive_time: 0.0,
            speed_multiplier: 1.0,
            broken: false,
            finished: false,
        })
    }

    /// Scales how fast progress advances.
    pub fn set_speed_multiplier(&mut self, multiplier: f32) {
        self.speed_multiplier = multiplier.max(0.0);
    }

    /// Position at the current progress, including the formation offset.
    #[must_use]
    pub fn position(&self, projector: Option<&dyn Projector>, depth: f32) -> Vec2 {
        curve::evaluate(&self.curve, self.progress, projector, depth) + self.offset
    }

    /// Progress along the current effective curve.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Seconds the controller has been advanced for.
    #[must_use]
    pub fn alive_time(&self) -> f32 {
        self.alive_time
    }

    /// Reports whether the entity left its formation.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Formation offset currently added to the curve position.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Curve currently being followed.
    #[must_use]
    pub fn curve(&self) -> &Arc<CurveDefinition> {
        &self.curve
    }

    /// Advances the controller by `dt` seconds.
    pub fn advance(
        &mut self,
        dt: f32,
        projector: Option<&dyn Projector>,
        depth: f32,
    ) -> MotionStep {
        if self.finished {
            return MotionStep::Idle;
        }

        self.alive_time += dt;
        if !self.broken && self.break_condition_met() {
            self.break_formation();
        }

        self.progress += dt / self.curve.duration.max(MIN_DURATION) * self.speed_multiplier;
        if self.progress >= 1.0 {
            if self.curve.looping {
                self.progress %= 1.0;
            } else {
                self.finished = true;
                return MotionStep::Finished;
            }
        }

        MotionStep::Moved(self.position(projector, depth))
    }

    fn break_condition_met(&self) -> bool {
        let Some(slot) = &self.slot else {
            return false;
        };
        match slot.formation.break_behavior {
            BreakBehavior::StayInFormation => false,
            BreakBehavior::BreakAfterTime { seconds }
            | BreakBehavior::IndividualPathsAfterBreak { seconds } => self.alive_time >= seconds,
            BreakBehavior::BreakOnWaypointIndex { index } => {
                self.progress >= curve::estimated_progress_at(&self.curve, index)
            }
        }
    }

    fn break_formation(&mut self) {
        self.broken = true;
        self.offset = Vec2::ZERO;

        let Some(slot) = &self.slot else {
            return;
        };
        if !matches!(
            slot.formation.break_behavior,
            BreakBehavior::IndividualPathsAfterBreak { .. }
        ) {
            return;
        }
        if let Some(individual) = slot.formation.individual_curve(slot.index) {
            if individual.validate().is_ok() {
                self.curve = Arc::clone(individual);
                self.progress = 0.0;
            }
        }
    }
}
