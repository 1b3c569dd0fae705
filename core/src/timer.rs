//! Cooperative timer primitives advanced by the tick driver.
//!
//! Each timer is a small state struct resumed once per tick with the elapsed
//! delta. Dropping a timer cancels it; nothing keeps running in the background.

const MIN_REPEAT_INTERVAL: f32 = 0.001;
const MAX_FIRINGS_PER_TICK: u32 = 4;

/// One-shot wait that expires after a fixed number of seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Countdown {
    remaining: f32,
}

impl Countdown {
    /// Creates a countdown that expires after `seconds`.
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self {
            remaining: seconds.max(0.0),
        }
    }

    /// Advances the countdown, reporting whether it has expired.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.remaining = (self.remaining - dt).max(0.0);
        self.is_expired()
    }

    /// Reports whether the countdown has reached zero.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// Repeating timer firing once per interval after an initial delay.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Repeater {
    until_next: f32,
    interval: f32,
}

impl Repeater {
    /// Creates a repeater whose first firing happens after `initial_delay`.
    #[must_use]
    pub fn new(initial_delay: f32, interval: f32) -> Self {
        Self {
            until_next: initial_delay.max(0.0),
            interval: interval.max(MIN_REPEAT_INTERVAL),
        }
    }

    /// Advances the repeater, returning how many times it fired.
    ///
    /// Missed periods beyond a small per-tick cap are dropped, so a huge
    /// delta neither stalls the tick nor floods the caller.
    pub fn tick(&mut self, dt: f32) -> u32 {
        self.until_next -= dt;
        if self.until_next > 0.0 {
            return 0;
        }
        let overdue = -self.until_next;
        let periods = (overdue / self.interval).floor();
        self.until_next = self.interval - overdue.rem_euclid(self.interval);
        if periods >= MAX_FIRINGS_PER_TICK as f32 {
            MAX_FIRINGS_PER_TICK
        } else {
            periods as u32 + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Countdown, Repeater};

    #[test]
    fn countdown_expires_after_duration() {
        let mut countdown = Countdown::new(0.5);
        assert!(!countdown.tick(0.25));
        assert!(countdown.tick(0.25));
        assert!(countdown.is_expired());
    }

    #[test]
    fn zero_countdown_is_expired_immediately() {
        assert!(Countdown::new(0.0).is_expired());
        assert!(Countdown::new(-1.0).is_expired());
    }

    #[test]
    fn repeater_waits_for_initial_delay() {
        let mut repeater = Repeater::new(0.5, 1.0);
        assert_eq!(repeater.tick(0.25), 0);
        assert_eq!(repeater.tick(0.25), 1);
        assert_eq!(repeater.tick(0.5), 0);
        assert_eq!(repeater.tick(0.5), 1);
    }

    #[test]
    fn repeater_fires_repeatedly_for_long_ticks() {
        let mut repeater = Repeater::new(0.0, 0.5);
        assert_eq!(repeater.tick(1.0), 3);
        assert_eq!(repeater.tick(0.25), 0);
        assert_eq!(repeater.tick(0.25), 1);
    }

    #[test]
    fn huge_tick_is_capped_and_keeps_the_phase() {
        let mut repeater = Repeater::new(0.3, 1.2);
        assert_eq!(repeater.tick(1.0e8), super::MAX_FIRINGS_PER_TICK);
        assert_eq!(repeater.tick(0.0), 0);
        assert!(repeater.tick(1.2) >= 1);
    }
}
