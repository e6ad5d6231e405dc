//! Pure decay, evolution, and collapse step.
//!
//! [`step`] maps `(vitals, elapsed game-minutes)` to the next vitals with no
//! side effects. It is written so that one call with `n` minutes and `n`
//! calls with one minute land on exactly the same vitals, which is what
//! lets offline catch-up run as a single jump.
//!
//! # Order of operations
//!
//! 1. Dead pets and zero elapsed are returned unchanged
//! 2. Find the collapse minute; if it falls inside the span, stop there
//! 3. Advance age (checked)
//! 4. Raise hunger, lower sanity, both saturating
//! 5. Count day boundaries and reset the feed counter if any were crossed
//! 6. Evolve to a fixpoint on the post-decay state

use gloomling_types::PetStats;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::evolution::{StageTransition, transition};
use crate::rules::{
    DAILY_FEED_ALLOWANCE, HUNGER_PER_MINUTE, MINUTES_PER_DAY, SANITY_PER_MINUTE, STAT_MAX,
    STAT_MIN,
};
use crate::vitals::{Vitals, lower, raise, scaled};

/// Errors the engine can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Advancing would push age past `u64::MAX`.
    #[error("age overflow: {age} + {elapsed} game-minutes exceeds u64::MAX")]
    AgeOverflow {
        /// Age before the step.
        age: u64,
        /// Minutes the step tried to apply.
        elapsed: u64,
    },
}

/// Everything a caller needs to know about one engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Vitals before the step.
    pub previous: Vitals,
    /// Vitals after the step.
    pub next: Vitals,
    /// Minutes actually applied. Less than requested only on collapse.
    pub minutes_applied: u64,
    /// Stage change, if any.
    pub transition: Option<StageTransition>,
    /// Number of 1440-minute boundaries crossed.
    pub days_crossed: u64,
    /// True if the pet collapsed during this step.
    pub died: bool,
}

impl StepOutcome {
    const fn unchanged(vitals: Vitals) -> Self {
        Self {
            previous: vitals,
            next: vitals,
            minutes_applied: 0,
            transition: None,
            days_crossed: 0,
            died: false,
        }
    }

    /// Whether the next vitals differ from the previous ones.
    pub fn changed(&self) -> bool {
        self.previous != self.next
    }
}

/// Advance `vitals` by `elapsed_minutes` game-minutes.
///
/// # Errors
///
/// Returns [`EngineError::AgeOverflow`] if the new age does not fit in a
/// `u64`. Every other input is handled.
pub fn step(vitals: &Vitals, elapsed_minutes: u64) -> Result<StepOutcome, EngineError> {
    if elapsed_minutes == 0 || !vitals.is_alive {
        return Ok(StepOutcome::unchanged(*vitals));
    }

    let collapse = collapse_minute(&vitals.stats);
    let died = collapse <= elapsed_minutes;
    let minutes = if died { collapse } else { elapsed_minutes };

    let age = vitals
        .age
        .checked_add(minutes)
        .ok_or(EngineError::AgeOverflow {
            age: vitals.age,
            elapsed: minutes,
        })?;

    let hunger = scaled(HUNGER_PER_MINUTE, minutes)
        .map_or(STAT_MAX, |gain| raise(vitals.stats.hunger, gain));
    let sanity = scaled(SANITY_PER_MINUTE, minutes)
        .map_or(STAT_MIN, |loss| lower(vitals.stats.sanity, loss));
    let stats = PetStats {
        hunger,
        sanity,
        corruption: vitals.stats.corruption,
    };

    let days_crossed = day_index(age).saturating_sub(day_index(vitals.age));
    let mut counters = vitals.counters;
    if days_crossed > 0 {
        counters.daily_feeds = 0;
        counters.game_day = counters.game_day.saturating_add(days_crossed);
    }

    let stage_change = transition(vitals.stage, age, stats.corruption);
    let stage = stage_change.map_or(vitals.stage, |t| t.to);

    Ok(StepOutcome {
        previous: *vitals,
        next: Vitals {
            stats,
            stage,
            age,
            counters,
            is_alive: !died,
        },
        minutes_applied: minutes,
        transition: stage_change,
        days_crossed,
        died,
    })
}

/// First minute (counting from 1) at which hunger is 100 and sanity is 0.
pub fn collapse_minute(stats: &PetStats) -> u64 {
    let starve = minutes_until(STAT_MAX.checked_sub(stats.hunger), HUNGER_PER_MINUTE);
    let despair = minutes_until(Some(stats.sanity), SANITY_PER_MINUTE);
    starve.max(despair).max(1)
}

fn minutes_until(distance: Option<Decimal>, rate: Decimal) -> u64 {
    distance
        .and_then(|d| d.max(Decimal::ZERO).checked_div(rate))
        .and_then(|minutes| minutes.ceil().to_u64())
        .unwrap_or(u64::MAX)
}

fn day_index(age: u64) -> u64 {
    age.checked_div(MINUTES_PER_DAY).unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Critical crossings
// ---------------------------------------------------------------------------

/// A stat crossing into a dangerous range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriticalEvent {
    /// Hunger reached 100.
    Starving,
    /// Sanity reached 0.
    Madness,
    /// More feeds than the daily allowance.
    Overfed,
}

impl CriticalEvent {
    /// Short machine name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starving => "starving",
            Self::Madness => "madness",
            Self::Overfed => "overfed",
        }
    }

    /// One-time warning text for the narrative log.
    pub const fn warning(self) -> &'static str {
        match self {
            Self::Starving => "WARNING: hunger is at its limit. It is starving.",
            Self::Madness => "WARNING: sanity has run out. Its mind is gone.",
            Self::Overfed => "WARNING: it has been fed too often today. Its mind frays.",
        }
    }
}

/// Crossings between `previous` and `next`, in a fixed order.
///
/// Only edges count: a pet that was already starving does not report
/// [`CriticalEvent::Starving`] again.
pub fn detect_critical(previous: &Vitals, next: &Vitals) -> Vec<CriticalEvent> {
    let mut events = Vec::new();
    if previous.stats.hunger < STAT_MAX && next.stats.hunger >= STAT_MAX {
        events.push(CriticalEvent::Starving);
    }
    if previous.stats.sanity > STAT_MIN && next.stats.sanity <= STAT_MIN {
        events.push(CriticalEvent::Madness);
    }
    if previous.counters.daily_feeds <= DAILY_FEED_ALLOWANCE
        && next.counters.daily_feeds > DAILY_FEED_ALLOWANCE
    {
        events.push(CriticalEvent::Overfed);
    }
    events
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use gloomling_types::{DailyCounters, Stage};
    use rust_decimal_macros::dec;

    use super::*;

    fn vitals(hunger: Decimal, sanity: Decimal, corruption: Decimal) -> Vitals {
        Vitals {
            stats: PetStats {
                hunger,
                sanity,
                corruption,
            },
            ..Vitals::newborn()
        }
    }

    #[test]
    fn one_minute_of_decay() {
        let out = step(&Vitals::newborn(), 1).unwrap();
        assert_eq!(out.next.stats.hunger, dec!(0.05));
        assert_eq!(out.next.stats.sanity, dec!(99.98));
        assert_eq!(out.next.stats.corruption, dec!(0));
        assert_eq!(out.next.age, 1);
        assert!(out.transition.is_none());
        assert!(!out.died);
    }

    #[test]
    fn zero_elapsed_is_identity() {
        let v = vitals(dec!(42), dec!(17), dec!(3));
        let out = step(&v, 0).unwrap();
        assert_eq!(out.next, v);
        assert!(!out.changed());
    }

    #[test]
    fn hunger_clamps_at_one_hundred() {
        let v = vitals(dec!(99.99), dec!(100), dec!(0));
        let out = step(&v, 10).unwrap();
        assert_eq!(out.next.stats.hunger, dec!(100));
        assert!(out.next.is_alive);
    }

    #[test]
    fn egg_jumping_two_thousand_minutes_lands_on_teen() {
        let out = step(&Vitals::newborn(), 2000).unwrap();
        assert_eq!(out.next.stage, Stage::Teen);
        assert_eq!(out.days_crossed, 1);
        assert_eq!(out.next.counters.game_day, 1);
        assert_eq!(out.next.stats.hunger, dec!(100));
        assert_eq!(out.next.stats.sanity, dec!(60));
    }

    #[test]
    fn day_boundary_resets_feeds() {
        let v = Vitals {
            age: 1439,
            stage: Stage::Baby,
            counters: DailyCounters {
                daily_feeds: 3,
                game_day: 0,
            },
            ..Vitals::newborn()
        };
        let out = step(&v, 1).unwrap();
        assert_eq!(out.next.counters.daily_feeds, 0);
        assert_eq!(out.next.counters.game_day, 1);
        assert_eq!(out.next.stage, Stage::Teen);
    }

    #[test]
    fn corruption_forces_abomination_on_step() {
        let v = vitals(dec!(0), dec!(100), dec!(81));
        let out = step(&v, 1).unwrap();
        assert_eq!(out.next.stage, Stage::Abomination);
    }

    #[test]
    fn collapse_stops_the_clock() {
        let v = Vitals {
            stage: Stage::Teen,
            age: 10_000,
            ..vitals(dec!(90), dec!(1), dec!(0))
        };
        assert_eq!(collapse_minute(&v.stats), 200);
        let out = step(&v, 500).unwrap();
        assert!(out.died);
        assert_eq!(out.minutes_applied, 200);
        assert_eq!(out.next.age, 10_200);
        assert_eq!(out.next.stats.hunger, dec!(100));
        assert_eq!(out.next.stats.sanity, dec!(0));
        assert!(!out.next.is_alive);
    }

    #[test]
    fn dead_pet_is_frozen() {
        let v = Vitals {
            is_alive: false,
            ..vitals(dec!(100), dec!(0), dec!(0))
        };
        let out = step(&v, 1_000_000).unwrap();
        assert_eq!(out.next, v);
    }

    #[test]
    fn age_overflow_is_an_error() {
        let v = Vitals {
            age: u64::MAX,
            ..Vitals::newborn()
        };
        assert_eq!(
            step(&v, 1),
            Err(EngineError::AgeOverflow {
                age: u64::MAX,
                elapsed: 1
            })
        );
    }

    #[test]
    fn critical_detection_is_edge_triggered() {
        let before = vitals(dec!(99.97), dec!(0.01), dec!(0));
        let after = step(&before, 1).unwrap().next;
        assert_eq!(
            detect_critical(&before, &after),
            vec![CriticalEvent::Starving, CriticalEvent::Madness]
        );
        let again = step(&after, 1).unwrap().next;
        assert!(detect_critical(&after, &again).is_empty());
    }

    #[test]
    fn overfed_fires_on_fourth_feed() {
        let mut before = Vitals::newborn();
        before.counters.daily_feeds = 3;
        let mut after = before;
        after.counters.daily_feeds = 4;
        assert_eq!(detect_critical(&before, &after), vec![CriticalEvent::Overfed]);
        let mut fifth = after;
        fifth.counters.daily_feeds = 5;
        assert!(detect_critical(&after, &fifth).is_empty());
    }
}
