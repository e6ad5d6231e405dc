//! The engine's working set and the clamped stat arithmetic it relies on.
//!
//! All stat mutation goes through [`raise`] and [`lower`], which saturate
//! at the bounds instead of overflowing, so no value outside 0 to 100 is
//! ever observable.

use gloomling_types::{DailyCounters, PetStats, Stage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::{STAT_MAX, STAT_MIN};

/// Everything the decay and evolution rules read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    /// Hunger, sanity, corruption.
    pub stats: PetStats,
    /// Evolutionary stage.
    pub stage: Stage,
    /// Age in game-minutes.
    pub age: u64,
    /// Feed and day counters.
    pub counters: DailyCounters,
    /// False once the pet has collapsed.
    pub is_alive: bool,
}

impl Vitals {
    /// Vitals of a freshly created pet.
    pub const fn newborn() -> Self {
        Self {
            stats: PetStats::newborn(),
            stage: Stage::Egg,
            age: 0,
            counters: DailyCounters {
                daily_feeds: 0,
                game_day: 0,
            },
            is_alive: true,
        }
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::newborn()
    }
}

/// Clamp a value into the stat range.
pub fn clamp_stat(value: Decimal) -> Decimal {
    value.clamp(STAT_MIN, STAT_MAX)
}

/// Add `amount` to a stat, saturating at 100.
pub fn raise(value: Decimal, amount: Decimal) -> Decimal {
    value.checked_add(amount).map_or(STAT_MAX, clamp_stat)
}

/// Subtract `amount` from a stat, saturating at 0.
pub fn lower(value: Decimal, amount: Decimal) -> Decimal {
    value.checked_sub(amount).map_or(STAT_MIN, clamp_stat)
}

/// `rate * minutes`, or `None` if the product does not fit.
pub fn scaled(rate: Decimal, minutes: u64) -> Option<Decimal> {
    rate.checked_mul(Decimal::from(minutes))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn raise_and_lower_saturate() {
        assert_eq!(raise(dec!(95), dec!(20)), dec!(100));
        assert_eq!(lower(dec!(5), dec!(20)), dec!(0));
        assert_eq!(raise(dec!(10), dec!(0.05)), dec!(10.05));
        assert_eq!(lower(dec!(10), dec!(0.02)), dec!(9.98));
    }

    #[test]
    fn raise_survives_decimal_overflow() {
        assert_eq!(raise(Decimal::MAX, Decimal::MAX), STAT_MAX);
        assert_eq!(lower(Decimal::MIN, Decimal::MAX), STAT_MIN);
    }

    #[test]
    fn newborn_vitals() {
        let v = Vitals::newborn();
        assert_eq!(v.stage, Stage::Egg);
        assert_eq!(v.age, 0);
        assert!(v.is_alive);
        assert_eq!(v.counters, DailyCounters::default());
    }
}
