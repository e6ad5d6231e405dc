//! Numeric rules of the simulation.
//!
//! Every rate, threshold, and delta the engine and economy apply lives
//! here so the two call paths (per-tick and offline catch-up) read the same
//! numbers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Lowest value any stat may hold.
pub const STAT_MIN: Decimal = Decimal::ZERO;

/// Highest value any stat may hold.
pub const STAT_MAX: Decimal = Decimal::ONE_HUNDRED;

/// Hunger gained per game-minute.
pub const HUNGER_PER_MINUTE: Decimal = dec!(0.05);

/// Sanity lost per game-minute.
pub const SANITY_PER_MINUTE: Decimal = dec!(0.02);

/// Corruption strictly above this forces [`Stage::Abomination`](gloomling_types::Stage::Abomination).
pub const CORRUPTION_LIMIT: Decimal = dec!(80);

/// Age at which an egg hatches.
pub const HATCH_AGE_MINUTES: u64 = 5;

/// Age at which a baby becomes a teen.
pub const TEEN_AGE_MINUTES: u64 = 1440;

/// Length of one game-day.
pub const MINUTES_PER_DAY: u64 = 1440;

/// Real milliseconds per game-minute.
pub const MS_PER_GAME_MINUTE: u64 = 1000;

/// Maximum number of offerings held at once.
pub const INVENTORY_CAPACITY: usize = 3;

/// Feeds per day before the overfeeding penalty applies.
pub const DAILY_FEED_ALLOWANCE: u32 = 3;

/// Hunger removed by any offering.
pub const FEED_HUNGER_RELIEF: Decimal = dec!(20);

/// Sanity restored by a pure offering.
pub const PURITY_SANITY_GAIN: Decimal = dec!(10);

/// Corruption cleansed by a pure offering.
pub const PURITY_CORRUPTION_LOSS: Decimal = dec!(5);

/// Sanity eroded by a rotten offering.
pub const ROT_SANITY_LOSS: Decimal = dec!(15);

/// Corruption added by a rotten offering.
pub const ROT_CORRUPTION_GAIN: Decimal = dec!(10);

/// Extra sanity lost on every feed past the daily allowance.
pub const OVERFEED_SANITY_PENALTY: Decimal = dec!(20);

/// Offline gaps at least this long earn a "time passed" log entry.
pub const CATCH_UP_NOTICE_MINUTES: u64 = 60;

/// Log entries kept when storage reports it is full.
pub const QUOTA_TRIM_KEEP: usize = 50;

/// Default ring-buffer size of the narrative log.
pub const DEFAULT_LOG_CAPACITY: usize = 200;
