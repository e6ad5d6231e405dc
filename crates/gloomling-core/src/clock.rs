//! Mapping between real time and game time.
//!
//! One real second is one game-minute. The scheduler fires every
//! `tick_interval_ms` real milliseconds and each firing advances the pet by
//! `tick_interval_ms / 1000` game-minutes. Offline catch-up converts the
//! wall-clock gap since the last committed tick with the same ratio, so a
//! process that was stopped for an hour and one that ticked all hour agree.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::rules::MS_PER_GAME_MINUTE;

/// Errors that can occur when building a [`GameClock`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The cadence is zero or not a whole number of game-minutes.
    #[error("tick interval must be a positive multiple of {MS_PER_GAME_MINUTE} ms, got {interval_ms}")]
    InvalidCadence {
        /// The rejected interval.
        interval_ms: u64,
    },
}

/// Scheduler cadence expressed both in real and game time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameClock {
    interval_ms: u64,
    minutes_per_tick: u64,
}

impl GameClock {
    /// Build a clock for the given real-millisecond cadence.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidCadence`] unless `interval_ms` is a
    /// positive multiple of [`MS_PER_GAME_MINUTE`].
    pub fn new(interval_ms: u64) -> Result<Self, ClockError> {
        let remainder = interval_ms.checked_rem(MS_PER_GAME_MINUTE).unwrap_or(1);
        if interval_ms == 0 || remainder != 0 {
            return Err(ClockError::InvalidCadence { interval_ms });
        }
        let minutes_per_tick = interval_ms.checked_div(MS_PER_GAME_MINUTE).unwrap_or(1);
        Ok(Self {
            interval_ms,
            minutes_per_tick,
        })
    }

    /// Real milliseconds between ticks.
    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Game-minutes advanced by one tick.
    pub const fn minutes_per_tick(&self) -> u64 {
        self.minutes_per_tick
    }

    /// The cadence as a [`Duration`] for the timer.
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self {
            interval_ms: MS_PER_GAME_MINUTE,
            minutes_per_tick: 1,
        }
    }
}

/// Whole game-minutes between two wall-clock instants.
///
/// Partial minutes are dropped. A `now` earlier than `since` (clock moved
/// backwards) yields zero.
pub fn elapsed_game_minutes(since: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let millis = now.signed_duration_since(since).num_milliseconds();
    u64::try_from(millis)
        .unwrap_or(0)
        .checked_div(MS_PER_GAME_MINUTE)
        .unwrap_or(0)
}
