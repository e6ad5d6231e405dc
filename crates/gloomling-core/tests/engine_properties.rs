//! Property tests for the decay and evolution engine.
//!
//! These generate arbitrary vitals and interleavings of time and feeding,
//! and check that stats stay bounded, stages only move forward, and a
//! single long step agrees exactly with the same span ticked minute by
//! minute.

#![allow(clippy::unwrap_used)]

use gloomling_core::economy::apply_offering;
use gloomling_core::{Vitals, step};
use gloomling_types::{DailyCounters, OfferingKind, PetStats, Stage};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A stat in hundredths, 0.00 to 100.00.
fn stat() -> impl Strategy<Value = Decimal> {
    (0_i64..=10_000).prop_map(|v| Decimal::new(v, 2))
}

fn stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Egg),
        Just(Stage::Baby),
        Just(Stage::Teen),
        Just(Stage::Abomination),
    ]
}

fn vitals() -> impl Strategy<Value = Vitals> {
    (stat(), stat(), stat(), stage(), 0_u64..20_000, 0_u32..6).prop_map(
        |(hunger, sanity, corruption, stage, age, daily_feeds)| Vitals {
            stats: PetStats {
                hunger,
                sanity,
                corruption,
            },
            stage,
            age,
            counters: DailyCounters {
                daily_feeds,
                game_day: age / 1440,
            },
            is_alive: true,
        },
    )
}

#[derive(Debug, Clone)]
enum Op {
    Tick(u64),
    Feed(OfferingKind),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0_u64..3_000).prop_map(Op::Tick),
        Just(Op::Feed(OfferingKind::Purity)),
        Just(Op::Feed(OfferingKind::Rot)),
    ]
}

proptest! {
    #[test]
    fn stats_stay_within_bounds(start in vitals(), minutes in 0_u64..50_000) {
        let out = step(&start, minutes).unwrap();
        prop_assert!(out.next.stats.is_within_bounds());
    }

    #[test]
    fn single_jump_equals_minute_by_minute(start in vitals(), minutes in 0_u64..600) {
        let jump = step(&start, minutes).unwrap().next;
        let mut iter = start;
        for _ in 0..minutes {
            iter = step(&iter, 1).unwrap().next;
        }
        prop_assert_eq!(jump, iter);
    }

    #[test]
    fn stages_never_move_backwards(start in vitals(), ops in prop::collection::vec(op(), 1..40)) {
        let mut current = start;
        for op in ops {
            let next = match op {
                Op::Tick(minutes) => step(&current, minutes).unwrap().next,
                Op::Feed(kind) => apply_offering(&current, kind).next,
            };
            prop_assert!(next.stage >= current.stage);
            prop_assert!(next.stats.is_within_bounds());
            prop_assert!(next.age >= current.age);
            current = next;
        }
    }

    #[test]
    fn excess_corruption_forces_abomination(start in vitals(), extra in 1_i64..=2_000) {
        let corrupted = Vitals {
            stats: PetStats {
                corruption: dec!(80) + Decimal::new(extra, 2),
                ..start.stats
            },
            ..start
        };
        prop_assert_eq!(step(&corrupted, 1).unwrap().next.stage, Stage::Abomination);
        prop_assert_eq!(
            apply_offering(&corrupted, OfferingKind::Rot).next.stage,
            Stage::Abomination
        );
    }
}
