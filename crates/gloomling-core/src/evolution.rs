//! Stage evolution rules.
//!
//! Rules are checked in precedence order and re-applied until none fires,
//! so a single large time jump can carry an egg straight through to a teen:
//!
//! 1. corruption above 80 forces `ABOMINATION` from any stage
//! 2. `EGG` with age >= 5 becomes `BABY`
//! 3. `BABY` with age >= 1440 becomes `TEEN`
//!
//! Every rule moves strictly forward in [`Stage`] order and `ABOMINATION`
//! has no outgoing rule, so the loop terminates within three rounds.

use gloomling_types::Stage;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::rules::{CORRUPTION_LIMIT, HATCH_AGE_MINUTES, TEEN_AGE_MINUTES};

/// A change of stage produced by one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    /// Stage before evaluation.
    pub from: Stage,
    /// Stage after evaluation.
    pub to: Stage,
}

/// The first rule that fires for the given state, if any.
pub fn next_stage(stage: Stage, age: u64, corruption: Decimal) -> Option<Stage> {
    if stage.is_terminal() {
        return None;
    }
    if corruption > CORRUPTION_LIMIT {
        return Some(Stage::Abomination);
    }
    match stage {
        Stage::Egg if age >= HATCH_AGE_MINUTES => Some(Stage::Baby),
        Stage::Baby if age >= TEEN_AGE_MINUTES => Some(Stage::Teen),
        _ => None,
    }
}

/// Apply [`next_stage`] until it stops firing.
pub fn evolve(stage: Stage, age: u64, corruption: Decimal) -> Stage {
    let mut current = stage;
    while let Some(next) = next_stage(current, age, corruption) {
        current = next;
    }
    current
}

/// Evaluate [`evolve`] and report the transition, if one happened.
pub fn transition(stage: Stage, age: u64, corruption: Decimal) -> Option<StageTransition> {
    let to = evolve(stage, age, corruption);
    (to != stage).then_some(StageTransition { from: stage, to })
}
