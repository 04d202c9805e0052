//! Stage engine.
//!
//! Infers where a cultivation cycle is in its life from its transition
//! timestamps. Nothing here is cached: callers re-derive on every read,
//! for "now" or for any past or future instant (calendar projections).

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::models::{CultivationCycle, Stage};

/// Derived position of a cycle at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageInfo {
    pub stage: Stage,
    pub days_in_stage: u32,
    /// 1-based
    pub week_in_stage: u32,
    /// 1..=7
    pub day_of_week_in_stage: u32,
    pub total_days: u32,
    pub total_week: u32,
    pub total_day_of_week: u32,
    pub can_advance: bool,
}

/// Whole days from `from` to `to`, clamped at zero.
fn whole_days(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let days = (to - from).num_days().max(0);
    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Derives the stage of `cycle` as of `as_of`.
///
/// The latest stage whose transition timestamp is set and not after
/// `as_of` wins; with none, the cycle is cloning. Day counts before the
/// cloning date clamp to zero. Never fails.
pub fn derive_stage(cycle: &CultivationCycle, as_of: DateTime<Utc>) -> StageInfo {
    let total_days = whole_days(cycle.cloned_at, as_of);

    let (stage, started_at) = Stage::ALL
        .iter()
        .rev()
        .find_map(|s| {
            cycle
                .transition_at(*s)
                .filter(|at| as_of >= *at)
                .map(|at| (*s, at))
        })
        .unwrap_or((Stage::Cloning, cycle.cloned_at));

    let days_in_stage = whole_days(started_at, as_of);

    StageInfo {
        stage,
        days_in_stage,
        week_in_stage: days_in_stage / 7 + 1,
        day_of_week_in_stage: days_in_stage % 7 + 1,
        total_days,
        total_week: total_days / 7 + 1,
        total_day_of_week: total_days % 7 + 1,
        can_advance: !stage.is_terminal(),
    }
}

impl CultivationCycle {
    pub fn stage_at(&self, as_of: DateTime<Utc>) -> StageInfo {
        derive_stage(self, as_of)
    }

    pub fn stage_now(&self) -> StageInfo {
        derive_stage(self, Utc::now())
    }
}

impl fmt::Display for StageInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, week {} day {} (day {} overall, week {})",
            self.stage,
            self.week_in_stage,
            self.day_of_week_in_stage,
            self.total_days,
            self.total_week
        )
    }
}
