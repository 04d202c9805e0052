//! Formula scheduler.
//!
//! Maps (stage, week in stage) to the nutrient formula a cycle should be
//! fed, and projects that mapping over a multi-week calendar.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::models::{CultivationCycle, FormulaSchedule, NutrientFormula, Stage};
use crate::stage::{derive_stage, StageInfo};

/// Formula id scheduled for `week` of `stage`.
///
/// Weeks past the last tabulated week keep the last entry (steady state).
/// Weeks before the first entry, gaps between entries, and stages with no
/// entries have no formula.
pub fn scheduled_formula_id(stage: Stage, week: u32, schedule: &FormulaSchedule) -> Option<&str> {
    let weeks = schedule.weeks(stage)?;
    if let Some(id) = weeks.get(&week) {
        return Some(id.as_str());
    }
    let (last_week, id) = weeks.iter().next_back()?;
    if week > *last_week {
        Some(id.as_str())
    } else {
        None
    }
}

/// Resolves the formula for `week` of `stage` against `catalog`.
///
/// An id missing from the catalog is treated the same as no schedule.
pub fn resolve_formula<'a>(
    stage: Stage,
    week: u32,
    schedule: &FormulaSchedule,
    catalog: &'a [NutrientFormula],
) -> Option<&'a NutrientFormula> {
    let formula_id = scheduled_formula_id(stage, week, schedule)?;
    catalog.iter().find(|f| f.id == formula_id)
}

/// One row of a projected feeding calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarWeek {
    /// Monday of the week
    pub week_start: NaiveDate,
    /// `None` for weeks before the cycle was cloned
    pub stage: Option<StageInfo>,
    pub formula_id: Option<String>,
}

/// Mondays from `back` weeks before the week of `anchor` to `ahead - 1`
/// weeks after it, cut off at the limits of the calendar.
pub fn weeks_around(anchor: NaiveDate, back: u32, ahead: u32) -> Vec<NaiveDate> {
    let into_week = Duration::days(i64::from(anchor.weekday().num_days_from_monday()));
    let Some(monday) = anchor.checked_sub_signed(into_week) else {
        return Vec::new();
    };
    let first = -(i64::from(back).min((monday - NaiveDate::MIN).num_weeks()));
    let last = i64::from(ahead).min((NaiveDate::MAX - monday).num_weeks() + 1);
    (first..last)
        .filter_map(|offset| monday.checked_add_signed(Duration::weeks(offset)))
        .collect()
}

fn midweek(week_start: NaiveDate) -> Option<DateTime<Utc>> {
    week_start
        .checked_add_signed(Duration::days(3))?
        .and_hms_opt(12, 0, 0)
        .map(|naive| naive.and_utc())
}

/// Projects stage and scheduled formula of `cycle` for each week,
/// sampling the middle of the week.
pub fn project_calendar(
    cycle: &CultivationCycle,
    week_starts: &[NaiveDate],
    schedule: &FormulaSchedule,
    catalog: &[NutrientFormula],
) -> Vec<CalendarWeek> {
    week_starts
        .iter()
        .map(|week_start| {
            let stage = midweek(*week_start)
                .filter(|at| *at >= cycle.cloned_at)
                .map(|at| derive_stage(cycle, at));
            let formula_id = stage
                .and_then(|info| {
                    resolve_formula(info.stage, info.week_in_stage, schedule, catalog)
                })
                .map(|f| f.id.clone());
            CalendarWeek {
                week_start: *week_start,
                stage,
                formula_id,
            }
        })
        .collect()
}
