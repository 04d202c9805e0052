//! Cost attribution for irrigation log entries.
//!
//! An irrigation is priced once, when its log entry is first attached to a
//! cycle: the stage and week are derived as of the entry's own date, the
//! scheduled formula is resolved for that point, and every nutrient is
//! priced from the site's inventory item at its *current* average cost.
//! Prices are not frozen; two entries logged around a purchase may get
//! different unit costs.

use serde::Serialize;

use crate::models::{
    scoped_item_id, site_of, CultivationCycle, FormulaSchedule, InventoryItem, LogEntry, Location,
    NutrientFormula,
};
use crate::schedule::resolve_formula;
use crate::stage::{derive_stage, StageInfo};

/// Read-only lookups needed to price an irrigation.
#[derive(Debug, Clone, Copy)]
pub struct CostContext<'a> {
    pub schedule: &'a FormulaSchedule,
    pub formulas: &'a [NutrientFormula],
    pub inventory: &'a [InventoryItem],
    pub locations: &'a [Location],
}

/// Price of one nutrient of the applied formula.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientCost {
    /// Site-scoped item id, or the base id when the site is unknown
    pub inventory_item_id: String,
    /// Stock units consumed
    pub quantity: f64,
    pub unit_cost: f64,
    pub cost: f64,
    /// False when no inventory item could be found; `cost` is then zero
    pub priced: bool,
}

/// How an irrigation cost was put together.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub stage: StageInfo,
    pub formula_id: Option<String>,
    pub lines: Vec<NutrientCost>,
    pub total: f64,
}

impl CostBreakdown {
    /// True when some nutrient could not be priced.
    pub fn is_partial(&self) -> bool {
        self.formula_id.is_none() || self.lines.iter().any(|l| !l.priced)
    }
}

/// Computes the cost of the irrigation in `entry` without modifying it.
///
/// Returns `None` when the entry has no irrigation or a non-positive
/// volume. Missing formulas or inventory items contribute zero.
pub fn price_irrigation(
    cycle: &CultivationCycle,
    entry: &LogEntry,
    ctx: &CostContext<'_>,
) -> Option<CostBreakdown> {
    let irrigation = entry.irrigation.as_ref()?;
    if irrigation.volume.is_nan() || irrigation.volume <= 0.0 {
        return None;
    }

    let stage = derive_stage(cycle, entry.date);
    let formula = resolve_formula(
        stage.stage,
        stage.week_in_stage,
        ctx.schedule,
        ctx.formulas,
    );
    let Some(formula) = formula else {
        return Some(CostBreakdown {
            stage,
            formula_id: None,
            lines: Vec::new(),
            total: 0.0,
        });
    };

    let site = site_of(&cycle.location_id, ctx.locations);
    let lines: Vec<NutrientCost> = formula
        .nutrients
        .iter()
        .map(|nutrient| {
            let quantity = nutrient.amount_per_liter * irrigation.volume;
            let item_id = match site {
                Some(site) => scoped_item_id(&nutrient.inventory_item_id, site),
                None => nutrient.inventory_item_id.clone(),
            };
            let item = site.and_then(|_| ctx.inventory.iter().find(|i| i.id == item_id));
            match item {
                Some(item) => NutrientCost {
                    inventory_item_id: item_id,
                    quantity,
                    unit_cost: item.average_cost_per_unit(),
                    cost: item.value_of(quantity),
                    priced: true,
                },
                None => NutrientCost {
                    inventory_item_id: item_id,
                    quantity,
                    unit_cost: 0.0,
                    cost: 0.0,
                    priced: false,
                },
            }
        })
        .collect();

    let total = lines.iter().map(|l| l.cost).sum();
    Some(CostBreakdown {
        stage,
        formula_id: Some(formula.id.clone()),
        lines,
        total,
    })
}

/// Prices the irrigation of a new log entry and stamps the cost on it.
///
/// Entries that already carry a cost are left untouched, so calling this
/// again is a no-op.
pub fn attribute_irrigation_cost(
    cycle: &CultivationCycle,
    entry: &mut LogEntry,
    ctx: &CostContext<'_>,
) -> Option<CostBreakdown> {
    if entry.irrigation.as_ref().map_or(true, |i| i.is_priced()) {
        return None;
    }
    let breakdown = price_irrigation(cycle, entry, ctx)?;
    if let Some(irrigation) = entry.irrigation.as_mut() {
        irrigation.cost = Some(breakdown.total);
    }

    if breakdown.is_partial() {
        tracing::debug!(
            cycle = %cycle.id,
            entry = %entry.id,
            "Irrigation priced partially at {:.4}",
            breakdown.total
        );
    }
    Some(breakdown)
}
