use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::stage::Stage;

/// One ingredient of a nutrient formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulaNutrient {
    /// Base inventory item id, not scoped to a site
    pub inventory_item_id: String,
    /// Stock units per litre of water
    pub amount_per_liter: f64,
}

impl FormulaNutrient {
    pub fn new(inventory_item_id: impl Into<String>, amount_per_liter: f64) -> Self {
        Self {
            inventory_item_id: inventory_item_id.into(),
            amount_per_liter,
        }
    }
}

/// A nutrient recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientFormula {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ppm: Option<f64>,
    #[serde(default)]
    pub nutrients: Vec<FormulaNutrient>,
}

impl NutrientFormula {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            target_ppm: None,
            nutrients: Vec::new(),
        }
    }

    pub fn with_target_ppm(mut self, ppm: f64) -> Self {
        self.target_ppm = Some(ppm);
        self
    }

    pub fn with_nutrients(mut self, nutrients: Vec<FormulaNutrient>) -> Self {
        self.nutrients = nutrients;
        self
    }
}

impl fmt::Display for NutrientFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.name, self.id)?;
        if let Some(ppm) = self.target_ppm {
            writeln!(f, "Target: {} ppm", ppm)?;
        }
        if self.nutrients.is_empty() {
            writeln!(f, "  (water only)")?;
        }
        for n in &self.nutrients {
            writeln!(f, "  - {}: {} per L", n.inventory_item_id, n.amount_per_liter)?;
        }
        Ok(())
    }
}

/// Sparse mapping of stage -> week within stage -> formula id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormulaSchedule(BTreeMap<Stage, BTreeMap<u32, String>>);

impl FormulaSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `formula_id` to `week` of `stage`, replacing any previous entry.
    pub fn set(&mut self, stage: Stage, week: u32, formula_id: impl Into<String>) {
        self.0.entry(stage).or_default().insert(week, formula_id.into());
    }

    pub fn with(mut self, stage: Stage, week: u32, formula_id: impl Into<String>) -> Self {
        self.set(stage, week, formula_id);
        self
    }

    /// Week -> formula id entries listed for `stage`.
    pub fn weeks(&self, stage: Stage) -> Option<&BTreeMap<u32, String>> {
        self.0.get(&stage).filter(|weeks| !weeks.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|weeks| weeks.is_empty())
    }
}
