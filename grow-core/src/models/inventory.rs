//! Inventory items and their purchase ledger.
//!
//! Both `current_stock` and `average_cost_per_unit` are derived from the
//! ledger lists and are only ever written by [`InventoryItem::recompute`].
//! The average is cumulative over the whole purchase history, so an old
//! purchase at a very different price keeps influencing it.
//!
//! Consumption is accounted differently per [`InventoryKind`]:
//! cultivation nutrients used by irrigations are priced (see
//! [`crate::costing`]) but never decrement stock, while maintenance parts
//! are withdrawn from stock when a maintenance task uses them. Changing
//! that asymmetry would change historical cost reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum LedgerError {
    #[error(
        "Item {0} is a cultivation input; its consumption is priced, not withdrawn from stock"
    )]
    UntrackedConsumption(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(f64),

    #[error("Invalid cost: {0}")]
    InvalidCost(f64),
}

/// Accounting class of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryKind {
    #[default]
    Cultivation,
    Maintenance,
}

impl fmt::Display for InventoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InventoryKind::Cultivation => write!(f, "cultivation"),
            InventoryKind::Maintenance => write!(f, "maintenance"),
        }
    }
}

/// One purchase, already converted to stock units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub date: DateTime<Utc>,
    pub quantity: f64,
    pub total_cost: f64,
}

/// Stock taken out for a maintenance task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    pub date: DateTime<Utc>,
    pub quantity: f64,
    /// Maintenance log that consumed the stock
    pub reference: String,
}

/// Builds the id of the copy of `base_id` held at `site_id`.
///
/// Items exist once per item per site, e.g. `inv-yc` at `loc-mc` is
/// `inv-yc-loc-mc`.
pub fn scoped_item_id(base_id: &str, site_id: &str) -> String {
    format!("{}-{}", base_id, site_id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub kind: InventoryKind,
    /// Site holding this stock
    pub location_id: String,
    /// Stock unit (g, ml, piece...)
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_unit: Option<String>,
    /// Stock units per purchase unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_unit_conversion: Option<f64>,
    #[serde(default)]
    purchases: Vec<Purchase>,
    #[serde(default)]
    withdrawals: Vec<Withdrawal>,
    #[serde(default)]
    current_stock: f64,
    #[serde(default)]
    average_cost_per_unit: f64,
}

impl InventoryItem {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: InventoryKind,
        location_id: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            kind,
            location_id: location_id.into(),
            unit: unit.into(),
            purchase_unit: None,
            purchase_unit_conversion: None,
            purchases: Vec::new(),
            withdrawals: Vec::new(),
            current_stock: 0.0,
            average_cost_per_unit: 0.0,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Items bought in a larger unit, e.g. kg bags stocked in grams
    /// (`factor` 1000).
    pub fn with_purchase_unit(mut self, unit: impl Into<String>, factor: f64) -> Self {
        self.purchase_unit = Some(unit.into());
        self.purchase_unit_conversion = Some(factor);
        self
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    pub fn withdrawals(&self) -> &[Withdrawal] {
        &self.withdrawals
    }

    pub fn current_stock(&self) -> f64 {
        self.current_stock
    }

    pub fn average_cost_per_unit(&self) -> f64 {
        self.average_cost_per_unit
    }

    /// Stock units per purchase unit; 1 without a configured purchase unit.
    pub fn conversion_factor(&self) -> f64 {
        match (&self.purchase_unit, self.purchase_unit_conversion) {
            (Some(_), Some(factor)) if factor > 0.0 => factor,
            _ => 1.0,
        }
    }

    /// Records a purchase made now. `purchase_quantity` is in purchase units.
    pub fn record_purchase(
        &mut self,
        purchase_quantity: f64,
        total_cost: f64,
    ) -> Result<&Purchase, LedgerError> {
        self.record_purchase_at(purchase_quantity, total_cost, Utc::now())
    }

    /// Records a purchase made at `at`.
    ///
    /// Corrections are recorded as further purchases, with negative
    /// quantities or costs where needed; nothing is ever removed, so
    /// non-finite values are rejected before they reach the history.
    pub fn record_purchase_at(
        &mut self,
        purchase_quantity: f64,
        total_cost: f64,
        at: DateTime<Utc>,
    ) -> Result<&Purchase, LedgerError> {
        let quantity = purchase_quantity * self.conversion_factor();
        if !quantity.is_finite() {
            return Err(LedgerError::InvalidQuantity(purchase_quantity));
        }
        if !total_cost.is_finite() {
            return Err(LedgerError::InvalidCost(total_cost));
        }
        self.purchases.push(Purchase {
            date: at,
            quantity,
            total_cost,
        });
        self.recompute();
        Ok(&self.purchases[self.purchases.len() - 1])
    }

    /// Takes maintenance stock out for the maintenance log `reference`.
    pub fn withdraw(
        &mut self,
        quantity: f64,
        at: DateTime<Utc>,
        reference: impl Into<String>,
    ) -> Result<(), LedgerError> {
        if self.kind != InventoryKind::Maintenance {
            return Err(LedgerError::UntrackedConsumption(self.id.clone()));
        }
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(LedgerError::InvalidQuantity(quantity));
        }
        self.withdrawals.push(Withdrawal {
            date: at,
            quantity,
            reference: reference.into(),
        });
        self.recompute();
        Ok(())
    }

    /// Re-derives stock and average cost from the ledger lists.
    pub fn recompute(&mut self) {
        let purchased: f64 = self.purchases.iter().map(|p| p.quantity).sum();
        let spent: f64 = self.purchases.iter().map(|p| p.total_cost).sum();
        let withdrawn: f64 = self.withdrawals.iter().map(|w| w.quantity).sum();

        self.current_stock = purchased - withdrawn;
        self.average_cost_per_unit = if purchased > 0.0 {
            spent / purchased
        } else {
            0.0
        };
    }

    /// Cost of `quantity` stock units at the current average.
    pub fn value_of(&self, quantity: f64) -> f64 {
        quantity * self.average_cost_per_unit
    }
}

impl fmt::Display for InventoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.name, self.id)?;
        writeln!(f, "Kind: {} @ {}", self.kind, self.location_id)?;
        writeln!(f, "Stock: {} {}", self.current_stock, self.unit)?;
        writeln!(
            f,
            "Average cost: {:.4} per {}",
            self.average_cost_per_unit, self.unit
        )?;
        if let (Some(unit), Some(factor)) = (&self.purchase_unit, self.purchase_unit_conversion) {
            writeln!(f, "Bought in {} (1 {} = {} {})", unit, unit, factor, self.unit)?;
        }
        writeln!(f, "Purchases: {}", self.purchases.len())?;
        Ok(())
    }
}
