//! The full record set of one operation and the write paths that keep its
//! derived data consistent.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::costing::{attribute_irrigation_cost, CostBreakdown, CostContext};
use crate::models::{
    scoped_item_id, site_of, BatchError, CultivationCycle, Expense, FormulaSchedule,
    InventoryItem, InventoryKind, Location, LogEntry, MaintenanceLog,
    NutrientFormula, PartUsage, PlantBatch, PlantCount,
};

#[derive(Debug, Error, PartialEq)]
pub enum DatasetError {
    #[error("Cycle not found: {0}")]
    CycleNotFound(String),

    #[error("Cycle already exists: {0}")]
    DuplicateCycle(String),

    #[error("Maintenance log already recorded: {0}")]
    DuplicateMaintenanceLog(String),

    #[error("Log entry {entry}: {field} is not a finite number")]
    NonFiniteReading { entry: String, field: &'static str },

    #[error("Maintenance log {log}: quantity of {item} is not a finite number")]
    NonFinitePart { log: String, item: String },

    #[error(transparent)]
    Batch(#[from] BatchError),
}

fn check_readings<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
) -> Result<(), DatasetError> {
    for entry in entries {
        if let Some(field) = entry.non_finite_field() {
            return Err(DatasetError::NonFiniteReading {
                entry: entry.id.clone(),
                field,
            });
        }
    }
    Ok(())
}

/// Every top-level collection.
///
/// Users, mother plants, genetics, tasks, notifications and announcements
/// are carried through backups and restores as opaque records.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<Value>,
    #[serde(default)]
    pub cycles: Vec<CultivationCycle>,
    #[serde(default)]
    pub batches: Vec<PlantBatch>,
    #[serde(default)]
    pub mother_plants: Vec<Value>,
    #[serde(default)]
    pub genetics: Vec<Value>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub tasks: Vec<Value>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub formulas: Vec<NutrientFormula>,
    #[serde(default)]
    pub formula_schedule: FormulaSchedule,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    #[serde(default)]
    pub notifications: Vec<Value>,
    #[serde(default)]
    pub announcements: Vec<Value>,
    #[serde(default)]
    pub maintenance_logs: Vec<MaintenanceLog>,
}

/// Allocation of plants from one batch to a new cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDraw {
    pub batch_id: String,
    pub plant_count: u32,
}

impl BatchDraw {
    pub fn new(batch_id: impl Into<String>, plant_count: u32) -> Self {
        Self {
            batch_id: batch_id.into(),
            plant_count,
        }
    }
}

/// A part that could not be taken out of stock.
#[derive(Debug, Clone, PartialEq)]
pub struct UnmatchedPart {
    pub part: PartUsage,
    pub reason: String,
}

/// Result of completing a maintenance task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaintenanceOutcome {
    /// Scoped ids of the items stock was withdrawn from
    pub withdrawn: Vec<String>,
    pub unmatched: Vec<UnmatchedPart>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cost_context(&self) -> CostContext<'_> {
        CostContext {
            schedule: &self.formula_schedule,
            formulas: &self.formulas,
            inventory: &self.inventory,
            locations: &self.locations,
        }
    }

    pub fn find_cycle(&self, id: &str) -> Option<&CultivationCycle> {
        self.cycles.iter().find(|c| c.id == id)
    }

    pub fn find_cycle_mut(&mut self, id: &str) -> Option<&mut CultivationCycle> {
        self.cycles.iter_mut().find(|c| c.id == id)
    }

    pub fn find_batch(&self, id: &str) -> Option<&PlantBatch> {
        self.batches.iter().find(|b| b.id == id)
    }

    pub fn find_item(&self, id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|i| i.id == id)
    }

    pub fn find_item_mut(&mut self, id: &str) -> Option<&mut InventoryItem> {
        self.inventory.iter_mut().find(|i| i.id == id)
    }

    pub fn find_formula(&self, id: &str) -> Option<&NutrientFormula> {
        self.formulas.iter().find(|f| f.id == id)
    }

    /// Cycles that are not archived.
    pub fn active_cycles(&self) -> impl Iterator<Item = &CultivationCycle> {
        self.cycles.iter().filter(|c| !c.archived)
    }

    /// Stores `cycle`, pricing every irrigation entry the stored copy does
    /// not have yet. Returns the breakdowns of the entries priced.
    ///
    /// Nothing is stored when a new entry carries a NaN or infinite reading.
    pub fn save_cycle(
        &mut self,
        mut cycle: CultivationCycle,
    ) -> Result<Vec<CostBreakdown>, DatasetError> {
        let stored = self.find_cycle(&cycle.id);
        let new_ids: Vec<String> = cycle
            .log_entries
            .iter()
            .filter(|e| !stored.is_some_and(|s| s.has_log_entry(&e.id)))
            .map(|e| e.id.clone())
            .collect();
        check_readings(
            cycle
                .log_entries
                .iter()
                .filter(|e| new_ids.contains(&e.id)),
        )?;

        let mut priced = Vec::new();
        {
            let snapshot = cycle.clone();
            let ctx = self.cost_context();
            for entry in cycle
                .log_entries
                .iter_mut()
                .filter(|e| new_ids.contains(&e.id))
            {
                if let Some(breakdown) = attribute_irrigation_cost(&snapshot, entry, &ctx) {
                    priced.push(breakdown);
                }
            }
        }

        match self.cycles.iter().position(|c| c.id == cycle.id) {
            Some(index) => self.cycles[index] = cycle,
            None => self.cycles.push(cycle),
        }
        Ok(priced)
    }

    /// Appends one new entry to a stored cycle and prices it.
    ///
    /// An entry whose id the cycle already has is ignored.
    pub fn record_log_entry(
        &mut self,
        cycle_id: &str,
        mut entry: LogEntry,
    ) -> Result<Option<CostBreakdown>, DatasetError> {
        let cycle = self
            .find_cycle(cycle_id)
            .ok_or_else(|| DatasetError::CycleNotFound(cycle_id.to_string()))?;
        if cycle.has_log_entry(&entry.id) {
            return Ok(None);
        }
        check_readings([&entry])?;

        let breakdown = attribute_irrigation_cost(cycle, &mut entry, &self.cost_context());
        if let Some(cycle) = self.find_cycle_mut(cycle_id) {
            cycle.log_entries.push(entry);
        }
        Ok(breakdown)
    }

    /// Configures a new cycle from plants drawn out of one or more batches.
    ///
    /// All draws are checked before any batch is touched. The cycle records
    /// where its plants came from and starts its log with the batches'
    /// entries, oldest first.
    pub fn start_cycle(
        &mut self,
        mut draft: CultivationCycle,
        draws: &[BatchDraw],
    ) -> Result<&CultivationCycle, DatasetError> {
        if self.find_cycle(&draft.id).is_some() {
            return Err(DatasetError::DuplicateCycle(draft.id));
        }
        check_readings(&draft.log_entries)?;

        let mut staged: Vec<(usize, PlantBatch)> = Vec::with_capacity(draws.len());
        for draw in draws {
            let index = self
                .batches
                .iter()
                .position(|b| b.id == draw.batch_id)
                .ok_or_else(|| BatchError::NotFound(draw.batch_id.clone()))?;
            // Repeated batch ids draw from the already-staged copy
            let slot = match staged.iter().position(|(i, _)| *i == index) {
                Some(slot) => slot,
                None => {
                    staged.push((index, self.batches[index].clone()));
                    staged.len() - 1
                }
            };
            staged[slot].1.draw(draw.plant_count)?;
        }

        // Entries supplied with the draft are priced; inherited batch
        // entries are history and keep whatever they carry.
        let mut priced = 0;
        {
            let snapshot = draft.clone();
            let ctx = self.cost_context();
            for entry in draft.log_entries.iter_mut() {
                if attribute_irrigation_cost(&snapshot, entry, &ctx).is_some() {
                    priced += 1;
                }
            }
        }

        let mut inherited: Vec<LogEntry> = staged
            .iter()
            .flat_map(|(_, batch)| batch.log_entries.iter().cloned())
            .collect();
        inherited.sort_by(|a, b| a.date.cmp(&b.date));
        inherited.extend(draft.log_entries.drain(..));
        draft.log_entries = inherited;

        draft.plant_counts = draws
            .iter()
            .map(|d| PlantCount::new(d.batch_id.clone(), d.plant_count))
            .collect();

        for (index, batch) in staged {
            self.batches[index] = batch;
        }
        tracing::debug!(
            cycle = %draft.id,
            plants = draft.total_plants(),
            priced,
            "Started cycle"
        );
        self.cycles.push(draft);
        Ok(&self.cycles[self.cycles.len() - 1])
    }

    /// Records a completed maintenance task and takes the parts it used out
    /// of the maintenance stock of the task's site.
    ///
    /// Parts without a matching maintenance item are reported in the
    /// outcome; the log is recorded regardless.
    pub fn complete_maintenance(
        &mut self,
        log: MaintenanceLog,
    ) -> Result<MaintenanceOutcome, DatasetError> {
        if self.maintenance_logs.iter().any(|l| l.id == log.id) {
            return Err(DatasetError::DuplicateMaintenanceLog(log.id));
        }
        if let Some(part) = log.parts_used.iter().find(|p| !p.quantity.is_finite()) {
            return Err(DatasetError::NonFinitePart {
                log: log.id.clone(),
                item: part.inventory_item_id.clone(),
            });
        }

        let mut outcome = MaintenanceOutcome::default();
        let site = site_of(&log.location_id, &self.locations).map(str::to_string);
        for part in &log.parts_used {
            let Some(site) = site.as_deref() else {
                outcome.unmatched.push(UnmatchedPart {
                    part: part.clone(),
                    reason: format!("unknown location {}", log.location_id),
                });
                continue;
            };
            let item_id = scoped_item_id(&part.inventory_item_id, site);
            let result = match self.find_item_mut(&item_id) {
                Some(item) => item.withdraw(part.quantity, log.completed_at, log.id.clone()),
                None => {
                    outcome.unmatched.push(UnmatchedPart {
                        part: part.clone(),
                        reason: format!("no item {}", item_id),
                    });
                    continue;
                }
            };
            match result {
                Ok(()) => outcome.withdrawn.push(item_id),
                Err(e) => {
                    outcome.unmatched.push(UnmatchedPart {
                        part: part.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if !outcome.unmatched.is_empty() {
            tracing::warn!(
                log = %log.id,
                unmatched = outcome.unmatched.len(),
                "Some maintenance parts were not withdrawn"
            );
        }
        self.maintenance_logs.push(log);
        Ok(outcome)
    }

    /// Re-derives every ledger field from its purchase history.
    pub fn recompute_inventory(&mut self) {
        for item in &mut self.inventory {
            item.recompute();
        }
    }

    /// Maintenance items at `site_id`.
    pub fn maintenance_stock<'a>(
        &'a self,
        site_id: &'a str,
    ) -> impl Iterator<Item = &'a InventoryItem> + 'a {
        self.inventory
            .iter()
            .filter(move |i| i.kind == InventoryKind::Maintenance && i.location_id == site_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FormulaNutrient, Irrigation, Stage};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    fn dataset() -> Dataset {
        let mut yc = InventoryItem::new(
            "inv-yc-loc-mc",
            "Calcium nitrate",
            InventoryKind::Cultivation,
            "loc-mc",
            "g",
        );
        yc.record_purchase_at(1000.0, 100.0, day(0)).unwrap();
        let mut filter = InventoryItem::new(
            "inv-filter-loc-mc",
            "Carbon filter",
            InventoryKind::Maintenance,
            "loc-mc",
            "piece",
        );
        filter.record_purchase_at(3.0, 300.0, day(0)).unwrap();

        let mut batch_a = PlantBatch::new("A", "gen-1", 20, "room-mc-clones", day(-20))
            .with_id("batch-a");
        batch_a.log_entries.push(LogEntry::new(day(-10)).with_id("b-late").with_notes("rooted"));
        batch_a.log_entries.push(LogEntry::new(day(-18)).with_id("b-early").with_notes("cut"));
        let mut batch_b = PlantBatch::new("B", "gen-2", 5, "room-mc-clones", day(-15))
            .with_id("batch-b");
        batch_b.log_entries.push(LogEntry::new(day(-14)).with_id("b-mid"));

        Dataset {
            locations: vec![
                Location::site("loc-mc", "MC"),
                Location::room("room-mc1", "MC1", "loc-mc"),
            ],
            inventory: vec![yc, filter],
            formulas: vec![NutrientFormula::new("form-veg", "Veg")
                .with_nutrients(vec![FormulaNutrient::new("inv-yc", 1.0)])],
            formula_schedule: FormulaSchedule::new().with(Stage::Cloning, 1, "form-veg"),
            batches: vec![batch_a, batch_b],
            ..Dataset::default()
        }
    }

    fn watering(id: &str, n: i64, volume: f64) -> LogEntry {
        LogEntry::new(day(n))
            .with_id(id)
            .with_irrigation(Irrigation::new(volume, 6.0, 700.0))
    }

    #[test]
    fn test_save_cycle_prices_only_new_entries() {
        let mut data = dataset();
        let mut cycle = CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1");
        cycle.log_entries.push(watering("e1", 1, 10.0));

        let priced = data.save_cycle(cycle).unwrap();
        assert_eq!(priced.len(), 1);
        let stored = data.find_cycle("c1").unwrap();
        assert_eq!(stored.log_entries[0].irrigation_cost(), Some(1.0));

        // Saving again with one more entry prices just that one
        let mut edited = stored.clone();
        edited.log_entries.push(watering("e2", 2, 20.0));
        let priced = data.save_cycle(edited).unwrap();
        assert_eq!(priced.len(), 1);
        let stored = data.find_cycle("c1").unwrap();
        assert_eq!(stored.log_entries[1].irrigation_cost(), Some(2.0));
        assert_eq!(data.cycles.len(), 1);
    }

    #[test]
    fn test_record_log_entry() {
        let mut data = dataset();
        data.save_cycle(CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1")).unwrap();

        let breakdown = data.record_log_entry("c1", watering("e1", 3, 5.0)).unwrap();
        assert!(breakdown.is_some());
        assert_eq!(data.find_cycle("c1").unwrap().log_entries.len(), 1);

        // Same id again is a no-op
        assert_eq!(data.record_log_entry("c1", watering("e1", 3, 5.0)), Ok(None));
        assert_eq!(data.find_cycle("c1").unwrap().log_entries.len(), 1);

        assert_eq!(
            data.record_log_entry("nope", watering("e9", 3, 5.0)),
            Err(DatasetError::CycleNotFound("nope".into()))
        );
    }

    #[test]
    fn test_non_finite_readings_are_not_stored() {
        let mut data = dataset();
        data.save_cycle(CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1")).unwrap();
        let before = data.clone();

        let bad = LogEntry::new(day(2))
            .with_id("e-nan")
            .with_irrigation(Irrigation::new(1.0, f64::NAN, 700.0));
        assert_eq!(
            data.record_log_entry("c1", bad.clone()),
            Err(DatasetError::NonFiniteReading {
                entry: "e-nan".into(),
                field: "ph",
            })
        );

        let mut edited = data.find_cycle("c1").unwrap().clone();
        edited.log_entries.push(bad.clone());
        assert!(data.save_cycle(edited).is_err());

        let mut draft = CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c2");
        draft.log_entries.push(bad);
        assert!(data.start_cycle(draft, &[BatchDraw::new("batch-a", 1)]).is_err());

        assert_eq!(data, before);
        // The stored dataset still round-trips through a backup
        assert!(crate::restore_backup(&data.to_backup_json().unwrap()).is_ok());
    }

    #[test]
    fn test_start_cycle_draws_and_seeds_log() {
        let mut data = dataset();
        let draft = CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1");
        let draws = [BatchDraw::new("batch-a", 12), BatchDraw::new("batch-b", 5)];

        let cycle = data.start_cycle(draft, &draws).unwrap();
        assert_eq!(cycle.total_plants(), 17);
        let ids: Vec<&str> = cycle.log_entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b-early", "b-mid", "b-late"]);

        let a = data.find_batch("batch-a").unwrap();
        assert_eq!(a.available_count(), 8);
        assert_eq!(a.status, crate::models::BatchStatus::InUse);
        let b = data.find_batch("batch-b").unwrap();
        assert_eq!(b.available_count(), 0);
        assert_eq!(b.status, crate::models::BatchStatus::Depleted);
    }

    #[test]
    fn test_start_cycle_overdraw_changes_nothing() {
        let mut data = dataset();
        let before = data.clone();
        let draft = CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1");
        let draws = [BatchDraw::new("batch-a", 12), BatchDraw::new("batch-b", 6)];

        let err = data.start_cycle(draft, &draws).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::Batch(BatchError::InsufficientPlants { requested: 6, .. })
        ));
        assert_eq!(data, before);
    }

    #[test]
    fn test_start_cycle_repeated_batch_counts_together() {
        let mut data = dataset();
        let draft = CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1");
        let draws = [BatchDraw::new("batch-a", 15), BatchDraw::new("batch-a", 15)];
        assert!(data.start_cycle(draft, &draws).is_err());
        assert_eq!(data.find_batch("batch-a").unwrap().available_count(), 20);
    }

    #[test]
    fn test_start_cycle_unknown_batch_or_duplicate_cycle() {
        let mut data = dataset();
        let draft = CultivationCycle::new("gen-1", "room-mc1", day(0)).with_id("c1");
        assert_eq!(
            data.start_cycle(draft.clone(), &[BatchDraw::new("ghost", 1)])
                .unwrap_err(),
            DatasetError::Batch(BatchError::NotFound("ghost".into()))
        );

        data.start_cycle(draft.clone(), &[]).unwrap();
        assert_eq!(
            data.start_cycle(draft, &[]).unwrap_err(),
            DatasetError::DuplicateCycle("c1".into())
        );
    }

    #[test]
    fn test_complete_maintenance_withdraws_parts() {
        let mut data = dataset();
        let log = MaintenanceLog::new("task-1", "Swap filter", "user-1", "room-mc1", day(5))
            .with_id("mlog-1")
            .with_parts(vec![
                PartUsage::new("inv-filter", 1.0),
                PartUsage::new("inv-yc", 5.0),
                PartUsage::new("inv-pump", 1.0),
            ]);

        let outcome = data.complete_maintenance(log).unwrap();
        assert_eq!(outcome.withdrawn, vec!["inv-filter-loc-mc".to_string()]);
        assert_eq!(outcome.unmatched.len(), 2);
        assert_eq!(data.find_item("inv-filter-loc-mc").unwrap().current_stock(), 2.0);
        // Cultivation stock is never withdrawn
        assert_eq!(data.find_item("inv-yc-loc-mc").unwrap().current_stock(), 1000.0);
        assert_eq!(data.maintenance_logs.len(), 1);
        assert_eq!(data.maintenance_stock("loc-mc").count(), 1);
    }

    #[test]
    fn test_complete_maintenance_rejects_non_finite_quantity() {
        let mut data = dataset();
        let before = data.clone();
        let log = MaintenanceLog::new("task-1", "Swap filter", "user-1", "room-mc1", day(5))
            .with_id("mlog-1")
            .with_parts(vec![PartUsage::new("inv-filter", f64::INFINITY)]);

        assert_eq!(
            data.complete_maintenance(log).unwrap_err(),
            DatasetError::NonFinitePart {
                log: "mlog-1".into(),
                item: "inv-filter".into(),
            }
        );
        assert_eq!(data, before);
    }

    #[test]
    fn test_complete_maintenance_twice_rejected() {
        let mut data = dataset();
        let log = MaintenanceLog::new("task-1", "Swap filter", "user-1", "loc-mc", day(5))
            .with_id("mlog-1")
            .with_parts(vec![PartUsage::new("inv-filter", 1.0)]);
        data.complete_maintenance(log.clone()).unwrap();
        assert_eq!(
            data.complete_maintenance(log),
            Err(DatasetError::DuplicateMaintenanceLog("mlog-1".into()))
        );
        assert_eq!(data.find_item("inv-filter-loc-mc").unwrap().current_stock(), 2.0);
    }
}
