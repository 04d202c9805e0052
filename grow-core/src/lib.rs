//! Grow Ledger Core Library
//!
//! Cultivation records and the logic derived from them: stage inference,
//! formula scheduling, inventory costing and collaborator sync.

pub mod costing;
pub mod dataset;
pub mod models;
pub mod schedule;
pub mod stage;
pub mod sync;

pub use costing::{
    attribute_irrigation_cost, price_irrigation, CostBreakdown, CostContext, NutrientCost,
};
pub use dataset::{BatchDraw, Dataset, DatasetError, MaintenanceOutcome, UnmatchedPart};
pub use models::{
    BatchError, BatchStatus, CultivationCycle, CycleError, Expense, FormulaNutrient,
    FormulaSchedule, InventoryItem, InventoryKind, Irrigation, LedgerError, Location, LogEntry,
    MaintenanceLog, NutrientFormula, PartUsage, PlantBatch, PlantCount, Stage,
};
pub use schedule::{project_calendar, resolve_formula, weeks_around, CalendarWeek};
pub use stage::{derive_stage, StageInfo};
pub use sync::{
    export_delta, merge_delta, restore_backup, MergeSummary, SyncEnvelope, SyncError, SyncState,
};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
