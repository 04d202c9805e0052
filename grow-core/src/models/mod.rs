mod batch;
mod cycle;
mod expense;
mod formula;
mod inventory;
mod location;
mod log_entry;
mod maintenance_log;
mod stage;
mod timestamp;

pub use batch::{BatchError, BatchStatus, PlantBatch};
pub use cycle::{CultivationCycle, CycleError, PlantCount};
pub use expense::Expense;
pub use formula::{FormulaNutrient, FormulaSchedule, NutrientFormula};
pub use inventory::{
    scoped_item_id, InventoryItem, InventoryKind, LedgerError, Purchase, Withdrawal,
};
pub use location::{site_of, Location};
pub use log_entry::{CompletedTask, EnvironmentReading, Irrigation, IrrigationKind, LogEntry};
pub use maintenance_log::{MaintenanceLog, PartUsage};
pub use stage::Stage;
pub use timestamp::parse_timestamp;
