use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Quantity of a maintenance part used by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartUsage {
    /// Base inventory item id, not scoped to a site
    pub inventory_item_id: String,
    pub quantity: f64,
}

impl PartUsage {
    pub fn new(inventory_item_id: impl Into<String>, quantity: f64) -> Self {
        Self {
            inventory_item_id: inventory_item_id.into(),
            quantity,
        }
    }
}

/// Record of a completed maintenance task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceLog {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    pub user_id: String,
    /// Site where the task was done
    pub location_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub parts_used: Vec<PartUsage>,
}

impl MaintenanceLog {
    pub fn new(
        task_id: impl Into<String>,
        task_title: impl Into<String>,
        user_id: impl Into<String>,
        location_id: impl Into<String>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.into(),
            task_title: task_title.into(),
            user_id: user_id.into(),
            location_id: location_id.into(),
            completed_at,
            notes: String::new(),
            parts_used: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_parts(mut self, parts: Vec<PartUsage>) -> Self {
        self.parts_used = parts;
        self
    }
}
