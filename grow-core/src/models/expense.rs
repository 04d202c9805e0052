use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A one-off operating expense at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub id: String,
    pub date: DateTime<Utc>,
    pub location_id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: f64,
}

impl Expense {
    pub fn new(location_id: impl Into<String>, amount: f64, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            location_id: location_id.into(),
            category: String::new(),
            description: String::new(),
            amount,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_description(
        mut self,
        category: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.category = category.into();
        self.description = description.into();
        self
    }
}

impl fmt::Display for Expense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:.2} {}",
            self.date.format("%Y-%m-%d"),
            self.location_id,
            self.amount,
            self.description
        )
    }
}
