use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What was fed during an irrigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IrrigationKind {
    #[default]
    Nutrients,
    Supplements,
}

/// Environmental readings taken alongside a log entry.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub leaf_temperature: Option<f64>,
    pub vpd: Option<f64>,
    pub co2: Option<f64>,
}

/// An irrigation event.
///
/// `cost` is `None` until cost attribution has run for the entry. A priced
/// entry keeps its cost forever, including a legitimately computed zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Irrigation {
    #[serde(default)]
    pub kind: IrrigationKind,
    /// Litres of solution applied
    pub volume: f64,
    pub ph: f64,
    pub ppm: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_out: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ppm_out: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl Irrigation {
    pub fn new(volume: f64, ph: f64, ppm: f64) -> Self {
        Self {
            kind: IrrigationKind::Nutrients,
            volume,
            ph,
            ppm,
            ph_out: None,
            ppm_out: None,
            cost: None,
        }
    }

    pub fn with_kind(mut self, kind: IrrigationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_runoff(mut self, ph_out: Option<f64>, ppm_out: Option<f64>) -> Self {
        self.ph_out = ph_out;
        self.ppm_out = ppm_out;
        self
    }

    pub fn is_priced(&self) -> bool {
        self.cost.is_some()
    }

    /// Name of the first reading that is NaN or infinite.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        let optional = [
            ("phOut", self.ph_out),
            ("ppmOut", self.ppm_out),
            ("cost", self.cost),
        ];
        [("volume", self.volume), ("ph", self.ph), ("ppm", self.ppm)]
            .into_iter()
            .chain(optional.into_iter().filter_map(|(name, v)| Some((name, v?))))
            .find(|(_, v)| !v.is_finite())
            .map(|(name, _)| name)
    }
}

/// A task completion recorded against a log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedTask {
    pub task_id: String,
    pub task_title: String,
    pub completed_by: String,
    pub completed_at: DateTime<Utc>,
}

/// A dated observation attached to a cycle or a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation: Option<Irrigation>,
    #[serde(default)]
    pub plant_health: Vec<String>,
    #[serde(default)]
    pub completed_tasks: Vec<CompletedTask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LogEntry {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            date,
            environment: None,
            irrigation: None,
            plant_health: Vec::new(),
            completed_tasks: Vec::new(),
            notes: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_environment(mut self, environment: EnvironmentReading) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn with_irrigation(mut self, irrigation: Irrigation) -> Self {
        self.irrigation = Some(irrigation);
        self
    }

    pub fn with_plant_health(mut self, labels: Vec<String>) -> Self {
        self.plant_health = labels;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Name of the first irrigation or environment reading that is NaN or
    /// infinite. Such values cannot be written to JSON.
    pub fn non_finite_field(&self) -> Option<&'static str> {
        if let Some(field) = self.irrigation.as_ref().and_then(Irrigation::non_finite_field) {
            return Some(field);
        }
        let env = self.environment.as_ref()?;
        [
            ("temperature", env.temperature),
            ("humidity", env.humidity),
            ("leafTemperature", env.leaf_temperature),
            ("vpd", env.vpd),
            ("co2", env.co2),
        ]
        .into_iter()
        .find(|(_, v)| v.is_some_and(|v| !v.is_finite()))
        .map(|(name, _)| name)
    }

    /// Irrigation cost, if the entry has been priced.
    pub fn irrigation_cost(&self) -> Option<f64> {
        self.irrigation.as_ref().and_then(|i| i.cost)
    }
}
