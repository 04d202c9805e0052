use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Growth phase of a cultivation cycle, in lifecycle order.
///
/// The ordering of the variants is the order a cycle moves through them,
/// so `Stage` comparisons (`<`, `>=`) answer "is this phase later".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Cloning,
    PreVegetation,
    Vegetation,
    Flowering,
    DryingCuring,
    Harvested,
}

impl Stage {
    /// All stages, earliest first.
    pub const ALL: [Stage; 6] = [
        Stage::Cloning,
        Stage::PreVegetation,
        Stage::Vegetation,
        Stage::Flowering,
        Stage::DryingCuring,
        Stage::Harvested,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Harvested)
    }

    /// The stage that follows this one, if any.
    pub fn next(&self) -> Option<Stage> {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .and_then(|i| Self::ALL.get(i + 1))
            .copied()
    }

    fn as_str(&self) -> &'static str {
        match self {
            Stage::Cloning => "cloning",
            Stage::PreVegetation => "pre-vegetation",
            Stage::Vegetation => "vegetation",
            Stage::Flowering => "flowering",
            Stage::DryingCuring => "drying-curing",
            Stage::Harvested => "harvested",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "cloning" => Ok(Stage::Cloning),
            "pre-vegetation" | "preveg" => Ok(Stage::PreVegetation),
            "vegetation" | "veg" => Ok(Stage::Vegetation),
            "flowering" | "flower" => Ok(Stage::Flowering),
            "drying-curing" | "drying" => Ok(Stage::DryingCuring),
            "harvested" => Ok(Stage::Harvested),
            _ => Err(format!(
                "Invalid stage '{}'. Valid options: cloning, pre-vegetation, vegetation, \
                 flowering, drying-curing, harvested",
                s
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_ordering() {
        assert!(Stage::Cloning < Stage::PreVegetation);
        assert!(Stage::Flowering > Stage::Vegetation);
        assert!(Stage::Harvested > Stage::DryingCuring);
        let mut sorted = Stage::ALL;
        sorted.sort();
        assert_eq!(sorted, Stage::ALL);
    }

    #[test]
    fn test_stage_next() {
        assert_eq!(Stage::Cloning.next(), Some(Stage::PreVegetation));
        assert_eq!(Stage::DryingCuring.next(), Some(Stage::Harvested));
        assert_eq!(Stage::Harvested.next(), None);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(format!("{}", Stage::PreVegetation), "pre-vegetation");
        assert_eq!(format!("{}", Stage::DryingCuring), "drying-curing");
    }

    #[test]
    fn test_stage_from_str() {
        assert_eq!(Stage::from_str("Flowering").unwrap(), Stage::Flowering);
        assert_eq!(Stage::from_str("pre_vegetation").unwrap(), Stage::PreVegetation);
        assert_eq!(Stage::from_str("veg").unwrap(), Stage::Vegetation);
        assert!(Stage::from_str("trimming").is_err());
    }

    #[test]
    fn test_stage_json_roundtrip() {
        let json = serde_json::to_string(&Stage::DryingCuring).unwrap();
        assert_eq!(json, "\"drying-curing\"");

        let parsed: Stage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Stage::DryingCuring);
    }
}
