use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, SequenceError};

/// Suspension strategy between the steps of a pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PacingRepr", into = "PacingRepr")]
pub enum Pacing {
    /// One cooperative yield after each action.
    #[default]
    Yield,
    /// A real-time wait before each action.
    Delay(Duration),
}

impl Pacing {
    /// Build a delay pacing from fractional seconds.
    pub fn delay_secs(secs: f64) -> Result<Self> {
        Duration::try_from_secs_f64(secs)
            .map(Self::Delay)
            .map_err(|e| SequenceError::Config(format!("invalid delay {secs}s: {e}")))
    }

    pub fn is_delay(&self) -> bool {
        matches!(self, Self::Delay(_))
    }
}

impl fmt::Display for Pacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Yield => write!(f, "yield"),
            Self::Delay(d) => write!(f, "delay({}s)", d.as_secs_f64()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
enum PacingRepr {
    Yield,
    Delay { secs: f64 },
}

impl TryFrom<PacingRepr> for Pacing {
    type Error = SequenceError;

    fn try_from(repr: PacingRepr) -> Result<Self> {
        match repr {
            PacingRepr::Yield => Ok(Self::Yield),
            PacingRepr::Delay { secs } => Self::delay_secs(secs),
        }
    }
}

impl From<Pacing> for PacingRepr {
    fn from(pacing: Pacing) -> Self {
        match pacing {
            Pacing::Yield => Self::Yield,
            Pacing::Delay(d) => Self::Delay {
                secs: d.as_secs_f64(),
            },
        }
    }
}

/// Configuration for a single pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// How the driver suspends between actions.
    #[serde(default)]
    pub pacing: Pacing,

    /// Unique identifier for this pass, attached to its tracing span.
    pub run_id: Uuid,

    /// Tags for filtering and categorization.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            pacing: Pacing::Yield,
            run_id: Uuid::new_v4(),
            tags: Vec::new(),
        }
    }
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }
}

impl From<Pacing> for RunConfig {
    fn from(pacing: Pacing) -> Self {
        Self::new().with_pacing(pacing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_config() {
        let config = RunConfig::default();
        assert_eq!(config.pacing, Pacing::Yield);
        assert!(config.tags.is_empty());
    }

    #[test]
    fn builder_methods() {
        let id = Uuid::new_v4();
        let config = RunConfig::new()
            .with_pacing(Pacing::Delay(Duration::from_millis(250)))
            .with_tag("patrol")
            .with_run_id(id);

        assert_eq!(config.pacing, Pacing::Delay(Duration::from_millis(250)));
        assert_eq!(config.tags, vec!["patrol"]);
        assert_eq!(config.run_id, id);
    }

    #[test]
    fn run_id_uniqueness() {
        assert_ne!(RunConfig::new().run_id, RunConfig::new().run_id);
    }

    #[test]
    fn delay_secs_rejects_negative() {
        let err = Pacing::delay_secs(-1.0).unwrap_err();
        assert!(matches!(err, SequenceError::Config(_)));
    }

    #[test]
    fn pacing_json_shape() {
        let yield_json = serde_json::to_value(Pacing::Yield).unwrap();
        assert_eq!(yield_json, json!({"mode": "yield"}));

        let delay_json = serde_json::to_value(Pacing::Delay(Duration::from_millis(500))).unwrap();
        assert_eq!(delay_json, json!({"mode": "delay", "secs": 0.5}));
    }

    #[test]
    fn pacing_parses_from_json() {
        let pacing: Pacing = serde_json::from_value(json!({"mode": "delay", "secs": 2.0})).unwrap();
        assert_eq!(pacing, Pacing::Delay(Duration::from_secs(2)));
    }

    #[test]
    fn pacing_rejects_negative_delay_in_json() {
        let result: std::result::Result<Pacing, _> =
            serde_json::from_value(json!({"mode": "delay", "secs": -0.5}));
        assert!(result.is_err());
    }

    #[test]
    fn pacing_display() {
        assert_eq!(Pacing::Yield.to_string(), "yield");
        assert_eq!(Pacing::Delay(Duration::from_millis(500)).to_string(), "delay(0.5s)");
    }
}
