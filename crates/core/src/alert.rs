//! Alert severity levels and type constants.
//!
//! Alerts are fire-and-forget notifications emitted on the event bus and
//! persisted by a background subscriber; they must never block pipeline
//! completion.

use serde::{Deserialize, Serialize};

/// Severity of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Database/string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Known alert types emitted by the pipeline.
pub mod alert_types {
    pub const PROCESSING_COMPLETED: &str = "processing_completed";
    pub const PROCESSING_FAILED: &str = "processing_failed";
    pub const WEAPON_DETECTED: &str = "weapon_detected";
    pub const FACE_MATCH: &str = "face_match";
    pub const POI_DETECTED: &str = "poi_detected";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&AlertSeverity::High).unwrap();
        assert_eq!(json, "\"high\"");
    }

    #[test]
    fn severity_roundtrips() {
        for severity in [
            AlertSeverity::Low,
            AlertSeverity::Medium,
            AlertSeverity::High,
            AlertSeverity::Critical,
        ] {
            let json = serde_json::to_string(&severity).unwrap();
            let back: AlertSeverity = serde_json::from_str(&json).unwrap();
            assert_eq!(back, severity);
            assert_eq!(json, format!("\"{}\"", severity.as_str()));
        }
    }
}
