use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Error,
}

/// A user-visible record of a state-changing event. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    id: String,
    #[serde(rename = "type", default)]
    severity: Severity,
    title: String,
    message: String,
    timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn new(severity: Severity, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            severity,
            title: title.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_serialized_as_type() {
        let n = Notification::new(Severity::Error, "Fault Injected", "Node 4 has been compromised");
        let value = serde_json::to_value(&n).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["title"], "Fault Injected");
    }

    #[test]
    fn test_missing_type_defaults_to_info() {
        let json = r#"{"id":"x","title":"t","message":"m","timestamp":"2024-01-01T00:00:00Z"}"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.severity(), Severity::Info);
    }
}
