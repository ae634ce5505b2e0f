//! Task model for the Archon orchestration toolkit.
//!
//! Note: we keep this small + serializable. Storage lives in `store`; the
//! lifecycle rules (validation, completion) live in `service`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ValidationError::Priority {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

/// 12 random bytes, URL-safe base64. Collisions are negligible; uniqueness
/// is not enforced across processes.
pub fn new_identifier() -> String {
    let mut bytes = [0u8; 12];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// One unit of trackable work, lifecycle open -> completed.
///
/// `completed_at` and `completion_token` are set together through
/// [`Task::mark_completed`] — never one without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub identifier: String,
    pub title: String,
    pub owner: String,
    pub priority: Priority,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_token: Option<String>,
}

impl Task {
    pub fn new(title: impl Into<String>, owner: impl Into<String>, priority: Priority) -> Self {
        Self {
            identifier: new_identifier(),
            title: title.into(),
            owner: owner.into(),
            priority,
            description: String::new(),
            created_at: Utc::now(),
            completed_at: None,
            completion_token: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Records the completion event. Both fields flip in one step so a task
    /// can never carry a token without a timestamp (or vice versa).
    pub fn mark_completed(&mut self, token: String, at: DateTime<Utc>) {
        self.completed_at = Some(at);
        self.completion_token = Some(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_parses_case_insensitively() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("HIGH".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" Medium ".parse::<Priority>().unwrap(), Priority::Medium);
    }

    #[test]
    fn test_priority_rejects_unknown_levels() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(matches!(err, ValidationError::Priority { .. }));
    }

    #[test]
    fn test_identifiers_are_unique_and_ascii() {
        let a = new_identifier();
        let b = new_identifier();
        assert_ne!(a, b);
        assert_eq!(a.len(), 16); // 12 bytes, unpadded base64
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_task_json_round_trip() {
        let mut task = Task::new("Demo", "QA", Priority::High).with_description("spin it up");
        task.mark_completed("tok".to_string(), Utc::now());

        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(task, back);
    }

    #[test]
    fn test_task_json_shape() {
        let task = Task::new("Demo", "QA", Priority::Low);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["priority"], "low");
        assert_eq!(value["description"], "");
        assert!(value["completed_at"].is_null());
        assert!(value["completion_token"].is_null());
    }

    #[test]
    fn test_mark_completed_sets_both_fields() {
        let mut task = Task::new("Demo", "QA", Priority::Medium);
        assert!(!task.is_completed());
        let at = Utc::now();
        task.mark_completed("tok".to_string(), at);
        assert_eq!(task.completed_at, Some(at));
        assert_eq!(task.completion_token.as_deref(), Some("tok"));
    }
}
