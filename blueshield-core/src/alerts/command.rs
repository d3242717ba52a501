//! Patrol command messages

use serde::{Deserialize, Serialize};

use super::AlertKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Kind of the alert synthesized for a command of this priority
    pub fn alert_kind(self) -> AlertKind {
        match self {
            Priority::High => AlertKind::Danger,
            Priority::Medium => AlertKind::Warning,
            Priority::Low => AlertKind::Info,
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Delivery status, ordered so transitions can only move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Delivered,
    Acknowledged,
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Acknowledged => "acknowledged",
        };
        f.write_str(s)
    }
}

/// Message from the patrol role to one vessel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandMessage {
    pub id: String,
    pub target_vessel: String,
    pub text: String,
    pub priority: Priority,
    pub status: DeliveryStatus,
    /// Creation time (milliseconds since epoch)
    pub timestamp: u64,
}

impl CommandMessage {
    pub fn new(target_vessel: &str, text: &str, priority: Priority, timestamp: u64) -> Self {
        CommandMessage {
            id: uuid::Uuid::new_v4().simple().to_string(),
            target_vessel: target_vessel.to_string(),
            text: text.to_string(),
            priority,
            status: DeliveryStatus::Sent,
            timestamp,
        }
    }

    /// Move to `status` if it is later than the current one
    pub fn advance_to(&mut self, status: DeliveryStatus) -> bool {
        if status > self.status {
            self.status = status;
            true
        } else {
            false
        }
    }
}

/// Canned patrol messages offered by the console
pub const QUICK_MESSAGES: [(&str, Priority); 5] = [
    (
        "Please reduce speed and maintain safe distance from restricted zones",
        Priority::Medium,
    ),
    ("IMMEDIATE: Exit prohibited fishing zone immediately", Priority::High),
    (
        "Weather advisory: Strong winds expected in your area",
        Priority::Medium,
    ),
    ("Routine check: Please confirm your current status", Priority::Low),
    ("EMERGENCY: Return to port immediately", Priority::High),
];
