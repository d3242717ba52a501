//! Alert Bus
//!
//! Ordered, capped event log shared by both roles. Zone events, analyzer
//! findings and patrol commands all land here, newest first. The bus keeps
//! at most [`ALERT_CAPACITY`] records; appending beyond that evicts the
//! oldest. Records are immutable once appended.
//!
//! Patrol commands are also kept as [`CommandMessage`]s whose delivery
//! status only moves forward (`sent -> delivered -> acknowledged`).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

mod command;

pub use command::*;

/// Maximum number of retained alert records
pub const ALERT_CAPACITY: usize = 50;

/// Maximum number of retained command messages
pub const COMMAND_CAPACITY: usize = 50;

/// Delay before a sent command is considered delivered
pub const DELIVERY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Info,
    Warning,
    Danger,
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AlertKind::Info => "info",
            AlertKind::Warning => "warning",
            AlertKind::Danger => "danger",
        };
        f.write_str(s)
    }
}

/// One entry of the alert log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: String,
    pub kind: AlertKind,
    pub message: String,
    /// Creation time (milliseconds since epoch)
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    /// Target vessel AIS id; `None` means broadcast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_vessel: Option<String>,
    /// Originated from the patrol command channel
    #[serde(default)]
    pub from_patrol: bool,
}

impl AlertRecord {
    /// Broadcast record with a fresh unique id
    pub fn new(kind: AlertKind, message: impl Into<String>, timestamp: u64) -> Self {
        AlertRecord {
            id: uuid::Uuid::new_v4().simple().to_string(),
            kind,
            message: message.into(),
            timestamp,
            zone: None,
            target_vessel: None,
            from_patrol: false,
        }
    }

    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    pub fn for_vessel(mut self, ais_id: impl Into<String>) -> Self {
        self.target_vessel = Some(ais_id.into());
        self
    }

    pub fn from_patrol(mut self) -> Self {
        self.from_patrol = true;
        self
    }

    /// Broadcast records and records targeted at this vessel
    pub fn is_visible_to(&self, ais_id: &str) -> bool {
        match &self.target_vessel {
            None => true,
            Some(target) => target == ais_id,
        }
    }
}

/// Owner of the alert log and the command messages
#[derive(Debug, Clone, Default)]
pub struct AlertBus {
    alerts: VecDeque<AlertRecord>,
    commands: VecDeque<CommandMessage>,
}

impl AlertBus {
    pub fn new() -> Self {
        AlertBus::default()
    }

    /// Prepend a record, evicting the oldest beyond [`ALERT_CAPACITY`]
    pub fn append(&mut self, record: AlertRecord) {
        log::debug!(
            "alert {} [{}] {}{}",
            record.id,
            record.kind,
            record
                .target_vessel
                .as_deref()
                .map(|t| format!("{}: ", t))
                .unwrap_or_default(),
            record.message
        );
        self.alerts.push_front(record);
        self.alerts.truncate(ALERT_CAPACITY);
    }

    /// All records, newest first
    pub fn alerts(&self) -> impl Iterator<Item = &AlertRecord> {
        self.alerts.iter()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    pub fn latest(&self) -> Option<&AlertRecord> {
        self.alerts.front()
    }

    /// Records visible to one vessel, newest first
    pub fn for_vessel(&self, ais_id: &str) -> Vec<&AlertRecord> {
        self.alerts.iter().filter(|a| a.is_visible_to(ais_id)).collect()
    }

    /// Create a patrol command in the `sent` state and its alert.
    ///
    /// The caller schedules [`AlertBus::mark_delivered`] after
    /// [`DELIVERY_DELAY`].
    pub fn send_command(
        &mut self,
        target_vessel: &str,
        text: &str,
        priority: Priority,
        now: u64,
    ) -> CommandMessage {
        let message = CommandMessage::new(target_vessel, text, priority, now);
        log::info!(
            "{}: patrol command {} ({} priority): {}",
            target_vessel,
            message.id,
            priority,
            text
        );
        self.commands.push_front(message.clone());
        self.commands.truncate(COMMAND_CAPACITY);

        self.append(
            AlertRecord::new(
                priority.alert_kind(),
                format!("Coast Guard Message: {}", text),
                now,
            )
            .for_vessel(target_vessel)
            .from_patrol(),
        );
        message
    }

    /// Move a command to `delivered`.
    ///
    /// Returns false when the command is gone or already past `sent`;
    /// both are harmless.
    pub fn mark_delivered(&mut self, command_id: &str) -> bool {
        self.advance_command(command_id, DeliveryStatus::Delivered)
    }

    pub fn mark_acknowledged(&mut self, command_id: &str) -> bool {
        self.advance_command(command_id, DeliveryStatus::Acknowledged)
    }

    fn advance_command(&mut self, command_id: &str, status: DeliveryStatus) -> bool {
        match self.commands.iter_mut().find(|m| m.id == command_id) {
            Some(message) => {
                let advanced = message.advance_to(status);
                if advanced {
                    log::info!("{}: command {} {}", message.target_vessel, message.id, status);
                }
                advanced
            }
            None => {
                log::trace!("command {} no longer retained", command_id);
                false
            }
        }
    }

    pub fn command(&self, command_id: &str) -> Option<&CommandMessage> {
        self.commands.iter().find(|m| m.id == command_id)
    }

    /// Command messages, newest first
    pub fn commands(&self) -> impl Iterator<Item = &CommandMessage> {
        self.commands.iter()
    }

    pub fn commands_for(&self, ais_id: &str) -> Vec<&CommandMessage> {
        self.commands
            .iter()
            .filter(|m| m.target_vessel == ais_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn danger(n: usize) -> AlertRecord {
        AlertRecord::new(AlertKind::Danger, format!("alert {}", n), n as u64)
            .with_zone("Marine Protected Area")
    }

    #[test]
    fn test_append_prepends() {
        let mut bus = AlertBus::new();
        bus.append(danger(1));
        bus.append(danger(2));
        let messages: Vec<_> = bus.alerts().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["alert 2", "alert 1"]);
        assert_eq!(bus.latest().unwrap().message, "alert 2");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut bus = AlertBus::new();
        let mut first_id = String::new();
        let mut last_id = String::new();
        for n in 1..=51 {
            let record = danger(n);
            if n == 1 {
                first_id = record.id.clone();
            }
            if n == 51 {
                last_id = record.id.clone();
            }
            bus.append(record);
            assert!(bus.len() <= ALERT_CAPACITY);
        }
        assert_eq!(bus.len(), ALERT_CAPACITY);
        assert!(bus.alerts().any(|a| a.id == last_id));
        assert!(!bus.alerts().any(|a| a.id == first_id));
        assert_eq!(bus.alerts().last().unwrap().message, "alert 2");
    }

    #[test]
    fn test_ids_are_unique() {
        let a = danger(1);
        let b = danger(1);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_for_vessel_filters() {
        let mut bus = AlertBus::new();
        bus.append(AlertRecord::new(AlertKind::Info, "broadcast", 1));
        bus.append(AlertRecord::new(AlertKind::Warning, "to A", 2).for_vessel("A"));
        bus.append(AlertRecord::new(AlertKind::Warning, "to B", 3).for_vessel("B"));

        let for_a: Vec<_> = bus.for_vessel("A").iter().map(|a| a.message.clone()).collect();
        assert_eq!(for_a, vec!["to A", "broadcast"]);
        assert_eq!(bus.for_vessel("C").len(), 1);
    }

    #[test]
    fn test_send_command_creates_alert() {
        let mut bus = AlertBus::new();
        let message = bus.send_command("X", "Exit prohibited fishing zone", Priority::High, 100);
        assert_eq!(message.status, DeliveryStatus::Sent);
        assert_eq!(message.target_vessel, "X");

        let alert = bus.latest().unwrap();
        assert_eq!(alert.kind, AlertKind::Danger);
        assert_eq!(alert.target_vessel.as_deref(), Some("X"));
        assert!(alert.from_patrol);
        assert_eq!(alert.message, "Coast Guard Message: Exit prohibited fishing zone");
    }

    #[test]
    fn test_priority_maps_to_kind() {
        let mut bus = AlertBus::new();
        bus.send_command("X", "m", Priority::Medium, 0);
        assert_eq!(bus.latest().unwrap().kind, AlertKind::Warning);
        bus.send_command("X", "l", Priority::Low, 0);
        assert_eq!(bus.latest().unwrap().kind, AlertKind::Info);
    }

    #[test]
    fn test_delivery_is_forward_only() {
        let mut bus = AlertBus::new();
        let message = bus.send_command("X", "Routine check", Priority::Low, 0);
        assert!(bus.mark_delivered(&message.id));
        assert_eq!(bus.command(&message.id).unwrap().status, DeliveryStatus::Delivered);
        assert!(!bus.mark_delivered(&message.id));

        assert!(bus.mark_acknowledged(&message.id));
        assert!(!bus.mark_delivered(&message.id));
        assert_eq!(
            bus.command(&message.id).unwrap().status,
            DeliveryStatus::Acknowledged
        );
    }

    #[test]
    fn test_delivery_of_evicted_command_is_ignored() {
        let mut bus = AlertBus::new();
        let first = bus.send_command("X", "first", Priority::Low, 0);
        for n in 0..COMMAND_CAPACITY {
            bus.send_command("Y", &format!("filler {}", n), Priority::Low, 0);
        }
        assert!(bus.command(&first.id).is_none());
        assert!(!bus.mark_delivered(&first.id));
        assert!(bus.commands_for("X").is_empty());
    }

    #[test]
    fn test_alert_serialization() {
        let record = AlertRecord::new(AlertKind::Danger, "m", 5).for_vessel("X").from_patrol();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["kind"], "danger");
        assert_eq!(json["targetVessel"], "X");
        assert_eq!(json["fromPatrol"], true);
        assert!(json.get("zone").is_none());
    }
}
