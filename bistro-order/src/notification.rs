//! Staff notifications.
//!
//! A notification passes through a fixed chain of stages built once at
//! startup and ends in a base deliverer shared by every role. Delivery
//! failure is reported as `false`, never as an error.

use bistro_core::{StaffRole, StaffRoster, StaticRoster};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::Order;

/// Anything that can hand a message to a recipient
pub trait Notifier: Send + Sync {
    fn deliver(&self, recipient: &str, message: &str) -> bool;
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn deliver(&self, recipient: &str, message: &str) -> bool {
        (**self).deliver(recipient, message)
    }
}

/// Base deliverer that writes notifications to the log
pub struct TracingDeliverer;

impl Notifier for TracingDeliverer {
    fn deliver(&self, recipient: &str, message: &str) -> bool {
        tracing::info!(recipient, "{}", message);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub recipient: String,
    pub message: String,
}

/// Base deliverer that keeps every message in memory for later reading
#[derive(Default)]
pub struct Outbox {
    delivered: Mutex<Vec<Delivery>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages_for(&self, recipient: &str) -> Vec<String> {
        self.deliveries()
            .into_iter()
            .filter(|d| d.recipient == recipient)
            .map(|d| d.message)
            .collect()
    }
}

impl Notifier for Outbox {
    fn deliver(&self, recipient: &str, message: &str) -> bool {
        tracing::debug!("Outbox: {} <- {}", recipient, message);
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Delivery {
                recipient: recipient.to_string(),
                message: message.to_string(),
            });
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub recipient: String,
    pub delivered_at: DateTime<Utc>,
    pub success: bool,
}

/// Shared, append-only record of deliveries
#[derive(Clone, Default)]
pub struct AuditTrail(Arc<Mutex<Vec<AuditEntry>>>);

impl AuditTrail {
    pub fn record(&self, entry: AuditEntry) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push(entry);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// Passes the message through unchanged and timestamps the delivery
pub struct LoggingStage {
    inner: Box<dyn Notifier>,
    audit: AuditTrail,
}

impl LoggingStage {
    pub fn new(inner: Box<dyn Notifier>, audit: AuditTrail) -> Self {
        Self { inner, audit }
    }
}

impl Notifier for LoggingStage {
    fn deliver(&self, recipient: &str, message: &str) -> bool {
        let success = self.inner.deliver(recipient, message);
        let delivered_at = Utc::now();

        tracing::info!(
            "{} - notification for {} ({})",
            delivered_at.format("%Y-%m-%d %H:%M:%S"),
            recipient,
            if success { "sent" } else { "failed" }
        );
        self.audit.record(AuditEntry {
            recipient: recipient.to_string(),
            delivered_at,
            success,
        });
        success
    }
}

/// Wraps the message in a fixed prefix and suffix
pub struct FormattingStage {
    inner: Box<dyn Notifier>,
    prefix: String,
    suffix: String,
}

impl FormattingStage {
    pub fn new(inner: Box<dyn Notifier>, prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }
}

impl Notifier for FormattingStage {
    fn deliver(&self, recipient: &str, message: &str) -> bool {
        let formatted = format!("{}{}{}", self.prefix, message, self.suffix);
        self.inner.deliver(recipient, &formatted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

/// Tags the message with `[PRIORITY]`
pub struct PriorityStage {
    inner: Box<dyn Notifier>,
    priority: Priority,
}

impl PriorityStage {
    pub fn new(inner: Box<dyn Notifier>, priority: Priority) -> Self {
        Self { inner, priority }
    }
}

impl Notifier for PriorityStage {
    fn deliver(&self, recipient: &str, message: &str) -> bool {
        let tagged = format!("[{}] {}", self.priority.as_str(), message);
        self.inner.deliver(recipient, &tagged)
    }
}

/// Prefixes and priority used when building the role pipelines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub kitchen_prefix: String,
    pub waiters_prefix: String,
    pub management_prefix: String,
    pub management_priority: Priority,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            kitchen_prefix: "[КУХНЯ] ".to_string(),
            waiters_prefix: "[ОФИЦИАНТЫ] ".to_string(),
            management_prefix: "[РУКОВОДСТВО] ".to_string(),
            management_priority: Priority::High,
        }
    }
}

/// Per-role notification pipelines over one shared base deliverer
pub struct StaffNotifier {
    kitchen: Box<dyn Notifier>,
    waiters: Box<dyn Notifier>,
    management: Box<dyn Notifier>,
    roster: Arc<dyn StaffRoster>,
    audit: AuditTrail,
}

impl StaffNotifier {
    pub fn new(base: Arc<dyn Notifier>, roster: Arc<dyn StaffRoster>, settings: &NotificationSettings) -> Self {
        let audit = AuditTrail::default();
        let logged = |audit: &AuditTrail| -> Box<dyn Notifier> {
            Box::new(LoggingStage::new(Box::new(base.clone()), audit.clone()))
        };

        let kitchen = FormattingStage::new(logged(&audit), settings.kitchen_prefix.as_str(), "");
        let waiters = FormattingStage::new(logged(&audit), settings.waiters_prefix.as_str(), "");
        let management = PriorityStage::new(
            Box::new(FormattingStage::new(logged(&audit), settings.management_prefix.as_str(), "")),
            settings.management_priority,
        );

        Self {
            kitchen: Box::new(kitchen),
            waiters: Box::new(waiters),
            management: Box::new(management),
            roster,
            audit,
        }
    }

    /// Default prefixes, recipients named after their role
    pub fn with_defaults(base: Arc<dyn Notifier>) -> Self {
        Self::new(base, Arc::new(StaticRoster::new()), &NotificationSettings::default())
    }

    pub fn recipient(&self, role: StaffRole) -> String {
        self.roster
            .recipient_for(role)
            .unwrap_or_else(|| role.as_str().to_string())
    }

    /// Send a raw message down one role's pipeline
    pub fn send(&self, role: StaffRole, message: &str) -> bool {
        let pipeline = match role {
            StaffRole::Kitchen => &self.kitchen,
            StaffRole::Waiters => &self.waiters,
            StaffRole::Management => &self.management,
        };

        let delivered = pipeline.deliver(&self.recipient(role), message);
        if !delivered {
            tracing::warn!("Notification to {} was not delivered", role);
        }
        delivered
    }

    pub fn notify_kitchen_new_order(&self, order: &Order) -> bool {
        let mut message = format!("Новый заказ #{} для стола {}:\n", order.id, order.table_number);
        for line in &order.lines {
            let _ = writeln!(message, "  - {} x{}", line.item_name, line.quantity);
        }
        self.send(StaffRole::Kitchen, &message)
    }

    pub fn notify_waiters_status(&self, order: &Order, status_text: &str) -> bool {
        let message = format!("Заказ #{} для стола {}: {}", order.id, order.table_number, status_text);
        self.send(StaffRole::Waiters, &message)
    }

    pub fn notify_management_issue(&self, kind: &str, details: &str) -> bool {
        let message = format!("Проблема: {}\nПодробности: {}", kind, details);
        self.send(StaffRole::Management, &message)
    }

    /// Deliver to every role. All roles are attempted even if one fails.
    pub fn notify_all(&self, message: &str) -> bool {
        let results = StaffRole::ALL.map(|role| self.send(role, message));
        results.iter().all(|delivered| *delivered)
    }

    pub fn audit_trail(&self) -> Vec<AuditEntry> {
        self.audit.entries()
    }
}
