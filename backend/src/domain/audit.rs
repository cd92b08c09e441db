//! Append-only audit trail entries.

use serde_json::{Value, json};

/// Action recorded against an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Restore,
    Convert,
    StatusChange,
    TakePrimary,
    TakeSecondary,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::Restore => "RESTORE",
            Self::Convert => "CONVERT",
            Self::StatusChange => "STATUS_CHANGE",
            Self::TakePrimary => "TAKE_PRIMARY",
            Self::TakeSecondary => "TAKE_SECONDARY",
        }
    }
}

/// Entity type label used for client demandes in the audit table.
pub const AUDIT_DEMANDE: &str = "demande_client";
pub const AUDIT_TICKET: &str = "ticket";
pub const AUDIT_TRAVAUX: &str = "travaux";

/// One audit row to append.
///
/// # Examples
/// ```
/// use fieldops::domain::{AuditAction, AuditEntry};
/// use serde_json::json;
///
/// let entry = AuditEntry::new("ticket", 4, AuditAction::Delete)
///     .by(Some("chef@example.com"))
///     .with_details(json!({ "justification": "doublon" }));
/// assert_eq!(entry.entity_id, "4");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub entity_type: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub actor_email: Option<String>,
    pub details: Value,
}

impl AuditEntry {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: impl ToString,
        action: AuditAction,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id: entity_id.to_string(),
            action,
            actor_email: None,
            details: json!({}),
        }
    }

    #[must_use]
    pub fn by(mut self, actor_email: Option<&str>) -> Self {
        self.actor_email = actor_email.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }
}
