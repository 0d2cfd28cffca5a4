//! Support tickets raised by centers and the franchisor's replies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "ticket_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, Default)]
#[sqlx(type_name = "ticket_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SupportTicket {
    pub id: Uuid,
    pub center_id: Uuid,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TicketReply {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTicket {
    #[validate(length(min = 3, max = 200, message = "subject must be 3-200 characters"))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000, message = "description is required"))]
    pub description: String,
    #[serde(default)]
    pub priority: TicketPriority,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateReply {
    #[validate(length(min = 1, max = 5000, message = "message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetTicketStatus {
    pub status: TicketStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_defaults_to_medium() {
        let ticket: CreateTicket =
            serde_json::from_str(r#"{"subject":"Printer","description":"Out of toner"}"#).unwrap();
        assert_eq!(ticket.priority, TicketPriority::Medium);
    }

    #[test]
    fn status_serialization() {
        assert_eq!(
            serde_json::to_string(&TicketStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
