//! Support tickets and their reply threads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, RecordStore, Scope};
use crate::errors::AppError;
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::ticket::{
    CreateReply, CreateTicket, SupportTicket, TicketPriority, TicketReply, TicketStatus,
};
use crate::services::lifecycle::check_transition;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TicketFilters {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
}

/// Ticket with its replies, oldest reply first.
#[derive(Debug, Clone, Serialize)]
pub struct TicketThread {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub replies: Vec<TicketReply>,
}

/// Tickets visible in `scope`, most recently updated first.
pub async fn list(
    source: &dyn CollectionSource,
    scope: Scope,
    filters: &TicketFilters,
    pagination: &Pagination,
) -> Result<PagedResult<SupportTicket>, AppError> {
    let mut tickets: Vec<SupportTicket> = source
        .list_tickets(scope)
        .await?
        .into_iter()
        .filter(|t| filters.status.map_or(true, |s| s == t.status))
        .filter(|t| filters.priority.map_or(true, |p| p == t.priority))
        .collect();
    tickets.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(PagedResult::from_all(tickets, pagination))
}

pub async fn create(
    store: &dyn RecordStore,
    center_id: Uuid,
    created_by: Uuid,
    input: &CreateTicket,
) -> Result<SupportTicket, AppError> {
    input.validate()?;
    let ticket = store.insert_ticket(center_id, created_by, input).await?;
    tracing::info!(
        ticket_id = %ticket.id,
        center_id = %center_id,
        priority = ?ticket.priority,
        "Support ticket opened"
    );
    Ok(ticket)
}

/// Ticket lookup restricted to `scope`; out-of-scope tickets are missing.
async fn find_in_scope(
    store: &dyn RecordStore,
    scope: Scope,
    id: Uuid,
) -> Result<SupportTicket, AppError> {
    store
        .find_ticket(id)
        .await?
        .filter(|t| scope.includes(t.center_id))
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))
}

pub async fn set_status(
    store: &dyn RecordStore,
    id: Uuid,
    status: TicketStatus,
) -> Result<SupportTicket, AppError> {
    let current = find_in_scope(store, Scope::All, id).await?;
    check_transition(current.status, status)?;
    store.set_ticket_status(id, status).await
}

pub async fn thread(
    source: &dyn CollectionSource,
    store: &dyn RecordStore,
    scope: Scope,
    id: Uuid,
) -> Result<TicketThread, AppError> {
    let ticket = find_in_scope(store, scope, id).await?;
    let mut replies = source.list_ticket_replies(id).await?;
    replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(TicketThread { ticket, replies })
}

/// Closed tickets take no further replies.
pub async fn reply(
    store: &dyn RecordStore,
    scope: Scope,
    id: Uuid,
    author_id: Uuid,
    input: &CreateReply,
) -> Result<TicketReply, AppError> {
    input.validate()?;
    let ticket = find_in_scope(store, scope, id).await?;
    if ticket.status == TicketStatus::Closed {
        return Err(AppError::Conflict("Ticket is closed".to_string()));
    }
    store
        .insert_ticket_reply(id, author_id, input.message.trim())
        .await
}
