//! Status state machines for orders, support tickets, enquiries and
//! students.
//!
//! Every status change goes through [`check_transition`]. Centers and
//! courses are the exception: their status toggles freely and has no graph.

use crate::errors::AppError;
use crate::models::course::StudentStatus;
use crate::models::enquiry::EnquiryStatus;
use crate::models::order::OrderStatus;
use crate::models::ticket::TicketStatus;

/// A status field with an allowed-transition graph.
pub trait StatusGraph: Copy + PartialEq {
    const ENTITY: &'static str;

    fn label(&self) -> &'static str;

    fn is_valid_transition(from: Self, to: Self) -> bool;
}

impl StatusGraph for OrderStatus {
    const ENTITY: &'static str = "order";

    fn label(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Processing, OrderStatus::Completed)
                | (OrderStatus::Processing, OrderStatus::Cancelled)
        )
    }
}

impl StatusGraph for TicketStatus {
    const ENTITY: &'static str = "ticket";

    fn label(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (TicketStatus::Open, TicketStatus::InProgress)
                | (TicketStatus::Open, TicketStatus::Closed)
                | (TicketStatus::InProgress, TicketStatus::Resolved)
                | (TicketStatus::InProgress, TicketStatus::Closed)
                | (TicketStatus::Resolved, TicketStatus::Closed)
                // Reopen
                | (TicketStatus::Resolved, TicketStatus::Open)
        )
    }
}

impl StatusGraph for EnquiryStatus {
    const ENTITY: &'static str = "enquiry";

    fn label(&self) -> &'static str {
        match self {
            EnquiryStatus::New => "new",
            EnquiryStatus::Contacted => "contacted",
            EnquiryStatus::Converted => "converted",
            EnquiryStatus::Closed => "closed",
        }
    }

    fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (EnquiryStatus::New, EnquiryStatus::Contacted)
                | (EnquiryStatus::New, EnquiryStatus::Closed)
                | (EnquiryStatus::Contacted, EnquiryStatus::Converted)
                | (EnquiryStatus::Contacted, EnquiryStatus::Closed)
                | (EnquiryStatus::Closed, EnquiryStatus::New)
        )
    }
}

impl StatusGraph for StudentStatus {
    const ENTITY: &'static str = "student";

    fn label(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Inactive => "inactive",
            StudentStatus::Completed => "completed",
            StudentStatus::Dropped => "dropped",
        }
    }

    fn is_valid_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (StudentStatus::Active, StudentStatus::Inactive)
                | (StudentStatus::Active, StudentStatus::Completed)
                | (StudentStatus::Active, StudentStatus::Dropped)
                | (StudentStatus::Inactive, StudentStatus::Active)
                | (StudentStatus::Inactive, StudentStatus::Dropped)
                // Re-enrolment
                | (StudentStatus::Dropped, StudentStatus::Active)
        )
    }
}

/// Reject edges missing from the status graph.
pub fn check_transition<S: StatusGraph>(from: S, to: S) -> Result<(), AppError> {
    if S::is_valid_transition(from, to) {
        Ok(())
    } else {
        Err(AppError::InvalidTransition(format!(
            "Cannot move {} from {} to {}",
            S::ENTITY,
            from.label(),
            to.label()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_happy_path() {
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Processing).is_ok());
        assert!(check_transition(OrderStatus::Processing, OrderStatus::Completed).is_ok());
    }

    #[test]
    fn order_terminal_states() {
        for to in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::is_valid_transition(OrderStatus::Completed, to));
            assert!(!OrderStatus::is_valid_transition(OrderStatus::Cancelled, to));
        }
    }

    #[test]
    fn order_cannot_skip_processing() {
        let err = check_transition(OrderStatus::Pending, OrderStatus::Completed).unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(
            err.to_string(),
            "Invalid state transition: Cannot move order from pending to completed"
        );
    }

    #[test]
    fn ticket_transitions() {
        assert!(TicketStatus::is_valid_transition(TicketStatus::Open, TicketStatus::InProgress));
        assert!(TicketStatus::is_valid_transition(TicketStatus::Resolved, TicketStatus::Open));
        assert!(!TicketStatus::is_valid_transition(TicketStatus::Closed, TicketStatus::Open));
        assert!(!TicketStatus::is_valid_transition(TicketStatus::Open, TicketStatus::Resolved));
    }

    #[test]
    fn enquiry_transitions() {
        assert!(EnquiryStatus::is_valid_transition(EnquiryStatus::New, EnquiryStatus::Contacted));
        assert!(EnquiryStatus::is_valid_transition(EnquiryStatus::Closed, EnquiryStatus::New));
        assert!(!EnquiryStatus::is_valid_transition(
            EnquiryStatus::Converted,
            EnquiryStatus::Closed
        ));
        assert!(!EnquiryStatus::is_valid_transition(EnquiryStatus::New, EnquiryStatus::Converted));
    }

    #[test]
    fn student_transitions() {
        assert!(StudentStatus::is_valid_transition(StudentStatus::Active, StudentStatus::Completed));
        assert!(StudentStatus::is_valid_transition(StudentStatus::Dropped, StudentStatus::Active));
        assert!(!StudentStatus::is_valid_transition(
            StudentStatus::Completed,
            StudentStatus::Active
        ));
        assert!(!StudentStatus::is_valid_transition(
            StudentStatus::Inactive,
            StudentStatus::Completed
        ));
    }

    #[test]
    fn same_status_is_not_a_transition() {
        assert!(check_transition(TicketStatus::Open, TicketStatus::Open).is_err());
        assert!(check_transition(EnquiryStatus::New, EnquiryStatus::New).is_err());
    }
}
