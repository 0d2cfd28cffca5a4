//! Persistence and identity-storage ports.
//!
//! The portal never talks to the database directly: services consume these
//! traits, implemented by [`super::postgres::PgStore`] and
//! [`super::memory::MemoryStore`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::center::{Center, CenterStatus, CreateCenter, UpdateCenter};
use crate::models::course::{
    Course, CourseStatus, CreateCourse, CreateStudent, Student, StudentStatus, UpdateCourse,
};
use crate::models::enquiry::{CreateEnquiry, Enquiry, EnquiryStatus};
use crate::models::order::{Order, OrderItem, OrderStatus, OrderWithItems};
use crate::models::principal::Profile;
use crate::models::role::AppRole;
use crate::models::stock::{CenterStock, StockItem};
use crate::models::ticket::{CreateTicket, SupportTicket, TicketReply, TicketStatus};
use crate::models::user::{AuthSession, Credential};

/// Row scope for tenant-partitioned collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Center(Uuid),
}

impl Scope {
    pub fn center_id(&self) -> Option<Uuid> {
        match self {
            Scope::All => None,
            Scope::Center(id) => Some(*id),
        }
    }

    pub fn includes(&self, center_id: Uuid) -> bool {
        match self {
            Scope::All => true,
            Scope::Center(id) => *id == center_id,
        }
    }
}

/// Read access to entity collections.
#[async_trait]
pub trait CollectionSource: Send + Sync {
    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), AppError>;

    async fn list_centers(&self) -> Result<Vec<Center>, AppError>;

    async fn find_center(&self, id: Uuid) -> Result<Option<Center>, AppError>;

    async fn list_courses(&self) -> Result<Vec<Course>, AppError>;

    async fn list_students(&self, scope: Scope) -> Result<Vec<Student>, AppError>;

    async fn list_enquiries(&self, scope: Scope) -> Result<Vec<Enquiry>, AppError>;

    async fn list_orders(&self, scope: Scope) -> Result<Vec<Order>, AppError>;

    async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError>;

    async fn list_stock_items(&self) -> Result<Vec<StockItem>, AppError>;

    async fn list_center_stock(&self, center_id: Uuid) -> Result<Vec<CenterStock>, AppError>;

    async fn list_tickets(&self, scope: Scope) -> Result<Vec<SupportTicket>, AppError>;

    async fn list_ticket_replies(&self, ticket_id: Uuid) -> Result<Vec<TicketReply>, AppError>;
}

/// Profile and role records used to resolve principals.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;

    /// Raw role string as stored; parsing happens in the resolver.
    async fn find_role(&self, user_id: Uuid) -> Result<Option<String>, AppError>;

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError>;

    async fn assign_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError>;
}

/// Storage behind the identity service.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential_by_email(&self, email: &str)
        -> Result<Option<Credential>, AppError>;

    async fn find_credential(&self, user_id: Uuid) -> Result<Option<Credential>, AppError>;

    /// Fails with `Conflict` when the email is taken.
    async fn insert_credential(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, AppError>;

    async fn update_password_hash(&self, user_id: Uuid, password_hash: &str)
        -> Result<(), AppError>;

    async fn insert_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthSession, AppError>;

    async fn find_session(&self, id: Uuid) -> Result<Option<AuthSession>, AppError>;

    /// Revoking an unknown or already revoked session is not an error.
    async fn revoke_session(&self, id: Uuid) -> Result<(), AppError>;

    async fn revoke_user_sessions(&self, user_id: Uuid) -> Result<u64, AppError>;
}

/// Line item priced at order time.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub stock_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Mutations on tenant records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fails with `Conflict` when the center code is taken.
    async fn insert_center(&self, input: &CreateCenter) -> Result<Center, AppError>;

    async fn update_center(&self, id: Uuid, input: &UpdateCenter) -> Result<Center, AppError>;

    async fn set_center_status(&self, id: Uuid, status: CenterStatus)
        -> Result<Center, AppError>;

    /// Fails with `Conflict` when the course code is taken.
    async fn insert_course(&self, input: &CreateCourse) -> Result<Course, AppError>;

    async fn update_course(&self, id: Uuid, input: &UpdateCourse) -> Result<Course, AppError>;

    async fn set_course_status(&self, id: Uuid, status: CourseStatus)
        -> Result<Course, AppError>;

    async fn insert_student(
        &self,
        center_id: Uuid,
        input: &CreateStudent,
    ) -> Result<Student, AppError>;

    async fn find_student(&self, id: Uuid) -> Result<Option<Student>, AppError>;

    async fn set_student_status(
        &self,
        id: Uuid,
        status: StudentStatus,
    ) -> Result<Student, AppError>;

    async fn insert_enquiry(
        &self,
        center_id: Uuid,
        input: &CreateEnquiry,
    ) -> Result<Enquiry, AppError>;

    async fn find_enquiry(&self, id: Uuid) -> Result<Option<Enquiry>, AppError>;

    async fn set_enquiry_status(
        &self,
        id: Uuid,
        status: EnquiryStatus,
        notes: Option<&str>,
    ) -> Result<Enquiry, AppError>;

    async fn insert_order(
        &self,
        center_id: Uuid,
        notes: Option<&str>,
        total_amount: Decimal,
        lines: &[NewOrderLine],
    ) -> Result<OrderWithItems, AppError>;

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError>;

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, AppError>;

    async fn insert_ticket(
        &self,
        center_id: Uuid,
        created_by: Uuid,
        input: &CreateTicket,
    ) -> Result<SupportTicket, AppError>;

    async fn find_ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, AppError>;

    async fn set_ticket_status(
        &self,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, AppError>;

    async fn insert_ticket_reply(
        &self,
        ticket_id: Uuid,
        author_id: Uuid,
        message: &str,
    ) -> Result<TicketReply, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_includes() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert!(Scope::All.includes(a));
        assert!(Scope::Center(a).includes(a));
        assert!(!Scope::Center(a).includes(b));
        assert_eq!(Scope::Center(a).center_id(), Some(a));
        assert_eq!(Scope::All.center_id(), None);
    }
}
