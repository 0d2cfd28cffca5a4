//! In-memory implementation of the storage ports.
//!
//! Backs the test suites and local runs without a database. Seeding helpers
//! insert rows directly, bypassing the portal's validation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::store::{CollectionSource, CredentialStore, Directory, NewOrderLine, RecordStore, Scope};
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

#[derive(Default)]
struct Tables {
    credentials: Vec<Credential>,
    sessions: Vec<AuthSession>,
    profiles: Vec<Profile>,
    roles: Vec<(Uuid, String)>,
    centers: Vec<Center>,
    courses: Vec<Course>,
    students: Vec<Student>,
    enquiries: Vec<Enquiry>,
    stock_items: Vec<StockItem>,
    center_stock: Vec<CenterStock>,
    orders: Vec<Order>,
    order_items: Vec<OrderItem>,
    tickets: Vec<SupportTicket>,
    replies: Vec<TicketReply>,
}

/// Store holding every table in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_center(&self, name: &str, code: &str, status: CenterStatus) -> Center {
        let now = Utc::now();
        let center = Center {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            status,
            email: None,
            phone: None,
            address: None,
            city: None,
            state: None,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().centers.push(center.clone());
        center
    }

    pub fn seed_course(&self, name: &str, code: &str, status: CourseStatus) -> Course {
        let course = Course {
            id: Uuid::new_v4(),
            name: name.to_string(),
            code: code.to_string(),
            duration_months: None,
            fee: None,
            status,
            created_at: Utc::now(),
        };
        self.tables.write().courses.push(course.clone());
        course
    }

    pub fn seed_student(
        &self,
        center_id: Uuid,
        course_id: Option<Uuid>,
        full_name: &str,
        status: StudentStatus,
    ) -> Student {
        let student = Student {
            id: Uuid::new_v4(),
            center_id,
            course_id,
            full_name: full_name.to_string(),
            email: None,
            phone: None,
            status,
            enrolled_at: Utc::now(),
        };
        self.tables.write().students.push(student.clone());
        student
    }

    pub fn seed_stock_item(&self, name: &str, sku: &str, unit_price: Decimal, quantity: i32) -> StockItem {
        let item = StockItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            sku: sku.to_string(),
            unit_price,
            quantity,
        };
        self.tables.write().stock_items.push(item.clone());
        item
    }

    pub fn seed_center_stock(&self, center_id: Uuid, stock_item_id: Uuid, quantity: i32) -> CenterStock {
        let balance = CenterStock {
            id: Uuid::new_v4(),
            center_id,
            stock_item_id,
            quantity,
        };
        self.tables.write().center_stock.push(balance.clone());
        balance
    }

    pub fn seed_order(
        &self,
        center_id: Uuid,
        status: OrderStatus,
        total_amount: Option<Decimal>,
    ) -> Order {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            center_id,
            status,
            total_amount,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().orders.push(order.clone());
        order
    }

    /// Insert a raw role string, including ones the portal does not know.
    pub fn seed_raw_role(&self, user_id: Uuid, role: &str) {
        let mut tables = self.tables.write();
        tables.roles.retain(|(id, _)| *id != user_id);
        tables.roles.push((user_id, role.to_string()));
    }

    pub fn delete_center(&self, id: Uuid) {
        self.tables.write().centers.retain(|c| c.id != id);
    }

    pub fn live_session_count(&self, user_id: Uuid) -> usize {
        let now = Utc::now();
        self.tables
            .read()
            .sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.is_live(now))
            .count()
    }
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{what} not found"))
}

#[async_trait]
impl CollectionSource for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn list_centers(&self) -> Result<Vec<Center>, AppError> {
        let mut rows = self.tables.read().centers.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn find_center(&self, id: Uuid) -> Result<Option<Center>, AppError> {
        Ok(self.tables.read().centers.iter().find(|c| c.id == id).cloned())
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        Ok(self.tables.read().courses.clone())
    }

    async fn list_students(&self, scope: Scope) -> Result<Vec<Student>, AppError> {
        Ok(self
            .tables
            .read()
            .students
            .iter()
            .filter(|s| scope.includes(s.center_id))
            .cloned()
            .collect())
    }

    async fn list_enquiries(&self, scope: Scope) -> Result<Vec<Enquiry>, AppError> {
        let mut rows: Vec<Enquiry> = self
            .tables
            .read()
            .enquiries
            .iter()
            .filter(|e| scope.includes(e.center_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_orders(&self, scope: Scope) -> Result<Vec<Order>, AppError> {
        let mut rows: Vec<Order> = self
            .tables
            .read()
            .orders
            .iter()
            .filter(|o| scope.includes(o.center_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        Ok(self
            .tables
            .read()
            .order_items
            .iter()
            .filter(|i| i.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_stock_items(&self) -> Result<Vec<StockItem>, AppError> {
        Ok(self.tables.read().stock_items.clone())
    }

    async fn list_center_stock(&self, center_id: Uuid) -> Result<Vec<CenterStock>, AppError> {
        Ok(self
            .tables
            .read()
            .center_stock
            .iter()
            .filter(|s| s.center_id == center_id)
            .cloned()
            .collect())
    }

    async fn list_tickets(&self, scope: Scope) -> Result<Vec<SupportTicket>, AppError> {
        let mut rows: Vec<SupportTicket> = self
            .tables
            .read()
            .tickets
            .iter()
            .filter(|t| scope.includes(t.center_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn list_ticket_replies(&self, ticket_id: Uuid) -> Result<Vec<TicketReply>, AppError> {
        Ok(self
            .tables
            .read()
            .replies
            .iter()
            .filter(|r| r.ticket_id == ticket_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Directory for MemoryStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        Ok(self
            .tables
            .read()
            .profiles
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn find_role(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        Ok(self
            .tables
            .read()
            .roles
            .iter()
            .find(|(id, _)| *id == user_id)
            .map(|(_, role)| role.clone()))
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        tables.profiles.retain(|p| p.user_id != profile.user_id);
        tables.profiles.push(profile.clone());
        Ok(())
    }

    async fn assign_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError> {
        self.seed_raw_role(user_id, role.as_str());
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, AppError> {
        Ok(self
            .tables
            .read()
            .credentials
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_credential(&self, user_id: Uuid) -> Result<Option<Credential>, AppError> {
        Ok(self
            .tables
            .read()
            .credentials
            .iter()
            .find(|c| c.user_id == user_id)
            .cloned())
    }

    async fn insert_credential(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, AppError> {
        let mut tables = self.tables.write();
        if tables
            .credentials
            .iter()
            .any(|c| c.email.eq_ignore_ascii_case(email))
        {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }
        let credential = Credential {
            user_id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.credentials.push(credential.clone());
        Ok(credential)
    }

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let mut tables = self.tables.write();
        let credential = tables
            .credentials
            .iter_mut()
            .find(|c| c.user_id == user_id)
            .ok_or_else(|| not_found("Account"))?;
        credential.password_hash = password_hash.to_string();
        Ok(())
    }

    async fn insert_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthSession, AppError> {
        let session = AuthSession {
            id: Uuid::new_v4(),
            user_id,
            created_at: Utc::now(),
            expires_at,
            revoked_at: None,
        };
        self.tables.write().sessions.push(session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<AuthSession>, AppError> {
        Ok(self
            .tables
            .read()
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn revoke_session(&self, id: Uuid) -> Result<(), AppError> {
        let now = Utc::now();
        if let Some(session) = self
            .tables
            .write()
            .sessions
            .iter_mut()
            .find(|s| s.id == id && s.revoked_at.is_none())
        {
            session.revoked_at = Some(now);
        }
        Ok(())
    }

    async fn revoke_user_sessions(&self, user_id: Uuid) -> Result<u64, AppError> {
        let now = Utc::now();
        let mut revoked = 0;
        for session in self
            .tables
            .write()
            .sessions
            .iter_mut()
            .filter(|s| s.user_id == user_id && s.revoked_at.is_none())
        {
            session.revoked_at = Some(now);
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_center(&self, input: &CreateCenter) -> Result<Center, AppError> {
        let mut tables = self.tables.write();
        if tables.centers.iter().any(|c| c.code == input.code) {
            return Err(AppError::Conflict("Center code already exists".to_string()));
        }
        let now = Utc::now();
        let center = Center {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            code: input.code.clone(),
            status: CenterStatus::Active,
            email: input.email.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        tables.centers.push(center.clone());
        Ok(center)
    }

    async fn update_center(&self, id: Uuid, input: &UpdateCenter) -> Result<Center, AppError> {
        let mut tables = self.tables.write();
        let center = tables
            .centers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Center"))?;
        if let Some(name) = &input.name {
            center.name = name.clone();
        }
        if input.email.is_some() {
            center.email = input.email.clone();
        }
        if input.phone.is_some() {
            center.phone = input.phone.clone();
        }
        if input.address.is_some() {
            center.address = input.address.clone();
        }
        if input.city.is_some() {
            center.city = input.city.clone();
        }
        if input.state.is_some() {
            center.state = input.state.clone();
        }
        if let Some(points) = input.loyalty_points {
            center.loyalty_points = points;
        }
        center.updated_at = Utc::now();
        Ok(center.clone())
    }

    async fn set_center_status(
        &self,
        id: Uuid,
        status: CenterStatus,
    ) -> Result<Center, AppError> {
        let mut tables = self.tables.write();
        let center = tables
            .centers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Center"))?;
        center.status = status;
        center.updated_at = Utc::now();
        Ok(center.clone())
    }

    async fn insert_course(&self, input: &CreateCourse) -> Result<Course, AppError> {
        let mut tables = self.tables.write();
        if tables.courses.iter().any(|c| c.code == input.code) {
            return Err(AppError::Conflict("Course code already exists".to_string()));
        }
        let course = Course {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            code: input.code.clone(),
            duration_months: input.duration_months,
            fee: input.fee,
            status: CourseStatus::Active,
            created_at: Utc::now(),
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn update_course(&self, id: Uuid, input: &UpdateCourse) -> Result<Course, AppError> {
        let mut tables = self.tables.write();
        let course = tables
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Course"))?;
        if let Some(name) = &input.name {
            course.name = name.clone();
        }
        if input.duration_months.is_some() {
            course.duration_months = input.duration_months;
        }
        if input.fee.is_some() {
            course.fee = input.fee;
        }
        Ok(course.clone())
    }

    async fn set_course_status(
        &self,
        id: Uuid,
        status: CourseStatus,
    ) -> Result<Course, AppError> {
        let mut tables = self.tables.write();
        let course = tables
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found("Course"))?;
        course.status = status;
        Ok(course.clone())
    }

    async fn insert_student(
        &self,
        center_id: Uuid,
        input: &CreateStudent,
    ) -> Result<Student, AppError> {
        let student = Student {
            id: Uuid::new_v4(),
            center_id,
            course_id: input.course_id,
            full_name: input.full_name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            status: StudentStatus::Active,
            enrolled_at: Utc::now(),
        };
        self.tables.write().students.push(student.clone());
        Ok(student)
    }

    async fn find_student(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        Ok(self
            .tables
            .read()
            .students
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn set_student_status(
        &self,
        id: Uuid,
        status: StudentStatus,
    ) -> Result<Student, AppError> {
        let mut tables = self.tables.write();
        let student = tables
            .students
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("Student"))?;
        student.status = status;
        Ok(student.clone())
    }

    async fn insert_enquiry(
        &self,
        center_id: Uuid,
        input: &CreateEnquiry,
    ) -> Result<Enquiry, AppError> {
        let enquiry = Enquiry {
            id: Uuid::new_v4(),
            center_id,
            name: input.name.clone(),
            phone: input.phone.clone(),
            email: input.email.clone(),
            course_interest: input.course_interest.clone(),
            status: EnquiryStatus::New,
            notes: input.notes.clone(),
            created_at: Utc::now(),
        };
        self.tables.write().enquiries.push(enquiry.clone());
        Ok(enquiry)
    }

    async fn find_enquiry(&self, id: Uuid) -> Result<Option<Enquiry>, AppError> {
        Ok(self
            .tables
            .read()
            .enquiries
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn set_enquiry_status(
        &self,
        id: Uuid,
        status: EnquiryStatus,
        notes: Option<&str>,
    ) -> Result<Enquiry, AppError> {
        let mut tables = self.tables.write();
        let enquiry = tables
            .enquiries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| not_found("Enquiry"))?;
        enquiry.status = status;
        if let Some(notes) = notes {
            enquiry.notes = Some(notes.to_string());
        }
        Ok(enquiry.clone())
    }

    async fn insert_order(
        &self,
        center_id: Uuid,
        notes: Option<&str>,
        total_amount: Decimal,
        lines: &[NewOrderLine],
    ) -> Result<OrderWithItems, AppError> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            center_id,
            status: OrderStatus::Pending,
            total_amount: Some(total_amount),
            notes: notes.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4(),
                order_id: order.id,
                stock_item_id: line.stock_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            })
            .collect();

        let mut tables = self.tables.write();
        tables.orders.push(order.clone());
        tables.order_items.extend(items.iter().cloned());
        Ok(OrderWithItems { order, items })
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        Ok(self.tables.read().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, AppError> {
        let mut tables = self.tables.write();
        let order = tables
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| not_found("Order"))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn insert_ticket(
        &self,
        center_id: Uuid,
        created_by: Uuid,
        input: &CreateTicket,
    ) -> Result<SupportTicket, AppError> {
        let now = Utc::now();
        let ticket = SupportTicket {
            id: Uuid::new_v4(),
            center_id,
            subject: input.subject.clone(),
            description: input.description.clone(),
            priority: input.priority,
            status: TicketStatus::Open,
            created_by,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, AppError> {
        Ok(self.tables.read().tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn set_ticket_status(
        &self,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, AppError> {
        let mut tables = self.tables.write();
        let ticket = tables
            .tickets
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Ticket"))?;
        ticket.status = status;
        ticket.updated_at = Utc::now();
        Ok(ticket.clone())
    }

    async fn insert_ticket_reply(
        &self,
        ticket_id: Uuid,
        author_id: Uuid,
        message: &str,
    ) -> Result<TicketReply, AppError> {
        let reply = TicketReply {
            id: Uuid::new_v4(),
            ticket_id,
            author_id,
            message: message.to_string(),
            created_at: Utc::now(),
        };
        self.tables.write().replies.push(reply.clone());
        Ok(reply)
    }
}
