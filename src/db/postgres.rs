//! PostgreSQL implementation of the storage ports.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
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

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(e: sqlx::Error, message: &str) -> AppError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(e),
    }
}

#[async_trait]
impl CollectionSource for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_centers(&self) -> Result<Vec<Center>, AppError> {
        let rows = sqlx::query_as::<_, Center>("SELECT * FROM centers ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_center(&self, id: Uuid) -> Result<Option<Center>, AppError> {
        let row = sqlx::query_as::<_, Center>("SELECT * FROM centers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        let rows = sqlx::query_as::<_, Course>("SELECT * FROM courses ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_students(&self, scope: Scope) -> Result<Vec<Student>, AppError> {
        let rows = sqlx::query_as::<_, Student>(
            "SELECT * FROM students WHERE ($1::uuid IS NULL OR center_id = $1) ORDER BY enrolled_at DESC",
        )
        .bind(scope.center_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_enquiries(&self, scope: Scope) -> Result<Vec<Enquiry>, AppError> {
        let rows = sqlx::query_as::<_, Enquiry>(
            "SELECT * FROM enquiries WHERE ($1::uuid IS NULL OR center_id = $1) ORDER BY created_at DESC",
        )
        .bind(scope.center_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_orders(&self, scope: Scope) -> Result<Vec<Order>, AppError> {
        let rows = sqlx::query_as::<_, Order>(
            "SELECT * FROM orders WHERE ($1::uuid IS NULL OR center_id = $1) ORDER BY created_at DESC",
        )
        .bind(scope.center_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        let rows = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_stock_items(&self) -> Result<Vec<StockItem>, AppError> {
        let rows = sqlx::query_as::<_, StockItem>("SELECT * FROM stock_items ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_center_stock(&self, center_id: Uuid) -> Result<Vec<CenterStock>, AppError> {
        let rows =
            sqlx::query_as::<_, CenterStock>("SELECT * FROM center_stock WHERE center_id = $1")
                .bind(center_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    async fn list_tickets(&self, scope: Scope) -> Result<Vec<SupportTicket>, AppError> {
        let rows = sqlx::query_as::<_, SupportTicket>(
            "SELECT * FROM support_tickets WHERE ($1::uuid IS NULL OR center_id = $1) ORDER BY created_at DESC",
        )
        .bind(scope.center_id())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn list_ticket_replies(&self, ticket_id: Uuid) -> Result<Vec<TicketReply>, AppError> {
        let rows = sqlx::query_as::<_, TicketReply>(
            "SELECT * FROM support_ticket_replies WHERE ticket_id = $1 ORDER BY created_at",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[async_trait]
impl Directory for PgStore {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_role(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        let role = sqlx::query_scalar::<_, String>("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(role)
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, email, full_name, center_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE
            SET email = EXCLUDED.email, full_name = EXCLUDED.full_name, center_id = EXCLUDED.center_id
            "#,
        )
        .bind(profile.user_id)
        .bind(&profile.email)
        .bind(&profile.full_name)
        .bind(profile.center_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn assign_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role) VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_credential_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query_as::<_, Credential>(
            "SELECT * FROM credentials WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_credential(&self, user_id: Uuid) -> Result<Option<Credential>, AppError> {
        let row = sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert_credential(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Credential, AppError> {
        sqlx::query_as::<_, Credential>(
            "INSERT INTO credentials (email, password_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Email already registered"))
    }

    async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE credentials SET password_hash = $1 WHERE user_id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Account not found".to_string()));
        }
        Ok(())
    }

    async fn insert_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<AuthSession, AppError> {
        let row = sqlx::query_as::<_, AuthSession>(
            "INSERT INTO auth_sessions (user_id, expires_at) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<AuthSession>, AppError> {
        let row = sqlx::query_as::<_, AuthSession>("SELECT * FROM auth_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn revoke_session(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE auth_sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_user_sessions(&self, user_id: Uuid) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE auth_sessions SET revoked_at = NOW() WHERE user_id = $1 AND revoked_at IS NULL",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert_center(&self, input: &CreateCenter) -> Result<Center, AppError> {
        sqlx::query_as::<_, Center>(
            r#"
            INSERT INTO centers (name, code, email, phone, address, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.code)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Center code already exists"))
    }

    async fn update_center(&self, id: Uuid, input: &UpdateCenter) -> Result<Center, AppError> {
        sqlx::query_as::<_, Center>(
            r#"
            UPDATE centers SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                city = COALESCE($6, city),
                state = COALESCE($7, state),
                loyalty_points = COALESCE($8, loyalty_points),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(&input.city)
        .bind(&input.state)
        .bind(input.loyalty_points)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Center not found".to_string()))
    }

    async fn set_center_status(
        &self,
        id: Uuid,
        status: CenterStatus,
    ) -> Result<Center, AppError> {
        sqlx::query_as::<_, Center>(
            "UPDATE centers SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Center not found".to_string()))
    }

    async fn insert_course(&self, input: &CreateCourse) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (name, code, duration_months, fee)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.code)
        .bind(input.duration_months)
        .bind(input.fee)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Course code already exists"))
    }

    async fn update_course(&self, id: Uuid, input: &UpdateCourse) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses SET
                name = COALESCE($2, name),
                duration_months = COALESCE($3, duration_months),
                fee = COALESCE($4, fee)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.duration_months)
        .bind(input.fee)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    async fn set_course_status(
        &self,
        id: Uuid,
        status: CourseStatus,
    ) -> Result<Course, AppError> {
        sqlx::query_as::<_, Course>("UPDATE courses SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    async fn insert_student(
        &self,
        center_id: Uuid,
        input: &CreateStudent,
    ) -> Result<Student, AppError> {
        let row = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (center_id, course_id, full_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(center_id)
        .bind(input.course_id)
        .bind(&input.full_name)
        .bind(&input.email)
        .bind(&input.phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_student(&self, id: Uuid) -> Result<Option<Student>, AppError> {
        let row = sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn set_student_status(
        &self,
        id: Uuid,
        status: StudentStatus,
    ) -> Result<Student, AppError> {
        sqlx::query_as::<_, Student>("UPDATE students SET status = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Student not found".to_string()))
    }

    async fn insert_enquiry(
        &self,
        center_id: Uuid,
        input: &CreateEnquiry,
    ) -> Result<Enquiry, AppError> {
        let row = sqlx::query_as::<_, Enquiry>(
            r#"
            INSERT INTO enquiries (center_id, name, phone, email, course_interest, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(center_id)
        .bind(&input.name)
        .bind(&input.phone)
        .bind(&input.email)
        .bind(&input.course_interest)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_enquiry(&self, id: Uuid) -> Result<Option<Enquiry>, AppError> {
        let row = sqlx::query_as::<_, Enquiry>("SELECT * FROM enquiries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn set_enquiry_status(
        &self,
        id: Uuid,
        status: EnquiryStatus,
        notes: Option<&str>,
    ) -> Result<Enquiry, AppError> {
        sqlx::query_as::<_, Enquiry>(
            "UPDATE enquiries SET status = $2, notes = COALESCE($3, notes) WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .bind(notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Enquiry not found".to_string()))
    }

    async fn insert_order(
        &self,
        center_id: Uuid,
        notes: Option<&str>,
        total_amount: Decimal,
        lines: &[NewOrderLine],
    ) -> Result<OrderWithItems, AppError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO orders (center_id, total_amount, notes) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(center_id)
        .bind(total_amount)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = sqlx::query_as::<_, OrderItem>(
                r#"
                INSERT INTO order_items (order_id, stock_item_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(order.id)
            .bind(line.stock_item_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;

        Ok(OrderWithItems { order, items })
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, AppError> {
        let row = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn set_order_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, AppError> {
        sqlx::query_as::<_, Order>(
            "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
    }

    async fn insert_ticket(
        &self,
        center_id: Uuid,
        created_by: Uuid,
        input: &CreateTicket,
    ) -> Result<SupportTicket, AppError> {
        let row = sqlx::query_as::<_, SupportTicket>(
            r#"
            INSERT INTO support_tickets (center_id, subject, description, priority, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(center_id)
        .bind(&input.subject)
        .bind(&input.description)
        .bind(input.priority)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<SupportTicket>, AppError> {
        let row = sqlx::query_as::<_, SupportTicket>("SELECT * FROM support_tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn set_ticket_status(
        &self,
        id: Uuid,
        status: TicketStatus,
    ) -> Result<SupportTicket, AppError> {
        sqlx::query_as::<_, SupportTicket>(
            "UPDATE support_tickets SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))
    }

    async fn insert_ticket_reply(
        &self,
        ticket_id: Uuid,
        author_id: Uuid,
        message: &str,
    ) -> Result<TicketReply, AppError> {
        let row = sqlx::query_as::<_, TicketReply>(
            r#"
            INSERT INTO support_ticket_replies (ticket_id, author_id, message)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(ticket_id)
        .bind(author_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
