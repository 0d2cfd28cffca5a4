//! Shared helpers for integration tests: in-memory app state, account
//! setup, request plumbing and a failure-injecting collection source.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use campusdesk::config::AppConfig;
use campusdesk::db::{CollectionSource, Directory, MemoryStore, Scope};
use campusdesk::errors::AppError;
use campusdesk::models::center::Center;
use campusdesk::models::course::{Course, Student};
use campusdesk::models::enquiry::Enquiry;
use campusdesk::models::order::{Order, OrderItem};
use campusdesk::models::principal::Profile;
use campusdesk::models::role::AppRole;
use campusdesk::models::stock::{CenterStock, StockItem};
use campusdesk::models::ticket::{SupportTicket, TicketReply};
use campusdesk::services::identity::IdentityProvider;
use campusdesk::{routes, AppState};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const PASSWORD: &str = "Password123!";

pub fn test_state() -> (AppState, Arc<MemoryStore>) {
    AppState::in_memory(AppConfig::for_testing(JWT_SECRET))
}

pub fn test_app() -> (Router, AppState, Arc<MemoryStore>) {
    let (state, store) = test_state();
    (routes::router(state.clone()), state, store)
}

/// Create an identity with a profile and, optionally, a raw role record.
pub async fn create_account(
    state: &AppState,
    store: &MemoryStore,
    email: &str,
    role: Option<&str>,
    center_id: Option<Uuid>,
) -> Uuid {
    let identity = state.identity.sign_up(email, PASSWORD).await.unwrap();
    store
        .upsert_profile(&Profile {
            user_id: identity.user_id,
            email: identity.email.clone(),
            full_name: None,
            center_id,
        })
        .await
        .unwrap();
    if let Some(role) = role {
        store.seed_raw_role(identity.user_id, role);
    }
    identity.user_id
}

/// Issue a request against the router and decode the JSON envelope.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}

/// Log in over HTTP and return the access token.
pub async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/auth/login",
        None,
        Some(serde_json::json!({ "email": email, "password": PASSWORD })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["access_token"]
        .as_str()
        .expect("access_token in login response")
        .to_string()
}

/// Collection a [`FailingSource`] refuses to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Centers,
    Students,
    Courses,
    Orders,
    Enquiries,
    CenterStock,
    /// Single-center lookup used for tenant names.
    CenterLookup,
}

/// Delegates to a memory store but fails one collection fetch.
pub struct FailingSource {
    pub inner: Arc<MemoryStore>,
    pub failing: Collection,
}

impl FailingSource {
    fn check(&self, collection: Collection) -> Result<(), AppError> {
        if self.failing == collection {
            Err(AppError::Internal(format!("{collection:?} fetch failed")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CollectionSource for FailingSource {
    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }

    async fn list_centers(&self) -> Result<Vec<Center>, AppError> {
        self.check(Collection::Centers)?;
        self.inner.list_centers().await
    }

    async fn find_center(&self, id: Uuid) -> Result<Option<Center>, AppError> {
        self.check(Collection::CenterLookup)?;
        self.inner.find_center(id).await
    }

    async fn list_courses(&self) -> Result<Vec<Course>, AppError> {
        self.check(Collection::Courses)?;
        self.inner.list_courses().await
    }

    async fn list_students(&self, scope: Scope) -> Result<Vec<Student>, AppError> {
        self.check(Collection::Students)?;
        self.inner.list_students(scope).await
    }

    async fn list_enquiries(&self, scope: Scope) -> Result<Vec<Enquiry>, AppError> {
        self.check(Collection::Enquiries)?;
        self.inner.list_enquiries(scope).await
    }

    async fn list_orders(&self, scope: Scope) -> Result<Vec<Order>, AppError> {
        self.check(Collection::Orders)?;
        self.inner.list_orders(scope).await
    }

    async fn list_order_items(&self, order_id: Uuid) -> Result<Vec<OrderItem>, AppError> {
        self.inner.list_order_items(order_id).await
    }

    async fn list_stock_items(&self) -> Result<Vec<StockItem>, AppError> {
        self.inner.list_stock_items().await
    }

    async fn list_center_stock(&self, center_id: Uuid) -> Result<Vec<CenterStock>, AppError> {
        self.check(Collection::CenterStock)?;
        self.inner.list_center_stock(center_id).await
    }

    async fn list_tickets(&self, scope: Scope) -> Result<Vec<SupportTicket>, AppError> {
        self.inner.list_tickets(scope).await
    }

    async fn list_ticket_replies(&self, ticket_id: Uuid) -> Result<Vec<TicketReply>, AppError> {
        self.inner.list_ticket_replies(ticket_id).await
    }
}

/// Directory lookup a [`FailingDirectory`] refuses to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Profile,
    Role,
}

/// Delegates to a memory store but fails one directory lookup.
pub struct FailingDirectory {
    pub inner: Arc<MemoryStore>,
    pub failing: Lookup,
}

impl FailingDirectory {
    fn check(&self, lookup: Lookup) -> Result<(), AppError> {
        if self.failing == lookup {
            Err(AppError::Internal(format!("{lookup:?} lookup failed")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Directory for FailingDirectory {
    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        self.check(Lookup::Profile)?;
        self.inner.find_profile(user_id).await
    }

    async fn find_role(&self, user_id: Uuid) -> Result<Option<String>, AppError> {
        self.check(Lookup::Role)?;
        self.inner.find_role(user_id).await
    }

    async fn upsert_profile(&self, profile: &Profile) -> Result<(), AppError> {
        self.inner.upsert_profile(profile).await
    }

    async fn assign_role(&self, user_id: Uuid, role: AppRole) -> Result<(), AppError> {
        self.inner.assign_role(user_id, role).await
    }
}
