//! Route definitions for the campusdesk API.

pub mod admin;
pub mod auth;
pub mod centers;
pub mod courses;
pub mod dashboard;
pub mod enquiries;
pub mod health;
pub mod orders;
pub mod students;
pub mod tickets;

use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Build the full application router: health probes at the root and the
/// JSON API under `/api/v1`.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/signup", post(auth::signup))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let dashboard_routes = Router::new()
        .route("/dashboard/global", get(dashboard::global))
        .route("/dashboard/top-centers", get(dashboard::top_centers))
        .route("/dashboard/stock", get(dashboard::stock))
        .route("/dashboard/center", get(dashboard::center));

    let center_routes = Router::new()
        .route("/centers", get(centers::list).post(centers::create))
        .route(
            "/centers/{id}",
            get(centers::get_by_id).put(centers::update),
        )
        .route("/centers/{id}/status", patch(centers::set_status));

    let course_routes = Router::new()
        .route("/courses", get(courses::list).post(courses::create))
        .route("/courses/{id}", put(courses::update))
        .route("/courses/{id}/status", patch(courses::set_status));

    let student_routes = Router::new()
        .route("/students", get(students::list).post(students::enroll))
        .route("/students/{id}/status", patch(students::set_status));

    let enquiry_routes = Router::new()
        .route("/enquiries", get(enquiries::list).post(enquiries::create))
        .route("/enquiries/{id}/status", patch(enquiries::set_status));

    let order_routes = Router::new()
        .route("/orders", get(orders::list).post(orders::create))
        .route("/orders/{id}", get(orders::get_by_id))
        .route("/orders/{id}/status", patch(orders::set_status));

    let ticket_routes = Router::new()
        .route("/tickets", get(tickets::list).post(tickets::create))
        .route("/tickets/{id}/status", patch(tickets::set_status))
        .route(
            "/tickets/{id}/replies",
            get(tickets::thread).post(tickets::reply),
        );

    let admin_routes = Router::new()
        .route("/admin/center-admins", post(admin::create_center_admin))
        .route(
            "/admin/center-admins/{id}/password",
            post(admin::reset_password),
        )
        .route("/admin/accounts/{id}/activate", post(admin::activate));

    let api = Router::new()
        .merge(auth_routes)
        .merge(dashboard_routes)
        .merge(center_routes)
        .merge(course_routes)
        .merge(student_routes)
        .merge(enquiry_routes)
        .merge(order_routes)
        .merge(ticket_routes)
        .merge(admin_routes);

    let timeout = Duration::from_secs(state.config.request_timeout_secs);
    let cors = cors_layer(&state.config.frontend_url);

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", api)
        .layer(TimeoutLayer::new(timeout))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let origin = match frontend_url.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(e) => {
            tracing::warn!(frontend_url, error = %e, "Invalid FRONTEND_URL, allowing any origin");
            AllowOrigin::any()
        }
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
