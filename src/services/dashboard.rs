//! Dashboard statistics: concurrent collection fetches reduced by pure
//! functions.
//!
//! The reducers never filter by tenant. Tenant scoping happens when the
//! collections are fetched, so the reducers stay pure and testable.

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{CollectionSource, Scope};
use crate::errors::AppError;
use crate::models::center::Center;
use crate::models::course::{Course, CourseStatus, Student, StudentStatus};
use crate::models::enquiry::{Enquiry, EnquiryStatus};
use crate::models::money::amount_or_zero;
use crate::models::order::{Order, OrderStatus};
use crate::models::stock::{CenterStock, StockItem};

/// Warehouse items below this quantity are low (`quantity < 10`).
pub const GLOBAL_LOW_STOCK_THRESHOLD: i32 = 10;

/// Center stock at or below this quantity is low (`quantity <= 5`).
///
/// Differs from [`GLOBAL_LOW_STOCK_THRESHOLD`] in both value and comparison.
// TODO: drop one of the two thresholds once a single low-stock rule is agreed.
pub const TENANT_LOW_STOCK_THRESHOLD: i32 = 5;

pub const DEFAULT_TOP_CENTERS: usize = 5;
pub const MAX_TOP_CENTERS: usize = 50;

/// Franchise-wide statistics for the super-admin overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_centers: usize,
    pub active_centers: usize,
    pub total_students: usize,
    pub active_students: usize,
    pub total_courses: usize,
    pub active_courses: usize,
    pub total_orders: usize,
    pub pending_orders: usize,
    pub total_revenue: Decimal,
}

/// Statistics for a single center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CenterDashboardStats {
    pub total_students: usize,
    pub active_students: usize,
    pub total_enquiries: usize,
    pub new_enquiries: usize,
    pub converted_enquiries: usize,
    pub stock_lines: usize,
    pub stock_units: i64,
    pub low_stock_lines: usize,
    pub total_orders: usize,
    pub pending_orders: usize,
    pub completed_order_value: Decimal,
    pub loyalty_points: i64,
}

/// Center ranked by enrolment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopCenter {
    pub center_id: Uuid,
    pub name: String,
    pub code: String,
    pub student_count: usize,
    pub total_revenue: Decimal,
}

/// Warehouse item flagged in the stock overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowStockItem {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
}

/// Warehouse-wide stock summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockOverview {
    pub total_items: usize,
    pub total_units: i64,
    pub inventory_value: Decimal,
    pub out_of_stock: usize,
    pub low_stock: Vec<LowStockItem>,
}

/// Combined payload of the center dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct CenterDashboard {
    pub center_id: Uuid,
    pub center_name: String,
    pub stats: CenterDashboardStats,
}

pub fn is_globally_low(quantity: i32) -> bool {
    quantity < GLOBAL_LOW_STOCK_THRESHOLD
}

pub fn is_tenant_low(quantity: i32) -> bool {
    quantity <= TENANT_LOW_STOCK_THRESHOLD
}

/// Revenue counts completed orders only. Missing amounts add nothing.
fn completed_revenue<'a>(orders: impl IntoIterator<Item = &'a Order>) -> Decimal {
    orders
        .into_iter()
        .filter(|o| o.is_completed())
        .map(|o| amount_or_zero(o.total_amount))
        .sum()
}

pub fn compute_global_stats(
    centers: &[Center],
    students: &[Student],
    courses: &[Course],
    orders: &[Order],
) -> DashboardStats {
    DashboardStats {
        total_centers: centers.len(),
        active_centers: centers.iter().filter(|c| c.is_active()).count(),
        total_students: students.len(),
        active_students: students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .count(),
        total_courses: courses.len(),
        active_courses: courses
            .iter()
            .filter(|c| c.status == CourseStatus::Active)
            .count(),
        total_orders: orders.len(),
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        total_revenue: completed_revenue(orders),
    }
}

/// Inputs must already be restricted to one center.
pub fn compute_tenant_stats(
    students: &[Student],
    enquiries: &[Enquiry],
    stock: &[CenterStock],
    orders: &[Order],
    loyalty_points: i64,
) -> CenterDashboardStats {
    CenterDashboardStats {
        total_students: students.len(),
        active_students: students
            .iter()
            .filter(|s| s.status == StudentStatus::Active)
            .count(),
        total_enquiries: enquiries.len(),
        new_enquiries: enquiries
            .iter()
            .filter(|e| e.status == EnquiryStatus::New)
            .count(),
        converted_enquiries: enquiries
            .iter()
            .filter(|e| e.status == EnquiryStatus::Converted)
            .count(),
        stock_lines: stock.len(),
        stock_units: stock.iter().map(|s| i64::from(s.quantity.max(0))).sum(),
        low_stock_lines: stock.iter().filter(|s| is_tenant_low(s.quantity)).count(),
        total_orders: orders.len(),
        pending_orders: orders
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        completed_order_value: completed_revenue(orders),
        loyalty_points,
    }
}

/// Active centers ranked by student count, then revenue, then code, then id.
pub fn top_centers(
    centers: &[Center],
    students: &[Student],
    orders: &[Order],
    n: usize,
) -> Vec<TopCenter> {
    let mut student_counts: HashMap<Uuid, usize> = HashMap::new();
    for student in students {
        *student_counts.entry(student.center_id).or_default() += 1;
    }

    let mut revenue: HashMap<Uuid, Decimal> = HashMap::new();
    for order in orders.iter().filter(|o| o.is_completed()) {
        *revenue.entry(order.center_id).or_default() += amount_or_zero(order.total_amount);
    }

    let mut ranked: Vec<TopCenter> = centers
        .iter()
        .filter(|c| c.is_active())
        .map(|c| TopCenter {
            center_id: c.id,
            name: c.name.clone(),
            code: c.code.clone(),
            student_count: student_counts.get(&c.id).copied().unwrap_or(0),
            total_revenue: revenue.get(&c.id).copied().unwrap_or(Decimal::ZERO),
        })
        .collect();

    ranked.sort_by(rank_order);
    ranked.truncate(n);
    ranked
}

fn rank_order(a: &TopCenter, b: &TopCenter) -> Ordering {
    b.student_count
        .cmp(&a.student_count)
        .then_with(|| b.total_revenue.cmp(&a.total_revenue))
        .then_with(|| a.code.cmp(&b.code))
        .then_with(|| a.center_id.cmp(&b.center_id))
}

pub fn compute_stock_overview(items: &[StockItem]) -> StockOverview {
    let mut low_stock: Vec<LowStockItem> = items
        .iter()
        .filter(|i| is_globally_low(i.quantity))
        .map(|i| LowStockItem {
            id: i.id,
            name: i.name.clone(),
            sku: i.sku.clone(),
            quantity: i.quantity,
        })
        .collect();
    low_stock.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.sku.cmp(&b.sku)));

    StockOverview {
        total_items: items.len(),
        total_units: items.iter().map(|i| i64::from(i.quantity.max(0))).sum(),
        inventory_value: items
            .iter()
            .map(|i| i.unit_price * Decimal::from(i.quantity.max(0)))
            .sum(),
        out_of_stock: items.iter().filter(|i| i.quantity <= 0).count(),
        low_stock,
    }
}

/// Fetch the four global collections concurrently and reduce them.
pub async fn global_dashboard(source: &dyn CollectionSource) -> Result<DashboardStats, AppError> {
    let (centers, students, courses, orders) = tokio::try_join!(
        source.list_centers(),
        source.list_students(Scope::All),
        source.list_courses(),
        source.list_orders(Scope::All),
    )?;
    Ok(compute_global_stats(&centers, &students, &courses, &orders))
}

/// Clamp a requested top-N size to `1..=MAX_TOP_CENTERS`.
pub fn clamp_top_limit(limit: Option<usize>) -> usize {
    limit
        .unwrap_or(DEFAULT_TOP_CENTERS)
        .clamp(1, MAX_TOP_CENTERS)
}

pub async fn top_centers_view(
    source: &dyn CollectionSource,
    limit: usize,
) -> Result<Vec<TopCenter>, AppError> {
    let (centers, students, orders) = tokio::try_join!(
        source.list_centers(),
        source.list_students(Scope::All),
        source.list_orders(Scope::All),
    )?;
    Ok(top_centers(&centers, &students, &orders, limit))
}

pub async fn stock_overview(source: &dyn CollectionSource) -> Result<StockOverview, AppError> {
    let items = source.list_stock_items().await?;
    Ok(compute_stock_overview(&items))
}

/// Fetch one center's collections concurrently and reduce them.
pub async fn center_dashboard(
    source: &dyn CollectionSource,
    center_id: Uuid,
) -> Result<CenterDashboard, AppError> {
    let scope = Scope::Center(center_id);
    let (center, students, enquiries, stock, orders) = tokio::try_join!(
        source.find_center(center_id),
        source.list_students(scope),
        source.list_enquiries(scope),
        source.list_center_stock(center_id),
        source.list_orders(scope),
    )?;
    let center = center.ok_or_else(|| AppError::NotFound("Center not found".to_string()))?;

    tracing::debug!(
        center_id = %center_id,
        students = students.len(),
        orders = orders.len(),
        "Center dashboard collections fetched"
    );

    Ok(CenterDashboard {
        center_id,
        center_name: center.name,
        stats: compute_tenant_stats(&students, &enquiries, &stock, &orders, center.loyalty_points),
    })
}
