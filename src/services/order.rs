//! Stock orders: placement by centers and fulfilment by the franchisor.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::{CollectionSource, NewOrderLine, RecordStore, Scope};
use crate::errors::AppError;
use crate::models::order::{CreateOrder, Order, OrderStatus, OrderWithItems};
use crate::models::pagination::{PagedResult, Pagination};
use crate::models::stock::StockItem;
use crate::services::lifecycle::check_transition;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OrderFilters {
    pub status: Option<OrderStatus>,
}

/// Orders visible in `scope`, newest first.
pub async fn list(
    source: &dyn CollectionSource,
    scope: Scope,
    filters: &OrderFilters,
    pagination: &Pagination,
) -> Result<PagedResult<Order>, AppError> {
    let mut orders: Vec<Order> = source
        .list_orders(scope)
        .await?
        .into_iter()
        .filter(|o| filters.status.map_or(true, |s| s == o.status))
        .collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(PagedResult::from_all(orders, pagination))
}

/// Price each requested line from the catalogue. Unknown items are rejected.
pub fn price_lines(
    input: &CreateOrder,
    catalogue: &[StockItem],
) -> Result<(Vec<NewOrderLine>, Decimal), AppError> {
    let by_id: HashMap<Uuid, &StockItem> = catalogue.iter().map(|i| (i.id, i)).collect();

    let mut lines = Vec::with_capacity(input.items.len());
    let mut total = Decimal::ZERO;
    for requested in &input.items {
        let item = by_id.get(&requested.stock_item_id).ok_or_else(|| {
            AppError::Validation(format!(
                "Unknown stock item {}",
                requested.stock_item_id
            ))
        })?;
        total += item.unit_price * Decimal::from(requested.quantity);
        lines.push(NewOrderLine {
            stock_item_id: item.id,
            quantity: requested.quantity,
            unit_price: item.unit_price,
        });
    }
    Ok((lines, total))
}

/// Place a pending order for a center. The total is computed here, never
/// taken from the client.
pub async fn create(
    source: &dyn CollectionSource,
    store: &dyn RecordStore,
    center_id: Uuid,
    input: &CreateOrder,
) -> Result<OrderWithItems, AppError> {
    input.validate()?;
    let catalogue = source.list_stock_items().await?;
    let (lines, total) = price_lines(input, &catalogue)?;

    let order = store
        .insert_order(center_id, input.notes.as_deref(), total, &lines)
        .await?;
    tracing::info!(
        order_id = %order.order.id,
        center_id = %center_id,
        lines = lines.len(),
        total = %total,
        "Order placed"
    );
    Ok(order)
}

pub async fn find_with_items(
    source: &dyn CollectionSource,
    store: &dyn RecordStore,
    scope: Scope,
    id: Uuid,
) -> Result<OrderWithItems, AppError> {
    let order = store
        .find_order(id)
        .await?
        .filter(|o| scope.includes(o.center_id))
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    let items = source.list_order_items(id).await?;
    Ok(OrderWithItems { order, items })
}

pub async fn set_status(
    store: &dyn RecordStore,
    id: Uuid,
    status: OrderStatus,
) -> Result<Order, AppError> {
    let current = store
        .find_order(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
    check_transition(current.status, status)?;
    let order = store.set_order_status(id, status).await?;
    tracing::info!(order_id = %id, from = ?current.status, to = ?status, "Order status changed");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::center::CenterStatus;
    use crate::models::order::CreateOrderLine;

    fn line(stock_item_id: Uuid, quantity: i32) -> CreateOrderLine {
        CreateOrderLine {
            stock_item_id,
            quantity,
        }
    }

    #[test]
    fn total_is_quantity_times_unit_price() {
        let book = StockItem {
            id: Uuid::new_v4(),
            name: "Workbook".to_string(),
            sku: "WB-1".to_string(),
            unit_price: Decimal::new(12050, 2),
            quantity: 100,
        };
        let kit = StockItem {
            id: Uuid::new_v4(),
            name: "Abacus kit".to_string(),
            sku: "AK-1".to_string(),
            unit_price: Decimal::from(300),
            quantity: 100,
        };
        let input = CreateOrder {
            items: vec![line(book.id, 2), line(kit.id, 1)],
            notes: None,
        };
        let (lines, total) = price_lines(&input, &[book, kit]).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(total, Decimal::new(54100, 2));
    }

    #[test]
    fn unknown_item_rejected() {
        let input = CreateOrder {
            items: vec![line(Uuid::new_v4(), 1)],
            notes: None,
        };
        assert!(matches!(
            price_lines(&input, &[]).unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn placed_order_is_pending_and_priced() {
        let store = MemoryStore::new();
        let center = store.seed_center("North", "N1", CenterStatus::Active);
        let item = store.seed_stock_item("Workbook", "WB-1", Decimal::from(40), 50);

        let placed = create(
            &store,
            &store,
            center.id,
            &CreateOrder {
                items: vec![line(item.id, 3)],
                notes: Some("urgent".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(placed.order.status, OrderStatus::Pending);
        assert_eq!(placed.order.total_amount, Some(Decimal::from(120)));
        assert_eq!(placed.items.len(), 1);

        let fetched = find_with_items(&store, &store, Scope::Center(center.id), placed.order.id)
            .await
            .unwrap();
        assert_eq!(fetched.items.len(), 1);

        let other = Scope::Center(Uuid::new_v4());
        assert!(find_with_items(&store, &store, other, placed.order.id)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn fulfilment_follows_graph() {
        let store = MemoryStore::new();
        let center = store.seed_center("North", "N1", CenterStatus::Active);
        let order = store.seed_order(center.id, OrderStatus::Pending, None);

        assert!(set_status(&store, order.id, OrderStatus::Completed).await.is_err());
        set_status(&store, order.id, OrderStatus::Processing).await.unwrap();
        let done = set_status(&store, order.id, OrderStatus::Completed).await.unwrap();
        assert!(done.is_completed());
        assert!(set_status(&store, order.id, OrderStatus::Cancelled).await.is_err());
    }
}
