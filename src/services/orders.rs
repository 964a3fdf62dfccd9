use crate::{
    db::DbPool,
    entities::menu_item::Entity as MenuItemEntity,
    entities::order::{
        self, ActiveModel as OrderActiveModel, Entity as OrderEntity, Model as OrderModel,
        OrderStatus,
    },
    entities::order_line::{
        self, ActiveModel as OrderLineActiveModel, Entity as OrderLineEntity,
        Model as OrderLineModel,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    services::customers::CustomerService,
    services::inventory::{InventoryService, StockDeduction},
};
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Flat tax applied to every order subtotal.
pub const TAX_RATE: Decimal = dec!(0.10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Recomputes an order's money fields from its line totals. Pure and
/// idempotent; the discount passes through unchecked, so a discount larger
/// than the order drives the total negative.
pub fn compute_totals(line_totals: &[Decimal], discount: Decimal) -> OrderTotals {
    let subtotal: Decimal = line_totals.iter().copied().sum();
    let tax = subtotal * TAX_RATE;
    OrderTotals {
        subtotal,
        tax,
        total: subtotal + tax - discount,
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderLineRequest {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: Uuid,
    pub table_number: Option<i32>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    #[validate]
    pub lines: Vec<CreateOrderLineRequest>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderRequest {
    pub table_number: Option<i32>,
    pub notes: Option<String>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderLineRequest {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: Option<i32>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

/// Order payload with its lines embedded.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: OrderModel,
    pub lines: Vec<OrderLineModel>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderStatistics {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub pending_orders: u64,
    pub preparing_orders: u64,
}

/// Service for orders and their lines. Order creation is the single place
/// where stock deduction and loyalty accrual fire, both inside the same
/// transaction as the inserts.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    inventory: Arc<InventoryService>,
    customers: Arc<CustomerService>,
}

impl OrderService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: EventSender,
        inventory: Arc<InventoryService>,
        customers: Arc<CustomerService>,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
            customers,
        }
    }

    #[instrument(skip(self, request), fields(customer_id = %request.customer_id, lines = request.lines.len()))]
    pub async fn create_order(
        &self,
        request: CreateOrderRequest,
    ) -> Result<OrderDetail, ServiceError> {
        request.validate()?;
        if let Some(table_number) = request.table_number {
            if table_number < 1 {
                return Err(ServiceError::ValidationError(
                    "Table number must be at least 1".into(),
                ));
            }
        }

        let txn = self.db_pool.begin().await?;

        crate::entities::customer::Entity::find_by_id(request.customer_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Customer {} not found", request.customer_id))
            })?;

        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let status = OrderStatus::Pending;

        OrderActiveModel {
            id: Set(order_id),
            customer_id: Set(request.customer_id),
            status: Set(status),
            table_number: Set(request.table_number),
            notes: Set(request.notes),
            subtotal: Set(Decimal::ZERO),
            tax: Set(Decimal::ZERO),
            discount: Set(request.discount),
            total: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut lines = Vec::with_capacity(request.lines.len());
        let mut deductions: Vec<StockDeduction> = Vec::new();
        for line in &request.lines {
            let (inserted, line_deductions) = self
                .insert_line(&txn, order_id, status, line)
                .await?;
            lines.push(inserted);
            deductions.extend(line_deductions);
        }

        let order = self
            .recompute_totals(&txn, order_id, request.discount)
            .await?;

        // Accrual happens exactly once, here, against the total at creation.
        let promoted = self
            .customers
            .accrue_for_order(&txn, request.customer_id, order.total)
            .await?;

        txn.commit().await?;

        self.event_sender.send(Event::OrderCreated(order_id)).await.ok();
        for d in deductions {
            self.event_sender
                .send(Event::StockDeducted {
                    ingredient_id: d.ingredient_id,
                    quantity: d.consumed,
                    order_id,
                })
                .await
                .ok();
        }
        if promoted {
            self.event_sender
                .send(Event::CustomerPromotedToVip(request.customer_id))
                .await
                .ok();
        }

        info!(order_id = %order_id, total = %order.total, "Order created");
        Ok(OrderDetail { order, lines })
    }

    async fn insert_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        order_status: OrderStatus,
        request: &CreateOrderLineRequest,
    ) -> Result<(OrderLineModel, Vec<StockDeduction>), ServiceError> {
        let item = MenuItemEntity::find_by_id(request.menu_item_id)
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Menu item {} not found", request.menu_item_id))
            })?;
        if request.quantity < 1 {
            return Err(ServiceError::ValidationError(
                "Quantity must be at least 1".into(),
            ));
        }

        let unit_price = item.price;
        let total_price = unit_price * Decimal::from(request.quantity);
        let inserted = OrderLineActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            menu_item_id: Set(item.id),
            quantity: Set(request.quantity),
            unit_price: Set(unit_price),
            total_price: Set(total_price),
            special_instructions: Set(request.special_instructions.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;

        let deductions = if order_status.consumes_stock() {
            self.inventory
                .deduct_for_order_line(conn, item.id, &item.name, request.quantity, order_id)
                .await?
        } else {
            Vec::new()
        };
        Ok((inserted, deductions))
    }

    async fn recompute_totals<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        discount: Decimal,
    ) -> Result<OrderModel, ServiceError> {
        let line_totals: Vec<Decimal> = OrderLineEntity::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|l| l.total_price)
            .collect();
        let totals = compute_totals(&line_totals, discount);

        let existing = OrderEntity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let mut active: OrderActiveModel = existing.into();
        active.subtotal = Set(totals.subtotal);
        active.tax = Set(totals.tax);
        active.discount = Set(discount);
        active.total = Set(totals.total);
        active.updated_at = Set(Utc::now());
        Ok(active.update(conn).await?)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<OrderDetail, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        self.order_detail(order).await
    }

    pub async fn list_orders(
        &self,
        page: u64,
        limit: u64,
        status: Option<OrderStatus>,
        customer_id: Option<Uuid>,
    ) -> Result<(Vec<OrderModel>, u64), ServiceError> {
        let mut query = OrderEntity::find().order_by_desc(order::Column::CreatedAt);
        if let Some(status) = status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(customer_id) = customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Updates notes, table number, or discount. A discount change
    /// recomputes the money fields from the stored lines.
    #[instrument(skip(self, request))]
    pub async fn update_order(
        &self,
        id: Uuid,
        request: UpdateOrderRequest,
    ) -> Result<OrderModel, ServiceError> {
        if let Some(table_number) = request.table_number {
            if table_number < 1 {
                return Err(ServiceError::ValidationError(
                    "Table number must be at least 1".into(),
                ));
            }
        }

        let txn = self.db_pool.begin().await?;
        let existing = OrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let discount = request.discount.unwrap_or(existing.discount);
        let mut active: OrderActiveModel = existing.into();
        if request.table_number.is_some() {
            active.table_number = Set(request.table_number);
        }
        if let Some(notes) = request.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        let order = self.recompute_totals(&txn, id, discount).await?;
        txn.commit().await?;
        Ok(order)
    }

    /// Moves the order to a new status. Closed orders are frozen. A
    /// cancellation does not restore stock consumed by the order's lines;
    /// the ledger keeps the USED entries as written.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: OrderStatus,
    ) -> Result<OrderModel, ServiceError> {
        let existing = OrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let old_status = existing.status;
        if old_status == new_status {
            return Ok(existing);
        }
        if old_status.is_closed() {
            return Err(ServiceError::InvalidStatus(format!(
                "Order is already {} and cannot change status",
                old_status
            )));
        }

        let mut active: OrderActiveModel = existing.into();
        active.status = Set(new_status);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;

        self.event_sender
            .send(Event::OrderStatusChanged {
                order_id: id,
                old_status: old_status.to_string(),
                new_status: new_status.to_string(),
            })
            .await
            .ok();
        info!(from = %old_status, to = %new_status, "Order status changed");
        Ok(updated)
    }

    /// Adds a line to an open order, deducting stock when the order is
    /// still PENDING or PREPARING, and recomputes totals. Loyalty points
    /// are not re-accrued here.
    #[instrument(skip(self, request), fields(order_id = %id))]
    pub async fn add_line(
        &self,
        id: Uuid,
        request: CreateOrderLineRequest,
    ) -> Result<OrderDetail, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let order = OrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        if order.status.is_closed() {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot add items to a {} order",
                order.status
            )));
        }

        let (_, deductions) = self.insert_line(&txn, id, order.status, &request).await?;
        let updated = self.recompute_totals(&txn, id, order.discount).await?;
        txn.commit().await?;

        for d in deductions {
            self.event_sender
                .send(Event::StockDeducted {
                    ingredient_id: d.ingredient_id,
                    quantity: d.consumed,
                    order_id: id,
                })
                .await
                .ok();
        }

        self.order_detail(updated).await
    }

    /// Changes a line's quantity or instructions and recomputes totals.
    /// Stock is never adjusted here; only line creation touches the ledger.
    #[instrument(skip(self, request), fields(order_id = %order_id, line_id = %line_id))]
    pub async fn update_line(
        &self,
        order_id: Uuid,
        line_id: Uuid,
        request: UpdateOrderLineRequest,
    ) -> Result<OrderDetail, ServiceError> {
        request.validate()?;

        let txn = self.db_pool.begin().await?;
        let order = self.find_open_order(&txn, order_id).await?;
        let line = self.find_line(&txn, order_id, line_id).await?;

        let unit_price = line.unit_price;
        let mut active: OrderLineActiveModel = line.into();
        if let Some(quantity) = request.quantity {
            active.quantity = Set(quantity);
            active.total_price = Set(unit_price * Decimal::from(quantity));
        }
        if let Some(special_instructions) = request.special_instructions {
            active.special_instructions = Set(special_instructions);
        }
        active.update(&txn).await?;

        let updated = self.recompute_totals(&txn, order_id, order.discount).await?;
        txn.commit().await?;
        self.order_detail(updated).await
    }

    /// Removes a line and recomputes totals. Stock already consumed by the
    /// line stays consumed; the ledger keeps its USED entry.
    #[instrument(skip(self), fields(order_id = %order_id, line_id = %line_id))]
    pub async fn remove_line(
        &self,
        order_id: Uuid,
        line_id: Uuid,
    ) -> Result<OrderDetail, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let order = self.find_open_order(&txn, order_id).await?;
        let line = self.find_line(&txn, order_id, line_id).await?;

        OrderLineEntity::delete_by_id(line.id).exec(&txn).await?;
        let updated = self.recompute_totals(&txn, order_id, order.discount).await?;
        txn.commit().await?;
        self.order_detail(updated).await
    }

    async fn find_open_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: Uuid,
    ) -> Result<OrderModel, ServiceError> {
        let order = OrderEntity::find_by_id(id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        if order.status.is_closed() {
            return Err(ServiceError::InvalidStatus(format!(
                "Cannot change items on a {} order",
                order.status
            )));
        }
        Ok(order)
    }

    async fn find_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        line_id: Uuid,
    ) -> Result<OrderLineModel, ServiceError> {
        OrderLineEntity::find_by_id(line_id)
            .filter(order_line::Column::OrderId.eq(order_id))
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Order line {} not found on order {}", line_id, order_id))
            })
    }

    async fn order_detail(&self, order: OrderModel) -> Result<OrderDetail, ServiceError> {
        let lines = OrderLineEntity::find()
            .filter(order_line::Column::OrderId.eq(order.id))
            .order_by_asc(order_line::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(OrderDetail { order, lines })
    }

    /// Deletes the order and its lines. Stock consumed by the order stays
    /// consumed.
    #[instrument(skip(self))]
    pub async fn delete_order(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = OrderEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        OrderEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(order_id = %id, "Order deleted");
        Ok(())
    }

    pub async fn statistics(&self) -> Result<OrderStatistics, ServiceError> {
        let db = &*self.db_pool;
        let total_orders = OrderEntity::find().count(db).await?;
        let pending_orders = OrderEntity::find()
            .filter(order::Column::Status.eq(OrderStatus::Pending))
            .count(db)
            .await?;
        let preparing_orders = OrderEntity::find()
            .filter(order::Column::Status.eq(OrderStatus::Preparing))
            .count(db)
            .await?;

        // Revenue counts completed orders only.
        let total_revenue: Option<Decimal> = OrderEntity::find()
            .select_only()
            .column_as(order::Column::Total.sum(), "revenue")
            .filter(order::Column::Status.eq(OrderStatus::Completed))
            .into_tuple()
            .one(db)
            .await?
            .flatten();

        Ok(OrderStatistics {
            total_orders,
            total_revenue: total_revenue.unwrap_or(Decimal::ZERO),
            pending_orders,
            preparing_orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn totals_are_exact_decimal_arithmetic() {
        let totals = compute_totals(&[dec!(450.00), dec!(200.50)], dec!(0));
        assert_eq!(totals.subtotal, dec!(650.50));
        assert_eq!(totals.tax, dec!(65.0500));
        assert_eq!(totals.total, dec!(715.5500));
    }

    #[test]
    fn totals_are_idempotent() {
        let lines = [dec!(12.34), dec!(56.78)];
        let first = compute_totals(&lines, dec!(5));
        let second = compute_totals(&lines, dec!(5));
        assert_eq!(first, second);
    }

    #[test]
    fn discount_passes_through_unvalidated() {
        let totals = compute_totals(&[dec!(10)], dec!(50));
        assert_eq!(totals.total, dec!(-39.00));
    }

    #[test]
    fn empty_order_totals_are_zero() {
        let totals = compute_totals(&[], dec!(0));
        assert_eq!(totals.subtotal, Decimal::ZERO);
        assert_eq!(totals.tax, Decimal::ZERO);
        assert_eq!(totals.total, Decimal::ZERO);
    }
}
