use crate::{
    db::DbPool,
    entities::customer::{
        self, ActiveModel as CustomerActiveModel, Entity as CustomerEntity, Model as CustomerModel,
    },
    entities::order::{self, Entity as OrderEntity, Model as OrderModel, OrderStatus},
    entities::reservation::{self, Entity as ReservationEntity, Model as ReservationModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Points threshold at which a customer becomes VIP. The flag is one-way.
pub const VIP_THRESHOLD: i32 = 100;

/// Points earned per order: one point per whole 100 of the order total.
/// Negative totals (a discount larger than the order) earn nothing.
pub fn points_for_total(total: Decimal) -> i32 {
    if total <= Decimal::ZERO {
        return 0;
    }
    (total / Decimal::from(100))
        .floor()
        .to_i32()
        .unwrap_or(i32::MAX)
}

/// Applies an accrual to a running points balance, returning the new
/// balance and whether the VIP promotion fires.
pub fn accrue(points: i32, earned: i32, is_vip: bool) -> (i32, bool) {
    let new_points = points.saturating_add(earned);
    let promote = !is_vip && new_points >= VIP_THRESHOLD;
    (new_points, promote)
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom = "customer::validate_phone")]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(custom = "validate_optional_phone")]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub notes: Option<String>,
}

fn validate_optional_phone(phone: &str) -> Result<(), validator::ValidationError> {
    customer::validate_phone(phone)
}

/// Customer record with its derived order analytics.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerResponse {
    #[serde(flatten)]
    pub customer: CustomerModel,
    /// Lifetime order count, regardless of status.
    pub total_orders: u64,
    /// Sum of `total` over the customer's COMPLETED orders.
    pub total_spent: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddLoyaltyPointsRequest {
    #[validate(range(min = 1, message = "Points must be positive"))]
    pub points: i32,
}

/// Service for customer records and the loyalty programme.
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_customer(
        &self,
        request: CreateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request.validate()?;

        let clash = CustomerEntity::find()
            .filter(
                customer::Column::Email
                    .eq(request.email.clone())
                    .or(customer::Column::Phone.eq(request.phone.clone())),
            )
            .one(&*self.db_pool)
            .await?;
        if clash.is_some() {
            return Err(ServiceError::Conflict(
                "A customer with this email or phone already exists".into(),
            ));
        }

        let now = Utc::now();
        let model = CustomerActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            email: Set(request.email),
            phone: Set(request.phone),
            address: Set(request.address),
            date_of_birth: Set(request.date_of_birth),
            loyalty_points: Set(0),
            is_vip: Set(false),
            notes: Set(request.notes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(customer_id = %model.id, "Customer created");
        Ok(model)
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<CustomerModel, ServiceError> {
        CustomerEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", id)))
    }

    /// Customer plus lifetime order count and completed-order spend.
    pub async fn get_customer_detail(&self, id: Uuid) -> Result<CustomerResponse, ServiceError> {
        let customer = self.get_customer(id).await?;

        let db = &*self.db_pool;
        let total_orders = OrderEntity::find()
            .filter(order::Column::CustomerId.eq(id))
            .count(db)
            .await?;
        let total_spent: Option<Decimal> = OrderEntity::find()
            .select_only()
            .column_as(order::Column::Total.sum(), "spent")
            .filter(order::Column::CustomerId.eq(id))
            .filter(order::Column::Status.eq(OrderStatus::Completed))
            .into_tuple()
            .one(db)
            .await?
            .flatten();

        Ok(CustomerResponse {
            customer,
            total_orders,
            total_spent: total_spent.unwrap_or(Decimal::ZERO),
        })
    }

    pub async fn list_customers(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<CustomerModel>, u64), ServiceError> {
        let mut query = CustomerEntity::find().order_by_asc(customer::Column::Name);
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(
                customer::Column::Name
                    .contains(&term)
                    .or(customer::Column::Email.contains(&term))
                    .or(customer::Column::Phone.contains(&term)),
            );
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn list_vip_customers(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        Ok(CustomerEntity::find()
            .filter(customer::Column::IsVip.eq(true))
            .order_by_desc(customer::Column::LoyaltyPoints)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_customer(
        &self,
        id: Uuid,
        request: UpdateCustomerRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request.validate()?;
        let existing = self.get_customer(id).await?;

        let mut active: CustomerActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(email) = request.email {
            active.email = Set(email);
        }
        if let Some(phone) = request.phone {
            active.phone = Set(phone);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }
        if let Some(dob) = request.date_of_birth {
            active.date_of_birth = Set(Some(dob));
        }
        if let Some(notes) = request.notes {
            active.notes = Set(notes);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_customer(id).await?;
        CustomerEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    pub async fn list_customer_orders(&self, id: Uuid) -> Result<Vec<OrderModel>, ServiceError> {
        self.get_customer(id).await?;
        Ok(OrderEntity::find()
            .filter(order::Column::CustomerId.eq(id))
            .order_by_desc(order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn list_customer_reservations(
        &self,
        id: Uuid,
    ) -> Result<Vec<ReservationModel>, ServiceError> {
        self.get_customer(id).await?;
        Ok(ReservationEntity::find()
            .filter(reservation::Column::CustomerId.eq(id))
            .order_by_desc(reservation::Column::ReservationDate)
            .all(&*self.db_pool)
            .await?)
    }

    /// Manual points grant, applying the same VIP promotion rule as order
    /// accrual.
    #[instrument(skip(self, request), fields(customer_id = %id))]
    pub async fn add_loyalty_points(
        &self,
        id: Uuid,
        request: AddLoyaltyPointsRequest,
    ) -> Result<CustomerModel, ServiceError> {
        request.validate()?;
        let existing = self.get_customer(id).await?;

        let (new_points, promote) = accrue(existing.loyalty_points, request.points, existing.is_vip);
        let mut active: CustomerActiveModel = existing.into();
        active.loyalty_points = Set(new_points);
        if promote {
            active.is_vip = Set(true);
        }
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db_pool).await?;

        if promote {
            self.event_sender
                .send(Event::CustomerPromotedToVip(id))
                .await
                .ok();
        }
        Ok(updated)
    }

    /// Order-creation accrual, run inside the caller's transaction. Returns
    /// whether the VIP promotion fired so the caller can emit the event
    /// after commit.
    pub async fn accrue_for_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        customer_id: Uuid,
        order_total: Decimal,
    ) -> Result<bool, ServiceError> {
        let earned = points_for_total(order_total);
        if earned == 0 {
            return Ok(false);
        }

        let existing = CustomerEntity::find_by_id(customer_id)
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Customer {} not found", customer_id)))?;

        let (new_points, promote) = accrue(existing.loyalty_points, earned, existing.is_vip);
        let mut active: CustomerActiveModel = existing.into();
        active.loyalty_points = Set(new_points);
        if promote {
            active.is_vip = Set(true);
        }
        active.updated_at = Set(Utc::now());
        active.update(conn).await?;
        Ok(promote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn one_point_per_hundred() {
        assert_eq!(points_for_total(dec!(0)), 0);
        assert_eq!(points_for_total(dec!(99.99)), 0);
        assert_eq!(points_for_total(dec!(100)), 1);
        assert_eq!(points_for_total(dec!(650.50)), 6);
    }

    #[test]
    fn negative_total_earns_nothing() {
        assert_eq!(points_for_total(dec!(-50)), 0);
    }

    #[test]
    fn promotion_fires_exactly_at_threshold() {
        let (points, promote) = accrue(95, 6, false);
        assert_eq!(points, 101);
        assert!(promote);

        let (points, promote) = accrue(95, 4, false);
        assert_eq!(points, 99);
        assert!(!promote);
    }

    #[test]
    fn promotion_is_one_way() {
        // Already-VIP customers never re-trigger the promotion.
        let (_, promote) = accrue(500, 10, true);
        assert!(!promote);
    }
}
