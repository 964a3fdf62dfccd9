use crate::{
    db::DbPool,
    entities::ingredient::{
        self, ActiveModel as IngredientActiveModel, Entity as IngredientEntity,
        Model as IngredientModel, StockUnit,
    },
    entities::recipe_line::{
        self, ActiveModel as RecipeLineActiveModel, Entity as RecipeLineEntity,
        Model as RecipeLineModel,
    },
    entities::stock_transaction::{
        self, ActiveModel as StockTransactionActiveModel, Entity as StockTransactionEntity,
        Model as StockTransactionModel, TransactionType,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Low-stock predicate. An ingredient with either figure missing is never
/// reported low.
pub fn low_stock(current: Option<Decimal>, minimum: Option<Decimal>) -> bool {
    match (current, minimum) {
        (Some(current), Some(minimum)) => current <= minimum,
        _ => false,
    }
}

/// Display form of the low-stock predicate used on ingredient payloads.
pub fn stock_status(current: Option<Decimal>, minimum: Option<Decimal>) -> &'static str {
    if low_stock(current, minimum) {
        "LOW"
    } else {
        "OK"
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateIngredientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    pub unit: StockUnit,
    #[serde(default)]
    pub current_stock: Decimal,
    #[serde(default)]
    pub minimum_stock: Decimal,
    #[serde(default)]
    pub cost_per_unit: Decimal,
    #[serde(default)]
    pub supplier: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateIngredientRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub unit: Option<StockUnit>,
    pub minimum_stock: Option<Decimal>,
    pub cost_per_unit: Option<Decimal>,
    pub supplier: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RestockRequest {
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateStockTransactionRequest {
    pub ingredient_id: Uuid,
    pub transaction_type: TransactionType,
    pub quantity: Decimal,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateRecipeLineRequest {
    pub menu_item_id: Uuid,
    pub ingredient_id: Uuid,
    pub quantity_required: Decimal,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateRecipeLineRequest {
    pub quantity_required: Decimal,
}

/// Ingredient payload with the derived stock status alongside the raw
/// figures.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    #[serde(flatten)]
    pub ingredient: IngredientModel,
    pub is_low_stock: bool,
    pub stock_status: String,
}

impl From<IngredientModel> for IngredientResponse {
    fn from(ingredient: IngredientModel) -> Self {
        let is_low = ingredient.is_low_stock();
        Self {
            is_low_stock: is_low,
            stock_status: stock_status(
                Some(ingredient.current_stock),
                Some(ingredient.minimum_stock),
            )
            .to_string(),
            ingredient,
        }
    }
}

/// A stock movement applied by order-line deduction, reported back to the
/// caller so it can emit events after its transaction commits.
#[derive(Debug, Clone)]
pub struct StockDeduction {
    pub ingredient_id: Uuid,
    pub consumed: Decimal,
}

/// Service for ingredients, recipe lines, and the append-only stock ledger.
#[derive(Clone)]
pub struct InventoryService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_ingredient(
        &self,
        request: CreateIngredientRequest,
    ) -> Result<IngredientModel, ServiceError> {
        request.validate()?;
        if request.current_stock < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "current_stock must not be negative".into(),
            ));
        }

        let existing = IngredientEntity::find()
            .filter(ingredient::Column::Name.eq(request.name.clone()))
            .one(&*self.db_pool)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Ingredient '{}' already exists",
                request.name
            )));
        }

        let now = Utc::now();
        let model = IngredientActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            unit: Set(request.unit),
            current_stock: Set(request.current_stock),
            minimum_stock: Set(request.minimum_stock),
            cost_per_unit: Set(request.cost_per_unit),
            supplier: Set(request.supplier),
            last_restocked: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(ingredient_id = %model.id, "Ingredient created");
        Ok(model)
    }

    pub async fn get_ingredient(&self, id: Uuid) -> Result<IngredientModel, ServiceError> {
        IngredientEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Ingredient {} not found", id)))
    }

    pub async fn list_ingredients(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<IngredientModel>, u64), ServiceError> {
        let mut query = IngredientEntity::find().order_by_asc(ingredient::Column::Name);
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(ingredient::Column::Name.contains(&term));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Ingredients at or below their configured minimum.
    pub async fn list_low_stock(&self) -> Result<Vec<IngredientModel>, ServiceError> {
        let all = IngredientEntity::find()
            .order_by_asc(ingredient::Column::Name)
            .all(&*self.db_pool)
            .await?;
        Ok(all.into_iter().filter(|i| i.is_low_stock()).collect())
    }

    #[instrument(skip(self, request))]
    pub async fn update_ingredient(
        &self,
        id: Uuid,
        request: UpdateIngredientRequest,
    ) -> Result<IngredientModel, ServiceError> {
        request.validate()?;
        let existing = self.get_ingredient(id).await?;

        let mut active: IngredientActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(unit) = request.unit {
            active.unit = Set(unit);
        }
        if let Some(minimum) = request.minimum_stock {
            active.minimum_stock = Set(minimum);
        }
        if let Some(cost) = request.cost_per_unit {
            active.cost_per_unit = Set(cost);
        }
        if let Some(supplier) = request.supplier {
            active.supplier = Set(supplier);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_ingredient(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_ingredient(id).await?;
        IngredientEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(ingredient_id = %id, "Ingredient deleted");
        Ok(())
    }

    /// Records a PURCHASE for the given quantity, bumping the cached stock
    /// and `last_restocked`.
    #[instrument(skip(self, request), fields(ingredient_id = %id))]
    pub async fn restock(
        &self,
        id: Uuid,
        request: RestockRequest,
    ) -> Result<IngredientModel, ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Restock quantity must be positive".into(),
            ));
        }
        let ingredient = self
            .create_transaction(CreateStockTransactionRequest {
                ingredient_id: id,
                transaction_type: TransactionType::Purchase,
                quantity: request.quantity,
                notes: request.notes,
                created_by: None,
            })
            .await?
            .1;

        self.event_sender
            .send(Event::StockRestocked {
                ingredient_id: id,
                quantity: request.quantity,
            })
            .await
            .ok();
        Ok(ingredient)
    }

    /// Appends a ledger entry and applies it to the cached stock inside one
    /// transaction. PURCHASE and ADJUSTMENT add the magnitude, USED and
    /// WASTE subtract it; PURCHASE also bumps `last_restocked`.
    #[instrument(skip(self, request), fields(ingredient_id = %request.ingredient_id, transaction_type = %request.transaction_type))]
    pub async fn create_transaction(
        &self,
        request: CreateStockTransactionRequest,
    ) -> Result<(StockTransactionModel, IngredientModel), ServiceError> {
        if request.quantity <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Transaction quantity must be positive".into(),
            ));
        }

        let txn = self.db_pool.begin().await?;

        let ingredient = IngredientEntity::find_by_id(request.ingredient_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", request.ingredient_id))
            })?;

        let magnitude = request.quantity.abs();
        let signed = match request.transaction_type {
            TransactionType::Purchase | TransactionType::Adjustment => magnitude,
            TransactionType::Used | TransactionType::Waste => -magnitude,
        };

        let now = Utc::now();
        let entry = StockTransactionActiveModel {
            id: Set(Uuid::new_v4()),
            ingredient_id: Set(ingredient.id),
            transaction_type: Set(request.transaction_type),
            quantity: Set(signed),
            notes: Set(request.notes),
            created_by: Set(request.created_by.unwrap_or_else(|| "admin".to_string())),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let new_level = ingredient.current_stock + signed;
        if new_level < Decimal::ZERO {
            warn!(ingredient_id = %ingredient.id, level = %new_level, "Stock went negative");
        }

        let mut active: IngredientActiveModel = ingredient.into();
        active.current_stock = Set(new_level);
        if entry.transaction_type == TransactionType::Purchase {
            active.last_restocked = Set(Some(now));
        }
        active.updated_at = Set(now);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        info!(transaction_id = %entry.id, level = %new_level, "Stock transaction applied");
        Ok((entry, updated))
    }

    pub async fn get_transaction(&self, id: Uuid) -> Result<StockTransactionModel, ServiceError> {
        StockTransactionEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Stock transaction {} not found", id)))
    }

    pub async fn list_transactions(
        &self,
        page: u64,
        limit: u64,
        ingredient_id: Option<Uuid>,
        transaction_type: Option<TransactionType>,
    ) -> Result<(Vec<StockTransactionModel>, u64), ServiceError> {
        let mut query = StockTransactionEntity::find()
            .order_by_desc(stock_transaction::Column::CreatedAt);
        if let Some(ingredient_id) = ingredient_id {
            query = query.filter(stock_transaction::Column::IngredientId.eq(ingredient_id));
        }
        if let Some(transaction_type) = transaction_type {
            query = query.filter(stock_transaction::Column::TransactionType.eq(transaction_type));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, request), fields(menu_item_id = %request.menu_item_id, ingredient_id = %request.ingredient_id))]
    pub async fn create_recipe_line(
        &self,
        request: CreateRecipeLineRequest,
    ) -> Result<RecipeLineModel, ServiceError> {
        if request.quantity_required < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity_required must not be negative".into(),
            ));
        }

        // Surface the duplicate as a 409 instead of a DB unique violation.
        let duplicate = RecipeLineEntity::find()
            .filter(recipe_line::Column::MenuItemId.eq(request.menu_item_id))
            .filter(recipe_line::Column::IngredientId.eq(request.ingredient_id))
            .one(&*self.db_pool)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(
                "Recipe line for this menu item and ingredient already exists".into(),
            ));
        }

        IngredientEntity::find_by_id(request.ingredient_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Ingredient {} not found", request.ingredient_id))
            })?;
        crate::entities::menu_item::Entity::find_by_id(request.menu_item_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Menu item {} not found", request.menu_item_id))
            })?;

        let model = RecipeLineActiveModel {
            id: Set(Uuid::new_v4()),
            menu_item_id: Set(request.menu_item_id),
            ingredient_id: Set(request.ingredient_id),
            quantity_required: Set(request.quantity_required),
        }
        .insert(&*self.db_pool)
        .await?;
        Ok(model)
    }

    pub async fn get_recipe_line(&self, id: Uuid) -> Result<RecipeLineModel, ServiceError> {
        RecipeLineEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Recipe line {} not found", id)))
    }

    pub async fn list_recipe_lines(
        &self,
        menu_item_id: Option<Uuid>,
        ingredient_id: Option<Uuid>,
    ) -> Result<Vec<RecipeLineModel>, ServiceError> {
        let mut query = RecipeLineEntity::find();
        if let Some(menu_item_id) = menu_item_id {
            query = query.filter(recipe_line::Column::MenuItemId.eq(menu_item_id));
        }
        if let Some(ingredient_id) = ingredient_id {
            query = query.filter(recipe_line::Column::IngredientId.eq(ingredient_id));
        }
        Ok(query.all(&*self.db_pool).await?)
    }

    #[instrument(skip(self, request))]
    pub async fn update_recipe_line(
        &self,
        id: Uuid,
        request: UpdateRecipeLineRequest,
    ) -> Result<RecipeLineModel, ServiceError> {
        if request.quantity_required < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "quantity_required must not be negative".into(),
            ));
        }
        let existing = self.get_recipe_line(id).await?;
        let mut active: RecipeLineActiveModel = existing.into();
        active.quantity_required = Set(request.quantity_required);
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_recipe_line(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_recipe_line(id).await?;
        RecipeLineEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        Ok(())
    }

    /// Deducts stock for one newly created order line, inside the caller's
    /// transaction. For each recipe line of the menu item the consumed
    /// amount is `quantity_required * quantity`: the cached stock is
    /// decremented and a single USED ledger entry of `-consumed` is
    /// appended. The caller emits events after its transaction commits.
    pub async fn deduct_for_order_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        menu_item_id: Uuid,
        menu_item_name: &str,
        quantity: i32,
        order_id: Uuid,
    ) -> Result<Vec<StockDeduction>, ServiceError> {
        let recipe = RecipeLineEntity::find()
            .filter(recipe_line::Column::MenuItemId.eq(menu_item_id))
            .all(conn)
            .await?;

        let mut deductions = Vec::with_capacity(recipe.len());
        let now = Utc::now();
        for line in recipe {
            let consumed = line.quantity_required * Decimal::from(quantity);
            if consumed == Decimal::ZERO {
                continue;
            }

            let ingredient = IngredientEntity::find_by_id(line.ingredient_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Ingredient {} not found", line.ingredient_id))
                })?;

            StockTransactionActiveModel {
                id: Set(Uuid::new_v4()),
                ingredient_id: Set(ingredient.id),
                transaction_type: Set(TransactionType::Used),
                quantity: Set(-consumed),
                notes: Set(format!(
                    "Used for order {}: {} x{}",
                    order_id, menu_item_name, quantity
                )),
                created_by: Set("system".to_string()),
                created_at: Set(now),
            }
            .insert(conn)
            .await?;

            let new_level = ingredient.current_stock - consumed;
            let ingredient_id = ingredient.id;
            let mut active: IngredientActiveModel = ingredient.into();
            active.current_stock = Set(new_level);
            active.updated_at = Set(now);
            active.update(conn).await?;

            deductions.push(StockDeduction {
                ingredient_id,
                consumed,
            });
        }
        Ok(deductions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn low_stock_at_and_below_minimum() {
        assert!(low_stock(Some(dec!(5)), Some(dec!(5))));
        assert!(low_stock(Some(dec!(4.99)), Some(dec!(5))));
        assert!(!low_stock(Some(dec!(5.01)), Some(dec!(5))));
    }

    #[test]
    fn low_stock_requires_both_figures() {
        assert!(!low_stock(None, Some(dec!(5))));
        assert!(!low_stock(Some(dec!(0)), None));
        assert!(!low_stock(None, None));
    }

    #[test]
    fn stock_status_labels() {
        assert_eq!(stock_status(Some(dec!(1)), Some(dec!(5))), "LOW");
        assert_eq!(stock_status(Some(dec!(10)), Some(dec!(5))), "OK");
        assert_eq!(stock_status(None, Some(dec!(5))), "OK");
    }
}
