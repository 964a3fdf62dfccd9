use crate::{
    db::DbPool,
    entities::category::{
        self, ActiveModel as CategoryActiveModel, Entity as CategoryEntity, Model as CategoryModel,
    },
    entities::menu_item::{
        self, ActiveModel as MenuItemActiveModel, Entity as MenuItemEntity, Model as MenuItemModel,
    },
    entities::recipe_line::{self, Entity as RecipeLineEntity, Model as RecipeLineModel},
    errors::ServiceError,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMenuItemRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category_id: Uuid,
    pub price: Decimal,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_vegetarian: bool,
    #[serde(default)]
    pub is_vegan: bool,
    #[serde(default = "default_prep_time")]
    pub preparation_time_minutes: i32,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateMenuItemRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub price: Option<Decimal>,
    pub is_available: Option<bool>,
    pub is_vegetarian: Option<bool>,
    pub is_vegan: Option<bool>,
    pub preparation_time_minutes: Option<i32>,
}

/// Menu item detail with its recipe lines embedded.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MenuItemDetail {
    #[serde(flatten)]
    pub item: MenuItemModel,
    pub recipe_lines: Vec<RecipeLineModel>,
}

fn default_true() -> bool {
    true
}
fn default_prep_time() -> i32 {
    15
}

/// Service for menu categories and items.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<CategoryModel, ServiceError> {
        request.validate()?;

        let existing = CategoryEntity::find()
            .filter(category::Column::Name.eq(request.name.clone()))
            .one(&*self.db_pool)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                request.name
            )));
        }

        let now = Utc::now();
        let model = CategoryActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            is_active: Set(request.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(category_id = %model.id, "Category created");
        Ok(model)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<CategoryModel, ServiceError> {
        CategoryEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn list_categories(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<CategoryModel>, u64), ServiceError> {
        let paginator = CategoryEntity::find()
            .order_by_asc(category::Column::Name)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> Result<CategoryModel, ServiceError> {
        request.validate()?;
        let existing = self.get_category(id).await?;

        let mut active: CategoryActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_category(id).await?;
        CategoryEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Available items in one category, for menu display.
    pub async fn list_category_items(
        &self,
        category_id: Uuid,
    ) -> Result<Vec<MenuItemModel>, ServiceError> {
        self.get_category(category_id).await?;
        Ok(MenuItemEntity::find()
            .filter(menu_item::Column::CategoryId.eq(category_id))
            .filter(menu_item::Column::IsAvailable.eq(true))
            .order_by_asc(menu_item::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, request), fields(name = %request.name))]
    pub async fn create_menu_item(
        &self,
        request: CreateMenuItemRequest,
    ) -> Result<MenuItemModel, ServiceError> {
        request.validate()?;
        if request.price <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Price must be positive".into(),
            ));
        }
        if request.preparation_time_minutes < 1 {
            return Err(ServiceError::ValidationError(
                "Preparation time must be at least one minute".into(),
            ));
        }
        self.get_category(request.category_id).await?;

        let now = Utc::now();
        let model = MenuItemActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(request.name),
            description: Set(request.description),
            category_id: Set(request.category_id),
            price: Set(request.price),
            is_available: Set(request.is_available),
            is_vegetarian: Set(request.is_vegetarian),
            is_vegan: Set(request.is_vegan),
            preparation_time_minutes: Set(request.preparation_time_minutes),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        info!(menu_item_id = %model.id, "Menu item created");
        Ok(model)
    }

    pub async fn get_menu_item(&self, id: Uuid) -> Result<MenuItemModel, ServiceError> {
        MenuItemEntity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Menu item {} not found", id)))
    }

    pub async fn get_menu_item_detail(&self, id: Uuid) -> Result<MenuItemDetail, ServiceError> {
        let item = self.get_menu_item(id).await?;
        let recipe_lines = RecipeLineEntity::find()
            .filter(recipe_line::Column::MenuItemId.eq(id))
            .all(&*self.db_pool)
            .await?;
        Ok(MenuItemDetail { item, recipe_lines })
    }

    pub async fn list_menu_items(
        &self,
        page: u64,
        limit: u64,
        category_id: Option<Uuid>,
        available_only: bool,
        search: Option<String>,
    ) -> Result<(Vec<MenuItemModel>, u64), ServiceError> {
        let mut query = MenuItemEntity::find().order_by_asc(menu_item::Column::Name);
        if let Some(category_id) = category_id {
            query = query.filter(menu_item::Column::CategoryId.eq(category_id));
        }
        if available_only {
            query = query.filter(menu_item::Column::IsAvailable.eq(true));
        }
        if let Some(term) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(menu_item::Column::Name.contains(&term));
        }
        let paginator = query.paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self, request))]
    pub async fn update_menu_item(
        &self,
        id: Uuid,
        request: UpdateMenuItemRequest,
    ) -> Result<MenuItemModel, ServiceError> {
        request.validate()?;
        if let Some(price) = request.price {
            if price <= Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Price must be positive".into(),
                ));
            }
        }
        if let Some(mins) = request.preparation_time_minutes {
            if mins < 1 {
                return Err(ServiceError::ValidationError(
                    "Preparation time must be at least one minute".into(),
                ));
            }
        }
        if let Some(category_id) = request.category_id {
            self.get_category(category_id).await?;
        }
        let existing = self.get_menu_item(id).await?;

        let mut active: MenuItemActiveModel = existing.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(category_id) = request.category_id {
            active.category_id = Set(category_id);
        }
        if let Some(price) = request.price {
            active.price = Set(price);
        }
        if let Some(is_available) = request.is_available {
            active.is_available = Set(is_available);
        }
        if let Some(is_vegetarian) = request.is_vegetarian {
            active.is_vegetarian = Set(is_vegetarian);
        }
        if let Some(is_vegan) = request.is_vegan {
            active.is_vegan = Set(is_vegan);
        }
        if let Some(mins) = request.preparation_time_minutes {
            active.preparation_time_minutes = Set(mins);
        }
        active.updated_at = Set(Utc::now());

        Ok(active.update(&*self.db_pool).await?)
    }

    /// Flips `is_available`. Deleting is restricted while order lines
    /// reference the item, so day-to-day 86'ing goes through this instead.
    #[instrument(skip(self))]
    pub async fn toggle_menu_item_availability(
        &self,
        id: Uuid,
    ) -> Result<MenuItemModel, ServiceError> {
        let existing = self.get_menu_item(id).await?;
        let flipped = !existing.is_available;
        let mut active: MenuItemActiveModel = existing.into();
        active.is_available = Set(flipped);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_menu_item(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_menu_item(id).await?;
        MenuItemEntity::delete_by_id(existing.id)
            .exec(&*self.db_pool)
            .await?;
        info!(menu_item_id = %id, "Menu item deleted");
        Ok(())
    }
}
