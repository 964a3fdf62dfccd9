use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Measurement unit an ingredient is stocked in.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
    strum::Display,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")]
pub enum StockUnit {
    #[sea_orm(string_value = "KG")]
    #[serde(rename = "KG")]
    Kilograms,
    #[sea_orm(string_value = "G")]
    #[serde(rename = "G")]
    Grams,
    #[sea_orm(string_value = "L")]
    #[serde(rename = "L")]
    Liters,
    #[sea_orm(string_value = "ML")]
    #[serde(rename = "ML")]
    Milliliters,
    #[sea_orm(string_value = "PCS")]
    #[serde(rename = "PCS")]
    Pieces,
    #[sea_orm(string_value = "PKG")]
    #[serde(rename = "PKG")]
    Packages,
}

/// A stocked ingredient. `current_stock` is a cached running total of the
/// stock transaction ledger and is only ever written in the same database
/// transaction as a ledger append.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub unit: StockUnit,
    pub current_stock: Decimal,
    pub minimum_stock: Decimal,
    pub cost_per_unit: Decimal,
    pub supplier: String,
    pub last_restocked: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model {
    /// Stock is low when the cached level has fallen to or below the
    /// configured minimum.
    pub fn is_low_stock(&self) -> bool {
        crate::services::inventory::low_stock(Some(self.current_stock), Some(self.minimum_stock))
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::recipe_line::Entity")]
    RecipeLine,
    #[sea_orm(has_many = "super::stock_transaction::Entity")]
    StockTransaction,
}

impl Related<super::recipe_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeLine.def()
    }
}

impl Related<super::stock_transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
