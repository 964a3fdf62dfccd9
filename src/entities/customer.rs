use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A restaurant customer. `loyalty_points` only grows through accrual and
/// the manual points endpoint; `is_vip` is a one-way promotion at 100
/// points and is never cleared.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, Validate, ToSchema)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Name must be between 1 and 200 characters"))]
    pub name: String,

    #[sea_orm(unique)]
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[sea_orm(unique)]
    #[validate(custom = "validate_phone")]
    pub phone: String,

    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
    pub loyalty_points: i32,
    pub is_vip: bool,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Phone numbers: optional leading `+`, then 9 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if digits.len() < 9 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new("invalid_phone"));
    }
    Ok(())
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Order,
    #[sea_orm(has_many = "super::reservation::Entity")]
    Reservation,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl Related<super::reservation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reservation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::validate_phone;

    #[test]
    fn accepts_international_numbers() {
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("987654321").is_ok());
    }

    #[test]
    fn rejects_short_and_non_numeric() {
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("+91-98765-43210").is_err());
        assert!(validate_phone("abcdefghij").is_err());
    }
}
