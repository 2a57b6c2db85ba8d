//! Monthly spending limits.
//!
//! One limit per `(category_id, owner_user_id, month, year)`; setting a limit
//! for a period that already has one replaces it. No history is kept.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Limit {
    pub id: Uuid,
    pub category_id: Uuid,
    pub owner_user_id: String,
    pub amount: f64,
    pub month: u32,
    pub year: i32,
    pub created_at: DateTime<Utc>,
}

impl Limit {
    pub fn new(
        category_id: Uuid,
        owner_user_id: &str,
        amount: f64,
        month: u32,
        year: i32,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            owner_user_id: owner_user_id.to_string(),
            amount,
            month,
            year,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "limits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category_id: String,
    pub owner_user_id: String,
    pub amount: f64,
    pub month: i32,
    pub year: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Categories,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Categories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Limit> for ActiveModel {
    fn from(limit: &Limit) -> Self {
        Self {
            id: ActiveValue::Set(limit.id.to_string()),
            category_id: ActiveValue::Set(limit.category_id.to_string()),
            owner_user_id: ActiveValue::Set(limit.owner_user_id.clone()),
            amount: ActiveValue::Set(limit.amount),
            month: ActiveValue::Set(limit.month as i32),
            year: ActiveValue::Set(limit.year),
            created_at: ActiveValue::Set(limit.created_at),
        }
    }
}

impl TryFrom<Model> for Limit {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("limit not exists".to_string()))?,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| LedgerError::NotFound("category not exists".to_string()))?,
            owner_user_id: model.owner_user_id,
            amount: model.amount,
            month: model.month as u32,
            year: model.year,
            created_at: model.created_at,
        })
    }
}
