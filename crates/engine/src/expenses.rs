//! Recorded expenses.
//!
//! Expenses are append-only: no update or delete exists besides the cascade
//! when their category is deleted.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::LedgerError;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub category_id: Uuid,
    pub owner_user_id: String,
    pub amount: f64,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn new(
        category_id: Uuid,
        owner_user_id: &str,
        amount: f64,
        date: NaiveDate,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category_id,
            owner_user_id: owner_user_id.to_string(),
            amount,
            date,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub category_id: String,
    pub owner_user_id: String,
    pub amount: f64,
    pub date: Date,
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

impl From<&Expense> for ActiveModel {
    fn from(expense: &Expense) -> Self {
        Self {
            id: ActiveValue::Set(expense.id.to_string()),
            category_id: ActiveValue::Set(expense.category_id.to_string()),
            owner_user_id: ActiveValue::Set(expense.owner_user_id.clone()),
            amount: ActiveValue::Set(expense.amount),
            date: ActiveValue::Set(expense.date),
            created_at: ActiveValue::Set(expense.created_at),
        }
    }
}

impl TryFrom<Model> for Expense {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| LedgerError::NotFound("expense not exists".to_string()))?,
            category_id: Uuid::parse_str(&model.category_id)
                .map_err(|_| LedgerError::NotFound("category not exists".to_string()))?,
            owner_user_id: model.owner_user_id,
            amount: model.amount,
            date: model.date,
            created_at: model.created_at,
        })
    }
}
