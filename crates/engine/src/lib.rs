//! Budget ledger.
//!
//! Owns categories, monthly limits and expenses, all scoped by an owner
//! identity. Every read and write that takes a category id verifies that the
//! category belongs to the caller; a stale or foreign id fails as not-found.
//! The store (sqlite via sea-orm) is the single source of truth; uniqueness
//! and upsert semantics are delegated to its constraints so concurrent
//! writers for the same owner cannot race past the invariants.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, QueryOrder, SqlErr, Statement, TransactionTrait, prelude::*,
    sea_query::OnConflict,
};
use uuid::Uuid;

pub use categories::Category;
pub use error::LedgerError;
pub use expenses::Expense;
pub use limits::Limit;
pub use report::{BudgetStatus, CategoryReport, Report};

mod categories;
mod error;
mod expenses;
mod limits;
pub mod money;
mod report;

type ResultLedger<T> = Result<T, LedgerError>;

#[derive(Clone, Debug)]
pub struct Ledger {
    database: DatabaseConnection,
}

impl Ledger {
    /// Return a builder for `Ledger`.
    pub fn builder() -> LedgerBuilder {
        LedgerBuilder::default()
    }

    /// Creates a category for `owner`.
    ///
    /// Fails with [`LedgerError::Conflict`] when the owner already has a
    /// category with the same name. Names are unique per owner, not globally.
    pub async fn create_category(&self, owner: &str, name: &str) -> ResultLedger<Category> {
        let name = valid_name(name)?;

        let existing = categories::Entity::find()
            .filter(categories::Column::OwnerUserId.eq(owner))
            .filter(categories::Column::Name.eq(name))
            .one(&self.database)
            .await?;
        if existing.is_some() {
            return Err(LedgerError::Conflict(name.to_string()));
        }

        let category = Category::new(owner, name, Utc::now());
        match categories::ActiveModel::from(&category).insert(&self.database).await {
            Ok(_) => Ok(category),
            // A concurrent insert can slip past the pre-check; the unique
            // index catches it.
            Err(err) => Err(conflict_or_database(err, name)),
        }
    }

    /// Renames an owned category in place.
    pub async fn rename_category(
        &self,
        owner: &str,
        category_id: Uuid,
        new_name: &str,
    ) -> ResultLedger<Category> {
        let new_name = valid_name(new_name)?;
        let mut category = self.category(owner, category_id).await?;

        let taken = categories::Entity::find()
            .filter(categories::Column::OwnerUserId.eq(owner))
            .filter(categories::Column::Name.eq(new_name))
            .filter(categories::Column::Id.ne(category_id.to_string()))
            .one(&self.database)
            .await?;
        if taken.is_some() {
            return Err(LedgerError::Conflict(new_name.to_string()));
        }

        let model = categories::ActiveModel {
            id: ActiveValue::Set(category_id.to_string()),
            name: ActiveValue::Set(new_name.to_string()),
            ..Default::default()
        };
        if let Err(err) = model.update(&self.database).await {
            return Err(conflict_or_database(err, new_name));
        }

        category.name = new_name.to_string();
        Ok(category)
    }

    /// Deletes an owned category together with its expenses and limits.
    ///
    /// The cascade runs inside one database transaction; partial failure
    /// cannot leave expenses or limits referencing a deleted category.
    pub async fn delete_category(&self, owner: &str, category_id: Uuid) -> ResultLedger<()> {
        let db_tx = self.database.begin().await?;

        let model = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::OwnerUserId.eq(owner))
            .one(&db_tx)
            .await?
            .ok_or_else(|| LedgerError::NotFound("category not exists".to_string()))?;

        expenses::Entity::delete_many()
            .filter(expenses::Column::CategoryId.eq(category_id.to_string()))
            .exec(&db_tx)
            .await?;
        limits::Entity::delete_many()
            .filter(limits::Column::CategoryId.eq(category_id.to_string()))
            .exec(&db_tx)
            .await?;
        categories::Entity::delete_by_id(model.id).exec(&db_tx).await?;

        db_tx.commit().await?;
        Ok(())
    }

    /// Lists the owner's categories, ordered by name.
    pub async fn list_categories(&self, owner: &str) -> ResultLedger<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::OwnerUserId.eq(owner))
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;

        models.into_iter().map(Category::try_from).collect()
    }

    /// Returns an owned category, or not-found for stale/foreign ids.
    pub async fn category(&self, owner: &str, category_id: Uuid) -> ResultLedger<Category> {
        let model = categories::Entity::find_by_id(category_id.to_string())
            .filter(categories::Column::OwnerUserId.eq(owner))
            .one(&self.database)
            .await?
            .ok_or_else(|| LedgerError::NotFound("category not exists".to_string()))?;
        Category::try_from(model)
    }

    /// Sets the monthly limit of an owned category for one period.
    ///
    /// A limit already stored for that exact period is replaced; last write
    /// wins, no history kept. The replace is a single `ON CONFLICT` insert so
    /// two concurrent writers cannot both insert.
    pub async fn upsert_limit(
        &self,
        owner: &str,
        category_id: Uuid,
        month: u32,
        year: i32,
        amount: f64,
    ) -> ResultLedger<()> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(LedgerError::Validation(
                "limit must be a non-negative number".to_string(),
            ));
        }
        month_bounds(month, year)?;
        self.category(owner, category_id).await?;

        let limit = Limit::new(category_id, owner, amount, month, year, Utc::now());
        limits::Entity::insert(limits::ActiveModel::from(&limit))
            .on_conflict(
                OnConflict::columns([
                    limits::Column::CategoryId,
                    limits::Column::OwnerUserId,
                    limits::Column::Month,
                    limits::Column::Year,
                ])
                .update_columns([limits::Column::Amount, limits::Column::CreatedAt])
                .to_owned(),
            )
            .exec(&self.database)
            .await?;
        Ok(())
    }

    /// Returns the stored limit for the period, or `0` when none is set.
    ///
    /// Absence of a limit is not an error; it means no limit is configured.
    pub async fn limit_amount(
        &self,
        owner: &str,
        category_id: Uuid,
        month: u32,
        year: i32,
    ) -> ResultLedger<f64> {
        self.category(owner, category_id).await?;
        self.limit_amount_unchecked(owner, category_id, month, year)
            .await
    }

    /// Appends an expense to an owned category.
    pub async fn record_expense(
        &self,
        owner: &str,
        category_id: Uuid,
        amount: f64,
        date: NaiveDate,
    ) -> ResultLedger<Expense> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(LedgerError::Validation(
                "expense must be a positive number".to_string(),
            ));
        }
        self.category(owner, category_id).await?;

        let expense = Expense::new(category_id, owner, amount, date, Utc::now());
        expenses::ActiveModel::from(&expense).insert(&self.database).await?;
        Ok(expense)
    }

    /// Sums the owner's expenses for one category within a month.
    pub async fn sum_expenses(
        &self,
        owner: &str,
        category_id: Uuid,
        month: u32,
        year: i32,
    ) -> ResultLedger<f64> {
        self.category(owner, category_id).await?;
        self.sum_expenses_unchecked(owner, category_id, month, year)
            .await
    }

    /// Builds the spend-vs-limit report for one period.
    pub async fn build_report(&self, owner: &str, month: u32, year: i32) -> ResultLedger<Report> {
        month_bounds(month, year)?;

        let categories = self.list_categories(owner).await?;
        let mut rows = Vec::with_capacity(categories.len());
        for category in categories {
            let limit = self
                .limit_amount_unchecked(owner, category.id, month, year)
                .await?;
            let spent = self
                .sum_expenses_unchecked(owner, category.id, month, year)
                .await?;
            rows.push(CategoryReport {
                category_id: category.id,
                name: category.name,
                limit,
                spent,
            });
        }

        Ok(Report {
            month,
            year,
            categories: rows,
        })
    }

    async fn limit_amount_unchecked(
        &self,
        owner: &str,
        category_id: Uuid,
        month: u32,
        year: i32,
    ) -> ResultLedger<f64> {
        let model = limits::Entity::find()
            .filter(limits::Column::CategoryId.eq(category_id.to_string()))
            .filter(limits::Column::OwnerUserId.eq(owner))
            .filter(limits::Column::Month.eq(month as i32))
            .filter(limits::Column::Year.eq(year))
            .one(&self.database)
            .await?;
        Ok(model.map(|m| m.amount).unwrap_or(0.0))
    }

    async fn sum_expenses_unchecked(
        &self,
        owner: &str,
        category_id: Uuid,
        month: u32,
        year: i32,
    ) -> ResultLedger<f64> {
        let (start, end) = month_bounds(month, year)?;

        let backend = self.database.get_database_backend();
        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT CAST(COALESCE(SUM(amount), 0) AS REAL) AS total \
             FROM expenses \
             WHERE category_id = ? AND owner_user_id = ? AND date >= ? AND date < ?",
            vec![
                category_id.to_string().into(),
                owner.into(),
                start.into(),
                end.into(),
            ],
        );
        let row = self.database.query_one(stmt).await?;
        Ok(row
            .and_then(|r| r.try_get::<f64>("", "total").ok())
            .unwrap_or(0.0))
    }
}

fn valid_name(name: &str) -> ResultLedger<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::Validation(
            "category name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

fn conflict_or_database(err: DbErr, key: &str) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => LedgerError::Conflict(key.to_string()),
        _ => LedgerError::Database(err),
    }
}

/// `[first day of month, first day of next month)` for range filters.
fn month_bounds(month: u32, year: i32) -> ResultLedger<(NaiveDate, NaiveDate)> {
    let invalid = || LedgerError::Validation(format!("invalid period {month}/{year}"));
    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;
    Ok((start, end))
}

/// The builder for `Ledger`.
#[derive(Default)]
pub struct LedgerBuilder {
    database: DatabaseConnection,
}

impl LedgerBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> LedgerBuilder {
        self.database = db;
        self
    }

    /// Construct `Ledger`
    pub fn build(self) -> Ledger {
        Ledger {
            database: self.database,
        }
    }
}
