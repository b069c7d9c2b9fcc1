use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::owned::OwnedRecord;

const EXPENSE_COLUMNS: &str = "id, name, budgeted_price, actual_price, date_created, status, \
                               date_last_updated, priority, note, period_id, user_id";

/// An expense line item: budgeted vs. actual price, status, priority and a
/// note, optionally linked to a period.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: i32,
    pub name: String,
    pub budgeted_price: i32,
    pub actual_price: Option<i32>,
    pub date_created: OffsetDateTime,
    pub status: String,
    pub date_last_updated: Option<OffsetDateTime>,
    pub priority: String,
    pub note: String,
    pub period_id: Option<i32>,
    pub user_id: Option<i32>,
}

impl OwnedRecord for Expense {
    const TABLE: &'static str = "expense";
    const COLUMNS: &'static str = EXPENSE_COLUMNS;
}

#[derive(Debug)]
pub struct NewExpense {
    pub name: String,
    pub note: String,
    pub budgeted_price: i32,
    pub actual_price: Option<i32>,
    pub status: String,
    pub priority: String,
    pub period_id: Option<i32>,
}

impl Expense {
    pub async fn create(db: &PgPool, new: NewExpense, user_id: i32) -> Result<Expense, sqlx::Error> {
        let sql = format!(
            "INSERT INTO expense \
             (name, budgeted_price, actual_price, status, priority, note, period_id, user_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {EXPENSE_COLUMNS}"
        );
        sqlx::query_as::<_, Expense>(&sql)
            .bind(&new.name)
            .bind(new.budgeted_price)
            .bind(new.actual_price)
            .bind(&new.status)
            .bind(&new.priority)
            .bind(&new.note)
            .bind(new.period_id)
            .bind(user_id)
            .fetch_one(db)
            .await
    }

    /// Persist the mutable columns, stamping the last-updated time.
    pub async fn save(&self, db: &PgPool) -> Result<Expense, sqlx::Error> {
        let sql = format!(
            "UPDATE expense SET name = $1, budgeted_price = $2, actual_price = $3, \
             status = $4, priority = $5, note = $6, period_id = $7, date_last_updated = now() \
             WHERE id = $8 RETURNING {EXPENSE_COLUMNS}"
        );
        sqlx::query_as::<_, Expense>(&sql)
            .bind(&self.name)
            .bind(self.budgeted_price)
            .bind(self.actual_price)
            .bind(&self.status)
            .bind(&self.priority)
            .bind(&self.note)
            .bind(self.period_id)
            .bind(self.id)
            .fetch_one(db)
            .await
    }
}
