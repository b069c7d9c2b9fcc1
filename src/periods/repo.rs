use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::owned::OwnedRecord;

// 1-indexed like the calendar; slot 0 is the empty month.
const MONTH_NAMES: [&str; 13] = [
    "",
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const MONTH_ABBRS: [&str; 13] = [
    "", "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A per-user monthly bucket for expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Period {
    pub id: i32,
    pub month: i32,
    pub year: i32,
    pub user_id: Option<i32>,
}

impl OwnedRecord for Period {
    const TABLE: &'static str = "periods";
    const COLUMNS: &'static str = "id, month, year, user_id";
}

impl Period {
    /// Full month name, `None` when the stored month is outside 1..=12.
    pub fn month_name(&self) -> Option<&'static str> {
        MONTH_NAMES.get(valid_index(self.month)?).copied()
    }

    /// Abbreviated month name.
    pub fn month_abbr(&self) -> Option<&'static str> {
        MONTH_ABBRS.get(valid_index(self.month)?).copied()
    }

    pub async fn create(
        db: &PgPool,
        month: i32,
        year: i32,
        user_id: i32,
    ) -> Result<Period, sqlx::Error> {
        sqlx::query_as::<_, Period>(
            "INSERT INTO periods (month, year, user_id) VALUES ($1, $2, $3) \
             RETURNING id, month, year, user_id",
        )
        .bind(month)
        .bind(year)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn save(&self, db: &PgPool) -> Result<Period, sqlx::Error> {
        sqlx::query_as::<_, Period>(
            "UPDATE periods SET month = $1, year = $2 WHERE id = $3 \
             RETURNING id, month, year, user_id",
        )
        .bind(self.month)
        .bind(self.year)
        .bind(self.id)
        .fetch_one(db)
        .await
    }
}

fn valid_index(month: i32) -> Option<usize> {
    (1..=12).contains(&month).then_some(month as usize)
}
