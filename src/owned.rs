//! Ownership-scoped data access shared by every entity that belongs to a
//! user. Centralizes the owner filter and the "is this id well-formed"
//! guard so each new owned entity does not re-implement them.

use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool};

use crate::ids::IdInput;

/// A persisted record carrying a `user_id` owner column.
pub trait OwnedRecord: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    const COLUMNS: &'static str;
}

/// First record for the owner, or `None` when the id is malformed or no
/// record exists.
pub async fn get_one_by_owner<T: OwnedRecord>(
    db: &PgPool,
    owner: &IdInput,
) -> anyhow::Result<Option<T>> {
    let Some(owner_id) = owner.coerce() else {
        return Ok(None);
    };
    let sql = format!(
        "SELECT {} FROM {} WHERE user_id = $1 ORDER BY id LIMIT 1",
        T::COLUMNS,
        T::TABLE
    );
    let row = sqlx::query_as::<_, T>(&sql)
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// All records for the owner in id order. `None` marks a malformed owner
/// id; a valid owner with no records yields `Some` of an empty vec. The
/// two cases are distinct and callers rely on that.
pub async fn get_many_by_owner<T: OwnedRecord>(
    db: &PgPool,
    owner: &IdInput,
) -> anyhow::Result<Option<Vec<T>>> {
    let Some(owner_id) = owner.coerce() else {
        return Ok(None);
    };
    let sql = format!(
        "SELECT {} FROM {} WHERE user_id = $1 ORDER BY id",
        T::COLUMNS,
        T::TABLE
    );
    let rows = sqlx::query_as::<_, T>(&sql)
        .bind(owner_id)
        .fetch_all(db)
        .await?;
    Ok(Some(rows))
}

/// Record by id, visible only to its owner.
pub async fn get_by_id_for_owner<T: OwnedRecord>(
    db: &PgPool,
    id: &IdInput,
    owner_id: i32,
) -> anyhow::Result<Option<T>> {
    let Some(record_id) = id.coerce() else {
        return Ok(None);
    };
    let sql = format!(
        "SELECT {} FROM {} WHERE id = $1 AND user_id = $2",
        T::COLUMNS,
        T::TABLE
    );
    let row = sqlx::query_as::<_, T>(&sql)
        .bind(record_id)
        .bind(owner_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Delete by id, owner-scoped. Returns whether a row was removed.
pub async fn delete_for_owner<T: OwnedRecord>(
    db: &PgPool,
    id: &IdInput,
    owner_id: i32,
) -> anyhow::Result<bool> {
    let Some(record_id) = id.coerce() else {
        return Ok(false);
    };
    let sql = format!("DELETE FROM {} WHERE id = $1 AND user_id = $2", T::TABLE);
    let result = sqlx::query(&sql)
        .bind(record_id)
        .bind(owner_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::repo::Period;
    use crate::state::AppState;

    // The malformed-id guard runs before any query, so a lazily connecting
    // pool never actually talks to a database here.

    #[tokio::test]
    async fn malformed_owner_id_is_the_not_found_sentinel() {
        let db = AppState::fake().db;
        let bad = IdInput::Text("abc".into());
        let one = get_one_by_owner::<Period>(&db, &bad).await.expect("no query issued");
        assert!(one.is_none());
        let many = get_many_by_owner::<Period>(&db, &bad).await.expect("no query issued");
        assert!(many.is_none());
    }

    #[tokio::test]
    async fn sentinel_differs_from_an_empty_collection() {
        let db = AppState::fake().db;
        let malformed = get_many_by_owner::<Period>(&db, &IdInput::Text("4.2".into()))
            .await
            .expect("no query issued");
        // A valid owner with no rows would come back as Some(vec![]),
        // which callers must be able to tell apart from this.
        assert_ne!(malformed, Some(vec![]));
        assert!(malformed.is_none());
    }

    #[tokio::test]
    async fn malformed_record_id_is_not_found() {
        let db = AppState::fake().db;
        let bad = IdInput::Text("".into());
        let record = get_by_id_for_owner::<Period>(&db, &bad, 1)
            .await
            .expect("no query issued");
        assert!(record.is_none());
        let removed = delete_for_owner::<Period>(&db, &bad, 1)
            .await
            .expect("no query issued");
        assert!(!removed);
    }
}
