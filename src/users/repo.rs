use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::password::{hash_password, verify_password};
use crate::ids::IdInput;

const USER_COLUMNS: &str =
    "id, username, email, password, created_at, first_name, last_name, active, is_admin";

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: Option<String>, // argon2 PHC string, never exposed
    pub created_at: OffsetDateTime,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub active: bool,
    pub is_admin: bool,
}

/// Fields accepted when creating a user. The password arrives in plaintext
/// and is hashed before it touches storage.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
}

impl User {
    pub async fn all(db: &PgPool) -> anyhow::Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id");
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(db).await?;
        Ok(users)
    }

    /// Lookup by a loosely typed id; a malformed id is not-found, not an
    /// error.
    pub async fn get_by_id(db: &PgPool, id: &IdInput) -> anyhow::Result<Option<User>> {
        let Some(user_id) = id.coerce() else {
            return Ok(None);
        };
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(db)
            .await?;
        Ok(user)
    }

    pub async fn create(db: &PgPool, new: NewUser) -> Result<User, sqlx::Error> {
        let password = match new.password.as_deref() {
            Some(plain) => Some(
                hash_password(plain).map_err(|e| sqlx::Error::Protocol(e.to_string()))?,
            ),
            None => None,
        };
        let sql = format!(
            "INSERT INTO users (username, email, password, first_name, last_name, is_admin) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&password)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(new.is_admin)
            .fetch_one(db)
            .await
    }

    /// Persist the mutable columns of this record. Password and email are
    /// deliberately not part of the generic update path.
    pub async fn save(&self, db: &PgPool) -> Result<User, sqlx::Error> {
        let sql = format!(
            "UPDATE users SET username = $1, first_name = $2, last_name = $3, \
             active = $4, is_admin = $5 WHERE id = $6 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&self.username)
            .bind(&self.first_name)
            .bind(&self.last_name)
            .bind(self.active)
            .bind(self.is_admin)
            .bind(self.id)
            .fetch_one(db)
            .await
    }

    pub async fn delete(db: &PgPool, user_id: i32) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// True iff the stored hash matches the plaintext. A user without a
    /// password can never authenticate.
    pub fn check_password(&self, plain: &str) -> anyhow::Result<bool> {
        match self.password.as_deref() {
            Some(hash) => verify_password(plain, hash),
            None => Ok(false),
        }
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
    }
}

/// A role for a user. No endpoint exercises roles; they are managed
/// directly through the repository.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub user_id: Option<i32>,
}

impl Role {
    pub async fn create(db: &PgPool, name: &str, user_id: Option<i32>) -> Result<Role, sqlx::Error> {
        sqlx::query_as::<_, Role>(
            "INSERT INTO roles (name, user_id) VALUES ($1, $2) RETURNING id, name, user_id",
        )
        .bind(name)
        .bind(user_id)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, role_id: i32) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(role_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 1,
            username: "a".into(),
            email: "a@x.com".into(),
            password: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            active: true,
            is_admin: false,
        }
    }

    #[test]
    fn user_without_password_never_authenticates() {
        let user = sample_user();
        assert!(!user.check_password("anything").expect("no error"));
    }

    #[test]
    fn check_password_matches_only_the_original_plaintext() {
        let mut user = sample_user();
        user.password = Some(hash_password("secret").expect("hash"));
        assert!(user.check_password("secret").expect("verify"));
        assert!(!user.check_password("Secret").expect("verify"));
    }

    #[test]
    fn serialized_user_never_contains_the_password() {
        let mut user = sample_user();
        user.password = Some("phc-string".into());
        let json = serde_json::to_string(&user).expect("serialize");
        assert!(!json.contains("password"));
        assert!(!json.contains("phc-string"));
    }

    #[test]
    fn full_name_joins_first_and_last() {
        assert_eq!(sample_user().full_name(), "Ada Lovelace");
    }

    #[test]
    fn role_round_trips_through_json() {
        let role = Role {
            id: 2,
            name: "admin".into(),
            user_id: None,
        };
        let json = serde_json::to_value(&role).expect("serialize");
        assert_eq!(json["name"], "admin");
        let back: Role = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back.user_id, None);
    }
}
