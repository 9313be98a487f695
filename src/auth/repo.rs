use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ApiError;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, \
                            is_active, last_login, created_at, updated_at";

impl User {
    /// Insert a new user with a precomputed password hash. A unique-index
    /// collision on username or email surfaces as `Duplicate`.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new.username)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.first_name)
        .bind(new.last_name)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    /// Fast-path duplicate probe used before insert: matches either identity
    /// field so the handler can report which one collided.
    pub async fn find_by_identity(
        db: &PgPool,
        username: &str,
        email: &str,
    ) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1 OR email = $2
            LIMIT 1
            "#
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Look up by username OR email, active accounts only.
    pub async fn find_by_login(db: &PgPool, login: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE (username = $1 OR email = $1) AND is_active
            "#
        ))
        .bind(login)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Apply only the supplied fields. An email owned by a different user is
    /// rejected before the update; the unique constraint still backstops the
    /// race.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        update: ProfileUpdate,
    ) -> Result<User, ApiError> {
        if let Some(email) = &update.email {
            let taken: Option<(Uuid,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = $1 AND id <> $2")
                    .bind(email)
                    .bind(id)
                    .fetch_optional(db)
                    .await?;
            if taken.is_some() {
                return Err(ApiError::Duplicate { field: "email" });
            }
        }

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name  = COALESCE($3, last_name),
                email      = COALESCE($4, email),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email)
        .fetch_optional(db)
        .await?;
        user.ok_or(ApiError::NotFound("User"))
    }

    /// Swap the password hash; no other fields change.
    pub async fn set_password(db: &PgPool, id: Uuid, password_hash: &str) -> Result<(), ApiError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(db)
                .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User"));
        }
        Ok(())
    }

    pub async fn touch_last_login(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
        sqlx::query("UPDATE users SET last_login = now() WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_never_serializes() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: None,
            last_name: None,
            is_active: true,
            last_login: None,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2id"));
        assert!(json.contains("alice@x.com"));
    }
}
