use std::collections::BTreeMap;
use std::sync::Mutex;

use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// User record, also the JSON wire shape. `id` is server-assigned and
/// never zero once stored; `0` on input means "new".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The email unique constraint would be violated.
    #[error("email already in use")]
    EmailTaken,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence contract for users. `save` keeps the email unique
/// constraint; the uniqueness *policy* (which collisions are allowed)
/// lives in the service layer.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert (id == 0) or overwrite (id != 0) a record. Returns the
    /// stored record with its assigned id.
    async fn save(&self, user: User) -> Result<User, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError>;
    /// Exact, case-sensitive match on email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn exists(&self, id: i64) -> Result<bool, StoreError>;
    async fn find_all(&self) -> Result<Vec<User>, StoreError>;
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

// --- Postgres ---

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if is_unique_violation(&e) {
        StoreError::EmailTaken
    } else {
        StoreError::Backend(e.into())
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn save(&self, user: User) -> Result<User, StoreError> {
        let saved = if user.id == 0 {
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (first_name, last_name, email)
                VALUES ($1, $2, $3)
                RETURNING id, first_name, last_name, email
                "#,
            )
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .fetch_one(&self.db)
            .await
        } else {
            sqlx::query_as::<_, User>(
                r#"
                INSERT INTO users (id, first_name, last_name, email)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id) DO UPDATE
                SET first_name = EXCLUDED.first_name,
                    last_name = EXCLUDED.last_name,
                    email = EXCLUDED.email
                RETURNING id, first_name, last_name, email
                "#,
            )
            .bind(user.id)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .fetch_one(&self.db)
            .await
        };
        saved.map_err(map_sqlx)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let found: Option<(i64,)> = sqlx::query_as(r#"SELECT id FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(map_sqlx)?;
        Ok(found.is_some())
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, email
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(map_sqlx)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM users WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await
            .map_err(map_sqlx)?;
        Ok(())
    }
}

// --- In-memory ---

/// Map-backed store. Doubles for Postgres in tests and when no
/// DATABASE_URL is configured; enforces the same email uniqueness at
/// `save` so both backends present one contract.
#[derive(Default)]
pub struct MemoryUserStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save(&self, mut user: User) -> Result<User, StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if inner
            .users
            .values()
            .any(|u| u.email == user.email && u.id != user.id)
        {
            return Err(StoreError::EmailTaken);
        }
        if user.id == 0 {
            // Ids start at 1 and are never reused within a process.
            inner.next_id += 1;
            user.id = inner.next_id;
        }
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.users.contains_key(&id))
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        Ok(inner.users.values().cloned().collect())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.users.remove(&id);
        Ok(())
    }
}
