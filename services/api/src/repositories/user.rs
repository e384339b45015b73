//! User repository for database operations

use std::collections::BTreeMap;

use async_trait::async_trait;
use common::error::{DatabaseError, DatabaseResult};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::models::{User, UserCreate, UserUpdate};

const USER_COLUMNS: &str =
    "id, email, password, first_name, last_name, phone, created_at, updated_at";

/// Columns a lookup may filter on
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum UserField {
    Id,
    Email,
    FirstName,
    LastName,
    Phone,
}

impl UserField {
    pub fn column(self) -> &'static str {
        match self {
            UserField::Id => "id",
            UserField::Email => "email",
            UserField::FirstName => "first_name",
            UserField::LastName => "last_name",
            UserField::Phone => "phone",
        }
    }
}

/// Value compared against a [`UserField`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Uuid(Uuid),
    Text(String),
}

impl From<Uuid> for FieldValue {
    fn from(value: Uuid) -> Self {
        FieldValue::Uuid(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// Equality filter over user columns, combined with `AND`
///
/// Field names come from [`UserField`] only, never from request input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conditions(BTreeMap<UserField, FieldValue>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: UserField, value: impl Into<FieldValue>) -> Self {
        self.0.insert(field, value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserField, &FieldValue)> {
        self.0.iter()
    }
}

/// Persistence port for users
///
/// Every method issues exactly one statement. A lookup or mutation that
/// touches no row reports [`DatabaseError::NotFound`].
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn save(&self, user: &UserCreate) -> DatabaseResult<()>;

    async fn get_user(&self, conditions: &Conditions) -> DatabaseResult<User>;

    async fn get_all(&self) -> DatabaseResult<Vec<User>>;

    async fn get_by_id(&self, id: Uuid) -> DatabaseResult<User>;

    async fn update(&self, id: Uuid, user: &UserUpdate) -> DatabaseResult<()>;

    async fn delete(&self, id: Uuid) -> DatabaseResult<()>;
}

/// PostgreSQL backed user repository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn select_query(conditions: &Conditions) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!("SELECT {} FROM users", USER_COLUMNS));

    for (index, (field, value)) in conditions.iter().enumerate() {
        query.push(if index == 0 { " WHERE " } else { " AND " });
        query.push(field.column()).push(" = ");
        match value {
            FieldValue::Uuid(id) => query.push_bind(*id),
            FieldValue::Text(text) => query.push_bind(text.clone()),
        };
    }

    query.push(" ORDER BY id LIMIT 1");
    query
}

fn update_query(id: Uuid, user: &UserUpdate) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("UPDATE users SET ");

    {
        let mut set = query.separated(", ");
        if let Some(first_name) = &user.first_name {
            set.push("first_name = ")
                .push_bind_unseparated(first_name.clone());
        }
        if let Some(last_name) = &user.last_name {
            set.push("last_name = ").push_bind_unseparated(last_name.clone());
        }
        if let Some(phone) = &user.phone {
            set.push("phone = ").push_bind_unseparated(phone.clone());
        }
        set.push("updated_at = now()");
    }

    query.push(" WHERE id = ").push_bind(id);
    query
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn save(&self, user: &UserCreate) -> DatabaseResult<()> {
        info!("Saving user: {}", user.id);

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password, first_name, last_name, phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from_insert)?;

        Ok(())
    }

    async fn get_user(&self, conditions: &Conditions) -> DatabaseResult<User> {
        info!("Finding user by {} condition(s)", conditions.0.len());

        select_query(conditions)
            .build_query_as::<User>()
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn get_all(&self) -> DatabaseResult<Vec<User>> {
        info!("Listing users");

        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at, id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::Query)
    }

    async fn get_by_id(&self, id: Uuid) -> DatabaseResult<User> {
        info!("Finding user by ID: {}", id);

        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(DatabaseError::from_query)
    }

    async fn update(&self, id: Uuid, user: &UserUpdate) -> DatabaseResult<()> {
        info!("Updating user: {}", id);

        let result = update_query(id, user)
            .build()
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<()> {
        info!("Deleting user: {}", id);

        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::Query)?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        Ok(())
    }
}
