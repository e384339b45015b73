//! In-memory doubles shared by unit tests

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;
use common::error::{DatabaseError, DatabaseResult};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    jwt::{JwtConfig, JwtService, Token},
    models::{User, UserCreate, UserLogin, UserUpdate},
    repositories::{Conditions, UserField, UserStore, user::FieldValue},
    services::{UserManager, UserService, user::ServiceResult},
};

pub const TEST_SECRET: &str = "unit-test-secret";

pub fn jwt_service() -> JwtService {
    JwtService::new(&JwtConfig {
        secret: TEST_SECRET.to_string(),
        expiry: 600,
    })
    .expect("test JWT config is valid")
}

fn field_matches(user: &User, field: UserField, value: &FieldValue) -> bool {
    match (field, value) {
        (UserField::Id, FieldValue::Uuid(id)) => user.id == *id,
        (UserField::Email, FieldValue::Text(text)) => user.email == *text,
        (UserField::FirstName, FieldValue::Text(text)) => user.first_name == *text,
        (UserField::LastName, FieldValue::Text(text)) => user.last_name == *text,
        (UserField::Phone, FieldValue::Text(text)) => user.phone.as_deref() == Some(text),
        _ => false,
    }
}

/// `UserStore` keeping rows in a map
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn save(&self, user: &UserCreate) -> DatabaseResult<()> {
        let now = Utc::now();
        let mut users = self.users.lock().await;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(DatabaseError::AlreadyExists);
        }
        users.insert(
            user.id,
            User {
                id: user.id,
                email: user.email.clone(),
                password: user.password.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                phone: user.phone.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn get_user(&self, conditions: &Conditions) -> DatabaseResult<User> {
        let users = self.users.lock().await;
        let mut matching: Vec<&User> = users
            .values()
            .filter(|user| {
                conditions
                    .iter()
                    .all(|(field, value)| field_matches(user, *field, value))
            })
            .collect();
        matching.sort_by_key(|user| user.id);
        matching.first().map(|user| (*user).clone()).ok_or(DatabaseError::NotFound)
    }

    async fn get_all(&self) -> DatabaseResult<Vec<User>> {
        let mut users: Vec<User> = self.users.lock().await.values().cloned().collect();
        users.sort_by_key(|user| (user.created_at, user.id));
        Ok(users)
    }

    async fn get_by_id(&self, id: Uuid) -> DatabaseResult<User> {
        self.users
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    async fn update(&self, id: Uuid, update: &UserUpdate) -> DatabaseResult<()> {
        let mut users = self.users.lock().await;
        let user = users.get_mut(&id).ok_or(DatabaseError::NotFound)?;
        if let Some(first_name) = &update.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(phone) = &update.phone {
            user.phone = Some(phone.clone());
        }
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DatabaseResult<()> {
        self.users
            .lock()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(DatabaseError::NotFound)
    }
}

/// `UserService` that counts calls before delegating to a real manager
pub struct RecordingService {
    inner: UserManager,
    calls: AtomicUsize,
}

impl RecordingService {
    pub fn new(jwt_service: JwtService) -> Self {
        Self {
            inner: UserManager::new(Arc::new(MemoryUserStore::default()), jwt_service),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserService for RecordingService {
    async fn register(&self, data: &mut UserCreate) -> ServiceResult<Uuid> {
        self.record();
        self.inner.register(data).await
    }

    async fn login(&self, data: &UserLogin) -> ServiceResult<Token> {
        self.record();
        self.inner.login(data).await
    }

    async fn get_all_users(&self) -> ServiceResult<Vec<User>> {
        self.record();
        self.inner.get_all_users().await
    }

    async fn get_user_by_id(&self, id: Uuid) -> ServiceResult<User> {
        self.record();
        self.inner.get_user_by_id(id).await
    }

    async fn update_user(&self, id: Uuid, data: &UserUpdate) -> ServiceResult<()> {
        self.record();
        self.inner.update_user(id, data).await
    }

    async fn delete_user(&self, id: Uuid) -> ServiceResult<()> {
        self.record();
        self.inner.delete_user(id).await
    }
}
