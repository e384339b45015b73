//! User service: registration, login and account management

use std::sync::{Arc, OnceLock};

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use async_trait::async_trait;
use common::error::DatabaseError;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    jwt::{JwtService, Token},
    models::{User, UserCreate, UserLogin, UserUpdate},
    repositories::{Conditions, UserField, UserStore},
};

/// Errors surfaced by the user service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("user not found")]
    NotFound,

    #[error("email has already been registered")]
    EmailExists,

    #[error("email or password is invalid")]
    InvalidCredentials,

    #[error("database error: {0}")]
    Database(#[source] DatabaseError),

    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error("failed to issue token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl From<DatabaseError> for ServiceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound => ServiceError::NotFound,
            other => ServiceError::Database(other),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Operations the HTTP handlers delegate to
#[async_trait]
pub trait UserService: Send + Sync {
    /// Register a user and return its freshly assigned id
    async fn register(&self, data: &mut UserCreate) -> ServiceResult<Uuid>;

    async fn login(&self, data: &UserLogin) -> ServiceResult<Token>;

    async fn get_all_users(&self) -> ServiceResult<Vec<User>>;

    async fn get_user_by_id(&self, id: Uuid) -> ServiceResult<User>;

    async fn update_user(&self, id: Uuid, data: &UserUpdate) -> ServiceResult<()>;

    async fn delete_user(&self, id: Uuid) -> ServiceResult<()>;
}

/// Default [`UserService`] backed by a [`UserStore`]
#[derive(Clone)]
pub struct UserManager {
    store: Arc<dyn UserStore>,
    jwt_service: JwtService,
}

impl UserManager {
    pub fn new(store: Arc<dyn UserStore>, jwt_service: JwtService) -> Self {
        Self { store, jwt_service }
    }
}

fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// Hash verified against when the email is unknown
fn dummy_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("not-a-real-password").unwrap_or_default())
}

#[async_trait]
impl UserService for UserManager {
    async fn register(&self, data: &mut UserCreate) -> ServiceResult<Uuid> {
        let by_email = Conditions::new().with(UserField::Email, data.email.as_str());
        match self.store.get_user(&by_email).await {
            Ok(_) => return Err(ServiceError::EmailExists),
            Err(DatabaseError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        data.password = hash_password(&data.password)?;
        data.id = Uuid::new_v4();

        // a concurrent registration can win between the lookup and the insert
        self.store.save(data).await.map_err(|e| match e {
            DatabaseError::AlreadyExists => ServiceError::EmailExists,
            other => other.into(),
        })?;
        info!("Registered user {}", data.id);

        Ok(data.id)
    }

    async fn login(&self, data: &UserLogin) -> ServiceResult<Token> {
        let by_email = Conditions::new().with(UserField::Email, data.email.as_str());
        let user = match self.store.get_user(&by_email).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound) => {
                verify_password(&data.password, dummy_hash());
                return Err(ServiceError::InvalidCredentials);
            }
            Err(e) => return Err(ServiceError::Database(e)),
        };

        if !verify_password(&data.password, &user.password) {
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self.jwt_service.generate_token(user.id)?;
        info!("User {} logged in", user.id);

        Ok(token)
    }

    async fn get_all_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.store.get_all().await?)
    }

    async fn get_user_by_id(&self, id: Uuid) -> ServiceResult<User> {
        Ok(self.store.get_by_id(id).await?)
    }

    async fn update_user(&self, id: Uuid, data: &UserUpdate) -> ServiceResult<()> {
        Ok(self.store.update(id, data).await?)
    }

    async fn delete_user(&self, id: Uuid) -> ServiceResult<()> {
        Ok(self.store.delete(id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::JwtConfig,
        repositories::PgUserRepository,
        testing::{MemoryUserStore, jwt_service},
    };
    use common::error::DatabaseResult;
    use sqlx::PgPool;

    /// Store whose lookups never see existing rows, as when another
    /// registration commits between the lookup and the insert
    #[derive(Default)]
    struct StaleLookupStore {
        inner: MemoryUserStore,
    }

    #[async_trait]
    impl UserStore for StaleLookupStore {
        async fn save(&self, user: &UserCreate) -> DatabaseResult<()> {
            self.inner.save(user).await
        }

        async fn get_user(&self, _conditions: &Conditions) -> DatabaseResult<User> {
            Err(DatabaseError::NotFound)
        }

        async fn get_all(&self) -> DatabaseResult<Vec<User>> {
            self.inner.get_all().await
        }

        async fn get_by_id(&self, id: Uuid) -> DatabaseResult<User> {
            self.inner.get_by_id(id).await
        }

        async fn update(&self, id: Uuid, user: &UserUpdate) -> DatabaseResult<()> {
            self.inner.update(id, user).await
        }

        async fn delete(&self, id: Uuid) -> DatabaseResult<()> {
            self.inner.delete(id).await
        }
    }

    fn manager() -> (UserManager, JwtService) {
        let jwt = JwtService::new(&JwtConfig {
            secret: "service-test-secret".to_string(),
            expiry: 600,
        })
        .unwrap();
        let store = Arc::new(MemoryUserStore::default());
        (UserManager::new(store, jwt.clone()), jwt)
    }

    fn registration(email: &str) -> UserCreate {
        UserCreate {
            id: Uuid::nil(),
            email: email.to_string(),
            password: "Sup3r$ecret".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: Some("+44 20 7946 0000".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_then_fetch_returns_matching_fields() {
        let (service, _) = manager();
        let mut data = registration("ada@example.com");

        let id = service.register(&mut data).await.unwrap();
        assert!(!id.is_nil());

        let user = service.get_user_by_id(id).await.unwrap();
        assert_eq!(user.id, id);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.last_name, "Lovelace");
        assert_eq!(user.phone.as_deref(), Some("+44 20 7946 0000"));
        assert_ne!(user.password, "Sup3r$ecret");
        assert!(user.password.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let (service, _) = manager();
        service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap();

        let err = service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailExists));
    }

    #[tokio::test]
    async fn test_duplicate_email_caught_at_insert_is_email_exists() {
        let service = UserManager::new(Arc::new(StaleLookupStore::default()), jwt_service());
        service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap();

        let err = service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::EmailExists));
        assert_eq!(service.get_all_users().await.unwrap().len(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_concurrent_duplicate_registration_is_email_exists(pool: PgPool) {
        let store = Arc::new(PgUserRepository::new(pool));
        let service = UserManager::new(store, jwt_service());

        let mut ada = registration("ada@example.com");
        let mut twin = registration("ada@example.com");
        let (first, second) = tokio::join!(service.register(&mut ada), service.register(&mut twin));

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            outcomes
                .iter()
                .any(|r| matches!(r, Err(ServiceError::EmailExists)))
        );
    }

    #[tokio::test]
    async fn test_login_issues_token_for_user() {
        let (service, jwt) = manager();
        let id = service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap();

        let token = service
            .login(&UserLogin {
                email: "ada@example.com".to_string(),
                password: "Sup3r$ecret".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(jwt.validate_token(&token.token).unwrap().sub, id);
    }

    #[tokio::test]
    async fn test_login_failures_are_invalid_credentials() {
        let (service, _) = manager();
        service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap();

        let wrong_password = service
            .login(&UserLogin {
                email: "ada@example.com".to_string(),
                password: "not-the-password".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(wrong_password, ServiceError::InvalidCredentials));

        let unknown_email = service
            .login(&UserLogin {
                email: "nobody@example.com".to_string(),
                password: "Sup3r$ecret".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(unknown_email, ServiceError::InvalidCredentials));
    }

    #[test]
    fn test_unknown_email_is_checked_against_a_real_hash() {
        assert!(PasswordHash::new(dummy_hash()).is_ok());
        assert!(!verify_password("Sup3r$ecret", dummy_hash()));
    }

    #[tokio::test]
    async fn test_get_all_on_empty_store_is_empty() {
        let (service, _) = manager();
        assert!(service.get_all_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_only_changes_given_fields() {
        let (service, _) = manager();
        let id = service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap();

        service
            .update_user(
                id,
                &UserUpdate {
                    last_name: Some("King".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let user = service.get_user_by_id(id).await.unwrap();
        assert_eq!(user.last_name, "King");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.phone.as_deref(), Some("+44 20 7946 0000"));
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let (service, _) = manager();
        let id = Uuid::new_v4();

        assert!(matches!(
            service.get_user_by_id(id).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            service.delete_user(id).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            service
                .update_user(
                    id,
                    &UserUpdate {
                        first_name: Some("Nobody".to_string()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_user() {
        let (service, _) = manager();
        let id = service
            .register(&mut registration("ada@example.com"))
            .await
            .unwrap();

        service.delete_user(id).await.unwrap();
        assert!(service.get_all_users().await.unwrap().is_empty());
    }
}
