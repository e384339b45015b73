//! JWT service for token generation and validation
//!
//! Tokens are signed with HS256 using a shared secret. Only access tokens
//! are issued; the subject claim carries the user id.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JwtConfig {
    /// Secret used to sign and verify tokens
    pub secret: String,
    /// Access token expiration time in seconds (default: 7 days)
    pub expiry: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            expiry: 60 * 60 * 24 * 7,
        }
    }
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Token handed back to a client after a successful login
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    pub token: String,
    pub created: DateTime<Utc>,
    /// Lifetime in seconds
    pub expiry: u64,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry: u64,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: &JwtConfig) -> anyhow::Result<Self> {
        if config.secret.is_empty() {
            anyhow::bail!("JWT secret must not be empty");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        Ok(JwtService {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            expiry: config.expiry,
        })
    }

    /// Generate an access token for a user
    pub fn generate_token(&self, user_id: Uuid) -> jsonwebtoken::errors::Result<Token> {
        let created = Utc::now();
        let now = created.timestamp().max(0) as u64;

        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now.saturating_add(self.expiry),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(Token {
            token,
            created,
            expiry: self.expiry,
        })
    }

    /// Validate a token and return the claims
    pub fn validate_token(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}
