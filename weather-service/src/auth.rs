use common::errors::AppError;
use common::models::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::store::{User, UserStore};

/// Password hashing plus HS256 bearer tokens keyed on the username.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(secret: &str, token_ttl: Duration, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            token_ttl,
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        bcrypt::hash(password, self.bcrypt_cost)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch.
    pub fn verify_password(&self, password: &str, hashed_password: &str) -> bool {
        bcrypt::verify(password, hashed_password).unwrap_or(false)
    }

    pub fn generate_token(&self, username: &str) -> Result<String, AppError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| AppError::internal(format!("System clock error: {}", e)))?;

        let exp = now
            .checked_add(self.token_ttl)
            .ok_or_else(|| AppError::internal("Token lifetime overflows the clock"))?;

        let claims = Claims {
            sub: username.to_string(),
            exp: exp.as_secs() as usize,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("JWT generation failed: {}", e)))
    }

    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::auth("Could not validate credentials"))
    }

    /// Username/password check. Unknown users and wrong passwords are
    /// indistinguishable to the caller.
    pub async fn authenticate(
        &self,
        users: &dyn UserStore,
        username: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let user = users
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::auth("Incorrect username or password"))?;

        if !self.verify_password(password, &user.hashed_password) {
            return Err(AppError::auth("Incorrect username or password"));
        }

        Ok(user)
    }
}
