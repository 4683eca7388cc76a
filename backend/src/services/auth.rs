//! Authentication service for login and access token handling

use bcrypt::verify;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub name: String,
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Successful login
#[derive(Debug, Serialize)]
pub struct LoginSession {
    pub uid: i64,
    pub name: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    password_hash: String,
    is_active: bool,
}

/// Decode and validate an access token
pub fn decode_access_token(token: &str, secret: &str) -> AppResult<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::InvalidToken,
    })
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate user with login and password
    pub async fn login(&self, login: &str, password: &str) -> AppResult<LoginSession> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, password_hash, is_active
            FROM users
            WHERE login = $1
            "#,
        )
        .bind(login.trim())
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AppError::Unauthorized {
                message: "Account is disabled".to_string(),
                message_vi: "Tài khoản đã bị khóa".to_string(),
            });
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        let permissions = self.get_user_permissions(user.id).await?;
        let access_token = self.generate_access_token(user.id, &user.name, &permissions)?;

        tracing::info!(user_id = user.id, "User logged in");

        Ok(LoginSession {
            uid: user.id,
            name: user.name,
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Get user permissions from database
    async fn get_user_permissions(&self, user_id: i64) -> AppResult<Vec<String>> {
        let permissions = sqlx::query_scalar::<_, String>(
            r#"
            SELECT CONCAT(resource, ':', action)
            FROM user_permissions
            WHERE user_id = $1
            ORDER BY resource, action
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(permissions)
    }

    fn generate_access_token(&self, user_id: i64, name: &str, permissions: &[String]) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            name: name.to_string(),
            permissions: permissions.to_vec(),
            exp: (now + Duration::seconds(self.access_token_expiry)).timestamp(),
            iat: now.timestamp(),
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        let now = Utc::now();
        let claims = Claims {
            sub: "3".to_string(),
            name: "Thủ kho".to_string(),
            permissions: vec!["stock:operate".to_string()],
            exp: (now + Duration::seconds(60)).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();

        let decoded = decode_access_token(&token, "secret").unwrap();
        assert_eq!(decoded.sub, "3");
        assert_eq!(decoded.permissions, vec!["stock:operate".to_string()]);

        assert!(matches!(
            decode_access_token(&token, "other-secret"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let claims = Claims {
            sub: "3".to_string(),
            name: String::new(),
            permissions: Vec::new(),
            exp: (now - Duration::seconds(3600)).timestamp(),
            iat: (now - Duration::seconds(7200)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert!(matches!(
            decode_access_token(&token, "secret"),
            Err(AppError::TokenExpired)
        ));
    }
}
