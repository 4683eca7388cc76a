//! Authentication middleware
//!
//! JWT authentication for the handheld and dashboard API

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

use shared::Actor;

use crate::error::{ErrorDetail, ErrorResponse};
use crate::services::auth::{decode_access_token, Claims};

/// Authenticated user information extracted from JWT
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: i64,
    pub name: String,
    pub permissions: Vec<String>,
}

impl AuthUser {
    /// The acting user handed to scan processors
    pub fn actor(&self) -> Actor {
        Actor::user(self.user_id, self.permissions.clone())
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = &'static str;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| "Invalid user ID in token")?;
        Ok(AuthUser {
            user_id,
            name: claims.name,
            permissions: claims.permissions,
        })
    }
}

/// Authentication middleware that validates JWT tokens
/// Note: the secret is read from the environment so the middleware needs no state.
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    // Extract Authorization header
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header.and_then(|header| header.strip_prefix("Bearer ")) {
        Some(token) => token,
        None => {
            return unauthorized_response("Missing or invalid Authorization header");
        }
    };

    // Get JWT secret from environment (fallback for middleware without state)
    let jwt_secret = std::env::var("QRW__JWT__SECRET")
        .or_else(|_| std::env::var("QRW_JWT_SECRET"))
        .unwrap_or_else(|_| "development-secret-key".to_string());

    let claims = match decode_access_token(token, &jwt_secret) {
        Ok(claims) => claims,
        Err(err) => {
            return unauthorized_response(&err.to_string());
        }
    };

    let auth_user = match AuthUser::try_from(claims) {
        Ok(user) => user,
        Err(msg) => return unauthorized_response(msg),
    };

    request.extensions_mut().insert(auth_user);

    next.run(request).await
}

/// Create unauthorized response
fn unauthorized_response(message: &str) -> Response {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message_en: message.to_string(),
            message_vi: "Chưa đăng nhập hoặc phiên đã hết hạn".to_string(),
            field: None,
        },
    };

    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

/// Extractor for authenticated user
/// Use this in handlers to get the current user
#[derive(Clone, Debug)]
pub struct CurrentUser(pub AuthUser);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message_en: "Authentication required".to_string(),
                        message_vi: "Vui lòng đăng nhập".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_user_from_claims() {
        let claims = Claims {
            sub: "12".to_string(),
            name: "Kho 1".to_string(),
            permissions: vec!["stock:operate".to_string()],
            exp: 0,
            iat: 0,
        };
        let user = AuthUser::try_from(claims).unwrap();
        assert_eq!(user.user_id, 12);
        assert!(user.actor().has_permission("stock", "operate"));
        assert_eq!(user.actor(), Actor::user(12, vec!["stock:operate".to_string()]));
    }

    #[test]
    fn test_auth_user_rejects_non_numeric_subject() {
        let claims = Claims {
            sub: "abc".to_string(),
            name: String::new(),
            permissions: Vec::new(),
            exp: 0,
            iat: 0,
        };
        assert!(AuthUser::try_from(claims).is_err());
    }
}
