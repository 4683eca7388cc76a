//! Response language negotiation

use std::convert::Infallible;

use axum::http::header::ACCEPT_LANGUAGE;

use shared::Language;

/// Language picked from `Accept-Language`; Vietnamese when absent
#[derive(Debug, Clone, Copy)]
pub struct RequestLanguage(pub Language);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for RequestLanguage
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let language = parts
            .headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Language::from_header)
            .unwrap_or_default();
        Ok(RequestLanguage(language))
    }
}
