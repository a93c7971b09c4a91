use axum::{async_trait, extract::FromRequestParts, http::request::Parts, RequestPartsExt};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use turnstile_integrations::identity::IdentityClaims;

use crate::response::ApiError;
use crate::state::AppState;

/// Extractor for the authenticated caller (spec.md §4.7 "AuthN": "injects
/// `user_id`, `tenant_id`, `role` into the per-request context").
/// Usage: `async fn handler(AuthUser(claims): AuthUser)`.
pub struct AuthUser(pub IdentityClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError(turnstile_types::AppError::Unauthorized))?;

        let claims = state.identity.verify(bearer.token()).await?;
        Ok(AuthUser(claims))
    }
}
