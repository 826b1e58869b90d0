use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::Post,
    repository::RepositoryState,
};

/// Claims
///
/// The payload structure expected inside a JSON Web Token issued by the
/// external auth provider. Tokens are signed with the shared secret and
/// validated on every authenticated request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the UUID of the user, mapped to public.users.id.
    pub sub: Uuid,
    /// Expiration Time (exp): timestamp after which the token is rejected.
    pub exp: usize,
    /// Issued At (iat): timestamp when the token was issued.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers take this as
/// an argument to gate write operations; its presence proves the request
/// carried a valid token for an existing user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The unique identifier of the user, mapped to public.users.id.
    pub id: Uuid,
    /// The user's handle, recorded as the author name on created posts.
    pub username: String,
}

/// authorize_mutation
///
/// The single ownership gate for update and delete: true iff the requesting
/// identity is the post's author. A mismatch is an ordinary `false`, not an
/// error; callers surface it as `ApiError::Forbidden`.
pub fn authorize_mutation(user: &AuthUser, post: &Post) -> bool {
    user.id == post.author_id
}

/// AuthUser Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AuthUser usable as a
/// function argument in any authenticated handler. Authentication stays in
/// the extractor; handlers only see the resolved identity.
///
/// The process:
/// 1. Dependency resolution: repository and AppConfig from application state.
/// 2. Local bypass: in Env::Local, the 'x-user-id' header may name a user.
/// 3. Token validation: Bearer token extraction and JWT decoding.
/// 4. DB lookup: the user named by the token must still exist.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        // Local development bypass: a known user id in the 'x-user-id'
        // header authenticates directly, guarded by the Env check. The id
        // must still resolve to a stored user.
        if config.env == Env::Local {
            if let Some(user_id_header) = parts.headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        if let Ok(Some(user)) = repo.get_user(user_id).await {
                            return Ok(AuthUser {
                                id: user.id,
                                username: user.username,
                            });
                        }
                    }
                }
            }
        }
        // In Production, or if the bypass failed, execution falls through to
        // the standard JWT validation flow.

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::default();
        // Expiration validation is always active.
        validation.validate_exp = true;

        // Every decode failure (expired, bad signature, malformed token)
        // collapses to the same 401 answer.
        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|_| ApiError::Unauthorized)?;

        // Final verification: a valid token for a user deleted since issue
        // time must not authenticate.
        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .map_err(|_| ApiError::Unauthorized)?
            .ok_or(ApiError::Unauthorized)?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
