use axum::{Json, http::StatusCode, response::IntoResponse};

/// ApiError
///
/// The application's error kinds, mapped one-to-one onto HTTP statuses:
/// - `NotFound` — unknown username or post id (404).
/// - `Unauthorized` — no valid authenticated identity on a write path (401).
/// - `Forbidden` — authenticated, but not the owning author (403).
/// - `Database` — the persistence layer failed (500, details logged only).
///
/// Handlers return `Result<_, ApiError>`; the `IntoResponse` impl turns the
/// error into a JSON body of the shape `{ "error": "..." }`.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Unauthorized,
    Forbidden,
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(value: sqlx::Error) -> Self {
        ApiError::Database(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "resource not found"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "authentication required"),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "you are not the author of this post"),
            ApiError::Database(err) => {
                // The caller only ever sees a generic message; the underlying
                // database error stays in the logs.
                tracing::error!("database error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
