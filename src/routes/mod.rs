/// Router Module Index
///
/// Organizes the application's routing logic into security-segregated
/// modules, so access control is applied explicitly at the module level
/// (via Axum layers) rather than per handler.

/// Routes accessible to all users (anonymous, read-only).
pub mod public;

/// Routes protected by the `AuthUser` extractor middleware.
/// Requires a validated token (or the local development bypass).
pub mod authenticated;
