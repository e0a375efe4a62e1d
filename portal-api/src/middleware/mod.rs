/// Middleware modules for the API server
///
/// - `security`: security headers on every response
///
/// Authentication lives in `portal_shared::auth::middleware` and is wired
/// per route group in `app.rs`.

pub mod security;
