//! Global application state.
//!
//! Used for access to common resources such as the database pool.

use super::database::{DbPool, ServerVersion};
use axum::extract::FromRef;

/// Global application state.
///
/// Handlers take the individual parts through [`FromRef`].
#[derive(Clone, Debug, FromRef)]
pub struct AppState {
    db: DbPool,
    version_override: Option<ServerVersion>,
}

impl AppState {
    /// Constructs a new [`AppState`].
    pub fn new(db: DbPool, version_override: Option<ServerVersion>) -> Self {
        Self {
            db,
            version_override,
        }
    }
}
