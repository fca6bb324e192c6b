//! Admin authorization rule
//!
//! Every path that loads or mutates protected data goes through
//! [`authorize_admin`]. The backend only signs in admins, so any present
//! session is accepted unless it explicitly says otherwise.

use tracing::warn;

use crate::error::AuthError;
use crate::model::Session;
use crate::service::SessionService;

/// Allow a signed-in session that is not explicitly marked non-admin
pub fn authorize_admin(session: Option<&Session>) -> Result<&Session, AuthError> {
    match session {
        None => Err(AuthError::NoSession),
        Some(s) if s.is_admin() => Ok(s),
        Some(s) => {
            warn!(user = %s.username, "Rejected non-admin session");
            Err(AuthError::NotAdmin(s.username.clone()))
        }
    }
}

/// Run the session check and apply [`authorize_admin`]
pub async fn require_admin<S: SessionService>(service: &S) -> Result<Session, AuthError> {
    match service.current_session().await? {
        Some(session) => {
            authorize_admin(Some(&session))?;
            Ok(session)
        }
        None => Err(AuthError::NoSession),
    }
}
