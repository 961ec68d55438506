use reqwest::Method;
use tracing::warn;

use crate::db::report_store::StoreError;
use crate::services::postgrest::{send_request, PostgrestClient};
use crate::session::{AuthUser, Session};

/// Asks the auth service who owns the session's access token.
pub async fn get_user(client: &PostgrestClient, session: &Session) -> Result<AuthUser, StoreError> {
    if session.access_token.is_none() {
        return Err(StoreError::Unauthenticated);
    }

    match send_request::<AuthUser>(client.auth(session, Method::GET, "user")).await {
        Ok(user) => Ok(user),
        Err(err) if err.is_unauthenticated() => {
            warn!(error = %err, "auth service rejected the session token");
            Err(StoreError::Unauthenticated)
        }
        Err(err) => Err(err),
    }
}
