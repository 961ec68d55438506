use serde::Deserialize;
use uuid::Uuid;

/// Identity as reported by the backend's auth endpoint.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Caller identity passed into every data-access call.
///
/// The access token, when present, is forwarded to the store so row level
/// security evaluates against the signed-in user. Without one, requests go
/// out with the public anon key only.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: Option<Uuid>,
    pub access_token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: Uuid) -> Self {
        Self {
            user_id: Some(user_id),
            access_token: None,
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        let trimmed = token.trim();
        self.access_token = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() || self.user_id.is_some()
    }
}
