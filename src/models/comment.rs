use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::profile::ProfileSummary;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Comment {
    pub id: Uuid,
    pub report_id: Uuid,
    pub author: Uuid,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
}

impl Comment {
    pub fn author_name(&self) -> String {
        super::display_name(self.profile.as_ref(), self.author)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    pub report_id: String,
    pub author: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InsertComment {
    pub report_id: Uuid,
    pub author: Uuid,
    pub content: String,
}
