use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::comment::Comment;
use super::profile::ProfileSummary;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")] // matches the `status` check constraint on `reports`
pub enum ReportStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl ReportStatus {
    pub const ALL: [ReportStatus; 4] = [
        ReportStatus::Open,
        ReportStatus::InProgress,
        ReportStatus::Resolved,
        ReportStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "open",
            ReportStatus::InProgress => "in_progress",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Closed => "closed",
        }
    }

    /// Human readable label, `in_progress` becomes `in progress`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid status '{}', expected one of: open, in_progress, resolved, closed",
            self.0
        )
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for ReportStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ReportStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| UnknownStatus(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: ReportStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default, rename = "profiles", skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileSummary>,
}

impl Report {
    pub fn author_name(&self) -> String {
        super::display_name(self.profile.as_ref(), self.user_id)
    }
}

/// Report together with its comment thread, oldest comment first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: Report,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

/// Raw input from the creation form or the CLI. Validated by the api layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewReport {
    pub user_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: Option<String>,
}

/// Row inserted into `reports` once the input has been validated.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InsertReport {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: ReportStatus,
}
