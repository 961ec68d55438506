pub mod comment;
pub mod profile;
pub mod report;

pub use comment::{Comment, InsertComment, NewComment};
pub use profile::{Profile, ProfileChanges, ProfileInput, ProfileSummary, UpsertProfile};
pub use report::{InsertReport, NewReport, Report, ReportDetail, ReportStatus};

use uuid::Uuid;

/// Joined full name when the profile has one, else `User <id prefix>`.
pub fn display_name(profile: Option<&ProfileSummary>, id: Uuid) -> String {
    profile
        .and_then(|p| p.full_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("User {}", &id.to_string()[..8]))
}
