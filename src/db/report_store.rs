use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Comment, InsertComment, InsertReport, Profile, ProfileChanges, Report, ReportDetail,
    ReportStatus, UpsertProfile,
};
use crate::session::{AuthUser, Session};

/// PostgREST code for "JSON object requested, multiple (or no) rows returned".
pub const NO_ROWS_CODE: &str = "PGRST116";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store responded with status {status}: {message}")]
    Api {
        status: StatusCode,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },
    #[error("store returned an invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("no active session")]
    Unauthenticated,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound(_) => true,
            StoreError::Api { code, .. } => code.as_deref() == Some(NO_ROWS_CODE),
            _ => false,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        match self {
            StoreError::Unauthenticated => true,
            StoreError::Api { status, .. } => *status == StatusCode::UNAUTHORIZED,
            _ => false,
        }
    }

    /// Message as the backend phrased it, without our prefix.
    pub fn backend_message(&self) -> String {
        match self {
            StoreError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Table-level access to `reports`, `comments` and `profiles`.
///
/// Each method is exactly one round trip to the store. Methods returning a
/// single row fail with a not-found error (see [`StoreError::is_not_found`])
/// when the filter matched nothing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert_report(
        &self,
        session: &Session,
        report: InsertReport,
    ) -> Result<Report, StoreError>;

    /// Every report, newest first.
    async fn list_reports(&self, session: &Session) -> Result<Vec<Report>, StoreError>;

    async fn find_report(&self, session: &Session, report_id: Uuid) -> Result<Report, StoreError>;

    async fn find_report_detail(
        &self,
        session: &Session,
        report_id: Uuid,
    ) -> Result<ReportDetail, StoreError>;

    async fn update_report_status(
        &self,
        session: &Session,
        report_id: Uuid,
        status: ReportStatus,
    ) -> Result<Report, StoreError>;

    async fn delete_report(&self, session: &Session, report_id: Uuid) -> Result<(), StoreError>;

    async fn insert_comment(
        &self,
        session: &Session,
        comment: InsertComment,
    ) -> Result<Comment, StoreError>;

    /// Comments on one report, oldest first.
    async fn list_comments(
        &self,
        session: &Session,
        report_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError>;

    async fn update_comment(
        &self,
        session: &Session,
        comment_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError>;

    async fn delete_comment(&self, session: &Session, comment_id: Uuid)
        -> Result<(), StoreError>;

    async fn insert_profile(
        &self,
        session: &Session,
        profile: UpsertProfile,
    ) -> Result<Profile, StoreError>;

    async fn upsert_profile(
        &self,
        session: &Session,
        profile: UpsertProfile,
    ) -> Result<Profile, StoreError>;

    async fn find_profile(&self, session: &Session, profile_id: Uuid)
        -> Result<Profile, StoreError>;

    async fn update_profile(
        &self,
        session: &Session,
        profile_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Profile, StoreError>;

    /// Resolves the identity behind the session.
    async fn current_user(&self, session: &Session) -> Result<AuthUser, StoreError>;
}
