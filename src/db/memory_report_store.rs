use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use reqwest::StatusCode;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::db::report_store::{ReportStore, StoreError};
use crate::models::profile::DEFAULT_PROFILE_ROLE;
use crate::models::{
    Comment, InsertComment, InsertReport, Profile, ProfileChanges, ProfileSummary, Report,
    ReportDetail, ReportStatus, UpsertProfile,
};
use crate::session::{AuthUser, Session};

#[derive(Default)]
struct Tables {
    reports: Vec<Report>,
    comments: Vec<Comment>,
    profiles: Vec<Profile>,
    last_timestamp: Option<OffsetDateTime>,
    fail_next: Option<String>,
}

impl Tables {
    /// Strictly increasing so rows created back to back still order.
    fn now(&mut self) -> OffsetDateTime {
        let mut now = OffsetDateTime::now_utc();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }

    fn summary(&self, user_id: Uuid) -> Option<ProfileSummary> {
        self.profiles
            .iter()
            .find(|p| p.id == user_id)
            .map(|p| ProfileSummary {
                full_name: p.full_name.clone(),
            })
    }

    fn joined_report(&self, report: &Report) -> Report {
        Report {
            profile: self.summary(report.user_id),
            ..report.clone()
        }
    }

    fn joined_comment(&self, comment: &Comment) -> Comment {
        Comment {
            profile: self.summary(comment.author),
            ..comment.clone()
        }
    }

    fn comments_for(&self, report_id: Uuid) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|c| c.report_id == report_id)
            .map(|c| self.joined_comment(c))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        comments
    }
}

fn constraint_violation(code: &str, message: String) -> StoreError {
    StoreError::Api {
        status: StatusCode::CONFLICT,
        message,
        code: Some(code.to_string()),
        details: None,
        hint: None,
    }
}

/// Process-local stand-in for the hosted store.
///
/// Mirrors the schema's behavior that matters to callers: generated ids and
/// timestamps, the profile join, foreign keys from comments to reports and
/// the `on delete cascade` of comments.
#[derive(Default)]
pub struct InMemoryReportStore {
    tables: Mutex<Tables>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next store call fail with the given backend message.
    pub fn fail_next(&self, message: &str) {
        self.lock().fail_next = Some(message.to_string());
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn begin(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        let mut tables = self.lock();
        if let Some(message) = tables.fail_next.take() {
            return Err(StoreError::Api {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message,
                code: None,
                details: None,
                hint: None,
            });
        }
        Ok(tables)
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert_report(
        &self,
        _session: &Session,
        report: InsertReport,
    ) -> Result<Report, StoreError> {
        let mut tables = self.begin()?;
        let now = tables.now();
        let row = Report {
            id: Uuid::new_v4(),
            user_id: report.user_id,
            title: report.title,
            description: report.description,
            location: report.location,
            status: report.status,
            created_at: now,
            updated_at: now,
            profile: None,
        };
        tables.reports.push(row.clone());
        Ok(tables.joined_report(&row))
    }

    async fn list_reports(&self, _session: &Session) -> Result<Vec<Report>, StoreError> {
        let tables = self.begin()?;
        let mut reports: Vec<Report> = tables
            .reports
            .iter()
            .map(|r| tables.joined_report(r))
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn find_report(&self, _session: &Session, report_id: Uuid) -> Result<Report, StoreError> {
        let tables = self.begin()?;
        tables
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .map(|r| tables.joined_report(r))
            .ok_or_else(|| StoreError::NotFound("report".into()))
    }

    async fn find_report_detail(
        &self,
        _session: &Session,
        report_id: Uuid,
    ) -> Result<ReportDetail, StoreError> {
        let tables = self.begin()?;
        let report = tables
            .reports
            .iter()
            .find(|r| r.id == report_id)
            .map(|r| tables.joined_report(r))
            .ok_or_else(|| StoreError::NotFound("report".into()))?;
        let comments = tables.comments_for(report_id);
        Ok(ReportDetail { report, comments })
    }

    async fn update_report_status(
        &self,
        _session: &Session,
        report_id: Uuid,
        status: ReportStatus,
    ) -> Result<Report, StoreError> {
        let mut tables = self.begin()?;
        let now = tables.now();
        let row = tables
            .reports
            .iter_mut()
            .find(|r| r.id == report_id)
            .ok_or_else(|| StoreError::NotFound("report".into()))?;
        row.status = status;
        row.updated_at = now;
        let row = row.clone();
        Ok(tables.joined_report(&row))
    }

    async fn delete_report(&self, _session: &Session, report_id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.begin()?;
        let before = tables.reports.len();
        tables.reports.retain(|r| r.id != report_id);
        if tables.reports.len() == before {
            return Err(StoreError::NotFound("report".into()));
        }
        tables.comments.retain(|c| c.report_id != report_id);
        Ok(())
    }

    async fn insert_comment(
        &self,
        _session: &Session,
        comment: InsertComment,
    ) -> Result<Comment, StoreError> {
        let mut tables = self.begin()?;
        if !tables.reports.iter().any(|r| r.id == comment.report_id) {
            return Err(constraint_violation(
                "23503",
                "insert or update on table \"comments\" violates foreign key constraint \"comments_report_id_fkey\""
                    .into(),
            ));
        }
        let row = Comment {
            id: Uuid::new_v4(),
            report_id: comment.report_id,
            author: comment.author,
            content: comment.content,
            created_at: tables.now(),
            profile: None,
        };
        tables.comments.push(row.clone());
        Ok(tables.joined_comment(&row))
    }

    async fn list_comments(
        &self,
        _session: &Session,
        report_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError> {
        let tables = self.begin()?;
        Ok(tables.comments_for(report_id))
    }

    async fn update_comment(
        &self,
        _session: &Session,
        comment_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError> {
        let mut tables = self.begin()?;
        let row = tables
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| StoreError::NotFound("comment".into()))?;
        row.content = content;
        let row = row.clone();
        Ok(tables.joined_comment(&row))
    }

    async fn delete_comment(
        &self,
        _session: &Session,
        comment_id: Uuid,
    ) -> Result<(), StoreError> {
        let mut tables = self.begin()?;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != comment_id);
        if tables.comments.len() == before {
            return Err(StoreError::NotFound("comment".into()));
        }
        Ok(())
    }

    async fn insert_profile(
        &self,
        _session: &Session,
        profile: UpsertProfile,
    ) -> Result<Profile, StoreError> {
        let mut tables = self.begin()?;
        if tables.profiles.iter().any(|p| p.id == profile.id) {
            return Err(constraint_violation(
                "23505",
                "duplicate key value violates unique constraint \"profiles_pkey\"".into(),
            ));
        }
        let row = Profile {
            id: profile.id,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            role: DEFAULT_PROFILE_ROLE.to_string(),
            created_at: tables.now(),
        };
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn upsert_profile(
        &self,
        _session: &Session,
        profile: UpsertProfile,
    ) -> Result<Profile, StoreError> {
        let mut tables = self.begin()?;
        if let Some(existing) = tables.profiles.iter_mut().find(|p| p.id == profile.id) {
            if profile.full_name.is_some() {
                existing.full_name = profile.full_name;
            }
            if profile.avatar_url.is_some() {
                existing.avatar_url = profile.avatar_url;
            }
            return Ok(existing.clone());
        }
        let row = Profile {
            id: profile.id,
            full_name: profile.full_name,
            avatar_url: profile.avatar_url,
            role: DEFAULT_PROFILE_ROLE.to_string(),
            created_at: tables.now(),
        };
        tables.profiles.push(row.clone());
        Ok(row)
    }

    async fn find_profile(
        &self,
        _session: &Session,
        profile_id: Uuid,
    ) -> Result<Profile, StoreError> {
        let tables = self.begin()?;
        tables
            .profiles
            .iter()
            .find(|p| p.id == profile_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("profile".into()))
    }

    async fn update_profile(
        &self,
        _session: &Session,
        profile_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Profile, StoreError> {
        let mut tables = self.begin()?;
        let row = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
            .ok_or_else(|| StoreError::NotFound("profile".into()))?;
        if let Some(full_name) = changes.full_name {
            row.full_name = Some(full_name);
        }
        if let Some(avatar_url) = changes.avatar_url {
            row.avatar_url = Some(avatar_url);
        }
        Ok(row.clone())
    }

    async fn current_user(&self, session: &Session) -> Result<AuthUser, StoreError> {
        drop(self.begin()?);
        session
            .user_id
            .map(|id| AuthUser { id, email: None })
            .ok_or(StoreError::Unauthenticated)
    }
}
