use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::db::report_store::{ReportStore, StoreError};
use crate::models::{
    Comment, InsertComment, InsertReport, Profile, ProfileChanges, Report, ReportDetail,
    ReportStatus, UpsertProfile,
};
use crate::services::postgrest::{
    send_expect_row, send_request, PostgrestClient, MERGE_DUPLICATES, RETURN_REPRESENTATION,
};
use crate::services::supabase_auth;
use crate::session::{AuthUser, Session};

const REPORTS: &str = "reports";
const COMMENTS: &str = "comments";
const PROFILES: &str = "profiles";

const REPORT_SELECT: &str = "*,profiles(full_name)";
const REPORT_DETAIL_SELECT: &str = "*,profiles(full_name),comments(*,profiles(full_name))";
const COMMENT_SELECT: &str = "*,profiles(full_name)";

fn eq(id: Uuid) -> String {
    format!("eq.{id}")
}

pub struct PostgrestReportStore {
    pub client: PostgrestClient,
}

impl PostgrestReportStore {
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    async fn insert_row<B, T>(
        &self,
        session: &Session,
        table: &str,
        select: &str,
        prefer: &str,
        body: &B,
        entity: &str,
    ) -> Result<T, StoreError>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned + Send,
    {
        let request = self
            .client
            .table(session, Method::POST, table)
            .query(&[("select", select)])
            .header("Prefer", prefer)
            .json(body);
        send_expect_row(request, entity).await
    }

    async fn patch_row<B, T>(
        &self,
        session: &Session,
        table: &str,
        select: &str,
        id: Uuid,
        body: &B,
        entity: &str,
    ) -> Result<T, StoreError>
    where
        B: Serialize + Sync,
        T: serde::de::DeserializeOwned + Send,
    {
        let request = self
            .client
            .table(session, Method::PATCH, table)
            .query(&[("select", select.to_string()), ("id", eq(id))])
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body);
        send_expect_row(request, entity).await
    }

    async fn delete_row(
        &self,
        session: &Session,
        table: &str,
        id: Uuid,
        entity: &str,
    ) -> Result<(), StoreError> {
        // PostgREST answers 200 with an empty array when nothing matched.
        let request = self
            .client
            .table(session, Method::DELETE, table)
            .query(&[("select", "id".to_string()), ("id", eq(id))])
            .header("Prefer", RETURN_REPRESENTATION);
        send_expect_row::<serde_json::Value>(request, entity).await?;
        Ok(())
    }
}

#[async_trait]
impl ReportStore for PostgrestReportStore {
    async fn insert_report(
        &self,
        session: &Session,
        report: InsertReport,
    ) -> Result<Report, StoreError> {
        self.insert_row(
            session,
            REPORTS,
            REPORT_SELECT,
            RETURN_REPRESENTATION,
            &report,
            "report",
        )
        .await
    }

    async fn list_reports(&self, session: &Session) -> Result<Vec<Report>, StoreError> {
        let request = self
            .client
            .table(session, Method::GET, REPORTS)
            .query(&[("select", REPORT_SELECT), ("order", "created_at.desc")]);
        send_request(request).await
    }

    async fn find_report(&self, session: &Session, report_id: Uuid) -> Result<Report, StoreError> {
        let request = self
            .client
            .table(session, Method::GET, REPORTS)
            .query(&[("select", REPORT_SELECT.to_string()), ("id", eq(report_id))]);
        send_expect_row(request, "report").await
    }

    async fn find_report_detail(
        &self,
        session: &Session,
        report_id: Uuid,
    ) -> Result<ReportDetail, StoreError> {
        let request = self.client.table(session, Method::GET, REPORTS).query(&[
            ("select", REPORT_DETAIL_SELECT.to_string()),
            ("id", eq(report_id)),
            ("comments.order", "created_at.asc".to_string()),
        ]);
        send_expect_row(request, "report").await
    }

    async fn update_report_status(
        &self,
        session: &Session,
        report_id: Uuid,
        status: ReportStatus,
    ) -> Result<Report, StoreError> {
        self.patch_row(
            session,
            REPORTS,
            REPORT_SELECT,
            report_id,
            &json!({ "status": status }),
            "report",
        )
        .await
    }

    async fn delete_report(&self, session: &Session, report_id: Uuid) -> Result<(), StoreError> {
        self.delete_row(session, REPORTS, report_id, "report").await
    }

    async fn insert_comment(
        &self,
        session: &Session,
        comment: InsertComment,
    ) -> Result<Comment, StoreError> {
        self.insert_row(
            session,
            COMMENTS,
            COMMENT_SELECT,
            RETURN_REPRESENTATION,
            &comment,
            "comment",
        )
        .await
    }

    async fn list_comments(
        &self,
        session: &Session,
        report_id: Uuid,
    ) -> Result<Vec<Comment>, StoreError> {
        let request = self.client.table(session, Method::GET, COMMENTS).query(&[
            ("select", COMMENT_SELECT.to_string()),
            ("report_id", eq(report_id)),
            ("order", "created_at.asc".to_string()),
        ]);
        send_request(request).await
    }

    async fn update_comment(
        &self,
        session: &Session,
        comment_id: Uuid,
        content: String,
    ) -> Result<Comment, StoreError> {
        self.patch_row(
            session,
            COMMENTS,
            COMMENT_SELECT,
            comment_id,
            &json!({ "content": content }),
            "comment",
        )
        .await
    }

    async fn delete_comment(
        &self,
        session: &Session,
        comment_id: Uuid,
    ) -> Result<(), StoreError> {
        self.delete_row(session, COMMENTS, comment_id, "comment").await
    }

    async fn insert_profile(
        &self,
        session: &Session,
        profile: UpsertProfile,
    ) -> Result<Profile, StoreError> {
        self.insert_row(
            session,
            PROFILES,
            "*",
            RETURN_REPRESENTATION,
            &profile,
            "profile",
        )
        .await
    }

    async fn upsert_profile(
        &self,
        session: &Session,
        profile: UpsertProfile,
    ) -> Result<Profile, StoreError> {
        self.insert_row(session, PROFILES, "*", MERGE_DUPLICATES, &profile, "profile")
            .await
    }

    async fn find_profile(
        &self,
        session: &Session,
        profile_id: Uuid,
    ) -> Result<Profile, StoreError> {
        let request = self
            .client
            .table(session, Method::GET, PROFILES)
            .query(&[("select", "*".to_string()), ("id", eq(profile_id))]);
        send_expect_row(request, "profile").await
    }

    async fn update_profile(
        &self,
        session: &Session,
        profile_id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Profile, StoreError> {
        self.patch_row(session, PROFILES, "*", profile_id, &changes, "profile")
            .await
    }

    async fn current_user(&self, session: &Session) -> Result<AuthUser, StoreError> {
        supabase_auth::get_user(&self.client, session).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Client;

    const REPORT_ID: &str = "6a2f41a3-c54c-4ce8-92d2-0324e1c32e22";
    const USER_ID: &str = "8d7b1a52-0e4f-4c3e-9a7e-3f0d6c1b2a90";

    fn store(server: &httpmock::MockServer) -> PostgrestReportStore {
        PostgrestReportStore::new(PostgrestClient::new(
            Client::new(),
            server.url(""),
            "anon-key",
        ))
    }

    fn report_row(title: &str, status: &str, created_at: &str) -> serde_json::Value {
        json!({
            "id": REPORT_ID,
            "user_id": USER_ID,
            "title": title,
            "description": null,
            "location": null,
            "status": status,
            "created_at": created_at,
            "updated_at": created_at,
            "profiles": null
        })
    }

    fn report_id() -> Uuid {
        Uuid::parse_str(REPORT_ID).unwrap()
    }

    #[tokio::test]
    async fn list_reports_orders_newest_first_with_profile_join() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/v1/reports")
                .query_param("select", REPORT_SELECT)
                .query_param("order", "created_at.desc");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    json!([
                        report_row("Newer", "open", "2025-09-18T09:00:00+00:00"),
                        report_row("Older", "closed", "2025-09-17T09:00:00+00:00"),
                    ])
                    .to_string(),
                );
        });

        let reports = store(&server)
            .list_reports(&Session::anonymous())
            .await
            .expect("reports");

        mock.assert();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].title, "Newer");
        assert_eq!(reports[1].status, ReportStatus::Closed);
    }

    #[tokio::test]
    async fn insert_report_posts_row_and_asks_for_representation() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/rest/v1/reports")
                .header("Prefer", RETURN_REPRESENTATION)
                .json_body(json!({
                    "user_id": USER_ID,
                    "title": "Pothole",
                    "description": null,
                    "location": "Main St",
                    "status": "open"
                }));
            then.status(201)
                .header("content-type", "application/json")
                .body(
                    json!([report_row("Pothole", "open", "2025-09-18T09:00:00+00:00")])
                        .to_string(),
                );
        });

        let report = store(&server)
            .insert_report(
                &Session::anonymous(),
                InsertReport {
                    user_id: Uuid::parse_str(USER_ID).unwrap(),
                    title: "Pothole".into(),
                    description: None,
                    location: Some("Main St".into()),
                    status: ReportStatus::Open,
                },
            )
            .await
            .expect("report");

        mock.assert();
        assert_eq!(report.title, "Pothole");
    }

    #[tokio::test]
    async fn update_status_patches_by_id() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::PATCH)
                .path("/rest/v1/reports")
                .query_param("id", format!("eq.{REPORT_ID}"))
                .json_body(json!({ "status": "resolved" }));
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    json!([report_row("Pothole", "resolved", "2025-09-18T09:00:00+00:00")])
                        .to_string(),
                );
        });

        let report = store(&server)
            .update_report_status(&Session::anonymous(), report_id(), ReportStatus::Resolved)
            .await
            .expect("report");

        mock.assert();
        assert_eq!(report.status, ReportStatus::Resolved);
    }

    #[tokio::test]
    async fn deleting_missing_row_is_not_found() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::DELETE)
                .path("/rest/v1/comments")
                .query_param("id", format!("eq.{REPORT_ID}"));
            then.status(200)
                .header("content-type", "application/json")
                .body("[]");
        });

        let result = store(&server)
            .delete_comment(&Session::anonymous(), report_id())
            .await;

        mock.assert();
        match result {
            Err(err) => assert!(err.is_not_found()),
            Ok(()) => panic!("delete of a missing comment must fail"),
        }
    }

    #[tokio::test]
    async fn list_comments_filters_by_report_oldest_first() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/v1/comments")
                .query_param("report_id", format!("eq.{REPORT_ID}"))
                .query_param("order", "created_at.asc");
            then.status(200)
                .header("content-type", "application/json")
                .body(
                    json!([{
                        "id": "0b6f2c1e-3a49-4f0e-8d47-5b8d8a3f9c11",
                        "report_id": REPORT_ID,
                        "author": USER_ID,
                        "content": "seen it",
                        "created_at": "2025-09-18T10:00:00+00:00",
                        "profiles": { "full_name": "Ada" }
                    }])
                    .to_string(),
                );
        });

        let comments = store(&server)
            .list_comments(&Session::anonymous(), report_id())
            .await
            .expect("comments");

        mock.assert();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].author_name(), "Ada");
    }

    #[tokio::test]
    async fn report_detail_embeds_ordered_comments() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::GET)
                .path("/rest/v1/reports")
                .query_param("select", REPORT_DETAIL_SELECT)
                .query_param("comments.order", "created_at.asc");
            then.status(200)
                .header("content-type", "application/json")
                .body({
                    let mut row = report_row("Pothole", "open", "2025-09-18T09:00:00+00:00");
                    row["comments"] = json!([]);
                    json!([row]).to_string()
                });
        });

        let detail = store(&server)
            .find_report_detail(&Session::anonymous(), report_id())
            .await
            .expect("detail");

        mock.assert();
        assert_eq!(detail.report.title, "Pothole");
        assert!(detail.comments.is_empty());
    }

    #[tokio::test]
    async fn upsert_profile_merges_duplicates() {
        let server = httpmock::MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(httpmock::Method::POST)
                .path("/rest/v1/profiles")
                .header("Prefer", MERGE_DUPLICATES)
                .json_body(json!({ "id": USER_ID, "full_name": "Ada" }));
            then.status(201)
                .header("content-type", "application/json")
                .body(
                    json!([{
                        "id": USER_ID,
                        "full_name": "Ada",
                        "avatar_url": null,
                        "role": "user",
                        "created_at": "2025-09-18T10:00:00+00:00"
                    }])
                    .to_string(),
                );
        });

        let profile = store(&server)
            .upsert_profile(
                &Session::anonymous(),
                UpsertProfile {
                    id: Uuid::parse_str(USER_ID).unwrap(),
                    full_name: Some("Ada".into()),
                    avatar_url: None,
                },
            )
            .await
            .expect("profile");

        mock.assert();
        assert_eq!(profile.full_name.as_deref(), Some("Ada"));
        assert_eq!(profile.role, "user");
    }

    #[tokio::test]
    async fn row_level_security_violation_surfaces_backend_message() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::POST).path("/rest/v1/comments");
            then.status(403)
                .header("content-type", "application/json")
                .body(
                    json!({
                        "code": "42501",
                        "message": "new row violates row-level security policy for table \"comments\""
                    })
                    .to_string(),
                );
        });

        let result = store(&server)
            .insert_comment(
                &Session::anonymous(),
                InsertComment {
                    report_id: report_id(),
                    author: Uuid::parse_str(USER_ID).unwrap(),
                    content: "hi".into(),
                },
            )
            .await;

        match result {
            Err(err) => {
                assert!(!err.is_not_found());
                assert!(err.backend_message().contains("row-level security"));
            }
            Ok(_) => panic!("expected row level security failure"),
        }
    }
}
