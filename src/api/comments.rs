use tracing::info;

use super::validation::{parse_id, required_text, resolve_identity};
use super::{store_failure, ApiError, ReportsApi};
use crate::models::{Comment, InsertComment, NewComment};
use crate::session::Session;

impl ReportsApi {
    pub async fn add_comment(
        &self,
        session: &Session,
        input: NewComment,
    ) -> Result<Comment, ApiError> {
        let content = required_text("content", &input.content)?;
        let report_id = parse_id("report id", &input.report_id)?;
        let author = resolve_identity("author", input.author.as_deref(), session)?;

        let comment = self
            .store
            .insert_comment(
                session,
                InsertComment {
                    report_id,
                    author,
                    content,
                },
            )
            .await
            .map_err(|err| store_failure("add_comment", "comment", err))?;
        info!(comment_id = %comment.id, %report_id, "comment added");
        Ok(comment)
    }

    /// Thread for one report, oldest first.
    pub async fn get_comments_by_report(
        &self,
        session: &Session,
        report_id: &str,
    ) -> Result<Vec<Comment>, ApiError> {
        let report_id = parse_id("report id", report_id)?;
        self.store
            .list_comments(session, report_id)
            .await
            .map_err(|err| store_failure("get_comments_by_report", "comments", err))
    }

    pub async fn update_comment(
        &self,
        session: &Session,
        comment_id: &str,
        content: &str,
    ) -> Result<Comment, ApiError> {
        let comment_id = parse_id("comment id", comment_id)?;
        let content = required_text("content", content)?;

        let comment = self
            .store
            .update_comment(session, comment_id, content)
            .await
            .map_err(|err| store_failure("update_comment", "comment", err))?;
        info!(%comment_id, "comment updated");
        Ok(comment)
    }

    pub async fn delete_comment(
        &self,
        session: &Session,
        comment_id: &str,
    ) -> Result<bool, ApiError> {
        let comment_id = parse_id("comment id", comment_id)?;
        self.store
            .delete_comment(session, comment_id)
            .await
            .map_err(|err| store_failure("delete_comment", "comment", err))?;
        info!(%comment_id, "comment deleted");
        Ok(true)
    }
}
