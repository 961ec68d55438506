use time::macros::format_description;
use uuid::Uuid;

use super::in_flight::InFlight;
use super::toast::Toast;
use crate::api::ReportsApi;
use crate::models::{Comment, NewComment};
use crate::session::Session;

/// What a comment submit attempt produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentOutcome {
    /// In display order.
    pub toasts: Vec<Toast>,
    pub posted: bool,
}

impl CommentOutcome {
    fn failed(message: &str) -> Self {
        Self {
            toasts: vec![Toast::error(message)],
            posted: false,
        }
    }
}

/// Comment thread for one report.
///
/// Reloads the whole thread after every successful submission rather than
/// appending locally.
#[derive(Debug)]
pub struct CommentThread {
    pub report_id: Uuid,
    pub report_title: String,
    pub comments: Vec<Comment>,
    pub draft: String,
    pub is_loading: bool,
    pub is_submitting: bool,
}

impl CommentThread {
    pub fn new(report_id: Uuid, report_title: impl Into<String>) -> Self {
        Self {
            report_id,
            report_title: report_title.into(),
            comments: Vec::new(),
            draft: String::new(),
            is_loading: true,
            is_submitting: false,
        }
    }

    pub async fn load(&mut self, api: &ReportsApi, session: &Session) -> Option<Toast> {
        self.is_loading = true;
        let result = api
            .get_comments_by_report(session, &self.report_id.to_string())
            .await;
        self.is_loading = false;
        match result {
            Ok(comments) => {
                self.comments = comments;
                None
            }
            Err(_) => Some(Toast::error("Failed to load comments")),
        }
    }

    /// Posts the draft, then reloads the thread.
    pub async fn submit(&mut self, api: &ReportsApi, session: &Session) -> CommentOutcome {
        if self.is_submitting {
            return CommentOutcome::default();
        }
        if self.draft.trim().is_empty() {
            return CommentOutcome::failed("Comment cannot be empty");
        }

        let input = NewComment {
            report_id: self.report_id.to_string(),
            author: None,
            content: self.draft.clone(),
        };
        let result = {
            let _in_flight = InFlight::start(&mut self.is_submitting);
            api.add_comment(session, input).await
        };

        match result {
            Ok(_) => {
                self.draft.clear();
                let mut toasts = vec![Toast::success("Comment added successfully")];
                toasts.extend(self.load(api, session).await);
                CommentOutcome {
                    toasts,
                    posted: true,
                }
            }
            Err(_) => CommentOutcome::failed("Failed to add comment"),
        }
    }

    pub fn render(&self) -> String {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute]");
        let mut out = format!("Comments for: {}\n", self.report_title);
        if self.is_loading {
            out.push_str("  Loading comments...\n");
            return out;
        }
        if self.comments.is_empty() {
            out.push_str("  No comments yet. Be the first to comment!\n");
            return out;
        }
        for comment in &self.comments {
            let when = comment
                .created_at
                .format(format)
                .unwrap_or_else(|_| comment.created_at.to_string());
            out.push_str(&format!(
                "  {}  {}\n    {}\n",
                comment.author_name(),
                when,
                comment.content
            ));
        }
        out
    }
}
