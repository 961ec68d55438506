use uuid::Uuid;

use super::ApiError;
use crate::models::ReportStatus;
use crate::session::Session;

pub fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn parse_id(field: &str, raw: &str) -> Result<Uuid, ApiError> {
    let trimmed = required_text(field, raw)?;
    Uuid::parse_str(&trimmed)
        .map_err(|_| ApiError::Validation(format!("{field} must be a valid id")))
}

pub fn parse_status(raw: &str) -> Result<ReportStatus, ApiError> {
    raw.parse::<ReportStatus>()
        .map_err(|err| ApiError::Validation(err.to_string()))
}

/// Explicit id when one was given, otherwise the session's user.
pub fn resolve_identity(
    field: &str,
    explicit: Option<&str>,
    session: &Session,
) -> Result<Uuid, ApiError> {
    match explicit.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => parse_id(field, raw),
        None => session
            .user_id
            .ok_or_else(|| ApiError::Validation(format!("{field} is required"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(required_text("title", "  Pothole ").unwrap(), "Pothole");
        match required_text("title", " \t\n") {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "title is required"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(optional_text(Some("  ".into())), None);
        assert_eq!(optional_text(Some(" Main St ".into())), Some("Main St".into()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn parse_id_distinguishes_missing_from_malformed() {
        match parse_id("report id", "") {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "report id is required"),
            other => panic!("unexpected result: {other:?}"),
        }
        match parse_id("report id", "temp-user-id") {
            Err(ApiError::Validation(msg)) => assert_eq!(msg, "report id must be a valid id"),
            other => panic!("unexpected result: {other:?}"),
        }
        let id = Uuid::new_v4();
        assert_eq!(parse_id("report id", &format!(" {id} ")).unwrap(), id);
    }

    #[test]
    fn identity_prefers_explicit_value_then_session() {
        let session_user = Uuid::new_v4();
        let explicit = Uuid::new_v4();
        let session = Session::for_user(session_user);

        assert_eq!(
            resolve_identity("user id", Some(&explicit.to_string()), &session).unwrap(),
            explicit
        );
        assert_eq!(
            resolve_identity("user id", Some("  "), &session).unwrap(),
            session_user
        );
        assert!(resolve_identity("user id", None, &Session::anonymous())
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn parse_status_reports_allowed_values() {
        assert_eq!(parse_status("closed").unwrap(), ReportStatus::Closed);
        match parse_status("done") {
            Err(ApiError::Validation(msg)) => assert!(msg.contains("open, in_progress")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
