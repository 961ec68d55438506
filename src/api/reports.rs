use tracing::info;

use super::validation::{optional_text, parse_id, parse_status, required_text, resolve_identity};
use super::{store_failure, ApiError, ReportsApi};
use crate::models::{InsertReport, NewReport, Report, ReportDetail, ReportStatus};
use crate::session::Session;

impl ReportsApi {
    pub async fn create_report(
        &self,
        session: &Session,
        input: NewReport,
    ) -> Result<Report, ApiError> {
        let title = required_text("title", &input.title)?;
        let user_id = resolve_identity("user id", input.user_id.as_deref(), session)?;
        let status = match input.status.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => parse_status(raw)?,
            _ => ReportStatus::default(),
        };

        let row = InsertReport {
            user_id,
            title,
            description: optional_text(input.description),
            location: optional_text(input.location),
            status,
        };

        let report = self
            .store
            .insert_report(session, row)
            .await
            .map_err(|err| store_failure("create_report", "report", err))?;
        info!(report_id = %report.id, %user_id, "report created");
        Ok(report)
    }

    /// All reports, newest first.
    pub async fn list_reports(&self, session: &Session) -> Result<Vec<Report>, ApiError> {
        self.store
            .list_reports(session)
            .await
            .map_err(|err| store_failure("list_reports", "reports", err))
    }

    pub async fn get_report(&self, session: &Session, report_id: &str) -> Result<Report, ApiError> {
        let report_id = parse_id("report id", report_id)?;
        self.store
            .find_report(session, report_id)
            .await
            .map_err(|err| store_failure("get_report", "report", err))
    }

    /// Report plus its comment thread in one round trip.
    pub async fn get_report_detail(
        &self,
        session: &Session,
        report_id: &str,
    ) -> Result<ReportDetail, ApiError> {
        let report_id = parse_id("report id", report_id)?;
        self.store
            .find_report_detail(session, report_id)
            .await
            .map_err(|err| store_failure("get_report_detail", "report", err))
    }

    pub async fn update_report_status(
        &self,
        session: &Session,
        report_id: &str,
        status: &str,
    ) -> Result<Report, ApiError> {
        let report_id = parse_id("report id", report_id)?;
        let status = parse_status(&required_text("status", status)?)?;

        let report = self
            .store
            .update_report_status(session, report_id, status)
            .await
            .map_err(|err| store_failure("update_report_status", "report", err))?;
        info!(%report_id, %status, "report status updated");
        Ok(report)
    }

    /// Comments are removed by the store's cascade, not here.
    pub async fn delete_report(
        &self,
        session: &Session,
        report_id: &str,
    ) -> Result<bool, ApiError> {
        let report_id = parse_id("report id", report_id)?;
        self.store
            .delete_report(session, report_id)
            .await
            .map_err(|err| store_failure("delete_report", "report", err))?;
        info!(%report_id, "report deleted");
        Ok(true)
    }
}
