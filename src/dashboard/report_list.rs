use super::report_card::ReportCard;
use super::toast::Toast;
use crate::api::ReportsApi;
use crate::models::Report;
use crate::session::Session;
use uuid::Uuid;

/// Report collection as the list tab shows it, in the order the
/// data-access layer returned it.
#[derive(Debug, Default)]
pub struct ReportListView {
    pub reports: Vec<Report>,
    pub is_loading: bool,
}

impl ReportListView {
    pub fn new() -> Self {
        Self {
            reports: Vec::new(),
            is_loading: true,
        }
    }

    /// Full reload. Returns a toast only on failure.
    pub async fn load(&mut self, api: &ReportsApi, session: &Session) -> Option<Toast> {
        self.is_loading = true;
        let result = api.list_reports(session).await;
        self.is_loading = false;
        match result {
            Ok(reports) => {
                self.reports = reports;
                None
            }
            Err(_) => Some(Toast::error("Failed to load reports")),
        }
    }

    pub fn find(&self, report_id: &str) -> Option<&Report> {
        let wanted = Uuid::parse_str(report_id.trim()).ok()?;
        self.reports.iter().find(|report| report.id == wanted)
    }

    /// 1-based position, as printed on the cards.
    pub fn get(&self, position: usize) -> Option<&Report> {
        position
            .checked_sub(1)
            .and_then(|index| self.reports.get(index))
    }

    pub fn render(&self) -> String {
        if self.is_loading {
            return "Loading reports...\n".to_string();
        }
        if self.reports.is_empty() {
            return "No reports found. Use `tab create` to create the first report.\n".to_string();
        }
        let mut out = format!("All Reports ({})\n", self.reports.len());
        for (index, report) in self.reports.iter().enumerate() {
            out.push_str(&ReportCard::new(report).render(index + 1));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReportStatus;
    use time::OffsetDateTime;

    fn report(id: Uuid) -> Report {
        let now = OffsetDateTime::now_utc();
        Report {
            id,
            user_id: Uuid::new_v4(),
            title: "Pothole".into(),
            description: None,
            location: None,
            status: ReportStatus::Open,
            created_at: now,
            updated_at: now,
            profile: None,
        }
    }

    #[test]
    fn find_accepts_any_uuid_spelling() {
        let id = Uuid::new_v4();
        let list = ReportListView {
            reports: vec![report(id)],
            is_loading: false,
        };

        let upper = id.to_string().to_uppercase();
        let braced = format!("{{{id}}}");
        for spelling in [id.to_string(), upper, braced, format!("  {id} ")] {
            assert_eq!(list.find(&spelling).map(|r| r.id), Some(id), "{spelling}");
        }
        assert!(list.find("not-an-id").is_none());
        assert!(list.find(&Uuid::new_v4().to_string()).is_none());
    }
}
