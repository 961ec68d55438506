use time::macros::format_description;

use crate::models::Report;

/// One report rendered as a card in the list.
pub struct ReportCard<'a> {
    pub report: &'a Report,
}

impl<'a> ReportCard<'a> {
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    pub fn created_on(&self) -> String {
        let format = format_description!("[year]-[month]-[day]");
        self.report
            .created_at
            .format(format)
            .unwrap_or_else(|_| self.report.created_at.to_string())
    }

    /// Card body; `index` is the handle the shell uses to open comments.
    pub fn render(&self, index: usize) -> String {
        let report = self.report;
        let mut out = format!(
            "[{}] {}  ({})\n",
            index,
            report.title,
            report.status.label()
        );
        if let Some(description) = report.description.as_deref() {
            out.push_str(&format!("    {}\n", description));
        }
        if let Some(location) = report.location.as_deref() {
            out.push_str(&format!("    at {}\n", location));
        }
        out.push_str(&format!(
            "    {} by {}  id {}\n",
            self.created_on(),
            report.author_name(),
            report.id
        ));
        out
    }
}
