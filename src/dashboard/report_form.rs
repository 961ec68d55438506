use super::in_flight::InFlight;
use super::toast::Toast;
use crate::api::ReportsApi;
use crate::models::{NewReport, ReportStatus};
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Location,
    Status,
}

/// Local state of the report creation form.
#[derive(Debug)]
pub struct CreateReportForm {
    pub title: String,
    pub description: String,
    pub location: String,
    pub status: String,
    pub is_submitting: bool,
}

impl Default for CreateReportForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            location: String::new(),
            status: ReportStatus::Open.as_str().to_string(),
            is_submitting: false,
        }
    }
}

/// What a submit attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub toast: Option<Toast>,
    /// The parent should reload its list.
    pub created: bool,
}

impl SubmitOutcome {
    fn ignored() -> Self {
        Self {
            toast: None,
            created: false,
        }
    }

    fn failed(message: &str) -> Self {
        Self {
            toast: Some(Toast::error(message)),
            created: false,
        }
    }
}

fn blank_to_none(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CreateReportForm {
    pub fn set(&mut self, field: FormField, value: &str) {
        let value = value.to_string();
        match field {
            FormField::Title => self.title = value,
            FormField::Description => self.description = value,
            FormField::Location => self.location = value,
            FormField::Status => self.status = value,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub async fn submit(&mut self, api: &ReportsApi, session: &Session) -> SubmitOutcome {
        if self.is_submitting {
            return SubmitOutcome::ignored();
        }
        if self.title.trim().is_empty() {
            return SubmitOutcome::failed("Title is required");
        }

        let input = NewReport {
            user_id: None,
            title: self.title.clone(),
            description: blank_to_none(&self.description),
            location: blank_to_none(&self.location),
            status: Some(self.status.clone()),
        };
        let result = {
            let _in_flight = InFlight::start(&mut self.is_submitting);
            api.create_report(session, input).await
        };

        match result {
            Ok(_) => {
                self.reset();
                SubmitOutcome {
                    toast: Some(Toast::success("Report created successfully")),
                    created: true,
                }
            }
            Err(_) => SubmitOutcome::failed("Failed to create report"),
        }
    }

    pub fn render(&self) -> String {
        format!(
            concat!(
                "Create New Report\n",
                "  title*:      {}\n",
                "  description: {}\n",
                "  location:    {}\n",
                "  status:      {}\n",
                "  [{}]\n",
            ),
            self.title,
            self.description,
            self.location,
            self.status,
            if self.is_submitting {
                "Creating..."
            } else {
                "Create Report"
            }
        )
    }
}
