use super::comments::CommentThread;
use super::report_form::CreateReportForm;
use super::report_list::ReportListView;
use super::toast::Toast;
use crate::api::ReportsApi;
use crate::session::Session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Reports,
    Create,
}

/// What is on screen. A selected report replaces the tabs entirely.
#[derive(Debug)]
pub enum View<'a> {
    Comments(&'a CommentThread),
    Tabs(Tab),
}

/// Page composition: owns the child views and the single "report selected
/// for comments" value.
pub struct Dashboard {
    api: ReportsApi,
    session: Session,
    pub list: ReportListView,
    pub form: CreateReportForm,
    pub selected: Option<CommentThread>,
    pub tab: Tab,
    toasts: Vec<Toast>,
}

impl Dashboard {
    pub fn new(api: ReportsApi, session: Session) -> Self {
        Self {
            api,
            session,
            list: ReportListView::new(),
            form: CreateReportForm::default(),
            selected: None,
            tab: Tab::default(),
            toasts: Vec::new(),
        }
    }

    pub fn view(&self) -> View<'_> {
        match &self.selected {
            Some(thread) => View::Comments(thread),
            None => View::Tabs(self.tab),
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub async fn load_reports(&mut self) {
        let toast = self.list.load(&self.api, &self.session).await;
        self.toasts.extend(toast);
    }

    /// Submits the creation form and reloads the list when a report was made.
    pub async fn submit_report(&mut self) -> bool {
        let outcome = self.form.submit(&self.api, &self.session).await;
        self.toasts.extend(outcome.toast);
        if outcome.created {
            self.load_reports().await;
        }
        outcome.created
    }

    /// Opens the thread for a report currently in the list. Unknown ids are
    /// ignored and leave the view unchanged.
    pub async fn view_comments(&mut self, report_id: &str) -> bool {
        let Some(report) = self.list.find(report_id) else {
            return false;
        };
        let mut thread = CommentThread::new(report.id, report.title.clone());
        let toast = thread.load(&self.api, &self.session).await;
        self.toasts.extend(toast);
        self.selected = Some(thread);
        true
    }

    pub fn close_comments(&mut self) {
        self.selected = None;
    }

    /// Posts `content` to the open thread; no-op when no thread is open.
    pub async fn submit_comment(&mut self, content: &str) -> bool {
        let Some(thread) = self.selected.as_mut() else {
            return false;
        };
        thread.draft = content.to_string();
        let outcome = thread.submit(&self.api, &self.session).await;
        self.toasts.extend(outcome.toasts);
        outcome.posted
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    pub fn render(&self) -> String {
        match self.view() {
            View::Comments(thread) => thread.render(),
            View::Tabs(tab) => {
                let (reports, create) = match tab {
                    Tab::Reports => ("[All Reports]", " Create Report "),
                    Tab::Create => (" All Reports ", "[Create Report]"),
                };
                let body = match tab {
                    Tab::Reports => self.list.render(),
                    Tab::Create => self.form.render(),
                };
                format!("Reports Dashboard\n{} {}\n{}", reports, create, body)
            }
        }
    }
}
