//! View models for the dashboard: local component state plus the calls
//! each component makes into the data-access layer.

pub mod comments;
mod in_flight;
pub mod page;
pub mod report_card;
pub mod report_form;
pub mod report_list;
pub mod shell;
pub mod toast;

pub use comments::{CommentOutcome, CommentThread};
pub use page::{Dashboard, Tab, View};
pub use report_card::ReportCard;
pub use report_form::{CreateReportForm, FormField, SubmitOutcome};
pub use report_list::ReportListView;
pub use toast::{Toast, ToastVariant};
