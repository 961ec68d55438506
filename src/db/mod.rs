pub mod memory_report_store;
pub mod postgrest_report_store;
pub mod report_store;
