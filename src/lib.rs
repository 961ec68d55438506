pub mod api;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod models;
pub mod services;
pub mod session;

pub use api::{ApiError, ReportsApi};
pub use session::Session;
