//! Data-access layer.
//!
//! Every operation validates its input before touching the network, then
//! issues exactly one store call. Store failures are logged and wrapped into
//! [`ApiError`]; nothing is cached and nothing is retried.

mod comments;
mod profiles;
mod reports;
pub mod validation;


use std::sync::Arc;

use thiserror::Error;
use tracing::{error, warn};

use crate::db::report_store::{ReportStore, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{message}")]
    Store {
        message: String,
        #[source]
        source: StoreError,
    },
    #[error("not signed in")]
    Unauthenticated,
    #[error("{0} not found")]
    NotFound(String),
}

impl ApiError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

/// Logs a failed store call and maps it onto the caller-facing taxonomy.
pub(crate) fn store_failure(operation: &'static str, entity: &str, err: StoreError) -> ApiError {
    if err.is_not_found() {
        warn!(operation, entity, error = %err, "store row not found");
        return ApiError::NotFound(entity.to_string());
    }
    if err.is_unauthenticated() {
        warn!(operation, error = %err, "store call without a valid session");
        return ApiError::Unauthenticated;
    }
    error!(operation, error = %err, "store call failed");
    ApiError::Store {
        message: err.backend_message(),
        source: err,
    }
}

/// Handle to the data-access layer. Cheap to clone.
#[derive(Clone)]
pub struct ReportsApi {
    store: Arc<dyn ReportStore>,
}

impl ReportsApi {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }
}
