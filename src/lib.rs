//! A personal finance tracker: transactions, categories and monthly budgets.
//!
//! The crate has two halves:
//! - a JSON API over SQLite that persists transactions, categories and
//!   budgets ([build_router], [initialize_db]),
//! - and the client core that talks to that API through a [Gateway], keeps
//!   the latest known state in an [EntityStore], applies user intents with a
//!   [MutationCoordinator] and derives dashboard figures with the pure
//!   functions in [dashboard].

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod budget;
mod category;
mod client_error;
mod coordinator;
pub mod dashboard;
mod database_id;
mod db;
mod endpoints;
mod gateway;
mod logging;
mod month;
mod routing;
mod store;
mod transaction;

pub use app_state::AppState;
pub use budget::{Budget, BudgetKey, NewBudget, seed_sample_budgets};
pub use category::{
    Category, CategoryName, CategorySnapshot, CategoryType, DEFAULT_CATEGORIES, NewCategory,
    UNCATEGORIZED_LABEL, seed_default_categories,
};
pub use client_error::ClientError;
pub use coordinator::{DeleteOutcome, MutationCoordinator};
pub use database_id::{BudgetId, CategoryId, DatabaseId, TransactionId};
pub use db::initialize as initialize_db;
pub use endpoints::format_endpoint;
pub use gateway::{Gateway, GatewayConfig, HttpGateway, LocalGateway};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use month::{MONTH_LABELS, Month};
pub use routing::build_router;
pub use store::{Collection, Entity, EntityStore, FetchToken, LoadStatus, SharedStore, StoreSnapshot};
pub use transaction::{NewTransaction, Transaction, TransactionPatch, seed_sample_transactions};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur when validating or persisting data.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// A category type other than 'expense' or 'income' was given.
    #[error("\"{0}\" is not a valid category type, expected \"expense\" or \"income\"")]
    InvalidCategoryType(String),

    /// A required field was missing from a request body.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// An empty string was used as a transaction description.
    #[error("Description cannot be empty")]
    EmptyDescription,

    /// An amount that is zero, negative or not a finite number was given.
    #[error("Amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    /// A date that is not a valid `YYYY-MM-DD` calendar date was given.
    #[error("\"{0}\" is not a valid date, expected YYYY-MM-DD")]
    InvalidDate(String),

    /// A month that is not in the `YYYY-MM` format was given.
    #[error("\"{0}\" is not a valid month, expected YYYY-MM")]
    InvalidMonth(String),

    /// The category ID does not refer to a valid category.
    #[error("the category ID {0:?} does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// The category name is already taken.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// A budget already exists for the category and month.
    #[error("a budget for category {0} in {1} already exists")]
    DuplicateBudget(CategoryId, Month),

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl Error {
    /// The HTTP status code the error is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::EmptyCategoryName
            | Error::InvalidCategoryType(_)
            | Error::MissingField(_)
            | Error::EmptyDescription
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidMonth(_)
            | Error::InvalidCategory(_) => StatusCode::BAD_REQUEST,
            Error::DuplicateCategoryName(_) | Error::DuplicateBudget(_, _) => StatusCode::CONFLICT,
            Error::NotFound
            | Error::UpdateMissingTransaction
            | Error::DeleteMissingTransaction
            | Error::UpdateMissingBudget
            | Error::DeleteMissingBudget => StatusCode::NOT_FOUND,
            Error::SqlError(_) | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            // Internal errors are not intended to be shown to the client.
            tracing::error!("An unexpected error occurred: {}", self);
            "An error occurred while accessing the database".to_owned()
        } else {
            self.to_string()
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use axum::{http::StatusCode, response::IntoResponse};

    use crate::{Error, Month};

    async fn body_json(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_errors_are_bad_requests() {
        let (status, body) = body_json(Error::InvalidAmount(-1.0)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Amount must be a positive number, got -1");
    }

    #[tokio::test]
    async fn duplicate_budget_is_conflict() {
        let month = Month::parse("2024-03").unwrap();

        let (status, body) = body_json(Error::DuplicateBudget(3, month)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "a budget for category 3 in 2024-03 already exists");
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_json(Error::DatabaseLockError).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "An error occurred while accessing the database");
    }

    #[test]
    fn no_rows_maps_to_not_found() {
        assert_eq!(Error::from(rusqlite::Error::QueryReturnedNoRows), Error::NotFound);
    }
}
