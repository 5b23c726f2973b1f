//! JSON endpoints for listing, creating, editing and deleting transactions.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    category::CategoryType,
    database_id::{CategoryId, TransactionId},
    transaction::{
        NewTransaction, TransactionPatch, create_transaction, delete_transaction,
        get_transactions,
        core::{double_option, parse_date},
        update_transaction,
    },
};

/// The state needed for the transaction endpoints.
#[derive(Debug, Clone)]
pub struct TransactionEndpointState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing transactions.
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    year: Option<i32>,
}

/// The request body for creating a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionBody {
    amount: Option<f64>,
    description: Option<String>,
    date: Option<String>,
    category_id: Option<CategoryId>,
    #[serde(rename = "type")]
    kind: Option<CategoryType>,
}

impl TryFrom<TransactionBody> for NewTransaction {
    type Error = Error;

    fn try_from(body: TransactionBody) -> Result<Self, Self::Error> {
        let amount = body.amount.ok_or(Error::MissingField("amount"))?;
        let description = body.description.ok_or(Error::MissingField("description"))?;
        let date = body.date.ok_or(Error::MissingField("date"))?;

        Ok(NewTransaction::new(amount, &description, parse_date(&date)?)
            // An ID of zero is sent by forms with no category selected.
            .category(body.category_id.filter(|id| *id > 0))
            .kind(body.kind))
    }
}

/// The request body for editing a transaction.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatchBody {
    amount: Option<f64>,
    description: Option<String>,
    date: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    category_id: Option<Option<CategoryId>>,
}

impl TryFrom<TransactionPatchBody> for TransactionPatch {
    type Error = Error;

    fn try_from(body: TransactionPatchBody) -> Result<Self, Self::Error> {
        Ok(TransactionPatch {
            amount: body.amount,
            description: body.description,
            date: body.date.as_deref().map(parse_date).transpose()?,
            category_id: body.category_id,
        })
    }
}

/// List transactions most recent first, optionally filtered by `?year=`.
pub async fn list_transactions_endpoint(
    State(state): State<TransactionEndpointState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transactions = get_transactions(query.year, &connection)?;

    Ok(Json(transactions).into_response())
}

/// Create a transaction and respond with it, including its category.
pub async fn create_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Json(body): Json<TransactionBody>,
) -> Result<Response, Error> {
    let new_transaction = NewTransaction::try_from(body)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = create_transaction(new_transaction, &connection)?;

    Ok((StatusCode::CREATED, Json(transaction)).into_response())
}

/// Apply a partial update to a transaction.
pub async fn update_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Path(transaction_id): Path<TransactionId>,
    Json(body): Json<TransactionPatchBody>,
) -> Result<Response, Error> {
    let patch = TransactionPatch::try_from(body)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let transaction = update_transaction(transaction_id, patch, &connection)?;

    Ok(Json(transaction).into_response())
}

/// Delete a transaction.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionEndpointState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_transaction(transaction_id, &connection)
        .inspect_err(|error| tracing::info!("Could not delete transaction {transaction_id}: {error}"))?;

    Ok(Json(json!({ "success": true })).into_response())
}
