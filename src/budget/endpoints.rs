//! JSON endpoints for listing, saving, editing and deleting budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    budget::{NewBudget, delete_budget, get_budgets, update_budget, upsert_budget},
    database_id::{BudgetId, CategoryId},
    month::Month,
};

/// The state needed for the budget endpoints.
#[derive(Debug, Clone)]
pub struct BudgetEndpointState {
    /// The database connection for managing budgets.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing budgets.
#[derive(Debug, Deserialize)]
pub struct BudgetsQuery {
    month: Option<String>,
}

/// The request body for saving a budget.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetBody {
    amount: Option<f64>,
    month: Option<String>,
    category_id: Option<CategoryId>,
}

impl TryFrom<BudgetBody> for NewBudget {
    type Error = Error;

    fn try_from(body: BudgetBody) -> Result<Self, Self::Error> {
        let amount = body.amount.ok_or(Error::MissingField("amount"))?;
        let month = body.month.ok_or(Error::MissingField("month"))?;
        let category_id = body.category_id.ok_or(Error::MissingField("categoryId"))?;

        NewBudget::new(amount, &month, category_id)
    }
}

/// List budgets, optionally only those for `?month=YYYY-MM`.
pub async fn list_budgets_endpoint(
    State(state): State<BudgetEndpointState>,
    Query(query): Query<BudgetsQuery>,
) -> Result<Response, Error> {
    let month = query.month.as_deref().map(Month::parse).transpose()?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = get_budgets(month, &connection)?;

    Ok(Json(budgets).into_response())
}

/// Create the budget for a category and month, or replace its amount.
pub async fn save_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Json(body): Json<BudgetBody>,
) -> Result<Response, Error> {
    let new_budget = NewBudget::try_from(body)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = upsert_budget(new_budget, &connection)?;
    tracing::debug!("saved budget {} for {}", budget.id, budget.key());

    Ok((StatusCode::CREATED, Json(budget)).into_response())
}

/// Replace the amount, month and category of a budget.
pub async fn update_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Path(budget_id): Path<BudgetId>,
    Json(body): Json<BudgetBody>,
) -> Result<Response, Error> {
    let new_budget = NewBudget::try_from(body)?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = update_budget(budget_id, new_budget, &connection)?;

    Ok(Json(budget).into_response())
}

/// Delete a budget.
pub async fn delete_budget_endpoint(
    State(state): State<BudgetEndpointState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    delete_budget(budget_id, &connection)
        .inspect_err(|error| tracing::info!("Could not delete budget {budget_id}: {error}"))?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        http::StatusCode,
        routing::{get, put},
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        category::{CategoryType, NewCategory, create_category},
        db::initialize,
        endpoints::{self, format_endpoint},
    };

    use super::{
        BudgetEndpointState, delete_budget_endpoint, list_budgets_endpoint, save_budget_endpoint,
        update_budget_endpoint,
    };

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        for name in ["Food", "Transport", "Housing"] {
            create_category(
                NewCategory::new(name, CategoryType::Expense).unwrap(),
                &connection,
            )
            .unwrap();
        }
        let state = BudgetEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(
                endpoints::BUDGETS_API,
                get(list_budgets_endpoint).post(save_budget_endpoint),
            )
            .route(
                endpoints::BUDGET_API,
                put(update_budget_endpoint).delete(delete_budget_endpoint),
            )
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn saving_twice_replaces_budget() {
        let server = get_test_server();

        server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 3, "month": "2024-03", "amount": 100}))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 3, "month": "2024-03", "amount": 150}))
            .await
            .assert_status(StatusCode::CREATED);

        let budgets: Value = server
            .get(endpoints::BUDGETS_API)
            .add_query_param("month", "2024-03")
            .await
            .json();

        assert_eq!(budgets.as_array().map(Vec::len), Some(1));
        assert_eq!(budgets[0]["categoryId"], 3);
        assert_eq!(budgets[0]["amount"], 150.0);
        assert_eq!(budgets[0]["category"]["name"], "Housing");
    }

    #[tokio::test]
    async fn save_rejects_malformed_month() {
        let server = get_test_server();

        let response = server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 1, "month": "2024-3", "amount": 100}))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["error"], "\"2024-3\" is not a valid month, expected YYYY-MM");
    }

    #[tokio::test]
    async fn save_rejects_unknown_category() {
        let server = get_test_server();

        server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 42, "month": "2024-03", "amount": 100}))
            .await
            .assert_status_bad_request();
    }

    #[tokio::test]
    async fn update_onto_occupied_month_is_conflict() {
        let server = get_test_server();
        server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 1, "month": "2024-03", "amount": 100}))
            .await;
        let april: Value = server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 1, "month": "2024-04", "amount": 100}))
            .await
            .json();
        let april_id = april["id"].as_i64().unwrap();

        server
            .put(&format_endpoint(endpoints::BUDGET_API, april_id))
            .json(&json!({"categoryId": 1, "month": "2024-03", "amount": 100}))
            .await
            .assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn delete_returns_no_content_then_not_found() {
        let server = get_test_server();
        let budget: Value = server
            .post(endpoints::BUDGETS_API)
            .json(&json!({"categoryId": 2, "month": "2024-03", "amount": 80}))
            .await
            .json();
        let path = format_endpoint(endpoints::BUDGET_API, budget["id"].as_i64().unwrap());

        server
            .delete(&path)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server.delete(&path).await.assert_status_not_found();
    }
}
