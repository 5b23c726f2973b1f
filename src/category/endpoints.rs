//! JSON endpoints for listing and creating categories.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{CategoryType, NewCategory, create_category, get_all_categories},
};

/// The state needed for the category endpoints.
#[derive(Debug, Clone)]
pub struct CategoryEndpointState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: CategoryType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// List all categories ordered by name.
pub async fn list_categories_endpoint(
    State(state): State<CategoryEndpointState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)?;

    Ok(Json(categories).into_response())
}

/// Create a category, responding with 409 Conflict if the name is taken.
pub async fn create_category_endpoint(
    State(state): State<CategoryEndpointState>,
    Json(body): Json<CategoryBody>,
) -> Result<Response, Error> {
    let new_category = NewCategory::new(&body.name, body.kind)?
        .color(body.color)
        .icon(body.icon);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let category = create_category(new_category, &connection)?;
    tracing::debug!("created category {} ({})", category.id, category.name);

    Ok((StatusCode::CREATED, Json(category)).into_response())
}

#[cfg(test)]
mod category_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Router,
        http::StatusCode,
        routing::get,
    };
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{db::initialize, endpoints};

    use super::{CategoryEndpointState, create_category_endpoint, list_categories_endpoint};

    fn get_test_server() -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let state = CategoryEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let app = Router::new()
            .route(
                endpoints::CATEGORIES_API,
                get(list_categories_endpoint).post(create_category_endpoint),
            )
            .with_state(state);

        TestServer::new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn create_then_list_categories() {
        let server = get_test_server();

        let response = server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({"name": "Salary", "type": "income"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Value = response.json();
        assert_eq!(created["name"], "Salary");
        assert_eq!(created["type"], "income");

        let listed: Value = server.get(endpoints::CATEGORIES_API).await.json();
        assert_eq!(listed.as_array().map(Vec::len), Some(1));
        assert_eq!(listed[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn duplicate_name_is_conflict() {
        let server = get_test_server();
        server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({"name": "Food"}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({"name": "Food"}))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("Food"));
    }

    #[tokio::test]
    async fn empty_name_is_bad_request() {
        let server = get_test_server();

        server
            .post(endpoints::CATEGORIES_API)
            .json(&json!({"name": "   "}))
            .await
            .assert_status_bad_request();
    }
}
