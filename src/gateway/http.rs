//! A gateway that talks to the JSON API over HTTP.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::{
    ClientError,
    budget::{Budget, NewBudget},
    category::{Category, NewCategory},
    database_id::{BudgetId, TransactionId},
    endpoints::{self, format_endpoint},
    gateway::{
        Gateway,
        wire::{
            parse_budget, parse_budgets, parse_categories, parse_category, parse_one,
            parse_transaction, parse_transactions,
        },
    },
    month::Month,
    transaction::{NewTransaction, Transaction, TransactionPatch},
};

/// Where to find the JSON API and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// The scheme, host and port of the server, e.g. `http://127.0.0.1:3000`.
    pub base_url: String,
    /// How long a single request may take before it fails with a
    /// [ClientError::Network].
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_owned(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Runs gateway operations against the JSON API.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    /// Create a gateway from `config`.
    ///
    /// # Errors
    /// Returns a [ClientError::Network] if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| ClientError::Network(format!("could not build HTTP client: {error}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send `request` and read the JSON body of a successful response.
    ///
    /// An empty body, e.g. from a 204 No Content response, reads as
    /// [Value::Null].
    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await.map_err(|error| {
            tracing::warn!("request to gateway failed: {error}");
            ClientError::Network(format!("Could not reach the server: {error}"))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            ClientError::Network(format!("Could not read the server's response: {error}"))
        })?;

        if !status.is_success() {
            return Err(classify_failure(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|error| {
            tracing::warn!("gateway sent invalid JSON: {error}");
            ClientError::Server("The server sent a response that is not valid JSON".to_owned())
        })
    }
}

/// Map a non-success response to the error taxonomy, using the `error` or
/// `message` field of a JSON body as the message when there is one.
fn classify_failure(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        })
        .or_else(|| {
            let body = body.trim();
            (!body.is_empty() && body.len() <= 200).then(|| body.to_owned())
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::CONFLICT => ClientError::Conflict(message),
        _ => ClientError::Server(message),
    }
}

impl Gateway for HttpGateway {
    async fn list_transactions(&self, year: Option<i32>) -> Result<Vec<Transaction>, ClientError> {
        let url = match year {
            Some(year) => format!("{}?year={year}", self.url(endpoints::TRANSACTIONS_API)),
            None => self.url(endpoints::TRANSACTIONS_API),
        };

        parse_transactions(self.send(self.client.get(url)).await?)
    }

    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, ClientError> {
        let request = self
            .client
            .post(self.url(endpoints::TRANSACTIONS_API))
            .json(&new_transaction);

        parse_one(self.send(request).await?, "transaction", parse_transaction)
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, ClientError> {
        let request = self
            .client
            .patch(self.url(&format_endpoint(endpoints::TRANSACTION_API, id)))
            .json(&patch);

        parse_one(self.send(request).await?, "transaction", parse_transaction)
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.url(&format_endpoint(endpoints::TRANSACTION_API, id)));

        self.send(request).await.map(|_| ())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        let request = self.client.get(self.url(endpoints::CATEGORIES_API));

        parse_categories(self.send(request).await?)
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category, ClientError> {
        let request = self
            .client
            .post(self.url(endpoints::CATEGORIES_API))
            .json(&new_category);

        parse_one(self.send(request).await?, "category", parse_category)
    }

    async fn list_budgets(&self, month: Option<Month>) -> Result<Vec<Budget>, ClientError> {
        let url = match month {
            Some(month) => format!("{}?month={month}", self.url(endpoints::BUDGETS_API)),
            None => self.url(endpoints::BUDGETS_API),
        };

        parse_budgets(self.send(self.client.get(url)).await?)
    }

    async fn upsert_budget(&self, new_budget: NewBudget) -> Result<Budget, ClientError> {
        let request = self
            .client
            .post(self.url(endpoints::BUDGETS_API))
            .json(&new_budget);

        parse_one(self.send(request).await?, "budget", parse_budget)
    }

    async fn update_budget(
        &self,
        id: BudgetId,
        new_budget: NewBudget,
    ) -> Result<Budget, ClientError> {
        let request = self
            .client
            .put(self.url(&format_endpoint(endpoints::BUDGET_API, id)))
            .json(&new_budget);

        parse_one(self.send(request).await?, "budget", parse_budget)
    }

    async fn delete_budget(&self, id: BudgetId) -> Result<(), ClientError> {
        let request = self
            .client
            .delete(self.url(&format_endpoint(endpoints::BUDGET_API, id)));

        self.send(request).await.map(|_| ())
    }
}
