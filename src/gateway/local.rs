//! A gateway that works directly on a SQLite connection.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    AppState, ClientError, Error,
    budget::{Budget, NewBudget, delete_budget, get_budgets, update_budget, upsert_budget},
    category::{Category, NewCategory, create_category, get_all_categories},
    database_id::{BudgetId, TransactionId},
    gateway::Gateway,
    month::Month,
    transaction::{
        NewTransaction, Transaction, TransactionPatch, create_transaction, delete_transaction,
        get_transactions, update_transaction,
    },
};

/// Runs gateway operations in-process with the same queries as the JSON API.
#[derive(Debug, Clone)]
pub struct LocalGateway {
    db_connection: Arc<Mutex<Connection>>,
}

impl LocalGateway {
    /// Create a gateway over a connection to an initialised database.
    pub fn new(db_connection: Arc<Mutex<Connection>>) -> Self {
        Self { db_connection }
    }

    fn with_connection<T>(
        &self,
        operation: impl FnOnce(&Connection) -> Result<T, Error>,
    ) -> Result<T, ClientError> {
        let connection = self
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        Ok(operation(&connection)?)
    }
}

impl From<&AppState> for LocalGateway {
    fn from(state: &AppState) -> Self {
        Self::new(state.db_connection.clone())
    }
}

impl Gateway for LocalGateway {
    async fn list_transactions(&self, year: Option<i32>) -> Result<Vec<Transaction>, ClientError> {
        self.with_connection(|connection| get_transactions(year, connection))
    }

    async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, ClientError> {
        self.with_connection(|connection| create_transaction(new_transaction, connection))
    }

    async fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, ClientError> {
        self.with_connection(|connection| update_transaction(id, patch, connection))
    }

    async fn delete_transaction(&self, id: TransactionId) -> Result<(), ClientError> {
        self.with_connection(|connection| delete_transaction(id, connection))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.with_connection(get_all_categories)
    }

    async fn create_category(&self, new_category: NewCategory) -> Result<Category, ClientError> {
        self.with_connection(|connection| create_category(new_category, connection))
    }

    async fn list_budgets(&self, month: Option<Month>) -> Result<Vec<Budget>, ClientError> {
        self.with_connection(|connection| get_budgets(month, connection))
    }

    async fn upsert_budget(&self, new_budget: NewBudget) -> Result<Budget, ClientError> {
        self.with_connection(|connection| upsert_budget(new_budget, connection))
    }

    async fn update_budget(
        &self,
        id: BudgetId,
        new_budget: NewBudget,
    ) -> Result<Budget, ClientError> {
        self.with_connection(|connection| update_budget(id, new_budget, connection))
    }

    async fn delete_budget(&self, id: BudgetId) -> Result<(), ClientError> {
        self.with_connection(|connection| delete_budget(id, connection))
    }
}
