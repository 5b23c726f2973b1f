//! The boundary to the service that persists transactions, categories and
//! budgets.
//!
//! [HttpGateway] talks to the JSON API served by [crate::build_router];
//! [LocalGateway] calls the same persistence functions directly on a shared
//! SQLite connection.

mod http;
mod local;
mod wire;

pub use http::{GatewayConfig, HttpGateway};
pub use local::LocalGateway;

use crate::{
    ClientError,
    budget::{Budget, NewBudget},
    category::{Category, NewCategory},
    database_id::{BudgetId, TransactionId},
    month::Month,
    transaction::{NewTransaction, Transaction, TransactionPatch},
};

/// Asynchronous list/create/update/delete operations for each resource.
///
/// Every operation resolves to the data the gateway sent back, or a
/// [ClientError] describing why it failed.
pub trait Gateway: Send + Sync {
    /// List transactions, only those dated in `year` if given.
    fn list_transactions(
        &self,
        year: Option<i32>,
    ) -> impl Future<Output = Result<Vec<Transaction>, ClientError>> + Send;

    /// Create a transaction.
    fn create_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> impl Future<Output = Result<Transaction, ClientError>> + Send;

    /// Change the fields of a transaction that are set in `patch`.
    fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> impl Future<Output = Result<Transaction, ClientError>> + Send;

    /// Delete a transaction.
    fn delete_transaction(
        &self,
        id: TransactionId,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// List all categories.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, ClientError>> + Send;

    /// Create a category.
    fn create_category(
        &self,
        new_category: NewCategory,
    ) -> impl Future<Output = Result<Category, ClientError>> + Send;

    /// List budgets, only those for `month` if given.
    fn list_budgets(
        &self,
        month: Option<Month>,
    ) -> impl Future<Output = Result<Vec<Budget>, ClientError>> + Send;

    /// Create the budget for a category and month, or replace its amount.
    fn upsert_budget(
        &self,
        new_budget: NewBudget,
    ) -> impl Future<Output = Result<Budget, ClientError>> + Send;

    /// Replace the amount, month and category of a budget.
    fn update_budget(
        &self,
        id: BudgetId,
        new_budget: NewBudget,
    ) -> impl Future<Output = Result<Budget, ClientError>> + Send;

    /// Delete a budget.
    fn delete_budget(&self, id: BudgetId) -> impl Future<Output = Result<(), ClientError>> + Send;
}
