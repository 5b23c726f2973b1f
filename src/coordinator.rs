//! Turns user intents into gateway calls and applies the results to the store.
//!
//! Reads never fail past this module: a failed fetch is recorded in the
//! store's load status. Writes validate their input before any network call
//! and leave the store untouched when the gateway rejects them.

use std::sync::{MutexGuard, PoisonError};

use crate::{
    ClientError,
    budget::{Budget, NewBudget},
    category::{Category, NewCategory},
    database_id::{BudgetId, TransactionId},
    gateway::Gateway,
    month::Month,
    store::{EntityStore, LoadStatus, SharedStore, StoreSnapshot},
    transaction::{NewTransaction, Transaction, TransactionPatch},
};

/// How a delete request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The gateway deleted the entity.
    Deleted,
    /// The gateway no longer had the entity, so there was nothing to delete.
    AlreadyDeleted,
}

/// The only writer of a [SharedStore].
#[derive(Debug, Clone)]
pub struct MutationCoordinator<G> {
    gateway: G,
    store: SharedStore,
}

impl<G: Gateway> MutationCoordinator<G> {
    /// Create a coordinator that writes the results of `gateway` calls into
    /// `store`.
    pub fn new(gateway: G, store: SharedStore) -> Self {
        Self { gateway, store }
    }

    /// The store this coordinator writes to.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// The gateway this coordinator calls.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Copy the store's current collections.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.lock_store().snapshot()
    }

    // Every store operation is one synchronous call, so a poisoned store is
    // still consistent.
    fn lock_store(&self) -> MutexGuard<'_, EntityStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Replace the stored transactions with those dated in `year`, or all of
    /// them if `year` is `None`.
    ///
    /// # Returns
    /// The status of the transactions collection afterwards.
    pub async fn fetch_transactions(&self, year: Option<i32>) -> LoadStatus {
        let token = self.lock_store().transactions_loading(year);

        match self.gateway.list_transactions(year).await {
            Ok(transactions) => {
                self.lock_store().transactions_loaded(token, transactions);
            }
            Err(error) => {
                tracing::warn!("could not fetch transactions: {error}");
                self.lock_store().transactions_failed(token, error.message());
            }
        }

        self.lock_store().transactions().status()
    }

    /// Fetch transactions again with the year filter of the last fetch.
    pub async fn refresh_transactions(&self) -> LoadStatus {
        let year = self.lock_store().transaction_filter();

        self.fetch_transactions(year).await
    }

    /// Replace the stored categories.
    ///
    /// # Returns
    /// The status of the categories collection afterwards.
    pub async fn fetch_categories(&self) -> LoadStatus {
        let token = self.lock_store().categories_loading();

        match self.gateway.list_categories().await {
            Ok(categories) => {
                self.lock_store().categories_loaded(token, categories);
            }
            Err(error) => {
                tracing::warn!("could not fetch categories: {error}");
                self.lock_store().categories_failed(token, error.message());
            }
        }

        self.lock_store().categories().status()
    }

    /// Merge the budgets for `month`, or all budgets if `month` is `None`,
    /// into the store.
    ///
    /// # Returns
    /// The status of the budgets collection afterwards.
    pub async fn fetch_budgets(&self, month: Option<Month>) -> LoadStatus {
        let token = self.lock_store().budgets_loading();

        match self.gateway.list_budgets(month).await {
            Ok(budgets) => {
                self.lock_store().budgets_loaded(token, budgets);
            }
            Err(error) => {
                tracing::warn!("could not fetch budgets: {error}");
                self.lock_store().budgets_failed(token, error.message());
            }
        }

        self.lock_store().budgets().status()
    }

    /// Fetch everything a dashboard for `year` needs, concurrently.
    ///
    /// # Returns
    /// A snapshot of the store, or `None` if the transactions could not be
    /// loaded.
    pub async fn load_dashboard(&self, year: i32, month: Option<Month>) -> Option<StoreSnapshot> {
        self.lock_store().set_selected_year(year);

        let (transactions, categories, budgets) = tokio::join!(
            self.fetch_transactions(Some(year)),
            self.fetch_categories(),
            self.fetch_budgets(month),
        );
        tracing::debug!(
            "loaded dashboard for {year}: transactions {transactions:?}, categories {categories:?}, budgets {budgets:?}"
        );

        self.lock_store().ready_snapshot()
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Create a transaction and show it first.
    ///
    /// # Errors
    /// Returns a [ClientError::Validation] without calling the gateway if the
    /// amount is not positive or the description is empty, otherwise the
    /// gateway's error.
    pub async fn create_transaction(
        &self,
        new_transaction: NewTransaction,
    ) -> Result<Transaction, ClientError> {
        new_transaction.validate()?;

        let transaction = self
            .gateway
            .create_transaction(new_transaction)
            .await
            .inspect_err(|error| tracing::warn!("could not create transaction: {error}"))?;

        self.lock_store().transaction_created(transaction.clone());

        Ok(transaction)
    }

    /// Change some fields of a transaction, then fetch the transactions again
    /// so that category names come from the gateway.
    ///
    /// The update counts as done even if the refetch fails. The store then
    /// holds no transactions and `transactions().status()` is
    /// [LoadStatus::Failed].
    ///
    /// # Errors
    /// Returns a [ClientError::Validation] without calling the gateway if a
    /// changed field is invalid, otherwise the gateway's error.
    pub async fn update_transaction(
        &self,
        id: TransactionId,
        patch: TransactionPatch,
    ) -> Result<Transaction, ClientError> {
        patch.validate()?;

        let transaction = self
            .gateway
            .update_transaction(id, patch)
            .await
            .inspect_err(|error| tracing::warn!("could not update transaction {id}: {error}"))?;

        if self.refresh_transactions().await == LoadStatus::Failed {
            tracing::warn!("transaction {id} was updated but the transactions could not be fetched");
        }

        Ok(transaction)
    }

    /// Delete a transaction, remove it from the store and fetch the
    /// transactions again.
    ///
    /// A transaction the gateway no longer has counts as deleted.
    ///
    /// # Errors
    /// Returns the gateway's error for any failure other than not found.
    pub async fn delete_transaction(&self, id: TransactionId) -> Result<DeleteOutcome, ClientError> {
        let outcome = match self.gateway.delete_transaction(id).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(error) if error.is_not_found() => {
                tracing::info!("transaction {id} was already deleted: {error}");
                DeleteOutcome::AlreadyDeleted
            }
            Err(error) => {
                tracing::warn!("could not delete transaction {id}: {error}");
                return Err(error);
            }
        };

        self.lock_store().transaction_removed(id);
        self.refresh_transactions().await;

        Ok(outcome)
    }

    /// Create a category.
    ///
    /// # Errors
    /// Returns a [ClientError::Conflict] if the name is taken, or another
    /// gateway error.
    pub async fn create_category(&self, new_category: NewCategory) -> Result<Category, ClientError> {
        let category = self
            .gateway
            .create_category(new_category)
            .await
            .inspect_err(|error| tracing::warn!("could not create category: {error}"))?;

        self.lock_store().category_created(category.clone());

        Ok(category)
    }

    /// Create the budget for a category and month, or replace the amount of
    /// the existing one.
    ///
    /// # Errors
    /// Returns a [ClientError::Validation] without calling the gateway if the
    /// amount or category is invalid, otherwise the gateway's error.
    pub async fn save_budget(&self, new_budget: NewBudget) -> Result<Budget, ClientError> {
        new_budget.validate()?;

        let budget = self
            .gateway
            .upsert_budget(new_budget)
            .await
            .inspect_err(|error| {
                tracing::warn!("could not save budget {}: {error}", new_budget.key())
            })?;

        self.lock_store().budget_saved(budget.clone());

        Ok(budget)
    }

    /// Replace the amount, month and category of a budget.
    ///
    /// # Errors
    /// Returns a [ClientError::Validation] without calling the gateway if the
    /// amount or category is invalid, a [ClientError::Conflict] if another
    /// budget has the category and month, or another gateway error.
    pub async fn update_budget(
        &self,
        id: BudgetId,
        new_budget: NewBudget,
    ) -> Result<Budget, ClientError> {
        new_budget.validate()?;

        let budget = self
            .gateway
            .update_budget(id, new_budget)
            .await
            .inspect_err(|error| tracing::warn!("could not update budget {id}: {error}"))?;

        self.lock_store().budget_saved(budget.clone());

        Ok(budget)
    }

    /// Delete a budget and remove it from the store.
    ///
    /// # Errors
    /// Returns the gateway's error for any failure other than not found.
    pub async fn delete_budget(&self, id: BudgetId) -> Result<DeleteOutcome, ClientError> {
        let outcome = match self.gateway.delete_budget(id).await {
            Ok(()) => DeleteOutcome::Deleted,
            Err(error) if error.is_not_found() => {
                tracing::info!("budget {id} was already deleted: {error}");
                DeleteOutcome::AlreadyDeleted
            }
            Err(error) => {
                tracing::warn!("could not delete budget {id}: {error}");
                return Err(error);
            }
        };

        self.lock_store().budget_removed(id);

        Ok(outcome)
    }
}
