//! The in-memory copy of transactions, categories and budgets.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::Serialize;

use crate::{
    budget::{Budget, BudgetKey},
    category::Category,
    database_id::{BudgetId, CategoryId, TransactionId},
    month::Month,
    store::collection::{Collection, FetchToken, LoadStatus},
    transaction::Transaction,
};

/// The store shared between the mutation coordinator and whoever reads it.
pub type SharedStore = Arc<Mutex<EntityStore>>;

/// The latest known state of every entity collection.
///
/// Transactions and categories are replaced wholesale by each fetch. Budgets
/// are merged by category and month instead, so fetching one month never
/// discards budgets already known for another.
#[derive(Debug, Clone)]
pub struct EntityStore {
    transactions: Collection<Transaction>,
    categories: Collection<Category>,
    budgets: Collection<Budget>,
    selected_year: i32,
    transaction_filter: Option<i32>,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(Month::current().year())
    }
}

/// An owned copy of the collections for one round of derivations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSnapshot {
    /// The transactions, most recent first.
    pub transactions: Vec<Transaction>,
    /// The categories.
    pub categories: Vec<Category>,
    /// The budgets, at most one per category and month.
    pub budgets: Vec<Budget>,
}

impl EntityStore {
    /// Create an empty store with `selected_year` chosen for display.
    pub fn new(selected_year: i32) -> Self {
        Self {
            transactions: Collection::default(),
            categories: Collection::default(),
            budgets: Collection::default(),
            selected_year,
            transaction_filter: None,
        }
    }

    /// Wrap the store for sharing.
    pub fn shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// The transactions, most recent first.
    pub fn transactions(&self) -> &Collection<Transaction> {
        &self.transactions
    }

    /// The categories.
    pub fn categories(&self) -> &Collection<Category> {
        &self.categories
    }

    /// The budgets, at most one per category and month.
    pub fn budgets(&self) -> &Collection<Budget> {
        &self.budgets
    }

    /// The year the dashboard is showing.
    pub fn selected_year(&self) -> i32 {
        self.selected_year
    }

    /// Choose the year the dashboard shows.
    pub fn set_selected_year(&mut self, year: i32) {
        self.selected_year = year;
    }

    /// The year filter of the most recent transactions fetch.
    pub fn transaction_filter(&self) -> Option<i32> {
        self.transaction_filter
    }

    // ========================================================================
    // FETCH RESULTS
    // ========================================================================

    /// Start fetching transactions, remembering `year` for later refetches.
    pub fn transactions_loading(&mut self, year: Option<i32>) -> FetchToken {
        self.transaction_filter = year;
        self.transactions.start_loading()
    }

    /// Replace the transactions with a fetch result.
    pub fn transactions_loaded(&mut self, token: FetchToken, transactions: Vec<Transaction>) -> bool {
        self.transactions.replace_all(token, transactions)
    }

    /// Record a failed transactions fetch and drop the now stale transactions.
    pub fn transactions_failed(&mut self, token: FetchToken, message: &str) -> bool {
        self.transactions.fail(token, message, true)
    }

    /// Start fetching categories.
    pub fn categories_loading(&mut self) -> FetchToken {
        self.categories.start_loading()
    }

    /// Replace the categories with a fetch result.
    pub fn categories_loaded(&mut self, token: FetchToken, categories: Vec<Category>) -> bool {
        self.categories.replace_all(token, categories)
    }

    /// Record a failed categories fetch.
    ///
    /// Categories are reference data, so the previously fetched ones are kept.
    pub fn categories_failed(&mut self, token: FetchToken, message: &str) -> bool {
        self.categories.fail(token, message, false)
    }

    /// Start fetching budgets.
    pub fn budgets_loading(&mut self) -> FetchToken {
        self.budgets.start_loading()
    }

    /// Merge a budgets fetch result, keyed by category and month.
    ///
    /// A budget that now has another category or month replaces the entry
    /// under its old key. Returns `false` and changes nothing if a newer fetch
    /// or a reset happened since `token` was issued.
    pub fn budgets_loaded(&mut self, token: FetchToken, budgets: Vec<Budget>) -> bool {
        if !self.budgets.is_current(token) {
            return false;
        }

        let keys: HashMap<BudgetId, BudgetKey> =
            budgets.iter().map(|budget| (budget.id, budget.key())).collect();
        self.budgets
            .retain(|existing| keys.get(&existing.id).is_none_or(|key| *key == existing.key()));

        self.budgets.merge_by_key(token, budgets, Budget::key)
    }

    /// Record a failed budgets fetch and drop the now stale budgets.
    pub fn budgets_failed(&mut self, token: FetchToken, message: &str) -> bool {
        self.budgets.fail(token, message, true)
    }

    // ========================================================================
    // MUTATION RESULTS
    // ========================================================================

    /// Show a newly created transaction first.
    pub fn transaction_created(&mut self, transaction: Transaction) {
        self.transactions.insert_front(transaction);
    }

    /// Drop a deleted transaction, if it is still present.
    pub fn transaction_removed(&mut self, id: TransactionId) {
        self.transactions.remove_by_id(id);
    }

    /// Store a newly created category.
    pub fn category_created(&mut self, category: Category) {
        self.categories.upsert_one(category, |category| category.id);
    }

    /// Store a created, replaced or edited budget.
    ///
    /// An edit may move a budget to another category or month, in which case
    /// the entry under its old key is dropped first.
    pub fn budget_saved(&mut self, budget: Budget) {
        let key = budget.key();
        self.budgets
            .retain(|existing| existing.id != budget.id || existing.key() == key);
        self.budgets.upsert_one(budget, Budget::key);
    }

    /// Drop a deleted budget, if it is still present.
    pub fn budget_removed(&mut self, id: BudgetId) {
        self.budgets.remove_by_id(id);
    }

    /// Forget the last budgets fetch error.
    pub fn clear_budget_error(&mut self) {
        self.budgets.clear_error();
    }

    /// Forget every budget and any fetch in flight.
    pub fn reset_budgets(&mut self) {
        self.budgets.reset();
    }

    // ========================================================================
    // SELECTORS
    // ========================================================================

    /// The transactions dated in `year`.
    pub fn transactions_in_year(&self, year: i32) -> Vec<&Transaction> {
        self.transactions
            .items()
            .iter()
            .filter(|transaction| transaction.date.is_some_and(|date| date.year() == year))
            .collect()
    }

    /// The transactions dated in the selected year.
    pub fn transactions_for_selected_year(&self) -> Vec<&Transaction> {
        self.transactions_in_year(self.selected_year)
    }

    /// The transactions dated in `month`.
    pub fn transactions_in_month(&self, month: Month) -> Vec<&Transaction> {
        self.transactions
            .items()
            .iter()
            .filter(|transaction| transaction.date.is_some_and(|date| month.contains(date)))
            .collect()
    }

    /// The budgets for `month`.
    pub fn budgets_for_month(&self, month: Month) -> Vec<&Budget> {
        self.budgets
            .items()
            .iter()
            .filter(|budget| budget.month == month)
            .collect()
    }

    /// The budget for `category_id` in `month`, if there is one.
    pub fn budget_for(&self, category_id: CategoryId, month: Month) -> Option<&Budget> {
        let key = BudgetKey::new(category_id, month);

        self.budgets
            .items()
            .iter()
            .find(|budget| budget.key() == key)
    }

    /// The sum of the budget amounts for `month`.
    pub fn total_budget_for_month(&self, month: Month) -> f64 {
        self.budgets_for_month(month)
            .into_iter()
            .map(|budget| budget.amount)
            .sum()
    }

    /// The category with `id`, if it has been fetched.
    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Copy the collections for computing derivations.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            transactions: self.transactions.items().to_vec(),
            categories: self.categories.items().to_vec(),
            budgets: self.budgets.items().to_vec(),
        }
    }

    /// Copy the collections, but only once transactions have loaded.
    pub fn ready_snapshot(&self) -> Option<StoreSnapshot> {
        (self.transactions.status() == LoadStatus::Succeeded).then(|| self.snapshot())
    }
}
