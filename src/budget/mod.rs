//! Monthly budgets per category.

mod core;
mod db;
mod endpoints;

pub use core::{Budget, BudgetKey, NewBudget};
pub use db::{
    create_budget_table, delete_budget, get_budget, get_budgets, seed_sample_budgets,
    update_budget, upsert_budget,
};
pub use endpoints::{
    delete_budget_endpoint, list_budgets_endpoint, save_budget_endpoint, update_budget_endpoint,
};
