//! The budget model and its natural key.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    category::CategorySnapshot,
    database_id::{BudgetId, CategoryId},
    month::Month,
};

/// The amount of money planned to be spent in a category during a month.
///
/// There is at most one budget per category and month, see [BudgetKey].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    /// The ID of the budget.
    pub id: BudgetId,
    /// The planned amount, a positive number.
    pub amount: f64,
    /// The month the budget applies to.
    pub month: Month,
    /// The category the budget applies to.
    pub category_id: CategoryId,
    /// The category's id and name at the time the budget was read.
    pub category: CategorySnapshot,
}

impl Budget {
    /// The natural key of the budget.
    pub fn key(&self) -> BudgetKey {
        BudgetKey::new(self.category_id, self.month)
    }
}

/// Identifies a budget by its category and month.
///
/// Displayed as `{categoryId}-{month}`, e.g. `3-2024-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BudgetKey {
    /// The category the budget applies to.
    pub category_id: CategoryId,
    /// The month the budget applies to.
    pub month: Month,
}

impl BudgetKey {
    /// Create the key for a category and month.
    pub fn new(category_id: CategoryId, month: Month) -> Self {
        Self { category_id, month }
    }
}

impl Display for BudgetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.category_id, self.month)
    }
}

/// The data for creating or replacing a budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBudget {
    /// The planned amount, must be positive.
    pub amount: f64,
    /// The month the budget applies to.
    pub month: Month,
    /// The category the budget applies to, must be positive.
    pub category_id: CategoryId,
}

impl NewBudget {
    /// Create a budget from user input.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if `amount` is not a positive number,
    /// - [Error::InvalidMonth] if `month` is not in the `YYYY-MM` format,
    /// - or [Error::InvalidCategory] if `category_id` is not positive.
    pub fn new(amount: f64, month: &str, category_id: CategoryId) -> Result<Self, Error> {
        let new_budget = Self {
            amount,
            month: Month::parse(month)?,
            category_id,
        };

        new_budget.validate()?;

        Ok(new_budget)
    }

    /// The natural key of the budget.
    pub fn key(&self) -> BudgetKey {
        BudgetKey::new(self.category_id, self.month)
    }

    /// Check the amount and category ID.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is not a positive number,
    /// - or [Error::InvalidCategory] if the category ID is not positive.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        if self.category_id <= 0 {
            return Err(Error::InvalidCategory(Some(self.category_id)));
        }

        Ok(())
    }
}
