//! Comparing budgets against actual spending.

use serde::Serialize;

use crate::{
    budget::Budget,
    category::Category,
    database_id::{BudgetId, CategoryId},
    month::Month,
    transaction::Transaction,
};

/// How much of one budget has been spent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetComparison {
    /// The ID of the budget.
    pub budget_id: BudgetId,
    /// The category the budget applies to.
    pub category_id: CategoryId,
    /// The name of the category.
    pub category_name: String,
    /// The budgeted amount.
    pub budget: f64,
    /// The expenses in the category during the budget's month.
    pub spent: f64,
    /// What is left of the budget, never negative.
    pub remaining: f64,
    /// How much the spending exceeds the budget, never negative.
    pub over_budget: f64,
    /// The share of the budget spent as a percentage, capped at 100.
    pub utilization_percent: f64,
}

impl BudgetComparison {
    /// Whether more was spent than budgeted.
    pub fn is_over_budget(&self) -> bool {
        self.over_budget > 0.0
    }
}

/// Compares each budget for `month` with the expenses in its category.
///
/// Budgets without a valid category ID, or whose category is not in
/// `categories`, are left out.
///
/// # Returns
/// One comparison per budget, most spent first.
pub fn budget_vs_actual(
    transactions: &[Transaction],
    budgets: &[Budget],
    categories: &[Category],
    month: Month,
) -> Vec<BudgetComparison> {
    let mut comparisons: Vec<BudgetComparison> = budgets
        .iter()
        .filter(|budget| budget.month == month && budget.category_id > 0)
        .filter_map(|budget| {
            let category = categories
                .iter()
                .find(|category| category.id == budget.category_id)?;

            let spent: f64 = transactions
                .iter()
                .filter(|transaction| {
                    transaction.category_id == Some(budget.category_id)
                        && transaction.date.is_some_and(|date| month.contains(date))
                })
                .map(Transaction::expense_amount)
                .sum();

            Some(BudgetComparison {
                budget_id: budget.id,
                category_id: budget.category_id,
                category_name: category.name.to_string(),
                budget: budget.amount,
                spent,
                remaining: (budget.amount - spent).max(0.0),
                over_budget: (spent - budget.amount).max(0.0),
                utilization_percent: budget_utilization(spent, budget.amount),
            })
        })
        .collect();

    comparisons.sort_by(|a, b| b.spent.total_cmp(&a.spent));

    comparisons
}

/// The sum of the budget amounts for `month`.
pub fn total_budget_for_month(budgets: &[Budget], month: Month) -> f64 {
    budgets
        .iter()
        .filter(|budget| budget.month == month)
        .map(|budget| budget.amount)
        .sum()
}

/// `spent` as a percentage of `budget`, capped at 100.
///
/// # Returns
/// Zero when there is no positive budget to compare against.
pub fn budget_utilization(spent: f64, budget: f64) -> f64 {
    if budget > 0.0 {
        (spent / budget * 100.0).min(100.0)
    } else {
        0.0
    }
}

/// The comparisons where more was spent than budgeted.
pub fn over_budget_categories(comparisons: &[BudgetComparison]) -> Vec<BudgetComparison> {
    comparisons
        .iter()
        .filter(|comparison| comparison.is_over_budget())
        .cloned()
        .collect()
}

/// The percentage change from `previous` to `current`.
///
/// # Returns
/// 100 if spending started from nothing, 0 if there was nothing in either
/// period.
pub fn period_over_period_change(current: f64, previous: f64) -> f64 {
    if previous > 0.0 {
        (current - previous) / previous * 100.0
    } else if current > 0.0 {
        100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{
        budget::Budget,
        category::{Category, CategoryName, CategorySnapshot, CategoryType},
        month::Month,
        transaction::Transaction,
    };

    use super::{
        budget_utilization, budget_vs_actual, over_budget_categories, period_over_period_change,
        total_budget_for_month,
    };

    fn create_test_transaction(id: i64, amount: f64, date: Date, category_id: i64) -> Transaction {
        Transaction {
            id,
            amount: Some(amount),
            description: format!("transaction {id}"),
            date: Some(date),
            category_id: Some(category_id),
            category: None,
            kind: None,
        }
    }

    fn create_test_budget(id: i64, category_id: i64, month: &str, amount: f64) -> Budget {
        Budget {
            id,
            amount,
            month: Month::parse(month).unwrap(),
            category_id,
            category: CategorySnapshot {
                id: category_id,
                name: format!("Category {category_id}"),
            },
        }
    }

    fn create_test_categories() -> Vec<Category> {
        [(1, "Food"), (2, "Transport"), (3, "Housing")]
            .into_iter()
            .map(|(id, name)| Category {
                id,
                name: CategoryName::new_unchecked(name),
                kind: CategoryType::Expense,
                color: None,
                icon: None,
            })
            .collect()
    }

    fn march() -> Month {
        Month::parse("2024-03").unwrap()
    }

    #[test]
    fn reports_overspending() {
        let transactions = vec![
            create_test_transaction(1, 70.0, date!(2024 - 03 - 02), 3),
            create_test_transaction(2, 50.0, date!(2024 - 03 - 20), 3),
            create_test_transaction(3, 500.0, date!(2024 - 04 - 01), 3),
        ];
        let budgets = vec![create_test_budget(1, 3, "2024-03", 100.0)];

        let comparisons =
            budget_vs_actual(&transactions, &budgets, &create_test_categories(), march());

        assert_eq!(comparisons.len(), 1);
        let comparison = &comparisons[0];
        assert_eq!(comparison.category_name, "Housing");
        assert_eq!(comparison.spent, 120.0);
        assert_eq!(comparison.remaining, 0.0);
        assert_eq!(comparison.over_budget, 20.0);
        assert_eq!(comparison.utilization_percent, 100.0);
        assert_eq!(over_budget_categories(&comparisons), comparisons);
    }

    #[test]
    fn zero_budget_has_zero_utilization() {
        let transactions = vec![create_test_transaction(1, 10.0, date!(2024 - 03 - 02), 1)];
        let budgets = vec![create_test_budget(1, 1, "2024-03", 0.0)];

        let comparisons =
            budget_vs_actual(&transactions, &budgets, &create_test_categories(), march());

        assert_eq!(comparisons[0].utilization_percent, 0.0);
        assert!(comparisons[0].utilization_percent.is_finite());
    }

    #[test]
    fn skips_other_months_and_unknown_categories() {
        let budgets = vec![
            create_test_budget(1, 1, "2024-04", 100.0),
            create_test_budget(2, 0, "2024-03", 100.0),
            create_test_budget(3, 42, "2024-03", 100.0),
            create_test_budget(4, 2, "2024-03", 100.0),
        ];

        let comparisons = budget_vs_actual(&[], &budgets, &create_test_categories(), march());

        let ids: Vec<_> = comparisons.iter().map(|c| c.budget_id).collect();
        assert_eq!(ids, [4]);
        assert_eq!(comparisons[0].remaining, 100.0);
        assert!(over_budget_categories(&comparisons).is_empty());
    }

    #[test]
    fn sorts_by_amount_spent() {
        let transactions = vec![
            create_test_transaction(1, 10.0, date!(2024 - 03 - 02), 1),
            create_test_transaction(2, 30.0, date!(2024 - 03 - 02), 2),
        ];
        let budgets = vec![
            create_test_budget(1, 1, "2024-03", 100.0),
            create_test_budget(2, 2, "2024-03", 100.0),
        ];

        let comparisons =
            budget_vs_actual(&transactions, &budgets, &create_test_categories(), march());

        let names: Vec<_> = comparisons.iter().map(|c| c.category_name.as_str()).collect();
        assert_eq!(names, ["Transport", "Food"]);
    }

    #[test]
    fn total_budget_counts_only_the_month() {
        let budgets = vec![
            create_test_budget(1, 1, "2024-03", 100.0),
            create_test_budget(2, 2, "2024-03", 50.0),
            create_test_budget(3, 2, "2024-04", 75.0),
        ];

        assert_eq!(total_budget_for_month(&budgets, march()), 150.0);
    }

    #[test]
    fn utilization_is_capped_and_guarded() {
        assert_eq!(budget_utilization(50.0, 200.0), 25.0);
        assert_eq!(budget_utilization(300.0, 200.0), 100.0);
        assert_eq!(budget_utilization(300.0, 0.0), 0.0);
    }

    #[test]
    fn period_over_period_change_handles_empty_previous_period() {
        assert_eq!(period_over_period_change(150.0, 100.0), 50.0);
        assert_eq!(period_over_period_change(50.0, 100.0), -50.0);
        assert_eq!(period_over_period_change(10.0, 0.0), 100.0);
        assert_eq!(period_over_period_change(0.0, 0.0), 0.0);
    }
}
