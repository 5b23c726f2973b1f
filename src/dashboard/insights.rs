//! Spending insights for a single month.

use serde::Serialize;

use crate::{
    category::Category,
    dashboard::{
        aggregation::{CategoryTotal, category_totals, month_total, top_category},
        budget::{
            BudgetComparison, budget_utilization, budget_vs_actual, over_budget_categories,
            period_over_period_change, total_budget_for_month,
        },
    },
    database_id::CategoryId,
    month::Month,
    store::StoreSnapshot,
    transaction::Transaction,
};

/// The number of categories in the spending breakdown of [MonthlyInsights].
pub const BREAKDOWN_SIZE: usize = 5;

/// A category's spending and its share of all spending.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingShare {
    /// The category, `None` for uncategorized transactions.
    pub category_id: Option<CategoryId>,
    /// The display name of the category.
    pub name: String,
    /// The amount spent in the category.
    pub amount: f64,
    /// The amount as a percentage of all spending.
    pub percent: f64,
}

/// The categories with the most spending, at most `limit` of them.
///
/// Percentages are of the total over every category, not only those
/// returned.
///
/// # Returns
/// The shares, largest first, with ties ordered by name.
pub fn spending_breakdown(
    transactions: &[Transaction],
    categories: &[Category],
    limit: usize,
) -> Vec<SpendingShare> {
    let mut totals: Vec<CategoryTotal> = category_totals(transactions, categories)
        .into_iter()
        .filter(|total| total.value > 0.0)
        .collect();
    let total_spent: f64 = totals.iter().map(|total| total.value).sum();

    totals.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));

    totals
        .into_iter()
        .take(limit)
        .map(|total| SpendingShare {
            category_id: total.category_id,
            percent: if total_spent > 0.0 {
                total.value / total_spent * 100.0
            } else {
                0.0
            },
            name: total.name,
            amount: total.value,
        })
        .collect()
}

/// Spending in one month compared with the month before and its budgets.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyInsights {
    /// The month the insights are for.
    pub month: Month,
    /// The expenses during the month.
    pub total_spent: f64,
    /// The expenses during the previous month.
    pub previous_month_spent: f64,
    /// The percentage change from the previous month.
    pub change_percent: f64,
    /// The sum of the budgets for the month.
    pub total_budget: f64,
    /// The share of the total budget spent as a percentage, capped at 100.
    pub budget_utilization: f64,
    /// The budgets that were exceeded.
    pub over_budget: Vec<BudgetComparison>,
    /// The category with the most spending, if anything was spent.
    pub top_category: Option<CategoryTotal>,
    /// The categories with the most spending.
    pub breakdown: Vec<SpendingShare>,
}

impl MonthlyInsights {
    /// Compute the insights for `month` from a store snapshot.
    pub fn compute(snapshot: &StoreSnapshot, month: Month) -> Self {
        let in_month: Vec<Transaction> = snapshot
            .transactions
            .iter()
            .filter(|transaction| transaction.date.is_some_and(|date| month.contains(date)))
            .cloned()
            .collect();

        let total_spent = month_total(&in_month, month);
        let previous_month_spent = month_total(&snapshot.transactions, month.previous());
        let total_budget = total_budget_for_month(&snapshot.budgets, month);
        let comparisons = budget_vs_actual(
            &in_month,
            &snapshot.budgets,
            &snapshot.categories,
            month,
        );
        let totals = category_totals(&in_month, &snapshot.categories);

        Self {
            month,
            total_spent,
            previous_month_spent,
            change_percent: period_over_period_change(total_spent, previous_month_spent),
            total_budget,
            budget_utilization: budget_utilization(total_spent, total_budget),
            over_budget: over_budget_categories(&comparisons),
            top_category: top_category(&totals).cloned(),
            breakdown: spending_breakdown(&in_month, &snapshot.categories, BREAKDOWN_SIZE),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{
        budget::Budget,
        category::{Category, CategoryName, CategorySnapshot, CategoryType},
        month::Month,
        store::StoreSnapshot,
        transaction::Transaction,
    };

    use super::{MonthlyInsights, spending_breakdown};

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

    fn create_test_categories() -> Vec<Category> {
        (1..=7)
            .map(|id| Category {
                id,
                name: CategoryName::new_unchecked(&format!("C{id}")),
                kind: CategoryType::Expense,
                color: None,
                icon: None,
            })
            .collect()
    }

    #[test]
    fn breakdown_keeps_largest_categories_with_share_of_everything() {
        let transactions: Vec<_> = (1..=7)
            .map(|id| create_test_transaction(id, 10.0 * id as f64, date!(2024 - 03 - 01), id))
            .collect();

        let breakdown = spending_breakdown(&transactions, &create_test_categories(), 5);

        let names: Vec<_> = breakdown.iter().map(|share| share.name.as_str()).collect();
        assert_eq!(names, ["C7", "C6", "C5", "C4", "C3"]);
        // 70 of a total of 280.
        assert_eq!(breakdown[0].percent, 25.0);
    }

    #[test]
    fn breakdown_of_nothing_is_empty() {
        assert!(spending_breakdown(&[], &create_test_categories(), 5).is_empty());
    }

    #[test]
    fn compares_month_with_previous_month_and_budgets() {
        let march = Month::parse("2024-03").unwrap();
        let snapshot = StoreSnapshot {
            transactions: vec![
                create_test_transaction(1, 120.0, date!(2024 - 03 - 10), 1),
                create_test_transaction(2, 30.0, date!(2024 - 03 - 11), 2),
                create_test_transaction(3, 100.0, date!(2024 - 02 - 10), 1),
            ],
            categories: create_test_categories(),
            budgets: vec![
                Budget {
                    id: 1,
                    amount: 100.0,
                    month: march,
                    category_id: 1,
                    category: CategorySnapshot {
                        id: 1,
                        name: "C1".to_owned(),
                    },
                },
                Budget {
                    id: 2,
                    amount: 200.0,
                    month: march,
                    category_id: 2,
                    category: CategorySnapshot {
                        id: 2,
                        name: "C2".to_owned(),
                    },
                },
            ],
        };

        let insights = MonthlyInsights::compute(&snapshot, march);

        assert_eq!(insights.total_spent, 150.0);
        assert_eq!(insights.previous_month_spent, 100.0);
        assert_eq!(insights.change_percent, 50.0);
        assert_eq!(insights.total_budget, 300.0);
        assert_eq!(insights.budget_utilization, 50.0);
        assert_eq!(insights.over_budget.len(), 1);
        assert_eq!(insights.over_budget[0].over_budget, 20.0);
        assert_eq!(
            insights.top_category.map(|total| total.name),
            Some("C1".to_owned())
        );
        assert_eq!(insights.breakdown.len(), 2);
    }

    #[test]
    fn empty_month_has_zeroed_insights() {
        let insights = MonthlyInsights::compute(
            &StoreSnapshot::default(),
            Month::parse("2024-01").unwrap(),
        );

        assert_eq!(insights.total_spent, 0.0);
        assert_eq!(insights.change_percent, 0.0);
        assert_eq!(insights.budget_utilization, 0.0);
        assert_eq!(insights.top_category, None);
        assert!(insights.over_budget.is_empty());
    }
}
