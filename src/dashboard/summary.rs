//! The yearly overview shown at the top of the dashboard.

use serde::Serialize;

use crate::{
    dashboard::aggregation::{
        CategoryTotal, MonthlyAmount, average_monthly, category_totals, monthly_series, non_zero,
        recent_transactions, top_category, total_expenses, transactions_in_year,
    },
    store::StoreSnapshot,
    transaction::Transaction,
};

/// The label shown instead of a top category when nothing was spent.
pub const NO_CATEGORIES_LABEL: &str = "No categories";

/// The number of transactions listed in [DashboardSummary::recent_transactions].
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// The totals and chart data for one year.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The year summarised.
    pub year: i32,
    /// The expenses during the year.
    pub total_expenses: f64,
    /// The name of the category with the most spending.
    pub top_category: String,
    /// The yearly expenses divided by twelve.
    pub average_monthly: f64,
    /// Spending per category, without the categories where nothing was spent.
    pub category_totals: Vec<CategoryTotal>,
    /// Spending per month, January first.
    pub monthly_series: Vec<MonthlyAmount>,
    /// The most recent transactions of the year.
    pub recent_transactions: Vec<Transaction>,
}

impl DashboardSummary {
    /// Summarise the transactions dated in `year`.
    pub fn compute(snapshot: &StoreSnapshot, year: i32) -> Self {
        let transactions = transactions_in_year(&snapshot.transactions, year);
        let totals = non_zero(category_totals(&transactions, &snapshot.categories));
        let total = total_expenses(&transactions);

        Self {
            year,
            total_expenses: total,
            top_category: top_category(&totals)
                .map(|total| total.name.clone())
                .unwrap_or_else(|| NO_CATEGORIES_LABEL.to_owned()),
            average_monthly: average_monthly(total),
            monthly_series: monthly_series(&transactions, year),
            recent_transactions: recent_transactions(&transactions, RECENT_TRANSACTION_COUNT),
            category_totals: totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{
        category::CategorySnapshot, store::StoreSnapshot, transaction::Transaction,
    };

    use super::{DashboardSummary, NO_CATEGORIES_LABEL};

    fn create_test_transaction(id: i64, amount: f64, date: Date, category: &str) -> Transaction {
        Transaction {
            id,
            amount: Some(amount),
            description: format!("transaction {id}"),
            date: Some(date),
            category_id: Some(id % 2 + 1),
            category: Some(CategorySnapshot {
                id: id % 2 + 1,
                name: category.to_owned(),
            }),
            kind: None,
        }
    }

    #[test]
    fn empty_snapshot_has_zeroed_summary() {
        let summary = DashboardSummary::compute(&StoreSnapshot::default(), 2024);

        assert_eq!(summary.total_expenses, 0.0);
        assert_eq!(summary.average_monthly, 0.0);
        assert_eq!(summary.top_category, NO_CATEGORIES_LABEL);
        assert!(summary.category_totals.is_empty());
        assert_eq!(summary.monthly_series.len(), 12);
        assert!(summary.recent_transactions.is_empty());
    }

    #[test]
    fn summarises_only_the_given_year() {
        let snapshot = StoreSnapshot {
            transactions: vec![
                create_test_transaction(1, 1000.0, date!(2024 - 03 - 01), "Food"),
                create_test_transaction(2, 200.0, date!(2024 - 07 - 01), "Transport"),
                create_test_transaction(3, 5000.0, date!(2023 - 07 - 01), "Transport"),
            ],
            ..StoreSnapshot::default()
        };

        let summary = DashboardSummary::compute(&snapshot, 2024);

        assert_eq!(summary.total_expenses, 1200.0);
        assert_eq!(summary.average_monthly, 100.0);
        assert_eq!(summary.top_category, "Food");
        assert_eq!(summary.category_totals.len(), 2);
        assert_eq!(summary.monthly_series[2].amount, 1000.0);
        let recent: Vec<_> = summary.recent_transactions.iter().map(|t| t.id).collect();
        assert_eq!(recent, [2, 1]);
    }

    #[test]
    fn lists_five_recent_transactions() {
        let transactions = (1..=8)
            .map(|day| {
                let date = Date::from_calendar_date(2024, time::Month::May, day).unwrap();
                create_test_transaction(i64::from(day), 1.0, date, "Food")
            })
            .collect();
        let snapshot = StoreSnapshot {
            transactions,
            ..StoreSnapshot::default()
        };

        let summary = DashboardSummary::compute(&snapshot, 2024);

        let recent: Vec<_> = summary.recent_transactions.iter().map(|t| t.id).collect();
        assert_eq!(recent, [8, 7, 6, 5, 4]);
    }
}
