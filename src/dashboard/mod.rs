//! Dashboard derivations
//!
//! Pure functions that compute the dashboard's totals, chart series and
//! budget comparisons from a [crate::StoreSnapshot]. Nothing here mutates
//! the store.

mod aggregation;
mod budget;
mod insights;
mod summary;

pub use aggregation::{
    CategoryTotal, MonthlyAmount, average_monthly, category_totals, month_total, monthly_series,
    non_zero, recent_transactions, top_category, total_expenses, transactions_in_year,
};
pub use budget::{
    BudgetComparison, budget_utilization, budget_vs_actual, over_budget_categories,
    period_over_period_change, total_budget_for_month,
};
pub use insights::{BREAKDOWN_SIZE, MonthlyInsights, SpendingShare, spending_breakdown};
pub use summary::{DashboardSummary, NO_CATEGORIES_LABEL, RECENT_TRANSACTION_COUNT};
