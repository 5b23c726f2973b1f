//! Transaction aggregation for the dashboard charts and cards.
//!
//! Every function here is pure. Only expenses count towards totals, see
//! [Transaction::expense_amount].

use std::collections::HashMap;

use serde::Serialize;

use crate::{
    category::{Category, UNCATEGORIZED_LABEL},
    database_id::CategoryId,
    month::{MONTH_LABELS, Month},
    transaction::Transaction,
};

/// The amount spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    /// The category, `None` for uncategorized transactions.
    pub category_id: Option<CategoryId>,
    /// The display name of the category.
    pub name: String,
    /// The sum of the expense amounts.
    pub value: f64,
}

/// The amount spent in one month, labelled for a chart axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyAmount {
    /// The three-letter month label, e.g. "Mar".
    pub name: &'static str,
    /// The sum of the expense amounts.
    pub amount: f64,
}

/// Groups transactions by category and sums their expense amounts.
///
/// Category names come from the transaction's category snapshot, then from
/// `categories`, and fall back to a placeholder so that totals can be shown
/// before categories have loaded.
///
/// # Returns
/// One entry per category in the order the categories were first seen.
pub fn category_totals(transactions: &[Transaction], categories: &[Category]) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = Vec::new();
    let mut positions: HashMap<Option<CategoryId>, usize> = HashMap::new();

    for transaction in transactions {
        let category_id = transaction
            .category_id
            .or_else(|| transaction.category.as_ref().map(|category| category.id));

        let position = *positions.entry(category_id).or_insert_with(|| {
            totals.push(CategoryTotal {
                category_id,
                name: category_name(transaction, category_id, categories),
                value: 0.0,
            });
            totals.len() - 1
        });

        totals[position].value += transaction.expense_amount();
    }

    totals
}

fn category_name(
    transaction: &Transaction,
    category_id: Option<CategoryId>,
    categories: &[Category],
) -> String {
    if let Some(snapshot) = &transaction.category {
        return snapshot.name.clone();
    }

    let Some(category_id) = category_id else {
        return UNCATEGORIZED_LABEL.to_owned();
    };

    categories
        .iter()
        .find(|category| category.id == category_id)
        .map(|category| category.name.to_string())
        .unwrap_or_else(|| format!("Category {category_id}"))
}

/// Removes the categories with nothing spent, e.g. for a pie chart.
pub fn non_zero(totals: Vec<CategoryTotal>) -> Vec<CategoryTotal> {
    totals.into_iter().filter(|total| total.value > 0.0).collect()
}

/// The category with the most spent.
///
/// Ties go to the category whose name sorts first.
///
/// # Returns
/// `None` if nothing was spent in any category.
pub fn top_category(totals: &[CategoryTotal]) -> Option<&CategoryTotal> {
    totals
        .iter()
        .filter(|total| total.value > 0.0)
        .min_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)))
}

/// Sums expenses for each month of `year`.
///
/// # Returns
/// Exactly twelve entries, January first, with zero for months without
/// expenses. Undated transactions are left out.
pub fn monthly_series(transactions: &[Transaction], year: i32) -> Vec<MonthlyAmount> {
    let mut amounts = [0.0; 12];

    for transaction in transactions {
        let Some(date) = transaction.date else {
            continue;
        };

        if date.year() == year {
            amounts[usize::from(u8::from(date.month())) - 1] += transaction.expense_amount();
        }
    }

    MONTH_LABELS
        .into_iter()
        .zip(amounts)
        .map(|(name, amount)| MonthlyAmount { name, amount })
        .collect()
}

/// The sum of the expense amounts of `transactions`.
pub fn total_expenses(transactions: &[Transaction]) -> f64 {
    transactions.iter().map(Transaction::expense_amount).sum()
}

/// The yearly total spread evenly over twelve months, however many months
/// actually had expenses.
pub fn average_monthly(total_expenses: f64) -> f64 {
    total_expenses / 12.0
}

/// The sum of the expense amounts dated in `month`.
pub fn month_total(transactions: &[Transaction], month: Month) -> f64 {
    transactions
        .iter()
        .filter(|transaction| transaction.date.is_some_and(|date| month.contains(date)))
        .map(Transaction::expense_amount)
        .sum()
}

/// The transactions dated in `year`.
pub fn transactions_in_year(transactions: &[Transaction], year: i32) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|transaction| transaction.date.is_some_and(|date| date.year() == year))
        .cloned()
        .collect()
}

/// The `count` most recent transactions, undated ones last.
pub fn recent_transactions(transactions: &[Transaction], count: usize) -> Vec<Transaction> {
    let mut sorted = transactions.to_vec();
    // `None` sorts before any date, so comparing in reverse puts undated transactions last.
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(count);
    sorted
}
