//! Defines the core data models for transactions.

use serde::{Deserialize, Deserializer, Serialize};
use time::{Date, macros::format_description};

use crate::{
    Error,
    category::{CategorySnapshot, CategoryType},
    database_id::{CategoryId, TransactionId},
};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned, as a positive magnitude.
    ///
    /// `None` when the gateway sent no usable amount; such a transaction
    /// contributes nothing to totals.
    #[serde(default)]
    pub amount: Option<f64>,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
    /// When the transaction happened.
    ///
    /// `None` when the gateway sent a date that could not be parsed; such a
    /// transaction is left out of anything bucketed by month.
    #[serde(default, with = "iso_date::option")]
    pub date: Option<Date>,
    /// The ID of the category the transaction belongs to.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    /// The category's id and name at the time the transaction was read.
    #[serde(default)]
    pub category: Option<CategorySnapshot>,
    /// Whether the transaction is an expense or income, if known.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CategoryType>,
}

impl Transaction {
    /// Whether the transaction counts towards spending.
    ///
    /// Only transactions explicitly marked as income are excluded.
    pub fn is_expense(&self) -> bool {
        self.kind != Some(CategoryType::Income)
    }

    /// The magnitude this transaction adds to expense totals.
    ///
    /// Income, missing amounts and non-finite amounts contribute zero.
    pub fn expense_amount(&self) -> f64 {
        if !self.is_expense() {
            return 0.0;
        }

        match self.amount {
            Some(amount) if amount.is_finite() => amount.abs(),
            _ => 0.0,
        }
    }
}

/// The data for creating a new transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// The amount of money spent or earned, must be positive.
    pub amount: f64,
    /// What the transaction was for, must not be empty.
    pub description: String,
    /// When the transaction happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// The category to file the transaction under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    /// Whether the transaction is an expense or income.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<CategoryType>,
}

impl NewTransaction {
    /// Create the data for an uncategorized transaction.
    pub fn new(amount: f64, description: &str, date: Date) -> Self {
        Self {
            amount,
            description: description.to_owned(),
            date,
            category_id: None,
            kind: None,
        }
    }

    /// Set the category of the transaction.
    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    /// Mark the transaction as an expense or income.
    pub fn kind(mut self, kind: Option<CategoryType>) -> Self {
        self.kind = kind;
        self
    }

    /// Check the amount and description.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the amount is not a positive number,
    /// - or [Error::EmptyDescription] if the description is empty.
    pub fn validate(&self) -> Result<(), Error> {
        validate_amount(self.amount)?;
        validate_description(&self.description)
    }
}

/// A partial update to a transaction, only the fields that are `Some` change.
///
/// `category_id` has three states: `None` leaves the category alone,
/// `Some(None)` removes the category, and `Some(Some(id))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    /// The new amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// The new description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The new date.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "iso_date::option"
    )]
    pub date: Option<Date>,
    /// The new category, see the type docs for the meaning of each state.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub category_id: Option<Option<CategoryId>>,
}

impl TransactionPatch {
    /// Change the amount.
    pub fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Change the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }

    /// Change the date.
    pub fn date(mut self, date: Date) -> Self {
        self.date = Some(date);
        self
    }

    /// Set or, with `None`, remove the category.
    pub fn category(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.category_id.is_none()
    }

    /// Check the fields that are being changed.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::InvalidAmount] if the new amount is not a positive number,
    /// - or [Error::EmptyDescription] if the new description is empty.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }

        if let Some(description) = &self.description {
            validate_description(description)?;
        }

        Ok(())
    }
}

// ============================================================================
// PARSING AND VALIDATION
// ============================================================================

/// Parse a calendar date from `YYYY-MM-DD` or the date part of an ISO 8601
/// date-time such as `2024-03-05T00:00:00.000Z`.
///
/// # Errors
/// Returns an [Error::InvalidDate] if `text` does not start with a valid date.
pub fn parse_date(text: &str) -> Result<Date, Error> {
    let text = text.trim();
    let invalid = || Error::InvalidDate(text.to_owned());

    let date_part = match text.char_indices().nth(10) {
        None => text,
        Some((index, 'T' | ' ')) => &text[..index],
        Some(_) => return Err(invalid()),
    };

    Date::parse(date_part, format_description!("[year]-[month]-[day]")).map_err(|_| invalid())
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount(amount))
    }
}

fn validate_description(description: &str) -> Result<(), Error> {
    if description.trim().is_empty() {
        Err(Error::EmptyDescription)
    } else {
        Ok(())
    }
}

/// Deserialize a field that distinguishes "absent" from "null".
///
/// Use with `#[serde(default)]` so that an absent field becomes `None` and an
/// explicit `null` becomes `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        category::CategoryType,
        transaction::{NewTransaction, Transaction, TransactionPatch, parse_date},
    };

    fn transaction(amount: Option<f64>, kind: Option<CategoryType>) -> Transaction {
        Transaction {
            id: 1,
            amount,
            description: "Test".to_owned(),
            date: Some(date!(2024 - 03 - 05)),
            category_id: None,
            category: None,
            kind,
        }
    }

    #[test]
    fn expense_amount_uses_magnitude() {
        assert_eq!(transaction(Some(-12.5), None).expense_amount(), 12.5);
        assert_eq!(
            transaction(Some(12.5), Some(CategoryType::Expense)).expense_amount(),
            12.5
        );
    }

    #[test]
    fn expense_amount_ignores_income_and_missing_amounts() {
        assert_eq!(
            transaction(Some(100.0), Some(CategoryType::Income)).expense_amount(),
            0.0
        );
        assert_eq!(transaction(None, None).expense_amount(), 0.0);
        assert_eq!(transaction(Some(f64::NAN), None).expense_amount(), 0.0);
    }

    #[test]
    fn validate_rejects_non_positive_amounts() {
        for amount in [0.0, -1.0, f64::INFINITY] {
            let new_transaction = NewTransaction::new(amount, "Coffee", date!(2024 - 03 - 05));

            assert_eq!(new_transaction.validate(), Err(Error::InvalidAmount(amount)));
        }
    }

    #[test]
    fn validate_rejects_blank_description() {
        let new_transaction = NewTransaction::new(4.5, "  ", date!(2024 - 03 - 05));

        assert_eq!(new_transaction.validate(), Err(Error::EmptyDescription));
    }

    #[test]
    fn parse_date_accepts_date_and_date_time() {
        assert_eq!(parse_date("2024-03-05"), Ok(date!(2024 - 03 - 05)));
        assert_eq!(
            parse_date("2024-03-05T00:00:00.000Z"),
            Ok(date!(2024 - 03 - 05))
        );
    }

    #[test]
    fn parse_date_rejects_invalid_dates() {
        for text in ["2024-02-30", "05/03/2024", "2024-03-05x", ""] {
            assert_eq!(
                parse_date(text),
                Err(Error::InvalidDate(text.to_owned())),
                "{text:?} should be rejected"
            );
        }
    }

    #[test]
    fn new_transaction_serializes_with_camel_case_keys() {
        let new_transaction =
            NewTransaction::new(42.5, "Coffee", date!(2024 - 03 - 05)).category(Some(3));

        let value = serde_json::to_value(&new_transaction).unwrap();

        assert_eq!(
            value,
            json!({"amount": 42.5, "description": "Coffee", "date": "2024-03-05", "categoryId": 3})
        );
    }

    #[test]
    fn patch_only_serializes_changed_fields() {
        let patch = TransactionPatch::default().amount(10.0).category(None);

        let value = serde_json::to_value(&patch).unwrap();

        assert_eq!(value, json!({"amount": 10.0, "categoryId": null}));
    }

    #[test]
    fn patch_distinguishes_null_from_absent_category() {
        let cleared: TransactionPatch = serde_json::from_value(json!({"categoryId": null})).unwrap();
        let untouched: TransactionPatch = serde_json::from_value(json!({"amount": 1.0})).unwrap();

        assert_eq!(cleared.category_id, Some(None));
        assert_eq!(untouched.category_id, None);
        assert!(TransactionPatch::default().is_empty());
    }
}
