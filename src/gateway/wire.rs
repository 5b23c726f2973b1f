//! Mapping from the JSON the gateway sends to the strict internal types.
//!
//! This is the only place that tolerates inconsistent field casing, numbers
//! sent as strings and missing fields. Everything past this module works with
//! [Transaction], [Category] and [Budget] values that are already normalised.

use serde_json::Value;

use crate::{
    ClientError,
    budget::Budget,
    category::{Category, CategoryName, CategorySnapshot, CategoryType, UNCATEGORIZED_LABEL},
    database_id::DatabaseId,
    month::Month,
    transaction::{Transaction, parse_date},
};

/// Parse a list of transactions, skipping items without an ID.
///
/// # Errors
/// Returns a [ClientError::Server] if `value` is not an array.
pub fn parse_transactions(value: Value) -> Result<Vec<Transaction>, ClientError> {
    parse_list(value, "transaction", parse_transaction)
}

/// Parse a list of categories, skipping items without an ID or name.
///
/// # Errors
/// Returns a [ClientError::Server] if `value` is not an array.
pub fn parse_categories(value: Value) -> Result<Vec<Category>, ClientError> {
    parse_list(value, "category", parse_category)
}

/// Parse a list of budgets, skipping items without an ID, a month or a
/// category.
///
/// # Errors
/// Returns a [ClientError::Server] if `value` is not an array.
pub fn parse_budgets(value: Value) -> Result<Vec<Budget>, ClientError> {
    parse_list(value, "budget", parse_budget)
}

/// Parse the single item returned by a write.
///
/// # Errors
/// Returns a [ClientError::Server] if `parse` cannot map `value`.
pub fn parse_one<T>(
    value: Value,
    what: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Result<T, ClientError> {
    parse(&value).ok_or_else(|| {
        tracing::warn!("could not read {what} from gateway response: {value}");
        ClientError::Server(format!("The server sent an unreadable {what}"))
    })
}

fn parse_list<T>(
    value: Value,
    what: &str,
    parse: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>, ClientError> {
    let Value::Array(items) = value else {
        tracing::warn!("expected a list of {what} items from the gateway, got: {value}");
        return Err(ClientError::Server(format!(
            "The server sent an unreadable list of {what} items"
        )));
    };

    Ok(items
        .iter()
        .filter_map(|item| {
            let parsed = parse(item);
            if parsed.is_none() {
                tracing::warn!("skipping malformed {what}: {item}");
            }
            parsed
        })
        .collect())
}

/// Map a transaction, `None` if it has no ID.
///
/// A missing or non-numeric amount and an unparseable date are kept as
/// `None` rather than rejecting the whole transaction.
pub fn parse_transaction(value: &Value) -> Option<Transaction> {
    let id = integer(value.get("id"))?;

    let snapshot = value.get("category").and_then(parse_snapshot);
    let category_id = positive_id(value.get("categoryId"))
        .or_else(|| positive_id(value.get("categoryid")))
        .or_else(|| snapshot.as_ref().map(|category| category.id));
    let category = snapshot.filter(|category| Some(category.id) == category_id);

    Some(Transaction {
        id,
        amount: number(value.get("amount")),
        description: string(value.get("description")).unwrap_or_default().to_owned(),
        date: string(value.get("date")).and_then(|date| parse_date(date).ok()),
        category_id,
        category,
        kind: string(value.get("type")).and_then(|kind| kind.parse::<CategoryType>().ok()),
    })
}

/// Map a category, `None` if it has no ID or an empty name.
pub fn parse_category(value: &Value) -> Option<Category> {
    Some(Category {
        id: integer(value.get("id"))?,
        name: CategoryName::new(string(value.get("name"))?).ok()?,
        kind: string(value.get("type"))
            .and_then(|kind| kind.parse().ok())
            .unwrap_or_default(),
        color: string(value.get("color")).map(str::to_owned),
        icon: string(value.get("icon")).map(str::to_owned),
    })
}

/// Map a budget, `None` if it has no ID, no valid month, or no positive
/// category ID.
///
/// The category ID is read from `categoryId`, then `categoryid`, then
/// `category.id`. The amount falls back to zero and the category name to
/// [UNCATEGORIZED_LABEL].
pub fn parse_budget(value: &Value) -> Option<Budget> {
    let id = integer(value.get("id"))?;
    let month = string(value.get("month")).and_then(|month| Month::parse(month).ok())?;

    let category_value = value.get("category");
    let category_id = positive_id(value.get("categoryId"))
        .or_else(|| positive_id(value.get("categoryid")))
        .or_else(|| positive_id(category_value.and_then(|category| category.get("id"))))?;
    let category_name = category_value
        .and_then(|category| string(category.get("name")))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNCATEGORIZED_LABEL);

    Some(Budget {
        id,
        amount: number(value.get("amount")).unwrap_or(0.0),
        month,
        category_id,
        category: CategorySnapshot {
            id: category_id,
            name: category_name.to_owned(),
        },
    })
}

fn parse_snapshot(value: &Value) -> Option<CategorySnapshot> {
    Some(CategorySnapshot {
        id: positive_id(value.get("id"))?,
        name: string(value.get("name"))?.to_owned(),
    })
}

fn string(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

/// A finite number sent either as a JSON number or a numeric string.
fn number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }?;

    number.is_finite().then_some(number)
}

/// A whole number sent either as a JSON number or a numeric string.
fn integer(value: Option<&Value>) -> Option<DatabaseId> {
    match value? {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn positive_id(value: Option<&Value>) -> Option<DatabaseId> {
    integer(value).filter(|id| *id > 0)
}
