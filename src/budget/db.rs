//! Database queries for budgets.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    budget::{Budget, NewBudget},
    category::{CategorySnapshot, get_all_categories},
    database_id::BudgetId,
    db::{Constraint, violated_constraint},
    month::Month,
};

const SELECT_BUDGET: &str = "SELECT b.id, b.amount, b.month, b.category_id, c.name
     FROM budget b
     INNER JOIN category c ON c.id = b.category_id";

/// Create the budget for the category and month, or replace the amount of
/// the existing one.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::InvalidCategory] if the data is invalid,
/// - [Error::InvalidCategory] if the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn upsert_budget(new_budget: NewBudget, connection: &Connection) -> Result<Budget, Error> {
    new_budget.validate()?;

    let id: BudgetId = connection
        .prepare(
            "INSERT INTO budget (amount, month, category_id) VALUES (?1, ?2, ?3)
             ON CONFLICT(category_id, month) DO UPDATE SET amount = excluded.amount
             RETURNING id",
        )?
        .query_row(
            (new_budget.amount, new_budget.month, new_budget.category_id),
            |row| row.get(0),
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::ForeignKey) => Error::InvalidCategory(Some(new_budget.category_id)),
            _ => error.into(),
        })?;

    get_budget(id, connection)
}

/// Retrieve a budget by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid budget,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_budget(id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    let budget = connection
        .prepare(&format!("{SELECT_BUDGET} WHERE b.id = :id"))?
        .query_row(&[(":id", &id)], map_budget_row)?;

    Ok(budget)
}

/// Get budgets ordered by category name, optionally only those for `month`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_budgets(month: Option<Month>, connection: &Connection) -> Result<Vec<Budget>, Error> {
    let order_clause = "ORDER BY c.name ASC, b.month ASC";

    match month {
        Some(month) => connection
            .prepare(&format!("{SELECT_BUDGET} WHERE b.month = ?1 {order_clause}"))?
            .query_map([month], map_budget_row)?
            .map(|budget_result| budget_result.map_err(Error::SqlError))
            .collect(),
        None => connection
            .prepare(&format!("{SELECT_BUDGET} {order_clause}"))?
            .query_map([], map_budget_row)?
            .map(|budget_result| budget_result.map_err(Error::SqlError))
            .collect(),
    }
}

/// Replace the amount, month and category of the budget with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::InvalidCategory] if the data is invalid,
/// - [Error::InvalidCategory] if the category does not exist,
/// - [Error::DuplicateBudget] if another budget already has the category and month,
/// - [Error::UpdateMissingBudget] if `id` does not refer to a budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_budget(
    id: BudgetId,
    new_budget: NewBudget,
    connection: &Connection,
) -> Result<Budget, Error> {
    new_budget.validate()?;

    let rows_affected = connection
        .execute(
            "UPDATE budget SET amount = ?1, month = ?2, category_id = ?3 WHERE id = ?4",
            (
                new_budget.amount,
                new_budget.month,
                new_budget.category_id,
                id,
            ),
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::Unique) => {
                Error::DuplicateBudget(new_budget.category_id, new_budget.month)
            }
            Some(Constraint::ForeignKey) => Error::InvalidCategory(Some(new_budget.category_id)),
            None => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    get_budget(id, connection)
}

/// Delete the budget with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingBudget] if `id` does not refer to a budget,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_budget(id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = :id", &[(":id", &id)])?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingBudget)
    } else {
        Ok(())
    }
}

/// Create the budget table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                month TEXT NOT NULL,
                category_id INTEGER NOT NULL,
                UNIQUE(category_id, month),
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_budget_month ON budget(month);",
        (),
    )?;

    Ok(())
}

/// Create a budget for every category in every month of `year`.
///
/// Returns the number of budgets created or replaced.
///
/// # Errors
/// Returns an [Error::SqlError] if the categories could not be read or a
/// budget could not be saved.
pub fn seed_sample_budgets(year: i32, connection: &Connection) -> Result<usize, Error> {
    let categories = get_all_categories(connection)?;
    let mut month = Month::new(year, time::Month::December);
    let mut saved = 0;

    while month.year() == year {
        for (category_index, category) in categories.iter().enumerate() {
            let amount = 50.0 + 25.0 * category_index as f64;

            upsert_budget(
                NewBudget {
                    amount,
                    month,
                    category_id: category.id,
                },
                connection,
            )?;
            saved += 1;
        }

        month = month.previous();
    }

    Ok(saved)
}

fn map_budget_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let month = row.get(2)?;
    let category_id = row.get(3)?;
    let category_name = row.get(4)?;

    Ok(Budget {
        id,
        amount,
        month,
        category_id,
        category: CategorySnapshot {
            id: category_id,
            name: category_name,
        },
    })
}
