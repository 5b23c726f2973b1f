//! Database setup and helpers shared by the persistence modules.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, budget::create_budget_table, category::create_category_table,
    transaction::create_transaction_table,
};

/// Create the tables for categories, transactions and budgets.
///
/// Foreign key enforcement is switched on for `connection` since SQLite
/// leaves it off by default and the budget and transaction tables rely on it.
///
/// # Errors
/// Returns an [Error::SqlError] if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

/// The kind of SQLite constraint that caused a statement to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Constraint {
    Unique,
    ForeignKey,
}

/// Get the constraint that `error` violated, if any.
pub(crate) fn violated_constraint(error: &rusqlite::Error) -> Option<Constraint> {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Some(Constraint::Unique),
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => Some(Constraint::ForeignKey),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use super::{Constraint, initialize, violated_constraint};

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("first initialization failed");
        initialize(&connection).expect("second initialization failed");
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        let enabled: i64 = connection
            .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
            .unwrap();

        assert_eq!(enabled, 1);
    }

    #[test]
    fn classifies_constraint_violations() {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute("INSERT INTO category (name) VALUES ('Food');", [])
            .unwrap();

        let unique = connection
            .execute("INSERT INTO category (name) VALUES ('Food');", [])
            .unwrap_err();
        let foreign_key = connection
            .execute(
                "INSERT INTO budget (amount, month, category_id) VALUES (1.0, '2024-03', 999);",
                [],
            )
            .unwrap_err();
        let other = rusqlite::Error::QueryReturnedNoRows;

        assert_eq!(violated_constraint(&unique), Some(Constraint::Unique));
        assert_eq!(violated_constraint(&foreign_key), Some(Constraint::ForeignKey));
        assert_eq!(violated_constraint(&other), None);
    }
}
