//! Database queries for transactions.

use rusqlite::{Connection, Row, params_from_iter, types::Value};
use time::{Date, Month as CalendarMonth};

use crate::{
    Error,
    category::{CategorySnapshot, get_all_categories},
    database_id::{CategoryId, TransactionId},
    db::{Constraint, violated_constraint},
    transaction::{NewTransaction, Transaction, TransactionPatch},
};

const SELECT_TRANSACTION: &str = "SELECT t.id, t.amount, t.description, t.date, t.category_id, c.name, t.type
     FROM \"transaction\" t
     LEFT JOIN category c ON c.id = t.category_id";

/// Create a new transaction in the database.
///
/// The returned transaction includes the snapshot of its category.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::EmptyDescription] if the data is invalid,
/// - [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    new_transaction: NewTransaction,
    connection: &Connection,
) -> Result<Transaction, Error> {
    new_transaction.validate()?;

    connection
        .execute(
            "INSERT INTO \"transaction\" (amount, description, date, category_id, type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                new_transaction.amount,
                new_transaction.description.trim(),
                new_transaction.date,
                new_transaction.category_id,
                new_transaction.kind,
            ),
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::ForeignKey) => Error::InvalidCategory(new_transaction.category_id),
            _ => error.into(),
        })?;

    get_transaction(connection.last_insert_rowid(), connection)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!("{SELECT_TRANSACTION} WHERE t.id = :id"))?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get transactions, most recent first, optionally only those dated in `year`.
///
/// Transactions on the same date are ordered by descending ID so that the
/// most recently created comes first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is a SQL error.
pub fn get_transactions(year: Option<i32>, connection: &Connection) -> Result<Vec<Transaction>, Error> {
    let mut query_string_parts = vec![SELECT_TRANSACTION.to_owned()];
    let mut query_parameters = vec![];

    if let Some(year) = year {
        query_string_parts.push("WHERE t.date BETWEEN ?1 AND ?2".to_owned());
        query_parameters.push(Value::Text(format!("{year:04}-01-01")));
        query_parameters.push(Value::Text(format!("{year:04}-12-31")));
    }

    query_string_parts.push("ORDER BY t.date DESC, t.id DESC".to_owned());

    let query_string = query_string_parts.join(" ");
    let params = params_from_iter(query_parameters.iter());

    connection
        .prepare(&query_string)?
        .query_map(params, map_transaction_row)?
        .map(|transaction_result| transaction_result.map_err(Error::SqlError))
        .collect()
}

/// Apply `patch` to the transaction with `id` and return the updated transaction.
///
/// An empty patch leaves the transaction unchanged.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] or [Error::EmptyDescription] if a changed field is invalid,
/// - [Error::InvalidCategory] if the new category does not exist,
/// - [Error::UpdateMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    patch: TransactionPatch,
    connection: &Connection,
) -> Result<Transaction, Error> {
    patch.validate()?;

    let mut set_clause_parts = vec![];
    let mut query_parameters = vec![];

    if let Some(amount) = patch.amount {
        query_parameters.push(Value::Real(amount));
        set_clause_parts.push(format!("amount = ?{}", query_parameters.len()));
    }

    if let Some(description) = &patch.description {
        query_parameters.push(Value::Text(description.trim().to_owned()));
        set_clause_parts.push(format!("description = ?{}", query_parameters.len()));
    }

    if let Some(date) = patch.date {
        query_parameters.push(Value::Text(date.to_string()));
        set_clause_parts.push(format!("date = ?{}", query_parameters.len()));
    }

    if let Some(category_id) = patch.category_id {
        query_parameters.push(category_id.map_or(Value::Null, Value::Integer));
        set_clause_parts.push(format!("category_id = ?{}", query_parameters.len()));
    }

    if set_clause_parts.is_empty() {
        return get_transaction(id, connection).map_err(|error| match error {
            Error::NotFound => Error::UpdateMissingTransaction,
            error => error,
        });
    }

    query_parameters.push(Value::Integer(id));
    let query_string = format!(
        "UPDATE \"transaction\" SET {} WHERE id = ?{}",
        set_clause_parts.join(", "),
        query_parameters.len()
    );

    let rows_affected = connection
        .execute(&query_string, params_from_iter(query_parameters.iter()))
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::ForeignKey) => Error::InvalidCategory(patch.category_id.flatten()),
            _ => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingTransaction);
    }

    get_transaction(id, connection)
}

/// Delete the transaction with `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::DeleteMissingTransaction] if `id` does not refer to a transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = :id",
        &[(":id", &id)],
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingTransaction)
    } else {
        Ok(())
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                description TEXT NOT NULL,
                date TEXT NOT NULL,
                category_id INTEGER,
                type TEXT,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Add composite index used when filtering by year and grouping by category.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_category ON \"transaction\"(date, category_id);",
        (),
    )?;

    Ok(())
}

/// Create a year of sample transactions spread over every category.
///
/// Each category gets two transactions per month with amounts that vary by
/// month so that charts have some shape to them.
///
/// Returns the number of transactions created.
///
/// # Errors
/// Returns an [Error::SqlError] if the categories could not be read or a
/// transaction could not be inserted.
pub fn seed_sample_transactions(year: i32, connection: &Connection) -> Result<usize, Error> {
    let categories = get_all_categories(connection)?;
    let mut created = 0;

    for (month_index, month) in (1..=12u8).enumerate() {
        let Ok(calendar_month) = CalendarMonth::try_from(month) else {
            continue;
        };

        for (category_index, category) in categories.iter().enumerate() {
            for (day, share) in [(3u8, 0.4), (17u8, 0.6)] {
                let Ok(date) = Date::from_calendar_date(year, calendar_month, day) else {
                    continue;
                };

                let base = 40.0 + 25.0 * category_index as f64;
                let seasonal = 1.0 + 0.05 * ((month_index % 6) as f64);
                let amount = (base * seasonal * share * 100.0).round() / 100.0;

                create_transaction(
                    NewTransaction::new(amount, &format!("{} purchase", category.name), date)
                        .category(Some(category.id))
                        .kind(Some(category.kind)),
                    connection,
                )?;
                created += 1;
            }
        }
    }

    Ok(created)
}

/// Map a database row from [SELECT_TRANSACTION] to a Transaction.
fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let description = row.get(2)?;
    let date = row.get(3)?;
    let category_id: Option<CategoryId> = row.get(4)?;
    let category_name: Option<String> = row.get(5)?;
    let kind = row.get(6)?;

    let category = category_id
        .zip(category_name)
        .map(|(id, name)| CategorySnapshot { id, name });

    Ok(Transaction {
        id,
        amount: Some(amount),
        description,
        date: Some(date),
        category_id,
        category,
        kind,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        category::{CategoryType, NewCategory, create_category},
        db::initialize,
        transaction::{
            NewTransaction, TransactionPatch, create_transaction, delete_transaction,
            get_transaction, get_transactions, update_transaction,
        },
    };

    use super::seed_sample_transactions;

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_category(name: &str, conn: &Connection) -> i64 {
        create_category(
            NewCategory::new(name, CategoryType::Expense).unwrap(),
            conn,
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_includes_category_snapshot() {
        let conn = get_test_connection();
        let category_id = create_test_category("Food", &conn);

        let transaction = create_transaction(
            NewTransaction::new(42.5, "Coffee", date!(2024 - 03 - 05)).category(Some(category_id)),
            &conn,
        )
        .expect("Could not create transaction");

        assert_eq!(transaction.amount, Some(42.5));
        assert_eq!(transaction.description, "Coffee");
        assert_eq!(transaction.date, Some(date!(2024 - 03 - 05)));
        assert_eq!(transaction.category_id, Some(category_id));
        assert_eq!(
            transaction.category.map(|category| category.name),
            Some("Food".to_owned())
        );
    }

    #[test]
    fn create_fails_on_unknown_category() {
        let conn = get_test_connection();

        let result = create_transaction(
            NewTransaction::new(1.0, "Test", date!(2024 - 03 - 05)).category(Some(99)),
            &conn,
        );

        assert_eq!(result, Err(Error::InvalidCategory(Some(99))));
    }

    #[test]
    fn create_fails_on_invalid_amount() {
        let conn = get_test_connection();

        let result = create_transaction(NewTransaction::new(0.0, "Test", date!(2024 - 03 - 05)), &conn);

        assert_eq!(result, Err(Error::InvalidAmount(0.0)));
    }

    #[test]
    fn get_transactions_filters_by_year_and_sorts_by_date_desc() {
        let conn = get_test_connection();
        let older = create_transaction(NewTransaction::new(1.0, "Old", date!(2024 - 01 - 10)), &conn).unwrap();
        let newer = create_transaction(NewTransaction::new(2.0, "New", date!(2024 - 12 - 31)), &conn).unwrap();
        create_transaction(NewTransaction::new(3.0, "Other year", date!(2023 - 12 - 31)), &conn).unwrap();

        let transactions = get_transactions(Some(2024), &conn).unwrap();

        assert_eq!(transactions, vec![newer, older]);
        assert_eq!(get_transactions(None, &conn).unwrap().len(), 3);
    }

    #[test]
    fn update_changes_only_patched_fields() {
        let conn = get_test_connection();
        let category_id = create_test_category("Food", &conn);
        let transaction = create_transaction(
            NewTransaction::new(10.0, "Lunch", date!(2024 - 03 - 05)).category(Some(category_id)),
            &conn,
        )
        .unwrap();

        let updated = update_transaction(
            transaction.id,
            TransactionPatch::default().amount(12.0).description("Brunch"),
            &conn,
        )
        .unwrap();

        assert_eq!(updated.amount, Some(12.0));
        assert_eq!(updated.description, "Brunch");
        assert_eq!(updated.date, transaction.date);
        assert_eq!(updated.category_id, Some(category_id));
    }

    #[test]
    fn update_can_disconnect_and_connect_category() {
        let conn = get_test_connection();
        let food = create_test_category("Food", &conn);
        let transport = create_test_category("Transport", &conn);
        let transaction = create_transaction(
            NewTransaction::new(10.0, "Bus", date!(2024 - 03 - 05)).category(Some(food)),
            &conn,
        )
        .unwrap();

        let cleared =
            update_transaction(transaction.id, TransactionPatch::default().category(None), &conn)
                .unwrap();
        let moved = update_transaction(
            transaction.id,
            TransactionPatch::default().category(Some(transport)),
            &conn,
        )
        .unwrap();

        assert_eq!(cleared.category_id, None);
        assert_eq!(cleared.category, None);
        assert_eq!(moved.category.map(|category| category.name), Some("Transport".to_owned()));
    }

    #[test]
    fn update_missing_transaction_fails() {
        let conn = get_test_connection();

        let result = update_transaction(42, TransactionPatch::default().amount(1.0), &conn);
        let empty_result = update_transaction(42, TransactionPatch::default(), &conn);

        assert_eq!(result, Err(Error::UpdateMissingTransaction));
        assert_eq!(empty_result, Err(Error::UpdateMissingTransaction));
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let transaction =
            create_transaction(NewTransaction::new(1.0, "Test", date!(2024 - 03 - 05)), &conn)
                .unwrap();

        delete_transaction(transaction.id, &conn).unwrap();

        assert_eq!(get_transaction(transaction.id, &conn), Err(Error::NotFound));
        assert_eq!(
            delete_transaction(transaction.id, &conn),
            Err(Error::DeleteMissingTransaction)
        );
    }

    #[test]
    fn seed_creates_two_transactions_per_category_per_month() {
        let conn = get_test_connection();
        create_test_category("Food", &conn);
        create_test_category("Transport", &conn);

        let created = seed_sample_transactions(2024, &conn).unwrap();

        assert_eq!(created, 2 * 2 * 12);
        assert_eq!(get_transactions(Some(2024), &conn).unwrap().len(), created);
    }
}
