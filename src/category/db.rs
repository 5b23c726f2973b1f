//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryName, CategoryType, NewCategory},
    database_id::CategoryId,
    db::{Constraint, violated_constraint},
};

/// The categories created for a fresh database.
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Food", "Transport", "Housing", "Entertainment", "Utilities"];

/// Create a category and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if a category with the same name exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(category: NewCategory, connection: &Connection) -> Result<Category, Error> {
    connection
        .execute(
            "INSERT INTO category (name, type, color, icon) VALUES (?1, ?2, ?3, ?4);",
            (
                category.name.as_ref(),
                category.kind,
                &category.color,
                &category.icon,
            ),
        )
        .map_err(|error| match violated_constraint(&error) {
            Some(Constraint::Unique) => Error::DuplicateCategoryName(category.name.to_string()),
            _ => error.into(),
        })?;

    get_category(connection.last_insert_rowid(), connection)
}

/// Retrieve a single category by ID.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `category_id` does not refer to a category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, type, color, icon FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_category_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, type, color, icon FROM category ORDER BY name ASC;")?
        .query_map([], map_category_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Insert the [DEFAULT_CATEGORIES], skipping any that already exist.
///
/// Returns the number of categories that were created.
pub fn seed_default_categories(connection: &Connection) -> Result<usize, Error> {
    let mut statement =
        connection.prepare("INSERT OR IGNORE INTO category (name, type) VALUES (?1, ?2);")?;

    let mut created = 0;
    for name in DEFAULT_CATEGORIES {
        created += statement.execute((name, CategoryType::Expense))?;
    }

    Ok(created)
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            type TEXT NOT NULL DEFAULT 'expense',
            color TEXT,
            icon TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

fn map_category_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let name = CategoryName::new_unchecked(&raw_name);
    let kind = row.get(2)?;
    let color = row.get(3)?;
    let icon = row.get(4)?;

    Ok(Category {
        id,
        name,
        kind,
        color,
        icon,
    })
}

#[cfg(test)]
mod category_query_tests {
    use std::collections::HashSet;

    use rusqlite::Connection;

    use crate::{
        Error,
        category::{
            CategoryType, NewCategory, create_category, get_all_categories, get_category,
            seed_default_categories,
        },
        db::initialize,
    };

    use super::DEFAULT_CATEGORIES;

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).expect("Could not initialize database");
        connection
    }

    fn new_category(name: &str) -> NewCategory {
        NewCategory::new(name, CategoryType::Expense).unwrap()
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();

        let category = create_category(
            NewCategory::new("Salary", CategoryType::Income)
                .unwrap()
                .color(Some("#00ff00".to_owned())),
            &connection,
        )
        .expect("Could not create category");

        assert!(category.id > 0);
        assert_eq!(category.name.as_ref(), "Salary");
        assert_eq!(category.kind, CategoryType::Income);
        assert_eq!(category.color.as_deref(), Some("#00ff00"));
    }

    #[test]
    fn create_category_with_duplicate_name_fails() {
        let connection = get_test_db_connection();
        create_category(new_category("Food"), &connection).expect("Could not create category");

        let duplicate = create_category(new_category("Food"), &connection);

        assert_eq!(
            duplicate,
            Err(Error::DuplicateCategoryName("Food".to_owned()))
        );
    }

    #[test]
    fn get_category_succeeds() {
        let connection = get_test_db_connection();
        let inserted = create_category(new_category("Foo"), &connection).unwrap();

        let selected = get_category(inserted.id, &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let connection = get_test_db_connection();
        let inserted = create_category(new_category("Foo"), &connection).unwrap();

        let selected = get_category(inserted.id + 123, &connection);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_returns_every_category() {
        let connection = get_test_db_connection();
        let inserted = HashSet::from([
            create_category(new_category("Foo"), &connection).unwrap(),
            create_category(new_category("Bar"), &connection).unwrap(),
        ]);

        let selected = get_all_categories(&connection).expect("Could not get all categories");

        assert_eq!(selected[0].name.as_ref(), "Bar", "should be sorted by name");
        assert_eq!(inserted, HashSet::from_iter(selected));
    }

    #[test]
    fn seeding_twice_does_not_duplicate_categories() {
        let connection = get_test_db_connection();

        let first = seed_default_categories(&connection).unwrap();
        let second = seed_default_categories(&connection).unwrap();

        assert_eq!(first, DEFAULT_CATEGORIES.len());
        assert_eq!(second, 0);
        assert_eq!(
            get_all_categories(&connection).unwrap().len(),
            DEFAULT_CATEGORIES.len()
        );
    }
}
