//! Categories for grouping transactions and budgets.

mod db;
mod domain;
mod endpoints;

pub use db::{
    DEFAULT_CATEGORIES, create_category, create_category_table, get_all_categories, get_category,
    seed_default_categories,
};
pub use domain::{
    Category, CategoryName, CategorySnapshot, CategoryType, NewCategory, UNCATEGORIZED_LABEL,
};
pub use endpoints::{create_category_endpoint, list_categories_endpoint};
