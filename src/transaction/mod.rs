//! Transactions: what was spent or earned, when, and under which category.

mod core;
mod db;
mod endpoints;

pub use core::{NewTransaction, Transaction, TransactionPatch, parse_date};
pub use db::{
    create_transaction, create_transaction_table, delete_transaction, get_transaction,
    get_transactions, seed_sample_transactions, update_transaction,
};
pub use endpoints::{
    create_transaction_endpoint, delete_transaction_endpoint, list_transactions_endpoint,
    update_transaction_endpoint,
};
