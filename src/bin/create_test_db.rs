use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::OffsetDateTime;

use finance_dashboard::{
    initialize_db, seed_default_categories, seed_sample_budgets, seed_sample_transactions,
};

/// A utility for creating a test database for the finance_dashboard API server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,
}

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    println!("Creating categories...");
    let categories = seed_default_categories(&conn)?;

    let year = OffsetDateTime::now_utc().year();

    println!("Creating sample transactions and budgets for {year}...");
    let transactions = seed_sample_transactions(year, &conn)?;
    let budgets = seed_sample_budgets(year, &conn)?;

    println!(
        "Success! Created {categories} categories, {transactions} transactions and {budgets} budgets."
    );

    Ok(())
}
