//! # Seed Data Generator
//!
//! Populates the database with demo customers for development.
//!
//! ## Usage
//! ```bash
//! # 12 customers (default)
//! cargo run -p leu-db --bin seed
//!
//! # Custom amount and database
//! cargo run -p leu-db --bin seed -- --count 40 --db ./data/leu.db
//! ```
//!
//! Visit counts are spread over the whole 0..25 cycle so every reward band
//! and every "reward due" count shows up on the dashboard.

use std::env;

use chrono::{Duration, Utc};
use leu_core::{CustomerUpdate, NewCustomer};
use leu_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

const FIRST_NAMES: &[&str] = &[
    "Ana", "Beatriz", "Carla", "Daniela", "Elena", "Fernanda", "Gabriela", "Hilda", "Isabel",
    "Julia", "Karla", "Lucía", "Mariana", "Natalia", "Olivia", "Paola",
];

const LAST_NAMES: &[&str] = &[
    "López", "García", "Hernández", "Martínez", "Pérez", "Ramírez", "Torres", "Flores",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();

    let mut count: usize = 12;
    let mut db_path = String::from("./leu_dev.db");
    let mut collection = leu_core::CUSTOMERS_COLLECTION.to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--collection" => {
                if i + 1 < args.len() {
                    collection = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Leu Loyalty Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>          Number of customers (default: 12)");
                println!("  -d, --db <PATH>          Database file path (default: ./leu_dev.db)");
                println!("      --collection <NAME>  Collection name (default: clientes)");
                println!("  -h, --help               Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Leu Loyalty Seed Data Generator");
    println!("===============================");
    println!("Database:   {}", db_path);
    println!("Collection: {}", collection);
    println!("Customers:  {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path).collection(&collection)).await?;
    let customers = db.customers();

    let existing = customers.count().await?;
    if existing > 0 {
        println!("Database already has {} customers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    let mut generated = 0;

    for seed in 0..count {
        let form = demo_customer(seed);
        let created = match customers.create(&form).await {
            Ok(created) => created,
            Err(e) => {
                eprintln!("Failed to insert {}: {}", form.email, e);
                continue;
            }
        };

        // Spread visits over the cycle; 4, 9, 14, 19, 24 land a reward next visit.
        let visits = ((seed * 7) % leu_core::CYCLE_LENGTH as usize) as u32;
        let last_visit = now - Duration::days((seed % 10) as i64);

        customers
            .update(
                &created.id,
                &CustomerUpdate::new().visits(visits).last_visit(last_visit),
            )
            .await?;

        generated += 1;
    }

    println!("Generated {} customers", generated);
    println!("Seed complete!");

    db.close().await;
    Ok(())
}

fn demo_customer(seed: usize) -> NewCustomer {
    let first = FIRST_NAMES[seed % FIRST_NAMES.len()];
    let last = LAST_NAMES[(seed / FIRST_NAMES.len() + seed) % LAST_NAMES.len()];

    let form = NewCustomer::new(
        format!("{first} {last}"),
        format!("{}.{}{}@example.com", first.to_lowercase(), seed, last.len()),
    );

    if seed % 3 == 0 {
        form.with_phone(format!("55{:08}", 10_000_000 + seed * 7919))
    } else {
        form
    }
}
