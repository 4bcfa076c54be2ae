//! # Seed Data Generator
//!
//! Populates the database with a realistic sari-sari store catalog for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p sari-db --bin seed
//!
//! # Specify database path
//! cargo run -p sari-db --bin seed -- --db ./data/sari.db
//! ```
//!
//! Each product gets a deterministic price/stock spread from its position
//! in the catalog, so repeated runs against a fresh database produce the
//! same data.

use chrono::Utc;
use std::env;

use sari_core::Product;
use sari_db::{Database, DbConfig};
use uuid::Uuid;

/// Catalog of typical sari-sari store goods: (category, items).
/// Each item is (name, base price in centavos, low-stock threshold).
const CATALOG: &[(&str, &[(&str, i64, i64)])] = &[
    (
        "noodles",
        &[
            ("Lucky Me Pancit Canton Original", 1550, 10),
            ("Lucky Me Pancit Canton Chilimansi", 1550, 10),
            ("Lucky Me Instant Mami Beef", 1200, 10),
            ("Payless Xtra Big Canton", 1100, 8),
            ("Nissin Cup Noodles Seafood", 2500, 5),
        ],
    ),
    (
        "canned",
        &[
            ("555 Sardines in Tomato Sauce", 2500, 12),
            ("Ligo Sardines Red", 2400, 12),
            ("Argentina Corned Beef 150g", 4300, 8),
            ("CDO Karne Norte 150g", 3200, 8),
            ("Century Tuna Flakes in Oil", 4200, 6),
        ],
    ),
    (
        "beverages",
        &[
            ("Coke Sakto 200ml", 1500, 24),
            ("Coke Mismo 290ml", 2000, 24),
            ("Royal Tru-Orange 290ml", 2000, 12),
            ("Sting Energy Drink Red", 2500, 12),
            ("Kopiko Black 3-in-1 Twin", 1200, 20),
            ("Bear Brand Fortified 33g", 1300, 15),
            ("Milo Twin Pack 24g", 1500, 15),
        ],
    ),
    (
        "snacks",
        &[
            ("Piattos Cheese 40g", 2200, 10),
            ("Nova Country Cheddar 40g", 2200, 10),
            ("Boy Bawang Cornick Garlic", 1500, 10),
            ("SkyFlakes Crackers Single", 800, 20),
            ("Rebisco Crackers 10s", 3500, 5),
            ("Hansel Mocha Sandwich 10s", 4800, 5),
        ],
    ),
    (
        "household",
        &[
            ("Surf Powder Kalamansi 65g", 1000, 20),
            ("Tide Bar 125g", 1800, 10),
            ("Joy Dishwashing Liquid 20ml", 700, 20),
            ("Safeguard White 60g", 2700, 8),
            ("Colgate Toothpaste Sachet", 900, 15),
            ("Zonrox Bleach 100ml", 1200, 10),
        ],
    ),
    (
        "staples",
        &[
            ("Eggs per piece", 900, 30),
            ("Rice per kilo", 5500, 25),
            ("Cooking Oil 200ml Pouch", 2800, 10),
            ("Brown Sugar per 1/4 kilo", 1800, 10),
            ("Datu Puti Soy Sauce 100ml", 1200, 10),
            ("Datu Puti Vinegar 100ml", 1200, 10),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./sari_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Sari POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./sari_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Sari POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let mut generated = 0;
    let start = std::time::Instant::now();

    for (category, items) in CATALOG {
        for (item_idx, (name, price_cents, min_stock)) in items.iter().enumerate() {
            let product = generate_product(category, name, *price_cents, *min_stock, item_idx);

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }

            generated += 1;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Seeded {} products in {:?}", generated, elapsed);

    let low = db.products().list_low_stock().await?;
    println!("  {} products start below their low-stock threshold", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product. Stock spread is deterministic from the
/// item's position so reruns produce identical catalogs.
fn generate_product(
    category: &str,
    name: &str,
    price_cents: i64,
    min_stock: i64,
    item_idx: usize,
) -> Product {
    let now = Utc::now();

    // Spread stock around the threshold: every fifth item starts low,
    // every seventh starts out of stock.
    let current_stock = if item_idx % 7 == 6 {
        0
    } else if item_idx % 5 == 4 {
        min_stock.max(1)
    } else {
        min_stock * 3 + (item_idx as i64 % 11)
    };

    Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        price_cents,
        current_stock,
        min_stock,
        barcode: None,
        category: Some(category.to_string()),
        created_at: now,
        updated_at: now,
    }
}
