//! # Seed Data Generator
//!
//! Populates a database with a demo dealership network.
//!
//! ## Usage
//! ```bash
//! # Seed ./fleetline_dev.db
//! cargo run -p fleetline-db --bin seed
//!
//! # Specify database path
//! cargo run -p fleetline-db --bin seed -- --db ./data/fleetline.db
//!
//! # Skip the opening OEM deliveries
//! cargo run -p fleetline-db --bin seed -- --no-stock
//! ```
//!
//! ## Generated Data
//! ```text
//! H1 Main Showroom ──┬── S1 Town Outlet
//!                    └── S2 Highway Outlet
//! H2 City Showroom ───── S3 Market Outlet
//! ```
//! - Catalog rows for three models
//! - Users owner1 / pdi1 / mech_a / backoffice1 (password = username)
//! - Opening OEM deliveries at both heads

use chrono::Utc;
use std::env;

use fleetline_core::{
    BatchItem, Branch, HierarchyEdge, Role, StockPolicy, VehicleDescriptor, VehiclePrice,
    OEM_SOURCE_LABEL,
};
use fleetline_db::{Database, DbConfig};

const BRANCHES: &[(&str, &str)] = &[
    ("H1", "Main Showroom"),
    ("H2", "City Showroom"),
    ("S1", "Town Outlet"),
    ("S2", "Highway Outlet"),
    ("S3", "Market Outlet"),
];

/// (sub, parent)
const EDGES: &[(&str, &str)] = &[("S1", "H1"), ("S2", "H1"), ("S3", "H2")];

/// (model, variant, colors, ex-showroom in paise)
const CATALOG: &[(&str, &str, &str, i64)] = &[
    ("ACTIVA", "STD", "Red, Black, Pearl White", 7_800_000),
    ("ACTIVA", "DLX", "Red, Matte Grey", 8_450_000),
    ("SHINE", "DRUM", "Black, Blue", 8_100_000),
    ("SHINE", "DISC", "Black, Blue, Red", 8_600_000),
    ("UNICORN", "STD", "Black, Red, White", 11_200_000),
];

const USERS: &[(&str, Role, Option<&str>)] = &[
    ("owner1", Role::Owner, None),
    ("pdi1", Role::Pdi, Some("H1")),
    ("mech_a", Role::Mechanic, Some("H1")),
    ("backoffice1", Role::BackOffice, None),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./fleetline_dev.db");
    let mut with_stock = true;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--no-stock" => with_stock = false,
            "--help" | "-h" => {
                println!("Fleetline Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./fleetline_dev.db)");
                println!("      --no-stock     Skip opening OEM deliveries");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Fleetline Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.branches().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} branches", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (id, name) in BRANCHES {
        db.branches().insert(&Branch::new(*id, *name)).await?;
    }
    for (sub, parent) in EDGES {
        db.branches().add_edge(&HierarchyEdge::new(*sub, *parent)).await?;
    }
    println!("✓ {} branches, {} hierarchy edges", BRANCHES.len(), EDGES.len());

    for (model, variant, colors, ex_showroom) in CATALOG {
        db.catalog().upsert(&price_row(model, variant, colors, *ex_showroom)).await?;
    }
    println!("✓ {} catalog rows", CATALOG.len());

    for (username, role, branch) in USERS {
        db.users().create(username, username, *role, *branch).await?;
    }
    println!("✓ {} users", USERS.len());

    if with_stock {
        let today = Utc::now().date_naive();
        let orchestrator = db.orchestrator(StockPolicy::AllowNegative);
        for (head, qty) in [("H1", 10), ("H2", 6)] {
            let items: Vec<BatchItem> = CATALOG
                .iter()
                .map(|(model, variant, colors, _)| {
                    let color = colors.split(',').next().unwrap_or_default();
                    BatchItem::new(VehicleDescriptor::new(model, variant, color), qty)
                })
                .collect();
            let receipt = orchestrator
                .record_inward(head, OEM_SOURCE_LABEL, Some("OPENING"), today, "Opening stock", &items)
                .await?;
            println!("✓ {} opening rows at {}", receipt.row_count(), head);
        }
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds a price row whose totals are internally consistent.
fn price_row(model: &str, variant: &str, colors: &str, ex_showroom: i64) -> VehiclePrice {
    let life_tax = ex_showroom / 10;
    let insurance = 420_000;
    let on_road_price = ex_showroom + life_tax + insurance;
    let accessories = 150_000;
    let extended_warranty = 90_000;
    let handling_charges = 50_000;
    let registration_charges = 30_000;

    VehiclePrice {
        id: 0,
        model: model.to_string(),
        variant: variant.to_string(),
        color_list: colors.to_string(),
        ex_showroom,
        life_tax,
        insurance,
        on_road_price,
        accessories,
        extended_warranty,
        handling_charges,
        registration_charges,
        final_price: on_road_price
            + accessories
            + extended_warranty
            + handling_charges
            + registration_charges,
    }
}
