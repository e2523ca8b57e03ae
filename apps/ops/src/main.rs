//! # Fleetline Stock Report
//!
//! Prints territory stock for every head (or one head) with the model,
//! variant and color drill-down.
//!
//! ## Usage
//! ```bash
//! # All heads, current stock
//! cargo run -p fleetline-ops --bin fleetline
//!
//! # One head as of a past date, explicit config
//! cargo run -p fleetline-ops --bin fleetline -- --head H1 --as-of 2024-05-01 --config ./fleetline.toml
//! ```
//!
//! ## Sample Output
//! ```text
//! == H1 Main Showroom: 16 units ==
//! ACTIVA                 10
//!   STD                   6
//!     color        Main Showroom  Town Outlet  TOTAL
//!     RED                      3            1      4
//!     TOTAL                    5            1      6
//! ```

use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::info;

use fleetline_core::{ColorMatrix, TOTAL_LABEL};
use fleetline_ops::commands::branch::list_head_branches;
use fleetline_ops::commands::stock::{territory_stock, TerritoryStock};
use fleetline_ops::config::OpsConfig;

const USAGE: &str = "Usage: fleetline [--config PATH] [--head BRANCH_ID] [--as-of YYYY-MM-DD]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fleetline_ops::init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut head: Option<String> = None;
    let mut as_of: Option<NaiveDate> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--head" => {
                if i + 1 < args.len() {
                    head = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--as-of" => {
                if i + 1 < args.len() {
                    as_of = Some(NaiveDate::parse_from_str(&args[i + 1], "%Y-%m-%d")?);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                return Ok(());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let config = OpsConfig::load(config_path)?;
    let (db, cache) = fleetline_ops::open(&config).await?;

    let heads: Vec<String> = match head {
        Some(head) => vec![head],
        None => list_head_branches(&db, &cache)
            .await?
            .into_iter()
            .map(|b| b.branch_id)
            .collect(),
    };
    info!(heads = heads.len(), as_of = ?as_of, "Printing stock report");

    if heads.is_empty() {
        println!("No head branches configured.");
    }
    for head in &heads {
        let territory = territory_stock(&db, &cache, head, None, as_of).await?;
        print_territory(&territory);
    }

    db.inner().close().await;
    Ok(())
}

fn print_territory(territory: &TerritoryStock) {
    println!(
        "== {} {}: {} units ==",
        territory.head.branch_id, territory.head.branch_name, territory.total
    );
    if territory.snapshot.is_empty() {
        println!("(no stock)");
        println!();
        return;
    }

    let snapshot = &territory.snapshot;
    for model in snapshot.model_totals() {
        println!("{:<20} {:>5}", model.label, model.quantity);
        for variant in snapshot.variant_totals(&model.label) {
            println!("  {:<18} {:>5}", variant.label, variant.quantity);
            print_matrix(&snapshot.color_matrix(&model.label, &variant.label));
        }
    }
    println!();
}

fn print_matrix(matrix: &ColorMatrix) {
    let widths: Vec<usize> = matrix.columns.iter().map(|c| c.label.len().max(5)).collect();

    let mut header = format!("    {:<12}", "color");
    for (column, width) in matrix.columns.iter().zip(&widths) {
        header.push_str(&format!(" {:>width$}", column.label, width = width));
    }
    header.push_str(&format!(" {:>5}", TOTAL_LABEL));
    println!("{}", header);

    for row in &matrix.rows {
        let mut line = format!("    {:<12}", row.color);
        for (cell, width) in row.cells.iter().zip(&widths) {
            line.push_str(&format!(" {:>width$}", cell, width = width));
        }
        line.push_str(&format!(" {:>5}", row.total));
        println!("{}", line);
    }
}
