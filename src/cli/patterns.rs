use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::lifecycle::{confirm_pattern, dismiss_pattern, list_patterns};
use crate::settings::db_path;

pub fn list(account: Option<&str>, status: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let patterns = list_patterns(&conn, account, status)?;

    if patterns.is_empty() {
        println!("No patterns found. Run `penny identify-all` after importing history.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Account", "Payee", "Interval", "Amount", "Confidence", "Status", "Last seen",
    ]);
    for p in &patterns {
        table.add_row(vec![
            Cell::new(p.id),
            Cell::new(&p.account_name),
            Cell::new(&p.payee_key),
            Cell::new(&p.interval_kind),
            Cell::new(money(p.typical_amount_cents)),
            Cell::new(format!("{:.2}", p.confidence)),
            Cell::new(&p.status),
            Cell::new(&p.anchor_date),
        ]);
    }
    println!("Recurring patterns\n{table}");
    Ok(())
}

pub fn confirm(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    confirm_pattern(&conn, id)?;
    println!("Pattern {id} is now {}", "active".green());
    Ok(())
}

pub fn dismiss(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    dismiss_pattern(&conn, id)?;
    println!("Pattern {id} dismissed; pending projections skipped.");
    Ok(())
}
