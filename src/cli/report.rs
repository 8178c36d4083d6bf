use comfy_table::{Cell, CellAlignment, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::reports::get_recurring_costs;
use crate::settings::db_path;

pub fn recurring(account: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let report = get_recurring_costs(&conn, account)?;

    if report.items.is_empty() {
        println!("No active recurring patterns.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Account", "Payee", "Interval", "Amount", "Per month"]);
    for item in &report.items {
        table.add_row(vec![
            Cell::new(&item.account_name),
            Cell::new(&item.payee_key),
            Cell::new(&item.interval_kind),
            Cell::new(money(item.typical_amount_cents)).set_alignment(CellAlignment::Right),
            Cell::new(money(item.monthly_equivalent_cents)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("Recurring costs\n{table}");
    println!();
    println!("Monthly recurring outflow: {}", money(report.total_monthly_outflow_cents));
    println!("Monthly recurring inflow:  {}", money(report.total_monthly_inflow_cents));
    Ok(())
}
