use chrono::Local;
use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::money;
use crate::lifecycle::skip_projection;
use crate::reports::get_upcoming;
use crate::settings::db_path;

pub fn list(days: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let items = get_upcoming(&conn, days, Local::now().date_naive())?;

    if items.is_empty() {
        println!("Nothing projected in the next {days} days.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Account", "Description", "Amount", "Confidence"]);
    for item in &items {
        table.add_row(vec![
            Cell::new(item.id),
            Cell::new(&item.projected_date),
            Cell::new(&item.account_name),
            Cell::new(&item.description),
            Cell::new(money(item.amount_cents)),
            Cell::new(format!("{:.2}", item.confidence)),
        ]);
    }
    println!("Upcoming (next {days} days)\n{table}");
    Ok(())
}

pub fn skip(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    skip_projection(&conn, id)?;
    println!("Projection {id} skipped.");
    Ok(())
}
