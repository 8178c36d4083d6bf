use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::settings::db_path;

pub fn add(name: &str, account_type: &str, institution: Option<&str>) -> Result<()> {
    let conn = get_connection(&db_path())?;
    conn.execute(
        "INSERT INTO accounts (name, account_type, institution) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, account_type, institution],
    )?;
    println!("Added account: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare("SELECT id, name, account_type, institution FROM accounts")?;
    let rows: Vec<(i64, String, String, Option<String>)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type", "Institution"]);
    for (id, name, acct_type, inst) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(acct_type),
            Cell::new(inst.unwrap_or_default()),
        ]);
    }
    println!("Accounts\n{table}");
    Ok(())
}
