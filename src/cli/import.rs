use std::path::PathBuf;

use crate::db::get_connection;
use crate::error::Result;
use crate::importer::import_file;
use crate::settings::db_path;

pub fn run(file: &str, account: &str) -> Result<()> {
    let file_path = PathBuf::from(file);
    let conn = get_connection(&db_path())?;

    let result = import_file(&conn, &file_path, account)?;

    if result.duplicate_file {
        println!("This file has already been imported (duplicate checksum).");
        return Ok(());
    }

    println!(
        "{} imported, {} skipped (duplicates), {} malformed",
        result.imported, result.skipped, result.invalid
    );
    println!("Run `penny identify --account '{account}'` to refresh recurring patterns.");

    Ok(())
}
