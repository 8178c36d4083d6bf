use std::path::PathBuf;

use colored::Colorize;

use crate::db::{get_connection, init_db};
use crate::error::Result;
use crate::settings::{save_settings, shellexpand_path, Settings};

pub fn run(data_dir: Option<String>) -> Result<()> {
    let settings = match data_dir {
        Some(dir) => Settings {
            data_dir: shellexpand_path(&dir),
        },
        None => Settings::default(),
    };

    let dir = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&dir)?;

    let db_path = dir.join("penny.db");
    let conn = get_connection(&db_path)?;
    init_db(&conn)?;
    save_settings(&settings)?;

    println!("{}", "Penny is ready.".green());
    println!("Database: {}", db_path.display());
    println!();
    println!("Next steps:");
    println!("  penny accounts add 'Everyday Checking' --type checking");
    println!("  penny import statement.csv --account 'Everyday Checking'");
    println!("  penny identify-all");
    Ok(())
}
