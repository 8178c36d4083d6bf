use chrono::{Datelike, Duration, Local, Months, NaiveDate};
use colored::Colorize;
use rand::Rng;
use rusqlite::Connection;

use crate::db::{get_connection, init_db};
use crate::detector::{detect_all, DetectorConfig};
use crate::error::Result;
use crate::generator::generate;
use crate::payee::payee_key;
use crate::settings::get_data_dir;

const ACCOUNT_NAME: &str = "Demo Checking";

/// Monthly charges, anchored to a day of the month.
struct MonthlyCharge {
    day: u32,
    description: &'static str,
    amount_cents: i64,
}

const MONTHLY: &[MonthlyCharge] = &[
    MonthlyCharge { day: 1, description: "OAKWOOD PROPERTY RENT", amount_cents: -120000 },
    MonthlyCharge { day: 1, description: "ACME CORP PAYROLL", amount_cents: 420000 },
    MonthlyCharge { day: 5, description: "NETFLIX.COM 12345", amount_cents: -1099 },
    MonthlyCharge { day: 12, description: "SPOTIFY USA 8882211161", amount_cents: -999 },
    MonthlyCharge { day: 18, description: "CITY WATER UTILITY", amount_cents: -5800 },
];

/// One-off purchases sprinkled through each month so the history is not
/// suspiciously clean.
const ONE_OFFS: &[(&str, i64)] = &[
    ("TRADER JOES 118", -6412),
    ("SHELL OIL #5742", -4205),
    ("AMAZON MKTP X99210", -2837),
    ("CORNER BAKERY", -1150),
    ("HARDWARE DEPOT", -8931),
];

fn seed_history(conn: &Connection, today: NaiveDate) -> Result<usize> {
    conn.execute(
        "INSERT INTO accounts (name, account_type, institution) VALUES (?1, 'checking', 'Demo Bank')",
        [ACCOUNT_NAME],
    )?;
    let account_id = conn.last_insert_rowid();

    let mut rng = rand::thread_rng();
    let mut inserted = 0usize;
    let start = today.checked_sub_months(Months::new(6)).unwrap();

    let insert = |date: NaiveDate, description: &str, amount_cents: i64| -> Result<()> {
        conn.execute(
            "INSERT INTO transactions (account_id, date, description, amount_cents, payee_key) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                account_id,
                date.format("%Y-%m-%d").to_string(),
                description,
                amount_cents,
                payee_key(description)
            ],
        )?;
        Ok(())
    };

    for offset in 0..6u32 {
        let month_start = start.checked_add_months(Months::new(offset)).unwrap();
        for charge in MONTHLY {
            let date = month_start
                .with_day(charge.day)
                .unwrap_or(month_start);
            if date <= today {
                insert(date, charge.description, charge.amount_cents)?;
                inserted += 1;
            }
        }
        for (i, (description, amount_cents)) in ONE_OFFS.iter().enumerate() {
            // Rotate which one-offs appear and jitter their day.
            if (i + offset as usize) % 2 == 0 {
                let day = rng.gen_range(2..=26);
                let date = month_start.with_day(day).unwrap_or(month_start);
                if date <= today {
                    insert(date, description, *amount_cents)?;
                    inserted += 1;
                }
            }
        }
    }

    // A weekly charge with a day of drift now and then.
    let mut date = start;
    while date <= today {
        insert(date, "SQ * BLUE BOTTLE COFFEE", -1875)?;
        inserted += 1;
        let drift = if rng.gen_bool(0.2) { 1 } else { 0 };
        date += Duration::days(7 + drift);
    }

    Ok(inserted)
}

pub fn run() -> Result<()> {
    let data_dir = get_data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let conn = get_connection(&data_dir.join("penny.db"))?;
    init_db(&conn)?;

    let existing: i64 = conn.query_row(
        "SELECT count(*) FROM accounts WHERE name = ?1",
        [ACCOUNT_NAME],
        |r| r.get(0),
    )?;
    if existing > 0 {
        println!("Demo data already loaded.");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let inserted = seed_history(&conn, today)?;
    println!("Loaded {inserted} demo transactions into '{ACCOUNT_NAME}'.");

    let summary = detect_all(&conn, &DetectorConfig::default(), today)?;
    println!(
        "Detected {} recurring patterns ({} active).",
        summary.created,
        summary.activated.to_string().green()
    );

    let projected = generate(&conn, 30, today)?;
    println!("Projected {projected} upcoming transactions.");
    println!();
    println!("Try:");
    println!("  penny patterns list");
    println!("  penny upcoming list");
    println!("  penny report recurring");
    Ok(())
}
