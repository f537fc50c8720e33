// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use ledger_pages::render::format_amount;
use ledger_pages::{
    init_tracing, insert_records, load_csv, load_ledger, open_database, seed_if_empty,
    verify_count, Ledger, SortKey,
};

/// Bank transaction ledger: import, list and browse records
#[derive(Parser, Debug)]
#[command(name = "ledger-pages", version, about)]
struct Cli {
    /// SQLite ledger store; without it the seeded demo ledger is used
    #[arg(long, global = true, env = "LEDGER_DB")]
    db: Option<PathBuf>,

    /// Emit JSON log lines
    #[arg(long, global = true, env = "LEDGER_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a CSV (Date,Amount,Description,Merchant) into the SQLite store
    Import {
        csv: PathBuf,
    },
    /// Print the ledger as a table
    List {
        /// date (newest first) or amount (largest first)
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortKey>,

        /// Case-insensitive description filter
        #[arg(long)]
        search: Option<String>,
    },
    /// Browse the ledger in the terminal (default)
    Ui,
}

fn parse_sort(value: &str) -> Result<SortKey, String> {
    SortKey::parse(value).ok_or_else(|| format!("unknown sort key '{}' (use date or amount)", value))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command.unwrap_or(Command::Ui) {
        Command::Import { csv } => run_import(cli.db, &csv),
        Command::List { sort, search } => run_list(cli.db, sort, search.as_deref()),
        Command::Ui => run_ui_mode(cli.db),
    }
}

fn load(db: Option<PathBuf>) -> Result<Ledger> {
    match db {
        Some(db_path) => {
            let conn = open_database(&db_path)?;
            seed_if_empty(&conn)?;
            load_ledger(&conn)
        }
        None => Ok(Ledger::seeded()),
    }
}

fn run_import(db: Option<PathBuf>, csv_path: &Path) -> Result<()> {
    let db_path = db.context("import needs a store: pass --db or set LEDGER_DB")?;

    println!("🗄️  Import - CSV → SQLite");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    println!("\n📂 Loading CSV...");
    let records = load_csv(csv_path)?;
    println!("✓ Loaded {} transactions from CSV", records.len());

    let conn = open_database(&db_path)?;
    println!("✓ Database initialized with WAL mode");

    println!("\n💾 Inserting transactions...");
    let summary = insert_records(&conn, &records)?;
    println!("✓ Inserted: {} transactions", summary.inserted);
    println!("✓ Skipped duplicates: {}", summary.duplicates);

    let count = verify_count(&conn)?;
    println!("\n🔍 Database contains {} transactions", count);

    Ok(())
}

fn run_list(db: Option<PathBuf>, sort: Option<SortKey>, search: Option<&str>) -> Result<()> {
    let ledger = load(db)?;

    let mut view = match search {
        Some(term) => Ledger::new(ledger.find_by_description(term.trim())),
        None => ledger,
    };
    if let Some(key) = sort {
        view.sort(key);
    }

    let today = chrono::Local::now().date_naive();

    println!(
        "{:>4}  {:<10}  {:>14}  {:<30}  {:<20}  {:>8}",
        "ID", "Date", "Amount", "Description", "Merchant", "Days Ago"
    );
    for tx in view.transactions() {
        println!(
            "{:>4}  {:<10}  {:>14}  {:<30}  {:<20}  {:>8}",
            tx.id,
            tx.date.format("%Y-%m-%d").to_string(),
            format!("{} $", format_amount(tx.amount)),
            tx.description,
            tx.merchant,
            tx.days_since(today),
        );
    }
    println!("Total: {} $", format_amount(view.total_amount()));

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(db: Option<PathBuf>) -> Result<()> {
    println!("🖥️  Loading ledger UI...\n");

    let ledger = load(db)?;
    tracing::info!(count = ledger.len(), "loaded transactions");

    let mut app = ui::App::new(ledger, ui::today());
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_db: Option<PathBuf>) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: ledger-pages list");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_command() {
        let cli = Cli::try_parse_from(["ledger-pages", "list", "--sort", "amount", "--search", "dinner"]).unwrap();

        match cli.command {
            Some(Command::List { sort, search }) => {
                assert_eq!(sort, Some(SortKey::Amount));
                assert_eq!(search.as_deref(), Some("dinner"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_sort() {
        assert!(Cli::try_parse_from(["ledger-pages", "list", "--sort", "merchant"]).is_err());
    }

    #[test]
    fn test_import_requires_store() {
        let err = run_import(None, Path::new("missing.csv")).unwrap_err();
        assert!(err.to_string().contains("--db"));
    }
}
