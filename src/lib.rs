// Ledger Pages - Core Library
// Exposes all modules for use in the CLI, the web server, and tests

pub mod config;
pub mod db;
pub mod gallery;
pub mod ledger;
pub mod logging;
pub mod render;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use db::{
    CsvRecord, ImportSummary,
    load_csv, open_database, setup_database, seed_if_empty, insert_records,
    insert_transaction, append_transaction, get_all_transactions, load_ledger, verify_count,
};
pub use gallery::{list_images, list_images_or_empty, image_src};
pub use ledger::{Ledger, SortKey, Transaction, days_since, seed_transactions};
pub use logging::init_tracing;
pub use render::{render_gallery_page, render_ledger_page, LedgerView};

#[cfg(feature = "server")]
pub use server::{router, AppState, LedgerStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
