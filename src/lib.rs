// FairSplit - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod contribution;
pub mod fairness;     // Fairness score + narrative
pub mod settlement;   // Greedy creditor/debtor matching
pub mod analysis;     // Both engines bundled for collaborators
pub mod session;      // Caller-owned working state
pub mod summary;      // Plain-text rendering
pub mod parser;       // CSV → contributions
pub mod export;       // Summary → CSV
pub mod escrow;       // Simulated transaction IDs
pub mod store;        // Group history (JSON / SQLite)
pub mod config;

// Re-export commonly used types
pub use contribution::{aggregate_by_name, Contribution, ContributionError, DEFAULT_CURRENCY};
pub use fairness::{evaluate, explain, FairnessLevel, FairnessReport, MemberDeviation};
pub use settlement::{net_flow, plan, Balance, Settlement, SettlementError, SettlementPlanner};
pub use analysis::{analyze, Analysis};
pub use session::{Expense, ExpenseCategory, Session, SessionError};
pub use parser::{load_contributions, parse_contributions};
pub use export::{export_file_name, summary_csv, write_summary_csv};
pub use escrow::generate_transaction_id;
pub use store::{
    open_store, GroupCategory, GroupRecord, GroupStore, GroupSummary, JsonStore, NewGroup,
    SqliteStore,
};
pub use config::{load_config, Config, ConfigError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install the global tracing subscriber.
///
/// `log_file` sends output to a file (the TUI owns the terminal); otherwise
/// logs go to stderr. RUST_LOG overrides `default_filter`.
pub fn init_tracing(default_filter: &str, log_file: Option<&std::path::Path>) -> anyhow::Result<()> {
    use anyhow::Context;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;

            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
        None => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("failed to set tracing subscriber")?;
        }
    }

    Ok(())
}
