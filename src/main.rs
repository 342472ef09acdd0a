// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::Local;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use fair_split::{
    export, generate_transaction_id, load_config, load_contributions, open_store, summary,
    Analysis, Config, ExpenseCategory, GroupCategory, NewGroup, Session,
};

const USAGE: &str = "\
Usage:
  fair-split [ui] [CSV...]                      Interactive terminal UI
  fair-split analyze CSV...                     Fairness score + settlements
  fair-split save NAME CSV... [--category C] [--description D]
  fair-split export CSV... [--out FILE]         Write a CSV payment summary
  fair-split history                            List saved groups
  fair-split show ID                            Re-analyze a saved group
  fair-split delete ID                          Delete a saved group

Each CSV has the header name,amount[,currency]. Several files are combined
as expense categories; a file named after a category (food.csv) uses it.";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("ui");

    let config = load_config().context("failed to load configuration")?;

    // The TUI owns the terminal, so its logs go to a file
    let log_file = if command == "ui" || command.ends_with(".csv") {
        Some(PathBuf::from("logs").join("fair-split.log"))
    } else {
        None
    };
    fair_split::init_tracing(&config.log_filter, log_file.as_deref())?;
    info!(command, "fair-split {} starting", fair_split::VERSION);

    let rest = args.get(1..).unwrap_or(&[]);

    let result = match command {
        "analyze" => run_analyze(rest),
        "save" => run_save(&config, rest),
        "export" => run_export(rest),
        "history" => run_history(&config),
        "show" => run_show(&config, rest),
        "delete" => run_delete(&config, rest),
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        "ui" => run_ui_mode(&config, rest),
        _ if command.ends_with(".csv") => run_ui_mode(&config, &args),
        other => {
            eprintln!("❌ Unknown command: {}\n", other);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

// ============================================================================
// Argument helpers
// ============================================================================

/// Split `--flag value` pairs from positional arguments
fn split_flags(args: &[String]) -> Result<(Vec<&str>, Vec<(&str, &str)>)> {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if let Some(flag) = arg.strip_prefix("--") {
            let value = iter
                .next()
                .with_context(|| format!("--{} needs a value", flag))?;
            flags.push((flag, value.as_str()));
        } else {
            positional.push(arg.as_str());
        }
    }

    Ok((positional, flags))
}

fn flag<'a>(flags: &[(&str, &'a str)], name: &str) -> Option<&'a str> {
    flags.iter().find(|(f, _)| *f == name).map(|(_, v)| *v)
}

fn parse_id(args: &[String]) -> Result<i64> {
    let raw = args.first().context("missing group ID")?;
    raw.parse::<i64>()
        .with_context(|| format!("'{}' is not a group ID", raw))
}

/// Build a session from CSV files. A single file becomes the current
/// members; several files become one expense category each.
fn session_from_files(paths: &[&str]) -> Result<Session> {
    if paths.is_empty() {
        bail!("no CSV files given\n\n{}", USAGE);
    }

    let mut session = Session::new();

    for path in paths {
        let path = Path::new(path);
        let contributions = load_contributions(path)?;
        println!("📂 Loaded {} contributions from {}", contributions.len(), path.display());

        for c in contributions {
            session.add_contribution(c);
        }

        if paths.len() > 1 {
            let category = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(ExpenseCategory::parse)
                .unwrap_or_default();
            session.save_expense(category)?;
        }
    }

    Ok(session)
}

fn analyze_session(session: &mut Session) -> Result<Analysis> {
    if let Some(summary) = session.readiness_summary() {
        println!("🔍 Ready to analyze: {}", summary);
    }

    if !session.can_analyze() {
        bail!("Please add at least 2 members to calculate fairness.");
    }

    session
        .analyze()
        .cloned()
        .context("contribution amounts are too large to analyze")
}

fn print_analysis(analysis: &Analysis) {
    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("{}", summary::render(analysis));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let tx_id = generate_transaction_id();
    println!("\n🔐 Funds locked in escrow (simulated)");
    println!("   Transaction ID: {}", tx_id);
}

// ============================================================================
// Commands
// ============================================================================

fn run_analyze(args: &[String]) -> Result<()> {
    let (paths, _) = split_flags(args)?;
    let mut session = session_from_files(&paths)?;

    let analysis = analyze_session(&mut session)?;
    print_analysis(&analysis);

    Ok(())
}

fn run_save(config: &Config, args: &[String]) -> Result<()> {
    let (positional, flags) = split_flags(args)?;
    let (name, paths) = positional
        .split_first()
        .context("missing group name")?;

    let category = match flag(&flags, "category") {
        Some(raw) => GroupCategory::parse(raw)
            .with_context(|| format!("unknown category '{}'", raw))?,
        None => GroupCategory::default(),
    };

    let mut session = session_from_files(paths)?;
    let analysis = analyze_session(&mut session)?;
    print_analysis(&analysis);

    let group = NewGroup::from_analysis(name, flag(&flags, "description"), category, &analysis)?;
    let store = open_store(config)?;
    let id = store.save_group(&group)?;

    println!("\n💾 Group '{}' saved successfully! (ID: {})", group.name, id);
    Ok(())
}

fn run_export(args: &[String]) -> Result<()> {
    let (paths, flags) = split_flags(args)?;
    let mut session = session_from_files(&paths)?;
    let analysis = analyze_session(&mut session)?;

    let now = Local::now();
    let out = flag(&flags, "out")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(export::export_file_name(now)));

    export::write_summary_csv(
        &out,
        &analysis.members,
        Some(&analysis.report),
        &analysis.settlements,
        now,
    )?;

    println!("📤 Summary written to {}", out.display());
    Ok(())
}

fn run_history(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let groups = store.list_groups()?;

    if groups.is_empty() {
        println!("No saved groups yet.");
        return Ok(());
    }

    println!("📜 {} saved group(s)\n", groups.len());
    for group in &groups {
        println!("  {}", group.summary());
        if let Some(description) = &group.description {
            println!("      {}", description);
        }
    }

    Ok(())
}

fn run_show(config: &Config, args: &[String]) -> Result<()> {
    let id = parse_id(args)?;
    let store = open_store(config)?;

    let members = match store.load_group(id)? {
        Some(members) => members,
        None => bail!("no saved group with ID {}", id),
    };

    let mut session = Session::new();
    session.load_members(members);

    let analysis = analyze_session(&mut session)?;
    print_analysis(&analysis);

    Ok(())
}

fn run_delete(config: &Config, args: &[String]) -> Result<()> {
    let id = parse_id(args)?;
    let store = open_store(config)?;

    if store.delete_group(id)? {
        println!("🗑️  Deleted group {}", id);
        Ok(())
    } else {
        bail!("no saved group with ID {}", id)
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config, args: &[String]) -> Result<()> {
    let (paths, _) = split_flags(args)?;

    let session = if paths.is_empty() {
        Session::new()
    } else {
        session_from_files(&paths)?
    };

    let store = open_store(config)?;
    let mut app = ui::App::new(session, store)?;
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config, _args: &[String]) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: fair-split analyze <csv>");
    std::process::exit(1);
}
