// 📥 Contribution Parser - CSV → Vec<Contribution>
//
// Expected header: name,amount[,currency]
// Amounts may carry a leading symbol ("$12.50") and thousands separators
// ("1,250.00"). When the amount has a symbol and no currency column is
// given, the symbol becomes the display currency.

use crate::contribution::{Contribution, DEFAULT_CURRENCY};
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

/// One CSV row before validation
#[derive(Debug, Deserialize)]
struct ContributionRow {
    #[serde(alias = "Name", alias = "member", alias = "Member")]
    name: String,

    #[serde(alias = "Amount", alias = "amount_contributed", alias = "Amount Contributed")]
    amount: String,

    #[serde(default, alias = "Currency")]
    currency: Option<String>,
}

/// Load contributions from a CSV file
pub fn load_contributions(csv_path: &Path) -> Result<Vec<Contribution>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;

    parse_contributions(file)
        .with_context(|| format!("Failed to parse contributions from {}", csv_path.display()))
}

/// Parse contributions from any CSV reader
pub fn parse_contributions<R: Read>(reader: R) -> Result<Vec<Contribution>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut contributions = Vec::new();

    for (idx, result) in rdr.deserialize().enumerate() {
        // Header is line 1
        let line_number = idx + 2;
        let row: ContributionRow =
            result.with_context(|| format!("Failed to read row on line {}", line_number))?;

        let (amount, symbol) = parse_amount(&row.amount)
            .with_context(|| format!("Invalid amount on line {}", line_number))?;

        let currency = row
            .currency
            .filter(|c| !c.is_empty())
            .or(symbol)
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let contribution = Contribution::with_currency(&row.name, amount, &currency)
            .with_context(|| format!("Invalid contribution on line {}", line_number))?;

        contributions.push(contribution);
    }

    Ok(contributions)
}

/// Parse "12.50", "$12.50", "€1,250.00", "Rs.100" → (amount, symbol)
///
/// The symbol is everything before the first digit, sign, dot or space. A
/// dot right after a letter ends an abbreviation ("Rs.", "Fr.") and is not
/// a decimal point.
pub fn parse_amount(raw: &str) -> Result<(f64, Option<String>)> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| {
            c.is_ascii_digit() || c == '-' || c == '+' || c == '.' || c.is_whitespace()
        })
        .ok_or_else(|| anyhow!("no number in '{}'", raw))?;

    let (prefix, mut number) = trimmed.split_at(split);
    if let Some(rest) = number.strip_prefix('.') {
        if prefix.chars().last().is_some_and(char::is_alphabetic) {
            number = rest;
        }
    }

    let symbol = if prefix.is_empty() {
        None
    } else {
        Some(prefix.to_string())
    };

    let cleaned: String = number.chars().filter(|c| *c != ',').collect();
    let amount = cleaned
        .trim()
        .parse::<f64>()
        .with_context(|| format!("'{}' is not a number", raw))?;

    Ok((amount, symbol))
}

// ============================================================================
// TESTS
// ============================================================================
