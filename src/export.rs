// 📤 CSV Export - Downloadable payment summary
//
// Layout:
//   FairSplit - Payment Summary
//   Generated:, <timestamp>
//   Member Contributions        (Name / Amount Contributed / Total)
//   Fairness Analysis           (score, average, per-member difference)
//   Settlement Suggestions      (From / To / Amount)

use crate::contribution::{self, Contribution, DEFAULT_CURRENCY};
use crate::fairness::FairnessReport;
use crate::settlement::Settlement;
use crate::summary::{format_difference, format_money};
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::path::Path;

pub const TITLE: &str = "FairSplit - Payment Summary";
pub const NO_SETTLEMENTS: &str = "No settlements needed - everyone contributed their fair share!";

/// Render the summary as CSV text
pub fn summary_csv<Tz>(
    members: &[Contribution],
    report: Option<&FairnessReport>,
    settlements: &[Settlement],
    generated_at: DateTime<Tz>,
) -> Result<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    let currency = members
        .first()
        .map(|m| m.currency())
        .unwrap_or(DEFAULT_CURRENCY);

    wtr.write_record([TITLE])?;
    wtr.write_record([
        "Generated:".to_string(),
        generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ])?;
    wtr.write_record([""])?;

    // Member contributions
    wtr.write_record(["Member Contributions"])?;
    wtr.write_record(["Name", "Amount Contributed"])?;
    for member in members {
        wtr.write_record([
            member.name().to_string(),
            format_money(member.amount(), member.currency()),
        ])?;
    }
    wtr.write_record([
        "Total".to_string(),
        format_money(contribution::total(members), currency),
    ])?;
    wtr.write_record([""])?;

    // Fairness analysis
    if let Some(report) = report {
        wtr.write_record(["Fairness Analysis"])?;
        wtr.write_record(["Fairness Score".to_string(), format!("{:.0}%", report.score)])?;
        wtr.write_record([
            "Average Contribution".to_string(),
            format_money(report.average, currency),
        ])?;
        wtr.write_record([""])?;

        wtr.write_record(["Member", "Paid", "Difference from Average"])?;
        for detail in &report.details {
            wtr.write_record([
                detail.name.clone(),
                format_money(detail.amount, &detail.currency),
                format_difference(detail.difference, &detail.currency),
            ])?;
        }
        wtr.write_record([""])?;
    }

    // Settlements
    wtr.write_record(["Settlement Suggestions"])?;
    if settlements.is_empty() {
        wtr.write_record([NO_SETTLEMENTS])?;
    } else {
        wtr.write_record(["From", "To", "Amount"])?;
        for s in settlements {
            wtr.write_record([
                s.from.clone(),
                s.to.clone(),
                format_money(s.amount, &s.currency),
            ])?;
        }
    }

    let bytes = wtr.into_inner().context("Failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

/// "fairsplit_summary_20250131_184500.csv"
pub fn export_file_name<Tz>(now: DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("fairsplit_summary_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write the summary to `path`
pub fn write_summary_csv<Tz>(
    path: &Path,
    members: &[Contribution],
    report: Option<&FairnessReport>,
    settlements: &[Settlement],
    generated_at: DateTime<Tz>,
) -> Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let csv = summary_csv(members, report, settlements, generated_at)?;
    std::fs::write(path, csv)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;

    tracing::info!(path = %path.display(), members = members.len(), "exported summary CSV");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use chrono::Utc;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 31, 18, 45, 0).unwrap()
    }

    #[test]
    fn test_summary_csv_layout() {
        let analysis = analyze(&[
            Contribution::new("Alice", 30.0).unwrap(),
            Contribution::new("Bob", 10.0).unwrap(),
        ])
        .unwrap();

        let csv = summary_csv(
            &analysis.members,
            Some(&analysis.report),
            &analysis.settlements,
            fixed_time(),
        )
        .unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], TITLE);
        assert_eq!(lines[1], "Generated:,2025-01-31 18:45:00");
        assert!(lines.contains(&"Name,Amount Contributed"));
        assert!(lines.contains(&"Alice,$30.00"));
        assert!(lines.contains(&"Total,$40.00"));
        assert!(lines.contains(&"Fairness Score,0%"));
        assert!(lines.contains(&"Average Contribution,$20.00"));
        assert!(lines.contains(&"Alice,$30.00,+$10.00"));
        assert!(lines.contains(&"Bob,$10.00,-$10.00"));
        assert!(lines.contains(&"From,To,Amount"));
        assert_eq!(*lines.last().unwrap(), "Bob,Alice,$10.00");
    }

    #[test]
    fn test_summary_csv_without_report_or_settlements() {
        let members = vec![Contribution::new("Solo", 5.0).unwrap()];

        let csv = summary_csv(&members, None, &[], fixed_time()).unwrap();

        assert!(!csv.contains("Fairness Analysis"));
        assert!(csv.contains("Settlement Suggestions"));
        assert!(csv.trim_end().ends_with(NO_SETTLEMENTS));
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(
            export_file_name(fixed_time()),
            "fairsplit_summary_20250131_184500.csv"
        );
    }
}
