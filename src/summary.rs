// 📝 Text Summary - Plain-text rendering of an analysis
//
// Used by the CLI and as the body of the TUI panels.

use crate::analysis::Analysis;

/// "$12.50"
pub fn format_money(amount: f64, currency: &str) -> String {
    format!("{}{:.2}", currency, amount)
}

/// "+$10.00", "-$10.00" or "$0.00"
pub fn format_difference(difference: f64, currency: &str) -> String {
    if difference > 0.0 {
        format!("+{}", format_money(difference.abs(), currency))
    } else if difference < 0.0 {
        format!("-{}", format_money(difference.abs(), currency))
    } else {
        format_money(0.0, currency)
    }
}

/// "+$10.00 above average", "-$10.00 below average" or "exactly average"
pub fn describe_difference(difference: f64, currency: &str) -> String {
    if difference > 0.0 {
        format!("{} above average", format_difference(difference, currency))
    } else if difference < 0.0 {
        format!("{} below average", format_difference(difference, currency))
    } else {
        "exactly average".to_string()
    }
}

/// Currency label for group-level figures (first member's, or the default)
pub fn group_currency(analysis: &Analysis) -> &str {
    analysis
        .members
        .first()
        .map(|m| m.currency())
        .unwrap_or(crate::contribution::DEFAULT_CURRENCY)
}

/// Multi-line report for terminals
pub fn render(analysis: &Analysis) -> String {
    let report = &analysis.report;
    let currency = group_currency(analysis);
    let mut lines = Vec::new();

    lines.push(format!("{}: {:.0}%", report.status(), report.score));
    lines.push(analysis.narrative.clone());
    lines.push(String::new());

    lines.push("Member Contributions".to_string());
    for (idx, member) in analysis.members.iter().enumerate() {
        lines.push(format!(
            "  {}. {} {}",
            idx + 1,
            member.name(),
            format_money(member.amount(), member.currency())
        ));
    }
    lines.push(format!("  Total: {}", format_money(analysis.total, currency)));
    lines.push(String::new());

    lines.push(format!(
        "Average Contribution: {}",
        format_money(report.average, currency)
    ));
    for detail in &report.details {
        lines.push(format!(
            "  {}: {}",
            detail.name,
            describe_difference(detail.difference, &detail.currency)
        ));
    }
    lines.push(String::new());

    if analysis.needs_settlement() {
        lines.push("To settle this expense fairly, here's who should pay whom:".to_string());
        for (idx, s) in analysis.settlements.iter().enumerate() {
            lines.push(format!(
                "  {}. {} pays {}: {}",
                idx + 1,
                s.from,
                s.to,
                format_money(s.amount, &s.currency)
            ));
        }
    }
    lines.push(analysis.settlement_note());

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze;
    use crate::contribution::Contribution;

    #[test]
    fn test_format_money_and_difference() {
        assert_eq!(format_money(12.5, "$"), "$12.50");
        assert_eq!(format_money(3.0, "€"), "€3.00");

        assert_eq!(format_difference(10.0, "$"), "+$10.00");
        assert_eq!(format_difference(-10.0, "$"), "-$10.00");
        assert_eq!(format_difference(0.0, "$"), "$0.00");
    }

    #[test]
    fn test_describe_difference() {
        assert_eq!(describe_difference(2.5, "$"), "+$2.50 above average");
        assert_eq!(describe_difference(-2.5, "$"), "-$2.50 below average");
        assert_eq!(describe_difference(0.0, "$"), "exactly average");
    }

    #[test]
    fn test_render_with_settlements() {
        let analysis = analyze(&[
            Contribution::new("Alice", 30.0).unwrap(),
            Contribution::new("Bob", 10.0).unwrap(),
        ])
        .unwrap();

        let text = render(&analysis);

        assert!(text.starts_with("Unbalanced Distribution: 0%"));
        assert!(text.contains("  1. Alice $30.00"));
        assert!(text.contains("  Total: $40.00"));
        assert!(text.contains("Average Contribution: $20.00"));
        assert!(text.contains("  Alice: +$10.00 above average"));
        assert!(text.contains("  Bob: -$10.00 below average"));
        assert!(text.contains("  1. Bob pays Alice: $10.00"));
        assert!(text.ends_with("All debts can be settled with just 1 transaction!"));
    }

    #[test]
    fn test_render_without_settlements() {
        let analysis = analyze(&[
            Contribution::new("Alice", 10.0).unwrap(),
            Contribution::new("Bob", 10.0).unwrap(),
        ])
        .unwrap();

        let text = render(&analysis);

        assert!(text.starts_with("Fair Distribution: 100%"));
        assert!(text.contains("  Alice: exactly average"));
        assert!(!text.contains("who should pay whom"));
        assert!(text.ends_with("Everyone contributed their fair share! No settlements needed."));
    }
}
