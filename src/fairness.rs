// ⚖️ Fairness Evaluator - How evenly did the group contribute?
//
// Score formula:
//   score = clamp(100 - sample_std_dev * 10, 0, 100)
//
// Each unit of currency of sample standard deviation costs 10 points.
// The divisor is n - 1 (Bessel-corrected) whenever more than one
// contribution exists; a single contribution has zero deviation.

use crate::contribution::Contribution;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Score at or above which a distribution is shown as fair
pub const FAIR_THRESHOLD: f64 = 70.0;

// ============================================================================
// FAIRNESS REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDeviation {
    pub name: String,
    pub amount: f64,
    pub currency: String,
    /// amount - average (positive = paid more than average)
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairnessReport {
    /// Bounded to [0, 100]
    pub score: f64,
    pub average: f64,
    /// One entry per contribution, in input order
    pub details: Vec<MemberDeviation>,
    pub standard_deviation: f64,
}

impl FairnessReport {
    pub fn level(&self) -> FairnessLevel {
        FairnessLevel::from_score(self.score)
    }

    pub fn is_fair(&self) -> bool {
        self.score >= FAIR_THRESHOLD
    }

    /// "Fair Distribution" or "Unbalanced Distribution"
    pub fn status(&self) -> &'static str {
        if self.is_fair() {
            "Fair Distribution"
        } else {
            "Unbalanced Distribution"
        }
    }

    /// Largest contributor; first occurrence wins on ties
    pub fn max_contributor(&self) -> Option<&MemberDeviation> {
        self.details.iter().fold(None, |best, d| match best {
            Some(b) if b.amount >= d.amount => Some(b),
            _ => Some(d),
        })
    }

    /// Smallest contributor; first occurrence wins on ties
    pub fn min_contributor(&self) -> Option<&MemberDeviation> {
        self.details.iter().fold(None, |best, d| match best {
            Some(b) if b.amount <= d.amount => Some(b),
            _ => Some(d),
        })
    }

    pub fn summary(&self) -> String {
        format!(
            "Fairness: {:.0}% ({}), average {:.2}, std dev {:.2}, {} members",
            self.score,
            self.level().as_str(),
            self.average,
            self.standard_deviation,
            self.details.len()
        )
    }
}

// ============================================================================
// FAIRNESS LEVEL
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FairnessLevel {
    Excellent, // score >= 85
    Good,      // score >= 70
    Moderate,  // score >= 50
    Low,
}

impl FairnessLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            FairnessLevel::Excellent
        } else if score >= 70.0 {
            FairnessLevel::Good
        } else if score >= 50.0 {
            FairnessLevel::Moderate
        } else {
            FairnessLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FairnessLevel::Excellent => "excellent",
            FairnessLevel::Good => "good",
            FairnessLevel::Moderate => "moderate",
            FairnessLevel::Low => "low",
        }
    }
}

// ============================================================================
// FAIRNESS EVALUATOR
// ============================================================================

/// Evaluate contributions. Returns None for an empty list, or when the
/// amounts are too large for the total or spread to stay finite.
pub fn evaluate(contributions: &[Contribution]) -> Option<FairnessReport> {
    if contributions.is_empty() {
        return None;
    }

    let n = contributions.len() as f64;
    let average = contributions.iter().map(|c| c.amount()).sum::<f64>() / n;
    let standard_deviation = sample_std_dev(contributions, average);

    if !average.is_finite() || !standard_deviation.is_finite() {
        warn!(members = contributions.len(), "contribution amounts overflow, no report");
        return None;
    }

    let details = contributions
        .iter()
        .map(|c| MemberDeviation {
            name: c.name().to_string(),
            amount: c.amount(),
            currency: c.currency().to_string(),
            difference: c.amount() - average,
        })
        .collect();

    let score = (100.0 - standard_deviation * 10.0).clamp(0.0, 100.0);

    debug!(
        members = contributions.len(),
        average, standard_deviation, score, "evaluated fairness"
    );

    Some(FairnessReport {
        score,
        average,
        details,
        standard_deviation,
    })
}

/// Bessel-corrected standard deviation; 0 for fewer than two values
fn sample_std_dev(contributions: &[Contribution], mean: f64) -> f64 {
    if contributions.len() < 2 {
        return 0.0;
    }

    let sum_sq: f64 = contributions
        .iter()
        .map(|c| (c.amount() - mean).powi(2))
        .sum();

    (sum_sq / (contributions.len() - 1) as f64).sqrt()
}

/// Qualitative narrative for a report
pub fn explain(report: &FairnessReport) -> String {
    let (max, min) = match (report.max_contributor(), report.min_contributor()) {
        (Some(max), Some(min)) => (max, min),
        _ => return "No members to analyze.".to_string(),
    };

    let level = report.level();
    let note = match level {
        FairnessLevel::Excellent => "All members contributed nearly equally.".to_string(),
        FairnessLevel::Good => format!(
            "{} contributed slightly more, while others are balanced.",
            max.name
        ),
        FairnessLevel::Moderate => format!(
            "There's some imbalance - {} paid more than {}.",
            max.name, min.name
        ),
        FairnessLevel::Low => format!(
            "Significant imbalance detected between {} and {}.",
            max.name, min.name
        ),
    };

    format!(
        "According to the fairness model, {} Overall fairness is {} at {:.0}%.",
        note,
        level.as_str(),
        report.score
    )
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn members(entries: &[(&str, f64)]) -> Vec<Contribution> {
        entries
            .iter()
            .map(|(name, amount)| Contribution::new(name, *amount).unwrap())
            .collect()
    }

    fn report_with_score(score: f64, entries: &[(&str, f64)]) -> FairnessReport {
        let mut report = evaluate(&members(entries)).unwrap();
        report.score = score;
        report
    }

    #[test]
    fn test_empty_input_has_no_report() {
        assert!(evaluate(&[]).is_none());
    }

    #[test]
    fn test_single_contributor_is_perfectly_fair() {
        let report = evaluate(&members(&[("Alice", 42.0)])).unwrap();

        assert_eq!(report.standard_deviation, 0.0);
        assert_eq!(report.score, 100.0);
        assert_eq!(report.average, 42.0);
        assert_eq!(report.details[0].difference, 0.0);
    }

    #[test]
    fn test_equal_contributions_score_100() {
        let report = evaluate(&members(&[("A", 10.0), ("B", 10.0), ("C", 10.0)])).unwrap();

        assert_eq!(report.standard_deviation, 0.0);
        assert_eq!(report.score, 100.0);
        assert!(report.is_fair());
        assert_eq!(report.level(), FairnessLevel::Excellent);
    }

    #[test]
    fn test_uses_sample_not_population_std_dev() {
        // Values 10, 12: mean 11, squared deviations sum to 2.
        // Sample variance = 2 / 1 = 2, population variance would be 1.
        let report = evaluate(&members(&[("A", 10.0), ("B", 12.0)])).unwrap();

        assert!((report.standard_deviation - 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((report.score - (100.0 - 2.0_f64.sqrt() * 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_score_is_clamped_to_zero() {
        let report = evaluate(&members(&[("A", 30.0), ("B", 10.0)])).unwrap();

        // stdev = sqrt(200) ≈ 14.14 → 100 - 141.4 → clamped
        assert!((report.standard_deviation - 200.0_f64.sqrt()).abs() < 1e-9);
        assert_eq!(report.score, 0.0);
        assert_eq!(report.level(), FairnessLevel::Low);
        assert!(!report.is_fair());
    }

    #[test]
    fn test_average_and_differences_in_input_order() {
        let report = evaluate(&members(&[("Zed", 6.0), ("Amy", 0.0), ("Bo", 3.0)])).unwrap();

        assert_eq!(report.average, 3.0);
        let names: Vec<&str> = report.details.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Amy", "Bo"]);

        let diffs: Vec<f64> = report.details.iter().map(|d| d.difference).collect();
        assert_eq!(diffs, vec![3.0, -3.0, 0.0]);
    }

    #[test]
    fn test_details_carry_currency() {
        let items = vec![
            Contribution::with_currency("A", 1.0, "€").unwrap(),
            Contribution::new("B", 1.0).unwrap(),
        ];
        let report = evaluate(&items).unwrap();

        assert_eq!(report.details[0].currency, "€");
        assert_eq!(report.details[1].currency, "$");
    }

    #[test]
    fn test_overflowing_amounts_have_no_report() {
        // Total overflows to infinity
        assert!(evaluate(&members(&[("A", f64::MAX), ("B", f64::MAX)])).is_none());
        // Total is finite but the squared spread is not
        assert!(evaluate(&members(&[("A", 0.0), ("B", 1e300)])).is_none());
        assert!(evaluate(&members(&[("A", 0.0), ("B", 1e9)])).is_some());
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let items = members(&[("A", 5.5), ("B", 7.25), ("C", 1.0)]);

        assert_eq!(evaluate(&items), evaluate(&items));
    }

    #[test]
    fn test_level_band_boundaries() {
        assert_eq!(FairnessLevel::from_score(100.0), FairnessLevel::Excellent);
        assert_eq!(FairnessLevel::from_score(85.0), FairnessLevel::Excellent);
        assert_eq!(FairnessLevel::from_score(84.99), FairnessLevel::Good);
        assert_eq!(FairnessLevel::from_score(70.0), FairnessLevel::Good);
        assert_eq!(FairnessLevel::from_score(69.99), FairnessLevel::Moderate);
        assert_eq!(FairnessLevel::from_score(50.0), FairnessLevel::Moderate);
        assert_eq!(FairnessLevel::from_score(49.99), FairnessLevel::Low);
        assert_eq!(FairnessLevel::from_score(0.0), FairnessLevel::Low);
    }

    #[test]
    fn test_explain_excellent() {
        let report = report_with_score(90.0, &[("Alice", 10.0), ("Bob", 10.0)]);

        assert_eq!(
            explain(&report),
            "According to the fairness model, All members contributed nearly equally. \
             Overall fairness is excellent at 90%."
        );
    }

    #[test]
    fn test_explain_good_names_max_contributor() {
        let report = report_with_score(75.0, &[("Alice", 10.0), ("Bob", 12.0)]);
        let text = explain(&report);

        assert!(text.contains("Bob contributed slightly more, while others are balanced."));
        assert!(text.ends_with("Overall fairness is good at 75%."));
    }

    #[test]
    fn test_explain_moderate_and_low_name_both_ends() {
        let moderate = report_with_score(60.0, &[("Alice", 10.0), ("Bob", 14.0), ("Cy", 9.0)]);
        assert!(explain(&moderate).contains("There's some imbalance - Bob paid more than Cy."));

        let low = report_with_score(10.0, &[("Alice", 10.0), ("Bob", 40.0), ("Cy", 0.0)]);
        assert!(explain(&low).contains("Significant imbalance detected between Bob and Cy."));
        assert!(explain(&low).ends_with("Overall fairness is low at 10%."));
    }

    #[test]
    fn test_max_min_ties_resolve_to_first_occurrence() {
        let report = evaluate(&members(&[
            ("First", 5.0),
            ("Low1", 1.0),
            ("Second", 5.0),
            ("Low2", 1.0),
        ]))
        .unwrap();

        assert_eq!(report.max_contributor().unwrap().name, "First");
        assert_eq!(report.min_contributor().unwrap().name, "Low1");
    }

    #[test]
    fn test_explain_without_members() {
        let report = FairnessReport {
            score: 100.0,
            average: 0.0,
            details: vec![],
            standard_deviation: 0.0,
        };

        assert_eq!(explain(&report), "No members to analyze.");
    }
}
