// 💵 Contribution - One member's payment toward a shared expense
//
// A contribution is the only input shape the fairness and settlement engines
// accept. Construction validates, so a Contribution that exists is always
// well-formed: non-empty name, finite non-negative amount.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display symbol used when a contribution carries no currency
pub const DEFAULT_CURRENCY: &str = "$";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContributionError {
    #[error("member name must not be empty")]
    EmptyName,

    #[error("amount for {name} must not be negative, got {amount}")]
    NegativeAmount { name: String, amount: f64 },

    #[error("amount for {name} must be a finite number")]
    NonFiniteAmount { name: String },
}

// ============================================================================
// CONTRIBUTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContribution")]
pub struct Contribution {
    name: String,
    amount: f64,
    currency: String,
}

/// Unvalidated wire shape. Everything that deserializes a Contribution goes
/// through `Contribution::new` via this type.
#[derive(Debug, Deserialize)]
struct RawContribution {
    name: String,
    amount: f64,
    #[serde(default = "default_currency")]
    currency: String,
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl TryFrom<RawContribution> for Contribution {
    type Error = ContributionError;

    fn try_from(raw: RawContribution) -> Result<Self, Self::Error> {
        Contribution::with_currency(&raw.name, raw.amount, &raw.currency)
    }
}

impl Contribution {
    /// Create a contribution in the default currency
    pub fn new(name: &str, amount: f64) -> Result<Self, ContributionError> {
        Self::with_currency(name, amount, DEFAULT_CURRENCY)
    }

    /// Create a contribution with an explicit display currency.
    /// An empty currency falls back to the default symbol.
    pub fn with_currency(
        name: &str,
        amount: f64,
        currency: &str,
    ) -> Result<Self, ContributionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ContributionError::EmptyName);
        }

        if !amount.is_finite() {
            return Err(ContributionError::NonFiniteAmount {
                name: name.to_string(),
            });
        }

        if amount < 0.0 {
            return Err(ContributionError::NegativeAmount {
                name: name.to_string(),
                amount,
            });
        }

        let currency = currency.trim();
        let currency = if currency.is_empty() {
            DEFAULT_CURRENCY
        } else {
            currency
        };

        Ok(Contribution {
            name: name.to_string(),
            // -0.0 would print as "-$0.00"
            amount: amount + 0.0,
            currency: currency.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

/// Sum of all amounts
pub fn total(contributions: &[Contribution]) -> f64 {
    contributions.iter().map(|c| c.amount).sum()
}

/// Merge contributions that share a name, summing their amounts.
///
/// Name is the identity key: two different people with the same name are
/// merged. Output keeps first-seen order and the first-seen currency.
pub fn aggregate_by_name<'a, I>(contributions: I) -> Vec<Contribution>
where
    I: IntoIterator<Item = &'a Contribution>,
{
    let mut merged: Vec<Contribution> = Vec::new();

    for contribution in contributions {
        match merged.iter_mut().find(|m| m.name == contribution.name) {
            Some(existing) => existing.amount += contribution.amount,
            None => merged.push(contribution.clone()),
        }
    }

    merged
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_name_and_defaults_currency() {
        let c = Contribution::new("  Alice ", 12.5).unwrap();

        assert_eq!(c.name(), "Alice");
        assert_eq!(c.amount(), 12.5);
        assert_eq!(c.currency(), "$");
    }

    #[test]
    fn test_zero_amount_is_allowed() {
        let c = Contribution::new("Bob", 0.0).unwrap();
        assert_eq!(c.amount(), 0.0);

        let negative_zero = Contribution::new("Bob", -0.0).unwrap();
        assert!(negative_zero.amount().is_sign_positive());
    }

    #[test]
    fn test_rejects_invalid_input() {
        assert_eq!(
            Contribution::new("   ", 10.0),
            Err(ContributionError::EmptyName)
        );

        assert!(matches!(
            Contribution::new("Carol", -1.0),
            Err(ContributionError::NegativeAmount { .. })
        ));

        assert!(matches!(
            Contribution::new("Carol", f64::NAN),
            Err(ContributionError::NonFiniteAmount { .. })
        ));

        assert!(matches!(
            Contribution::new("Carol", f64::INFINITY),
            Err(ContributionError::NonFiniteAmount { .. })
        ));
    }

    #[test]
    fn test_empty_currency_falls_back_to_default() {
        let c = Contribution::with_currency("Dan", 5.0, " ").unwrap();
        assert_eq!(c.currency(), DEFAULT_CURRENCY);

        let euro = Contribution::with_currency("Dan", 5.0, "€").unwrap();
        assert_eq!(euro.currency(), "€");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Contribution =
            serde_json::from_str(r#"{"name": "Eve", "amount": 20.0}"#).unwrap();
        assert_eq!(ok.name(), "Eve");
        assert_eq!(ok.currency(), "$");

        let bad = serde_json::from_str::<Contribution>(r#"{"name": "Eve", "amount": -3.0}"#);
        assert!(bad.is_err());

        let unnamed = serde_json::from_str::<Contribution>(r#"{"name": "", "amount": 3.0}"#);
        assert!(unnamed.is_err());
    }

    #[test]
    fn test_serialize_roundtrip_shape() {
        let c = Contribution::with_currency("Frank", 7.25, "£").unwrap();
        let json = serde_json::to_value(&c).unwrap();

        assert_eq!(json["name"], "Frank");
        assert_eq!(json["amount"], 7.25);
        assert_eq!(json["currency"], "£");
    }

    #[test]
    fn test_aggregate_by_name_merges_and_keeps_order() {
        let items = vec![
            Contribution::new("Alice", 10.0).unwrap(),
            Contribution::new("Bob", 5.0).unwrap(),
            Contribution::new("Alice", 15.0).unwrap(),
            Contribution::new("Carol", 0.0).unwrap(),
        ];

        let merged = aggregate_by_name(&items);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].name(), "Alice");
        assert_eq!(merged[0].amount(), 25.0);
        assert_eq!(merged[1].name(), "Bob");
        assert_eq!(merged[2].name(), "Carol");
        assert_eq!(total(&merged), 30.0);
    }
}
