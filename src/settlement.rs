// 🤝 Settlement Planner - Who pays whom, and how much
//
// Following the formula:
//   fair_share = total / count
//   balance    = amount - fair_share   (positive = creditor, negative = debtor)
//
// Creditors and debtors are matched with a two-pointer greedy merge, largest
// imbalances first. This is not a minimum-transaction solver; it is the
// classic O(n log n) reconciliation and its output is reproducible.

use crate::contribution::Contribution;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use tracing::{debug, warn};

/// Balances within this distance of zero settle nothing
pub const DEFAULT_TOLERANCE: f64 = 0.01;

// ============================================================================
// SETTLEMENT
// ============================================================================

/// A single directed transfer: debtor (`from`) pays creditor (`to`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub from: String,
    pub to: String,
    pub amount: f64,
    pub currency: String,
}

/// A member's position relative to the fair share
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    pub name: String,
    pub balance: f64,
    pub currency: String,
}

/// Received minus paid for one member across a settlement plan
pub fn net_flow(settlements: &[Settlement], name: &str) -> f64 {
    settlements
        .iter()
        .map(|s| {
            if s.to == name {
                s.amount
            } else if s.from == name {
                -s.amount
            } else {
                0.0
            }
        })
        .sum()
}

// ============================================================================
// SETTLEMENT PLANNER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    #[error("settlement tolerance must be a finite number above zero, got {0}")]
    InvalidTolerance(f64),
}

#[derive(Debug, Clone)]
pub struct SettlementPlanner {
    /// Tolerance for floating-point comparisons (default: 0.01)
    tolerance: f64,
}

impl SettlementPlanner {
    pub fn new() -> Self {
        SettlementPlanner {
            tolerance: DEFAULT_TOLERANCE,
        }
    }

    pub fn with_tolerance(tolerance: f64) -> Result<Self, SettlementError> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(SettlementError::InvalidTolerance(tolerance));
        }
        Ok(SettlementPlanner { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Each member's balance against the equal share, in input order.
    /// Empty when the total is not finite.
    pub fn balances(&self, contributions: &[Contribution]) -> Vec<Balance> {
        if contributions.is_empty() {
            return Vec::new();
        }

        let total: f64 = contributions.iter().map(|c| c.amount()).sum();
        if !total.is_finite() {
            warn!(members = contributions.len(), "contribution total overflows, no balances");
            return Vec::new();
        }
        let fair_share = total / contributions.len() as f64;

        contributions
            .iter()
            .map(|c| Balance {
                name: c.name().to_string(),
                balance: c.amount() - fair_share,
                currency: c.currency().to_string(),
            })
            .collect()
    }

    /// Plan the transfers that bring everyone to the fair share
    ///
    /// Example:
    /// ```
    /// use fair_split::{Contribution, SettlementPlanner};
    ///
    /// let members = vec![
    ///     Contribution::new("Alice", 30.0).unwrap(),
    ///     Contribution::new("Bob", 10.0).unwrap(),
    /// ];
    ///
    /// let plan = SettlementPlanner::new().plan(&members);
    /// assert_eq!(plan.len(), 1);
    /// assert_eq!(plan[0].from, "Bob");
    /// assert_eq!(plan[0].to, "Alice");
    /// ```
    pub fn plan(&self, contributions: &[Contribution]) -> Vec<Settlement> {
        let balances = self.balances(contributions);

        let mut creditors: Vec<Balance> = balances
            .iter()
            .filter(|b| b.balance > self.tolerance)
            .cloned()
            .collect();
        let mut debtors: Vec<Balance> = balances
            .iter()
            .filter(|b| b.balance < -self.tolerance)
            .cloned()
            .collect();

        // sort_by is stable: equal balances keep input order
        creditors.sort_by(|a, b| b.balance.partial_cmp(&a.balance).unwrap_or(Ordering::Equal));
        debtors.sort_by(|a, b| a.balance.partial_cmp(&b.balance).unwrap_or(Ordering::Equal));

        let mut settlements = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < creditors.len() && j < debtors.len() {
            let creditor = &mut creditors[i];
            let debtor = &mut debtors[j];

            let amount = creditor.balance.min(-debtor.balance);

            if amount > self.tolerance {
                settlements.push(Settlement {
                    from: debtor.name.clone(),
                    to: creditor.name.clone(),
                    amount,
                    currency: creditor.currency.clone(),
                });
            }

            creditor.balance -= amount;
            debtor.balance += amount;

            if creditor.balance < self.tolerance {
                i += 1;
            }
            if debtor.balance > -self.tolerance {
                j += 1;
            }
        }

        debug!(
            members = contributions.len(),
            creditors = creditors.len(),
            debtors = debtors.len(),
            transfers = settlements.len(),
            "planned settlements"
        );

        settlements
    }
}

impl Default for SettlementPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Plan with the default tolerance
pub fn plan(contributions: &[Contribution]) -> Vec<Settlement> {
    SettlementPlanner::new().plan(contributions)
}

// ============================================================================
// TESTS
// ============================================================================
