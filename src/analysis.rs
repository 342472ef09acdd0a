// 📊 Analysis - Fairness report + settlement plan for one set of contributions
//
// This is the bundle every collaborator consumes: the CLI prints it, the TUI
// draws it, the server returns it as JSON, the exporter writes it to CSV.

use crate::contribution::{self, Contribution};
use crate::fairness::{self, FairnessReport};
use crate::settlement::{Settlement, SettlementPlanner};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub members: Vec<Contribution>,
    pub report: FairnessReport,
    pub narrative: String,
    pub settlements: Vec<Settlement>,
    pub total: f64,
}

impl Analysis {
    pub fn needs_settlement(&self) -> bool {
        !self.settlements.is_empty()
    }

    /// "All debts can be settled with just 2 transactions!"
    pub fn settlement_note(&self) -> String {
        match self.settlements.len() {
            0 => "Everyone contributed their fair share! No settlements needed.".to_string(),
            1 => "All debts can be settled with just 1 transaction!".to_string(),
            n => format!("All debts can be settled with just {} transactions!", n),
        }
    }
}

/// Run both engines over the same contributions. None for an empty list or
/// amounts whose total overflows.
pub fn analyze(members: &[Contribution]) -> Option<Analysis> {
    analyze_with(members, &SettlementPlanner::new())
}

pub fn analyze_with(members: &[Contribution], planner: &SettlementPlanner) -> Option<Analysis> {
    let report = fairness::evaluate(members)?;
    let narrative = fairness::explain(&report);
    let settlements = planner.plan(members);

    Some(Analysis {
        members: members.to_vec(),
        report,
        narrative,
        settlements,
        total: contribution::total(members),
    })
}
