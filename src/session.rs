// 🧾 Session - Caller-owned working state for one splitting session
//
// Holds the members being entered, the expense categories already saved,
// and the last computed analysis. Any mutation invalidates the analysis.

use crate::analysis::{self, Analysis};
use crate::contribution::{self, Contribution, ContributionError};
use crate::summary;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    InvalidContribution(#[from] ContributionError),

    #[error("no members to save")]
    NoMembers,

    #[error("no member at position {0}")]
    NoSuchMember(usize),

    #[error("no expense at position {0}")]
    NoSuchExpense(usize),
}

// ============================================================================
// EXPENSE CATEGORY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExpenseCategory {
    #[default]
    General,
    Food,
    Lodging,
    Transportation,
    Entertainment,
    Bills,
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 7] = [
        ExpenseCategory::General,
        ExpenseCategory::Food,
        ExpenseCategory::Lodging,
        ExpenseCategory::Transportation,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Bills,
        ExpenseCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::General => "General",
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Lodging => "Lodging",
            ExpenseCategory::Transportation => "Transportation",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Bills => "Bills",
            ExpenseCategory::Other => "Other",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

/// Members saved under one expense category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub category: ExpenseCategory,
    pub members: Vec<Contribution>,
}

impl Expense {
    pub fn total(&self) -> f64 {
        contribution::total(&self.members)
    }

    /// "Food - $45.00 (3 members)"
    pub fn describe(&self) -> String {
        let currency = self
            .members
            .first()
            .map(|m| m.currency())
            .unwrap_or(contribution::DEFAULT_CURRENCY);

        format!(
            "{} - {} ({} members)",
            self.category.as_str(),
            summary::format_money(self.total(), currency),
            self.members.len()
        )
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct Session {
    members: Vec<Contribution>,
    expenses: Vec<Expense>,
    pub current_category: ExpenseCategory,
    analysis: Option<Analysis>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[Contribution] {
        &self.members
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    /// Last computed analysis, if still valid
    pub fn analysis(&self) -> Option<&Analysis> {
        self.analysis.as_ref()
    }

    pub fn add_member(&mut self, name: &str, amount: f64) -> Result<&Contribution, SessionError> {
        let contribution = Contribution::new(name, amount)?;
        self.add_contribution(contribution);
        Ok(&self.members[self.members.len() - 1])
    }

    pub fn add_contribution(&mut self, contribution: Contribution) {
        self.members.push(contribution);
        self.analysis = None;
    }

    pub fn remove_member(&mut self, index: usize) -> Result<Contribution, SessionError> {
        if index >= self.members.len() {
            return Err(SessionError::NoSuchMember(index));
        }
        self.analysis = None;
        Ok(self.members.remove(index))
    }

    /// Replace current members, e.g. with a group loaded from history
    pub fn load_members(&mut self, members: Vec<Contribution>) {
        self.members = members;
        self.analysis = None;
    }

    /// Drop members, expenses and the cached analysis
    pub fn clear(&mut self) {
        self.members.clear();
        self.expenses.clear();
        self.analysis = None;
    }

    /// Move the current members into a new expense under `category`
    pub fn save_expense(&mut self, category: ExpenseCategory) -> Result<&Expense, SessionError> {
        if self.members.is_empty() {
            return Err(SessionError::NoMembers);
        }

        let members = std::mem::take(&mut self.members);
        self.expenses.push(Expense { category, members });
        self.analysis = None;

        Ok(&self.expenses[self.expenses.len() - 1])
    }

    pub fn remove_expense(&mut self, index: usize) -> Result<Expense, SessionError> {
        if index >= self.expenses.len() {
            return Err(SessionError::NoSuchExpense(index));
        }
        self.analysis = None;
        Ok(self.expenses.remove(index))
    }

    /// Per-name totals across all saved expenses, then current members
    pub fn combined_members(&self) -> Vec<Contribution> {
        contribution::aggregate_by_name(
            self.expenses
                .iter()
                .flat_map(|e| e.members.iter())
                .chain(self.members.iter()),
        )
    }

    pub fn can_analyze(&self) -> bool {
        self.members.len() >= 2 || self.combined_members().len() >= 2
    }

    /// "2 saved categories + 3 current members = 4 unique members"
    pub fn readiness_summary(&self) -> Option<String> {
        let num_categories = self.expenses.len();
        let num_current = self.members.len();

        let mut parts = Vec::new();
        if num_categories > 0 {
            parts.push(format!(
                "{} saved categor{}",
                num_categories,
                if num_categories == 1 { "y" } else { "ies" }
            ));
        }
        if num_current > 0 {
            parts.push(format!(
                "{} current member{}",
                num_current,
                if num_current == 1 { "" } else { "s" }
            ));
        }

        if parts.is_empty() {
            return None;
        }

        let unique = self.combined_members().len();
        Some(format!(
            "{} = {} unique member{}",
            parts.join(" + "),
            unique,
            if unique == 1 { "" } else { "s" }
        ))
    }

    /// Compute and cache the analysis over all categories
    pub fn analyze(&mut self) -> Option<&Analysis> {
        self.analysis = analysis::analyze(&self.combined_members());
        self.analysis.as_ref()
    }
}

// ============================================================================
// TESTS
// ============================================================================
