use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::rounding::{variance, variance_pct, within_tolerance, Tolerance};
use crate::types::{Money, Rate};

// ---------------------------------------------------------------------------
// Severity lattice
// ---------------------------------------------------------------------------

/// Ordered severity of a failed check: `Info < Warning < Material < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    #[serde(alias = "minor")]
    Warning,
    Material,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Material => "material",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Revenue,
    Expense,
    Profitability,
    CashFlow,
    BalanceSheet,
    Debt,
    Depreciation,
    Timing,
    Reasonableness,
    Intercompany,
    Reconciliation,
    Assumptions,
    Export,
}

// ---------------------------------------------------------------------------
// Check result
// ---------------------------------------------------------------------------

/// One expected-vs-actual comparison. A failed check is a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub name: String,
    pub category: CheckCategory,
    /// Where the expected figure comes from (USALI line, GAAP rule, ...)
    pub reference: String,
    pub formula: String,
    pub expected: Decimal,
    pub actual: Decimal,
    pub variance: Decimal,
    pub variance_pct: Rate,
    pub passed: bool,
    /// Severity assigned if the check fails
    pub severity: Severity,
}

impl CheckResult {
    /// Numeric comparison under `tol`.
    #[allow(clippy::too_many_arguments)]
    pub fn compare(
        name: impl Into<String>,
        category: CheckCategory,
        reference: impl Into<String>,
        formula: impl Into<String>,
        expected: Decimal,
        actual: Decimal,
        tol: &Tolerance,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            reference: reference.into(),
            formula: formula.into(),
            expected,
            actual,
            variance: variance(actual, expected),
            variance_pct: variance_pct(actual, expected),
            passed: within_tolerance(actual, expected, tol),
            severity,
        }
    }

    /// Pass/fail condition; recorded as expected 1, actual 1 or 0.
    pub fn condition(
        name: impl Into<String>,
        category: CheckCategory,
        reference: impl Into<String>,
        formula: impl Into<String>,
        holds: bool,
        severity: Severity,
    ) -> Self {
        let actual = if holds { Decimal::ONE } else { Decimal::ZERO };
        Self {
            name: name.into(),
            category,
            reference: reference.into(),
            formula: formula.into(),
            expected: Decimal::ONE,
            actual,
            variance: actual - Decimal::ONE,
            variance_pct: actual - Decimal::ONE,
            passed: holds,
            severity,
        }
    }

    /// Value must fall inside `[low, high]`.
    #[allow(clippy::too_many_arguments)]
    pub fn range(
        name: impl Into<String>,
        category: CheckCategory,
        reference: impl Into<String>,
        formula: impl Into<String>,
        actual: Decimal,
        low: Decimal,
        high: Decimal,
        severity: Severity,
    ) -> Self {
        let expected = actual.max(low).min(high);
        Self {
            name: name.into(),
            category,
            reference: reference.into(),
            formula: formula.into(),
            expected,
            actual,
            variance: variance(actual, expected),
            variance_pct: variance_pct(actual, expected),
            passed: actual >= low && actual <= high,
            severity,
        }
    }

    pub fn is_finding(&self) -> bool {
        !self.passed
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Counts of checks, and of findings per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeveritySummary {
    pub total_checks: usize,
    pub passed: usize,
    pub failed: usize,
    pub critical: usize,
    pub material: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeveritySummary {
    pub fn from_checks(checks: &[CheckResult]) -> Self {
        let mut summary = Self::default();
        for check in checks {
            summary.record(check);
        }
        summary
    }

    pub fn record(&mut self, check: &CheckResult) {
        self.total_checks += 1;
        if check.passed {
            self.passed += 1;
            return;
        }
        self.failed += 1;
        match check.severity {
            Severity::Critical => self.critical += 1,
            Severity::Material => self.material += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn merge(&mut self, other: &SeveritySummary) {
        self.total_checks += other.total_checks;
        self.passed += other.passed;
        self.failed += other.failed;
        self.critical += other.critical;
        self.material += other.material;
        self.warning += other.warning;
        self.info += other.info;
    }

    /// Highest severity among findings, if any.
    pub fn worst(&self) -> Option<Severity> {
        [
            (Severity::Critical, self.critical),
            (Severity::Material, self.material),
            (Severity::Warning, self.warning),
            (Severity::Info, self.info),
        ]
        .into_iter()
        .find(|(_, n)| *n > 0)
        .map(|(s, _)| s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditOpinion {
    Unqualified,
    Qualified,
    Adverse,
}

impl AuditOpinion {
    /// The only way an opinion is formed: any critical finding is adverse,
    /// any material finding qualifies, anything less is clean.
    pub fn from_summary(summary: &SeveritySummary) -> Self {
        match summary.worst() {
            Some(Severity::Critical) => AuditOpinion::Adverse,
            Some(Severity::Material) => AuditOpinion::Qualified,
            Some(Severity::Warning) | Some(Severity::Info) | None => AuditOpinion::Unqualified,
        }
    }
}

impl fmt::Display for AuditOpinion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuditOpinion::Unqualified => "UNQUALIFIED",
            AuditOpinion::Qualified => "QUALIFIED",
            AuditOpinion::Adverse => "ADVERSE",
        };
        f.write_str(s)
    }
}

/// Checks for one entity (a property, the company, or the consolidation).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityReport {
    pub entity: String,
    pub checks: Vec<CheckResult>,
    pub summary: SeveritySummary,
    pub opinion: AuditOpinion,
}

impl EntityReport {
    pub fn new(entity: impl Into<String>, checks: Vec<CheckResult>) -> Self {
        let summary = SeveritySummary::from_checks(&checks);
        Self {
            entity: entity.into(),
            opinion: AuditOpinion::from_summary(&summary),
            summary,
            checks,
        }
    }

    pub fn findings(&self) -> impl Iterator<Item = &CheckResult> {
        self.checks.iter().filter(|c| c.is_finding())
    }
}

/// Sum a money field across a slice.
pub(crate) fn total<T>(items: &[T], field: impl Fn(&T) -> Money) -> Money {
    items.iter().map(field).sum()
}
