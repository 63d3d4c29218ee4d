//! Statistical tests and multiple testing correction
//!
//! The tests come in three flavours, depending on the phenotype:
//!
//! - [`CountStatistic`]: a [`ContingencyTable`] of genotype groups (rows)
//!   versus phenotype categories (columns), e.g. [`FisherExact`] or [`ChiSquare`]
//! - [`ScoreStatistic`]: numerical phenotype scores of two genotype groups,
//!   e.g. [`MannWhitneyU`] or [`TTest`]
//! - [`SurvivalStatistic`]: survival times of two or more genotype groups,
//!   e.g. [`LogRankTest`]
//!
//! All tests are pure functions of their input and can be shared between threads.
//!
//! P-values of many tests are corrected with an [`MtcCorrection`].
use core::fmt::Debug;
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::classifier::endpoint::Survival;
use crate::{GpcError, GpcResult};

mod chi2;
mod fisher;
mod mtc;
mod score;
mod survival;
mod table;

pub use chi2::ChiSquare;
pub use fisher::{fisher_exact, FisherExact, MAX_FACTORIAL};
pub use mtc::MtcCorrection;
pub use score::{MannWhitneyU, TTest};
pub use survival::LogRankTest;
pub use table::ContingencyTable;

/// The outcome of a statistical test
///
/// The p-value is always within `[0, 1]`. Not every test reports a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticResult {
    statistic: Option<f64>,
    pval: f64,
}

impl StatisticResult {
    /// Constructs a new result, clamping `pval` to `[0, 1]`
    pub fn new(statistic: Option<f64>, pval: f64) -> Self {
        Self {
            statistic: statistic.filter(|s| s.is_finite()),
            pval: pval.clamp(0.0, 1.0),
        }
    }

    /// The result of a test that could not be computed for lack of data
    pub fn not_computable() -> Self {
        Self::new(None, 1.0)
    }

    pub fn statistic(&self) -> Option<f64> {
        self.statistic
    }

    pub fn pval(&self) -> f64 {
        self.pval
    }
}

/// Computes a p-value from a contingency table
pub trait CountStatistic: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    ///
    /// - [`GpcError::DegenerateTable`] if the table has an empty row or column
    /// - [`GpcError::Overflow`] if the exact computation is not possible
    fn compute_pval(&self, table: &ContingencyTable) -> GpcResult<StatisticResult>;
}

/// Compares the phenotype scores of two groups
pub trait ScoreStatistic: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Compares `a` with `b`
    ///
    /// `NaN` values are ignored. If one of the groups has too few values,
    /// the p-value is `1.0`.
    ///
    /// # Errors
    ///
    /// Implementations may fail if the test distribution cannot be constructed
    fn compute_pval(&self, a: &[f64], b: &[f64]) -> GpcResult<StatisticResult>;
}

/// Compares the survival of two or more groups
pub trait SurvivalStatistic: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Compares the survival of all `groups`
    ///
    /// # Errors
    ///
    /// Implementations may fail if the test distribution cannot be constructed
    fn compute_pval(&self, groups: &[Vec<Survival>]) -> GpcResult<StatisticResult>;
}

/// The available [`CountStatistic`]s, used for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountStatisticKind {
    #[default]
    FisherExact,
    ChiSquare,
}

impl CountStatistic for CountStatisticKind {
    fn name(&self) -> &str {
        match self {
            CountStatisticKind::FisherExact => FisherExact.name(),
            CountStatisticKind::ChiSquare => ChiSquare.name(),
        }
    }

    fn compute_pval(&self, table: &ContingencyTable) -> GpcResult<StatisticResult> {
        match self {
            CountStatisticKind::FisherExact => FisherExact.compute_pval(table),
            CountStatisticKind::ChiSquare => ChiSquare.compute_pval(table),
        }
    }
}

impl FromStr for CountStatisticKind {
    type Err = GpcError;
    fn from_str(s: &str) -> GpcResult<Self> {
        match s.to_lowercase().as_str() {
            "fisher_exact" | "fisher" => Ok(CountStatisticKind::FisherExact),
            "chi_square" | "chi2" => Ok(CountStatisticKind::ChiSquare),
            _ => Err(GpcError::InvalidConfig(format!("unknown count statistic {s}"))),
        }
    }
}

/// The available [`ScoreStatistic`]s, used for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreStatisticKind {
    #[default]
    MannWhitneyU,
    TTest,
}

impl ScoreStatistic for ScoreStatisticKind {
    fn name(&self) -> &str {
        match self {
            ScoreStatisticKind::MannWhitneyU => MannWhitneyU.name(),
            ScoreStatisticKind::TTest => TTest.name(),
        }
    }

    fn compute_pval(&self, a: &[f64], b: &[f64]) -> GpcResult<StatisticResult> {
        match self {
            ScoreStatisticKind::MannWhitneyU => MannWhitneyU.compute_pval(a, b),
            ScoreStatisticKind::TTest => TTest.compute_pval(a, b),
        }
    }
}

impl FromStr for ScoreStatisticKind {
    type Err = GpcError;
    fn from_str(s: &str) -> GpcResult<Self> {
        match s.to_lowercase().as_str() {
            "mann_whitney_u" | "mwu" => Ok(ScoreStatisticKind::MannWhitneyU),
            "t_test" | "ttest" => Ok(ScoreStatisticKind::TTest),
            _ => Err(GpcError::InvalidConfig(format!("unknown score statistic {s}"))),
        }
    }
}

impl Display for CountStatisticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Display for ScoreStatisticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Converts counts to `f64`
///
/// Cohorts are far too small for this to lose precision.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn f64_from_usize(n: usize) -> f64 {
    n as f64
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn result_is_clamped() {
        let res = StatisticResult::new(Some(f64::INFINITY), 1.000_000_1);
        assert!(res.statistic().is_none());
        assert!((res.pval() - 1.0).abs() < f64::EPSILON);
        assert!(StatisticResult::new(None, -0.1).pval() >= 0.0);
    }

    #[test]
    fn parse_kinds() {
        assert_eq!(
            "fisher_exact".parse::<CountStatisticKind>().unwrap(),
            CountStatisticKind::FisherExact
        );
        assert_eq!(
            "T_TEST".parse::<ScoreStatisticKind>().unwrap(),
            ScoreStatisticKind::TTest
        );
        assert!("anova".parse::<ScoreStatisticKind>().is_err());
    }

    #[test]
    fn kind_dispatch() {
        let table = ContingencyTable::from_rows(&[[1, 9], [11, 3]]).unwrap();
        let fisher = CountStatisticKind::FisherExact.compute_pval(&table).unwrap();
        let direct = FisherExact.compute_pval(&table).unwrap();
        assert!((fisher.pval() - direct.pval()).abs() < f64::EPSILON);
        assert_eq!(CountStatisticKind::ChiSquare.to_string(), "Chi-square test");
    }
}
