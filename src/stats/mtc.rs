//! Multiple testing correction
//!
//! When many phenotypes are tested at once, the nominal p-values must be adjusted
//! to control the family-wise error rate (FWER) or the false discovery rate (FDR).
use std::fmt::Display;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::stats::f64_from_usize;
use crate::{GpcError, GpcResult};

/// Multiple testing correction method
///
/// The correction is applied once, over all p-values of an analysis.
/// Correcting subsets independently gives wrong results.
///
/// ```
/// use phenocorr::stats::MtcCorrection;
///
/// let corrected = MtcCorrection::FdrBh.correct(&[0.01, 0.04, 0.03, 0.005]).unwrap();
/// assert!((corrected[0] - 0.02).abs() < 1e-10);
/// assert!((corrected[1] - 0.04).abs() < 1e-10);
///
/// let method: MtcCorrection = "bonferroni".parse().unwrap();
/// assert_eq!(method.correct(&[0.2, 0.3]).unwrap(), vec![0.4, 0.6]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MtcCorrection {
    /// Bonferroni, controls the FWER
    Bonferroni,
    /// Holm's step-down method, controls the FWER
    Holm,
    /// Šidák, controls the FWER for independent tests
    Sidak,
    /// Benjamini-Hochberg, controls the FDR
    #[default]
    FdrBh,
    /// Benjamini-Yekutieli, controls the FDR under arbitrary dependence
    FdrBy,
    /// No correction, the p-values are returned unchanged
    None,
}

impl MtcCorrection {
    /// Returns the adjusted p-values in the same order as `pvals`
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidInput`] if a p-value is outside of `[0, 1]`
    pub fn correct(&self, pvals: &[f64]) -> GpcResult<Vec<f64>> {
        validate_pvals(pvals)?;
        if pvals.is_empty() {
            return Ok(Vec::new());
        }
        let n = f64_from_usize(pvals.len());
        let adjusted = match self {
            MtcCorrection::Bonferroni => pvals.iter().map(|p| (p * n).min(1.0)).collect(),
            MtcCorrection::Holm => holm(pvals),
            MtcCorrection::Sidak => pvals
                .iter()
                .map(|p| (1.0 - (1.0 - p).powf(n)).min(1.0))
                .collect(),
            MtcCorrection::FdrBh => step_up(pvals, 1.0),
            MtcCorrection::FdrBy => {
                let harmonic: f64 = (1..=pvals.len()).map(|i| 1.0 / f64_from_usize(i)).sum();
                step_up(pvals, harmonic)
            }
            MtcCorrection::None => pvals.to_vec(),
        };
        Ok(adjusted)
    }

    pub fn name(&self) -> &str {
        match self {
            MtcCorrection::Bonferroni => "bonferroni",
            MtcCorrection::Holm => "holm",
            MtcCorrection::Sidak => "sidak",
            MtcCorrection::FdrBh => "fdr_bh",
            MtcCorrection::FdrBy => "fdr_by",
            MtcCorrection::None => "none",
        }
    }
}

fn ascending_order(pvals: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..pvals.len()).collect();
    order.sort_by(|a, b| pvals[*a].total_cmp(&pvals[*b]));
    order
}

fn holm(pvals: &[f64]) -> Vec<f64> {
    let n = pvals.len();
    let mut adjusted = vec![0.0; n];
    let mut prev: f64 = 0.0;
    for (rank, idx) in ascending_order(pvals).into_iter().enumerate() {
        let adj = (pvals[idx] * f64_from_usize(n - rank)).min(1.0).max(prev);
        adjusted[idx] = adj;
        prev = adj;
    }
    adjusted
}

/// Benjamini-Hochberg style step-up, with the p-values scaled by `factor`
fn step_up(pvals: &[f64], factor: f64) -> Vec<f64> {
    let n = pvals.len();
    let n_f = f64_from_usize(n);
    let order = ascending_order(pvals);
    let mut adjusted = vec![0.0; n];
    let mut prev = f64::INFINITY;
    for (rank, idx) in order.into_iter().enumerate().rev() {
        let adj = (pvals[idx] * factor * n_f / f64_from_usize(rank + 1))
            .min(1.0)
            .min(prev);
        adjusted[idx] = adj;
        prev = adj;
    }
    adjusted
}

fn validate_pvals(pvals: &[f64]) -> GpcResult<()> {
    match pvals.iter().position(|p| !(0.0..=1.0).contains(p)) {
        Some(idx) => Err(GpcError::InvalidInput(format!(
            "p-value at index {idx} is out of range [0, 1]: {}",
            pvals[idx]
        ))),
        None => Ok(()),
    }
}

impl FromStr for MtcCorrection {
    type Err = GpcError;
    fn from_str(s: &str) -> GpcResult<Self> {
        match s.to_lowercase().as_str() {
            "bonferroni" => Ok(MtcCorrection::Bonferroni),
            "holm" => Ok(MtcCorrection::Holm),
            "sidak" => Ok(MtcCorrection::Sidak),
            "fdr_bh" => Ok(MtcCorrection::FdrBh),
            "fdr_by" => Ok(MtcCorrection::FdrBy),
            "none" => Ok(MtcCorrection::None),
            _ => Err(GpcError::InvalidConfig(format!(
                "unknown multiple testing correction {s}"
            ))),
        }
    }
}

impl Display for MtcCorrection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const TOL: f64 = 1e-10;
    const PVALS: [f64; 4] = [0.01, 0.04, 0.03, 0.005];

    fn assert_all_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < TOL, "{a} != {e}");
        }
    }

    #[test]
    fn bonferroni() {
        let adj = MtcCorrection::Bonferroni.correct(&PVALS).unwrap();
        assert_all_close(&adj, &[0.04, 0.16, 0.12, 0.02]);
        let clamped = MtcCorrection::Bonferroni.correct(&[0.5, 0.8]).unwrap();
        assert_all_close(&clamped, &[1.0, 1.0]);
    }

    #[test]
    fn holm() {
        let adj = MtcCorrection::Holm.correct(&PVALS).unwrap();
        assert_all_close(&adj, &[0.03, 0.06, 0.06, 0.02]);
    }

    #[test]
    fn sidak() {
        let adj = MtcCorrection::Sidak.correct(&[0.01, 0.5]).unwrap();
        assert_all_close(&adj, &[0.0199, 0.75]);
    }

    #[test]
    fn benjamini_hochberg() {
        let adj = MtcCorrection::FdrBh.correct(&PVALS).unwrap();
        assert_all_close(&adj, &[0.02, 0.04, 0.04, 0.02]);
    }

    #[test]
    fn benjamini_yekutieli() {
        let harmonic = 1.0 + 1.0 / 2.0 + 1.0 / 3.0 + 1.0 / 4.0;
        let adj = MtcCorrection::FdrBy.correct(&PVALS).unwrap();
        assert_all_close(
            &adj,
            &[0.02 * harmonic, 0.04 * harmonic, 0.04 * harmonic, 0.02 * harmonic],
        );
    }

    #[test]
    fn never_below_nominal() {
        let pvals = [0.1, 0.001, 0.05, 0.01, 0.5, 0.5, 0.97];
        for method in [
            MtcCorrection::Bonferroni,
            MtcCorrection::Holm,
            MtcCorrection::Sidak,
            MtcCorrection::FdrBh,
            MtcCorrection::FdrBy,
            MtcCorrection::None,
        ] {
            let adj = method.correct(&pvals).unwrap();
            let mut pairs: Vec<(f64, f64)> = pvals.iter().copied().zip(adj).collect();
            for (raw, corrected) in &pairs {
                assert!(*corrected >= raw - TOL, "{method}: {corrected} < {raw}");
                assert!(*corrected <= 1.0);
            }
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
            for w in pairs.windows(2) {
                assert!(w[1].1 >= w[0].1 - TOL, "{method} is not monotonic");
            }
        }
    }

    #[test]
    fn empty_and_invalid() {
        assert!(MtcCorrection::Holm.correct(&[]).unwrap().is_empty());
        assert!(matches!(
            MtcCorrection::FdrBh.correct(&[0.1, 1.2]),
            Err(GpcError::InvalidInput(_))
        ));
        assert!(MtcCorrection::Bonferroni.correct(&[f64::NAN]).is_err());
    }

    #[test]
    fn parse_and_display() {
        for name in ["bonferroni", "holm", "sidak", "fdr_bh", "fdr_by", "none"] {
            let method: MtcCorrection = name.parse().unwrap();
            assert_eq!(method.to_string(), name);
        }
        assert!(matches!(
            "fdr".parse::<MtcCorrection>(),
            Err(GpcError::InvalidConfig(_))
        ));
        assert_eq!(
            serde_json::to_string(&MtcCorrection::FdrBy).unwrap(),
            "\"fdr_by\""
        );
    }
}
