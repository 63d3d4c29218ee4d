//! Two-sample tests of numerical phenotype scores
//!
//! Both tests drop `NaN` and infinite values first. If one of the samples does not have
//! enough values left, the test is not computable and reports a p-value of `1.0`.
use statrs::distribution::{ContinuousCDF, Normal, StudentsT};
use tracing::debug;

use crate::stats::{f64_from_usize, ScoreStatistic, StatisticResult};
use crate::{GpcError, GpcResult};

/// Both samples must be smaller than this to use the exact U distribution
const MAX_EXACT_SAMPLE_SIZE: usize = 8;

fn finite_values(values: &[f64]) -> Vec<f64> {
    values.iter().copied().filter(|v| v.is_finite()).collect()
}

/// The two-sided Mann-Whitney U test
///
/// The statistic is `U` of the first sample. Small samples without ties use
/// the exact distribution of `U`, all others the normal approximation with
/// tie and continuity correction.
///
/// # Examples
///
/// ```
/// use phenocorr::stats::{MannWhitneyU, ScoreStatistic};
///
/// let result = MannWhitneyU.compute_pval(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]).unwrap();
/// assert_eq!(result.statistic(), Some(0.0));
/// assert!((result.pval() - 0.1).abs() < 1e-12);
///
/// let same = MannWhitneyU.compute_pval(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(same.pval(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MannWhitneyU;

impl ScoreStatistic for MannWhitneyU {
    fn name(&self) -> &str {
        "Mann-Whitney U test"
    }

    fn compute_pval(&self, a: &[f64], b: &[f64]) -> GpcResult<StatisticResult> {
        let a = finite_values(a);
        let b = finite_values(b);
        if a.is_empty() || b.is_empty() {
            debug!("Mann-Whitney U test without values in one sample");
            return Ok(StatisticResult::not_computable());
        }
        let (n1, n2) = (a.len(), b.len());
        let (ranks, tie_term) = rank(&a, &b);
        let rank_sum: f64 = ranks[..n1].iter().sum();
        let n1f = f64_from_usize(n1);
        let n2f = f64_from_usize(n2);
        let u1 = rank_sum - n1f * (n1f + 1.0) / 2.0;
        let u2 = n1f * n2f - u1;

        if tie_term == 0.0 && n1 < MAX_EXACT_SAMPLE_SIZE && n2 < MAX_EXACT_SAMPLE_SIZE {
            let pval = exact_pval(n1, n2, u1.min(u2));
            return Ok(StatisticResult::new(Some(u1), pval));
        }

        let n = n1f + n2f;
        let mean = n1f * n2f / 2.0;
        let sigma = (n1f * n2f / 12.0 * ((n + 1.0) - tie_term / (n * (n - 1.0)))).sqrt();
        if !(sigma > 0.0) {
            debug!("Mann-Whitney U test with all values tied");
            return Ok(StatisticResult::new(Some(u1), 1.0));
        }
        let z = (u1.max(u2) - mean - 0.5) / sigma;
        let normal =
            Normal::new(0.0, 1.0).map_err(|err| GpcError::InvalidInput(err.to_string()))?;
        Ok(StatisticResult::new(Some(u1), (2.0 * normal.sf(z)).min(1.0)))
    }
}

/// Ranks the values of both samples together, averaging the ranks of ties
///
/// Returns the ranks, first sample first, and the tie correction term `sum(t^3 - t)`
fn rank(a: &[f64], b: &[f64]) -> (Vec<f64>, f64) {
    let values: Vec<f64> = a.iter().chain(b).copied().collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|x, y| values[*x].total_cmp(&values[*y]));

    let mut ranks = vec![0.0; values.len()];
    let mut tie_term = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start;
        while end + 1 < order.len() && values[order[end + 1]] == values[order[start]] {
            end += 1;
        }
        let average = f64_from_usize(start + end) / 2.0 + 1.0;
        for idx in &order[start..=end] {
            ranks[*idx] = average;
        }
        let ties = f64_from_usize(end - start + 1);
        tie_term += ties * ties * ties - ties;
        start = end + 1;
    }
    (ranks, tie_term)
}

/// Two-sided p-value of `U` from the exact distribution
///
/// `u_min` is the smaller of the two `U` values
fn exact_pval(n1: usize, n2: usize, u_min: f64) -> f64 {
    let max_u = n1 * n2;
    // counts[i][j][u]: number of arrangements of i and j values with statistic u
    let mut counts = vec![vec![vec![0f64; max_u + 1]; n2 + 1]; n1 + 1];
    for i in 0..=n1 {
        for j in 0..=n2 {
            if i == 0 || j == 0 {
                counts[i][j][0] = 1.0;
                continue;
            }
            for u in 0..=i * j {
                let with_a_last = if u >= j { counts[i - 1][j][u - j] } else { 0.0 };
                counts[i][j][u] = with_a_last + counts[i][j - 1][u];
            }
        }
    }
    let distribution = &counts[n1][n2];
    let total: f64 = distribution.iter().sum();
    let lower: f64 = distribution
        .iter()
        .enumerate()
        .filter(|(u, _)| f64_from_usize(*u) <= u_min)
        .map(|(_, count)| count)
        .sum();
    (2.0 * lower / total).min(1.0)
}

/// Welch's two-sided t-test for samples with unequal variances
///
/// ```
/// use phenocorr::stats::{ScoreStatistic, TTest};
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [6.0, 7.0, 8.0, 9.0, 10.0];
/// let result = TTest.compute_pval(&a, &b).unwrap();
/// assert!((result.statistic().unwrap() + 5.0).abs() < 1e-12);
/// assert!((result.pval() - 0.001_052_825_793).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TTest;

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = f64_from_usize(values.len());
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance)
}

impl ScoreStatistic for TTest {
    fn name(&self) -> &str {
        "t-test"
    }

    fn compute_pval(&self, a: &[f64], b: &[f64]) -> GpcResult<StatisticResult> {
        let a = finite_values(a);
        let b = finite_values(b);
        if a.len() < 2 || b.len() < 2 {
            debug!("t-test with less than two values in one sample");
            return Ok(StatisticResult::not_computable());
        }
        let (mean_a, var_a) = mean_and_variance(&a);
        let (mean_b, var_b) = mean_and_variance(&b);
        let se_a = var_a / f64_from_usize(a.len());
        let se_b = var_b / f64_from_usize(b.len());
        let se = (se_a + se_b).sqrt();
        if !(se > 0.0) {
            debug!("t-test of samples without variance");
            return Ok(StatisticResult::not_computable());
        }
        let t = (mean_a - mean_b) / se;
        let dof = (se_a + se_b).powi(2)
            / (se_a.powi(2) / f64_from_usize(a.len() - 1)
                + se_b.powi(2) / f64_from_usize(b.len() - 1));
        let dist = StudentsT::new(0.0, 1.0, dof)
            .map_err(|err| GpcError::InvalidInput(err.to_string()))?;
        Ok(StatisticResult::new(Some(t), (2.0 * dist.sf(t.abs())).min(1.0)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mwu_exact() {
        let result = MannWhitneyU
            .compute_pval(&[1.0, 3.0, 5.0, 7.0], &[2.0, 4.0, 6.0, 8.0, 9.0])
            .unwrap();
        assert_eq!(result.statistic(), Some(6.0));
        assert!((result.pval() - 0.412_698_412_698).abs() < 1e-9);
    }

    #[test]
    fn mwu_with_ties() {
        let result = MannWhitneyU
            .compute_pval(&[1.0, 2.0, 2.0, 3.0, 4.0], &[3.0, 4.0, 5.0, 6.0, 7.0])
            .unwrap();
        assert_eq!(result.statistic(), Some(2.0));
        assert!((result.pval() - 0.035_014_981_019_66).abs() < 1e-8);
    }

    #[test]
    fn mwu_large_samples() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];
        let b = [5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0];
        let result = MannWhitneyU.compute_pval(&a, &b).unwrap();
        assert_eq!(result.statistic(), Some(12.5));
        assert!((result.pval() - 0.008_830_751_328).abs() < 1e-8);
    }

    #[test]
    fn mwu_drops_nan() {
        let result = MannWhitneyU
            .compute_pval(&[f64::NAN, f64::NAN], &[1.0, 2.0])
            .unwrap();
        assert!((result.pval() - 1.0).abs() < f64::EPSILON);
        assert!(result.statistic().is_none());

        let with_nan = MannWhitneyU
            .compute_pval(&[1.0, f64::NAN, 2.0, 3.0], &[4.0, 5.0, 6.0, f64::NAN])
            .unwrap();
        assert!((with_nan.pval() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn infinite_values_are_dropped() {
        let result = MannWhitneyU
            .compute_pval(
                &[1.0, 2.0, f64::INFINITY, 3.0],
                &[f64::NEG_INFINITY, 4.0, 5.0, 6.0],
            )
            .unwrap();
        assert_eq!(result.statistic(), Some(0.0));
        assert!((result.pval() - 0.1).abs() < 1e-12);

        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let expected = TTest.compute_pval(&a, &b).unwrap();
        let result = TTest
            .compute_pval(
                &[1.0, 2.0, f64::INFINITY, 3.0, 4.0, 5.0],
                &[2.0, 4.0, 6.0, 8.0, 10.0, 12.0, f64::NEG_INFINITY],
            )
            .unwrap();
        assert!(result.pval().is_finite());
        assert!((result.pval() - expected.pval()).abs() < 1e-12);
        assert!((result.statistic().unwrap() - expected.statistic().unwrap()).abs() < 1e-12);

        let only_infinite = TTest
            .compute_pval(&[f64::INFINITY, f64::NEG_INFINITY], &[1.0, 2.0, 3.0])
            .unwrap();
        assert!((only_infinite.pval() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn mwu_identical_samples() {
        let result = MannWhitneyU
            .compute_pval(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0])
            .unwrap();
        assert!((result.pval() - 1.0).abs() < f64::EPSILON);

        let constant = MannWhitneyU.compute_pval(&[2.0, 2.0], &[2.0, 2.0]).unwrap();
        assert!((constant.pval() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ttest_unequal_variances() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let b = [2.0, 4.0, 6.0, 8.0, 10.0, 12.0];
        let result = TTest.compute_pval(&a, &b).unwrap();
        assert!((result.statistic().unwrap() + 2.376_354_103_144).abs() < 1e-9);
        assert!((result.pval() - 0.049_284_338_206_73).abs() < 1e-8);
    }

    #[test]
    fn ttest_identical_samples() {
        let result = TTest.compute_pval(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap();
        assert!((result.pval() - 1.0).abs() < 1e-9);
        assert!(result.statistic().unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn ttest_too_few_values() {
        let result = TTest.compute_pval(&[1.0, f64::NAN], &[1.0, 2.0, 3.0]).unwrap();
        assert!((result.pval() - 1.0).abs() < f64::EPSILON);
        let no_variance = TTest.compute_pval(&[1.0, 1.0], &[1.0, 1.0]).unwrap();
        assert!((no_variance.pval() - 1.0).abs() < f64::EPSILON);
    }
}
