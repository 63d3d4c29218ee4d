use statrs::distribution::{ChiSquared, ContinuousCDF};
use tracing::debug;

use crate::classifier::endpoint::Survival;
use crate::stats::{f64_from_usize, StatisticResult, SurvivalStatistic};
use crate::{GpcError, GpcResult};

/// Pivots below this are treated as zero
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// The log-rank test comparing the survival of two or more groups
///
/// Empty groups are ignored. With less than two groups left, or without
/// any event, the test is not computable and reports a p-value of `1.0`.
///
/// ```
/// use phenocorr::classifier::endpoint::Survival;
/// use phenocorr::stats::{LogRankTest, SurvivalStatistic};
///
/// let a = vec![
///     Survival::event(1.0),
///     Survival::event(2.0),
///     Survival::event(3.0),
///     Survival::event(4.0),
///     Survival::censored(5.0),
/// ];
/// let b = vec![
///     Survival::event(3.0),
///     Survival::event(6.0),
///     Survival::censored(7.0),
///     Survival::event(8.0),
///     Survival::event(9.0),
/// ];
/// let result = LogRankTest.compute_pval(&[a, b]).unwrap();
/// assert!((result.statistic().unwrap() - 3.470_056_052_709).abs() < 1e-9);
/// assert!((result.pval() - 0.062_489_193_134).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRankTest;

impl SurvivalStatistic for LogRankTest {
    fn name(&self) -> &str {
        "Log-rank test"
    }

    fn compute_pval(&self, groups: &[Vec<Survival>]) -> GpcResult<StatisticResult> {
        let groups: Vec<&Vec<Survival>> = groups.iter().filter(|g| !g.is_empty()).collect();
        if groups.len() < 2 {
            debug!("Log-rank test with less than two non-empty groups");
            return Ok(StatisticResult::not_computable());
        }

        let mut event_times: Vec<f64> = groups
            .iter()
            .flat_map(|g| g.iter())
            .filter(|s| !s.is_censored())
            .map(Survival::value)
            .collect();
        event_times.sort_by(f64::total_cmp);
        event_times.dedup();
        if event_times.is_empty() {
            debug!("Log-rank test without any event");
            return Ok(StatisticResult::not_computable());
        }

        let k = groups.len();
        let mut observed_minus_expected = vec![0.0; k];
        let mut covariance = vec![vec![0.0; k]; k];
        for time in event_times {
            let at_risk: Vec<f64> = groups
                .iter()
                .map(|g| f64_from_usize(g.iter().filter(|s| s.value() >= time).count()))
                .collect();
            let events: Vec<f64> = groups
                .iter()
                .map(|g| {
                    f64_from_usize(
                        g.iter()
                            .filter(|s| !s.is_censored() && s.value() == time)
                            .count(),
                    )
                })
                .collect();
            let n: f64 = at_risk.iter().sum();
            let d: f64 = events.iter().sum();

            for j in 0..k {
                observed_minus_expected[j] += events[j] - d * at_risk[j] / n;
            }
            if n > 1.0 {
                let factor = d * (n - d) / (n - 1.0);
                for j in 0..k {
                    for l in 0..k {
                        let delta = if j == l { 1.0 } else { 0.0 };
                        covariance[j][l] += factor * at_risk[j] / n * (delta - at_risk[l] / n);
                    }
                }
            }
        }

        // the full covariance matrix is singular, the last group is redundant
        let dof = k - 1;
        let matrix: Vec<Vec<f64>> = covariance
            .iter()
            .take(dof)
            .map(|row| row[..dof].to_vec())
            .collect();
        let rhs = &observed_minus_expected[..dof];
        let Some(solution) = solve(matrix, rhs.to_vec()) else {
            debug!("Log-rank test with singular covariance matrix");
            return Ok(StatisticResult::not_computable());
        };
        let statistic: f64 = rhs.iter().zip(&solution).map(|(a, b)| a * b).sum();

        let dist = ChiSquared::new(f64_from_usize(dof))
            .map_err(|err| GpcError::InvalidInput(err.to_string()))?;
        Ok(StatisticResult::new(Some(statistic), dist.sf(statistic)))
    }
}

/// Solves `matrix * x = rhs` by Gauss-Jordan elimination with partial pivoting
///
/// Returns `None` if the matrix is singular
fn solve(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    let n = rhs.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|a, b| matrix[*a][col].abs().total_cmp(&matrix[*b][col].abs()))?;
        if matrix[pivot][col].abs() < SINGULAR_TOLERANCE {
            return None;
        }
        matrix.swap(col, pivot);
        rhs.swap(col, pivot);

        let divisor = matrix[col][col];
        for value in &mut matrix[col] {
            *value /= divisor;
        }
        rhs[col] /= divisor;

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = matrix[row][col];
            if factor == 0.0 {
                continue;
            }
            for c in col..n {
                matrix[row][c] -= factor * matrix[col][c];
            }
            rhs[row] -= factor * rhs[col];
        }
    }
    Some(rhs)
}

#[cfg(test)]
mod test {
    use super::*;

    fn group(data: &[(f64, bool)]) -> Vec<Survival> {
        data.iter()
            .map(|(value, event)| {
                if *event {
                    Survival::event(*value)
                } else {
                    Survival::censored(*value)
                }
            })
            .collect()
    }

    fn first() -> Vec<Survival> {
        group(&[(1.0, true), (2.0, true), (3.0, true), (4.0, true), (5.0, false)])
    }

    fn second() -> Vec<Survival> {
        group(&[(3.0, true), (6.0, true), (7.0, false), (8.0, true), (9.0, true)])
    }

    #[test]
    fn three_groups() {
        let third = group(&[(2.0, true), (4.0, false), (10.0, true)]);
        let result = LogRankTest
            .compute_pval(&[first(), second(), third])
            .unwrap();
        assert!((result.statistic().unwrap() - 3.995_154_352_993_661).abs() < 1e-9);
        assert!((result.pval() - 0.135_663_574_276_679).abs() < 1e-9);
    }

    #[test]
    fn empty_groups_are_ignored() {
        let with_empty = LogRankTest
            .compute_pval(&[first(), Vec::new(), second()])
            .unwrap();
        let without = LogRankTest.compute_pval(&[first(), second()]).unwrap();
        assert!((with_empty.pval() - without.pval()).abs() < 1e-12);

        let single = LogRankTest.compute_pval(&[first(), Vec::new()]).unwrap();
        assert!((single.pval() - 1.0).abs() < f64::EPSILON);
        assert!(single.statistic().is_none());
    }

    #[test]
    fn without_events() {
        let a = group(&[(1.0, false), (2.0, false)]);
        let b = group(&[(3.0, false)]);
        let result = LogRankTest.compute_pval(&[a, b]).unwrap();
        assert!((result.pval() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_groups() {
        let result = LogRankTest.compute_pval(&[first(), first()]).unwrap();
        assert!(result.statistic().unwrap().abs() < 1e-12);
        assert!((result.pval() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn solve_linear_system() {
        let x = solve(vec![vec![2.0, 1.0], vec![1.0, 3.0]], vec![3.0, 5.0]).unwrap();
        assert!((x[0] - 0.8).abs() < 1e-12);
        assert!((x[1] - 1.4).abs() < 1e-12);
        assert!(solve(vec![vec![1.0, 2.0], vec![2.0, 4.0]], vec![1.0, 2.0]).is_none());
    }
}
