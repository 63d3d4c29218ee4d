use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::stats::{f64_from_usize, ContingencyTable, CountStatistic, StatisticResult};
use crate::{GpcError, GpcResult};

/// Pearson's chi-square test of independence
///
/// Tables with one degree of freedom use Yates' continuity correction.
///
/// The test relies on the asymptotic chi-square distribution and is not
/// appropriate if any expected count is below 5. It does not fall back
/// to [`FisherExact`](crate::stats::FisherExact) in that case.
///
/// ```
/// use phenocorr::stats::{ChiSquare, ContingencyTable, CountStatistic};
///
/// let table = ContingencyTable::from_rows(&[[10, 20], [20, 10]]).unwrap();
/// let result = ChiSquare.compute_pval(&table).unwrap();
/// assert!((result.statistic().unwrap() - 5.4).abs() < 1e-9);
/// assert!((result.pval() - 0.020_136_751_550).abs() < 1e-8);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ChiSquare;

impl CountStatistic for ChiSquare {
    fn name(&self) -> &str {
        "Chi-square test"
    }

    fn compute_pval(&self, table: &ContingencyTable) -> GpcResult<StatisticResult> {
        table.check_not_degenerate()?;
        let (rows, cols) = table.dim();
        let dof = (rows - 1) * (cols - 1);
        if dof == 0 {
            return Ok(StatisticResult::not_computable());
        }
        let total = f64::from(table.total());
        let row_sums = table.row_sums();
        let col_sums = table.col_sums();

        let mut statistic = 0.0;
        for (row, row_sum) in table.rows().zip(&row_sums) {
            for (observed, col_sum) in row.iter().zip(&col_sums) {
                let expected = f64::from(*row_sum) * f64::from(*col_sum) / total;
                let mut diff = (f64::from(*observed) - expected).abs();
                if dof == 1 {
                    diff = (diff - 0.5).max(0.0);
                }
                statistic += diff * diff / expected;
            }
        }

        let dist = ChiSquared::new(f64_from_usize(dof))
            .map_err(|err| GpcError::InvalidInput(err.to_string()))?;
        Ok(StatisticResult::new(Some(statistic), dist.sf(statistic)))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn three_by_two() {
        let table = ContingencyTable::from_rows(&[[10, 5], [5, 10], [8, 8]]).unwrap();
        let result = ChiSquare.compute_pval(&table).unwrap();
        assert!((result.statistic().unwrap() - 3.333_333_333).abs() < 1e-8);
        assert!((result.pval() - 0.188_875_602_837_56).abs() < 1e-8);
    }

    #[test]
    fn degenerate() {
        let table = ContingencyTable::from_rows(&[[0, 5], [0, 10]]).unwrap();
        assert!(matches!(
            ChiSquare.compute_pval(&table),
            Err(GpcError::DegenerateTable(_))
        ));
    }

    #[test]
    fn single_column() {
        let table = ContingencyTable::from_rows(&[[3], [4]]).unwrap();
        let result = ChiSquare.compute_pval(&table).unwrap();
        assert!((result.pval() - 1.0).abs() < f64::EPSILON);
    }
}
