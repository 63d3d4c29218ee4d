//! Fisher's exact test for `2 x 2` and `r x c` contingency tables
//!
//! `2 x 2` tables use the hypergeometric distribution directly. Larger tables
//! enumerate every table with the same margins, which is only possible as long
//! as all factorials are representable by an `f64` and the number of such
//! tables stays small.
use statrs::function::factorial::ln_factorial;
use tracing::debug;

use crate::stats::{ContingencyTable, CountStatistic, StatisticResult};
use crate::{GpcError, GpcResult};

/// The maximum factorial representable
/// by a 64-bit floating point without
/// overflowing
pub const MAX_FACTORIAL: usize = 170;

/// Maximum number of partial tables visited by the `r x c` enumeration
///
/// The count of tables with fixed margins grows polynomially with the number
/// of observations, with a degree of `(r - 1) * (c - 1)`.
pub const MAX_ENUMERATION_STEPS: usize = 10_000_000;

/// Relative tolerance when comparing the probabilities of tables
const REL_TOLERANCE: f64 = 1e-7;

/// Fisher's exact test, two-sided
///
/// The statistic is the sample odds ratio for `2 x 2` tables and not reported otherwise.
///
/// # Examples
///
/// ```
/// use phenocorr::stats::{ContingencyTable, CountStatistic, FisherExact};
///
/// let table = ContingencyTable::from_rows(&[[2, 3], [1, 0], [0, 2]]).unwrap();
/// let result = FisherExact.compute_pval(&table).unwrap();
/// assert!((result.pval() - 0.642_857).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FisherExact;

impl CountStatistic for FisherExact {
    fn name(&self) -> &str {
        "Fisher Exact Test"
    }

    fn compute_pval(&self, table: &ContingencyTable) -> GpcResult<StatisticResult> {
        let pval = fisher_exact(table)?;
        let statistic = match table.dim() {
            (2, 2) => odds_ratio(table),
            _ => None,
        };
        Ok(StatisticResult::new(statistic, pval))
    }
}

fn odds_ratio(table: &ContingencyTable) -> Option<f64> {
    let cell = |r, c| table.get(r, c).map(f64::from);
    let (a, b, c, d) = (cell(0, 0)?, cell(0, 1)?, cell(1, 0)?, cell(1, 1)?);
    Some((a * d) / (b * c))
}

/// Returns the two-sided p-value of Fisher's exact test
///
/// # Errors
///
/// - [`GpcError::DegenerateTable`] if the table has an empty row or column
/// - [`GpcError::Overflow`] if a table larger than `2 x 2` has more than
///   [`MAX_FACTORIAL`] observations or needs more than
///   [`MAX_ENUMERATION_STEPS`] steps
pub fn fisher_exact(table: &ContingencyTable) -> GpcResult<f64> {
    table.check_not_degenerate()?;
    let pval = if table.dim() == (2, 2) {
        fisher_2x2(table)
    } else {
        fisher_rxc(table)?
    };
    Ok(pval.clamp(0.0, 1.0))
}

fn ln_choose(n: u32, k: u32) -> f64 {
    ln_factorial(u64::from(n)) - ln_factorial(u64::from(k)) - ln_factorial(u64::from(n - k))
}

fn fisher_2x2(table: &ContingencyTable) -> f64 {
    let row_sums = table.row_sums();
    let col_sums = table.col_sums();
    let total = table.total();
    let (r1, c1) = (row_sums[0], col_sums[0]);
    let observed = table.get(0, 0).unwrap_or_default();

    let ln_denominator = ln_choose(total, r1);
    let ln_p = |x: u32| ln_choose(c1, x) + ln_choose(total - c1, r1 - x) - ln_denominator;

    let threshold = ln_p(observed) + REL_TOLERANCE;
    let lower = (r1 + c1).saturating_sub(total);
    let upper = r1.min(c1);
    (lower..=upper)
        .map(ln_p)
        .filter(|ln| *ln <= threshold)
        .map(f64::exp)
        .sum()
}

fn fisher_rxc(table: &ContingencyTable) -> GpcResult<f64> {
    let total = table.total();
    if usize::try_from(total).map_or(true, |n| n > MAX_FACTORIAL) {
        return Err(GpcError::Overflow(format!(
            "exact test of a {}x{} table with {total} observations",
            table.dim().0,
            table.dim().1
        )));
    }
    let row_sums = table.row_sums();
    let col_sums = table.col_sums();
    let ln_f = |n: &u32| ln_factorial(u64::from(*n));

    let ln_const = row_sums.iter().map(ln_f).sum::<f64>() + col_sums.iter().map(ln_f).sum::<f64>()
        - ln_factorial(u64::from(total));
    let ln_p_observed = ln_const - table.rows().flatten().map(ln_f).sum::<f64>();

    let mut enumeration = Enumeration {
        col_sums: &col_sums,
        ln_const,
        threshold: ln_p_observed + REL_TOLERANCE,
        pval: 0.0,
        n_tables: 0,
        n_steps: 0,
    };
    let mut capacities = row_sums.clone();
    if let Err(err) = enumeration.visit(0, 0, col_sums[0], &mut capacities, 0.0) {
        debug!(
            "Aborted {}x{} Fisher exact test after {} tables",
            table.dim().0,
            table.dim().1,
            enumeration.n_tables
        );
        return Err(err);
    }
    debug!(
        "Enumerated {} tables for {}x{} Fisher exact test",
        enumeration.n_tables,
        table.dim().0,
        table.dim().1
    );
    Ok(enumeration.pval)
}

/// Walks all tables with the given row and column sums
///
/// Columns are filled from left to right, each column from top to bottom.
/// `capacities` holds the row sums that are not yet used up, so the
/// last column is fully determined.
struct Enumeration<'a> {
    col_sums: &'a [u32],
    ln_const: f64,
    threshold: f64,
    pval: f64,
    n_tables: usize,
    n_steps: usize,
}

impl Enumeration<'_> {
    fn visit(
        &mut self,
        col: usize,
        row: usize,
        left: u32,
        capacities: &mut [u32],
        ln_cells: f64,
    ) -> GpcResult<()> {
        self.n_steps += 1;
        if self.n_steps > MAX_ENUMERATION_STEPS {
            return Err(GpcError::Overflow(format!(
                "exact test of a {}x{} table needs more than {MAX_ENUMERATION_STEPS} steps",
                capacities.len(),
                self.col_sums.len()
            )));
        }
        if col + 1 == self.col_sums.len() {
            let ln_last: f64 = capacities.iter().map(|c| ln_factorial(u64::from(*c))).sum();
            let ln_p = self.ln_const - ln_cells - ln_last;
            self.n_tables += 1;
            if ln_p <= self.threshold {
                self.pval += ln_p.exp();
            }
            return Ok(());
        }
        if row + 1 == capacities.len() {
            // the last row takes the rest of the column
            capacities[row] -= left;
            let next = ln_cells + ln_factorial(u64::from(left));
            let res = self.visit(col + 1, 0, self.col_sums[col + 1], capacities, next);
            capacities[row] += left;
            return res;
        }
        let rest: u32 = capacities[row + 1..].iter().sum();
        let lower = left.saturating_sub(rest);
        let upper = left.min(capacities[row]);
        for value in lower..=upper {
            capacities[row] -= value;
            let res = self.visit(
                col,
                row + 1,
                left - value,
                capacities,
                ln_cells + ln_factorial(u64::from(value)),
            );
            capacities[row] += value;
            res?;
        }
        Ok(())
    }
}
