use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::analysis::MtcFilterResult;
use crate::classifier::{Category, PhenotypeKey};
use crate::stats::{ContingencyTable, StatisticResult};

/// Selects nominal or corrected p-values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PValueKind {
    Nominal,
    #[default]
    Corrected,
}

/// The result of a multi-phenotype analysis
///
/// All per-phenotype sequences have one entry per candidate phenotype,
/// in the order in which the phenotypes were submitted. Phenotypes that
/// were removed by the MTC filter have no [`StatisticResult`] and a
/// `NaN` p-value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    phenotypes: Vec<PhenotypeKey>,
    n_usable: Vec<u32>,
    tables: Vec<ContingencyTable>,
    mtc_filter_results: Vec<MtcFilterResult>,
    statistic_results: Vec<Option<StatisticResult>>,
    #[serde(with = "nan_as_null")]
    corrected_pvals: Vec<f64>,
    genotype_categories: Vec<Category>,
    statistic_name: String,
    mtc_filter_name: String,
    mtc_name: String,
}

impl AnalysisResult {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        phenotypes: Vec<PhenotypeKey>,
        tables: Vec<ContingencyTable>,
        mtc_filter_results: Vec<MtcFilterResult>,
        statistic_results: Vec<Option<StatisticResult>>,
        corrected_pvals: Vec<f64>,
        genotype_categories: Vec<Category>,
        statistic_name: &str,
        mtc_filter_name: &str,
        mtc_name: &str,
    ) -> Self {
        Self {
            n_usable: tables.iter().map(ContingencyTable::total).collect(),
            phenotypes,
            tables,
            mtc_filter_results,
            statistic_results,
            corrected_pvals,
            genotype_categories,
            statistic_name: statistic_name.to_string(),
            mtc_filter_name: mtc_filter_name.to_string(),
            mtc_name: mtc_name.to_string(),
        }
    }

    /// The candidate phenotypes, in submission order
    pub fn phenotypes(&self) -> &[PhenotypeKey] {
        &self.phenotypes
    }

    /// The number of patients that are assigned on both axes, per phenotype
    pub fn n_usable(&self) -> &[u32] {
        &self.n_usable
    }

    pub fn tables(&self) -> &[ContingencyTable] {
        &self.tables
    }

    pub fn mtc_filter_results(&self) -> &[MtcFilterResult] {
        &self.mtc_filter_results
    }

    /// The test results, `None` if the phenotype was not tested
    pub fn statistic_results(&self) -> &[Option<StatisticResult>] {
        &self.statistic_results
    }

    /// The nominal p-values, `NaN` if the phenotype was not tested
    pub fn pvals(&self) -> Vec<f64> {
        self.statistic_results
            .iter()
            .map(|res| res.map_or(f64::NAN, |res| res.pval()))
            .collect()
    }

    /// The p-values after multiple testing correction, `NaN` if the phenotype was not tested
    pub fn corrected_pvals(&self) -> &[f64] {
        &self.corrected_pvals
    }

    pub fn genotype_categories(&self) -> &[Category] {
        &self.genotype_categories
    }

    pub fn statistic_name(&self) -> &str {
        &self.statistic_name
    }

    pub fn mtc_filter_name(&self) -> &str {
        &self.mtc_filter_name
    }

    /// The name of the multiple testing correction, e.g. `fdr_bh`
    pub fn mtc_name(&self) -> &str {
        &self.mtc_name
    }

    /// The number of candidate phenotypes
    pub fn len(&self) -> usize {
        self.phenotypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phenotypes.is_empty()
    }

    /// The number of phenotypes that were tested
    pub fn total_tests(&self) -> usize {
        self.statistic_results.iter().flatten().count()
    }

    /// Returns the indices of the phenotypes with a p-value of at most `alpha`
    ///
    /// The indices are sorted by ascending p-value. Untested phenotypes are never included.
    pub fn significant_phenotype_indices(&self, alpha: f64, kind: PValueKind) -> Vec<usize> {
        let pvals = match kind {
            PValueKind::Nominal => self.pvals(),
            PValueKind::Corrected => self.corrected_pvals.clone(),
        };
        significant_indices(&pvals, alpha)
    }

    pub fn n_significant(&self, alpha: f64, kind: PValueKind) -> usize {
        self.significant_phenotype_indices(alpha, kind).len()
    }

    /// Counts the phenotypes per filter reason
    ///
    /// Tested phenotypes are not counted.
    pub fn filter_reason_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for reason in self
            .mtc_filter_results
            .iter()
            .filter_map(MtcFilterResult::reason)
        {
            *counts.entry(reason.to_string()).or_default() += 1;
        }
        counts
    }
}

/// Untested phenotypes have a `NaN` p-value, which JSON cannot represent
mod nan_as_null {
    use super::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(values: &Vec<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        values
            .iter()
            .map(|v| (!v.is_nan()).then_some(*v))
            .collect::<Vec<Option<f64>>>()
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
        let values: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}

fn significant_indices(pvals: &[f64], alpha: f64) -> Vec<usize> {
    let mut indices: Vec<usize> = pvals
        .iter()
        .enumerate()
        .filter(|(_, p)| **p <= alpha)
        .map(|(idx, _)| idx)
        .collect();
    indices.sort_by(|a, b| pvals[*a].total_cmp(&pvals[*b]));
    indices
}
