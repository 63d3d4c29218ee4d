use serde::{Deserialize, Serialize};

use crate::analysis::mtc_filter::check_rule_order;
use crate::analysis::{HpoMtcFilter, HpoMtcRule, HpoTermAnalysis, PhenotypeScoreAnalysis};
use crate::ontology::OntologyService;
use crate::stats::{CountStatisticKind, MtcCorrection, ScoreStatisticKind};
use crate::{GpcError, GpcResult};

/// Options of an analysis
///
/// All fields are optional in JSON, missing fields use the defaults.
///
/// ```
/// use phenocorr::analysis::AnalysisConfig;
/// use phenocorr::stats::{CountStatisticKind, MtcCorrection};
///
/// let config = AnalysisConfig::from_json(r#"{"mtc_correction": "bonferroni", "mtc_alpha": 0.1}"#).unwrap();
/// assert_eq!(config.mtc_correction, MtcCorrection::Bonferroni);
/// assert!((config.mtc_alpha - 0.1).abs() < f64::EPSILON);
/// assert_eq!(config.count_statistic, CountStatisticKind::FisherExact);
///
/// assert!(AnalysisConfig::from_json(r#"{"mtc_alpha": 0.0}"#).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub mtc_correction: MtcCorrection,
    /// Significance level, within `(0, 1]`
    pub mtc_alpha: f64,
    /// Minimum fraction of patients with a term, within `(0, 1]`
    pub term_frequency_threshold: f64,
    pub count_statistic: CountStatisticKind,
    pub score_statistic: ScoreStatisticKind,
    /// Patients without any information about a term do not have the term
    pub missing_implies_excluded: bool,
    /// Minimum number of patients with a term to use it as candidate
    pub min_patients_with_term: usize,
    /// The rules of the [`HpoMtcFilter`], in the order they are checked
    pub mtc_rule_order: Vec<HpoMtcRule>,
    /// Runs the per-phenotype work on the rayon thread pool
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mtc_correction: MtcCorrection::FdrBh,
            mtc_alpha: 0.05,
            term_frequency_threshold: 0.2,
            count_statistic: CountStatisticKind::FisherExact,
            score_statistic: ScoreStatisticKind::MannWhitneyU,
            missing_implies_excluded: false,
            min_patients_with_term: 2,
            mtc_rule_order: HpoMtcRule::DEFAULT_ORDER.to_vec(),
            parallel: false,
        }
    }
}

fn in_unit_interval(value: f64) -> bool {
    value > 0.0 && value <= 1.0
}

impl AnalysisConfig {
    /// Parses and validates a JSON configuration
    ///
    /// # Errors
    ///
    /// - [`GpcError::Serialization`] if the JSON is malformed or has unknown fields
    /// - [`GpcError::InvalidConfig`] if a value is out of range
    pub fn from_json(json: &str) -> GpcResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that all values are within their ranges
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidConfig`] naming the first invalid value
    pub fn validate(&self) -> GpcResult<()> {
        if !in_unit_interval(self.mtc_alpha) {
            return Err(GpcError::InvalidConfig(format!(
                "mtc_alpha must be within (0, 1], found {}",
                self.mtc_alpha
            )));
        }
        if !in_unit_interval(self.term_frequency_threshold) {
            return Err(GpcError::InvalidConfig(format!(
                "term_frequency_threshold must be within (0, 1], found {}",
                self.term_frequency_threshold
            )));
        }
        if self.min_patients_with_term == 0 {
            return Err(GpcError::InvalidConfig(
                "min_patients_with_term must be at least 1".to_string(),
            ));
        }
        check_rule_order(&self.mtc_rule_order)
    }
}

/// Builds an [`HpoTermAnalysis`] with the [`HpoMtcFilter`]
///
/// # Errors
///
/// [`GpcError::InvalidConfig`] if the configuration is not valid
pub fn configure_hpo_term_analysis<'o>(
    config: &AnalysisConfig,
    ontology: &'o dyn OntologyService,
) -> GpcResult<HpoTermAnalysis<'o>> {
    config.validate()?;
    let filter = HpoMtcFilter::new(ontology, config.term_frequency_threshold)?
        .with_rules(&config.mtc_rule_order)?;
    Ok(
        HpoTermAnalysis::new(config.count_statistic, filter, config.mtc_correction)
            .with_parallel(config.parallel),
    )
}

/// Builds a [`PhenotypeScoreAnalysis`] with the configured score statistic
///
/// # Errors
///
/// [`GpcError::InvalidConfig`] if the configuration is not valid
pub fn configure_phenotype_score_analysis(
    config: &AnalysisConfig,
) -> GpcResult<PhenotypeScoreAnalysis> {
    config.validate()?;
    Ok(PhenotypeScoreAnalysis::new(config.score_statistic))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::analysis::{prepare_classifiers_for_terms_of_interest, MtcFilterResult};
    use crate::classifier::PhenotypeKey;
    use crate::test_utils::{missense_vs_frameshift, toy_cohort, toy_ontology};

    #[test]
    fn defaults() {
        let config = AnalysisConfig::from_json("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.mtc_correction, MtcCorrection::FdrBh);
        assert_eq!(config.mtc_rule_order.len(), 6);
        assert!(!config.parallel);
    }

    #[test]
    fn full_json() {
        let json = r#"{
            "mtc_correction": "holm",
            "mtc_alpha": 0.01,
            "term_frequency_threshold": 0.5,
            "count_statistic": "chi_square",
            "score_statistic": "t_test",
            "missing_implies_excluded": true,
            "min_patients_with_term": 3,
            "mtc_rule_order": ["frequency_threshold", "general_term"],
            "parallel": true
        }"#;
        let config = AnalysisConfig::from_json(json).unwrap();
        assert_eq!(config.mtc_correction, MtcCorrection::Holm);
        assert_eq!(config.count_statistic, CountStatisticKind::ChiSquare);
        assert_eq!(config.score_statistic, ScoreStatisticKind::TTest);
        assert_eq!(
            config.mtc_rule_order,
            vec![HpoMtcRule::FrequencyThreshold, HpoMtcRule::GeneralTerm]
        );
        assert_eq!(config.min_patients_with_term, 3);
        assert!(config.missing_implies_excluded);
    }

    #[test]
    fn invalid_values() {
        for json in [
            r#"{"mtc_alpha": 1.5}"#,
            r#"{"term_frequency_threshold": 0}"#,
            r#"{"min_patients_with_term": 0}"#,
            r#"{"mtc_rule_order": ["general_term", "general_term"]}"#,
        ] {
            assert!(
                matches!(AnalysisConfig::from_json(json), Err(GpcError::InvalidConfig(_))),
                "{json}"
            );
        }
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"mtc_correction": "fdr"}"#),
            Err(GpcError::Serialization(_))
        ));
        assert!(matches!(
            AnalysisConfig::from_json(r#"{"alpha": 0.05}"#),
            Err(GpcError::Serialization(_))
        ));
    }

    #[test]
    fn configured_analysis_of_toy_cohort() {
        let ontology = toy_ontology();
        let cohort = toy_cohort();
        let config = AnalysisConfig::default();
        let phenotypes =
            prepare_classifiers_for_terms_of_interest(&cohort, &ontology, &config).unwrap();
        let analysis = configure_hpo_term_analysis(&config, &ontology).unwrap();
        let result = analysis
            .compare_genotype_vs_phenotypes(&cohort, &missense_vs_frameshift(), &phenotypes)
            .unwrap();

        let tested: Vec<&PhenotypeKey> = result
            .phenotypes()
            .iter()
            .zip(result.mtc_filter_results())
            .filter(|(_, res)| res.is_passed())
            .map(|(key, _)| key)
            .collect();
        assert_eq!(
            tested,
            vec![
                &PhenotypeKey::Term(252u32.into()),
                &PhenotypeKey::Term(1250u32.into()),
                &PhenotypeKey::Term(7359u32.into()),
            ]
        );
        let reasons = result.filter_reason_counts();
        assert_eq!(reasons[HpoMtcRule::GeneralTerm.reason()], 4);
        assert_eq!(reasons[HpoMtcRule::EmptyGenotypeGroup.reason()], 1);
        assert_eq!(reasons[HpoMtcRule::IdenticalProportions.reason()], 1);
        assert!(result
            .mtc_filter_results()
            .iter()
            .any(MtcFilterResult::is_filtered_out));
    }
}
