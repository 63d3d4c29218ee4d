//! Genotype-phenotype correlation analyses
//!
//! An analysis splits a [`Cohort`] into genotype groups with a genotype
//! [`Classifier`] and compares the phenotypes of the groups:
//!
//! - [`HpoTermAnalysis`]: presence of many HPO terms, with an MTC filter that
//!   skips terms that are not worth testing
//! - [`MultiPhenotypeAnalysis`]: any set of [`PhenotypeClassifier`]s, all of them tested
//! - [`PhenotypeScoreAnalysis`]: a numerical phenotype score of two genotype groups
//! - [`SurvivalAnalysis`]: the time until an event, e.g. death or disease onset
//!
//! The p-values of the multi-phenotype analyses are corrected for multiple
//! testing, see [`MtcCorrection`](crate::stats::MtcCorrection).
//!
//! Candidate terms can be derived from the cohort with [`prepare_hpo_terms_of_interest`]
//! and [`prepare_classifiers_for_terms_of_interest`]. [`configure_hpo_term_analysis`]
//! builds an analysis from an [`AnalysisConfig`].
use tracing::debug;

use crate::classifier::{Classifier, PhenotypeClassifier};
use crate::model::{Cohort, Patient};
use crate::stats::ContingencyTable;
use crate::{GpcError, GpcResult};

mod config;
mod mono;
mod mtc_filter;
mod multi;
mod result;
mod terms;

pub use config::{configure_hpo_term_analysis, configure_phenotype_score_analysis, AnalysisConfig};
pub use mono::{
    MonoPhenotypeAnalysisResult, PatientRecord, PhenotypeScoreAnalysis, SurvivalAnalysis,
};
pub use mtc_filter::{
    HpoMtcFilter, HpoMtcRule, MtcFilterResult, PhenotypeMtcFilter, SpecifiedTermsFilter,
    UseAllTermsFilter,
};
pub use multi::{HpoTermAnalysis, MultiPhenotypeAnalysis};
pub use result::{AnalysisResult, PValueKind};
pub use terms::{prepare_classifiers_for_terms_of_interest, prepare_hpo_terms_of_interest};

/// Rejects genotype classifiers with less than `min_categories` categories
fn check_genotype_classifier<G: Classifier + ?Sized>(
    classifier: &G,
    min_categories: usize,
) -> GpcResult<()> {
    if classifier.n_categories() < min_categories {
        return Err(GpcError::InvalidInput(format!(
            "the genotype classifier {} must have at least {min_categories} categories, found {}",
            classifier.name(),
            classifier.n_categories()
        )));
    }
    Ok(())
}

/// Returns the genotype category id of every patient of the cohort, in cohort order
///
/// Computed once per analysis and shared by all phenotypes.
fn assign_genotypes<G: Classifier + ?Sized>(cohort: &Cohort, classifier: &G) -> Vec<Option<usize>> {
    let genotypes: Vec<Option<usize>> = cohort
        .all_patients()
        .iter()
        .map(|patient| classifier.test(patient).map(|category| category.id()))
        .collect();
    debug!(
        "{} of {} patients assigned to a genotype group by {}",
        genotypes.iter().filter(|g| g.is_some()).count(),
        genotypes.len(),
        classifier.name()
    );
    genotypes
}

/// Builds the contingency table of genotype groups (rows) and phenotype categories (columns)
///
/// Patients that are not assigned on both axes are left out.
fn build_table<P: PhenotypeClassifier + ?Sized>(
    patients: &[Patient],
    genotypes: &[Option<usize>],
    n_genotypes: usize,
    phenotype: &P,
) -> ContingencyTable {
    let mut table = ContingencyTable::new(n_genotypes, phenotype.n_categories());
    for (patient, genotype) in patients.iter().zip(genotypes) {
        let Some(genotype) = genotype else {
            continue;
        };
        if let Some(category) = phenotype.test(patient) {
            table.increment(*genotype, category.id());
        }
    }
    table
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::classifier::genotype::SexClassifier;
    use crate::classifier::phenotype::HpoClassifier;
    use crate::test_utils::{missense_vs_frameshift, toy_cohort, toy_ontology};

    #[test]
    fn genotype_assignment() {
        let genotypes = assign_genotypes(&toy_cohort(), &missense_vs_frameshift());
        assert_eq!(
            genotypes,
            vec![
                Some(0),
                Some(0),
                Some(0),
                Some(0),
                Some(0),
                Some(1),
                Some(1),
                Some(1),
                Some(1),
                None
            ]
        );
    }

    #[test]
    fn seizure_table() {
        let cohort = toy_cohort();
        let genotypes = assign_genotypes(&cohort, &missense_vs_frameshift());
        let seizure = HpoClassifier::new(&toy_ontology(), 1250u32.into(), false).unwrap();
        let table = build_table(cohort.all_patients(), &genotypes, 2, &seizure);
        assert_eq!(table, ContingencyTable::from_rows(&[[4, 1], [1, 3]]).unwrap());
    }

    #[test]
    fn sex_classifier_is_accepted() {
        assert!(check_genotype_classifier(&SexClassifier::default(), 2).is_ok());
        assert!(matches!(
            check_genotype_classifier(&SexClassifier::default(), 3),
            Err(GpcError::InvalidInput(_))
        ));
    }
}
