use tracing::debug;

use crate::analysis::AnalysisConfig;
use crate::classifier::phenotype::HpoClassifier;
use crate::model::Cohort;
use crate::ontology::OntologyService;
use crate::{GpcResult, HpoTermId};

/// Returns the HPO terms that are present in at least `min_patients_with_term` patients
///
/// Observations are propagated to all ancestors, i.e. a patient with
/// `Focal-onset seizure` also counts as a patient with `Seizure`. Terms
/// that are unknown to the ontology are skipped. The terms are sorted by id.
///
/// # Examples
///
/// ```
/// use phenocorr::analysis::prepare_hpo_terms_of_interest;
/// use phenocorr::model::{Cohort, Patient, Phenotype, Sex};
/// use phenocorr::{HpoTermId, Ontology};
///
/// let mut ontology = Ontology::default();
/// ontology.insert_term("Seizure".into(), 1250u32);
/// ontology.insert_term("Focal-onset seizure".into(), 7359u32);
/// ontology.add_parent(1250u32, 7359u32).unwrap();
/// ontology.create_cache();
///
/// let cohort = Cohort::new(vec![
///     Patient::new("A", Sex::Female).with_phenotypes(vec![Phenotype::observed(7359u32)]),
///     Patient::new("B", Sex::Male).with_phenotypes(vec![Phenotype::observed(1250u32)]),
/// ]);
///
/// let terms = prepare_hpo_terms_of_interest(&cohort, &ontology, 2);
/// assert_eq!(terms, vec![HpoTermId::from(1250u32)]);
/// ```
pub fn prepare_hpo_terms_of_interest(
    cohort: &Cohort,
    ontology: &dyn OntologyService,
    min_patients_with_term: usize,
) -> Vec<HpoTermId> {
    let terms: Vec<HpoTermId> = cohort
        .present_phenotype_counts(Some(ontology))
        .into_iter()
        .filter(|(term, count)| *count >= min_patients_with_term && ontology.contains(*term))
        .map(|(term, _)| term)
        .collect();
    debug!(
        "{} HPO terms are present in at least {} patients",
        terms.len(),
        min_patients_with_term
    );
    terms
}

/// Builds one [`HpoClassifier`] for every term of interest of the cohort
///
/// # Errors
///
/// - [`GpcError::InvalidConfig`](crate::GpcError::InvalidConfig) if the configuration is not valid
/// - [`GpcError::InvalidTerm`](crate::GpcError::InvalidTerm) if a term cannot be found in the ontology
pub fn prepare_classifiers_for_terms_of_interest(
    cohort: &Cohort,
    ontology: &dyn OntologyService,
    config: &AnalysisConfig,
) -> GpcResult<Vec<HpoClassifier>> {
    config.validate()?;
    prepare_hpo_terms_of_interest(cohort, ontology, config.min_patients_with_term)
        .into_iter()
        .map(|term| HpoClassifier::new(ontology, term, config.missing_implies_excluded))
        .collect()
}
