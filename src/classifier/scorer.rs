//! Numerical phenotypes
//!
//! A [`PhenotypeScorer`] computes a single number per patient, e.g. the
//! number of observed features of a syndrome or a lab value. Patients
//! without a score are `NaN` and are left out of the comparison.
use core::fmt::Debug;

use crate::classifier::phenotype::term_and_descendants;
use crate::model::Patient;
use crate::ontology::{check_no_conflicting_terms, OntologyService};
use crate::term::HpoGroup;
use crate::{GpcResult, HpoTermId};

/// Computes a numerical phenotype of a patient
pub trait PhenotypeScorer: Debug + Send + Sync {
    /// A short name of the score
    fn name(&self) -> &str;

    /// Returns the score of the patient, or `NaN` if it cannot be computed
    fn score(&self, patient: &Patient) -> f64;
}

impl<T: PhenotypeScorer + ?Sized> PhenotypeScorer for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn score(&self, patient: &Patient) -> f64 {
        (**self).score(patient)
    }
}

/// Counts how many of the query terms were observed in a patient
///
/// A query term counts as observed if the term itself or any of its
/// descendants is observed. Each query term counts at most once.
///
/// # Examples
///
/// ```
/// use phenocorr::Ontology;
/// use phenocorr::classifier::scorer::{CountingPhenotypeScorer, PhenotypeScorer};
/// use phenocorr::model::{Patient, Phenotype, Sex};
///
/// let mut ontology = Ontology::default();
/// ontology.insert_term("Seizure".into(), 1250u32);
/// ontology.insert_term("Focal-onset seizure".into(), 7359u32);
/// ontology.insert_term("Ataxia".into(), 1251u32);
/// ontology.add_parent(1250u32, 7359u32).unwrap();
/// ontology.create_cache();
///
/// let scorer = CountingPhenotypeScorer::new(&ontology, &[1250u32.into(), 1251u32.into()]).unwrap();
///
/// let patient = Patient::new("A", Sex::Female).with_phenotypes(vec![
///     Phenotype::observed(1250u32),
///     Phenotype::observed(7359u32),
/// ]);
/// assert_eq!(scorer.score(&patient), 1.0);
///
/// // Seizure and its descendant cannot be counted separately
/// assert!(CountingPhenotypeScorer::new(&ontology, &[1250u32.into(), 7359u32.into()]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct CountingPhenotypeScorer {
    query: Vec<HpoGroup>,
    name: String,
}

impl CountingPhenotypeScorer {
    /// Constructs a new scorer for the `query` terms
    ///
    /// # Errors
    ///
    /// - [`GpcError::InvalidTerm`](crate::GpcError::InvalidTerm) if any term is not part of the ontology
    /// - [`GpcError::ConflictingQuery`](crate::GpcError::ConflictingQuery) if one term is an ancestor of another
    pub fn new<O: OntologyService + ?Sized>(ontology: &O, query: &[HpoTermId]) -> GpcResult<Self> {
        check_no_conflicting_terms(ontology, query)?;
        Ok(Self {
            query: query
                .iter()
                .map(|term| term_and_descendants(ontology, *term))
                .collect(),
            name: format!("Count of {} phenotypes", query.len()),
        })
    }
}

impl PhenotypeScorer for CountingPhenotypeScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, patient: &Patient) -> f64 {
        let count = self
            .query
            .iter()
            .filter(|group| {
                patient
                    .present_phenotypes()
                    .any(|p| group.contains(&p.term_id()))
            })
            .count();
        f64::from(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

/// Uses the value of a measurement as score, e.g. a lab value
#[derive(Debug, Clone)]
pub struct MeasurementPhenotypeScorer {
    test_id: String,
    name: String,
}

impl MeasurementPhenotypeScorer {
    pub fn new(test_id: &str, name: &str) -> Self {
        Self {
            test_id: test_id.to_string(),
            name: name.to_string(),
        }
    }
}

impl PhenotypeScorer for MeasurementPhenotypeScorer {
    fn name(&self) -> &str {
        &self.name
    }

    fn score(&self, patient: &Patient) -> f64 {
        patient
            .measurement(&self.test_id)
            .map_or(f64::NAN, |m| m.value())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{toy_cohort, toy_ontology, LOINC_HEIGHT};

    #[test]
    fn counting() {
        let ontology = toy_ontology();
        let scorer = CountingPhenotypeScorer::new(
            &ontology,
            &[1250u32.into(), 252u32.into(), 1251u32.into()],
        )
        .unwrap();
        let scores: Vec<f64> = toy_cohort()
            .all_patients()
            .iter()
            .map(|p| scorer.score(p))
            .collect();
        let expected = [2.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 1.0, 0.0];
        for (score, exp) in scores.iter().zip(expected) {
            assert!((score - exp).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn measurement() {
        let scorer = MeasurementPhenotypeScorer::new(LOINC_HEIGHT, "Body height");
        let cohort = toy_cohort();
        let patients = cohort.all_patients();
        assert!((scorer.score(&patients[0]) - 120.0).abs() < f64::EPSILON);
        assert!(scorer.score(&patients[8]).is_nan());
    }
}
