//! Time-to-event phenotypes for survival analyses
//!
//! An [`Endpoint`] computes the time from birth until an event, e.g. death
//! or the onset of a disease. Patients without the event are censored at the
//! age of their last encounter. Patients without the event and without a
//! known age are left out.
use core::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::classifier::phenotype::term_and_descendants;
use crate::model::{Age, Patient};
use crate::ontology::OntologyService;
use crate::term::HpoGroup;
use crate::{GpcError, GpcResult, HpoTermId};

/// The survival time of a patient, in days since birth
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Survival {
    value: f64,
    is_censored: bool,
}

impl Survival {
    /// The event happened at `value` days
    pub fn event(value: f64) -> Self {
        Self {
            value,
            is_censored: false,
        }
    }

    /// The patient was event-free until `value` days
    pub fn censored(value: f64) -> Self {
        Self {
            value,
            is_censored: true,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn is_censored(&self) -> bool {
        self.is_censored
    }
}

/// Computes the survival of a patient
pub trait Endpoint: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Returns the survival of the patient, or `None` if it cannot be determined
    fn compute_survival(&self, patient: &Patient) -> Option<Survival>;
}

impl<T: Endpoint + ?Sized> Endpoint for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn compute_survival(&self, patient: &Patient) -> Option<Survival> {
        (**self).compute_survival(patient)
    }
}

fn censored_at_last_encounter(patient: &Patient) -> Option<Survival> {
    patient.age().map(|age| Survival::censored(age.days()))
}

/// Time until death
#[derive(Debug, Clone, Copy, Default)]
pub struct DeathEndpoint;

impl Endpoint for DeathEndpoint {
    fn name(&self) -> &str {
        "Age of death"
    }

    fn compute_survival(&self, patient: &Patient) -> Option<Survival> {
        match patient.vital_status() {
            Some(status) if status.is_deceased() => status
                .age_of_death()
                .map(|age| Survival::event(age.days())),
            _ => censored_at_last_encounter(patient),
        }
    }
}

/// Time until the onset of a disease
#[derive(Debug, Clone)]
pub struct DiseaseOnsetEndpoint {
    disease_id: String,
    name: String,
}

impl DiseaseOnsetEndpoint {
    pub fn new(disease_id: &str) -> Self {
        Self {
            disease_id: disease_id.to_string(),
            name: format!("Onset of {disease_id}"),
        }
    }
}

impl Endpoint for DiseaseOnsetEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute_survival(&self, patient: &Patient) -> Option<Survival> {
        match patient
            .present_diseases()
            .find(|disease| disease.id() == self.disease_id)
        {
            Some(disease) => disease.onset().map(|age| Survival::event(age.days())),
            None => censored_at_last_encounter(patient),
        }
    }
}

/// Time until the onset of an HPO term or any of its descendants
///
/// If several matching terms were observed, the earliest onset is used.
/// Patients with an observed term but without any onset are left out.
#[derive(Debug, Clone)]
pub struct PhenotypeOnsetEndpoint {
    terms: HpoGroup,
    name: String,
}

impl PhenotypeOnsetEndpoint {
    /// # Errors
    ///
    /// [`GpcError::InvalidTerm`] if the term is not part of the ontology
    pub fn new<O: OntologyService + ?Sized>(ontology: &O, term_id: HpoTermId) -> GpcResult<Self> {
        let name = ontology
            .term_name(term_id)
            .ok_or_else(|| GpcError::InvalidTerm(term_id.to_string()))?;
        Ok(Self {
            name: format!("Onset of {name}"),
            terms: term_and_descendants(ontology, term_id),
        })
    }
}

impl Endpoint for PhenotypeOnsetEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn compute_survival(&self, patient: &Patient) -> Option<Survival> {
        let mut observed = false;
        let mut earliest: Option<&Age> = None;
        for phenotype in patient
            .present_phenotypes()
            .filter(|p| self.terms.contains(&p.term_id()))
        {
            observed = true;
            if let Some(onset) = phenotype.onset() {
                if earliest.map_or(true, |prev| onset.days() < prev.days()) {
                    earliest = Some(onset);
                }
            }
        }
        match (observed, earliest) {
            (_, Some(onset)) => Some(Survival::event(onset.days())),
            (true, None) => None,
            (false, None) => censored_at_last_encounter(patient),
        }
    }
}
