use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::model::{Patient, Variant};
use crate::ontology::OntologyService;
use crate::term::HpoGroup;
use crate::{GpcError, GpcResult, HpoTermId};

/// An ordered, read-only collection of [`Patient`]s
///
/// A cohort is the input of every analysis. It can be persisted
/// as JSON, see [`Cohort::to_json`] and [`Cohort::from_json`].
///
/// # Examples
///
/// ```
/// use phenocorr::model::{Cohort, Patient, Sex};
///
/// let cohort = Cohort::new(vec![
///     Patient::new("A", Sex::Female),
///     Patient::new("B", Sex::Male),
/// ]);
///
/// let json = cohort.to_json().unwrap();
/// let decoded = Cohort::from_json(&json).unwrap();
/// assert_eq!(cohort, decoded);
/// assert_eq!(decoded.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cohort {
    members: Vec<Patient>,
    #[serde(default)]
    excluded_patient_count: usize,
}

impl Cohort {
    /// Constructs a new cohort
    pub fn new(members: Vec<Patient>) -> Self {
        Self {
            members,
            excluded_patient_count: 0,
        }
    }

    /// Records how many patients were dropped during ingestion, e.g. for missing data
    #[must_use]
    pub fn with_excluded_patient_count(mut self, count: usize) -> Self {
        self.excluded_patient_count = count;
        self
    }

    /// Returns all patients, in input order
    pub fn all_patients(&self) -> &[Patient] {
        &self.members
    }

    /// Returns the number of patients in the cohort
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the cohort does not contain any patients
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn excluded_patient_count(&self) -> usize {
        self.excluded_patient_count
    }

    /// Iterates all variants of all patients
    ///
    /// Variants shared between patients are returned once per patient
    pub fn all_variants(&self) -> impl Iterator<Item = &Variant> {
        self.members.iter().flat_map(|patient| patient.variants())
    }

    /// Returns the variant with the given key
    ///
    /// # Errors
    ///
    /// [`GpcError::DoesNotExist`] if no patient carries a variant with this key
    pub fn get_variant_by_key(&self, key: &str) -> GpcResult<&Variant> {
        self.all_variants()
            .find(|variant| variant.variant_key() == key)
            .ok_or_else(|| GpcError::DoesNotExist(format!("variant {key}")))
    }

    /// Returns the ids of all transcripts that any variant is annotated with
    pub fn all_transcript_ids(&self) -> BTreeSet<String> {
        self.all_variants()
            .flat_map(|variant| variant.annotations())
            .map(|ann| ann.transcript_id().to_string())
            .collect()
    }

    /// Returns the number of patients carrying at least one variant in each transcript
    ///
    /// # Errors
    ///
    /// [`GpcError::DoesNotExist`] if `transcript_id` is not annotated for any variant
    pub fn patients_with_transcript(&self, transcript_id: &str) -> GpcResult<usize> {
        if !self.all_transcript_ids().contains(transcript_id) {
            return Err(GpcError::DoesNotExist(format!("transcript {transcript_id}")));
        }
        Ok(self
            .members
            .iter()
            .filter(|patient| {
                patient
                    .variants()
                    .iter()
                    .any(|variant| variant.annotation(transcript_id).is_some())
            })
            .count())
    }

    /// Returns the ids of all diseases diagnosed in the cohort
    pub fn all_disease_ids(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .flat_map(|patient| patient.present_diseases())
            .map(|disease| disease.id().to_string())
            .collect()
    }

    /// Counts in how many patients each HPO term is observed
    ///
    /// When an `ontology` is given, observations are propagated to all
    /// ancestors of the observed terms. Each patient is counted only once
    /// per term, regardless of how many descendants were observed.
    ///
    /// # Examples
    ///
    /// ```
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
    /// let direct = cohort.present_phenotype_counts(None);
    /// assert_eq!(direct[&HpoTermId::from(1250u32)], 1);
    ///
    /// let propagated = cohort.present_phenotype_counts(Some(&ontology));
    /// assert_eq!(propagated[&HpoTermId::from(1250u32)], 2);
    /// assert_eq!(propagated[&HpoTermId::from(7359u32)], 1);
    /// ```
    pub fn present_phenotype_counts(
        &self,
        ontology: Option<&dyn OntologyService>,
    ) -> BTreeMap<HpoTermId, usize> {
        let mut counts: BTreeMap<HpoTermId, usize> = BTreeMap::new();
        for patient in &self.members {
            let mut terms: HashSet<HpoTermId> = HashSet::new();
            for phenotype in patient.present_phenotypes() {
                terms.insert(phenotype.term_id());
                if let Some(ontology) = ontology {
                    terms.extend(ontology.ancestor_ids(phenotype.term_id()).iter());
                }
            }
            for term in terms {
                *counts.entry(term).or_default() += 1;
            }
        }
        counts
    }

    /// Returns all HPO terms that are observed or excluded in at least one patient
    pub fn all_phenotype_ids(&self) -> HpoGroup {
        self.members
            .iter()
            .flat_map(|patient| patient.phenotypes())
            .map(|phenotype| phenotype.term_id())
            .collect()
    }

    /// Serializes the cohort to a JSON string
    ///
    /// # Errors
    ///
    /// [`GpcError::Serialization`] if serialization fails
    pub fn to_json(&self) -> GpcResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserializes a cohort from a JSON string
    ///
    /// # Errors
    ///
    /// [`GpcError::Serialization`] if the JSON is malformed or does not describe a cohort
    pub fn from_json(json: &str) -> GpcResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Writes the cohort as JSON
    ///
    /// # Errors
    ///
    /// [`GpcError::Serialization`] if writing or serialization fails
    pub fn to_writer<W: Write>(&self, writer: W) -> GpcResult<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    /// Reads a cohort from JSON
    ///
    /// # Errors
    ///
    /// [`GpcError::Serialization`] if reading or deserialization fails
    pub fn from_reader<R: Read>(reader: R) -> GpcResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

impl<'a> IntoIterator for &'a Cohort {
    type Item = &'a Patient;
    type IntoIter = std::slice::Iter<'a, Patient>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::{toy_cohort, toy_ontology};

    #[test]
    fn json_round_trip() {
        let cohort = toy_cohort().with_excluded_patient_count(3);
        let json = cohort.to_json().unwrap();
        let decoded = Cohort::from_json(&json).unwrap();
        assert_eq!(cohort, decoded);
        assert_eq!(decoded.excluded_patient_count(), 3);

        let mut buffer = Vec::new();
        cohort.to_writer(&mut buffer).unwrap();
        let decoded = Cohort::from_reader(&buffer[..]).unwrap();
        assert_eq!(cohort, decoded);
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(
            Cohort::from_json("{\"members\": 12}"),
            Err(GpcError::Serialization(_))
        ));
    }

    #[test]
    fn variant_lookup() {
        let cohort = toy_cohort();
        let variant = cohort.get_variant_by_key("16_1000_1000_C_T").unwrap();
        assert_eq!(variant.variant_key(), "16_1000_1000_C_T");
        assert!(matches!(
            cohort.get_variant_by_key("1_1_1_A_C"),
            Err(GpcError::DoesNotExist(_))
        ));
    }

    #[test]
    fn transcripts() {
        let cohort = toy_cohort();
        let transcripts = cohort.all_transcript_ids();
        assert!(transcripts.contains(crate::test_utils::TX_ID));
        assert!(cohort.patients_with_transcript(crate::test_utils::TX_ID).unwrap() > 0);
        assert!(cohort.patients_with_transcript("NM_999999.1").is_err());
    }

    #[test]
    fn propagated_counts() {
        let cohort = toy_cohort();
        let ontology = toy_ontology();
        let direct = cohort.present_phenotype_counts(None);
        let propagated = cohort.present_phenotype_counts(Some(&ontology));
        for (term, count) in &direct {
            assert!(propagated[term] >= *count);
        }
        assert_eq!(
            propagated[&crate::ontology::PHENOTYPIC_ABNORMALITY],
            cohort
                .all_patients()
                .iter()
                .filter(|p| p.present_phenotypes().count() > 0)
                .count()
        );
    }
}
