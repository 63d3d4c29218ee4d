//! Classifiers of the phenotype axis
use tracing::debug;

use crate::classifier::scorer::PhenotypeScorer;
use crate::classifier::{
    categories_from_names, Category, Classifier, PhenotypeClassifier, PhenotypeKey,
};
use crate::model::Patient;
use crate::ontology::{check_no_conflicting_terms, OntologyService};
use crate::term::HpoGroup;
use crate::{GpcError, GpcResult, HpoTermId};

/// Returns the term together with all its descendants
pub(crate) fn term_and_descendants<O: OntologyService + ?Sized>(
    ontology: &O,
    term: HpoTermId,
) -> HpoGroup {
    let mut group = ontology.descendant_ids(term);
    group.insert(term);
    group
}

/// Tests for the presence of an HPO term
///
/// - `Yes`: the term or any of its descendants was observed
/// - `No`: the term or any of its ancestors was excluded
///
/// Patients with neither observation are not assigned, unless
/// `missing_implies_excluded` is set. They are then assigned to `No`.
///
/// An observed term takes precedence over an excluded one.
///
/// # Examples
///
/// ```
/// use phenocorr::{HpoTermId, Ontology};
/// use phenocorr::classifier::Classifier;
/// use phenocorr::classifier::phenotype::HpoClassifier;
/// use phenocorr::model::{Patient, Phenotype, Sex};
///
/// let mut ontology = Ontology::default();
/// ontology.insert_term("Seizure".into(), 1250u32);
/// ontology.insert_term("Focal-onset seizure".into(), 7359u32);
/// ontology.add_parent(1250u32, 7359u32).unwrap();
/// ontology.create_cache();
///
/// let clf = HpoClassifier::new(&ontology, 1250u32.into(), false).unwrap();
///
/// let focal = Patient::new("A", Sex::Female).with_phenotypes(vec![Phenotype::observed(7359u32)]);
/// assert_eq!(clf.test(&focal).unwrap().name(), "Yes");
///
/// let no_seizure = Patient::new("B", Sex::Male).with_phenotypes(vec![Phenotype::excluded(1250u32)]);
/// assert_eq!(clf.test(&no_seizure).unwrap().name(), "No");
///
/// let unknown = Patient::new("C", Sex::Male);
/// assert!(clf.test(&unknown).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct HpoClassifier {
    term_id: HpoTermId,
    name: String,
    present_terms: HpoGroup,
    excluding_terms: HpoGroup,
    missing_implies_excluded: bool,
    categories: Vec<Category>,
}

impl HpoClassifier {
    /// Constructs a new classifier for `term_id`
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidTerm`] if the term is not part of the ontology
    pub fn new<O: OntologyService + ?Sized>(
        ontology: &O,
        term_id: HpoTermId,
        missing_implies_excluded: bool,
    ) -> GpcResult<Self> {
        let name = ontology
            .term_name(term_id)
            .ok_or_else(|| GpcError::InvalidTerm(term_id.to_string()))?
            .to_string();
        let mut excluding_terms = ontology.ancestor_ids(term_id);
        excluding_terms.insert(term_id);
        let categories = vec![
            Category::new(0, "Yes")
                .with_description(&format!("The patient was found to be annotated with {name}")),
            Category::new(1, "No").with_description(&format!(
                "The patient was found not to be annotated with {name}"
            )),
        ];
        Ok(Self {
            term_id,
            present_terms: term_and_descendants(ontology, term_id),
            excluding_terms,
            name,
            missing_implies_excluded,
            categories,
        })
    }

    pub fn term_id(&self) -> HpoTermId {
        self.term_id
    }

    /// The `Yes` category
    pub fn present(&self) -> &Category {
        &self.categories[0]
    }

    /// The `No` category
    pub fn excluded(&self) -> &Category {
        &self.categories[1]
    }
}

impl Classifier for HpoClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("Test for presence of {} ({})", self.name, self.term_id)
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        if patient
            .present_phenotypes()
            .any(|p| self.present_terms.contains(&p.term_id()))
        {
            return self.categories.first();
        }
        if self.missing_implies_excluded
            || patient
                .excluded_phenotypes()
                .any(|p| self.excluding_terms.contains(&p.term_id()))
        {
            return self.categories.get(1);
        }
        None
    }
}

impl PhenotypeClassifier for HpoClassifier {
    fn key(&self) -> PhenotypeKey {
        PhenotypeKey::Term(self.term_id)
    }
}

/// Assigns patients to one of several HPO terms
///
/// A patient is assigned to the term that it was observed with (directly or
/// through a descendant). Patients with none or more than one of the terms
/// are not assigned.
#[derive(Debug, Clone)]
pub struct TermGroupClassifier {
    terms: Vec<HpoGroup>,
    name: String,
    key: String,
    categories: Vec<Category>,
}

impl TermGroupClassifier {
    /// Constructs a new classifier with one category per term
    ///
    /// # Errors
    ///
    /// - [`GpcError::InvalidInput`] if less than two terms are given
    /// - [`GpcError::InvalidTerm`] if any term is not part of the ontology
    /// - [`GpcError::ConflictingQuery`] if one term is an ancestor of another
    pub fn new<O: OntologyService + ?Sized>(ontology: &O, terms: &[HpoTermId]) -> GpcResult<Self> {
        if terms.len() < 2 {
            return Err(GpcError::InvalidInput(
                "a term group requires at least two terms".to_string(),
            ));
        }
        check_no_conflicting_terms(ontology, terms)?;
        let names: Vec<&str> = terms
            .iter()
            .map(|term| ontology.term_name(*term).unwrap_or_default())
            .collect();
        let keys: Vec<String> = terms.iter().map(HpoTermId::to_string).collect();
        Ok(Self {
            terms: terms
                .iter()
                .map(|term| term_and_descendants(ontology, *term))
                .collect(),
            name: names.join(" vs. "),
            key: keys.join("|"),
            categories: categories_from_names(&names),
        })
    }
}

impl Classifier for TermGroupClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        let mut found = None;
        for (idx, group) in self.terms.iter().enumerate() {
            if patient
                .present_phenotypes()
                .any(|p| group.contains(&p.term_id()))
            {
                if found.is_some() {
                    return None;
                }
                found = Some(idx);
            }
        }
        found.and_then(|idx| self.categories.get(idx))
    }
}

impl PhenotypeClassifier for TermGroupClassifier {
    fn key(&self) -> PhenotypeKey {
        PhenotypeKey::Custom(self.key.clone())
    }
}

/// Tests if a patient was diagnosed with a disease
///
/// Patients without a confirmed diagnosis are assigned to `No`.
#[derive(Debug, Clone)]
pub struct DiseasePresenceClassifier {
    disease_id: String,
    name: String,
    categories: Vec<Category>,
}

impl DiseasePresenceClassifier {
    pub fn new(disease_id: &str, name: &str) -> Self {
        Self {
            disease_id: disease_id.to_string(),
            name: name.to_string(),
            categories: categories_from_names(&["Yes", "No"]),
        }
    }
}

impl Classifier for DiseasePresenceClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        if patient
            .present_diseases()
            .any(|disease| disease.id() == self.disease_id)
        {
            self.categories.first()
        } else {
            self.categories.get(1)
        }
    }
}

impl PhenotypeClassifier for DiseasePresenceClassifier {
    fn key(&self) -> PhenotypeKey {
        PhenotypeKey::Disease(self.disease_id.clone())
    }
}

/// Assigns patients to ordinal bins of a phenotype score
///
/// `n` bin edges define `n + 1` bins. Each bin includes its lower edge.
/// Patients without a score (`NaN`) are not assigned.
///
/// ```
/// use phenocorr::classifier::Classifier;
/// use phenocorr::classifier::phenotype::BinnedScoreClassifier;
/// use phenocorr::classifier::scorer::MeasurementPhenotypeScorer;
/// use phenocorr::model::{Measurement, Patient, Sex};
///
/// let scorer = MeasurementPhenotypeScorer::new("LOINC:8302-2", "Body height");
/// let clf = BinnedScoreClassifier::new(scorer, &[100.0, 120.0]).unwrap();
/// let names: Vec<&str> = clf.categories().iter().map(|c| c.name()).collect();
/// assert_eq!(names, vec!["< 100", "[100, 120)", ">= 120"]);
///
/// let patient = Patient::new("A", Sex::Female)
///     .with_measurements(vec![Measurement::new("LOINC:8302-2", "Body height", 120.0, "cm")]);
/// assert_eq!(clf.test(&patient).unwrap().name(), ">= 120");
/// ```
#[derive(Debug)]
pub struct BinnedScoreClassifier {
    scorer: Box<dyn PhenotypeScorer>,
    edges: Vec<f64>,
    categories: Vec<Category>,
}

impl BinnedScoreClassifier {
    /// Constructs a new classifier
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidInput`] if `edges` is empty, contains non-finite
    /// values or is not strictly increasing
    pub fn new<S: PhenotypeScorer + 'static>(scorer: S, edges: &[f64]) -> GpcResult<Self> {
        if edges.is_empty() || edges.iter().any(|e| !e.is_finite()) {
            return Err(GpcError::InvalidInput(
                "bin edges must be finite and not empty".to_string(),
            ));
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GpcError::InvalidInput(
                "bin edges must be strictly increasing".to_string(),
            ));
        }
        let mut names = Vec::with_capacity(edges.len() + 1);
        names.push(format!("< {}", edges[0]));
        for w in edges.windows(2) {
            names.push(format!("[{}, {})", w[0], w[1]));
        }
        names.push(format!(">= {}", edges[edges.len() - 1]));
        Ok(Self {
            scorer: Box::new(scorer),
            edges: edges.to_vec(),
            categories: categories_from_names(&names),
        })
    }
}

impl Classifier for BinnedScoreClassifier {
    fn name(&self) -> &str {
        self.scorer.name()
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        let score = self.scorer.score(patient);
        if score.is_nan() {
            debug!("No score for {}", patient.label());
            return None;
        }
        let idx = self.edges.iter().take_while(|edge| score >= **edge).count();
        self.categories.get(idx)
    }
}

impl PhenotypeClassifier for BinnedScoreClassifier {
    fn key(&self) -> PhenotypeKey {
        PhenotypeKey::Custom(self.scorer.name().to_string())
    }
}
