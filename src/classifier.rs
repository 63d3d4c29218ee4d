//! Assign patients to categories
//!
//! A [`Classifier`] has a fixed, ordered set of [`Category`]s and assigns
//! each patient to at most one of them. Patients that cannot be assigned
//! (e.g. no genotype call, phenotype status unknown) are `None` and are left
//! out of the comparison.
//!
//! Two kinds of classifiers take part in an analysis:
//!
//! - genotype classifiers, see [`genotype`], split the cohort into genotype groups
//! - phenotype classifiers, see [`phenotype`], describe the phenotype of a patient
//!
//! Numerical phenotypes are computed by a [`PhenotypeScorer`](scorer::PhenotypeScorer)
//! and time-to-event phenotypes by an [`Endpoint`](endpoint::Endpoint).
use core::fmt::Debug;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::model::Patient;
use crate::HpoTermId;

pub mod endpoint;
pub mod genotype;
pub mod phenotype;
pub mod scorer;

/// A single category of a classifier
///
/// Categories are identified by their `id`, which is also the
/// position within [`Classifier::categories`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    id: usize,
    name: String,
    description: Option<String>,
}

impl Category {
    /// Constructs a new category
    pub fn new(id: usize, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Builds the categories from their names, with ids in the given order
pub(crate) fn categories_from_names<S: AsRef<str>>(names: &[S]) -> Vec<Category> {
    names
        .iter()
        .enumerate()
        .map(|(id, name)| Category::new(id, name.as_ref()))
        .collect()
}

/// Assigns a patient to one of a fixed set of categories
///
/// Implementations must be deterministic and must not mutate any state
/// in [`Classifier::test`], so that a classifier can be shared between threads.
pub trait Classifier: Debug + Send + Sync {
    /// A short name of the classifier, e.g. `Seizure` or `Missense vs. rest`
    fn name(&self) -> &str;

    /// A longer description of what is classified
    fn description(&self) -> String {
        self.name().to_string()
    }

    /// All categories of the classifier, never empty
    ///
    /// The category at position `i` has the id `i`
    fn categories(&self) -> &[Category];

    /// Returns the category of the patient or `None` if the patient cannot be assigned
    fn test(&self, patient: &Patient) -> Option<&Category>;

    fn n_categories(&self) -> usize {
        self.categories().len()
    }
}

impl<T: Classifier + ?Sized> Classifier for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn description(&self) -> String {
        (**self).description()
    }

    fn categories(&self) -> &[Category] {
        (**self).categories()
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        (**self).test(patient)
    }
}

/// Identifies the phenotype tested by a [`PhenotypeClassifier`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhenotypeKey {
    /// Presence of an HPO term
    Term(HpoTermId),
    /// Presence of a diagnosis, e.g. `OMIM:148050`
    Disease(String),
    /// Any other phenotype, e.g. binned scores or a group of terms
    Custom(String),
}

impl PhenotypeKey {
    /// Returns the HPO term id, if the key is a term
    pub fn term_id(&self) -> Option<HpoTermId> {
        match self {
            PhenotypeKey::Term(id) => Some(*id),
            _ => None,
        }
    }
}

impl Display for PhenotypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhenotypeKey::Term(id) => write!(f, "{id}"),
            PhenotypeKey::Disease(id) | PhenotypeKey::Custom(id) => write!(f, "{id}"),
        }
    }
}

/// A classifier of the phenotype axis
///
/// For presence/absence classifiers, the category meaning "present"
/// is always the first one.
pub trait PhenotypeClassifier: Classifier {
    /// The phenotype that is classified
    fn key(&self) -> PhenotypeKey;
}

impl<T: PhenotypeClassifier + ?Sized> PhenotypeClassifier for Box<T> {
    fn key(&self) -> PhenotypeKey {
        (**self).key()
    }
}
