//! Access to the structure of the Human Phenotype Ontology
//!
//! The analysis only needs a few things from the ontology: whether a term
//! exists, its name, and the ancestor/descendant relationships between terms.
//! These are described by the [`OntologyService`] trait, so that any
//! ontology implementation can back an analysis.
//!
//! [`Ontology`] is a small in-memory implementation of the trait. It is built
//! term by term and does not parse any file formats.
use core::fmt::Debug;
use std::ops::BitOr;

use tracing::debug;

use crate::term::HpoGroup;
use crate::{GpcError, GpcResult, HpoTermId};

mod termarena;
use termarena::{Arena, TermInternal};

/// `HP:0000001` - the root of the whole ontology
pub const ALL: HpoTermId = HpoTermId::new(1);

/// `HP:0000118` - the root of all phenotypic abnormalities
pub const PHENOTYPIC_ABNORMALITY: HpoTermId = HpoTermId::new(118);

/// A lightweight view of a single ontology term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term<'a> {
    id: HpoTermId,
    name: &'a str,
}

impl<'a> Term<'a> {
    /// Constructs a new `Term` view
    pub fn new(id: HpoTermId, name: &'a str) -> Self {
        Self { id, name }
    }

    /// Returns the [`HpoTermId`] of the term
    pub fn id(&self) -> HpoTermId {
        self.id
    }

    /// Returns the name of the term, e.g. `Seizure`
    pub fn name(&self) -> &'a str {
        self.name
    }
}

/// The ontology operations consumed by classifiers, filters and analyses
///
/// Implementations must be read-only after construction, so that an
/// analysis can share them across worker threads.
pub trait OntologyService: Send + Sync {
    /// Returns the term with the given id, or `None` if it does not exist
    fn get_term(&self, id: HpoTermId) -> Option<Term<'_>>;

    /// Returns the direct parents of the term
    ///
    /// Unknown terms have no parents
    fn parent_ids(&self, id: HpoTermId) -> HpoGroup;

    /// Returns the direct children of the term
    ///
    /// Unknown terms have no children
    fn child_ids(&self, id: HpoTermId) -> HpoGroup;

    /// Returns all direct and indirect parents of the term, excluding the term itself
    fn ancestor_ids(&self, id: HpoTermId) -> HpoGroup;

    /// Returns all direct and indirect children of the term, excluding the term itself
    fn descendant_ids(&self, id: HpoTermId) -> HpoGroup;

    /// Returns `true` if the term exists in the ontology
    fn contains(&self, id: HpoTermId) -> bool {
        self.get_term(id).is_some()
    }

    /// Returns `true` if `ancestor` is a direct or indirect parent of `descendant`
    ///
    /// A term is not its own ancestor.
    fn is_ancestor_of(&self, ancestor: HpoTermId, descendant: HpoTermId) -> bool {
        self.ancestor_ids(descendant).contains(&ancestor)
    }

    /// Returns `true` if `descendant` is a direct or indirect child of `ancestor`
    fn is_descendant_of(&self, descendant: HpoTermId, ancestor: HpoTermId) -> bool {
        self.is_ancestor_of(ancestor, descendant)
    }

    /// Returns the name of the term, if it exists
    fn term_name(&self, id: HpoTermId) -> Option<&str> {
        self.get_term(id).map(|term| term.name())
    }
}

/// Checks that no term of `terms` is an ancestor of another term of `terms`
///
/// # Errors
///
/// - [`GpcError::InvalidTerm`] if any of the terms is not part of the ontology
/// - [`GpcError::ConflictingQuery`] naming the first conflicting pair
pub fn check_no_conflicting_terms<O: OntologyService + ?Sized>(
    ontology: &O,
    terms: &[HpoTermId],
) -> GpcResult<()> {
    for term in terms {
        if !ontology.contains(*term) {
            return Err(GpcError::InvalidTerm(term.to_string()));
        }
    }
    for term in terms {
        let ancestors = ontology.ancestor_ids(*term);
        if let Some(ancestor) = terms.iter().find(|other| ancestors.contains(other)) {
            return Err(GpcError::ConflictingQuery {
                term: *term,
                ancestor: *ancestor,
            });
        }
    }
    Ok(())
}

/// An in-memory ontology
///
/// # Construction
///
/// 1. construct an empty Ontology [`Ontology::default`]
/// 2. Add all terms [`Ontology::insert_term`]
/// 3. Connect terms to their parents [`Ontology::add_parent`]
/// 4. Cache all parent and grandparent connections [`Ontology::create_cache`]
///
/// # Examples
///
/// ```
/// use phenocorr::{Ontology, OntologyService, HpoTermId};
///
/// let mut ontology = Ontology::default();
/// ontology.insert_term("All".into(), 1u32);
/// ontology.insert_term("Phenotypic abnormality".into(), 118u32);
/// ontology.insert_term("Seizure".into(), 1250u32);
///
/// ontology.add_parent(1u32, 118u32).unwrap();
/// ontology.add_parent(118u32, 1250u32).unwrap();
/// ontology.create_cache();
///
/// assert!(ontology.is_ancestor_of(1u32.into(), 1250u32.into()));
/// assert!(!ontology.is_ancestor_of(1250u32.into(), 1u32.into()));
/// assert_eq!(ontology.descendant_ids(118u32.into()).len(), 1);
/// assert_eq!(ontology.term_name(1250u32.into()), Some("Seizure"));
/// ```
#[derive(Default)]
pub struct Ontology {
    terms: Arena,
}

impl Debug for Ontology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ontology with {} terms", self.terms.len())
    }
}

impl Ontology {
    /// Returns the number of terms in the Ontology
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Returns `true` if the Ontology does not contain any terms
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the ids of all terms, sorted
    pub fn term_ids(&self) -> Vec<HpoTermId> {
        self.terms.keys()
    }

    /// Creates and inserts a new term to the ontology
    ///
    /// This method does not link the term to its parents
    pub fn insert_term<I: Into<HpoTermId>>(&mut self, name: String, id: I) {
        self.terms.insert(TermInternal::new(name, id.into()));
    }

    /// Add a connection from a term to its parent
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidTerm`] if either the parent or the child is not present
    pub fn add_parent<I: Into<HpoTermId>, J: Into<HpoTermId>>(
        &mut self,
        parent_id: I,
        child_id: J,
    ) -> GpcResult<()> {
        let parent_id = parent_id.into();
        let child_id = child_id.into();
        if self.terms.get(child_id).is_none() {
            return Err(GpcError::InvalidTerm(child_id.to_string()));
        }
        self.terms
            .get_mut(parent_id)
            .ok_or_else(|| GpcError::InvalidTerm(parent_id.to_string()))?
            .add_child(child_id);
        if let Some(child) = self.terms.get_mut(child_id) {
            child.add_parent(parent_id);
        }
        Ok(())
    }

    /// Creates and caches the `all_parents` values for every term
    ///
    /// Must be called after all terms and parent connections were added.
    /// Rerunning it does not cause a new calculation.
    pub fn create_cache(&mut self) {
        let term_ids = self.terms.keys();
        debug!("Caching ancestors of {} terms", term_ids.len());
        for id in term_ids {
            self.create_cache_of_grandparents(id);
        }
    }

    /// Recursively collects the direct and indirect parents of `term_id`
    ///
    /// The recursion stops at terms whose `all_parents` are already cached,
    /// so every term is resolved only once.
    fn create_cache_of_grandparents(&mut self, term_id: HpoTermId) {
        let parents = match self.terms.get(term_id) {
            Some(term) if !term.parents_cached() => term.parents().clone(),
            _ => return,
        };
        let mut res = HpoGroup::default();
        for parent in &parents {
            self.create_cache_of_grandparents(parent);
            if let Some(parent_term) = self.terms.get(parent) {
                for gp in parent_term.all_parents() {
                    res.insert(gp);
                }
            }
        }
        if let Some(term) = self.terms.get_mut(term_id) {
            *term.all_parents_mut() = res.bitor(&parents);
        }
    }
}

impl OntologyService for Ontology {
    fn get_term(&self, id: HpoTermId) -> Option<Term<'_>> {
        self.terms
            .get(id)
            .map(|term| Term::new(*term.id(), term.name()))
    }

    fn parent_ids(&self, id: HpoTermId) -> HpoGroup {
        self.terms
            .get(id)
            .map(|term| term.parents().clone())
            .unwrap_or_default()
    }

    fn child_ids(&self, id: HpoTermId) -> HpoGroup {
        self.terms
            .get(id)
            .map(|term| term.children().clone())
            .unwrap_or_default()
    }

    fn ancestor_ids(&self, id: HpoTermId) -> HpoGroup {
        self.terms
            .get(id)
            .map(|term| term.all_parents().clone())
            .unwrap_or_default()
    }

    fn descendant_ids(&self, id: HpoTermId) -> HpoGroup {
        self.terms
            .values()
            .filter(|term| term.all_parents().contains(&id))
            .map(|term| *term.id())
            .collect()
    }

    fn is_ancestor_of(&self, ancestor: HpoTermId, descendant: HpoTermId) -> bool {
        self.terms
            .get(descendant)
            .map_or(false, |term| term.all_parents().contains(&ancestor))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::toy_ontology;

    #[test]
    fn add_parent_requires_terms() {
        let mut ont = Ontology::default();
        ont.insert_term("Root".into(), 1u32);
        assert!(matches!(
            ont.add_parent(1u32, 2u32),
            Err(GpcError::InvalidTerm(_))
        ));
        assert!(matches!(
            ont.add_parent(3u32, 1u32),
            Err(GpcError::InvalidTerm(_))
        ));
    }

    #[test]
    fn cache_is_transitive() {
        let ont = toy_ontology();
        // Focal clonic seizure -> Focal-onset seizure -> Seizure -> ... -> All
        let ancestors = ont.ancestor_ids(2266u32.into());
        assert!(ancestors.contains(&1250u32.into()));
        assert!(ancestors.contains(&PHENOTYPIC_ABNORMALITY));
        assert!(ancestors.contains(&ALL));
        assert!(!ancestors.contains(&2266u32.into()));
    }

    #[test]
    fn descendants() {
        let ont = toy_ontology();
        let descendants = ont.descendant_ids(1250u32.into());
        assert!(descendants.contains(&7359u32.into()));
        assert!(descendants.contains(&2266u32.into()));
        assert!(!descendants.contains(&1250u32.into()));
        assert!(ont.is_descendant_of(2266u32.into(), 1250u32.into()));
    }

    #[test]
    fn unknown_terms_are_empty() {
        let ont = toy_ontology();
        assert!(ont.get_term(9_999_999u32.into()).is_none());
        assert!(ont.ancestor_ids(9_999_999u32.into()).is_empty());
        assert!(!ont.is_ancestor_of(1u32.into(), 9_999_999u32.into()));
    }

    #[test]
    fn conflicting_terms() {
        let ont = toy_ontology();
        let ok = [HpoTermId::from(1250u32), HpoTermId::from(1251u32)];
        assert!(check_no_conflicting_terms(&ont, &ok).is_ok());

        let bad = [HpoTermId::from(2266u32), HpoTermId::from(1250u32)];
        match check_no_conflicting_terms(&ont, &bad) {
            Err(GpcError::ConflictingQuery { term, ancestor }) => {
                assert_eq!(term, HpoTermId::from(2266u32));
                assert_eq!(ancestor, HpoTermId::from(1250u32));
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        let unknown = [HpoTermId::from(9_999_999u32)];
        assert!(matches!(
            check_no_conflicting_terms(&ont, &unknown),
            Err(GpcError::InvalidTerm(_))
        ));
    }
}
