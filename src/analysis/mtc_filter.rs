//! Decide which phenotypes are worth testing
//!
//! Every tested phenotype adds to the burden of the multiple testing correction.
//! A [`PhenotypeMtcFilter`] removes phenotypes that cannot or need not be tested
//! before any p-value is computed. Each removed phenotype carries a reason.
use core::fmt::Debug;
use std::collections::HashSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::PhenotypeKey;
use crate::ontology::{OntologyService, ALL, PHENOTYPIC_ABNORMALITY};
use crate::stats::{f64_from_usize, ContingencyTable};
use crate::term::HpoGroup;
use crate::{GpcError, GpcResult, HpoTermId};

/// The decision of an MTC filter for a single phenotype
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MtcFilterResult {
    /// The phenotype is tested
    Ok,
    /// The phenotype is not tested
    Failed {
        /// Stable, machine-readable code, e.g. `HMF01`
        code: String,
        /// Human readable reason
        reason: String,
    },
}

impl MtcFilterResult {
    pub fn failed(code: &str, reason: &str) -> Self {
        MtcFilterResult::Failed {
            code: code.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, MtcFilterResult::Ok)
    }

    pub fn is_filtered_out(&self) -> bool {
        !self.is_passed()
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            MtcFilterResult::Ok => None,
            MtcFilterResult::Failed { code, .. } => Some(code),
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            MtcFilterResult::Ok => None,
            MtcFilterResult::Failed { reason, .. } => Some(reason),
        }
    }
}

impl From<HpoMtcRule> for MtcFilterResult {
    fn from(rule: HpoMtcRule) -> Self {
        MtcFilterResult::failed(rule.code(), rule.reason())
    }
}

/// Decides which phenotypes are tested
///
/// `phenotypes` and `tables` have the same length, the result as well.
/// `n_patients` is the size of the whole cohort, including patients
/// that are missing from the tables.
pub trait PhenotypeMtcFilter: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn filter(
        &self,
        phenotypes: &[PhenotypeKey],
        tables: &[ContingencyTable],
        n_patients: usize,
    ) -> Vec<MtcFilterResult>;
}

/// Tests every phenotype
#[derive(Debug, Clone, Copy, Default)]
pub struct UseAllTermsFilter;

impl PhenotypeMtcFilter for UseAllTermsFilter {
    fn name(&self) -> &str {
        "All terms"
    }

    fn filter(
        &self,
        phenotypes: &[PhenotypeKey],
        _tables: &[ContingencyTable],
        _n_patients: usize,
    ) -> Vec<MtcFilterResult> {
        vec![MtcFilterResult::Ok; phenotypes.len()]
    }
}

/// Tests only the given HPO terms
#[derive(Debug, Clone)]
pub struct SpecifiedTermsFilter {
    terms: HpoGroup,
}

impl SpecifiedTermsFilter {
    pub const CODE: &'static str = "HMF07";

    pub fn new(terms: &[HpoTermId]) -> Self {
        Self {
            terms: terms.iter().copied().collect(),
        }
    }
}

impl PhenotypeMtcFilter for SpecifiedTermsFilter {
    fn name(&self) -> &str {
        "Specified terms"
    }

    fn filter(
        &self,
        phenotypes: &[PhenotypeKey],
        _tables: &[ContingencyTable],
        _n_patients: usize,
    ) -> Vec<MtcFilterResult> {
        phenotypes
            .iter()
            .map(|key| match key.term_id() {
                Some(id) if self.terms.contains(&id) => MtcFilterResult::Ok,
                _ => MtcFilterResult::failed(Self::CODE, "Non-specified term"),
            })
            .collect()
    }
}

/// A single rule of the [`HpoMtcFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HpoMtcRule {
    /// The term is too general to be informative, e.g. `Phenotypic abnormality`
    GeneralTerm,
    /// The term is observed in less than the threshold fraction of the cohort
    FrequencyThreshold,
    /// One of the genotype groups has no patient
    EmptyGenotypeGroup,
    /// No genotype group has more than one patient with the term
    TooFewObservations,
    /// All genotype groups have the same proportion of patients with the term
    IdenticalProportions,
    /// A tested descendant term has the same counts
    RedundantWithDescendant,
}

impl HpoMtcRule {
    /// The default order in which rules are checked
    pub const DEFAULT_ORDER: [HpoMtcRule; 6] = [
        HpoMtcRule::GeneralTerm,
        HpoMtcRule::FrequencyThreshold,
        HpoMtcRule::EmptyGenotypeGroup,
        HpoMtcRule::TooFewObservations,
        HpoMtcRule::IdenticalProportions,
        HpoMtcRule::RedundantWithDescendant,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            HpoMtcRule::GeneralTerm => "HMF01",
            HpoMtcRule::FrequencyThreshold => "HMF02",
            HpoMtcRule::EmptyGenotypeGroup => "HMF03",
            HpoMtcRule::TooFewObservations => "HMF04",
            HpoMtcRule::IdenticalProportions => "HMF05",
            HpoMtcRule::RedundantWithDescendant => "HMF06",
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            HpoMtcRule::GeneralTerm => "Skipping general term",
            HpoMtcRule::FrequencyThreshold => {
                "Skipping term because of a frequency below the threshold"
            }
            HpoMtcRule::EmptyGenotypeGroup => "Skipping term because a genotype group is empty",
            HpoMtcRule::TooFewObservations => {
                "Skipping term because no genotype has more than one observed HPO count"
            }
            HpoMtcRule::IdenticalProportions => {
                "Skipping term because all genotypes have the same HPO observed proportions"
            }
            HpoMtcRule::RedundantWithDescendant => {
                "Skipping term because a descendant term has the same counts"
            }
        }
    }
}

impl Display for HpoMtcRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.reason())
    }
}

/// Checks that each rule is listed at most once
///
/// # Errors
///
/// [`GpcError::InvalidConfig`] naming the first duplicate rule
pub(crate) fn check_rule_order(rules: &[HpoMtcRule]) -> GpcResult<()> {
    let mut seen = HashSet::new();
    for rule in rules {
        if !seen.insert(rule) {
            return Err(GpcError::InvalidConfig(format!(
                "MTC filter rule {} is listed more than once",
                rule.code()
            )));
        }
    }
    Ok(())
}

/// The heuristic MTC filter for HPO terms
///
/// Each rule can veto a term. Rules are checked in a configurable order
/// and the first failing rule is reported, see [`HpoMtcRule::DEFAULT_ORDER`].
/// Phenotypes that are not HPO terms skip the ontology-based rules
/// [`HpoMtcRule::GeneralTerm`] and [`HpoMtcRule::RedundantWithDescendant`].
///
/// The first column of each table holds the patients with the term.
///
/// # Examples
///
/// ```
/// use phenocorr::Ontology;
/// use phenocorr::analysis::{HpoMtcFilter, PhenotypeMtcFilter};
/// use phenocorr::classifier::PhenotypeKey;
/// use phenocorr::stats::ContingencyTable;
///
/// let mut ontology = Ontology::default();
/// ontology.insert_term("Phenotypic abnormality".into(), 118u32);
/// ontology.insert_term("Abnormality of the nervous system".into(), 707u32);
/// ontology.insert_term("Seizure".into(), 1250u32);
/// ontology.add_parent(118u32, 707u32).unwrap();
/// ontology.add_parent(707u32, 1250u32).unwrap();
/// ontology.create_cache();
///
/// let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
/// let table = ContingencyTable::from_rows(&[[4, 1], [1, 3]]).unwrap();
/// let results = filter.filter(
///     &[PhenotypeKey::Term(118u32.into()), PhenotypeKey::Term(1250u32.into())],
///     &[table.clone(), table],
///     9,
/// );
/// assert_eq!(results[0].code(), Some("HMF01"));
/// assert!(results[1].is_passed());
/// ```
pub struct HpoMtcFilter<'o> {
    ontology: &'o dyn OntologyService,
    term_frequency_threshold: f64,
    general_terms: HpoGroup,
    rules: Vec<HpoMtcRule>,
}

impl Debug for HpoMtcFilter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HpoMtcFilter")
            .field("term_frequency_threshold", &self.term_frequency_threshold)
            .field("general_terms", &self.general_terms)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl<'o> HpoMtcFilter<'o> {
    /// Constructs the filter with the default rule order
    ///
    /// The general terms are `All`, `Phenotypic abnormality` and all
    /// direct children of `Phenotypic abnormality`.
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidConfig`] if `term_frequency_threshold` is not within `(0, 1]`
    pub fn new(
        ontology: &'o dyn OntologyService,
        term_frequency_threshold: f64,
    ) -> GpcResult<Self> {
        if !(term_frequency_threshold > 0.0 && term_frequency_threshold <= 1.0) {
            return Err(GpcError::InvalidConfig(format!(
                "term frequency threshold must be within (0, 1], found {term_frequency_threshold}"
            )));
        }
        let mut general_terms = ontology.child_ids(PHENOTYPIC_ABNORMALITY);
        general_terms.insert(ALL);
        general_terms.insert(PHENOTYPIC_ABNORMALITY);
        Ok(Self {
            ontology,
            term_frequency_threshold,
            general_terms,
            rules: HpoMtcRule::DEFAULT_ORDER.to_vec(),
        })
    }

    /// Replaces the rules and their order
    ///
    /// Rules that are not listed are not checked.
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidConfig`] if a rule is listed more than once
    pub fn with_rules(mut self, rules: &[HpoMtcRule]) -> GpcResult<Self> {
        check_rule_order(rules)?;
        self.rules = rules.to_vec();
        Ok(self)
    }

    /// Adds more terms that are never tested
    #[must_use]
    pub fn with_general_terms(mut self, terms: &[HpoTermId]) -> Self {
        for term in terms {
            self.general_terms.insert(*term);
        }
        self
    }

    pub fn rules(&self) -> &[HpoMtcRule] {
        &self.rules
    }

    /// Returns `true` if the term passes the rule
    ///
    /// [`HpoMtcRule::RedundantWithDescendant`] depends on the other terms
    /// and always passes here.
    fn check_rule(
        &self,
        rule: HpoMtcRule,
        key: &PhenotypeKey,
        table: &ContingencyTable,
        n_patients: usize,
    ) -> bool {
        match rule {
            HpoMtcRule::GeneralTerm => key
                .term_id()
                .map_or(true, |id| !self.general_terms.contains(&id)),
            HpoMtcRule::FrequencyThreshold => {
                let observed = f64::from(table.col(0).sum::<u32>());
                let required = (self.term_frequency_threshold * f64_from_usize(n_patients)).ceil();
                observed >= required
            }
            HpoMtcRule::EmptyGenotypeGroup => table.row_sums().iter().all(|sum| *sum > 0),
            HpoMtcRule::TooFewObservations => table.col(0).any(|observed| observed > 1),
            HpoMtcRule::IdenticalProportions => !has_identical_proportions(table),
            HpoMtcRule::RedundantWithDescendant => true,
        }
    }

    fn first_failing_rule(
        &self,
        key: &PhenotypeKey,
        table: &ContingencyTable,
        n_patients: usize,
    ) -> Option<HpoMtcRule> {
        self.rules
            .iter()
            .copied()
            .find(|rule| !self.check_rule(*rule, key, table, n_patients))
    }

    /// Returns `true` if a descendant term passes and has the same table
    fn has_redundant_descendant(
        &self,
        idx: usize,
        phenotypes: &[PhenotypeKey],
        tables: &[ContingencyTable],
        passing: &[bool],
    ) -> bool {
        let Some(term) = phenotypes[idx].term_id() else {
            return false;
        };
        phenotypes
            .iter()
            .zip(tables)
            .zip(passing)
            .enumerate()
            .any(|(other, ((key, table), passes))| {
                other != idx
                    && *passes
                    && *table == tables[idx]
                    && key
                        .term_id()
                        .map_or(false, |id| self.ontology.is_ancestor_of(term, id))
            })
    }
}

/// `true` if all non-empty genotype groups have the same proportion of the first column
fn has_identical_proportions(table: &ContingencyTable) -> bool {
    let proportions: Vec<(u64, u64)> = table
        .rows()
        .map(|row| {
            (
                u64::from(row.first().copied().unwrap_or_default()),
                row.iter().map(|v| u64::from(*v)).sum::<u64>(),
            )
        })
        .filter(|(_, total)| *total > 0)
        .collect();
    proportions
        .windows(2)
        .all(|w| w[0].0 * w[1].1 == w[1].0 * w[0].1)
}

impl PhenotypeMtcFilter for HpoMtcFilter<'_> {
    fn name(&self) -> &str {
        "HPO MTC filter"
    }

    fn filter(
        &self,
        phenotypes: &[PhenotypeKey],
        tables: &[ContingencyTable],
        n_patients: usize,
    ) -> Vec<MtcFilterResult> {
        let failing: Vec<Option<HpoMtcRule>> = phenotypes
            .iter()
            .zip(tables)
            .map(|(key, table)| self.first_failing_rule(key, table, n_patients))
            .collect();
        let passing: Vec<bool> = failing.iter().map(Option::is_none).collect();

        let mut results = Vec::with_capacity(phenotypes.len());
        for (idx, key) in phenotypes.iter().enumerate() {
            // rules before the redundancy check take precedence
            let failed = self.rules.iter().copied().find(|rule| match rule {
                HpoMtcRule::RedundantWithDescendant => {
                    self.has_redundant_descendant(idx, phenotypes, tables, &passing)
                }
                _ => failing[idx] == Some(*rule),
            });
            match failed {
                Some(rule) => {
                    debug!("{key}: {rule}");
                    results.push(MtcFilterResult::from(rule));
                }
                None => results.push(MtcFilterResult::Ok),
            }
        }
        results
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utils::toy_ontology;

    fn table<R: AsRef<[u32]>>(rows: &[R]) -> ContingencyTable {
        ContingencyTable::from_rows(rows).unwrap()
    }

    fn term(id: u32) -> PhenotypeKey {
        PhenotypeKey::Term(id.into())
    }

    fn codes(results: &[MtcFilterResult]) -> Vec<Option<&str>> {
        results.iter().map(MtcFilterResult::code).collect()
    }

    #[test]
    fn general_terms() {
        let ontology = toy_ontology();
        let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        let t = table(&[[4, 1], [1, 3]]);
        let results = filter.filter(
            &[term(1), term(118), term(707), term(12638)],
            &[t.clone(), t.clone(), t.clone(), t],
            10,
        );
        assert_eq!(
            codes(&results),
            vec![Some("HMF01"), Some("HMF01"), Some("HMF01"), None]
        );
    }

    #[test]
    fn single_rules() {
        let ontology = toy_ontology();
        let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        let phenotypes = [term(1250), term(7359), term(2266), term(252), term(1251)];
        let tables = [
            table(&[[4, 1], [1, 3]]),
            // 1 of 10 observed, 2 required
            table(&[[1, 4], [0, 5]]),
            table(&[[2, 1], [0, 0]]),
            table(&[[1, 1], [1, 3]]),
            table(&[[2, 2], [3, 3]]),
        ];
        let results = filter.filter(&phenotypes, &tables, 10);
        assert_eq!(
            codes(&results),
            vec![None, Some("HMF02"), Some("HMF03"), Some("HMF04"), Some("HMF05")]
        );
        assert_eq!(
            results[4].reason(),
            Some("Skipping term because all genotypes have the same HPO observed proportions")
        );
    }

    #[test]
    fn redundant_ancestor() {
        let ontology = toy_ontology();
        let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        let t = table(&[[0, 5], [3, 1]]);
        let results = filter.filter(&[term(234), term(252)], &[t.clone(), t], 10);
        assert_eq!(codes(&results), vec![Some("HMF06"), None]);

        // different counts are not redundant
        let results = filter.filter(
            &[term(234), term(252)],
            &[table(&[[1, 4], [3, 1]]), table(&[[0, 5], [3, 1]])],
            10,
        );
        assert!(results.iter().all(MtcFilterResult::is_passed));
    }

    #[test]
    fn failing_descendant_is_not_redundant() {
        let ontology = toy_ontology();
        let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        let t = table(&[[1, 1], [1, 3]]);
        let results = filter.filter(&[term(1250), term(7359)], &[t.clone(), t], 10);
        // both fail because of too few observations, the ancestor is not redundant
        assert_eq!(codes(&results), vec![Some("HMF04"), Some("HMF04")]);
    }

    #[test]
    fn configurable_order() {
        let ontology = toy_ontology();
        let t = table(&[[1, 1], [0, 0]]);
        let default = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        assert_eq!(
            codes(&default.filter(&[term(1250)], &[t.clone()], 4)),
            vec![Some("HMF03")]
        );

        let reordered = HpoMtcFilter::new(&ontology, 0.2)
            .unwrap()
            .with_rules(&[HpoMtcRule::TooFewObservations, HpoMtcRule::EmptyGenotypeGroup])
            .unwrap();
        assert_eq!(
            codes(&reordered.filter(&[term(1250)], &[t.clone()], 4)),
            vec![Some("HMF04")]
        );

        let only_general = HpoMtcFilter::new(&ontology, 0.2)
            .unwrap()
            .with_rules(&[HpoMtcRule::GeneralTerm])
            .unwrap();
        assert!(only_general.filter(&[term(1250)], &[t], 4)[0].is_passed());

        assert!(matches!(
            HpoMtcFilter::new(&ontology, 0.2)
                .unwrap()
                .with_rules(&[HpoMtcRule::GeneralTerm, HpoMtcRule::GeneralTerm]),
            Err(GpcError::InvalidConfig(_))
        ));
    }

    #[test]
    fn invalid_threshold() {
        let ontology = toy_ontology();
        assert!(HpoMtcFilter::new(&ontology, 0.0).is_err());
        assert!(HpoMtcFilter::new(&ontology, 1.5).is_err());
        assert!(HpoMtcFilter::new(&ontology, f64::NAN).is_err());
        assert!(HpoMtcFilter::new(&ontology, 1.0).is_ok());
    }

    #[test]
    fn non_term_phenotypes() {
        let ontology = toy_ontology();
        let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        let key = PhenotypeKey::Disease("OMIM:148050".to_string());
        let t = table(&[[4, 1], [1, 3]]);
        assert!(filter.filter(&[key.clone(), key], &[t.clone(), t], 10)[0].is_passed());
    }

    #[test]
    fn specified_terms() {
        let filter = SpecifiedTermsFilter::new(&[1250u32.into()]);
        let t = table(&[[4, 1], [1, 3]]);
        let results = filter.filter(
            &[term(1250), term(252), PhenotypeKey::Custom("x".into())],
            &[t.clone(), t.clone(), t],
            10,
        );
        assert_eq!(codes(&results), vec![None, Some("HMF07"), Some("HMF07")]);
    }

    #[test]
    fn use_all_terms() {
        let t = table(&[[0, 0], [0, 0]]);
        let results = UseAllTermsFilter.filter(&[term(1), term(118)], &[t.clone(), t], 2);
        assert!(results.iter().all(MtcFilterResult::is_passed));
    }

    #[test]
    fn frequency_counts_the_whole_cohort() {
        let ontology = toy_ontology();
        let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
        // 3 observed, 1 excluded, everybody else is unknown
        let t = table(&[[2, 0], [1, 1]]);
        assert_eq!(
            codes(&filter.filter(&[term(1250)], &[t.clone()], 100)),
            vec![Some("HMF02")]
        );
        // 20 observed patients are required in a cohort of 100, 4 in a cohort of 16
        assert!(filter.filter(&[term(1250)], &[t.clone()], 10)[0].is_passed());
        assert_eq!(
            codes(&filter.filter(&[term(1250)], &[t], 16)),
            vec![Some("HMF02")]
        );
    }

    #[test]
    fn identical_proportions() {
        assert!(has_identical_proportions(&table(&[[1, 2], [2, 4], [0, 0]])));
        assert!(!has_identical_proportions(&table(&[[1, 2], [2, 3]])));
        assert!(has_identical_proportions(&table(&[[4, 0], [1, 0]])));
    }
}
