//! Classifiers of the genotype axis
//!
//! Most genotype classifiers count the alleles of the variants that match a
//! [`VariantPredicate`]. Allele counts are taken from the genotype call of the
//! patient: heterozygous and hemizygous calls count as one allele, homozygous
//! alternate calls as two.
use std::collections::HashSet;

use crate::classifier::{categories_from_names, Category, Classifier};
use crate::model::{Patient, Sex};
use crate::predicate::VariantPredicate;
use crate::{GpcError, GpcResult};

/// Returns the number of alleles of all variants of the patient that match `predicate`
pub fn count_alleles<P: VariantPredicate + ?Sized>(patient: &Patient, predicate: &P) -> u32 {
    patient
        .variants()
        .iter()
        .filter(|variant| predicate.test(variant))
        .map(|variant| variant.alt_allele_count(patient.label()))
        .sum()
}

/// Compares patients with one allele that matches `A` with patients with one allele that matches `B`
///
/// Patients with more than one matching allele, or no matching allele at all,
/// are not assigned.
///
/// # Examples
///
/// ```
/// use phenocorr::classifier::Classifier;
/// use phenocorr::classifier::genotype::MonoallelicClassifier;
/// use phenocorr::model::VariantEffect;
/// use phenocorr::predicate::{VariantEffectPredicate, VariantPredicateExt};
///
/// let missense = VariantEffectPredicate::new(VariantEffect::MissenseVariant, "NM_013275.6");
/// let clf = MonoallelicClassifier::new(
///     missense.clone(),
///     missense.negate(),
///     "Missense",
///     "Other",
/// );
/// assert_eq!(clf.n_categories(), 2);
/// assert_eq!(clf.categories()[0].name(), "Missense");
/// ```
#[derive(Debug)]
pub struct MonoallelicClassifier {
    a_predicate: Box<dyn VariantPredicate>,
    b_predicate: Box<dyn VariantPredicate>,
    name: String,
    categories: Vec<Category>,
}

impl MonoallelicClassifier {
    pub fn new<A, B>(a_predicate: A, b_predicate: B, a_label: &str, b_label: &str) -> Self
    where
        A: VariantPredicate + 'static,
        B: VariantPredicate + 'static,
    {
        let categories = vec![
            Category::new(0, a_label).with_description(&a_predicate.question()),
            Category::new(1, b_label).with_description(&b_predicate.question()),
        ];
        Self {
            a_predicate: Box::new(a_predicate),
            b_predicate: Box::new(b_predicate),
            name: format!("{a_label} vs. {b_label}"),
            categories,
        }
    }
}

impl Classifier for MonoallelicClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "Compares monoallelic {} with {}",
            self.a_predicate.question(),
            self.b_predicate.question()
        )
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        let a = count_alleles(patient, &self.a_predicate);
        let b = count_alleles(patient, &self.b_predicate);
        match (a, b) {
            (1, 0) => self.categories.first(),
            (0, 1) => self.categories.get(1),
            _ => None,
        }
    }
}

/// Compares the biallelic genotypes `A/A`, `A/B` and `B/B`
///
/// Patients with other than two matching alleles are not assigned.
#[derive(Debug)]
pub struct BiallelicClassifier {
    a_predicate: Box<dyn VariantPredicate>,
    b_predicate: Box<dyn VariantPredicate>,
    name: String,
    categories: Vec<Category>,
}

impl BiallelicClassifier {
    pub fn new<A, B>(a_predicate: A, b_predicate: B, a_label: &str, b_label: &str) -> Self
    where
        A: VariantPredicate + 'static,
        B: VariantPredicate + 'static,
    {
        let categories = categories_from_names(&[
            format!("{a_label}/{a_label}"),
            format!("{a_label}/{b_label}"),
            format!("{b_label}/{b_label}"),
        ]);
        Self {
            a_predicate: Box::new(a_predicate),
            b_predicate: Box::new(b_predicate),
            name: format!("Biallelic {a_label} vs. {b_label}"),
            categories,
        }
    }
}

impl Classifier for BiallelicClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!(
            "Compares biallelic genotypes of {} and {}",
            self.a_predicate.question(),
            self.b_predicate.question()
        )
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        let a = count_alleles(patient, &self.a_predicate);
        let b = count_alleles(patient, &self.b_predicate);
        match (a, b) {
            (2, 0) => self.categories.first(),
            (1, 1) => self.categories.get(1),
            (0, 2) => self.categories.get(2),
            _ => None,
        }
    }
}

/// Compares groups of patients by the number of alleles that match a predicate
///
/// Each category is a set of allele counts, e.g. `{0}` vs. `{1, 2}`.
/// Patients whose count is in none of the sets are not assigned.
///
/// ```
/// use phenocorr::classifier::Classifier;
/// use phenocorr::classifier::genotype::AlleleCountClassifier;
/// use phenocorr::predicate::GenePredicate;
///
/// let clf = AlleleCountClassifier::new(GenePredicate::new("ANKRD11"), &[&[0], &[1, 2]]).unwrap();
/// assert_eq!(clf.categories()[1].name(), "1 or 2");
///
/// assert!(AlleleCountClassifier::new(GenePredicate::new("ANKRD11"), &[&[0], &[0, 1]]).is_err());
/// ```
#[derive(Debug)]
pub struct AlleleCountClassifier {
    predicate: Box<dyn VariantPredicate>,
    counts: Vec<HashSet<u32>>,
    name: String,
    categories: Vec<Category>,
}

impl AlleleCountClassifier {
    /// Constructs a new `AlleleCountClassifier`
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidInput`] if there are less than two count sets,
    /// any set is empty or the sets are not disjoint
    pub fn new<P: VariantPredicate + 'static>(predicate: P, counts: &[&[u32]]) -> GpcResult<Self> {
        if counts.len() < 2 {
            return Err(GpcError::InvalidInput(
                "at least two allele count sets are required".to_string(),
            ));
        }
        let mut seen: HashSet<u32> = HashSet::new();
        let mut sets = Vec::with_capacity(counts.len());
        let mut names = Vec::with_capacity(counts.len());
        for set in counts {
            if set.is_empty() {
                return Err(GpcError::InvalidInput(
                    "allele count sets must not be empty".to_string(),
                ));
            }
            let mut sorted = set.to_vec();
            sorted.sort_unstable();
            sorted.dedup();
            for count in &sorted {
                if !seen.insert(*count) {
                    return Err(GpcError::InvalidInput(format!(
                        "allele count {count} is used in more than one set"
                    )));
                }
            }
            names.push(
                sorted
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<String>>()
                    .join(" or "),
            );
            sets.push(sorted.into_iter().collect());
        }
        Ok(Self {
            name: format!("Allele count of {}", predicate.question()),
            predicate: Box::new(predicate),
            counts: sets,
            categories: categories_from_names(&names),
        })
    }
}

impl Classifier for AlleleCountClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        let count = count_alleles(patient, &self.predicate);
        self.counts
            .iter()
            .position(|set| set.contains(&count))
            .and_then(|idx| self.categories.get(idx))
    }
}

/// Compares females with males
///
/// Patients of unknown sex are not assigned.
#[derive(Debug)]
pub struct SexClassifier {
    categories: Vec<Category>,
}

impl Default for SexClassifier {
    fn default() -> Self {
        Self {
            categories: categories_from_names(&["FEMALE", "MALE"]),
        }
    }
}

impl Classifier for SexClassifier {
    fn name(&self) -> &str {
        "Sex"
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        match patient.sex() {
            Sex::Female => self.categories.first(),
            Sex::Male => self.categories.get(1),
            Sex::Unknown => None,
        }
    }
}

/// Compares patients by their diagnosis
///
/// Patients are assigned only if exactly one of the diagnoses was confirmed.
#[derive(Debug)]
pub struct DiagnosisClassifier {
    disease_ids: Vec<String>,
    categories: Vec<Category>,
}

impl DiagnosisClassifier {
    /// Constructs a new classifier from `(id, name)` pairs of the diagnoses
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidInput`] if less than two distinct diagnoses are given
    pub fn new(diagnoses: &[(&str, &str)]) -> GpcResult<Self> {
        let unique: HashSet<&str> = diagnoses.iter().map(|(id, _)| *id).collect();
        if diagnoses.len() < 2 || unique.len() != diagnoses.len() {
            return Err(GpcError::InvalidInput(
                "at least two distinct diagnoses are required".to_string(),
            ));
        }
        let categories = diagnoses
            .iter()
            .enumerate()
            .map(|(idx, (id, name))| Category::new(idx, id).with_description(name))
            .collect();
        Ok(Self {
            disease_ids: diagnoses.iter().map(|(id, _)| (*id).to_string()).collect(),
            categories,
        })
    }
}

impl Classifier for DiagnosisClassifier {
    fn name(&self) -> &str {
        "Diagnosis"
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn test(&self, patient: &Patient) -> Option<&Category> {
        let mut found = None;
        for disease in patient.present_diseases() {
            if let Some(idx) = self.disease_ids.iter().position(|id| id == disease.id()) {
                if found.map_or(false, |prev| prev != idx) {
                    return None;
                }
                found = Some(idx);
            }
        }
        found.and_then(|idx| self.categories.get(idx))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Disease, Genotype, VariantEffect};
    use crate::predicate::{VariantEffectPredicate, VariantPredicateExt};
    use crate::test_utils::{missense, toy_cohort, TX_ID};

    fn missense_pred() -> VariantEffectPredicate {
        VariantEffectPredicate::new(VariantEffect::MissenseVariant, TX_ID)
    }

    fn frameshift_pred() -> VariantEffectPredicate {
        VariantEffectPredicate::new(VariantEffect::FrameshiftVariant, TX_ID)
    }

    fn assigned_names<C: Classifier>(clf: &C) -> Vec<Option<String>> {
        toy_cohort()
            .all_patients()
            .iter()
            .map(|p| clf.test(p).map(|c| c.name().to_string()))
            .collect()
    }

    #[test]
    fn monoallelic() {
        let clf = MonoallelicClassifier::new(missense_pred(), frameshift_pred(), "MIS", "FS");
        let names = assigned_names(&clf);
        for name in &names[0..5] {
            assert_eq!(name.as_deref(), Some("MIS"));
        }
        for name in &names[5..9] {
            assert_eq!(name.as_deref(), Some("FS"));
        }
        assert!(names[9].is_none());
        assert_eq!(clf.name(), "MIS vs. FS");
    }

    #[test]
    fn monoallelic_excludes_homozygous() {
        let clf =
            MonoallelicClassifier::new(missense_pred(), missense_pred().negate(), "MIS", "Other");
        let patient = Patient::new("x", Sex::Male)
            .with_variants(vec![missense("x", Genotype::HomozygousAlternate)]);
        assert!(clf.test(&patient).is_none());
    }

    #[test]
    fn biallelic() {
        let clf = BiallelicClassifier::new(missense_pred(), frameshift_pred(), "MIS", "FS");
        let names = assigned_names(&clf);
        assert!(names[0..9].iter().all(Option::is_none));
        assert_eq!(names[9].as_deref(), Some("MIS/FS"));

        let patient = Patient::new("x", Sex::Male)
            .with_variants(vec![missense("x", Genotype::HomozygousAlternate)]);
        assert_eq!(clf.test(&patient).map(Category::id), Some(0));
    }

    #[test]
    fn allele_count() {
        let clf = AlleleCountClassifier::new(missense_pred(), &[&[0], &[1]]).unwrap();
        let names = assigned_names(&clf);
        assert_eq!(names[0].as_deref(), Some("1"));
        assert_eq!(names[6].as_deref(), Some("0"));
        assert_eq!(names[9].as_deref(), Some("1"));

        let patient = Patient::new("x", Sex::Male)
            .with_variants(vec![missense("x", Genotype::HomozygousAlternate)]);
        assert!(clf.test(&patient).is_none());
    }

    #[test]
    fn allele_count_validation() {
        assert!(AlleleCountClassifier::new(missense_pred(), &[&[0]]).is_err());
        assert!(AlleleCountClassifier::new(missense_pred(), &[&[0], &[]]).is_err());
    }

    #[test]
    fn sex() {
        let names = assigned_names(&SexClassifier::default());
        assert_eq!(names[0].as_deref(), Some("FEMALE"));
        assert_eq!(names[1].as_deref(), Some("MALE"));
        assert!(names[4].is_none());
    }

    #[test]
    fn diagnosis() {
        let clf = DiagnosisClassifier::new(&[
            ("OMIM:148050", "KBG syndrome"),
            ("OMIM:300558", "Other syndrome"),
        ])
        .unwrap();
        let kbg = Patient::new("a", Sex::Male)
            .with_diseases(vec![Disease::new("OMIM:148050", "KBG syndrome", true)]);
        let both = Patient::new("b", Sex::Male).with_diseases(vec![
            Disease::new("OMIM:148050", "KBG syndrome", true),
            Disease::new("OMIM:300558", "Other syndrome", true),
        ]);
        let excluded = Patient::new("c", Sex::Male)
            .with_diseases(vec![Disease::new("OMIM:300558", "Other syndrome", false)]);
        assert_eq!(clf.test(&kbg).map(Category::id), Some(0));
        assert!(clf.test(&both).is_none());
        assert!(clf.test(&excluded).is_none());

        assert!(DiagnosisClassifier::new(&[("OMIM:148050", "KBG syndrome")]).is_err());
    }
}
