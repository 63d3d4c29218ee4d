use rayon::prelude::*;
use tracing::{debug, info};

use crate::analysis::{
    assign_genotypes, build_table, check_genotype_classifier, AnalysisResult, PhenotypeMtcFilter,
    UseAllTermsFilter,
};
use crate::classifier::{Classifier, PhenotypeClassifier, PhenotypeKey};
use crate::model::Cohort;
use crate::stats::{ContingencyTable, CountStatistic, MtcCorrection, StatisticResult};
use crate::{GpcError, GpcResult};

/// The shared parts of all multi-phenotype analyses
#[derive(Debug)]
struct Engine<'a> {
    count_statistic: Box<dyn CountStatistic>,
    mtc_filter: Box<dyn PhenotypeMtcFilter + 'a>,
    mtc_correction: MtcCorrection,
    parallel: bool,
}

fn check_phenotype_classifiers<P: PhenotypeClassifier>(phenotypes: &[P]) -> GpcResult<()> {
    if phenotypes.is_empty() {
        return Err(GpcError::InvalidInput(
            "at least one phenotype classifier is required".to_string(),
        ));
    }
    if let Some(clf) = phenotypes.iter().find(|clf| clf.n_categories() < 2) {
        return Err(GpcError::InvalidInput(format!(
            "the phenotype classifier {} must have at least 2 categories",
            clf.name()
        )));
    }
    Ok(())
}

fn run_test(
    statistic: &dyn CountStatistic,
    key: &PhenotypeKey,
    table: &ContingencyTable,
) -> GpcResult<StatisticResult> {
    debug!("Testing {key} with {}", statistic.name());
    statistic.compute_pval(table)
}

impl Engine<'_> {
    fn compare<G, P>(
        &self,
        cohort: &Cohort,
        genotype: &G,
        phenotypes: &[P],
    ) -> GpcResult<AnalysisResult>
    where
        G: Classifier + ?Sized,
        P: PhenotypeClassifier,
    {
        check_genotype_classifier(genotype, 2)?;
        check_phenotype_classifiers(phenotypes)?;

        let patients = cohort.all_patients();
        let genotypes = assign_genotypes(cohort, genotype);
        let n_genotypes = genotype.n_categories();
        let keys: Vec<PhenotypeKey> = phenotypes.iter().map(PhenotypeClassifier::key).collect();

        let tables: Vec<ContingencyTable> = if self.parallel {
            phenotypes
                .par_iter()
                .map(|clf| build_table(patients, &genotypes, n_genotypes, clf))
                .collect()
        } else {
            phenotypes
                .iter()
                .map(|clf| build_table(patients, &genotypes, n_genotypes, clf))
                .collect()
        };

        let mtc_filter_results = self.mtc_filter.filter(&keys, &tables, cohort.len());
        let tested: Vec<usize> = mtc_filter_results
            .iter()
            .enumerate()
            .filter(|(_, res)| res.is_passed())
            .map(|(idx, _)| idx)
            .collect();
        info!(
            "{} of {} phenotypes pass the {}",
            tested.len(),
            keys.len(),
            self.mtc_filter.name()
        );
        if tested.is_empty() {
            return Err(GpcError::NoTestablePhenotypes);
        }

        let statistic = self.count_statistic.as_ref();
        let tested_results: Vec<StatisticResult> = if self.parallel {
            tested
                .par_iter()
                .map(|idx| run_test(statistic, &keys[*idx], &tables[*idx]))
                .collect::<GpcResult<Vec<StatisticResult>>>()?
        } else {
            tested
                .iter()
                .map(|idx| run_test(statistic, &keys[*idx], &tables[*idx]))
                .collect::<GpcResult<Vec<StatisticResult>>>()?
        };

        // the correction must see all tested p-values at once
        let pvals: Vec<f64> = tested_results.iter().map(StatisticResult::pval).collect();
        let corrected = self.mtc_correction.correct(&pvals)?;

        let mut statistic_results: Vec<Option<StatisticResult>> = vec![None; keys.len()];
        let mut corrected_pvals = vec![f64::NAN; keys.len()];
        for ((idx, result), pval) in tested.iter().zip(tested_results).zip(corrected) {
            statistic_results[*idx] = Some(result);
            corrected_pvals[*idx] = pval;
        }

        Ok(AnalysisResult::new(
            keys,
            tables,
            mtc_filter_results,
            statistic_results,
            corrected_pvals,
            genotype.categories().to_vec(),
            statistic.name(),
            self.mtc_filter.name(),
            self.mtc_correction.name(),
        ))
    }
}

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Compares the presence of HPO terms between genotype groups
///
/// The analysis runs these steps:
///
/// ```mermaid
/// flowchart LR
///     A[Cohort] --> B[Genotype classifier]
///     B --> C[Contingency table per term]
///     C --> D{MTC filter}
///     D -->|pass| E[Count statistic]
///     D -->|fail| F[Reason]
///     E --> G[MTC correction]
///     G --> H[AnalysisResult]
///     F --> H
/// ```
///
/// The MTC filter decides which terms are tested. If no term is left,
/// the analysis fails with [`GpcError::NoTestablePhenotypes`]. Any error
/// of the count statistic fails the whole analysis.
///
/// # Examples
///
/// ```
/// use phenocorr::Ontology;
/// use phenocorr::analysis::{HpoMtcFilter, HpoTermAnalysis, PValueKind};
/// use phenocorr::classifier::genotype::SexClassifier;
/// use phenocorr::classifier::phenotype::HpoClassifier;
/// use phenocorr::model::{Cohort, Patient, Phenotype, Sex};
/// use phenocorr::stats::{FisherExact, MtcCorrection};
///
/// let mut ontology = Ontology::default();
/// ontology.insert_term("All".into(), 1u32);
/// ontology.insert_term("Phenotypic abnormality".into(), 118u32);
/// ontology.insert_term("Abnormality of the nervous system".into(), 707u32);
/// ontology.insert_term("Seizure".into(), 1250u32);
/// ontology.add_parent(1u32, 118u32).unwrap();
/// ontology.add_parent(118u32, 707u32).unwrap();
/// ontology.add_parent(707u32, 1250u32).unwrap();
/// ontology.create_cache();
///
/// let mut patients = Vec::new();
/// for i in 0..10 {
///     let (sex, seizure) = if i < 5 {
///         (Sex::Female, Phenotype::observed(1250u32))
///     } else {
///         (Sex::Male, Phenotype::excluded(1250u32))
///     };
///     patients.push(Patient::new(&format!("P{i}"), sex).with_phenotypes(vec![seizure]));
/// }
/// let cohort = Cohort::new(patients);
///
/// let filter = HpoMtcFilter::new(&ontology, 0.2).unwrap();
/// let analysis = HpoTermAnalysis::new(FisherExact, filter, MtcCorrection::Bonferroni);
/// let phenotypes = vec![
///     HpoClassifier::new(&ontology, 118u32.into(), false).unwrap(),
///     HpoClassifier::new(&ontology, 1250u32.into(), false).unwrap(),
/// ];
///
/// let result = analysis
///     .compare_genotype_vs_phenotypes(&cohort, &SexClassifier::default(), &phenotypes)
///     .unwrap();
///
/// assert_eq!(result.total_tests(), 1);
/// assert!(result.corrected_pvals()[0].is_nan());
/// assert_eq!(result.significant_phenotype_indices(0.05, PValueKind::Corrected), vec![1]);
/// ```
#[derive(Debug)]
pub struct HpoTermAnalysis<'a> {
    engine: Engine<'a>,
}

impl<'a> HpoTermAnalysis<'a> {
    pub fn new<C, F>(count_statistic: C, mtc_filter: F, mtc_correction: MtcCorrection) -> Self
    where
        C: CountStatistic + 'static,
        F: PhenotypeMtcFilter + 'a,
    {
        Self {
            engine: Engine {
                count_statistic: Box::new(count_statistic),
                mtc_filter: Box::new(mtc_filter),
                mtc_correction,
                parallel: false,
            },
        }
    }

    /// Builds the tables and runs the tests of all terms on the rayon thread pool
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.engine.parallel = parallel;
        self
    }

    pub fn mtc_correction(&self) -> MtcCorrection {
        self.engine.mtc_correction
    }

    /// Runs the analysis
    ///
    /// # Errors
    ///
    /// - [`GpcError::InvalidInput`] if the genotype classifier has less than two
    ///   categories, `phenotypes` is empty or a phenotype classifier has less than
    ///   two categories
    /// - [`GpcError::NoTestablePhenotypes`] if the MTC filter removes all phenotypes
    /// - any error of the count statistic, e.g. [`GpcError::Overflow`]
    pub fn compare_genotype_vs_phenotypes<G, P>(
        &self,
        cohort: &Cohort,
        genotype: &G,
        phenotypes: &[P],
    ) -> GpcResult<AnalysisResult>
    where
        G: Classifier + ?Sized,
        P: PhenotypeClassifier,
    {
        self.engine.compare(cohort, genotype, phenotypes)
    }
}

/// Compares any set of phenotypes between genotype groups
///
/// All phenotypes are tested. This is an [`HpoTermAnalysis`] with the
/// [`UseAllTermsFilter`].
#[derive(Debug)]
pub struct MultiPhenotypeAnalysis {
    engine: Engine<'static>,
}

impl MultiPhenotypeAnalysis {
    pub fn new<C: CountStatistic + 'static>(
        count_statistic: C,
        mtc_correction: MtcCorrection,
    ) -> Self {
        Self {
            engine: Engine {
                count_statistic: Box::new(count_statistic),
                mtc_filter: Box::new(UseAllTermsFilter),
                mtc_correction,
                parallel: false,
            },
        }
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.engine.parallel = parallel;
        self
    }

    /// Runs the analysis
    ///
    /// # Errors
    ///
    /// - [`GpcError::InvalidInput`] for invalid classifiers, see [`HpoTermAnalysis::compare_genotype_vs_phenotypes`]
    /// - any error of the count statistic, e.g. [`GpcError::DegenerateTable`]
    pub fn compare_genotype_vs_phenotypes<G, P>(
        &self,
        cohort: &Cohort,
        genotype: &G,
        phenotypes: &[P],
    ) -> GpcResult<AnalysisResult>
    where
        G: Classifier + ?Sized,
        P: PhenotypeClassifier,
    {
        self.engine.compare(cohort, genotype, phenotypes)
    }
}
