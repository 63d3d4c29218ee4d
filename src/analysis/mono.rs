//! Analyses of a single numerical or time-to-event phenotype
//!
//! These analyses compare one phenotype of the genotype groups. There is
//! no MTC filter and no multiple testing correction.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::{assign_genotypes, check_genotype_classifier};
use crate::classifier::endpoint::{Endpoint, Survival};
use crate::classifier::scorer::PhenotypeScorer;
use crate::classifier::{Category, Classifier};
use crate::model::{Cohort, Patient};
use crate::stats::{ScoreStatistic, StatisticResult, SurvivalStatistic};
use crate::{GpcError, GpcResult};

/// The genotype and phenotype of a single patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord<T> {
    patient_id: String,
    genotype: Option<usize>,
    phenotype: Option<T>,
}

impl<T> PatientRecord<T> {
    pub fn patient_id(&self) -> &str {
        &self.patient_id
    }

    /// The id of the genotype category, `None` if the patient was not assigned
    pub fn genotype(&self) -> Option<usize> {
        self.genotype
    }

    pub fn phenotype(&self) -> Option<&T> {
        self.phenotype.as_ref()
    }

    /// `true` if both genotype and phenotype are known
    pub fn is_complete(&self) -> bool {
        self.genotype.is_some() && self.phenotype.is_some()
    }
}

/// The result of a [`PhenotypeScoreAnalysis`] or [`SurvivalAnalysis`]
///
/// Holds one record per patient of the cohort, including patients
/// without genotype or phenotype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonoPhenotypeAnalysisResult<T> {
    records: Vec<PatientRecord<T>>,
    genotype_categories: Vec<Category>,
    phenotype_name: String,
    statistic_name: String,
    statistic_result: StatisticResult,
}

impl<T> MonoPhenotypeAnalysisResult<T> {
    pub fn records(&self) -> &[PatientRecord<T>] {
        &self.records
    }

    /// Returns the records of all patients with both genotype and phenotype
    pub fn complete_records(&self) -> Vec<&PatientRecord<T>> {
        self.records
            .iter()
            .filter(|record| record.is_complete())
            .collect()
    }

    pub fn genotype_categories(&self) -> &[Category] {
        &self.genotype_categories
    }

    pub fn phenotype_name(&self) -> &str {
        &self.phenotype_name
    }

    pub fn statistic_name(&self) -> &str {
        &self.statistic_name
    }

    pub fn statistic_result(&self) -> &StatisticResult {
        &self.statistic_result
    }

    pub fn pval(&self) -> f64 {
        self.statistic_result.pval()
    }

    pub fn statistic(&self) -> Option<f64> {
        self.statistic_result.statistic()
    }
}

/// Builds one record per patient and the phenotypes per genotype group
fn collect_records<G, T, F>(
    cohort: &Cohort,
    genotype: &G,
    phenotype: F,
) -> (Vec<PatientRecord<T>>, Vec<Vec<T>>)
where
    G: Classifier + ?Sized,
    T: Clone,
    F: Fn(&Patient) -> Option<T>,
{
    let genotypes = assign_genotypes(cohort, genotype);
    let mut groups: Vec<Vec<T>> = vec![Vec::new(); genotype.n_categories()];
    let records = cohort
        .all_patients()
        .iter()
        .zip(genotypes)
        .map(|(patient, genotype)| {
            let value = phenotype(patient);
            let group = genotype.and_then(|g| groups.get_mut(g));
            if let (Some(group), Some(value)) = (group, &value) {
                group.push(value.clone());
            }
            PatientRecord {
                patient_id: patient.label().to_string(),
                genotype,
                phenotype: value,
            }
        })
        .collect();
    (records, groups)
}

/// Compares a numerical phenotype score between two genotype groups
///
/// Patients without a finite score are left out of the test.
///
/// # Examples
///
/// ```
/// use phenocorr::analysis::PhenotypeScoreAnalysis;
/// use phenocorr::classifier::genotype::SexClassifier;
/// use phenocorr::classifier::scorer::MeasurementPhenotypeScorer;
/// use phenocorr::model::{Cohort, Measurement, Patient, Sex};
/// use phenocorr::stats::MannWhitneyU;
///
/// let height = |v: f64| vec![Measurement::new("LOINC:8302-2", "Body height", v, "cm")];
/// let cohort = Cohort::new(vec![
///     Patient::new("A", Sex::Female).with_measurements(height(150.0)),
///     Patient::new("B", Sex::Female).with_measurements(height(155.0)),
///     Patient::new("C", Sex::Female).with_measurements(height(160.0)),
///     Patient::new("D", Sex::Male).with_measurements(height(170.0)),
///     Patient::new("E", Sex::Male).with_measurements(height(175.0)),
///     Patient::new("F", Sex::Male).with_measurements(height(180.0)),
///     Patient::new("G", Sex::Male),
/// ]);
///
/// let analysis = PhenotypeScoreAnalysis::new(MannWhitneyU);
/// let scorer = MeasurementPhenotypeScorer::new("LOINC:8302-2", "Body height");
/// let result = analysis
///     .compare_genotype_vs_phenotype_score(&cohort, &SexClassifier::default(), &scorer)
///     .unwrap();
///
/// assert!((result.pval() - 0.1).abs() < 1e-12);
/// assert_eq!(result.records().len(), 7);
/// assert_eq!(result.complete_records().len(), 6);
/// ```
#[derive(Debug)]
pub struct PhenotypeScoreAnalysis {
    score_statistic: Box<dyn ScoreStatistic>,
}

impl PhenotypeScoreAnalysis {
    pub fn new<S: ScoreStatistic + 'static>(score_statistic: S) -> Self {
        Self {
            score_statistic: Box::new(score_statistic),
        }
    }

    /// Runs the analysis
    ///
    /// # Errors
    ///
    /// - [`GpcError::InvalidInput`] if the genotype classifier does not have
    ///   exactly two categories
    /// - any error of the score statistic
    pub fn compare_genotype_vs_phenotype_score<G, S>(
        &self,
        cohort: &Cohort,
        genotype: &G,
        scorer: &S,
    ) -> GpcResult<MonoPhenotypeAnalysisResult<f64>>
    where
        G: Classifier + ?Sized,
        S: PhenotypeScorer + ?Sized,
    {
        if genotype.n_categories() != 2 {
            return Err(GpcError::InvalidInput(format!(
                "{} compares two genotype groups, {} has {}",
                self.score_statistic.name(),
                genotype.name(),
                genotype.n_categories()
            )));
        }
        let (records, groups) = collect_records(cohort, genotype, |patient| {
            Some(scorer.score(patient)).filter(|score| score.is_finite())
        });
        let statistic_result = self.score_statistic.compute_pval(&groups[0], &groups[1])?;
        info!(
            "{} of {}: p = {}",
            self.score_statistic.name(),
            scorer.name(),
            statistic_result.pval()
        );
        Ok(MonoPhenotypeAnalysisResult {
            records,
            genotype_categories: genotype.categories().to_vec(),
            phenotype_name: scorer.name().to_string(),
            statistic_name: self.score_statistic.name().to_string(),
            statistic_result,
        })
    }
}

/// Compares the survival of two or more genotype groups
///
/// Patients whose survival cannot be determined are left out of the test.
#[derive(Debug)]
pub struct SurvivalAnalysis {
    survival_statistic: Box<dyn SurvivalStatistic>,
}

impl SurvivalAnalysis {
    pub fn new<S: SurvivalStatistic + 'static>(survival_statistic: S) -> Self {
        Self {
            survival_statistic: Box::new(survival_statistic),
        }
    }

    /// Runs the analysis
    ///
    /// # Errors
    ///
    /// - [`GpcError::InvalidInput`] if the genotype classifier has less than two categories
    /// - any error of the survival statistic
    pub fn compare_genotype_vs_survival<G, E>(
        &self,
        cohort: &Cohort,
        genotype: &G,
        endpoint: &E,
    ) -> GpcResult<MonoPhenotypeAnalysisResult<Survival>>
    where
        G: Classifier + ?Sized,
        E: Endpoint + ?Sized,
    {
        check_genotype_classifier(genotype, 2)?;
        let (records, groups) =
            collect_records(cohort, genotype, |patient| endpoint.compute_survival(patient));
        let statistic_result = self.survival_statistic.compute_pval(&groups)?;
        info!(
            "{} of {}: p = {}",
            self.survival_statistic.name(),
            endpoint.name(),
            statistic_result.pval()
        );
        Ok(MonoPhenotypeAnalysisResult {
            records,
            genotype_categories: genotype.categories().to_vec(),
            phenotype_name: endpoint.name().to_string(),
            statistic_name: self.survival_statistic.name().to_string(),
            statistic_result,
        })
    }
}
