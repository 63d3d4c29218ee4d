//! Runs all analyses on a small synthetic cohort
//!
//! ```text
//! cargo run --example cohort_analysis [config.json]
//! ```
//!
//! The optional argument is a JSON file with an `AnalysisConfig`.
use std::fs;

use phenocorr::analysis::{
    configure_hpo_term_analysis, configure_phenotype_score_analysis,
    prepare_classifiers_for_terms_of_interest, AnalysisConfig, PValueKind, SurvivalAnalysis,
};
use phenocorr::classifier::endpoint::DeathEndpoint;
use phenocorr::classifier::genotype::MonoallelicClassifier;
use phenocorr::classifier::scorer::MeasurementPhenotypeScorer;
use phenocorr::model::{
    Age, Cohort, Genotype, Measurement, Patient, Phenotype, Sex, TranscriptAnnotation, Variant,
    VariantClass, VariantCoordinates, VariantEffect, VariantInfo, VitalStatus,
};
use phenocorr::predicate::VariantEffectPredicate;
use phenocorr::stats::LogRankTest;
use phenocorr::{GpcResult, Ontology, OntologyService};
use simple_logger::SimpleLogger;

const TX_ID: &str = "NM_013275.6";
const HEIGHT: &str = "LOINC:8302-2";

fn ontology() -> GpcResult<Ontology> {
    let terms = [
        (1u32, "All", 0u32),
        (118, "Phenotypic abnormality", 1),
        (707, "Abnormality of the nervous system", 118),
        (1250, "Seizure", 707),
        (7359, "Focal-onset seizure", 1250),
        (1249, "Intellectual disability", 707),
        (152, "Abnormality of head or neck", 118),
        (252, "Microcephaly", 152),
        (2019, "Constipation", 118),
    ];
    let mut ontology = Ontology::default();
    for (id, name, _) in &terms {
        ontology.insert_term((*name).to_string(), *id);
    }
    for (id, _, parent) in terms.iter().skip(1) {
        ontology.add_parent(*parent, *id)?;
    }
    ontology.create_cache();
    Ok(ontology)
}

fn variant(sample: &str, effect: VariantEffect) -> Variant {
    let (coordinates, class) = match effect {
        VariantEffect::FrameshiftVariant => (
            VariantCoordinates::new("16", 2000, 2002, "CA", "C", -1),
            VariantClass::Del,
        ),
        _ => (
            VariantCoordinates::new("16", 999, 1000, "C", "T", 0),
            VariantClass::Snv,
        ),
    };
    Variant::new(
        VariantInfo::Precise(coordinates),
        class,
        vec![TranscriptAnnotation::new("ANKRD11", TX_ID, true, &[effect])],
    )
    .with_genotype(sample, Genotype::Heterozygous)
}

/// Missense carriers have more seizures, frameshift carriers more microcephaly
fn cohort() -> Cohort {
    let patients = (0..40u32)
        .map(|i| {
            let label = format!("patient-{i}");
            let is_missense = i % 2 == 0;
            let effect = if is_missense {
                VariantEffect::MissenseVariant
            } else {
                VariantEffect::FrameshiftVariant
            };
            let mut phenotypes = vec![Phenotype::observed(1249u32)];
            phenotypes.push(match (is_missense, i % 5) {
                (true, 0) | (false, 1 | 3) => Phenotype::excluded(1250u32),
                (true, 2) => Phenotype::observed(7359u32),
                (true, _) => Phenotype::observed(1250u32),
                (false, _) => Phenotype::unknown(1250u32),
            });
            if !is_missense && i % 3 != 0 {
                phenotypes.push(Phenotype::observed(252u32));
            } else if i % 4 == 0 {
                phenotypes.push(Phenotype::excluded(252u32));
            }
            if i % 7 == 0 {
                phenotypes.push(Phenotype::observed(2019u32));
            }
            let age = f64::from(3 + i % 11);
            let vital_status = if i % 6 == 1 || i % 9 == 0 {
                VitalStatus::deceased(Some(Age::postnatal_years(age)))
            } else {
                VitalStatus::alive()
            };
            let height = 100.0 + f64::from(i % 13) * 3.0 - if is_missense { 6.0 } else { 0.0 };
            let sex = if i % 3 == 0 { Sex::Female } else { Sex::Male };
            Patient::new(&label, sex)
                .with_age(Age::postnatal_years(age))
                .with_vital_status(vital_status)
                .with_phenotypes(phenotypes)
                .with_measurements(vec![Measurement::new(HEIGHT, "Body height", height, "cm")])
                .with_variants(vec![variant(&label, effect)])
        })
        .collect();
    Cohort::new(patients)
}

fn main() -> GpcResult<()> {
    SimpleLogger::new().env().init().unwrap();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            let json = fs::read_to_string(path).expect("config file must be readable");
            AnalysisConfig::from_json(&json)?
        }
        None => AnalysisConfig::default(),
    };

    let ontology = ontology()?;
    let cohort = Cohort::from_json(&cohort().to_json()?)?;
    let genotype = MonoallelicClassifier::new(
        VariantEffectPredicate::new(VariantEffect::MissenseVariant, TX_ID),
        VariantEffectPredicate::new(VariantEffect::FrameshiftVariant, TX_ID),
        "Missense",
        "Frameshift",
    );

    let phenotypes = prepare_classifiers_for_terms_of_interest(&cohort, &ontology, &config)?;
    let analysis = configure_hpo_term_analysis(&config, &ontology)?;
    let result = analysis.compare_genotype_vs_phenotypes(&cohort, &genotype, &phenotypes)?;

    println!(
        "### {} ({}, {}) ###",
        result.statistic_name(),
        result.mtc_filter_name(),
        result.mtc_name()
    );
    for (idx, key) in result.phenotypes().iter().enumerate() {
        let name = key
            .term_id()
            .and_then(|id| ontology.term_name(id))
            .unwrap_or_default();
        match result.mtc_filter_results()[idx].code() {
            Some(code) => println!("{key}\t{name}\tskipped ({code})"),
            None => println!(
                "{key}\t{name}\tp = {:.4}\tcorrected = {:.4}\tn = {}",
                result.pvals()[idx],
                result.corrected_pvals()[idx],
                result.n_usable()[idx]
            ),
        }
    }
    let significant = result.significant_phenotype_indices(config.mtc_alpha, PValueKind::Corrected);
    println!(
        "{} of {} tested terms are significant at {}\n",
        significant.len(),
        result.total_tests(),
        config.mtc_alpha
    );

    let score = configure_phenotype_score_analysis(&config)?
        .compare_genotype_vs_phenotype_score(
            &cohort,
            &genotype,
            &MeasurementPhenotypeScorer::new(HEIGHT, "Body height"),
        )?;
    println!(
        "### {} of {} ###\np = {:.4}\n",
        score.statistic_name(),
        score.phenotype_name(),
        score.pval()
    );

    let survival = SurvivalAnalysis::new(LogRankTest).compare_genotype_vs_survival(
        &cohort,
        &genotype,
        &DeathEndpoint,
    )?;
    println!(
        "### {} of {} ###\np = {:.4} ({} patients)",
        survival.statistic_name(),
        survival.phenotype_name(),
        survival.pval(),
        survival.complete_records().len()
    );
    Ok(())
}
