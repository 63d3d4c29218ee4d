use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use phenocorr::analysis::{
    configure_hpo_term_analysis, prepare_classifiers_for_terms_of_interest, AnalysisConfig,
};
use phenocorr::classifier::genotype::SexClassifier;
use phenocorr::classifier::phenotype::HpoClassifier;
use phenocorr::model::{Cohort, Patient, Phenotype, Sex};
use phenocorr::Ontology;

/// A balanced tree of terms below `Phenotypic abnormality`
fn ontology(n_branches: u32, depth: u32) -> (Ontology, Vec<u32>) {
    let mut ontology = Ontology::default();
    ontology.insert_term("All".to_string(), 1u32);
    ontology.insert_term("Phenotypic abnormality".to_string(), 118u32);
    ontology.add_parent(1u32, 118u32).unwrap();

    let mut leaves = Vec::new();
    let mut next_id = 1000u32;
    for _ in 0..n_branches {
        let mut parent = 118u32;
        for _ in 0..depth {
            ontology.insert_term(format!("Term {next_id}"), next_id);
            ontology.add_parent(parent, next_id).unwrap();
            parent = next_id;
            next_id += 1;
        }
        leaves.push(parent);
    }
    ontology.create_cache();
    (ontology, leaves)
}

fn cohort(leaves: &[u32], n_patients: u32) -> Cohort {
    let patients = (0..n_patients)
        .map(|i| {
            let sex = if i % 2 == 0 { Sex::Female } else { Sex::Male };
            let phenotypes = leaves
                .iter()
                .enumerate()
                .filter_map(|(j, leaf)| {
                    let j = u32::try_from(j).unwrap();
                    match (i + j) % 4 {
                        0 => Some(Phenotype::observed(*leaf)),
                        1 => Some(Phenotype::excluded(*leaf)),
                        2 if i % 3 == 0 => Some(Phenotype::observed(*leaf)),
                        _ => None,
                    }
                })
                .collect();
            Patient::new(&format!("patient-{i}"), sex).with_phenotypes(phenotypes)
        })
        .collect();
    Cohort::new(patients)
}

fn run(
    cohort: &Cohort,
    ontology: &Ontology,
    phenotypes: &[HpoClassifier],
    config: &AnalysisConfig,
) -> usize {
    configure_hpo_term_analysis(config, ontology)
        .unwrap()
        .compare_genotype_vs_phenotypes(cohort, &SexClassifier::default(), phenotypes)
        .unwrap()
        .total_tests()
}

fn hpo_term_analysis_benchmark(c: &mut Criterion) {
    let (ontology, leaves) = ontology(40, 4);
    let cohort = cohort(&leaves, 150);
    let serial = AnalysisConfig::default();
    let parallel = AnalysisConfig {
        parallel: true,
        ..AnalysisConfig::default()
    };
    let phenotypes =
        prepare_classifiers_for_terms_of_interest(&cohort, &ontology, &serial).unwrap();

    c.bench_function("hpo term analysis", |b| {
        b.iter(|| run(black_box(&cohort), &ontology, &phenotypes, &serial))
    });
    c.bench_function("hpo term analysis parallel", |b| {
        b.iter(|| run(black_box(&cohort), &ontology, &phenotypes, &parallel))
    });
}

criterion_group! {
    name = analysis;
    config = Criterion::default().sample_size(20).measurement_time(Duration::from_secs(10));
    targets = hpo_term_analysis_benchmark
}
criterion_main!(analysis);
