//! Fixtures shared by the unit tests
//!
//! The toy ontology is a small excerpt of HPO:
//!
//! ```text
//! All (1)
//! └── Phenotypic abnormality (118)
//!     ├── Abnormality of the nervous system (707)
//!     │   └── Abnormal nervous system physiology (12638)
//!     │       ├── Seizure (1250)
//!     │       │   └── Focal-onset seizure (7359)
//!     │       │       └── Focal clonic seizure (2266)
//!     │       └── Ataxia (1251)
//!     ├── Abnormality of head or neck (152)
//!     │   └── Abnormality of the head (234)
//!     │       └── Microcephaly (252)
//!     ├── Abnormality of the eye (478)
//!     │   └── Visual impairment (505)
//!     └── Abnormality of the digestive system (25031)
//!         └── Constipation (2019)
//! ```
//!
//! The toy cohort has 10 patients. P1-P5 carry a missense variant, P6-P9 a
//! frameshift variant and P10 carries both.

use crate::classifier::genotype::MonoallelicClassifier;
use crate::model::{
    Age, Cohort, Disease, Genotype, Measurement, Patient, Phenotype, Region, Sex,
    TranscriptAnnotation, Variant, VariantClass, VariantCoordinates, VariantEffect, VariantInfo,
    VitalStatus,
};
use crate::predicate::VariantEffectPredicate;
use crate::Ontology;

pub const TX_ID: &str = "NM_013275.6";
pub const GENE: &str = "ANKRD11";
pub const MISSENSE_KEY: &str = "16_1000_1000_C_T";
pub const FRAMESHIFT_KEY: &str = "16_2001_2002_CA_C";
pub const KBGS: &str = "OMIM:148050";
pub const LOINC_HEIGHT: &str = "LOINC:8302-2";

pub fn toy_ontology() -> Ontology {
    let terms = [
        (1u32, "All", None),
        (118, "Phenotypic abnormality", Some(1u32)),
        (707, "Abnormality of the nervous system", Some(118)),
        (12638, "Abnormal nervous system physiology", Some(707)),
        (1250, "Seizure", Some(12638)),
        (7359, "Focal-onset seizure", Some(1250)),
        (2266, "Focal clonic seizure", Some(7359)),
        (1251, "Ataxia", Some(12638)),
        (152, "Abnormality of head or neck", Some(118)),
        (234, "Abnormality of the head", Some(152)),
        (252, "Microcephaly", Some(234)),
        (478, "Abnormality of the eye", Some(118)),
        (505, "Visual impairment", Some(478)),
        (25031, "Abnormality of the digestive system", Some(118)),
        (2019, "Constipation", Some(25031)),
    ];
    let mut ontology = Ontology::default();
    for (id, name, _) in &terms {
        ontology.insert_term((*name).to_string(), *id);
    }
    for (id, _, parent) in &terms {
        if let Some(parent) = parent {
            ontology.add_parent(*parent, *id).unwrap();
        }
    }
    ontology.create_cache();
    ontology
}

pub fn missense(sample: &str, genotype: Genotype) -> Variant {
    Variant::new(
        VariantInfo::Precise(VariantCoordinates::new("16", 999, 1000, "C", "T", 0)),
        VariantClass::Snv,
        vec![
            TranscriptAnnotation::new(GENE, TX_ID, true, &[VariantEffect::MissenseVariant])
                .with_hgvs_cdna("NM_013275.6:c.7607G>A")
                .with_exons(&[9])
                .with_protein("NP_037407.4", Region::new(2536, 2536)),
            TranscriptAnnotation::new(
                GENE,
                "NM_001256182.2",
                false,
                &[VariantEffect::MissenseVariant],
            )
            .with_exons(&[8]),
        ],
    )
    .with_genotype(sample, genotype)
}

pub fn frameshift(sample: &str, genotype: Genotype) -> Variant {
    Variant::new(
        VariantInfo::Precise(VariantCoordinates::new("16", 2000, 2002, "CA", "C", -1)),
        VariantClass::Del,
        vec![
            TranscriptAnnotation::new(GENE, TX_ID, true, &[VariantEffect::FrameshiftVariant])
                .with_hgvs_cdna("NM_013275.6:c.1903del")
                .with_exons(&[9])
                .with_protein("NP_037407.4", Region::new(635, 635)),
        ],
    )
    .with_genotype(sample, genotype)
}

/// Phenotype summary, `+` observed, `-` excluded:
///
/// | patient | variant | 1250 family | 252 | 1251 |
/// |---------|---------|-------------|-----|------|
/// | P1 | mis | +2266 | - | + |
/// | P2 | mis | +7359 | | |
/// | P3 | mis | +1250 | | |
/// | P4 | mis | +1250 | | |
/// | P5 | mis | -1250 | | |
/// | P6 | fs | -1250 | + | |
/// | P7 | fs | -1250 | + | |
/// | P8 | fs | -1250 | + | |
/// | P9 | fs | +1250 | | |
/// | P10 | mis + fs | | | |
pub fn toy_cohort() -> Cohort {
    let years = Age::postnatal_years;
    let patient = |i: usize, sex: Sex| Patient::new(&format!("P{i}"), sex);
    let kbgs = || Disease::new(KBGS, "KBG syndrome", true);
    let height = |v: f64| vec![Measurement::new(LOINC_HEIGHT, "Body height", v, "cm")];

    let patients = vec![
        patient(1, Sex::Female)
            .with_age(years(10.0))
            .with_vital_status(VitalStatus::alive())
            .with_phenotypes(vec![
                Phenotype::observed(2266u32).with_onset(years(1.0)),
                Phenotype::excluded(252u32),
                Phenotype::observed(1251u32),
            ])
            .with_diseases(vec![kbgs().with_onset(years(2.0))])
            .with_measurements(height(120.0))
            .with_variants(vec![missense("P1", Genotype::Heterozygous)]),
        patient(2, Sex::Male)
            .with_age(years(6.0))
            .with_vital_status(VitalStatus::alive())
            .with_phenotypes(vec![Phenotype::observed(7359u32).with_onset(years(2.0))])
            .with_diseases(vec![kbgs().with_onset(years(3.0))])
            .with_measurements(height(110.0))
            .with_variants(vec![missense("P2", Genotype::Heterozygous)]),
        patient(3, Sex::Female)
            .with_age(years(5.0))
            .with_vital_status(VitalStatus::deceased(Some(years(5.0))))
            .with_phenotypes(vec![Phenotype::observed(1250u32).with_onset(years(0.5))])
            .with_diseases(vec![kbgs()])
            .with_measurements(height(100.0))
            .with_variants(vec![missense("P3", Genotype::Heterozygous)]),
        patient(4, Sex::Male)
            .with_age(years(8.0))
            .with_vital_status(VitalStatus::alive())
            .with_phenotypes(vec![Phenotype::observed(1250u32).with_onset(years(4.0))])
            .with_diseases(vec![kbgs()])
            .with_measurements(height(115.0))
            .with_variants(vec![missense("P4", Genotype::Heterozygous)]),
        patient(5, Sex::Unknown)
            .with_age(years(4.0))
            .with_phenotypes(vec![Phenotype::excluded(1250u32)])
            .with_measurements(height(105.0))
            .with_variants(vec![missense("P5", Genotype::Heterozygous)]),
        patient(6, Sex::Female)
            .with_age(years(9.0))
            .with_vital_status(VitalStatus::alive())
            .with_phenotypes(vec![
                Phenotype::excluded(1250u32),
                Phenotype::observed(252u32).with_onset(Age::gestational(30, 0)),
            ])
            .with_diseases(vec![kbgs()])
            .with_measurements(height(125.0))
            .with_variants(vec![frameshift("P6", Genotype::Heterozygous)]),
        patient(7, Sex::Male)
            .with_age(years(3.0))
            .with_vital_status(VitalStatus::deceased(Some(years(3.0))))
            .with_phenotypes(vec![
                Phenotype::excluded(1250u32),
                Phenotype::observed(252u32),
            ])
            .with_diseases(vec![kbgs()])
            .with_measurements(height(95.0))
            .with_variants(vec![frameshift("P7", Genotype::Heterozygous)]),
        patient(8, Sex::Female)
            .with_age(years(12.0))
            .with_vital_status(VitalStatus::alive())
            .with_phenotypes(vec![
                Phenotype::excluded(1250u32),
                Phenotype::observed(252u32),
            ])
            .with_diseases(vec![Disease::new(KBGS, "KBG syndrome", false)])
            .with_measurements(height(140.0))
            .with_variants(vec![frameshift("P8", Genotype::Heterozygous)]),
        patient(9, Sex::Male)
            .with_age(years(7.0))
            .with_vital_status(VitalStatus::deceased(None))
            .with_phenotypes(vec![Phenotype::observed(1250u32).with_onset(years(6.0))])
            .with_diseases(vec![kbgs()])
            .with_variants(vec![frameshift("P9", Genotype::Heterozygous)]),
        patient(10, Sex::Female)
            .with_age(years(2.0))
            .with_variants(vec![
                missense("P10", Genotype::Heterozygous),
                frameshift("P10", Genotype::Heterozygous),
            ]),
    ];
    Cohort::new(patients)
}

/// Missense (P1-P5) vs. frameshift (P6-P9), P10 is not assigned
pub fn missense_vs_frameshift() -> MonoallelicClassifier {
    MonoallelicClassifier::new(
        VariantEffectPredicate::new(VariantEffect::MissenseVariant, TX_ID),
        VariantEffectPredicate::new(VariantEffect::FrameshiftVariant, TX_ID),
        "Missense",
        "Frameshift",
    )
}
