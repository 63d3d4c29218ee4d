//! The cohort data consumed by the analyses
//!
//! All records are built once (usually by an ingestion pipeline that is not
//! part of this crate) and are read-only afterwards. The whole object graph
//! can be persisted as JSON via [`Cohort::to_json`] and [`Cohort::from_json`].

mod cohort;
mod effect;
mod patient;
mod variant;

pub use cohort::Cohort;
pub use effect::VariantEffect;
pub use patient::{
    Age, Disease, Measurement, ObservationStatus, Patient, Phenotype, Sex, Status, Timeline,
    VitalStatus, DAYS_IN_YEAR,
};
pub use variant::{
    Effects, Exons, Genotype, ImpreciseSvInfo, Region, TranscriptAnnotation, Variant,
    VariantClass, VariantCoordinates, VariantInfo,
};
