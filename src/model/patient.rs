use serde::{Deserialize, Serialize};

use crate::model::Variant;
use crate::HpoTermId;

/// Days per year, used to convert ages given in years
pub const DAYS_IN_YEAR: f64 = 365.25;

/// The biological sex of a patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sex {
    Female,
    Male,
    #[default]
    Unknown,
}

/// Whether an age is counted from conception or from birth
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeline {
    Gestational,
    Postnatal,
}

/// An age, stored as number of days
///
/// Gestational and postnatal ages share the same scale: a gestational
/// age is expressed as a negative number of days before birth, assuming
/// a term birth at 40 weeks.
///
/// ```
/// use phenocorr::model::Age;
///
/// assert_eq!(Age::postnatal_years(2.0).days(), 730.5);
/// assert!(Age::gestational(20, 0) < Age::postnatal_days(0.0));
/// assert!(Age::gestational(20, 0).is_gestational());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Age {
    days: f64,
    timeline: Timeline,
}

impl Age {
    /// Constructs a postnatal age from a number of days after birth
    pub fn postnatal_days(days: f64) -> Self {
        Self {
            days,
            timeline: Timeline::Postnatal,
        }
    }

    /// Constructs a postnatal age from a number of years after birth
    pub fn postnatal_years(years: f64) -> Self {
        Self::postnatal_days(years * DAYS_IN_YEAR)
    }

    /// Constructs a gestational age
    pub fn gestational(weeks: u32, days: u32) -> Self {
        let since_conception = f64::from(weeks * 7 + days);
        Self {
            days: since_conception - 280.0,
            timeline: Timeline::Gestational,
        }
    }

    /// The age in days, relative to birth
    pub fn days(&self) -> f64 {
        self.days
    }

    /// The age in years, relative to birth
    pub fn years(&self) -> f64 {
        self.days / DAYS_IN_YEAR
    }

    pub fn is_gestational(&self) -> bool {
        self.timeline == Timeline::Gestational
    }

    pub fn is_postnatal(&self) -> bool {
        self.timeline == Timeline::Postnatal
    }
}

/// Whether a patient is alive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Alive,
    Deceased,
    Unknown,
}

/// The vital status of a patient, with the age of death for deceased patients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VitalStatus {
    status: Status,
    age_of_death: Option<Age>,
}

impl VitalStatus {
    pub fn alive() -> Self {
        Self {
            status: Status::Alive,
            age_of_death: None,
        }
    }

    pub fn deceased(age_of_death: Option<Age>) -> Self {
        Self {
            status: Status::Deceased,
            age_of_death,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn age_of_death(&self) -> Option<&Age> {
        self.age_of_death.as_ref()
    }

    pub fn is_deceased(&self) -> bool {
        self.status == Status::Deceased
    }
}

/// Whether a phenotype was observed, explicitly excluded, or its status is unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationStatus {
    Observed,
    Excluded,
    Unknown,
}

/// A single phenotype observation of a patient
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phenotype {
    term_id: HpoTermId,
    status: ObservationStatus,
    onset: Option<Age>,
}

impl Phenotype {
    pub fn observed<I: Into<HpoTermId>>(term_id: I) -> Self {
        Self {
            term_id: term_id.into(),
            status: ObservationStatus::Observed,
            onset: None,
        }
    }

    pub fn excluded<I: Into<HpoTermId>>(term_id: I) -> Self {
        Self {
            term_id: term_id.into(),
            status: ObservationStatus::Excluded,
            onset: None,
        }
    }

    pub fn unknown<I: Into<HpoTermId>>(term_id: I) -> Self {
        Self {
            term_id: term_id.into(),
            status: ObservationStatus::Unknown,
            onset: None,
        }
    }

    /// Sets the age of onset
    #[must_use]
    pub fn with_onset(mut self, onset: Age) -> Self {
        self.onset = Some(onset);
        self
    }

    pub fn term_id(&self) -> HpoTermId {
        self.term_id
    }

    pub fn status(&self) -> ObservationStatus {
        self.status
    }

    pub fn is_observed(&self) -> bool {
        self.status == ObservationStatus::Observed
    }

    pub fn is_excluded(&self) -> bool {
        self.status == ObservationStatus::Excluded
    }

    pub fn onset(&self) -> Option<&Age> {
        self.onset.as_ref()
    }
}

/// A diagnosis, e.g. `OMIM:148050`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disease {
    id: String,
    name: String,
    is_observed: bool,
    onset: Option<Age>,
}

impl Disease {
    pub fn new(id: &str, name: &str, is_observed: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            is_observed,
            onset: None,
        }
    }

    #[must_use]
    pub fn with_onset(mut self, onset: Age) -> Self {
        self.onset = Some(onset);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_observed(&self) -> bool {
        self.is_observed
    }

    pub fn onset(&self) -> Option<&Age> {
        self.onset.as_ref()
    }
}

/// A quantitative measurement, e.g. a lab value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    test_id: String,
    test_name: String,
    value: f64,
    unit: String,
}

impl Measurement {
    /// `test_id` is the curie of the measured assay, e.g. `LOINC:2986-8`
    pub fn new(test_id: &str, test_name: &str, value: f64, unit: &str) -> Self {
        Self {
            test_id: test_id.to_string(),
            test_name: test_name.to_string(),
            value,
            unit: unit.to_string(),
        }
    }

    pub fn test_id(&self) -> &str {
        &self.test_id
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }
}

/// A single member of a [`Cohort`](crate::model::Cohort)
///
/// Patients are constructed once and are read-only afterwards.
///
/// # Examples
///
/// ```
/// use phenocorr::model::{Age, Patient, Phenotype, Sex, VitalStatus};
///
/// let patient = Patient::new("Patient 1", Sex::Female)
///     .with_age(Age::postnatal_years(12.0))
///     .with_vital_status(VitalStatus::alive())
///     .with_phenotypes(vec![
///         Phenotype::observed(1250u32),
///         Phenotype::excluded(1251u32),
///     ]);
///
/// assert_eq!(patient.label(), "Patient 1");
/// assert_eq!(patient.present_phenotypes().count(), 1);
/// assert_eq!(patient.excluded_phenotypes().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    label: String,
    sex: Sex,
    age: Option<Age>,
    vital_status: Option<VitalStatus>,
    phenotypes: Vec<Phenotype>,
    diseases: Vec<Disease>,
    measurements: Vec<Measurement>,
    variants: Vec<Variant>,
}

impl Patient {
    /// Constructs a new patient without any observations
    pub fn new(label: &str, sex: Sex) -> Self {
        Self {
            label: label.to_string(),
            sex,
            age: None,
            vital_status: None,
            phenotypes: Vec::new(),
            diseases: Vec::new(),
            measurements: Vec::new(),
            variants: Vec::new(),
        }
    }

    /// Sets the age at the last encounter
    #[must_use]
    pub fn with_age(mut self, age: Age) -> Self {
        self.age = Some(age);
        self
    }

    #[must_use]
    pub fn with_vital_status(mut self, vital_status: VitalStatus) -> Self {
        self.vital_status = Some(vital_status);
        self
    }

    #[must_use]
    pub fn with_phenotypes(mut self, phenotypes: Vec<Phenotype>) -> Self {
        self.phenotypes = phenotypes;
        self
    }

    #[must_use]
    pub fn with_diseases(mut self, diseases: Vec<Disease>) -> Self {
        self.diseases = diseases;
        self
    }

    #[must_use]
    pub fn with_measurements(mut self, measurements: Vec<Measurement>) -> Self {
        self.measurements = measurements;
        self
    }

    #[must_use]
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    /// The unique label of the patient, also used as sample id in genotype calls
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    /// The age at the last encounter
    pub fn age(&self) -> Option<&Age> {
        self.age.as_ref()
    }

    pub fn vital_status(&self) -> Option<&VitalStatus> {
        self.vital_status.as_ref()
    }

    pub fn phenotypes(&self) -> &[Phenotype] {
        &self.phenotypes
    }

    /// Iterates all observed phenotypes
    pub fn present_phenotypes(&self) -> impl Iterator<Item = &Phenotype> {
        self.phenotypes.iter().filter(|p| p.is_observed())
    }

    /// Iterates all explicitly excluded phenotypes
    pub fn excluded_phenotypes(&self) -> impl Iterator<Item = &Phenotype> {
        self.phenotypes.iter().filter(|p| p.is_excluded())
    }

    pub fn diseases(&self) -> &[Disease] {
        &self.diseases
    }

    /// Iterates all diagnoses that were confirmed in the patient
    pub fn present_diseases(&self) -> impl Iterator<Item = &Disease> {
        self.diseases.iter().filter(|d| d.is_observed())
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Returns the first measurement of the given test
    pub fn measurement(&self, test_id: &str) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.test_id() == test_id)
    }

    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }
}
