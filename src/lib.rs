#![doc = include_str!("../README.md")]

use std::num::ParseIntError;
use thiserror::Error;

pub mod analysis;
pub mod classifier;
pub mod model;
pub mod ontology;
pub mod predicate;
pub mod stats;
pub mod term;

#[cfg(test)]
mod test_utils;

pub use ontology::{check_no_conflicting_terms, Ontology, OntologyService};
pub use term::{HpoGroup, HpoTermId};

/// Error type for all fallible operations of this crate
#[derive(Error, Debug)]
pub enum GpcError {
    /// The HPO term id is malformed or not part of the ontology
    #[error("invalid HPO term: {0}")]
    InvalidTerm(String),
    /// A query set contains a term together with one of its ancestors
    #[error("{term} and its ancestor {ancestor} must not be queried together")]
    ConflictingQuery {
        term: HpoTermId,
        ancestor: HpoTermId,
    },
    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The input of an analysis was rejected before any work started
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A contingency table has an empty row or column
    #[error("degenerate contingency table: {0}")]
    DegenerateTable(String),
    /// An exact computation exceeds the range of `f64`
    #[error("numeric overflow: {0}")]
    Overflow(String),
    /// Every candidate phenotype was removed by the MTC filter
    #[error("No phenotypes are left for the analysis after MTC filtering step")]
    NoTestablePhenotypes,
    /// A lookup by identifier failed
    #[error("{0} does not exist")]
    DoesNotExist(String),
    #[error("unable to parse Integer")]
    ParseIntError,
    /// A cohort or configuration could not be (de)serialized
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<ParseIntError> for GpcError {
    fn from(_: ParseIntError) -> Self {
        GpcError::ParseIntError
    }
}

/// Shortcut for `Result<T, GpcError>`
pub type GpcResult<T> = Result<T, GpcError>;
