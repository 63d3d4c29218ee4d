//! HPO term identifiers and sets of identifiers
//!
//! The crate does not model full HPO terms. All structural information
//! (names, ancestors, descendants) is provided by an
//! [`OntologyService`](crate::ontology::OntologyService).

mod group;
mod hpotermid;

pub use group::{HpoGroup, HpoTermIds};
pub use hpotermid::HpoTermId;
