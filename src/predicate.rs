//! Boolean tests on single [`Variant`]s
//!
//! Genotype classifiers decide which group a patient belongs to by counting
//! the alleles of variants that match a predicate. Predicates implement
//! [`VariantPredicate`] and can be combined with [`AllOf`], [`AnyOf`] and [`Not`],
//! or more conveniently with the methods of [`VariantPredicateExt`].
//!
//! # Examples
//!
//! ```
//! use phenocorr::model::VariantEffect;
//! use phenocorr::predicate::{ExonPredicate, VariantEffectPredicate, VariantPredicate, VariantPredicateExt};
//!
//! let missense_in_exon_9 = VariantEffectPredicate::new(VariantEffect::MissenseVariant, "NM_013275.6")
//!     .and(ExonPredicate::new(9, "NM_013275.6"));
//!
//! assert_eq!(
//!     missense_in_exon_9.question(),
//!     "(MISSENSE_VARIANT on NM_013275.6 AND overlaps with exon 9 of NM_013275.6)"
//! );
//! ```
use core::fmt::Debug;

use crate::model::Variant;

mod logic;
mod variant;

pub use logic::{AllOf, AnyOf, Not, VariantPredicateExt};
pub use variant::{
    AlwaysTrue, ChangeLengthPredicate, Comparison, ExonPredicate, GenePredicate,
    LargeImpreciseSvPredicate, ProteinRegionPredicate, StructuralTypePredicate,
    TranscriptPredicate, VariantClassPredicate, VariantEffectPredicate, VariantKeyPredicate,
};

/// A side-effect free test of a single variant
pub trait VariantPredicate: Debug + Send + Sync {
    /// Returns `true` if the variant matches
    fn test(&self, variant: &Variant) -> bool;

    /// A human readable description of what is tested
    fn question(&self) -> String;
}

impl<T: VariantPredicate + ?Sized> VariantPredicate for Box<T> {
    fn test(&self, variant: &Variant) -> bool {
        (**self).test(variant)
    }

    fn question(&self) -> String {
        (**self).question()
    }
}
