use crate::model::Variant;
use crate::predicate::VariantPredicate;

/// Matches if all inner predicates match
///
/// Evaluation stops at the first predicate that does not match.
/// An empty `AllOf` matches every variant.
#[derive(Debug)]
pub struct AllOf {
    predicates: Vec<Box<dyn VariantPredicate>>,
}

impl AllOf {
    pub fn new(predicates: Vec<Box<dyn VariantPredicate>>) -> Self {
        Self { predicates }
    }
}

impl VariantPredicate for AllOf {
    fn test(&self, variant: &Variant) -> bool {
        self.predicates.iter().all(|p| p.test(variant))
    }

    fn question(&self) -> String {
        join_questions(&self.predicates, " AND ")
    }
}

/// Matches if at least one inner predicate matches
///
/// Evaluation stops at the first predicate that matches.
/// An empty `AnyOf` never matches.
#[derive(Debug)]
pub struct AnyOf {
    predicates: Vec<Box<dyn VariantPredicate>>,
}

impl AnyOf {
    pub fn new(predicates: Vec<Box<dyn VariantPredicate>>) -> Self {
        Self { predicates }
    }
}

impl VariantPredicate for AnyOf {
    fn test(&self, variant: &Variant) -> bool {
        self.predicates.iter().any(|p| p.test(variant))
    }

    fn question(&self) -> String {
        join_questions(&self.predicates, " OR ")
    }
}

/// Inverts the inner predicate
#[derive(Debug)]
pub struct Not {
    inner: Box<dyn VariantPredicate>,
}

impl Not {
    pub fn new(inner: Box<dyn VariantPredicate>) -> Self {
        Self { inner }
    }
}

impl VariantPredicate for Not {
    fn test(&self, variant: &Variant) -> bool {
        !self.inner.test(variant)
    }

    fn question(&self) -> String {
        format!("NOT {}", self.inner.question())
    }
}

fn join_questions(predicates: &[Box<dyn VariantPredicate>], sep: &str) -> String {
    let questions: Vec<String> = predicates.iter().map(|p| p.question()).collect();
    format!("({})", questions.join(sep))
}

/// Combinators for all [`VariantPredicate`]s
///
/// # Examples
///
/// ```
/// use phenocorr::model::VariantClass;
/// use phenocorr::predicate::{VariantClassPredicate, VariantPredicate, VariantPredicateExt};
///
/// let not_snv = VariantClassPredicate::new(VariantClass::Snv).negate();
/// assert_eq!(not_snv.question(), "NOT variant class is SNV");
///
/// let indel = VariantClassPredicate::new(VariantClass::Del)
///     .or(VariantClassPredicate::new(VariantClass::Ins));
/// assert_eq!(indel.question(), "(variant class is DEL OR variant class is INS)");
/// ```
pub trait VariantPredicateExt: VariantPredicate + Sized + 'static {
    /// Matches if both `self` and `other` match
    fn and<P: VariantPredicate + 'static>(self, other: P) -> AllOf {
        AllOf::new(vec![Box::new(self), Box::new(other)])
    }

    /// Matches if `self` or `other` match
    fn or<P: VariantPredicate + 'static>(self, other: P) -> AnyOf {
        AnyOf::new(vec![Box::new(self), Box::new(other)])
    }

    /// Matches if `self` does not match
    fn negate(self) -> Not {
        Not::new(Box::new(self))
    }
}

impl<T: VariantPredicate + 'static> VariantPredicateExt for T {}
