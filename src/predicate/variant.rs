use std::fmt::Display;

use crate::model::{Region, TranscriptAnnotation, Variant, VariantClass, VariantEffect};
use crate::predicate::VariantPredicate;

/// Tests if the variant has the effect on the transcript
#[derive(Debug, Clone)]
pub struct VariantEffectPredicate {
    effect: VariantEffect,
    tx_id: String,
}

impl VariantEffectPredicate {
    pub fn new(effect: VariantEffect, tx_id: &str) -> Self {
        Self {
            effect,
            tx_id: tx_id.to_string(),
        }
    }
}

impl VariantPredicate for VariantEffectPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.annotation(&self.tx_id)
            .map_or(false, |ann| ann.variant_effects().contains(&self.effect))
    }

    fn question(&self) -> String {
        format!("{} on {}", self.effect.name().to_uppercase(), self.tx_id)
    }
}

/// Tests if the variant has the given key, e.g. `X_12345_12345_C_G`
#[derive(Debug, Clone)]
pub struct VariantKeyPredicate {
    key: String,
}

impl VariantKeyPredicate {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
        }
    }
}

impl VariantPredicate for VariantKeyPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.variant_key() == self.key
    }

    fn question(&self) -> String {
        format!("variant has ID of {}", self.key)
    }
}

/// Tests if the variant affects a gene
///
/// Matches the gene of any transcript annotation, or the gene symbol or id of an imprecise SV
#[derive(Debug, Clone)]
pub struct GenePredicate {
    symbol: String,
}

impl GenePredicate {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
        }
    }
}

impl VariantPredicate for GenePredicate {
    fn test(&self, variant: &Variant) -> bool {
        if variant
            .annotations()
            .iter()
            .any(|ann| ann.gene_id() == self.symbol)
        {
            return true;
        }
        variant
            .variant_info()
            .sv_info()
            .map_or(false, |sv| {
                sv.gene_symbol() == self.symbol || sv.gene_id() == self.symbol
            })
    }

    fn question(&self) -> String {
        format!("affects {}", self.symbol)
    }
}

/// Tests if the variant is annotated for the transcript
#[derive(Debug, Clone)]
pub struct TranscriptPredicate {
    tx_id: String,
}

impl TranscriptPredicate {
    pub fn new(tx_id: &str) -> Self {
        Self {
            tx_id: tx_id.to_string(),
        }
    }
}

impl VariantPredicate for TranscriptPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.annotation(&self.tx_id).is_some()
    }

    fn question(&self) -> String {
        format!("affects {}", self.tx_id)
    }
}

/// Tests if the variant overlaps with the (1-based) exon of the transcript
#[derive(Debug, Clone)]
pub struct ExonPredicate {
    exon: u32,
    tx_id: String,
}

impl ExonPredicate {
    pub fn new(exon: u32, tx_id: &str) -> Self {
        Self {
            exon,
            tx_id: tx_id.to_string(),
        }
    }
}

impl VariantPredicate for ExonPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.annotation(&self.tx_id)
            .and_then(TranscriptAnnotation::affected_exons)
            .map_or(false, |exons| exons.contains(&self.exon))
    }

    fn question(&self) -> String {
        format!("overlaps with exon {} of {}", self.exon, self.tx_id)
    }
}

/// Tests if the protein effect of the variant overlaps with a region, e.g. a protein domain
#[derive(Debug, Clone)]
pub struct ProteinRegionPredicate {
    region: Region,
    tx_id: String,
}

impl ProteinRegionPredicate {
    pub fn new(region: Region, tx_id: &str) -> Self {
        Self {
            region,
            tx_id: tx_id.to_string(),
        }
    }
}

impl VariantPredicate for ProteinRegionPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.annotation(&self.tx_id)
            .and_then(TranscriptAnnotation::protein_effect_coordinates)
            .map_or(false, |coordinates| coordinates.overlaps_with(&self.region))
    }

    fn question(&self) -> String {
        format!(
            "overlaps with [{}, {}] region of the protein encoded by {}",
            self.region.start(),
            self.region.end(),
            self.tx_id
        )
    }
}

/// Tests the broad class of the variant
#[derive(Debug, Clone)]
pub struct VariantClassPredicate {
    class: VariantClass,
}

impl VariantClassPredicate {
    pub fn new(class: VariantClass) -> Self {
        Self { class }
    }
}

impl VariantPredicate for VariantClassPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.variant_class() == self.class
    }

    fn question(&self) -> String {
        format!("variant class is {}", self.class)
    }
}

/// Tests the structural type of an imprecise SV, e.g. `SO:1000029`
#[derive(Debug, Clone)]
pub struct StructuralTypePredicate {
    curie: String,
}

impl StructuralTypePredicate {
    pub fn new(curie: &str) -> Self {
        Self {
            curie: curie.to_string(),
        }
    }
}

impl VariantPredicate for StructuralTypePredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant
            .variant_info()
            .sv_info()
            .map_or(false, |sv| sv.structural_type() == self.curie)
    }

    fn question(&self) -> String {
        format!("structural type is {}", self.curie)
    }
}

/// Tests if the variant is an imprecise SV, without precise coordinates
#[derive(Debug, Clone, Copy, Default)]
pub struct LargeImpreciseSvPredicate;

impl VariantPredicate for LargeImpreciseSvPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant.variant_info().sv_info().is_some()
    }

    fn question(&self) -> String {
        "is large imprecise SV".to_string()
    }
}

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    fn compare(self, left: i64, right: i64) -> bool {
        match self {
            Comparison::Lt => left < right,
            Comparison::Le => left <= right,
            Comparison::Eq => left == right,
            Comparison::Ne => left != right,
            Comparison::Ge => left >= right,
            Comparison::Gt => left > right,
        }
    }
}

impl Display for Comparison {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Ge => ">=",
            Comparison::Gt => ">",
        };
        write!(f, "{s}")
    }
}

/// Compares the change length of a variant with a threshold
///
/// Imprecise SVs have no change length and never match.
///
/// ```
/// use phenocorr::model::{Variant, VariantClass, VariantCoordinates, VariantInfo};
/// use phenocorr::predicate::{ChangeLengthPredicate, Comparison, VariantPredicate};
///
/// let deletion = Variant::new(
///     VariantInfo::Precise(VariantCoordinates::new("1", 100, 130, "N", "<DEL>", -30)),
///     VariantClass::Del,
///     vec![],
/// );
/// assert!(ChangeLengthPredicate::new(Comparison::Le, -20).test(&deletion));
/// assert!(!ChangeLengthPredicate::new(Comparison::Gt, 0).test(&deletion));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ChangeLengthPredicate {
    operator: Comparison,
    threshold: i64,
}

impl ChangeLengthPredicate {
    pub fn new(operator: Comparison, threshold: i64) -> Self {
        Self {
            operator,
            threshold,
        }
    }
}

impl VariantPredicate for ChangeLengthPredicate {
    fn test(&self, variant: &Variant) -> bool {
        variant
            .variant_info()
            .coordinates()
            .map_or(false, |coordinates| {
                self.operator
                    .compare(coordinates.change_length(), self.threshold)
            })
    }

    fn question(&self) -> String {
        format!("change length {} {}", self.operator, self.threshold)
    }
}

/// Matches every variant
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl VariantPredicate for AlwaysTrue {
    fn test(&self, _variant: &Variant) -> bool {
        true
    }

    fn question(&self) -> String {
        "always true".to_string()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::{Genotype, ImpreciseSvInfo, VariantInfo};
    use crate::test_utils::{frameshift, missense, GENE, MISSENSE_KEY, TX_ID};

    fn sv() -> Variant {
        Variant::new(
            VariantInfo::Imprecise(ImpreciseSvInfo::new("SO:1000029", "HGNC:21316", GENE)),
            VariantClass::Del,
            vec![],
        )
    }

    #[test]
    fn effect() {
        let pred = VariantEffectPredicate::new(VariantEffect::MissenseVariant, TX_ID);
        assert!(pred.test(&missense("a", Genotype::Heterozygous)));
        assert!(!pred.test(&frameshift("a", Genotype::Heterozygous)));
        assert!(!VariantEffectPredicate::new(VariantEffect::MissenseVariant, "NM_1.1")
            .test(&missense("a", Genotype::Heterozygous)));
    }

    #[test]
    fn key_gene_transcript() {
        let variant = missense("a", Genotype::Heterozygous);
        assert!(VariantKeyPredicate::new(MISSENSE_KEY).test(&variant));
        assert!(!VariantKeyPredicate::new("1_1_1_A_C").test(&variant));
        assert!(GenePredicate::new(GENE).test(&variant));
        assert!(GenePredicate::new(GENE).test(&sv()));
        assert!(!GenePredicate::new("FBN1").test(&variant));
        assert!(TranscriptPredicate::new("NM_001256182.2").test(&variant));
        let deletion = frameshift("a", Genotype::Heterozygous);
        assert!(!TranscriptPredicate::new("NM_001256182.2").test(&deletion));
    }

    #[test]
    fn exon_and_protein() {
        let variant = missense("a", Genotype::Heterozygous);
        assert!(ExonPredicate::new(9, TX_ID).test(&variant));
        assert!(ExonPredicate::new(8, "NM_001256182.2").test(&variant));
        assert!(!ExonPredicate::new(8, TX_ID).test(&variant));

        assert!(ProteinRegionPredicate::new(Region::new(2500, 2600), TX_ID).test(&variant));
        assert!(!ProteinRegionPredicate::new(Region::new(1, 100), TX_ID).test(&variant));
        let other_transcript =
            ProteinRegionPredicate::new(Region::new(2500, 2600), "NM_001256182.2");
        assert!(!other_transcript.test(&variant));
    }

    #[test]
    fn structural() {
        assert!(LargeImpreciseSvPredicate.test(&sv()));
        assert!(!LargeImpreciseSvPredicate.test(&missense("a", Genotype::Heterozygous)));
        assert!(StructuralTypePredicate::new("SO:1000029").test(&sv()));
        assert!(!StructuralTypePredicate::new("SO:1000035").test(&sv()));
        assert!(VariantClassPredicate::new(VariantClass::Del).test(&sv()));
        assert!(!ChangeLengthPredicate::new(Comparison::Ne, 100).test(&sv()));
    }

    #[test]
    fn change_length() {
        let variant = frameshift("a", Genotype::Heterozygous);
        assert!(ChangeLengthPredicate::new(Comparison::Eq, -1).test(&variant));
        assert!(ChangeLengthPredicate::new(Comparison::Lt, 0).test(&variant));
        assert!(!ChangeLengthPredicate::new(Comparison::Ge, 0).test(&variant));
        assert_eq!(
            ChangeLengthPredicate::new(Comparison::Ge, 50).question(),
            "change length >= 50"
        );
    }

    #[test]
    fn questions() {
        assert_eq!(
            VariantEffectPredicate::new(VariantEffect::StopGained, TX_ID).question(),
            "STOP_GAINED on NM_013275.6"
        );
        assert_eq!(AlwaysTrue.question(), "always true");
    }
}
