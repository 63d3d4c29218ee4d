use std::collections::BTreeMap;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::model::VariantEffect;

/// Exon numbers affected by a variant on a transcript
pub type Exons = SmallVec<[u32; 4]>;

/// Variant effects on a single transcript
pub type Effects = SmallVec<[VariantEffect; 4]>;

/// The broad class of a variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VariantClass {
    /// Single nucleotide variant
    Snv,
    /// Multi nucleotide variant
    Mnv,
    /// Deletion
    Del,
    /// Duplication
    Dup,
    /// Insertion
    Ins,
    /// Inversion
    Inv,
    /// Breakend
    Bnd,
    /// Any other structural variant
    Sv,
}

impl Display for VariantClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VariantClass::Snv => "SNV",
            VariantClass::Mnv => "MNV",
            VariantClass::Del => "DEL",
            VariantClass::Dup => "DUP",
            VariantClass::Ins => "INS",
            VariantClass::Inv => "INV",
            VariantClass::Bnd => "BND",
            VariantClass::Sv => "SV",
        };
        write!(f, "{s}")
    }
}

/// The genotype call of a variant in a single sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Genotype {
    HomozygousReference,
    Heterozygous,
    HomozygousAlternate,
    Hemizygous,
    NoCall,
}

impl Genotype {
    /// Returns the number of alternate alleles of the call
    ///
    /// ```
    /// use phenocorr::model::Genotype;
    ///
    /// assert_eq!(Genotype::Heterozygous.alt_allele_count(), 1);
    /// assert_eq!(Genotype::HomozygousAlternate.alt_allele_count(), 2);
    /// assert_eq!(Genotype::Hemizygous.alt_allele_count(), 1);
    /// assert_eq!(Genotype::NoCall.alt_allele_count(), 0);
    /// ```
    pub fn alt_allele_count(&self) -> u32 {
        match self {
            Genotype::Heterozygous | Genotype::Hemizygous => 1,
            Genotype::HomozygousAlternate => 2,
            Genotype::HomozygousReference | Genotype::NoCall => 0,
        }
    }
}

/// A 1-based, closed interval, used for protein coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    start: u32,
    end: u32,
}

impl Region {
    /// Constructs a new region, swapping `start` and `end` if needed
    pub fn new(start: u32, end: u32) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Returns `true` if both regions share at least one position
    pub fn overlaps_with(&self, other: &Region) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Precise genomic coordinates of a variant
///
/// `start` is 0-based and exclusive, `end` is inclusive, so that
/// `end - start` is the length of the reference allele.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCoordinates {
    contig: String,
    start: u64,
    end: u64,
    reference: String,
    alternate: String,
    change_length: i64,
}

impl VariantCoordinates {
    /// Constructs new coordinates
    ///
    /// `change_length` is the difference in length between alternate and
    /// reference allele, or the SV length for symbolic alleles.
    pub fn new(
        contig: &str,
        start: u64,
        end: u64,
        reference: &str,
        alternate: &str,
        change_length: i64,
    ) -> Self {
        Self {
            contig: contig.to_string(),
            start,
            end,
            reference: reference.to_string(),
            alternate: alternate.to_string(),
            change_length,
        }
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn alternate(&self) -> &str {
        &self.alternate
    }

    pub fn change_length(&self) -> i64 {
        self.change_length
    }

    /// Returns `true` if the alternate allele is symbolic, e.g. `<DEL>`
    pub fn is_structural(&self) -> bool {
        self.alternate.starts_with('<') && self.alternate.ends_with('>')
    }

    /// Returns the key of the variant, e.g. `X_12345_12345_C_G`
    ///
    /// Structural variants use the symbolic allele without brackets, and no reference allele.
    pub fn variant_key(&self) -> String {
        if self.is_structural() {
            format!(
                "{}_{}_{}_{}",
                self.contig,
                self.start + 1,
                self.end,
                self.alternate.trim_matches(|c| c == '<' || c == '>')
            )
        } else {
            format!(
                "{}_{}_{}_{}_{}",
                self.contig,
                self.start + 1,
                self.end,
                self.reference,
                self.alternate
            )
        }
    }
}

/// An imprecise structural variant, e.g. a deletion found by a diagnostic array
///
/// The breakpoints are unknown, only the affected gene and the SV type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpreciseSvInfo {
    structural_type: String,
    gene_id: String,
    gene_symbol: String,
}

impl ImpreciseSvInfo {
    /// `structural_type` is an SO curie, e.g. `SO:1000029` (chromosomal deletion)
    pub fn new(structural_type: &str, gene_id: &str, gene_symbol: &str) -> Self {
        Self {
            structural_type: structural_type.to_string(),
            gene_id: gene_id.to_string(),
            gene_symbol: gene_symbol.to_string(),
        }
    }

    pub fn structural_type(&self) -> &str {
        &self.structural_type
    }

    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }

    pub fn gene_symbol(&self) -> &str {
        &self.gene_symbol
    }

    /// Returns the key of the variant, e.g. `SO:1000029_HGNC:21316`
    pub fn variant_key(&self) -> String {
        format!("{}_{}", self.structural_type, self.gene_id)
    }
}

/// The location of a variant
///
/// A variant has either precise coordinates or imprecise SV information, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantInfo {
    Precise(VariantCoordinates),
    Imprecise(ImpreciseSvInfo),
}

impl VariantInfo {
    /// Returns the unique key of the variant
    pub fn variant_key(&self) -> String {
        match self {
            VariantInfo::Precise(coordinates) => coordinates.variant_key(),
            VariantInfo::Imprecise(sv) => sv.variant_key(),
        }
    }

    /// Returns `true` if the variant is a structural variant
    pub fn is_structural(&self) -> bool {
        match self {
            VariantInfo::Precise(coordinates) => coordinates.is_structural(),
            VariantInfo::Imprecise(_) => true,
        }
    }

    pub fn coordinates(&self) -> Option<&VariantCoordinates> {
        match self {
            VariantInfo::Precise(coordinates) => Some(coordinates),
            VariantInfo::Imprecise(_) => None,
        }
    }

    pub fn sv_info(&self) -> Option<&ImpreciseSvInfo> {
        match self {
            VariantInfo::Precise(_) => None,
            VariantInfo::Imprecise(sv) => Some(sv),
        }
    }
}

/// The functional annotation of a variant on a single transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptAnnotation {
    gene_id: String,
    transcript_id: String,
    hgvs_cdna: Option<String>,
    is_preferred: bool,
    variant_effects: Effects,
    affected_exons: Option<Exons>,
    protein_id: Option<String>,
    protein_effect_coordinates: Option<Region>,
}

impl TranscriptAnnotation {
    /// Constructs a new annotation without HGVS or protein information
    pub fn new(
        gene_id: &str,
        transcript_id: &str,
        is_preferred: bool,
        effects: &[VariantEffect],
    ) -> Self {
        Self {
            gene_id: gene_id.to_string(),
            transcript_id: transcript_id.to_string(),
            hgvs_cdna: None,
            is_preferred,
            variant_effects: effects.iter().copied().collect(),
            affected_exons: None,
            protein_id: None,
            protein_effect_coordinates: None,
        }
    }

    /// Sets the HGVS cDNA notation, e.g. `NM_000138.5:c.1A>G`
    #[must_use]
    pub fn with_hgvs_cdna(mut self, hgvs: &str) -> Self {
        self.hgvs_cdna = Some(hgvs.to_string());
        self
    }

    /// Sets the (1-based) exon numbers overlapped by the variant
    #[must_use]
    pub fn with_exons(mut self, exons: &[u32]) -> Self {
        self.affected_exons = Some(exons.iter().copied().collect());
        self
    }

    /// Sets the protein and the affected protein residues
    #[must_use]
    pub fn with_protein(mut self, protein_id: &str, region: Region) -> Self {
        self.protein_id = Some(protein_id.to_string());
        self.protein_effect_coordinates = Some(region);
        self
    }

    /// The gene symbol, e.g. `FBN1`
    pub fn gene_id(&self) -> &str {
        &self.gene_id
    }

    pub fn transcript_id(&self) -> &str {
        &self.transcript_id
    }

    pub fn hgvs_cdna(&self) -> Option<&str> {
        self.hgvs_cdna.as_deref()
    }

    /// Returns `true` if the transcript is the preferred (MANE) transcript of the gene
    pub fn is_preferred(&self) -> bool {
        self.is_preferred
    }

    pub fn variant_effects(&self) -> &[VariantEffect] {
        &self.variant_effects
    }

    /// Returns the affected exons, or `None` if unknown (e.g. intergenic variants)
    pub fn affected_exons(&self) -> Option<&[u32]> {
        self.affected_exons.as_deref()
    }

    pub fn protein_id(&self) -> Option<&str> {
        self.protein_id.as_deref()
    }

    pub fn protein_effect_coordinates(&self) -> Option<&Region> {
        self.protein_effect_coordinates.as_ref()
    }
}

/// A variant call, its annotations and the genotypes of all samples
///
/// # Examples
///
/// ```
/// use phenocorr::model::{
///     Genotype, TranscriptAnnotation, Variant, VariantClass, VariantCoordinates,
///     VariantEffect, VariantInfo,
/// };
///
/// let variant = Variant::new(
///     VariantInfo::Precise(VariantCoordinates::new("16", 999, 1000, "C", "T", 0)),
///     VariantClass::Snv,
///     vec![TranscriptAnnotation::new("ANKRD11", "NM_013275.6", true, &[VariantEffect::MissenseVariant])],
/// )
/// .with_genotype("Patient 1", Genotype::Heterozygous);
///
/// assert_eq!(variant.variant_key(), "16_1000_1000_C_T");
/// assert_eq!(variant.genotype_for_sample("Patient 1"), Some(Genotype::Heterozygous));
/// assert!(variant.genotype_for_sample("Patient 2").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    variant_info: VariantInfo,
    variant_class: VariantClass,
    annotations: Vec<TranscriptAnnotation>,
    genotypes: BTreeMap<String, Genotype>,
}

impl Variant {
    /// Constructs a new variant without any genotype calls
    pub fn new(
        variant_info: VariantInfo,
        variant_class: VariantClass,
        annotations: Vec<TranscriptAnnotation>,
    ) -> Self {
        Self {
            variant_info,
            variant_class,
            annotations,
            genotypes: BTreeMap::new(),
        }
    }

    /// Adds the genotype call of a sample
    #[must_use]
    pub fn with_genotype(mut self, sample: &str, genotype: Genotype) -> Self {
        self.genotypes.insert(sample.to_string(), genotype);
        self
    }

    pub fn variant_info(&self) -> &VariantInfo {
        &self.variant_info
    }

    pub fn variant_class(&self) -> VariantClass {
        self.variant_class
    }

    pub fn variant_key(&self) -> String {
        self.variant_info.variant_key()
    }

    pub fn annotations(&self) -> &[TranscriptAnnotation] {
        &self.annotations
    }

    /// Returns the annotation of the given transcript
    pub fn annotation(&self, transcript_id: &str) -> Option<&TranscriptAnnotation> {
        self.annotations
            .iter()
            .find(|ann| ann.transcript_id() == transcript_id)
    }

    /// Returns the annotation of the preferred transcript, if there is one
    pub fn preferred_annotation(&self) -> Option<&TranscriptAnnotation> {
        self.annotations.iter().find(|ann| ann.is_preferred())
    }

    /// Returns the genotype call of the sample, or `None` if the sample was not genotyped
    pub fn genotype_for_sample(&self, sample: &str) -> Option<Genotype> {
        self.genotypes.get(sample).copied()
    }

    /// Returns the number of alternate alleles the sample carries
    pub fn alt_allele_count(&self, sample: &str) -> u32 {
        self.genotype_for_sample(sample)
            .map_or(0, |gt| gt.alt_allele_count())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn structural_key() {
        let coordinates = VariantCoordinates::new("2", 100, 2000, "N", "<DEL>", -1900);
        assert!(coordinates.is_structural());
        assert_eq!(coordinates.variant_key(), "2_101_2000_DEL");

        let sv = ImpreciseSvInfo::new("SO:1000029", "HGNC:21316", "ANKRD11");
        assert_eq!(sv.variant_key(), "SO:1000029_HGNC:21316");
        assert!(VariantInfo::Imprecise(sv).is_structural());
    }

    #[test]
    fn region_overlap() {
        let region = Region::new(10, 20);
        assert!(region.overlaps_with(&Region::new(20, 25)));
        assert!(region.overlaps_with(&Region::new(1, 10)));
        assert!(!region.overlaps_with(&Region::new(21, 25)));
        assert_eq!(Region::new(5, 1), Region::new(1, 5));
    }

    #[test]
    fn allele_counts() {
        let variant = Variant::new(
            VariantInfo::Precise(VariantCoordinates::new("X", 10, 11, "A", "G", 0)),
            VariantClass::Snv,
            vec![],
        )
        .with_genotype("a", Genotype::HomozygousAlternate)
        .with_genotype("b", Genotype::Hemizygous);
        assert_eq!(variant.alt_allele_count("a"), 2);
        assert_eq!(variant.alt_allele_count("b"), 1);
        assert_eq!(variant.alt_allele_count("c"), 0);
    }
}
