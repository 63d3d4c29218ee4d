use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::GpcError;

macro_rules! variant_effects {
    ($($variant:ident => ($curie:literal, $name:literal)),+ $(,)?) => {
        /// The functional effect of a variant on a transcript
        ///
        /// Effects are terms of the Sequence Ontology. They can be parsed from
        /// either the SO curie (`SO:0001583`) or the term name (`missense_variant`,
        /// case-insensitive).
        ///
        /// # Examples
        ///
        /// ```
        /// use phenocorr::model::VariantEffect;
        ///
        /// let effect: VariantEffect = "SO:0001583".parse().unwrap();
        /// assert_eq!(effect, VariantEffect::MissenseVariant);
        /// assert_eq!(effect, "MISSENSE_VARIANT".parse().unwrap());
        /// assert_eq!(effect.curie(), "SO:0001583");
        /// assert_eq!(effect.to_string(), "missense_variant");
        /// ```
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum VariantEffect {
            $($variant,)+
        }

        impl VariantEffect {
            /// All known effects, in declaration order
            pub const ALL: &'static [VariantEffect] = &[$(VariantEffect::$variant,)+];

            /// Returns the Sequence Ontology curie of the effect
            pub fn curie(&self) -> &'static str {
                match self {
                    $(VariantEffect::$variant => $curie,)+
                }
            }

            /// Returns the Sequence Ontology name of the effect
            pub fn name(&self) -> &'static str {
                match self {
                    $(VariantEffect::$variant => $name,)+
                }
            }
        }
    };
}

variant_effects! {
    TranscriptAblation => ("SO:0001893", "transcript_ablation"),
    SpliceAcceptorVariant => ("SO:0001574", "splice_acceptor_variant"),
    SpliceDonorVariant => ("SO:0001575", "splice_donor_variant"),
    StopGained => ("SO:0001587", "stop_gained"),
    FrameshiftVariant => ("SO:0001589", "frameshift_variant"),
    StopLost => ("SO:0001578", "stop_lost"),
    StartLost => ("SO:0002012", "start_lost"),
    TranscriptAmplification => ("SO:0001889", "transcript_amplification"),
    FeatureElongation => ("SO:0001907", "feature_elongation"),
    FeatureTruncation => ("SO:0001906", "feature_truncation"),
    InframeInsertion => ("SO:0001821", "inframe_insertion"),
    InframeDeletion => ("SO:0001822", "inframe_deletion"),
    MissenseVariant => ("SO:0001583", "missense_variant"),
    ProteinAlteringVariant => ("SO:0001818", "protein_altering_variant"),
    SpliceDonor5thBaseVariant => ("SO:0001787", "splice_donor_5th_base_variant"),
    SpliceRegionVariant => ("SO:0001630", "splice_region_variant"),
    SpliceDonorRegionVariant => ("SO:0002170", "splice_donor_region_variant"),
    SplicePolypyrimidineTractVariant => ("SO:0002169", "splice_polypyrimidine_tract_variant"),
    IncompleteTerminalCodonVariant => ("SO:0001626", "incomplete_terminal_codon_variant"),
    StartRetainedVariant => ("SO:0002019", "start_retained_variant"),
    StopRetainedVariant => ("SO:0001567", "stop_retained_variant"),
    SynonymousVariant => ("SO:0001819", "synonymous_variant"),
    CodingSequenceVariant => ("SO:0001580", "coding_sequence_variant"),
    MatureMirnaVariant => ("SO:0001620", "mature_miRNA_variant"),
    FivePrimeUtrVariant => ("SO:0001623", "5_prime_UTR_variant"),
    ThreePrimeUtrVariant => ("SO:0001624", "3_prime_UTR_variant"),
    NonCodingTranscriptExonVariant => ("SO:0001792", "non_coding_transcript_exon_variant"),
    IntronVariant => ("SO:0001627", "intron_variant"),
    NmdTranscriptVariant => ("SO:0001621", "NMD_transcript_variant"),
    NonCodingTranscriptVariant => ("SO:0001619", "non_coding_transcript_variant"),
    UpstreamGeneVariant => ("SO:0001631", "upstream_gene_variant"),
    DownstreamGeneVariant => ("SO:0001632", "downstream_gene_variant"),
    TfbsAblation => ("SO:0001895", "TFBS_ablation"),
    TfbsAmplification => ("SO:0001892", "TFBS_amplification"),
    TfBindingSiteVariant => ("SO:0001782", "TF_binding_site_variant"),
    RegulatoryRegionAblation => ("SO:0001894", "regulatory_region_ablation"),
    RegulatoryRegionAmplification => ("SO:0001891", "regulatory_region_amplification"),
    RegulatoryRegionVariant => ("SO:0001566", "regulatory_region_variant"),
    IntergenicVariant => ("SO:0001628", "intergenic_variant"),
    SequenceVariant => ("SO:0001060", "sequence_variant"),
}

/// Lookup table from lower-case curie or name to the effect
///
/// Built once on first use and shared read-only afterwards.
fn effect_table() -> &'static HashMap<String, VariantEffect> {
    static TABLE: OnceLock<HashMap<String, VariantEffect>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = HashMap::with_capacity(VariantEffect::ALL.len() * 2);
        for effect in VariantEffect::ALL {
            table.insert(effect.curie().to_lowercase(), *effect);
            table.insert(effect.name().to_lowercase(), *effect);
        }
        table
    })
}

impl VariantEffect {
    /// Returns `true` if the effect changes the protein sequence
    ///
    /// Used e.g. to tell apart missense from synonymous variants.
    pub fn is_protein_altering(&self) -> bool {
        matches!(
            self,
            VariantEffect::TranscriptAblation
                | VariantEffect::StopGained
                | VariantEffect::FrameshiftVariant
                | VariantEffect::StopLost
                | VariantEffect::StartLost
                | VariantEffect::InframeInsertion
                | VariantEffect::InframeDeletion
                | VariantEffect::MissenseVariant
                | VariantEffect::ProteinAlteringVariant
                | VariantEffect::FeatureElongation
                | VariantEffect::FeatureTruncation
        )
    }
}

impl FromStr for VariantEffect {
    type Err = GpcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        effect_table()
            .get(&s.trim().to_lowercase())
            .copied()
            .ok_or_else(|| GpcError::DoesNotExist(format!("variant effect {s}")))
    }
}

impl Display for VariantEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
