use super::allele_set::AlleleSet;
use super::field::{FieldMap, FieldValue};

/// FORMAT data of one sample.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SampleFields {
    pub sample_id: String,
    pub fields: FieldMap,
}

impl SampleFields {
    pub fn new<S: Into<String>>(sample_id: S, fields: FieldMap) -> Self {
        SampleFields {
            sample_id: sample_id.into(),
            fields,
        }
    }

    /// The sample's `GT` call, if one was recorded.
    pub fn genotype(&self) -> Option<&str> {
        self.fields.get("GT").and_then(FieldValue::as_str)
    }
}

///
/// A variant record as produced by the VCF reader: alleles, INFO and per-sample FORMAT data.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AnnotatedRecord {
    pub allele_set: AlleleSet,
    pub info: FieldMap,
    pub samples: Vec<SampleFields>,
}

impl AnnotatedRecord {
    pub fn new(allele_set: AlleleSet) -> Self {
        AnnotatedRecord {
            allele_set,
            info: FieldMap::new(),
            samples: Vec::new(),
        }
    }

    pub fn with_info(mut self, info: FieldMap) -> Self {
        self.info = info;
        self
    }

    pub fn with_samples(mut self, samples: Vec<SampleFields>) -> Self {
        self.samples = samples;
        self
    }
}

///
/// One biallelic record split off a (possibly multi-allelic) [`AnnotatedRecord`].
///
/// `alt_index` is the 0-based index of `alt` among the ALT alleles of the source
/// record and `n_source_alts` the source's ALT count.
///
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DecomposedRecord {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alt: String,
    pub info: FieldMap,
    pub samples: Vec<SampleFields>,
    pub alt_index: usize,
    pub n_source_alts: usize,
}

impl DecomposedRecord {
    /// True when the record came from a site with more than one ALT allele.
    pub fn is_split(&self) -> bool {
        self.n_source_alts > 1
    }

    pub fn has_genotypes(&self) -> bool {
        self.samples.iter().any(|s| s.fields.get("GT").is_some())
    }

    /// GT calls of every sample in sample order; samples without a GT yield `.`.
    pub fn genotype_calls(&self) -> impl Iterator<Item = &str> {
        self.samples.iter().map(|s| s.genotype().unwrap_or("."))
    }
}
