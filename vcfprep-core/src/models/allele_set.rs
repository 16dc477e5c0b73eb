use std::fmt::{self, Display};

///
/// REF/ALT alleles of one variant site at a 1-based position.
///
#[derive(Eq, PartialEq, Hash, Debug, Clone)]
pub struct AlleleSet {
    pub chrom: String,
    pub pos: u64,
    pub ref_allele: String,
    pub alts: Vec<String>,
}

impl AlleleSet {
    pub fn new<S: Into<String>>(chrom: S, pos: u64, ref_allele: S, alts: Vec<String>) -> Self {
        AlleleSet {
            chrom: chrom.into(),
            pos,
            ref_allele: ref_allele.into(),
            alts,
        }
    }

    ///
    /// A set with no REF or no ALT alleles; normalization leaves it untouched.
    ///
    pub fn is_empty(&self) -> bool {
        self.ref_allele.is_empty() || self.alts.is_empty()
    }

    pub fn n_alts(&self) -> usize {
        self.alts.len()
    }

    ///
    /// True when more than one ALT allele is present.
    ///
    pub fn is_multiallelic(&self) -> bool {
        self.alts.len() > 1
    }

    /// Alleles in VCF order: REF first, then every ALT.
    pub fn alleles(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ref_allele.as_str()).chain(self.alts.iter().map(String::as_str))
    }
}

impl Display for AlleleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}>{}",
            self.chrom,
            self.pos,
            self.ref_allele,
            self.alts.join(",")
        )
    }
}

/// An ALT entry that carries no allele: empty or `.`.
pub fn is_missing_allele(allele: &str) -> bool {
    allele.is_empty() || allele == "."
}

/// Symbolic (`<DEL>`), breakend (`A[chr2:10[`) or spanning-deletion (`*`) alleles.
pub fn is_symbolic_allele(allele: &str) -> bool {
    (allele.starts_with('<') && allele.ends_with('>'))
        || allele == "*"
        || allele.contains('[')
        || allele.contains(']')
}
