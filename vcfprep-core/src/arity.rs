//! Expected array lengths for INFO/FORMAT fields.
//!
//! VCF declares the cardinality of each field with `Number=`. For `A`, `R` and `G`
//! the length depends on the number of ALT alleles (and, for `G`, the ploidy),
//! so it has to be resolved per record.

use crate::models::NumberKind;

/// Expected length of a field's value array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArraySize {
    Exact(usize),
    /// `Number=.`: no length can be predicted, do not re-index.
    Variable,
}

impl ArraySize {
    /// Legacy integer form, `-1` for [`ArraySize::Variable`].
    pub fn as_i64(&self) -> i64 {
        match self {
            ArraySize::Exact(n) => *n as i64,
            ArraySize::Variable => -1,
        }
    }

    pub fn exact(&self) -> Option<usize> {
        match self {
            ArraySize::Exact(n) => Some(*n),
            ArraySize::Variable => None,
        }
    }
}

/// Resolve the expected array length of a field.
///
/// # Arguments
/// * `number` - the field's declared `Number`
/// * `n_alts` - number of ALT alleles in the record
/// * `ploidy` - sample ploidy, only consulted for `Number=G`
///
/// Unknown declarations resolve to `1`, i.e. the field is treated as a scalar.
pub fn array_size(number: NumberKind, n_alts: usize, ploidy: usize) -> ArraySize {
    match number {
        NumberKind::Fixed(k) => ArraySize::Exact(k),
        NumberKind::PerAlt => ArraySize::Exact(n_alts),
        NumberKind::PerAlleleInclRef => ArraySize::Exact(n_alts + 1),
        NumberKind::PerGenotype => ArraySize::Exact(n_genotypes(n_alts + 1, ploidy)),
        NumberKind::Variable => ArraySize::Variable,
        NumberKind::Unknown => ArraySize::Exact(1),
    }
}

/// [`array_size`] for a raw header `Number` string.
pub fn get_array_size(number: &str, n_alts: usize, ploidy: usize) -> ArraySize {
    array_size(NumberKind::from(number), n_alts, ploidy)
}

/// Number of unordered genotypes of `ploidy` alleles drawn from `n_alleles` alleles,
/// `C(n_alleles + ploidy - 1, ploidy)`.
pub fn n_genotypes(n_alleles: usize, ploidy: usize) -> usize {
    if n_alleles == 0 {
        return usize::from(ploidy == 0);
    }
    binomial(n_alleles + ploidy - 1, ploidy)
}

/// Position of the diploid genotype `a/b` in a `Number=G` array.
///
/// Order of the two alleles does not matter: `Index(a, b) = b * (b + 1) / 2 + a` for `a <= b`.
pub fn genotype_index(a: usize, b: usize) -> usize {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    hi * (hi + 1) / 2 + lo
}

fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    // acc * (n - i) == C(n, i + 1) * (i + 1), so the division is exact
    (0..k).fold(1usize, |acc, i| acc * (n - i) / (i + 1))
}
