//! VCF allele normalization.
//!
//! Left-alignment and parsimony as defined by Tan, Abecasis & Kang (2015), the
//! algorithm behind `vt normalize`:
//! 1. While every allele ends with the same base, drop it. If that would empty an
//!    allele, extend all alleles one base to the left from the reference instead.
//! 2. While every allele has at least two bases and all start with the same base,
//!    drop it and move the position right.
//!
//! Operates on uppercase `Vec<u8>` alleles; output alleles are uppercase.

use std::fmt::{self, Display};

use tracing::debug;

use vcfprep_core::errors::{ReferenceError, VariantError};
use vcfprep_core::models::{AlleleSet, is_missing_allele, is_symbolic_allele};

use crate::reference::ReferenceFetch;

/// Canonical position and alleles returned by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAlleles {
    pub pos: u64,
    pub ref_allele: String,
    pub alts: Vec<String>,
}

/// Coarse class of a biallelic variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariantType {
    Snp,
    Indel,
    Mnp,
    Sv,
}

impl Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantType::Snp => "snp",
            VariantType::Indel => "indel",
            VariantType::Mnp => "mnp",
            VariantType::Sv => "sv",
        };
        write!(f, "{}", name)
    }
}

/// Classify a REF/ALT pair. Symbolic and breakend ALTs are `Sv`.
pub fn classify_variant(ref_allele: &str, alt: &str) -> VariantType {
    if is_symbolic_allele(alt) {
        VariantType::Sv
    } else if ref_allele.len() == 1 && alt.len() == 1 {
        VariantType::Snp
    } else if ref_allele.len() != alt.len() {
        VariantType::Indel
    } else {
        VariantType::Mnp
    }
}

fn first_base(allele: &[u8]) -> u8 {
    allele[0].to_ascii_uppercase()
}

fn last_base(allele: &[u8]) -> u8 {
    allele[allele.len() - 1].to_ascii_uppercase()
}

fn all_same(alleles: &[&[u8]], base_of: fn(&[u8]) -> u8) -> bool {
    let base = base_of(alleles[0]);
    alleles.iter().all(|a| base_of(a) == base)
}

/// Alleles that cannot be trimmed: nothing to normalize.
fn is_untrimmable<S: AsRef<str>>(ref_allele: &str, alts: &[S]) -> bool {
    ref_allele.is_empty()
        || alts.is_empty()
        || is_symbolic_allele(ref_allele)
        || alts.iter().any(|a| {
            let a = a.as_ref();
            is_missing_allele(a) || is_symbolic_allele(a)
        })
        || alts.iter().all(|a| a.as_ref().eq_ignore_ascii_case(ref_allele))
}

/// Check whether an allele set is already normalized, without computing the normal form.
///
/// True iff the alleles end with different bases and either the shortest allele
/// is a single base or the alleles start with different bases. Sets that
/// [`normalize`] leaves untouched (empty, symbolic, missing, REF == ALT) count as normalized.
pub fn is_normalized<S: AsRef<str>>(ref_allele: &str, alts: &[S]) -> bool {
    if is_untrimmable(ref_allele, alts) {
        return true;
    }
    let alleles: Vec<&[u8]> = std::iter::once(ref_allele.as_bytes())
        .chain(alts.iter().map(|a| a.as_ref().as_bytes()))
        .collect();
    let min_len = alleles.iter().map(|a| a.len()).min().unwrap_or(0);

    !all_same(&alleles, last_base) && (min_len == 1 || !all_same(&alleles, first_base))
}

/// One uppercase base at 1-based `pos`, i.e. `[pos - 1, pos)`.
fn fetch_base(reference: &dyn ReferenceFetch, chrom: &str, pos: u64) -> Result<u8, ReferenceError> {
    let start = pos - 1;
    let bases = reference.fetch(chrom, start, pos)?;
    match bases.as_slice() {
        [base] => Ok(base.to_ascii_uppercase()),
        _ => Err(ReferenceError::ShortRead {
            chrom: chrom.to_string(),
            start,
            end: pos,
            observed: bases.len(),
        }),
    }
}

/// Normalize a REF/ALT allele set (left-align and trim to parsimony).
///
/// # Arguments
/// * `chrom` - contig name, used for reference lookups and error context
/// * `pos` - 1-based position of the first base of `ref_allele`
/// * `ref_allele` - reference allele
/// * `alts` - alternate alleles
/// * `reference` - optional reference used to extend alleles to the left
///
/// Without a reference, right-trimming stops as soon as it would empty an allele and the
/// result is parsimonious but possibly not left-aligned. Sets with no REF, no ALT, a
/// missing or symbolic ALT, or REF equal to every ALT are returned unchanged.
///
/// # Returns
/// The canonical position and alleles, or [`VariantError::Reference`] when a needed
/// reference lookup fails.
pub fn normalize<S: AsRef<str>>(
    chrom: &str,
    pos: u64,
    ref_allele: &str,
    alts: &[S],
    reference: Option<&dyn ReferenceFetch>,
) -> Result<NormalizedAlleles, VariantError> {
    if is_untrimmable(ref_allele, alts) {
        debug!("{}:{} left as is, alleles cannot be trimmed", chrom, pos);
        return Ok(NormalizedAlleles {
            pos,
            ref_allele: ref_allele.to_string(),
            alts: alts.iter().map(|a| a.as_ref().to_string()).collect(),
        });
    }

    let mut alleles: Vec<Vec<u8>> = std::iter::once(ref_allele)
        .chain(alts.iter().map(|a| a.as_ref()))
        .map(|a| a.as_bytes().to_ascii_uppercase())
        .collect();
    let mut new_pos = pos;

    // Step 1: right-trim, extending left from the reference when a base would run out
    loop {
        let views: Vec<&[u8]> = alleles.iter().map(|a| a.as_slice()).collect();
        if !all_same(&views, last_base) {
            break;
        }
        if alleles.iter().any(|a| a.len() == 1) {
            let Some(reference) = reference else {
                break;
            };
            if new_pos <= 1 {
                break;
            }
            let base = fetch_base(reference, chrom, new_pos - 1).map_err(|source| {
                VariantError::Reference {
                    chrom: chrom.to_string(),
                    pos,
                    source,
                }
            })?;
            new_pos -= 1;
            for allele in alleles.iter_mut() {
                allele.pop();
                allele.insert(0, base);
            }
        } else {
            for allele in alleles.iter_mut() {
                allele.pop();
            }
        }
    }

    // Step 2: left-trim while every allele keeps at least one base
    let mut trimmed = 0usize;
    loop {
        let can_trim = alleles.iter().all(|a| a.len() - trimmed >= 2)
            && alleles.iter().all(|a| a[trimmed] == alleles[0][trimmed]);
        if !can_trim {
            break;
        }
        trimmed += 1;
    }
    new_pos += trimmed as u64;

    let mut canonical = alleles
        .into_iter()
        .map(|a| String::from_utf8_lossy(&a[trimmed..]).into_owned());
    let ref_allele = canonical.next().unwrap_or_default();

    Ok(NormalizedAlleles {
        pos: new_pos,
        ref_allele,
        alts: canonical.collect(),
    })
}

/// Normalize an [`AlleleSet`] in place. Returns whether position or alleles changed.
pub fn normalize_allele_set(
    allele_set: &mut AlleleSet,
    reference: Option<&dyn ReferenceFetch>,
) -> Result<bool, VariantError> {
    if is_normalized(&allele_set.ref_allele, &allele_set.alts)
        && allele_set.alleles().all(|a| !a.bytes().any(|b| b.is_ascii_lowercase()))
    {
        return Ok(false);
    }
    let normalized = normalize(
        &allele_set.chrom,
        allele_set.pos,
        &allele_set.ref_allele,
        &allele_set.alts,
        reference,
    )?;
    let changed = normalized.pos != allele_set.pos
        || normalized.ref_allele != allele_set.ref_allele
        || normalized.alts != allele_set.alts;

    allele_set.pos = normalized.pos;
    allele_set.ref_allele = normalized.ref_allele;
    allele_set.alts = normalized.alts;
    Ok(changed)
}
