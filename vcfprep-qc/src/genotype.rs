//! Genotype call parsing and counting.

use serde::Serialize;

/// A called (non-missing) genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenotypeCall {
    Haploid(usize),
    Diploid(usize, usize),
}

/// Parse a GT string such as `0/1`, `1|1` or `1`.
///
/// Missing (`.`, `./.`, `.|.`), partially missing (`0/.`), non-numeric and
/// polyploid calls all return `None`.
pub fn parse_genotype(call: &str) -> Option<GenotypeCall> {
    let call = call.trim();
    let mut alleles = call.split(['/', '|']);
    let first = alleles.next()?.parse::<usize>().ok()?;
    match (alleles.next(), alleles.next()) {
        (None, _) => Some(GenotypeCall::Haploid(first)),
        (Some(second), None) => {
            let second = second.parse::<usize>().ok()?;
            Some(GenotypeCall::Diploid(first, second))
        }
        (Some(_), Some(_)) => None,
    }
}

/// Genotype counts of one variant. `n_called = n_het + n_hom_ref + n_hom_alt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GenotypeCounts {
    pub n_called: u64,
    pub n_het: u64,
    pub n_hom_ref: u64,
    pub n_hom_alt: u64,
}

impl GenotypeCounts {
    pub fn new(n_het: u64, n_hom_ref: u64, n_hom_alt: u64) -> Self {
        GenotypeCounts {
            n_called: n_het + n_hom_ref + n_hom_alt,
            n_het,
            n_hom_ref,
            n_hom_alt,
        }
    }

    fn add(&mut self, call: GenotypeCall) {
        let (a, b) = match call {
            GenotypeCall::Haploid(a) => (a, a),
            GenotypeCall::Diploid(a, b) => (a, b),
        };
        self.n_called += 1;
        if a != b {
            self.n_het += 1;
        } else if a == 0 {
            self.n_hom_ref += 1;
        } else {
            self.n_hom_alt += 1;
        }
    }
}

/// Count genotypes over a column of GT calls. Missing and malformed calls are skipped.
pub fn genotype_counts<I, S>(calls: I) -> GenotypeCounts
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = GenotypeCounts::default();
    for call in calls {
        if let Some(call) = parse_genotype(call.as_ref()) {
            counts.add(call);
        }
    }
    counts
}
