use serde::Serialize;

/// Allele frequency summary of a biallelic variant.
///
/// All fields are `None` when no genotype was called.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AlleleFrequencies {
    /// Alternate allele frequency.
    pub aaf: Option<f64>,
    /// Minor allele frequency, `min(aaf, 1 - aaf)`.
    pub maf: Option<f64>,
    /// Minor allele count, `min(ac_alt, ac_ref)`.
    pub mac: Option<u64>,
}

/// Compute AAF, MAF and MAC from diploid genotype counts.
pub fn allele_frequencies(n_het: u64, n_hom_ref: u64, n_hom_alt: u64) -> AlleleFrequencies {
    let n_called = n_het + n_hom_ref + n_hom_alt;
    if n_called == 0 {
        return AlleleFrequencies::default();
    }
    let an = 2 * n_called;
    let ac_alt = 2 * n_hom_alt + n_het;
    let ac_ref = 2 * n_hom_ref + n_het;
    let aaf = ac_alt as f64 / an as f64;

    AlleleFrequencies {
        aaf: Some(aaf),
        maf: Some(aaf.min(1.0 - aaf)),
        mac: Some(ac_alt.min(ac_ref)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_balanced() {
        let af = allele_frequencies(1, 1, 1);
        assert_eq!(af.aaf, Some(0.5));
        assert_eq!(af.maf, Some(0.5));
        assert_eq!(af.mac, Some(3));
    }

    #[rstest]
    #[case(0, 10, 0, 0.0, 0.0, 0)]
    #[case(0, 0, 10, 1.0, 0.0, 0)]
    #[case(2, 8, 0, 0.1, 0.1, 2)]
    #[case(2, 0, 8, 0.9, 0.09999999999999998, 2)]
    #[case(4, 3, 3, 0.5, 0.5, 10)]
    fn test_frequencies(
        #[case] n_het: u64,
        #[case] n_hom_ref: u64,
        #[case] n_hom_alt: u64,
        #[case] aaf: f64,
        #[case] maf: f64,
        #[case] mac: u64,
    ) {
        let af = allele_frequencies(n_het, n_hom_ref, n_hom_alt);
        assert!((af.aaf.unwrap() - aaf).abs() < 1e-12);
        assert!((af.maf.unwrap() - maf).abs() < 1e-12);
        assert_eq!(af.mac, Some(mac));
    }

    #[rstest]
    fn test_no_calls_undefined() {
        let af = allele_frequencies(0, 0, 0);
        assert_eq!(af, AlleleFrequencies { aaf: None, maf: None, mac: None });
    }
}
