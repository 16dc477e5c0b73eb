//! Exact test for Hardy-Weinberg equilibrium.
//!
//! Wigginton JE, Cutler DJ, Abecasis GR (2005). A note on exact tests of
//! Hardy-Weinberg equilibrium. Am J Hum Genet 76:887-893.
//!
//! The heterozygote-count distribution is built with the ratio recursion between
//! neighbouring counts (same parity), never with factorials, so it stays finite for
//! cohorts of any size.

const TOLERANCE: f64 = 1e-10;

/// Two-sided exact HWE p-value from diploid genotype counts.
///
/// Returns `Some(1.0)` when either allele is absent (including no calls at all)
/// and `None` when the heterozygote count cannot arise from the allele counts.
pub fn hwe_pvalue(n_het: u64, n_hom_ref: u64, n_hom_alt: u64) -> Option<f64> {
    let n_a = 2 * n_hom_ref + n_het;
    let n_b = 2 * n_hom_alt + n_het;
    exact_hwe(n_het, n_a, n_b)
}

fn exact_hwe(obs_het: u64, n_a: u64, n_b: u64) -> Option<f64> {
    if n_a == 0 || n_b == 0 {
        return Some(1.0);
    }
    let rare = n_a.min(n_b) as usize;
    let common = n_a.max(n_b) as usize;
    let obs_het = obs_het as usize;
    if obs_het > rare || (rare - obs_het) % 2 != 0 {
        return None;
    }
    let n = (rare + common) / 2;

    let mut probs = vec![0.0f64; rare + 1];

    // seed at the expected heterozygote count, matching the parity of `rare`
    let mut mid = rare * common / (rare + common);
    if (rare - mid) % 2 != 0 {
        mid += 1;
    }
    probs[mid] = 1.0;
    let mut total = 1.0;

    let mut het = mid;
    let mut hom_r = (rare - mid) / 2;
    let mut hom_c = n - mid - hom_r;
    while het >= 2 {
        let p = probs[het] * (het * (het - 1)) as f64
            / (4.0 * (hom_r + 1) as f64 * (hom_c + 1) as f64);
        probs[het - 2] = p;
        total += p;
        het -= 2;
        hom_r += 1;
        hom_c += 1;
    }

    let mut het = mid;
    let mut hom_r = (rare - mid) / 2;
    let mut hom_c = n - mid - hom_r;
    while het + 2 <= rare {
        let p = probs[het] * 4.0 * hom_r as f64 * hom_c as f64 / ((het + 2) * (het + 1)) as f64;
        probs[het + 2] = p;
        total += p;
        het += 2;
        hom_r -= 1;
        hom_c -= 1;
    }

    for p in probs.iter_mut() {
        *p /= total;
    }

    let p_obs = probs[obs_het];
    let pvalue: f64 = probs
        .iter()
        .skip(rare % 2)
        .step_by(2)
        .filter(|&&p| p <= p_obs + TOLERANCE)
        .sum();

    Some(pvalue.min(1.0))
}
