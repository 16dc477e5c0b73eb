//! Multi-allelic decomposition.
//!
//! Splits a record with N ALT alleles into N biallelic records. Fields whose
//! length depends on the allele count are sliced down to the values that belong
//! to each ALT:
//!
//! | Number | source length | emitted for ALT `i` |
//! |---|---|---|
//! | `A` | `n` | `v[i]` |
//! | `R` | `n + 1` | `[v[0], v[i + 1]]` |
//! | `G` (diploid) | `(n + 1)(n + 2) / 2` | `[v[0/0], v[0/(i+1)], v[(i+1)/(i+1)]]` |
//! | `G` (haploid) | `n + 1` | `[v[0], v[i + 1]]` |
//!
//! Everything else is copied verbatim. A length that disagrees with the declared
//! `Number` is an error, never a silent truncation.

use vcfprep_core::arity::{array_size, genotype_index};
use vcfprep_core::errors::VariantError;
use vcfprep_core::models::{
    AlleleSet, AnnotatedRecord, DecomposedRecord, FieldMap, FieldSpecTable, FieldValue,
    NumberKind, SampleFields, is_missing_allele,
};

/// Knobs for [`decompose_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposeOptions {
    /// Rewrite `GT` per split record: the record's ALT becomes `1`, other ALTs become `.`.
    pub reindex_genotypes: bool,
}

impl Default for DecomposeOptions {
    fn default() -> Self {
        DecomposeOptions {
            reindex_genotypes: true,
        }
    }
}

/// Where a field value came from, for error reporting.
struct FieldContext<'a> {
    chrom: &'a str,
    pos: u64,
    sample: Option<&'a str>,
}

impl FieldContext<'_> {
    fn check_len(
        &self,
        field: &str,
        number: NumberKind,
        expected: usize,
        observed: usize,
    ) -> Result<(), VariantError> {
        if expected == observed {
            return Ok(());
        }
        Err(VariantError::FieldArityMismatch {
            chrom: self.chrom.to_string(),
            pos: self.pos,
            field: self.qualified(field),
            number,
            expected,
            observed,
        })
    }

    fn qualified(&self, field: &str) -> String {
        match self.sample {
            Some(sample) => format!("FORMAT/{} (sample {})", field, sample),
            None => format!("INFO/{}", field),
        }
    }
}

/// Expected length from the arity resolver; only called for A/R/G.
fn expected_len(number: NumberKind, n_alts: usize, ploidy: usize) -> usize {
    array_size(number, n_alts, ploidy).exact().unwrap_or(0)
}

/// Number of alleles in a GT call, `None` when the whole call is missing.
fn genotype_ploidy(gt: &str) -> Option<usize> {
    if gt.is_empty() || gt == "." {
        return None;
    }
    Some(gt.split(['/', '|']).count())
}

/// Slice one field value down to ALT `alt_index`.
///
/// `ploidy` is only consulted for `Number=G`; `None` infers haploid vs diploid from the length.
fn reindex_value(
    ctx: &FieldContext,
    name: &str,
    value: &FieldValue,
    number: NumberKind,
    n_alts: usize,
    alt_index: usize,
    ploidy: Option<usize>,
) -> Result<FieldValue, VariantError> {
    // a whole-field `.` stays missing on every split record
    if value.is_missing() || matches!(value, FieldValue::Flag) {
        return Ok(value.clone());
    }
    let alt_allele = alt_index + 1;

    match number {
        NumberKind::Fixed(_) | NumberKind::Variable | NumberKind::Unknown => Ok(value.clone()),
        NumberKind::PerAlt => match value {
            FieldValue::Array(values) => {
                ctx.check_len(name, number, expected_len(number, n_alts, 2), values.len())?;
                Ok(FieldValue::Scalar(values[alt_index].clone()))
            }
            // already singular
            _ => Ok(value.clone()),
        },
        NumberKind::PerAlleleInclRef => {
            let values = value.as_slice();
            ctx.check_len(name, number, expected_len(number, n_alts, 2), values.len())?;
            Ok(FieldValue::Array(vec![
                values[0].clone(),
                values[alt_allele].clone(),
            ]))
        }
        NumberKind::PerGenotype => {
            let values = value.as_slice();
            let ploidy = ploidy.unwrap_or_else(|| {
                if values.len() == expected_len(number, n_alts, 1) {
                    1
                } else {
                    2
                }
            });
            match ploidy {
                1 => {
                    ctx.check_len(name, number, expected_len(number, n_alts, 1), values.len())?;
                    Ok(FieldValue::Array(vec![
                        values[0].clone(),
                        values[alt_allele].clone(),
                    ]))
                }
                2 => {
                    ctx.check_len(name, number, expected_len(number, n_alts, 2), values.len())?;
                    Ok(FieldValue::Array(vec![
                        values[genotype_index(0, 0)].clone(),
                        values[genotype_index(0, alt_allele)].clone(),
                        values[genotype_index(alt_allele, alt_allele)].clone(),
                    ]))
                }
                other => Err(VariantError::UnsupportedPloidy {
                    chrom: ctx.chrom.to_string(),
                    pos: ctx.pos,
                    sample: ctx.sample.unwrap_or("INFO").to_string(),
                    field: name.to_string(),
                    ploidy: other,
                }),
            }
        }
    }
}

fn push_reindexed_allele(out: &mut String, allele: &str, alt_allele: usize) {
    match allele.parse::<usize>() {
        Ok(0) => out.push('0'),
        Ok(a) if a == alt_allele => out.push('1'),
        _ => out.push('.'),
    }
}

/// Map a GT call onto the biallelic record for allele `alt_allele` (1-based).
///
/// `0` stays `0`, `alt_allele` becomes `1`, any other allele becomes `.`.
/// Phasing separators are kept: `1|2` for allele 2 is `.|1`.
pub fn reindex_genotype(gt: &str, alt_allele: usize) -> String {
    if gt == "." {
        return gt.to_string();
    }
    let mut out = String::with_capacity(gt.len());
    let mut start = 0;
    for (i, c) in gt.char_indices() {
        if c == '/' || c == '|' {
            push_reindexed_allele(&mut out, &gt[start..i], alt_allele);
            out.push(c);
            start = i + 1;
        }
    }
    push_reindexed_allele(&mut out, &gt[start..], alt_allele);
    out
}

/// Split an allele set into one single-ALT set per non-missing ALT.
pub fn decompose_multiallelic(allele_set: &AlleleSet) -> Vec<AlleleSet> {
    allele_set
        .alts
        .iter()
        .filter(|alt| !is_missing_allele(alt))
        .map(|alt| AlleleSet {
            chrom: allele_set.chrom.clone(),
            pos: allele_set.pos,
            ref_allele: allele_set.ref_allele.clone(),
            alts: vec![alt.clone()],
        })
        .collect()
}

/// [`decompose_with`] using [`DecomposeOptions::default`].
pub fn decompose(
    record: &AnnotatedRecord,
    field_specs: &FieldSpecTable,
) -> Result<Vec<DecomposedRecord>, VariantError> {
    decompose_with(record, field_specs, DecomposeOptions::default())
}

/// Decompose a record into one biallelic record per non-missing ALT allele.
///
/// Records are returned in ALT order. INFO fields are re-indexed by their declared
/// `Number` (diploid for `G`); FORMAT fields likewise, with `G` using each sample's
/// GT ploidy.
///
/// # Returns
/// The biallelic records, or [`VariantError::FieldArityMismatch`] when an `A`/`R`/`G`
/// field's length disagrees with the source record's allele count.
pub fn decompose_with(
    record: &AnnotatedRecord,
    field_specs: &FieldSpecTable,
    options: DecomposeOptions,
) -> Result<Vec<DecomposedRecord>, VariantError> {
    let allele_set = &record.allele_set;
    let n_alts = allele_set.n_alts();
    let info_ctx = FieldContext {
        chrom: &allele_set.chrom,
        pos: allele_set.pos,
        sample: None,
    };

    let mut decomposed = Vec::with_capacity(n_alts);
    for (alt_index, alt) in allele_set.alts.iter().enumerate() {
        if is_missing_allele(alt) {
            continue;
        }

        let info = record
            .info
            .iter()
            .map(|(name, value)| {
                let number = field_specs.info_number(name);
                reindex_value(&info_ctx, name, value, number, n_alts, alt_index, Some(2))
                    .map(|v| (name, v))
            })
            .collect::<Result<FieldMap, VariantError>>()?;

        let samples = record
            .samples
            .iter()
            .map(|sample| -> Result<SampleFields, VariantError> {
                let ctx = FieldContext {
                    chrom: &allele_set.chrom,
                    pos: allele_set.pos,
                    sample: Some(sample.sample_id.as_str()),
                };
                let ploidy = sample.genotype().and_then(genotype_ploidy);
                let fields = sample
                    .fields
                    .iter()
                    .map(|(name, value)| {
                        if name == "GT" && options.reindex_genotypes {
                            let gt = match value {
                                FieldValue::Scalar(gt) => {
                                    FieldValue::Scalar(reindex_genotype(gt, alt_index + 1))
                                }
                                other => other.clone(),
                            };
                            return Ok((name, gt));
                        }
                        let number = field_specs.format_number(name);
                        reindex_value(&ctx, name, value, number, n_alts, alt_index, ploidy)
                            .map(|v| (name, v))
                    })
                    .collect::<Result<FieldMap, VariantError>>()?;
                Ok(SampleFields::new(sample.sample_id.clone(), fields))
            })
            .collect::<Result<Vec<SampleFields>, VariantError>>()?;

        decomposed.push(DecomposedRecord {
            chrom: allele_set.chrom.clone(),
            pos: allele_set.pos,
            ref_allele: allele_set.ref_allele.clone(),
            alt: alt.clone(),
            info,
            samples,
            alt_index,
            n_source_alts: n_alts,
        });
    }

    Ok(decomposed)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn fields(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (*k, FieldValue::parse(v)))
            .collect()
    }

    fn array(values: &[&str]) -> FieldValue {
        FieldValue::Array(strings(values))
    }

    fn scalar(value: &str) -> FieldValue {
        FieldValue::Scalar(value.to_string())
    }

    #[fixture]
    fn specs() -> FieldSpecTable {
        FieldSpecTable::new()
            .with_info("DP", "1")
            .with_info("AC", "A")
            .with_info("AF", "A")
            .with_info("RC", "R")
            .with_info("GL", "G")
            .with_info("ANN", ".")
            .with_format("GT", "1")
            .with_format("AD", "R")
            .with_format("PL", "G")
            .with_format("DS", "A")
            .with_format("FT", ".")
    }

    #[fixture]
    fn triallelic() -> AnnotatedRecord {
        // ALTs G, T, C at chr1:100
        let allele_set = AlleleSet::new("chr1", 100, "A", strings(&["G", "T", "C"]));
        let info = fields(&[
            ("DP", "40"),
            ("AC", "1,2,3"),
            ("AF", "0.1,0.2,0.3"),
            ("RC", "10,11,12,13"),
            ("GL", "0,1,2,3,4,5,6,7,8,9"),
            ("ANN", "x,y"),
            ("UNDECLARED", "a,b"),
        ]);
        let mut db = info.clone();
        db.insert("DB", FieldValue::Flag);
        let samples = vec![
            SampleFields::new(
                "s1",
                fields(&[
                    ("GT", "1/2"),
                    ("AD", "5,6,7,8"),
                    ("PL", "00,01,11,02,12,22,03,13,23,33"),
                    ("DS", "0.5,0.6,0.7"),
                    ("FT", "PASS"),
                ]),
            ),
            SampleFields::new("s2", fields(&[("GT", "0|3"), ("AD", "9,0,0,4")])),
        ];
        AnnotatedRecord::new(allele_set)
            .with_info(db)
            .with_samples(samples)
    }

    #[rstest]
    fn test_decompose_multiallelic_alleles() {
        let set = AlleleSet::new("chr1", 100, "A", strings(&["G", "T", "C"]));
        let split: Vec<(String, u64, String, String)> = decompose_multiallelic(&set)
            .into_iter()
            .map(|s| (s.chrom, s.pos, s.ref_allele, s.alts[0].clone()))
            .collect();
        assert_eq!(
            split,
            vec![
                ("chr1".to_string(), 100, "A".to_string(), "G".to_string()),
                ("chr1".to_string(), 100, "A".to_string(), "T".to_string()),
                ("chr1".to_string(), 100, "A".to_string(), "C".to_string()),
            ]
        );
    }

    #[rstest]
    #[case(&["G", ".", "C"])]
    #[case(&["G", "", "C"])]
    fn test_missing_alt_is_dropped(#[case] alts: &[&str]) {
        let set = AlleleSet::new("chr1", 100, "A", strings(alts));
        let split = decompose_multiallelic(&set);
        assert_eq!(split.len(), 2);
        assert_eq!(split[1].alts, strings(&["C"]));
    }

    #[rstest]
    fn test_info_reindexing(triallelic: AnnotatedRecord, specs: FieldSpecTable) {
        let records = decompose(&triallelic, &specs).unwrap();
        assert_eq!(records.len(), 3);

        let alts: Vec<&str> = records.iter().map(|r| r.alt.as_str()).collect();
        assert_eq!(alts, vec!["G", "T", "C"]);

        let t = &records[1];
        assert_eq!(t.alt_index, 1);
        assert_eq!(t.n_source_alts, 3);
        assert_eq!(t.info.get("DP"), Some(&scalar("40")));
        assert_eq!(t.info.get("AC"), Some(&scalar("2")));
        assert_eq!(t.info.get("AF"), Some(&scalar("0.2")));
        assert_eq!(t.info.get("RC"), Some(&array(&["10", "12"])));
        // GL for A/A, A/T, T/T with T as allele 2: indices 0, 3, 5
        assert_eq!(t.info.get("GL"), Some(&array(&["0", "3", "5"])));
        assert_eq!(t.info.get("ANN"), Some(&array(&["x", "y"])));
        assert_eq!(t.info.get("UNDECLARED"), Some(&array(&["a", "b"])));
        assert_eq!(t.info.get("DB"), Some(&FieldValue::Flag));
    }

    #[rstest]
    fn test_per_alt_conservation(triallelic: AnnotatedRecord, specs: FieldSpecTable) {
        let records = decompose(&triallelic, &specs).unwrap();
        let source_af = triallelic.info.get("AF").unwrap().as_slice();
        let source_rc = triallelic.info.get("RC").unwrap().as_slice();
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.info.get("AF"), Some(&scalar(&source_af[i])));
            assert_eq!(
                record.info.get("RC"),
                Some(&FieldValue::Array(vec![
                    source_rc[0].clone(),
                    source_rc[i + 1].clone()
                ]))
            );
        }
    }

    #[rstest]
    fn test_format_reindexing(triallelic: AnnotatedRecord, specs: FieldSpecTable) {
        let records = decompose(&triallelic, &specs).unwrap();

        let c = &records[2];
        let s1 = &c.samples[0].fields;
        assert_eq!(s1.get("GT"), Some(&scalar("./.")));
        assert_eq!(s1.get("AD"), Some(&array(&["5", "8"])));
        assert_eq!(s1.get("PL"), Some(&array(&["00", "03", "33"])));
        assert_eq!(s1.get("DS"), Some(&scalar("0.7")));
        assert_eq!(s1.get("FT"), Some(&scalar("PASS")));

        let s2 = &c.samples[1].fields;
        assert_eq!(s2.get("GT"), Some(&scalar("0|1")));
        assert_eq!(s2.get("AD"), Some(&array(&["9", "4"])));

        let g = &records[0];
        assert_eq!(g.samples[0].fields.get("GT"), Some(&scalar("1/.")));
        assert_eq!(g.samples[0].fields.get("PL"), Some(&array(&["00", "01", "11"])));
        assert_eq!(g.samples[1].fields.get("GT"), Some(&scalar("0|.")));
    }

    #[rstest]
    fn test_genotypes_kept_verbatim_when_disabled(
        triallelic: AnnotatedRecord,
        specs: FieldSpecTable,
    ) {
        let options = DecomposeOptions {
            reindex_genotypes: false,
        };
        let records = decompose_with(&triallelic, &specs, options).unwrap();
        assert_eq!(records[2].samples[0].fields.get("GT"), Some(&scalar("1/2")));
    }

    #[rstest]
    fn test_haploid_genotype_field() {
        let set = AlleleSet::new("chrX", 5, "C", strings(&["A", "G"]));
        let record = AnnotatedRecord::new(set).with_samples(vec![
            SampleFields::new("male", fields(&[("GT", "2"), ("PL", "30,20,0")])),
            // no GT: ploidy inferred from the length
            SampleFields::new("nogt", fields(&[("PL", "7,8,9")])),
        ]);
        let specs = FieldSpecTable::new().with_format("PL", "G");
        let records = decompose(&record, &specs).unwrap();

        let g = &records[1];
        assert_eq!(g.samples[0].fields.get("GT"), Some(&scalar("1")));
        assert_eq!(g.samples[0].fields.get("PL"), Some(&array(&["30", "0"])));
        assert_eq!(g.samples[1].fields.get("PL"), Some(&array(&["7", "9"])));
    }

    #[rstest]
    fn test_missing_and_scalar_values_pass_through(specs: FieldSpecTable) {
        let set = AlleleSet::new("chr1", 7, "T", strings(&["A", "C"]));
        let record = AnnotatedRecord::new(set)
            .with_info(fields(&[("AF", "0.5"), ("RC", "."), ("GL", ".")]))
            .with_samples(vec![SampleFields::new("s1", fields(&[("GT", "./."), ("AD", ".")]))]);
        let records = decompose(&record, &specs).unwrap();
        for record in &records {
            assert_eq!(record.info.get("AF"), Some(&scalar("0.5")));
            assert_eq!(record.info.get("RC"), Some(&scalar(".")));
            assert_eq!(record.info.get("GL"), Some(&scalar(".")));
            assert_eq!(record.samples[0].fields.get("GT"), Some(&scalar("./.")));
            assert_eq!(record.samples[0].fields.get("AD"), Some(&scalar(".")));
        }
    }

    #[rstest]
    #[case("AC", "1,2", "INFO/AC", 3, 2)]
    #[case("RC", "1,2,3", "INFO/RC", 4, 3)]
    #[case("GL", "1,2,3", "INFO/GL", 10, 3)]
    fn test_info_arity_mismatch(
        specs: FieldSpecTable,
        #[case] field: &str,
        #[case] raw: &str,
        #[case] qualified: &str,
        #[case] expected: usize,
        #[case] observed: usize,
    ) {
        let set = AlleleSet::new("chr3", 1234, "A", strings(&["G", "T", "C"]));
        let record = AnnotatedRecord::new(set).with_info(fields(&[(field, raw)]));
        let err = decompose(&record, &specs).unwrap_err();
        assert_eq!(
            err,
            VariantError::FieldArityMismatch {
                chrom: "chr3".to_string(),
                pos: 1234,
                field: qualified.to_string(),
                number: specs.info_number(field),
                expected,
                observed,
            }
        );
    }

    #[rstest]
    fn test_format_arity_mismatch_names_sample(specs: FieldSpecTable) {
        let set = AlleleSet::new("chr1", 9, "A", strings(&["G", "T"]));
        let record = AnnotatedRecord::new(set).with_samples(vec![SampleFields::new(
            "NA12878",
            fields(&[("GT", "0/1"), ("PL", "0,1,2,3")]),
        )]);
        let err = decompose(&record, &specs).unwrap_err();
        assert!(matches!(
            err,
            VariantError::FieldArityMismatch { expected: 6, observed: 4, .. }
        ));
        assert!(err.to_string().contains("NA12878"));
    }

    #[rstest]
    fn test_unsupported_ploidy(specs: FieldSpecTable) {
        let set = AlleleSet::new("chr1", 9, "A", strings(&["G", "T"]));
        let record = AnnotatedRecord::new(set).with_samples(vec![SampleFields::new(
            "tetraploid",
            fields(&[("GT", "0/0/1/2"), ("PL", "0,1,2,3,4,5")]),
        )]);
        let err = decompose(&record, &specs).unwrap_err();
        assert!(matches!(err, VariantError::UnsupportedPloidy { ploidy: 4, .. }));
    }

    #[rstest]
    fn test_biallelic_record_is_single_slice(specs: FieldSpecTable) {
        let set = AlleleSet::new("chr1", 9, "A", strings(&["G"]));
        let record = AnnotatedRecord::new(set)
            .with_info(fields(&[("AF", "0.25"), ("RC", "3,1"), ("GL", "0,1,2")]));
        let records = decompose(&record, &specs).unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].is_split());
        assert_eq!(records[0].info, record.info);
    }

    #[rstest]
    #[case("0/1", 1, "0/1")]
    #[case("1/2", 2, "./1")]
    #[case("2|2", 2, "1|1")]
    #[case("2|2", 1, ".|.")]
    #[case("./.", 1, "./.")]
    #[case(".", 1, ".")]
    #[case("1", 1, "1")]
    #[case("0/x", 1, "0/.")]
    fn test_reindex_genotype(#[case] gt: &str, #[case] alt_allele: usize, #[case] expected: &str) {
        assert_eq!(reindex_genotype(gt, alt_allele), expected);
    }
}
