//! Streaming normalize, decompose and QC over a VCF.
//!
//! A reader thread parses records into batches and pushes them through a bounded
//! channel; batches are processed on a rayon pool and written to the sink in file order.

use std::io::BufRead;
use std::thread;

use anyhow::{Context, Result, anyhow};
use crossbeam_channel::{Receiver, Sender, bounded};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use vcfprep_core::errors::VariantError;
use vcfprep_core::models::{AlleleSet, AnnotatedRecord, DecomposedRecord, FieldSpecTable};
use vcfprep_qc::QcMetrics;
use vcfprep_variants::{
    ReferenceFetch, VariantType, classify_variant, decompose_with, normalize_allele_set,
    reindex_genotype,
};

use crate::config::PipelineConfig;
use crate::error::VcfError;
use crate::reader::VcfReader;

/// A decomposed record ready for loading.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRecord {
    pub record: DecomposedRecord,
    pub variant_type: VariantType,
    /// Present when QC is enabled and the record carries GT calls.
    pub qc: Option<QcMetrics>,
}

/// Destination of processed records, called in input order from a single thread.
pub trait RecordSink {
    fn write_record(&mut self, record: &ProcessedRecord) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl RecordSink for Vec<ProcessedRecord> {
    fn write_record(&mut self, record: &ProcessedRecord) -> Result<()> {
        self.push(record.clone());
        Ok(())
    }
}

/// Totals of one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub records_in: u64,
    pub records_out: u64,
    /// Multi-allelic input records that were split.
    pub multiallelic_split: u64,
    /// Input records whose position or alleles changed during normalization.
    pub normalized: u64,
    pub malformed_skipped: u64,
}

/// Result of processing one input record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutput {
    pub records: Vec<ProcessedRecord>,
    pub normalized: bool,
    pub split: bool,
}

pub struct StreamingPipeline {
    config: PipelineConfig,
    reference: Option<Box<dyn ReferenceFetch>>,
    progress: Option<ProgressBar>,
}

impl StreamingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        StreamingPipeline {
            config,
            reference: None,
            progress: None,
        }
    }

    /// Use `reference` to left-align indels.
    pub fn with_reference<F: ReferenceFetch + 'static>(mut self, reference: F) -> Self {
        self.reference = Some(Box::new(reference));
        self
    }

    /// Advance `progress` by the number of input records processed.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn reference_for(&self, chrom: &str) -> Option<&dyn ReferenceFetch> {
        let reference = self.reference.as_deref()?;
        if self.config.skip_unknown_chrom && !reference.has_contig(chrom) {
            debug!("{} is not in the reference, normalizing without it", chrom);
            return None;
        }
        Some(reference)
    }

    ///
    /// Normalize, decompose and summarize a single record.
    ///
    /// With decomposition disabled, a multi-allelic record is emitted whole (ALTs joined
    /// by `,`) with fields untouched and no QC, since the biallelic metrics do not apply.
    ///
    pub fn process_record(
        &self,
        mut record: AnnotatedRecord,
        field_specs: &FieldSpecTable,
    ) -> Result<RecordOutput, VariantError> {
        let reference = self.reference_for(&record.allele_set.chrom);

        let mut normalized = false;
        if self.config.normalize {
            normalized = normalize_allele_set(&mut record.allele_set, reference)?;
        }

        let multiallelic = record.allele_set.is_multiallelic();
        let keep_whole = multiallelic && !self.config.decompose;
        let split = multiallelic && self.config.decompose;

        let parts = if keep_whole {
            vec![undecomposed(record)]
        } else {
            decompose_with(&record, field_specs, self.config.decompose_options())?
        };

        let mut records = Vec::with_capacity(parts.len());
        for mut part in parts {
            if split && self.config.normalize_decomposed {
                normalized |= renormalize(&mut part, reference)?;
            }
            let first_alt = part.alt.split(',').next().unwrap_or_default();
            let variant_type = classify_variant(&part.ref_allele, first_alt);
            // verbatim GT on a split record still names the other ALTs
            let remap_calls = split && !self.config.reindex_genotypes;
            let qc = (self.config.compute_qc && !keep_whole && part.has_genotypes())
                .then(|| split_record_qc(&part, remap_calls));
            records.push(ProcessedRecord {
                record: part,
                variant_type,
                qc,
            });
        }

        Ok(RecordOutput {
            records,
            normalized,
            split,
        })
    }

    ///
    /// Stream every record of `reader` through the pipeline into `sink`.
    ///
    /// Malformed data lines are logged and skipped. Arity, reference and IO failures
    /// abort the run.
    ///
    pub fn run<R: BufRead + Send>(
        &self,
        reader: VcfReader<R>,
        sink: &mut dyn RecordSink,
    ) -> Result<PipelineStats> {
        let span = info_span!(
            "pipeline",
            batch_size = self.config.batch_size,
            threads = self.config.threads
        );
        let _enter = span.enter();

        let field_specs = reader.header().field_specs.clone();
        info!(
            "processing VCF with {} samples and {} declared fields",
            reader.header().samples.len(),
            field_specs.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.threads)
            .build()
            .context("Failed to build worker thread pool")?;
        let (tx, rx) = bounded(self.config.channel_capacity);
        let batch_size = self.config.batch_size;

        let stats = thread::scope(|scope| -> Result<PipelineStats> {
            let reader_span = span.clone();
            let producer = scope.spawn(move || {
                let _enter = reader_span.enter();
                read_batches(reader, batch_size, tx)
            });

            // returning drops `rx`, which unblocks the reader if we stop early
            let consumed = self.consume(rx, &field_specs, &pool, sink);
            let read = producer
                .join()
                .map_err(|_| anyhow!("VCF reader thread panicked"))?;

            let mut stats = consumed?;
            stats.malformed_skipped = read.context("Failed to read VCF")?;
            Ok(stats)
        })?;

        info!(
            "done: {} records in, {} records out, {} split, {} normalized, {} malformed lines skipped",
            stats.records_in,
            stats.records_out,
            stats.multiallelic_split,
            stats.normalized,
            stats.malformed_skipped
        );
        Ok(stats)
    }

    fn consume(
        &self,
        rx: Receiver<Vec<AnnotatedRecord>>,
        field_specs: &FieldSpecTable,
        pool: &rayon::ThreadPool,
        sink: &mut dyn RecordSink,
    ) -> Result<PipelineStats> {
        let mut stats = PipelineStats::default();

        for batch in rx {
            let n_records = batch.len() as u64;
            let outputs: Vec<Result<RecordOutput, VariantError>> = pool.install(|| {
                batch
                    .into_par_iter()
                    .map(|record| self.process_record(record, field_specs))
                    .collect()
            });

            for output in outputs {
                let output = output.context("Aborting pipeline")?;
                stats.records_in += 1;
                stats.records_out += output.records.len() as u64;
                stats.multiallelic_split += output.split as u64;
                stats.normalized += output.normalized as u64;
                for record in &output.records {
                    sink.write_record(record)?;
                }
            }

            if let Some(progress) = &self.progress {
                progress.inc(n_records);
            }
        }

        sink.finish()?;
        Ok(stats)
    }
}

fn split_record_qc(part: &DecomposedRecord, remap_calls: bool) -> QcMetrics {
    if remap_calls {
        let alt_allele = part.alt_index + 1;
        QcMetrics::from_calls(
            part.genotype_calls()
                .map(|gt| reindex_genotype(gt, alt_allele)),
        )
    } else {
        QcMetrics::from_calls(part.genotype_calls())
    }
}

fn undecomposed(record: AnnotatedRecord) -> DecomposedRecord {
    let AnnotatedRecord {
        allele_set,
        info,
        samples,
    } = record;
    DecomposedRecord {
        n_source_alts: allele_set.n_alts(),
        alt: allele_set.alts.join(","),
        chrom: allele_set.chrom,
        pos: allele_set.pos,
        ref_allele: allele_set.ref_allele,
        info,
        samples,
        alt_index: 0,
    }
}

fn renormalize(
    part: &mut DecomposedRecord,
    reference: Option<&dyn ReferenceFetch>,
) -> Result<bool, VariantError> {
    let mut alleles = AlleleSet {
        chrom: std::mem::take(&mut part.chrom),
        pos: part.pos,
        ref_allele: std::mem::take(&mut part.ref_allele),
        alts: vec![std::mem::take(&mut part.alt)],
    };
    let changed = normalize_allele_set(&mut alleles, reference)?;

    part.chrom = alleles.chrom;
    part.pos = alleles.pos;
    part.ref_allele = alleles.ref_allele;
    part.alt = alleles.alts.pop().unwrap_or_default();
    Ok(changed)
}

fn read_batches<R: BufRead>(
    reader: VcfReader<R>,
    batch_size: usize,
    tx: Sender<Vec<AnnotatedRecord>>,
) -> Result<u64, VcfError> {
    let mut malformed = 0u64;
    let mut batch = Vec::with_capacity(batch_size);

    for item in reader {
        match item {
            Ok(record) => {
                batch.push(record);
                if batch.len() == batch_size {
                    let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                    if tx.send(full).is_err() {
                        debug!("record consumer stopped, closing reader");
                        return Ok(malformed);
                    }
                }
            }
            Err(e) if e.is_recoverable() => {
                warn!("skipping {}", e);
                malformed += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if !batch.is_empty() && tx.send(batch).is_err() {
        debug!("record consumer stopped before the last batch");
    }
    Ok(malformed)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};
    use vcfprep_core::models::{FieldMap, FieldValue, SampleFields};
    use vcfprep_variants::InMemoryReference;

    #[fixture]
    fn specs() -> FieldSpecTable {
        FieldSpecTable::new()
            .with_info("AF", "A")
            .with_format("AD", "R")
    }

    fn sample(id: &str, gt: &str, ad: &str) -> SampleFields {
        let mut fields = FieldMap::new();
        fields.insert("GT", FieldValue::parse(gt));
        fields.insert("AD", FieldValue::parse(ad));
        SampleFields::new(id, fields)
    }

    fn triallelic() -> AnnotatedRecord {
        let info: FieldMap = vec![("AF", FieldValue::parse("0.25,0.5"))]
            .into_iter()
            .collect();
        AnnotatedRecord::new(AlleleSet::new(
            "chr1",
            4,
            "CAC",
            vec!["CGC".to_string(), "C".to_string()],
        ))
        .with_info(info)
        .with_samples(vec![
            sample("S1", "0/1", "5,3,0"),
            sample("S2", "1/2", "0,4,4"),
            sample("S3", "2/2", "0,0,9"),
        ])
    }

    #[rstest]
    fn test_process_splits_and_renormalizes(specs: FieldSpecTable) {
        let reference = InMemoryReference::new().with_contig("chr1", "GGGCACACATTAAAAG");
        let pipeline = StreamingPipeline::new(PipelineConfig::default()).with_reference(reference);

        let output = pipeline.process_record(triallelic(), &specs).unwrap();
        assert!(output.split);
        assert_eq!(output.records.len(), 2);

        let snp = &output.records[0];
        assert_eq!(
            (snp.record.pos, snp.record.ref_allele.as_str(), snp.record.alt.as_str()),
            (5, "A", "G")
        );
        assert_eq!(snp.variant_type, VariantType::Snp);
        assert_eq!(snp.record.info.get("AF"), Some(&FieldValue::Scalar("0.25".to_string())));

        let del = &output.records[1];
        assert_eq!(del.variant_type, VariantType::Indel);
        assert_eq!(del.record.alt.len() + 2, del.record.ref_allele.len());

        // S1 0/1 het; S2 1/2 -> 1/. uncalled; S3 2/2 -> ./. uncalled
        let qc = snp.qc.unwrap();
        assert_eq!(qc.counts.n_called, 1);
        assert_eq!(qc.counts.n_het, 1);
    }

    #[rstest]
    fn test_qc_counts_own_alt_when_genotypes_kept_verbatim(specs: FieldSpecTable) {
        let record = AnnotatedRecord::new(AlleleSet::new(
            "chr1",
            50,
            "A",
            vec!["C".to_string(), "G".to_string()],
        ))
        .with_samples(vec![
            sample("S1", "2/2", "0,0,7"),
            sample("S2", "2/2", "0,0,5"),
            sample("S3", "0/0", "6,0,0"),
        ]);

        let reindexed = StreamingPipeline::new(PipelineConfig::default())
            .process_record(record.clone(), &specs)
            .unwrap();
        let verbatim = StreamingPipeline::new(PipelineConfig {
            reindex_genotypes: false,
            ..PipelineConfig::default()
        })
        .process_record(record, &specs)
        .unwrap();

        // GT column is written as given, QC still describes each ALT on its own
        assert_eq!(
            verbatim.records[0].record.samples[0].genotype(),
            Some("2/2")
        );
        for (kept, mapped) in verbatim.records.iter().zip(&reindexed.records) {
            assert_eq!(kept.qc, mapped.qc);
        }

        let c = verbatim.records[0].qc.unwrap();
        assert_eq!(c.counts.n_called, 1);
        assert_eq!(c.counts.n_hom_alt, 0);
        assert_eq!(c.aaf, Some(0.0));

        let g = verbatim.records[1].qc.unwrap();
        assert_eq!(g.counts.n_called, 3);
        assert_eq!(g.counts.n_hom_alt, 2);
        assert_eq!(g.mac, Some(2));
    }

    #[rstest]
    fn test_keep_multiallelic_whole(specs: FieldSpecTable) {
        let config = PipelineConfig {
            decompose: false,
            ..PipelineConfig::default()
        };
        let output = StreamingPipeline::new(config)
            .process_record(triallelic(), &specs)
            .unwrap();
        assert!(!output.split);
        assert_eq!(output.records.len(), 1);
        assert_eq!(output.records[0].record.alt, "CGC,C");
        assert_eq!(output.records[0].qc, None);
    }

    #[rstest]
    fn test_unknown_contig(specs: FieldSpecTable) {
        let record = AnnotatedRecord::new(AlleleSet::new(
            "chrUn",
            3,
            "CA",
            vec!["A".to_string()],
        ));
        let reference = InMemoryReference::new().with_contig("chr1", "ACGT");

        let strict = StreamingPipeline::new(PipelineConfig::default()).with_reference(reference.clone());
        let err = strict.process_record(record.clone(), &specs).unwrap_err();
        assert!(matches!(err, VariantError::Reference { .. }));

        let lenient = StreamingPipeline::new(PipelineConfig {
            skip_unknown_chrom: true,
            ..PipelineConfig::default()
        })
        .with_reference(reference);
        let output = lenient.process_record(record, &specs).unwrap();
        assert_eq!(output.records[0].record.pos, 3);
    }

    #[rstest]
    fn test_run_preserves_order_and_counts() {
        let mut vcf = String::from(
            "##INFO=<ID=AF,Number=A,Type=Float>\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n",
        );
        for pos in 1..=25 {
            vcf.push_str(&format!("chr1\t{}\t.\tA\tC,G\t.\t.\tAF=0.1,0.2\n", pos * 10));
        }
        vcf.push_str("chr1\tbad\t.\tA\tC\t.\t.\t.\n");

        let config = PipelineConfig {
            batch_size: 4,
            channel_capacity: 1,
            threads: 2,
            ..PipelineConfig::default()
        };
        let reader = VcfReader::new(Cursor::new(vcf)).unwrap();
        let mut sink: Vec<ProcessedRecord> = Vec::new();
        let stats = StreamingPipeline::new(config).run(reader, &mut sink).unwrap();

        assert_eq!(
            stats,
            PipelineStats {
                records_in: 25,
                records_out: 50,
                multiallelic_split: 25,
                normalized: 0,
                malformed_skipped: 1,
            }
        );
        let positions: Vec<u64> = sink.iter().map(|r| r.record.pos).collect();
        let expected: Vec<u64> = (1..=25).flat_map(|p| [p * 10, p * 10]).collect();
        assert_eq!(positions, expected);
    }

    #[rstest]
    fn test_run_aborts_on_arity_mismatch() {
        let vcf = "##INFO=<ID=AF,Number=A,Type=Float>\n\
                   #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
                   chr1\t10\t.\tA\tC,G\t.\t.\tAF=0.1,0.2,0.3\n";
        let reader = VcfReader::new(Cursor::new(vcf)).unwrap();
        let mut sink: Vec<ProcessedRecord> = Vec::new();
        let err = StreamingPipeline::new(PipelineConfig::default())
            .run(reader, &mut sink)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("chr1:10"));
    }
}
