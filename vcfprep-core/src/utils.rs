use std::ffi::OsStr;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Stdout, Write};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

fn is_gzipped(path: &Path) -> bool {
    matches!(
        path.extension().and_then(OsStr::to_str),
        Some("gz") | Some("bgz")
    )
}

///
/// Get a reader for either a gzip'd or non-gzip'd file.
///
/// BGZF files are read with a multi-member decoder, which handles the block structure.
///
/// # Arguments
///
/// - path: path to the file to read
///
pub fn get_dynamic_reader(path: &Path) -> Result<BufReader<Box<dyn Read + Send>>> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    let file: Box<dyn Read + Send> = match is_gzipped(path) {
        true => Box::new(MultiGzDecoder::new(file)),
        false => Box::new(file),
    };

    // 256KB buffer, VCFs are read line by line
    Ok(BufReader::with_capacity(256 * 1024, file))
}

///
/// Same as [`get_dynamic_reader`] but `-` reads from stdin.
///
pub fn get_dynamic_reader_w_stdin(file_path_str: &str) -> Result<BufReader<Box<dyn Read + Send>>> {
    if file_path_str == "-" {
        Ok(BufReader::new(Box::new(std::io::stdin()) as Box<dyn Read + Send>))
    } else {
        get_dynamic_reader(Path::new(file_path_str))
    }
}

/// Writers that need an explicit, fallible final step before they are dropped.
pub trait FinishWrite: Write {
    /// Flush everything and write any trailer. The default only flushes.
    fn try_finish(&mut self) -> io::Result<()> {
        self.flush()
    }
}

impl FinishWrite for Vec<u8> {}

/// Output returned by [`get_dynamic_writer`].
pub enum DynamicWriter {
    Stdout(BufWriter<Stdout>),
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for DynamicWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DynamicWriter::Stdout(w) => w.write(buf),
            DynamicWriter::Plain(w) => w.write(buf),
            DynamicWriter::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DynamicWriter::Stdout(w) => w.flush(),
            DynamicWriter::Plain(w) => w.flush(),
            DynamicWriter::Gzip(w) => w.flush(),
        }
    }
}

impl FinishWrite for DynamicWriter {
    // the gzip trailer is otherwise only written on drop, where errors are lost
    fn try_finish(&mut self) -> io::Result<()> {
        match self {
            DynamicWriter::Gzip(w) => {
                w.try_finish()?;
                w.get_mut().flush()
            }
            other => other.flush(),
        }
    }
}

///
/// Get a writer that gzip-compresses when the path ends in `.gz`. `-` writes to stdout.
///
/// Call [`FinishWrite::try_finish`] when done so write failures at the end are reported.
///
pub fn get_dynamic_writer(file_path_str: &str) -> Result<DynamicWriter> {
    if file_path_str == "-" {
        return Ok(DynamicWriter::Stdout(BufWriter::new(std::io::stdout())));
    }
    let path = Path::new(file_path_str);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    let file = File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    if is_gzipped(path) {
        Ok(DynamicWriter::Gzip(GzEncoder::new(
            BufWriter::new(file),
            Compression::default(),
        )))
    } else {
        Ok(DynamicWriter::Plain(BufWriter::new(file)))
    }
}
