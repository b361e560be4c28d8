pub mod color;
mod docx;
mod error;
mod fonts;
mod model;
mod package;
pub mod units;

pub use error::{Error, Warning, WarningKind};
pub use fonts::{FontClass, classify, font_fallback, font_fallback_with_class};
pub use model::*;

use std::io::Cursor;
use std::path::Path;
use std::time::Instant;

use package::Package;

/// Resource caps applied while reading a package. Exceeding any of them is
/// fatal ([`Error::LimitExceeded`]); the defaults admit any realistic document.
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Largest uncompressed size accepted for a single part.
    pub max_part_size: u64,
    /// Largest uncompressed size accepted for the whole package.
    pub max_total_size: u64,
    pub max_entries: usize,
    /// Node cap per XML part.
    pub max_xml_nodes: u32,
    /// Materialize image bytes. When off, image references keep their
    /// package paths but `DocumentModel::images` stays empty.
    pub include_images: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            max_part_size: 64 * 1024 * 1024,
            max_total_size: 512 * 1024 * 1024,
            max_entries: 10_000,
            max_xml_nodes: 5_000_000,
            include_images: true,
        }
    }
}

pub fn parse_docx(path: &Path) -> Result<DocumentModel, Error> {
    parse_docx_with_options(path, &ParseOptions::default())
}

pub fn parse_docx_with_options(path: &Path, options: &ParseOptions) -> Result<DocumentModel, Error> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => Error::Io(
            std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())),
        ),
        _ => Error::Io(e),
    })?;
    parse_reader(std::io::BufReader::new(file), options)
}

pub fn parse_docx_bytes(input: &[u8]) -> Result<DocumentModel, Error> {
    parse_docx_bytes_with_options(input, &ParseOptions::default())
}

pub fn parse_docx_bytes_with_options(
    input: &[u8],
    options: &ParseOptions,
) -> Result<DocumentModel, Error> {
    parse_reader(Cursor::new(input), options)
}

fn parse_reader<R: std::io::Read + std::io::Seek>(
    reader: R,
    options: &ParseOptions,
) -> Result<DocumentModel, Error> {
    let t0 = Instant::now();

    let package = Package::open(reader, options)?;
    let t_read = t0.elapsed();

    let model = docx::parse_package(&package, options)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: read={:.1}ms, parse={:.1}ms, total={:.1}ms ({} blocks, {} warnings)",
        t_read.as_secs_f64() * 1000.0,
        (t_total - t_read).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        model.body.len(),
        model.warnings.len(),
    );

    Ok(model)
}
