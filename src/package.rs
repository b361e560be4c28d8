//! In-memory view of an OPC (zip) package: part name → bytes.

use std::collections::HashMap;
use std::io::{Read, Seek};

use crate::ParseOptions;
use crate::error::{Diagnostics, Error, WarningKind};

pub(crate) struct Package {
    parts: HashMap<String, Vec<u8>>,
    /// Lowercased name → actual name, for producers that vary casing.
    folded: HashMap<String, String>,
    /// Entries that could not be read and were left out.
    pub(crate) diagnostics: Diagnostics,
}

fn normalize_part_name(name: &str) -> String {
    name.replace('\\', "/").trim_start_matches('/').to_string()
}

impl Package {
    pub(crate) fn open<R: Read + Seek>(reader: R, options: &ParseOptions) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|e| Error::PackageCorrupt(format!("not a ZIP archive: {e}")))?;

        if zip.len() > options.max_entries {
            return Err(Error::LimitExceeded {
                what: format!("{} entries", zip.len()),
                limit: options.max_entries as u64,
            });
        }

        let mut parts = HashMap::new();
        let mut folded = HashMap::new();
        let mut total: u64 = 0;
        let mut diagnostics = Diagnostics::default();

        for i in 0..zip.len() {
            let entry = match zip.by_index(i) {
                Ok(entry) => entry,
                Err(e) => {
                    diagnostics.warn(
                        WarningKind::PartMissing,
                        &format!("#{i}"),
                        format!("unreadable zip entry skipped: {e}"),
                    );
                    continue;
                }
            };
            if entry.is_dir() {
                continue;
            }
            let name = normalize_part_name(entry.name());
            if entry.size() > options.max_part_size {
                return Err(Error::LimitExceeded {
                    what: format!("part {name} declares {} bytes", entry.size()),
                    limit: options.max_part_size,
                });
            }

            // Declared sizes can lie; cap the actual read as well.
            let mut data = Vec::new();
            let read = entry
                .take(options.max_part_size + 1)
                .read_to_end(&mut data);
            if let Err(e) = read {
                diagnostics.warn(
                    WarningKind::PartMissing,
                    &name,
                    format!("zip entry could not be read: {e}"),
                );
                continue;
            }
            if data.len() as u64 > options.max_part_size {
                return Err(Error::LimitExceeded {
                    what: format!("part {name} inflates past the part limit"),
                    limit: options.max_part_size,
                });
            }
            total += data.len() as u64;
            if total > options.max_total_size {
                return Err(Error::LimitExceeded {
                    what: "total uncompressed package size".into(),
                    limit: options.max_total_size,
                });
            }

            folded.insert(name.to_lowercase(), name.clone());
            parts.insert(name, data);
        }

        log::debug!("Read {} package parts ({} bytes)", parts.len(), total);
        Ok(Package {
            parts,
            folded,
            diagnostics,
        })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&[u8]> {
        let name = normalize_part_name(name);
        self.parts
            .get(&name)
            .or_else(|| {
                self.folded
                    .get(&name.to_lowercase())
                    .and_then(|actual| self.parts.get(actual))
            })
            .map(Vec::as_slice)
    }

    /// Part content as text. A UTF-8 BOM is stripped; invalid UTF-8 yields `None`.
    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        let bytes = self.get(name)?;
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        std::str::from_utf8(bytes).ok()
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub(crate) fn part_names(&self) -> impl Iterator<Item = &str> {
        self.parts.keys().map(String::as_str)
    }
}

/// `word/document.xml` → `word/_rels/document.xml.rels`
pub(crate) fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/_rels/{file}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target relative to the part that owns the
/// relationship, handling absolute targets and `..` segments.
pub(crate) fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.replace('\\', "/");
    if let Some(abs) = target.strip_prefix('/') {
        return abs.to_string();
    }
    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };
    for seg in target.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn rels_path() {
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for("word/header1.xml"), "word/_rels/header1.xml.rels");
        assert_eq!(rels_path_for("root.xml"), "_rels/root.xml.rels");
    }

    #[test]
    fn targets_resolve_relative_to_source_part() {
        assert_eq!(resolve_target("word/document.xml", "media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("word/document.xml", "/word/media/a.png"), "word/media/a.png");
        assert_eq!(resolve_target("word/document.xml", "../customXml/item1.xml"), "customXml/item1.xml");
        assert_eq!(resolve_target("", "word/document.xml"), "word/document.xml");
    }

    #[test]
    fn lookup_is_case_tolerant() {
        let bytes = zip_bytes(&[("Word/Document.xml", b"<x/>")]);
        let pkg = Package::open(Cursor::new(bytes), &ParseOptions::default()).unwrap();
        assert_eq!(pkg.text("word/document.xml"), Some("<x/>"));
        assert!(pkg.contains("/Word/Document.xml"));
        assert!(!pkg.contains("word/styles.xml"));
    }

    #[test]
    fn garbage_is_package_corrupt() {
        let err = Package::open(Cursor::new(b"not a zip".to_vec()), &ParseOptions::default());
        assert!(matches!(err, Err(Error::PackageCorrupt(_))));
    }

    #[test]
    fn oversized_part_is_rejected() {
        let big = vec![b'a'; 4096];
        let bytes = zip_bytes(&[("word/document.xml", &big)]);
        let options = ParseOptions {
            max_part_size: 1024,
            ..ParseOptions::default()
        };
        let err = Package::open(Cursor::new(bytes), &options);
        assert!(matches!(err, Err(Error::LimitExceeded { .. })));
    }
}
