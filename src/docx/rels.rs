use std::collections::HashMap;

use crate::error::{Diagnostics, Error, WarningKind};
use crate::model::ImageData;
use crate::package::{Package, rels_path_for, resolve_target};

use super::xml::{is, parse_xml};

pub(crate) const TYPE_OFFICE_DOCUMENT: &str = "officeDocument";
pub(crate) const TYPE_STYLES: &str = "styles";
pub(crate) const TYPE_THEME: &str = "theme";
pub(crate) const TYPE_NUMBERING: &str = "numbering";
pub(crate) const TYPE_FONT_TABLE: &str = "fontTable";
pub(crate) const TYPE_SETTINGS: &str = "settings";
pub(crate) const TYPE_CORE_PROPERTIES: &str = "core-properties";
pub(crate) const TYPE_EXTENDED_PROPERTIES: &str = "extended-properties";

#[derive(Clone, Debug)]
pub(crate) struct Relationship {
    pub(crate) target: String,
    pub(crate) rel_type: String,
    pub(crate) external: bool,
}

/// Relationships of one source part, keyed by `Id`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Relationships {
    source: String,
    map: HashMap<String, Relationship>,
    /// Ids in document order, for deterministic type lookups.
    order: Vec<String>,
}

impl Relationships {
    pub(crate) fn parse(
        source_part: &str,
        xml_content: &str,
        nodes_limit: u32,
    ) -> Result<Self, roxmltree::Error> {
        let xml = parse_xml(xml_content, nodes_limit)?;
        let mut rels = Relationships {
            source: source_part.to_string(),
            ..Default::default()
        };
        for node in xml.root_element().children() {
            if !is(node, "Relationship") {
                continue;
            }
            let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target")) else {
                continue;
            };
            rels.order.push(id.to_string());
            rels.map.insert(
                id.to_string(),
                Relationship {
                    target: target.to_string(),
                    rel_type: node.attribute("Type").unwrap_or("").to_string(),
                    external: node.attribute("TargetMode") == Some("External"),
                },
            );
        }
        Ok(rels)
    }

    /// Load `<dir>/_rels/<file>.rels` for `source_part`. A missing rels part is
    /// normal (no outgoing references); a malformed one is reported. Only the
    /// node cap aborts the parse.
    pub(crate) fn load(
        package: &Package,
        source_part: &str,
        nodes_limit: u32,
        diagnostics: &mut Diagnostics,
    ) -> Result<Self, Error> {
        let empty = || Relationships {
            source: source_part.to_string(),
            ..Default::default()
        };
        let rels_path = rels_path_for(source_part);
        let Some(xml_content) = package.text(&rels_path) else {
            if package.contains(&rels_path) {
                diagnostics.warn(WarningKind::MalformedXml, &rels_path, "part is not valid UTF-8");
            } else {
                log::debug!("No relationships for {source_part}");
            }
            return Ok(empty());
        };
        match Self::parse(source_part, xml_content, nodes_limit) {
            Ok(rels) => Ok(rels),
            Err(roxmltree::Error::NodesLimitReached) => Err(Error::LimitExceeded {
                what: format!("XML nodes in {rels_path}"),
                limit: u64::from(nodes_limit),
            }),
            Err(e) => {
                diagnostics.warn(
                    WarningKind::MalformedXml,
                    &rels_path,
                    format!("relationship part could not be parsed: {e}"),
                );
                Ok(empty())
            }
        }
    }

    pub(crate) fn get(&self, id: &str) -> Option<&Relationship> {
        self.map.get(id)
    }

    /// Package path of an internal target.
    pub(crate) fn resolve_part(&self, id: &str) -> Option<String> {
        let rel = self.get(id)?;
        if rel.external {
            return None;
        }
        Some(resolve_target(&self.source, &rel.target))
    }

    /// URL of an external target (hyperlinks).
    pub(crate) fn external_target(&self, id: &str) -> Option<&str> {
        self.get(id).map(|r| r.target.as_str())
    }

    /// First internal part whose relationship type ends in `/<type_suffix>`.
    pub(crate) fn find_by_type(&self, type_suffix: &str) -> Option<String> {
        self.order.iter().find_map(|id| {
            let rel = &self.map[id];
            let matches = rel
                .rel_type
                .rsplit('/')
                .next()
                .is_some_and(|t| t == type_suffix);
            (matches && !rel.external).then(|| resolve_target(&self.source, &rel.target))
        })
    }
}

/// Look up `id` among `rels`, load the target bytes and tag them with a MIME
/// type. Returns the package path (the image's identity) with the data.
/// Unknown ids and missing targets are reported and yield `None`.
pub(crate) fn resolve_image_by_rel_id(
    package: &Package,
    rels: &Relationships,
    id: &str,
    diagnostics: &mut Diagnostics,
) -> Option<(String, ImageData)> {
    let Some(path) = rels.resolve_part(id) else {
        diagnostics.warn(
            WarningKind::RelationshipUnresolved,
            &rels.source,
            format!("image relationship {id} not found or external"),
        );
        return None;
    };
    let Some(data) = package.get(&path) else {
        diagnostics.warn(
            WarningKind::RelationshipUnresolved,
            &rels.source,
            format!("image relationship {id} targets missing part {path}"),
        );
        return None;
    };
    let dims = image_dimensions(data);
    Some((
        path.clone(),
        ImageData {
            mime: detect_mime(data, &path).to_string(),
            data: data.to_vec(),
            pixel_width: dims.map(|d| d.0),
            pixel_height: dims.map(|d| d.1),
        },
    ))
}

pub(crate) fn detect_mime(data: &[u8], path: &str) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        return "image/png";
    }
    if data.starts_with(&[0xFF, 0xD8]) {
        return "image/jpeg";
    }
    if data.starts_with(b"GIF8") {
        return "image/gif";
    }
    if data.starts_with(b"BM") {
        return "image/bmp";
    }
    if data.starts_with(b"II*\0") || data.starts_with(b"MM\0*") {
        return "image/tiff";
    }
    if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        return "image/webp";
    }
    if data.len() >= 44 && data[0..4] == [1, 0, 0, 0] && &data[40..44] == b" EMF" {
        return "image/emf";
    }
    if data.starts_with(&[0xD7, 0xCD, 0xC6, 0x9A]) {
        return "image/wmf";
    }
    let ext = path
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/emf",
        "wmf" => "image/wmf",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Pixel dimensions from the image header, where cheaply available.
pub(crate) fn image_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    // JPEG: walk segments until a SOF marker
    if data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8 {
        let mut i = 2;
        while i + 4 < data.len() {
            if data[i] != 0xFF {
                return None;
            }
            let marker = data[i + 1];
            if marker == 0xD9 {
                break;
            }
            let len = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            if matches!(marker, 0xC0 | 0xC1 | 0xC2) && i + 9 < data.len() {
                let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
                let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
                return Some((width, height));
            }
            i += 2 + len;
        }
        return None;
    }

    // PNG: IHDR at bytes 16-23
    if data.len() >= 24 && data.starts_with(&[0x89, b'P', b'N', b'G']) {
        let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
        let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
        return Some((width, height));
    }

    // GIF: logical screen descriptor, little-endian
    if data.len() >= 10 && data.starts_with(b"GIF8") {
        let width = u16::from_le_bytes([data[6], data[7]]) as u32;
        let height = u16::from_le_bytes([data[8], data[9]]) as u32;
        return Some((width, height));
    }

    // BMP: BITMAPINFOHEADER, height may be negative for top-down bitmaps
    if data.len() >= 26 && data.starts_with(b"BM") {
        let width = i32::from_le_bytes([data[18], data[19], data[20], data[21]]);
        let height = i32::from_le_bytes([data[22], data[23], data[24], data[25]]);
        return Some((width.unsigned_abs(), height.unsigned_abs()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/" TargetMode="External"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/>
</Relationships>"#;

    #[test]
    fn parse_and_resolve() {
        let rels = Relationships::parse("word/document.xml", RELS, 10_000).unwrap();
        assert_eq!(rels.resolve_part("rId2").as_deref(), Some("word/media/image1.png"));
        assert_eq!(rels.resolve_part("rId3"), None);
        assert_eq!(rels.external_target("rId3"), Some("https://example.com/"));
        assert_eq!(rels.find_by_type(TYPE_STYLES).as_deref(), Some("word/styles.xml"));
        assert_eq!(rels.find_by_type(TYPE_THEME).as_deref(), Some("word/theme/theme1.xml"));
        assert_eq!(rels.find_by_type(TYPE_NUMBERING), None);
        assert!(rels.get("rId99").is_none());
    }

    #[test]
    fn mime_sniffing_prefers_magic_bytes() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime(&png, "word/media/image1.jpeg"), "image/png");
        assert_eq!(detect_mime(&[0xFF, 0xD8, 0xFF], "x.bin"), "image/jpeg");
        assert_eq!(detect_mime(b"<svg/>", "word/media/logo.svg"), "image/svg+xml");
        assert_eq!(detect_mime(b"??", "word/media/blob"), "application/octet-stream");
    }

    #[test]
    fn png_dimensions() {
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0, 0, 0, 13]);
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&640u32.to_be_bytes());
        png.extend_from_slice(&480u32.to_be_bytes());
        assert_eq!(image_dimensions(&png), Some((640, 480)));
        assert_eq!(image_dimensions(b"nothing"), None);
    }
}
