//! In-memory DOCX packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture" "#,
    r#"xmlns:v="urn:schemas-microsoft-com:vml" "#,
    r#"xmlns:o="urn:schemas-microsoft-com:office:office""#,
);

const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// A PNG signature plus IHDR, enough for MIME sniffing and dimensions.
pub fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data
}

pub fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document {NAMESPACES}><w:body>{body}</w:body></w:document>"#
    )
}

pub fn styles_xml(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles {NAMESPACES}>{inner}</w:styles>"#
    )
}

pub fn numbering_xml(inner: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering {NAMESPACES}>{inner}</w:numbering>"#
    )
}

pub fn header_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:hdr {NAMESPACES}>{body}</w:hdr>"#
    )
}

pub fn footer_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:ftr {NAMESPACES}>{body}</w:ftr>"#
    )
}

pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t xml:space=\"preserve\">{text}</w:t></w:r></w:p>")
}

pub const THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Test Theme">
  <a:themeElements>
    <a:clrScheme name="Test">
      <a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1>
      <a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1>
      <a:dk2><a:srgbClr val="1F3864"/></a:dk2>
      <a:lt2><a:srgbClr val="EEECE1"/></a:lt2>
      <a:accent1><a:srgbClr val="C00000"/></a:accent1>
      <a:accent2><a:srgbClr val="00B050"/></a:accent2>
      <a:accent3><a:prstClr val="blue"/></a:accent3>
      <a:accent4><a:srgbClr val="7030A0"/></a:accent4>
      <a:accent5><a:schemeClr val="accent1"/></a:accent5>
      <a:accent6><a:srgbClr val="FFC000"/></a:accent6>
      <a:hlink><a:srgbClr val="0563C1"/></a:hlink>
      <a:folHlink><a:srgbClr val="954F72"/></a:folHlink>
    </a:clrScheme>
    <a:fontScheme name="Test">
      <a:majorFont><a:latin typeface="Georgia"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Verdana"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
  </a:themeElements>
</a:theme>"#;

struct Rel {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

fn rels_xml(rels: &[Rel]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for rel in rels {
        let mode = if rel.external { r#" TargetMode="External""# } else { "" };
        out.push_str(&format!(
            r#"<Relationship Id="{}" Type="{REL_BASE}/{}" Target="{}"{mode}/>"#,
            rel.id, rel.rel_type, rel.target
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// Builds a DOCX package: a main document plus whichever optional parts a
/// test adds. Relationships from the document are declared with `rel`.
#[derive(Default)]
pub struct DocxBuilder {
    document: Option<String>,
    parts: Vec<(String, Vec<u8>)>,
    rels: Vec<Rel>,
    part_rels: Vec<(String, Vec<Rel>)>,
}

impl DocxBuilder {
    pub fn new(body: &str) -> Self {
        DocxBuilder {
            document: Some(document_xml(body)),
            ..Default::default()
        }
    }

    /// A package with no `word/document.xml` at all.
    pub fn without_document() -> Self {
        DocxBuilder::default()
    }

    fn next_id(&self) -> String {
        format!("rIdB{}", self.rels.len() + 1)
    }

    pub fn part(mut self, name: &str, data: impl Into<Vec<u8>>) -> Self {
        self.parts.push((name.to_string(), data.into()));
        self
    }

    pub fn rel(mut self, id: &str, rel_type: &str, target: &str) -> Self {
        self.rels.push(Rel {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        });
        self
    }

    pub fn external_rel(mut self, id: &str, rel_type: &str, target: &str) -> Self {
        self.rels.push(Rel {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: true,
        });
        self
    }

    /// Relationship owned by a part other than the main document.
    pub fn part_rel(mut self, part: &str, id: &str, rel_type: &str, target: &str) -> Self {
        let rel = Rel {
            id: id.to_string(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            external: false,
        };
        match self.part_rels.iter_mut().find(|(p, _)| p == part) {
            Some((_, rels)) => rels.push(rel),
            None => self.part_rels.push((part.to_string(), vec![rel])),
        }
        self
    }

    fn with_related(self, rel_type: &str, name: &str, xml: &str) -> Self {
        let id = self.next_id();
        let target = name.trim_start_matches("word/").to_string();
        self.part(name, xml.as_bytes().to_vec()).rel(&id, rel_type, &target)
    }

    pub fn styles(self, xml: &str) -> Self {
        self.with_related("styles", "word/styles.xml", xml)
    }

    pub fn theme(self, xml: &str) -> Self {
        self.with_related("theme", "word/theme/theme1.xml", xml)
    }

    pub fn numbering(self, xml: &str) -> Self {
        self.with_related("numbering", "word/numbering.xml", xml)
    }

    pub fn settings(self, xml: &str) -> Self {
        self.with_related("settings", "word/settings.xml", xml)
    }

    pub fn build(self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut put = |name: &str, data: &[u8]| {
            zip.start_file(name, options).unwrap();
            zip.write_all(data).unwrap();
        };

        put(
            "[Content_Types].xml",
            br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="png" ContentType="image/png"/>
</Types>"#,
        );

        let mut package_rels = Vec::new();
        if let Some(document) = &self.document {
            package_rels.push(Rel {
                id: "rId1".into(),
                rel_type: "officeDocument".into(),
                target: "word/document.xml".into(),
                external: false,
            });
            put("word/document.xml", document.as_bytes());
        }
        if self.parts.iter().any(|(n, _)| n == "docProps/core.xml") {
            package_rels.push(Rel {
                id: "rId2".into(),
                rel_type: "metadata/core-properties".into(),
                target: "docProps/core.xml".into(),
                external: false,
            });
        }
        put("_rels/.rels", rels_xml(&package_rels).as_bytes());
        if !self.rels.is_empty() {
            put("word/_rels/document.xml.rels", rels_xml(&self.rels).as_bytes());
        }
        for (part, rels) in &self.part_rels {
            let (dir, file) = part.rsplit_once('/').unwrap_or(("", part));
            put(&format!("{dir}/_rels/{file}.rels"), rels_xml(rels).as_bytes());
        }
        for (name, data) in &self.parts {
            put(name, data);
        }

        zip.finish().unwrap().into_inner()
    }
}
