mod common;

use common::{DocxBuilder, NAMESPACES};
use docxide_model::{DocumentModel, WarningKind, parse_docx_bytes};

const JAPANESE_THEME: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Japanese">
  <a:themeElements>
    <a:fontScheme name="Japanese">
      <a:majorFont><a:latin typeface="Georgia"/><a:ea typeface="ＭＳ ゴシック"/><a:cs typeface=""/></a:majorFont>
      <a:minorFont><a:latin typeface="Verdana"/><a:ea typeface="ＭＳ 明朝"/><a:cs typeface=""/></a:minorFont>
    </a:fontScheme>
  </a:themeElements>
</a:theme>"#;

const FONT_KEY: &str = "{00112233-4455-6677-8899-AABBCCDDEEFF}";

/// Obfuscation key for [`FONT_KEY`]: the GUID's binary layout, reversed.
const KEY_BYTES: [u8; 16] = [
    0xFF, 0xEE, 0xDD, 0xCC, 0xBB, 0xAA, 0x99, 0x88, 0x66, 0x77, 0x44, 0x55, 0x00, 0x11, 0x22,
    0x33,
];

fn font_table_xml(fonts: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:fonts {NAMESPACES}>{fonts}</w:fonts>"#
    )
}

/// A font program of zeroes, obfuscated with [`KEY_BYTES`].
fn obfuscated_font() -> Vec<u8> {
    let mut data = vec![0u8; 40];
    for (i, byte) in data.iter_mut().take(32).enumerate() {
        *byte ^= KEY_BYTES[i % 16];
    }
    data
}

fn parse(bytes: Vec<u8>) -> DocumentModel {
    parse_docx_bytes(&bytes).expect("package should parse")
}

#[test]
fn font_table_catalog_fields() {
    let fonts = font_table_xml(
        r#"<w:font w:name="MS Mincho">
             <w:altName w:val="ＭＳ 明朝"/><w:charset w:val="80"/><w:family w:val="roman"/>
             <w:pitch w:val="fixed"/><w:panose1 w:val="02020609040205080304"/>
           </w:font>
           <w:font w:name="Zzyzx"><w:family w:val="roman"/></w:font>
           <w:font w:name="Quill Pen"><w:family w:val="script"/></w:font>"#,
    );
    let model = parse(
        DocxBuilder::new("<w:p/>")
            .rel("rIdFonts", "fontTable", "fontTable.xml")
            .part("word/fontTable.xml", fonts)
            .build(),
    );

    assert_eq!(model.font_table.len(), 3);
    let mincho = &model.font_table["MS Mincho"];
    assert_eq!(mincho.alt_name.as_deref(), Some("ＭＳ 明朝"));
    assert_eq!(mincho.family.as_deref(), Some("roman"));
    assert_eq!(mincho.charset.as_deref(), Some("80"));
    assert_eq!(mincho.pitch.as_deref(), Some("fixed"));
    assert_eq!(mincho.panose.as_deref(), Some("02020609040205080304"));
    // a known CJK face outranks the family class
    assert!(mincho.css_stack.starts_with("\"MS Mincho\", \"Microsoft YaHei\""));
    assert!(mincho.css_stack.ends_with(", sans-serif"));

    // unknown names fall back to the w:family class
    assert!(model.font_table["Zzyzx"].css_stack.ends_with(", serif"));
    assert!(model.font_table["Quill Pen"].css_stack.ends_with(", cursive"));
    assert!(model.embedded_fonts.is_empty());
}

#[test]
fn theme_font_binds_through_alt_name() {
    let fonts = font_table_xml(
        r#"<w:font w:name="MS Mincho"><w:altName w:val="ＭＳ 明朝"/><w:family w:val="roman"/></w:font>"#,
    );
    let body = r#"
      <w:p><w:r><w:rPr><w:rFonts w:eastAsiaTheme="minorEastAsia"/></w:rPr><w:t>本文</w:t></w:r></w:p>
      <w:p><w:r><w:rPr><w:rFonts w:eastAsiaTheme="majorEastAsia"/></w:rPr><w:t>見出し</w:t></w:r></w:p>"#;
    let model = parse(
        DocxBuilder::new(body)
            .theme(JAPANESE_THEME)
            .rel("rIdFonts", "fontTable", "fontTable.xml")
            .part("word/fontTable.xml", fonts)
            .build(),
    );
    let ps: Vec<_> = model.paragraphs().collect();

    assert_eq!(ps[0].runs[0].font, "MS Mincho");
    // not in the font table under any name, so the theme name stands
    assert_eq!(ps[1].runs[0].font, "ＭＳ ゴシック");
}

#[test]
fn embedded_fonts_are_deobfuscated() {
    let fonts = font_table_xml(&format!(
        r#"<w:font w:name="Brand Sans">
             <w:family w:val="swiss"/>
             <w:embedRegular r:id="rIdE1" w:fontKey="{FONT_KEY}"/>
             <w:embedBold r:id="rIdE2"/>
           </w:font>"#
    ));
    let model = parse(
        DocxBuilder::new("<w:p/>")
            .rel("rIdFonts", "fontTable", "fontTable.xml")
            .part("word/fontTable.xml", fonts)
            .part_rel("word/fontTable.xml", "rIdE1", "font", "fonts/font1.odttf")
            .part_rel("word/fontTable.xml", "rIdE2", "font", "fonts/font2.odttf")
            .part("word/fonts/font1.odttf", obfuscated_font())
            .part("word/fonts/font2.odttf", b"plain font".to_vec())
            .build(),
    );

    assert_eq!(model.embedded_fonts.len(), 2);
    let regular = &model.embedded_fonts[0];
    assert_eq!(regular.name, "Brand Sans");
    assert!(!regular.bold && !regular.italic);
    assert_eq!(regular.data, vec![0u8; 40]);

    // no fontKey: the bytes are kept as stored
    let bold = &model.embedded_fonts[1];
    assert!(bold.bold && !bold.italic);
    assert_eq!(bold.data, b"plain font");
    assert!(
        !model
            .warnings
            .iter()
            .any(|w| w.kind == WarningKind::RelationshipUnresolved)
    );
}

#[test]
fn missing_embedded_font_targets_are_reported() {
    let fonts = font_table_xml(
        r#"<w:font w:name="Brand Sans">
             <w:embedRegular r:id="rIdGone"/>
             <w:embedItalic r:id="rIdE1"/>
           </w:font>"#,
    );
    let model = parse(
        DocxBuilder::new("<w:p/>")
            .rel("rIdFonts", "fontTable", "fontTable.xml")
            .part("word/fontTable.xml", fonts)
            .part_rel("word/fontTable.xml", "rIdE1", "font", "fonts/absent.odttf")
            .build(),
    );

    assert!(model.embedded_fonts.is_empty());
    assert!(model.font_table.contains_key("Brand Sans"));
    let unresolved: Vec<_> = model
        .warnings
        .iter()
        .filter(|w| w.kind == WarningKind::RelationshipUnresolved)
        .collect();
    assert_eq!(unresolved.len(), 2);
    assert!(unresolved.iter().all(|w| w.part == "word/fontTable.xml"));
    assert!(unresolved.iter().any(|w| w.message.contains("rIdGone")));
    assert!(unresolved.iter().any(|w| w.message.contains("word/fonts/absent.odttf")));
}
