//! The resolved document model. Plain data: no handles, no lazy state, and
//! everything serialisable so it can cross a process boundary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Warning;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineRule {
    /// `line` is a multiplier of single spacing (240ths in the source).
    Auto,
    /// `line` is a fixed height in pixels.
    Exact,
    /// `line` is a minimum height in pixels.
    AtLeast,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VertAlign {
    #[default]
    Baseline,
    Superscript,
    Subscript,
}

/// Paragraph indentation in pixels. Absent fields were set nowhere in the cascade.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indent {
    pub left: Option<f32>,
    pub right: Option<f32>,
    pub first_line: Option<f32>,
    pub hanging: Option<f32>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spacing {
    pub before: Option<f32>,
    pub after: Option<f32>,
    pub line: Option<f32>,
    pub line_rule: Option<LineRule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingRef {
    pub num_id: String,
    pub level: u8,
}

/// `w:numPr` as written on a style or paragraph. `numId` and `ilvl` inherit separately.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingProps {
    pub num_id: Option<String>,
    pub level: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paragraph {
    pub style_id: Option<String>,
    pub alignment: Alignment,
    pub indent: Indent,
    pub spacing: Spacing,
    pub numbering: Option<NumberingRef>,
    pub rtl: bool,
    pub page_break_before: bool,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A run with every character property resolved through the style cascade.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// `#RRGGBB`
    pub color: String,
    pub font: String,
    /// Size in points.
    pub sz: f32,
    pub highlight: Option<String>,
    pub vert_align: VertAlign,
    pub hyperlink: Option<String>,
    pub image: Option<ImageRef>,
}

/// Reference into [`DocumentModel::images`] with display geometry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRef {
    /// Package path, key into `DocumentModel::images`.
    pub id: String,
    pub width: f32,
    pub height: f32,
    pub alt_text: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionValue {
    /// Pixels from the reference edge.
    Offset(f32),
    /// Percent of the reference extent.
    Percent(f32),
    /// `left`, `center`, `right`, `top`, `bottom`, `inside`, `outside`.
    Align(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub relative_from: String,
    pub value: PositionValue,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapMode {
    None,
    Square,
    Tight,
    Through,
    TopAndBottom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingImage {
    pub image: ImageRef,
    pub position_h: Position,
    pub position_v: Position,
    pub wrap: WrapMode,
    pub behind_doc: bool,
    pub z_index: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Border {
    pub style: String,
    /// Line width in pixels.
    pub size: f32,
    /// `#RRGGBB`, `None` for `auto`.
    pub color: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableBorders {
    pub top: Option<Border>,
    pub bottom: Option<Border>,
    pub left: Option<Border>,
    pub right: Option<Border>,
    pub inside_h: Option<Border>,
    pub inside_v: Option<Border>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellBorders {
    pub top: Option<Border>,
    pub bottom: Option<Border>,
    pub left: Option<Border>,
    pub right: Option<Border>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CellVAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub style_id: Option<String>,
    pub alignment: Alignment,
    /// Grid column widths in pixels.
    pub col_widths: Vec<f32>,
    pub width: Option<f32>,
    pub indent: f32,
    pub borders: TableBorders,
    pub rows: Vec<TableRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub cells: Vec<TableCell>,
    pub height: Option<f32>,
    pub is_header: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableCell {
    pub content: Vec<Block>,
    /// Grid column this cell starts in.
    pub grid_col: usize,
    pub col_span: u32,
    /// 0 marks a vertically merged continuation: absorbed by the cell above.
    pub row_span: u32,
    pub width: Option<f32>,
    pub background: Option<String>,
    pub borders: CellBorders,
    pub v_align: CellVAlign,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Page geometry in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    /// Top, right, bottom, left.
    pub margin: [f32; 4],
    pub gutter: f32,
    pub header: f32,
    pub footer: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderFooterKind {
    Default,
    First,
    Even,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFooter {
    pub kind: HeaderFooterKind,
    pub part: String,
    pub content: Vec<Block>,
    pub floating_images: Vec<FloatingImage>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Background {
    pub color: Option<String>,
    pub image: Option<String>,
}

/// Accent and text/background slots of the theme colour scheme, as `#RRGGBB`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeColorScheme {
    pub name: Option<String>,
    pub dark1: String,
    pub light1: String,
    pub dark2: String,
    pub light2: String,
    pub accent1: String,
    pub accent2: String,
    pub accent3: String,
    pub accent4: String,
    pub accent5: String,
    pub accent6: String,
    pub hyperlink: String,
    pub followed_hyperlink: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeFontSet {
    pub latin: String,
    pub east_asia: String,
    pub complex_script: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontScheme {
    pub name: Option<String>,
    pub major_font: ThemeFontSet,
    pub minor_font: ThemeFontSet,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontInfo {
    pub name: String,
    pub alt_name: Option<String>,
    /// `roman`, `swiss`, `modern`, `script`, `decorative` or `auto`.
    pub family: Option<String>,
    pub charset: Option<String>,
    pub pitch: Option<String>,
    pub panose: Option<String>,
    /// CSS-safe family stack for rendering.
    pub css_stack: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddedFont {
    pub name: String,
    pub bold: bool,
    pub italic: bool,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StyleType {
    Paragraph,
    Character,
    Table,
    Numbering,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunFonts {
    pub ascii: Option<String>,
    pub h_ansi: Option<String>,
    pub east_asia: Option<String>,
    pub complex_script: Option<String>,
    pub ascii_theme: Option<String>,
    pub h_ansi_theme: Option<String>,
    pub east_asia_theme: Option<String>,
    pub complex_script_theme: Option<String>,
}

/// A colour as written in the source, resolved against the theme late.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorValue {
    Auto,
    Rgb(String),
    Theme {
        slot: String,
        tint: Option<u8>,
        shade: Option<u8>,
        fallback: Option<String>,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProps {
    pub style_id: Option<String>,
    pub fonts: RunFonts,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub strike: Option<bool>,
    pub color: Option<ColorValue>,
    /// Points.
    pub sz: Option<f32>,
    pub highlight: Option<String>,
    pub vert_align: Option<VertAlign>,
    pub lang: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParagraphProps {
    pub style_id: Option<String>,
    pub alignment: Option<Alignment>,
    pub indent: Indent,
    pub spacing: Spacing,
    pub numbering: NumberingProps,
    pub bidi: Option<bool>,
    pub page_break_before: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProps {
    pub borders: TableBorders,
    pub alignment: Option<Alignment>,
    pub indent: Option<f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub style_type: StyleType,
    pub name: String,
    pub based_on: Option<String>,
    pub next_style: Option<String>,
    pub link: Option<String>,
    pub is_default: bool,
    pub hidden: bool,
    pub paragraph: Option<ParagraphProps>,
    pub character: Option<CharacterProps>,
    pub table: Option<TableProps>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingLevel {
    pub level: u8,
    /// `bullet`, `decimal`, `lowerLetter`, `upperRoman`, …
    pub format: String,
    /// Literal pattern with `%N` placeholders, unexpanded.
    pub lvl_text: String,
    /// Displayable glyph for bullet levels (symbol-font code points mapped).
    pub bullet: Option<String>,
    pub start: u32,
    pub alignment: Alignment,
    pub suffix: String,
    pub indent: Indent,
    pub font: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberingDefinition {
    pub abstract_num_id: String,
    pub levels: Vec<NumberingLevel>,
}

impl NumberingDefinition {
    pub fn level(&self, level: u8) -> Option<&NumberingLevel> {
        self.levels.iter().find(|l| l.level == level)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageData {
    pub mime: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
}

impl ImageData {
    pub fn data_url(&self) -> String {
        use base64::Engine;
        format!(
            "data:{};base64,{}",
            self.mime,
            base64::engine::general_purpose::STANDARD.encode(&self.data)
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub keywords: Option<String>,
    pub description: Option<String>,
    pub last_modified_by: Option<String>,
    pub revision: Option<String>,
    pub created: Option<String>,
    pub modified: Option<String>,
    pub application: Option<String>,
    pub company: Option<String>,
    pub pages: Option<u32>,
    pub words: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSettings {
    /// Pixels.
    pub default_tab_stop: f32,
    pub even_and_odd_headers: bool,
    pub theme_font_lang: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentModel {
    pub page: PageGeometry,
    pub body: Vec<Block>,
    pub floating_images: Vec<FloatingImage>,
    pub lists: HashMap<String, NumberingDefinition>,
    pub theme_colors: ThemeColorScheme,
    pub theme_fonts: FontScheme,
    pub styles: HashMap<String, StyleRecord>,
    pub font_table: HashMap<String, FontInfo>,
    pub embedded_fonts: Vec<EmbeddedFont>,
    pub lang: String,
    pub rtl: bool,
    pub headers: Vec<HeaderFooter>,
    pub footers: Vec<HeaderFooter>,
    pub background: Option<Background>,
    pub images: HashMap<String, ImageData>,
    pub settings: DocumentSettings,
    pub metadata: DocumentMetadata,
    pub warnings: Vec<Warning>,
}

impl DocumentModel {
    /// Top-level paragraphs in document order (table contents excluded).
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.iter().filter_map(|b| match b {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        })
    }

    /// Every paragraph including those nested in table cells, depth-first.
    pub fn all_paragraphs(&self) -> Vec<&Paragraph> {
        fn collect<'a>(blocks: &'a [Block], out: &mut Vec<&'a Paragraph>) {
            for block in blocks {
                match block {
                    Block::Paragraph(p) => out.push(p),
                    Block::Table(t) => {
                        for cell in t.rows.iter().flat_map(|r| &r.cells) {
                            collect(&cell.content, out);
                        }
                    }
                }
            }
        }
        let mut out = Vec::new();
        collect(&self.body, &mut out);
        out
    }
}

mod base64_bytes {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(s).map_err(serde::de::Error::custom)
    }
}
