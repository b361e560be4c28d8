use std::collections::{HashMap, HashSet};

use crate::color::{parse_hex_color, to_hex};
use crate::error::{Diagnostics, WarningKind};
use crate::model::{
    Alignment, Border, CellBorders, CharacterProps, ColorValue, Indent, LineRule, NumberingProps,
    ParagraphProps, RunFonts, Spacing, StyleRecord, StyleType, TableBorders, TableProps,
    VertAlign,
};
use crate::units::{eighth_points_to_pixels, half_points_to_points};

use super::xml::{Node, attr, bool_attr, child, children, parse_twips, toggle, twips_px, val};

/// Key-by-key merge: fields the receiver leaves unset are taken from the parent.
pub(crate) trait Inherit {
    fn inherit_from(&mut self, parent: &Self);
}

macro_rules! inherit {
    ($child:expr, $parent:expr; $($field:ident),+ $(,)?) => {
        $(
            if $child.$field.is_none() {
                $child.$field = $parent.$field.clone();
            }
        )+
    };
}

impl<T: Inherit + Clone> Inherit for Option<T> {
    fn inherit_from(&mut self, parent: &Self) {
        match (self.as_mut(), parent) {
            (Some(own), Some(p)) => own.inherit_from(p),
            (None, Some(p)) => *self = Some(p.clone()),
            (_, None) => {}
        }
    }
}

impl Inherit for Indent {
    fn inherit_from(&mut self, parent: &Self) {
        inherit!(self, parent; left, right);
        // firstLine and hanging describe one quantity; whoever sets either owns both.
        if self.first_line.is_none() && self.hanging.is_none() {
            self.first_line = parent.first_line;
            self.hanging = parent.hanging;
        }
    }
}

impl Inherit for Spacing {
    fn inherit_from(&mut self, parent: &Self) {
        inherit!(self, parent; before, after);
        if self.line.is_none() {
            self.line = parent.line;
            self.line_rule = parent.line_rule;
        }
    }
}

impl Inherit for RunFonts {
    fn inherit_from(&mut self, parent: &Self) {
        inherit!(self, parent;
            ascii, h_ansi, east_asia, complex_script,
            ascii_theme, h_ansi_theme, east_asia_theme, complex_script_theme);
    }
}

impl Inherit for CharacterProps {
    fn inherit_from(&mut self, parent: &Self) {
        self.fonts.inherit_from(&parent.fonts);
        inherit!(self, parent;
            bold, italic, underline, strike, color, sz, highlight, vert_align, lang);
    }
}

impl Inherit for NumberingProps {
    fn inherit_from(&mut self, parent: &Self) {
        inherit!(self, parent; num_id, level);
    }
}

impl Inherit for ParagraphProps {
    fn inherit_from(&mut self, parent: &Self) {
        self.indent.inherit_from(&parent.indent);
        self.spacing.inherit_from(&parent.spacing);
        self.numbering.inherit_from(&parent.numbering);
        inherit!(self, parent; alignment, bidi, page_break_before);
    }
}

impl Inherit for TableBorders {
    fn inherit_from(&mut self, parent: &Self) {
        inherit!(self, parent; top, bottom, left, right, inside_h, inside_v);
    }
}

impl Inherit for CellBorders {
    fn inherit_from(&mut self, parent: &Self) {
        inherit!(self, parent; top, bottom, left, right);
    }
}

impl Inherit for TableProps {
    fn inherit_from(&mut self, parent: &Self) {
        self.borders.inherit_from(&parent.borders);
        inherit!(self, parent; alignment, indent);
    }
}

impl Inherit for StyleRecord {
    fn inherit_from(&mut self, parent: &Self) {
        self.paragraph.inherit_from(&parent.paragraph);
        self.character.inherit_from(&parent.character);
        self.table.inherit_from(&parent.table);
    }
}

pub(crate) fn parse_alignment(val: &str) -> Option<Alignment> {
    match val {
        "left" | "start" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" | "end" => Some(Alignment::Right),
        "both" | "distribute" | "justify" | "lowKashida" | "mediumKashida" | "highKashida"
        | "thaiDistribute" => Some(Alignment::Justify),
        _ => None,
    }
}

/// `w:color` / `w:themeColor` (+ tint/shade) of a run-property-like element.
pub(crate) fn parse_color(node: Node) -> Option<ColorValue> {
    let hex = attr(node, "val");
    if let Some(slot) = attr(node, "themeColor") {
        let byte = |name: &str| attr(node, name).and_then(|v| u8::from_str_radix(v, 16).ok());
        return Some(ColorValue::Theme {
            slot: slot.to_string(),
            tint: byte("themeTint"),
            shade: byte("themeShade"),
            fallback: hex.and_then(parse_hex_color).map(to_hex),
        });
    }
    match hex? {
        "auto" => Some(ColorValue::Auto),
        v => parse_hex_color(v).map(|rgb| ColorValue::Rgb(to_hex(rgb))),
    }
}

/// Cell/paragraph shading fill (`w:shd@w:fill`, `w:themeFill…`).
pub(crate) fn parse_shading(shd: Node) -> Option<ColorValue> {
    if let Some(slot) = attr(shd, "themeFill") {
        let byte = |name: &str| attr(shd, name).and_then(|v| u8::from_str_radix(v, 16).ok());
        return Some(ColorValue::Theme {
            slot: slot.to_string(),
            tint: byte("themeFillTint"),
            shade: byte("themeFillShade"),
            fallback: attr(shd, "fill").and_then(parse_hex_color).map(to_hex),
        });
    }
    attr(shd, "fill")
        .and_then(parse_hex_color)
        .map(|rgb| ColorValue::Rgb(to_hex(rgb)))
}

pub(crate) fn parse_character_props(rpr: Node) -> CharacterProps {
    let fonts = child(rpr, "rFonts")
        .map(|f| {
            let get = |name: &str| attr(f, name).map(str::to_string);
            RunFonts {
                ascii: get("ascii"),
                h_ansi: get("hAnsi"),
                east_asia: get("eastAsia"),
                complex_script: get("cs"),
                ascii_theme: get("asciiTheme"),
                h_ansi_theme: get("hAnsiTheme"),
                east_asia_theme: get("eastAsiaTheme"),
                complex_script_theme: get("cstheme"),
            }
        })
        .unwrap_or_default();

    let underline = child(rpr, "u").map(|u| attr(u, "val").is_none_or(|v| v != "none"));
    let strike = match (toggle(rpr, "strike"), toggle(rpr, "dstrike")) {
        (None, None) => None,
        (a, b) => Some(a.unwrap_or(false) || b.unwrap_or(false)),
    };
    let vert_align = val(rpr, "vertAlign").map(|v| match v {
        "superscript" => VertAlign::Superscript,
        "subscript" => VertAlign::Subscript,
        _ => VertAlign::Baseline,
    });

    CharacterProps {
        style_id: val(rpr, "rStyle").map(str::to_string),
        fonts,
        bold: toggle(rpr, "b"),
        italic: toggle(rpr, "i"),
        underline,
        strike,
        color: child(rpr, "color").and_then(parse_color),
        sz: val(rpr, "sz")
            .and_then(|v| v.parse::<f32>().ok())
            .map(half_points_to_points),
        highlight: val(rpr, "highlight").map(str::to_string),
        vert_align,
        lang: val(rpr, "lang").map(str::to_string),
    }
}

pub(crate) fn parse_indent(ind: Node) -> Indent {
    Indent {
        left: twips_px(ind, "left").or_else(|| twips_px(ind, "start")),
        right: twips_px(ind, "right").or_else(|| twips_px(ind, "end")),
        first_line: twips_px(ind, "firstLine"),
        hanging: twips_px(ind, "hanging"),
    }
}

fn parse_spacing(spacing: Node) -> Spacing {
    let line_rule = match attr(spacing, "lineRule") {
        Some("exact") => LineRule::Exact,
        Some("atLeast") => LineRule::AtLeast,
        _ => LineRule::Auto,
    };
    let line = attr(spacing, "line").and_then(parse_twips).map(|v| match line_rule {
        LineRule::Auto => v / 240.0,
        LineRule::Exact | LineRule::AtLeast => crate::units::twips_to_pixels(v),
    });
    Spacing {
        before: twips_px(spacing, "before"),
        after: twips_px(spacing, "after"),
        line,
        line_rule: line.map(|_| line_rule),
    }
}

fn parse_numbering_props(num_pr: Node) -> NumberingProps {
    NumberingProps {
        num_id: val(num_pr, "numId").map(str::to_string),
        level: val(num_pr, "ilvl")
            .and_then(|v| v.parse::<u8>().ok())
            .map(|l| l.min(8)),
    }
}

pub(crate) fn parse_paragraph_props(ppr: Node) -> ParagraphProps {
    ParagraphProps {
        style_id: val(ppr, "pStyle").map(str::to_string),
        alignment: val(ppr, "jc").and_then(parse_alignment),
        indent: child(ppr, "ind").map(parse_indent).unwrap_or_default(),
        spacing: child(ppr, "spacing").map(parse_spacing).unwrap_or_default(),
        numbering: child(ppr, "numPr")
            .map(parse_numbering_props)
            .unwrap_or_default(),
        bidi: toggle(ppr, "bidi"),
        page_break_before: toggle(ppr, "pageBreakBefore"),
    }
}

/// One border edge. Explicit `none`/`nil` is kept so it overrides inherited borders.
pub(crate) fn parse_border(node: Node) -> Option<Border> {
    let style = attr(node, "val")?;
    if matches!(style, "nil" | "none") {
        return Some(Border {
            style: "none".into(),
            size: 0.0,
            color: None,
        });
    }
    let size = attr(node, "sz")
        .and_then(|v| v.parse::<f32>().ok())
        .map(eighth_points_to_pixels)
        .unwrap_or(eighth_points_to_pixels(4.0));
    Some(Border {
        style: style.to_string(),
        size,
        color: attr(node, "color")
            .and_then(parse_hex_color)
            .map(to_hex),
    })
}

/// `w:tblBorders` / `w:tcBorders`; logical `start`/`end` stand in for left/right.
pub(crate) fn parse_table_borders(node: Node) -> TableBorders {
    let edge = |names: &[&str]| names.iter().find_map(|n| child(node, n).and_then(parse_border));
    TableBorders {
        top: edge(&["top"]),
        bottom: edge(&["bottom"]),
        left: edge(&["left", "start"]),
        right: edge(&["right", "end"]),
        inside_h: edge(&["insideH"]),
        inside_v: edge(&["insideV"]),
    }
}

pub(crate) fn parse_table_props(tbl_pr: Node) -> TableProps {
    TableProps {
        borders: child(tbl_pr, "tblBorders")
            .map(parse_table_borders)
            .unwrap_or_default(),
        alignment: val(tbl_pr, "jc").and_then(parse_alignment),
        indent: child(tbl_pr, "tblInd").and_then(|n| twips_px(n, "w")),
    }
}

/// The styles part after inheritance flattening, plus document defaults.
#[derive(Default)]
pub(crate) struct StyleSheet {
    pub(crate) styles: HashMap<String, StyleRecord>,
    pub(crate) default_run: CharacterProps,
    pub(crate) default_paragraph: ParagraphProps,
    pub(crate) default_paragraph_style: Option<String>,
    pub(crate) default_character_style: Option<String>,
    pub(crate) default_table_style: Option<String>,
}

impl StyleSheet {
    pub(crate) fn get(&self, id: &str) -> Option<&StyleRecord> {
        self.styles.get(id)
    }

    /// Paragraph style in effect: the named one if it exists, else the default.
    pub(crate) fn paragraph_style(&self, id: Option<&str>) -> Option<&StyleRecord> {
        id.and_then(|id| self.get(id))
            .or_else(|| self.default_paragraph_style.as_deref().and_then(|d| self.get(d)))
    }

    pub(crate) fn table_style(&self, id: Option<&str>) -> Option<&StyleRecord> {
        id.and_then(|id| self.get(id))
            .or_else(|| self.default_table_style.as_deref().and_then(|d| self.get(d)))
    }

    /// Character-property sources for a run, highest precedence first:
    /// direct formatting, run style, paragraph style, table style, defaults.
    pub(crate) fn run_sources<'a>(
        &'a self,
        direct: &'a CharacterProps,
        paragraph_style: Option<&str>,
        table_style: Option<&str>,
    ) -> Vec<&'a CharacterProps> {
        let run_style = direct
            .style_id
            .as_deref()
            .and_then(|id| self.get(id))
            .or_else(|| self.default_character_style.as_deref().and_then(|d| self.get(d)));

        let mut sources = vec![direct];
        sources.extend(run_style.and_then(|s| s.character.as_ref()));
        sources.extend(self.paragraph_style(paragraph_style).and_then(|s| s.character.as_ref()));
        if table_style.is_some() {
            sources.extend(self.table_style(table_style).and_then(|s| s.character.as_ref()));
        }
        sources.push(&self.default_run);
        sources
    }

    /// Paragraph-property sources below direct formatting: paragraph style,
    /// table style, defaults.
    pub(crate) fn paragraph_sources<'a>(
        &'a self,
        paragraph_style: Option<&str>,
        table_style: Option<&str>,
    ) -> Vec<&'a ParagraphProps> {
        let mut sources = Vec::new();
        sources.extend(self.paragraph_style(paragraph_style).and_then(|s| s.paragraph.as_ref()));
        if table_style.is_some() {
            sources.extend(self.table_style(table_style).and_then(|s| s.paragraph.as_ref()));
        }
        sources.push(&self.default_paragraph);
        sources
    }
}

/// First-writer-wins merge of `sources` (highest precedence first).
pub(crate) fn cascade<T: Inherit + Clone + Default>(sources: &[&T]) -> T {
    let mut merged = T::default();
    for source in sources {
        merged.inherit_from(source);
    }
    merged
}

fn style_type(node: Node) -> Option<StyleType> {
    match attr(node, "type").unwrap_or("paragraph") {
        "paragraph" => Some(StyleType::Paragraph),
        "character" => Some(StyleType::Character),
        "table" => Some(StyleType::Table),
        "numbering" => Some(StyleType::Numbering),
        other => {
            log::debug!("Skipping style of unknown type {other}");
            None
        }
    }
}

fn parse_style(node: Node) -> Option<StyleRecord> {
    let id = attr(node, "styleId")?;
    let style_type = style_type(node)?;
    Some(StyleRecord {
        id: id.to_string(),
        style_type,
        name: val(node, "name").unwrap_or(id).to_string(),
        based_on: val(node, "basedOn").map(str::to_string),
        next_style: val(node, "next").map(str::to_string),
        link: val(node, "link").map(str::to_string),
        is_default: bool_attr(node, "default").unwrap_or(false),
        hidden: toggle(node, "hidden").or_else(|| toggle(node, "semiHidden")).unwrap_or(false),
        paragraph: child(node, "pPr").map(parse_paragraph_props),
        character: child(node, "rPr").map(parse_character_props),
        table: child(node, "tblPr").map(parse_table_props),
    })
}

pub(crate) fn parse_styles(
    xml: &roxmltree::Document,
    part_name: &str,
    diagnostics: &mut Diagnostics,
) -> StyleSheet {
    let root = xml.root_element();
    let mut sheet = StyleSheet::default();

    if let Some(doc_defaults) = child(root, "docDefaults") {
        if let Some(rpr) = child(doc_defaults, "rPrDefault").and_then(|n| child(n, "rPr")) {
            sheet.default_run = parse_character_props(rpr);
        }
        if let Some(ppr) = child(doc_defaults, "pPrDefault").and_then(|n| child(n, "pPr")) {
            sheet.default_paragraph = parse_paragraph_props(ppr);
        }
    }

    let mut raw: HashMap<String, StyleRecord> = HashMap::new();
    for node in children(root, "style") {
        let Some(style) = parse_style(node) else {
            continue;
        };
        if style.is_default {
            let slot = match style.style_type {
                StyleType::Paragraph => &mut sheet.default_paragraph_style,
                StyleType::Character => &mut sheet.default_character_style,
                StyleType::Table => &mut sheet.default_table_style,
                StyleType::Numbering => continue,
            };
            slot.get_or_insert_with(|| style.id.clone());
        }
        if raw.contains_key(&style.id) {
            log::debug!("Duplicate style id {}, keeping the first", style.id);
            continue;
        }
        raw.insert(style.id.clone(), style);
    }

    sheet.styles = resolve_inheritance(&raw, part_name, diagnostics);
    log::debug!("Resolved {} styles", sheet.styles.len());
    sheet
}

/// Flatten `basedOn` chains. Each style absorbs its resolved ancestors
/// underneath its own properties. A chain that revisits a style is cut at the
/// repeat: the style where the cycle closes keeps its own properties only.
pub(crate) fn resolve_inheritance(
    raw: &HashMap<String, StyleRecord>,
    part_name: &str,
    diagnostics: &mut Diagnostics,
) -> HashMap<String, StyleRecord> {
    let mut resolved: HashMap<String, StyleRecord> = HashMap::new();
    let mut ids: Vec<&String> = raw.keys().collect();
    ids.sort();

    for id in ids {
        if resolved.contains_key(id) {
            continue;
        }
        let mut chain: Vec<&str> = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut base: Option<StyleRecord> = None;
        let mut current = id.as_str();
        loop {
            if !visited.insert(current) {
                diagnostics.warn(
                    WarningKind::StyleCycle,
                    part_name,
                    format!("basedOn chain of {id} revisits {current}"),
                );
                break;
            }
            if let Some(done) = resolved.get(current) {
                base = Some(done.clone());
                break;
            }
            chain.push(current);
            match raw[current].based_on.as_deref() {
                Some(parent) if raw.contains_key(parent) => current = parent,
                Some(parent) => {
                    log::debug!("Style {current} is based on unknown style {parent}");
                    break;
                }
                None => break,
            }
        }

        for style_id in chain.into_iter().rev() {
            let mut style = raw[style_id].clone();
            if let Some(parent) = &base {
                style.inherit_from(parent);
            }
            resolved.insert(style_id.to_string(), style.clone());
            base = Some(style);
        }
    }
    resolved
}
