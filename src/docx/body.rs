//! Story walker: paragraphs, runs and the block sequence of the body, table
//! cells, headers and footers.

use crate::color::{BLACK, Rgb, WHITE, highlight_color, is_dark, to_hex};
use crate::model::{
    Alignment, Block, CharacterProps, ImageRef, NumberingRef, Paragraph, ParagraphProps, Run,
    RunFonts, VertAlign,
};

use super::drawing::{Drawing, parse_drawing, parse_vml_picture};
use super::fonts::resolve_font;
use super::styles::{Inherit, cascade, parse_character_props, parse_paragraph_props};
use super::table::parse_table;
use super::text::{normalize_run_text, sym_char};
use super::xml::{Node, attr, child, is, rel_attr};
use super::{PartScope, ResolveContext};

/// Size used when neither the cascade nor the document defaults give one.
pub(crate) const DEFAULT_FONT_SIZE: f32 = 10.0;

/// Where a block sits. Inside a table the table style joins the cascade and
/// the cell shading decides what `auto` text colour means.
#[derive(Clone, Copy, Default)]
pub(crate) struct Container<'s> {
    pub(crate) table_style: Option<&'s str>,
    pub(crate) shading: Option<Rgb>,
}

/// Block-level children with content-control and custom-XML wrappers
/// flattened away.
pub(crate) fn collect_block_nodes<'a>(parent: Node<'a>) -> Vec<Node<'a>> {
    let mut nodes = Vec::new();
    for child_node in parent.children().filter(|n| n.is_element()) {
        match child_node.tag_name().name() {
            "sdt" => {
                if let Some(content) = child(child_node, "sdtContent") {
                    nodes.extend(collect_block_nodes(content));
                }
            }
            "customXml" | "ins" | "moveTo" => nodes.extend(collect_block_nodes(child_node)),
            _ => nodes.push(child_node),
        }
    }
    nodes
}

pub(crate) fn walk_blocks(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    parent: Node,
    container: Container,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    for node in collect_block_nodes(parent) {
        if is(node, "p") {
            blocks.push(Block::Paragraph(parse_paragraph(ctx, scope, node, container)));
        } else if is(node, "tbl") {
            blocks.push(Block::Table(parse_table(ctx, scope, node, container)));
        }
    }
    blocks
}

/// Character properties of a run after the cascade, ready to stamp onto
/// every run the element produces.
struct RunStyle {
    bold: bool,
    italic: bool,
    underline: bool,
    strike: bool,
    color: String,
    font: String,
    sz: f32,
    highlight: Option<String>,
    vert_align: VertAlign,
}

impl RunStyle {
    fn resolve(
        ctx: &ResolveContext,
        direct: &CharacterProps,
        paragraph_style: Option<&str>,
        container: Container,
    ) -> Self {
        let sources = ctx
            .styles
            .run_sources(direct, paragraph_style, container.table_style);
        let merged: CharacterProps = cascade(&sources);
        let fonts: Vec<&RunFonts> = sources.iter().map(|s| &s.fonts).collect();

        let color = merged
            .color
            .as_ref()
            .and_then(|c| ctx.theme.resolve(c))
            .unwrap_or(match container.shading {
                Some(bg) if is_dark(bg) => WHITE,
                _ => BLACK,
            });

        RunStyle {
            bold: merged.bold.unwrap_or(false),
            italic: merged.italic.unwrap_or(false),
            underline: merged.underline.unwrap_or(false),
            strike: merged.strike.unwrap_or(false),
            color: to_hex(color),
            font: resolve_font(&fonts, ctx.theme, ctx.fonts),
            sz: merged.sz.unwrap_or(DEFAULT_FONT_SIZE),
            highlight: merged
                .highlight
                .as_deref()
                .and_then(highlight_color)
                .map(to_hex),
            vert_align: merged.vert_align.unwrap_or_default(),
        }
    }

    fn run(&self, text: String, hyperlink: Option<&str>, image: Option<ImageRef>) -> Run {
        Run {
            text,
            bold: self.bold,
            italic: self.italic,
            underline: self.underline,
            strike: self.strike,
            color: self.color.clone(),
            font: self.font.clone(),
            sz: self.sz,
            highlight: self.highlight.clone(),
            vert_align: self.vert_align,
            hyperlink: hyperlink.map(str::to_string),
            image,
        }
    }
}

struct RunNode<'a> {
    node: Node<'a>,
    hyperlink: Option<String>,
}

fn collect_run_nodes<'a>(
    scope: &PartScope,
    parent: Node<'a>,
    hyperlink: Option<&str>,
    out: &mut Vec<RunNode<'a>>,
) {
    for node in parent.children().filter(|n| n.is_element()) {
        match node.tag_name().name() {
            "r" => out.push(RunNode {
                node,
                hyperlink: hyperlink.map(str::to_string),
            }),
            "hyperlink" => {
                let target = rel_attr(node, "id")
                    .and_then(|id| scope.rels.external_target(id))
                    .map(str::to_string)
                    .or_else(|| attr(node, "anchor").map(|a| format!("#{a}")));
                collect_run_nodes(scope, node, target.as_deref().or(hyperlink), out);
            }
            "fldSimple" => {
                let target = attr(node, "instr").and_then(hyperlink_from_instr);
                collect_run_nodes(scope, node, target.as_deref().or(hyperlink), out);
            }
            "sdt" => {
                if let Some(content) = child(node, "sdtContent") {
                    collect_run_nodes(scope, content, hyperlink, out);
                }
            }
            "smartTag" | "customXml" | "ins" | "moveTo" | "dir" | "bdo" => {
                collect_run_nodes(scope, node, hyperlink, out)
            }
            // deleted and moved-away text is not part of the document
            _ => {}
        }
    }
}

/// Target of a `HYPERLINK "url"` or `HYPERLINK \l "bookmark"` field code.
fn hyperlink_from_instr(instr: &str) -> Option<String> {
    let rest = instr.trim_start().strip_prefix("HYPERLINK")?;
    let mut tokens: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in rest.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                if !quoted {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }

    if let Some(pos) = tokens.iter().position(|t| t == "\\l") {
        return tokens.get(pos + 1).map(|a| format!("#{a}"));
    }
    tokens
        .into_iter()
        .find(|t| !t.is_empty() && !t.starts_with('\\'))
}

/// Complex-field state (`w:fldChar` begin/separate/end) across runs.
#[derive(Default)]
struct FieldFrame {
    instr: String,
    separated: bool,
}

#[derive(Default)]
struct FieldStack {
    frames: Vec<FieldFrame>,
}

impl FieldStack {
    /// Only field results are displayed; instruction text is not.
    fn showing(&self) -> bool {
        self.frames.iter().all(|f| f.separated)
    }

    fn hyperlink(&self) -> Option<String> {
        self.frames
            .iter()
            .rev()
            .find_map(|f| hyperlink_from_instr(&f.instr))
    }

    fn char(&mut self, node: Node) {
        match attr(node, "fldCharType") {
            Some("begin") => self.frames.push(FieldFrame::default()),
            Some("separate") => {
                if let Some(f) = self.frames.last_mut() {
                    f.separated = true;
                }
            }
            Some("end") => {
                self.frames.pop();
            }
            _ => {}
        }
    }

    fn instr(&mut self, text: &str) {
        if let Some(f) = self.frames.last_mut()
            && !f.separated
        {
            f.instr.push_str(text);
        }
    }
}

#[derive(Default)]
struct ParagraphContent {
    runs: Vec<Run>,
    page_break: bool,
}

fn walk_run(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    run: &RunNode,
    style: &RunStyle,
    fields: &mut FieldStack,
    out: &mut ParagraphContent,
) {
    let field_link = fields.hyperlink();
    let mut text = String::new();
    let mut hyperlink = run.hyperlink.clone().or(field_link);

    let flush = |text: &mut String, hyperlink: &Option<String>, out: &mut ParagraphContent| {
        if !text.is_empty() {
            out.runs
                .push(style.run(std::mem::take(text), hyperlink.as_deref(), None));
        }
    };

    for node in run.node.children().filter(|n| n.is_element()) {
        let name = node.tag_name().name();
        match name {
            "fldChar" => {
                flush(&mut text, &hyperlink, out);
                fields.char(node);
                hyperlink = run.hyperlink.clone().or_else(|| fields.hyperlink());
                continue;
            }
            "instrText" => {
                fields.instr(node.text().unwrap_or(""));
                continue;
            }
            _ => {}
        }
        if !fields.showing() {
            continue;
        }
        match name {
            "t" => text.push_str(&normalize_run_text(node.text().unwrap_or(""))),
            "tab" | "ptab" => text.push('\t'),
            "br" => match attr(node, "type") {
                Some("page") => out.page_break = true,
                Some("column") => {}
                _ => text.push('\n'),
            },
            "cr" => text.push('\n'),
            "noBreakHyphen" => text.push('\u{2011}'),
            "softHyphen" => text.push('\u{00AD}'),
            "sym" => {
                if let Some(c) = attr(node, "char").and_then(sym_char) {
                    text.push(c);
                }
            }
            "drawing" => {
                flush(&mut text, &hyperlink, out);
                for drawing in parse_drawing(ctx, scope, node) {
                    match drawing {
                        Drawing::Inline(image) => out.runs.push(style.run(
                            String::new(),
                            hyperlink.as_deref(),
                            Some(image),
                        )),
                        Drawing::Floating(float) => scope.floating.push(float),
                    }
                }
            }
            "pict" => {
                flush(&mut text, &hyperlink, out);
                if let Some(image) = parse_vml_picture(ctx, scope, node) {
                    out.runs
                        .push(style.run(String::new(), hyperlink.as_deref(), Some(image)));
                }
            }
            _ => {}
        }
    }
    flush(&mut text, &hyperlink, out);
}

pub(crate) fn parse_paragraph(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    p: Node,
    container: Container,
) -> Paragraph {
    let direct = child(p, "pPr")
        .map(parse_paragraph_props)
        .unwrap_or_default();
    let style_id = direct
        .style_id
        .clone()
        .or_else(|| ctx.styles.default_paragraph_style.clone());

    let inherited: ParagraphProps = cascade(
        &ctx.styles
            .paragraph_sources(style_id.as_deref(), container.table_style),
    );

    let mut num_pr = direct.numbering.clone();
    num_pr.inherit_from(&inherited.numbering);
    // numId 0 explicitly removes numbering inherited from the style
    let numbering = num_pr
        .num_id
        .filter(|id| id != "0")
        .map(|num_id| NumberingRef {
            num_id,
            level: num_pr.level.unwrap_or(0),
        });
    let level = numbering
        .as_ref()
        .and_then(|n| ctx.lists.get(&n.num_id).and_then(|def| def.level(n.level)));

    let mut indent = direct.indent;
    if let Some(level) = level {
        indent.inherit_from(&level.indent);
    }
    indent.inherit_from(&inherited.indent);

    let mut merged = direct;
    merged.inherit_from(&inherited);

    let mut run_nodes = Vec::new();
    collect_run_nodes(scope, p, None, &mut run_nodes);

    let mut content = ParagraphContent::default();
    let mut fields = FieldStack::default();
    for run in &run_nodes {
        let rpr = child(run.node, "rPr")
            .map(parse_character_props)
            .unwrap_or_default();
        let style = RunStyle::resolve(ctx, &rpr, style_id.as_deref(), container);
        walk_run(ctx, scope, run, &style, &mut fields, &mut content);
    }

    Paragraph {
        style_id,
        alignment: merged.alignment.unwrap_or(Alignment::Left),
        indent,
        spacing: merged.spacing,
        numbering,
        rtl: merged.bidi.unwrap_or(false),
        page_break_before: merged.page_break_before.unwrap_or(false) || content.page_break,
        runs: content.runs,
    }
}
