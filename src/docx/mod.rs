mod body;
mod drawing;
mod fonts;
mod metadata;
mod numbering;
mod rels;
mod section;
mod styles;
mod table;
mod text;
mod theme;
mod xml;

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;

use crate::ParseOptions;
use crate::error::{Diagnostics, Error, WarningKind};
use crate::model::{
    DocumentMetadata, DocumentModel, DocumentSettings, FloatingImage, HeaderFooter,
    HeaderFooterKind, ImageData, NumberingDefinition,
};
use crate::package::Package;

use body::{Container, walk_blocks};
use fonts::{FontCatalog, parse_font_table};
use metadata::{apply_app_properties, apply_core_properties, parse_settings};
use numbering::parse_numbering;
use rels::{
    Relationships, TYPE_CORE_PROPERTIES, TYPE_EXTENDED_PROPERTIES, TYPE_FONT_TABLE,
    TYPE_NUMBERING, TYPE_OFFICE_DOCUMENT, TYPE_SETTINGS, TYPE_STYLES, TYPE_THEME,
};
use section::{final_section, parse_background, parse_page_geometry, section_is_rtl, story_refs};
use styles::{StyleSheet, parse_styles};
use theme::{Theme, parse_theme};
use xml::{child, parse_xml};

const DEFAULT_LANG: &str = "en-US";

/// Primary language subtags written right to left.
const RTL_LANGS: [&str; 6] = ["ar", "he", "fa", "ur", "yi", "ps"];

/// Everything the walkers consult. Built once per parse after the styles,
/// theme, font and numbering parts are resolved; read-only from then on.
pub(crate) struct ResolveContext<'a> {
    pub(crate) package: &'a Package,
    pub(crate) options: &'a ParseOptions,
    pub(crate) theme: &'a Theme,
    pub(crate) fonts: &'a FontCatalog,
    pub(crate) styles: &'a StyleSheet,
    pub(crate) lists: &'a HashMap<String, NumberingDefinition>,
}

/// Per-part walking state: the part's own relationships plus whatever the
/// walk produced besides blocks.
pub(crate) struct PartScope<'a> {
    pub(crate) part: &'a str,
    pub(crate) rels: Relationships,
    pub(crate) images: HashMap<String, ImageData>,
    pub(crate) floating: Vec<FloatingImage>,
    pub(crate) diagnostics: Diagnostics,
}

impl<'a> PartScope<'a> {
    fn new(part: &'a str, rels: Relationships) -> Self {
        PartScope {
            part,
            rels,
            images: HashMap::new(),
            floating: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Presence {
    /// Absence degrades the model noticeably and is reported.
    Expected,
    Optional,
}

/// Read and parse one XML part. Missing or malformed parts yield `None` and
/// are reported; only hitting the node cap aborts the parse.
fn load_xml<'p>(
    package: &'p Package,
    part: &str,
    presence: Presence,
    options: &ParseOptions,
    diagnostics: &mut Diagnostics,
) -> Result<Option<roxmltree::Document<'p>>, Error> {
    let Some(text) = package.text(part) else {
        if package.contains(part) {
            diagnostics.warn(WarningKind::MalformedXml, part, "part is not valid UTF-8");
        } else if presence == Presence::Expected {
            diagnostics.warn(WarningKind::PartMissing, part, "part not found, using defaults");
        } else {
            log::debug!("Optional part {part} not present");
        }
        return Ok(None);
    };
    match parse_xml(text, options.max_xml_nodes) {
        Ok(doc) => Ok(Some(doc)),
        Err(roxmltree::Error::NodesLimitReached) => Err(Error::LimitExceeded {
            what: format!("XML nodes in {part}"),
            limit: u64::from(options.max_xml_nodes),
        }),
        Err(e) => {
            diagnostics.warn(WarningKind::MalformedXml, part, e.to_string());
            Ok(None)
        }
    }
}

fn locate(rels: &Relationships, rel_type: &str, canonical: &str) -> String {
    rels.find_by_type(rel_type)
        .unwrap_or_else(|| canonical.to_string())
}

fn locate_theme(package: &Package, rels: &Relationships) -> String {
    if let Some(part) = rels.find_by_type(TYPE_THEME) {
        return part;
    }
    const CANONICAL: &str = "word/theme/theme1.xml";
    if package.contains(CANONICAL) {
        return CANONICAL.to_string();
    }
    let mut candidates: Vec<&str> = package
        .part_names()
        .filter(|n| n.starts_with("word/theme/") && n.ends_with(".xml"))
        .collect();
    candidates.sort_unstable();
    candidates
        .first()
        .map_or_else(|| CANONICAL.to_string(), |n| n.to_string())
}

fn is_rtl_language(lang: &str) -> bool {
    let primary = lang.split(['-', '_']).next().unwrap_or("").to_ascii_lowercase();
    RTL_LANGS.contains(&primary.as_str())
}

struct Story {
    is_header: bool,
    block: HeaderFooter,
    images: HashMap<String, ImageData>,
    diagnostics: Diagnostics,
}

fn walk_story(
    ctx: &ResolveContext,
    is_header: bool,
    kind: HeaderFooterKind,
    part: &str,
) -> Result<Story, Error> {
    let mut diagnostics = Diagnostics::default();
    let rels = Relationships::load(ctx.package, part, ctx.options.max_xml_nodes, &mut diagnostics)?;
    let xml = load_xml(ctx.package, part, Presence::Expected, ctx.options, &mut diagnostics)?;

    let mut scope = PartScope::new(part, rels);
    scope.diagnostics = diagnostics;
    let content = match &xml {
        Some(doc) => walk_blocks(ctx, &mut scope, doc.root_element(), Container::default()),
        None => Vec::new(),
    };
    log::debug!("Walked {part}: {} blocks", content.len());

    Ok(Story {
        is_header,
        block: HeaderFooter {
            kind,
            part: part.to_string(),
            content,
            floating_images: scope.floating,
        },
        images: scope.images,
        diagnostics: scope.diagnostics,
    })
}

/// Parse an opened package into the document model.
pub(crate) fn parse_package(
    package: &Package,
    options: &ParseOptions,
) -> Result<DocumentModel, Error> {
    let mut diagnostics = package.diagnostics.clone();
    let nodes_limit = options.max_xml_nodes;

    let package_rels = Relationships::load(package, "", nodes_limit, &mut diagnostics)?;
    let document_part = locate(&package_rels, TYPE_OFFICE_DOCUMENT, "word/document.xml");
    let document_rels = Relationships::load(package, &document_part, nodes_limit, &mut diagnostics)?;

    let theme = match load_xml(
        package,
        &locate_theme(package, &document_rels),
        Presence::Expected,
        options,
        &mut diagnostics,
    )? {
        Some(xml) => parse_theme(&xml),
        None => Theme::default(),
    };

    let styles_part = locate(&document_rels, TYPE_STYLES, "word/styles.xml");
    let styles = match load_xml(package, &styles_part, Presence::Expected, options, &mut diagnostics)? {
        Some(xml) => parse_styles(&xml, &styles_part, &mut diagnostics),
        None => StyleSheet::default(),
    };

    let numbering_part = locate(&document_rels, TYPE_NUMBERING, "word/numbering.xml");
    let lists = match load_xml(package, &numbering_part, Presence::Optional, options, &mut diagnostics)? {
        Some(xml) => parse_numbering(&xml),
        None => HashMap::new(),
    };

    let font_part = locate(&document_rels, TYPE_FONT_TABLE, "word/fontTable.xml");
    let (font_catalog, embedded_fonts) =
        match load_xml(package, &font_part, Presence::Optional, options, &mut diagnostics)? {
            Some(xml) => parse_font_table(&xml, package, &font_part, nodes_limit, &mut diagnostics)?,
            None => (FontCatalog::default(), Vec::new()),
        };

    let settings_part = locate(&document_rels, TYPE_SETTINGS, "word/settings.xml");
    let settings = match load_xml(package, &settings_part, Presence::Optional, options, &mut diagnostics)? {
        Some(xml) => parse_settings(&xml),
        None => DocumentSettings::default(),
    };

    let mut metadata = DocumentMetadata::default();
    let core_part = locate(&package_rels, TYPE_CORE_PROPERTIES, "docProps/core.xml");
    if let Some(xml) = load_xml(package, &core_part, Presence::Optional, options, &mut diagnostics)? {
        apply_core_properties(&xml, &mut metadata);
    }
    let app_part = locate(&package_rels, TYPE_EXTENDED_PROPERTIES, "docProps/app.xml");
    if let Some(xml) = load_xml(package, &app_part, Presence::Optional, options, &mut diagnostics)? {
        apply_app_properties(&xml, &mut metadata);
    }

    let ctx = ResolveContext {
        package,
        options,
        theme: &theme,
        fonts: &font_catalog,
        styles: &styles,
        lists: &lists,
    };

    let document = load_xml(package, &document_part, Presence::Expected, options, &mut diagnostics)?;
    let root = document.as_ref().map(|d| d.root_element());
    let body_node = root.and_then(|r| child(r, "body"));
    if root.is_some() && body_node.is_none() {
        diagnostics.warn(WarningKind::MalformedXml, &document_part, "document has no body");
    }
    let sect_pr = body_node.and_then(final_section);

    let mut scope = PartScope::new(&document_part, document_rels);
    let body = match body_node {
        Some(node) => walk_blocks(&ctx, &mut scope, node, Container::default()),
        None => Vec::new(),
    };
    let background = root.and_then(|r| parse_background(&ctx, &mut scope, r));

    let mut seen = HashSet::new();
    let mut story_parts = Vec::new();
    for story in body_node.map(story_refs).unwrap_or_default() {
        let Some(part) = scope.rels.resolve_part(&story.rel_id) else {
            scope.diagnostics.warn(
                WarningKind::RelationshipUnresolved,
                &document_part,
                format!("header/footer relationship {} not found", story.rel_id),
            );
            continue;
        };
        if seen.insert(part.clone()) {
            story_parts.push((story.is_header, story.kind, part));
        }
    }

    let stories = story_parts
        .par_iter()
        .map(|(is_header, kind, part)| walk_story(&ctx, *is_header, *kind, part))
        .collect::<Result<Vec<_>, Error>>()?;

    let mut images = scope.images;
    diagnostics.extend(scope.diagnostics);
    let mut headers = Vec::new();
    let mut footers = Vec::new();
    for story in stories {
        images.extend(story.images);
        diagnostics.extend(story.diagnostics);
        if story.is_header {
            headers.push(story.block);
        } else {
            footers.push(story.block);
        }
    }

    let lang = styles
        .default_run
        .lang
        .clone()
        .or_else(|| settings.theme_font_lang.clone())
        .unwrap_or_else(|| DEFAULT_LANG.to_string());
    let rtl = section_is_rtl(sect_pr)
        || styles.default_paragraph.bidi == Some(true)
        || is_rtl_language(&lang);

    log::debug!(
        "Model: {} blocks, {} headers, {} footers, {} images",
        body.len(),
        headers.len(),
        footers.len(),
        images.len()
    );

    Ok(DocumentModel {
        page: parse_page_geometry(sect_pr),
        body,
        floating_images: scope.floating,
        lists,
        theme_colors: theme.colors,
        theme_fonts: theme.fonts,
        styles: styles.styles,
        font_table: font_catalog.fonts,
        embedded_fonts,
        lang,
        rtl,
        headers,
        footers,
        background,
        images,
        settings,
        metadata,
        warnings: diagnostics.into_warnings(),
    })
}
