use crate::color::to_hex;
use crate::model::{Background, HeaderFooterKind, PageGeometry};
use crate::units::twips_to_pixels;

use super::drawing::register_image;
use super::styles::parse_color;
use super::xml::{Node, attr, child, descendant, is, rel_attr, toggle, twips_px};
use super::{PartScope, ResolveContext};

/// A4 portrait, in twips.
const DEFAULT_PAGE_WIDTH: f32 = 11906.0;
const DEFAULT_PAGE_HEIGHT: f32 = 16838.0;
const DEFAULT_MARGIN: f32 = 1440.0;
const DEFAULT_HEADER_DISTANCE: f32 = 720.0;

impl Default for PageGeometry {
    fn default() -> Self {
        let margin = twips_to_pixels(DEFAULT_MARGIN);
        PageGeometry {
            width: twips_to_pixels(DEFAULT_PAGE_WIDTH),
            height: twips_to_pixels(DEFAULT_PAGE_HEIGHT),
            margin: [margin; 4],
            gutter: 0.0,
            header: twips_to_pixels(DEFAULT_HEADER_DISTANCE),
            footer: twips_to_pixels(DEFAULT_HEADER_DISTANCE),
        }
    }
}

/// Section properties governing the page: the body's trailing `w:sectPr`,
/// else the last one attached to a paragraph.
pub(crate) fn final_section<'a>(body: Node<'a>) -> Option<Node<'a>> {
    child(body, "sectPr").or_else(|| {
        body.descendants()
            .filter(|n| is(*n, "sectPr"))
            .last()
    })
}

pub(crate) fn parse_page_geometry(sect_pr: Option<Node>) -> PageGeometry {
    let defaults = PageGeometry::default();
    let Some(sect_pr) = sect_pr else {
        return defaults;
    };
    let pg_sz = child(sect_pr, "pgSz");
    let pg_mar = child(sect_pr, "pgMar");
    let size = |name: &str, fallback: f32| pg_sz.and_then(|n| twips_px(n, name)).unwrap_or(fallback);
    let mar = |name: &str, fallback: f32| pg_mar.and_then(|n| twips_px(n, name)).unwrap_or(fallback);

    let mut width = size("w", defaults.width);
    let mut height = size("h", defaults.height);
    // orientation without swapped dimensions
    let landscape = pg_sz.and_then(|n| attr(n, "orient")) == Some("landscape");
    if landscape && width < height {
        std::mem::swap(&mut width, &mut height);
    }

    PageGeometry {
        width,
        height,
        margin: [
            // negative top/bottom margins mean "do not move text for headers"
            mar("top", defaults.margin[0]).abs(),
            mar("right", defaults.margin[1]),
            mar("bottom", defaults.margin[2]).abs(),
            mar("left", defaults.margin[3]),
        ],
        gutter: mar("gutter", defaults.gutter),
        header: mar("header", defaults.header),
        footer: mar("footer", defaults.footer),
    }
}

pub(crate) fn section_is_rtl(sect_pr: Option<Node>) -> bool {
    sect_pr
        .and_then(|s| toggle(s, "bidi"))
        .unwrap_or(false)
}

/// Header or footer referenced from a section, by relationship id.
pub(crate) struct StoryRef {
    pub(crate) is_header: bool,
    pub(crate) kind: HeaderFooterKind,
    pub(crate) rel_id: String,
}

/// Header/footer references of every section in the body, in document order.
pub(crate) fn story_refs(body: Node) -> Vec<StoryRef> {
    let mut refs = Vec::new();
    for sect_pr in body.descendants().filter(|n| is(*n, "sectPr")) {
        for node in sect_pr.children().filter(|n| n.is_element()) {
            let is_header = match node.tag_name().name() {
                "headerReference" => true,
                "footerReference" => false,
                _ => continue,
            };
            let Some(rel_id) = rel_attr(node, "id") else {
                continue;
            };
            let kind = match attr(node, "type") {
                Some("first") => HeaderFooterKind::First,
                Some("even") => HeaderFooterKind::Even,
                _ => HeaderFooterKind::Default,
            };
            refs.push(StoryRef {
                is_header,
                kind,
                rel_id: rel_id.to_string(),
            });
        }
    }
    refs
}

/// `w:background`: a fill colour and/or a VML fill image.
pub(crate) fn parse_background(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    document: Node,
) -> Option<Background> {
    let bg = child(document, "background")?;
    let color = parse_color(bg)
        .and_then(|c| ctx.theme.resolve(&c))
        .map(to_hex);
    let image = descendant(bg, "fill")
        .and_then(|fill| rel_attr(fill, "id"))
        .and_then(|id| register_image(ctx, scope, id));
    if color.is_none() && image.is_none() {
        return None;
    }
    Some(Background { color, image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::parse_xml;

    #[test]
    fn defaults_are_a4_with_inch_margins() {
        let page = parse_page_geometry(None);
        assert!((page.width - 793.7).abs() < 0.1);
        assert!((page.height - 1122.5).abs() < 0.1);
        assert_eq!(page.margin, [96.0; 4]);
        assert_eq!(page.gutter, 0.0);
        assert_eq!(page.header, 48.0);
    }

    #[test]
    fn letter_landscape_section() {
        let src = r#"<w:sectPr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
            <w:pgSz w:w="12240" w:h="15840" w:orient="landscape"/>
            <w:pgMar w:top="-720" w:right="1080" w:bottom="1440" w:left="1080" w:header="360" w:footer="360" w:gutter="360"/>
        </w:sectPr>"#;
        let doc = parse_xml(src, 1000).unwrap();
        let page = parse_page_geometry(Some(doc.root_element()));
        assert_eq!(page.width, 1056.0);
        assert_eq!(page.height, 816.0);
        assert_eq!(page.margin, [48.0, 72.0, 96.0, 72.0]);
        assert_eq!(page.gutter, 24.0);
        assert_eq!(page.footer, 24.0);
    }

    #[test]
    fn header_and_footer_references() {
        let src = r#"<w:body xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
                xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
            <w:p><w:pPr><w:sectPr><w:headerReference w:type="default" r:id="rId7"/></w:sectPr></w:pPr></w:p>
            <w:sectPr>
              <w:headerReference w:type="first" r:id="rId8"/>
              <w:footerReference w:type="even" r:id="rId9"/>
              <w:bidi/>
            </w:sectPr>
        </w:body>"#;
        let doc = parse_xml(src, 1000).unwrap();
        let body = doc.root_element();
        let refs = story_refs(body);
        assert_eq!(refs.len(), 3);
        assert!(refs[0].is_header && refs[0].kind == HeaderFooterKind::Default);
        assert_eq!(refs[1].rel_id, "rId8");
        assert!(!refs[2].is_header && refs[2].kind == HeaderFooterKind::Even);
        assert!(section_is_rtl(final_section(body)));
    }
}
