//! Namespace-tolerant XML querying.
//!
//! WordprocessingML shows up transitional (`w:` bound to the 2006 namespace),
//! strict (`purl.oclc.org`), or with unprefixed tags from hand-rolled
//! producers. Every lookup in the crate goes through these helpers, which
//! match on local names and prefer the WordprocessingML attribute namespace.

use crate::units::twips_to_pixels;

const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const WML_STRICT_NS: &str = "http://purl.oclc.org/ooxml/wordprocessingml/main";
const REL_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const REL_STRICT_NS: &str = "http://purl.oclc.org/ooxml/officeDocument/relationships";

pub(crate) type Node<'a> = roxmltree::Node<'a, 'a>;

pub(crate) fn parse_xml(
    text: &str,
    nodes_limit: u32,
) -> Result<roxmltree::Document<'_>, roxmltree::Error> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: false,
        nodes_limit,
        ..roxmltree::ParsingOptions::default()
    };
    roxmltree::Document::parse_with_options(text, options)
}

pub(crate) fn is(node: Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

pub(crate) fn child<'a>(node: Node<'a>, name: &str) -> Option<Node<'a>> {
    node.children().find(|n| is(*n, name))
}

pub(crate) fn children<'a>(node: Node<'a>, name: &str) -> impl Iterator<Item = Node<'a>> {
    node.children().filter(move |n| is(*n, name))
}

pub(crate) fn descendant<'a>(node: Node<'a>, name: &str) -> Option<Node<'a>> {
    node.descendants().find(|n| is(*n, name))
}

/// Follow a path of child names, e.g. `path(style, &["pPr", "spacing"])`.
pub(crate) fn path<'a>(node: Node<'a>, names: &[&str]) -> Option<Node<'a>> {
    names.iter().try_fold(node, |n, name| child(n, name))
}

pub(crate) fn attr<'a>(node: Node<'a>, name: &str) -> Option<&'a str> {
    node.attribute((WML_NS, name))
        .or_else(|| node.attribute((WML_STRICT_NS, name)))
        .or_else(|| node.attributes().find(|a| a.name() == name).map(|a| a.value()))
}

/// Relationship-namespace attribute (`r:id`, `r:embed`), falling back to any
/// attribute with the same local name.
pub(crate) fn rel_attr<'a>(node: Node<'a>, name: &str) -> Option<&'a str> {
    node.attribute((REL_NS, name))
        .or_else(|| node.attribute((REL_STRICT_NS, name)))
        .or_else(|| node.attributes().find(|a| a.name() == name).map(|a| a.value()))
}

/// `<w:child w:val="…"/>`
pub(crate) fn val<'a>(node: Node<'a>, child_name: &str) -> Option<&'a str> {
    child(node, child_name).and_then(|n| attr(n, "val"))
}

/// WML toggle element (`w:b`, `w:i`, `w:strike`): present with no `val`, or a
/// `val` other than `0`/`false`/`off`, means true.
pub(crate) fn toggle(parent: Node, name: &str) -> Option<bool> {
    child(parent, name).map(|n| attr(n, "val").is_none_or(|v| !matches!(v, "0" | "false" | "off")))
}

/// Boolean attribute in any of its spellings.
pub(crate) fn bool_attr(node: Node, name: &str) -> Option<bool> {
    attr(node, name).map(|v| matches!(v, "1" | "true" | "on"))
}

/// Parse a twips measure. Plain numbers are twips; strict documents may use
/// universal measures (`12pt`, `1in`, `2.54cm`, `10mm`, `1pc`).
pub(crate) fn parse_twips(val: &str) -> Option<f32> {
    const UNITS: [(&str, f32); 6] = [
        ("pt", 20.0),
        ("in", 1440.0),
        ("cm", 1440.0 / 2.54),
        ("mm", 1440.0 / 25.4),
        ("pc", 240.0),
        ("pi", 240.0),
    ];
    let val = val.trim();
    let (num, factor) = UNITS
        .iter()
        .find_map(|&(suffix, factor)| val.strip_suffix(suffix).map(|n| (n, factor)))
        .unwrap_or((val, 1.0));
    num.trim().parse::<f32>().ok().map(|n| n * factor)
}

/// Twips attribute converted to pixels.
pub(crate) fn twips_px(node: Node, name: &str) -> Option<f32> {
    attr(node, name).and_then(parse_twips).map(twips_to_pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIXED: &str = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
        <w:body><w:p><w:pPr><w:jc w:val="center"/><w:b/><w:i w:val="0"/></w:pPr></w:p></w:body>
    </w:document>"#;

    const BARE: &str = r#"<document><body><p><pPr><jc val="center"/><b/><i val="false"/></pPr></p></body></document>"#;

    #[test]
    fn lookups_work_with_and_without_prefix() {
        for src in [PREFIXED, BARE] {
            let doc = parse_xml(src, 10_000).unwrap();
            let ppr = path(doc.root_element(), &["body", "p", "pPr"]).unwrap();
            assert_eq!(val(ppr, "jc"), Some("center"));
            assert_eq!(toggle(ppr, "b"), Some(true));
            assert_eq!(toggle(ppr, "i"), Some(false));
            assert_eq!(toggle(ppr, "u"), None);
        }
    }

    #[test]
    fn dtd_is_rejected() {
        let src = r#"<!DOCTYPE x [<!ENTITY a "aaaa">]><x>&a;</x>"#;
        assert!(parse_xml(src, 10_000).is_err());
    }

    #[test]
    fn universal_measures() {
        assert_eq!(parse_twips("1440"), Some(1440.0));
        assert_eq!(parse_twips("72pt"), Some(1440.0));
        assert_eq!(parse_twips("1in"), Some(1440.0));
        assert_eq!(parse_twips("abc"), None);
        assert_eq!(parse_twips(""), None);
    }

    #[test]
    fn rel_attr_prefers_relationship_namespace() {
        let src = r#"<w:hyperlink xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"
            w:id="wrong" r:id="rId5"/>"#;
        let doc = parse_xml(src, 100).unwrap();
        assert_eq!(rel_attr(doc.root_element(), "id"), Some("rId5"));
    }
}
