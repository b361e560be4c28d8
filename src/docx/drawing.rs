use crate::error::WarningKind;
use crate::model::{FloatingImage, ImageRef, Position, PositionValue, WrapMode};
use crate::units::emu_to_pixels;

use super::rels::resolve_image_by_rel_id;
use super::xml::{Node, child, descendant, is, rel_attr};
use super::{PartScope, ResolveContext};

pub(crate) enum Drawing {
    Inline(ImageRef),
    Floating(FloatingImage),
}

/// Resolve an image relationship of the current part and register the bytes
/// under their package path. Returns the path, or `None` (with a warning)
/// when the relationship or its target is missing.
pub(crate) fn register_image(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    rel_id: &str,
) -> Option<String> {
    if let Some(path) = scope.rels.resolve_part(rel_id)
        && scope.images.contains_key(&path)
    {
        return Some(path);
    }
    if ctx.options.include_images {
        let (path, data) =
            resolve_image_by_rel_id(ctx.package, &scope.rels, rel_id, &mut scope.diagnostics)?;
        scope.images.insert(path.clone(), data);
        return Some(path);
    }
    let path = scope
        .rels
        .resolve_part(rel_id)
        .filter(|p| ctx.package.contains(p));
    if path.is_none() {
        scope.diagnostics.warn(
            WarningKind::RelationshipUnresolved,
            scope.part,
            format!("image relationship {rel_id} does not resolve to a package part"),
        );
    }
    path
}

fn emu_attr(node: Node, name: &str) -> Option<f32> {
    node.attribute(name)
        .and_then(|v| v.trim().parse::<f32>().ok())
        .map(emu_to_pixels)
}

fn alt_text(container: Node) -> Option<String> {
    let doc_pr = child(container, "docPr")?;
    doc_pr
        .attribute("descr")
        .or_else(|| doc_pr.attribute("title"))
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn blip_embed<'a>(container: Node<'a>) -> Option<&'a str> {
    descendant(container, "blip").and_then(|b| rel_attr(b, "embed"))
}

/// `wp:inline` / `wp:anchor` children of a `w:drawing`. Drawings without a
/// picture (charts, shapes, SmartArt) are skipped.
pub(crate) fn parse_drawing(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    drawing: Node,
) -> Vec<Drawing> {
    let mut out = Vec::new();
    for container in drawing.children() {
        let anchored = is(container, "anchor");
        if !anchored && !is(container, "inline") {
            continue;
        }
        let Some(embed) = blip_embed(container) else {
            log::debug!("Drawing without a picture in {}", scope.part);
            continue;
        };
        let Some(id) = register_image(ctx, scope, embed) else {
            continue;
        };
        let extent = child(container, "extent");
        let image = ImageRef {
            id,
            width: extent.and_then(|e| emu_attr(e, "cx")).unwrap_or(0.0),
            height: extent.and_then(|e| emu_attr(e, "cy")).unwrap_or(0.0),
            alt_text: alt_text(container),
        };
        if anchored {
            out.push(Drawing::Floating(parse_anchor(container, image)));
        } else {
            out.push(Drawing::Inline(image));
        }
    }
    out
}

fn parse_position(node: Option<Node>, default_from: &str) -> Position {
    let relative_from = node
        .and_then(|n| n.attribute("relativeFrom"))
        .unwrap_or(default_from)
        .to_string();
    let value = node
        .and_then(|n| {
            n.children().filter(|c| c.is_element()).find_map(|c| {
                let text = c.text().unwrap_or("").trim();
                match c.tag_name().name() {
                    "align" => Some(PositionValue::Align(text.to_string())),
                    "posOffset" => text
                        .parse::<f32>()
                        .ok()
                        .map(|emu| PositionValue::Offset(emu_to_pixels(emu))),
                    // thousandths of a percent
                    "pctPosHOffset" | "pctPosVOffset" => text
                        .parse::<f32>()
                        .ok()
                        .map(|v| PositionValue::Percent(v / 1000.0)),
                    _ => None,
                }
            })
        })
        .unwrap_or(PositionValue::Offset(0.0));
    Position {
        relative_from,
        value,
    }
}

fn wrap_mode(anchor: Node) -> WrapMode {
    anchor
        .children()
        .find_map(|n| match n.tag_name().name() {
            "wrapSquare" => Some(WrapMode::Square),
            "wrapTight" => Some(WrapMode::Tight),
            "wrapThrough" => Some(WrapMode::Through),
            "wrapTopAndBottom" => Some(WrapMode::TopAndBottom),
            "wrapNone" => Some(WrapMode::None),
            _ => None,
        })
        .unwrap_or(WrapMode::None)
}

fn parse_anchor(anchor: Node, image: ImageRef) -> FloatingImage {
    let behind_doc = matches!(anchor.attribute("behindDoc"), Some("1" | "true" | "on"));
    let z_index = if behind_doc {
        -1
    } else {
        anchor
            .attribute("relativeHeight")
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(1)
    };

    let simple = matches!(anchor.attribute("simplePos"), Some("1" | "true" | "on"));
    let (position_h, position_v) = match child(anchor, "simplePos").filter(|_| simple) {
        Some(sp) => (
            Position {
                relative_from: "page".into(),
                value: PositionValue::Offset(emu_attr(sp, "x").unwrap_or(0.0)),
            },
            Position {
                relative_from: "page".into(),
                value: PositionValue::Offset(emu_attr(sp, "y").unwrap_or(0.0)),
            },
        ),
        None => (
            parse_position(child(anchor, "positionH"), "column"),
            parse_position(child(anchor, "positionV"), "paragraph"),
        ),
    };

    FloatingImage {
        image,
        position_h,
        position_v,
        wrap: wrap_mode(anchor),
        behind_doc,
        z_index,
    }
}

/// Length from a VML inline style (`width:120pt;height:3.5in`) in pixels.
fn vml_length(style: &str, key: &str) -> Option<f32> {
    let raw = style.split(';').find_map(|decl| {
        let (k, v) = decl.split_once(':')?;
        (k.trim() == key).then(|| v.trim())
    })?;
    const UNITS: [(&str, f32); 6] = [
        ("pt", 96.0 / 72.0),
        ("px", 1.0),
        ("in", 96.0),
        ("cm", 96.0 / 2.54),
        ("mm", 96.0 / 25.4),
        ("pc", 16.0),
    ];
    let (num, factor) = UNITS
        .iter()
        .find_map(|&(suffix, factor)| raw.strip_suffix(suffix).map(|n| (n, factor)))
        // unitless lengths are pixels
        .unwrap_or((raw, 1.0));
    num.trim().parse::<f32>().ok().map(|n| n * factor)
}

/// Legacy `w:pict` picture (`v:shape/v:imagedata`), treated as inline.
pub(crate) fn parse_vml_picture(
    ctx: &ResolveContext,
    scope: &mut PartScope,
    pict: Node,
) -> Option<ImageRef> {
    let imagedata = descendant(pict, "imagedata")?;
    let rel_id = rel_attr(imagedata, "id")?;
    let id = register_image(ctx, scope, rel_id)?;
    let shape = imagedata.parent().filter(|p| p.is_element());
    let style = shape.and_then(|s| s.attribute("style")).unwrap_or("");
    Some(ImageRef {
        id,
        width: vml_length(style, "width").unwrap_or(0.0),
        height: vml_length(style, "height").unwrap_or(0.0),
        alt_text: imagedata
            .attribute(("urn:schemas-microsoft-com:office:office", "title"))
            .or_else(|| shape.and_then(|s| s.attribute("alt")))
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::xml::parse_xml;

    const ANCHOR: &str = r#"<wp:anchor xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing"
        behindDoc="0" relativeHeight="251659264" simplePos="0">
      <wp:simplePos x="0" y="0"/>
      <wp:positionH relativeFrom="margin"><wp:align>center</wp:align></wp:positionH>
      <wp:positionV relativeFrom="page"><wp:posOffset>914400</wp:posOffset></wp:positionV>
      <wp:extent cx="952500" cy="476250"/>
      <wp:wrapSquare wrapText="bothSides"/>
    </wp:anchor>"#;

    fn image() -> ImageRef {
        ImageRef {
            id: "word/media/image1.png".into(),
            width: 100.0,
            height: 50.0,
            alt_text: None,
        }
    }

    #[test]
    fn anchor_position_and_z_order() {
        let doc = parse_xml(ANCHOR, 1000).unwrap();
        let float = parse_anchor(doc.root_element(), image());
        assert_eq!(float.position_h.relative_from, "margin");
        assert_eq!(float.position_h.value, PositionValue::Align("center".into()));
        assert_eq!(float.position_v.relative_from, "page");
        assert_eq!(float.position_v.value, PositionValue::Offset(96.0));
        assert_eq!(float.wrap, WrapMode::Square);
        assert!(!float.behind_doc);
        assert_eq!(float.z_index, 251659264);
        assert_eq!(emu_attr(child(doc.root_element(), "extent").unwrap(), "cx"), Some(100.0));
    }

    #[test]
    fn behind_doc_forces_negative_z() {
        let src = ANCHOR.replace(r#"behindDoc="0""#, r#"behindDoc="1""#);
        let doc = parse_xml(&src, 1000).unwrap();
        let float = parse_anchor(doc.root_element(), image());
        assert!(float.behind_doc);
        assert_eq!(float.z_index, -1);
    }

    #[test]
    fn defaults_without_position_nodes() {
        let src = r#"<wp:anchor xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" behindDoc="0"/>"#;
        let doc = parse_xml(src, 1000).unwrap();
        let float = parse_anchor(doc.root_element(), image());
        assert_eq!(float.position_h.relative_from, "column");
        assert_eq!(float.position_v.relative_from, "paragraph");
        assert_eq!(float.position_h.value, PositionValue::Offset(0.0));
        assert_eq!(float.wrap, WrapMode::None);
        assert_eq!(float.z_index, 1);
    }

    #[test]
    fn vml_lengths() {
        let style = "position:absolute;width:72pt;height:1in;margin-left:3pt";
        assert_eq!(vml_length(style, "width"), Some(96.0));
        assert_eq!(vml_length(style, "height"), Some(96.0));
        assert_eq!(vml_length(style, "top"), None);
    }
}
