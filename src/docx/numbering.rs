use std::collections::HashMap;

use crate::model::{Alignment, Indent, NumberingDefinition, NumberingLevel};

use super::styles::{parse_alignment, parse_indent};
use super::text::normalize_symbol_text;
use super::xml::{Node, attr, child, children, path, val};

/// Parse `numbering.xml` into list definitions keyed by `numId`. Abstract
/// definitions no instance refers to are published under their
/// `abstractNumId`, unless an instance already owns that key.
pub(crate) fn parse_numbering(xml: &roxmltree::Document) -> HashMap<String, NumberingDefinition> {
    let root = xml.root_element();

    let mut abstracts: HashMap<String, Vec<NumberingLevel>> = HashMap::new();
    for node in children(root, "abstractNum") {
        let Some(abs_id) = attr(node, "abstractNumId") else {
            continue;
        };
        let mut levels: Vec<NumberingLevel> = children(node, "lvl").filter_map(parse_level).collect();
        levels.sort_by_key(|l| l.level);
        levels.dedup_by_key(|l| l.level);
        abstracts.insert(abs_id.to_string(), levels);
    }

    let mut lists = HashMap::new();
    let mut instantiated = Vec::new();
    for node in children(root, "num") {
        let Some(num_id) = attr(node, "numId") else {
            continue;
        };
        let Some(abs_id) = val(node, "abstractNumId") else {
            continue;
        };
        let Some(base) = abstracts.get(abs_id) else {
            log::debug!("numId {num_id} refers to unknown abstractNum {abs_id}");
            continue;
        };
        let mut levels = base.clone();
        for ovr in children(node, "lvlOverride") {
            apply_override(&mut levels, ovr);
        }
        instantiated.push(abs_id.to_string());
        lists.insert(
            num_id.to_string(),
            NumberingDefinition {
                abstract_num_id: abs_id.to_string(),
                levels,
            },
        );
    }

    for (abs_id, levels) in abstracts {
        if instantiated.contains(&abs_id) || lists.contains_key(&abs_id) {
            continue;
        }
        lists.insert(
            abs_id.clone(),
            NumberingDefinition {
                abstract_num_id: abs_id,
                levels,
            },
        );
    }

    log::debug!("Parsed {} list definitions", lists.len());
    lists
}

fn apply_override(levels: &mut Vec<NumberingLevel>, ovr: Node) {
    let Some(ilvl) = attr(ovr, "ilvl").and_then(|v| v.parse::<u8>().ok()) else {
        return;
    };
    if let Some(mut replacement) = child(ovr, "lvl").and_then(parse_level) {
        replacement.level = ilvl;
        match levels.iter_mut().find(|l| l.level == ilvl) {
            Some(existing) => *existing = replacement,
            None => {
                levels.push(replacement);
                levels.sort_by_key(|l| l.level);
            }
        }
    }
    if let Some(start) = val(ovr, "startOverride").and_then(|v| v.parse::<u32>().ok())
        && let Some(level) = levels.iter_mut().find(|l| l.level == ilvl)
    {
        level.start = start;
    }
}

fn parse_level(lvl: Node) -> Option<NumberingLevel> {
    let level = attr(lvl, "ilvl")?.parse::<u8>().ok()?;
    let format = val(lvl, "numFmt").unwrap_or("decimal").to_string();
    let lvl_text = val(lvl, "lvlText").unwrap_or("").to_string();
    let bullet = (format == "bullet").then(|| {
        let glyph = normalize_symbol_text(&lvl_text);
        if glyph.is_empty() { "\u{2022}".to_string() } else { glyph }
    });
    let font = path(lvl, &["rPr", "rFonts"])
        .and_then(|f| attr(f, "ascii").or_else(|| attr(f, "hAnsi")))
        .map(str::to_string);

    Some(NumberingLevel {
        level,
        format,
        bullet,
        start: val(lvl, "start")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1),
        alignment: val(lvl, "lvlJc")
            .and_then(parse_alignment)
            .unwrap_or(Alignment::Left),
        suffix: val(lvl, "suff").unwrap_or("tab").to_string(),
        indent: path(lvl, &["pPr", "ind"])
            .map(parse_indent)
            .unwrap_or_else(Indent::default),
        font,
        lvl_text,
    })
}
