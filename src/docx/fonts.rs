use std::collections::HashMap;

use crate::error::{Diagnostics, Error, WarningKind};
use crate::fonts::font_fallback_with_class;
use crate::model::{EmbeddedFont, FontInfo, RunFonts};
use crate::package::Package;

use super::rels::Relationships;
use super::theme::Theme;
use super::xml::{attr, child, children, rel_attr, val};

/// Terminal value of the font cascade.
pub(crate) const FALLBACK_FONT: &str = "Calibri";

/// Font table catalog, keyed by font name.
#[derive(Default)]
pub(crate) struct FontCatalog {
    pub(crate) fonts: HashMap<String, FontInfo>,
}

impl FontCatalog {
    /// Bind a theme-derived name to the font table: a name the table does not
    /// list directly, but that appears as another entry's `altName`, resolves
    /// to that entry.
    pub(crate) fn bind(&self, name: &str) -> String {
        if self.fonts.contains_key(name) {
            return name.to_string();
        }
        self.fonts
            .values()
            .filter(|f| f.alt_name.as_deref().is_some_and(|alt| alt.eq_ignore_ascii_case(name)))
            .map(|f| f.name.as_str())
            // lowest name wins when several entries share an altName
            .min()
            .map_or_else(|| name.to_string(), str::to_string)
    }
}

struct EmbedRef {
    font_name: String,
    bold: bool,
    italic: bool,
    rel_id: String,
    font_key: Option<String>,
}

const EMBED_VARIANTS: [(&str, bool, bool); 4] = [
    ("embedRegular", false, false),
    ("embedBold", true, false),
    ("embedItalic", false, true),
    ("embedBoldItalic", true, true),
];

/// Parse `fontTable.xml` into the catalog plus any embedded font programs.
pub(crate) fn parse_font_table(
    xml: &roxmltree::Document,
    package: &Package,
    part_name: &str,
    nodes_limit: u32,
    diagnostics: &mut Diagnostics,
) -> Result<(FontCatalog, Vec<EmbeddedFont>), Error> {
    let mut catalog = FontCatalog::default();
    let mut embeds = Vec::new();

    for font_node in children(xml.root_element(), "font") {
        let Some(name) = attr(font_node, "name") else {
            continue;
        };
        let family = val(font_node, "family").map(str::to_string);
        let info = FontInfo {
            name: name.to_string(),
            alt_name: val(font_node, "altName").map(str::to_string),
            css_stack: font_fallback_with_class(name, family.as_deref()),
            family,
            charset: val(font_node, "charset").map(str::to_string),
            pitch: val(font_node, "pitch").map(str::to_string),
            panose: val(font_node, "panose1").map(str::to_string),
        };

        for &(tag, bold, italic) in &EMBED_VARIANTS {
            let Some(embed) = child(font_node, tag) else {
                continue;
            };
            let Some(rel_id) = rel_attr(embed, "id") else {
                continue;
            };
            embeds.push(EmbedRef {
                font_name: name.to_string(),
                bold,
                italic,
                rel_id: rel_id.to_string(),
                font_key: attr(embed, "fontKey").map(str::to_string),
            });
        }
        catalog.fonts.insert(info.name.clone(), info);
    }

    let mut embedded = Vec::new();
    if !embeds.is_empty() {
        let rels = Relationships::load(package, part_name, nodes_limit, diagnostics)?;
        for e in embeds {
            let Some(path) = rels.resolve_part(&e.rel_id) else {
                diagnostics.warn(
                    WarningKind::RelationshipUnresolved,
                    part_name,
                    format!("embedded font {} ({}) has no target", e.font_name, e.rel_id),
                );
                continue;
            };
            let Some(bytes) = package.get(&path) else {
                diagnostics.warn(
                    WarningKind::RelationshipUnresolved,
                    part_name,
                    format!("embedded font part {path} is missing"),
                );
                continue;
            };
            let mut data = bytes.to_vec();
            if let Some(key) = e.font_key.as_deref().and_then(parse_guid_to_bytes) {
                deobfuscate_font(&mut data, &key);
            }
            log::info!(
                "Extracted embedded font: {} bold={} italic={} ({} bytes)",
                e.font_name,
                e.bold,
                e.italic,
                data.len()
            );
            embedded.push(EmbeddedFont {
                name: e.font_name,
                bold: e.bold,
                italic: e.italic,
                data,
            });
        }
    }

    Ok((catalog, embedded))
}

/// `{302EE813-EB4A-4642-A93A-89EF99B2457E}` → the 16-byte obfuscation key:
/// GUID in its binary (mixed-endian) layout, reversed.
fn parse_guid_to_bytes(guid: &str) -> Option<[u8; 16]> {
    let hex: String = guid.chars().filter(|c| c.is_ascii_hexdigit()).collect();
    if hex.len() != 32 {
        return None;
    }
    let mut b = [0u8; 16];
    for (i, byte) in b.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    let mut key = [
        b[3], b[2], b[1], b[0], b[5], b[4], b[7], b[6], b[8], b[9], b[10], b[11], b[12], b[13],
        b[14], b[15],
    ];
    key.reverse();
    Some(key)
}

/// XOR the first 32 bytes of an obfuscated font with the key (applied twice).
fn deobfuscate_font(data: &mut [u8], key: &[u8; 16]) {
    for (i, byte) in data.iter_mut().take(32).enumerate() {
        *byte ^= key[i % 16];
    }
}

fn direct_name(fonts: &RunFonts) -> Option<&str> {
    [&fonts.ascii, &fonts.h_ansi, &fonts.east_asia, &fonts.complex_script]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}

fn theme_name(fonts: &RunFonts, theme: &Theme, catalog: &FontCatalog) -> Option<String> {
    [
        &fonts.ascii_theme,
        &fonts.h_ansi_theme,
        &fonts.east_asia_theme,
        &fonts.complex_script_theme,
    ]
    .into_iter()
    .flatten()
    .find_map(|r| theme.font(r))
    .map(|name| catalog.bind(name))
}

/// Effective font of a run. `sources` are ordered highest precedence first
/// (direct formatting, run style, paragraph style, table style, document
/// defaults); each contributes its literal name before its theme reference.
pub(crate) fn resolve_font(sources: &[&RunFonts], theme: &Theme, catalog: &FontCatalog) -> String {
    sources
        .iter()
        .find_map(|fonts| {
            direct_name(fonts)
                .map(str::to_string)
                .or_else(|| theme_name(fonts, theme, catalog))
        })
        .unwrap_or_else(|| FALLBACK_FONT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fonts(ascii: Option<&str>, ascii_theme: Option<&str>) -> RunFonts {
        RunFonts {
            ascii: ascii.map(str::to_string),
            ascii_theme: ascii_theme.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn direct_name_beats_theme_and_later_sources() {
        let theme = Theme::default();
        let catalog = FontCatalog::default();
        let direct = fonts(Some("Georgia"), Some("majorHAnsi"));
        let style = fonts(Some("Arial"), None);
        assert_eq!(resolve_font(&[&direct, &style], &theme, &catalog), "Georgia");
    }

    #[test]
    fn theme_reference_resolves_through_scheme() {
        let theme = Theme::default();
        let catalog = FontCatalog::default();
        let direct = fonts(None, Some("majorHAnsi"));
        assert_eq!(resolve_font(&[&direct], &theme, &catalog), "Calibri Light");
    }

    #[test]
    fn falls_through_to_calibri() {
        let theme = Theme::default();
        let catalog = FontCatalog::default();
        let empty = RunFonts::default();
        let blank = fonts(Some("  "), Some("unknownTheme"));
        assert_eq!(resolve_font(&[&empty, &blank], &theme, &catalog), "Calibri");
        assert_eq!(resolve_font(&[], &theme, &catalog), "Calibri");
    }

    #[test]
    fn east_asia_used_when_latin_slots_absent() {
        let theme = Theme::default();
        let catalog = FontCatalog::default();
        let direct = RunFonts {
            east_asia: Some("SimSun".into()),
            ..Default::default()
        };
        assert_eq!(resolve_font(&[&direct], &theme, &catalog), "SimSun");
    }

    #[test]
    fn alt_name_binding() {
        let mut catalog = FontCatalog::default();
        catalog.fonts.insert(
            "MS Mincho".into(),
            FontInfo {
                name: "MS Mincho".into(),
                alt_name: Some("ＭＳ 明朝".into()),
                ..Default::default()
            },
        );
        assert_eq!(catalog.bind("ＭＳ 明朝"), "MS Mincho");
        assert_eq!(catalog.bind("Calibri"), "Calibri");
    }

    #[test]
    fn guid_key_and_deobfuscation() {
        let key = parse_guid_to_bytes("{00112233-4455-6677-8899-AABBCCDDEEFF}").unwrap();
        // binary layout 33 22 11 00 55 44 77 66 88 99 AA BB CC DD EE FF, reversed
        assert_eq!(key[0], 0xFF);
        assert_eq!(key[15], 0x33);
        let mut data = vec![0u8; 40];
        deobfuscate_font(&mut data, &key);
        assert_eq!(&data[0..16], &key);
        assert_eq!(&data[16..32], &key);
        assert!(data[32..].iter().all(|&b| b == 0));
        assert_eq!(parse_guid_to_bytes("{short}"), None);
    }
}
