//! Theme part: colour scheme and major/minor font bindings.

use crate::color::{
    ColorTransform, Rgb, apply_transforms, parse_hex_color, theme_shade, theme_tint, to_hex,
};
use crate::model::{ColorValue, FontScheme, ThemeColorScheme, ThemeFontSet};

use super::xml::{Node, child, descendant};

const SLOTS: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Office default palette, used for any slot the theme fails to supply.
const DEFAULT_PALETTE: [Rgb; 12] = [
    [0x00, 0x00, 0x00],
    [0xFF, 0xFF, 0xFF],
    [0x44, 0x54, 0x6A],
    [0xE7, 0xE6, 0xE6],
    [0x44, 0x72, 0xC4],
    [0xED, 0x7D, 0x31],
    [0xA5, 0xA5, 0xA5],
    [0xFF, 0xC0, 0x00],
    [0x5B, 0x9B, 0xD5],
    [0x70, 0xAD, 0x47],
    [0x05, 0x63, 0xC1],
    [0x95, 0x4F, 0x72],
];

pub(crate) struct Theme {
    pub(crate) colors: ThemeColorScheme,
    pub(crate) fonts: FontScheme,
    palette: [Rgb; 12],
}

impl Default for Theme {
    fn default() -> Self {
        Theme::from_palette(None, DEFAULT_PALETTE, default_font_scheme())
    }
}

pub(crate) fn default_font_scheme() -> FontScheme {
    FontScheme {
        name: None,
        major_font: ThemeFontSet {
            latin: "Calibri Light".into(),
            east_asia: String::new(),
            complex_script: String::new(),
        },
        minor_font: ThemeFontSet {
            latin: "Calibri".into(),
            east_asia: String::new(),
            complex_script: String::new(),
        },
    }
}

/// Index into the palette for any of the names a slot goes by: DrawingML
/// (`dk1`, `tx1`, `bg1`) or WordprocessingML (`text1`, `dark1`, `hyperlink`).
fn slot_index(name: &str) -> Option<usize> {
    let idx = match name {
        "dk1" | "tx1" | "dark1" | "text1" => 0,
        "lt1" | "bg1" | "light1" | "background1" => 1,
        "dk2" | "tx2" | "dark2" | "text2" => 2,
        "lt2" | "bg2" | "light2" | "background2" => 3,
        "accent1" => 4,
        "accent2" => 5,
        "accent3" => 6,
        "accent4" => 7,
        "accent5" => 8,
        "accent6" => 9,
        "hlink" | "hyperlink" => 10,
        "folHlink" | "followedHyperlink" => 11,
        _ => return None,
    };
    Some(idx)
}

impl Theme {
    fn from_palette(name: Option<String>, palette: [Rgb; 12], fonts: FontScheme) -> Self {
        let hex = |i: usize| to_hex(palette[i]);
        let colors = ThemeColorScheme {
            name,
            dark1: hex(0),
            light1: hex(1),
            dark2: hex(2),
            light2: hex(3),
            accent1: hex(4),
            accent2: hex(5),
            accent3: hex(6),
            accent4: hex(7),
            accent5: hex(8),
            accent6: hex(9),
            hyperlink: hex(10),
            followed_hyperlink: hex(11),
        };
        Theme {
            colors,
            fonts,
            palette,
        }
    }

    pub(crate) fn color(&self, slot: &str) -> Option<Rgb> {
        slot_index(slot).map(|i| self.palette[i])
    }

    /// Resolve a source colour to RGB. `Auto` stays unresolved so the caller
    /// can pick a contrast colour.
    pub(crate) fn resolve(&self, value: &ColorValue) -> Option<Rgb> {
        match value {
            ColorValue::Auto => None,
            ColorValue::Rgb(hex) => parse_hex_color(hex),
            ColorValue::Theme {
                slot,
                tint,
                shade,
                fallback,
            } => {
                let Some(mut rgb) = self.color(slot) else {
                    return fallback.as_deref().and_then(parse_hex_color);
                };
                if let Some(t) = tint {
                    rgb = theme_tint(rgb, *t);
                }
                if let Some(s) = shade {
                    rgb = theme_shade(rgb, *s);
                }
                Some(rgb)
            }
        }
    }

    /// Translate a `w:asciiTheme`-style reference (`minorHAnsi`, `majorEastAsia`, …).
    pub(crate) fn font(&self, theme_ref: &str) -> Option<&str> {
        let set = if theme_ref.starts_with("major") {
            &self.fonts.major_font
        } else if theme_ref.starts_with("minor") {
            &self.fonts.minor_font
        } else {
            return None;
        };
        let name = match &theme_ref[5..] {
            "Ascii" | "HAnsi" => &set.latin,
            "EastAsia" => &set.east_asia,
            "Bidi" => &set.complex_script,
            _ => return None,
        };
        (!name.is_empty()).then_some(name.as_str())
    }
}

fn system_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "windowText" | "menuText" | "captionText" | "btnText" | "infoText" => [0, 0, 0],
        "window" | "menu" | "highlightText" | "btnHighlight" => [255, 255, 255],
        "btnFace" | "3dLight" | "menuBar" => [0xF0, 0xF0, 0xF0],
        "btnShadow" | "grayText" => [0xA0, 0xA0, 0xA0],
        "3dDkShadow" => [0x69, 0x69, 0x69],
        "highlight" | "hotLight" => [0x00, 0x78, 0xD7],
        "activeCaption" => [0x99, 0xB4, 0xD1],
        "inactiveCaption" => [0xBF, 0xCD, 0xDB],
        "inactiveCaptionText" => [0x43, 0x4E, 0x54],
        "infoBk" => [0xFF, 0xFF, 0xE1],
        "appWorkspace" => [0xAB, 0xAB, 0xAB],
        "background" => [0x00, 0x00, 0x00],
        "activeBorder" => [0xB4, 0xB4, 0xB4],
        "inactiveBorder" => [0xF4, 0xF7, 0xFC],
        "scrollBar" => [0xC8, 0xC8, 0xC8],
        "windowFrame" => [0x64, 0x64, 0x64],
        _ => return None,
    };
    Some(rgb)
}

/// DrawingML preset colour names (a subset of the CSS named colours).
fn preset_color(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => [0, 0, 0],
        "white" => [255, 255, 255],
        "red" => [255, 0, 0],
        "green" => [0, 128, 0],
        "lime" => [0, 255, 0],
        "blue" => [0, 0, 255],
        "yellow" => [255, 255, 0],
        "cyan" | "aqua" => [0, 255, 255],
        "magenta" | "fuchsia" => [255, 0, 255],
        "gray" | "grey" => [128, 128, 128],
        "silver" => [192, 192, 192],
        "maroon" => [128, 0, 0],
        "olive" => [128, 128, 0],
        "navy" => [0, 0, 128],
        "purple" => [128, 0, 128],
        "teal" => [0, 128, 128],
        "orange" => [255, 165, 0],
        "pink" => [255, 192, 203],
        "brown" => [165, 42, 42],
        "gold" => [255, 215, 0],
        "indigo" => [75, 0, 130],
        "violet" => [238, 130, 238],
        "coral" => [255, 127, 80],
        "salmon" => [250, 128, 114],
        "tan" => [210, 180, 140],
        "beige" => [245, 245, 220],
        "ivory" => [255, 255, 240],
        "khaki" => [240, 230, 140],
        "lavender" => [230, 230, 250],
        "crimson" => [220, 20, 60],
        "turquoise" => [64, 224, 208],
        "darkBlue" | "dkBlue" => [0, 0, 139],
        "darkRed" | "dkRed" => [139, 0, 0],
        "darkGreen" | "dkGreen" => [0, 100, 0],
        "darkGray" | "dkGray" | "darkGrey" | "dkGrey" => [169, 169, 169],
        "lightGray" | "ltGray" | "lightGrey" | "ltGrey" => [211, 211, 211],
        "lightBlue" | "ltBlue" => [173, 216, 230],
        "lightGreen" | "ltGreen" => [144, 238, 144],
        "skyBlue" => [135, 206, 235],
        "steelBlue" => [70, 130, 180],
        "royalBlue" => [65, 105, 225],
        "slateGray" | "slateGrey" => [112, 128, 144],
        "forestGreen" => [34, 139, 34],
        "seaGreen" => [46, 139, 87],
        "chocolate" => [210, 105, 30],
        "tomato" => [255, 99, 71],
        "orchid" => [218, 112, 214],
        "plum" => [221, 160, 221],
        _ => return None,
    };
    Some(rgb)
}

/// Modifiers in declaration order.
fn transforms(color_node: Node) -> Vec<ColorTransform> {
    color_node
        .children()
        .filter(|n| n.is_element())
        .filter_map(|n| ColorTransform::from_element(n.tag_name().name(), n.attribute("val")?))
        .collect()
}

enum SlotSource {
    Resolved(Rgb),
    /// `schemeClr` pointing at another slot, plus its own modifiers.
    Scheme(usize, Vec<ColorTransform>),
    Unresolved,
}

fn read_slot(slot_node: Node) -> SlotSource {
    let Some(color_node) = slot_node.children().find(|n| n.is_element()) else {
        return SlotSource::Unresolved;
    };
    let base = match color_node.tag_name().name() {
        "srgbClr" => color_node.attribute("val").and_then(parse_hex_color),
        "sysClr" => color_node
            .attribute("lastClr")
            .and_then(parse_hex_color)
            .or_else(|| color_node.attribute("val").and_then(system_color)),
        "prstClr" => color_node.attribute("val").and_then(preset_color),
        "scrgbClr" => {
            let pct = |a: &str| -> Option<u8> {
                let v = color_node.attribute(a)?.parse::<f32>().ok()? / 100_000.0;
                Some((v.clamp(0.0, 1.0) * 255.0).round() as u8)
            };
            match (pct("r"), pct("g"), pct("b")) {
                (Some(r), Some(g), Some(b)) => Some([r, g, b]),
                _ => None,
            }
        }
        "schemeClr" => {
            return match color_node.attribute("val").and_then(slot_index) {
                Some(idx) => SlotSource::Scheme(idx, transforms(color_node)),
                None => SlotSource::Unresolved,
            };
        }
        _ => None,
    };
    match base {
        Some(rgb) => SlotSource::Resolved(apply_transforms(rgb, &transforms(color_node))),
        None => SlotSource::Unresolved,
    }
}

fn font_set(node: Option<Node>, fallback: &ThemeFontSet) -> ThemeFontSet {
    let typeface = |name: &str, fallback: &str| -> String {
        node.and_then(|n| child(n, name))
            .and_then(|n| n.attribute("typeface"))
            .filter(|tf| !tf.is_empty())
            .unwrap_or(fallback)
            .to_string()
    };
    ThemeFontSet {
        latin: typeface("latin", &fallback.latin),
        east_asia: typeface("ea", &fallback.east_asia),
        complex_script: typeface("cs", &fallback.complex_script),
    }
}

pub(crate) fn parse_theme(xml: &roxmltree::Document) -> Theme {
    let root = xml.root_element();
    let mut palette = DEFAULT_PALETTE;
    let mut scheme_name = None;

    if let Some(clr_scheme) = descendant(root, "clrScheme") {
        scheme_name = clr_scheme.attribute("name").map(str::to_string);
        let mut deferred = Vec::new();
        for (i, slot) in SLOTS.iter().enumerate() {
            let Some(slot_node) = child(clr_scheme, slot) else {
                log::debug!("Theme colour slot {slot} absent, keeping default");
                continue;
            };
            match read_slot(slot_node) {
                SlotSource::Resolved(rgb) => palette[i] = rgb,
                SlotSource::Scheme(target, mods) => deferred.push((i, target, mods)),
                SlotSource::Unresolved => {
                    log::debug!("Theme colour slot {slot} unresolvable, keeping default")
                }
            }
        }
        // Scheme references read the palette as it stood after direct colours.
        let snapshot = palette;
        for (i, target, mods) in deferred {
            palette[i] = apply_transforms(snapshot[target], &mods);
        }
    }

    let defaults = default_font_scheme();
    let font_scheme = descendant(root, "fontScheme");
    let fonts = FontScheme {
        name: font_scheme.and_then(|n| n.attribute("name")).map(str::to_string),
        major_font: font_set(
            font_scheme.and_then(|n| child(n, "majorFont")),
            &defaults.major_font,
        ),
        minor_font: font_set(
            font_scheme.and_then(|n| child(n, "minorFont")),
            &defaults.minor_font,
        ),
    };

    Theme::from_palette(scheme_name, palette, fonts)
}
