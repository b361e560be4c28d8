pub type Rgb = [u8; 3];

pub const BLACK: Rgb = [0, 0, 0];
pub const WHITE: Rgb = [255, 255, 255];

/// Parse `RRGGBB` (optionally `#`-prefixed). `auto` and malformed values yield `None`.
pub fn parse_hex_color(val: &str) -> Option<Rgb> {
    let val = val.strip_prefix('#').unwrap_or(val);
    if val == "auto" || val.len() != 6 || !val.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&val[0..2], 16).ok()?;
    let g = u8::from_str_radix(&val[2..4], 16).ok()?;
    let b = u8::from_str_radix(&val[4..6], 16).ok()?;
    Some([r, g, b])
}

pub fn to_hex(rgb: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2])
}

/// DrawingML colour modifiers, as fractions (`val / 100000`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColorTransform {
    LumMod(f32),
    LumOff(f32),
    Tint(f32),
    Shade(f32),
}

impl ColorTransform {
    /// Build from a DrawingML modifier element name and its `val` attribute.
    pub fn from_element(name: &str, val: &str) -> Option<Self> {
        let frac = val.parse::<f32>().ok()? / 100_000.0;
        match name {
            "lumMod" => Some(ColorTransform::LumMod(frac)),
            "lumOff" => Some(ColorTransform::LumOff(frac)),
            "tint" => Some(ColorTransform::Tint(frac)),
            "shade" => Some(ColorTransform::Shade(frac)),
            _ => None,
        }
    }

    fn apply_channel(self, c: f32) -> f32 {
        match self {
            ColorTransform::LumMod(m) => c * m,
            ColorTransform::LumOff(o) => c + 255.0 * o,
            ColorTransform::Tint(t) => c + (255.0 - c) * (1.0 - t),
            ColorTransform::Shade(s) => c * s,
        }
    }
}

fn clamp_channel(c: f32) -> u8 {
    c.round().clamp(0.0, 255.0) as u8
}

/// Apply modifiers per channel, in declaration order.
pub fn apply_transforms(rgb: Rgb, transforms: &[ColorTransform]) -> Rgb {
    let mut channels = rgb.map(f32::from);
    for t in transforms {
        for c in &mut channels {
            *c = t.apply_channel(*c).clamp(0.0, 255.0);
        }
    }
    channels.map(clamp_channel)
}

/// WordprocessingML `w:themeTint` (hex byte, `FF` = unchanged).
pub fn theme_tint(rgb: Rgb, tint: u8) -> Rgb {
    apply_transforms(rgb, &[ColorTransform::Tint(f32::from(tint) / 255.0)])
}

/// WordprocessingML `w:themeShade` (hex byte, `FF` = unchanged).
pub fn theme_shade(rgb: Rgb, shade: u8) -> Rgb {
    apply_transforms(rgb, &[ColorTransform::Shade(f32::from(shade) / 255.0)])
}

/// Relative luminance in 0.0..=1.0 (sRGB, Rec. 709 weights).
pub fn relative_luminance(rgb: Rgb) -> f32 {
    let lin = |c: u8| {
        let c = f32::from(c) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * lin(rgb[0]) + 0.7152 * lin(rgb[1]) + 0.0722 * lin(rgb[2])
}

/// Whether black text would have worse contrast than white on this colour.
pub fn is_dark(rgb: Rgb) -> bool {
    relative_luminance(rgb) < 0.179
}

pub fn highlight_color(name: &str) -> Option<Rgb> {
    match name {
        "yellow" => Some([255, 255, 0]),
        "green" => Some([0, 255, 0]),
        "cyan" => Some([0, 255, 255]),
        "magenta" => Some([255, 0, 255]),
        "red" => Some([255, 0, 0]),
        "blue" => Some([0, 0, 255]),
        "darkYellow" => Some([128, 128, 0]),
        "darkGreen" => Some([0, 128, 0]),
        "darkCyan" => Some([0, 128, 128]),
        "darkMagenta" => Some([128, 0, 128]),
        "darkRed" => Some([128, 0, 0]),
        "darkBlue" => Some([0, 0, 128]),
        "lightGray" => Some([192, 192, 192]),
        "darkGray" => Some([128, 128, 128]),
        "black" => Some(BLACK),
        "white" => Some(WHITE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(parse_hex_color("4472C4"), Some([0x44, 0x72, 0xC4]));
        assert_eq!(parse_hex_color("#ff0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("auto"), None);
        assert_eq!(parse_hex_color("12345"), None);
        assert_eq!(parse_hex_color("zzzzzz"), None);
        assert_eq!(to_hex([0x44, 0x72, 0xC4]), "#4472C4");
    }

    #[test]
    fn lum_mod_then_off() {
        // 50% lumMod then +20% lumOff on mid grey
        let out = apply_transforms(
            [100, 100, 100],
            &[ColorTransform::LumMod(0.5), ColorTransform::LumOff(0.2)],
        );
        assert_eq!(out, [101, 101, 101]);
    }

    #[test]
    fn transform_order_matters() {
        let a = apply_transforms(
            [200, 0, 0],
            &[ColorTransform::LumOff(0.2), ColorTransform::LumMod(0.5)],
        );
        let b = apply_transforms(
            [200, 0, 0],
            &[ColorTransform::LumMod(0.5), ColorTransform::LumOff(0.2)],
        );
        assert_ne!(a, b);
    }

    #[test]
    fn tint_moves_towards_white_and_shade_towards_black() {
        assert_eq!(theme_tint([0, 0, 0], 0xFF), [0, 0, 0]);
        assert_eq!(theme_tint([0, 0, 0], 0), [255, 255, 255]);
        assert_eq!(theme_shade([200, 100, 50], 0xFF), [200, 100, 50]);
        assert_eq!(theme_shade([200, 100, 50], 0), [0, 0, 0]);
    }

    #[test]
    fn transforms_clamp() {
        let out = apply_transforms([250, 250, 250], &[ColorTransform::LumOff(0.5)]);
        assert_eq!(out, [255, 255, 255]);
    }

    #[test]
    fn luminance_classifies_dark_backgrounds() {
        assert!(is_dark([0x1F, 0x38, 0x64]));
        assert!(!is_dark([0xFF, 0xFF, 0x00]));
        assert!(!is_dark([0x80, 0x80, 0x80]));
        assert!(is_dark([0x59, 0x59, 0x59]));
        assert!(relative_luminance(WHITE) > 0.99);
        assert_eq!(relative_luminance(BLACK), 0.0);
    }
}
