/// Map symbol-font private-use code points (U+F000–U+F0FF, as written by
/// Symbol/Wingdings bullets) to their Unicode look-alikes.
pub(crate) fn normalize_symbol_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            if (0xF000..=0xF0FF).contains(&cp) {
                symbol_pua_to_unicode(cp).unwrap_or(c)
            } else {
                c
            }
        })
        .collect()
}

fn symbol_pua_to_unicode(cp: u32) -> Option<char> {
    let sym = cp - 0xF000;
    let mapped = match sym {
        0xB7 => '\u{2022}', // bullet •
        0xA7 => '\u{25A0}', // black square ■ (Wingdings §)
        0xA8 => '\u{25CB}', // white circle ○
        0xD8 => '\u{2666}', // diamond ◆
        0x76 => '\u{221A}', // check mark √
        0xFC => '\u{2713}', // Wingdings check ✓
        0x6E => '\u{25A0}', // Wingdings filled square
        0x71 => '\u{2752}', // Wingdings shadowed square
        0x6F => '\u{25A1}', // Wingdings hollow square
        _ => return char::from_u32(sym),
    };
    Some(mapped)
}

/// Character for a `w:sym` element (`w:char` is a hex code point, often in
/// the symbol private-use range).
pub(crate) fn sym_char(char_hex: &str) -> Option<char> {
    let cp = u32::from_str_radix(char_hex.trim(), 16).ok()?;
    let cp = if cp < 0x100 { cp + 0xF000 } else { cp };
    if (0xF000..=0xF0FF).contains(&cp) {
        symbol_pua_to_unicode(cp)
    } else {
        char::from_u32(cp)
    }
}

/// Word treats raw newlines inside `w:t` as whitespace; only `w:br` breaks lines.
pub(crate) fn normalize_run_text(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_bullets_map_to_unicode() {
        assert_eq!(normalize_symbol_text("\u{F0B7}"), "\u{2022}");
        assert_eq!(normalize_symbol_text("\u{F0A7}"), "\u{25A0}");
        assert_eq!(normalize_symbol_text("o"), "o");
        assert_eq!(normalize_symbol_text("%1."), "%1.");
    }

    #[test]
    fn sym_elements() {
        assert_eq!(sym_char("F0B7"), Some('\u{2022}'));
        assert_eq!(sym_char("B7"), Some('\u{2022}'));
        assert_eq!(sym_char("03A9"), Some('\u{03A9}'));
        assert_eq!(sym_char("zz"), None);
    }

    #[test]
    fn newlines_inside_text_become_spaces() {
        assert_eq!(normalize_run_text("a\nb\r\nc"), "a b  c");
    }
}
