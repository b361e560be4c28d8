//! Rendering-safe substitutes for document font names.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FontClass {
    Sans,
    Serif,
    Mono,
    Display,
    Script,
    Cjk,
}

impl FontClass {
    fn substitutes(self) -> &'static [&'static str] {
        match self {
            FontClass::Sans => &["Calibri", "Carlito", "Arial", "Helvetica", "Liberation Sans"],
            FontClass::Serif => &["Cambria", "Caladea", "Times New Roman", "Liberation Serif"],
            FontClass::Mono => &["Consolas", "Courier New", "Liberation Mono"],
            FontClass::Display => &["Impact", "Arial Black"],
            FontClass::Script => &["Segoe Script", "Brush Script MT"],
            FontClass::Cjk => &[
                "Microsoft YaHei",
                "PingFang SC",
                "Hiragino Sans",
                "Noto Sans CJK SC",
            ],
        }
    }

    fn generic(self) -> &'static str {
        match self {
            FontClass::Sans | FontClass::Cjk => "sans-serif",
            FontClass::Serif => "serif",
            FontClass::Mono => "monospace",
            FontClass::Display => "fantasy",
            FontClass::Script => "cursive",
        }
    }
}

const KNOWN: &[(&str, FontClass)] = &[
    ("calibri", FontClass::Sans),
    ("calibri light", FontClass::Sans),
    ("aptos", FontClass::Sans),
    ("aptos display", FontClass::Sans),
    ("arial", FontClass::Sans),
    ("helvetica", FontClass::Sans),
    ("verdana", FontClass::Sans),
    ("tahoma", FontClass::Sans),
    ("segoe ui", FontClass::Sans),
    ("trebuchet ms", FontClass::Sans),
    ("century gothic", FontClass::Sans),
    ("franklin gothic book", FontClass::Sans),
    ("gill sans mt", FontClass::Sans),
    ("open sans", FontClass::Sans),
    ("roboto", FontClass::Sans),
    ("lato", FontClass::Sans),
    ("carlito", FontClass::Sans),
    ("liberation sans", FontClass::Sans),
    ("times new roman", FontClass::Serif),
    ("times", FontClass::Serif),
    ("cambria", FontClass::Serif),
    ("georgia", FontClass::Serif),
    ("garamond", FontClass::Serif),
    ("book antiqua", FontClass::Serif),
    ("palatino linotype", FontClass::Serif),
    ("constantia", FontClass::Serif),
    ("baskerville old face", FontClass::Serif),
    ("bookman old style", FontClass::Serif),
    ("century", FontClass::Serif),
    ("caladea", FontClass::Serif),
    ("liberation serif", FontClass::Serif),
    ("courier new", FontClass::Mono),
    ("courier", FontClass::Mono),
    ("consolas", FontClass::Mono),
    ("lucida console", FontClass::Mono),
    ("cascadia code", FontClass::Mono),
    ("liberation mono", FontClass::Mono),
    ("impact", FontClass::Display),
    ("arial black", FontClass::Display),
    ("broadway", FontClass::Display),
    ("algerian", FontClass::Display),
    ("showcard gothic", FontClass::Display),
    ("comic sans ms", FontClass::Script),
    ("segoe script", FontClass::Script),
    ("brush script mt", FontClass::Script),
    ("lucida handwriting", FontClass::Script),
    ("freestyle script", FontClass::Script),
    ("vladimir script", FontClass::Script),
    ("ms mincho", FontClass::Cjk),
    ("ms gothic", FontClass::Cjk),
    ("simsun", FontClass::Cjk),
    ("simhei", FontClass::Cjk),
    ("microsoft yahei", FontClass::Cjk),
    ("dengxian", FontClass::Cjk),
    ("yu gothic", FontClass::Cjk),
    ("yu mincho", FontClass::Cjk),
    ("malgun gothic", FontClass::Cjk),
    ("batang", FontClass::Cjk),
    ("meiryo", FontClass::Cjk),
    ("pmingliu", FontClass::Cjk),
];

/// Where a hint may occur in a lowercased font name.
#[derive(Clone, Copy)]
enum At {
    Anywhere,
    /// Start of a word, so `hei` matches "Heiti SC" but not "Theinhardt".
    WordStart,
}

/// Name heuristics, tried in order after the exact-name table.
const HINTS: &[(&str, At, FontClass)] = &[
    ("mono", At::Anywhere, FontClass::Mono),
    ("courier", At::Anywhere, FontClass::Mono),
    ("code", At::WordStart, FontClass::Mono),
    ("console", At::WordStart, FontClass::Mono),
    ("script", At::Anywhere, FontClass::Script),
    ("hand", At::WordStart, FontClass::Script),
    ("brush", At::Anywhere, FontClass::Script),
    ("callig", At::Anywhere, FontClass::Script),
    ("mincho", At::Anywhere, FontClass::Cjk),
    ("gothic", At::Anywhere, FontClass::Sans),
    ("song", At::WordStart, FontClass::Cjk),
    ("hei", At::WordStart, FontClass::Cjk),
    ("kai", At::WordStart, FontClass::Cjk),
    ("ming", At::WordStart, FontClass::Cjk),
    ("cjk", At::Anywhere, FontClass::Cjk),
    ("black", At::WordStart, FontClass::Display),
    ("display", At::Anywhere, FontClass::Display),
    ("poster", At::Anywhere, FontClass::Display),
    ("stencil", At::Anywhere, FontClass::Display),
    ("sans", At::Anywhere, FontClass::Sans),
    ("serif", At::Anywhere, FontClass::Serif),
    ("roman", At::WordStart, FontClass::Serif),
    ("times", At::WordStart, FontClass::Serif),
    ("book", At::WordStart, FontClass::Serif),
    ("antiqua", At::Anywhere, FontClass::Serif),
];

fn has_hint(name: &str, hint: &str, at: At) -> bool {
    match at {
        At::Anywhere => name.contains(hint),
        At::WordStart => name.match_indices(hint).any(|(i, _)| {
            name[..i]
                .chars()
                .next_back()
                .is_none_or(|c| !c.is_alphanumeric())
        }),
    }
}

fn class_from_family(family: &str) -> Option<FontClass> {
    match family {
        "roman" => Some(FontClass::Serif),
        "swiss" => Some(FontClass::Sans),
        "modern" => Some(FontClass::Mono),
        "script" => Some(FontClass::Script),
        "decorative" => Some(FontClass::Display),
        _ => None,
    }
}

pub fn classify(name: &str) -> Option<FontClass> {
    let lower = name.trim().to_lowercase();
    if let Some(&(_, class)) = KNOWN.iter().find(|(n, _)| *n == lower) {
        return Some(class);
    }
    if !lower.is_ascii() && lower.chars().any(is_cjk) {
        return Some(FontClass::Cjk);
    }
    HINTS
        .iter()
        .find(|&&(hint, at, _)| has_hint(&lower, hint, at))
        .map(|&(_, _, class)| class)
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF | 0x3400..=0x4DBF | 0x4E00..=0x9FFF | 0xAC00..=0xD7AF | 0xFF00..=0xFFEF)
}

fn quote(name: &str) -> String {
    let is_bare = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if is_bare {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }
}

/// CSS `font-family` value for `name`, e.g. `"Segoe UI", Calibri, Carlito,
/// Arial, Helvetica, "Liberation Sans", sans-serif`.
pub fn font_fallback(name: &str) -> String {
    font_fallback_with_class(name, None)
}

/// As [`font_fallback`], using the font table's `w:family` class when the
/// name itself is not recognised.
pub fn font_fallback_with_class(name: &str, family: Option<&str>) -> String {
    let name = name.trim();
    let class = classify(name)
        .or_else(|| family.and_then(class_from_family))
        .unwrap_or(FontClass::Sans);

    let mut stack: Vec<String> = Vec::new();
    if !name.is_empty() {
        stack.push(quote(name));
    }
    for sub in class.substitutes() {
        if !sub.eq_ignore_ascii_case(name) {
            stack.push(quote(sub));
        }
    }
    stack.push(class.generic().to_string());
    stack.join(", ")
}
