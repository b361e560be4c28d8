//! Package properties (`docProps/core.xml`, `docProps/app.xml`) and the
//! document-wide switches in `word/settings.xml`.

use crate::model::{DocumentMetadata, DocumentSettings};
use crate::units::twips_to_pixels;

use super::xml::{Node, attr, child, toggle, twips_px};

/// 0.5", Word's default tab interval.
const DEFAULT_TAB_STOP_TWIPS: f32 = 720.0;

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            default_tab_stop: twips_to_pixels(DEFAULT_TAB_STOP_TWIPS),
            even_and_odd_headers: false,
            theme_font_lang: None,
        }
    }
}

fn text_of(root: Node, name: &str) -> Option<String> {
    let node = child(root, name)?;
    let text = node.text()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Dublin Core fields of `cp:coreProperties`.
pub(crate) fn apply_core_properties(xml: &roxmltree::Document, meta: &mut DocumentMetadata) {
    let root = xml.root_element();
    meta.title = text_of(root, "title");
    meta.subject = text_of(root, "subject");
    meta.creator = text_of(root, "creator");
    meta.keywords = text_of(root, "keywords");
    meta.description = text_of(root, "description");
    meta.last_modified_by = text_of(root, "lastModifiedBy");
    meta.revision = text_of(root, "revision");
    meta.created = text_of(root, "created");
    meta.modified = text_of(root, "modified");
}

/// Extended properties written by the producing application.
pub(crate) fn apply_app_properties(xml: &roxmltree::Document, meta: &mut DocumentMetadata) {
    let root = xml.root_element();
    meta.application = text_of(root, "Application");
    meta.company = text_of(root, "Company");
    meta.pages = text_of(root, "Pages").and_then(|v| v.parse().ok());
    meta.words = text_of(root, "Words").and_then(|v| v.parse().ok());
}

pub(crate) fn parse_settings(xml: &roxmltree::Document) -> DocumentSettings {
    let root = xml.root_element();
    let defaults = DocumentSettings::default();
    DocumentSettings {
        default_tab_stop: child(root, "defaultTabStop")
            .and_then(|n| twips_px(n, "val"))
            .filter(|v| *v > 0.0)
            .unwrap_or(defaults.default_tab_stop),
        even_and_odd_headers: toggle(root, "evenAndOddHeaders").unwrap_or(false),
        theme_font_lang: child(root, "themeFontLang")
            .and_then(|n| attr(n, "val"))
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    }
}
