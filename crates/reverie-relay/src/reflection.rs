//! Reflection extraction: a two-pass scan over assistant output.
//!
//! Pass one collects every "DETAILED REFLECTION <n>:" section; pass two
//! takes at most one "Reflection:" section. All detailed sections come
//! first in the result, in source order, then the brief one, regardless
//! of where the brief label sits in the text.

use std::sync::LazyLock;

use regex::Regex;

use reverie_types::reflection::Reflection;

/// Label opening a detailed section, e.g. `DETAILED REFLECTION 2:`.
/// Case-insensitive; the emitted type keeps the source casing.
static DETAILED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DETAILED REFLECTION\s*\d+\s*:").expect("detailed reflection pattern")
});

/// Literal label opening the brief section.
const BRIEF_LABEL: &str = "Reflection:";
/// Markdown delimiter that closes any reflection section.
const SECTION_BREAK: &str = "####";

/// Type assigned to the brief section.
pub const BRIEF_TYPE: &str = "BRIEF REFLECTION";

/// Extract every reflection section from assistant output.
///
/// Returns an empty vec when the text carries no reflection labels.
pub fn extract_reflections(text: &str) -> Vec<Reflection> {
    let mut reflections = Vec::new();

    // Pass one: all detailed sections, in source order. A body runs to
    // the earliest of the next detailed label, a literal brief label, a
    // section break, or end of text.
    let labels: Vec<_> = DETAILED_LABEL.find_iter(text).collect();
    for (i, label) in labels.iter().enumerate() {
        let body_start = label.end();
        let next_label = labels.get(i + 1).map(|m| m.start());
        let body_end = detailed_body_end(text, body_start, next_label);

        let kind = label.as_str().trim_end_matches(':').trim();
        let content = text[body_start..body_end].trim();
        reflections.push(Reflection::new(kind, content));
    }

    // Pass two: the first brief section, if any. Independent of pass
    // one, and always appended last. Its body ignores detailed labels
    // and runs to a section break or end of text.
    if let Some(pos) = text.find(BRIEF_LABEL) {
        let body_start = pos + BRIEF_LABEL.len();
        let body_end = text[body_start..]
            .find(SECTION_BREAK)
            .map_or(text.len(), |off| body_start + off);
        let content = text[body_start..body_end].trim();
        reflections.push(Reflection::new(BRIEF_TYPE, content));
    }

    reflections
}

fn detailed_body_end(text: &str, from: usize, next_label: Option<usize>) -> usize {
    let rest = &text[from..];
    let mut end = next_label.unwrap_or(text.len());
    if let Some(off) = rest.find(BRIEF_LABEL) {
        end = end.min(from + off);
    }
    if let Some(off) = rest.find(SECTION_BREAK) {
        end = end.min(from + off);
    }
    end
}
