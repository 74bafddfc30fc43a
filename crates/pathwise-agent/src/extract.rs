//! Pulls structured payloads out of free-form model output.

use regex::Regex;
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*\n?(.*?)```").ok());

fn span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Finds the first JSON value in `text`.
///
/// Tries, in order: the whole text, the body of a fenced code block, the
/// outermost `{...}` span, then the outermost `[...]` span.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(re) = FENCED_JSON.as_ref() {
        for caps in re.captures_iter(trimmed) {
            if let Some(body) = caps.get(1) {
                if let Ok(value) = serde_json::from_str(body.as_str().trim()) {
                    return Some(value);
                }
            }
        }
    }

    [('{', '}'), ('[', ']')]
        .into_iter()
        .filter_map(|(open, close)| span(trimmed, open, close))
        .find_map(|candidate| serde_json::from_str(candidate).ok())
}

/// Returns the `<!DOCTYPE ...>` / `<html ...>` document embedded in `text`,
/// through its last `</html>`.
pub fn extract_html(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let start = lower
        .find("<!doctype")
        .or_else(|| lower.find("<html"))?;
    let end = lower.rfind("</html>")? + "</html>".len();
    (end > start).then(|| &text[start..end])
}

/// A complete document opens and closes its `<html>` element.
pub fn is_complete_document(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    lower.contains("<html") && lower.contains("</html>")
}
