//! Cleanup of generated text before the pipeline uses it.
//!
//! Models wrap LaTeX bodies in markdown fences and sprinkle `**` emphasis
//! even when told not to; analysis responses sometimes bury their JSON in
//! prose. Every generated block passes through here before it is used.

use serde::de::DeserializeOwned;

/// Strips documentation-markup artifacts from a generated body: a leading
/// code fence (tagged `latex`/`json` or bare), a trailing fence, and stray
/// `**` emphasis markers.
pub fn clean_generated_text(text: &str) -> String {
    let mut text = text.trim();
    for prefix in ["```latex", "```json", "```"] {
        if let Some(stripped) = text.strip_prefix(prefix) {
            text = stripped;
            break;
        }
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }
    text.replace("**", "").trim().to_string()
}

/// Extracts a JSON value from output that may contain surrounding prose:
/// direct parse first, then the outermost `{ … }` span. Returns `None`
/// when neither yields the expected structure.
pub fn extract_json<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = clean_generated_text(text);
    if let Ok(value) = serde_json::from_str(&trimmed) {
        return Some(value);
    }
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}
