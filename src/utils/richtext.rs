//! Rich text helpers
//!
//! The description field is rich text produced by an external editor
//! widget; the engine only ever sees it as a plain string. These helpers
//! pull embedded media URLs out of that string so inline attachments can
//! be reconciled against it, without depending on the editor itself.

/// Extract the media URLs referenced by `src="…"` attributes.
///
/// Duplicate references are returned once. Unterminated attributes are
/// ignored rather than guessed at.
pub fn extract_media_urls(content: &str) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut rest = content;

    while let Some(pos) = rest.find("src=\"") {
        rest = &rest[pos + 5..];
        match rest.find('"') {
            Some(end) => {
                let url = &rest[..end];
                if !url.is_empty() && !urls.iter().any(|u| u == url) {
                    urls.push(url.to_string());
                }
                rest = &rest[end + 1..];
            }
            None => break,
        }
    }

    urls
}

/// Whether `content` still references `url` as embedded media.
pub fn references_media(content: &str, url: &str) -> bool {
    extract_media_urls(content).iter().any(|u| u == url)
}

/// Remove every media element that references `url`.
///
/// Strips the whole enclosing tag (from the nearest preceding `<` to the
/// following `>`) so no broken markup is left behind; if the reference is
/// bare, only the `src` attribute itself goes.
pub fn strip_media_reference(content: &str, url: &str) -> String {
    let needle = format!("src=\"{}\"", url);
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(pos) = rest.find(&needle) {
        let before = &rest[..pos];
        let after = &rest[pos + needle.len()..];

        match before.rfind('<') {
            Some(tag_start) if !before[tag_start..].contains('>') => {
                out.push_str(&before[..tag_start]);
                let tag_end = after.find('>').map(|i| i + 1).unwrap_or(0);
                rest = &after[tag_end..];
            }
            _ => {
                // Bare reference outside a tag; drop just the attribute.
                out.push_str(before);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
