//! Allowlist HTML sanitizer.
//!
//! Feed content comes from third parties who can publish anything:
//! script tags, event-handler attributes, phishing forms, page-wide CSS.
//! A script-blocking policy on the display surface stops none of the
//! HTML-only attacks, so this transform is the authoritative control.
//!
//! The rules:
//! - Elements on the allowlist are kept, with only their allowlisted
//!   attributes; `href`/`src` must be absolute http(s) URLs.
//! - Inherently dangerous elements are removed together with their whole
//!   subtree, as is any element carrying an `on*` attribute.
//! - Everything else is unwrapped: the element goes, its children are
//!   kept and re-processed.
//! - Comments are dropped.
//!
//! The function is pure and total. If the rewriter itself fails, the
//! output degrades to a full markup strip — more restricted, never less.

use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};
use url::Url;

/// Structural and formatting elements that survive sanitization.
const ALLOWED_ELEMENTS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "a", "ul", "ol", "li", "em", "i", "strong", "b",
    "blockquote", "img", "code", "pre", "br", "span",
];

/// Removed together with their entire subtree. Covers executable markup,
/// style injection, and the pieces a phishing form is built from.
const DANGEROUS_ELEMENTS: &[&str] = &[
    "script", "style", "form", "iframe", "object", "embed", "input", "button", "select",
    "textarea", "label", "link", "meta", "base", "svg", "math", "template", "noscript", "frame",
    "frameset", "applet",
];

fn allowed_attrs(tag: &str) -> &'static [&'static str] {
    match tag {
        "a" => &["href"],
        "img" => &["src", "alt", "title"],
        _ => &[],
    }
}

/// Attributes whose value is a URL and must be http(s).
fn is_url_attr(name: &str) -> bool {
    matches!(name, "href" | "src")
}

fn is_safe_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        // Relative URLs don't resolve against anything we control; drop them.
        Err(_) => false,
    }
}

/// Transform arbitrary third-party HTML into a render-safe payload.
///
/// Applied on every read path, never persisted, so policy changes apply
/// retroactively to already-stored content.
pub fn render_safe(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let result = rewrite_str(
        raw,
        RewriteStrSettings {
            element_content_handlers: vec![element!("*", |el| {
                let tag = el.tag_name();

                if DANGEROUS_ELEMENTS.contains(&tag.as_str()) {
                    el.remove();
                    return Ok(());
                }

                // An event handler anywhere means the element is hostile;
                // take the whole subtree out.
                let has_handler = el
                    .attributes()
                    .iter()
                    .any(|a| is_event_handler(&a.name()));
                if has_handler {
                    el.remove();
                    return Ok(());
                }

                if !ALLOWED_ELEMENTS.contains(&tag.as_str()) {
                    el.remove_and_keep_content();
                    return Ok(());
                }

                let keep = allowed_attrs(&tag);
                let dropped: Vec<String> = el
                    .attributes()
                    .iter()
                    .map(|a| a.name())
                    .filter(|name| {
                        !keep.contains(&name.as_str())
                            || (is_url_attr(name)
                                && !el.get_attribute(name).is_some_and(|v| is_safe_url(&v)))
                    })
                    .collect();
                for name in dropped {
                    el.remove_attribute(&name);
                }

                Ok(())
            })],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::default()
        },
    );

    match result {
        Ok(safe) => safe,
        Err(e) => {
            // Unknown construct defaults to the strip branch, never to
            // pass-through.
            tracing::warn!(error = %e, "sanitizer rewrite failed; stripping all markup");
            strip_all_markup(raw)
        }
    }
}

/// Degraded mode: drop every tag and re-escape what remains as text.
fn strip_all_markup(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut in_tag = false;
    for ch in raw.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    html_escape::encode_text(&text).into_owned()
}

fn is_event_handler(name: &str) -> bool {
    name.len() > 2
        && name[..2].eq_ignore_ascii_case("on")
        && name[2..].chars().all(|c| c.is_ascii_alphabetic())
}
