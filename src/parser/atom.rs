//! Atom extraction.

use crate::domain::{FeedDocument, RawEntry};
use crate::parser::dates::parse_date;
use crate::parser::xml::XmlElement;

pub fn extract(root: &XmlElement) -> FeedDocument {
    let mut document = FeedDocument {
        title: root.child("title").and_then(|e| e.text_opt()),
        description: root.child("subtitle").and_then(|e| e.text_opt()),
        site_link: select_link(root),
        entries: Vec::new(),
    };

    for entry in root.children_named("entry") {
        document.entries.push(extract_entry(entry));
    }

    document
}

fn extract_entry(entry: &XmlElement) -> RawEntry {
    let published = entry
        .child("published")
        .or_else(|| entry.child("updated"))
        .and_then(|e| e.text_opt())
        .and_then(|s| parse_date(&s));

    RawEntry {
        guid: entry.child("id").and_then(|e| e.text_opt()),
        title: entry.child("title").and_then(|e| e.text_opt()),
        link: select_link(entry),
        author: entry
            .child("author")
            .and_then(|a| a.child("name"))
            .and_then(|e| e.text_opt()),
        content: entry.child("content").and_then(|e| e.text_opt()),
        summary: entry.child("summary").and_then(|e| e.text_opt()),
        published,
    }
}

/// Atom allows multiple <link> elements distinguished by `rel`. The page
/// link is the one with no rel or rel="alternate".
fn select_link(parent: &XmlElement) -> Option<String> {
    let links: Vec<&XmlElement> = parent.children_named("link").collect();

    links
        .iter()
        .find(|l| matches!(l.attr("rel"), None | Some("alternate")))
        .or_else(|| links.first())
        .and_then(|l| l.attr("href"))
        .map(|href| href.to_string())
}
