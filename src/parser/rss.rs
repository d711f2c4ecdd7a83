//! RSS 2.0 (and RDF-rooted RSS 1.0) extraction.

use crate::app::{FreshetError, Result};
use crate::domain::{FeedDocument, RawEntry};
use crate::parser::dates::parse_date;
use crate::parser::xml::XmlElement;

pub fn extract(root: &XmlElement) -> Result<FeedDocument> {
    let channel = root
        .child("channel")
        .ok_or_else(|| FreshetError::FeedParse("RSS document has no <channel>".into()))?;

    let mut document = FeedDocument {
        title: channel.child("title").and_then(|e| e.text_opt()),
        description: channel.child("description").and_then(|e| e.text_opt()),
        site_link: channel.child("link").and_then(|e| e.text_opt()),
        entries: Vec::new(),
    };

    // RSS 2.0 nests <item> under <channel>; RDF-rooted feeds put them at
    // the top level next to it.
    let items: Vec<&XmlElement> = if channel.children_named("item").next().is_some() {
        channel.children_named("item").collect()
    } else {
        root.children_named("item").collect()
    };

    for item in items {
        document.entries.push(extract_item(item));
    }

    Ok(document)
}

fn extract_item(item: &XmlElement) -> RawEntry {
    let guid = item.child("guid").and_then(|e| e.text_opt());
    // Link is a single scalar in this dialect.
    let link = item.child("link").and_then(|e| e.text_opt());

    // Namespaced full content wins over the base description.
    let content = item.child("content:encoded").and_then(|e| e.text_opt());
    let summary = item.child("description").and_then(|e| e.text_opt());

    // dc:creator is usually a bare name; <author> an email address.
    let author = item
        .child("dc:creator")
        .and_then(|e| e.text_opt())
        .or_else(|| item.child("author").and_then(|e| e.text_opt()));

    let published = item
        .child("pubDate")
        .or_else(|| item.child("dc:date"))
        .and_then(|e| e.text_opt())
        .and_then(|s| parse_date(&s));

    RawEntry {
        guid,
        title: item.child("title").and_then(|e| e.text_opt()),
        link,
        author,
        content,
        summary,
        published,
    }
}
