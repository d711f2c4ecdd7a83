//! Canonical item resolution.
//!
//! Takes a parsed [`FeedDocument`] and produces persistable
//! [`ArticleRecord`]s: identity via the guid → link → title fallback
//! chain, full content over summary, a plain-text snippet for list views,
//! and an ingestion-time timestamp when the feed's own date is missing or
//! unparseable. Entries with no usable identity are skipped, never fatal.

use chrono::Utc;

use crate::domain::{ArticleRecord, FeedDocument, RawEntry};

/// Maximum length of the derived plain-text snippet.
pub const SNIPPET_MAX_CHARS: usize = 500;

/// Feed-level metadata resolved during normalization, applied to the
/// owning source on success.
#[derive(Debug, Clone)]
pub struct SourceMeta {
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_link: Option<String>,
}

#[derive(Clone, Default)]
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(
        &self,
        source_id: i64,
        source_url: &str,
        document: FeedDocument,
    ) -> (SourceMeta, Vec<ArticleRecord>) {
        let meta = SourceMeta {
            title: document.title,
            description: document.description,
            site_link: document.site_link,
        };

        let mut articles = Vec::with_capacity(document.entries.len());
        for entry in document.entries {
            match self.normalize_entry(source_id, source_url, entry) {
                Some(article) => articles.push(article),
                None => {
                    tracing::warn!(source_url, "skipping entry with no usable identity");
                }
            }
        }

        (meta, articles)
    }

    fn normalize_entry(
        &self,
        source_id: i64,
        source_url: &str,
        entry: RawEntry,
    ) -> Option<ArticleRecord> {
        let identity = resolve_identity(&entry)?;

        let content = entry.content.or(entry.summary);
        let snippet = content
            .as_deref()
            .map(|c| derive_snippet(c, SNIPPET_MAX_CHARS))
            .filter(|s| !s.is_empty());

        let mut article = ArticleRecord::new(source_id, source_url, &identity);
        article.title = entry.title;
        article.link = entry.link;
        article.author = entry.author;
        article.summary = snippet;
        article.content = content;
        article.published_at = entry.published.unwrap_or_else(Utc::now);
        Some(article)
    }
}

/// Identity fallback chain: guid, else link, else title. An entry with no
/// truthy value in the chain cannot be deduplicated and is dropped.
fn resolve_identity(entry: &RawEntry) -> Option<String> {
    [&entry.guid, &entry.link, &entry.title]
        .into_iter()
        .flatten()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
}

/// Strip all markup and collapse whitespace, truncating at a char
/// boundary. This is the list-view snippet, computed at ingest time and
/// unrelated to the read-time sanitizer.
pub fn derive_snippet(html: &str, max_chars: usize) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }

    let decoded = html_escape::decode_html_entities(&text);
    let collapsed = decoded.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <description>A test feed</description>
    <link>https://example.com</link>
    <item>
      <title>With Guid</title>
      <link>https://example.com/one</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>No Guid</title>
      <link>https://example.com/two</link>
      <description>This is item 2</description>
    </item>
  </channel>
</rss>"#;

    fn normalize_str(xml: &str) -> (SourceMeta, Vec<ArticleRecord>) {
        let doc = parser::parse(xml).unwrap();
        Normalizer::new().normalize(1, "https://example.com/feed.xml", doc)
    }

    #[test]
    fn identity_prefers_guid() {
        let (_, articles) = normalize_str(RSS_SAMPLE);
        assert_eq!(articles[0].identity, "item-1");
    }

    #[test]
    fn identity_falls_back_to_link() {
        let (_, articles) = normalize_str(RSS_SAMPLE);
        assert_eq!(articles[1].identity, "https://example.com/two");
    }

    #[test]
    fn identity_falls_back_to_title() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
          <item><title>Title Only</title><description>d</description></item>
        </channel></rss>"#;
        let (_, articles) = normalize_str(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].identity, "Title Only");
    }

    #[test]
    fn unidentifiable_entry_is_dropped_not_fatal() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
          <item><description>nothing to key on</description></item>
          <item><guid>kept</guid><description>ok</description></item>
        </channel></rss>"#;
        let (_, articles) = normalize_str(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].identity, "kept");
    }

    #[test]
    fn missing_date_falls_back_to_ingestion_time() {
        let before = Utc::now();
        let (_, articles) = normalize_str(RSS_SAMPLE);
        let after = Utc::now();

        // Item 1 has a feed date, item 2 does not.
        assert_eq!(articles[0].published_at.timestamp(), 1_704_067_200);
        assert!(articles[1].published_at >= before);
        assert!(articles[1].published_at <= after);
    }

    #[test]
    fn unparseable_date_falls_back_to_ingestion_time() {
        let xml = r#"<rss version="2.0"><channel><title>t</title>
          <item><guid>g</guid><pubDate>soonish</pubDate></item>
        </channel></rss>"#;
        let before = Utc::now();
        let (_, articles) = normalize_str(xml);
        assert_eq!(articles.len(), 1);
        assert!(articles[0].published_at >= before);
    }

    #[test]
    fn normalization_is_deterministic() {
        let (_, a) = normalize_str(RSS_SAMPLE);
        let (_, b) = normalize_str(RSS_SAMPLE);
        assert_eq!(a[0].id, b[0].id);
        assert_eq!(a[1].id, b[1].id);
    }

    #[test]
    fn meta_carries_feed_fields() {
        let (meta, _) = normalize_str(RSS_SAMPLE);
        assert_eq!(meta.title.as_deref(), Some("Test Feed"));
        assert_eq!(meta.description.as_deref(), Some("A test feed"));
        assert_eq!(meta.site_link.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn snippet_strips_markup_and_collapses_whitespace() {
        let snippet = derive_snippet("<p>hello   <b>bold</b>\n world</p>", 500);
        assert_eq!(snippet, "hello bold world");
    }

    #[test]
    fn snippet_decodes_entities() {
        let snippet = derive_snippet("salt &amp; pepper", 500);
        assert_eq!(snippet, "salt & pepper");
    }

    #[test]
    fn snippet_truncates_on_char_boundary() {
        let long = "é".repeat(600);
        let snippet = derive_snippet(&long, SNIPPET_MAX_CHARS);
        assert_eq!(snippet.chars().count(), SNIPPET_MAX_CHARS);
    }

    #[test]
    fn snippet_precedes_sanitization_and_ignores_scripts_textually() {
        let snippet = derive_snippet("<p>hi</p><script>alert(1)</script>", 500);
        // The snippet is plain text: element contents survive as text, tags do not.
        assert_eq!(snippet, "hialert(1)");
    }
}
