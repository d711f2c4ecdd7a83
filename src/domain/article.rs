use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A persisted feed entry. `(source_id, identity)` is unique; re-ingesting
/// an identity that already exists is a no-op at the store layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: String,
    pub source_id: i64,
    /// Stable dedup key: guid, else link, else title.
    pub identity: String,
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    /// Plain-text snippet for list views; all markup stripped.
    pub summary: Option<String>,
    /// Raw content as published. Must pass through the sanitizer before
    /// display; never hand this to a rendering surface directly.
    pub content: Option<String>,
    pub published_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl ArticleRecord {
    pub fn new(source_id: i64, source_url: &str, identity: &str) -> Self {
        Self {
            id: Self::generate_id(source_url, identity),
            source_id,
            identity: identity.to_string(),
            title: None,
            link: None,
            author: None,
            summary: None,
            content: None,
            published_at: Utc::now(),
            fetched_at: Utc::now(),
        }
    }

    /// Deterministic ID from the source URL and the entry's identity.
    pub fn generate_id(source_url: &str, identity: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(source_url.as_bytes());
        hasher.update(identity.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("(Untitled)")
    }

    /// Best available raw content for display. Sanitize before rendering.
    pub fn display_content(&self) -> &str {
        self.content
            .as_deref()
            .or(self.summary.as_deref())
            .unwrap_or("")
    }
}

/// User-owned read/star flags, kept in their own table so a refresh can
/// never overwrite them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleState {
    pub article_id: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub starred_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_generation_deterministic() {
        let a = ArticleRecord::generate_id("https://example.com/feed.xml", "entry-123");
        let b = ArticleRecord::generate_id("https://example.com/feed.xml", "entry-123");
        assert_eq!(a, b);
    }

    #[test]
    fn id_generation_different_inputs() {
        let a = ArticleRecord::generate_id("https://example.com/feed.xml", "entry-123");
        let b = ArticleRecord::generate_id("https://example.com/feed.xml", "entry-456");
        let c = ArticleRecord::generate_id("https://other.com/feed.xml", "entry-123");
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn id_is_hex_sha256() {
        let id = ArticleRecord::generate_id("https://example.com/feed.xml", "entry-123");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn display_content_prefers_full_content() {
        let mut article = ArticleRecord::new(1, "https://example.com/feed.xml", "e1");
        article.content = Some("<p>Full content</p>".into());
        article.summary = Some("Short snippet".into());
        assert_eq!(article.display_content(), "<p>Full content</p>");
    }

    #[test]
    fn display_content_falls_back_to_summary() {
        let mut article = ArticleRecord::new(1, "https://example.com/feed.xml", "e1");
        article.summary = Some("Short snippet".into());
        assert_eq!(article.display_content(), "Short snippet");
    }

    #[test]
    fn display_content_empty_when_neither() {
        let article = ArticleRecord::new(1, "https://example.com/feed.xml", "e1");
        assert_eq!(article.display_content(), "");
    }
}
