use chrono::{DateTime, Utc};

/// Format-agnostic result of parsing one fetched document. Transient:
/// consumed by the normalizer, never persisted.
#[derive(Debug, Clone, Default)]
pub struct FeedDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_link: Option<String>,
    pub entries: Vec<RawEntry>,
}

/// One entry as extracted by a dialect parser, before identity resolution.
/// Every field is optional here; the normalizer decides what survives.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    /// Full content when the dialect provides it (content:encoded / <content>).
    pub content: Option<String>,
    /// Shorter description/summary field.
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
}
