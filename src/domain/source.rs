use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One configured feed endpoint and its fetch/error state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub url: String,
    pub group_name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_link: Option<String>,
    /// Message from the most recent failed refresh; cleared on success.
    pub last_error: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Source {
    pub fn new(url: String) -> Self {
        Self {
            id: 0,
            url,
            group_name: None,
            title: None,
            description: None,
            site_link: None,
            last_error: None,
            etag: None,
            last_modified: None,
            last_fetched_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.url)
    }
}

/// Partial update applied after a successful refresh. `None` fields are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct SourceUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub site_link: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_title_falls_back_to_url() {
        let mut source = Source::new("https://example.com/feed.xml".into());
        assert_eq!(source.display_title(), "https://example.com/feed.xml");

        source.title = Some("Example Blog".into());
        assert_eq!(source.display_title(), "Example Blog");
    }
}
