pub mod sqlite;

use crate::app::Result;
use crate::domain::{ArticleRecord, ArticleState, Source, SourceUpdate};

pub use sqlite::SqliteStore;

/// Persistence surface for sources, articles, and user-owned flags.
///
/// Passed explicitly into the orchestrator rather than reached through
/// globals, so the pipeline runs against an in-memory store in tests.
pub trait Store {
    // Source registry
    fn add_source(&self, source: &Source) -> Result<i64>;
    fn get_source(&self, id: i64) -> Result<Option<Source>>;
    fn get_source_by_url(&self, url: &str) -> Result<Option<Source>>;
    fn all_sources(&self) -> Result<Vec<Source>>;
    fn update_source_meta(&self, id: i64, update: &SourceUpdate) -> Result<()>;
    fn set_source_group(&self, id: i64, group: Option<&str>) -> Result<()>;
    /// Record a refresh failure on the source. Never throws the failure.
    fn record_error(&self, id: i64, message: &str) -> Result<()>;
    /// Clear the failure state after a successful refresh.
    fn clear_error(&self, id: i64) -> Result<()>;
    /// Deleting a source cascades to its articles.
    fn delete_source(&self, id: i64) -> Result<()>;

    // Articles
    /// Insert-if-absent for a whole refresh batch in one transaction.
    /// Conflicting identities update nothing; returns the new-row count.
    fn add_articles(&self, articles: &[ArticleRecord]) -> Result<usize>;
    fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>>;
    fn articles_by_source(&self, source_id: i64) -> Result<Vec<ArticleRecord>>;
    fn articles_by_group(&self, group: &str) -> Result<Vec<ArticleRecord>>;
    fn all_articles(&self) -> Result<Vec<ArticleRecord>>;

    // User-owned flags; refreshes never touch these.
    fn get_state(&self, article_id: &str) -> Result<Option<ArticleState>>;
    fn mark_read(&self, article_id: &str, is_read: bool) -> Result<()>;
    fn toggle_star(&self, article_id: &str) -> Result<bool>;
    fn unread_count(&self, source_id: i64) -> Result<i64>;
}
