use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};

use crate::app::{FreshetError, Result};
use crate::domain::{ArticleRecord, ArticleState, Source, SourceUpdate};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| FreshetError::Config(format!("migration failed: {e}")))?;

        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            FreshetError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| s.parse::<DateTime<Utc>>().ok())
    }

    fn source_from_row(row: &Row<'_>) -> rusqlite::Result<Source> {
        Ok(Source {
            id: row.get(0)?,
            url: row.get(1)?,
            group_name: row.get(2)?,
            title: row.get(3)?,
            description: row.get(4)?,
            site_link: row.get(5)?,
            last_error: row.get(6)?,
            etag: row.get(7)?,
            last_modified: row.get(8)?,
            last_fetched_at: row
                .get::<_, Option<String>>(9)?
                .and_then(|s| Self::parse_datetime(&s)),
            created_at: row
                .get::<_, String>(10)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }

    fn article_from_row(row: &Row<'_>) -> rusqlite::Result<ArticleRecord> {
        Ok(ArticleRecord {
            id: row.get(0)?,
            source_id: row.get(1)?,
            identity: row.get(2)?,
            title: row.get(3)?,
            link: row.get(4)?,
            author: row.get(5)?,
            summary: row.get(6)?,
            content: row.get(7)?,
            published_at: row
                .get::<_, Option<String>>(8)?
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
            fetched_at: row
                .get::<_, String>(9)
                .ok()
                .and_then(|s| Self::parse_datetime(&s))
                .unwrap_or_else(Utc::now),
        })
    }
}

const SOURCE_COLUMNS: &str = "id, url, group_name, title, description, site_link, last_error, \
                              etag, last_modified, last_fetched_at, created_at";

const ARTICLE_COLUMNS: &str = "id, source_id, identity, title, link, author, summary, content, \
                               published_at, fetched_at";

impl Store for SqliteStore {
    fn add_source(&self, source: &Source) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO sources (url, group_name, title, description, site_link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                source.url,
                source.group_name,
                source.title,
                source.description,
                source.site_link,
                source.created_at.to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_source(&self, id: i64) -> Result<Option<Source>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE id = ?1"),
                params![id],
                Self::source_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn get_source_by_url(&self, url: &str) -> Result<Option<Source>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                &format!("SELECT {SOURCE_COLUMNS} FROM sources WHERE url = ?1"),
                params![url],
                Self::source_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn all_sources(&self) -> Result<Vec<Source>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SOURCE_COLUMNS} FROM sources ORDER BY title, url"
        ))?;
        let sources = stmt
            .query_map([], Self::source_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sources)
    }

    fn update_source_meta(&self, id: i64, update: &SourceUpdate) -> Result<()> {
        let conn = self.lock()?;

        if let Some(ref title) = update.title {
            conn.execute(
                "UPDATE sources SET title = ?1 WHERE id = ?2",
                params![title, id],
            )?;
        }
        if let Some(ref description) = update.description {
            conn.execute(
                "UPDATE sources SET description = ?1 WHERE id = ?2",
                params![description, id],
            )?;
        }
        if let Some(ref site_link) = update.site_link {
            conn.execute(
                "UPDATE sources SET site_link = ?1 WHERE id = ?2",
                params![site_link, id],
            )?;
        }
        if let Some(ref etag) = update.etag {
            conn.execute(
                "UPDATE sources SET etag = ?1 WHERE id = ?2",
                params![etag, id],
            )?;
        }
        if let Some(ref last_modified) = update.last_modified {
            conn.execute(
                "UPDATE sources SET last_modified = ?1 WHERE id = ?2",
                params![last_modified, id],
            )?;
        }
        if let Some(ref last_fetched_at) = update.last_fetched_at {
            conn.execute(
                "UPDATE sources SET last_fetched_at = ?1 WHERE id = ?2",
                params![last_fetched_at.to_rfc3339(), id],
            )?;
        }

        Ok(())
    }

    fn set_source_group(&self, id: i64, group: Option<&str>) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sources SET group_name = ?1 WHERE id = ?2",
            params![group, id],
        )?;
        Ok(())
    }

    fn record_error(&self, id: i64, message: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sources SET last_error = ?1 WHERE id = ?2",
            params![message, id],
        )?;
        Ok(())
    }

    fn clear_error(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE sources SET last_error = NULL WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn delete_source(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM sources WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn add_articles(&self, articles: &[ArticleRecord]) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut new_rows = 0;

        for article in articles {
            // Conflict on (source_id, identity) or id updates nothing, so
            // re-ingestion can never disturb existing rows or their flags.
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO articles
                 (id, source_id, identity, title, link, author, summary, content, published_at, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    article.id,
                    article.source_id,
                    article.identity,
                    article.title,
                    article.link,
                    article.author,
                    article.summary,
                    article.content,
                    article.published_at.to_rfc3339(),
                    article.fetched_at.to_rfc3339()
                ],
            )?;
            new_rows += inserted;
        }

        tx.commit()?;
        Ok(new_rows)
    }

    fn get_article(&self, id: &str) -> Result<Option<ArticleRecord>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?1"),
                params![id],
                Self::article_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn articles_by_source(&self, source_id: i64) -> Result<Vec<ArticleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE source_id = ?1
             ORDER BY published_at DESC, fetched_at DESC"
        ))?;
        let articles = stmt
            .query_map(params![source_id], Self::article_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    fn articles_by_group(&self, group: &str) -> Result<Vec<ArticleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT a.id, a.source_id, a.identity, a.title, a.link, a.author, a.summary,
                    a.content, a.published_at, a.fetched_at
             FROM articles a
             JOIN sources s ON a.source_id = s.id
             WHERE s.group_name = ?1
             ORDER BY a.published_at DESC, a.fetched_at DESC",
        )?;
        let articles = stmt
            .query_map(params![group], Self::article_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    fn all_articles(&self) -> Result<Vec<ArticleRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles
             ORDER BY published_at DESC, fetched_at DESC"
        ))?;
        let articles = stmt
            .query_map([], Self::article_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    fn get_state(&self, article_id: &str) -> Result<Option<ArticleState>> {
        let conn = self.lock()?;
        let result = conn
            .query_row(
                "SELECT article_id, is_read, is_starred, read_at, starred_at
                 FROM article_state WHERE article_id = ?1",
                params![article_id],
                |row| {
                    Ok(ArticleState {
                        article_id: row.get(0)?,
                        is_read: row.get::<_, i32>(1)? != 0,
                        is_starred: row.get::<_, i32>(2)? != 0,
                        read_at: row
                            .get::<_, Option<String>>(3)?
                            .and_then(|s| Self::parse_datetime(&s)),
                        starred_at: row
                            .get::<_, Option<String>>(4)?
                            .and_then(|s| Self::parse_datetime(&s)),
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    fn mark_read(&self, article_id: &str, is_read: bool) -> Result<()> {
        let conn = self.lock()?;
        let read_at = is_read.then(|| Utc::now().to_rfc3339());

        conn.execute(
            "INSERT INTO article_state (article_id, is_read, read_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(article_id) DO UPDATE SET is_read = ?2, read_at = ?3",
            params![article_id, is_read as i32, read_at],
        )?;
        Ok(())
    }

    fn toggle_star(&self, article_id: &str) -> Result<bool> {
        let conn = self.lock()?;

        let current: Option<i32> = conn
            .query_row(
                "SELECT is_starred FROM article_state WHERE article_id = ?1",
                params![article_id],
                |row| row.get(0),
            )
            .optional()?;

        let next = !current.map(|v| v != 0).unwrap_or(false);
        let starred_at = next.then(|| Utc::now().to_rfc3339());

        conn.execute(
            "INSERT INTO article_state (article_id, is_starred, starred_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(article_id) DO UPDATE SET is_starred = ?2, starred_at = ?3",
            params![article_id, next as i32, starred_at],
        )?;
        Ok(next)
    }

    fn unread_count(&self, source_id: i64) -> Result<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM articles a
             LEFT JOIN article_state s ON a.id = s.article_id
             WHERE a.source_id = ?1 AND (s.is_read IS NULL OR s.is_read = 0)",
            params![source_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_source(store: &SqliteStore, url: &str) -> i64 {
        store.add_source(&Source::new(url.into())).unwrap()
    }

    fn article(source_id: i64, url: &str, identity: &str) -> ArticleRecord {
        ArticleRecord::new(source_id, url, identity)
    }

    #[test]
    fn add_and_get_source() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let source = store.get_source(id).unwrap().unwrap();
        assert_eq!(source.url, "https://example.com/feed.xml");
        assert_eq!(source.last_error, None);
    }

    #[test]
    fn get_source_by_url() {
        let store = SqliteStore::in_memory().unwrap();
        seed_source(&store, "https://example.com/feed.xml");

        assert!(store
            .get_source_by_url("https://example.com/feed.xml")
            .unwrap()
            .is_some());
        assert!(store
            .get_source_by_url("https://example.com/other.xml")
            .unwrap()
            .is_none());
    }

    #[test]
    fn record_and_clear_error() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        store.record_error(id, "HTTP error 502").unwrap();
        let source = store.get_source(id).unwrap().unwrap();
        assert_eq!(source.last_error.as_deref(), Some("HTTP error 502"));

        store.clear_error(id).unwrap();
        let source = store.get_source(id).unwrap().unwrap();
        assert_eq!(source.last_error, None);
    }

    #[test]
    fn update_source_meta_partial() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let update = SourceUpdate {
            title: Some("New Title".into()),
            site_link: Some("https://example.com".into()),
            ..Default::default()
        };
        store.update_source_meta(id, &update).unwrap();

        let source = store.get_source(id).unwrap().unwrap();
        assert_eq!(source.title.as_deref(), Some("New Title"));
        assert_eq!(source.site_link.as_deref(), Some("https://example.com"));
        assert_eq!(source.description, None);
        assert_eq!(source.etag, None);
    }

    #[test]
    fn batch_insert_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let articles: Vec<ArticleRecord> = (0..3)
            .map(|i| article(id, "https://example.com/feed.xml", &format!("e{i}")))
            .collect();

        assert_eq!(store.add_articles(&articles).unwrap(), 3);
        assert_eq!(store.add_articles(&articles).unwrap(), 0);
        assert_eq!(store.articles_by_source(id).unwrap().len(), 3);
    }

    #[test]
    fn conflicting_identity_never_overwrites() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let mut first = article(id, "https://example.com/feed.xml", "e1");
        first.title = Some("Original".into());
        store.add_articles(std::slice::from_ref(&first)).unwrap();

        let mut altered = article(id, "https://example.com/feed.xml", "e1");
        altered.title = Some("Changed upstream".into());
        assert_eq!(store.add_articles(&[altered]).unwrap(), 0);

        let stored = store.get_article(&first.id).unwrap().unwrap();
        assert_eq!(stored.title.as_deref(), Some("Original"));
    }

    #[test]
    fn reingestion_preserves_user_flags() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let a = article(id, "https://example.com/feed.xml", "e1");
        store.add_articles(std::slice::from_ref(&a)).unwrap();

        store.mark_read(&a.id, true).unwrap();
        store.toggle_star(&a.id).unwrap();

        // Same document arrives again.
        store.add_articles(std::slice::from_ref(&a)).unwrap();

        let state = store.get_state(&a.id).unwrap().unwrap();
        assert!(state.is_read);
        assert!(state.is_starred);
    }

    #[test]
    fn delete_source_cascades_articles_and_state() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let a = article(id, "https://example.com/feed.xml", "e1");
        store.add_articles(std::slice::from_ref(&a)).unwrap();
        store.mark_read(&a.id, true).unwrap();

        store.delete_source(id).unwrap();

        assert!(store.get_source(id).unwrap().is_none());
        assert!(store.get_article(&a.id).unwrap().is_none());
        assert!(store.get_state(&a.id).unwrap().is_none());
    }

    #[test]
    fn mark_read_round_trips() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");
        let a = article(id, "https://example.com/feed.xml", "e1");
        store.add_articles(std::slice::from_ref(&a)).unwrap();

        store.mark_read(&a.id, true).unwrap();
        assert!(store.get_state(&a.id).unwrap().unwrap().is_read);

        store.mark_read(&a.id, false).unwrap();
        assert!(!store.get_state(&a.id).unwrap().unwrap().is_read);
    }

    #[test]
    fn toggle_star_flips_state() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");
        let a = article(id, "https://example.com/feed.xml", "e1");
        store.add_articles(std::slice::from_ref(&a)).unwrap();

        assert!(store.toggle_star(&a.id).unwrap());
        let state = store.get_state(&a.id).unwrap().unwrap();
        assert!(state.is_starred);
        assert!(state.starred_at.is_some());

        assert!(!store.toggle_star(&a.id).unwrap());
        let state = store.get_state(&a.id).unwrap().unwrap();
        assert!(!state.is_starred);
        assert!(state.starred_at.is_none());
    }

    #[test]
    fn unread_count_tracks_reads() {
        let store = SqliteStore::in_memory().unwrap();
        let id = seed_source(&store, "https://example.com/feed.xml");

        let articles: Vec<ArticleRecord> = (0..5)
            .map(|i| article(id, "https://example.com/feed.xml", &format!("e{i}")))
            .collect();
        store.add_articles(&articles).unwrap();
        assert_eq!(store.unread_count(id).unwrap(), 5);

        store.mark_read(&articles[0].id, true).unwrap();
        store.mark_read(&articles[1].id, true).unwrap();
        assert_eq!(store.unread_count(id).unwrap(), 3);
    }

    #[test]
    fn articles_by_group_joins_sources() {
        let store = SqliteStore::in_memory().unwrap();

        let mut tech = Source::new("https://example.com/tech.xml".into());
        tech.group_name = Some("tech".into());
        let tech_id = store.add_source(&tech).unwrap();

        let news_id = seed_source(&store, "https://example.com/news.xml");
        store.set_source_group(news_id, Some("news")).unwrap();

        store
            .add_articles(&[article(tech_id, "https://example.com/tech.xml", "t1")])
            .unwrap();
        store
            .add_articles(&[article(news_id, "https://example.com/news.xml", "n1")])
            .unwrap();

        let tech_articles = store.articles_by_group("tech").unwrap();
        assert_eq!(tech_articles.len(), 1);
        assert_eq!(tech_articles[0].source_id, tech_id);

        assert!(store.articles_by_group("sports").unwrap().is_empty());
    }

    #[test]
    fn all_articles_spans_sources() {
        let store = SqliteStore::in_memory().unwrap();
        let a_id = seed_source(&store, "https://example.com/a.xml");
        let b_id = seed_source(&store, "https://example.com/b.xml");

        store
            .add_articles(&[article(a_id, "https://example.com/a.xml", "1")])
            .unwrap();
        store
            .add_articles(&[article(b_id, "https://example.com/b.xml", "1")])
            .unwrap();

        let all = store.all_articles().unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("freshet.db");

        let id = {
            let store = SqliteStore::new(&path).unwrap();
            let id = store
                .add_source(&Source::new("https://example.com/feed.xml".into()))
                .unwrap();
            store
                .add_articles(&[article(id, "https://example.com/feed.xml", "e1")])
                .unwrap();
            id
        };

        let store = SqliteStore::new(&path).unwrap();
        assert!(store.get_source(id).unwrap().is_some());
        assert_eq!(store.articles_by_source(id).unwrap().len(), 1);
    }

    #[test]
    fn missing_rows_are_none() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_source(999).unwrap().is_none());
        assert!(store.get_article("missing").unwrap().is_none());
        assert!(store.get_state("missing").unwrap().is_none());
    }
}
