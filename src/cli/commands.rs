use std::time::Duration;

use chrono::Utc;

use crate::app::{AppContext, FreshetError, Result};
use crate::domain::{Source, SourceUpdate};
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::normalizer::Normalizer;
use crate::parser;
use crate::sanitize;
use crate::store::Store;

/// Add a source, fail-closed: the endpoint must fetch and parse before a
/// row is created, so a typo'd or dead URL never becomes a Source.
pub async fn add_source(ctx: &AppContext, url: &str, group: Option<&str>) -> Result<()> {
    if ctx.store.get_source_by_url(url)?.is_some() {
        println!("Source already exists: {url}");
        return Ok(());
    }

    let outcome = ctx.fetcher.fetch(url, None, None).await?;
    let (body, etag, last_modified) = match outcome {
        FetchOutcome::Fetched {
            body,
            etag,
            last_modified,
        } => (body, etag, last_modified),
        FetchOutcome::NotModified => {
            return Err(FreshetError::Network(
                "server returned 304 for an unconditional request".into(),
            ))
        }
    };
    let document = parser::parse(&body)?;

    // Round trip succeeded; now persist.
    let mut source = Source::new(url.to_string());
    source.group_name = group.map(String::from);
    let source_id = ctx.store.add_source(&source)?;

    let (meta, articles) = Normalizer::new().normalize(source_id, url, document);
    ctx.store.update_source_meta(
        source_id,
        &SourceUpdate {
            title: meta.title.clone(),
            description: meta.description,
            site_link: meta.site_link,
            etag,
            last_modified,
            last_fetched_at: Some(Utc::now()),
        },
    )?;
    let count = ctx.store.add_articles(&articles)?;

    if let Some(title) = meta.title {
        println!("Added: {title}");
    } else {
        println!("Added: {url}");
    }
    println!("Fetched {count} articles");
    Ok(())
}

pub async fn remove_source(ctx: &AppContext, url: &str) -> Result<()> {
    let source = ctx
        .store
        .get_source_by_url(url)?
        .ok_or_else(|| FreshetError::SourceNotFound(url.to_string()))?;

    ctx.store.delete_source(source.id)?;
    println!("Removed: {url}");
    Ok(())
}

pub async fn refresh(ctx: &AppContext, url: Option<&str>) -> Result<()> {
    match url {
        Some(url) => {
            let source = ctx
                .store
                .get_source_by_url(url)?
                .ok_or_else(|| FreshetError::SourceNotFound(url.to_string()))?;
            let articles = ctx.orchestrator.refresh_one(source.id).await?;
            report_source(ctx, source.id)?;
            println!("{} articles for {url}", articles.len());
        }
        None => {
            let sources = ctx.store.all_sources()?;
            if sources.is_empty() {
                println!("No sources to refresh");
                return Ok(());
            }

            println!("Refreshing {} sources...", sources.len());
            let articles = ctx.orchestrator.refresh_all().await?;

            let mut errors = 0;
            for source in &sources {
                errors += report_source(ctx, source.id)?;
            }
            println!(
                "Refresh complete: {} articles from healthy sources, {errors} errors",
                articles.len()
            );
        }
    }
    Ok(())
}

fn report_source(ctx: &AppContext, source_id: i64) -> Result<usize> {
    if let Some(source) = ctx.store.get_source(source_id)? {
        if let Some(error) = &source.last_error {
            eprintln!("  ! {}: {error}", source.display_title());
            return Ok(1);
        }
    }
    Ok(0)
}

pub fn list_sources(ctx: &AppContext) -> Result<()> {
    let sources = ctx.store.all_sources()?;
    if sources.is_empty() {
        println!("No sources");
        return Ok(());
    }

    for source in sources {
        let unread = ctx.store.unread_count(source.id)?;
        let marker = if source.last_error.is_some() { "!" } else { " " };
        println!(
            "{marker} {} ({unread} unread)\n    {}",
            source.display_title(),
            source.url
        );
        if let Some(error) = source.last_error {
            println!("    error: {error}");
        }
    }
    Ok(())
}

pub fn list_articles(ctx: &AppContext) -> Result<()> {
    let articles = ctx.store.all_articles()?;
    if articles.is_empty() {
        println!("No articles");
        return Ok(());
    }

    for article in articles {
        let state = ctx.store.get_state(&article.id)?;
        let read_marker = if state.as_ref().map(|s| s.is_read).unwrap_or(false) {
            " "
        } else {
            "*"
        };
        let star_marker = if state.map(|s| s.is_starred).unwrap_or(false) {
            "★"
        } else {
            " "
        };

        println!(
            "{read_marker}{star_marker} {} {}  [{}]",
            article.published_at.format("%Y-%m-%d"),
            article.display_title(),
            &article.id[..12]
        );
    }
    Ok(())
}

pub fn mark_read(ctx: &AppContext, article_id: &str, read: bool) -> Result<()> {
    let article = resolve_article(ctx, article_id)?;
    ctx.store.mark_read(&article.id, read)?;
    println!(
        "{} {}",
        if read { "Read:" } else { "Unread:" },
        article.display_title()
    );
    Ok(())
}

pub fn toggle_star(ctx: &AppContext, article_id: &str) -> Result<()> {
    let article = resolve_article(ctx, article_id)?;
    let starred = ctx.store.toggle_star(&article.id)?;
    println!(
        "{} {}",
        if starred { "Starred:" } else { "Unstarred:" },
        article.display_title()
    );
    Ok(())
}

/// Print an article's render-safe payload. The sanitizer runs here, at
/// read time, on the stored raw content.
pub fn render(ctx: &AppContext, article_id: &str) -> Result<()> {
    let article = resolve_article(ctx, article_id)?;
    println!("{}", sanitize::render_safe(article.display_content()));
    Ok(())
}

/// Articles are addressed by id prefix on the command line; 12 hex chars
/// is plenty.
fn resolve_article(ctx: &AppContext, article_id: &str) -> Result<crate::domain::ArticleRecord> {
    if let Some(article) = ctx.store.get_article(article_id)? {
        return Ok(article);
    }

    let mut matches: Vec<_> = ctx
        .store
        .all_articles()?
        .into_iter()
        .filter(|a| a.id.starts_with(article_id))
        .collect();

    match matches.len() {
        1 => Ok(matches.swap_remove(0)),
        0 => Err(FreshetError::ArticleNotFound(article_id.to_string())),
        _ => Err(FreshetError::ArticleNotFound(format!(
            "{article_id} is ambiguous ({} matches)",
            matches.len()
        ))),
    }
}

/// Refresh all sources on an interval until interrupted.
pub async fn watch(ctx: &AppContext, interval_secs: Option<u64>) -> Result<()> {
    let secs = interval_secs.unwrap_or(ctx.config.watch_interval_secs);
    let mut ticker = tokio::time::interval(Duration::from_secs(secs));

    println!("Refreshing every {secs}s; Ctrl-C to stop");
    loop {
        ticker.tick().await;
        let articles = ctx.orchestrator.refresh_all().await?;
        tracing::info!(total = articles.len(), "scheduled refresh complete");
    }
}
