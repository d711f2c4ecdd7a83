//! Refresh orchestration: one-source and all-sources pipelines.
//!
//! Failure isolation is the point. A refresh failure is recorded on the
//! owning source and absorbed; it never propagates through
//! [`Orchestrator::refresh_all`] and never disturbs previously stored
//! articles. One dead endpoint cannot block the rest of the fan-out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;

use crate::app::{FreshetError, Result};
use crate::domain::{ArticleRecord, Source, SourceUpdate};
use crate::fetcher::{FetchOutcome, Fetcher};
use crate::normalizer::Normalizer;
use crate::parser;
use crate::store::Store;

pub const DEFAULT_WORKERS: usize = 10;

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn Store + Send + Sync>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    semaphore: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Self {
        Self::with_workers(store, fetcher, DEFAULT_WORKERS)
    }

    pub fn with_workers(
        store: Arc<dyn Store + Send + Sync>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        workers: usize,
    ) -> Self {
        Self {
            store,
            fetcher,
            normalizer: Normalizer::new(),
            semaphore: Arc::new(Semaphore::new(workers)),
        }
    }

    /// Refresh exactly one source. A pipeline failure is recorded on the
    /// source entity, not raised; either way the source's current article
    /// set is returned. `Err` only for an unknown source id.
    pub async fn refresh_one(&self, source_id: i64) -> Result<Vec<ArticleRecord>> {
        let source = self
            .store
            .get_source(source_id)?
            .ok_or_else(|| FreshetError::SourceNotFound(source_id.to_string()))?;

        match self.run_pipeline(&source).await {
            Ok(new_rows) => {
                tracing::info!(url = %source.url, new_rows, "refresh succeeded");
            }
            Err(e) => {
                tracing::warn!(url = %source.url, error = %e, "refresh failed");
                if let Err(db_err) = self.store.record_error(source.id, &e.to_string()) {
                    tracing::error!(error = %db_err, "failed to record source error");
                }
            }
        }

        self.store.articles_by_source(source_id)
    }

    /// Refresh every configured source concurrently, tolerating any number
    /// of per-source failures. Returns the aggregated article sets of the
    /// sources that succeeded; no ordering across sources.
    pub async fn refresh_all(&self) -> Result<Vec<ArticleRecord>> {
        let sources = self.store.all_sources()?;

        let mut handles = Vec::with_capacity(sources.len());
        for source in sources {
            let orchestrator = self.clone();
            handles.push(tokio::spawn(async move {
                let _permit = orchestrator
                    .semaphore
                    .acquire()
                    .await
                    .expect("semaphore closed");
                (source.id, orchestrator.refresh_one(source.id).await)
            }));
        }

        let mut aggregated = Vec::new();
        for handle in handles {
            match handle.await {
                Ok((_, Ok(articles))) => aggregated.extend(articles),
                Ok((source_id, Err(e))) => {
                    tracing::warn!(source_id, error = %e, "source skipped during refresh");
                }
                Err(e) => {
                    tracing::error!(error = %e, "refresh task join error");
                }
            }
        }

        Ok(aggregated)
    }

    /// Fetch → parse → normalize → store for one source. Success clears
    /// the error state and refreshes the source metadata.
    async fn run_pipeline(&self, source: &Source) -> Result<usize> {
        let outcome = self
            .fetcher
            .fetch(
                &source.url,
                source.etag.as_deref(),
                source.last_modified.as_deref(),
            )
            .await?;

        match outcome {
            FetchOutcome::NotModified => {
                tracing::debug!(url = %source.url, "not modified");
                self.store.update_source_meta(
                    source.id,
                    &SourceUpdate {
                        last_fetched_at: Some(Utc::now()),
                        ..Default::default()
                    },
                )?;
                self.store.clear_error(source.id)?;
                Ok(0)
            }
            FetchOutcome::Fetched {
                body,
                etag,
                last_modified,
            } => {
                let document = parser::parse(&body)?;
                let (meta, articles) = self.normalizer.normalize(source.id, &source.url, document);

                self.store.update_source_meta(
                    source.id,
                    &SourceUpdate {
                        title: meta.title,
                        description: meta.description,
                        site_link: meta.site_link,
                        etag,
                        last_modified,
                        last_fetched_at: Some(Utc::now()),
                    },
                )?;
                self.store.clear_error(source.id)?;

                self.store.add_articles(&articles)
            }
        }
    }
}
