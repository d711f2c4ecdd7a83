//! # Freshet
//!
//! Ingests syndicated content (RSS and Atom) from user-supplied endpoints,
//! normalizes it into a canonical article store, and produces render-safe
//! output for display.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator → Fetcher → Parser → Normalizer → Store      (write path)
//! Store → Sanitizer → render-safe payload                   (read path)
//! ```
//!
//! Publishers are third parties who can ship anything, including hostile
//! markup, so the pipeline is built around two rules: per-source failure
//! isolation on the write path, and an allowlist sanitizer on every read
//! path.
//!
//! ## Modules
//!
//! - [`app`]: application context and error taxonomy
//! - [`cli`]: command-line interface
//! - [`config`]: toml configuration
//! - [`domain`]: Source, ArticleRecord, canonical document/item shapes
//! - [`fetcher`]: bounded-time HTTP retrieval with typed outcomes
//! - [`parser`]: generic XML tree plus RSS/Atom dialect extraction
//! - [`normalizer`]: identity resolution and snippet derivation
//! - [`sanitize`]: the allowlist HTML transform ([`sanitize::render_safe`])
//! - [`store`]: SQLite persistence with idempotent upserts
//! - [`orchestrator`]: concurrent refresh with per-source isolation

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod fetcher;
pub mod normalizer;
pub mod orchestrator;
pub mod parser;
pub mod sanitize;
pub mod store;
