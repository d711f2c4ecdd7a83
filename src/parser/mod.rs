//! Feed parsing: one generic XML pass, then dialect-specific extraction.
//!
//! The dialect is chosen by sniffing the root element. Both extractors
//! funnel into [`FeedDocument`]; callers never see dialect-specific shapes.

pub mod atom;
pub mod dates;
pub mod rss;
pub mod xml;

use crate::app::{FreshetError, Result};
use crate::domain::FeedDocument;

pub use dates::parse_date;

pub fn parse(body: &str) -> Result<FeedDocument> {
    let root = xml::parse_tree(body)?;

    match root.local_name() {
        "rss" | "RDF" => rss::extract(&root),
        "feed" => Ok(atom::extract(&root)),
        other => Err(FreshetError::UnrecognizedFormat(other.to_string())),
    }
}
