pub mod article;
pub mod canonical;
pub mod source;

pub use article::{ArticleRecord, ArticleState};
pub use canonical::{FeedDocument, RawEntry};
pub use source::{Source, SourceUpdate};
