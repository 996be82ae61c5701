pub mod content_filter;
pub mod pipeline;

pub use content_filter::{classify, ContentCategory, FilterVerdict};
pub use pipeline::{decide, FilterConfig, IngestDecision, IngestOutcome};
