//! Compression & scoring pipeline plus the hot-words service
//! that rides on top of its cleaned, structured output.

pub mod clean;
pub mod hotwords;
pub mod market_keywords;
pub mod pipeline;
pub mod score;
pub mod sentiment;
pub mod structure;

pub use hotwords::{format_report, HotWordsService};
pub use pipeline::{compress, format_for_prompt, CompressionResult, CompressorConfig};
pub use structure::StructuredMessage;
