//! Analysis of daily Pull Request digests written in Markdown.
//!
//! A digest is parsed into a block tree ([`markdown`]), walked once by the
//! [`digest`] analyzer, and rendered as an RSS feed ([`feed`]) or a label
//! index ([`report`]). [`prompt`] builds the LLM prompt used to write the
//! per-PR summaries in the first place.

pub mod config;
pub mod digest;
pub mod feed;
pub mod markdown;
pub mod prompt;
pub mod report;
