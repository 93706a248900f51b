//! Topic handling module
//!
//! Parsing of concrete topics and subscription filters, plus the pure
//! wildcard matching algorithm used by the dispatcher.

pub mod filter;
pub mod matcher;
pub mod path;

#[cfg(test)]
mod matcher_tests;

pub use filter::TopicFilter;
pub use matcher::topic_matches;
pub use path::TopicPath;
