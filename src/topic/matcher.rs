//! Standalone topic matching utility.
//!
//! [`topic_matches`] is the one-shot form of
//! [`TopicFilter::matches`](super::TopicFilter::matches). It is pure and
//! free of shared state, so it can be called from any thread, and is handy
//! on its own for tests or for building alternate dispatch policies.

use super::filter::TopicFilter;
use super::path::TopicPath;

/// Returns whether `filter` matches the concrete `topic`.
///
/// `filter` may contain the `+` and `#` wildcards and an optional
/// `$share/<group>/` prefix, which is stripped before matching. Topic
/// segments starting with `$` are never claimed by a wildcard.
///
/// ```
/// use mqtt_fanout::topic_matches;
///
/// assert!(topic_matches("sport/tennis/player1", "sport/+/player1"));
/// assert!(topic_matches("sport/tennis", "sport/tennis/#"));
/// assert!(topic_matches("Clients/annotated", "$share/g/Clients/#"));
/// assert!(!topic_matches("$SYS/health", "#"));
/// ```
pub fn topic_matches(topic: &str, filter: &str) -> bool {
	TopicFilter::new(filter).matches(&TopicPath::new(topic))
}
