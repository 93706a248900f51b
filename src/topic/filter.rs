use std::fmt;
use std::hash::{Hash, Hasher};

use arcstr::{ArcStr, Substr};

use super::path::TopicPath;

/// Prefix marking a shared subscription, `$share/<group>/<filter>`.
const SHARE_PREFIX: &str = "$share/";

/// An MQTT topic filter: `/`-separated segments where `+` matches exactly
/// one segment and a trailing `#` matches any remainder.
///
/// A leading `$share/<group>/` prefix is stripped at construction and does
/// not participate in matching; the group name stays available through
/// [`TopicFilter::share_group`].
///
/// Filters are deliberately permissive: malformed input (a `#` in a
/// non-final position, tokens like `a+b`) is accepted as-is and matched
/// with the same segment walk. Behavior over such filters is unspecified
/// by MQTT and pinned only by this crate's tests.
#[derive(Debug, Clone)]
pub struct TopicFilter {
	raw: ArcStr,
	share_group: Option<Substr>,
	segments: Vec<Substr>,
}

impl TopicFilter {
	pub fn new(raw: impl Into<ArcStr>) -> Self {
		let raw = raw.into();
		let mut segments: Vec<Substr> =
			raw.split('/').map(|s| raw.substr_from(s)).collect();
		let mut share_group = None;
		if raw.starts_with(SHARE_PREFIX) {
			// Drop the literal "$share" token and the group name. Whatever
			// remains (possibly nothing) is the effective filter.
			share_group = Some(segments[1].clone());
			segments.drain(.. 2);
		}
		Self {
			raw,
			share_group,
			segments,
		}
	}

	/// The filter exactly as registered, shared prefix included.
	pub fn as_str(&self) -> &str {
		&self.raw
	}

	pub fn raw(&self) -> ArcStr {
		self.raw.clone()
	}

	/// Group name of a `$share/<group>/...` filter, if any.
	pub fn share_group(&self) -> Option<&str> {
		self.share_group.as_deref()
	}

	pub fn is_shared(&self) -> bool {
		self.share_group.is_some()
	}

	/// Effective filter segments, shared prefix already stripped.
	pub fn segments(&self) -> &[Substr] {
		&self.segments
	}

	/// Decides whether this filter matches the given concrete topic.
	///
	/// The two segment sequences are walked pairwise from the start; the
	/// shorter one is padded with an "absent" marker rather than truncated.
	/// At each position:
	///
	/// - a `#` filter segment succeeds immediately, unless the topic
	///   segment at that position exists and starts with `$` (wildcards
	///   never claim system-reserved topics);
	/// - a `+` filter segment requires a present topic segment that does
	///   not start with `$`;
	/// - any other filter segment must equal the topic segment exactly;
	/// - an absent segment on either side fails the walk.
	///
	/// Note the asymmetry pinned by MQTT 5 (4.7.2): `$SYS/#` does match
	/// `$SYS/state`, because at position 0 the filter segment is the
	/// literal `$SYS`, not a wildcard.
	pub fn matches(&self, topic: &TopicPath) -> bool {
		let topic_segments = topic.segments();
		let walk_len = topic_segments.len().max(self.segments.len());

		for position in 0 .. walk_len {
			let topic_segment =
				topic_segments.get(position).map(Substr::as_str);
			match self.segments.get(position).map(Substr::as_str) {
				| Some("#") => {
					return !matches!(
						topic_segment,
						Some(s) if s.starts_with('$')
					);
				}
				| Some("+") => match topic_segment {
					| Some(s) if s.starts_with('$') => return false,
					| Some(_) => {}
					| None => return false,
				},
				| Some(literal) => match topic_segment {
					| Some(s) if s == literal => {}
					| _ => return false,
				},
				| None => return false,
			}
		}
		// Walk completed without a wildcard short-circuit: both sequences
		// had the same length and every pair matched.
		true
	}
}

impl PartialEq for TopicFilter {
	fn eq(&self, other: &Self) -> bool {
		self.raw == other.raw
	}
}

impl Eq for TopicFilter {}

impl Hash for TopicFilter {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.raw.hash(state);
	}
}

impl From<&str> for TopicFilter {
	fn from(raw: &str) -> Self {
		Self::new(raw)
	}
}

// Display prints the raw filter, shared prefix included, so log lines and
// broker subscribe requests agree on the filter text.
impl fmt::Display for TopicFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.raw)
	}
}
