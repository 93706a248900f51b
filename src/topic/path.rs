use std::fmt;

use arcstr::{ArcStr, Substr};

/// A concrete, wildcard-free topic, pre-split into `/`-separated segments.
///
/// Segments are [`Substr`] views into the original string, so cloning a
/// path never copies the topic text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPath {
	path: ArcStr,
	segments: Vec<Substr>,
}

impl TopicPath {
	pub fn new(path: impl Into<ArcStr>) -> Self {
		let path = path.into();
		let segments: Vec<Substr> =
			path.split('/').map(|s| path.substr_from(s)).collect();
		Self { path, segments }
	}

	pub fn as_str(&self) -> &str {
		&self.path
	}

	pub fn path(&self) -> ArcStr {
		self.path.clone()
	}

	pub fn segments(&self) -> &[Substr] {
		&self.segments
	}
}

impl From<&str> for TopicPath {
	fn from(path: &str) -> Self {
		Self::new(path)
	}
}

impl fmt::Display for TopicPath {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.path)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn segments_of(path: &TopicPath) -> Vec<&str> {
		path.segments().iter().map(|s| s.as_str()).collect()
	}

	#[test]
	fn splits_on_separator() {
		let path = TopicPath::new("sport/tennis/player1");
		assert_eq!(segments_of(&path), ["sport", "tennis", "player1"]);
	}

	#[test]
	fn keeps_empty_segments() {
		let path = TopicPath::new("/finance");
		assert_eq!(segments_of(&path), ["", "finance"]);

		let path = TopicPath::new("a//b/");
		assert_eq!(segments_of(&path), ["a", "", "b", ""]);
	}

	#[test]
	fn displays_original_path() {
		let path = TopicPath::new("devices/light/status");
		assert_eq!(path.to_string(), "devices/light/status");
	}
}
