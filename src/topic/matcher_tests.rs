use super::matcher::topic_matches;

// Helper to run a (topic, filter, expected) truth table
fn assert_table(cases: &[(&str, &str, bool)]) {
	for (topic, filter, expected) in cases {
		assert_eq!(
			topic_matches(topic, filter),
			*expected,
			"topic '{}' against filter '{}'",
			topic,
			filter
		);
	}
}

#[test]
fn exact_literal_matching() {
	assert_table(&[
		("sport/tennis/player1", "sport/tennis/player1", true),
		("sport/tennis/player2", "sport/tennis/player1", false),
		("sport/tennis", "sport/tennis/player1", false),
		("sport/tennis/player1/ranking", "sport/tennis/player1", false),
		("/foo/bar", "/foo/bar", true),
	]);
}

#[test]
fn hash_wildcard_matching() {
	assert_table(&[
		("sport/tennis/player1", "sport/tennis/#", true),
		// "#" also covers the parent level itself
		("sport/tennis", "sport/tennis/#", true),
		("sport", "sport/tennis/#", false),
		("sport/tennis/player1", "sport/#", true),
		("sport/tennis/player1", "#", true),
		("/foo/bar", "/#", true),
	]);
}

#[test]
fn plus_wildcard_matching() {
	assert_table(&[
		("anything", "+", true),
		("/anything", "+/+", true),
		("anything/tennis", "+/tennis", true),
		("sport/tennis/player1", "sport/+/player1", true),
		("sport/tennis/player1", "+/tennis/player1", true),
		("sport/tennis/player1", "sport/tennis/+", true),
		// "+" matches exactly one segment, never zero or two
		("sport/tennis", "sport/tennis/+", false),
		("sport/tennis/player1/ranking", "sport/tennis/+", false),
		("sport/tennis/player2", "sport/+/player1", false),
		("/anything", "+", false),
		("anything/golf", "+/tennis", false),
	]);
}

#[test]
fn combined_wildcards() {
	assert_table(&[
		("sport/tennis/player1", "sport/+/#", true),
		("sport/tennis/player1", "+/tennis/#", true),
	]);
}

#[test]
fn reserved_topics_blocked_from_wildcards() {
	assert_table(&[
		// Literal "$" segments in the filter still match
		("$SYS/state", "$SYS/state", true),
		("$SYS/state", "$SYS/#", true),
		// Wildcards never claim a "$"-prefixed topic segment
		("$SYS/anything", "#", false),
		("$SYS/monitor/Clients", "+/monitor/Clients", false),
	]);
}

#[test]
fn shared_subscription_prefix_is_stripped() {
	assert_table(&[
		("Clients/anything", "$share/myshare/Clients/anything", true),
		("Clients/anything", "$share/myshare/Clients/+", true),
		("/finance", "$share/myshare//finance", true),
		("finance", "$share/myshare//finance", false),
	]);
}

#[test]
fn length_mismatch_without_hash_fails() {
	assert_table(&[
		("a/b/c", "a/b", false),
		("a/b", "a/b/c", false),
		("a//b", "a/b", false),
		("a//b", "a/+/b", true),
	]);
}

// Malformed filters are not rejected; this pins the permissive behavior
// so a future change is a deliberate one.
#[test]
fn malformed_filters_are_permissive() {
	// "#" in a non-final position short-circuits the walk at its position
	assert_table(&[
		("sport/a/x", "sport/#/x", true),
		("other/a/x", "sport/#/x", false),
		// a "+" embedded in a token is a literal, not a wildcard
		("sport/ab", "sport/a+b", false),
		("sport/a+b", "sport/a+b", true),
	]);
}

#[test]
fn empty_segments_are_ordinary_segments() {
	assert_table(&[
		("", "", true),
		("", "+", true),
		("/", "+/+", true),
		("a/", "a/+", true),
		("a/", "a", false),
	]);
}
