use time::{
	Date, OffsetDateTime, PrimitiveDateTime, format_description::well_known::Rfc3339,
	macros::format_description,
};

/// Label used when a timestamp is absent or cannot be parsed.
pub const UNKNOWN_TIME: &str = "recently";

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Renders how long before `now` a learning was recorded.
pub fn time_ago(timestamp: Option<&str>, now: OffsetDateTime) -> String {
	match timestamp.and_then(parse_timestamp) {
		Some(at) => humanize_elapsed((now - at).whole_seconds()),
		None => UNKNOWN_TIME.to_string(),
	}
}

fn humanize_elapsed(seconds: i64) -> String {
	if seconds < MINUTE {
		"just now".to_string()
	} else if seconds < HOUR {
		format!("{}m ago", seconds / MINUTE)
	} else if seconds < DAY {
		format!("{}h ago", seconds / HOUR)
	} else {
		format!("{}d ago", seconds / DAY)
	}
}

/// Parses an ISO-8601 date-time. Values without an offset are taken as UTC.
fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
	let raw = raw.trim();

	if raw.is_empty() {
		return None;
	}

	// Accept `2024-05-01 12:00:00` as well as the `T` form.
	let mut normalized = match raw.as_bytes().get(10) {
		Some(b' ') => format!("{}T{}", &raw[..10], &raw[11..]),
		_ => raw.to_string(),
	};

	if let Some(stripped) = normalized.strip_suffix(['Z', 'z']) {
		normalized = format!("{stripped}+00:00");
	}

	if let Ok(at) = OffsetDateTime::parse(&normalized, &Rfc3339) {
		return Some(at);
	}
	if let Ok(at) = PrimitiveDateTime::parse(
		&normalized,
		format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]"),
	) {
		return Some(at.assume_utc());
	}
	if let Ok(at) = OffsetDateTime::parse(
		&normalized,
		format_description!(
			"[year]-[month]-[day]T[hour]:[minute][offset_hour sign:mandatory]:[offset_minute]"
		),
	) {
		return Some(at);
	}
	if let Ok(at) =
		PrimitiveDateTime::parse(&normalized, format_description!("[year]-[month]-[day]T[hour]:[minute]"))
	{
		return Some(at.assume_utc());
	}

	Date::parse(&normalized, format_description!("[year]-[month]-[day]"))
		.ok()
		.map(|date| date.midnight().assume_utc())
}
