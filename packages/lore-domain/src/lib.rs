pub mod level;
pub mod time_ago;

/// Rounds to one decimal place. Exact ties go to the even digit (`6.25` -> `6.2`).
pub fn round_one_decimal(value: f64) -> f64 {
	if !value.is_finite() {
		return 0.0;
	}

	// Float formatting rounds the exact binary value, ties to even.
	format!("{value:.1}").parse().unwrap_or(value)
}
