/// Reads a vintage year from query tokens.
///
/// A standalone `19xx`/`20xx` token wins; otherwise a standalone two-digit token is read as
/// `20yy` below 50 and `19yy` from 50 up.
pub fn parse_vintage<S>(tokens: &[S]) -> Option<i32>
where
	S: AsRef<str>,
{
	let digits = |token: &str| token.len() == token.chars().filter(char::is_ascii_digit).count();

	for token in tokens.iter().map(AsRef::as_ref) {
		if token.len() == 4
			&& digits(token)
			&& (token.starts_with("19") || token.starts_with("20"))
		{
			return token.parse().ok();
		}
	}

	for token in tokens.iter().map(AsRef::as_ref) {
		if token.len() == 2 && digits(token) {
			let yy: i32 = token.parse().ok()?;

			return Some(if yy < 50 { 2000 + yy } else { 1900 + yy });
		}
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn four_digit_years_win() {
		assert_eq!(parse_vintage(&["18", "오퍼스원", "2015"]), Some(2015));
		assert_eq!(parse_vintage(&["1998"]), Some(1998));
	}

	#[test]
	fn two_digit_years_pivot_at_fifty() {
		assert_eq!(parse_vintage(&["샤블리", "19"]), Some(2019));
		assert_eq!(parse_vintage(&["샤블리", "98"]), Some(1998));
	}

	#[test]
	fn other_numbers_are_not_vintages() {
		assert_eq!(parse_vintage(&["2421505"]), None);
		assert_eq!(parse_vintage(&["750", "ml"]), None);
		assert_eq!(parse_vintage(&["3000"]), None);
		assert_eq!(parse_vintage::<&str>(&[]), None);
	}
}
