use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Quantity written with a unit word, e.g. `6병`, `2 cs`, `12btl`.
static UNIT_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)(\d+)\s*(병|박스|케이스|개|잔|본|cs|box|btl|bt|ea)\b")
		.expect("Unit quantity pattern must compile.")
});

/// Canonical matching form of a piece of order or catalog text.
///
/// Lower-cased, compatibility-decomposed with combining marks dropped and then recomposed,
/// quote variants unified, the separators `( ) - _ / . ,` turned into spaces, and whitespace
/// collapsed. Hangul survives unchanged because conjoining jamo are not combining marks.
/// Applying it twice yields the same string.
pub fn normalize(text: &str) -> String {
	let folded = strip_marks(&strip_marks(text).to_lowercase());
	let mut out = String::with_capacity(folded.len());
	let mut pending_space = false;

	for ch in folded.nfc().map(fold_char) {
		if ch == ' ' {
			pending_space = !out.is_empty();

			continue;
		}
		if pending_space {
			out.push(' ');

			pending_space = false;
		}

		out.push(ch);
	}

	out
}

/// [`normalize`] without any whitespace; used for containment checks.
pub fn search_key(text: &str) -> String {
	normalize(text).chars().filter(|ch| !ch.is_whitespace()).collect()
}

/// Removes unit-suffixed quantities so that `샤블리 6병` and `샤블리` share a key.
pub fn strip_quantity(text: &str) -> String {
	let stripped = UNIT_QUANTITY.replace_all(text, " ");

	stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Returns the first unit-suffixed quantity, with its unit lower-cased.
pub fn find_unit_quantity(text: &str) -> Option<(u32, String)> {
	let caps = UNIT_QUANTITY.captures(text)?;
	let quantity = caps.get(1)?.as_str().parse().ok()?;
	let unit = caps.get(2)?.as_str().to_lowercase();

	Some((quantity, unit))
}

fn strip_marks(text: &str) -> String {
	text.nfkd().filter(|ch| !is_combining_mark(*ch)).collect()
}

fn fold_char(ch: char) -> char {
	match ch {
		'\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' | '`' | '\u{00B4}' => '\'',
		'\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
		'(' | ')' | '-' | '_' | '/' | '.' | ',' => ' ',
		ch if ch.is_whitespace() || ch.is_control() => ' ',
		ch => ch,
	}
}
