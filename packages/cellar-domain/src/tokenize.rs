use unicode_script::{Script, UnicodeScript};

/// Splits normalized text into tokens.
///
/// Whitespace delimits tokens, and a boundary between Hangul and any other script also
/// starts a new token, so `피노누아2019` yields `피노누아` and `2019`.
pub fn tokenize(normalized: &str) -> Vec<String> {
	let mut tokens = Vec::new();

	for word in normalized.split_whitespace() {
		let mut current = String::new();
		let mut current_is_hangul = None;

		for ch in word.chars() {
			let is_hangul = ch.script() == Script::Hangul;

			if current_is_hangul.is_some_and(|prev| prev != is_hangul) && !current.is_empty() {
				tokens.push(std::mem::take(&mut current));
			}

			current.push(ch);

			current_is_hangul = Some(is_hangul);
		}

		if !current.is_empty() {
			tokens.push(current);
		}
	}

	tokens
}
