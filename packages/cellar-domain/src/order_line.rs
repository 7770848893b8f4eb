use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::normalize::{normalize, strip_quantity};

const UNITS: &str = "병|박스|케이스|개|잔|본|cs|box|btl|bt|ea";
const TAIL_PHRASES: [&str; 8] = [
	"요청드립니다",
	"요청합니다",
	"부탁드립니다",
	"부탁드려요",
	"부탁합니다",
	"부탁해요",
	"주세요",
	"입니다",
];
const GREETING_PREFIXES: [&str; 6] = ["안녕", "감사", "부탁", "수고", "확인", "고맙"];
const MEMO_WORDS: [&str; 13] = [
	"배송", "출고", "퀵", "택배", "픽업", "방문", "오늘", "내일", "모레", "오전", "오후", "주소",
	"연락처",
];
const BULLETS: [char; 6] = ['-', '*', '•', '·', ':', '>'];

static CASE_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)^(?P<name>.*\D)\s*(?P<unit>cs)\s*(?P<qty>\d{1,4})$")
		.expect("Case quantity pattern must compile.")
});
static TRAILING_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"(?i)^(?P<name>.*?\D)\s*(?P<qty>\d{{1,4}})\s*(?P<unit>{UNITS})?$"))
		.expect("Trailing quantity pattern must compile.")
});
static LEADING_QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(&format!(r"(?i)^(?P<qty>\d{{1,3}})\s*(?P<unit>{UNITS})?\s+(?P<name>\D.*)$"))
		.expect("Leading quantity pattern must compile.")
});
static TRAILING_YEAR: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?P<rest>.+?)\s+(?P<year>(?:19|20)\d{2})$")
		.expect("Trailing year pattern must compile.")
});

/// One order line as written by the client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OrderLine {
	pub raw_text: String,
	/// `raw_text` with the quantity expression and courtesy phrases removed.
	pub item_text: String,
	pub quantity: Option<u32>,
	pub unit: Option<String>,
}

/// Splits a free-form order message into order lines.
///
/// Lines break on newlines, `/` and `;`. Greetings and delivery memos without any digit are
/// skipped.
pub fn parse_order_text(text: &str) -> Vec<OrderLine> {
	text.split(['\n', '\r', '/', '／', ';', '；']).filter_map(parse_order_line).collect()
}

/// Parses a single order line, returning `None` for lines that carry no item.
pub fn parse_order_line(line: &str) -> Option<OrderLine> {
	let raw_text = line.split_whitespace().collect::<Vec<_>>().join(" ");
	let trimmed = strip_tail_phrases(raw_text.trim_start_matches(BULLETS).trim());

	if trimmed.is_empty() || is_chatter(trimmed) {
		return None;
	}

	// A year at the very end is a vintage hint, never a quantity.
	let (body, year) = match TRAILING_YEAR.captures(trimmed) {
		Some(caps) => (caps.name("rest")?.as_str().to_string(), Some(caps.name("year")?.as_str())),
		None => (trimmed.to_string(), None),
	};
	let body = strip_tail_phrases(&body);
	let (name, quantity, unit) = split_quantity(body);
	let item_text = match year {
		Some(year) if !name.is_empty() => format!("{name} {year}"),
		Some(year) => year.to_string(),
		None => name,
	};

	if item_text.is_empty() {
		return None;
	}

	Some(OrderLine { raw_text, item_text, quantity, unit })
}

/// Key under which aliases for `text` are stored and looked up.
///
/// The text goes through the same line parsing as an order message before quantities are
/// stripped and the rest normalized, so a key learned from a raw line matches the one built
/// when that line is resolved.
pub fn alias_key(text: &str) -> String {
	let item_text = parse_order_line(text).map(|line| line.item_text);

	normalize(&strip_quantity(item_text.as_deref().unwrap_or(text)))
}

fn split_quantity(body: &str) -> (String, Option<u32>, Option<String>) {
	for pattern in [&*CASE_QUANTITY, &*TRAILING_QUANTITY, &*LEADING_QUANTITY] {
		let Some(caps) = pattern.captures(body) else {
			continue;
		};
		let Some(quantity) = caps.name("qty").and_then(|qty| qty.as_str().parse::<u32>().ok())
		else {
			continue;
		};
		let unit = caps.name("unit").map(|unit| unit.as_str().to_lowercase());

		// Bare years and zero counts stay part of the item text.
		if quantity == 0 || (unit.is_none() && (1900..=2099).contains(&quantity)) {
			break;
		}
		if quantity >= 1900 {
			break;
		}

		let name = caps.name("name").map(|name| clean_name(name.as_str())).unwrap_or_default();

		if name.is_empty() {
			break;
		}

		return (name, Some(quantity), unit);
	}

	(clean_name(body), None, None)
}

fn strip_tail_phrases(text: &str) -> &str {
	let mut current = text.trim();

	loop {
		let Some(stripped) = TAIL_PHRASES.iter().find_map(|phrase| current.strip_suffix(phrase))
		else {
			return current;
		};

		current = stripped.trim_end();
	}
}

fn is_chatter(text: &str) -> bool {
	if GREETING_PREFIXES.iter().any(|prefix| text.starts_with(prefix)) {
		return true;
	}

	!text.chars().any(|ch| ch.is_ascii_digit()) && MEMO_WORDS.iter().any(|word| text.contains(word))
}

fn clean_name(text: &str) -> String {
	text.trim().trim_matches(BULLETS).trim().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn line(text: &str) -> OrderLine {
		parse_order_line(text).unwrap_or_else(|| panic!("Expected an order line for {text:?}."))
	}

	#[test]
	fn trailing_unit_quantity() {
		let parsed = line("샤를루 6병");

		assert_eq!(parsed.item_text, "샤를루");
		assert_eq!(parsed.quantity, Some(6));
		assert_eq!(parsed.unit.as_deref(), Some("병"));
	}

	#[test]
	fn glued_quantities() {
		assert_eq!(line("말벡2").quantity, Some(2));
		assert_eq!(line("말벡2").item_text, "말벡");

		let case = line("램본cs1");

		assert_eq!(case.item_text, "램본");
		assert_eq!(case.quantity, Some(1));
		assert_eq!(case.unit.as_deref(), Some("cs"));
	}

	#[test]
	fn leading_quantity() {
		let parsed = line("6 샤를루");

		assert_eq!(parsed.item_text, "샤를루");
		assert_eq!(parsed.quantity, Some(6));
	}

	#[test]
	fn years_are_not_quantities() {
		let front = line("2023 로버트 몬다비 1병");

		assert_eq!(front.item_text, "2023 로버트 몬다비");
		assert_eq!(front.quantity, Some(1));

		let back = line("팝콘 소비뇽블랑 8병 2024");

		assert_eq!(back.item_text, "팝콘 소비뇽블랑 2024");
		assert_eq!(back.quantity, Some(8));

		let bare = line("오퍼스원 2015");

		assert_eq!(bare.item_text, "오퍼스원 2015");
		assert_eq!(bare.quantity, None);
	}

	#[test]
	fn product_codes_keep_all_digits() {
		let parsed = line("2421505");

		assert_eq!(parsed.item_text, "2421505");
		assert_eq!(parsed.quantity, None);
	}

	#[test]
	fn courtesy_phrases_are_stripped() {
		let parsed = line("그라함 30년 6 요청드립니다");

		assert_eq!(parsed.item_text, "그라함 30년");
		assert_eq!(parsed.quantity, Some(6));
	}

	#[test]
	fn message_splits_and_skips_chatter() {
		let message = "안녕하세요\n- 샤블리 2병 / 메이오미 3btl\n내일 배송 부탁드립니다\n\n";
		let lines = parse_order_text(message);
		let items = lines.iter().map(|line| line.item_text.as_str()).collect::<Vec<_>>();

		assert_eq!(items, vec!["샤블리", "메이오미"]);
		assert_eq!(lines[1].quantity, Some(3));
	}

	#[test]
	fn alias_key_matches_the_parsed_line() {
		for raw in ["샤블리 6", "샤블리 6병", "- 샤블리 부탁드립니다", "2 샤블리"] {
			assert_eq!(alias_key(raw), "샤블리", "{raw:?}");
			assert_eq!(alias_key(&line(raw).item_text), "샤블리", "{raw:?}");
		}

		assert_eq!(alias_key("2421505"), "2421505");
		assert_eq!(alias_key("루체 2019"), "루체 2019");
		assert!(alias_key("6병").is_empty());
	}
}
