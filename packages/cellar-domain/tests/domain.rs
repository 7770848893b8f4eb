use cellar_config::Scoring;
use cellar_domain::{
	MatchKind, alias_key, detect_producer, name_similarity, normalize, parse_order_text,
	parse_vintage, search_key, strip_quantity, tokenize,
};

#[test]
fn alias_key_ignores_quantity_and_spacing() {
	let a = normalize(&strip_quantity("샤블리  6병"));
	let b = normalize(&strip_quantity("샤블리"));

	assert_eq!(a, b);
	assert_eq!(alias_key("샤블리  6병"), b);
	assert_eq!(alias_key("샤블리 6"), b);
}

#[test]
fn query_pipeline_produces_tokens_producer_and_vintage() {
	let producers = ["크루 와이너리", "메이오미"];
	let query = normalize("크루 와이너리 산타루치아 몬테레이 2019");
	let tokens = tokenize(&query);
	let producer =
		detect_producer(&query, &producers).expect("Expected the producer to be detected.");

	assert_eq!(tokens.len(), 5);
	assert_eq!(producer.name, "크루 와이너리");
	assert_eq!(parse_vintage(&tokens), Some(2019));
}

#[test]
fn english_and_korean_names_are_both_considered() {
	let scoring = Scoring::default();
	let names = ["크루 와이너리 피노누아 몬테레이", "Crew Winery Pinot Noir Monterey"];
	let matched = name_similarity("crew winery pinot noir", &names, &scoring);

	assert_eq!(matched.kind, MatchKind::Contains);
}

#[test]
fn search_key_is_idempotent_on_normalized_text() {
	let key = search_key("Domaine Leflaive - Puligny (2018)");

	assert_eq!(search_key(&key), key);
}

#[test]
fn order_lines_serialize_for_reporting() {
	let lines = parse_order_text("메이오미 2병");
	let json = serde_json::to_value(&lines).expect("Failed to serialize order lines.");

	assert_eq!(json[0]["item_text"], "메이오미");
	assert_eq!(json[0]["quantity"], 2);
	assert_eq!(json[0]["unit"], "병");
}
