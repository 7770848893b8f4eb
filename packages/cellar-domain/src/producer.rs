use serde::Serialize;

use crate::normalize::{normalize, search_key};

const MIN_PRODUCER_CHARS: usize = 2;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DetectedProducer {
	/// Normalized producer name.
	pub name: String,
	#[serde(skip)]
	key: String,
}
impl DetectedProducer {
	fn new(name: String, key: String) -> Self {
		Self { name, key }
	}

	/// True when any of the given texts names this producer.
	pub fn matches<S>(&self, texts: &[S]) -> bool
	where
		S: AsRef<str>,
	{
		texts.iter().any(|text| search_key(text.as_ref()).contains(self.key.as_str()))
	}
}

/// Finds the producer named in `query`.
///
/// The longest producer contained anywhere in the query wins, so multi-word names beat the
/// shorter names they contain. Without a whole-query hit, a first token that overlaps a known
/// producer in either direction is itself taken as the producer. It never stands in for one
/// particular list entry, since several producers may share that token.
pub fn detect_producer<S>(query: &str, producers: &[S]) -> Option<DetectedProducer>
where
	S: AsRef<str>,
{
	let query_key = search_key(query);

	if query_key.is_empty() {
		return None;
	}

	let keyed = producers
		.iter()
		.map(|producer| {
			let name = normalize(producer.as_ref());
			let key = name.chars().filter(|ch| !ch.is_whitespace()).collect::<String>();

			(name, key)
		})
		.filter(|(_, key)| key.chars().count() >= MIN_PRODUCER_CHARS)
		.collect::<Vec<_>>();
	let contained = keyed.iter().filter(|(_, key)| query_key.contains(key.as_str()));

	if let Some((name, key)) = longest(contained) {
		return Some(DetectedProducer::new(name.clone(), key.clone()));
	}

	let normalized = normalize(query);
	let first = normalized.split_whitespace().next()?;

	if first.chars().count() < MIN_PRODUCER_CHARS {
		return None;
	}

	keyed
		.iter()
		.any(|(_, key)| first.contains(key.as_str()) || key.contains(first))
		.then(|| DetectedProducer::new(first.to_string(), first.to_string()))
}

fn longest<'a, I>(iter: I) -> Option<&'a (String, String)>
where
	I: Iterator<Item = &'a (String, String)>,
{
	iter.max_by(|(_, a), (_, b)| a.chars().count().cmp(&b.chars().count()).then_with(|| b.cmp(a)))
}
