use serde::Serialize;

use cellar_config::Scoring;

use crate::{
	normalize::{normalize, search_key},
	tokenize::tokenize,
};

const MIN_CONTAINED_CHARS: usize = 2;
const RECALL_SHARE: f32 = 0.75;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
	Exact,
	Contains,
	Tokens,
	None,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TextMatch {
	pub score: f32,
	pub kind: MatchKind,
}
impl TextMatch {
	const NONE: Self = Self { score: 0.0, kind: MatchKind::None };
}

/// Best match of `query` against any of an item's names.
pub fn name_similarity<S>(query: &str, names: &[S], scoring: &Scoring) -> TextMatch
where
	S: AsRef<str>,
{
	names
		.iter()
		.map(|name| text_similarity(query, name.as_ref(), scoring))
		.fold(TextMatch::NONE, |best, next| if next.score > best.score { next } else { best })
}

/// Textual similarity in `[0, 1]`.
///
/// Identical search keys score 1.0 and containment either way scores `contains_score`. Other
/// pairs fall back to a token score capped at `token_ceiling`: query-token recall weighted
/// first, blended with the share of tokens matched over the larger token count. A query token
/// matches a name token exactly, a run of consecutive name tokens (`산타루치아` against
/// `산타 루치아`), or partially for `partial_token_credit`.
pub fn text_similarity(query: &str, name: &str, scoring: &Scoring) -> TextMatch {
	let query_key = search_key(query);
	let name_key = search_key(name);

	if query_key.is_empty() || name_key.is_empty() {
		return TextMatch::NONE;
	}
	if query_key == name_key {
		return TextMatch { score: 1.0, kind: MatchKind::Exact };
	}
	if contains_meaningfully(&name_key, &query_key) || contains_meaningfully(&query_key, &name_key)
	{
		return TextMatch { score: scoring.contains_score, kind: MatchKind::Contains };
	}

	let query_tokens = tokenize(&normalize(query));
	let name_tokens = tokenize(&normalize(name));
	let score = token_score(&query_tokens, &name_tokens, scoring.partial_token_credit)
		* scoring.token_ceiling;

	if score <= 0.0 {
		return TextMatch::NONE;
	}

	TextMatch { score, kind: MatchKind::Tokens }
}

fn contains_meaningfully(haystack: &str, needle: &str) -> bool {
	needle.chars().count() >= MIN_CONTAINED_CHARS && haystack.contains(needle)
}

fn token_score(query: &[String], name: &[String], partial_credit: f32) -> f32 {
	if query.is_empty() || name.is_empty() {
		return 0.0;
	}

	let mut credit = 0.0;
	let mut name_used = vec![false; name.len()];
	let mut idx = 0;

	while idx < query.len() {
		let token = query[idx].as_str();

		if let Some(pos) = name.iter().position(|candidate| candidate == token) {
			credit += 1.0;
			name_used[pos] = true;
			idx += 1;

			continue;
		}
		if let Some(run) = find_run(token, name) {
			credit += 1.0;

			for used in &mut name_used[run] {
				*used = true;
			}

			idx += 1;

			continue;
		}
		if let Some((pos, len)) = find_query_run(&query[idx..], name) {
			credit += len as f32;
			name_used[pos] = true;
			idx += len;

			continue;
		}
		if let Some(pos) = name.iter().position(|candidate| partially_matches(token, candidate)) {
			credit += partial_credit;
			name_used[pos] = true;
		}

		idx += 1;
	}

	let recall = credit / query.len() as f32;
	let matched = name_used.iter().filter(|used| **used).count() as f32;
	let overlap = matched / query.len().max(name.len()) as f32;

	(RECALL_SHARE * recall + (1.0 - RECALL_SHARE) * overlap).clamp(0.0, 1.0)
}

/// Consecutive name tokens (two or more) that concatenate to `token`.
fn find_run(token: &str, name: &[String]) -> Option<std::ops::Range<usize>> {
	for start in 0..name.len() {
		let mut joined = String::new();

		for end in start..name.len() {
			joined.push_str(&name[end]);

			if !token.starts_with(joined.as_str()) {
				break;
			}
			if joined.len() == token.len() && end > start {
				return Some(start..end + 1);
			}
		}
	}

	None
}

/// Consecutive query tokens (two or more) that concatenate to a single name token.
fn find_query_run(query: &[String], name: &[String]) -> Option<(usize, usize)> {
	let mut joined = String::new();

	for (offset, token) in query.iter().enumerate() {
		joined.push_str(token);

		if offset == 0 {
			continue;
		}
		if let Some(pos) = name.iter().position(|candidate| *candidate == joined) {
			return Some((pos, offset + 1));
		}
		if !name.iter().any(|candidate| candidate.starts_with(joined.as_str())) {
			break;
		}
	}

	None
}

fn partially_matches(token: &str, candidate: &str) -> bool {
	(token.chars().count() >= MIN_CONTAINED_CHARS && candidate.contains(token))
		|| (candidate.chars().count() >= MIN_CONTAINED_CHARS && token.contains(candidate))
}
