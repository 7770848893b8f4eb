//! Candidate generation over recall sets returned by the stores.

use std::collections::HashSet;

use cellar_config::{Config, NewItems, TRIGGER_BASIS_TEXT};
use cellar_domain::{DetectedProducer, MatchKind, TextMatch, name_similarity};
use cellar_storage::models::CatalogItem;

use crate::scoring;

/// A recalled item together with its best textual match against the query.
#[derive(Clone, Debug)]
pub struct Matched {
	pub item: CatalogItem,
	pub text: TextMatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProducerFilter {
	NotDetected,
	/// At least one item named the producer; `dropped` items did not.
	Applied { dropped: usize },
	/// No item named the producer, so everything was kept.
	NoMatch,
}

/// Keeps items that textually relate to any of `queries`.
///
/// An item survives on search-key containment in either direction, or when its token
/// similarity reaches `token_overlap_floor`. Duplicate item numbers keep their first row.
pub fn textual_matches<S>(items: Vec<CatalogItem>, queries: &[S], cfg: &Config) -> Vec<Matched>
where
	S: AsRef<str>,
{
	let floor = cfg.generation.token_overlap_floor;
	let mut seen = HashSet::new();

	items
		.into_iter()
		.filter(|item| seen.insert(item.item_no.clone()))
		.filter_map(|item| {
			let text = best_match(&item, queries, cfg);
			let related = matches!(text.kind, MatchKind::Exact | MatchKind::Contains)
				|| (text.kind == MatchKind::Tokens && text.score >= floor);

			related.then_some(Matched { item, text })
		})
		.collect()
}

pub(crate) fn best_match<S>(item: &CatalogItem, queries: &[S], cfg: &Config) -> TextMatch
where
	S: AsRef<str>,
{
	let names = item.names();

	queries
		.iter()
		.map(|query| name_similarity(query.as_ref(), &names, &cfg.scoring))
		.fold(TextMatch { score: 0.0, kind: MatchKind::None }, |best, next| {
			if next.score > best.score { next } else { best }
		})
}

/// Drops items that do not name the detected producer, unless none of them do.
pub fn filter_by_producer(
	matched: Vec<Matched>,
	producer: Option<&DetectedProducer>,
) -> (Vec<Matched>, ProducerFilter) {
	let Some(producer) = producer else {
		return (matched, ProducerFilter::NotDetected);
	};

	let (same, other): (Vec<_>, Vec<_>) =
		matched.into_iter().partition(|entry| scoring::producer_matches(&entry.item, producer));

	if same.is_empty() {
		return (other, ProducerFilter::NoMatch);
	}

	let dropped = other.len();

	(same, ProducerFilter::Applied { dropped })
}

/// Whether the master sheet should be searched for new-item suggestions.
///
/// `best` holds the composite and text scores of the best existing candidate.
pub fn should_search_new_items(best: Option<(f32, f32)>, cfg: &NewItems) -> bool {
	if !cfg.enabled {
		return false;
	}

	let Some((composite, text)) = best else {
		return true;
	};
	let basis = if cfg.trigger_basis == TRIGGER_BASIS_TEXT { text } else { composite };

	basis < cfg.trigger_cutoff
}

/// Picks new-item suggestions from master sheet rows.
///
/// `known` holds item numbers that are already candidates or exist in the catalog.
pub fn select_new_items<S>(
	master: Vec<CatalogItem>,
	known: &HashSet<String>,
	queries: &[S],
	producer: Option<&DetectedProducer>,
	cfg: &Config,
) -> Vec<Matched>
where
	S: AsRef<str>,
{
	let new_items = &cfg.generation.new_items;
	let unknown = master.into_iter().filter(|item| !known.contains(&item.item_no)).collect();
	let matched = textual_matches(unknown, queries, cfg)
		.into_iter()
		.filter(|entry| entry.text.score >= new_items.min_text_score)
		.collect();
	let (mut selected, _) = filter_by_producer(matched, producer);

	selected.sort_by(|a, b| {
		b.text
			.score
			.total_cmp(&a.text.score)
			.then_with(|| a.item.item_no.cmp(&b.item.item_no))
	});
	selected.truncate(new_items.max_items as usize);

	selected
}

/// Unions recall sets by item number, keeping first-seen order.
pub fn merge_recall(sets: impl IntoIterator<Item = Vec<CatalogItem>>) -> Vec<CatalogItem> {
	let mut seen = HashSet::new();

	sets.into_iter().flatten().filter(|item| seen.insert(item.item_no.clone())).collect()
}
