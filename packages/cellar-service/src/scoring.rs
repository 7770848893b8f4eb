use serde::Serialize;
use time::OffsetDateTime;

use cellar_config::Scoring;
use cellar_domain::{DetectedProducer, MatchKind, TextMatch};
use cellar_storage::models::{CatalogItem, ClientItemStat};

const NEUTRAL_PRODUCER: f32 = 0.5;

/// A bounded sub-score and its contribution to the composite.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Signal {
	pub raw: f32,
	pub weighted: f32,
}
impl Signal {
	fn new(raw: f32, weight: f32) -> Self {
		let raw = raw.clamp(0.0, 1.0);

		Self { raw, weighted: raw * weight }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ScoreBreakdown {
	pub text_match: MatchKind,
	pub text: Signal,
	pub alias: Signal,
	pub recency: Signal,
	pub frequency: Signal,
	pub vintage: Signal,
	pub producer: Signal,
}
impl ScoreBreakdown {
	pub fn total(&self) -> f32 {
		self.text.weighted
			+ self.alias.weighted
			+ self.recency.weighted
			+ self.frequency.weighted
			+ self.vintage.weighted
			+ self.producer.weighted
	}
}

/// Query-side facts shared by every candidate of one resolution.
#[derive(Clone, Copy, Debug)]
pub struct QuerySignals<'a> {
	pub producer: Option<&'a DetectedProducer>,
	pub vintage: Option<i32>,
	/// Item the query's exact alias points at, if any.
	pub alias_item_no: Option<&'a str>,
	pub now: OffsetDateTime,
}

pub fn score(
	cfg: &Scoring,
	item: &CatalogItem,
	text: TextMatch,
	stat: Option<&ClientItemStat>,
	query: &QuerySignals<'_>,
) -> ScoreBreakdown {
	let weights = &cfg.weights;
	let alias_hit = query.alias_item_no.is_some_and(|item_no| item_no == item.item_no);
	let days = stat
		.and_then(|stat| stat.last_purchase_date)
		.map(|date| (query.now.date() - date).whole_days().max(0));
	let count = stat.map(|stat| stat.purchase_count).unwrap_or(0);
	let vintage_hit = query.vintage.is_some_and(|vintage| item.vintage == Some(vintage));

	ScoreBreakdown {
		text_match: text.kind,
		text: Signal::new(text.score, weights.text),
		alias: Signal::new(if alias_hit { 1.0 } else { 0.0 }, weights.alias),
		recency: Signal::new(
			days.map(|days| recency(days, cfg.recency_tau_days)).unwrap_or(0.0),
			weights.recency,
		),
		frequency: Signal::new(frequency(count, cfg.frequency_half_saturation), weights.frequency),
		vintage: Signal::new(if vintage_hit { 1.0 } else { 0.0 }, weights.vintage),
		producer: Signal::new(producer_agreement(item, query.producer), weights.producer),
	}
}

/// `exp(-days / tau)`.
pub fn recency(days: i64, tau_days: f32) -> f32 {
	(-(days as f32) / tau_days).exp()
}

/// Saturating share `count / (count + half)`; zero without purchases.
pub fn frequency(count: i64, half_saturation: f32) -> f32 {
	if count <= 0 {
		return 0.0;
	}

	let count = count as f32;

	count / (count + half_saturation)
}

fn producer_agreement(item: &CatalogItem, producer: Option<&DetectedProducer>) -> f32 {
	let Some(producer) = producer else {
		return NEUTRAL_PRODUCER;
	};

	if producer_matches(item, producer) { 1.0 } else { 0.0 }
}

pub(crate) fn producer_matches(item: &CatalogItem, producer: &DetectedProducer) -> bool {
	let mut texts = item.names();

	if let Some(name) = item.producer.as_deref() {
		texts.push(name);
	}

	producer.matches(&texts)
}
