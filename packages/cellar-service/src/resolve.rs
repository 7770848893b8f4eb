use std::collections::HashSet;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{
	CellarService, Error, Result,
	candidates::{self, Matched, ProducerFilter},
	decision::{
		self, Candidate, ConfirmedCandidate, ResolutionMethod, ResolutionResult, ResolutionState,
	},
	expand::{self, AliasSnapshot},
	scoring::{self, QuerySignals},
};
use cellar_domain::{DetectedProducer, OrderLine};
use cellar_storage::models::{self, Alias};

/// Everything derived from the raw order text before candidate generation.
#[derive(Clone, Debug, Serialize)]
pub struct ParsedQuery {
	pub raw_text: String,
	pub normalized: String,
	pub expanded: String,
	pub applied_aliases: Vec<String>,
	pub tokens: Vec<String>,
	pub producer: Option<DetectedProducer>,
	pub vintage: Option<i32>,
}
impl ParsedQuery {
	/// Query texts the text signal is measured against.
	fn texts(&self) -> Vec<&str> {
		if self.expanded == self.normalized {
			vec![self.normalized.as_str()]
		} else {
			vec![self.normalized.as_str(), self.expanded.as_str()]
		}
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolvedLine {
	pub line: OrderLine,
	pub query: ParsedQuery,
	pub result: ResolutionResult,
}

struct Context<'a> {
	client: Option<&'a str>,
	scope: &'a str,
	now: OffsetDateTime,
}

impl CellarService {
	pub async fn resolve_order_line(
		&self,
		raw_text: &str,
		quantity: Option<u32>,
		client_code: Option<&str>,
	) -> Result<ResolvedLine> {
		self.resolve_order_line_at(raw_text, quantity, client_code, OffsetDateTime::now_utc()).await
	}

	pub async fn resolve_order_line_at(
		&self,
		raw_text: &str,
		quantity: Option<u32>,
		client_code: Option<&str>,
		now: OffsetDateTime,
	) -> Result<ResolvedLine> {
		if raw_text.trim().is_empty() {
			return Err(Error::InvalidInput { message: "raw_text must be non-empty.".to_string() });
		}

		let line = OrderLine {
			raw_text: raw_text.to_string(),
			item_text: raw_text.trim().to_string(),
			quantity,
			unit: None,
		};

		self.resolve_line(line, client_code, now).await
	}

	/// Splits a multi-line order message and resolves each item line in order.
	pub async fn resolve_order_text(
		&self,
		text: &str,
		client_code: Option<&str>,
	) -> Result<Vec<ResolvedLine>> {
		let now = OffsetDateTime::now_utc();
		let mut resolved = Vec::new();

		for line in cellar_domain::parse_order_text(text) {
			resolved.push(self.resolve_line(line, client_code, now).await?);
		}

		Ok(resolved)
	}

	async fn resolve_line(
		&self,
		line: OrderLine,
		client_code: Option<&str>,
		now: OffsetDateTime,
	) -> Result<ResolvedLine> {
		let client = client_code.map(str::trim).filter(|code| !code.is_empty());
		let ctx = Context { client, scope: models::scope_value(client), now };
		let mut state = ResolutionState::Parsed;
		let alias_key = cellar_domain::alias_key(&line.raw_text);
		let (query, exact_alias) = self.parse_query(&line.item_text, &alias_key, &ctx).await?;

		if query.normalized.is_empty() {
			state.advance(ResolutionState::NeedsReview);

			return Ok(ResolvedLine {
				line,
				query,
				result: ResolutionResult::NeedsReview { candidates: Vec::new() },
			});
		}

		if let Some(alias) = exact_alias.as_ref()
			&& let Some(result) = self.resolve_by_alias(alias, &query, &ctx).await?
		{
			state.advance(result.state());

			tracing::debug!(
				query = %query.normalized,
				alias = %alias.alias_key,
				item_no = %alias.canonical_item_no,
				"Resolved order line by alias."
			);

			return Ok(ResolvedLine { line, query, result });
		}

		let alias_item_no = exact_alias.as_ref().map(|alias| alias.canonical_item_no.as_str());
		let signals = QuerySignals {
			producer: query.producer.as_ref(),
			vintage: query.vintage,
			alias_item_no,
			now: ctx.now,
		};
		let existing = self.existing_candidates(&query).await?;

		state.advance(ResolutionState::CandidatesGenerated);

		let mut scored = Vec::with_capacity(existing.len());

		for matched in &existing {
			scored.push(self.score_existing(matched, &signals, &ctx).await?);
		}

		let best = scored
			.iter()
			.zip(&existing)
			.map(|(candidate, matched)| (candidate.score, matched.text.score))
			.max_by(|a, b| a.0.total_cmp(&b.0));

		if candidates::should_search_new_items(best, &self.cfg.generation.new_items) {
			let known = existing.iter().map(|matched| matched.item.item_no.clone()).collect();

			for matched in self.new_item_candidates(&query, known).await? {
				let breakdown =
					scoring::score(&self.cfg.scoring, &matched.item, matched.text, None, &signals);

				scored.push(Candidate::new(&matched.item, breakdown, true, 0));
			}
		}

		state.advance(ResolutionState::Scored);

		let result = decision::decide(&self.cfg.resolution, scored);

		state.advance(result.state());

		tracing::debug!(
			query = %query.normalized,
			expanded = %query.expanded,
			candidates = result.candidates().len(),
			top_score = result.candidates().first().map(|candidate| candidate.score),
			state = ?state,
			"Resolved order line."
		);

		Ok(ResolvedLine { line, query, result })
	}

	/// `alias_key` is the key of the whole line, looked up for the alias fast path.
	async fn parse_query(
		&self,
		text: &str,
		alias_key: &str,
		ctx: &Context<'_>,
	) -> Result<(ParsedQuery, Option<Alias>)> {
		let normalized = cellar_domain::normalize(&cellar_domain::strip_quantity(text));

		if normalized.is_empty() {
			let query = ParsedQuery {
				raw_text: text.to_string(),
				normalized: String::new(),
				expanded: String::new(),
				applied_aliases: Vec::new(),
				tokens: Vec::new(),
				producer: None,
				vintage: None,
			};

			return Ok((query, None));
		}

		let aliases = &self.stores.aliases;
		let ranked = aliases.top_by_usage(ctx.scope, self.cfg.expansion.snapshot_limit).await?;
		let mut snapshot = AliasSnapshot::new(&ranked, &self.cfg.expansion);
		let exact_alias = if alias_key.is_empty() {
			None
		} else {
			aliases.lookup(alias_key, ctx.scope).await?
		};

		for token in unique_tokens(&normalized) {
			if snapshot.contains_key(token) {
				continue;
			}
			if let Some(alias) = aliases.lookup(token, ctx.scope).await? {
				snapshot.insert(&alias);
			}
		}

		let expanded = expand::expand(&normalized, &snapshot);
		let tokens = cellar_domain::tokenize(&expanded.text);
		let producers = self.stores.producers.all().await?;
		let producer = cellar_domain::detect_producer(&expanded.text, &producers);
		// Years come from the client's own words, never from spliced alias text.
		let vintage = cellar_domain::parse_vintage(&cellar_domain::tokenize(&normalized));

		if expanded.changed() {
			tracing::debug!(
				normalized = %normalized,
				expanded = %expanded.text,
				applied = ?expanded.applied,
				"Expanded query with aliases."
			);
		}

		let query = ParsedQuery {
			raw_text: text.to_string(),
			normalized,
			expanded: expanded.text,
			applied_aliases: expanded.applied,
			tokens,
			producer,
			vintage,
		};

		Ok((query, exact_alias))
	}

	/// Confirms the alias target when it is still a catalog item.
	async fn resolve_by_alias(
		&self,
		alias: &Alias,
		query: &ParsedQuery,
		ctx: &Context<'_>,
	) -> Result<Option<ResolutionResult>> {
		let Some(item) = self.stores.catalog.get(&alias.canonical_item_no).await? else {
			tracing::warn!(
				alias = %alias.alias_key,
				item_no = %alias.canonical_item_no,
				"Alias target is missing from the catalog. Falling back to scoring."
			);

			return Ok(None);
		};
		let signals = QuerySignals {
			producer: query.producer.as_ref(),
			vintage: query.vintage,
			alias_item_no: Some(alias.canonical_item_no.as_str()),
			now: ctx.now,
		};
		let text = candidates::best_match(&item, &query.texts(), &self.cfg);
		let matched = Matched { item, text };
		let candidate = self.score_existing(&matched, &signals, ctx).await?;
		let Some(chosen) = ConfirmedCandidate::new(candidate.clone()) else {
			return Ok(None);
		};

		Ok(Some(ResolutionResult::AutoConfirmed {
			chosen,
			method: ResolutionMethod::Alias,
			candidates: vec![candidate],
		}))
	}

	async fn existing_candidates(&self, query: &ParsedQuery) -> Result<Vec<Matched>> {
		let limit = self.cfg.generation.catalog_limit;
		let texts = query.texts();
		let mut recall = Vec::with_capacity(texts.len());

		for text in &texts {
			recall.push(self.stores.catalog.find_by_text(text, limit).await?);
		}

		let recall = candidates::merge_recall(recall);
		let matched = candidates::textual_matches(recall, &texts, &self.cfg);
		let recalled = matched.len();
		let (kept, outcome) = candidates::filter_by_producer(matched, query.producer.as_ref());

		match outcome {
			ProducerFilter::Applied { dropped } if dropped > 0 => {
				tracing::debug!(
					dropped,
					kept = kept.len(),
					"Dropped candidates from other producers."
				);
			},
			ProducerFilter::NoMatch if !kept.is_empty() => {
				tracing::warn!(
					producer = query.producer.as_ref().map(|producer| producer.name.as_str()),
					candidates = kept.len(),
					"No candidate names the detected producer. Keeping all candidates."
				);
			},
			_ => {},
		}

		tracing::debug!(recalled, kept = kept.len(), "Generated existing candidates.");

		Ok(kept)
	}

	async fn new_item_candidates(
		&self,
		query: &ParsedQuery,
		mut known: HashSet<String>,
	) -> Result<Vec<Matched>> {
		let limit = self.cfg.generation.new_items.master_limit;
		let texts = query.texts();
		let mut recall = Vec::with_capacity(texts.len());

		for text in &texts {
			recall.push(self.stores.master.find_by_text(text, limit).await?);
		}

		let master = candidates::merge_recall(recall);

		for item in &master {
			if known.contains(&item.item_no) {
				continue;
			}
			if self.stores.catalog.get(&item.item_no).await?.is_some() {
				known.insert(item.item_no.clone());
			}
		}

		let selected = candidates::select_new_items(
			master,
			&known,
			&texts,
			query.producer.as_ref(),
			&self.cfg,
		);

		tracing::debug!(selected = selected.len(), "Generated new-item candidates.");

		Ok(selected)
	}

	async fn score_existing(
		&self,
		matched: &Matched,
		signals: &QuerySignals<'_>,
		ctx: &Context<'_>,
	) -> Result<Candidate> {
		let stat = match ctx.client {
			Some(client) => self.stores.catalog.stats_for(client, &matched.item.item_no).await?,
			None => None,
		};
		let breakdown =
			scoring::score(&self.cfg.scoring, &matched.item, matched.text, stat.as_ref(), signals);
		let purchase_count = stat.map(|stat| stat.purchase_count).unwrap_or(0);

		Ok(Candidate::new(&matched.item, breakdown, false, purchase_count))
	}
}

fn unique_tokens(normalized: &str) -> Vec<&str> {
	let mut seen = HashSet::new();

	normalized.split_whitespace().filter(|token| seen.insert(*token)).collect()
}
