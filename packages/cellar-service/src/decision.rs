use std::cmp::Ordering;

use serde::Serialize;

use crate::scoring::ScoreBreakdown;
use cellar_config::Resolution;
use cellar_storage::models::CatalogItem;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Candidate {
	pub item_no: String,
	pub item_name: String,
	pub score: f32,
	pub is_new_item: bool,
	pub purchase_count: i64,
	pub breakdown: ScoreBreakdown,
}
impl Candidate {
	pub fn new(
		item: &CatalogItem,
		breakdown: ScoreBreakdown,
		is_new_item: bool,
		purchase_count: i64,
	) -> Self {
		Self {
			item_no: item.item_no.clone(),
			item_name: item.display_name().to_string(),
			score: breakdown.total(),
			is_new_item,
			purchase_count,
			breakdown,
		}
	}
}

/// A candidate eligible for automatic confirmation. New items cannot be wrapped.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ConfirmedCandidate(Candidate);
impl ConfirmedCandidate {
	pub fn new(candidate: Candidate) -> Option<Self> {
		if candidate.is_new_item {
			return None;
		}

		Some(Self(candidate))
	}

	pub fn candidate(&self) -> &Candidate {
		&self.0
	}

	pub fn into_inner(self) -> Candidate {
		self.0
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
	Alias,
	Scored,
	None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionState {
	Parsed,
	CandidatesGenerated,
	Scored,
	AutoConfirmed,
	NeedsReview,
}
impl ResolutionState {
	pub fn is_terminal(self) -> bool {
		matches!(self, Self::AutoConfirmed | Self::NeedsReview)
	}

	/// Whether the pipeline may move from `self` to `next`.
	///
	/// Alias hits and empty queries finish straight from `Parsed`.
	pub fn can_advance_to(self, next: Self) -> bool {
		matches!(
			(self, next),
			(Self::Parsed, Self::CandidatesGenerated | Self::AutoConfirmed | Self::NeedsReview)
				| (Self::CandidatesGenerated, Self::Scored)
				| (Self::Scored, Self::AutoConfirmed | Self::NeedsReview)
		)
	}

	pub(crate) fn advance(&mut self, next: Self) {
		debug_assert!(self.can_advance_to(next), "Illegal transition {self:?} -> {next:?}.");

		tracing::trace!(from = ?self, to = ?next, "Resolution state advanced.");

		*self = next;
	}
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResolutionResult {
	AutoConfirmed {
		chosen: ConfirmedCandidate,
		method: ResolutionMethod,
		candidates: Vec<Candidate>,
	},
	NeedsReview {
		candidates: Vec<Candidate>,
	},
}
impl ResolutionResult {
	pub fn resolved(&self) -> bool {
		matches!(self, Self::AutoConfirmed { .. })
	}

	pub fn method(&self) -> ResolutionMethod {
		match self {
			Self::AutoConfirmed { method, .. } => *method,
			Self::NeedsReview { .. } => ResolutionMethod::None,
		}
	}

	pub fn chosen(&self) -> Option<&Candidate> {
		match self {
			Self::AutoConfirmed { chosen, .. } => Some(chosen.candidate()),
			Self::NeedsReview { .. } => None,
		}
	}

	pub fn candidates(&self) -> &[Candidate] {
		match self {
			Self::AutoConfirmed { candidates, .. } | Self::NeedsReview { candidates } => candidates,
		}
	}

	pub fn state(&self) -> ResolutionState {
		match self {
			Self::AutoConfirmed { .. } => ResolutionState::AutoConfirmed,
			Self::NeedsReview { .. } => ResolutionState::NeedsReview,
		}
	}
}

/// Existing items first, then score descending, purchase count descending, item number.
pub fn order_candidates(candidates: &mut [Candidate]) {
	candidates.sort_by(|a, b| {
		a.is_new_item
			.cmp(&b.is_new_item)
			.then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
			.then_with(|| b.purchase_count.cmp(&a.purchase_count))
			.then_with(|| a.item_no.cmp(&b.item_no))
	});
}

/// Trims an ordered list to `max`, keeping up to `new_item_slots` places for new items.
///
/// Slots that one group cannot fill go to the other.
pub fn bound_candidates(
	ordered: Vec<Candidate>,
	max: usize,
	new_item_slots: usize,
) -> Vec<Candidate> {
	let (existing, new_items): (Vec<_>, Vec<_>) =
		ordered.into_iter().partition(|candidate| !candidate.is_new_item);
	let reserved = new_items.len().min(new_item_slots).min(max);
	let existing_take = existing.len().min(max - reserved);
	let new_take = new_items.len().min(max - existing_take);

	existing.into_iter().take(existing_take).chain(new_items.into_iter().take(new_take)).collect()
}

/// Orders, bounds, and decides on scored candidates.
pub fn decide(cfg: &Resolution, mut candidates: Vec<Candidate>) -> ResolutionResult {
	order_candidates(&mut candidates);

	let candidates =
		bound_candidates(candidates, cfg.max_candidates as usize, cfg.new_item_slots as usize);

	let Some(top) = candidates.first().filter(|top| !top.is_new_item) else {
		return ResolutionResult::NeedsReview { candidates };
	};
	let runner_up = candidates
		.get(1)
		.filter(|candidate| !candidate.is_new_item)
		.map(|candidate| candidate.score);
	let clears_gap = runner_up.is_none_or(|score| top.score - score >= cfg.min_gap);

	if top.score < cfg.confirm_threshold || !clears_gap {
		return ResolutionResult::NeedsReview { candidates };
	}

	match ConfirmedCandidate::new(top.clone()) {
		Some(chosen) => ResolutionResult::AutoConfirmed {
			chosen,
			method: ResolutionMethod::Scored,
			candidates,
		},
		None => ResolutionResult::NeedsReview { candidates },
	}
}
