//! Query rewriting from learned aliases.
//!
//! Two passes run over the normalized query. Whole tokens that equal an alias key are replaced
//! by the alias's canonical fragment. Longer aliases are then matched against the query with
//! its spaces removed, longest first, and spliced in with spaces around them. Spliced text is
//! never scanned again, so a short alias cannot rewrite a fragment a longer one produced.

use std::collections::HashMap;

use serde::Serialize;

use cellar_config::Expansion;
use cellar_domain::normalize;
use cellar_storage::models::Alias;

#[derive(Clone, Debug, Default)]
pub struct AliasSnapshot {
	exact: HashMap<String, Entry>,
	substrings: Vec<SubstringAlias>,
}
impl AliasSnapshot {
	/// Builds the snapshot from aliases ordered most used first.
	///
	/// Client-scoped entries shadow global entries with the same key. The substring pass only
	/// sees the first `substring_max_aliases` keys of at least `substring_min_chars` characters.
	pub fn new<'a, I>(ranked: I, cfg: &Expansion) -> Self
	where
		I: IntoIterator<Item = &'a Alias>,
	{
		let mut snapshot = Self::default();

		for alias in ranked {
			snapshot.insert(alias);
		}

		let min_chars = cfg.substring_min_chars as usize;
		let mut substrings = Vec::new();

		for (rank, (key, entry)) in snapshot.ranked_entries().into_iter().enumerate() {
			if substrings.len() >= cfg.substring_max_aliases as usize {
				break;
			}

			let tight = key.chars().filter(|ch| !ch.is_whitespace()).collect::<String>();

			if tight.chars().count() < min_chars {
				continue;
			}

			substrings.push(SubstringAlias { key, tight, fragment: entry.fragment, rank });
		}

		substrings.sort_by(|a, b| {
			b.tight.chars().count().cmp(&a.tight.chars().count()).then_with(|| a.rank.cmp(&b.rank))
		});

		snapshot.substrings = substrings;

		snapshot
	}

	/// Adds an alias found by exact lookup. It joins the exact pass only.
	pub fn insert(&mut self, alias: &Alias) {
		let fragment = normalize(&alias.canonical_name);

		if alias.alias_key.is_empty() || fragment.is_empty() {
			return;
		}

		let order = self.exact.len();
		let scoped = !alias.is_global();

		match self.exact.get_mut(&alias.alias_key) {
			Some(existing) if scoped && !existing.scoped => {
				existing.fragment = fragment;
				existing.scoped = true;
			},
			Some(_) => {},
			None => {
				self.exact.insert(alias.alias_key.clone(), Entry { fragment, scoped, order });
			},
		}
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.exact.contains_key(key)
	}

	pub fn is_empty(&self) -> bool {
		self.exact.is_empty()
	}

	fn ranked_entries(&self) -> Vec<(String, Entry)> {
		let mut entries =
			self.exact.iter().map(|(key, entry)| (key.clone(), entry.clone())).collect::<Vec<_>>();

		entries.sort_by_key(|(_, entry)| entry.order);

		entries
	}
}

#[derive(Clone, Debug)]
struct Entry {
	fragment: String,
	scoped: bool,
	order: usize,
}

#[derive(Clone, Debug)]
struct SubstringAlias {
	key: String,
	tight: String,
	fragment: String,
	rank: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExpandedQuery {
	pub text: String,
	/// Alias keys that rewrote part of the query, in application order.
	pub applied: Vec<String>,
}
impl ExpandedQuery {
	pub fn changed(&self) -> bool {
		!self.applied.is_empty()
	}
}

#[derive(Debug)]
enum Piece {
	Text(String),
	Spliced(String),
}

pub fn expand(normalized_query: &str, snapshot: &AliasSnapshot) -> ExpandedQuery {
	let mut applied = Vec::new();
	let mut pieces: Vec<Piece> = Vec::new();

	for token in normalized_query.split_whitespace() {
		if let Some(entry) = snapshot.exact.get(token) {
			pieces.push(Piece::Spliced(entry.fragment.clone()));
			applied.push(token.to_string());

			continue;
		}

		match pieces.last_mut() {
			Some(Piece::Text(text)) => {
				text.push(' ');
				text.push_str(token);
			},
			_ => pieces.push(Piece::Text(token.to_string())),
		}
	}

	for alias in &snapshot.substrings {
		let mut next = Vec::with_capacity(pieces.len());
		let mut fired = false;

		for piece in pieces {
			match piece {
				Piece::Text(text) => fired |= splice(&text, alias, &mut next),
				spliced => next.push(spliced),
			}
		}

		if fired {
			applied.push(alias.key.clone());
		}

		pieces = next;
	}

	let text = pieces
		.iter()
		.map(|piece| match piece {
			Piece::Text(text) | Piece::Spliced(text) => text.as_str(),
		})
		.flat_map(str::split_whitespace)
		.collect::<Vec<_>>()
		.join(" ");

	ExpandedQuery { text, applied }
}

/// Splits `text` around every space-insensitive occurrence of the alias.
fn splice(text: &str, alias: &SubstringAlias, out: &mut Vec<Piece>) -> bool {
	// Byte range of each non-space character.
	let positions = text
		.char_indices()
		.filter(|(_, ch)| !ch.is_whitespace())
		.map(|(idx, ch)| (idx, idx + ch.len_utf8()))
		.collect::<Vec<_>>();
	let tight = text.chars().filter(|ch| !ch.is_whitespace()).collect::<Vec<_>>();
	let needle = alias.tight.chars().collect::<Vec<_>>();

	if needle.is_empty() || needle.len() > tight.len() {
		out.push(Piece::Text(text.to_string()));

		return false;
	}

	let mut fired = false;
	let mut cursor_byte = 0;
	let mut idx = 0;

	while idx + needle.len() <= tight.len() {
		if tight[idx..idx + needle.len()] != needle[..] {
			idx += 1;

			continue;
		}

		let start_byte = positions[idx].0;
		let end_byte = positions[idx + needle.len() - 1].1;

		push_text(out, &text[cursor_byte..start_byte]);
		out.push(Piece::Spliced(alias.fragment.clone()));

		fired = true;
		idx += needle.len();
		cursor_byte = end_byte;
	}

	push_text(out, &text[cursor_byte..]);

	fired
}

fn push_text(out: &mut Vec<Piece>, text: &str) {
	if !text.trim().is_empty() {
		out.push(Piece::Text(text.trim().to_string()));
	}
}
