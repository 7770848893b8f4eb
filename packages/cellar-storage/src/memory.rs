//! Snapshot-backed store for tests, evaluation runs, and offline resolution.

use std::{
	collections::{BTreeMap, BTreeSet, HashMap},
	fs,
	path::Path,
	sync::{Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	Error, Result,
	models::{Alias, AliasUpsert, CatalogItem, ClientItemStat, GLOBAL_SCOPE},
};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Snapshot {
	pub items: Vec<CatalogItem>,
	pub master: Vec<CatalogItem>,
	pub stats: Vec<ClientItemStat>,
	pub aliases: Vec<Alias>,
	pub producers: Vec<String>,
}

struct IndexedItem {
	item: CatalogItem,
	key: String,
}

pub struct MemoryStore {
	items: BTreeMap<String, IndexedItem>,
	master: Vec<IndexedItem>,
	stats: HashMap<(String, String), ClientItemStat>,
	aliases: Mutex<HashMap<(String, String), Alias>>,
	producers: Vec<String>,
}
impl MemoryStore {
	pub fn load(path: &Path) -> Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| Error::ReadSnapshot { path: path.to_path_buf(), source: err })?;
		let snapshot: Snapshot = serde_json::from_str(&raw)
			.map_err(|err| Error::ParseSnapshot { path: path.to_path_buf(), source: err })?;

		Self::from_snapshot(snapshot)
	}

	pub fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
		let mut items = BTreeMap::new();

		for item in snapshot.items {
			if item.item_no.trim().is_empty() {
				return Err(Error::InvalidArgument(
					"items[].item_no must be non-empty.".to_string(),
				));
			}

			items.insert(item.item_no.clone(), IndexedItem { key: item.search_key(), item });
		}

		let master = snapshot
			.master
			.into_iter()
			.map(|item| IndexedItem { key: item.search_key(), item })
			.collect();
		let stats = snapshot
			.stats
			.into_iter()
			.map(|stat| ((stat.client_code.clone(), stat.item_no.clone()), stat))
			.collect();
		let aliases = snapshot
			.aliases
			.into_iter()
			.map(|alias| ((alias.alias_key.clone(), alias.client_scope.clone()), alias))
			.collect();
		let producers = snapshot
			.producers
			.into_iter()
			.chain(items.values().filter_map(|indexed| indexed.item.producer.clone()))
			.map(|name| name.trim().to_string())
			.filter(|name| !name.is_empty())
			.collect::<BTreeSet<_>>()
			.into_iter()
			.collect();

		tracing::debug!(items = items.len(), "Memory store loaded.");

		Ok(Self { items, master, stats, aliases: Mutex::new(aliases), producers })
	}

	pub fn find_items(&self, normalized_query: &str, limit: usize) -> Vec<CatalogItem> {
		search(self.items.values(), normalized_query, limit)
	}

	pub fn find_master_items(&self, normalized_query: &str, limit: usize) -> Vec<CatalogItem> {
		search(self.master.iter(), normalized_query, limit)
	}

	pub fn get_item(&self, item_no: &str) -> Option<CatalogItem> {
		self.items.get(item_no).map(|indexed| indexed.item.clone())
	}

	pub fn client_item_stat(&self, client_code: &str, item_no: &str) -> Option<ClientItemStat> {
		self.stats.get(&(client_code.to_string(), item_no.to_string())).cloned()
	}

	pub fn lookup_alias(&self, alias_key: &str, scope: &str) -> Option<Alias> {
		let aliases = self.aliases();

		aliases
			.get(&(alias_key.to_string(), scope.to_string()))
			.or_else(|| aliases.get(&(alias_key.to_string(), GLOBAL_SCOPE.to_string())))
			.cloned()
	}

	pub fn top_aliases_by_usage(&self, scope: &str, limit: usize) -> Vec<Alias> {
		let mut aliases = self
			.aliases()
			.values()
			.filter(|alias| alias.is_global() || alias.client_scope == scope)
			.cloned()
			.collect::<Vec<_>>();

		aliases.sort_by(|a, b| {
			b.usage_count
				.cmp(&a.usage_count)
				.then_with(|| b.last_used_at.cmp(&a.last_used_at))
				.then_with(|| a.alias_key.cmp(&b.alias_key))
		});
		aliases.truncate(limit);

		aliases
	}

	/// Same contract as the Postgres upsert; the lock spans the read-modify-write.
	pub fn upsert_alias(
		&self,
		alias_key: &str,
		scope: &str,
		item_no: &str,
		item_name: &str,
		now: OffsetDateTime,
	) -> Result<AliasUpsert> {
		if alias_key.is_empty() {
			return Err(Error::InvalidArgument("alias_key must be non-empty.".to_string()));
		}

		let mut aliases = self.aliases();
		let entry = aliases.entry((alias_key.to_string(), scope.to_string()));
		let mut previous_item_no = None;
		let alias = entry
			.and_modify(|alias| {
				previous_item_no = Some(alias.canonical_item_no.clone());
				alias.canonical_item_no = item_no.to_string();
				alias.canonical_name = item_name.to_string();
				alias.usage_count += 1;
				alias.last_used_at = now;
			})
			.or_insert_with(|| Alias {
				alias_key: alias_key.to_string(),
				client_scope: scope.to_string(),
				canonical_item_no: item_no.to_string(),
				canonical_name: item_name.to_string(),
				usage_count: 1,
				last_used_at: now,
				created_at: now,
			})
			.clone();

		Ok(AliasUpsert { alias, previous_item_no })
	}

	pub fn producers(&self) -> Vec<String> {
		self.producers.clone()
	}

	/// Current contents, including learned aliases, in snapshot form.
	pub fn snapshot(&self) -> Snapshot {
		let mut aliases = self.aliases().values().cloned().collect::<Vec<_>>();

		aliases.sort_by(|a, b| {
			(a.alias_key.as_str(), a.client_scope.as_str())
				.cmp(&(b.alias_key.as_str(), b.client_scope.as_str()))
		});

		let mut stats = self.stats.values().cloned().collect::<Vec<_>>();

		stats.sort_by(|a, b| (&a.client_code, &a.item_no).cmp(&(&b.client_code, &b.item_no)));

		Snapshot {
			items: self.items.values().map(|indexed| indexed.item.clone()).collect(),
			master: self.master.iter().map(|indexed| indexed.item.clone()).collect(),
			stats,
			aliases,
			producers: self.producers.clone(),
		}
	}

	fn aliases(&self) -> MutexGuard<'_, HashMap<(String, String), Alias>> {
		self.aliases.lock().unwrap_or_else(|err| err.into_inner())
	}
}

fn search<'a, I>(items: I, normalized_query: &str, limit: usize) -> Vec<CatalogItem>
where
	I: Iterator<Item = &'a IndexedItem>,
{
	let query_key = cellar_domain::search_key(normalized_query);

	if query_key.is_empty() {
		return Vec::new();
	}

	let tokens = cellar_domain::tokenize(&cellar_domain::normalize(normalized_query))
		.into_iter()
		.filter(|token| token.chars().count() >= 2)
		.collect::<BTreeSet<_>>();
	let mut hits = items
		.filter_map(|indexed| {
			let shared = tokens.iter().filter(|token| indexed.key.contains(token.as_str())).count();

			if shared == 0 && !query_key.contains(indexed.key.as_str()) {
				return None;
			}

			Some((shared, indexed))
		})
		.collect::<Vec<_>>();

	hits.sort_by(|(a_shared, a), (b_shared, b)| {
		b_shared.cmp(a_shared).then_with(|| a.item.item_no.cmp(&b.item.item_no))
	});

	hits.into_iter().take(limit).map(|(_, indexed)| indexed.item.clone()).collect()
}
