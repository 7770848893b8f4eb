pub mod candidates;
pub mod decision;
pub mod expand;
pub mod learn;
pub mod resolve;
pub mod scoring;

mod error;
mod stores;

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;

pub use decision::{
	Candidate, ConfirmedCandidate, ResolutionMethod, ResolutionResult, ResolutionState,
};
pub use error::{Error, Result};
pub use expand::{AliasSnapshot, ExpandedQuery};
pub use learn::{LearnRequest, LearningResult};
pub use resolve::{ParsedQuery, ResolvedLine};
pub use scoring::{ScoreBreakdown, Signal};

use cellar_config::Config;
use cellar_storage::models::{Alias, AliasUpsert, CatalogItem, ClientItemStat};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Items the business already sells, with per-client purchase history.
pub trait CatalogStore
where
	Self: Send + Sync,
{
	fn find_by_text<'a>(
		&'a self,
		normalized_query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>>;

	fn get<'a>(&'a self, item_no: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>>;

	fn stats_for<'a>(
		&'a self,
		client_code: &'a str,
		item_no: &'a str,
	) -> BoxFuture<'a, Result<Option<ClientItemStat>>>;
}

/// Supplier master sheet; the source of new-item suggestions.
pub trait MasterSheetStore
where
	Self: Send + Sync,
{
	fn find_by_text<'a>(
		&'a self,
		normalized_query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>>;
}

pub trait AliasStore
where
	Self: Send + Sync,
{
	/// Alias stored under `scope`, falling back to the global alias.
	fn lookup<'a>(
		&'a self,
		alias_key: &'a str,
		scope: &'a str,
	) -> BoxFuture<'a, Result<Option<Alias>>>;

	/// Aliases visible to `scope` (its own and global), most used first.
	fn top_by_usage<'a>(&'a self, scope: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Alias>>>;

	fn upsert<'a>(
		&'a self,
		alias_key: &'a str,
		scope: &'a str,
		item_no: &'a str,
		item_name: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<AliasUpsert>>;
}

pub trait ProducerList
where
	Self: Send + Sync,
{
	fn all(&self) -> BoxFuture<'_, Result<Vec<String>>>;
}

#[derive(Clone)]
pub struct Stores {
	pub catalog: Arc<dyn CatalogStore>,
	pub master: Arc<dyn MasterSheetStore>,
	pub aliases: Arc<dyn AliasStore>,
	pub producers: Arc<dyn ProducerList>,
}
impl Stores {
	pub fn new(
		catalog: Arc<dyn CatalogStore>,
		master: Arc<dyn MasterSheetStore>,
		aliases: Arc<dyn AliasStore>,
		producers: Arc<dyn ProducerList>,
	) -> Self {
		Self { catalog, master, aliases, producers }
	}

	/// Uses one backend for all four collaborators.
	pub fn shared<T>(store: Arc<T>) -> Self
	where
		T: CatalogStore + MasterSheetStore + AliasStore + ProducerList + 'static,
	{
		Self {
			catalog: store.clone(),
			master: store.clone(),
			aliases: store.clone(),
			producers: store,
		}
	}
}

pub struct CellarService {
	pub cfg: Config,
	pub stores: Stores,
}
impl CellarService {
	pub fn new(cfg: Config, stores: Stores) -> Self {
		Self { cfg, stores }
	}
}
