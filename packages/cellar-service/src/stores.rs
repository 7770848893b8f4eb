use std::{path::Path, sync::Arc};

use time::OffsetDateTime;

use crate::{
	AliasStore, BoxFuture, CatalogStore, Error, MasterSheetStore, ProducerList, Result, Stores,
};
use cellar_config::Config;
use cellar_storage::{
	db::Db,
	memory::MemoryStore,
	models::{Alias, AliasUpsert, CatalogItem, ClientItemStat},
	queries::{self, ItemTable},
};

impl Stores {
	/// Opens the snapshot when one is given, otherwise the configured Postgres database.
	pub async fn open(cfg: &Config, snapshot: Option<&Path>) -> Result<Self> {
		if let Some(path) = snapshot {
			let store = MemoryStore::load(path)?;

			tracing::info!(path = %path.display(), "Opened snapshot store.");

			return Ok(Self::shared(Arc::new(store)));
		}

		let Some(postgres) = cfg.storage.postgres.as_ref() else {
			return Err(Error::InvalidInput {
				message: "A snapshot path or storage.postgres is required.".to_string(),
			});
		};
		let db = Db::connect(postgres).await?;

		db.ensure_schema().await?;

		tracing::info!("Opened Postgres store.");

		Ok(Self::shared(Arc::new(db)))
	}
}

impl CatalogStore for Db {
	fn find_by_text<'a>(
		&'a self,
		normalized_query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move {
			Ok(queries::find_items_by_text(self, ItemTable::Catalog, normalized_query, limit)
				.await?)
		})
	}

	fn get<'a>(&'a self, item_no: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>> {
		Box::pin(async move { Ok(queries::get_catalog_item(self, item_no).await?) })
	}

	fn stats_for<'a>(
		&'a self,
		client_code: &'a str,
		item_no: &'a str,
	) -> BoxFuture<'a, Result<Option<ClientItemStat>>> {
		Box::pin(async move { Ok(queries::client_item_stat(self, client_code, item_no).await?) })
	}
}

impl MasterSheetStore for Db {
	fn find_by_text<'a>(
		&'a self,
		normalized_query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move {
			Ok(queries::find_items_by_text(self, ItemTable::Master, normalized_query, limit).await?)
		})
	}
}

impl AliasStore for Db {
	fn lookup<'a>(
		&'a self,
		alias_key: &'a str,
		scope: &'a str,
	) -> BoxFuture<'a, Result<Option<Alias>>> {
		Box::pin(async move { Ok(queries::lookup_alias(self, alias_key, scope).await?) })
	}

	fn top_by_usage<'a>(&'a self, scope: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Alias>>> {
		Box::pin(async move { Ok(queries::top_aliases_by_usage(self, scope, limit).await?) })
	}

	fn upsert<'a>(
		&'a self,
		alias_key: &'a str,
		scope: &'a str,
		item_no: &'a str,
		item_name: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<AliasUpsert>> {
		Box::pin(async move {
			Ok(queries::upsert_alias(self, alias_key, scope, item_no, item_name, now).await?)
		})
	}
}

impl ProducerList for Db {
	fn all(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move { Ok(queries::list_producers(self).await?) })
	}
}

impl CatalogStore for MemoryStore {
	fn find_by_text<'a>(
		&'a self,
		normalized_query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move { Ok(self.find_items(normalized_query, limit as usize)) })
	}

	fn get<'a>(&'a self, item_no: &'a str) -> BoxFuture<'a, Result<Option<CatalogItem>>> {
		Box::pin(async move { Ok(self.get_item(item_no)) })
	}

	fn stats_for<'a>(
		&'a self,
		client_code: &'a str,
		item_no: &'a str,
	) -> BoxFuture<'a, Result<Option<ClientItemStat>>> {
		Box::pin(async move { Ok(self.client_item_stat(client_code, item_no)) })
	}
}

impl MasterSheetStore for MemoryStore {
	fn find_by_text<'a>(
		&'a self,
		normalized_query: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<CatalogItem>>> {
		Box::pin(async move { Ok(self.find_master_items(normalized_query, limit as usize)) })
	}
}

impl AliasStore for MemoryStore {
	fn lookup<'a>(
		&'a self,
		alias_key: &'a str,
		scope: &'a str,
	) -> BoxFuture<'a, Result<Option<Alias>>> {
		Box::pin(async move { Ok(self.lookup_alias(alias_key, scope)) })
	}

	fn top_by_usage<'a>(&'a self, scope: &'a str, limit: u32) -> BoxFuture<'a, Result<Vec<Alias>>> {
		Box::pin(async move { Ok(self.top_aliases_by_usage(scope, limit as usize)) })
	}

	fn upsert<'a>(
		&'a self,
		alias_key: &'a str,
		scope: &'a str,
		item_no: &'a str,
		item_name: &'a str,
		now: OffsetDateTime,
	) -> BoxFuture<'a, Result<AliasUpsert>> {
		Box::pin(async move { Ok(self.upsert_alias(alias_key, scope, item_no, item_name, now)?) })
	}
}

impl ProducerList for MemoryStore {
	fn all(&self) -> BoxFuture<'_, Result<Vec<String>>> {
		Box::pin(async move { Ok(self.producers()) })
	}
}
