use time::OffsetDateTime;

use crate::{
	Error, Result,
	db::Db,
	models::{Alias, AliasUpsert, CatalogItem, ClientItemStat},
};

/// Table holding a searchable item list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemTable {
	Catalog,
	Master,
}
impl ItemTable {
	fn name(self) -> &'static str {
		match self {
			Self::Catalog => "catalog_items",
			Self::Master => "master_items",
		}
	}
}

/// Items whose search key shares a token with the query or is contained in it, best covered
/// first.
pub async fn find_items_by_text(
	db: &Db,
	table: ItemTable,
	normalized_query: &str,
	limit: u32,
) -> Result<Vec<CatalogItem>> {
	let query_key = cellar_domain::search_key(normalized_query);

	if query_key.is_empty() {
		return Ok(Vec::new());
	}

	let patterns = token_patterns(normalized_query);
	let sql = format!(
		"\
SELECT item_no, korean_name, english_name, producer, vintage, supply_price
FROM {table}
WHERE search_key LIKE ANY($1)
	OR strpos($2, search_key) > 0
ORDER BY
	(SELECT count(*) FROM unnest($1::text[]) AS p(pattern) WHERE search_key LIKE p.pattern) DESC,
	item_no ASC
LIMIT $3",
		table = table.name(),
	);
	let items = sqlx::query_as::<_, CatalogItem>(&sql)
		.bind(&patterns)
		.bind(query_key.as_str())
		.bind(i64::from(limit))
		.fetch_all(&db.pool)
		.await?;

	Ok(items)
}

pub async fn get_catalog_item(db: &Db, item_no: &str) -> Result<Option<CatalogItem>> {
	let item = sqlx::query_as::<_, CatalogItem>(
		"\
SELECT item_no, korean_name, english_name, producer, vintage, supply_price
FROM catalog_items
WHERE item_no = $1",
	)
	.bind(item_no)
	.fetch_optional(&db.pool)
	.await?;

	Ok(item)
}

pub async fn upsert_item(db: &Db, table: ItemTable, item: &CatalogItem) -> Result<()> {
	if item.item_no.trim().is_empty() {
		return Err(Error::InvalidArgument("item_no must be non-empty.".to_string()));
	}

	let sql = format!(
		"\
INSERT INTO {table} (
	item_no,
	korean_name,
	english_name,
	producer,
	vintage,
	supply_price,
	search_key
)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT (item_no) DO UPDATE
SET
	korean_name = EXCLUDED.korean_name,
	english_name = EXCLUDED.english_name,
	producer = EXCLUDED.producer,
	vintage = EXCLUDED.vintage,
	supply_price = EXCLUDED.supply_price,
	search_key = EXCLUDED.search_key",
		table = table.name(),
	);

	sqlx::query(&sql)
		.bind(item.item_no.as_str())
		.bind(item.korean_name.as_str())
		.bind(item.english_name.as_str())
		.bind(item.producer.as_deref())
		.bind(item.vintage)
		.bind(item.supply_price)
		.bind(item.search_key())
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn client_item_stat(
	db: &Db,
	client_code: &str,
	item_no: &str,
) -> Result<Option<ClientItemStat>> {
	let stat = sqlx::query_as::<_, ClientItemStat>(
		"\
SELECT client_code, item_no, purchase_count, last_purchase_date, avg_price
FROM client_item_stats
WHERE client_code = $1 AND item_no = $2",
	)
	.bind(client_code)
	.bind(item_no)
	.fetch_optional(&db.pool)
	.await?;

	Ok(stat)
}

pub async fn upsert_client_item_stat(db: &Db, stat: &ClientItemStat) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO client_item_stats (client_code, item_no, purchase_count, last_purchase_date, avg_price)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (client_code, item_no) DO UPDATE
SET
	purchase_count = EXCLUDED.purchase_count,
	last_purchase_date = EXCLUDED.last_purchase_date,
	avg_price = EXCLUDED.avg_price",
	)
	.bind(stat.client_code.as_str())
	.bind(stat.item_no.as_str())
	.bind(stat.purchase_count)
	.bind(stat.last_purchase_date)
	.bind(stat.avg_price)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Client-scoped alias first, then the global one.
pub async fn lookup_alias(db: &Db, alias_key: &str, scope: &str) -> Result<Option<Alias>> {
	let alias = sqlx::query_as::<_, Alias>(
		"\
SELECT alias_key, client_scope, canonical_item_no, canonical_name, usage_count, last_used_at, created_at
FROM item_aliases
WHERE alias_key = $1 AND client_scope IN ($2, '')
ORDER BY (client_scope = '') ASC
LIMIT 1",
	)
	.bind(alias_key)
	.bind(scope)
	.fetch_optional(&db.pool)
	.await?;

	Ok(alias)
}

pub async fn top_aliases_by_usage(db: &Db, scope: &str, limit: u32) -> Result<Vec<Alias>> {
	let aliases = sqlx::query_as::<_, Alias>(
		"\
SELECT alias_key, client_scope, canonical_item_no, canonical_name, usage_count, last_used_at, created_at
FROM item_aliases
WHERE client_scope IN ($1, '')
ORDER BY usage_count DESC, last_used_at DESC, alias_key ASC
LIMIT $2",
	)
	.bind(scope)
	.bind(i64::from(limit))
	.fetch_all(&db.pool)
	.await?;

	Ok(aliases)
}

/// Creates the alias or bumps its usage count, taking the latest canonical item.
///
/// The increment happens inside the conflict clause, so concurrent writers of one key never
/// lose a count.
pub async fn upsert_alias(
	db: &Db,
	alias_key: &str,
	scope: &str,
	item_no: &str,
	item_name: &str,
	now: OffsetDateTime,
) -> Result<AliasUpsert> {
	if alias_key.is_empty() {
		return Err(Error::InvalidArgument("alias_key must be non-empty.".to_string()));
	}

	let upsert = sqlx::query_as::<_, AliasUpsert>(
		"\
WITH previous AS (
	SELECT canonical_item_no
	FROM item_aliases
	WHERE alias_key = $1 AND client_scope = $2
)
INSERT INTO item_aliases (
	alias_key,
	client_scope,
	canonical_item_no,
	canonical_name,
	usage_count,
	last_used_at,
	created_at
)
VALUES ($1, $2, $3, $4, 1, $5, $5)
ON CONFLICT (alias_key, client_scope) DO UPDATE
SET
	canonical_item_no = EXCLUDED.canonical_item_no,
	canonical_name = EXCLUDED.canonical_name,
	usage_count = item_aliases.usage_count + 1,
	last_used_at = EXCLUDED.last_used_at
RETURNING
	alias_key,
	client_scope,
	canonical_item_no,
	canonical_name,
	usage_count,
	last_used_at,
	created_at,
	(SELECT canonical_item_no FROM previous) AS previous_item_no",
	)
	.bind(alias_key)
	.bind(scope)
	.bind(item_no)
	.bind(item_name)
	.bind(now)
	.fetch_one(&db.pool)
	.await?;

	Ok(upsert)
}

/// Registered producers plus every producer named on a catalog item.
pub async fn list_producers(db: &Db) -> Result<Vec<String>> {
	let names = sqlx::query_scalar::<_, String>(
		"\
SELECT name FROM producers
UNION
SELECT DISTINCT producer FROM catalog_items WHERE producer IS NOT NULL AND producer <> ''
ORDER BY 1",
	)
	.fetch_all(&db.pool)
	.await?;

	Ok(names)
}

pub async fn insert_producer(db: &Db, name: &str) -> Result<()> {
	sqlx::query("INSERT INTO producers (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
		.bind(name.trim())
		.execute(&db.pool)
		.await?;

	Ok(())
}

fn token_patterns(normalized_query: &str) -> Vec<String> {
	let mut patterns = cellar_domain::tokenize(&cellar_domain::normalize(normalized_query))
		.into_iter()
		.filter(|token| token.chars().count() >= 2)
		.map(|token| format!("%{}%", escape_like(&token)))
		.collect::<Vec<_>>();

	patterns.sort();
	patterns.dedup();

	patterns
}

fn escape_like(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
