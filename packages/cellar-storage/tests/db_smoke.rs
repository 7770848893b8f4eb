use time::macros::{date, datetime};

use cellar_config::Postgres;
use cellar_storage::{
	db::Db,
	models::{CatalogItem, ClientItemStat, GLOBAL_SCOPE},
	queries::{self, ItemTable},
};
use cellar_testkit::TestDatabase;

async fn bootstrap(test_db: &TestDatabase) -> Db {
	let cfg = Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

fn crew_item() -> CatalogItem {
	CatalogItem {
		item_no: "W200".to_string(),
		korean_name: "크루 와이너리 피노누아 산타 루치아 하이랜즈 몬테레이".to_string(),
		english_name: "Crew Winery Pinot Noir Santa Lucia Highlands".to_string(),
		producer: Some("크루 와이너리".to_string()),
		vintage: Some(2021),
		supply_price: Some(42_000.0),
	}
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CELLAR_PG_DSN to run."]
async fn schema_bootstrap_is_repeatable() {
	let Some(base_dsn) = cellar_testkit::env_dsn() else {
		eprintln!("Skipping schema_bootstrap_is_repeatable; set CELLAR_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'item_aliases'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CELLAR_PG_DSN to run."]
async fn catalog_search_and_stats() {
	let Some(base_dsn) = cellar_testkit::env_dsn() else {
		eprintln!("Skipping catalog_search_and_stats; set CELLAR_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;

	queries::upsert_item(&db, ItemTable::Catalog, &crew_item())
		.await
		.expect("Insert must succeed.");
	queries::upsert_client_item_stat(
		&db,
		&ClientItemStat {
			client_code: "C01".to_string(),
			item_no: "W200".to_string(),
			purchase_count: 3,
			last_purchase_date: Some(date!(2026 - 09 - 20)),
			avg_price: None,
		},
	)
	.await
	.expect("Stat insert must succeed.");

	let hits = queries::find_items_by_text(&db, ItemTable::Catalog, "크루 와이너리 산타루치아", 10)
		.await
		.expect("Search must succeed.");

	assert_eq!(hits.len(), 1);
	assert_eq!(hits[0], crew_item());

	let master = queries::find_items_by_text(&db, ItemTable::Master, "크루 와이너리", 10)
		.await
		.expect("Search must succeed.");

	assert!(master.is_empty());

	let stat = queries::client_item_stat(&db, "C01", "W200")
		.await
		.expect("Stat query must succeed.")
		.expect("Expected stat row.");

	assert_eq!(stat.purchase_count, 3);
	assert_eq!(
		queries::list_producers(&db).await.expect("Producers must load."),
		vec!["크루 와이너리"]
	);

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set CELLAR_PG_DSN to run."]
async fn alias_upsert_counts_every_write() {
	let Some(base_dsn) = cellar_testkit::env_dsn() else {
		eprintln!("Skipping alias_upsert_counts_every_write; set CELLAR_PG_DSN to run this test.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let db = bootstrap(&test_db).await;
	let now = datetime!(2026-10-01 09:00:00 UTC);
	let first = queries::upsert_alias(&db, "2421505", GLOBAL_SCOPE, "W200", "크루", now)
		.await
		.expect("Upsert must succeed.");

	assert_eq!(first.alias.usage_count, 1);
	assert!(first.previous_item_no.is_none());

	let second = queries::upsert_alias(&db, "2421505", GLOBAL_SCOPE, "W300", "오퍼스원", now)
		.await
		.expect("Upsert must succeed.");

	assert_eq!(second.alias.usage_count, 2);
	assert_eq!(second.alias.canonical_item_no, "W300");
	assert_eq!(second.previous_item_no.as_deref(), Some("W200"));

	let scoped = queries::lookup_alias(&db, "2421505", "C01")
		.await
		.expect("Lookup must succeed.")
		.expect("Expected global alias.");

	assert_eq!(scoped.canonical_item_no, "W300");

	db.pool.close().await;
	test_db.cleanup().await.expect("Failed to clean up test database.");
}
