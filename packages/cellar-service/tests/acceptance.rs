mod acceptance {
	mod learning;
	mod resolution;

	use std::sync::Arc;

	use time::{OffsetDateTime, macros::datetime};

	use cellar_config::Config;
	use cellar_service::{CellarService, Stores};
	use cellar_storage::memory::{MemoryStore, Snapshot};

	const CATALOG_JSON: &str = r#"{
		"items": [
			{ "item_no": "W100", "korean_name": "크루 와이너리 피노누아 산타 루치아 하이랜즈 몬테레이", "producer": "크루 와이너리" },
			{ "item_no": "W101", "korean_name": "크루 와이너리 피노누아 몬테레이", "producer": "크루 와이너리" },
			{ "item_no": "W200", "korean_name": "메이오미 피노누아", "english_name": "Meiomi Pinot Noir", "producer": "메이오미", "vintage": 2021 },
			{ "item_no": "W300", "korean_name": "샤를루 브뤼 리저브", "producer": "샤를루" },
			{ "item_no": "W400", "korean_name": "오퍼스원", "english_name": "Opus One", "producer": "오퍼스원", "vintage": 2018 }
		],
		"master": [
			{ "item_no": "M900", "korean_name": "샤를루 로제 브뤼", "producer": "샤를루" },
			{ "item_no": "M901", "korean_name": "루체", "producer": "루체", "vintage": 2019 },
			{ "item_no": "W300", "korean_name": "샤를루 브뤼 리저브", "producer": "샤를루" }
		],
		"stats": [
			{ "client_code": "C01", "item_no": "W200", "purchase_count": 12, "last_purchase_date": "2026-10-10" }
		],
		"producers": ["루체"]
	}"#;

	pub fn now() -> OffsetDateTime {
		datetime!(2026-10-14 09:00:00 UTC)
	}

	pub fn store_from(json: &str) -> Arc<MemoryStore> {
		let snapshot: Snapshot = serde_json::from_str(json).expect("Fixture snapshot must parse.");

		Arc::new(MemoryStore::from_snapshot(snapshot).expect("Fixture snapshot must load."))
	}

	pub fn catalog_store() -> Arc<MemoryStore> {
		store_from(CATALOG_JSON)
	}

	pub fn service_with(cfg: Config, store: Arc<MemoryStore>) -> CellarService {
		CellarService::new(cfg, Stores::shared(store))
	}

	pub fn service() -> (CellarService, Arc<MemoryStore>) {
		let store = catalog_store();

		(service_with(Config::default(), store.clone()), store)
	}
}
