use std::sync::Arc;

use time::Duration;

use cellar_config::Config;
use cellar_service::{Error, LearnRequest, ResolutionMethod};
use cellar_storage::models::GLOBAL_SCOPE;

fn request(raw_query: &str, item_no: &str, client_code: Option<&str>) -> LearnRequest {
	LearnRequest {
		raw_query: raw_query.to_string(),
		selected_item_no: item_no.to_string(),
		client_code: client_code.map(str::to_string),
		..LearnRequest::default()
	}
}

#[tokio::test]
async fn learned_code_resolves_on_first_lookup() {
	let (service, _) = super::service();
	let learned = service
		.learn_at(request("2421505", "W400", None), super::now())
		.await
		.expect("Learning failed.");

	assert!(learned.created);
	assert_eq!(learned.alias.canonical_name, "오퍼스원");

	let resolved = service
		.resolve_order_line_at("2421505", Some(1), None, super::now())
		.await
		.expect("Resolution failed.");

	assert!(resolved.result.resolved());
	assert_eq!(resolved.result.method(), ResolutionMethod::Alias);
	assert_eq!(resolved.result.chosen().map(|chosen| chosen.item_no.as_str()), Some("W400"));
	assert_eq!(resolved.result.candidates().len(), 1);
	assert_eq!(resolved.result.candidates()[0].breakdown.alias.raw, 1.0);
}

#[tokio::test]
async fn alias_key_ignores_quantities() {
	let (service, store) = super::service();
	let learned = service
		.learn_at(request("샤를루 6병", "W300", Some("C01")), super::now())
		.await
		.expect("Learning failed.");

	assert_eq!(learned.alias.alias_key, "샤를루");
	assert_eq!(learned.alias.client_scope, "C01");
	assert!(store.lookup_alias("샤를루", "C01").is_some());

	let resolved = service
		.resolve_order_line_at("샤를루", Some(6), Some("C01"), super::now())
		.await
		.expect("Resolution failed.");

	assert_eq!(resolved.result.method(), ResolutionMethod::Alias);
	assert_eq!(resolved.result.chosen().map(|chosen| chosen.item_no.as_str()), Some("W300"));
}

#[tokio::test]
async fn alias_learned_from_a_raw_line_serves_order_text() {
	let (service, _) = super::service();
	let learned = service
		.learn_at(request("메이오미 6", "W200", Some("C01")), super::now())
		.await
		.expect("Learning failed.");

	assert_eq!(learned.alias.alias_key, "메이오미");

	let lines = service
		.resolve_order_text("메이오미 6", Some("C01"))
		.await
		.expect("Resolution failed.");

	assert_eq!(lines.len(), 1);
	assert_eq!(lines[0].line.quantity, Some(6));
	assert_eq!(lines[0].result.method(), ResolutionMethod::Alias);
	assert_eq!(lines[0].result.chosen().map(|chosen| chosen.item_no.as_str()), Some("W200"));

	let single = service
		.resolve_order_line_at("메이오미 6", None, Some("C01"), super::now())
		.await
		.expect("Resolution failed.");

	assert_eq!(single.result.method(), ResolutionMethod::Alias);
}

#[tokio::test]
async fn repeated_learning_counts_every_call() {
	let (service, _) = super::service();
	let mut last = None;

	for idx in 0..3 {
		let learned = service
			.learn_at(request("메이오미", "W200", None), super::now() + Duration::minutes(idx))
			.await
			.expect("Learning failed.");

		assert_eq!(learned.created, idx == 0);
		assert!(!learned.canonical_changed);

		last = Some(learned);
	}

	let alias = last.expect("Expected a learning result.").alias;

	assert_eq!(alias.usage_count, 3);
	assert_eq!(alias.canonical_item_no, "W200");
	assert_eq!(alias.created_at, super::now());
	assert_eq!(alias.last_used_at, super::now() + Duration::minutes(2));
}

#[tokio::test]
async fn later_selection_overwrites_canonical() {
	let (service, _) = super::service();

	service.learn_at(request("피노", "W200", None), super::now()).await.expect("Learning failed.");

	let learned = service
		.learn_at(request("피노", "W101", None), super::now())
		.await
		.expect("Learning failed.");

	assert!(learned.canonical_changed);
	assert_eq!(learned.alias.canonical_item_no, "W101");
	assert_eq!(learned.alias.usage_count, 2);
}

#[tokio::test]
async fn concurrent_learning_loses_no_update() {
	let (service, store) = super::service();
	let service = Arc::new(service);
	let mut handles = Vec::new();

	for _ in 0..16 {
		let service = service.clone();

		handles.push(tokio::spawn(async move {
			service.learn(request("오퍼스", "W400", None)).await.map(|learned| learned.created)
		}));
	}

	let mut created = 0;

	for handle in handles {
		if handle.await.expect("Task panicked.").expect("Learning failed.") {
			created += 1;
		}
	}

	let alias = store.lookup_alias("오퍼스", GLOBAL_SCOPE).expect("Expected the alias.");

	assert_eq!(created, 1);
	assert_eq!(alias.usage_count, 16);
}

#[tokio::test]
async fn client_aliases_do_not_leak_to_other_clients() {
	let (service, _) = super::service();

	service
		.learn_at(request("오퍼스", "W400", Some("C01")), super::now())
		.await
		.expect("Learning failed.");

	let own = service
		.resolve_order_line_at("오퍼스", None, Some("C01"), super::now())
		.await
		.expect("Resolution failed.");
	let other = service
		.resolve_order_line_at("오퍼스", None, Some("C02"), super::now())
		.await
		.expect("Resolution failed.");

	assert_eq!(own.result.method(), ResolutionMethod::Alias);
	assert_ne!(other.result.method(), ResolutionMethod::Alias);
	assert!(other.query.applied_aliases.is_empty());
}

#[tokio::test]
async fn unscoped_learning_stores_global_aliases() {
	let store = super::catalog_store();
	let mut cfg = Config::default();

	cfg.learning.client_scoped = false;

	let service = super::service_with(cfg, store);
	let learned = service
		.learn_at(request("오퍼스", "W400", Some("C01")), super::now())
		.await
		.expect("Learning failed.");

	assert_eq!(learned.alias.client_scope, GLOBAL_SCOPE);
}

#[tokio::test]
async fn learned_fragment_expands_later_queries() {
	let (service, _) = super::service();

	service
		.learn_at(request("크루산타", "W100", None), super::now())
		.await
		.expect("Learning failed.");

	let resolved = service
		.resolve_order_line_at("크루산타 2019", None, None, super::now())
		.await
		.expect("Resolution failed.");

	assert_eq!(resolved.query.applied_aliases, vec!["크루산타"]);
	assert!(resolved.query.expanded.contains("산타 루치아 하이랜즈"));
	assert_eq!(resolved.result.candidates()[0].item_no, "W100");
}

#[tokio::test]
async fn missing_alias_target_falls_back_to_scoring() {
	let (service, _) = super::service();
	let mut req = request("루체", "M901", None);

	req.selected_item_name = Some("루체".to_string());

	service.learn_at(req, super::now()).await.expect("Learning failed.");

	let resolved = service
		.resolve_order_line_at("루체", None, None, super::now())
		.await
		.expect("Resolution failed.");

	assert!(!resolved.result.resolved());
	assert!(resolved.result.candidates().iter().all(|candidate| candidate.is_new_item));
}

#[tokio::test]
async fn invalid_learning_requests_are_rejected() {
	let (service, _) = super::service();
	let blank = service.learn(request("  ", "W100", None)).await;
	let quantity_only = service.learn(request("6병", "W100", None)).await;
	let unknown_item = service.learn(request("뭔가", "X999", None)).await;

	assert!(matches!(blank, Err(Error::InvalidInput { .. })));
	assert!(matches!(quantity_only, Err(Error::InvalidInput { .. })));
	assert!(matches!(unknown_item, Err(Error::InvalidInput { .. })));

	let mut cfg = Config::default();

	cfg.learning.require_client_code = true;

	let strict = super::service_with(cfg, super::catalog_store());
	let missing_client = strict.learn(request("오퍼스", "W400", None)).await;

	assert!(matches!(missing_client, Err(Error::InvalidInput { .. })));
}
