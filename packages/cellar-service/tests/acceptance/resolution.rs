use std::sync::Arc;

use time::OffsetDateTime;

use cellar_config::Config;
use cellar_service::{
	AliasStore, BoxFuture, CellarService, Error, ResolutionMethod, ResolutionState, Result,
	Stores,
};
use cellar_storage::models::{Alias, AliasUpsert};

fn item_nos(result: &cellar_service::ResolutionResult) -> Vec<&str> {
	result.candidates().iter().map(|candidate| candidate.item_no.as_str()).collect()
}

#[tokio::test]
async fn full_region_name_outranks_the_shorter_sibling() {
	let (service, _) = super::service();
	let resolved = service
		.resolve_order_line_at("크루 와이너리 산타루치아 몬테레이", None, None, super::now())
		.await
		.expect("Resolution failed.");
	let candidates = resolved.result.candidates();

	assert_eq!(item_nos(&resolved.result), vec!["W100", "W101"]);
	assert!(candidates[0].score > candidates[1].score);
	assert!(candidates[0].breakdown.text.raw > candidates[1].breakdown.text.raw);
	assert_eq!(
		resolved.query.producer.as_ref().map(|producer| producer.name.as_str()),
		Some("크루 와이너리")
	);
}

#[tokio::test]
async fn unknown_product_needs_review_without_candidates() {
	let (service, _) = super::service();
	let resolved = service
		.resolve_order_line_at("존재하지않는와인", Some(2), Some("C01"), super::now())
		.await
		.expect("Resolution failed.");

	assert!(!resolved.result.resolved());
	assert_eq!(resolved.result.method(), ResolutionMethod::None);
	assert!(resolved.result.candidates().is_empty());
	assert_eq!(resolved.line.quantity, Some(2));
}

#[tokio::test]
async fn top_new_item_is_never_confirmed() {
	let (service, _) = super::service();
	let cfg = Config::default();
	let resolved = service
		.resolve_order_line_at("루체 2019", None, None, super::now())
		.await
		.expect("Resolution failed.");
	let top = &resolved.result.candidates()[0];

	assert_eq!(top.item_no, "M901");
	assert!(top.is_new_item);
	assert!(top.score >= cfg.resolution.confirm_threshold, "{top:?}");
	assert!(!resolved.result.resolved());
	assert_eq!(resolved.result.state(), ResolutionState::NeedsReview);
}

#[tokio::test]
async fn new_items_follow_existing_candidates() {
	let (service, _) = super::service();
	let resolved = service
		.resolve_order_line_at("샤를루 로제", None, None, super::now())
		.await
		.expect("Resolution failed.");
	let candidates = resolved.result.candidates();

	assert_eq!(item_nos(&resolved.result), vec!["W300", "M900"]);
	assert!(!candidates[0].is_new_item);
	assert!(candidates[1].is_new_item);
	assert!(candidates[1].score > candidates[0].score);
	assert!(!resolved.result.resolved());

	let first_new =
		candidates.iter().position(|candidate| candidate.is_new_item).unwrap_or(candidates.len());

	assert!(candidates[first_new..].iter().all(|candidate| candidate.is_new_item));
}

#[tokio::test]
async fn other_producers_are_filtered_out() {
	let (service, _) = super::service();
	let resolved = service
		.resolve_order_line_at("크루 와이너리 피노누아", None, None, super::now())
		.await
		.expect("Resolution failed.");

	assert_eq!(item_nos(&resolved.result), vec!["W100", "W101"]);
	assert!(!resolved.result.resolved());
}

#[tokio::test]
async fn shared_first_token_does_not_pick_one_producer() {
	let store = super::store_from(
		r#"{
			"items": [
				{ "item_no": "P1", "korean_name": "샤또 팔머 2015" },
				{ "item_no": "L1", "korean_name": "샤또 라투르 2015", "producer": "샤또 라투르" },
				{ "item_no": "G1", "korean_name": "샤또 마고 2015", "producer": "샤또 마고" }
			],
			"producers": ["샤또 라투르", "샤또 마고"]
		}"#,
	);
	let service = super::service_with(Config::default(), store);
	let resolved = service
		.resolve_order_line_at("샤또 팔머 2015", None, None, super::now())
		.await
		.expect("Resolution failed.");

	assert_eq!(
		resolved.query.producer.as_ref().map(|producer| producer.name.as_str()),
		Some("샤또")
	);
	assert_eq!(resolved.result.candidates()[0].item_no, "P1");
	assert_eq!(resolved.result.candidates()[0].breakdown.text.raw, 1.0);
}

#[tokio::test]
async fn purchase_history_lets_a_clear_leader_confirm() {
	let (service, _) = super::service();
	let resolved = service
		.resolve_order_line_at("메이오미 피노누아 2021", Some(6), Some("C01"), super::now())
		.await
		.expect("Resolution failed.");
	let chosen = resolved.result.chosen().expect("Expected a confirmed candidate.");

	assert!(resolved.result.resolved());
	assert_eq!(resolved.result.method(), ResolutionMethod::Scored);
	assert_eq!(chosen.item_no, "W200");
	assert_eq!(chosen.purchase_count, 12);
	assert!(chosen.breakdown.recency.raw > 0.8);
	assert_eq!(chosen.breakdown.vintage.raw, 1.0);
	assert_eq!(resolved.query.vintage, Some(2021));
}

#[tokio::test]
async fn blank_input_is_rejected() {
	let (service, _) = super::service();
	let err = service
		.resolve_order_line("   ", None, None)
		.await
		.expect_err("Expected blank input to fail.");

	assert!(matches!(err, Error::InvalidInput { .. }));
}

#[tokio::test]
async fn quantity_only_text_needs_review() {
	let (service, _) = super::service();
	let resolved =
		service.resolve_order_line("6병", None, None).await.expect("Resolution failed.");

	assert!(resolved.query.normalized.is_empty());
	assert!(!resolved.result.resolved());
	assert!(resolved.result.candidates().is_empty());
}

#[tokio::test]
async fn order_text_resolves_each_item_line() {
	let (service, _) = super::service();
	let text = "안녕하세요\n메이오미 피노누아 2021 6병\n존재하지않는와인 2";
	let lines = service
		.resolve_order_text(text, Some("C01"))
		.await
		.expect("Resolution failed.");

	assert_eq!(lines.len(), 2);
	assert_eq!(lines[0].line.quantity, Some(6));
	assert_eq!(lines[0].result.chosen().map(|chosen| chosen.item_no.as_str()), Some("W200"));
	assert_eq!(lines[1].line.quantity, Some(2));
	assert!(!lines[1].result.resolved());
}

struct FailingAliases;
impl AliasStore for FailingAliases {
	fn lookup<'a>(&'a self, _: &'a str, _: &'a str) -> BoxFuture<'a, Result<Option<Alias>>> {
		Box::pin(async { Err(unavailable()) })
	}

	fn top_by_usage<'a>(&'a self, _: &'a str, _: u32) -> BoxFuture<'a, Result<Vec<Alias>>> {
		Box::pin(async { Err(unavailable()) })
	}

	fn upsert<'a>(
		&'a self,
		_: &'a str,
		_: &'a str,
		_: &'a str,
		_: &'a str,
		_: OffsetDateTime,
	) -> BoxFuture<'a, Result<AliasUpsert>> {
		Box::pin(async { Err(unavailable()) })
	}
}

fn unavailable() -> Error {
	Error::StoreUnavailable { message: "alias store is offline".to_string() }
}

#[tokio::test]
async fn store_failures_propagate_without_partial_results() {
	let store = super::catalog_store();
	let stores = Stores::new(store.clone(), store.clone(), Arc::new(FailingAliases), store);
	let service = CellarService::new(Config::default(), stores);
	let err = service
		.resolve_order_line("메이오미 피노누아", None, None)
		.await
		.expect_err("Expected the alias store failure to surface.");

	assert!(matches!(err, Error::StoreUnavailable { .. }));
}
