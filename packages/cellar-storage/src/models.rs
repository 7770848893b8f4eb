use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

/// Scope value stored for aliases that apply to every client.
pub const GLOBAL_SCOPE: &str = "";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogItem {
	pub item_no: String,
	pub korean_name: String,
	#[serde(default)]
	pub english_name: String,
	#[serde(default)]
	pub producer: Option<String>,
	#[serde(default)]
	pub vintage: Option<i32>,
	#[serde(default)]
	pub supply_price: Option<f64>,
}
impl CatalogItem {
	pub fn names(&self) -> Vec<&str> {
		[self.korean_name.as_str(), self.english_name.as_str()]
			.into_iter()
			.filter(|name| !name.trim().is_empty())
			.collect()
	}

	/// Korean name when present, otherwise the English one.
	pub fn display_name(&self) -> &str {
		if self.korean_name.trim().is_empty() { &self.english_name } else { &self.korean_name }
	}

	pub fn search_key(&self) -> String {
		cellar_domain::search_key(&format!("{} {}", self.korean_name, self.english_name))
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClientItemStat {
	pub client_code: String,
	pub item_no: String,
	pub purchase_count: i64,
	#[serde(default, with = "crate::time_serde::date")]
	pub last_purchase_date: Option<Date>,
	#[serde(default)]
	pub avg_price: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Alias {
	pub alias_key: String,
	/// Client code, or [`GLOBAL_SCOPE`].
	#[serde(default)]
	pub client_scope: String,
	pub canonical_item_no: String,
	pub canonical_name: String,
	pub usage_count: i64,
	#[serde(with = "crate::time_serde")]
	pub last_used_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}
impl Alias {
	pub fn is_global(&self) -> bool {
		self.client_scope == GLOBAL_SCOPE
	}
}

/// Outcome of an alias upsert, along with the mapping it replaced.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct AliasUpsert {
	#[sqlx(flatten)]
	pub alias: Alias,
	pub previous_item_no: Option<String>,
}

pub fn scope_value(client: Option<&str>) -> &str {
	client.map(str::trim).filter(|code| !code.is_empty()).unwrap_or(GLOBAL_SCOPE)
}
