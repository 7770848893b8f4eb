use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CellarService, Error, Result};
use cellar_storage::models::{self, Alias, GLOBAL_SCOPE};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LearnRequest {
	pub raw_query: String,
	pub selected_item_no: String,
	/// Display name to splice into later queries. Looked up in the catalog when absent.
	#[serde(default)]
	pub selected_item_name: Option<String>,
	#[serde(default)]
	pub rejected_item_nos: Vec<String>,
	#[serde(default)]
	pub client_code: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct LearningResult {
	pub alias: Alias,
	pub created: bool,
	pub canonical_changed: bool,
	pub rejected_count: usize,
}

impl CellarService {
	pub async fn learn(&self, req: LearnRequest) -> Result<LearningResult> {
		self.learn_at(req, OffsetDateTime::now_utc()).await
	}

	/// Records the operator's selection as an alias of the raw query.
	pub async fn learn_at(&self, req: LearnRequest, now: OffsetDateTime) -> Result<LearningResult> {
		let client = req.client_code.as_deref().map(str::trim).filter(|code| !code.is_empty());

		validate_learn_request(&req, client, self.cfg.learning.require_client_code)?;

		let alias_key = cellar_domain::alias_key(&req.raw_query);

		if alias_key.is_empty() {
			return Err(Error::InvalidInput {
				message: "raw_query must contain text after normalization.".to_string(),
			});
		}

		let scope = if self.cfg.learning.client_scoped {
			models::scope_value(client)
		} else {
			GLOBAL_SCOPE
		};
		let item_no = req.selected_item_no.trim();
		let item_name = self.selected_item_name(&req, item_no).await?;
		let upsert =
			self.stores.aliases.upsert(&alias_key, scope, item_no, &item_name, now).await?;
		let created = upsert.previous_item_no.is_none();
		let canonical_changed =
			upsert.previous_item_no.as_deref().is_some_and(|previous| previous != item_no);

		tracing::info!(
			alias_key = %upsert.alias.alias_key,
			scope = %upsert.alias.client_scope,
			item_no = %upsert.alias.canonical_item_no,
			usage_count = upsert.alias.usage_count,
			created,
			canonical_changed,
			"Learned alias."
		);

		if !req.rejected_item_nos.is_empty() {
			tracing::info!(
				alias_key = %upsert.alias.alias_key,
				rejected = ?req.rejected_item_nos,
				"Operator rejected candidates."
			);
		}

		Ok(LearningResult {
			alias: upsert.alias,
			created,
			canonical_changed,
			rejected_count: req.rejected_item_nos.len(),
		})
	}

	async fn selected_item_name(&self, req: &LearnRequest, item_no: &str) -> Result<String> {
		if let Some(name) =
			req.selected_item_name.as_deref().map(str::trim).filter(|name| !name.is_empty())
		{
			return Ok(name.to_string());
		}

		match self.stores.catalog.get(item_no).await? {
			Some(item) => Ok(item.display_name().to_string()),
			None => Err(Error::InvalidInput {
				message: format!(
					"selected_item_name is required when {item_no} is not in the catalog."
				),
			}),
		}
	}
}

fn validate_learn_request(
	req: &LearnRequest,
	client: Option<&str>,
	require_client_code: bool,
) -> Result<()> {
	if req.raw_query.trim().is_empty() {
		return Err(Error::InvalidInput { message: "raw_query must be non-empty.".to_string() });
	}
	if req.selected_item_no.trim().is_empty() {
		return Err(Error::InvalidInput {
			message: "selected_item_no must be non-empty.".to_string(),
		});
	}
	if require_client_code && client.is_none() {
		return Err(Error::InvalidInput { message: "client_code is required.".to_string() });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn request(raw_query: &str, selected_item_no: &str) -> LearnRequest {
		LearnRequest {
			raw_query: raw_query.to_string(),
			selected_item_no: selected_item_no.to_string(),
			..LearnRequest::default()
		}
	}

	#[test]
	fn blank_fields_are_rejected() {
		assert!(validate_learn_request(&request("  ", "W1"), None, false).is_err());
		assert!(validate_learn_request(&request("샤블리", " "), None, false).is_err());
		assert!(validate_learn_request(&request("샤블리", "W1"), None, false).is_ok());
	}

	#[test]
	fn client_code_can_be_required() {
		let err = validate_learn_request(&request("샤블리", "W1"), None, true)
			.expect_err("Expected missing client code to fail.");

		assert!(err.to_string().contains("client_code"));
		assert!(validate_learn_request(&request("샤블리", "W1"), Some("C01"), true).is_ok());
	}
}
