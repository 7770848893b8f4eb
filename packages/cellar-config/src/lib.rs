mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Expansion, Generation, Learning, NewItems, Postgres, Resolution, Scoring,
	ScoringWeights, Service, Storage,
};

use std::{fs, path::Path};

pub const TRIGGER_BASIS_COMPOSITE: &str = "composite";
pub const TRIGGER_BASIS_TEXT: &str = "text";

const WEIGHT_SUM_RANGE: std::ops::RangeInclusive<f32> = 0.95..=1.05;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	if let Some(postgres) = cfg.storage.postgres.as_ref() {
		if postgres.dsn.trim().is_empty() {
			return Err(Error::Validation {
				message: "storage.postgres.dsn must be non-empty.".to_string(),
			});
		}
		if postgres.pool_max_conns == 0 {
			return Err(Error::Validation {
				message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
			});
		}
	}

	validate_resolution(cfg)?;
	validate_expansion(cfg)?;
	validate_generation(cfg)?;
	validate_scoring(cfg)?;

	if cfg.learning.require_client_code && !cfg.learning.client_scoped {
		return Err(Error::Validation {
			message: "learning.require_client_code requires learning.client_scoped.".to_string(),
		});
	}

	Ok(())
}

fn validate_resolution(cfg: &Config) -> Result<()> {
	let resolution = &cfg.resolution;

	if !resolution.confirm_threshold.is_finite() {
		return Err(Error::Validation {
			message: "resolution.confirm_threshold must be a finite number.".to_string(),
		});
	}
	if resolution.confirm_threshold <= 0.0 || resolution.confirm_threshold > 1.5 {
		return Err(Error::Validation {
			message: "resolution.confirm_threshold must be in the range (0.0, 1.5].".to_string(),
		});
	}
	if !resolution.min_gap.is_finite() || resolution.min_gap < 0.0 {
		return Err(Error::Validation {
			message: "resolution.min_gap must be a finite number of zero or greater.".to_string(),
		});
	}
	if resolution.max_candidates == 0 {
		return Err(Error::Validation {
			message: "resolution.max_candidates must be greater than zero.".to_string(),
		});
	}
	if resolution.new_item_slots > resolution.max_candidates {
		return Err(Error::Validation {
			message: "resolution.new_item_slots must not exceed resolution.max_candidates."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_expansion(cfg: &Config) -> Result<()> {
	if cfg.expansion.substring_min_chars == 0 {
		return Err(Error::Validation {
			message: "expansion.substring_min_chars must be greater than zero.".to_string(),
		});
	}
	if cfg.expansion.substring_max_aliases > cfg.expansion.snapshot_limit {
		return Err(Error::Validation {
			message: "expansion.substring_max_aliases must not exceed expansion.snapshot_limit."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_generation(cfg: &Config) -> Result<()> {
	let generation = &cfg.generation;

	if generation.catalog_limit == 0 {
		return Err(Error::Validation {
			message: "generation.catalog_limit must be greater than zero.".to_string(),
		});
	}
	if !(0.0..=1.0).contains(&generation.token_overlap_floor) {
		return Err(Error::Validation {
			message: "generation.token_overlap_floor must be in the range 0.0-1.0.".to_string(),
		});
	}

	let new_items = &generation.new_items;

	if !matches!(new_items.trigger_basis.as_str(), TRIGGER_BASIS_COMPOSITE | TRIGGER_BASIS_TEXT)
	{
		return Err(Error::Validation {
			message: "generation.new_items.trigger_basis must be one of composite or text."
				.to_string(),
		});
	}
	if !new_items.trigger_cutoff.is_finite() || new_items.trigger_cutoff < 0.0 {
		return Err(Error::Validation {
			message: "generation.new_items.trigger_cutoff must be a finite number of zero or greater."
				.to_string(),
		});
	}
	if !(0.0..=1.0).contains(&new_items.min_text_score) {
		return Err(Error::Validation {
			message: "generation.new_items.min_text_score must be in the range 0.0-1.0."
				.to_string(),
		});
	}
	if new_items.enabled {
		if new_items.master_limit == 0 {
			return Err(Error::Validation {
				message: "generation.new_items.master_limit must be greater than zero when enabled."
					.to_string(),
			});
		}
		if new_items.max_items == 0 {
			return Err(Error::Validation {
				message: "generation.new_items.max_items must be greater than zero when enabled."
					.to_string(),
			});
		}
	}

	Ok(())
}

fn validate_scoring(cfg: &Config) -> Result<()> {
	let scoring = &cfg.scoring;

	if !(scoring.contains_score > 0.0 && scoring.contains_score <= 1.0) {
		return Err(Error::Validation {
			message: "scoring.contains_score must be in the range (0.0, 1.0].".to_string(),
		});
	}
	if !(scoring.token_ceiling > 0.0 && scoring.token_ceiling <= scoring.contains_score) {
		return Err(Error::Validation {
			message: "scoring.token_ceiling must be greater than zero and at most scoring.contains_score."
				.to_string(),
		});
	}
	if !(0.0..=1.0).contains(&scoring.partial_token_credit) {
		return Err(Error::Validation {
			message: "scoring.partial_token_credit must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !scoring.recency_tau_days.is_finite() || scoring.recency_tau_days <= 0.0 {
		return Err(Error::Validation {
			message: "scoring.recency_tau_days must be a finite number greater than zero."
				.to_string(),
		});
	}
	if !scoring.frequency_half_saturation.is_finite() || scoring.frequency_half_saturation <= 0.0
	{
		return Err(Error::Validation {
			message: "scoring.frequency_half_saturation must be a finite number greater than zero."
				.to_string(),
		});
	}

	let weights = &scoring.weights;

	for (label, weight) in [
		("text", weights.text),
		("alias", weights.alias),
		("recency", weights.recency),
		("frequency", weights.frequency),
		("vintage", weights.vintage),
		("producer", weights.producer),
	] {
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::Validation {
				message: format!(
					"scoring.weights.{label} must be a finite number of zero or greater."
				),
			});
		}
		// A single non-alias signal must never carry a candidate over the confirm line alone.
		if label != "alias" && weight >= cfg.resolution.confirm_threshold {
			return Err(Error::Validation {
				message: format!(
					"scoring.weights.{label} must be less than resolution.confirm_threshold."
				),
			});
		}
	}

	if !WEIGHT_SUM_RANGE.contains(&weights.sum()) {
		return Err(Error::Validation {
			message: "scoring.weights must sum to a value in the range 0.95-1.05.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.storage.postgres.as_ref().map(|pg| pg.dsn.trim().is_empty()).unwrap_or(false) {
		cfg.storage.postgres = None;
	}

	cfg.generation.new_items.trigger_basis =
		cfg.generation.new_items.trigger_basis.trim().to_ascii_lowercase();
}
