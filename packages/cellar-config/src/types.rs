use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
	pub service: Service,
	#[serde(default)]
	pub storage: Storage,
	#[serde(default)]
	pub resolution: Resolution,
	#[serde(default)]
	pub expansion: Expansion,
	#[serde(default)]
	pub generation: Generation,
	#[serde(default)]
	pub scoring: Scoring,
	#[serde(default)]
	pub learning: Learning,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}
impl Default for Service {
	fn default() -> Self {
		Self { log_level: default_log_level() }
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Storage {
	/// Optional. Without it the binaries run against a JSON snapshot.
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	#[serde(default = "default_pool_max_conns")]
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Resolution {
	/// Composite score the top existing candidate must reach to auto-confirm.
	pub confirm_threshold: f32,
	/// Required lead of the top existing candidate over the runner-up existing candidate.
	///
	/// `0.0` leaves the threshold as the only confirmation rule.
	pub min_gap: f32,
	pub max_candidates: u32,
	/// Places in the bounded candidate list held back for new-item suggestions.
	pub new_item_slots: u32,
}
impl Default for Resolution {
	fn default() -> Self {
		Self { confirm_threshold: 0.6, min_gap: 0.05, max_candidates: 10, new_item_slots: 3 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Expansion {
	pub snapshot_limit: u32,
	pub substring_min_chars: u32,
	pub substring_max_aliases: u32,
}
impl Default for Expansion {
	fn default() -> Self {
		Self { snapshot_limit: 500, substring_min_chars: 3, substring_max_aliases: 100 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Generation {
	pub catalog_limit: u32,
	pub token_overlap_floor: f32,
	pub new_items: NewItems,
}
impl Default for Generation {
	fn default() -> Self {
		Self { catalog_limit: 200, token_overlap_floor: 0.25, new_items: NewItems::default() }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NewItems {
	pub enabled: bool,
	/// One of "composite" or "text".
	pub trigger_basis: String,
	pub trigger_cutoff: f32,
	pub master_limit: u32,
	pub max_items: u32,
	pub min_text_score: f32,
}
impl Default for NewItems {
	fn default() -> Self {
		Self {
			enabled: true,
			trigger_basis: "composite".to_string(),
			trigger_cutoff: 0.45,
			master_limit: 50,
			max_items: 5,
			min_text_score: 0.3,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Scoring {
	pub contains_score: f32,
	pub token_ceiling: f32,
	pub partial_token_credit: f32,
	pub recency_tau_days: f32,
	pub frequency_half_saturation: f32,
	pub weights: ScoringWeights,
}
impl Default for Scoring {
	fn default() -> Self {
		Self {
			contains_score: 0.9,
			token_ceiling: 0.85,
			partial_token_credit: 0.5,
			recency_tau_days: 30.0,
			frequency_half_saturation: 3.0,
			weights: ScoringWeights::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
	pub text: f32,
	pub alias: f32,
	pub recency: f32,
	pub frequency: f32,
	pub vintage: f32,
	pub producer: f32,
}
impl ScoringWeights {
	pub fn sum(&self) -> f32 {
		self.text + self.alias + self.recency + self.frequency + self.vintage + self.producer
	}
}
impl Default for ScoringWeights {
	fn default() -> Self {
		Self {
			text: 0.45,
			alias: 0.15,
			recency: 0.1,
			frequency: 0.1,
			vintage: 0.05,
			producer: 0.15,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Learning {
	/// Store learned aliases under the client's own scope when a client code is present.
	pub client_scoped: bool,
	pub require_client_code: bool,
}
impl Default for Learning {
	fn default() -> Self {
		Self { client_scoped: true, require_client_code: false }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_pool_max_conns() -> u32 {
	8
}
