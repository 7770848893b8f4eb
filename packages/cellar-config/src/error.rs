pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read cellar config at {path:?}.")]
	ReadConfig {
		path: std::path::PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("Failed to parse cellar config at {path:?}: {source}")]
	ParseConfig {
		path: std::path::PathBuf,
		#[source]
		source: toml::de::Error,
	},
	#[error("{message}")]
	Validation { message: String },
}
