pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid input: {message}")]
	InvalidInput { message: String },
	#[error("Store unavailable: {message}")]
	StoreUnavailable { message: String },
}
impl From<cellar_storage::Error> for Error {
	fn from(err: cellar_storage::Error) -> Self {
		match err {
			cellar_storage::Error::InvalidArgument(message) => Self::InvalidInput { message },
			other => Self::StoreUnavailable { message: other.to_string() },
		}
	}
}
