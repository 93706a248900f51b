use rumqttc::{ClientError, OptionError};
use thiserror::Error;

/// Errors surfaced by the session layer.
///
/// Registry and dispatch operations are total and never appear here; the
/// only failure sources are the transport client and its configuration.
#[derive(Error, Debug)]
pub enum SessionError {
	/// The underlying MQTT client rejected a request
	#[error("mqtt client error: {0}")]
	Client(#[from] ClientError),

	/// Invalid connection options (bad broker URL, parameters)
	#[error("invalid connection options: {0}")]
	Options(#[from] OptionError),
}

impl SessionError {
	/// Returns the error type for categorization
	pub fn error_type(&self) -> &'static str {
		match self {
			| SessionError::Client(_) => "client",
			| SessionError::Options(_) => "options",
		}
	}
}
