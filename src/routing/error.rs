use thiserror::Error;

use crate::message::HandlerError;

/// Per-invocation failure recorded in a dispatch outcome.
///
/// Failures are isolated: one handler failing (or panicking) never
/// suppresses the outcomes of its siblings in the same dispatch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
	/// The handler ran to completion and returned an error
	#[error("handler failed: {0}")]
	Handler(#[from] HandlerError),

	/// The handler task panicked
	#[error("handler panicked during dispatch")]
	Panicked,

	/// The handler task was cancelled before completing. The dispatcher
	/// never aborts its own tasks; this only surfaces when the runtime is
	/// shutting down underneath an in-flight dispatch.
	#[error("handler task was cancelled before completion")]
	Cancelled,
}

impl DispatchError {
	/// Returns the error type for categorization
	pub fn error_type(&self) -> &'static str {
		match self {
			| DispatchError::Handler(_) => "handler_error",
			| DispatchError::Panicked => "panicked",
			| DispatchError::Cancelled => "cancelled",
		}
	}
}
