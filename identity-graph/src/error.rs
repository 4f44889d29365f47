//! # Error Module.
//!
//! This module features the `GraphError` enum for error handling throughout the project.

use thiserror::Error;

/// The crate-wide error variants.
#[derive(Debug, Error)]
pub enum GraphError {
	/// Configuration error
	#[error("ConfigurationError: {0}")]
	ConfigurationError(String),

	/// Connection error
	#[error("ConnectionError: {0}")]
	ConnectionError(String),

	/// File read/write error
	#[error("FileIOError: {0}")]
	FileIOError(String),

	/// Malformed account address
	#[error("InvalidAddress: {0}")]
	InvalidAddress(String),

	/// Input/output error
	#[error("IOError: {0}")]
	IOError(std::io::Error),

	/// Parsing error
	#[error("ParsingError: {0}")]
	ParsingError(String),

	/// Request error
	#[error("RequestError: {0}")]
	RequestError(String),

	/// Transaction error
	#[error("TransactionError: {0}")]
	TransactionError(String),

	/// No active account to act on behalf of
	#[error("Unauthenticated: {0}")]
	Unauthenticated(String),

	/// Connection type outside the supported set
	#[error("UnsupportedConnectionType: {0}")]
	UnsupportedConnectionType(String),

	/// Validation error
	#[error("ValidationError: {0}")]
	ValidationError(String),
}

impl GraphError {
	/// Whether the error is one of the conditions reported back to the person
	/// driving the explorer, as opposed to an infrastructure failure.
	pub fn is_user_facing(&self) -> bool {
		matches!(
			self,
			GraphError::InvalidAddress(_)
				| GraphError::Unauthenticated(_)
				| GraphError::UnsupportedConnectionType(_)
		)
	}
}

#[cfg(test)]
mod tests {
	use crate::error::GraphError;

	#[test]
	fn test_user_facing_conditions() {
		assert!(GraphError::InvalidAddress("0x12".to_string()).is_user_facing());
		assert!(GraphError::Unauthenticated("no seed".to_string()).is_user_facing());
		assert!(GraphError::UnsupportedConnectionType("carrier-pigeon".to_string())
			.is_user_facing());
		assert!(!GraphError::RequestError("timeout".to_string()).is_user_facing());
	}

	#[test]
	fn test_display_prefix() {
		let err = GraphError::InvalidAddress("0xzz".to_string());
		assert_eq!(err.to_string(), "InvalidAddress: 0xzz");
	}
}
