//! Session layer module
//!
//! The explicit session object binding the registry and dispatcher to a
//! `rumqttc` transport, plus its configuration and error types.

pub mod config;
pub mod error;
pub mod session;

pub use config::{SessionConfig, SessionSettings};
pub use error::SessionError;
pub use session::{MqttSession, SessionConnection};
