//! # MQTT Fanout
//!
//! Client-side MQTT topic matching, subscription management and
//! concurrent message fan-out.
//!
//! ## Features
//!
//! - **Wildcard Topic Matching**: full MQTT filter semantics (`+`, `#`,
//!   `$share/<group>/` prefixes, `$`-reserved topic exclusion) as a pure,
//!   thread-safe function
//! - **Merging Subscription Registry**: overlapping registrations of the
//!   same filter merge into one descriptor (max QoS, OR-ed options) while
//!   every handler keeps firing
//! - **Concurrent Fan-out Dispatch**: every matching handler runs as its
//!   own task; failures and panics are captured per handler, never
//!   cancelling siblings
//! - **Reconnect Replay**: the session re-subscribes every registered
//!   filter on each (re)connection
//! - **Async/Await Support**: built on top of `tokio`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mqtt_fanout::{
//! 	MessageHandler, MqttSession, QoS, SessionConfig, Subscription,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! 	let config = SessionConfig::from_url(
//! 		"mqtt://broker.hivemq.com:1883?client_id=demo",
//! 	)?;
//! 	let (session, connection) = MqttSession::connect(config);
//!
//! 	// Catch-all handler, invoked for every inbound message
//! 	session.on_message(MessageHandler::from_fn(|message| async move {
//! 		println!("{}: {} bytes", message.topic, message.payload.len());
//! 		Ok(())
//! 	}));
//!
//! 	// Filtered handler
//! 	let handler = MessageHandler::from_fn(|message| async move {
//! 		println!("humidity update on {}", message.topic);
//! 		Ok(())
//! 	});
//! 	session
//! 		.subscribe(
//! 			"home/+/humidity",
//! 			Subscription::with_qos(QoS::AtLeastOnce),
//! 			handler,
//! 		)
//! 		.await?;
//!
//! 	session
//! 		.publish("home/kitchen/humidity", &b"40%"[..], QoS::AtMostOnce, false)
//! 		.await?;
//!
//! 	connection.shutdown().await?;
//! 	Ok(())
//! }
//! ```
//!
//! ## Topic Matching
//!
//! The matcher is available standalone, without a session:
//!
//! ```rust
//! use mqtt_fanout::topic_matches;
//!
//! assert!(topic_matches("sport/tennis/player1", "sport/+/player1"));
//! assert!(topic_matches("sport/tennis", "sport/tennis/#"));
//! // Wildcards never claim $-reserved topics
//! assert!(!topic_matches("$SYS/health", "#"));
//! // ...but a literal $SYS token still matches
//! assert!(topic_matches("$SYS/health", "$SYS/#"));
//! ```
//!
//! ## Failure Isolation
//!
//! A dispatch returns one outcome per invoked handler, parallel to
//! invocation order. A handler that errors or panics mars only its own
//! outcome; every sibling still runs to completion and reports its own
//! result.

/// Session layer: explicit session object over a `rumqttc` transport
pub mod client;
/// Message model: inbound messages, properties bag, handler callbacks
pub mod message;
/// Subscription registry and concurrent dispatch
pub mod routing;
/// Topic and filter parsing plus wildcard matching
pub mod topic;

pub use client::{
	MqttSession, SessionConfig, SessionConnection, SessionError,
	SessionSettings,
};
pub use message::{
	HandlerError, HandlerFuture, IncomingMessage, MessageHandler, Properties,
};
pub use routing::{
	DispatchError, DispatchOutcome, Dispatcher, HandlerSource, RegistryEntry,
	RetainHandling, Subscription, SubscriptionRegistry,
};
// Re-exported so callers need not depend on rumqttc directly
pub use rumqttc::QoS;
pub use topic::{topic_matches, TopicFilter, TopicPath};

/// Essential types for most applications
///
/// ```rust
/// use mqtt_fanout::prelude::*;
/// ```
pub mod prelude {
	//! Essential types for most applications

	pub use crate::{
		IncomingMessage, MessageHandler, MqttSession, QoS, SessionConfig,
		SessionError, Subscription,
	};
}

/// Error types used throughout the library
///
/// ```rust
/// use mqtt_fanout::errors::*;
/// ```
pub mod errors {
	//! All error types used in the library

	pub use crate::{DispatchError, HandlerError, SessionError};
}
