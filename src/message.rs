//! Message model: the inbound message passed to handlers, the opaque
//! properties bag, and the handler callback wrapper.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arcstr::ArcStr;
use bytes::Bytes;
use futures::future::BoxFuture;
use rumqttc::QoS;
use serde_json::{Map, Value};
use thiserror::Error;

/// Opaque application properties attached to an inbound message.
///
/// The routing core never inspects this bag, it only forwards it to
/// handlers unmodified. The v4 wire API carries no publish properties, so
/// messages built by the session event loop arrive with an empty bag;
/// embedders feeding [`Dispatcher::dispatch`](crate::Dispatcher::dispatch)
/// directly can attach whatever their transport provides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Map<String, Value>);

impl Properties {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(
		&mut self,
		key: impl Into<String>,
		value: Value,
	) -> Option<Value> {
		self.0.insert(key.into(), value)
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}
}

impl From<Map<String, Value>> for Properties {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}

/// One delivered message, cheap to clone per handler invocation.
///
/// The payload is an opaque byte sequence; deserialization is the
/// handler's business.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
	pub topic: ArcStr,
	pub payload: Bytes,
	pub qos: QoS,
	pub properties: Arc<Properties>,
}

impl IncomingMessage {
	pub fn new(
		topic: impl Into<ArcStr>,
		payload: impl Into<Bytes>,
		qos: QoS,
	) -> Self {
		Self::with_properties(topic, payload, qos, Properties::default())
	}

	pub fn with_properties(
		topic: impl Into<ArcStr>,
		payload: impl Into<Bytes>,
		qos: QoS,
		properties: Properties,
	) -> Self {
		Self {
			topic: topic.into(),
			payload: payload.into(),
			qos,
			properties: Arc::new(properties),
		}
	}
}

/// Error reported by a message handler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct HandlerError {
	reason: String,
}

impl HandlerError {
	pub fn new(reason: impl Into<String>) -> Self {
		Self {
			reason: reason.into(),
		}
	}

	pub fn reason(&self) -> &str {
		&self.reason
	}
}

impl From<String> for HandlerError {
	fn from(reason: String) -> Self {
		Self::new(reason)
	}
}

impl From<&str> for HandlerError {
	fn from(reason: &str) -> Self {
		Self::new(reason)
	}
}

pub type HandlerFuture = BoxFuture<'static, Result<(), HandlerError>>;

/// A cloneable message callback.
///
/// Built from an async closure; the same handler value can be registered
/// under several filters, or twice under one filter, and is invoked once
/// per registration.
///
/// ```
/// use mqtt_fanout::MessageHandler;
///
/// let handler = MessageHandler::from_fn(|message| async move {
/// 	println!("{}: {} bytes", message.topic, message.payload.len());
/// 	Ok(())
/// });
/// ```
#[derive(Clone)]
pub struct MessageHandler(
	Arc<dyn Fn(IncomingMessage) -> HandlerFuture + Send + Sync>,
);

impl MessageHandler {
	pub fn from_fn<F, Fut>(f: F) -> Self
	where
		F: Fn(IncomingMessage) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
	{
		Self(Arc::new(move |message| Box::pin(f(message))))
	}

	pub(crate) fn invoke(&self, message: IncomingMessage) -> HandlerFuture {
		(self.0)(message)
	}
}

impl fmt::Debug for MessageHandler {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("MessageHandler(..)")
	}
}
