//! Session object wiring the subscription registry and dispatcher to a
//! `rumqttc` transport.

use std::sync::Arc;
use std::time::Duration;

use arcstr::ArcStr;
use rumqttc::Packet::{ConnAck, Disconnect, Publish};
use rumqttc::{AsyncClient, EventLoop, QoS};
use rumqttc::{Event::Incoming, Event::Outgoing};
use tokio::{task::JoinHandle, time};
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::error::SessionError;
use crate::message::{IncomingMessage, MessageHandler};
use crate::routing::{
	DispatchOutcome, Dispatcher, Subscription, SubscriptionRegistry,
};

/// Handle for registering handlers and talking to the broker.
///
/// One explicit session object holds the registry, the dispatcher and the
/// transport client; there is no module-level state. The session is cheap
/// to clone and every clone shares the same registry.
#[derive(Clone)]
pub struct MqttSession {
	client: AsyncClient,
	registry: Arc<SubscriptionRegistry>,
	dispatcher: Arc<Dispatcher>,
}

/// Owns the background event-loop task; call
/// [`shutdown`](SessionConnection::shutdown) to terminate cleanly.
pub struct SessionConnection {
	client: AsyncClient,
	event_loop_handle: Option<JoinHandle<()>>,
}

impl MqttSession {
	/// Creates the session and spawns the transport event loop.
	///
	/// The event loop feeds every inbound publish through the dispatcher
	/// and replays all registered subscriptions to the broker on every
	/// (re)connection, so subscriptions survive reconnects.
	pub fn connect(config: SessionConfig) -> (Self, SessionConnection) {
		let (client, event_loop) = AsyncClient::new(
			config.connection,
			config.settings.event_loop_capacity,
		);

		let registry = Arc::new(SubscriptionRegistry::new());
		let dispatcher = Arc::new(Dispatcher::with_cache_size(
			Arc::clone(&registry),
			config.settings.topic_cache_size,
		));

		let event_loop_handle = tokio::spawn(Self::run(
			event_loop,
			client.clone(),
			Arc::clone(&registry),
			Arc::clone(&dispatcher),
		));

		let session = Self {
			client: client.clone(),
			registry,
			dispatcher,
		};
		let connection = SessionConnection {
			client,
			event_loop_handle: Some(event_loop_handle),
		};
		(session, connection)
	}

	/// Main event loop that processes transport events until a Disconnect
	/// packet is seen in either direction.
	async fn run(
		mut event_loop: EventLoop,
		client: AsyncClient,
		registry: Arc<SubscriptionRegistry>,
		dispatcher: Arc<Dispatcher>,
	) {
		let mut error_count = 0;
		const MAX_CONSECUTIVE_ERRORS: u32 = 10;
		const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);
		const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

		loop {
			match event_loop.poll().await {
				| Ok(Incoming(Publish(publish))) => {
					error_count = 0;
					debug!(
						topic = %publish.topic,
						payload_size = publish.payload.len(),
						"received publish"
					);
					let message = IncomingMessage::new(
						publish.topic,
						publish.payload,
						publish.qos,
					);
					let outcomes = dispatcher.dispatch(message).await;
					let failed =
						outcomes.iter().filter(|o| !o.is_ok()).count();
					if failed > 0 {
						warn!(
							failed,
							total = outcomes.len(),
							"handlers failed for inbound message"
						);
					}
				}
				| Ok(Incoming(ConnAck(ack))) => {
					error_count = 0;
					info!(
						session_present = ack.session_present,
						"connected to broker, replaying subscriptions"
					);
					Self::replay_subscriptions(&client, &registry).await;
				}
				| Ok(Incoming(Disconnect)) => {
					info!("received Disconnect packet from broker");
					break;
				}
				| Ok(Outgoing(rumqttc::Outgoing::Disconnect)) => {
					info!("sent Disconnect packet to broker");
					break;
				}
				| Ok(notification) => {
					error_count = 0;
					debug!(notification = ?notification, "transport event");
				}
				| Err(err) => {
					error_count += 1;
					error!(error_count, error = %err, "event loop error");

					if error_count >= MAX_CONSECUTIVE_ERRORS {
						error!(
							error_count,
							max_errors = MAX_CONSECUTIVE_ERRORS,
							"too many consecutive errors, terminating \
							 event loop"
						);
						break;
					}

					let delay = INITIAL_RETRY_DELAY
						* 2_u32.pow((error_count - 1).min(10));
					let delay = delay.min(MAX_RETRY_DELAY);
					warn!(delay = ?delay, error_count, "retrying connection");
					time::sleep(delay).await;
				}
			}
		}
		info!("session event loop terminated");
	}

	/// Re-issues a broker subscribe for every registry entry at its
	/// merged QoS. The registry itself never talks to the network.
	async fn replay_subscriptions(
		client: &AsyncClient,
		registry: &SubscriptionRegistry,
	) {
		for entry in registry.entries() {
			if let Err(err) = client
				.subscribe(entry.filter.as_str(), entry.subscription.qos)
				.await
			{
				error!(
					filter = %entry.filter,
					error = ?err,
					"failed to replay subscription"
				);
			}
		}
	}

	/// Installs the global catch-all handler, invoked for every inbound
	/// message whether or not any filter matches. A later call replaces
	/// the previous handler.
	pub fn on_message(&self, handler: MessageHandler) {
		self.registry.set_global_handler(handler);
	}

	/// Registers `handler` under `filter` and asks the broker to
	/// subscribe at the merged QoS.
	///
	/// Registering an existing filter merges the options into the stored
	/// subscription and appends the handler; see
	/// [`SubscriptionRegistry::register`].
	pub async fn subscribe(
		&self,
		filter: impl Into<ArcStr>,
		options: Subscription,
		handler: MessageHandler,
	) -> Result<(), SessionError> {
		let filter = filter.into();
		let merged =
			self.registry.register(filter.clone(), options, handler);
		self.client.subscribe(filter.as_str(), merged.qos).await?;
		Ok(())
	}

	/// Removes the filter's whole entry (all handlers included) and, if
	/// anything was removed, unsubscribes from the broker. Returns
	/// whether the filter was registered.
	pub async fn unsubscribe(
		&self,
		filter: &str,
	) -> Result<bool, SessionError> {
		let removed = self.registry.unsubscribe(filter);
		if removed {
			self.client.unsubscribe(filter).await?;
		}
		Ok(removed)
	}

	/// Publishes a message; passthrough to the transport client.
	pub async fn publish(
		&self,
		topic: &str,
		payload: impl Into<Vec<u8>>,
		qos: QoS,
		retain: bool,
	) -> Result<(), SessionError> {
		self.client.publish(topic, qos, retain, payload).await?;
		Ok(())
	}

	/// Feeds one message through the dispatcher directly.
	///
	/// The event loop calls this for every inbound publish; it is public
	/// so an embedder driving its own transport can inject messages.
	pub async fn dispatch(
		&self,
		message: IncomingMessage,
	) -> Vec<DispatchOutcome> {
		self.dispatcher.dispatch(message).await
	}

	pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
		&self.registry
	}

	pub fn client(&self) -> &AsyncClient {
		&self.client
	}
}

impl SessionConnection {
	/// Gracefully shuts down by sending a Disconnect packet (which makes
	/// the event loop exit) and waiting for the loop task to finish.
	pub async fn shutdown(mut self) -> Result<(), SessionError> {
		if let Err(e) = self.client.disconnect().await {
			warn!(error = %e, "failed to send disconnect");
		}
		if let Some(handle) = self.event_loop_handle.take() {
			if let Err(e) = handle.await {
				warn!(error = %e, "event loop task failed");
			}
		}
		Ok(())
	}
}

impl Drop for SessionConnection {
	fn drop(&mut self) {
		if self.event_loop_handle.is_some() {
			error!(
				"SessionConnection dropped without calling shutdown(). \
				 Please call shutdown() and await its completion before \
				 dropping."
			);
		}
	}
}
