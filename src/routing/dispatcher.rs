//! Concurrent fan-out of one inbound message to every interested handler.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use arcstr::ArcStr;
use lru::LruCache;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::error::DispatchError;
use super::registry::SubscriptionRegistry;
use crate::message::{HandlerError, IncomingMessage, MessageHandler};
use crate::topic::{TopicFilter, TopicPath};

const DEFAULT_TOPIC_CACHE_SIZE: usize = 100;

/// Which registration produced an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerSource {
	/// The global catch-all handler
	Global,
	/// A handler registered under this filter
	Filter(TopicFilter),
}

/// Result of one handler invocation, in invocation order.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
	pub source: HandlerSource,
	pub result: Result<(), DispatchError>,
}

impl DispatchOutcome {
	pub fn is_ok(&self) -> bool {
		self.result.is_ok()
	}
}

/// Routes one inbound message to the global handler plus every handler of
/// every registry entry whose filter matches the topic.
///
/// Each dispatch operates on a point-in-time snapshot of the registry, so
/// a registration racing with an in-flight dispatch never produces a torn
/// read; the dispatch simply uses the state as of its start.
pub struct Dispatcher {
	registry: Arc<SubscriptionRegistry>,
	// Brokers re-deliver the same topics constantly; split each into
	// segments once and reuse the parse.
	topic_cache: Mutex<LruCache<ArcStr, Arc<TopicPath>>>,
}

impl Dispatcher {
	pub fn new(registry: Arc<SubscriptionRegistry>) -> Self {
		Self::with_cache_size(registry, DEFAULT_TOPIC_CACHE_SIZE)
	}

	pub fn with_cache_size(
		registry: Arc<SubscriptionRegistry>,
		topic_cache_size: usize,
	) -> Self {
		let capacity = NonZeroUsize::new(topic_cache_size)
			.unwrap_or(NonZeroUsize::MIN);
		Self {
			registry,
			topic_cache: Mutex::new(LruCache::new(capacity)),
		}
	}

	pub fn registry(&self) -> &Arc<SubscriptionRegistry> {
		&self.registry
	}

	fn topic_path(&self, topic: &ArcStr) -> Arc<TopicPath> {
		let mut cache = self.topic_cache.lock().unwrap();
		if let Some(path) = cache.get(topic) {
			return Arc::clone(path);
		}
		let path = Arc::new(TopicPath::new(topic.clone()));
		cache.put(topic.clone(), Arc::clone(&path));
		path
	}

	/// Fans `message` out to every qualifying handler concurrently and
	/// waits for all of them.
	///
	/// The invocation set is the global handler (if any) followed by, for
	/// each matching entry, that entry's handlers in registration order.
	/// Every invocation runs as its own task: a handler that suspends on
	/// I/O never delays its siblings, and a failing or panicking handler
	/// only mars its own outcome. The returned vector is parallel to
	/// invocation order regardless of completion order.
	pub async fn dispatch(
		&self,
		message: IncomingMessage,
	) -> Vec<DispatchOutcome> {
		let (global_handler, entries) = self.registry.snapshot();
		let topic = self.topic_path(&message.topic);

		let mut invocations: Vec<(HandlerSource, MessageHandler)> =
			Vec::new();
		if let Some(handler) = global_handler {
			invocations.push((HandlerSource::Global, handler));
		}
		for entry in entries {
			if !entry.filter.matches(&topic) {
				continue;
			}
			for handler in entry.handlers {
				invocations
					.push((HandlerSource::Filter(entry.filter.clone()), handler));
			}
		}

		debug!(
			topic = %message.topic,
			handlers = invocations.len(),
			"dispatching message"
		);

		// Launch everything before awaiting anything, then join in
		// invocation order. Deliberately not a fail-fast join: that would
		// cancel sibling handlers on the first error.
		let tasks: Vec<(
			HandlerSource,
			JoinHandle<Result<(), HandlerError>>,
		)> = invocations
			.into_iter()
			.map(|(source, handler)| {
				let invocation = handler.invoke(message.clone());
				(source, tokio::spawn(invocation))
			})
			.collect();

		let mut outcomes = Vec::with_capacity(tasks.len());
		for (source, task) in tasks {
			let result = match task.await {
				| Ok(Ok(())) => Ok(()),
				| Ok(Err(err)) => Err(DispatchError::Handler(err)),
				| Err(join_err) if join_err.is_panic() => {
					Err(DispatchError::Panicked)
				}
				| Err(_) => Err(DispatchError::Cancelled),
			};
			if let Err(err) = &result {
				warn!(
					topic = %message.topic,
					source = ?source,
					error = %err,
					"handler failed during dispatch"
				);
			}
			outcomes.push(DispatchOutcome { source, result });
		}
		outcomes
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use rumqttc::QoS;
	use tokio::sync::Barrier;

	use super::*;
	use crate::routing::registry::Subscription;

	fn counting_handler(counter: Arc<AtomicUsize>) -> MessageHandler {
		MessageHandler::from_fn(move |_message| {
			let counter = Arc::clone(&counter);
			async move {
				counter.fetch_add(1, Ordering::SeqCst);
				Ok(())
			}
		})
	}

	fn failing_handler(reason: &'static str) -> MessageHandler {
		MessageHandler::from_fn(move |_message| async move {
			Err(HandlerError::new(reason))
		})
	}

	fn message(topic: &str) -> IncomingMessage {
		IncomingMessage::new(topic, &b"payload"[..], QoS::AtMostOnce)
	}

	fn dispatcher() -> (Arc<SubscriptionRegistry>, Dispatcher) {
		let registry = Arc::new(SubscriptionRegistry::new());
		let dispatcher = Dispatcher::new(Arc::clone(&registry));
		(registry, dispatcher)
	}

	#[tokio::test]
	async fn fan_out_counts_global_plus_matching_entries() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));

		registry.set_global_handler(counting_handler(Arc::clone(&counter)));
		registry.register(
			"sensors/+/humidity",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);
		registry.register(
			"sensors/#",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);
		registry.register(
			"other/topic",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);

		let outcomes =
			dispatcher.dispatch(message("sensors/room1/humidity")).await;

		assert_eq!(outcomes.len(), 3);
		assert!(outcomes.iter().all(DispatchOutcome::is_ok));
		assert_eq!(counter.load(Ordering::SeqCst), 3);
		assert_eq!(outcomes[0].source, HandlerSource::Global);
	}

	#[tokio::test]
	async fn global_handler_fires_even_without_matches() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));
		registry.set_global_handler(counting_handler(Arc::clone(&counter)));

		let outcomes = dispatcher.dispatch(message("no/subscribers")).await;
		assert_eq!(outcomes.len(), 1);
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn no_handlers_means_no_outcomes() {
		let (_registry, dispatcher) = dispatcher();
		let outcomes = dispatcher.dispatch(message("any/topic")).await;
		assert!(outcomes.is_empty());
	}

	#[tokio::test]
	async fn one_failure_does_not_suppress_sibling_outcomes() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));

		registry.register(
			"t",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);
		registry.register(
			"t",
			Subscription::default(),
			failing_handler("boom"),
		);
		registry.register(
			"t",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);

		let outcomes = dispatcher.dispatch(message("t")).await;

		assert_eq!(outcomes.len(), 3);
		assert_eq!(counter.load(Ordering::SeqCst), 2);
		assert!(outcomes[0].is_ok());
		assert_eq!(
			outcomes[1].result,
			Err(DispatchError::Handler(HandlerError::new("boom")))
		);
		assert!(outcomes[2].is_ok());
	}

	#[tokio::test]
	async fn panicking_handler_is_isolated() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));

		registry.register(
			"t",
			Subscription::default(),
			MessageHandler::from_fn(|_message| async move {
				if true {
					panic!("handler exploded");
				}
				Ok(())
			}),
		);
		registry.register(
			"t",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);

		let outcomes = dispatcher.dispatch(message("t")).await;

		assert_eq!(outcomes.len(), 2);
		assert_eq!(outcomes[0].result, Err(DispatchError::Panicked));
		assert!(outcomes[1].is_ok());
		assert_eq!(counter.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn handlers_of_one_dispatch_run_concurrently() {
		let (registry, dispatcher) = dispatcher();
		// Both handlers must be inside the barrier at the same time for
		// the dispatch to complete; serialized execution would deadlock.
		let barrier = Arc::new(Barrier::new(2));

		for _ in 0 .. 2 {
			let barrier = Arc::clone(&barrier);
			registry.register(
				"sync/point",
				Subscription::default(),
				MessageHandler::from_fn(move |_message| {
					let barrier = Arc::clone(&barrier);
					async move {
						barrier.wait().await;
						Ok(())
					}
				}),
			);
		}

		let outcomes = dispatcher.dispatch(message("sync/point")).await;
		assert_eq!(outcomes.len(), 2);
		assert!(outcomes.iter().all(DispatchOutcome::is_ok));
	}

	#[tokio::test]
	async fn unsubscribe_silences_all_handlers_of_the_filter() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));

		registry.register(
			"a/+",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);
		registry.register(
			"a/+",
			Subscription::default(),
			counting_handler(Arc::clone(&counter)),
		);

		assert_eq!(dispatcher.dispatch(message("a/b")).await.len(), 2);
		assert!(registry.unsubscribe("a/+"));

		let outcomes = dispatcher.dispatch(message("a/b")).await;
		assert!(outcomes.is_empty());
		assert_eq!(counter.load(Ordering::SeqCst), 2);
	}

	#[tokio::test]
	async fn dispatch_uses_snapshot_taken_at_start() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));

		// This handler registers a sibling under the same filter while
		// the dispatch that invoked it is still running.
		let registry_clone = Arc::clone(&registry);
		let late_counter = Arc::clone(&counter);
		registry.register(
			"grow",
			Subscription::default(),
			MessageHandler::from_fn(move |_message| {
				let registry = Arc::clone(&registry_clone);
				let counter = Arc::clone(&late_counter);
				async move {
					registry.register(
						"grow",
						Subscription::default(),
						counting_handler(counter),
					);
					Ok(())
				}
			}),
		);

		let first = dispatcher.dispatch(message("grow")).await;
		assert_eq!(first.len(), 1);
		assert_eq!(counter.load(Ordering::SeqCst), 0);

		let second = dispatcher.dispatch(message("grow")).await;
		assert_eq!(second.len(), 2);
	}

	#[tokio::test]
	async fn duplicate_handler_registration_invokes_twice() {
		let (registry, dispatcher) = dispatcher();
		let counter = Arc::new(AtomicUsize::new(0));
		let handler = counting_handler(Arc::clone(&counter));

		registry.register("dup", Subscription::default(), handler.clone());
		registry.register("dup", Subscription::default(), handler);

		let outcomes = dispatcher.dispatch(message("dup")).await;
		assert_eq!(outcomes.len(), 2);
		assert_eq!(counter.load(Ordering::SeqCst), 2);
	}
}
