//! Subscription registry: one merged descriptor and an ordered handler
//! group per registered topic filter, plus the global catch-all handler.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Mutex;

use arcstr::ArcStr;
use rumqttc::QoS;
use tracing::debug;

use crate::message::MessageHandler;
use crate::topic::TopicFilter;

/// When the broker should forward retained messages for a subscription.
/// Ordinals follow the MQTT 5 Retain Handling option.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum RetainHandling {
	#[default]
	OnEverySubscribe = 0,
	OnNewSubscribe = 1,
	Never = 2,
}

/// Merged subscription descriptor for one topic filter.
///
/// A subscription has no identity beyond its owning filter; registering
/// the same filter again merges the new options into the stored record
/// (see [`SubscriptionRegistry::register`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
	pub qos: QoS,
	pub no_local: bool,
	pub retain_as_published: bool,
	pub retain_handling: RetainHandling,
	pub subscription_id: Option<u32>,
}

impl Default for Subscription {
	fn default() -> Self {
		Self {
			qos: QoS::AtMostOnce,
			no_local: false,
			retain_as_published: false,
			retain_handling: RetainHandling::default(),
			subscription_id: None,
		}
	}
}

impl Subscription {
	pub fn with_qos(qos: QoS) -> Self {
		Self {
			qos,
			..Self::default()
		}
	}

	/// Merge policy for a filter registered a second time: QoS and retain
	/// handling take the maximum, the boolean options are OR-ed, and the
	/// first subscription identifier seen is kept.
	fn merge(&mut self, incoming: &Subscription) {
		self.qos = max_qos(self.qos, incoming.qos);
		self.no_local |= incoming.no_local;
		self.retain_as_published |= incoming.retain_as_published;
		if (incoming.retain_handling as u8) > (self.retain_handling as u8) {
			self.retain_handling = incoming.retain_handling;
		}
		if self.subscription_id.is_none() {
			self.subscription_id = incoming.subscription_id;
		}
	}
}

// QoS does not implement Ord upstream; compare the protocol ordinals.
fn max_qos(a: QoS, b: QoS) -> QoS {
	if (b as u8) > (a as u8) {
		b
	} else {
		a
	}
}

/// Point-in-time view of one registry entry, as handed to the dispatcher
/// and to the reconnect replay.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
	pub filter: TopicFilter,
	pub subscription: Subscription,
	pub handlers: Vec<MessageHandler>,
}

#[derive(Debug)]
struct FilterEntry {
	filter: TopicFilter,
	subscription: Subscription,
	handlers: Vec<MessageHandler>,
}

#[derive(Debug, Default)]
struct RegistryState {
	entries: BTreeMap<ArcStr, FilterEntry>,
	global_handler: Option<MessageHandler>,
}

/// Mapping from topic filter (exact string key) to its merged
/// [`Subscription`] and ordered handler group.
///
/// All operations are total: unsubscribing an unknown filter is a no-op
/// returning `false`. The interior mutex guards mutation and snapshot
/// taking only; it is never held across handler invocation, so dispatches
/// do not serialize behind registry contention.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
	inner: Mutex<RegistryState>,
}

impl SubscriptionRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers `handler` under `filter`, creating the entry on first
	/// registration and merging `options` into the stored descriptor on
	/// subsequent ones. Handlers are always appended: registering the
	/// same handler twice invokes it twice.
	///
	/// Returns a copy of the (possibly merged) stored descriptor, so the
	/// caller can use the effective QoS on the wire.
	pub fn register(
		&self,
		filter: impl Into<ArcStr>,
		options: Subscription,
		handler: MessageHandler,
	) -> Subscription {
		let key: ArcStr = filter.into();
		let mut state = self.inner.lock().unwrap();
		match state.entries.entry(key.clone()) {
			| Entry::Occupied(mut occupied) => {
				let entry = occupied.get_mut();
				entry.subscription.merge(&options);
				entry.handlers.push(handler);
				debug!(
					filter = %key,
					handlers = entry.handlers.len(),
					qos = ?entry.subscription.qos,
					"merged subscription"
				);
				entry.subscription.clone()
			}
			| Entry::Vacant(vacant) => {
				debug!(filter = %key, qos = ?options.qos, "new subscription");
				let entry = vacant.insert(FilterEntry {
					filter: TopicFilter::new(key.clone()),
					subscription: options,
					handlers: vec![handler],
				});
				entry.subscription.clone()
			}
		}
	}

	/// Removes the whole entry for `filter`: the descriptor and every
	/// handler registered under it. Returns whether anything was removed.
	pub fn unsubscribe(&self, filter: &str) -> bool {
		let mut state = self.inner.lock().unwrap();
		let removed = state.entries.remove(filter);
		if let Some(entry) = &removed {
			debug!(
				filter = %entry.filter,
				handlers = entry.handlers.len(),
				"removed subscription"
			);
		}
		removed.is_some()
	}

	/// Installs the global catch-all handler, replacing any previous one.
	pub fn set_global_handler(&self, handler: MessageHandler) {
		let mut state = self.inner.lock().unwrap();
		if state.global_handler.is_some() {
			debug!("replacing global message handler");
		}
		state.global_handler = Some(handler);
	}

	pub fn global_handler(&self) -> Option<MessageHandler> {
		self.inner.lock().unwrap().global_handler.clone()
	}

	/// Stable snapshot of every entry, in filter lexicographic order.
	/// Used by the dispatcher and by the reconnect replay.
	pub fn entries(&self) -> Vec<RegistryEntry> {
		let state = self.inner.lock().unwrap();
		state
			.entries
			.values()
			.map(|entry| RegistryEntry {
				filter: entry.filter.clone(),
				subscription: entry.subscription.clone(),
				handlers: entry.handlers.clone(),
			})
			.collect()
	}

	/// Global handler and entries taken under one lock acquisition, so a
	/// dispatch sees a single point-in-time state.
	pub(crate) fn snapshot(
		&self,
	) -> (Option<MessageHandler>, Vec<RegistryEntry>) {
		let state = self.inner.lock().unwrap();
		let entries = state
			.entries
			.values()
			.map(|entry| RegistryEntry {
				filter: entry.filter.clone(),
				subscription: entry.subscription.clone(),
				handlers: entry.handlers.clone(),
			})
			.collect();
		(state.global_handler.clone(), entries)
	}

	pub fn len(&self) -> usize {
		self.inner.lock().unwrap().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.lock().unwrap().entries.is_empty()
	}
}
