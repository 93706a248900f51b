//! Message routing module
//!
//! The subscription registry (merged descriptors plus handler groups per
//! filter) and the dispatcher that fans one inbound message out to every
//! interested handler concurrently.

/// Concurrent fan-out dispatch
pub mod dispatcher;
/// Dispatch error types
pub mod error;
/// Filter-keyed subscription table
pub mod registry;

pub use dispatcher::{DispatchOutcome, Dispatcher, HandlerSource};
pub use error::DispatchError;
pub use registry::{
	RegistryEntry, RetainHandling, Subscription, SubscriptionRegistry,
};
