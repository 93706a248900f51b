//! Configuration for session creation

use rumqttc::{MqttOptions, OptionError};

/// Session-level performance and behavior settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
	/// Capacity of the transport event loop channel
	pub event_loop_capacity: usize,
	/// Size of the dispatcher's parsed-topic cache (must be > 0)
	pub topic_cache_size: usize,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			event_loop_capacity: 10,
			topic_cache_size: 100,
		}
	}
}

/// Configuration for [`MqttSession`](super::MqttSession) creation
#[derive(Debug, Clone)]
pub struct SessionConfig {
	/// Underlying MQTT connection options (from rumqttc)
	pub connection: MqttOptions,
	/// Session-level performance and behavior settings
	pub settings: SessionSettings,
}

impl SessionConfig {
	/// Create new config with common defaults
	///
	/// # Example
	/// ```rust
	/// use mqtt_fanout::SessionConfig;
	///
	/// let config = SessionConfig::new("my_client", "broker.hivemq.com", 1883);
	/// ```
	pub fn new(client_id: &str, host: &str, port: u16) -> Self {
		Self {
			connection: MqttOptions::new(client_id, host, port),
			settings: SessionSettings::default(),
		}
	}

	/// Parse configuration from URL string
	///
	/// Supports URLs with protocols: tcp://, mqtt://, ssl://, mqtts://,
	/// ws://, wss://
	///
	/// # Example
	/// ```rust
	/// use mqtt_fanout::SessionConfig;
	///
	/// let config = SessionConfig::from_url("mqtt://broker.hivemq.com:1883?client_id=my_client")?;
	/// # Ok::<(), rumqttc::OptionError>(())
	/// ```
	pub fn from_url(url: &str) -> Result<Self, OptionError> {
		Ok(Self {
			connection: MqttOptions::parse_url(url)?,
			settings: SessionSettings::default(),
		})
	}

	/// Convenience method for localhost development
	///
	/// # Example
	/// ```rust
	/// use mqtt_fanout::SessionConfig;
	///
	/// let config = SessionConfig::localhost("test_client");
	/// ```
	pub fn localhost(client_id: &str) -> Self {
		Self::new(client_id, "localhost", 1883)
	}
}
