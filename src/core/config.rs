use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{Error, Result};

/// Sender-side protocol timings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// While disconnected, how often to announce ourselves with a lookout
    /// message in case the receiver has just come up
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub lookout_interval: Duration,
    /// How long a connection id offered by a receiver is held before it must
    /// be confirmed; stale or stray hellos die here
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub new_connection_id_countdown: Duration,
    /// Silence from the receiver for this long ends the connection. Keep it
    /// comfortably above twice the receiver's keepalive interval.
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub last_received_timeout: Duration,
    /// Minimum gap between two sends of an unchanged score
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub resend_same_countdown: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            lookout_interval: Duration::from_secs(2),
            new_connection_id_countdown: Duration::from_secs(3),
            last_received_timeout: Duration::from_secs(10),
            resend_same_countdown: Duration::from_secs(4),
        }
    }
}

impl TimingConfig {
    /// Checks every countdown is usable as a timer duration
    pub fn validate(&self) -> Result<()> {
        require_positive("lookout_interval", self.lookout_interval)?;
        require_positive("new_connection_id_countdown", self.new_connection_id_countdown)?;
        require_positive("last_received_timeout", self.last_received_timeout)?;
        require_positive("resend_same_countdown", self.resend_same_countdown)
    }
}

/// Receiver-side protocol timings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverTimingConfig {
    /// While connected, how often to ping the sender so it knows we are alive
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub keepalive_interval: Duration,
    /// How long an offered connection id waits for the sender's ack
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub new_connection_id_countdown: Duration,
    /// Silence from the sender for this long ends the connection
    #[serde(serialize_with = "super::serde::serialize_secs")]
    #[serde(deserialize_with = "super::serde::deserialize_secs")]
    pub last_received_timeout: Duration,
}

impl Default for ReceiverTimingConfig {
    fn default() -> Self {
        ReceiverTimingConfig {
            keepalive_interval: Duration::from_secs(2),
            new_connection_id_countdown: Duration::from_secs(3),
            last_received_timeout: Duration::from_secs(10),
        }
    }
}

impl ReceiverTimingConfig {
    /// Checks every countdown is usable as a timer duration
    pub fn validate(&self) -> Result<()> {
        require_positive("keepalive_interval", self.keepalive_interval)?;
        require_positive("new_connection_id_countdown", self.new_connection_id_countdown)?;
        require_positive("last_received_timeout", self.last_received_timeout)
    }
}

/// Where the datagram socket binds and who it talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Local address, `0.0.0.0:<port>` to listen on every interface
    pub bind_addr: SocketAddr,
    /// Fixed peer. Required on the sender; the receiver answers whoever spoke last.
    #[serde(default)]
    pub remote_addr: Option<SocketAddr>,
}

impl SocketConfig {
    /// Binds every interface on the given port
    pub fn any(port: u16) -> Self {
        SocketConfig {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], port)),
            remote_addr: None,
        }
    }

    /// Sets the fixed peer address
    pub fn with_remote(mut self, remote: SocketAddr) -> Self {
        self.remote_addr = Some(remote);
        self
    }
}

/// Everything a score sender needs to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderConfig {
    /// Protocol timings
    pub timing: TimingConfig,
    /// Socket settings; `remote_addr` names the scoreboard
    pub socket: SocketConfig,
    /// How long one pass of the polling loop waits on the network
    #[serde(serialize_with = "super::serde::serialize_millis")]
    #[serde(deserialize_with = "super::serde::deserialize_millis")]
    pub poll_interval: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        SenderConfig {
            timing: TimingConfig::default(),
            socket: SocketConfig::any(0)
                .with_remote(SocketAddr::from(([127, 0, 0, 1], super::DEFAULT_PORT))),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl SenderConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SenderConfig = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid sender configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_config(path.as_ref())?)
    }

    /// Checks the configuration can drive a session
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        require_positive("poll_interval", self.poll_interval)?;
        if self.socket.remote_addr.is_none() {
            return Err(Error::config("Sender needs socket.remote_addr for the receiver"));
        }
        Ok(())
    }
}

/// Everything a scoreboard receiver needs to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverConfig {
    /// Protocol timings
    pub timing: ReceiverTimingConfig,
    /// Socket settings
    pub socket: SocketConfig,
    /// How long one pass of the polling loop waits on the network
    #[serde(serialize_with = "super::serde::serialize_millis")]
    #[serde(deserialize_with = "super::serde::deserialize_millis")]
    pub poll_interval: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            timing: ReceiverTimingConfig::default(),
            socket: SocketConfig::any(super::DEFAULT_PORT),
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl ReceiverConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ReceiverConfig = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid receiver configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&read_config(path.as_ref())?)
    }

    /// Checks the configuration can drive a session
    pub fn validate(&self) -> Result<()> {
        self.timing.validate()?;
        require_positive("poll_interval", self.poll_interval)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {}: {}", path.display(), e)))
}

fn require_positive(name: &str, value: Duration) -> Result<()> {
    if value.as_millis() == 0 {
        return Err(Error::config(format!("{} must be at least one millisecond", name)));
    }
    Ok(())
}
