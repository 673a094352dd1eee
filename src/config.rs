//! Configuration management for the group chat server
//!
//! Settings come from an optional `config.toml`, then `GROUP_CHAT_*`
//! environment variables, over built-in defaults. A port given on the
//! command line wins over all of them.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// Default TCP port the chat server listens on
pub const DEFAULT_PORT: u16 = 12345;

/// Complete server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK (Environment Override Supported) ═══
    /// IP address to bind the listener to
    pub bind_address: String,

    /// Port for client connections
    pub port: u16,

    // ═══ LIMITS ═══
    /// Maximum concurrently registered clients
    /// Environment: GROUP_CHAT_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum length in bytes of one inbound line
    pub max_line_length: usize,

    /// Maximum length in bytes of a client identifier
    pub max_id_length: usize,

    /// Identifier attempts allowed before the handshake gives up
    pub max_handshake_attempts: usize,

    /// Lines that may be queued for one client before sends to it are dropped
    pub outbox_capacity: usize,

    /// Seconds a client may stay silent before it is disconnected (0 = never)
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            max_clients: 64,
            max_line_length: 1024,
            max_id_length: 32,
            max_handshake_attempts: 3,
            outbox_capacity: 256,
            idle_timeout_secs: 0,
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();

        let settings = Config::builder()
            .set_default("bind_address", defaults.bind_address.as_str())?
            .set_default("port", i64::from(defaults.port))?
            .set_default("max_clients", defaults.max_clients as i64)?
            .set_default("max_line_length", defaults.max_line_length as i64)?
            .set_default("max_id_length", defaults.max_id_length as i64)?
            .set_default(
                "max_handshake_attempts",
                defaults.max_handshake_attempts as i64,
            )?
            .set_default("outbox_capacity", defaults.outbox_capacity as i64)?
            .set_default("idle_timeout_secs", defaults.idle_timeout_secs as i64)?
            // ./config.toml in the working directory, if present
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("GROUP_CHAT").try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Replace the configured port, e.g. from a command line argument
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }

        if self.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.outbox_capacity == 0 {
            return Err(config::ConfigError::Message(
                "outbox_capacity must be greater than 0".into(),
            ));
        }

        if self.max_handshake_attempts == 0 {
            return Err(config::ConfigError::Message(
                "max_handshake_attempts must be greater than 0".into(),
            ));
        }

        if self.max_id_length == 0 {
            return Err(config::ConfigError::Message(
                "max_id_length must be greater than 0".into(),
            ));
        }

        if self.max_id_length > self.max_line_length {
            return Err(config::ConfigError::Message(
                "max_id_length cannot exceed max_line_length".into(),
            ));
        }

        Ok(())
    }

    /// Get bind address and port as a socket address string
    pub fn listen_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Idle read timeout, if one is configured
    pub fn idle_timeout(&self) -> Option<Duration> {
        match self.idle_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
