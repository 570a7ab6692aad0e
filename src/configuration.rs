//! Connection and logging settings shared by every role.
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! All values are optional. Flags are case-insensitive; set them to `"true"` to enable.
//!
//! - `RLGLUE_HOST`: host of the coordinating party (default: `127.0.0.1`)
//! - `RLGLUE_PORT`: TCP port (default: `4096`)
//! - `RLGLUE_LOG`: enable logging to a file (default: `false`)
//! - `RLGLUE_STRICT_SIZE`: check declared payload sizes of received frames (default: `false`)

use tracing::warn;

use crate::codec::SizeCheck;

/// Host used when none is configured.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port used when none is configured.
pub const DEFAULT_PORT: u16 = 4096;

/// Settings for connecting a role to the coordinating party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) host: String,
    pub(crate) port: u16,
    pub(crate) log: bool,
    pub(crate) strict_size: bool,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Connects to `127.0.0.1:4096`.
    /// - Logging to file is disabled.
    /// - Declared sizes of received frames are not checked.
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            log: false,
            strict_size: false,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Unset variables keep their default. A port that does not parse as a
    /// `u16` is reported and replaced by the default.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        let port = match std::env::var("RLGLUE_PORT") {
            Ok(val) => val.trim().parse().unwrap_or_else(|_| {
                warn!("RLGLUE_PORT={val:?} is not a valid port, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        Self {
            host: std::env::var("RLGLUE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_owned()),
            port,
            log: get_env_flag("RLGLUE_LOG", false),
            strict_size: get_env_flag("RLGLUE_STRICT_SIZE", false),
        }
    }

    /// Set the host to connect to.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the TCP port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Enable or disable the declared-size check on received frames.
    pub fn with_strict_size(mut self, value: bool) -> Self {
        self.strict_size = value;
        self
    }

    /// Host to connect to.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the file logger is installed.
    pub fn log(&self) -> bool {
        self.log
    }

    /// `host:port`
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Declared-size policy derived from `strict_size`.
    pub fn size_check(&self) -> SizeCheck {
        if self.strict_size {
            SizeCheck::Enforce
        } else {
            SizeCheck::Ignore
        }
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}
