//! Configuration for k2hdkc clients
//!
//! Connection settings handed to `k2hdkc_open_chmpx_full` when a session opens.

use std::path::PathBuf;

use crate::native::DEFAULT_LIBRARY;

/// Default chmpx control port
pub const DEFAULT_CTL_PORT: u16 = 8031;

/// Settings of a [`crate::Client`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // chmpx Connection
    // -------------------------------------------------------------------------
    /// chmpx slave configuration file (INI, YAML or JSON); must exist
    pub chmpx_file: PathBuf,

    /// chmpx control port
    pub ctl_port: u16,

    /// Cluster unique key; empty means none
    pub cuk: String,

    // -------------------------------------------------------------------------
    // Reconnect Behaviour
    // -------------------------------------------------------------------------
    /// Rejoin the cluster automatically after chmpx restarts
    pub auto_rejoin: bool,

    /// Keep retrying the rejoin
    pub auto_rejoin_retry: bool,

    /// Clean up the handle's backing resources on close
    pub cleanup: bool,

    // -------------------------------------------------------------------------
    // Native Library
    // -------------------------------------------------------------------------
    /// Soname or path passed to `dlopen`
    pub library: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            chmpx_file: PathBuf::new(),
            ctl_port: DEFAULT_CTL_PORT,
            cuk: String::new(),
            auto_rejoin: true,
            auto_rejoin_retry: true,
            cleanup: true,
            library: DEFAULT_LIBRARY.to_string(),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Config for `chmpx_file` and `ctl_port` with every other field defaulted
    pub fn new(chmpx_file: impl Into<PathBuf>, ctl_port: u16) -> Self {
        Self::builder().chmpx_file(chmpx_file).ctl_port(ctl_port).build()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the chmpx configuration file
    pub fn chmpx_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chmpx_file = path.into();
        self
    }

    /// Set the chmpx control port
    pub fn ctl_port(mut self, port: u16) -> Self {
        self.config.ctl_port = port;
        self
    }

    /// Set the cluster unique key
    pub fn cuk(mut self, cuk: impl Into<String>) -> Self {
        self.config.cuk = cuk.into();
        self
    }

    pub fn auto_rejoin(mut self, enable: bool) -> Self {
        self.config.auto_rejoin = enable;
        self
    }

    pub fn auto_rejoin_retry(mut self, enable: bool) -> Self {
        self.config.auto_rejoin_retry = enable;
        self
    }

    pub fn cleanup(mut self, enable: bool) -> Self {
        self.config.cleanup = enable;
        self
    }

    /// Set the native library soname or path
    pub fn library(mut self, name: impl Into<String>) -> Self {
        self.config.library = name.into();
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
