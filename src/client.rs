//! Client Module
//!
//! Configuration holder and convenience facade over sessions and commands.
//!
//! ## Responsibilities
//! - Hold the connection settings and the native backend
//! - Own the logger shared by every session it opens
//! - Run single commands in a fresh session, or lend one session to a batch
//!
//! A `Client` holds no live connection; every call opens its own session
//! unless [`Client::with_session`] is used.

use std::ffi::CString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;

use crate::command::{
    AddSubKey, Attr, CasGet, CasIncDec, CasInit, CasSet, ClearSubKeys, Command, CommandResult,
    Get, GetAttrs, GetSubKeys, QueueItem, QueuePop, QueuePush, QueueRemove, Remove,
    RemoveSubKey, Rename, Set, SetAll, SetSubKeys,
};
use crate::config::ClientConfig;
use crate::data::{CasOperand, CasValue, CasWidth, Data};
use crate::error::{K2hdkcError, Result};
use crate::logger::{LibLogLevel, Logger, Severity};
use crate::native::Native;
use crate::session::Session;

/// Entry point for talking to a k2hdkc cluster
pub struct Client {
    config: ClientConfig,
    native: Arc<dyn Native>,
    logger: Logger,
}

impl Client {
    /// Client for `chmpx_file` and `ctl_port` backed by `libk2hdkc.so.0`
    #[cfg(unix)]
    pub fn new(chmpx_file: impl Into<PathBuf>, ctl_port: u16) -> Result<Self> {
        Self::from_config(ClientConfig::new(chmpx_file, ctl_port))
    }

    /// Client backed by the library named in `config`
    #[cfg(unix)]
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let native = crate::native::Library::load_from(&config.library)?;
        Ok(Self::with_native(config, Arc::new(native)))
    }

    /// Client over any native backend, logging per [`Logger::from_env`]
    pub fn with_native(config: ClientConfig, native: Arc<dyn Native>) -> Self {
        Self {
            config,
            native,
            logger: Logger::from_env(),
        }
    }

    /// Replace the logger (builder form of [`Client::set_logger`])
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.set_logger(logger);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn native(&self) -> &Arc<dyn Native> {
        &self.native
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    pub fn set_chmpx_file(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.config.chmpx_file = path.into();
        self
    }

    pub fn set_ctl_port(&mut self, port: u16) -> &mut Self {
        self.config.ctl_port = port;
        self
    }

    pub fn set_cuk(&mut self, cuk: impl Into<String>) -> &mut Self {
        self.config.cuk = cuk.into();
        self
    }

    pub fn set_auto_rejoin(&mut self, enable: bool) -> &mut Self {
        self.config.auto_rejoin = enable;
        self
    }

    pub fn set_auto_rejoin_retry(&mut self, enable: bool) -> &mut Self {
        self.config.auto_rejoin_retry = enable;
        self
    }

    pub fn set_cleanup(&mut self, enable: bool) -> &mut Self {
        self.config.cleanup = enable;
        self
    }

    // -------------------------------------------------------------------------
    // Logging
    // -------------------------------------------------------------------------

    /// Replace the logger; the previous one is closed first
    pub fn set_logger(&mut self, logger: Logger) -> &mut Self {
        self.logger.close();
        self.logger = logger;
        self
    }

    /// Log to `path` (native library logs included), or back to stderr with `None`
    pub fn set_log_file(&mut self, path: Option<&Path>) -> Result<&mut Self> {
        self.logger.set_log_file(path)?;
        match path {
            Some(path) => {
                let c_path = CString::new(path.to_string_lossy().into_owned())
                    .map_err(|_| K2hdkcError::Config("log file path contains NUL".into()))?;
                self.native.set_debug_file(Some(c_path.as_c_str()));
            }
            None => self.native.set_debug_file(None),
        }
        Ok(self)
    }

    /// Set this crate's severity and apply it to the k2hdkc library log
    pub fn set_log_severity(&mut self, severity: Severity) -> &mut Self {
        self.logger.set_severity(severity);
        self.logger
            .apply_lib_level(self.native.as_ref(), LibLogLevel::K2HDKC);
        self
    }

    /// Turn native library logs on at the current severity
    pub fn set_lib_log_level(&mut self, level: LibLogLevel) -> &mut Self {
        self.logger.apply_lib_level(self.native.as_ref(), level);
        self
    }

    /// Close the logger's destination
    pub fn close(&self) {
        self.logger.close();
    }

    // -------------------------------------------------------------------------
    // Sessions
    // -------------------------------------------------------------------------

    /// Open a session; the chmpx file must exist
    pub fn create_session(&self) -> Result<Session> {
        Session::open(self)
    }

    /// Execute `cmd` in a fresh session and hand it back
    pub fn send<C: Command>(&self, mut cmd: C) -> Result<C> {
        let session = self.create_session()?;
        if let Err(e) = cmd.execute(&session) {
            self.logger
                .warn(format_args!("{}.execute() failed: {}", cmd.name(), e));
            return Err(e);
        }
        Ok(cmd)
    }

    /// Run `batch` against one session, closing it afterwards
    pub fn with_session<T>(&self, batch: impl FnOnce(&Session) -> Result<T>) -> Result<T> {
        let mut session = self.create_session()?;
        let out = batch(&session);
        match session.close() {
            Err(e) if out.is_ok() => Err(e),
            Err(e) => {
                self.logger.warn(format_args!("close after failed batch: {e}"));
                out
            }
            Ok(()) => out,
        }
    }

    fn run<C: Command>(&self, cmd: Result<C>) -> Result<CommandResult<C::Payload>> {
        let cmd = cmd.inspect_err(|e| self.logger.warn(e))?;
        Ok(self.send(cmd)?.into_result())
    }

    // -------------------------------------------------------------------------
    // Convenience Operations
    // -------------------------------------------------------------------------

    pub fn set(&self, key: impl Into<Data>, value: impl Into<Data>) -> Result<CommandResult<()>> {
        self.run(Set::new(key, value))
    }

    pub fn get(&self, key: impl Into<Data>) -> Result<CommandResult<Bytes>> {
        self.run(Get::new(key))
    }

    pub fn remove(&self, key: impl Into<Data>) -> Result<CommandResult<()>> {
        self.run(Remove::new(key))
    }

    pub fn rename(
        &self,
        old_key: impl Into<Data>,
        new_key: impl Into<Data>,
    ) -> Result<CommandResult<()>> {
        self.run(Rename::new(old_key, new_key))
    }

    pub fn add_sub_key(
        &self,
        key: impl Into<Data>,
        subkey: impl Into<Data>,
        subval: impl Into<Data>,
    ) -> Result<CommandResult<()>> {
        self.run(AddSubKey::new(key, subkey, subval))
    }

    pub fn remove_sub_key(
        &self,
        key: impl Into<Data>,
        subkey: impl Into<Data>,
    ) -> Result<CommandResult<()>> {
        self.run(RemoveSubKey::new(key, subkey))
    }

    pub fn get_sub_keys(&self, key: impl Into<Data>) -> Result<CommandResult<Vec<Bytes>>> {
        self.run(GetSubKeys::new(key))
    }

    pub fn set_sub_keys<I, D>(&self, key: impl Into<Data>, subkeys: I) -> Result<CommandResult<()>>
    where
        I: IntoIterator<Item = D>,
        D: Into<Data>,
    {
        self.run(SetSubKeys::new(key, subkeys))
    }

    pub fn clear_sub_keys(&self, key: impl Into<Data>) -> Result<CommandResult<()>> {
        self.run(ClearSubKeys::new(key))
    }

    pub fn set_all<I, D>(
        &self,
        key: impl Into<Data>,
        value: impl Into<Data>,
        subkeys: I,
    ) -> Result<CommandResult<()>>
    where
        I: IntoIterator<Item = D>,
        D: Into<Data>,
    {
        self.run(SetAll::new(key, value, subkeys))
    }

    pub fn cas_init(
        &self,
        key: impl Into<Data>,
        value: impl Into<CasOperand>,
    ) -> Result<CommandResult<()>> {
        self.run(CasInit::with_value(key, value))
    }

    pub fn cas_get(
        &self,
        key: impl Into<Data>,
        width: CasWidth,
    ) -> Result<CommandResult<Option<CasValue>>> {
        self.run(CasGet::with_width(key, width))
    }

    pub fn cas_set(
        &self,
        key: impl Into<Data>,
        old: impl Into<CasOperand>,
        new: impl Into<CasOperand>,
    ) -> Result<CommandResult<()>> {
        self.run(CasSet::new(key, old, new))
    }

    pub fn cas_increment(&self, key: impl Into<Data>) -> Result<CommandResult<()>> {
        self.run(CasIncDec::increment(key))
    }

    pub fn cas_decrement(&self, key: impl Into<Data>) -> Result<CommandResult<()>> {
        self.run(CasIncDec::decrement(key))
    }

    pub fn queue_push(
        &self,
        prefix: impl Into<Data>,
        value: impl Into<Data>,
    ) -> Result<CommandResult<()>> {
        self.run(QueuePush::new(prefix, value))
    }

    pub fn queue_pop(&self, prefix: impl Into<Data>) -> Result<CommandResult<QueueItem>> {
        self.run(QueuePop::new(prefix))
    }

    pub fn queue_remove(&self, prefix: impl Into<Data>, count: i64) -> Result<CommandResult<()>> {
        self.run(QueueRemove::new(prefix, count))
    }

    pub fn get_attrs(&self, key: impl Into<Data>) -> Result<CommandResult<Vec<Attr>>> {
        self.run(GetAttrs::new(key))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("logger", &self.logger)
            .finish()
    }
}
