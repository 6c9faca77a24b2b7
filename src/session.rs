//! Session Module
//!
//! One open chmpx handle on the native client.
//!
//! ## Responsibilities
//! - Open a handle from a [`Client`]'s configuration
//! - Issue native calls on that handle and collect their status codes
//! - Close the handle exactly once (explicitly or on drop)
//!
//! A `Session` may move between threads but is not `Sync`: the native handle
//! must not see concurrent calls.

use std::cell::Cell;
use std::ffi::CString;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::client::Client;
use crate::error::{K2hdkcError, Result};
use crate::logger::Logger;
use crate::native::{Handle, Native, OpenParams, INVALID_HANDLE};
use crate::status::{ResCode, Status, SubCode};

/// An open handle on the cluster
pub struct Session {
    handle: Handle,
    closed: bool,
    cleanup: bool,
    native: Arc<dyn Native>,
    logger: Logger,
    _not_sync: PhantomData<Cell<()>>,
}

impl Session {
    /// Open a handle using `client`'s configuration
    ///
    /// The chmpx configuration file must exist; everything else is checked by
    /// the native layer.
    pub fn open(client: &Client) -> Result<Self> {
        let config = client.config();
        if !config.chmpx_file.exists() {
            return Err(K2hdkcError::ConfigNotFound(config.chmpx_file.clone()));
        }

        let file = CString::new(config.chmpx_file.to_string_lossy().into_owned())
            .map_err(|_| K2hdkcError::Config("chmpx file path contains NUL".into()))?;
        let cuk = CString::new(config.cuk.as_str())
            .map_err(|_| K2hdkcError::Config("cuk contains NUL".into()))?;

        let native = Arc::clone(client.native());
        let logger = client.logger().clone();
        let handle = native.open(&OpenParams {
            config: &file,
            port: config.ctl_port,
            cuk: &cuk,
            auto_rejoin: config.auto_rejoin,
            rejoin_retry: config.auto_rejoin_retry,
            cleanup: config.cleanup,
        });
        if handle == INVALID_HANDLE {
            logger.error(format_args!(
                "k2hdkc_open_chmpx_full({}, {}) failed",
                config.chmpx_file.display(),
                config.ctl_port
            ));
            return Err(K2hdkcError::OpenFailed { handle });
        }
        logger.scope(|| tracing::debug!("opened chmpx handle {}", handle));

        Ok(Self {
            handle,
            closed: false,
            cleanup: config.cleanup,
            native,
            logger,
            _not_sync: PhantomData,
        })
    }

    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Close the handle
    ///
    /// Only the first call reaches the native layer. A failed close still
    /// leaves the session closed.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.native.close(self.handle, self.cleanup) {
            self.logger.scope(|| tracing::debug!("closed chmpx handle {}", self.handle));
            Ok(())
        } else {
            self.logger.warn(format_args!("k2hdkc_close_chmpx_ex({}) = false", self.handle));
            Err(K2hdkcError::CloseFailed { handle: self.handle })
        }
    }

    /// Issue one native call and read back the handle's status codes
    ///
    /// Returns the call's output (`None` when it reported failure) with the
    /// status it left on the handle.
    pub(crate) fn invoke<T>(
        &self,
        call: &'static str,
        f: impl FnOnce(&dyn Native, Handle) -> Option<T>,
    ) -> Result<(Option<T>, Status)> {
        if self.closed {
            return Err(K2hdkcError::SessionClosed);
        }
        let native = self.native.as_ref();
        let output = self.logger.scope(|| {
            tracing::trace!("{}(handle = {})", call, self.handle);
            f(native, self.handle)
        });
        let status = Status::new(
            ResCode::from_raw(native.res_code(self.handle)),
            SubCode::from_raw(native.res_subcode(self.handle)),
        );
        Ok((output, status))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            self.logger.warn(format_args!("session drop: {e}"));
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("handle", &self.handle)
            .field("closed", &self.closed)
            .finish()
    }
}
