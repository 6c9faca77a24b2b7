//! Command Module
//!
//! One type per logical operation on the cluster.
//!
//! ## Responsibilities
//! - Validate and encode inputs at construction (no half-built commands)
//! - Issue exactly one native call per [`Command::execute`]
//! - Record the outcome in a [`CommandResult`]
//!
//! ## Lifecycle
//! ```text
//! Constructed --execute--> Executing --+--> Succeeded
//!                                      +--> Failed
//! ```
//! A command executes at most once; a second `execute` is rejected.

mod attrs;
mod cas;
mod get;
mod queue;
mod remove;
mod rename;
mod set;
mod set_all;
mod subkey;
mod subkeys;

pub use attrs::{Attr, GetAttrs};
pub use cas::{CasGet, CasIncDec, CasInit, CasSet};
pub use get::Get;
pub use queue::{QueueItem, QueuePop, QueuePush, QueueRemove};
pub use remove::Remove;
pub use rename::Rename;
pub use set::Set;
pub use set_all::SetAll;
pub use subkey::{AddSubKey, RemoveSubKey};
pub use subkeys::{ClearSubKeys, GetSubKeys, SetSubKeys};

use bytes::Bytes;

use crate::data::strip_terminator;
use crate::error::{K2hdkcError, Result};
use crate::native::{Handle, Native};
use crate::session::Session;
use crate::status::Status;

/// An operation that runs once against a [`Session`]
pub trait Command {
    /// Operation-specific output
    type Payload;

    /// Operation name used in logs and errors
    fn name(&self) -> &'static str;

    /// Issue the native call
    ///
    /// `Ok(())` exactly when the native layer reported success. The result's
    /// status codes are populated either way.
    fn execute(&mut self, session: &Session) -> Result<()>;

    fn result(&self) -> &CommandResult<Self::Payload>;

    fn into_result(self) -> CommandResult<Self::Payload>
    where
        Self: Sized;

    fn state(&self) -> CommandState;
}

/// Where a command is in its single-shot lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CommandState {
    #[default]
    Constructed,
    Executing,
    Succeeded,
    Failed,
}

// =============================================================================
// Result
// =============================================================================

/// Outcome of one command: success flag, status codes and payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult<P> {
    ok: bool,
    status: Status,
    payload: P,
}

impl<P> CommandResult<P> {
    /// True if the native call succeeded
    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Status text, e.g. `"DKC_RES_SUCCESS DKC_RES_SUBCODE_NOTHING"`
    pub fn error_text(&self) -> String {
        self.status.to_string()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}

impl CommandResult<Bytes> {
    /// Returned buffer as-is (text values keep their NUL)
    pub fn bytes(&self) -> &Bytes {
        &self.payload
    }

    /// Returned buffer without its trailing NUL
    pub fn string(&self) -> String {
        strip_terminator(&self.payload)
    }
}

impl CommandResult<Vec<Bytes>> {
    pub fn bytes(&self) -> &[Bytes] {
        &self.payload
    }

    /// Each element without its trailing NUL
    pub fn strings(&self) -> Vec<String> {
        self.payload.iter().map(|b| strip_terminator(b)).collect()
    }
}

// =============================================================================
// Shared Execution
// =============================================================================

/// Lifecycle and result storage shared by every command
#[derive(Debug, Default)]
pub(crate) struct Core<P> {
    state: CommandState,
    result: CommandResult<P>,
}

impl<P: Default> Core<P> {
    pub(crate) fn state(&self) -> CommandState {
        self.state
    }

    pub(crate) fn result(&self) -> &CommandResult<P> {
        &self.result
    }

    pub(crate) fn into_result(self) -> CommandResult<P> {
        self.result
    }

    /// Move out of `Constructed`, or reject a second execution
    pub(crate) fn begin(&mut self, name: &'static str) -> Result<()> {
        if self.state != CommandState::Constructed {
            return Err(K2hdkcError::AlreadyExecuted(name));
        }
        self.state = CommandState::Executing;
        Ok(())
    }

    /// Issue `call` through `session` and record the outcome
    ///
    /// `into_payload` converts the call's output; a failed call leaves the
    /// default payload in place.
    pub(crate) fn run<T>(
        &mut self,
        session: &Session,
        call: &'static str,
        f: impl FnOnce(&dyn Native, Handle) -> Option<T>,
        into_payload: impl FnOnce(T) -> P,
    ) -> Result<()> {
        let (output, status) = match session.invoke(call, f) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.state = CommandState::Failed;
                return Err(e);
            }
        };
        self.result.status = status;
        match output {
            Some(output) => {
                self.result.ok = true;
                self.result.payload = into_payload(output);
                self.state = CommandState::Succeeded;
                Ok(())
            }
            None => {
                self.result.ok = false;
                self.state = CommandState::Failed;
                session
                    .logger()
                    .scope(|| tracing::debug!("{}() returned false ({})", call, status));
                Err(K2hdkcError::NativeCall { call, status })
            }
        }
    }

    /// Pass `checked` through, failing the command on a validation error
    pub(crate) fn check<T>(&mut self, checked: Result<T>) -> Result<T> {
        if checked.is_err() {
            self.state = CommandState::Failed;
        }
        checked
    }
}

/// Adapt a `bool`-returning native call to the `Option` shape used by [`Core::run`]
pub(crate) fn flag(ok: bool) -> Option<()> {
    ok.then_some(())
}

/// Re-check a required field at execution time
pub(crate) fn require(field: &'static str, value: &[u8]) -> Result<()> {
    if value.is_empty() {
        return Err(K2hdkcError::ZeroLength { field });
    }
    Ok(())
}

macro_rules! command_impl {
    ($ty:ty, $payload:ty, $name:literal) => {
        impl $crate::command::Command for $ty {
            type Payload = $payload;

            fn name(&self) -> &'static str {
                $name
            }

            fn execute(&mut self, session: &$crate::session::Session) -> $crate::error::Result<()> {
                self.core.begin($name)?;
                self.run(session)
            }

            fn result(&self) -> &$crate::command::CommandResult<$payload> {
                self.core.result()
            }

            fn into_result(self) -> $crate::command::CommandResult<$payload> {
                self.core.into_result()
            }

            fn state(&self) -> $crate::command::CommandState {
                self.core.state()
            }
        }
    };
}

pub(crate) use command_impl;
