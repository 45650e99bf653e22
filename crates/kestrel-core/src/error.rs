// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The single domain error type shared by every Kestrel crate.

use thiserror::Error;

/// A specialized `Result` type for Kestrel operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the event core and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// The adaptor did not recognise the platform event discriminator.
    ///
    /// This condition is benign: the bus and the router skip such events.
    #[error("unknown platform event (discriminator {0:#06x})")]
    UnknownEvent(u32),

    /// The event bus has been closed and no longer accepts or yields events.
    #[error("event bus is shutting down")]
    BusClosed,

    /// A service was requested but no factory was ever registered for it.
    #[error("no factory registered for service `{0}`")]
    NoFactory(&'static str),

    /// A user event handler failed while an event was being dispatched.
    #[error("event handler failed: {0:#}")]
    Handler(anyhow::Error),

    /// A primitive of the underlying toolkit reported a failure.
    #[error("{operation} failed: {message}")]
    Toolkit {
        /// The name of the toolkit operation that failed.
        operation: String,
        /// The toolkit's own error string.
        message: String,
    },

    /// The runner was asked to start without an application to drive.
    #[error("no application has been registered")]
    NoApplication,
}

impl Error {
    /// Builds an [`Error::Toolkit`] from an operation name and the toolkit's message.
    pub fn toolkit(operation: impl Into<String>, message: impl ToString) -> Self {
        Error::Toolkit {
            operation: operation.into(),
            message: message.to_string(),
        }
    }

    /// Returns `true` for conditions the router treats as non-fatal.
    ///
    /// A handler failure is benign when the handler itself reported an
    /// unknown event.
    pub fn is_benign(&self) -> bool {
        match self {
            Error::UnknownEvent(_) => true,
            Error::Handler(inner) => inner.downcast_ref::<Error>().is_some_and(Error::is_benign),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolkit_error_carries_operation_and_message() {
        let err = Error::toolkit("create timer", "out of threads");
        assert_eq!(err.to_string(), "create timer failed: out of threads");
    }

    #[test]
    fn unknown_event_is_benign() {
        assert!(Error::UnknownEvent(0x1234).is_benign());
        assert!(!Error::BusClosed.is_benign());
        assert_eq!(
            Error::UnknownEvent(0x1234).to_string(),
            "unknown platform event (discriminator 0x1234)"
        );
    }

    #[test]
    fn handler_reporting_unknown_event_is_benign() {
        let err = Error::Handler(anyhow::Error::new(Error::UnknownEvent(7)));
        assert!(err.is_benign());
        assert!(!Error::Handler(anyhow::anyhow!("real failure")).is_benign());
    }

    #[test]
    fn handler_error_shows_the_whole_chain() {
        let inner = anyhow::anyhow!("disk full").context("saving screenshot");
        let err = Error::Handler(inner);
        assert_eq!(
            err.to_string(),
            "event handler failed: saving screenshot: disk full"
        );
    }
}
