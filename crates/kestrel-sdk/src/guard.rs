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

//! Failure containment at the host boundary.
//!
//! The host driver is C and cannot unwind. Every call into user code goes
//! through [`contain`], which turns both errors and panics into a classified
//! [`Failure`] and logs it.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// How a contained failure was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// A [`kestrel_core::Error`].
    Domain,
    /// Any other error, or a panic carrying a message.
    Generic,
    /// A panic with a payload that is not a message.
    Unknown,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureKind::Domain => "domain error",
            FailureKind::Generic => "error",
            FailureKind::Unknown => "unknown failure",
        })
    }
}

/// A failure caught at the host boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The classification.
    pub kind: FailureKind,
    /// A human readable description.
    pub message: String,
}

impl Failure {
    fn from_error(error: anyhow::Error) -> Self {
        Self {
            kind: classify(&error),
            message: format!("{error:#}"),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned());
        match message {
            Some(message) => Self {
                kind: FailureKind::Generic,
                message: format!("panicked: {message}"),
            },
            None => Self {
                kind: FailureKind::Unknown,
                message: "panicked with a non-string payload".to_owned(),
            },
        }
    }
}

/// A handler failure is classified by what the handler returned.
fn classify(error: &anyhow::Error) -> FailureKind {
    match error.downcast_ref::<kestrel_core::Error>() {
        Some(kestrel_core::Error::Handler(inner)) => classify(inner),
        Some(_) => FailureKind::Domain,
        None => FailureKind::Generic,
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Runs `f`, catching any error or panic it produces.
///
/// A failure is logged at error level, tagged with `phase`, and returned.
pub fn contain<T, F>(phase: &str, f: F) -> Result<T, Failure>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    let failure = match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(error)) => Failure::from_error(error),
        Err(payload) => Failure::from_panic(payload),
    };
    log::error!("Application {phase} failed with {failure}");
    Err(failure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        assert_eq!(contain("init", || Ok(5)), Ok(5));
    }

    #[test]
    fn domain_errors_are_recognised() {
        let failure = contain::<(), _>("iterate", || Err(kestrel_core::Error::BusClosed.into()))
            .unwrap_err();
        assert_eq!(failure.kind, FailureKind::Domain);
        assert!(failure.message.contains("shutting down"));
    }

    #[test]
    fn other_errors_are_generic() {
        let failure =
            contain::<(), _>("iterate", || Err(anyhow::anyhow!("disk on fire"))).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Generic);
        assert_eq!(failure.message, "disk on fire");
    }

    #[test]
    fn handler_failures_take_the_kind_of_the_handler_error() {
        let plain = kestrel_core::Error::Handler(anyhow::anyhow!("bad input"));
        let failure = contain::<(), _>("event", || Err(plain.into())).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Generic);
        assert_eq!(failure.message, "event handler failed: bad input");

        let domain = kestrel_core::Error::Handler(kestrel_core::Error::BusClosed.into());
        let failure = contain::<(), _>("event", || Err(domain.into())).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Domain);
    }

    #[test]
    fn panics_with_messages_are_generic() {
        let failure = contain::<(), _>("quit", || panic!("boom {}", 7)).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Generic);
        assert_eq!(failure.message, "panicked: boom 7");
    }

    #[test]
    fn opaque_panics_are_unknown() {
        let failure = contain::<(), _>("quit", || panic::panic_any(42_u32)).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Unknown);
    }
}
