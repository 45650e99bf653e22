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

//! The public-facing SDK for Kestrel applications.
//!
//! Implement [`Application`], register it with [`register_application!`], and
//! hand [`ffi::CALLBACKS`] to a host driver. [`run`] does the last step with
//! the in-process [`HostDriver`](kestrel_infra::HostDriver).

#![warn(missing_docs)]

pub mod application;
pub mod config;
pub mod ffi;
pub mod guard;
pub mod logging;
pub mod runner;

pub use application::{AppContext, Application, ApplicationRegistration};
pub use config::RunnerConfig;
pub use guard::{Failure, FailureKind};
pub use runner::{Runner, RunnerState};

pub use kestrel_core;
pub use kestrel_infra;
pub use kestrel_macros::{Event, EventHandler};

#[doc(hidden)]
pub use inventory;

use kestrel_infra::{AppResult, HostDriver, PlatformEventSource};

/// Commonly used types, for glob import.
pub mod prelude {
    pub use crate::{register_application, AppContext, Application, RunnerConfig};
    pub use kestrel_core::event::{
        BaseEventHandler, Event, EventHandler, EventSender, EventType, KeyboardEvent,
        MouseButtonEvent, MouseMotionEvent, QuitEvent, UserEvent, WindowEvent, WindowEventKind,
    };
    pub use kestrel_core::ServiceRegistry;
    pub use kestrel_macros::{Event, EventHandler};
}

/// Runs the registered application under `driver`, feeding it events from `source`.
///
/// ## Returns
/// The host result that ended the run.
pub fn run(
    driver: &HostDriver,
    args: &[&str],
    source: &mut dyn PlatformEventSource,
) -> anyhow::Result<AppResult> {
    log::info!("Kestrel SDK: Starting...");
    let result = driver.run(&ffi::CALLBACKS, args, source)?;
    log::info!("Kestrel SDK: Finished with {result:?}.");
    Ok(result)
}
