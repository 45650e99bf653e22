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

//! # Kestrel Infra
//!
//! Concrete implementations of the contracts defined in `kestrel-core` for the
//! underlying C toolkit: its event record layout and adaptor, its host driver
//! protocol, and its timers.

#![warn(missing_docs)]

pub mod host;
pub mod platform;
pub mod timer;

pub use host::{HostCallbacks, HostDriver, PlatformEventSource, ScriptedEvents};
pub use platform::input::ToolkitEventAdaptor;
pub use platform::raw::RawEvent;
pub use platform::AppResult;
pub use timer::{Timer, TimerHandle};
