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

//! # Kestrel Core
//!
//! Foundational crate containing the event taxonomy, the double-dispatch
//! handler contracts, the event bus and router, and the service registry.
//!
//! Nothing in here knows about a concrete toolkit: platform records reach the
//! bus through the [`EventAdaptor`](event::EventAdaptor) trait, implemented by
//! `kestrel-infra`.

#![warn(missing_docs)]

// Lets the derive macros refer to `::kestrel_core` from inside this crate too.
extern crate self as kestrel_core;

pub mod error;
pub mod event;
pub mod service_registry;

pub use error::{Error, Result};
pub use service_registry::ServiceRegistry;

#[doc(hidden)]
pub use anyhow;
