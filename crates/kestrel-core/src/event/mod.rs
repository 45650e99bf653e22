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

//! The event subsystem: taxonomy, double dispatch, bus and router.
//!
//! Events flow in one direction. A platform record enters the [`EventBus`]
//! through [`EventBus::inject`], is converted by an [`EventAdaptor`] into a
//! boxed domain event, and is handed to the bus route callback. The runner
//! binds that callback to [`EventRouter::route`], which offers the event to
//! every registered handler in registration order.
//!
//! Dispatch is two-sided. The event knows its own concrete type and hands
//! itself to the handler through [`Event::dispatch`]; the handler narrows it
//! against the [`EventHandler`] capabilities it declares and ignores
//! everything else.

mod adaptor;
mod base;
mod bus;
mod custom;
mod handler;
mod kinds;
mod router;

pub use self::adaptor::EventAdaptor;
pub use self::base::{timestamp_now, BoxedEvent, Event, EventType};
pub use self::bus::{EventBus, EventSender, EventSource, RouteCallback};
pub use self::custom::{custom_event_type, registered_custom_event_count};
pub use self::handler::{try_handle, BaseEventHandler, EventHandler, FunctionEventHandler};
pub use self::kinds::{
    default_key_name, KeyModifiers, KeyNameResolver, KeyboardEvent, MouseButtonEvent,
    MouseMotionEvent, OpaquePtr, QuitEvent, UserEvent, WindowEvent, WindowEventKind,
};
pub use self::router::{EventRouter, SharedHandler};
