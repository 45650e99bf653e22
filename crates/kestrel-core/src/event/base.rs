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

use std::any::Any;
use std::fmt;
use std::sync::OnceLock;
use std::time::Instant;

use super::handler::BaseEventHandler;

/// The numeric type tag carried by every domain event.
///
/// Built-in variants use the fixed codes below. Custom variants receive a code
/// at runtime from [`custom_event_type`](super::custom_event_type), always
/// greater than or equal to [`EventType::FIRST_CUSTOM`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventType(pub u32);

impl EventType {
    /// The application was asked to terminate.
    pub const QUIT: EventType = EventType(0x100);
    /// Any window state change.
    pub const WINDOW: EventType = EventType(0x200);
    /// A key was pressed or released.
    pub const KEYBOARD: EventType = EventType(0x300);
    /// The mouse moved.
    pub const MOUSE_MOTION: EventType = EventType(0x400);
    /// A mouse button was pressed or released.
    pub const MOUSE_BUTTON: EventType = EventType(0x401);
    /// A toolkit-level user event.
    pub const USER: EventType = EventType(0x8000);
    /// The first code handed out to custom event types.
    pub const FIRST_CUSTOM: EventType = EventType(0x8001);

    /// Returns the raw numeric code.
    #[inline]
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Returns `true` if this code was assigned to a custom event type.
    #[inline]
    pub const fn is_custom(self) -> bool {
        self.0 >= Self::FIRST_CUSTOM.0
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

/// The polymorphic root of every domain event.
///
/// An event knows its concrete type; [`Event::dispatch`] is the visitor half
/// of the double dispatch and hands that concrete type to a handler, which
/// decides whether it accepts it.
pub trait Event: Any + Send + fmt::Debug {
    /// The event's type tag.
    fn event_type(&self) -> EventType;

    /// Monotonic timestamp, in milliseconds.
    fn timestamp(&self) -> u64;

    /// Returns `self` as `&dyn Any` so handlers can narrow it.
    fn as_any(&self) -> &dyn Any;

    /// Offers this event to `handler`.
    ///
    /// Returns `Ok(true)` if the handler accepted the event, `Ok(false)` if it
    /// has no capability for this event type.
    fn dispatch(&self, handler: &mut dyn BaseEventHandler) -> anyhow::Result<bool> {
        handler.accept(self.as_any())
    }

    /// A human-readable name for logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// A uniquely owned event in flight.
pub type BoxedEvent = Box<dyn Event>;

impl dyn Event {
    /// Returns `true` if the concrete type of this event is `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.as_any().is::<E>()
    }

    /// Attempts to view this event as the concrete type `E`.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }
}

/// Milliseconds elapsed since the first call in this process.
///
/// Used to stamp events that are built by user code rather than adapted from
/// a platform record.
pub fn timestamp_now() -> u64 {
    static EPOCH: OnceLock<Instant> = OnceLock::new();
    EPOCH.get_or_init(Instant::now).elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::QuitEvent;

    #[test]
    fn builtin_codes_are_below_custom_codes() {
        for code in [
            EventType::QUIT,
            EventType::WINDOW,
            EventType::KEYBOARD,
            EventType::MOUSE_MOTION,
            EventType::MOUSE_BUTTON,
            EventType::USER,
        ] {
            assert!(code < EventType::FIRST_CUSTOM);
            assert!(!code.is_custom());
        }
        assert!(EventType::FIRST_CUSTOM.is_custom());
    }

    #[test]
    fn event_type_displays_as_hex() {
        assert_eq!(EventType::QUIT.to_string(), "0x0100");
        assert_eq!(EventType::USER.to_string(), "0x8000");
    }

    #[test]
    fn boxed_event_downcasts_to_its_concrete_type() {
        let event: BoxedEvent = Box::new(QuitEvent::new());
        assert!(event.is::<QuitEvent>());
        assert!(event.downcast_ref::<QuitEvent>().is_some());
        assert!(event.name().ends_with("QuitEvent"));
    }

    #[test]
    fn timestamps_are_monotonic() {
        let first = timestamp_now();
        let second = timestamp_now();
        assert!(second >= first);
    }
}
