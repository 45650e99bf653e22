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

//! Handler capabilities and the narrowing half of the double dispatch.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use super::base::Event;

/// The common handle for a heterogeneous collection of handlers.
///
/// `accept` receives the concrete event as `&dyn Any` and narrows it against
/// the [`EventHandler`] capabilities the handler declares. It returns
/// `Ok(false)` when none matches.
///
/// Most handlers derive this with `#[derive(EventHandler)]` and list their
/// capabilities in `#[handles(..)]`; hand-written impls usually chain
/// [`try_handle`] calls.
pub trait BaseEventHandler {
    /// Narrows `event` and, on a match, handles it.
    fn accept(&mut self, event: &dyn Any) -> anyhow::Result<bool>;
}

/// The capability of handling events of type `E`.
///
/// A handler may implement this for any number of event types.
pub trait EventHandler<E: Event> {
    /// Handles one event.
    fn handle(&mut self, event: &E) -> anyhow::Result<()>;
}

/// Narrows `event` to `E` and hands it to `handler`.
///
/// Returns `None` when `event` is not an `E`.
pub fn try_handle<E, H>(handler: &mut H, event: &dyn Any) -> Option<anyhow::Result<()>>
where
    E: Event,
    H: EventHandler<E> + ?Sized,
{
    event.downcast_ref::<E>().map(|event| handler.handle(event))
}

/// Adapts a closure into an [`EventHandler<E>`].
pub struct FunctionEventHandler<E, F> {
    callable: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> FunctionEventHandler<E, F>
where
    E: Event,
    F: FnMut(&E) -> anyhow::Result<()>,
{
    /// Wraps `callable`.
    pub fn new(callable: F) -> Self {
        Self {
            callable,
            _event: PhantomData,
        }
    }
}

impl<E, F> EventHandler<E> for FunctionEventHandler<E, F>
where
    E: Event,
    F: FnMut(&E) -> anyhow::Result<()>,
{
    fn handle(&mut self, event: &E) -> anyhow::Result<()> {
        (self.callable)(event)
    }
}

impl<E, F> BaseEventHandler for FunctionEventHandler<E, F>
where
    E: Event,
    F: FnMut(&E) -> anyhow::Result<()>,
{
    fn accept(&mut self, event: &dyn Any) -> anyhow::Result<bool> {
        match try_handle::<E, _>(self, event) {
            Some(result) => result.map(|()| true),
            None => Ok(false),
        }
    }
}

impl<E, F> fmt::Debug for FunctionEventHandler<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionEventHandler")
            .field("event", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{KeyModifiers, KeyboardEvent, MouseButtonEvent, QuitEvent};

    fn click() -> MouseButtonEvent {
        MouseButtonEvent {
            timestamp: 0,
            window_id: 1,
            device_id: 0,
            x: 10.0,
            y: 20.0,
            button: 1,
            pressed: true,
            clicks: 1,
        }
    }

    #[derive(Default)]
    struct Recorder {
        clicks: usize,
        keys: usize,
    }

    impl EventHandler<MouseButtonEvent> for Recorder {
        fn handle(&mut self, _event: &MouseButtonEvent) -> anyhow::Result<()> {
            self.clicks += 1;
            Ok(())
        }
    }

    impl EventHandler<KeyboardEvent> for Recorder {
        fn handle(&mut self, _event: &KeyboardEvent) -> anyhow::Result<()> {
            self.keys += 1;
            Ok(())
        }
    }

    impl BaseEventHandler for Recorder {
        fn accept(&mut self, event: &dyn Any) -> anyhow::Result<bool> {
            if let Some(result) = try_handle::<MouseButtonEvent, _>(self, event) {
                return result.map(|()| true);
            }
            if let Some(result) = try_handle::<KeyboardEvent, _>(self, event) {
                return result.map(|()| true);
            }
            Ok(false)
        }
    }

    #[test]
    fn narrowing_selects_the_matching_capability() {
        let mut recorder = Recorder::default();

        assert!(click().dispatch(&mut recorder).unwrap());
        let key = KeyboardEvent {
            timestamp: 0,
            window_id: 1,
            scancode: 4,
            key: 'a' as u32,
            key_name_resolver: crate::event::default_key_name,
            pressed: true,
            repeat: false,
            modifiers: KeyModifiers::NONE,
        };
        assert!(key.dispatch(&mut recorder).unwrap());

        assert_eq!(recorder.clicks, 1);
        assert_eq!(recorder.keys, 1);
    }

    #[test]
    fn narrowing_failure_is_silent() {
        let mut recorder = Recorder::default();
        assert!(!QuitEvent::new().dispatch(&mut recorder).unwrap());
        assert_eq!(recorder.clicks, 0);
    }

    #[test]
    fn function_handler_only_accepts_its_event_type() {
        let mut seen = Vec::new();
        {
            let mut handler = FunctionEventHandler::new(|event: &MouseButtonEvent| {
                seen.push((event.x, event.y));
                Ok(())
            });
            assert!(click().dispatch(&mut handler).unwrap());
            assert!(!QuitEvent::new().dispatch(&mut handler).unwrap());
        }
        assert_eq!(seen, vec![(10.0, 20.0)]);
    }

    #[test]
    fn function_handler_errors_are_returned() {
        let mut handler =
            FunctionEventHandler::new(|_: &QuitEvent| Err(anyhow::anyhow!("refusing to quit")));
        let err = QuitEvent::new().dispatch(&mut handler).unwrap_err();
        assert_eq!(err.to_string(), "refusing to quit");
    }
}
